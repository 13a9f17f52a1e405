//! The booking orchestration engine.
//!
//! [`BookingAgent`] owns the per-turn conversation state machine: it
//! classifies the message, accumulates booking fields across turns,
//! consults the availability resolver, and either confirms a booking,
//! suggests alternative slots, or asks a targeted clarification question.

pub mod composer;
pub mod orchestrator;
pub mod request;

pub use composer::{compose, ChatResponse};
pub use orchestrator::{AgentOutcome, BookingAgent};
pub use request::BookingRequest;
