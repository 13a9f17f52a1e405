//! Concierge: Conversational Calendar Booking Agent
//!
//! A deterministic booking orchestration engine: each user message runs a
//! finite per-turn state machine that classifies intent, accumulates
//! booking fields across turns, resolves availability against a calendar
//! provider, and returns exactly one outcome: a confirmed booking,
//! alternative slots, a clarification question, or a freeform reply.

pub mod agent;
pub mod api;
pub mod availability;
pub mod booking;
pub mod calendar;
pub mod config;
pub mod error;
pub mod interval;
pub mod nlu;
pub mod session;

pub use agent::{compose, AgentOutcome, BookingAgent, BookingRequest, ChatResponse};
pub use api::{create_rest_router, ApiState, RestApiConfig};
pub use availability::{AvailabilityResolver, SchedulingParams};
pub use booking::{BookingExecutor, BookingRecord, BookingStatus};
pub use calendar::{CalendarProvider, InMemoryCalendar, NewEvent, RestCalendar};
pub use config::Config;
pub use error::{
    ConciergeError, ConfigError, NluError, ProviderError, Result, SessionError,
};
pub use interval::{Interval, TimeSlot};
pub use nlu::{ExtractedFields, Intent, IntentClassification, LlmNlu, NluProvider, PatternNlu};
pub use session::{ChatTurn, ConversationSession, InMemorySessionStore, SessionStore, TurnRole};
