//! Calendar provider integration.
//!
//! The agent never owns calendar state: it reads busy intervals from and
//! writes events to an external provider behind the [`CalendarProvider`]
//! trait. Two implementations ship here:
//!
//! - [`InMemoryCalendar`]: embedded provider used as the default backend
//!   and in tests
//! - [`RestCalendar`]: HTTP client for a remote calendar service

pub mod memory;
pub mod provider;
pub mod rest;

pub use memory::InMemoryCalendar;
pub use provider::{CalendarProvider, NewEvent};
pub use rest::RestCalendar;
