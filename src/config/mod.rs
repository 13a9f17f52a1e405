//! Configuration for the Concierge agent.

pub mod settings;

pub use settings::{
    CalendarBackend, CalendarConfig, Config, NluBackend, NluConfig, SchedulingConfig, ServerConfig,
};
