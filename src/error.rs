//! Error types for the Concierge booking agent.

use thiserror::Error;

/// Main error type for Concierge operations.
#[derive(Error, Debug)]
pub enum ConciergeError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("NLU error: {0}")]
    Nlu(#[from] NluError),

    #[error("Calendar provider error: {0}")]
    Provider(#[from] ProviderError),

    #[error("Session store error: {0}")]
    Session(#[from] SessionError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Configuration-related errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadFile(#[source] std::io::Error),

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Missing required field: {0}")]
    MissingField(String),
}

/// Errors from the natural-language understanding provider.
///
/// Always recovered inside the orchestrator: a failed classification or
/// extraction degrades to a safe default and is never surfaced to the
/// user as an error.
#[derive(Error, Debug)]
pub enum NluError {
    #[error("API error: {0}")]
    Api(String),

    #[error("Request failed: {0}")]
    Request(String),

    #[error("Malformed model response: {0}")]
    InvalidResponse(String),

    #[error("Timeout after {0}s")]
    Timeout(u64),
}

/// Errors from the calendar provider (read or write).
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("API error: {0}")]
    Api(String),

    #[error("Connection failed: {0}")]
    Connection(String),

    #[error("Event not found: {0}")]
    EventNotFound(String),

    #[error("Timeout after {0}s")]
    Timeout(u64),
}

/// Errors from the session store backend.
#[derive(Error, Debug)]
pub enum SessionError {
    #[error("Backend error: {0}")]
    Backend(String),

    #[error("Session not found: {0}")]
    NotFound(String),
}

/// Result type alias for Concierge operations.
pub type Result<T> = std::result::Result<T, ConciergeError>;
