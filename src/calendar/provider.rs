//! Calendar provider trait.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::Result;
use crate::interval::Interval;

/// Payload for creating a calendar event.
#[derive(Debug, Clone)]
pub struct NewEvent {
    /// Event title.
    pub title: String,
    /// Start instant.
    pub start: DateTime<Utc>,
    /// End instant.
    pub end: DateTime<Utc>,
    /// Optional free-text description.
    pub description: Option<String>,
    /// Attendee addresses.
    pub attendees: Vec<String>,
}

/// Trait for calendar backends.
///
/// The provider is the source of truth for conflicts: the resolver only
/// ever reasons about the busy intervals it reports.
#[async_trait]
pub trait CalendarProvider: Send + Sync {
    /// List busy intervals overlapping the given window, ordered by start.
    async fn list_busy_intervals(
        &self,
        window_start: DateTime<Utc>,
        window_end: DateTime<Utc>,
    ) -> Result<Vec<Interval>>;

    /// Create an event and return the provider-assigned event id.
    async fn create_event(&self, event: NewEvent) -> Result<String>;
}
