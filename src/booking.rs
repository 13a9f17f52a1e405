//! Booking execution.
//!
//! Turns a fully specified booking request into a created calendar event.
//! No retries and no idempotency at this layer: the orchestrator owns the
//! user-facing fallback when the provider call fails, and a duplicate
//! submission produces a duplicate provider event.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::agent::request::BookingRequest;
use crate::availability::to_utc;
use crate::calendar::{CalendarProvider, NewEvent};
use crate::error::{ProviderError, Result};

/// Default appointment length when the user never specified one.
pub const DEFAULT_DURATION_MINUTES: u32 = 60;

// ============================================================================
// Booking Record
// ============================================================================

/// A confirmed booking, as returned by the calendar provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct BookingRecord {
    /// Provider-assigned event id.
    pub event_id: String,
    /// Event title.
    pub title: String,
    /// Optional free-text description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Start instant.
    pub start: DateTime<Utc>,
    /// End instant.
    pub end: DateTime<Utc>,
    /// Attendee addresses.
    #[serde(default)]
    pub attendees: Vec<String>,
    /// Booking status. Only `confirmed` is produced here.
    pub status: BookingStatus,
}

/// Lifecycle status of a booking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    Confirmed,
}

// ============================================================================
// Booking Executor
// ============================================================================

/// Creates calendar events from complete booking requests.
pub struct BookingExecutor {
    provider: Arc<dyn CalendarProvider>,
}

impl BookingExecutor {
    /// Create an executor backed by the given provider.
    pub fn new(provider: Arc<dyn CalendarProvider>) -> Self {
        Self { provider }
    }

    /// Create a booking from a complete request.
    ///
    /// The caller must have verified `request.is_complete()`; duration
    /// defaults to 60 minutes when absent. Fails with a provider error if
    /// the calendar write fails for any reason.
    pub async fn create_booking(&self, request: &BookingRequest) -> Result<BookingRecord> {
        let (title, date, start_time) = match (&request.title, request.date, request.start_time) {
            (Some(title), Some(date), Some(start_time)) => (title.clone(), date, start_time),
            _ => {
                return Err(ProviderError::Api(
                    "booking request is missing required fields".to_string(),
                )
                .into())
            }
        };

        let duration = request.duration_minutes.unwrap_or(DEFAULT_DURATION_MINUTES);
        let start = to_utc(date, start_time);
        let end = start + chrono::Duration::minutes(duration as i64);

        let event_id = self
            .provider
            .create_event(NewEvent {
                title: title.clone(),
                start,
                end,
                description: request.description.clone(),
                attendees: request.attendees.clone(),
            })
            .await?;

        info!("Booked '{}' at {} ({})", title, start, event_id);

        Ok(BookingRecord {
            event_id,
            title,
            description: request.description.clone(),
            start,
            end,
            attendees: request.attendees.clone(),
            status: BookingStatus::Confirmed,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calendar::InMemoryCalendar;
    use chrono::{NaiveDate, NaiveTime};

    fn complete_request() -> BookingRequest {
        BookingRequest {
            title: Some("Dentist".to_string()),
            date: NaiveDate::from_ymd_opt(2025, 6, 10),
            start_time: NaiveTime::from_hms_opt(10, 0, 0),
            duration_minutes: Some(30),
            attendees: vec!["ana@example.com".to_string()],
            description: Some("Checkup".to_string()),
        }
    }

    #[tokio::test]
    async fn test_booking_creates_provider_event() {
        let cal = Arc::new(InMemoryCalendar::new());
        let executor = BookingExecutor::new(cal.clone());

        let record = executor.create_booking(&complete_request()).await.unwrap();

        assert_eq!(record.title, "Dentist");
        assert_eq!(record.status, BookingStatus::Confirmed);
        assert_eq!((record.end - record.start).num_minutes(), 30);
        assert_eq!(cal.event_count().await, 1);
    }

    #[tokio::test]
    async fn test_duration_defaults_to_sixty_minutes() {
        let cal = Arc::new(InMemoryCalendar::new());
        let executor = BookingExecutor::new(cal);

        let mut request = complete_request();
        request.duration_minutes = None;

        let record = executor.create_booking(&request).await.unwrap();
        assert_eq!((record.end - record.start).num_minutes(), 60);
    }

    #[tokio::test]
    async fn test_incomplete_request_rejected() {
        let cal = Arc::new(InMemoryCalendar::new());
        let executor = BookingExecutor::new(cal);

        let mut request = complete_request();
        request.start_time = None;

        assert!(executor.create_booking(&request).await.is_err());
    }

    #[tokio::test]
    async fn test_duplicate_submission_duplicates() {
        // No idempotency at this layer: two calls, two events.
        let cal = Arc::new(InMemoryCalendar::new());
        let executor = BookingExecutor::new(cal.clone());

        let request = complete_request();
        executor.create_booking(&request).await.unwrap();
        executor.create_booking(&request).await.unwrap();

        assert_eq!(cal.event_count().await, 2);
    }
}
