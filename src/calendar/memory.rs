//! Embedded in-memory calendar provider.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use tracing::debug;

use crate::error::Result;
use crate::interval::Interval;

use super::provider::{CalendarProvider, NewEvent};

/// A stored calendar event.
#[derive(Debug, Clone)]
struct StoredEvent {
    id: String,
    title: String,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

/// In-memory calendar backend.
///
/// Serves as the default provider when no remote calendar is configured
/// and as the deterministic backend for tests. Events live for the
/// lifetime of the process.
#[derive(Default)]
pub struct InMemoryCalendar {
    events: Arc<RwLock<Vec<StoredEvent>>>,
}

impl InMemoryCalendar {
    /// Create an empty calendar.
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the calendar with a busy interval (test helper).
    pub async fn add_busy(&self, title: &str, start: DateTime<Utc>, end: DateTime<Utc>) {
        let mut events = self.events.write().await;
        events.push(StoredEvent {
            id: uuid::Uuid::new_v4().to_string(),
            title: title.to_string(),
            start,
            end,
        });
    }

    /// Number of stored events.
    pub async fn event_count(&self) -> usize {
        self.events.read().await.len()
    }
}

#[async_trait]
impl CalendarProvider for InMemoryCalendar {
    async fn list_busy_intervals(
        &self,
        window_start: DateTime<Utc>,
        window_end: DateTime<Utc>,
    ) -> Result<Vec<Interval>> {
        let events = self.events.read().await;

        let mut intervals: Vec<Interval> = events
            .iter()
            .filter(|e| e.start < window_end && window_start < e.end)
            .filter_map(|e| Interval::new(e.start, e.end))
            .collect();

        intervals.sort_by_key(|iv| iv.start);

        Ok(intervals)
    }

    async fn create_event(&self, event: NewEvent) -> Result<String> {
        let id = uuid::Uuid::new_v4().to_string();
        let mut events = self.events.write().await;
        events.push(StoredEvent {
            id: id.clone(),
            title: event.title.clone(),
            start: event.start,
            end: event.end,
        });
        debug!("Created calendar event: {} ({})", event.title, id);
        Ok(id)
    }
}
