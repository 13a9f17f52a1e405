//! HTTP calendar provider.
//!
//! Client for a remote calendar service exposing a small REST surface:
//!
//! - `GET  {base_url}/events?start=...&end=...` - events in a window
//! - `POST {base_url}/events` - create an event

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{ProviderError, Result};
use crate::interval::Interval;

use super::provider::{CalendarProvider, NewEvent};

/// Wire representation of a remote calendar event.
#[derive(Debug, Clone, Deserialize)]
struct RemoteEvent {
    #[allow(dead_code)]
    id: String,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

/// Wire payload for event creation.
#[derive(Debug, Clone, Serialize)]
struct CreateEventBody<'a> {
    title: &'a str,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<&'a str>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    attendees: Vec<String>,
}

/// Response from event creation.
#[derive(Debug, Clone, Deserialize)]
struct CreateEventResponse {
    id: String,
}

/// Calendar provider backed by a remote REST service.
pub struct RestCalendar {
    client: Client,
    base_url: String,
}

impl RestCalendar {
    /// Create a client for the given base URL with the given call timeout.
    pub fn new(base_url: impl Into<String>, timeout_secs: u64) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| ProviderError::Connection(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    fn map_request_error(e: reqwest::Error) -> ProviderError {
        if e.is_timeout() {
            ProviderError::Timeout(30)
        } else if e.is_connect() {
            ProviderError::Connection(e.to_string())
        } else {
            ProviderError::Api(e.to_string())
        }
    }
}

#[async_trait]
impl CalendarProvider for RestCalendar {
    async fn list_busy_intervals(
        &self,
        window_start: DateTime<Utc>,
        window_end: DateTime<Utc>,
    ) -> Result<Vec<Interval>> {
        let url = format!("{}/events", self.base_url);
        let response = self
            .client
            .get(&url)
            .query(&[
                ("start", window_start.to_rfc3339()),
                ("end", window_end.to_rfc3339()),
            ])
            .send()
            .await
            .map_err(Self::map_request_error)?;

        if !response.status().is_success() {
            return Err(
                ProviderError::Api(format!("GET /events returned {}", response.status())).into(),
            );
        }

        let events: Vec<RemoteEvent> = response
            .json()
            .await
            .map_err(|e| ProviderError::Api(format!("invalid events payload: {e}")))?;

        let mut intervals: Vec<Interval> = events
            .into_iter()
            .filter_map(|e| Interval::new(e.start, e.end))
            .collect();
        intervals.sort_by_key(|iv| iv.start);

        debug!(
            "Retrieved {} busy intervals from {}",
            intervals.len(),
            self.base_url
        );
        Ok(intervals)
    }

    async fn create_event(&self, event: NewEvent) -> Result<String> {
        let url = format!("{}/events", self.base_url);
        let body = CreateEventBody {
            title: &event.title,
            start: event.start,
            end: event.end,
            description: event.description.as_deref(),
            attendees: event.attendees.clone(),
        };

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(Self::map_request_error)?;

        if !response.status().is_success() {
            return Err(
                ProviderError::Api(format!("POST /events returned {}", response.status())).into(),
            );
        }

        let created: CreateEventResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::Api(format!("invalid create payload: {e}")))?;

        debug!("Created remote calendar event: {}", created.id);
        Ok(created.id)
    }
}
