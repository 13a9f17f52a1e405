//! Availability resolution.
//!
//! Searches the calendar for conflict-free slots under business-hour
//! constraints. The search walks a cursor in fixed 30-minute increments,
//! skipping weekends and off-hours, and tests each candidate interval
//! against the busy intervals the provider reports for that window.

use std::sync::Arc;

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveTime, Utc, Weekday};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::calendar::CalendarProvider;
use crate::error::Result;
use crate::interval::{Interval, TimeSlot};

// ============================================================================
// Scheduling Parameters
// ============================================================================

/// Parameters constraining the slot search.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulingParams {
    /// Business hours start (slots never start before this).
    pub business_hours_start: NaiveTime,
    /// Business hours end (slots never start at or after this).
    pub business_hours_end: NaiveTime,
    /// Cursor step in minutes.
    pub step_minutes: u32,
    /// Exclude Saturday and Sunday from the search.
    pub exclude_weekends: bool,
}

impl Default for SchedulingParams {
    fn default() -> Self {
        Self {
            business_hours_start: NaiveTime::from_hms_opt(9, 0, 0).expect("valid time"),
            business_hours_end: NaiveTime::from_hms_opt(17, 0, 0).expect("valid time"),
            step_minutes: 30,
            exclude_weekends: true,
        }
    }
}

// ============================================================================
// Availability Resolver
// ============================================================================

/// Finds conflict-free time slots against a calendar provider.
pub struct AvailabilityResolver {
    provider: Arc<dyn CalendarProvider>,
    params: SchedulingParams,
}

impl AvailabilityResolver {
    /// Create a resolver with default scheduling parameters.
    pub fn new(provider: Arc<dyn CalendarProvider>) -> Self {
        Self {
            provider,
            params: SchedulingParams::default(),
        }
    }

    /// Create a resolver with explicit scheduling parameters.
    pub fn with_params(provider: Arc<dyn CalendarProvider>, params: SchedulingParams) -> Self {
        Self { provider, params }
    }

    /// Find up to `count` conflict-free slots of `duration_minutes` each,
    /// searching from `candidate_start` over `horizon_days`.
    ///
    /// The cursor starts at the later of `candidate_start` at business
    /// opening and now, then advances in fixed steps. Slots start within
    /// business hours on weekdays; a slot whose end runs past closing is
    /// still returned. Results are in non-decreasing start order.
    pub async fn find_free_slots(
        &self,
        candidate_start: NaiveDate,
        duration_minutes: u32,
        count: usize,
        horizon_days: i64,
    ) -> Result<Vec<TimeSlot>> {
        let opening = self.day_opening(candidate_start);
        let now = Utc::now();
        let search_start = opening.max(now);
        let horizon_end = search_start + Duration::days(horizon_days);

        let mut slots = Vec::new();
        let mut cursor = search_start;

        while cursor < horizon_end && slots.len() < count {
            // Weekends: jump to the next day's opening.
            if self.params.exclude_weekends && is_weekend(cursor.weekday()) {
                cursor = self.day_opening(cursor.date_naive() + Duration::days(1));
                continue;
            }

            // Before opening: snap forward to opening the same day.
            if cursor.time() < self.params.business_hours_start {
                cursor = self.day_opening(cursor.date_naive());
            }

            // At or past closing: jump to the next day's opening.
            if cursor.time() >= self.params.business_hours_end {
                cursor = self.day_opening(cursor.date_naive() + Duration::days(1));
                continue;
            }

            let candidate = Interval::with_duration(cursor, duration_minutes);
            if self.is_free(&candidate).await? {
                slots.push(TimeSlot::from_start(cursor, duration_minutes));
            }

            cursor += Duration::minutes(self.params.step_minutes as i64);
        }

        debug!(
            "Found {} free slots from {} over {} days",
            slots.len(),
            candidate_start,
            horizon_days
        );
        Ok(slots)
    }

    /// Test a single explicitly requested slot for conflicts.
    ///
    /// No business-hours filtering: a caller may confirm an off-hours
    /// time the user asked for directly.
    pub async fn check_exact_slot(
        &self,
        date: NaiveDate,
        start_time: NaiveTime,
        duration_minutes: u32,
    ) -> Result<bool> {
        let start = to_utc(date, start_time);
        let candidate = Interval::with_duration(start, duration_minutes);
        self.is_free(&candidate).await
    }

    /// Whether the candidate interval conflicts with no provider-reported
    /// busy interval in its window.
    async fn is_free(&self, candidate: &Interval) -> Result<bool> {
        let busy = self
            .provider
            .list_busy_intervals(candidate.start, candidate.end)
            .await?;
        Ok(!candidate.conflicts_with_any(&busy))
    }

    /// Business opening instant for a date.
    fn day_opening(&self, date: NaiveDate) -> DateTime<Utc> {
        to_utc(date, self.params.business_hours_start)
    }
}

fn is_weekend(weekday: Weekday) -> bool {
    weekday == Weekday::Sat || weekday == Weekday::Sun
}

/// Combine a date and a time of day into an instant.
pub fn to_utc(date: NaiveDate, time: NaiveTime) -> DateTime<Utc> {
    DateTime::from_naive_utc_and_offset(date.and_time(time), Utc)
}
