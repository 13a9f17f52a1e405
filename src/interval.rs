//! Time interval model.
//!
//! Pure data and arithmetic for time ranges: the half-open overlap test
//! that defines a scheduling conflict, and the `TimeSlot` shape returned
//! by availability searches.

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

// ============================================================================
// Interval
// ============================================================================

/// A half-open time interval `[start, end)`.
///
/// Invariant: `end > start`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Interval {
    /// Start instant (inclusive).
    pub start: DateTime<Utc>,
    /// End instant (exclusive).
    pub end: DateTime<Utc>,
}

impl Interval {
    /// Create a new interval. Returns `None` if `end <= start`.
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Option<Self> {
        if end > start {
            Some(Self { start, end })
        } else {
            None
        }
    }

    /// Create an interval from a start instant and a duration in minutes.
    pub fn with_duration(start: DateTime<Utc>, minutes: u32) -> Self {
        Self {
            start,
            end: start + Duration::minutes(minutes as i64),
        }
    }

    /// Duration of the interval in minutes.
    pub fn duration_minutes(&self) -> i64 {
        (self.end - self.start).num_minutes()
    }

    /// Half-open overlap test.
    ///
    /// Two intervals conflict iff `startA < endB && startB < endA`.
    /// Back-to-back intervals (one ending exactly where the other starts)
    /// do not conflict.
    pub fn conflicts_with(&self, other: &Interval) -> bool {
        self.start < other.end && other.start < self.end
    }

    /// Whether any interval in the slice conflicts with this one.
    pub fn conflicts_with_any(&self, others: &[Interval]) -> bool {
        others.iter().any(|o| self.conflicts_with(o))
    }
}

// ============================================================================
// TimeSlot
// ============================================================================

/// A candidate or confirmed slot of calendar time.
///
/// The date / time-of-day fields are the user-facing rendering of the
/// derived instants; `end - start` always equals the requested duration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct TimeSlot {
    /// Calendar date of the slot.
    pub date: NaiveDate,
    /// Local start time of day.
    pub start_time: NaiveTime,
    /// Local end time of day.
    pub end_time: NaiveTime,
    /// Derived start instant.
    pub start: DateTime<Utc>,
    /// Derived end instant.
    pub end: DateTime<Utc>,
}

impl TimeSlot {
    /// Build a slot from a start instant and a duration in minutes.
    pub fn from_start(start: DateTime<Utc>, duration_minutes: u32) -> Self {
        let end = start + Duration::minutes(duration_minutes as i64);
        Self {
            date: start.date_naive(),
            start_time: start.time(),
            end_time: end.time(),
            start,
            end,
        }
    }

    /// The slot as an interval for conflict testing.
    pub fn interval(&self) -> Interval {
        Interval {
            start: self.start,
            end: self.end,
        }
    }

    /// Duration of the slot in minutes.
    pub fn duration_minutes(&self) -> i64 {
        (self.end - self.start).num_minutes()
    }
}
