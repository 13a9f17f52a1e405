//! Types for the natural-language understanding boundary.

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

// ============================================================================
// Intent
// ============================================================================

/// Coarse classification of the user's goal for a turn.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    /// User wants to schedule a new appointment.
    BookAppointment,
    /// User wants to know when they are free.
    CheckAvailability,
    /// User wants to change an existing appointment.
    ModifyAppointment,
    /// User wants to cancel an appointment.
    CancelAppointment,
    /// General questions or conversation.
    GeneralQuery,
    /// Unrecognized intent.
    #[default]
    Unknown,
}

impl Intent {
    /// Parse an intent from its wire name.
    pub fn parse(s: &str) -> Self {
        match s {
            "book_appointment" => Self::BookAppointment,
            "check_availability" => Self::CheckAvailability,
            "modify_appointment" => Self::ModifyAppointment,
            "cancel_appointment" => Self::CancelAppointment,
            "general_query" => Self::GeneralQuery,
            _ => Self::Unknown,
        }
    }

    /// Wire name of the intent.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::BookAppointment => "book_appointment",
            Self::CheckAvailability => "check_availability",
            Self::ModifyAppointment => "modify_appointment",
            Self::CancelAppointment => "cancel_appointment",
            Self::GeneralQuery => "general_query",
            Self::Unknown => "unknown",
        }
    }

    /// Whether this intent feeds the booking pipeline.
    pub fn is_booking_related(&self) -> bool {
        matches!(self, Self::BookAppointment | Self::CheckAvailability)
    }
}

impl std::fmt::Display for Intent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ============================================================================
// Classification & Extraction Results
// ============================================================================

/// Result of classifying a user message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntentClassification {
    /// The classified intent.
    pub intent: Intent,
    /// Confidence in the classification (0.0 to 1.0).
    pub confidence: f32,
}

impl IntentClassification {
    /// Create a classification result.
    pub fn new(intent: Intent, confidence: f32) -> Self {
        Self { intent, confidence }
    }
}

/// Booking fields extracted from a single user message.
///
/// Every field is optional: absence means the message did not mention it,
/// never that a previously known value should be erased.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExtractedFields {
    /// Appointment title or purpose.
    #[serde(default)]
    pub title: Option<String>,
    /// Calendar date, relative phrases already resolved.
    #[serde(default)]
    pub date: Option<NaiveDate>,
    /// Start time of day (24-hour).
    #[serde(default)]
    pub start_time: Option<NaiveTime>,
    /// Duration in minutes.
    #[serde(default)]
    pub duration_minutes: Option<u32>,
    /// Attendee addresses mentioned in the message.
    #[serde(default)]
    pub attendees: Vec<String>,
    /// Additional details.
    #[serde(default)]
    pub description: Option<String>,
}

impl ExtractedFields {
    /// Whether nothing at all was extracted.
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.date.is_none()
            && self.start_time.is_none()
            && self.duration_minutes.is_none()
            && self.attendees.is_empty()
            && self.description.is_none()
    }
}
