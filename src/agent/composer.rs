//! Response composition.
//!
//! Pure mapping from an [`AgentOutcome`] to the outward response shape:
//! the rendered text plus the structured payload a transport returns to
//! its caller.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::booking::BookingRecord;
use crate::interval::TimeSlot;

use super::orchestrator::AgentOutcome;

/// Outward response for one conversation turn.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ChatResponse {
    /// Rendered response text.
    pub response: String,
    /// Conversation identifier.
    pub conversation_id: String,
    /// When the response was composed.
    pub timestamp: DateTime<Utc>,
    /// Whether the turn completed normally. Always true here: failed
    /// collaborators surface as clarification text, not as failures.
    pub success: bool,
    /// Structured booking payload, when the turn confirmed one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub booking: Option<BookingRecord>,
    /// Suggested slots, when the turn produced alternatives.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggested_slots: Option<Vec<TimeSlot>>,
}

/// Render the user-facing text for an outcome.
pub fn render_text(outcome: &AgentOutcome) -> String {
    match outcome {
        AgentOutcome::Clarification(question) => question.clone(),
        AgentOutcome::GeneralReply(text) => text.clone(),
        AgentOutcome::BookingConfirmed(record) => format!(
            "Great! I've successfully booked your appointment '{}' for {} at {}.",
            record.title,
            record.start.format("%Y-%m-%d"),
            record.start.format("%H:%M"),
        ),
        AgentOutcome::SlotSuggestions(slots) => {
            let mut text = String::from(
                "I found some available time slots for you. Please let me know which one works best:",
            );
            for (i, slot) in slots.iter().enumerate() {
                text.push_str(&format!(
                    "\n{}. {} at {}-{}",
                    i + 1,
                    slot.date,
                    slot.start_time.format("%H:%M"),
                    slot.end_time.format("%H:%M"),
                ));
            }
            text
        }
    }
}

/// Compose the full outward response for an outcome.
pub fn compose(outcome: &AgentOutcome, conversation_id: &str) -> ChatResponse {
    let response = render_text(outcome);
    let (booking, suggested_slots) = match outcome {
        AgentOutcome::BookingConfirmed(record) => (Some(record.clone()), None),
        AgentOutcome::SlotSuggestions(slots) => (None, Some(slots.clone())),
        _ => (None, None),
    };

    ChatResponse {
        response,
        conversation_id: conversation_id.to_string(),
        timestamp: Utc::now(),
        success: true,
        booking,
        suggested_slots,
    }
}
