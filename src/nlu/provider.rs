//! NLU provider trait.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::Result;
use crate::session::ChatTurn;

use super::types::{ExtractedFields, IntentClassification};

/// Trait for natural-language understanding backends.
///
/// Any error from these calls is recovered by the orchestrator: a failed
/// classification degrades to a general-query intent and a failed
/// extraction to an empty one, so a broken NLU backend can never abort
/// a turn.
#[async_trait]
pub trait NluProvider: Send + Sync {
    /// Classify the user's intent for a message, given recent history.
    async fn classify_intent(
        &self,
        text: &str,
        history: &[ChatTurn],
    ) -> Result<IntentClassification>;

    /// Extract booking fields from a message. Relative dates ("tomorrow")
    /// are resolved against `now`.
    async fn extract_fields(&self, text: &str, now: DateTime<Utc>) -> Result<ExtractedFields>;

    /// Produce a freeform assistant reply for a general query.
    async fn complete_freeform(&self, text: &str, context: &str) -> Result<String>;
}
