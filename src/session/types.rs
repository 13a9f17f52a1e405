//! Conversation session types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::agent::request::BookingRequest;
use crate::nlu::Intent;

/// Who authored a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TurnRole {
    User,
    Assistant,
}

/// A single message in a conversation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatTurn {
    /// Author of the turn.
    pub role: TurnRole,
    /// Message text.
    pub text: String,
    /// When the turn was recorded.
    pub timestamp: DateTime<Utc>,
}

impl ChatTurn {
    /// Create a turn stamped with the current time.
    pub fn new(role: TurnRole, text: impl Into<String>) -> Self {
        Self {
            role,
            text: text.into(),
            timestamp: Utc::now(),
        }
    }
}

/// The running state of one conversation.
///
/// Owned by the orchestrator; the session store only ever persists a
/// serialized snapshot. Created on the first message for an unseen id,
/// mutated every turn, removed only by an explicit clear.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationSession {
    /// Conversation identity.
    pub conversation_id: String,
    /// Ordered turn history.
    #[serde(default)]
    pub turns: Vec<ChatTurn>,
    /// Booking fields accumulated across turns.
    #[serde(default)]
    pub request: BookingRequest,
    /// Most recently classified intent.
    #[serde(default)]
    pub intent: Option<Intent>,
    /// When the session was created.
    pub created_at: DateTime<Utc>,
    /// When the session was last touched.
    pub updated_at: DateTime<Utc>,
}

impl ConversationSession {
    /// Create a fresh session for a conversation id.
    pub fn new(conversation_id: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            conversation_id: conversation_id.into(),
            turns: Vec::new(),
            request: BookingRequest::default(),
            intent: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Append a turn and bump the update stamp.
    pub fn push_turn(&mut self, role: TurnRole, text: impl Into<String>) {
        self.turns.push(ChatTurn::new(role, text));
        self.updated_at = Utc::now();
    }
}
