//! Session store trait and the embedded implementation.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;

use crate::agent::request::BookingRequest;
use crate::booking::BookingRecord;
use crate::error::Result;
use crate::nlu::Intent;

use super::types::{ChatTurn, ConversationSession, TurnRole};

// ============================================================================
// SessionStore Trait
// ============================================================================

/// Trait for session persistence backends.
///
/// The store is the single source of truth for conversation state: the
/// orchestrator loads a session at the start of every turn and writes the
/// turn log and state snapshot back through it, keeping no divergent copy
/// of its own. Distinct conversation ids must be safely accessible
/// concurrently.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Append a single turn to a conversation's history, creating the
    /// conversation if it is unseen.
    async fn append_turn(&self, conversation_id: &str, role: TurnRole, text: &str) -> Result<()>;

    /// Load a session snapshot, or `None` for an unseen id.
    async fn load_session(&self, conversation_id: &str) -> Result<Option<ConversationSession>>;

    /// Persist the accumulated request and current intent for a
    /// conversation, creating it if unseen.
    async fn save_state(
        &self,
        conversation_id: &str,
        request: &BookingRequest,
        intent: Option<Intent>,
    ) -> Result<()>;

    /// Persist a confirmed booking as a side record.
    async fn save_booking_record(&self, conversation_id: &str, record: &BookingRecord)
        -> Result<()>;

    /// Remove a conversation and its state.
    async fn clear_session(&self, conversation_id: &str) -> Result<()>;

    /// Recently updated sessions, most recent first.
    async fn list_recent_sessions(&self, limit: usize) -> Result<Vec<ConversationSession>>;

    /// Persisted booking records, optionally for one conversation,
    /// ordered by start.
    async fn booking_records(&self, conversation_id: Option<&str>) -> Result<Vec<BookingRecord>>;
}

// ============================================================================
// Internal Data Structure
// ============================================================================

/// Internal storage for the embedded store.
#[derive(Debug, Default)]
struct SessionData {
    /// Sessions indexed by conversation id.
    sessions: HashMap<String, ConversationSession>,
    /// Booking records indexed by conversation id.
    bookings: HashMap<String, Vec<BookingRecord>>,
}

impl SessionData {
    fn session_mut(&mut self, conversation_id: &str) -> &mut ConversationSession {
        self.sessions
            .entry(conversation_id.to_string())
            .or_insert_with(|| ConversationSession::new(conversation_id))
    }
}

// ============================================================================
// In-Memory Session Store
// ============================================================================

/// Embedded session store.
///
/// Default backend when no external store is configured; session state
/// lives for the lifetime of the process.
#[derive(Default)]
pub struct InMemorySessionStore {
    data: Arc<RwLock<SessionData>>,
}

impl InMemorySessionStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn append_turn(&self, conversation_id: &str, role: TurnRole, text: &str) -> Result<()> {
        let mut data = self.data.write().await;
        let session = data.session_mut(conversation_id);
        session.turns.push(ChatTurn::new(role, text));
        session.updated_at = chrono::Utc::now();
        Ok(())
    }

    async fn load_session(&self, conversation_id: &str) -> Result<Option<ConversationSession>> {
        let data = self.data.read().await;
        Ok(data.sessions.get(conversation_id).cloned())
    }

    async fn save_state(
        &self,
        conversation_id: &str,
        request: &BookingRequest,
        intent: Option<Intent>,
    ) -> Result<()> {
        let mut data = self.data.write().await;
        let session = data.session_mut(conversation_id);
        session.request = request.clone();
        session.intent = intent;
        session.updated_at = chrono::Utc::now();
        Ok(())
    }

    async fn save_booking_record(
        &self,
        conversation_id: &str,
        record: &BookingRecord,
    ) -> Result<()> {
        let mut data = self.data.write().await;
        data.bookings
            .entry(conversation_id.to_string())
            .or_default()
            .push(record.clone());
        debug!(
            "Saved booking record {} for conversation {}",
            record.event_id, conversation_id
        );
        Ok(())
    }

    async fn clear_session(&self, conversation_id: &str) -> Result<()> {
        let mut data = self.data.write().await;
        data.sessions.remove(conversation_id);
        debug!("Cleared conversation {}", conversation_id);
        Ok(())
    }

    async fn list_recent_sessions(&self, limit: usize) -> Result<Vec<ConversationSession>> {
        let data = self.data.read().await;
        let mut sessions: Vec<ConversationSession> = data.sessions.values().cloned().collect();
        sessions.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        sessions.truncate(limit);
        Ok(sessions)
    }

    async fn booking_records(&self, conversation_id: Option<&str>) -> Result<Vec<BookingRecord>> {
        let data = self.data.read().await;
        let mut records: Vec<BookingRecord> = match conversation_id {
            Some(id) => data.bookings.get(id).cloned().unwrap_or_default(),
            None => data.bookings.values().flatten().cloned().collect(),
        };
        records.sort_by(|a, b| a.start.cmp(&b.start));
        Ok(records)
    }
}
