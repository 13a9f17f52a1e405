//! The per-turn conversation orchestrator.
//!
//! Each inbound message runs a finite, acyclic pipeline:
//!
//! ```text
//! ClassifyIntent -> { ExtractFields | Clarify | GeneralReply }
//! ExtractFields  -> { CheckAvailability | Clarify }
//! CheckAvailability -> { ConfirmBooking | SuggestSlots | Clarify }
//! ```
//!
//! The routing depends only on the turn's classification/extraction and
//! the session's accumulated request, so every turn reaches a terminal
//! outcome in a bounded number of steps. No error from a collaborator
//! escapes: NLU failures degrade to safe defaults, calendar failures
//! surface as a clarification carrying a failure notice, and store
//! failures are logged and skipped.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, error, warn};

use crate::availability::AvailabilityResolver;
use crate::booking::{BookingExecutor, BookingRecord, DEFAULT_DURATION_MINUTES};
use crate::calendar::CalendarProvider;
use crate::config::SchedulingConfig;
use crate::error::Result;
use crate::interval::TimeSlot;
use crate::nlu::{ExtractedFields, Intent, IntentClassification, NluProvider};
use crate::session::{ConversationSession, SessionStore, TurnRole};

use super::composer;

/// Notice shown when the calendar provider cannot be reached.
const CALENDAR_UNAVAILABLE: &str =
    "I'm having trouble reaching your calendar right now. Please try again in a moment.";

/// Notice shown when event creation fails.
const BOOKING_FAILED: &str =
    "I wasn't able to create the booking with your calendar provider. Would you like me to try again?";

/// Notice shown when no free slots exist in the search horizon.
const NO_SLOTS_FOUND: &str = "I couldn't find any available slots in the timeframe you requested. \
     Would you like me to check a different date range?";

/// Fallback reply when freeform completion fails.
const GENERAL_FALLBACK: &str =
    "I can help you book appointments on your calendar. What would you like to schedule?";

// ============================================================================
// Agent Outcome
// ============================================================================

/// The terminal result of one conversation turn. Exactly one variant per
/// turn.
#[derive(Debug, Clone)]
pub enum AgentOutcome {
    /// A targeted question for the user.
    Clarification(String),
    /// Concrete alternative slots, non-empty, in start order.
    SlotSuggestions(Vec<TimeSlot>),
    /// The booking was created.
    BookingConfirmed(BookingRecord),
    /// Freeform reply to a general query.
    GeneralReply(String),
}

// ============================================================================
// Booking Agent
// ============================================================================

/// The conversation orchestrator.
///
/// Turns for the same conversation id are serialized through a
/// per-conversation lock; turns for different ids run in parallel.
pub struct BookingAgent {
    nlu: Arc<dyn NluProvider>,
    resolver: AvailabilityResolver,
    executor: BookingExecutor,
    store: Arc<dyn SessionStore>,
    scheduling: SchedulingConfig,
    turn_locks: RwLock<HashMap<String, Arc<Mutex<()>>>>,
}

impl BookingAgent {
    /// Wire an agent from its collaborators.
    pub fn new(
        nlu: Arc<dyn NluProvider>,
        calendar: Arc<dyn CalendarProvider>,
        store: Arc<dyn SessionStore>,
        scheduling: SchedulingConfig,
    ) -> Self {
        let resolver =
            AvailabilityResolver::with_params(calendar.clone(), scheduling.params());
        let executor = BookingExecutor::new(calendar);
        Self {
            nlu,
            resolver,
            executor,
            store,
            scheduling,
            turn_locks: RwLock::new(HashMap::new()),
        }
    }

    /// Process one inbound message and return the turn's outcome.
    ///
    /// This is the single entry point for transport adapters. It is
    /// side-effecting: the user message and the composed response are
    /// appended to the conversation's history, the accumulated request
    /// is persisted, and a confirmed booking is saved as a side record.
    pub async fn handle_turn(&self, conversation_id: &str, user_text: &str) -> AgentOutcome {
        let lock = self.turn_lock(conversation_id).await;
        let _serialized = lock.lock().await;

        let mut session = self.load_or_create(conversation_id).await;
        session.push_turn(TurnRole::User, user_text);
        self.record_turn(conversation_id, TurnRole::User, user_text)
            .await;

        let outcome = self.run_pipeline(&mut session, user_text).await;

        let response_text = composer::render_text(&outcome);
        session.push_turn(TurnRole::Assistant, &response_text);
        self.record_turn(conversation_id, TurnRole::Assistant, &response_text)
            .await;

        if let Err(e) = self
            .store
            .save_state(conversation_id, &session.request, session.intent)
            .await
        {
            warn!("Failed to persist session state for {conversation_id}: {e}");
        }

        if let AgentOutcome::BookingConfirmed(ref record) = outcome {
            if let Err(e) = self.store.save_booking_record(conversation_id, record).await {
                warn!("Failed to persist booking record {}: {e}", record.event_id);
            }
        }

        outcome
    }

    /// Conversation history as currently persisted.
    pub async fn conversation_history(&self, conversation_id: &str) -> Result<ConversationSession> {
        Ok(self
            .store
            .load_session(conversation_id)
            .await?
            .unwrap_or_else(|| ConversationSession::new(conversation_id)))
    }

    /// Remove a conversation and its state.
    pub async fn clear_conversation(&self, conversation_id: &str) -> Result<()> {
        self.store.clear_session(conversation_id).await?;
        let mut locks = self.turn_locks.write().await;
        locks.remove(conversation_id);
        Ok(())
    }

    /// Access the backing session store.
    pub fn store(&self) -> &Arc<dyn SessionStore> {
        &self.store
    }

    // ========================================================================
    // Pipeline
    // ========================================================================

    async fn run_pipeline(
        &self,
        session: &mut ConversationSession,
        user_text: &str,
    ) -> AgentOutcome {
        let classification = self.classify(session, user_text).await;
        session.intent = Some(classification.intent);
        debug!(
            "Turn intent for {}: {} ({:.2})",
            session.conversation_id, classification.intent, classification.confidence
        );

        match classification.intent {
            intent if intent.is_booking_related() => {
                self.extract_and_route(session, user_text).await
            }
            Intent::GeneralQuery => self.general_reply(user_text).await,
            _ => AgentOutcome::Clarification(session.request.clarification_question()),
        }
    }

    async fn classify(
        &self,
        session: &ConversationSession,
        user_text: &str,
    ) -> IntentClassification {
        match self.nlu.classify_intent(user_text, &session.turns).await {
            Ok(classification) => classification,
            Err(e) => {
                warn!("Intent classification failed, assuming general query: {e}");
                IntentClassification::new(Intent::GeneralQuery, 0.0)
            }
        }
    }

    async fn extract_and_route(
        &self,
        session: &mut ConversationSession,
        user_text: &str,
    ) -> AgentOutcome {
        let fields = match self.nlu.extract_fields(user_text, Utc::now()).await {
            Ok(fields) => fields,
            Err(e) => {
                warn!("Field extraction failed, continuing with empty extraction: {e}");
                ExtractedFields::default()
            }
        };
        session.request.merge(fields);

        if !session.request.has_search_basis() {
            return AgentOutcome::Clarification(session.request.clarification_question());
        }

        self.check_availability(session).await
    }

    async fn check_availability(&self, session: &ConversationSession) -> AgentOutcome {
        let request = &session.request;
        let duration = request
            .duration_minutes
            .unwrap_or(DEFAULT_DURATION_MINUTES);

        // An exact requested time that is conflict-free books directly.
        if let (Some(date), Some(start_time)) = (request.date, request.start_time) {
            match self
                .resolver
                .check_exact_slot(date, start_time, duration)
                .await
            {
                Ok(true) => return self.confirm_booking(session).await,
                Ok(false) => {
                    debug!("Requested slot {date} {start_time} conflicts, searching alternatives")
                }
                Err(e) => {
                    error!("Exact slot check failed: {e}");
                    return AgentOutcome::Clarification(CALENDAR_UNAVAILABLE.to_string());
                }
            }
        }

        let today = Utc::now().date_naive();
        let candidate = match session.request.date {
            Some(date) if date >= today => date,
            _ => today,
        };

        match self
            .resolver
            .find_free_slots(
                candidate,
                duration,
                self.scheduling.suggestion_count,
                self.scheduling.horizon_days,
            )
            .await
        {
            Ok(slots) if !slots.is_empty() => AgentOutcome::SlotSuggestions(slots),
            Ok(_) => AgentOutcome::Clarification(NO_SLOTS_FOUND.to_string()),
            Err(e) => {
                error!("Slot search failed: {e}");
                AgentOutcome::Clarification(CALENDAR_UNAVAILABLE.to_string())
            }
        }
    }

    async fn confirm_booking(&self, session: &ConversationSession) -> AgentOutcome {
        match self.executor.create_booking(&session.request).await {
            Ok(record) => AgentOutcome::BookingConfirmed(record),
            Err(e) => {
                error!("Booking creation failed: {e}");
                AgentOutcome::Clarification(BOOKING_FAILED.to_string())
            }
        }
    }

    async fn general_reply(&self, user_text: &str) -> AgentOutcome {
        match self
            .nlu
            .complete_freeform(user_text, "This is a calendar booking assistant.")
            .await
        {
            Ok(reply) => AgentOutcome::GeneralReply(reply),
            Err(e) => {
                warn!("Freeform completion failed, using canned reply: {e}");
                AgentOutcome::GeneralReply(GENERAL_FALLBACK.to_string())
            }
        }
    }

    // ========================================================================
    // Helpers
    // ========================================================================

    async fn load_or_create(&self, conversation_id: &str) -> ConversationSession {
        match self.store.load_session(conversation_id).await {
            Ok(Some(session)) => session,
            Ok(None) => ConversationSession::new(conversation_id),
            Err(e) => {
                warn!("Session load failed for {conversation_id}, starting fresh: {e}");
                ConversationSession::new(conversation_id)
            }
        }
    }

    async fn record_turn(&self, conversation_id: &str, role: TurnRole, text: &str) {
        if let Err(e) = self.store.append_turn(conversation_id, role, text).await {
            warn!("Failed to append turn for {conversation_id}: {e}");
        }
    }

    async fn turn_lock(&self, conversation_id: &str) -> Arc<Mutex<()>> {
        {
            let locks = self.turn_locks.read().await;
            if let Some(lock) = locks.get(conversation_id) {
                return lock.clone();
            }
        }
        let mut locks = self.turn_locks.write().await;
        locks
            .entry(conversation_id.to_string())
            .or_default()
            .clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calendar::InMemoryCalendar;
    use crate::error::NluError;
    use crate::nlu::PatternNlu;
    use crate::session::InMemorySessionStore;
    use async_trait::async_trait;
    use chrono::{DateTime, Duration, NaiveTime};

    /// NLU double whose every call fails.
    struct FailingNlu;

    #[async_trait]
    impl NluProvider for FailingNlu {
        async fn classify_intent(
            &self,
            _text: &str,
            _history: &[crate::session::ChatTurn],
        ) -> Result<IntentClassification> {
            Err(NluError::Api("boom".to_string()).into())
        }

        async fn extract_fields(
            &self,
            _text: &str,
            _now: DateTime<Utc>,
        ) -> Result<ExtractedFields> {
            Err(NluError::Api("boom".to_string()).into())
        }

        async fn complete_freeform(&self, _text: &str, _context: &str) -> Result<String> {
            Err(NluError::Api("boom".to_string()).into())
        }
    }

    fn agent_with(calendar: Arc<InMemoryCalendar>) -> BookingAgent {
        BookingAgent::new(
            Arc::new(PatternNlu::new()),
            calendar,
            Arc::new(InMemorySessionStore::new()),
            SchedulingConfig::default(),
        )
    }

    fn tomorrow_at_ten() -> (chrono::NaiveDate, DateTime<Utc>) {
        let date = Utc::now().date_naive() + Duration::days(1);
        let start = crate::availability::to_utc(date, NaiveTime::from_hms_opt(10, 0, 0).unwrap());
        (date, start)
    }

    #[tokio::test]
    async fn test_free_exact_slot_books_directly() {
        let calendar = Arc::new(InMemoryCalendar::new());
        let agent = agent_with(calendar.clone());
        let (date, start) = tomorrow_at_ten();

        let outcome = agent
            .handle_turn("c1", "book a 30 min call tomorrow at 10am")
            .await;

        match outcome {
            AgentOutcome::BookingConfirmed(record) => {
                assert_eq!(record.start, start);
                assert_eq!(record.end, start + Duration::minutes(30));
                assert_eq!(record.start.date_naive(), date);
            }
            other => panic!("expected confirmation, got {other:?}"),
        }
        assert_eq!(calendar.event_count().await, 1);
    }

    #[tokio::test]
    async fn test_conflicting_slot_yields_alternatives() {
        let calendar = Arc::new(InMemoryCalendar::new());
        let (_, start) = tomorrow_at_ten();
        calendar
            .add_busy("Existing", start, start + Duration::minutes(30))
            .await;

        let agent = agent_with(calendar.clone());
        let outcome = agent
            .handle_turn("c1", "book a 30 min call tomorrow at 10am")
            .await;

        match outcome {
            AgentOutcome::SlotSuggestions(slots) => {
                assert!(!slots.is_empty() && slots.len() <= 3);
                for slot in &slots {
                    assert!(slot.start != start, "conflicting slot suggested");
                    assert_eq!(slot.duration_minutes(), 30);
                }
            }
            other => panic!("expected suggestions, got {other:?}"),
        }
        // No event was created beyond the seeded conflict.
        assert_eq!(calendar.event_count().await, 1);
    }

    #[tokio::test]
    async fn test_missing_fields_ask_for_clarification() {
        let agent = agent_with(Arc::new(InMemoryCalendar::new()));
        let outcome = agent.handle_turn("c1", "book something for me").await;

        match outcome {
            AgentOutcome::Clarification(question) => {
                assert!(question.contains("to book your appointment"));
            }
            other => panic!("expected clarification, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_fields_accumulate_across_turns() {
        let calendar = Arc::new(InMemoryCalendar::new());
        let agent = agent_with(calendar.clone());

        // Turn 1: date and time, no title.
        let outcome = agent.handle_turn("c1", "book tomorrow at 10am").await;
        assert!(matches!(outcome, AgentOutcome::Clarification(_)));

        // Turn 2: title only; accumulated request is now complete.
        let outcome = agent.handle_turn("c1", "book a \"Dentist\" visit").await;
        match outcome {
            AgentOutcome::BookingConfirmed(record) => {
                assert_eq!(record.title, "Dentist");
            }
            other => panic!("expected confirmation, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_nlu_failure_never_escapes() {
        let agent = BookingAgent::new(
            Arc::new(FailingNlu),
            Arc::new(InMemoryCalendar::new()),
            Arc::new(InMemorySessionStore::new()),
            SchedulingConfig::default(),
        );

        let outcome = agent.handle_turn("c1", "book a call tomorrow").await;
        // Classification fails -> general query -> freeform fails -> canned reply.
        match outcome {
            AgentOutcome::GeneralReply(text) => assert!(!text.is_empty()),
            other => panic!("expected general reply, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_general_query_passes_through() {
        let agent = agent_with(Arc::new(InMemoryCalendar::new()));
        let outcome = agent.handle_turn("c1", "hello!").await;
        assert!(matches!(outcome, AgentOutcome::GeneralReply(_)));
    }

    #[tokio::test]
    async fn test_unknown_intent_clarifies() {
        let agent = agent_with(Arc::new(InMemoryCalendar::new()));
        let outcome = agent.handle_turn("c1", "cancel my appointment").await;
        assert!(matches!(outcome, AgentOutcome::Clarification(_)));
    }

    #[tokio::test]
    async fn test_turn_history_is_recorded() {
        let agent = agent_with(Arc::new(InMemoryCalendar::new()));
        agent.handle_turn("c1", "hello!").await;

        let session = agent.conversation_history("c1").await.unwrap();
        assert_eq!(session.turns.len(), 2);
        assert_eq!(session.turns[0].role, TurnRole::User);
        assert_eq!(session.turns[0].text, "hello!");
        assert_eq!(session.turns[1].role, TurnRole::Assistant);
    }

    #[tokio::test]
    async fn test_confirmed_booking_saved_as_side_record() {
        let calendar = Arc::new(InMemoryCalendar::new());
        let agent = agent_with(calendar);

        agent
            .handle_turn("c1", "book a 30 min call tomorrow at 10am")
            .await;

        let records = agent.store().booking_records(Some("c1")).await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!((records[0].end - records[0].start).num_minutes(), 30);
    }

    #[tokio::test]
    async fn test_clear_conversation_resets_state() {
        let agent = agent_with(Arc::new(InMemoryCalendar::new()));
        agent.handle_turn("c1", "book tomorrow at 10am").await;
        agent.clear_conversation("c1").await.unwrap();

        let session = agent.conversation_history("c1").await.unwrap();
        assert!(session.turns.is_empty());
    }
}
