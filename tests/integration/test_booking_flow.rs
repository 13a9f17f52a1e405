//! End-to-end booking flow scenarios.

use std::collections::VecDeque;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use tokio::sync::Mutex;

use concierge::config::SchedulingConfig;
use concierge::error::{ProviderError, Result};
use concierge::{
    AgentOutcome, BookingAgent, CalendarProvider, ChatTurn, ExtractedFields, InMemoryCalendar,
    InMemorySessionStore, Intent, IntentClassification, Interval, NewEvent, NluProvider,
};

// ============================================================================
// Test Doubles
// ============================================================================

/// NLU double with a fixed intent and a queue of per-turn extractions.
struct ScriptedNlu {
    intent: Intent,
    extractions: Mutex<VecDeque<ExtractedFields>>,
}

impl ScriptedNlu {
    fn new(intent: Intent, extractions: Vec<ExtractedFields>) -> Self {
        Self {
            intent,
            extractions: Mutex::new(extractions.into()),
        }
    }
}

#[async_trait]
impl NluProvider for ScriptedNlu {
    async fn classify_intent(
        &self,
        _text: &str,
        _history: &[ChatTurn],
    ) -> Result<IntentClassification> {
        Ok(IntentClassification::new(self.intent, 0.95))
    }

    async fn extract_fields(&self, _text: &str, _now: DateTime<Utc>) -> Result<ExtractedFields> {
        let mut queue = self.extractions.lock().await;
        Ok(queue.pop_front().unwrap_or_default())
    }

    async fn complete_freeform(&self, _text: &str, _context: &str) -> Result<String> {
        Ok("How can I help with your calendar?".to_string())
    }
}

/// Calendar double whose every call fails.
struct UnreachableCalendar;

#[async_trait]
impl CalendarProvider for UnreachableCalendar {
    async fn list_busy_intervals(
        &self,
        _window_start: DateTime<Utc>,
        _window_end: DateTime<Utc>,
    ) -> Result<Vec<Interval>> {
        Err(ProviderError::Connection("connection refused".to_string()).into())
    }

    async fn create_event(&self, _event: NewEvent) -> Result<String> {
        Err(ProviderError::Connection("connection refused".to_string()).into())
    }
}

/// Calendar double that reads fine but rejects writes.
struct ReadOnlyCalendar;

#[async_trait]
impl CalendarProvider for ReadOnlyCalendar {
    async fn list_busy_intervals(
        &self,
        _window_start: DateTime<Utc>,
        _window_end: DateTime<Utc>,
    ) -> Result<Vec<Interval>> {
        Ok(vec![])
    }

    async fn create_event(&self, _event: NewEvent) -> Result<String> {
        Err(ProviderError::Api("insufficient permissions".to_string()).into())
    }
}

// ============================================================================
// Helpers
// ============================================================================

fn tomorrow() -> NaiveDate {
    Utc::now().date_naive() + Duration::days(1)
}

fn at(date: NaiveDate, h: u32, m: u32) -> DateTime<Utc> {
    DateTime::from_naive_utc_and_offset(
        date.and_time(NaiveTime::from_hms_opt(h, m, 0).unwrap()),
        Utc,
    )
}

fn call_tomorrow_at_ten() -> ExtractedFields {
    ExtractedFields {
        title: Some("call".to_string()),
        date: Some(tomorrow()),
        start_time: NaiveTime::from_hms_opt(10, 0, 0),
        duration_minutes: Some(30),
        ..Default::default()
    }
}

fn agent(nlu: Arc<dyn NluProvider>, calendar: Arc<dyn CalendarProvider>) -> BookingAgent {
    BookingAgent::new(
        nlu,
        calendar,
        Arc::new(InMemorySessionStore::new()),
        SchedulingConfig::default(),
    )
}

// ============================================================================
// Scenarios
// ============================================================================

#[tokio::test]
async fn booking_a_free_slot_confirms_directly() {
    let calendar = Arc::new(InMemoryCalendar::new());
    let nlu = Arc::new(ScriptedNlu::new(
        Intent::BookAppointment,
        vec![call_tomorrow_at_ten()],
    ));
    let agent = agent(nlu, calendar.clone());

    let outcome = agent
        .handle_turn("conv-1", "book a 30 min call tomorrow at 10am")
        .await;

    match outcome {
        AgentOutcome::BookingConfirmed(record) => {
            assert_eq!(record.start, at(tomorrow(), 10, 0));
            assert_eq!(record.end, at(tomorrow(), 10, 30));
            assert_eq!(record.title, "call");
        }
        other => panic!("expected confirmation, got {other:?}"),
    }
    assert_eq!(calendar.event_count().await, 1);
}

#[tokio::test]
async fn conflicting_request_yields_free_alternatives() {
    let calendar = Arc::new(InMemoryCalendar::new());
    calendar
        .add_busy("Existing", at(tomorrow(), 10, 0), at(tomorrow(), 10, 30))
        .await;

    let nlu = Arc::new(ScriptedNlu::new(
        Intent::BookAppointment,
        vec![call_tomorrow_at_ten()],
    ));
    let agent = agent(nlu, calendar.clone());

    let outcome = agent
        .handle_turn("conv-1", "book a 30 min call tomorrow at 10am")
        .await;

    let slots = match outcome {
        AgentOutcome::SlotSuggestions(slots) => slots,
        other => panic!("expected suggestions, got {other:?}"),
    };

    assert!(!slots.is_empty() && slots.len() <= 3);
    let busy = Interval::new(at(tomorrow(), 10, 0), at(tomorrow(), 10, 30)).unwrap();
    for slot in &slots {
        assert_eq!(slot.duration_minutes(), 30);
        assert!(
            !slot.interval().conflicts_with(&busy),
            "suggested slot overlaps the busy interval"
        );
    }
    // Nothing was booked.
    assert_eq!(calendar.event_count().await, 1);
}

#[tokio::test]
async fn fields_accumulate_until_the_request_completes() {
    let calendar = Arc::new(InMemoryCalendar::new());
    let nlu = Arc::new(ScriptedNlu::new(
        Intent::BookAppointment,
        vec![
            // Turn 1: only a date.
            ExtractedFields {
                date: Some(tomorrow()),
                ..Default::default()
            },
            // Turn 2: only a title.
            ExtractedFields {
                title: Some("Dentist".to_string()),
                ..Default::default()
            },
            // Turn 3: only a time; the accumulated request is complete.
            ExtractedFields {
                start_time: NaiveTime::from_hms_opt(10, 0, 0),
                ..Default::default()
            },
        ],
    ));
    let agent = agent(nlu, calendar);

    let outcome = agent.handle_turn("conv-1", "book something tomorrow").await;
    match outcome {
        AgentOutcome::Clarification(question) => assert_eq!(
            question,
            "I need to know the purpose or title of your appointment and what time you'd like \
             to meet to book your appointment."
        ),
        other => panic!("expected clarification, got {other:?}"),
    }

    // Title arrives; date is remembered from turn 1, so the agent can
    // search, but without a time it suggests rather than books.
    let outcome = agent.handle_turn("conv-1", "it's a dentist visit").await;
    assert!(matches!(outcome, AgentOutcome::SlotSuggestions(_)));

    // Time arrives; everything else is remembered.
    let outcome = agent.handle_turn("conv-1", "10am works").await;
    match outcome {
        AgentOutcome::BookingConfirmed(record) => {
            assert_eq!(record.title, "Dentist");
            assert_eq!(record.start, at(tomorrow(), 10, 0));
        }
        other => panic!("expected confirmation, got {other:?}"),
    }
}

#[tokio::test]
async fn fully_booked_horizon_asks_for_another_range() {
    let calendar = Arc::new(InMemoryCalendar::new());
    // One block covering the entire search horizon.
    calendar
        .add_busy(
            "Offsite",
            at(Utc::now().date_naive(), 0, 0),
            at(Utc::now().date_naive() + Duration::days(10), 0, 0),
        )
        .await;

    let nlu = Arc::new(ScriptedNlu::new(
        Intent::BookAppointment,
        vec![ExtractedFields {
            title: Some("call".to_string()),
            date: Some(tomorrow()),
            ..Default::default()
        }],
    ));
    let agent = agent(nlu, calendar);

    let outcome = agent.handle_turn("conv-1", "book a call tomorrow").await;
    match outcome {
        AgentOutcome::Clarification(question) => {
            assert!(question.contains("couldn't find any available slots"));
        }
        other => panic!("expected clarification, got {other:?}"),
    }
}

#[tokio::test]
async fn unreachable_calendar_surfaces_a_failure_notice() {
    let nlu = Arc::new(ScriptedNlu::new(
        Intent::BookAppointment,
        vec![call_tomorrow_at_ten()],
    ));
    let agent = agent(nlu, Arc::new(UnreachableCalendar));

    let outcome = agent
        .handle_turn("conv-1", "book a 30 min call tomorrow at 10am")
        .await;

    match outcome {
        AgentOutcome::Clarification(notice) => {
            assert!(notice.contains("trouble reaching your calendar"));
        }
        other => panic!("expected failure notice, got {other:?}"),
    }

    // The failed turn is still recorded in history.
    let session = agent.conversation_history("conv-1").await.unwrap();
    assert_eq!(session.turns.len(), 2);
}

#[tokio::test]
async fn failed_event_creation_surfaces_a_failure_notice() {
    let nlu = Arc::new(ScriptedNlu::new(
        Intent::BookAppointment,
        vec![call_tomorrow_at_ten()],
    ));
    let agent = agent(nlu, Arc::new(ReadOnlyCalendar));

    let outcome = agent
        .handle_turn("conv-1", "book a 30 min call tomorrow at 10am")
        .await;

    match outcome {
        AgentOutcome::Clarification(notice) => {
            assert!(notice.contains("wasn't able to create the booking"));
        }
        other => panic!("expected failure notice, got {other:?}"),
    }
}

#[tokio::test]
async fn check_availability_intent_suggests_without_booking() {
    let calendar = Arc::new(InMemoryCalendar::new());
    let nlu = Arc::new(ScriptedNlu::new(
        Intent::CheckAvailability,
        vec![ExtractedFields {
            title: Some("sync".to_string()),
            date: Some(tomorrow()),
            ..Default::default()
        }],
    ));
    let agent = agent(nlu, calendar.clone());

    let outcome = agent.handle_turn("conv-1", "when am I free tomorrow?").await;
    assert!(matches!(outcome, AgentOutcome::SlotSuggestions(_)));
    assert_eq!(calendar.event_count().await, 0);
}

#[tokio::test]
async fn confirmed_booking_is_persisted_as_a_side_record() {
    let calendar = Arc::new(InMemoryCalendar::new());
    let nlu = Arc::new(ScriptedNlu::new(
        Intent::BookAppointment,
        vec![call_tomorrow_at_ten()],
    ));
    let agent = agent(nlu, calendar);

    agent
        .handle_turn("conv-1", "book a 30 min call tomorrow at 10am")
        .await;

    let records = agent.store().booking_records(Some("conv-1")).await.unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].title, "call");
}

#[tokio::test]
async fn separate_conversations_do_not_share_state() {
    let calendar = Arc::new(InMemoryCalendar::new());
    let nlu = Arc::new(ScriptedNlu::new(
        Intent::BookAppointment,
        vec![
            ExtractedFields {
                title: Some("call".to_string()),
                date: Some(tomorrow()),
                start_time: NaiveTime::from_hms_opt(10, 0, 0),
                ..Default::default()
            },
            // Second conversation extracts nothing.
            ExtractedFields::default(),
        ],
    ));
    let agent = agent(nlu, calendar);

    let outcome = agent.handle_turn("conv-a", "book a call tomorrow at 10").await;
    assert!(matches!(outcome, AgentOutcome::BookingConfirmed(_)));

    // conv-b starts from a blank request and must be asked for everything.
    let outcome = agent.handle_turn("conv-b", "book it").await;
    match outcome {
        AgentOutcome::Clarification(question) => {
            assert!(question.contains("the purpose or title of your appointment"));
            assert!(question.contains("the date you'd prefer"));
            assert!(question.contains("what time you'd like to meet"));
        }
        other => panic!("expected clarification, got {other:?}"),
    }
}
