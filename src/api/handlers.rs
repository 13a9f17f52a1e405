//! REST API request handlers.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::error;

use crate::agent::{compose, BookingAgent, ChatResponse};
use crate::booking::BookingRecord;
use crate::calendar::CalendarProvider;
use crate::session::ChatTurn;

/// Application state shared across handlers.
pub struct ApiState {
    /// The conversation orchestrator.
    pub agent: Arc<BookingAgent>,
    /// Calendar provider handle, used by the health probe.
    pub calendar: Arc<dyn CalendarProvider>,
}

impl ApiState {
    /// Create new API state.
    pub fn new(agent: Arc<BookingAgent>, calendar: Arc<dyn CalendarProvider>) -> Self {
        Self { agent, calendar }
    }
}

// ============================================================================
// Request/Response Types
// ============================================================================

/// Chat turn request.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatRequest {
    /// User message.
    pub message: String,
    /// Unique conversation identifier.
    pub conversation_id: String,
}

/// Conversation history response.
#[derive(Debug, Clone, Serialize)]
pub struct HistoryResponse {
    pub conversation_id: String,
    pub history: Vec<ChatTurn>,
}

/// Summary of a conversation for listings.
#[derive(Debug, Clone, Serialize)]
pub struct ConversationSummary {
    pub conversation_id: String,
    pub turn_count: usize,
    pub created_at: chrono::DateTime<Utc>,
    pub updated_at: chrono::DateTime<Utc>,
}

/// Query parameters for the events listing.
#[derive(Debug, Clone, Deserialize)]
pub struct EventsQuery {
    /// Restrict to one conversation.
    #[serde(default)]
    pub conversation_id: Option<String>,
}

/// Booked events response.
#[derive(Debug, Clone, Serialize)]
pub struct EventsResponse {
    pub events: Vec<BookingRecord>,
}

/// Health check response.
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub calendar: &'static str,
    pub timestamp: chrono::DateTime<Utc>,
}

/// Error body returned on handler failure.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorBody {
    pub error: String,
}

fn internal_error(e: impl std::fmt::Display) -> (StatusCode, Json<ErrorBody>) {
    error!("Handler failed: {e}");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorBody {
            error: e.to_string(),
        }),
    )
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /chat - run one conversation turn.
///
/// This handler never fails for NLU or calendar reasons; those are
/// absorbed into the composed outcome.
pub async fn chat_handler(
    State(state): State<Arc<ApiState>>,
    Json(request): Json<ChatRequest>,
) -> Json<ChatResponse> {
    let outcome = state
        .agent
        .handle_turn(&request.conversation_id, &request.message)
        .await;
    Json(compose(&outcome, &request.conversation_id))
}

/// GET /conversations/:id/history - persisted turn history.
pub async fn history_handler(
    State(state): State<Arc<ApiState>>,
    Path(conversation_id): Path<String>,
) -> Result<Json<HistoryResponse>, (StatusCode, Json<ErrorBody>)> {
    let session = state
        .agent
        .conversation_history(&conversation_id)
        .await
        .map_err(internal_error)?;

    Ok(Json(HistoryResponse {
        conversation_id,
        history: session.turns,
    }))
}

/// DELETE /conversations/:id - clear a conversation.
pub async fn clear_handler(
    State(state): State<Arc<ApiState>>,
    Path(conversation_id): Path<String>,
) -> Result<Json<serde_json::Value>, (StatusCode, Json<ErrorBody>)> {
    state
        .agent
        .clear_conversation(&conversation_id)
        .await
        .map_err(internal_error)?;

    Ok(Json(serde_json::json!({
        "message": format!("Conversation {conversation_id} cleared successfully")
    })))
}

/// GET /conversations - recently active conversations.
pub async fn recent_conversations_handler(
    State(state): State<Arc<ApiState>>,
) -> Result<Json<Vec<ConversationSummary>>, (StatusCode, Json<ErrorBody>)> {
    let sessions = state
        .agent
        .store()
        .list_recent_sessions(20)
        .await
        .map_err(internal_error)?;

    let summaries = sessions
        .into_iter()
        .map(|s| ConversationSummary {
            conversation_id: s.conversation_id,
            turn_count: s.turns.len(),
            created_at: s.created_at,
            updated_at: s.updated_at,
        })
        .collect();

    Ok(Json(summaries))
}

/// GET /events - bookings confirmed through the agent.
pub async fn events_handler(
    State(state): State<Arc<ApiState>>,
    Query(query): Query<EventsQuery>,
) -> Result<Json<EventsResponse>, (StatusCode, Json<ErrorBody>)> {
    let events = state
        .agent
        .store()
        .booking_records(query.conversation_id.as_deref())
        .await
        .map_err(internal_error)?;

    Ok(Json(EventsResponse { events }))
}

/// GET /health - liveness plus calendar reachability.
pub async fn health_handler(State(state): State<Arc<ApiState>>) -> impl IntoResponse {
    let now = Utc::now();
    let reachable = state
        .calendar
        .list_busy_intervals(now, now + Duration::hours(1))
        .await
        .is_ok();

    Json(HealthResponse {
        status: if reachable { "healthy" } else { "degraded" },
        calendar: if reachable { "connected" } else { "disconnected" },
        timestamp: now,
    })
}
