//! REST API router and configuration.

use std::sync::Arc;

use axum::{
    http::{header, Method},
    routing::{delete, get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};

use crate::agent::BookingAgent;
use crate::api::handlers::{
    chat_handler, clear_handler, events_handler, health_handler, history_handler,
    recent_conversations_handler, ApiState,
};
use crate::calendar::CalendarProvider;

/// REST API configuration.
#[derive(Debug, Clone)]
pub struct RestApiConfig {
    /// Enable CORS.
    pub enable_cors: bool,
    /// API prefix (e.g., "/api/v1").
    pub prefix: String,
}

impl Default for RestApiConfig {
    fn default() -> Self {
        Self {
            enable_cors: true,
            prefix: "/api/v1".to_string(),
        }
    }
}

/// Create the REST API router.
///
/// Endpoints:
/// - POST   /api/v1/chat                       - Run one conversation turn
/// - GET    /api/v1/conversations              - Recent conversations
/// - GET    /api/v1/conversations/:id/history  - Turn history
/// - DELETE /api/v1/conversations/:id          - Clear a conversation
/// - GET    /api/v1/events                     - Bookings made through the agent
/// - GET    /health                            - Liveness and calendar reachability
pub fn create_rest_router(
    agent: Arc<BookingAgent>,
    calendar: Arc<dyn CalendarProvider>,
    config: &RestApiConfig,
) -> Router {
    let state = Arc::new(ApiState::new(agent, calendar));

    let api_routes = Router::new()
        .route("/chat", post(chat_handler))
        .route("/conversations", get(recent_conversations_handler))
        .route("/conversations/:id/history", get(history_handler))
        .route("/conversations/:id", delete(clear_handler))
        .route("/events", get(events_handler));

    let router = Router::new()
        .nest(&config.prefix, api_routes)
        .route("/health", get(health_handler))
        .with_state(state);

    if config.enable_cors {
        let cors = CorsLayer::new()
            .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
            .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
            .allow_origin(Any);

        router.layer(cors)
    } else {
        router
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calendar::InMemoryCalendar;
    use crate::config::SchedulingConfig;
    use crate::nlu::PatternNlu;
    use crate::session::InMemorySessionStore;

    #[tokio::test]
    async fn test_router_builds_with_defaults() {
        let calendar: Arc<InMemoryCalendar> = Arc::new(InMemoryCalendar::new());
        let agent = Arc::new(BookingAgent::new(
            Arc::new(PatternNlu::new()),
            calendar.clone(),
            Arc::new(InMemorySessionStore::new()),
            SchedulingConfig::default(),
        ));

        let _router = create_rest_router(agent, calendar, &RestApiConfig::default());
    }
}
