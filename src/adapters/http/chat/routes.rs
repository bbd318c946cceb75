//! Axum routes for the chat surface.

use std::time::Duration;

use axum::http::{HeaderValue, Method};
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use super::handlers::{chat, get_conversation, get_project, get_state, health, ChatAppState};

/// Routes nested under `/api`:
/// - POST /api/chat
/// - GET /api/state/:user_id?room_id=
/// - GET /api/project/:user_id?room_id=
/// - GET /api/conversation/:user_id?room_id=&limit=
pub fn chat_routes() -> Router<ChatAppState> {
    Router::new()
        .route("/chat", post(chat))
        .route("/state/:user_id", get(get_state))
        .route("/project/:user_id", get(get_project))
        .route("/conversation/:user_id", get(get_conversation))
}

/// Full application router with tracing, timeout, and CORS layers.
///
/// An empty `cors_origins` allows any origin.
pub fn chat_router(state: ChatAppState, request_timeout: Duration, cors_origins: &[String]) -> Router {
    Router::new()
        .route("/health", get(health))
        .nest("/api", chat_routes())
        .layer(TimeoutLayer::new(request_timeout))
        .layer(cors_layer(cors_origins))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST])
        .allow_headers(Any);
    let parsed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|o| HeaderValue::from_str(o).ok())
        .collect();
    if parsed.is_empty() {
        layer.allow_origin(Any)
    } else {
        layer.allow_origin(parsed)
    }
}
