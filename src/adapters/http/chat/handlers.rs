//! HTTP handlers for the chat endpoints.

use std::sync::Arc;

use axum::extract::{Json, Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;

use super::dto::{
    ChatRequest, ChatResponse, ConversationQueryParams, ConversationResponse, ErrorResponse,
    JourneyQueryParams, JourneyStateView, ProjectView,
};
use super::locks::KeyedLocks;
use crate::application::{journey_key, JourneyQueries, Orchestrator, DEFAULT_HISTORY_LIMIT};
use crate::domain::foundation::{JourneyKey, ValidationError};
use crate::ports::StoreError;

/// Largest history page a client may request.
const MAX_HISTORY_LIMIT: usize = 500;

/// Shared state for the chat handlers.
#[derive(Clone)]
pub struct ChatAppState {
    pub orchestrator: Arc<Orchestrator>,
    pub queries: JourneyQueries,
    pub locks: KeyedLocks,
}

impl ChatAppState {
    pub fn new(orchestrator: Arc<Orchestrator>, queries: JourneyQueries) -> Self {
        Self {
            orchestrator,
            queries,
            locks: KeyedLocks::new(),
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// GET /health
// ════════════════════════════════════════════════════════════════════════════════

pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

// ════════════════════════════════════════════════════════════════════════════════
// POST /api/chat
// ════════════════════════════════════════════════════════════════════════════════

/// Runs one orchestrator pass.
///
/// Always 200 once the key is valid; processing failures come back as the
/// apology reply with a null phase.
pub async fn chat(
    State(state): State<ChatAppState>,
    Json(request): Json<ChatRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let key = journey_key(&request.user_id, request.room_id.as_deref())?;
    let _guard = state.locks.acquire(&key.to_string()).await;

    let reply = state
        .orchestrator
        .respond(&request.user_id, request.room_id.as_deref(), &request.message)
        .await;
    Ok((
        StatusCode::OK,
        Json(ChatResponse {
            reply: reply.reply,
            phase: reply.phase,
        }),
    ))
}

// ════════════════════════════════════════════════════════════════════════════════
// GET /api/state/:user_id
// ════════════════════════════════════════════════════════════════════════════════

pub async fn get_state(
    State(state): State<ChatAppState>,
    Path(user_id): Path<String>,
    Query(params): Query<JourneyQueryParams>,
) -> Result<impl IntoResponse, ApiError> {
    let key = key_from(&user_id, params.room_id.as_deref())?;
    let journey = state
        .queries
        .get_state(&key)
        .await?
        .ok_or_else(|| ApiError::NotFound("Journey", key.to_string()))?;
    Ok(Json(JourneyStateView::from(&journey)))
}

// ════════════════════════════════════════════════════════════════════════════════
// GET /api/project/:user_id
// ════════════════════════════════════════════════════════════════════════════════

pub async fn get_project(
    State(state): State<ChatAppState>,
    Path(user_id): Path<String>,
    Query(params): Query<JourneyQueryParams>,
) -> Result<impl IntoResponse, ApiError> {
    let key = key_from(&user_id, params.room_id.as_deref())?;
    let project = state
        .queries
        .get_project(&key)
        .await?
        .ok_or_else(|| ApiError::NotFound("Project", key.to_string()))?;
    Ok(Json(ProjectView::from(project)))
}

// ════════════════════════════════════════════════════════════════════════════════
// GET /api/conversation/:user_id
// ════════════════════════════════════════════════════════════════════════════════

pub async fn get_conversation(
    State(state): State<ChatAppState>,
    Path(user_id): Path<String>,
    Query(params): Query<ConversationQueryParams>,
) -> Result<impl IntoResponse, ApiError> {
    let key = key_from(&user_id, params.room_id.as_deref())?;
    let limit = params
        .limit
        .unwrap_or(DEFAULT_HISTORY_LIMIT)
        .clamp(1, MAX_HISTORY_LIMIT);
    let turns = state.queries.get_conversation(&key, limit).await?;
    Ok(Json(ConversationResponse {
        journey: key.to_string(),
        turns,
    }))
}

fn key_from(user_id: &str, room_id: Option<&str>) -> Result<JourneyKey, ApiError> {
    Ok(journey_key(user_id, room_id)?)
}

// ════════════════════════════════════════════════════════════════════════════════
// Errors
// ════════════════════════════════════════════════════════════════════════════════

#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    NotFound(&'static str, String),
    Internal(String),
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        ApiError::BadRequest(err.to_string())
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        ApiError::Internal(err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let (status, error) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, ErrorResponse::bad_request(msg)),
            ApiError::NotFound(resource, journey) => (
                StatusCode::NOT_FOUND,
                ErrorResponse::not_found(resource, &journey),
            ),
            ApiError::Internal(msg) => {
                tracing::error!(error = %msg, "Internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorResponse::internal("An internal error occurred"),
                )
            }
        };

        (status, Json(error)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_errors_are_bad_requests() {
        let response = ApiError::from(ValidationError::empty_field("user_id")).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn store_errors_are_internal() {
        let response = ApiError::from(StoreError::Storage("down".to_string())).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn missing_resources_are_not_found() {
        let response = ApiError::NotFound("Journey", "u1".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
