//! Integration tests for the chat HTTP surface.
//!
//! Requests go through the full router, layers included, with a scripted
//! oracle and an in-memory store behind it.

use std::sync::Arc;
use std::time::Duration;

use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

use sapiens::adapters::ai::MockAIProvider;
use sapiens::adapters::http::{chat_router, ChatAppState};
use sapiens::adapters::storage::InMemoryJourneyStore;
use sapiens::application::{JourneyQueries, Oracle, Orchestrator};

// =============================================================================
// Test Infrastructure
// =============================================================================

const PROPOSAL: &str = "## Title\nChurn Radar\n\n## Description\nFlag users about to leave.\n";

fn app(provider: MockAIProvider) -> Router {
    let store = Arc::new(InMemoryJourneyStore::new());
    let orchestrator = Orchestrator::new(Oracle::new(Arc::new(provider)), store.clone());
    chat_router(
        ChatAppState::new(Arc::new(orchestrator), JourneyQueries::new(store)),
        Duration::from_secs(5),
        &[],
    )
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

fn chat(body: Value) -> Request<Body> {
    Request::post("/api/chat")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::get(uri).body(Body::empty()).unwrap()
}

// =============================================================================
// POST /api/chat
// =============================================================================

#[tokio::test]
async fn chat_returns_reply_and_phase() {
    let app = app(MockAIProvider::new());

    let (status, body) = send(&app, chat(json!({"user_id": "u1", "message": "Hi"}))).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["phase"], "onboarding");
    assert!(body["reply"].as_str().unwrap().starts_with("Welcome to Sapiens!"));
}

#[tokio::test]
async fn chat_rejects_blank_user() {
    let app = app(MockAIProvider::new());

    let (status, body) = send(&app, chat(json!({"user_id": " ", "message": "Hi"}))).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "BAD_REQUEST");
}

#[tokio::test]
async fn chat_rejects_malformed_json() {
    let app = app(MockAIProvider::new());
    let request = Request::post("/api/chat")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert!(response.status().is_client_error());
}

// =============================================================================
// GET endpoints
// =============================================================================

#[tokio::test]
async fn state_is_not_found_before_first_message() {
    let app = app(MockAIProvider::new());

    let (status, body) = send(&app, get("/api/state/nobody")).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "NOT_FOUND");
}

#[tokio::test]
async fn state_and_project_follow_the_conversation() {
    let app = app(MockAIProvider::new().with_worker_response("proposal_generator", PROPOSAL));
    for message in ["Hi", "Data Analyst", "Retail", "skip", "skip"] {
        let (status, _) = send(
            &app,
            chat(json!({"user_id": "u1", "room_id": "r1", "message": message})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }

    let (status, state) = send(&app, get("/api/state/u1?room_id=r1")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(state["journey"], "u1:r1");
    assert_eq!(state["phase"], "project_generation");
    assert_eq!(state["target_role"], "Data Analyst");
    assert_eq!(state["project_approved"], false);

    let (status, project) = send(&app, get("/api/project/u1?room_id=r1")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(project["status"], "proposed");
    assert_eq!(project["proposal"]["title"], "Churn Radar");

    let (status, _) = send(&app, get("/api/state/u1")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn project_is_not_found_during_onboarding() {
    let app = app(MockAIProvider::new());
    send(&app, chat(json!({"user_id": "u2", "message": "Hi"}))).await;

    let (status, _) = send(&app, get("/api/project/u2")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn conversation_returns_most_recent_turns() {
    let app = app(MockAIProvider::new());
    for message in ["Hi", "Data Analyst"] {
        send(&app, chat(json!({"user_id": "u3", "message": message}))).await;
    }

    let (status, body) = send(&app, get("/api/conversation/u3?limit=2")).await;

    assert_eq!(status, StatusCode::OK);
    let turns = body["turns"].as_array().unwrap();
    assert_eq!(turns.len(), 2);
    assert_eq!(turns[0]["role"], "user");
    assert_eq!(turns[0]["content"], "Data Analyst");
    assert_eq!(turns[1]["role"], "assistant");
}
