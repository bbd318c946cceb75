//! HTTP adapter for the chat surface.
//!
//! One POST endpoint feeds messages to the orchestrator; the GET endpoints
//! read what it persisted.

pub mod dto;
pub mod handlers;
pub mod locks;
pub mod routes;

pub use dto::{ChatRequest, ChatResponse, ConversationResponse, ErrorResponse, JourneyStateView, ProjectView};
pub use handlers::{ApiError, ChatAppState};
pub use locks::KeyedLocks;
pub use routes::{chat_router, chat_routes};
