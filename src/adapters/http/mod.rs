//! HTTP adapters - REST API implementations.
//!
//! - `chat` - the chat endpoint plus journey read endpoints

pub mod chat;

pub use chat::{chat_router, ChatAppState};
