//! Adapters - Implementations of port interfaces.
//!
//! - `ai` - OpenAI-compatible oracle and a scripted mock
//! - `storage` - in-memory journey store
//! - `postgres` - PostgreSQL journey store
//! - `retrieval` - in-memory knowledge base for proposal context
//! - `http` - axum host for the orchestrator

pub mod ai;
pub mod http;
pub mod postgres;
pub mod retrieval;
pub mod storage;
