//! Application layer - the orchestrator, its workers, and read queries.
//!
//! The orchestrator is the only writer of journey state. Workers are
//! stateless and reach the outside world only through the oracle handle they
//! are given. Queries read what the orchestrator persisted.

pub mod orchestrator;
pub mod queries;
pub mod workers;

pub use orchestrator::{journey_key, ChatReply, Orchestrator, OrchestratorError, APOLOGY};
pub use queries::{JourneyQueries, DEFAULT_HISTORY_LIMIT};
pub use workers::{Oracle, Worker, WorkerContext, WorkerError, WorkerResponse};
