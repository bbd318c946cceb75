//! PostgreSQL adapters.
//!
//! - `PostgresJourneyStore` - JSONB-backed journey persistence

mod journey_store;

pub use journey_store::PostgresJourneyStore;
