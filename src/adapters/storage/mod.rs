//! Journey storage adapters.
//!
//! - `InMemoryJourneyStore` - process memory, for tests and local runs
//!
//! The PostgreSQL store lives in `adapters::postgres`.

mod in_memory_journey_store;

pub use in_memory_journey_store::InMemoryJourneyStore;
