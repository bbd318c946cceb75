//! Domain layer - journey state, portfolio records, and the extraction protocol.
//!
//! Nothing in here performs I/O.

pub mod extraction;
pub mod foundation;
pub mod journey;
pub mod portfolio;
