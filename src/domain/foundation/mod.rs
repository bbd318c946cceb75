//! Foundation module - Shared domain primitives.
//!
//! Identifiers, timestamps, the state machine trait, and error types
//! used by every other layer.

mod errors;
mod ids;
mod state_machine;
mod timestamp;

pub use errors::ValidationError;
pub use ids::{
    JourneyKey, MilestoneId, ProblemId, ProjectId, RequestId, ResumeId, ReviewId, RoomId,
    SolutionId, UserId,
};
pub use state_machine::StateMachine;
pub use timestamp::Timestamp;
