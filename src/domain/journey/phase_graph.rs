//! Pure transition decisions: edge table plus required-field guards.
//!
//! Nothing here mutates state or performs I/O. The orchestrator asks
//! [`can_transition`] and applies the result itself.

use std::fmt;

use super::phase::Phase;
use crate::domain::foundation::StateMachine;

/// A state field a target phase may require to be present and truthy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum GuardField {
    TargetRole,
    TargetDomain,
    ProjectId,
    ProjectApproved,
    ProblemId,
    ProblemApproved,
    SolutionId,
    SolutionApproved,
    MilestonesCompleted,
    ReviewId,
    ResumeGenerated,
}

impl GuardField {
    pub fn as_str(&self) -> &'static str {
        match self {
            GuardField::TargetRole => "target_role",
            GuardField::TargetDomain => "target_domain",
            GuardField::ProjectId => "project_id",
            GuardField::ProjectApproved => "project_approved",
            GuardField::ProblemId => "problem_id",
            GuardField::ProblemApproved => "problem_approved",
            GuardField::SolutionId => "solution_id",
            GuardField::SolutionApproved => "solution_approved",
            GuardField::MilestonesCompleted => "milestones_completed",
            GuardField::ReviewId => "review_id",
            GuardField::ResumeGenerated => "resume_generated",
        }
    }
}

impl fmt::Display for GuardField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Read-only view of whatever state the guards inspect.
pub trait GuardSnapshot {
    /// True when the field is present and truthy.
    fn has(&self, field: GuardField) -> bool;
}

/// Fields that must hold before entering `target`.
pub fn required_fields(target: Phase) -> &'static [GuardField] {
    use GuardField::*;
    match target {
        Phase::Onboarding | Phase::ProjectGeneration => &[TargetRole, TargetDomain],
        Phase::ProblemDefinition => &[ProjectId, ProjectApproved],
        Phase::SolutionDesign => &[ProblemId, ProblemApproved],
        Phase::Execution => &[SolutionId, SolutionApproved],
        Phase::Review => &[MilestonesCompleted],
        Phase::Completed => &[ReviewId, ResumeGenerated],
    }
}

/// Whether `from -> to` is an edge of the fixed graph.
pub fn is_valid_transition(from: Phase, to: Phase) -> bool {
    from.can_transition_to(&to)
}

/// Outcome of a guarded transition check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransitionDecision {
    pub allowed: bool,
    pub reason: String,
}

impl TransitionDecision {
    fn allow() -> Self {
        Self {
            allowed: true,
            reason: "Transition allowed".to_string(),
        }
    }

    fn deny(reason: String) -> Self {
        Self {
            allowed: false,
            reason,
        }
    }
}

/// Decides whether `from -> to` may happen given the snapshot.
pub fn can_transition(from: Phase, to: Phase, snapshot: &impl GuardSnapshot) -> TransitionDecision {
    if !is_valid_transition(from, to) {
        return TransitionDecision::deny(format!("Invalid transition from {} to {}", from, to));
    }
    match required_fields(to).iter().find(|f| !snapshot.has(**f)) {
        Some(missing) => TransitionDecision::deny(format!("Missing required field: {}", missing)),
        None => TransitionDecision::allow(),
    }
}
