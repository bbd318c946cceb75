//! Durable per-journey state owned by the orchestrator.

use serde::{Deserialize, Serialize};

use super::phase::Phase;
use super::phase_graph::{GuardField, GuardSnapshot};
use crate::domain::foundation::{
    JourneyKey, MilestoneId, ProblemId, ProjectId, ResumeId, ReviewId, SolutionId, Timestamp,
};

/// Which onboarding answer the next message supplies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OnboardingStep {
    #[default]
    Role,
    Domain,
    Background,
    Interests,
    Done,
}

/// Sub-dialogue cursors that span several messages within a phase.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScratchContext {
    pub onboarding_step: OnboardingStep,
    /// The problem prompt was shown and the next message is a submission.
    pub awaiting_problem: bool,
    pub awaiting_solution: bool,
    pub awaiting_artifacts: bool,
    /// Titles of proposals the user turned down, newest last.
    pub rejected_proposals: Vec<String>,
}

/// One per journey key. Only the orchestrator mutates it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JourneyState {
    pub key: JourneyKey,
    pub current_phase: Phase,
    pub previous_phase: Option<Phase>,

    pub target_role: Option<String>,
    pub target_domain: Option<String>,
    pub background: Option<String>,
    pub interests: Option<String>,

    pub project_id: Option<ProjectId>,
    pub project_approved: bool,
    pub problem_id: Option<ProblemId>,
    pub problem_approved: bool,
    pub solution_id: Option<SolutionId>,
    pub solution_approved: bool,

    #[serde(default)]
    pub milestone_ids: Vec<MilestoneId>,
    pub current_milestone_id: Option<MilestoneId>,
    pub milestones_completed: u32,
    pub total_milestones: u32,
    pub execution_started_at: Option<Timestamp>,

    pub review_id: Option<ReviewId>,
    pub resume_id: Option<ResumeId>,
    pub resume_generated: bool,

    #[serde(default)]
    pub context: ScratchContext,

    pub created_at: Timestamp,
    pub state_entered_at: Timestamp,
    pub last_activity_at: Timestamp,
}

impl JourneyState {
    /// Fresh journey at the start of onboarding.
    pub fn new(key: JourneyKey) -> Self {
        let now = Timestamp::now();
        Self {
            key,
            current_phase: Phase::Onboarding,
            previous_phase: None,
            target_role: None,
            target_domain: None,
            background: None,
            interests: None,
            project_id: None,
            project_approved: false,
            problem_id: None,
            problem_approved: false,
            solution_id: None,
            solution_approved: false,
            milestone_ids: Vec::new(),
            current_milestone_id: None,
            milestones_completed: 0,
            total_milestones: 0,
            execution_started_at: None,
            review_id: None,
            resume_id: None,
            resume_generated: false,
            context: ScratchContext::default(),
            created_at: now,
            state_entered_at: now,
            last_activity_at: now,
        }
    }

    /// Moves to `to` without checking the graph; callers consult the phase
    /// graph first.
    pub fn enter_phase(&mut self, to: Phase) {
        self.previous_phase = Some(self.current_phase);
        self.current_phase = to;
        self.state_entered_at = Timestamp::now();
    }

    pub fn touch(&mut self) {
        self.last_activity_at = Timestamp::now();
    }

    pub fn all_milestones_completed(&self) -> bool {
        self.total_milestones > 0 && self.milestones_completed >= self.total_milestones
    }
}

fn present(value: &Option<String>) -> bool {
    value.as_deref().is_some_and(|v| !v.trim().is_empty())
}

impl GuardSnapshot for JourneyState {
    fn has(&self, field: GuardField) -> bool {
        match field {
            GuardField::TargetRole => present(&self.target_role),
            GuardField::TargetDomain => present(&self.target_domain),
            GuardField::ProjectId => self.project_id.is_some(),
            GuardField::ProjectApproved => self.project_approved,
            GuardField::ProblemId => self.problem_id.is_some(),
            GuardField::ProblemApproved => self.problem_approved,
            GuardField::SolutionId => self.solution_id.is_some(),
            GuardField::SolutionApproved => self.solution_approved,
            GuardField::MilestonesCompleted => self.milestones_completed > 0,
            GuardField::ReviewId => self.review_id.is_some(),
            GuardField::ResumeGenerated => self.resume_generated,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::UserId;
    use crate::domain::journey::phase_graph::can_transition;

    fn test_state() -> JourneyState {
        JourneyState::new(JourneyKey::for_user(UserId::new("learner").unwrap()))
    }

    #[test]
    fn new_state_starts_in_onboarding() {
        let state = test_state();
        assert_eq!(state.current_phase, Phase::Onboarding);
        assert!(state.previous_phase.is_none());
        assert_eq!(state.context.onboarding_step, OnboardingStep::Role);
    }

    #[test]
    fn enter_phase_records_previous() {
        let mut state = test_state();
        state.enter_phase(Phase::ProjectGeneration);
        assert_eq!(state.previous_phase, Some(Phase::Onboarding));
        assert_eq!(state.current_phase, Phase::ProjectGeneration);
    }

    #[test]
    fn blank_role_is_not_truthy() {
        let mut state = test_state();
        state.target_role = Some("  ".to_string());
        state.target_domain = Some("FinTech".to_string());
        let decision = can_transition(Phase::Onboarding, Phase::ProjectGeneration, &state);
        assert_eq!(decision.reason, "Missing required field: target_role");

        state.target_role = Some("Product Manager".to_string());
        assert!(can_transition(Phase::Onboarding, Phase::ProjectGeneration, &state).allowed);
    }

    #[test]
    fn review_requires_a_completed_milestone() {
        let mut state = test_state();
        assert!(!state.has(GuardField::MilestonesCompleted));
        state.milestones_completed = 1;
        assert!(state.has(GuardField::MilestonesCompleted));
    }

    #[test]
    fn state_round_trips_through_json() {
        let mut state = test_state();
        state.project_id = Some(ProjectId::new());
        state.context.rejected_proposals.push("Old idea".to_string());
        let json = serde_json::to_string(&state).unwrap();
        let back: JourneyState = serde_json::from_str(&json).unwrap();
        assert_eq!(back, state);
    }
}
