//! Execution: build the milestone plan, then track progress reports.

use super::{Orchestrator, OrchestratorError, Step, Turn};
use crate::application::workers::{
    CoachOutput, CoachRequest, PlanInput, ProgressInput, ReplyKind, Worker,
};
use crate::domain::foundation::Timestamp;
use crate::domain::journey::{JourneyEvent, Phase};
use crate::domain::portfolio::{
    Milestone, MilestoneStatus, ProblemDefinition, Project, ProjectStatus, ProgressUpdate,
    SolutionDesign,
};

const PLAN_FAILED: &str = "I had trouble creating your execution plan. \
Please send any message to try again.";

const PROGRESS_FAILED: &str = "I had trouble processing your update. Please try again.";

const NEXT_ACTION_PHRASES: &[&str] = &[
    "what's next",
    "whats next",
    "what next",
    "what now",
    "next step",
    "next action",
    "what should i do",
];

pub(crate) fn asks_for_next_action(message: &str) -> bool {
    let lowered = message.to_lowercase();
    NEXT_ACTION_PHRASES.iter().any(|p| lowered.contains(p))
}

impl Orchestrator {
    pub(super) async fn execution(
        &self,
        turn: &mut Turn,
        input: Option<&str>,
    ) -> Result<Step, OrchestratorError> {
        if turn.state.milestone_ids.is_empty() {
            return self.create_plan(turn).await;
        }
        match input {
            Some(message) if !message.trim().is_empty() && !asks_for_next_action(message) => {
                self.update_progress(turn, message).await
            }
            _ => self.current_next_action(turn).await,
        }
    }

    async fn create_plan(&self, turn: &mut Turn) -> Result<Step, OrchestratorError> {
        let state = &turn.state;
        let project_id = state.project_id.ok_or(OrchestratorError::MissingRecord("project"))?;
        let problem_id = state
            .problem_id
            .ok_or(OrchestratorError::MissingRecord("problem definition"))?;
        let solution_id = state
            .solution_id
            .ok_or(OrchestratorError::MissingRecord("solution design"))?;

        let store = self.store.as_ref();
        let mut project: Project = turn.load(store, &project_id.to_string()).await?;
        let problem: ProblemDefinition = turn.load(store, &problem_id.to_string()).await?;
        let solution: SolutionDesign = turn.load(store, &solution_id.to_string()).await?;

        let request = CoachRequest::CreatePlan(PlanInput {
            project_id,
            project_title: project.title().to_string(),
            problem,
            solution,
        });
        let mut plan = match self.coach.process(&self.context(turn), request).await.into_result() {
            Ok(CoachOutput::Plan(plan)) => plan,
            Ok(_) => return Err(OrchestratorError::UnexpectedOutput("execution_coach")),
            Err(message) => {
                tracing::warn!(journey = %turn.key(), error = %message, "Plan creation failed");
                return Ok(Step::Reply(PLAN_FAILED.to_string()));
            }
        };

        if let Some(first) = plan.milestones.first_mut() {
            first.apply_status(MilestoneStatus::InProgress);
        }
        for milestone in &plan.milestones {
            turn.stage(milestone)?;
        }
        if project.status == ProjectStatus::Approved {
            project.start()?;
            turn.stage(&project)?;
        }

        let state = &mut turn.state;
        state.milestone_ids = plan.milestones.iter().map(|m| m.id).collect();
        state.current_milestone_id = plan.milestones.first().map(|m| m.id);
        state.total_milestones = plan.milestones.len() as u32;
        state.milestones_completed = 0;
        state.execution_started_at = Some(Timestamp::now());
        tracing::info!(
            journey = %turn.key(),
            milestones = plan.milestones.len(),
            total_days = plan.total_estimated_days,
            "Execution plan created"
        );

        Ok(Step::Reply(self.guide.render(&ReplyKind::ExecutionPlan(plan))))
    }

    async fn current_next_action(&self, turn: &mut Turn) -> Result<Step, OrchestratorError> {
        let request = CoachRequest::GetNextAction {
            milestones: self.milestones(turn).await?,
            current: turn.state.current_milestone_id,
        };
        match self.coach.process(&self.context(turn), request).await.into_result() {
            Ok(CoachOutput::NextAction(next)) => Ok(Step::Reply(
                self.guide.render(&ReplyKind::NextAction(next.action)),
            )),
            Ok(_) => Err(OrchestratorError::UnexpectedOutput("execution_coach")),
            Err(message) => {
                tracing::warn!(journey = %turn.key(), error = %message, "Next action lookup failed");
                Ok(Step::Reply(PROGRESS_FAILED.to_string()))
            }
        }
    }

    async fn update_progress(&self, turn: &mut Turn, message: &str) -> Result<Step, OrchestratorError> {
        let Some(current_id) = turn.state.current_milestone_id else {
            // Every milestone is done but review was never entered.
            return self.finish_execution(turn, String::new());
        };
        let mut milestone: Milestone = turn
            .load(self.store.as_ref(), &current_id.to_string())
            .await?;

        let request = CoachRequest::UpdateProgress(ProgressInput {
            milestone: milestone.clone(),
            update_text: message.to_string(),
            blockers: Vec::new(),
        });
        let mut assessment = match self.coach.process(&self.context(turn), request).await.into_result() {
            Ok(CoachOutput::Progress(assessment)) => assessment,
            Ok(_) => return Err(OrchestratorError::UnexpectedOutput("execution_coach")),
            Err(error) => {
                tracing::warn!(journey = %turn.key(), error = %error, "Progress update failed");
                return Ok(Step::Reply(PROGRESS_FAILED.to_string()));
            }
        };

        let before = milestone.status;
        let changed = milestone.apply_status(assessment.status);
        if changed {
            tracing::info!(
                journey = %turn.key(),
                milestone_id = %milestone.id,
                from = %before,
                to = %milestone.status,
                "Milestone status changed"
            );
        }
        turn.log(JourneyEvent::Progress(ProgressUpdate {
            milestone_id: milestone.id,
            update_text: message.to_string(),
            status_before: before,
            status_after: milestone.status,
            stagnation_detected: assessment.stagnation_detected,
            feedback: assessment.feedback.clone(),
            timestamp: Timestamp::now(),
        }));
        turn.stage(&milestone)?;
        assessment.status = milestone.status;

        if changed && milestone.status == MilestoneStatus::Completed {
            turn.state.milestones_completed += 1;
            match self.next_open_milestone(turn).await? {
                Some(mut next) => {
                    next.apply_status(MilestoneStatus::InProgress);
                    turn.stage(&next)?;
                    turn.state.current_milestone_id = Some(next.id);
                    assessment.next_action = next
                        .next_action
                        .clone()
                        .unwrap_or_else(|| format!("Start working on: {}", next.title));
                }
                None => turn.state.current_milestone_id = None,
            }
            if turn.state.all_milestones_completed() {
                let text = self.guide.render(&ReplyKind::MilestoneUpdate(assessment));
                return self.finish_execution(turn, text);
            }
        }

        Ok(Step::Reply(
            self.guide.render(&ReplyKind::MilestoneUpdate(assessment)),
        ))
    }

    fn finish_execution(&self, turn: &mut Turn, lead: String) -> Result<Step, OrchestratorError> {
        if self.transition(turn, Phase::Review, "All milestones completed") {
            return Ok(Step::Advance(lead));
        }
        if lead.is_empty() {
            return Ok(Step::Reply(
                self.guide
                    .render(&ReplyKind::NextAction("Keep working on your milestones.".into())),
            ));
        }
        Ok(Step::Reply(lead))
    }

    /// Milestones in plan order, preferring this turn's staged copies.
    pub(super) async fn milestones(&self, turn: &Turn) -> Result<Vec<Milestone>, OrchestratorError> {
        let mut milestones = Vec::with_capacity(turn.state.milestone_ids.len());
        for id in &turn.state.milestone_ids {
            milestones.push(turn.load(self.store.as_ref(), &id.to_string()).await?);
        }
        Ok(milestones)
    }

    async fn next_open_milestone(&self, turn: &Turn) -> Result<Option<Milestone>, OrchestratorError> {
        Ok(self
            .milestones(turn)
            .await?
            .into_iter()
            .find(|m| !m.is_done()))
    }

    /// Reopens the most recently finished milestone after going back from review.
    pub(super) async fn reopen_last_milestone(&self, turn: &mut Turn) -> Result<(), OrchestratorError> {
        let last_completed = self
            .milestones(turn)
            .await?
            .into_iter()
            .filter(|m| m.status == MilestoneStatus::Completed)
            .max_by_key(|m| m.order);
        let Some(mut milestone) = last_completed else {
            return Ok(());
        };
        if milestone.apply_status(MilestoneStatus::InProgress) {
            turn.stage(&milestone)?;
            turn.state.milestones_completed = turn.state.milestones_completed.saturating_sub(1);
            turn.state.current_milestone_id = Some(milestone.id);
            tracing::info!(journey = %turn.key(), milestone_id = %milestone.id, "Milestone reopened");
        }
        Ok(())
    }
}
