//! Problem definition and solution design: prompt, evaluate, revise.
//!
//! Both phases share one shape. The first visit shows the prompt and marks
//! the phase as awaiting a submission; each later message is a new version
//! of the same record and gets scored. A passing score approves the record
//! and moves on.

use super::{Orchestrator, OrchestratorError, Step, Turn};
use crate::application::workers::{
    EvaluationRequest, ProblemDraft, ReplyKind, SolutionDraft, Worker,
};
use crate::domain::foundation::{ProblemId, SolutionId, Timestamp};
use crate::domain::journey::Phase;
use crate::domain::portfolio::{Evaluation, ProblemDefinition, SolutionDesign};

pub(crate) const EVALUATION_FAILED: &str = "I had trouble evaluating your submission. \
Please send it again in a moment.";

impl Orchestrator {
    pub(super) async fn problem_definition(
        &self,
        turn: &mut Turn,
        input: Option<&str>,
    ) -> Result<Step, OrchestratorError> {
        let message = match input {
            Some(m) if turn.state.context.awaiting_problem && !m.trim().is_empty() => m,
            _ => {
                turn.state.context.awaiting_problem = true;
                return Ok(Step::Reply(self.guide.render(&ReplyKind::ProblemPrompt)));
            }
        };
        let project_id = turn
            .state
            .project_id
            .ok_or(OrchestratorError::MissingRecord("project"))?;

        let (draft, report) = ProblemDraft::from_submission(message);
        let existing = match turn.state.problem_id {
            Some(id) => Some(
                turn.load::<ProblemDefinition>(self.store.as_ref(), &id.to_string())
                    .await?,
            )
            .filter(|p| p.project_id == project_id),
            None => None,
        };

        let Some(evaluation) = self
            .evaluate(turn, EvaluationRequest::Problem(draft.clone()))
            .await
        else {
            return Ok(Step::Reply(EVALUATION_FAILED.to_string()));
        };

        let mut problem = match existing {
            Some(mut previous) => {
                previous.version += 1;
                previous.statement = draft.statement;
                previous.target_audience = draft.target_audience;
                previous.context = draft.context;
                previous.success_metrics = draft.success_metrics;
                previous.extraction = report;
                previous
            }
            None => ProblemDefinition {
                id: ProblemId::new(),
                project_id,
                statement: draft.statement,
                target_audience: draft.target_audience,
                context: draft.context,
                success_metrics: draft.success_metrics,
                evaluation: None,
                version: 1,
                created_at: Timestamp::now(),
                approved_at: None,
                extraction: report,
            },
        };

        let passed = evaluation.passed;
        let mean_score = evaluation.mean_score();
        let feedback = self
            .guide
            .render(&ReplyKind::ProblemFeedback(evaluation.clone()));
        problem.evaluation = Some(evaluation);
        problem.approved_at = passed.then(Timestamp::now);
        turn.stage(&problem)?;
        turn.state.problem_id = Some(problem.id);
        turn.state.problem_approved = passed;
        tracing::info!(
            journey = %turn.key(),
            problem_id = %problem.id,
            version = problem.version,
            mean_score,
            passed,
            "Problem definition evaluated"
        );

        if passed && self.transition(turn, Phase::SolutionDesign, "Problem definition approved") {
            return Ok(Step::Advance(feedback));
        }
        Ok(Step::Reply(feedback))
    }

    pub(super) async fn solution_design(
        &self,
        turn: &mut Turn,
        input: Option<&str>,
    ) -> Result<Step, OrchestratorError> {
        let message = match input {
            Some(m) if turn.state.context.awaiting_solution && !m.trim().is_empty() => m,
            _ => {
                turn.state.context.awaiting_solution = true;
                return Ok(Step::Reply(self.guide.render(&ReplyKind::SolutionPrompt)));
            }
        };
        let problem_id = turn
            .state
            .problem_id
            .ok_or(OrchestratorError::MissingRecord("problem definition"))?;
        let problem: ProblemDefinition = turn
            .load(self.store.as_ref(), &problem_id.to_string())
            .await?;

        let (draft, report) = SolutionDraft::from_submission(message);
        let existing = match turn.state.solution_id {
            Some(id) => Some(
                turn.load::<SolutionDesign>(self.store.as_ref(), &id.to_string())
                    .await?,
            )
            .filter(|s| s.problem_id == problem_id),
            None => None,
        };

        let request = EvaluationRequest::Solution {
            solution: draft.clone(),
            problem_statement: Some(problem.statement),
        };
        let Some(evaluation) = self.evaluate(turn, request).await else {
            return Ok(Step::Reply(EVALUATION_FAILED.to_string()));
        };

        let mut solution = match existing {
            Some(mut previous) => {
                previous.version += 1;
                previous.approach = draft.approach;
                previous.key_components = draft.key_components;
                previous.methodology = draft.methodology;
                previous.expected_outcomes = draft.expected_outcomes;
                previous.resource_requirements = draft.resource_requirements;
                previous.extraction = report;
                previous
            }
            None => SolutionDesign {
                id: SolutionId::new(),
                problem_id,
                approach: draft.approach,
                key_components: draft.key_components,
                methodology: draft.methodology,
                expected_outcomes: draft.expected_outcomes,
                resource_requirements: draft.resource_requirements,
                evaluation: None,
                version: 1,
                created_at: Timestamp::now(),
                approved_at: None,
                extraction: report,
            },
        };

        let passed = evaluation.passed;
        let mean_score = evaluation.mean_score();
        let feedback = self
            .guide
            .render(&ReplyKind::SolutionFeedback(evaluation.clone()));
        solution.evaluation = Some(evaluation);
        solution.approved_at = passed.then(Timestamp::now);
        turn.stage(&solution)?;
        turn.state.solution_id = Some(solution.id);
        turn.state.solution_approved = passed;
        tracing::info!(
            journey = %turn.key(),
            solution_id = %solution.id,
            version = solution.version,
            mean_score,
            passed,
            "Solution design evaluated"
        );

        if passed && self.transition(turn, Phase::Execution, "Solution design approved") {
            return Ok(Step::Advance(feedback));
        }
        Ok(Step::Reply(feedback))
    }

    /// Runs the evaluator; `None` when it failed.
    async fn evaluate(&self, turn: &Turn, request: EvaluationRequest) -> Option<Evaluation> {
        let mode = request.mode();
        match self
            .evaluator
            .process(&self.context(turn), request)
            .await
            .into_result()
        {
            Ok(evaluation) => Some(evaluation),
            Err(message) => {
                tracing::warn!(journey = %turn.key(), ?mode, error = %message, "Evaluation failed");
                None
            }
        }
    }
}
