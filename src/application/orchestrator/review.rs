//! Review: collect artifacts, review them, then deliver resume content.

use super::{Orchestrator, OrchestratorError, Step, Turn};
use crate::application::workers::{
    Approval, ReplyKind, ResumeInput, ReviewInput, ReviewerOutput, ReviewerRequest, Worker,
};
use crate::domain::journey::Phase;
use crate::domain::portfolio::{
    ArtifactReview, ArtifactSubmission, Milestone, MilestoneStatus, ProblemDefinition, Project,
    ProjectStatus, SolutionDesign,
};

const ARTIFACT_TYPE: &str = "Project Deliverable";

const REVIEW_FAILED: &str = "I had trouble reviewing your artifacts. \
Please send your submission again.";

const RESUME_FAILED: &str = "I had trouble generating your resume content. \
Reply Yes to try again.";

const RESUME_NOT_YET: &str = "Take your time reviewing the feedback. \
When you're ready for your resume content, just reply Yes.";

/// One artifact per non-empty line; the first link on a line becomes its URL.
pub(crate) fn parse_artifacts(message: &str) -> Vec<ArtifactSubmission> {
    message
        .lines()
        .map(|line| line.trim().trim_start_matches(['-', '*', '•']).trim())
        .filter(|line| !line.is_empty())
        .map(|line| ArtifactSubmission {
            artifact_type: ARTIFACT_TYPE.to_string(),
            description: line.to_string(),
            url: first_link(line),
        })
        .collect()
}

fn first_link(line: &str) -> Option<String> {
    line.split_whitespace()
        .find(|word| word.starts_with("http://") || word.starts_with("https://"))
        .map(|word| {
            word.trim_end_matches(|c: char| matches!(c, '.' | ',' | ')' | ';' | '!' | '?'))
                .to_string()
        })
}

impl Orchestrator {
    pub(super) async fn review(
        &self,
        turn: &mut Turn,
        input: Option<&str>,
    ) -> Result<Step, OrchestratorError> {
        let Some(review_id) = turn.state.review_id else {
            return match input {
                Some(m) if turn.state.context.awaiting_artifacts && !m.trim().is_empty() => {
                    self.review_artifacts(turn, m).await
                }
                _ => {
                    turn.state.context.awaiting_artifacts = true;
                    Ok(Step::Reply(self.guide.render(&ReplyKind::ReviewRequest)))
                }
            };
        };

        let Some(message) = input else {
            let review: ArtifactReview = turn
                .load(self.store.as_ref(), &review_id.to_string())
                .await?;
            return Ok(Step::Reply(
                self.guide.render(&ReplyKind::ReviewFeedback(review)),
            ));
        };

        match self.approvals.classify(message) {
            Approval::Approved => self.generate_resume(turn, review_id.to_string()).await,
            Approval::Rejected | Approval::Unclear => Ok(Step::Reply(RESUME_NOT_YET.to_string())),
        }
    }

    async fn review_artifacts(&self, turn: &mut Turn, message: &str) -> Result<Step, OrchestratorError> {
        let store = self.store.as_ref();
        let project_id = turn
            .state
            .project_id
            .ok_or(OrchestratorError::MissingRecord("project"))?;
        let project: Project = turn.load(store, &project_id.to_string()).await?;
        let problem_statement = match turn.state.problem_id {
            Some(id) => Some(
                turn.load::<ProblemDefinition>(store, &id.to_string())
                    .await?
                    .statement,
            ),
            None => None,
        };
        let solution_approach = match turn.state.solution_id {
            Some(id) => Some(
                turn.load::<SolutionDesign>(store, &id.to_string())
                    .await?
                    .approach,
            ),
            None => None,
        };

        let request = ReviewerRequest::ReviewArtifacts(ReviewInput {
            project,
            artifacts: parse_artifacts(message),
            problem_statement,
            solution_approach,
        });
        let review = match self.reviewer.process(&self.context(turn), request).await.into_result() {
            Ok(ReviewerOutput::Review(review)) => review,
            Ok(_) => return Err(OrchestratorError::UnexpectedOutput("reviewer")),
            Err(error) => {
                tracing::warn!(journey = %turn.key(), error = %error, "Artifact review failed");
                return Ok(Step::Reply(REVIEW_FAILED.to_string()));
            }
        };

        turn.stage(&review)?;
        turn.state.review_id = Some(review.id);
        turn.state.context.awaiting_artifacts = false;
        tracing::info!(
            journey = %turn.key(),
            review_id = %review.id,
            score = review.overall_score,
            "Artifacts reviewed"
        );
        Ok(Step::Reply(
            self.guide.render(&ReplyKind::ReviewFeedback(review)),
        ))
    }

    async fn generate_resume(&self, turn: &mut Turn, review_id: String) -> Result<Step, OrchestratorError> {
        let store = self.store.as_ref();
        let project_id = turn
            .state
            .project_id
            .ok_or(OrchestratorError::MissingRecord("project"))?;
        let mut project: Project = turn.load(store, &project_id.to_string()).await?;
        let review: ArtifactReview = turn.load(store, &review_id).await?;
        let problem = match turn.state.problem_id {
            Some(id) => Some(turn.load::<ProblemDefinition>(store, &id.to_string()).await?),
            None => None,
        };
        let solution = match turn.state.solution_id {
            Some(id) => Some(turn.load::<SolutionDesign>(store, &id.to_string()).await?),
            None => None,
        };
        let completed_milestones: Vec<Milestone> = self
            .milestones(turn)
            .await?
            .into_iter()
            .filter(|m| m.status == MilestoneStatus::Completed)
            .collect();

        let request = ReviewerRequest::GenerateResume(ResumeInput {
            project: project.clone(),
            review,
            problem,
            solution,
            completed_milestones,
        });
        let resume = match self.reviewer.process(&self.context(turn), request).await.into_result() {
            Ok(ReviewerOutput::Resume(resume)) => resume,
            Ok(_) => return Err(OrchestratorError::UnexpectedOutput("reviewer")),
            Err(error) => {
                tracing::warn!(journey = %turn.key(), error = %error, "Resume generation failed");
                return Ok(Step::Reply(RESUME_FAILED.to_string()));
            }
        };

        turn.stage(&resume)?;
        if matches!(project.status, ProjectStatus::Approved | ProjectStatus::InProgress) {
            project.complete()?;
            turn.stage(&project)?;
        }
        turn.state.resume_id = Some(resume.id);
        turn.state.resume_generated = true;
        tracing::info!(
            journey = %turn.key(),
            resume_id = %resume.id,
            bullets = resume.bullets.len(),
            "Resume content generated"
        );

        let delivery = self.guide.render(&ReplyKind::ResumeDelivery(resume));
        if self.transition(turn, Phase::Completed, "Resume generated") {
            return Ok(Step::Advance(delivery));
        }
        Ok(Step::Reply(delivery))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn artifacts_are_split_by_line_with_links() {
        let artifacts = parse_artifacts(
            "- Final report: https://example.com/report.pdf.\n\n* Dashboard prototype\n",
        );
        assert_eq!(artifacts.len(), 2);
        assert_eq!(artifacts[0].description, "Final report: https://example.com/report.pdf.");
        assert_eq!(artifacts[0].url.as_deref(), Some("https://example.com/report.pdf"));
        assert_eq!(artifacts[1].description, "Dashboard prototype");
        assert!(artifacts[1].url.is_none());
        assert!(artifacts.iter().all(|a| a.artifact_type == ARTIFACT_TYPE));
    }

    #[test]
    fn blank_submission_has_no_artifacts() {
        assert!(parse_artifacts("  \n ").is_empty());
    }
}
