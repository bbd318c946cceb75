//! Project generation: propose, then wait for approval or rejection.

use super::{Orchestrator, OrchestratorError, Step, Turn};
use crate::application::workers::{Approval, ProposalRequest, ReplyKind, Worker};
use crate::domain::journey::Phase;
use crate::domain::portfolio::{Project, ProjectStatus};

pub(crate) const PROPOSAL_FAILED: &str = "I had trouble generating a project proposal. \
Please send any message to try again.";

pub(crate) const APPROVAL_UNCLEAR: &str = "I didn't quite catch that. Would you like to go ahead with this \
project? Reply Yes to approve, or No to get a different proposal.";

impl Orchestrator {
    pub(super) async fn project_generation(
        &self,
        turn: &mut Turn,
        input: Option<&str>,
    ) -> Result<Step, OrchestratorError> {
        let Some(project_id) = turn.state.project_id else {
            return self.propose(turn).await;
        };
        let mut project: Project = turn
            .load(self.store.as_ref(), &project_id.to_string())
            .await?;

        let Some(message) = input else {
            return Ok(Step::Reply(
                self.guide.render(&ReplyKind::Proposal(project.proposal)),
            ));
        };

        match self.approvals.classify(message) {
            Approval::Approved => {
                if project.status == ProjectStatus::Proposed {
                    project.approve()?;
                    turn.stage(&project)?;
                }
                turn.state.project_approved = true;
                if self.transition(turn, Phase::ProblemDefinition, "Project approved") {
                    return Ok(Step::Advance(format!(
                        "Great choice! \"{}\" is locked in.",
                        project.title()
                    )));
                }
                Ok(Step::Reply(
                    self.guide.render(&ReplyKind::Proposal(project.proposal)),
                ))
            }
            Approval::Rejected => {
                if project.status == ProjectStatus::Proposed {
                    project.reject()?;
                    turn.stage(&project)?;
                }
                tracing::info!(journey = %turn.key(), title = project.title(), "Proposal rejected");
                turn.state
                    .context
                    .rejected_proposals
                    .push(project.title().to_string());
                turn.state.project_id = None;
                turn.state.project_approved = false;

                match self.propose(turn).await? {
                    Step::Reply(text) if turn.state.project_id.is_some() => Ok(Step::Reply(
                        format!("No problem, here's a different idea.\n\n{}", text),
                    )),
                    step => Ok(step),
                }
            }
            Approval::Unclear => Ok(Step::Reply(APPROVAL_UNCLEAR.to_string())),
        }
    }

    /// Asks the proposal generator for a fresh proposal and stages it.
    async fn propose(&self, turn: &mut Turn) -> Result<Step, OrchestratorError> {
        let state = &turn.state;
        let request = ProposalRequest {
            target_role: state.target_role.clone().unwrap_or_default(),
            target_domain: state.target_domain.clone().unwrap_or_default(),
            background: state.background.clone(),
            interests: state.interests.clone(),
            rejected_titles: state.context.rejected_proposals.clone(),
        };

        let response = self.proposals.process(&self.context(turn), request).await;
        let proposal = match response.into_result() {
            Ok(proposal) => proposal,
            Err(message) => {
                tracing::warn!(journey = %turn.key(), error = %message, "Proposal generation failed");
                return Ok(Step::Reply(PROPOSAL_FAILED.to_string()));
            }
        };

        let reply = self.guide.render(&ReplyKind::Proposal(proposal.clone()));
        let project = Project::propose(proposal);
        turn.stage(&project)?;
        turn.state.project_id = Some(project.id);
        turn.state.project_approved = false;
        tracing::info!(journey = %turn.key(), project_id = %project.id, title = project.title(), "Project proposed");
        Ok(Step::Reply(reply))
    }
}
