//! Orchestrator - runs one control pass per inbound message.
//!
//! A pass loads (or creates) the durable state, dispatches to the handler of
//! the current phase, and persists the outcome. Handlers live in one file per
//! phase and share the [`Turn`] working copy. When a handler changes phase it
//! returns [`Step::Advance`] and the next phase's entry handler runs in the
//! same pass.
//!
//! No error crosses this boundary: callers always get a reply string, and a
//! failed pass leaves the stored journey untouched.

mod execution;
mod onboarding;
mod project_generation;
mod review;
mod submissions;
mod turn;

use std::sync::Arc;
use thiserror::Error;

use crate::application::workers::{
    ApprovalClassifier, ConversationGuide, Evaluator, ExecutionCoach, Oracle, ProposalGenerator,
    ReplyKind, Reviewer, WorkerContext,
};
use crate::domain::foundation::{JourneyKey, RoomId, UserId, ValidationError};
use crate::domain::journey::{
    can_transition, ConversationTurn, JourneyEvent, JourneyState, OnboardingStep, Phase,
    TransitionRecord,
};
use crate::ports::{JourneyStore, KnowledgeRetriever, StoreError};

pub(crate) use turn::Turn;

/// Reply sent whenever a pass fails.
pub const APOLOGY: &str = "I encountered an error processing your message. Please try again.";

/// Upper bound on phase changes within one pass.
const MAX_ADVANCES: usize = 7;

const REVISION_COMMAND: &str = "go back";

#[derive(Debug, Error)]
pub enum OrchestratorError {
    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("Failed to serialize record: {0}")]
    Serialization(String),

    /// The state points at a record the phase needs but it is absent.
    #[error("Journey has no {0}")]
    MissingRecord(&'static str),

    #[error("Worker {0} returned an unexpected output")]
    UnexpectedOutput(&'static str),

    #[error("Phase loop did not settle after {0} steps")]
    Unsettled(usize),
}

/// What a phase handler wants to happen next.
#[derive(Debug)]
pub(crate) enum Step {
    /// Reply and stop.
    Reply(String),
    /// The phase changed; the text leads the reply and the new phase's entry
    /// handler runs next.
    Advance(String),
}

/// Result of one pass, for hosts that also want the resulting phase.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatReply {
    pub reply: String,
    /// `None` when the pass failed.
    pub phase: Option<Phase>,
}

/// Builds the journey key from raw identifiers; a blank room means no room.
pub fn journey_key(user_id: &str, room_id: Option<&str>) -> Result<JourneyKey, ValidationError> {
    let room = room_id
        .filter(|r| !r.trim().is_empty())
        .map(RoomId::new)
        .transpose()?;
    Ok(JourneyKey::new(UserId::new(user_id)?, room))
}

pub struct Orchestrator {
    store: Arc<dyn JourneyStore>,
    proposals: ProposalGenerator,
    evaluator: Evaluator,
    coach: ExecutionCoach,
    reviewer: Reviewer,
    guide: ConversationGuide,
    approvals: ApprovalClassifier,
}

impl Orchestrator {
    pub fn new(oracle: Oracle, store: Arc<dyn JourneyStore>) -> Self {
        Self {
            store,
            proposals: ProposalGenerator::new(oracle.clone()),
            evaluator: Evaluator::new(oracle.clone()),
            coach: ExecutionCoach::new(oracle.clone()),
            reviewer: Reviewer::new(oracle),
            guide: ConversationGuide::default(),
            approvals: ApprovalClassifier::default(),
        }
    }

    /// Enriches proposal prompts with retrieved domain knowledge.
    pub fn with_retriever(mut self, retriever: Arc<dyn KnowledgeRetriever>) -> Self {
        self.proposals = self.proposals.with_retriever(retriever);
        self
    }

    pub fn with_skip_token(mut self, skip_token: impl Into<String>) -> Self {
        self.guide = ConversationGuide::new(skip_token);
        self
    }

    /// Processes one message and returns the reply text.
    pub async fn process_message(
        &self,
        user_id: &str,
        room_id: Option<&str>,
        message: &str,
    ) -> String {
        self.respond(user_id, room_id, message).await.reply
    }

    /// Like [`process_message`](Self::process_message), also reporting the
    /// phase the journey ended in.
    pub async fn respond(&self, user_id: &str, room_id: Option<&str>, message: &str) -> ChatReply {
        match self.try_respond(user_id, room_id, message).await {
            Ok(reply) => reply,
            Err(err) => {
                tracing::error!(
                    user_id,
                    room_id = room_id.unwrap_or_default(),
                    error = %err,
                    "Failed to process message"
                );
                ChatReply {
                    reply: APOLOGY.to_string(),
                    phase: None,
                }
            }
        }
    }

    async fn try_respond(
        &self,
        user_id: &str,
        room_id: Option<&str>,
        message: &str,
    ) -> Result<ChatReply, OrchestratorError> {
        let key = journey_key(user_id, room_id)?;
        let state = match self.store.load_state(&key).await? {
            Some(state) => state,
            None => {
                tracing::info!(journey = %key, "Starting new journey");
                JourneyState::new(key.clone())
            }
        };
        let started_in = state.current_phase;
        tracing::debug!(journey = %key, phase = %started_in, "Processing message");

        let mut turn = Turn::new(state);
        let reply = self.route(&mut turn, message).await?;
        let phase = turn.state.current_phase;

        turn.log(JourneyEvent::Conversation(ConversationTurn::user(message, started_in)));
        turn.log(JourneyEvent::Conversation(ConversationTurn::assistant(
            reply.clone(),
            phase,
        )));
        turn.flush(self.store.as_ref()).await?;

        Ok(ChatReply {
            reply,
            phase: Some(phase),
        })
    }

    async fn route(&self, turn: &mut Turn, message: &str) -> Result<String, OrchestratorError> {
        let mut parts: Vec<String> = Vec::new();
        let mut input = Some(message);

        if is_revision(message) {
            if let Some(text) = self.revise(turn).await? {
                parts.push(text);
                input = None;
            }
        }

        for _ in 0..MAX_ADVANCES {
            let step = match turn.state.current_phase {
                Phase::Onboarding => self.onboarding(turn, input).await?,
                Phase::ProjectGeneration => self.project_generation(turn, input).await?,
                Phase::ProblemDefinition => self.problem_definition(turn, input).await?,
                Phase::SolutionDesign => self.solution_design(turn, input).await?,
                Phase::Execution => self.execution(turn, input).await?,
                Phase::Review => self.review(turn, input).await?,
                Phase::Completed => Step::Reply(self.guide.render(&ReplyKind::Completion)),
            };
            match step {
                Step::Reply(text) => {
                    parts.push(text);
                    return Ok(join_reply(parts));
                }
                Step::Advance(text) => {
                    if !text.is_empty() {
                        parts.push(text);
                    }
                    input = None;
                }
            }
        }
        Err(OrchestratorError::Unsettled(MAX_ADVANCES))
    }

    /// Applies the phase graph and, when allowed, moves the working copy.
    ///
    /// A denied transition is logged and leaves the phase unchanged.
    pub(crate) fn transition(&self, turn: &mut Turn, to: Phase, reason: &str) -> bool {
        let from = turn.state.current_phase;
        let decision = can_transition(from, to, &turn.state);
        if !decision.allowed {
            tracing::warn!(
                journey = %turn.key(),
                from = %from,
                to = %to,
                reason = %decision.reason,
                "Transition denied"
            );
            return false;
        }

        turn.state.enter_phase(to);
        turn.log(JourneyEvent::Transition(TransitionRecord::new(from, to, reason)));
        tracing::info!(journey = %turn.key(), from = %from, to = %to, reason, "Phase transition");
        true
    }

    /// Follows the revision edge of the current phase, if it has one.
    async fn revise(&self, turn: &mut Turn) -> Result<Option<String>, OrchestratorError> {
        let Some(target) = turn.state.current_phase.revision() else {
            return Ok(None);
        };
        if !self.transition(turn, target, "Revision requested") {
            return Ok(None);
        }
        self.reset_from(turn, target).await?;
        Ok(Some(format!("Okay, let's revisit {}.", describe(target))))
    }

    /// Clears the approvals `target` and every later phase must re-earn.
    async fn reset_from(&self, turn: &mut Turn, target: Phase) -> Result<(), OrchestratorError> {
        let state = &mut turn.state;
        if target <= Phase::Onboarding {
            state.context.onboarding_step = OnboardingStep::Role;
            state.project_id = None;
        }
        if target <= Phase::ProjectGeneration {
            state.project_approved = false;
        }
        if target <= Phase::ProblemDefinition {
            state.problem_approved = false;
            state.context.awaiting_problem = false;
        }
        if target <= Phase::SolutionDesign {
            state.solution_approved = false;
            state.context.awaiting_solution = false;
            state.milestone_ids.clear();
            state.current_milestone_id = None;
            state.milestones_completed = 0;
            state.total_milestones = 0;
            state.execution_started_at = None;
        }
        if target <= Phase::Execution {
            state.review_id = None;
            state.resume_id = None;
            state.resume_generated = false;
            state.context.awaiting_artifacts = false;
        }
        if target == Phase::Execution {
            self.reopen_last_milestone(turn).await?;
        }
        Ok(())
    }

    fn context(&self, turn: &Turn) -> WorkerContext {
        WorkerContext::new(turn.key())
    }
}

fn is_revision(message: &str) -> bool {
    message
        .trim()
        .trim_end_matches(['.', '!'])
        .eq_ignore_ascii_case(REVISION_COMMAND)
}

fn describe(phase: Phase) -> &'static str {
    match phase {
        Phase::Onboarding => "your goals",
        Phase::ProjectGeneration => "the project proposal",
        Phase::ProblemDefinition => "the problem definition",
        Phase::SolutionDesign => "the solution design",
        Phase::Execution => "your milestones",
        Phase::Review => "the review",
        Phase::Completed => "your results",
    }
}

fn join_reply(parts: Vec<String>) -> String {
    parts
        .into_iter()
        .filter(|p| !p.is_empty())
        .collect::<Vec<_>>()
        .join("\n\n")
}

#[cfg(test)]
mod tests;
