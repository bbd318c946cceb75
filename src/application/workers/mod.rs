//! Worker Contracts
//!
//! Stateless collaborators the orchestrator dispatches to. Each worker builds
//! one system and one user instruction, makes at most one oracle call, and
//! runs the extraction protocol over the reply.
//!
//! ## Workers
//! - `ProposalGenerator` - project proposal for a role and domain
//! - `Evaluator` - scores problem definitions and solution designs
//! - `ExecutionCoach` - milestone plans, progress updates, next actions
//! - `Reviewer` - artifact reviews and resume packages
//! - `ConversationGuide` - user-facing replies and approval detection (no oracle)
//!
//! Workers never call each other and never retry. A fault inside [`Worker::run`]
//! becomes a `success = false` [`WorkerResponse`] in [`Worker::process`].

mod conversation_guide;
mod evaluator;
mod execution_coach;
mod proposal_generator;
mod reviewer;

pub use conversation_guide::{
    Approval, ApprovalClassifier, ConversationGuide, ReplyKind, DEFAULT_SKIP_TOKEN,
};
pub use evaluator::{EvaluationRequest, Evaluator, ProblemDraft, SolutionDraft};
pub use execution_coach::{
    CoachOutput, CoachRequest, ExecutionCoach, ExecutionPlan, NextAction, PlanInput,
    ProgressAssessment, ProgressInput,
};
pub use proposal_generator::{ProposalGenerator, ProposalRequest};
pub use reviewer::{ReviewInput, Reviewer, ReviewerOutput, ReviewerRequest, ResumeInput};

use async_trait::async_trait;
use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;

use crate::domain::extraction::ExtractionReport;
use crate::domain::foundation::{JourneyKey, RequestId};
use crate::ports::{AIError, AIProvider, CompletionRequest, MessageRole, RequestMetadata};

/// Default completion budget per oracle call.
pub const DEFAULT_MAX_TOKENS: u32 = 4096;

/// Errors raised inside a worker before they are folded into a response.
#[derive(Debug, Error)]
pub enum WorkerError {
    /// A field the operation needs was not supplied.
    #[error("Missing required input: {0}")]
    MissingInput(&'static str),

    #[error("Oracle call failed: {0}")]
    Oracle(#[from] AIError),

    #[error("Unsupported operation: {0}")]
    Unsupported(String),
}

/// Correlation data for one worker invocation.
#[derive(Debug, Clone)]
pub struct WorkerContext {
    pub request_id: RequestId,
    pub journey: String,
}

impl WorkerContext {
    pub fn new(journey: &JourneyKey) -> Self {
        Self {
            request_id: RequestId::new(),
            journey: journey.to_string(),
        }
    }
}

/// Envelope returned by [`Worker::process`].
#[derive(Debug, Clone, Serialize)]
pub struct WorkerResponse<T> {
    pub request_id: RequestId,
    pub success: bool,
    pub message: String,
    pub output: Option<T>,
    /// Fields that hold fallback or filler values rather than oracle output.
    pub degraded_fields: Vec<String>,
}

impl<T> WorkerResponse<T> {
    pub fn into_result(self) -> Result<T, String> {
        match (self.success, self.output) {
            (true, Some(output)) => Ok(output),
            _ => Err(self.message),
        }
    }
}

/// Outputs that can report which of their fields were synthesized.
pub trait WorkerOutput {
    fn extraction_report(&self) -> ExtractionReport {
        ExtractionReport::default()
    }
}

/// A stateless worker contract.
#[async_trait]
pub trait Worker: Send + Sync {
    /// Name used in logs and oracle request metadata.
    const NAME: &'static str;

    type Request: Send + 'static;
    type Output: WorkerOutput + Send + 'static;

    async fn run(
        &self,
        ctx: &WorkerContext,
        request: Self::Request,
    ) -> Result<Self::Output, WorkerError>;

    /// Runs the worker, converting any fault into `success = false`.
    async fn process(
        &self,
        ctx: &WorkerContext,
        request: Self::Request,
    ) -> WorkerResponse<Self::Output> {
        match self.run(ctx, request).await {
            Ok(output) => {
                let degraded_fields = output.extraction_report().degraded_fields();
                if degraded_fields.is_empty() {
                    tracing::info!(
                        worker = Self::NAME,
                        journey = %ctx.journey,
                        request_id = %ctx.request_id,
                        "Worker completed"
                    );
                } else {
                    tracing::warn!(
                        worker = Self::NAME,
                        journey = %ctx.journey,
                        request_id = %ctx.request_id,
                        degraded = ?degraded_fields,
                        "Worker output contains fallback values"
                    );
                }
                WorkerResponse {
                    request_id: ctx.request_id,
                    success: true,
                    message: "ok".to_string(),
                    output: Some(output),
                    degraded_fields,
                }
            }
            Err(err) => {
                tracing::warn!(
                    worker = Self::NAME,
                    journey = %ctx.journey,
                    request_id = %ctx.request_id,
                    error = %err,
                    "Worker failed"
                );
                WorkerResponse {
                    request_id: ctx.request_id,
                    success: false,
                    message: err.to_string(),
                    output: None,
                    degraded_fields: Vec::new(),
                }
            }
        }
    }
}

/// One system plus one user instruction at a fixed temperature.
#[derive(Debug, Clone)]
pub struct Prompt {
    pub system: &'static str,
    pub user: String,
    pub temperature: f32,
}

/// Shared handle workers use to reach the oracle.
#[derive(Clone)]
pub struct Oracle {
    provider: Arc<dyn AIProvider>,
    max_tokens: u32,
}

impl Oracle {
    pub fn new(provider: Arc<dyn AIProvider>) -> Self {
        Self {
            provider,
            max_tokens: DEFAULT_MAX_TOKENS,
        }
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// Issues exactly one completion and returns its text.
    pub async fn ask(
        &self,
        ctx: &WorkerContext,
        worker: &'static str,
        prompt: Prompt,
    ) -> Result<String, WorkerError> {
        tracing::debug!(
            worker,
            request_id = %ctx.request_id,
            prompt_chars = prompt.user.len(),
            "Calling oracle"
        );
        let request = CompletionRequest::new(RequestMetadata::new(
            ctx.journey.clone(),
            ctx.request_id,
            worker,
        ))
        .with_system_prompt(prompt.system)
        .with_message(MessageRole::User, prompt.user)
        .with_max_tokens(self.max_tokens)
        .with_temperature(prompt.temperature);

        let response = self.provider.complete(request).await?;
        Ok(response.content)
    }
}

/// Renders items as a markdown bullet list, or `fallback` when empty.
pub(crate) fn bullet_list(items: &[String], fallback: &str) -> String {
    if items.is_empty() {
        return fallback.to_string();
    }
    items
        .iter()
        .map(|i| format!("- {}", i))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use crate::adapters::ai::MockAIProvider;
    use crate::domain::foundation::UserId;

    pub fn test_context() -> WorkerContext {
        WorkerContext::new(&JourneyKey::for_user(UserId::new("learner").unwrap()))
    }

    pub fn oracle_with(provider: &MockAIProvider) -> Oracle {
        Oracle::new(Arc::new(provider.clone()))
    }
}
