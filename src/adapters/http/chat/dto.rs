//! HTTP DTOs for the chat endpoints.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::Timestamp;
use crate::domain::journey::{ConversationTurn, JourneyState, Phase};
use crate::domain::portfolio::{Project, ProjectProposal, ProjectStatus};

// ════════════════════════════════════════════════════════════════════════════════
// Requests
// ════════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Deserialize)]
pub struct ChatRequest {
    pub user_id: String,
    #[serde(default)]
    pub room_id: Option<String>,
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct JourneyQueryParams {
    pub room_id: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConversationQueryParams {
    pub room_id: Option<String>,
    pub limit: Option<usize>,
}

// ════════════════════════════════════════════════════════════════════════════════
// Responses
// ════════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatResponse {
    pub reply: String,
    /// Phase after the message; null when processing failed.
    pub phase: Option<Phase>,
}

/// Progress summary of one journey.
#[derive(Debug, Clone, Serialize)]
pub struct JourneyStateView {
    pub journey: String,
    pub phase: Phase,
    pub previous_phase: Option<Phase>,
    pub target_role: Option<String>,
    pub target_domain: Option<String>,
    pub project_id: Option<String>,
    pub project_approved: bool,
    pub problem_approved: bool,
    pub solution_approved: bool,
    pub milestones_completed: u32,
    pub total_milestones: u32,
    pub resume_generated: bool,
    pub created_at: Timestamp,
    pub last_activity_at: Timestamp,
}

impl From<&JourneyState> for JourneyStateView {
    fn from(state: &JourneyState) -> Self {
        Self {
            journey: state.key.to_string(),
            phase: state.current_phase,
            previous_phase: state.previous_phase,
            target_role: state.target_role.clone(),
            target_domain: state.target_domain.clone(),
            project_id: state.project_id.map(|id| id.to_string()),
            project_approved: state.project_approved,
            problem_approved: state.problem_approved,
            solution_approved: state.solution_approved,
            milestones_completed: state.milestones_completed,
            total_milestones: state.total_milestones,
            resume_generated: state.resume_generated,
            created_at: state.created_at,
            last_activity_at: state.last_activity_at,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ProjectView {
    pub id: String,
    pub status: ProjectStatus,
    pub proposal: ProjectProposal,
    pub created_at: Timestamp,
    pub approved_at: Option<Timestamp>,
}

impl From<Project> for ProjectView {
    fn from(project: Project) -> Self {
        Self {
            id: project.id.to_string(),
            status: project.status,
            proposal: project.proposal,
            created_at: project.created_at,
            approved_at: project.approved_at,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ConversationResponse {
    pub journey: String,
    pub turns: Vec<ConversationTurn>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub code: String,
    pub message: String,
}

impl ErrorResponse {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            code: "BAD_REQUEST".to_string(),
            message: message.into(),
        }
    }

    pub fn not_found(resource: &str, journey: &str) -> Self {
        Self {
            code: "NOT_FOUND".to_string(),
            message: format!("{} not found for {}", resource, journey),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self {
            code: "INTERNAL_ERROR".to_string(),
            message: message.into(),
        }
    }
}
