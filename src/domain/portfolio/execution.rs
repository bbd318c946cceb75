//! Milestones and the progress log kept while executing a project.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::foundation::{MilestoneId, ProjectId, StateMachine, Timestamp};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MilestoneStatus {
    #[default]
    NotStarted,
    InProgress,
    Completed,
    Blocked,
    Skipped,
}

impl StateMachine for MilestoneStatus {
    fn can_transition_to(&self, target: &Self) -> bool {
        self.valid_transitions().contains(target)
    }

    fn valid_transitions(&self) -> Vec<Self> {
        use MilestoneStatus::*;
        match self {
            NotStarted => vec![InProgress, Completed, Blocked, Skipped],
            InProgress => vec![Completed, Blocked, Skipped],
            Blocked => vec![InProgress, Completed, Skipped],
            // Reopened when the journey goes back from review.
            Completed => vec![InProgress],
            Skipped => vec![NotStarted],
        }
    }
}

impl fmt::Display for MilestoneStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            MilestoneStatus::NotStarted => "not_started",
            MilestoneStatus::InProgress => "in_progress",
            MilestoneStatus::Completed => "completed",
            MilestoneStatus::Blocked => "blocked",
            MilestoneStatus::Skipped => "skipped",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Milestone {
    pub id: MilestoneId,
    pub project_id: ProjectId,
    pub order: u32,
    pub title: String,
    pub description: String,
    pub deliverable: String,
    pub estimated_days: u32,
    pub status: MilestoneStatus,
    pub next_action: Option<String>,
    pub started_at: Option<Timestamp>,
    pub completed_at: Option<Timestamp>,
}

impl Milestone {
    /// Applies a status change if the lifecycle allows it.
    ///
    /// Returns false and leaves the milestone untouched otherwise.
    pub fn apply_status(&mut self, status: MilestoneStatus) -> bool {
        if status == self.status || !self.status.can_transition_to(&status) {
            return false;
        }
        match status {
            MilestoneStatus::InProgress => {
                self.started_at.get_or_insert_with(Timestamp::now);
                self.completed_at = None;
            }
            MilestoneStatus::Completed => {
                self.started_at.get_or_insert_with(Timestamp::now);
                self.completed_at = Some(Timestamp::now());
            }
            _ => {}
        }
        self.status = status;
        true
    }

    pub fn is_done(&self) -> bool {
        matches!(self.status, MilestoneStatus::Completed | MilestoneStatus::Skipped)
    }
}

/// Audit entry for one progress report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressUpdate {
    pub milestone_id: MilestoneId,
    pub update_text: String,
    pub status_before: MilestoneStatus,
    pub status_after: MilestoneStatus,
    pub stagnation_detected: bool,
    pub feedback: String,
    pub timestamp: Timestamp,
}
