//! Project proposals and their approval lifecycle.

use serde::{Deserialize, Serialize};

use crate::domain::extraction::ExtractionReport;
use crate::domain::foundation::{ProjectId, StateMachine, Timestamp, ValidationError};

/// Shape of portfolio project being proposed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectType {
    Research,
    #[default]
    Product,
    Campaign,
    Startup,
    Marketing,
}

impl ProjectType {
    /// Finds the first known type keyword in free text.
    pub fn from_label(label: &str) -> Option<Self> {
        let upper = label.to_uppercase();
        [
            ("RESEARCH", ProjectType::Research),
            ("PRODUCT", ProjectType::Product),
            ("CAMPAIGN", ProjectType::Campaign),
            ("STARTUP", ProjectType::Startup),
            ("MARKETING", ProjectType::Marketing),
        ]
        .into_iter()
        .find(|(keyword, _)| upper.contains(keyword))
        .map(|(_, kind)| kind)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ProjectType::Research => "research",
            ProjectType::Product => "product",
            ProjectType::Campaign => "campaign",
            ProjectType::Startup => "startup",
            ProjectType::Marketing => "marketing",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Deliverable {
    pub name: String,
    pub description: String,
    pub format: String,
    pub evaluation_criteria: Vec<String>,
}

/// One stage of the proposed roadmap.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoadmapStep {
    pub name: String,
    pub tasks: Vec<String>,
    pub outcome: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectProposal {
    pub title: String,
    pub project_type: ProjectType,
    pub description: String,
    pub why_relevant: String,
    pub deliverables: Vec<Deliverable>,
    pub roadmap: Vec<RoadmapStep>,
    pub skills_demonstrated: Vec<String>,
    pub recruiter_appeal: String,
    pub evaluation_criteria: Vec<String>,
    pub estimated_duration_weeks: f64,
    pub alternatives_considered: Vec<String>,
    pub reasoning: String,
    #[serde(default)]
    pub extraction: ExtractionReport,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectStatus {
    Proposed,
    Approved,
    Rejected,
    InProgress,
    Completed,
}

impl StateMachine for ProjectStatus {
    fn can_transition_to(&self, target: &Self) -> bool {
        self.valid_transitions().contains(target)
    }

    fn valid_transitions(&self) -> Vec<Self> {
        use ProjectStatus::*;
        match self {
            Proposed => vec![Approved, Rejected],
            Approved => vec![InProgress, Completed],
            InProgress => vec![Completed],
            Rejected | Completed => vec![],
        }
    }
}

/// A proposal plus its lifecycle, stored once per generation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub id: ProjectId,
    pub proposal: ProjectProposal,
    pub status: ProjectStatus,
    pub created_at: Timestamp,
    pub approved_at: Option<Timestamp>,
    pub completed_at: Option<Timestamp>,
}

impl Project {
    pub fn propose(proposal: ProjectProposal) -> Self {
        Self {
            id: ProjectId::new(),
            proposal,
            status: ProjectStatus::Proposed,
            created_at: Timestamp::now(),
            approved_at: None,
            completed_at: None,
        }
    }

    pub fn approve(&mut self) -> Result<(), ValidationError> {
        self.status = self.status.transition_to(ProjectStatus::Approved)?;
        self.approved_at = Some(Timestamp::now());
        Ok(())
    }

    pub fn reject(&mut self) -> Result<(), ValidationError> {
        self.status = self.status.transition_to(ProjectStatus::Rejected)?;
        Ok(())
    }

    pub fn start(&mut self) -> Result<(), ValidationError> {
        self.status = self.status.transition_to(ProjectStatus::InProgress)?;
        Ok(())
    }

    pub fn complete(&mut self) -> Result<(), ValidationError> {
        self.status = self.status.transition_to(ProjectStatus::Completed)?;
        self.completed_at = Some(Timestamp::now());
        Ok(())
    }

    pub fn title(&self) -> &str {
        &self.proposal.title
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    pub fn test_proposal(title: &str) -> ProjectProposal {
        ProjectProposal {
            title: title.to_string(),
            project_type: ProjectType::Product,
            description: "Build a churn dashboard".to_string(),
            why_relevant: "PMs own retention".to_string(),
            deliverables: vec![Deliverable {
                name: "Dashboard".to_string(),
                description: "Live churn view".to_string(),
                format: "Web app".to_string(),
                evaluation_criteria: vec!["Clarity".to_string()],
            }],
            roadmap: Vec::new(),
            skills_demonstrated: vec!["Analytics".to_string()],
            recruiter_appeal: "Shows ownership".to_string(),
            evaluation_criteria: vec!["Clarity".to_string(), "Impact".to_string()],
            estimated_duration_weeks: 2.5,
            alternatives_considered: Vec::new(),
            reasoning: String::new(),
            extraction: ExtractionReport::default(),
        }
    }
}
