//! Journey phases and their fixed transition graph.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::domain::foundation::{StateMachine, ValidationError};

/// The seven phases of a coaching journey.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Onboarding,
    ProjectGeneration,
    ProblemDefinition,
    SolutionDesign,
    Execution,
    Review,
    Completed,
}

impl Phase {
    pub const ALL: [Phase; 7] = [
        Phase::Onboarding,
        Phase::ProjectGeneration,
        Phase::ProblemDefinition,
        Phase::SolutionDesign,
        Phase::Execution,
        Phase::Review,
        Phase::Completed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Onboarding => "onboarding",
            Phase::ProjectGeneration => "project_generation",
            Phase::ProblemDefinition => "problem_definition",
            Phase::SolutionDesign => "solution_design",
            Phase::Execution => "execution",
            Phase::Review => "review",
            Phase::Completed => "completed",
        }
    }

    /// The next phase on the progress path.
    pub fn forward(&self) -> Option<Phase> {
        match self {
            Phase::Onboarding => Some(Phase::ProjectGeneration),
            Phase::ProjectGeneration => Some(Phase::ProblemDefinition),
            Phase::ProblemDefinition => Some(Phase::SolutionDesign),
            Phase::SolutionDesign => Some(Phase::Execution),
            Phase::Execution => Some(Phase::Review),
            Phase::Review => Some(Phase::Completed),
            Phase::Completed => None,
        }
    }

    /// The revision edge back to the previous phase, if any.
    pub fn revision(&self) -> Option<Phase> {
        match self {
            Phase::ProjectGeneration => Some(Phase::Onboarding),
            Phase::ProblemDefinition => Some(Phase::ProjectGeneration),
            Phase::SolutionDesign => Some(Phase::ProblemDefinition),
            Phase::Execution => Some(Phase::SolutionDesign),
            Phase::Review => Some(Phase::Execution),
            Phase::Onboarding | Phase::Completed => None,
        }
    }
}

impl StateMachine for Phase {
    fn can_transition_to(&self, target: &Self) -> bool {
        self.forward() == Some(*target) || self.revision() == Some(*target)
    }

    fn valid_transitions(&self) -> Vec<Self> {
        self.forward().into_iter().chain(self.revision()).collect()
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Phase {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Phase::ALL
            .into_iter()
            .find(|p| p.as_str() == s)
            .ok_or_else(|| ValidationError::invalid_format("phase", format!("unknown phase '{}'", s)))
    }
}
