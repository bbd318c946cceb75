//! Portfolio records produced along the journey.
//!
//! Each record is created once by a worker (or, for submissions, by the phase
//! handler that received them) and afterwards mutated only by the handler that
//! owns its phase.

mod evaluation;
mod execution;
mod project;
mod review;

pub use evaluation::{
    passes, Criterion, Evaluation, EvaluationMode, ProblemDefinition, SolutionDesign,
    MIN_CRITERION_SCORE, MIN_MEAN_SCORE,
};
pub use execution::{Milestone, MilestoneStatus, ProgressUpdate};
pub use project::{Deliverable, Project, ProjectProposal, ProjectStatus, ProjectType, RoadmapStep};
pub use review::{
    ArtifactReview, ArtifactSubmission, BulletCategory, ResumeBullet, ResumePackage,
    MAX_RESUME_BULLETS, MIN_RESUME_BULLETS,
};

#[cfg(test)]
pub(crate) use project::fixtures;

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt;

/// Kinds of keyed records a journey store holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordKind {
    Project,
    Problem,
    Solution,
    Milestone,
    Review,
    Resume,
}

impl RecordKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordKind::Project => "project",
            RecordKind::Problem => "problem",
            RecordKind::Solution => "solution",
            RecordKind::Milestone => "milestone",
            RecordKind::Review => "review",
            RecordKind::Resume => "resume",
        }
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A record that can be stored under `(journey key, kind, id)`.
pub trait JourneyRecord: Serialize + DeserializeOwned + Send + Sync {
    const KIND: RecordKind;

    fn record_id(&self) -> String;
}

macro_rules! journey_record {
    ($ty:ty, $kind:expr) => {
        impl JourneyRecord for $ty {
            const KIND: RecordKind = $kind;

            fn record_id(&self) -> String {
                self.id.to_string()
            }
        }
    };
}

journey_record!(Project, RecordKind::Project);
journey_record!(ProblemDefinition, RecordKind::Problem);
journey_record!(SolutionDesign, RecordKind::Solution);
journey_record!(Milestone, RecordKind::Milestone);
journey_record!(ArtifactReview, RecordKind::Review);
journey_record!(ResumePackage, RecordKind::Resume);
