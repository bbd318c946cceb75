//! Final artifact reviews and the resume content generated from them.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::domain::extraction::ExtractionReport;
use crate::domain::foundation::{ProjectId, ResumeId, ReviewId, Timestamp};

/// Resume bullets are padded up to this many.
pub const MIN_RESUME_BULLETS: usize = 3;
/// Resume bullets are truncated down to this many.
pub const MAX_RESUME_BULLETS: usize = 5;

/// Something the learner built, as described in their submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactSubmission {
    pub artifact_type: String,
    pub description: String,
    pub url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtifactReview {
    pub id: ReviewId,
    pub project_id: ProjectId,
    pub artifacts: Vec<ArtifactSubmission>,
    pub overall_score: f64,
    pub criterion_scores: BTreeMap<String, f64>,
    pub criterion_feedback: BTreeMap<String, String>,
    pub overall_feedback: String,
    pub strengths: Vec<String>,
    pub areas_for_improvement: Vec<String>,
    pub recruiter_appeal_assessment: String,
    pub skills_demonstrated: Vec<String>,
    pub next_steps: Vec<String>,
    pub created_at: Timestamp,
    #[serde(default)]
    pub extraction: ExtractionReport,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BulletCategory {
    Research,
    Analysis,
    Design,
    #[default]
    Execution,
}

impl BulletCategory {
    pub fn from_label(label: &str) -> Option<Self> {
        let lower = label.to_lowercase();
        [
            ("research", BulletCategory::Research),
            ("analysis", BulletCategory::Analysis),
            ("design", BulletCategory::Design),
            ("execution", BulletCategory::Execution),
        ]
        .into_iter()
        .find(|(keyword, _)| lower.contains(keyword))
        .map(|(_, category)| category)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResumeBullet {
    pub text: String,
    pub skills: Vec<String>,
    /// Which artifact or milestone backs the claim.
    pub evidence: String,
    pub category: BulletCategory,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResumePackage {
    pub id: ResumeId,
    pub project_id: ProjectId,
    pub review_id: ReviewId,
    pub project_title: String,
    pub project_one_liner: String,
    pub project_description: String,
    pub bullets: Vec<ResumeBullet>,
    pub suggested_skills: Vec<String>,
    pub talking_points: Vec<String>,
    pub next_steps: Vec<String>,
    pub created_at: Timestamp,
    #[serde(default)]
    pub extraction: ExtractionReport,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bullet_category_defaults_to_execution() {
        assert_eq!(BulletCategory::default(), BulletCategory::Execution);
        assert_eq!(BulletCategory::from_label("Type: Analysis"), Some(BulletCategory::Analysis));
        assert_eq!(BulletCategory::from_label("misc"), None);
    }
}
