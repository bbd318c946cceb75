//! Problem definitions, solution designs, and the scores they earn.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::domain::extraction::ExtractionReport;
use crate::domain::foundation::{ProblemId, ProjectId, SolutionId, Timestamp};

/// Every criterion must reach this score to pass.
pub const MIN_CRITERION_SCORE: f64 = 6.0;
/// The mean of all criteria must reach this score to pass.
pub const MIN_MEAN_SCORE: f64 = 7.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Criterion {
    MarketRelevance,
    Clarity,
    Feasibility,
    LogicalCoherence,
    Innovation,
    ImplementationFeasibility,
    ImpactPotential,
}

impl Criterion {
    /// Label the oracle is asked to score under.
    pub fn label(&self) -> &'static str {
        match self {
            Criterion::MarketRelevance => "Market Relevance",
            Criterion::Clarity => "Clarity",
            Criterion::Feasibility => "Feasibility",
            Criterion::LogicalCoherence => "Logical Coherence",
            Criterion::Innovation => "Innovation",
            Criterion::ImplementationFeasibility => "Implementation Feasibility",
            Criterion::ImpactPotential => "Impact Potential",
        }
    }
}

/// What is being evaluated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvaluationMode {
    Problem,
    Solution,
}

impl EvaluationMode {
    pub fn criteria(&self) -> &'static [Criterion] {
        match self {
            EvaluationMode::Problem => &[
                Criterion::MarketRelevance,
                Criterion::Clarity,
                Criterion::Feasibility,
            ],
            EvaluationMode::Solution => &[
                Criterion::LogicalCoherence,
                Criterion::Innovation,
                Criterion::ImplementationFeasibility,
                Criterion::ImpactPotential,
            ],
        }
    }
}

/// Pass rule: every score at least 6 and the mean at least 7.
pub fn passes(scores: &[f64]) -> bool {
    if scores.is_empty() {
        return false;
    }
    let mean = scores.iter().sum::<f64>() / scores.len() as f64;
    scores.iter().all(|s| *s >= MIN_CRITERION_SCORE) && mean >= MIN_MEAN_SCORE
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Evaluation {
    pub mode: EvaluationMode,
    pub scores: BTreeMap<Criterion, f64>,
    pub passed: bool,
    pub overall_feedback: String,
    pub strengths: Vec<String>,
    pub suggestions: Vec<String>,
    /// Only present when the submission failed.
    pub example_improvements: Option<String>,
    pub next_steps: String,
    #[serde(default)]
    pub extraction: ExtractionReport,
}

impl Evaluation {
    pub fn mean_score(&self) -> f64 {
        if self.scores.is_empty() {
            return 0.0;
        }
        self.scores.values().sum::<f64>() / self.scores.len() as f64
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProblemDefinition {
    pub id: ProblemId,
    pub project_id: ProjectId,
    pub statement: String,
    pub target_audience: String,
    pub context: String,
    pub success_metrics: Vec<String>,
    pub evaluation: Option<Evaluation>,
    pub version: u32,
    pub created_at: Timestamp,
    pub approved_at: Option<Timestamp>,
    #[serde(default)]
    pub extraction: ExtractionReport,
}

impl ProblemDefinition {
    pub fn is_approved(&self) -> bool {
        self.approved_at.is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SolutionDesign {
    pub id: SolutionId,
    pub problem_id: ProblemId,
    pub approach: String,
    pub key_components: Vec<String>,
    pub methodology: String,
    pub expected_outcomes: Vec<String>,
    pub resource_requirements: Option<String>,
    pub evaluation: Option<Evaluation>,
    pub version: u32,
    pub created_at: Timestamp,
    pub approved_at: Option<Timestamp>,
    #[serde(default)]
    pub extraction: ExtractionReport,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_eights_pass() {
        assert!(passes(&[8.0, 8.0, 8.0]));
    }

    #[test]
    fn one_low_score_fails_even_with_mean_seven() {
        assert!(!passes(&[5.0, 8.0, 8.0]));
    }

    #[test]
    fn low_mean_fails_even_when_all_above_six() {
        assert!(!passes(&[6.0, 6.0, 7.0, 7.0]));
    }

    #[test]
    fn empty_scores_never_pass() {
        assert!(!passes(&[]));
    }

    #[test]
    fn modes_have_three_and_four_criteria() {
        assert_eq!(EvaluationMode::Problem.criteria().len(), 3);
        assert_eq!(EvaluationMode::Solution.criteria().len(), 4);
    }

    #[test]
    fn mean_score_averages_criteria() {
        let mut evaluation = Evaluation {
            mode: EvaluationMode::Problem,
            scores: BTreeMap::new(),
            passed: false,
            overall_feedback: String::new(),
            strengths: Vec::new(),
            suggestions: Vec::new(),
            example_improvements: None,
            next_steps: String::new(),
            extraction: ExtractionReport::default(),
        };
        assert_eq!(evaluation.mean_score(), 0.0);

        evaluation.scores.insert(Criterion::MarketRelevance, 9.0);
        evaluation.scores.insert(Criterion::Clarity, 6.0);
        evaluation.scores.insert(Criterion::Feasibility, 6.0);
        assert_eq!(evaluation.mean_score(), 7.0);
    }

    #[test]
    fn criterion_keys_serialize_as_map_keys() {
        let mut scores = BTreeMap::new();
        scores.insert(Criterion::MarketRelevance, 8.0);
        let json = serde_json::to_string(&scores).unwrap();
        assert_eq!(json, r#"{"market_relevance":8.0}"#);
    }
}
