//! Evaluator - scores problem definitions and solution designs.
//!
//! Problem mode uses a market/research lens over three criteria, solution mode
//! a practitioner lens over four. Passing needs every criterion at 6 or more
//! and a mean of at least 7; see [`passes`].

use async_trait::async_trait;
use std::collections::BTreeMap;

use super::{bullet_list, Oracle, Prompt, Worker, WorkerContext, WorkerError, WorkerOutput};
use crate::domain::extraction::{
    extract, DegradationKind, ExtractionReport, FieldSpec, RecordSchema, Source,
};
use crate::domain::portfolio::{passes, Criterion, Evaluation, EvaluationMode};

const TEMPERATURE: f32 = 0.3;
const STATEMENT_FALLBACK_CHARS: usize = 500;

const PROBLEM_SYSTEM_PROMPT: &str = "You are a tutor evaluating problem definitions through a market and research lens.

Score each criterion from 0 to 10:
- Market Relevance: how much the problem matters to the target market or domain
- Clarity: how clearly and specifically it is defined
- Feasibility: how realistic it is to address in 2-3 weeks

Respond in exactly this format:

# EVALUATION SCORES
Market Relevance: [0-10]
Clarity: [0-10]
Feasibility: [0-10]

# OVERALL FEEDBACK
[Constructive feedback]

# STRENGTHS
- [Strength]

# IMPROVEMENT SUGGESTIONS
- [Actionable suggestion]

# EXAMPLES OF IMPROVEMENTS
[Concrete rewrites that would strengthen the definition]

# NEXT STEPS
[What to do next]";

const SOLUTION_SYSTEM_PROMPT: &str = "You are a tutor evaluating solution designs through a practitioner and investor lens.

Score each criterion from 0 to 10:
- Logical Coherence: how soundly the approach addresses the problem
- Innovation: how differentiated it is
- Implementation Feasibility: how realistic it is to build in 2-3 weeks
- Impact Potential: how much it could achieve if executed well

Respond in exactly this format:

# EVALUATION SCORES
Logical Coherence: [0-10]
Innovation: [0-10]
Implementation Feasibility: [0-10]
Impact Potential: [0-10]

# OVERALL FEEDBACK
[Constructive feedback]

# STRENGTHS
- [Strength]

# IMPROVEMENT SUGGESTIONS
- [Actionable suggestion]

# EXAMPLES OF IMPROVEMENTS
[Concrete rewrites that would strengthen the design]

# NEXT STEPS
[What to do next]";

static PROBLEM_EVALUATION_FIELDS: &[FieldSpec] = &[
    FieldSpec::number("market_relevance", Source::Label("Market Relevance"), 0.0, 10.0, 5.0),
    FieldSpec::number("clarity", Source::Label("Clarity"), 0.0, 10.0, 5.0),
    FieldSpec::number("feasibility", Source::Label("Feasibility"), 0.0, 10.0, 5.0),
    FieldSpec::text("overall_feedback", Source::Section("Overall Feedback"), "Evaluation completed."),
    FieldSpec::list("strengths", Source::Section("Strengths"), 0, ""),
    FieldSpec::list("suggestions", Source::Section("Improvement Suggestions"), 0, ""),
    FieldSpec::optional_text("example_improvements", Source::Section("Examples of Improvements")),
    FieldSpec::text("next_steps", Source::Section("Next Steps"), "Revise based on feedback and resubmit."),
];

static SOLUTION_EVALUATION_FIELDS: &[FieldSpec] = &[
    FieldSpec::number("logical_coherence", Source::Label("Logical Coherence"), 0.0, 10.0, 5.0),
    FieldSpec::number("innovation", Source::Label("Innovation"), 0.0, 10.0, 5.0),
    FieldSpec::number(
        "implementation_feasibility",
        Source::Label("Implementation Feasibility"),
        0.0,
        10.0,
        5.0,
    ),
    FieldSpec::number("impact_potential", Source::Label("Impact Potential"), 0.0, 10.0, 5.0),
    FieldSpec::text("overall_feedback", Source::Section("Overall Feedback"), "Evaluation completed."),
    FieldSpec::list("strengths", Source::Section("Strengths"), 0, ""),
    FieldSpec::list("suggestions", Source::Section("Improvement Suggestions"), 0, ""),
    FieldSpec::optional_text("example_improvements", Source::Section("Examples of Improvements")),
    FieldSpec::text("next_steps", Source::Section("Next Steps"), "Revise based on feedback and resubmit."),
];

static PROBLEM_EVALUATION_SCHEMA: RecordSchema =
    RecordSchema::new("problem_evaluation", PROBLEM_EVALUATION_FIELDS);
static SOLUTION_EVALUATION_SCHEMA: RecordSchema =
    RecordSchema::new("solution_evaluation", SOLUTION_EVALUATION_FIELDS);

static PROBLEM_SUBMISSION_FIELDS: &[FieldSpec] = &[
    FieldSpec::optional_text("statement", Source::SectionOrLabel("Problem Statement")),
    FieldSpec::optional_text("target_audience", Source::SectionOrLabel("Target Audience")),
    FieldSpec::optional_text("context", Source::SectionOrLabel("Context")),
    FieldSpec::list("success_metrics", Source::SectionOrLabel("Success Metrics"), 0, ""),
];

static SOLUTION_SUBMISSION_FIELDS: &[FieldSpec] = &[
    FieldSpec::optional_text("approach", Source::SectionOrLabel("Solution Approach")),
    FieldSpec::list("key_components", Source::SectionOrLabel("Key Components"), 0, ""),
    FieldSpec::optional_text("methodology", Source::SectionOrLabel("Methodology")),
    FieldSpec::list("expected_outcomes", Source::SectionOrLabel("Expected Outcomes"), 0, ""),
    FieldSpec::optional_text("resource_requirements", Source::SectionOrLabel("Resource Requirements")),
];

static PROBLEM_SUBMISSION_SCHEMA: RecordSchema =
    RecordSchema::new("problem_submission", PROBLEM_SUBMISSION_FIELDS);
static SOLUTION_SUBMISSION_SCHEMA: RecordSchema =
    RecordSchema::new("solution_submission", SOLUTION_SUBMISSION_FIELDS);

fn criterion_field(criterion: Criterion) -> &'static str {
    match criterion {
        Criterion::MarketRelevance => "market_relevance",
        Criterion::Clarity => "clarity",
        Criterion::Feasibility => "feasibility",
        Criterion::LogicalCoherence => "logical_coherence",
        Criterion::Innovation => "innovation",
        Criterion::ImplementationFeasibility => "implementation_feasibility",
        Criterion::ImpactPotential => "impact_potential",
    }
}

fn head(text: &str, max_chars: usize) -> String {
    text.trim().chars().take(max_chars).collect()
}

fn or_placeholder(
    value: Option<String>,
    field: &str,
    placeholder: impl FnOnce() -> String,
    report: &mut ExtractionReport,
) -> String {
    value.unwrap_or_else(|| {
        report.note(field, DegradationKind::Defaulted);
        placeholder()
    })
}

fn or_placeholder_list(
    items: Vec<String>,
    field: &str,
    report: &mut ExtractionReport,
) -> Vec<String> {
    if items.is_empty() {
        report.note(field, DegradationKind::Defaulted);
        vec!["To be defined".to_string()]
    } else {
        items
    }
}

/// A problem definition as submitted for scoring.
#[derive(Debug, Clone, PartialEq)]
pub struct ProblemDraft {
    pub statement: String,
    pub target_audience: String,
    pub context: String,
    pub success_metrics: Vec<String>,
}

impl ProblemDraft {
    /// Reads labeled fields out of a free-text submission.
    ///
    /// Unlabeled submissions fall back to the message itself, so a learner
    /// who just writes prose still gets evaluated.
    pub fn from_submission(message: &str) -> (Self, ExtractionReport) {
        let record = extract(message, &PROBLEM_SUBMISSION_SCHEMA);
        let mut report = record.report.clone();

        let draft = Self {
            statement: or_placeholder(
                record.optional_text("statement"),
                "statement",
                || head(message, STATEMENT_FALLBACK_CHARS),
                &mut report,
            ),
            target_audience: or_placeholder(
                record.optional_text("target_audience"),
                "target_audience",
                || "To be refined".to_string(),
                &mut report,
            ),
            context: or_placeholder(
                record.optional_text("context"),
                "context",
                || message.trim().to_string(),
                &mut report,
            ),
            success_metrics: or_placeholder_list(
                record.list("success_metrics"),
                "success_metrics",
                &mut report,
            ),
        };
        (draft, report)
    }
}

/// A solution design as submitted for scoring.
#[derive(Debug, Clone, PartialEq)]
pub struct SolutionDraft {
    pub approach: String,
    pub key_components: Vec<String>,
    pub methodology: String,
    pub expected_outcomes: Vec<String>,
    pub resource_requirements: Option<String>,
}

impl SolutionDraft {
    pub fn from_submission(message: &str) -> (Self, ExtractionReport) {
        let record = extract(message, &SOLUTION_SUBMISSION_SCHEMA);
        let mut report = record.report.clone();

        let draft = Self {
            approach: or_placeholder(
                record.optional_text("approach"),
                "approach",
                || head(message, STATEMENT_FALLBACK_CHARS),
                &mut report,
            ),
            key_components: or_placeholder_list(
                record.list("key_components"),
                "key_components",
                &mut report,
            ),
            methodology: or_placeholder(
                record.optional_text("methodology"),
                "methodology",
                || "To be refined".to_string(),
                &mut report,
            ),
            expected_outcomes: or_placeholder_list(
                record.list("expected_outcomes"),
                "expected_outcomes",
                &mut report,
            ),
            resource_requirements: record.optional_text("resource_requirements"),
        };
        (draft, report)
    }
}

#[derive(Debug, Clone)]
pub enum EvaluationRequest {
    Problem(ProblemDraft),
    Solution {
        solution: SolutionDraft,
        /// Statement of the approved problem, for context.
        problem_statement: Option<String>,
    },
}

impl EvaluationRequest {
    pub fn mode(&self) -> EvaluationMode {
        match self {
            EvaluationRequest::Problem(_) => EvaluationMode::Problem,
            EvaluationRequest::Solution { .. } => EvaluationMode::Solution,
        }
    }
}

fn problem_prompt(draft: &ProblemDraft) -> String {
    format!(
        "Evaluate this problem definition:\n\n\
         PROBLEM STATEMENT:\n{}\n\n\
         TARGET AUDIENCE:\n{}\n\n\
         CONTEXT:\n{}\n\n\
         SUCCESS METRICS:\n{}\n\n\
         Follow the required format exactly.",
        draft.statement,
        draft.target_audience,
        draft.context,
        bullet_list(&draft.success_metrics, "None given"),
    )
}

fn solution_prompt(draft: &SolutionDraft, problem_statement: Option<&str>) -> String {
    format!(
        "Evaluate this solution design:\n\n\
         PROBLEM CONTEXT:\n{}\n\n\
         SOLUTION APPROACH:\n{}\n\n\
         KEY COMPONENTS:\n{}\n\n\
         METHODOLOGY:\n{}\n\n\
         EXPECTED OUTCOMES:\n{}\n\n\
         RESOURCE REQUIREMENTS:\n{}\n\n\
         Follow the required format exactly.",
        problem_statement.unwrap_or("N/A"),
        draft.approach,
        bullet_list(&draft.key_components, "None given"),
        draft.methodology,
        bullet_list(&draft.expected_outcomes, "None given"),
        draft.resource_requirements.as_deref().unwrap_or("Not specified"),
    )
}

/// Turns oracle text into an evaluation for `mode`. Never fails.
pub fn parse_evaluation(text: &str, mode: EvaluationMode) -> Evaluation {
    let schema = match mode {
        EvaluationMode::Problem => &PROBLEM_EVALUATION_SCHEMA,
        EvaluationMode::Solution => &SOLUTION_EVALUATION_SCHEMA,
    };
    let record = extract(text, schema);

    let scores: BTreeMap<Criterion, f64> = mode
        .criteria()
        .iter()
        .map(|c| (*c, record.number(criterion_field(*c))))
        .collect();
    let values: Vec<f64> = scores.values().copied().collect();
    let passed = passes(&values);

    Evaluation {
        mode,
        scores,
        passed,
        overall_feedback: record.text("overall_feedback"),
        strengths: record.list("strengths"),
        suggestions: record.list("suggestions"),
        example_improvements: if passed {
            None
        } else {
            record.optional_text("example_improvements")
        },
        next_steps: record.text("next_steps"),
        extraction: record.report,
    }
}

impl WorkerOutput for Evaluation {
    fn extraction_report(&self) -> ExtractionReport {
        self.extraction.clone()
    }
}

pub struct Evaluator {
    oracle: Oracle,
}

impl Evaluator {
    pub fn new(oracle: Oracle) -> Self {
        Self { oracle }
    }
}

#[async_trait]
impl Worker for Evaluator {
    const NAME: &'static str = "evaluator";
    type Request = EvaluationRequest;
    type Output = Evaluation;

    async fn run(
        &self,
        ctx: &WorkerContext,
        request: EvaluationRequest,
    ) -> Result<Evaluation, WorkerError> {
        let mode = request.mode();
        let prompt = match &request {
            EvaluationRequest::Problem(draft) => {
                if draft.statement.trim().is_empty() {
                    return Err(WorkerError::MissingInput("problem_statement"));
                }
                Prompt {
                    system: PROBLEM_SYSTEM_PROMPT,
                    user: problem_prompt(draft),
                    temperature: TEMPERATURE,
                }
            }
            EvaluationRequest::Solution {
                solution,
                problem_statement,
            } => {
                if solution.approach.trim().is_empty() {
                    return Err(WorkerError::MissingInput("solution_approach"));
                }
                Prompt {
                    system: SOLUTION_SYSTEM_PROMPT,
                    user: solution_prompt(solution, problem_statement.as_deref()),
                    temperature: TEMPERATURE,
                }
            }
        };

        let text = self.oracle.ask(ctx, Self::NAME, prompt).await?;
        Ok(parse_evaluation(&text, mode))
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use super::*;
    use crate::adapters::ai::MockAIProvider;

    fn problem_scores(market: u32, clarity: u32, feasibility: u32) -> String {
        format!(
            "# EVALUATION SCORES\n\
             Market Relevance: {}/10\n\
             Clarity: {}\n\
             Feasibility: {}\n\n\
             # OVERALL FEEDBACK\n\
             Solid framing.\n\n\
             # STRENGTHS\n\
             - Specific audience\n\n\
             # IMPROVEMENT SUGGESTIONS\n\
             - Quantify the pain\n\n\
             # EXAMPLES OF IMPROVEMENTS\n\
             Say how many users churn each month.\n\n\
             # NEXT STEPS\n\
             Move on to the solution.\n",
            market, clarity, feasibility
        )
    }

    fn draft() -> ProblemDraft {
        ProblemDraft {
            statement: "Neobank users churn silently".to_string(),
            target_audience: "Retail neobank customers".to_string(),
            context: "Churn is detected too late".to_string(),
            success_metrics: vec!["Flag 80% of churners a week early".to_string()],
        }
    }

    #[test]
    fn all_eights_pass() {
        let evaluation = parse_evaluation(&problem_scores(8, 8, 8), EvaluationMode::Problem);
        assert!(evaluation.passed);
        assert_eq!(evaluation.scores[&Criterion::MarketRelevance], 8.0);
        assert_eq!(evaluation.example_improvements, None);
        assert_eq!(evaluation.strengths, vec!["Specific audience".to_string()]);
        assert_eq!(evaluation.next_steps, "Move on to the solution.");
    }

    #[test]
    fn one_low_score_fails_with_examples() {
        let evaluation = parse_evaluation(&problem_scores(5, 8, 8), EvaluationMode::Problem);
        assert!(!evaluation.passed);
        assert_eq!(
            evaluation.example_improvements.as_deref(),
            Some("Say how many users churn each month.")
        );
    }

    #[test]
    fn scores_are_clamped() {
        let evaluation = parse_evaluation(&problem_scores(15, 8, 8), EvaluationMode::Problem);
        assert_eq!(evaluation.scores[&Criterion::MarketRelevance], 10.0);
    }

    #[test]
    fn missing_scores_default_to_five_and_fail() {
        let evaluation = parse_evaluation("Looks fine to me.", EvaluationMode::Solution);
        assert_eq!(evaluation.scores.len(), 4);
        assert!(evaluation.scores.values().all(|s| *s == 5.0));
        assert!(!evaluation.passed);
        assert_eq!(evaluation.overall_feedback, "Evaluation completed.");
        assert_eq!(evaluation.next_steps, "Revise based on feedback and resubmit.");
        assert!(evaluation.extraction.is_degraded());
    }

    #[test]
    fn problem_submission_reads_labels() {
        let message = "Problem Statement: Neobank users churn silently\n\
                       Target Audience: Retail customers\n\
                       Context: Churn is detected too late\n\
                       Success Metrics: 80% early detection, 10% less churn";
        let (draft, report) = ProblemDraft::from_submission(message);

        assert_eq!(draft.statement, "Neobank users churn silently");
        assert_eq!(draft.target_audience, "Retail customers");
        assert_eq!(draft.success_metrics.len(), 2);
        assert!(!report.is_degraded());
    }

    #[test]
    fn unlabeled_problem_submission_uses_fallbacks() {
        let message = "People forget to cancel subscriptions and lose money.";
        let (draft, report) = ProblemDraft::from_submission(message);

        assert_eq!(draft.statement, message);
        assert_eq!(draft.target_audience, "To be refined");
        assert_eq!(draft.context, message);
        assert_eq!(draft.success_metrics, vec!["To be defined".to_string()]);
        assert!(report.degraded_fields().contains(&"target_audience".to_string()));
    }

    #[test]
    fn long_statement_fallback_is_capped() {
        let message = "x".repeat(800);
        let (draft, _) = ProblemDraft::from_submission(&message);
        assert_eq!(draft.statement.chars().count(), STATEMENT_FALLBACK_CHARS);
    }

    #[test]
    fn solution_submission_reads_labels() {
        let message = "Solution Approach: Weekly churn-risk email\n\
                       Key Components: scoring model, email job\n\
                       Methodology: Lean experiments\n\
                       Expected Outcomes: fewer silent churners";
        let (draft, report) = SolutionDraft::from_submission(message);

        assert_eq!(draft.approach, "Weekly churn-risk email");
        assert_eq!(draft.key_components.len(), 2);
        assert_eq!(draft.methodology, "Lean experiments");
        assert_eq!(draft.resource_requirements, None);
        assert!(!report.is_degraded());
    }

    #[tokio::test]
    async fn run_scores_problem_in_problem_mode() {
        let provider = MockAIProvider::new().with_response(problem_scores(8, 8, 8));
        let evaluator = Evaluator::new(oracle_with(&provider));

        let response = evaluator
            .process(&test_context(), EvaluationRequest::Problem(draft()))
            .await;
        let evaluation = response.into_result().unwrap();
        assert_eq!(evaluation.mode, EvaluationMode::Problem);
        assert!(evaluation.passed);

        let call = &provider.get_calls()[0];
        assert_eq!(call.temperature, Some(TEMPERATURE));
        assert!(call.user_text().contains("Neobank users churn silently"));
    }

    #[tokio::test]
    async fn run_rejects_empty_solution() {
        let provider = MockAIProvider::new();
        let evaluator = Evaluator::new(oracle_with(&provider));
        let request = EvaluationRequest::Solution {
            solution: SolutionDraft {
                approach: String::new(),
                key_components: Vec::new(),
                methodology: String::new(),
                expected_outcomes: Vec::new(),
                resource_requirements: None,
            },
            problem_statement: None,
        };

        let response = evaluator.process(&test_context(), request).await;
        assert!(!response.success);
        assert_eq!(provider.call_count(), 0);
    }
}
