//! Proposal Generator - designs one portfolio project for a role and domain.

use async_trait::async_trait;
use std::sync::Arc;

use super::{Oracle, Prompt, Worker, WorkerContext, WorkerError, WorkerOutput};
use crate::domain::extraction::{
    extract_from, labeled_value, split_inline, strip_list_marker, DegradationKind,
    ExtractionReport, FieldSpec, RecordSchema, SectionMap, Source,
};
use crate::domain::portfolio::{Deliverable, ProjectProposal, ProjectType, RoadmapStep};
use crate::ports::KnowledgeRetriever;

const TEMPERATURE: f32 = 0.8;
const MIN_ROADMAP_STEPS: usize = 4;
const MAX_ROADMAP_STEPS: usize = 6;

const SYSTEM_PROMPT: &str = "You are a career coach who designs portfolio projects for job seekers.

Design ONE project that a single person can finish in 2-3 weeks, that shows skills the \
target role needs, and that ends in tangible, verifiable deliverables (live links, \
published work, real data) rather than plans or mockups.

Project types: RESEARCH (published paper), PRODUCT (launched with real users), \
CAMPAIGN (executed with measured results), STARTUP (small venture with attempted \
monetization), MARKETING (professional report sent to stakeholders).

Respond in exactly this format:

## Title
[Concise project title]

## Type
[RESEARCH/PRODUCT/CAMPAIGN/STARTUP/MARKETING]

## Description
[2-3 paragraphs]

## Why Relevant
[Why this fits the role and domain]

## Deliverables
1. [Name]: [Description] - Format: [Format]
   Evaluation criteria: [criterion], [criterion]

## Project Roadmap
Milestone 1: [Name]
- Tasks: [task], [task]
- Expected outcome: [State reached]
[4-6 milestones, no dates]

## Skills Demonstrated
- [Skill]

## Recruiter Appeal
[Why recruiters will care]

## Evaluation Criteria
1. [Criterion]

## Estimated Duration
[2.0-3.0 weeks]

## Alternative Options Considered
1. [Alternative]: [One line]

## Reasoning
[Why this project over the alternatives]";

static PROPOSAL_FIELDS: &[FieldSpec] = &[
    FieldSpec::text("title", Source::FirstLine("Title"), "Portfolio Project"),
    FieldSpec::text("type", Source::FirstLine("Type"), "PRODUCT"),
    FieldSpec::text("description", Source::Section("Description"), "Project description to be refined."),
    FieldSpec::text("why_relevant", Source::Section("Why Relevant"), "Builds skills valued for the target role."),
    FieldSpec::list("skills_demonstrated", Source::Section("Skills Demonstrated"), 0, ""),
    FieldSpec::text("recruiter_appeal", Source::Section("Recruiter Appeal"), "Demonstrates hands-on execution."),
    FieldSpec::list("evaluation_criteria", Source::Section("Evaluation Criteria"), 1, "Quality of execution"),
    FieldSpec::number("estimated_duration_weeks", Source::FirstLine("Estimated Duration"), 2.0, 3.0, 2.5),
    FieldSpec::list("alternatives_considered", Source::Section("Alternative Options Considered"), 0, ""),
    FieldSpec::optional_text("reasoning", Source::Section("Reasoning")),
];

pub static PROPOSAL_SCHEMA: RecordSchema = RecordSchema::new("project_proposal", PROPOSAL_FIELDS);

/// Learner profile the proposal is designed for.
#[derive(Debug, Clone, Default)]
pub struct ProposalRequest {
    pub target_role: String,
    pub target_domain: String,
    pub background: Option<String>,
    pub interests: Option<String>,
    /// Titles the learner already turned down.
    pub rejected_titles: Vec<String>,
}

impl WorkerOutput for ProjectProposal {
    fn extraction_report(&self) -> ExtractionReport {
        self.extraction.clone()
    }
}

pub struct ProposalGenerator {
    oracle: Oracle,
    retriever: Option<Arc<dyn KnowledgeRetriever>>,
}

impl ProposalGenerator {
    pub fn new(oracle: Oracle) -> Self {
        Self {
            oracle,
            retriever: None,
        }
    }

    pub fn with_retriever(mut self, retriever: Arc<dyn KnowledgeRetriever>) -> Self {
        self.retriever = Some(retriever);
        self
    }

    /// Domain context from the retriever, empty when absent or failing.
    async fn domain_context(&self, request: &ProposalRequest) -> String {
        let Some(retriever) = &self.retriever else {
            return String::new();
        };
        let query = format!(
            "project ideas and best practices for {} in {}",
            request.target_role, request.target_domain
        );
        match retriever
            .retrieve(&query, Some(&request.target_domain))
            .await
        {
            Ok(context) => context.as_prompt_block(),
            Err(err) => {
                tracing::warn!(error = %err, "Knowledge retrieval failed, continuing without context");
                String::new()
            }
        }
    }
}

fn user_prompt(request: &ProposalRequest, domain_context: &str) -> String {
    let mut prompt = format!(
        "Generate a project proposal for a job seeker with this profile:\n\n\
         Target Role: {}\nTarget Domain: {}\n",
        request.target_role, request.target_domain
    );
    if let Some(background) = &request.background {
        prompt.push_str(&format!("Background: {}\n", background));
    }
    if let Some(interests) = &request.interests {
        prompt.push_str(&format!("Interests: {}\n", interests));
    }
    if !request.rejected_titles.is_empty() {
        prompt.push_str(&format!(
            "\nAvoid projects similar to these rejected proposals: {}\n",
            request.rejected_titles.join(", ")
        ));
    }
    if !domain_context.is_empty() {
        prompt.push_str(&format!("\n{}\n", domain_context));
    }
    prompt.push_str("\nFollow the required format exactly.");
    prompt
}

/// Reads numbered deliverable items and their indented detail lines.
fn parse_deliverables(map: &SectionMap, report: &mut ExtractionReport) -> Vec<Deliverable> {
    let mut deliverables: Vec<Deliverable> = Vec::new();

    if let Some(section) = map.get("Deliverables") {
        for raw in &section.lines {
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            if let Some(criteria) = labeled_value(line, "Evaluation criteria") {
                if let Some(current) = deliverables.last_mut() {
                    current.evaluation_criteria = split_inline(&criteria);
                }
                continue;
            }
            let starts_item = line.starts_with(|c: char| c.is_ascii_digit())
                && strip_list_marker(line).is_some();
            if !starts_item {
                continue;
            }
            let item = strip_list_marker(line).unwrap_or(line);
            let (name, rest) = item.split_once(':').unwrap_or((item, ""));
            let (description, format) = match rest.split_once("Format:") {
                Some((desc, fmt)) => (
                    desc.trim().trim_end_matches('-').trim().to_string(),
                    fmt.trim().to_string(),
                ),
                None => (rest.trim().to_string(), "Document".to_string()),
            };
            deliverables.push(Deliverable {
                name: name.trim().trim_matches('*').trim().to_string(),
                description,
                format,
                evaluation_criteria: Vec::new(),
            });
        }
    }

    if deliverables.is_empty() {
        report.note("deliverables", DegradationKind::Defaulted);
        deliverables.push(Deliverable {
            name: "Final Report".to_string(),
            description: "Comprehensive project documentation".to_string(),
            format: "PDF document".to_string(),
            evaluation_criteria: vec![
                "Clarity".to_string(),
                "Depth".to_string(),
                "Professionalism".to_string(),
            ],
        });
    }
    deliverables
}

/// Reads `Milestone N: name` lines with their Tasks and Expected outcome.
fn parse_roadmap(map: &SectionMap, report: &mut ExtractionReport) -> Vec<RoadmapStep> {
    let mut steps: Vec<RoadmapStep> = Vec::new();

    let section = map.get("Project Roadmap").or_else(|| map.get("Roadmap"));
    if let Some(section) = section {
        for raw in &section.lines {
            let line = raw.trim().trim_start_matches('#').trim();
            let plain = strip_list_marker(line).unwrap_or(line);
            let lower = plain.to_lowercase();
            if lower.starts_with("milestone") || lower.starts_with("final milestone") {
                let name = plain
                    .split_once(':')
                    .map(|(_, name)| name.trim())
                    .filter(|n| !n.is_empty())
                    .unwrap_or(plain);
                steps.push(RoadmapStep {
                    name: name.trim_matches('*').trim().to_string(),
                    tasks: Vec::new(),
                    outcome: String::new(),
                });
            } else if let Some(current) = steps.last_mut() {
                if let Some(tasks) = labeled_value(plain, "Tasks") {
                    current.tasks = split_inline(&tasks);
                } else if let Some(outcome) = labeled_value(plain, "Expected outcome") {
                    current.outcome = outcome;
                }
            }
        }
    }

    if steps.len() < MIN_ROADMAP_STEPS {
        report.note("roadmap", DegradationKind::Padded);
        while steps.len() < MIN_ROADMAP_STEPS {
            let k = steps.len() + 1;
            steps.push(RoadmapStep {
                name: format!("Milestone {}", k),
                tasks: vec!["Project work".to_string()],
                outcome: "Progress checkpoint reached".to_string(),
            });
        }
    }
    if steps.len() > MAX_ROADMAP_STEPS {
        report.note("roadmap", DegradationKind::Truncated);
        steps.truncate(MAX_ROADMAP_STEPS);
    }
    steps
}

/// Turns oracle text into a proposal. Never fails.
pub fn parse_proposal(text: &str) -> ProjectProposal {
    let map = SectionMap::parse(text);
    let record = extract_from(&map, &PROPOSAL_SCHEMA);
    let mut report = record.report.clone();

    let project_type = match ProjectType::from_label(&record.text("type")) {
        Some(kind) => kind,
        None => {
            report.note("type", DegradationKind::Defaulted);
            ProjectType::default()
        }
    };
    let deliverables = parse_deliverables(&map, &mut report);
    let roadmap = parse_roadmap(&map, &mut report);

    ProjectProposal {
        title: record.text("title"),
        project_type,
        description: record.text("description"),
        why_relevant: record.text("why_relevant"),
        deliverables,
        roadmap,
        skills_demonstrated: record.list("skills_demonstrated"),
        recruiter_appeal: record.text("recruiter_appeal"),
        evaluation_criteria: record.list("evaluation_criteria"),
        estimated_duration_weeks: record.number("estimated_duration_weeks"),
        alternatives_considered: record.list("alternatives_considered"),
        reasoning: record.optional_text("reasoning").unwrap_or_default(),
        extraction: report,
    }
}

#[async_trait]
impl Worker for ProposalGenerator {
    const NAME: &'static str = "proposal_generator";
    type Request = ProposalRequest;
    type Output = ProjectProposal;

    async fn run(
        &self,
        ctx: &WorkerContext,
        request: ProposalRequest,
    ) -> Result<ProjectProposal, WorkerError> {
        if request.target_role.trim().is_empty() {
            return Err(WorkerError::MissingInput("target_role"));
        }
        if request.target_domain.trim().is_empty() {
            return Err(WorkerError::MissingInput("target_domain"));
        }

        let context = self.domain_context(&request).await;
        let text = self
            .oracle
            .ask(
                ctx,
                Self::NAME,
                Prompt {
                    system: SYSTEM_PROMPT,
                    user: user_prompt(&request, &context),
                    temperature: TEMPERATURE,
                },
            )
            .await?;

        Ok(parse_proposal(&text))
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use super::*;
    use crate::adapters::ai::MockAIProvider;
    use crate::adapters::retrieval::InMemoryKnowledgeBase;

    const GOOD_PROPOSAL: &str = "# PROJECT PROPOSAL

## Title
Churn Radar for Neobanks

## Type
PRODUCT

## Description
Build and launch a churn early-warning dashboard for a small neobank.

## Why Relevant
Product managers in FinTech own retention.

## Deliverables
1. Live Dashboard: Churn signals for 500 users - Format: Web app
   Evaluation criteria: Accuracy, Usability
2. Launch Report: Findings from two weeks live - Format: PDF

## Project Roadmap
Milestone 1: Research
- Tasks: Interview users, Audit data
- Expected outcome: Problem validated
Milestone 2: Build
- Tasks: Ship MVP
- Expected outcome: MVP live
Milestone 3: Pilot
- Tasks: Onboard 20 users
- Expected outcome: Live with initial users
Milestone 4: Measure
- Tasks: Track retention
- Expected outcome: Metrics report
Final Milestone: Publish
- Tasks: Write case study
- Expected outcome: Case study published

## Skills Demonstrated
- User research
- Analytics

## Recruiter Appeal
Shows end-to-end ownership.

## Evaluation Criteria
1. Impact on retention
2. Clarity of insight

## Estimated Duration
3 weeks

## Alternative Options Considered
1. Budget app: too crowded
2. Fraud alerts: data access too hard

## Reasoning
Balances ambition with feasibility.
";

    fn profile() -> ProposalRequest {
        ProposalRequest {
            target_role: "Product Manager".to_string(),
            target_domain: "FinTech".to_string(),
            background: None,
            interests: Some("payments".to_string()),
            rejected_titles: vec!["Budget Buddy".to_string()],
        }
    }

    #[test]
    fn parses_well_formed_proposal() {
        let proposal = parse_proposal(GOOD_PROPOSAL);

        assert_eq!(proposal.title, "Churn Radar for Neobanks");
        assert_eq!(proposal.project_type, ProjectType::Product);
        assert_eq!(proposal.deliverables.len(), 2);
        assert_eq!(proposal.deliverables[0].name, "Live Dashboard");
        assert_eq!(proposal.deliverables[0].format, "Web app");
        assert_eq!(
            proposal.deliverables[0].evaluation_criteria,
            vec!["Accuracy".to_string(), "Usability".to_string()]
        );
        assert_eq!(proposal.roadmap.len(), 5);
        assert_eq!(proposal.roadmap[0].tasks.len(), 2);
        assert_eq!(proposal.roadmap[4].name, "Publish");
        assert_eq!(proposal.estimated_duration_weeks, 3.0);
        assert_eq!(proposal.evaluation_criteria.len(), 2);
        assert_eq!(proposal.alternatives_considered.len(), 2);
        assert!(!proposal.extraction.is_degraded());
    }

    #[test]
    fn garbage_still_yields_complete_proposal() {
        let proposal = parse_proposal("the model wandered off");

        assert_eq!(proposal.title, "Portfolio Project");
        assert_eq!(proposal.deliverables.len(), 1);
        assert_eq!(proposal.deliverables[0].name, "Final Report");
        assert_eq!(proposal.roadmap.len(), MIN_ROADMAP_STEPS);
        assert_eq!(proposal.estimated_duration_weeks, 2.5);
        assert!(proposal.extraction.is_degraded());
        let degraded = proposal.extraction.degraded_fields();
        assert!(degraded.contains(&"deliverables".to_string()));
        assert!(degraded.contains(&"roadmap".to_string()));
    }

    #[test]
    fn duration_is_clamped() {
        let proposal = parse_proposal("## Estimated Duration\n8 weeks\n");
        assert_eq!(proposal.estimated_duration_weeks, 3.0);
    }

    #[test]
    fn long_roadmap_is_truncated() {
        let roadmap: String = (1..=8)
            .map(|i| format!("Milestone {}: Step {}\n", i, i))
            .collect();
        let proposal = parse_proposal(&format!("## Project Roadmap\n{}", roadmap));
        assert_eq!(proposal.roadmap.len(), MAX_ROADMAP_STEPS);
    }

    #[tokio::test]
    async fn run_sends_profile_and_rejections() {
        let provider = MockAIProvider::new().with_response(GOOD_PROPOSAL);
        let worker = ProposalGenerator::new(oracle_with(&provider));

        let response = worker.process(&test_context(), profile()).await;
        assert!(response.success);
        assert!(response.degraded_fields.is_empty());

        let call = &provider.get_calls()[0];
        assert_eq!(call.temperature, Some(TEMPERATURE));
        let text = call.user_text();
        assert!(text.contains("Target Role: Product Manager"));
        assert!(text.contains("Budget Buddy"));
        assert!(!text.contains("Relevant domain knowledge"));
    }

    #[tokio::test]
    async fn run_appends_retrieved_context() {
        let provider = MockAIProvider::new().with_response(GOOD_PROPOSAL);
        let worker = ProposalGenerator::new(oracle_with(&provider))
            .with_retriever(Arc::new(InMemoryKnowledgeBase::seeded()));

        worker.process(&test_context(), profile()).await;
        assert!(provider.get_calls()[0]
            .user_text()
            .contains("Relevant domain knowledge"));
    }

    #[tokio::test]
    async fn missing_role_fails_without_oracle_call() {
        let provider = MockAIProvider::new();
        let worker = ProposalGenerator::new(oracle_with(&provider));
        let request = ProposalRequest {
            target_role: " ".to_string(),
            ..profile()
        };

        let response = worker.process(&test_context(), request).await;
        assert!(!response.success);
        assert_eq!(provider.call_count(), 0);
    }
}
