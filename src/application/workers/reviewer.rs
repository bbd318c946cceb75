//! Reviewer - scores final artifacts and writes resume content from them.

use async_trait::async_trait;
use std::collections::BTreeMap;

use super::{bullet_list, Oracle, Prompt, Worker, WorkerContext, WorkerError, WorkerOutput};
use crate::domain::extraction::{
    extract_from, normalize_name, parse_number, split_inline, strip_list_marker,
    DegradationKind, ExtractionReport, FieldSpec, RecordSchema, Section, SectionMap, Source,
};
use crate::domain::foundation::{ResumeId, ReviewId, Timestamp};
use crate::domain::portfolio::{
    ArtifactReview, ArtifactSubmission, BulletCategory, Milestone, ProblemDefinition, Project,
    ResumeBullet, ResumePackage, SolutionDesign, MAX_RESUME_BULLETS, MIN_RESUME_BULLETS,
};

const REVIEW_TEMPERATURE: f32 = 0.3;
const RESUME_TEMPERATURE: f32 = 0.5;

const REVIEW_SYSTEM_PROMPT: &str = "You are an objective evaluator reviewing project artifacts.

Score honestly against the project's own evaluation criteria on a 0-10 scale, with no \
grade inflation. Judge only what was actually delivered, and explain how a recruiter \
would read this work.

Respond in exactly this format:

# ARTIFACT REVIEW

## Overall Assessment
[2-3 paragraphs]

## Overall Score
[0-10]

## Criterion Scores
[Criterion]: [0-10]

## Criterion Feedback
### [Criterion]
[Specific feedback]

## Strengths
- [Strength]

## Areas for Improvement
- [Area]

## Recruiter Appeal
[Honest recruiter view]

## Skills Demonstrated
- [Skill with evidence]

## Next Steps
- [What to do with this feedback]";

const RESUME_SYSTEM_PROMPT: &str = "You are a resume writer. Every claim must be backed by work that was actually delivered.

Write 3-5 bullets. Start each with a strong action verb, say what was done and in what \
context, add scope or metrics where available, and end with the outcome.

Respond in exactly this format:

# RESUME PACKAGE

## Project Title
[Professional title]

## Project One-Liner
[One sentence]

## Project Description
[2-3 sentences for cover letters]

## Resume Bullets

### Bullet 1
Text: [Full bullet]
Skills: [Skill, Skill]
Evidence: [Artifact or milestone backing the claim]
Type: [research/analysis/design/execution]

## Skills Section
- [Skill]

## Interview Talking Points
- [Point]

## Next Steps
- [How to use this content]";

static REVIEW_FIELDS: &[FieldSpec] = &[
    FieldSpec::text("overall_feedback", Source::Section("Overall Assessment"), "Artifacts reviewed."),
    FieldSpec::number("overall_score", Source::SectionOrLabel("Overall Score"), 0.0, 10.0, 7.0),
    FieldSpec::list("strengths", Source::Section("Strengths"), 0, ""),
    FieldSpec::list("areas_for_improvement", Source::Section("Areas for Improvement"), 0, ""),
    FieldSpec::text(
        "recruiter_appeal",
        Source::Section("Recruiter Appeal"),
        "Work demonstrates relevant skills.",
    ),
    FieldSpec::list("skills_demonstrated", Source::Section("Skills Demonstrated"), 0, ""),
    FieldSpec::list("next_steps", Source::Section("Next Steps"), 0, ""),
];
static REVIEW_SCHEMA: RecordSchema = RecordSchema::new("artifact_review", REVIEW_FIELDS);

static RESUME_FIELDS: &[FieldSpec] = &[
    FieldSpec::text("project_title", Source::FirstLine("Project Title"), "Project Completed"),
    FieldSpec::text("one_liner", Source::FirstLine("Project One-Liner"), "Completed a project"),
    FieldSpec::optional_text("description", Source::Section("Project Description")),
    FieldSpec::list("skills", Source::Section("Skills Section"), 0, ""),
    FieldSpec::list("talking_points", Source::Section("Interview Talking Points"), 0, ""),
    FieldSpec::list("next_steps", Source::Section("Next Steps"), 0, ""),
];
static RESUME_SCHEMA: RecordSchema = RecordSchema::new("resume_package", RESUME_FIELDS);

#[derive(Debug, Clone)]
pub struct ReviewInput {
    pub project: Project,
    pub artifacts: Vec<ArtifactSubmission>,
    pub problem_statement: Option<String>,
    pub solution_approach: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ResumeInput {
    pub project: Project,
    pub review: ArtifactReview,
    pub problem: Option<ProblemDefinition>,
    pub solution: Option<SolutionDesign>,
    pub completed_milestones: Vec<Milestone>,
}

#[derive(Debug, Clone)]
pub enum ReviewerRequest {
    ReviewArtifacts(ReviewInput),
    GenerateResume(ResumeInput),
}

#[derive(Debug, Clone, PartialEq)]
pub enum ReviewerOutput {
    Review(ArtifactReview),
    Resume(ResumePackage),
}

impl WorkerOutput for ReviewerOutput {
    fn extraction_report(&self) -> ExtractionReport {
        match self {
            ReviewerOutput::Review(review) => review.extraction.clone(),
            ReviewerOutput::Resume(resume) => resume.extraction.clone(),
        }
    }
}

/// `Name: 8/10` lines of the Criterion Scores section.
fn criterion_scores(map: &SectionMap) -> BTreeMap<String, f64> {
    let Some(section) = map.get("Criterion Scores") else {
        return BTreeMap::new();
    };
    section
        .lines
        .iter()
        .filter_map(|line| {
            let line = line.trim();
            let line = strip_list_marker(line).unwrap_or(line);
            let (name, score) = line.split_once(':')?;
            let name = name.trim().trim_matches('*').trim();
            let score = parse_number(score)?;
            (!name.is_empty()).then(|| (name.to_string(), score.clamp(0.0, 10.0)))
        })
        .collect()
}

/// One entry per `###` header under Criterion Feedback.
fn criterion_feedback(map: &SectionMap) -> BTreeMap<String, String> {
    let Some(section) = map.get("Criterion Feedback") else {
        return BTreeMap::new();
    };
    section
        .subsections()
        .iter()
        .filter_map(|sub| {
            let text = sub.text();
            (!text.is_empty()).then(|| (sub.title.trim().to_string(), text))
        })
        .collect()
}

/// Turns oracle text into a review covering every declared criterion.
pub fn parse_review(text: &str, input: &ReviewInput) -> ArtifactReview {
    let map = SectionMap::parse(text);
    let record = extract_from(&map, &REVIEW_SCHEMA);
    let mut report = record.report.clone();

    let overall_score = record.number("overall_score");
    let mut scores = criterion_scores(&map);
    for criterion in &input.project.proposal.evaluation_criteria {
        let wanted = normalize_name(criterion);
        if !scores.keys().any(|k| normalize_name(k) == wanted) {
            report.note(
                format!("criterion_scores.{}", criterion),
                DegradationKind::Defaulted,
            );
            scores.insert(criterion.clone(), overall_score);
        }
    }

    ArtifactReview {
        id: ReviewId::new(),
        project_id: input.project.id,
        artifacts: input.artifacts.clone(),
        overall_score,
        criterion_scores: scores,
        criterion_feedback: criterion_feedback(&map),
        overall_feedback: record.text("overall_feedback"),
        strengths: record.list("strengths"),
        areas_for_improvement: record.list("areas_for_improvement"),
        recruiter_appeal_assessment: record.text("recruiter_appeal"),
        skills_demonstrated: record.list("skills_demonstrated"),
        next_steps: record.list("next_steps"),
        created_at: Timestamp::now(),
        extraction: report,
    }
}

fn is_bullet_block(section: &Section) -> bool {
    section
        .name()
        .strip_prefix("bullet")
        .and_then(|rest| rest.chars().next())
        .map_or(false, |c| c == ' ' || c.is_ascii_digit())
}

fn filler_bullet() -> ResumeBullet {
    ResumeBullet {
        text: "Completed project deliverables".to_string(),
        skills: vec!["Project execution".to_string()],
        evidence: "Project completion".to_string(),
        category: BulletCategory::Execution,
    }
}

fn parse_bullets(map: &SectionMap, report: &mut ExtractionReport) -> Vec<ResumeBullet> {
    let mut bullets: Vec<ResumeBullet> = map
        .iter()
        .filter(|s| is_bullet_block(s))
        .filter_map(|section| {
            let text = section.labeled("Text").filter(|t| !t.is_empty())?;
            Some(ResumeBullet {
                text,
                skills: section
                    .labeled("Skills")
                    .map(|s| split_inline(&s))
                    .unwrap_or_default(),
                evidence: section.labeled("Evidence").unwrap_or_default(),
                category: section
                    .labeled("Type")
                    .and_then(|t| BulletCategory::from_label(&t))
                    .unwrap_or_default(),
            })
        })
        .collect();

    if bullets.len() < MIN_RESUME_BULLETS {
        report.note("bullets", DegradationKind::Padded);
        bullets.resize_with(MIN_RESUME_BULLETS, filler_bullet);
    }
    if bullets.len() > MAX_RESUME_BULLETS {
        report.note("bullets", DegradationKind::Truncated);
        bullets.truncate(MAX_RESUME_BULLETS);
    }
    bullets
}

/// Turns oracle text into a resume package with 3 to 5 bullets.
pub fn parse_resume(text: &str, input: &ResumeInput) -> ResumePackage {
    let map = SectionMap::parse(text);
    let record = extract_from(&map, &RESUME_SCHEMA);
    let mut report = record.report.clone();

    let project_description = record.optional_text("description").unwrap_or_else(|| {
        report.note("project_description", DegradationKind::Defaulted);
        input.project.proposal.description.clone()
    });

    ResumePackage {
        id: ResumeId::new(),
        project_id: input.project.id,
        review_id: input.review.id,
        project_title: record.text("project_title"),
        project_one_liner: record.text("one_liner"),
        project_description,
        bullets: parse_bullets(&map, &mut report),
        suggested_skills: record.list("skills"),
        talking_points: record.list("talking_points"),
        next_steps: record.list("next_steps"),
        created_at: Timestamp::now(),
        extraction: report,
    }
}

fn review_prompt(input: &ReviewInput) -> String {
    let artifacts = input
        .artifacts
        .iter()
        .enumerate()
        .map(|(i, a)| {
            let mut entry = format!(
                "### Artifact {}: {}\nDescription: {}\n",
                i + 1,
                a.artifact_type,
                a.description
            );
            if let Some(url) = &a.url {
                entry.push_str(&format!("URL: {}\n", url));
            }
            entry
        })
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "Review these submitted artifacts for \"{}\".\n\n\
         ## SUBMITTED ARTIFACTS\n\n{}\n\n\
         ## EVALUATION CRITERIA\n\n{}\n\n\
         ## PROJECT CONTEXT\n\n\
         Problem: {}\n\
         Solution Approach: {}\n\n\
         Follow the required format exactly.",
        input.project.title(),
        artifacts,
        bullet_list(&input.project.proposal.evaluation_criteria, "Quality of execution"),
        input.problem_statement.as_deref().unwrap_or("N/A"),
        input.solution_approach.as_deref().unwrap_or("N/A"),
    )
}

fn resume_prompt(input: &ResumeInput) -> String {
    let mut prompt = format!(
        "Generate resume content for the completed project \"{}\".\n\n",
        input.project.title()
    );
    if let Some(problem) = &input.problem {
        prompt.push_str(&format!(
            "## PROBLEM ADDRESSED\n\n{}\n\nTarget Audience: {}\n\n",
            problem.statement, problem.target_audience
        ));
    }
    if let Some(solution) = &input.solution {
        prompt.push_str(&format!(
            "## SOLUTION IMPLEMENTED\n\nApproach: {}\n\nKey Components:\n{}\n\nMethodology: {}\n\n",
            solution.approach,
            bullet_list(&solution.key_components, "None given"),
            solution.methodology
        ));
    }
    if !input.completed_milestones.is_empty() {
        let work: Vec<String> = input
            .completed_milestones
            .iter()
            .map(|m| format!("{}: {}", m.title, m.deliverable))
            .collect();
        prompt.push_str(&format!("## WORK COMPLETED\n\n{}\n\n", bullet_list(&work, "")));
    }
    prompt.push_str(&format!(
        "## ARTIFACT REVIEW\n\nOverall Score: {}/10\n\nSkills Demonstrated:\n{}\n\n\
         Only include claims supported by the work above.",
        input.review.overall_score,
        bullet_list(&input.review.skills_demonstrated, "None listed"),
    ));
    prompt
}

pub struct Reviewer {
    oracle: Oracle,
}

impl Reviewer {
    pub fn new(oracle: Oracle) -> Self {
        Self { oracle }
    }
}

#[async_trait]
impl Worker for Reviewer {
    const NAME: &'static str = "reviewer";
    type Request = ReviewerRequest;
    type Output = ReviewerOutput;

    async fn run(
        &self,
        ctx: &WorkerContext,
        request: ReviewerRequest,
    ) -> Result<ReviewerOutput, WorkerError> {
        match request {
            ReviewerRequest::ReviewArtifacts(input) => {
                if input.artifacts.is_empty() {
                    return Err(WorkerError::MissingInput("artifacts"));
                }
                let prompt = Prompt {
                    system: REVIEW_SYSTEM_PROMPT,
                    user: review_prompt(&input),
                    temperature: REVIEW_TEMPERATURE,
                };
                let text = self.oracle.ask(ctx, Self::NAME, prompt).await?;
                Ok(ReviewerOutput::Review(parse_review(&text, &input)))
            }
            ReviewerRequest::GenerateResume(input) => {
                let prompt = Prompt {
                    system: RESUME_SYSTEM_PROMPT,
                    user: resume_prompt(&input),
                    temperature: RESUME_TEMPERATURE,
                };
                let text = self.oracle.ask(ctx, Self::NAME, prompt).await?;
                Ok(ReviewerOutput::Resume(parse_resume(&text, &input)))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use super::*;
    use crate::adapters::ai::MockAIProvider;
    use crate::domain::portfolio::fixtures::test_proposal;
    use proptest::prelude::*;

    const GOOD_REVIEW: &str = "# ARTIFACT REVIEW\n\
        ## Overall Assessment\n\
        Strong, shipped work.\n\
        ## Overall Score\n\
        8.5\n\
        ## Criterion Scores\n\
        Clarity: 9/10\n\
        Impact: 7\n\
        ## Criterion Feedback\n\
        ### Clarity\n\
        Easy to follow.\n\
        ### Impact\n\
        Needs real users.\n\
        ## Strengths\n\
        - Shipped on time\n\
        ## Areas for Improvement\n\
        - Measure retention\n\
        ## Recruiter Appeal\n\
        Reads like real PM work.\n\
        ## Skills Demonstrated\n\
        - SQL\n\
        - User research\n\
        ## Next Steps\n\
        - Add metrics\n";

    fn review_input() -> ReviewInput {
        let mut proposal = test_proposal("Churn Radar");
        proposal.evaluation_criteria = vec!["Clarity".to_string(), "Rigor".to_string()];
        ReviewInput {
            project: Project::propose(proposal),
            artifacts: vec![ArtifactSubmission {
                artifact_type: "Dashboard".to_string(),
                description: "Live churn view".to_string(),
                url: Some("https://example.com/radar".to_string()),
            }],
            problem_statement: Some("Silent churn".to_string()),
            solution_approach: None,
        }
    }

    fn resume_input() -> ResumeInput {
        let input = review_input();
        let review = parse_review(GOOD_REVIEW, &input);
        ResumeInput {
            project: input.project,
            review,
            problem: None,
            solution: None,
            completed_milestones: Vec::new(),
        }
    }

    fn bullets_text(count: usize) -> String {
        (1..=count)
            .map(|i| {
                format!(
                    "### Bullet {}\nText: Built thing {}\nSkills: SQL, Python\nEvidence: Milestone {}\nType: Analysis\n",
                    i, i, i
                )
            })
            .collect::<Vec<_>>()
            .join("")
    }

    #[test]
    fn parses_review_sections() {
        let review = parse_review(GOOD_REVIEW, &review_input());

        assert_eq!(review.overall_score, 8.5);
        assert_eq!(review.criterion_scores["Clarity"], 9.0);
        assert_eq!(review.criterion_scores["Impact"], 7.0);
        assert_eq!(review.criterion_feedback["Impact"], "Needs real users.");
        assert_eq!(review.skills_demonstrated.len(), 2);
        assert_eq!(review.next_steps, vec!["Add metrics".to_string()]);
        assert_eq!(review.recruiter_appeal_assessment, "Reads like real PM work.");
    }

    #[test]
    fn declared_criteria_missing_from_reply_use_overall_score() {
        let review = parse_review(GOOD_REVIEW, &review_input());

        assert_eq!(review.criterion_scores["Rigor"], 8.5);
        assert_eq!(
            review.extraction.degraded_fields(),
            vec!["criterion_scores.Rigor".to_string()]
        );
    }

    #[test]
    fn garbage_review_uses_defaults() {
        let review = parse_review("no idea", &review_input());

        assert_eq!(review.overall_score, 7.0);
        assert_eq!(review.overall_feedback, "Artifacts reviewed.");
        assert_eq!(
            review.recruiter_appeal_assessment,
            "Work demonstrates relevant skills."
        );
        assert_eq!(review.criterion_scores.len(), 2);
    }

    #[test]
    fn resume_bullets_are_parsed() {
        let text = format!(
            "## Project Title\nChurn Radar\n## Project One-Liner\nFlags churn early\n## Resume Bullets\n{}",
            bullets_text(4)
        );
        let resume = parse_resume(&text, &resume_input());

        assert_eq!(resume.project_title, "Churn Radar");
        assert_eq!(resume.bullets.len(), 4);
        assert_eq!(resume.bullets[0].skills, vec!["SQL".to_string(), "Python".to_string()]);
        assert_eq!(resume.bullets[0].category, BulletCategory::Analysis);
        assert_eq!(resume.bullets[3].evidence, "Milestone 4");
    }

    #[test]
    fn garbage_resume_is_padded() {
        let resume = parse_resume("", &resume_input());

        assert_eq!(resume.project_title, "Project Completed");
        assert_eq!(resume.project_one_liner, "Completed a project");
        assert_eq!(resume.bullets.len(), MIN_RESUME_BULLETS);
        assert_eq!(resume.bullets[0].text, "Completed project deliverables");
        assert!(resume.extraction.is_degraded());
    }

    proptest! {
        #[test]
        fn resume_always_has_three_to_five_bullets(count in 0usize..9) {
            let resume = parse_resume(&bullets_text(count), &resume_input());
            prop_assert!(resume.bullets.len() >= MIN_RESUME_BULLETS);
            prop_assert!(resume.bullets.len() <= MAX_RESUME_BULLETS);
        }
    }

    #[tokio::test]
    async fn review_sends_criteria_and_links() {
        let provider = MockAIProvider::new().with_response(GOOD_REVIEW);
        let reviewer = Reviewer::new(oracle_with(&provider));

        let output = reviewer
            .process(&test_context(), ReviewerRequest::ReviewArtifacts(review_input()))
            .await
            .into_result()
            .unwrap();
        assert!(matches!(output, ReviewerOutput::Review(_)));

        let call = &provider.get_calls()[0];
        assert_eq!(call.temperature, Some(REVIEW_TEMPERATURE));
        assert!(call.user_text().contains("- Rigor"));
        assert!(call.user_text().contains("https://example.com/radar"));
    }

    #[tokio::test]
    async fn review_without_artifacts_fails() {
        let provider = MockAIProvider::new();
        let reviewer = Reviewer::new(oracle_with(&provider));
        let mut input = review_input();
        input.artifacts.clear();

        let response = reviewer
            .process(&test_context(), ReviewerRequest::ReviewArtifacts(input))
            .await;
        assert!(!response.success);
        assert_eq!(provider.call_count(), 0);
    }

    #[tokio::test]
    async fn resume_uses_higher_temperature() {
        let provider = MockAIProvider::new().with_response(bullets_text(3));
        let reviewer = Reviewer::new(oracle_with(&provider));

        let output = reviewer
            .process(&test_context(), ReviewerRequest::GenerateResume(resume_input()))
            .await
            .into_result()
            .unwrap();
        match output {
            ReviewerOutput::Resume(resume) => assert_eq!(resume.bullets.len(), 3),
            other => panic!("unexpected output {:?}", other),
        }
        assert_eq!(provider.get_calls()[0].temperature, Some(RESUME_TEMPERATURE));
    }
}
