//! Execution Coach - milestone plans, progress assessment and next actions.

use async_trait::async_trait;

use super::{bullet_list, Oracle, Prompt, Worker, WorkerContext, WorkerError, WorkerOutput};
use crate::domain::extraction::{
    extract_from, parse_number, DegradationKind, ExtractionReport, FieldSpec, RecordSchema,
    Section, SectionMap, Source,
};
use crate::domain::foundation::{MilestoneId, ProjectId};
use crate::domain::portfolio::{Milestone, MilestoneStatus, ProblemDefinition, SolutionDesign};

const TEMPERATURE: f32 = 0.5;
const MIN_MILESTONES: usize = 3;
const DEFAULT_MILESTONE_DAYS: u32 = 3;
const MAX_MILESTONE_DAYS: f64 = 7.0;

const DEFAULT_FEEDBACK: &str = "Great work! Keep going.";
const DEFAULT_NEXT_ACTION: &str = "Continue with your current milestone.";
const DEFAULT_TIPS: [&str; 2] = ["Take it one step at a time", "Set aside focused time daily"];
const ALL_DONE: &str = "All milestones completed! Ready for review.";

const PLAN_SYSTEM_PROMPT: &str = "You are an execution coach who breaks projects into achievable milestones.

Create a realistic plan of 4-7 milestones. Each milestone takes 2-5 days, ends in a \
tangible deliverable, and follows logically from the previous one. The whole plan \
fits in 2-3 weeks.

Respond in exactly this format:

# EXECUTION PLAN

## Overview
[Brief execution strategy]

## Milestones

### Milestone 1: [Title]
Description: [What needs to be accomplished]
Deliverable: [Concrete output]
Estimated Days: [2-5]
Next Action: [ONE specific action to start]

### Milestone 2: [Title]
[Continue for all milestones]

## Tips for Success
- [Practical tip]

## Motivation
[Encouraging message]";

const PROGRESS_SYSTEM_PROMPT: &str = "You are an execution coach evaluating progress on one milestone.

Acknowledge the work, judge whether progress is meaningful, detect stagnation \
(stuck for more than 3 days, vague progress, avoided work) and give ONE clear next action.

Respond in exactly this format:

# PROGRESS EVALUATION

## Status Update
[Exactly one of: NOT_STARTED, IN_PROGRESS, COMPLETED, BLOCKED]

## Stagnation Detection
[YES or NO]

## Stagnation Reason
[If yes, why]

## Next Action
[ONE specific next step]

## Feedback
[Constructive, encouraging feedback]

## Tips
- [Practical tip]";

static PLAN_FIELDS: &[FieldSpec] = &[
    FieldSpec::optional_text("overview", Source::Section("Overview")),
    FieldSpec::list("tips", Source::Section("Tips"), 0, ""),
    FieldSpec::text("feedback", Source::Section("Motivation"), DEFAULT_FEEDBACK),
];
static PLAN_SCHEMA: RecordSchema = RecordSchema::new("execution_plan", PLAN_FIELDS);

static PROGRESS_FIELDS: &[FieldSpec] = &[
    FieldSpec::optional_text("status", Source::Section("Status Update")),
    FieldSpec::optional_text("stagnation", Source::FirstLine("Stagnation Detection")),
    FieldSpec::optional_text("stagnation_reason", Source::Section("Stagnation Reason")),
    FieldSpec::text("next_action", Source::FirstLine("Next Action"), DEFAULT_NEXT_ACTION),
    FieldSpec::text("feedback", Source::Section("Feedback"), DEFAULT_FEEDBACK),
    FieldSpec::list("tips", Source::Section("Tips"), 0, ""),
];
static PROGRESS_SCHEMA: RecordSchema = RecordSchema::new("progress_assessment", PROGRESS_FIELDS);

static STATUS_KEYWORDS: &[(&str, MilestoneStatus)] = &[
    ("NOT STARTED", MilestoneStatus::NotStarted),
    ("IN PROGRESS", MilestoneStatus::InProgress),
    ("COMPLETED", MilestoneStatus::Completed),
    ("BLOCKED", MilestoneStatus::Blocked),
];

/// Approved problem and solution the plan is built from.
#[derive(Debug, Clone)]
pub struct PlanInput {
    pub project_id: ProjectId,
    pub project_title: String,
    pub problem: ProblemDefinition,
    pub solution: SolutionDesign,
}

#[derive(Debug, Clone)]
pub struct ProgressInput {
    pub milestone: Milestone,
    pub update_text: String,
    pub blockers: Vec<String>,
}

#[derive(Debug, Clone)]
pub enum CoachRequest {
    CreatePlan(PlanInput),
    UpdateProgress(ProgressInput),
    /// Pure lookup; never reaches the oracle.
    GetNextAction {
        milestones: Vec<Milestone>,
        current: Option<MilestoneId>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExecutionPlan {
    pub milestones: Vec<Milestone>,
    pub total_estimated_days: u32,
    pub overview: Option<String>,
    pub next_action: String,
    pub feedback: String,
    pub tips: Vec<String>,
    pub extraction: ExtractionReport,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProgressAssessment {
    pub milestone_id: MilestoneId,
    /// Status the coach suggests; equal to the current one when unclear.
    pub status: MilestoneStatus,
    pub stagnation_detected: bool,
    pub stagnation_reason: Option<String>,
    pub next_action: String,
    pub feedback: String,
    pub tips: Vec<String>,
    pub extraction: ExtractionReport,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NextAction {
    pub milestone_id: Option<MilestoneId>,
    pub action: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum CoachOutput {
    Plan(ExecutionPlan),
    Progress(ProgressAssessment),
    NextAction(NextAction),
}

impl WorkerOutput for CoachOutput {
    fn extraction_report(&self) -> ExtractionReport {
        match self {
            CoachOutput::Plan(plan) => plan.extraction.clone(),
            CoachOutput::Progress(progress) => progress.extraction.clone(),
            CoachOutput::NextAction(_) => ExtractionReport::default(),
        }
    }
}

fn tips_or_default(tips: Vec<String>, report: &mut ExtractionReport) -> Vec<String> {
    if tips.is_empty() {
        report.note("tips", DegradationKind::Defaulted);
        DEFAULT_TIPS.iter().map(|t| t.to_string()).collect()
    } else {
        tips
    }
}

/// `### Milestone 1: Title` but not the `## Milestones` parent.
fn is_milestone_block(section: &Section) -> bool {
    section
        .name()
        .strip_prefix("milestone")
        .and_then(|rest| rest.chars().next())
        .map_or(false, |c| c == ' ' || c.is_ascii_digit())
}

fn milestone_title(section: &Section, order: u32) -> String {
    section
        .title
        .split_once(':')
        .map(|(_, title)| title.trim().to_string())
        .filter(|title| !title.is_empty())
        .unwrap_or_else(|| format!("Milestone {}", order))
}

fn estimated_days(section: &Section) -> u32 {
    section
        .labeled("Estimated Days")
        .and_then(|raw| parse_number(&raw))
        .map(|days| days.clamp(1.0, MAX_MILESTONE_DAYS).round() as u32)
        .unwrap_or(DEFAULT_MILESTONE_DAYS)
}

fn new_milestone(project_id: ProjectId, order: u32, title: String) -> Milestone {
    Milestone {
        id: MilestoneId::new(),
        project_id,
        order,
        title,
        description: "Project work".to_string(),
        deliverable: "Progress deliverable".to_string(),
        estimated_days: DEFAULT_MILESTONE_DAYS,
        status: MilestoneStatus::NotStarted,
        next_action: None,
        started_at: None,
        completed_at: None,
    }
}

fn parse_milestones(
    map: &SectionMap,
    project_id: ProjectId,
    report: &mut ExtractionReport,
) -> Vec<Milestone> {
    let mut milestones: Vec<Milestone> = map
        .iter()
        .filter(|s| is_milestone_block(s))
        .enumerate()
        .map(|(idx, section)| {
            let order = idx as u32 + 1;
            let mut milestone = new_milestone(project_id, order, milestone_title(section, order));
            match section.labeled("Description").filter(|d| !d.is_empty()) {
                Some(description) => milestone.description = description,
                None => report.note(format!("milestones[{}].description", idx), DegradationKind::Defaulted),
            }
            match section.labeled("Deliverable").filter(|d| !d.is_empty()) {
                Some(deliverable) => milestone.deliverable = deliverable,
                None => report.note(format!("milestones[{}].deliverable", idx), DegradationKind::Defaulted),
            }
            milestone.estimated_days = estimated_days(section);
            milestone.next_action = section.labeled("Next Action").filter(|a| !a.is_empty());
            milestone
        })
        .collect();

    if milestones.len() < MIN_MILESTONES {
        report.note("milestones", DegradationKind::Padded);
        while milestones.len() < MIN_MILESTONES {
            let order = milestones.len() as u32 + 1;
            let mut filler = new_milestone(project_id, order, format!("Milestone {}", order));
            filler.next_action = Some("Continue project work".to_string());
            milestones.push(filler);
        }
    }
    milestones
}

/// Turns oracle text into a plan with at least three milestones.
pub fn parse_plan(text: &str, project_id: ProjectId) -> ExecutionPlan {
    let map = SectionMap::parse(text);
    let record = extract_from(&map, &PLAN_SCHEMA);
    let mut report = record.report.clone();

    let milestones = parse_milestones(&map, project_id, &mut report);
    let next_action = milestones
        .first()
        .and_then(|m| m.next_action.clone())
        .unwrap_or_else(|| "Begin working on your first milestone.".to_string());

    ExecutionPlan {
        total_estimated_days: milestones.iter().map(|m| m.estimated_days).sum(),
        overview: record.optional_text("overview"),
        next_action,
        feedback: record.text("feedback"),
        tips: tips_or_default(record.list("tips"), &mut report),
        milestones,
        extraction: report,
    }
}

/// Reads a status only when exactly one distinct keyword appears.
fn parse_status(text: Option<&str>, current: MilestoneStatus) -> MilestoneStatus {
    let Some(text) = text else {
        return current;
    };
    let normalized = text.to_uppercase().replace(['_', '-'], " ");
    let mut found: Vec<MilestoneStatus> = STATUS_KEYWORDS
        .iter()
        .filter(|(keyword, _)| normalized.contains(keyword))
        .map(|(_, status)| *status)
        .collect();
    found.dedup();
    match found.as_slice() {
        [status] => *status,
        _ => current,
    }
}

pub fn parse_progress(text: &str, milestone: &Milestone) -> ProgressAssessment {
    let record = extract_from(&SectionMap::parse(text), &PROGRESS_SCHEMA);
    let mut report = record.report.clone();

    let stagnation_detected = text.to_uppercase().contains("STAGNATION DETECTED: YES")
        || record
            .optional_text("stagnation")
            .map_or(false, |s| s.trim().to_uppercase().starts_with("YES"));

    ProgressAssessment {
        milestone_id: milestone.id,
        status: parse_status(record.optional_text("status").as_deref(), milestone.status),
        stagnation_detected,
        stagnation_reason: if stagnation_detected {
            Some(
                record
                    .optional_text("stagnation_reason")
                    .unwrap_or_else(|| "Progress appears to have slowed.".to_string()),
            )
        } else {
            None
        },
        next_action: record.text("next_action"),
        feedback: record.text("feedback"),
        tips: tips_or_default(record.list("tips"), &mut report),
        extraction: report,
    }
}

/// Stored action of the current milestone, else of the first not-started one.
pub fn next_action(milestones: &[Milestone], current: Option<MilestoneId>) -> NextAction {
    let target = current
        .and_then(|id| milestones.iter().find(|m| m.id == id))
        .or_else(|| {
            milestones
                .iter()
                .find(|m| m.status == MilestoneStatus::NotStarted)
        });

    match target {
        Some(milestone) => NextAction {
            milestone_id: Some(milestone.id),
            action: milestone
                .next_action
                .clone()
                .unwrap_or_else(|| format!("Start working on: {}", milestone.title)),
        },
        None => NextAction {
            milestone_id: None,
            action: ALL_DONE.to_string(),
        },
    }
}

fn plan_prompt(input: &PlanInput) -> String {
    format!(
        "Create an execution plan for the project \"{}\".\n\n\
         PROBLEM:\n{}\n\n\
         Target Audience: {}\n\n\
         SUCCESS METRICS:\n{}\n\n\
         SOLUTION APPROACH:\n{}\n\n\
         KEY COMPONENTS:\n{}\n\n\
         METHODOLOGY:\n{}\n\n\
         EXPECTED OUTCOMES:\n{}\n\n\
         Follow the required format exactly.",
        input.project_title,
        input.problem.statement,
        input.problem.target_audience,
        bullet_list(&input.problem.success_metrics, "None given"),
        input.solution.approach,
        bullet_list(&input.solution.key_components, "None given"),
        input.solution.methodology,
        bullet_list(&input.solution.expected_outcomes, "None given"),
    )
}

fn progress_prompt(input: &ProgressInput) -> String {
    let milestone = &input.milestone;
    format!(
        "Evaluate this progress update.\n\n\
         CURRENT MILESTONE:\n{}\n\n\
         Description: {}\n\
         Expected Deliverable: {}\n\
         Current Status: {}\n\
         Estimated Days: {}\n\n\
         USER'S PROGRESS UPDATE:\n{}\n\n\
         BLOCKERS:\n{}\n\n\
         Follow the required format exactly.",
        milestone.title,
        milestone.description,
        milestone.deliverable,
        milestone.status,
        milestone.estimated_days,
        input.update_text,
        bullet_list(&input.blockers, "None reported"),
    )
}

pub struct ExecutionCoach {
    oracle: Oracle,
}

impl ExecutionCoach {
    pub fn new(oracle: Oracle) -> Self {
        Self { oracle }
    }
}

#[async_trait]
impl Worker for ExecutionCoach {
    const NAME: &'static str = "execution_coach";
    type Request = CoachRequest;
    type Output = CoachOutput;

    async fn run(
        &self,
        ctx: &WorkerContext,
        request: CoachRequest,
    ) -> Result<CoachOutput, WorkerError> {
        match request {
            CoachRequest::CreatePlan(input) => {
                if input.solution.approach.trim().is_empty() {
                    return Err(WorkerError::MissingInput("solution_approach"));
                }
                let prompt = Prompt {
                    system: PLAN_SYSTEM_PROMPT,
                    user: plan_prompt(&input),
                    temperature: TEMPERATURE,
                };
                let text = self.oracle.ask(ctx, Self::NAME, prompt).await?;
                Ok(CoachOutput::Plan(parse_plan(&text, input.project_id)))
            }
            CoachRequest::UpdateProgress(input) => {
                if input.update_text.trim().is_empty() {
                    return Err(WorkerError::MissingInput("progress_update"));
                }
                let prompt = Prompt {
                    system: PROGRESS_SYSTEM_PROMPT,
                    user: progress_prompt(&input),
                    temperature: TEMPERATURE,
                };
                let text = self.oracle.ask(ctx, Self::NAME, prompt).await?;
                Ok(CoachOutput::Progress(parse_progress(&text, &input.milestone)))
            }
            CoachRequest::GetNextAction {
                milestones,
                current,
            } => Ok(CoachOutput::NextAction(next_action(&milestones, current))),
        }
    }
}
