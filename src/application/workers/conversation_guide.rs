//! Conversation Guide - user-facing reply templates and approval detection.
//!
//! Deterministic. Never reaches the oracle, so replies stay short and plain.

use async_trait::async_trait;

use super::execution_coach::{ExecutionPlan, ProgressAssessment};
use super::{bullet_list, Worker, WorkerContext, WorkerError, WorkerOutput};
use crate::domain::journey::OnboardingStep;
use crate::domain::portfolio::{ArtifactReview, Evaluation, ProjectProposal, ResumePackage};

/// Literal answer that skips an optional onboarding question.
pub const DEFAULT_SKIP_TOKEN: &str = "skip";

const WELCOME: &str = "Welcome to Sapiens! I'll guide you through a 2-3 week portfolio project \
that recruiters can verify: we design a project for your target role, define the problem, \
design a solution, execute it milestone by milestone, and turn the result into resume content.";

/// Every kind of reply the orchestrator sends.
#[derive(Debug, Clone)]
pub enum ReplyKind {
    Welcome,
    OnboardingQuestion(OnboardingStep),
    Proposal(ProjectProposal),
    ProblemPrompt,
    ProblemFeedback(Evaluation),
    SolutionPrompt,
    SolutionFeedback(Evaluation),
    ExecutionPlan(ExecutionPlan),
    MilestoneUpdate(ProgressAssessment),
    NextAction(String),
    ReviewRequest,
    ReviewFeedback(ArtifactReview),
    ResumeDelivery(ResumePackage),
    Completion,
}

impl WorkerOutput for String {}

#[derive(Debug, Clone)]
pub struct ConversationGuide {
    skip_token: String,
}

impl Default for ConversationGuide {
    fn default() -> Self {
        Self::new(DEFAULT_SKIP_TOKEN)
    }
}

impl ConversationGuide {
    pub fn new(skip_token: impl Into<String>) -> Self {
        Self {
            skip_token: skip_token.into(),
        }
    }

    /// True when `message` is the literal skip answer.
    pub fn is_skip(&self, message: &str) -> bool {
        message.trim().eq_ignore_ascii_case(&self.skip_token)
    }

    pub fn render(&self, kind: &ReplyKind) -> String {
        match kind {
            ReplyKind::Welcome => format!(
                "{}\n\n{}",
                WELCOME,
                self.onboarding_question(OnboardingStep::Role)
            ),
            ReplyKind::OnboardingQuestion(step) => self.onboarding_question(*step),
            ReplyKind::Proposal(proposal) => proposal_text(proposal),
            ReplyKind::ProblemPrompt => PROBLEM_PROMPT.to_string(),
            ReplyKind::ProblemFeedback(evaluation) => evaluation_text(
                evaluation,
                "problem definition",
                "You're ready to move to solution design!",
            ),
            ReplyKind::SolutionPrompt => SOLUTION_PROMPT.to_string(),
            ReplyKind::SolutionFeedback(evaluation) => evaluation_text(
                evaluation,
                "solution design",
                "You're ready to start execution. Let's build your milestone plan.",
            ),
            ReplyKind::ExecutionPlan(plan) => plan_text(plan),
            ReplyKind::MilestoneUpdate(assessment) => progress_text(assessment),
            ReplyKind::NextAction(action) => format!("**Your next action:** {}", action),
            ReplyKind::ReviewRequest => REVIEW_REQUEST.to_string(),
            ReplyKind::ReviewFeedback(review) => review_text(review),
            ReplyKind::ResumeDelivery(resume) => resume_text(resume),
            ReplyKind::Completion => COMPLETION.to_string(),
        }
    }

    fn onboarding_question(&self, step: OnboardingStep) -> String {
        match step {
            OnboardingStep::Role => "**What role are you targeting?** \
                (e.g., Product Manager, Data Analyst, Marketing Associate)"
                .to_string(),
            OnboardingStep::Domain => "**Which industry or domain interests you?** \
                (e.g., FinTech, Healthcare, E-commerce)"
                .to_string(),
            OnboardingStep::Background => format!(
                "**Tell me briefly about your background.** (or type '{}')",
                self.skip_token
            ),
            OnboardingStep::Interests => format!(
                "**Any topics you'd especially like to work on?** (or type '{}')",
                self.skip_token
            ),
            OnboardingStep::Done => "Thanks! Designing your project now.".to_string(),
        }
    }
}

#[async_trait]
impl Worker for ConversationGuide {
    const NAME: &'static str = "conversation_guide";
    type Request = ReplyKind;
    type Output = String;

    async fn run(&self, _ctx: &WorkerContext, request: ReplyKind) -> Result<String, WorkerError> {
        Ok(self.render(&request))
    }
}

const PROBLEM_PROMPT: &str = "Now let's define the specific problem your project addresses.

Please provide:
Problem Statement: what specific problem are you solving?
Target Audience: who experiences it?
Context: why does it matter right now?
Success Metrics: how will you know you've addressed it?";

const SOLUTION_PROMPT: &str = "Great! Now let's design your solution.

Please provide:
Solution Approach: your high-level approach
Key Components: the main parts of the solution
Methodology: methods or frameworks you'll use
Expected Outcomes: what it will achieve
Resource Requirements (optional): tools, data or access you need";

const REVIEW_REQUEST: &str = "Congratulations on finishing your milestones! Time for the final review.

Describe each artifact you produced (report, prototype, campaign results...) and include \
links where you have them. I'll evaluate them against the project's criteria.";

const COMPLETION: &str = "Congratulations! You've completed your project journey with Sapiens. \
Add the bullets to your resume, put the project on LinkedIn, and keep your artifacts handy \
for interviews. Best of luck with your search!";

fn proposal_text(proposal: &ProjectProposal) -> String {
    let deliverables: Vec<String> = proposal
        .deliverables
        .iter()
        .map(|d| format!("**{}**: {}", d.name, d.description))
        .collect();
    format!(
        "I've designed a project for you:\n\n\
         # {}\n\n\
         **Project Type:** {}\n\n\
         **Why This Project:**\n{}\n\n\
         **What You'll Build:**\n{}\n\n\
         **Deliverables:**\n{}\n\n\
         **Skills You'll Demonstrate:**\n{}\n\n\
         **Estimated Time:** {} weeks\n\n\
         **Why Recruiters Will Love This:**\n{}\n\n\
         ---\n\n\
         Do you want to go with this project? (Yes/No or request changes)",
        proposal.title,
        proposal.project_type.as_str(),
        proposal.why_relevant,
        proposal.description,
        bullet_list(&deliverables, "To be defined"),
        bullet_list(&proposal.skills_demonstrated, "To be defined"),
        proposal.estimated_duration_weeks,
        proposal.recruiter_appeal,
    )
}

fn scores_text(evaluation: &Evaluation) -> String {
    let lines: Vec<String> = evaluation
        .scores
        .iter()
        .map(|(criterion, score)| format!("{}: {}/10", criterion.label(), score))
        .collect();
    bullet_list(&lines, "")
}

fn evaluation_text(evaluation: &Evaluation, subject: &str, next: &str) -> String {
    if evaluation.passed {
        return format!(
            "Excellent! Your {} is strong.\n\n{}\n\n**Strengths:**\n{}\n\n**Scores:**\n{}\n\n{}",
            subject,
            evaluation.overall_feedback,
            bullet_list(&evaluation.strengths, "Clear thinking"),
            scores_text(evaluation),
            next,
        );
    }

    let mut text = format!(
        "Good start! Your {} needs some refinement.\n\n{}\n\n\
         **What's Working:**\n{}\n\n\
         **Suggestions for Improvement:**\n{}\n\n\
         **Scores:**\n{}",
        subject,
        evaluation.overall_feedback,
        bullet_list(&evaluation.strengths, "Getting your ideas down"),
        bullet_list(&evaluation.suggestions, "See the feedback above"),
        scores_text(evaluation),
    );
    if let Some(examples) = &evaluation.example_improvements {
        text.push_str(&format!("\n\n**Examples:**\n{}", examples));
    }
    text.push_str(&format!(
        "\n\nPlease revise your {} based on this feedback.",
        subject
    ));
    text
}

fn plan_text(plan: &ExecutionPlan) -> String {
    let milestones: Vec<String> = plan
        .milestones
        .iter()
        .map(|m| {
            format!(
                "### {}. {}\n- **Goal**: {}\n- **Deliverable**: {}\n- **Estimated Time**: {} days",
                m.order, m.title, m.description, m.deliverable, m.estimated_days
            )
        })
        .collect();
    let first = plan
        .milestones
        .first()
        .map(|m| m.title.as_str())
        .unwrap_or("your first milestone");

    format!(
        "Here's your execution plan.\n\n{}\n\n{}\n\n\
         **Total Estimated Time:** {} days\n\n---\n\n\
         Your first milestone is **{}**.\n\n\
         **Your next action:** {}\n\n\
         Share an update whenever you make progress.",
        plan.feedback,
        milestones.join("\n\n"),
        plan.total_estimated_days,
        first,
        plan.next_action,
    )
}

fn progress_text(assessment: &ProgressAssessment) -> String {
    let mut text = assessment.feedback.clone();
    if assessment.stagnation_detected {
        text.push_str("\n\nIt looks like you might be stuck. Let's get you moving again.");
    }
    text.push_str(&format!("\n\n**Your next action:** {}", assessment.next_action));
    if !assessment.tips.is_empty() {
        text.push_str(&format!("\n\n**Tips:**\n{}", bullet_list(&assessment.tips, "")));
    }
    text
}

fn review_text(review: &ArtifactReview) -> String {
    let scores: Vec<String> = review
        .criterion_scores
        .iter()
        .map(|(name, score)| format!("{}: {}/10", name, score))
        .collect();
    format!(
        "# Project Review Complete\n\n{}\n\n\
         **Overall Score:** {}/10\n\n\
         **Criterion Scores:**\n{}\n\n\
         **Strengths:**\n{}\n\n\
         **Areas for Improvement:**\n{}\n\n\
         **Recruiter Perspective:**\n{}\n\n\
         **Skills You Demonstrated:**\n{}\n\n---\n\n\
         Ready to generate your resume content? (Yes/No)",
        review.overall_feedback,
        review.overall_score,
        bullet_list(&scores, "None"),
        bullet_list(&review.strengths, "None listed"),
        bullet_list(&review.areas_for_improvement, "None listed"),
        review.recruiter_appeal_assessment,
        bullet_list(&review.skills_demonstrated, "None listed"),
    )
}

fn resume_text(resume: &ResumePackage) -> String {
    let bullets: Vec<String> = resume
        .bullets
        .iter()
        .enumerate()
        .map(|(i, b)| format!("{}. {}\n   *Skills: {}*", i + 1, b.text, b.skills.join(", ")))
        .collect();
    format!(
        "# Your Resume Content\n\n\
         **{}**\n\n{}\n\n\
         ## Resume Bullets\n{}\n\n\
         ## Cover Letter Description\n{}\n\n\
         ## Skills to Add\n{}\n\n\
         ## Interview Talking Points\n{}\n\n\
         Congratulations on completing your project!",
        resume.project_title,
        resume.project_one_liner,
        bullets.join("\n"),
        resume.project_description,
        bullet_list(&resume.suggested_skills, "None listed"),
        bullet_list(&resume.talking_points, "None listed"),
    )
}

/// Outcome of classifying a reply to a yes/no gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Approval {
    Approved,
    Rejected,
    Unclear,
}

/// Keyword classifier for approval gates.
///
/// Positive keywords are checked first and there is no negation handling,
/// so "I do not approve" classifies as approval.
#[derive(Debug, Clone)]
pub struct ApprovalClassifier {
    positive: &'static [&'static str],
    negative: &'static [&'static str],
}

const POSITIVE: &[&str] = &["yes", "approve", "approved", "looks good", "proceed", "confirm"];
const NEGATIVE: &[&str] = &["no", "reject", "change", "changes", "different", "not"];

impl Default for ApprovalClassifier {
    fn default() -> Self {
        Self {
            positive: POSITIVE,
            negative: NEGATIVE,
        }
    }
}

impl ApprovalClassifier {
    pub fn classify(&self, message: &str) -> Approval {
        let lower = message.to_lowercase();
        let words: Vec<&str> = lower
            .split(|c: char| !c.is_alphanumeric() && c != '\'')
            .filter(|w| !w.is_empty())
            .collect();
        let contains = |keyword: &str| {
            if keyword.contains(' ') {
                lower.contains(keyword)
            } else {
                words.contains(&keyword)
            }
        };

        if self.positive.iter().any(|k| contains(k)) {
            Approval::Approved
        } else if self.negative.iter().any(|k| contains(k)) {
            Approval::Rejected
        } else {
            Approval::Unclear
        }
    }
}
