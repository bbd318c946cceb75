use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use super::*;
use crate::adapters::ai::{MockAIProvider, MockError};
use crate::adapters::storage::InMemoryJourneyStore;
use crate::domain::journey::EventKind;
use crate::domain::portfolio::{
    Milestone, MilestoneStatus, ProblemDefinition, Project, ProjectStatus, RecordKind,
    SolutionDesign,
};
use crate::ports::{JourneyStoreExt, MessageRole};

const USER: &str = "learner";

const PROPOSAL: &str = "# PROJECT PROPOSAL\n\n## Title\nChurn Radar\n\n## Type\nPRODUCT\n\n\
## Description\nBuild a churn early-warning dashboard.\n";

const SECOND_PROPOSAL: &str = "## Title\nFraud Lens\n\n## Description\nFlag risky payments.\n";

fn problem_scores(score: u32) -> String {
    format!(
        "# EVALUATION SCORES\nMarket Relevance: {s}\nClarity: {s}\nFeasibility: {s}\n\n\
         # OVERALL FEEDBACK\nNoted.\n",
        s = score
    )
}

fn solution_scores(score: u32) -> String {
    format!(
        "# EVALUATION SCORES\nLogical Coherence: {s}\nInnovation: {s}\n\
         Implementation Feasibility: {s}\nImpact Potential: {s}\n\n\
         # OVERALL FEEDBACK\nSound.\n",
        s = score
    )
}

const PLAN: &str = "# EXECUTION PLAN\n## Milestones\n\
### Milestone 1: User interviews\nDescription: Talk to users\nDeliverable: Notes\n\
Estimated Days: 3\nNext Action: Draft the interview script\n\
### Milestone 2: Churn model\nDescription: Score churn risk\nDeliverable: Notebook\n\
Estimated Days: 5\nNext Action: Export transaction data\n\
### Milestone 3: Launch\nDescription: Ship the dashboard\nDeliverable: Live dashboard\n\
Estimated Days: 4\nNext Action: Pick a hosting provider\n";

const COMPLETED: &str = "## Status Update\nCOMPLETED\n## Stagnation Detection\nNO\n";

const REVIEW: &str = "# ARTIFACT REVIEW\n## Overall Assessment\nSolid.\n## Overall Score\n8\n";

/// Scripts every worker call needed to reach execution with a three-milestone plan.
fn execution_provider() -> MockAIProvider {
    MockAIProvider::new()
        .with_worker_response("proposal_generator", PROPOSAL)
        .with_worker_response("evaluator", problem_scores(8))
        .with_worker_response("evaluator", solution_scores(8))
        .with_worker_response("execution_coach", PLAN)
}

async fn reach_execution(orchestrator: &Orchestrator) {
    onboard(orchestrator).await;
    orchestrator.process_message(USER, None, "yes").await;
    orchestrator
        .process_message(USER, None, "Problem Statement: 8% of users churn monthly")
        .await;
    orchestrator
        .process_message(USER, None, "Solution Approach: weekly churn scoring")
        .await;
}

fn key() -> JourneyKey {
    JourneyKey::for_user(UserId::new(USER).unwrap())
}

fn orchestrator(provider: &MockAIProvider, store: &InMemoryJourneyStore) -> Orchestrator {
    Orchestrator::new(
        Oracle::new(Arc::new(provider.clone())),
        Arc::new(store.clone()),
    )
}

async fn state(store: &InMemoryJourneyStore) -> JourneyState {
    store.load_state(&key()).await.unwrap().unwrap()
}

async fn onboard(orchestrator: &Orchestrator) -> String {
    for message in ["hi", "Product Manager", "FinTech", "skip"] {
        orchestrator.process_message(USER, None, message).await;
    }
    orchestrator.process_message(USER, None, "skip").await
}

#[tokio::test]
async fn greeting_starts_onboarding() {
    let provider = MockAIProvider::new();
    let store = InMemoryJourneyStore::new();
    let orchestrator = orchestrator(&provider, &store);

    let reply = orchestrator.respond(USER, None, "hello").await;
    assert!(reply.reply.starts_with("Welcome to Sapiens!"));
    assert_eq!(reply.phase, Some(Phase::Onboarding));

    let state = state(&store).await;
    assert_eq!(state.context.onboarding_step, OnboardingStep::Role);
    let turns = store
        .events(&key(), Some(EventKind::Conversation), None)
        .await
        .unwrap();
    assert_eq!(turns.len(), 2);
    assert_eq!(provider.call_count(), 0);
}

#[tokio::test]
async fn onboarding_collects_answers_and_proposes() {
    let provider = MockAIProvider::new().with_worker_response("proposal_generator", PROPOSAL);
    let store = InMemoryJourneyStore::new();
    let orchestrator = orchestrator(&provider, &store);

    let reply = onboard(&orchestrator).await;
    assert!(reply.contains("# Churn Radar"));
    assert!(reply.ends_with("(Yes/No or request changes)"));

    let state = state(&store).await;
    assert_eq!(state.current_phase, Phase::ProjectGeneration);
    assert_eq!(state.target_role.as_deref(), Some("Product Manager"));
    assert_eq!(state.target_domain.as_deref(), Some("FinTech"));
    assert_eq!(state.background, None);
    assert_eq!(state.interests, None);
    assert!(state.project_id.is_some());
    assert!(!state.project_approved);
    assert_eq!(provider.calls_for("proposal_generator"), 1);

    let transitions = store
        .events(&key(), Some(EventKind::Transition), None)
        .await
        .unwrap();
    assert_eq!(transitions.len(), 1);
}

#[tokio::test]
async fn rejection_regenerates_and_remembers_title() {
    let provider = MockAIProvider::new()
        .with_worker_response("proposal_generator", PROPOSAL)
        .with_worker_response("proposal_generator", SECOND_PROPOSAL);
    let store = InMemoryJourneyStore::new();
    let orchestrator = orchestrator(&provider, &store);
    onboard(&orchestrator).await;
    let first_id = state(&store).await.project_id.unwrap();

    let reply = orchestrator.process_message(USER, None, "No").await;
    assert!(reply.starts_with("No problem"));
    assert!(reply.contains("# Fraud Lens"));

    let state = state(&store).await;
    assert_eq!(state.current_phase, Phase::ProjectGeneration);
    assert_eq!(state.context.rejected_proposals, vec!["Churn Radar".to_string()]);
    assert_ne!(state.project_id, Some(first_id));

    let rejected: Project = store.require(&key(), &first_id.to_string()).await.unwrap();
    assert_eq!(rejected.status, ProjectStatus::Rejected);

    let last = provider.get_calls().pop().unwrap();
    let prompt = &last
        .messages
        .iter()
        .find(|m| m.role == MessageRole::User)
        .unwrap()
        .content;
    assert!(prompt.contains("Churn Radar"));
}

#[tokio::test]
async fn unclear_answer_keeps_waiting() {
    let provider = MockAIProvider::new().with_worker_response("proposal_generator", PROPOSAL);
    let store = InMemoryJourneyStore::new();
    let orchestrator = orchestrator(&provider, &store);
    onboard(&orchestrator).await;

    let reply = orchestrator.process_message(USER, None, "hmm, tell me more").await;
    assert_eq!(reply, project_generation::APPROVAL_UNCLEAR);
    assert_eq!(state(&store).await.current_phase, Phase::ProjectGeneration);
    assert_eq!(provider.calls_for("proposal_generator"), 1);
}

#[tokio::test]
async fn approval_moves_to_problem_definition() {
    let provider = MockAIProvider::new().with_worker_response("proposal_generator", PROPOSAL);
    let store = InMemoryJourneyStore::new();
    let orchestrator = orchestrator(&provider, &store);
    onboard(&orchestrator).await;

    let reply = orchestrator.respond(USER, None, "Yes, looks good").await;
    assert_eq!(reply.phase, Some(Phase::ProblemDefinition));
    assert!(reply.reply.contains("Problem Statement"));

    let state = state(&store).await;
    assert!(state.project_approved);
    assert!(state.context.awaiting_problem);
    let project: Project = store
        .require(&key(), &state.project_id.unwrap().to_string())
        .await
        .unwrap();
    assert_eq!(project.status, ProjectStatus::Approved);
}

#[tokio::test]
async fn failed_proposal_keeps_phase_and_allows_retry() {
    let provider = MockAIProvider::new()
        .with_worker_error(
            "proposal_generator",
            MockError::Network {
                message: "reset".to_string(),
            },
        )
        .with_worker_response("proposal_generator", PROPOSAL);
    let store = InMemoryJourneyStore::new();
    let orchestrator = orchestrator(&provider, &store);

    let reply = onboard(&orchestrator).await;
    assert!(reply.contains(project_generation::PROPOSAL_FAILED));
    let current = state(&store).await;
    assert_eq!(current.current_phase, Phase::ProjectGeneration);
    assert!(current.project_id.is_none());

    let retry = orchestrator.process_message(USER, None, "try again").await;
    assert!(retry.contains("# Churn Radar"));
    assert!(state(&store).await.project_id.is_some());
}

#[tokio::test]
async fn failing_problem_stays_and_passing_problem_advances() {
    let provider = MockAIProvider::new()
        .with_worker_response("proposal_generator", PROPOSAL)
        .with_worker_response("evaluator", problem_scores(5))
        .with_worker_response("evaluator", problem_scores(8));
    let store = InMemoryJourneyStore::new();
    let orchestrator = orchestrator(&provider, &store);
    onboard(&orchestrator).await;
    orchestrator.process_message(USER, None, "yes").await;

    let first = orchestrator
        .process_message(USER, None, "Problem Statement: neobank users churn silently")
        .await;
    assert!(first.contains("Please revise your problem definition"));
    let after_first = state(&store).await;
    assert_eq!(after_first.current_phase, Phase::ProblemDefinition);
    assert!(!after_first.problem_approved);
    let problem_id = after_first.problem_id.unwrap();

    let second = orchestrator
        .respond(USER, None, "Problem Statement: 8% of neobank users churn each month")
        .await;
    assert_eq!(second.phase, Some(Phase::SolutionDesign));
    assert!(second.reply.contains("Solution Approach"));

    let after_second = state(&store).await;
    assert!(after_second.problem_approved);
    assert!(after_second.context.awaiting_solution);
    assert_eq!(after_second.problem_id, Some(problem_id));

    let problem: ProblemDefinition = store
        .require(&key(), &problem_id.to_string())
        .await
        .unwrap();
    assert_eq!(problem.version, 2);
    assert!(problem.is_approved());
    assert_eq!(store.record_count(RecordKind::Problem).await, 1);
}

#[tokio::test]
async fn going_back_reopens_the_proposal() {
    let provider = MockAIProvider::new().with_worker_response("proposal_generator", PROPOSAL);
    let store = InMemoryJourneyStore::new();
    let orchestrator = orchestrator(&provider, &store);
    onboard(&orchestrator).await;
    orchestrator.process_message(USER, None, "yes").await;

    let reply = orchestrator.respond(USER, None, "go back").await;
    assert_eq!(reply.phase, Some(Phase::ProjectGeneration));
    assert!(reply.reply.starts_with("Okay, let's revisit the project proposal."));
    assert!(reply.reply.contains("# Churn Radar"));

    let state = state(&store).await;
    assert!(!state.project_approved);
    assert!(!state.context.awaiting_problem);
    assert_eq!(state.previous_phase, Some(Phase::ProblemDefinition));
    assert_eq!(provider.calls_for("proposal_generator"), 1);
}

#[tokio::test]
async fn going_back_from_review_reopens_last_milestone() {
    let provider = execution_provider()
        .with_worker_response("execution_coach", COMPLETED)
        .with_worker_response("execution_coach", COMPLETED)
        .with_worker_response("execution_coach", COMPLETED)
        .with_worker_response("execution_coach", COMPLETED)
        .with_worker_response("reviewer", REVIEW);
    let store = InMemoryJourneyStore::new();
    let orchestrator = orchestrator(&provider, &store);
    reach_execution(&orchestrator).await;
    for update in ["Interviews done", "Model trained", "Dashboard live"] {
        orchestrator.process_message(USER, None, update).await;
    }
    orchestrator
        .process_message(USER, None, "Dashboard: https://example.com/radar")
        .await;
    let reviewed = state(&store).await;
    assert_eq!(reviewed.current_phase, Phase::Review);
    assert!(reviewed.review_id.is_some());
    assert_eq!(reviewed.milestones_completed, 3);

    let reply = orchestrator.respond(USER, None, "Go back").await;
    assert_eq!(reply.phase, Some(Phase::Execution));
    assert!(reply.reply.starts_with("Okay, let's revisit your milestones."));
    assert!(reply.reply.contains("Pick a hosting provider"));

    let reopened = state(&store).await;
    assert_eq!(reopened.milestones_completed, 2);
    assert!(reopened.review_id.is_none());
    assert!(reopened.resume_id.is_none());
    assert!(!reopened.resume_generated);
    assert!(!reopened.context.awaiting_artifacts);
    let last_id = reopened.milestone_ids[2];
    assert_eq!(reopened.current_milestone_id, Some(last_id));
    let last: Milestone = store.require(&key(), &last_id.to_string()).await.unwrap();
    assert_eq!(last.status, MilestoneStatus::InProgress);
    assert!(last.completed_at.is_none());

    let again = orchestrator.respond(USER, None, "Relaunched the dashboard").await;
    assert_eq!(again.phase, Some(Phase::Review));
    let resumed = state(&store).await;
    assert_eq!(resumed.milestones_completed, 3);
    assert!(resumed.context.awaiting_artifacts);
}

#[tokio::test]
async fn going_back_from_execution_discards_the_plan() {
    let provider = execution_provider()
        .with_worker_response("evaluator", solution_scores(9))
        .with_worker_response("execution_coach", PLAN);
    let store = InMemoryJourneyStore::new();
    let orchestrator = orchestrator(&provider, &store);
    reach_execution(&orchestrator).await;
    let planned = state(&store).await;
    assert_eq!(planned.current_phase, Phase::Execution);
    assert_eq!(planned.total_milestones, 3);
    let solution_id = planned.solution_id.unwrap();

    let reply = orchestrator.respond(USER, None, "go back.").await;
    assert_eq!(reply.phase, Some(Phase::SolutionDesign));
    assert!(reply.reply.starts_with("Okay, let's revisit the solution design."));
    assert!(reply.reply.contains("Solution Approach"));

    let revised = state(&store).await;
    assert!(revised.milestone_ids.is_empty());
    assert_eq!(revised.total_milestones, 0);
    assert_eq!(revised.milestones_completed, 0);
    assert!(revised.current_milestone_id.is_none());
    assert!(revised.execution_started_at.is_none());
    assert!(!revised.solution_approved);
    assert!(revised.context.awaiting_solution);
    assert_eq!(revised.solution_id, Some(solution_id));

    let replanned = orchestrator
        .respond(USER, None, "Solution Approach: daily churn scoring with alerts")
        .await;
    assert_eq!(replanned.phase, Some(Phase::Execution));
    let after = state(&store).await;
    assert_eq!(after.total_milestones, 3);
    assert_ne!(after.milestone_ids, planned.milestone_ids);
    let solution: SolutionDesign = store
        .require(&key(), &solution_id.to_string())
        .await
        .unwrap();
    assert_eq!(solution.version, 2);
    assert_eq!(provider.calls_for("execution_coach"), 2);
}

#[tokio::test]
async fn go_back_during_onboarding_is_an_answer() {
    let provider = MockAIProvider::new();
    let store = InMemoryJourneyStore::new();
    let orchestrator = orchestrator(&provider, &store);
    orchestrator.process_message(USER, None, "hi").await;

    orchestrator.process_message(USER, None, "go back").await;
    let state = state(&store).await;
    assert_eq!(state.current_phase, Phase::Onboarding);
    assert_eq!(state.target_role.as_deref(), Some("go back"));
}

#[tokio::test]
async fn rooms_keep_separate_journeys() {
    let provider = MockAIProvider::new();
    let store = InMemoryJourneyStore::new();
    let orchestrator = orchestrator(&provider, &store);

    orchestrator.process_message(USER, Some("a"), "hi").await;
    orchestrator.process_message(USER, Some("a"), "Data Analyst").await;
    orchestrator.process_message(USER, Some("b"), "hi").await;

    let room_a = journey_key(USER, Some("a")).unwrap();
    let room_b = journey_key(USER, Some("b")).unwrap();
    let a = store.load_state(&room_a).await.unwrap().unwrap();
    let b = store.load_state(&room_b).await.unwrap().unwrap();
    assert_eq!(a.target_role.as_deref(), Some("Data Analyst"));
    assert_eq!(b.target_role, None);
    assert_eq!(store.state_count().await, 2);
}

#[tokio::test]
async fn blank_user_id_gets_apology() {
    let provider = MockAIProvider::new();
    let store = InMemoryJourneyStore::new();
    let orchestrator = orchestrator(&provider, &store);

    let reply = orchestrator.respond("  ", None, "hi").await;
    assert_eq!(reply.reply, APOLOGY);
    assert_eq!(reply.phase, None);
    assert_eq!(store.state_count().await, 0);
}

#[test]
fn blank_room_means_no_room() {
    let key = journey_key("u1", Some(" ")).unwrap();
    assert!(key.room_id.is_none());
    assert!(journey_key("u1", Some("a:b")).is_err());
}

#[test]
fn revision_command_matching() {
    assert!(is_revision("go back"));
    assert!(is_revision("  Go Back! "));
    assert!(!is_revision("please go back to the start"));
}

/// Store whose state writes always fail.
#[derive(Clone, Default)]
struct BrokenStore {
    inner: InMemoryJourneyStore,
}

#[async_trait]
impl JourneyStore for BrokenStore {
    async fn load_state(&self, key: &JourneyKey) -> Result<Option<JourneyState>, StoreError> {
        self.inner.load_state(key).await
    }

    async fn save_state(&self, _state: &JourneyState) -> Result<(), StoreError> {
        Err(StoreError::Storage("disk full".to_string()))
    }

    async fn put_record(
        &self,
        key: &JourneyKey,
        kind: RecordKind,
        id: &str,
        payload: Value,
    ) -> Result<(), StoreError> {
        self.inner.put_record(key, kind, id, payload).await
    }

    async fn get_record(
        &self,
        key: &JourneyKey,
        kind: RecordKind,
        id: &str,
    ) -> Result<Option<Value>, StoreError> {
        self.inner.get_record(key, kind, id).await
    }

    async fn append_event(&self, key: &JourneyKey, event: &JourneyEvent) -> Result<(), StoreError> {
        self.inner.append_event(key, event).await
    }

    async fn events(
        &self,
        key: &JourneyKey,
        kind: Option<EventKind>,
        limit: Option<usize>,
    ) -> Result<Vec<JourneyEvent>, StoreError> {
        self.inner.events(key, kind, limit).await
    }
}

#[tokio::test]
async fn storage_failure_returns_apology_without_events() {
    let provider = MockAIProvider::new();
    let store = BrokenStore::default();
    let orchestrator = Orchestrator::new(
        Oracle::new(Arc::new(provider.clone())),
        Arc::new(store.clone()),
    );

    let reply = orchestrator.process_message(USER, None, "hi").await;
    assert_eq!(reply, APOLOGY);
    assert_eq!(store.inner.state_count().await, 0);
    assert!(store.inner.events(&key(), None, None).await.unwrap().is_empty());
}
