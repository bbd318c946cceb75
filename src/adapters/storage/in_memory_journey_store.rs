//! In-Memory Journey Store Adapter
//!
//! Keeps states, records, and event logs in process memory.
//! Used by tests and when no database is configured.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::foundation::JourneyKey;
use crate::domain::journey::{EventKind, JourneyEvent, JourneyState};
use crate::domain::portfolio::RecordKind;
use crate::ports::{JourneyStore, StoreError};

type RecordKey = (JourneyKey, RecordKind, String);

#[derive(Debug, Clone, Default)]
pub struct InMemoryJourneyStore {
    states: Arc<RwLock<HashMap<JourneyKey, JourneyState>>>,
    records: Arc<RwLock<HashMap<RecordKey, Value>>>,
    events: Arc<RwLock<HashMap<JourneyKey, Vec<JourneyEvent>>>>,
}

impl InMemoryJourneyStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored durable states
    pub async fn state_count(&self) -> usize {
        self.states.read().await.len()
    }

    /// Number of stored records of one kind across all journeys
    pub async fn record_count(&self, kind: RecordKind) -> usize {
        self.records
            .read()
            .await
            .keys()
            .filter(|(_, k, _)| *k == kind)
            .count()
    }
}

#[async_trait]
impl JourneyStore for InMemoryJourneyStore {
    async fn load_state(&self, key: &JourneyKey) -> Result<Option<JourneyState>, StoreError> {
        Ok(self.states.read().await.get(key).cloned())
    }

    async fn save_state(&self, state: &JourneyState) -> Result<(), StoreError> {
        self.states
            .write()
            .await
            .insert(state.key.clone(), state.clone());
        Ok(())
    }

    async fn put_record(
        &self,
        key: &JourneyKey,
        kind: RecordKind,
        id: &str,
        payload: Value,
    ) -> Result<(), StoreError> {
        self.records
            .write()
            .await
            .insert((key.clone(), kind, id.to_string()), payload);
        Ok(())
    }

    async fn get_record(
        &self,
        key: &JourneyKey,
        kind: RecordKind,
        id: &str,
    ) -> Result<Option<Value>, StoreError> {
        Ok(self
            .records
            .read()
            .await
            .get(&(key.clone(), kind, id.to_string()))
            .cloned())
    }

    async fn append_event(&self, key: &JourneyKey, event: &JourneyEvent) -> Result<(), StoreError> {
        self.events
            .write()
            .await
            .entry(key.clone())
            .or_default()
            .push(event.clone());
        Ok(())
    }

    async fn events(
        &self,
        key: &JourneyKey,
        kind: Option<EventKind>,
        limit: Option<usize>,
    ) -> Result<Vec<JourneyEvent>, StoreError> {
        let events = self.events.read().await;
        let matching: Vec<JourneyEvent> = events
            .get(key)
            .map(|log| {
                log.iter()
                    .filter(|e| kind.map_or(true, |k| e.kind() == k))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();
        let skip = limit.map_or(0, |n| matching.len().saturating_sub(n));
        Ok(matching.into_iter().skip(skip).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::UserId;
    use crate::domain::journey::{ConversationTurn, Phase, TransitionRecord};
    use crate::domain::portfolio::{fixtures::test_proposal, Project};
    use crate::ports::JourneyStoreExt;

    fn test_key() -> JourneyKey {
        JourneyKey::for_user(UserId::new("learner").unwrap())
    }

    #[tokio::test]
    async fn load_state_returns_none_for_unknown_key() {
        let store = InMemoryJourneyStore::new();
        assert!(store.load_state(&test_key()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn save_then_load_state() {
        let store = InMemoryJourneyStore::new();
        let mut state = JourneyState::new(test_key());
        state.target_role = Some("Data Analyst".to_string());
        store.save_state(&state).await.unwrap();

        let loaded = store.load_state(&test_key()).await.unwrap().unwrap();
        assert_eq!(loaded, state);
        assert_eq!(store.state_count().await, 1);
    }

    #[tokio::test]
    async fn typed_records_round_trip() {
        let store = InMemoryJourneyStore::new();
        let project = Project::propose(test_proposal("Churn Radar"));
        store.save(&test_key(), &project).await.unwrap();

        let loaded: Project = store
            .require(&test_key(), &project.id.to_string())
            .await
            .unwrap();
        assert_eq!(loaded, project);
        assert_eq!(store.record_count(RecordKind::Project).await, 1);
    }

    #[tokio::test]
    async fn require_reports_missing_record() {
        let store = InMemoryJourneyStore::new();
        let result = store.require::<Project>(&test_key(), "nope").await;
        assert!(matches!(result, Err(StoreError::NotFound { .. })));
    }

    #[tokio::test]
    async fn records_are_scoped_by_journey_key() {
        let store = InMemoryJourneyStore::new();
        let project = Project::propose(test_proposal("Churn Radar"));
        store.save(&test_key(), &project).await.unwrap();

        let other = JourneyKey::for_user(UserId::new("someone-else").unwrap());
        let loaded = store
            .load::<Project>(&other, &project.id.to_string())
            .await
            .unwrap();
        assert!(loaded.is_none());
    }

    #[tokio::test]
    async fn events_filter_by_kind_and_keep_most_recent() {
        let store = InMemoryJourneyStore::new();
        let key = test_key();
        for i in 0..3 {
            store
                .append_event(
                    &key,
                    &JourneyEvent::Conversation(ConversationTurn::user(
                        format!("msg {}", i),
                        Phase::Onboarding,
                    )),
                )
                .await
                .unwrap();
        }
        store
            .append_event(
                &key,
                &JourneyEvent::Transition(TransitionRecord::new(
                    Phase::Onboarding,
                    Phase::ProjectGeneration,
                    "Onboarding completed",
                )),
            )
            .await
            .unwrap();

        let turns = store
            .events(&key, Some(EventKind::Conversation), Some(2))
            .await
            .unwrap();
        assert_eq!(turns.len(), 2);
        match &turns[0] {
            JourneyEvent::Conversation(turn) => assert_eq!(turn.content, "msg 1"),
            other => panic!("unexpected event {:?}", other),
        }

        let all = store.events(&key, None, None).await.unwrap();
        assert_eq!(all.len(), 4);
    }
}
