//! Working copy of one journey for the duration of a single message.
//!
//! Handlers mutate `state` and stage records and events here. Nothing reaches
//! the store until [`Turn::flush`], so a failed pass leaves durable state as
//! it was.

use serde_json::Value;

use super::OrchestratorError;
use crate::domain::foundation::JourneyKey;
use crate::domain::journey::{JourneyEvent, JourneyState};
use crate::domain::portfolio::{JourneyRecord, RecordKind};
use crate::ports::{JourneyStore, JourneyStoreExt};

pub(crate) struct Turn {
    pub state: JourneyState,
    records: Vec<(RecordKind, String, Value)>,
    events: Vec<JourneyEvent>,
}

impl Turn {
    pub fn new(state: JourneyState) -> Self {
        Self {
            state,
            records: Vec::new(),
            events: Vec::new(),
        }
    }

    pub fn key(&self) -> &JourneyKey {
        &self.state.key
    }

    /// Stages a record write, replacing any earlier write of the same record.
    pub fn stage<R: JourneyRecord>(&mut self, record: &R) -> Result<(), OrchestratorError> {
        let id = record.record_id();
        let payload = serde_json::to_value(record)
            .map_err(|e| OrchestratorError::Serialization(e.to_string()))?;
        match self
            .records
            .iter_mut()
            .find(|(kind, staged_id, _)| *kind == R::KIND && *staged_id == id)
        {
            Some(entry) => entry.2 = payload,
            None => self.records.push((R::KIND, id, payload)),
        }
        Ok(())
    }

    pub fn log(&mut self, event: JourneyEvent) {
        self.events.push(event);
    }

    /// Reads a record, preferring this turn's staged copy over the store.
    pub async fn load<R: JourneyRecord>(
        &self,
        store: &dyn JourneyStore,
        id: &str,
    ) -> Result<R, OrchestratorError> {
        if let Some((_, _, payload)) = self
            .records
            .iter()
            .find(|(kind, staged_id, _)| *kind == R::KIND && staged_id == id)
        {
            return serde_json::from_value(payload.clone())
                .map_err(|e| OrchestratorError::Serialization(e.to_string()));
        }
        Ok(store.require::<R>(self.key(), id).await?)
    }

    /// Writes records, then state, then events.
    pub async fn flush(self, store: &dyn JourneyStore) -> Result<JourneyState, OrchestratorError> {
        let Turn {
            mut state,
            records,
            events,
        } = self;

        for (kind, id, payload) in records {
            store.put_record(&state.key, kind, &id, payload).await?;
        }
        state.touch();
        store.save_state(&state).await?;
        for event in &events {
            store.append_event(&state.key, event).await?;
        }
        Ok(state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::storage::InMemoryJourneyStore;
    use crate::domain::foundation::UserId;
    use crate::domain::journey::{EventKind, Phase, TransitionRecord};
    use crate::domain::portfolio::{fixtures::test_proposal, Project};

    fn turn() -> Turn {
        Turn::new(JourneyState::new(JourneyKey::for_user(
            UserId::new("learner").unwrap(),
        )))
    }

    #[tokio::test]
    async fn staged_records_are_visible_before_flush() {
        let store = InMemoryJourneyStore::new();
        let mut turn = turn();
        let project = Project::propose(test_proposal("Churn Radar"));
        turn.stage(&project).unwrap();

        let loaded: Project = turn.load(&store, &project.id.to_string()).await.unwrap();
        assert_eq!(loaded, project);
        assert_eq!(store.record_count(RecordKind::Project).await, 0);
    }

    #[tokio::test]
    async fn restaging_replaces_the_pending_write() {
        let store = InMemoryJourneyStore::new();
        let mut turn = turn();
        let mut project = Project::propose(test_proposal("Churn Radar"));
        turn.stage(&project).unwrap();
        project.approve().unwrap();
        turn.stage(&project).unwrap();
        turn.flush(&store).await.unwrap();

        assert_eq!(store.record_count(RecordKind::Project).await, 1);
    }

    #[tokio::test]
    async fn flush_persists_state_and_events() {
        let store = InMemoryJourneyStore::new();
        let mut turn = turn();
        let key = turn.key().clone();
        turn.state.target_role = Some("Analyst".to_string());
        turn.log(JourneyEvent::Transition(TransitionRecord::new(
            Phase::Onboarding,
            Phase::ProjectGeneration,
            "test",
        )));
        turn.flush(&store).await.unwrap();

        let state = store.load_state(&key).await.unwrap().unwrap();
        assert_eq!(state.target_role.as_deref(), Some("Analyst"));
        let events = store.events(&key, Some(EventKind::Transition), None).await.unwrap();
        assert_eq!(events.len(), 1);
    }

    #[tokio::test]
    async fn missing_record_is_an_error() {
        let store = InMemoryJourneyStore::new();
        let result = turn().load::<Project>(&store, "nope").await;
        assert!(matches!(result, Err(OrchestratorError::Store(_))));
    }
}
