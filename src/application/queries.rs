//! Read-only queries over stored journeys.
//!
//! Used by the HTTP surface for state, project, and history lookups. None of
//! these touch the oracle or mutate the store.

use std::sync::Arc;

use crate::domain::foundation::JourneyKey;
use crate::domain::journey::{ConversationTurn, EventKind, JourneyEvent, JourneyState};
use crate::domain::portfolio::Project;
use crate::ports::{JourneyStore, JourneyStoreExt, StoreError};

/// Default number of turns returned by [`JourneyQueries::get_conversation`].
pub const DEFAULT_HISTORY_LIMIT: usize = 50;

#[derive(Clone)]
pub struct JourneyQueries {
    store: Arc<dyn JourneyStore>,
}

impl JourneyQueries {
    pub fn new(store: Arc<dyn JourneyStore>) -> Self {
        Self { store }
    }

    pub async fn get_state(&self, key: &JourneyKey) -> Result<Option<JourneyState>, StoreError> {
        self.store.load_state(key).await
    }

    /// The project the journey currently points at, approved or not.
    pub async fn get_project(&self, key: &JourneyKey) -> Result<Option<Project>, StoreError> {
        let Some(state) = self.store.load_state(key).await? else {
            return Ok(None);
        };
        match state.project_id {
            Some(id) => self.store.load::<Project>(key, &id.to_string()).await,
            None => Ok(None),
        }
    }

    /// Most recent conversation turns, oldest first.
    pub async fn get_conversation(
        &self,
        key: &JourneyKey,
        limit: usize,
    ) -> Result<Vec<ConversationTurn>, StoreError> {
        let events = self
            .store
            .events(key, Some(EventKind::Conversation), Some(limit))
            .await?;
        Ok(events
            .into_iter()
            .filter_map(|event| match event {
                JourneyEvent::Conversation(turn) => Some(turn),
                _ => None,
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::storage::InMemoryJourneyStore;
    use crate::domain::foundation::UserId;
    use crate::domain::journey::{Phase, TurnRole};
    use crate::domain::portfolio::fixtures::test_proposal;

    fn key() -> JourneyKey {
        JourneyKey::for_user(UserId::new("learner").unwrap())
    }

    #[tokio::test]
    async fn unknown_journey_has_no_state_or_project() {
        let queries = JourneyQueries::new(Arc::new(InMemoryJourneyStore::new()));
        assert!(queries.get_state(&key()).await.unwrap().is_none());
        assert!(queries.get_project(&key()).await.unwrap().is_none());
        assert!(queries.get_conversation(&key(), 10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn project_follows_state_pointer() {
        let store = InMemoryJourneyStore::new();
        let project = Project::propose(test_proposal("Churn Radar"));
        store.save(&key(), &project).await.unwrap();

        let mut state = JourneyState::new(key());
        store.save_state(&state).await.unwrap();
        let queries = JourneyQueries::new(Arc::new(store.clone()));
        assert!(queries.get_project(&key()).await.unwrap().is_none());

        state.project_id = Some(project.id);
        store.save_state(&state).await.unwrap();
        let found = queries.get_project(&key()).await.unwrap().unwrap();
        assert_eq!(found.title(), "Churn Radar");
    }

    #[tokio::test]
    async fn conversation_is_limited_to_latest_turns() {
        let store = InMemoryJourneyStore::new();
        for i in 0..4 {
            store
                .append_event(
                    &key(),
                    &JourneyEvent::Conversation(ConversationTurn::user(
                        format!("m{}", i),
                        Phase::Onboarding,
                    )),
                )
                .await
                .unwrap();
        }
        let queries = JourneyQueries::new(Arc::new(store));

        let turns = queries.get_conversation(&key(), 3).await.unwrap();
        assert_eq!(turns.len(), 3);
        assert_eq!(turns[0].content, "m1");
        assert_eq!(turns[2].role, TurnRole::User);
    }
}
