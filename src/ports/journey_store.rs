//! Journey Store Port - keyed persistence for durable state and records.
//!
//! One durable state per journey key, one row per portfolio record keyed by
//! `(journey key, kind, id)`, and an append-only event log for transitions,
//! conversation turns, and progress updates. Writes are independent; there is
//! no transaction spanning them.

use async_trait::async_trait;
use serde_json::Value;

use crate::domain::foundation::JourneyKey;
use crate::domain::journey::{EventKind, JourneyEvent, JourneyState};
use crate::domain::portfolio::{JourneyRecord, RecordKind};

/// Errors that can occur during journey store operations
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("{kind} {id} not found for journey {journey}")]
    NotFound {
        journey: String,
        kind: RecordKind,
        id: String,
    },

    #[error("Failed to serialize record: {0}")]
    Serialization(String),

    #[error("Storage error: {0}")]
    Storage(String),
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::Serialization(err.to_string())
    }
}

/// Port for persisting journeys
#[async_trait]
pub trait JourneyStore: Send + Sync {
    /// Load the durable state, `None` for a journey never seen before.
    async fn load_state(&self, key: &JourneyKey) -> Result<Option<JourneyState>, StoreError>;

    /// Insert or replace the durable state.
    async fn save_state(&self, state: &JourneyState) -> Result<(), StoreError>;

    /// Insert or replace one record's JSON payload.
    async fn put_record(
        &self,
        key: &JourneyKey,
        kind: RecordKind,
        id: &str,
        payload: Value,
    ) -> Result<(), StoreError>;

    async fn get_record(
        &self,
        key: &JourneyKey,
        kind: RecordKind,
        id: &str,
    ) -> Result<Option<Value>, StoreError>;

    /// Append to the event log. Existing entries are never rewritten.
    async fn append_event(&self, key: &JourneyKey, event: &JourneyEvent) -> Result<(), StoreError>;

    /// Events in append order, optionally filtered by kind and limited to the
    /// most recent `limit`.
    async fn events(
        &self,
        key: &JourneyKey,
        kind: Option<EventKind>,
        limit: Option<usize>,
    ) -> Result<Vec<JourneyEvent>, StoreError>;
}

/// Typed helpers over [`JourneyStore`] for any [`JourneyRecord`].
#[async_trait]
pub trait JourneyStoreExt: JourneyStore {
    async fn save<R: JourneyRecord>(&self, key: &JourneyKey, record: &R) -> Result<(), StoreError> {
        let payload = serde_json::to_value(record)?;
        self.put_record(key, R::KIND, &record.record_id(), payload).await
    }

    async fn load<R: JourneyRecord>(
        &self,
        key: &JourneyKey,
        id: &str,
    ) -> Result<Option<R>, StoreError> {
        match self.get_record(key, R::KIND, id).await? {
            Some(value) => Ok(Some(serde_json::from_value(value)?)),
            None => Ok(None),
        }
    }

    /// Like [`load`](Self::load) but a missing record is an error.
    async fn require<R: JourneyRecord>(&self, key: &JourneyKey, id: &str) -> Result<R, StoreError> {
        self.load(key, id).await?.ok_or_else(|| StoreError::NotFound {
            journey: key.to_string(),
            kind: R::KIND,
            id: id.to_string(),
        })
    }
}

impl<S: JourneyStore + ?Sized> JourneyStoreExt for S {}
