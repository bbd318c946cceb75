//! PostgreSQL implementation of JourneyStore.
//!
//! States, records, and events are stored as JSONB payloads keyed by the
//! rendered journey key. Schema lives in `migrations/0001_journey_store.sql`.

use async_trait::async_trait;
use serde_json::Value;
use sqlx::{PgPool, Row};

use crate::domain::foundation::JourneyKey;
use crate::domain::journey::{EventKind, JourneyEvent, JourneyState};
use crate::domain::portfolio::RecordKind;
use crate::ports::{JourneyStore, StoreError};

/// PostgreSQL implementation of JourneyStore.
#[derive(Clone)]
pub struct PostgresJourneyStore {
    pool: PgPool,
}

impl PostgresJourneyStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn storage_error(action: &str) -> impl FnOnce(sqlx::Error) -> StoreError + '_ {
    move |e| StoreError::Storage(format!("Failed to {}: {}", action, e))
}

#[async_trait]
impl JourneyStore for PostgresJourneyStore {
    async fn load_state(&self, key: &JourneyKey) -> Result<Option<JourneyState>, StoreError> {
        let row = sqlx::query("SELECT state FROM journey_states WHERE journey_key = $1")
            .bind(key.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(storage_error("fetch journey state"))?;

        match row {
            Some(row) => {
                let state: Value = row
                    .try_get("state")
                    .map_err(storage_error("read journey state"))?;
                Ok(Some(serde_json::from_value(state)?))
            }
            None => Ok(None),
        }
    }

    async fn save_state(&self, state: &JourneyState) -> Result<(), StoreError> {
        let payload = serde_json::to_value(state)?;

        sqlx::query(
            r#"
            INSERT INTO journey_states (journey_key, current_phase, state, updated_at)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (journey_key) DO UPDATE SET
                current_phase = EXCLUDED.current_phase,
                state = EXCLUDED.state,
                updated_at = EXCLUDED.updated_at
            "#,
        )
        .bind(state.key.to_string())
        .bind(state.current_phase.as_str())
        .bind(payload)
        .bind(state.last_activity_at.as_datetime())
        .execute(&self.pool)
        .await
        .map_err(storage_error("save journey state"))?;

        Ok(())
    }

    async fn put_record(
        &self,
        key: &JourneyKey,
        kind: RecordKind,
        id: &str,
        payload: Value,
    ) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO journey_records (journey_key, kind, record_id, payload, updated_at)
            VALUES ($1, $2, $3, $4, NOW())
            ON CONFLICT (journey_key, kind, record_id) DO UPDATE SET
                payload = EXCLUDED.payload,
                updated_at = EXCLUDED.updated_at
            "#,
        )
        .bind(key.to_string())
        .bind(kind.as_str())
        .bind(id)
        .bind(payload)
        .execute(&self.pool)
        .await
        .map_err(storage_error("save journey record"))?;

        Ok(())
    }

    async fn get_record(
        &self,
        key: &JourneyKey,
        kind: RecordKind,
        id: &str,
    ) -> Result<Option<Value>, StoreError> {
        let row = sqlx::query(
            "SELECT payload FROM journey_records WHERE journey_key = $1 AND kind = $2 AND record_id = $3",
        )
        .bind(key.to_string())
        .bind(kind.as_str())
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(storage_error("fetch journey record"))?;

        row.map(|r| r.try_get::<Value, _>("payload"))
            .transpose()
            .map_err(storage_error("read journey record"))
    }

    async fn append_event(&self, key: &JourneyKey, event: &JourneyEvent) -> Result<(), StoreError> {
        sqlx::query("INSERT INTO journey_events (journey_key, kind, payload) VALUES ($1, $2, $3)")
            .bind(key.to_string())
            .bind(event.kind().as_str())
            .bind(serde_json::to_value(event)?)
            .execute(&self.pool)
            .await
            .map_err(storage_error("append journey event"))?;

        Ok(())
    }

    async fn events(
        &self,
        key: &JourneyKey,
        kind: Option<EventKind>,
        limit: Option<usize>,
    ) -> Result<Vec<JourneyEvent>, StoreError> {
        // Newest first so LIMIT keeps the most recent, then flipped back.
        let rows = sqlx::query(
            r#"
            SELECT payload FROM journey_events
            WHERE journey_key = $1 AND ($2::TEXT IS NULL OR kind = $2)
            ORDER BY id DESC
            LIMIT $3
            "#,
        )
        .bind(key.to_string())
        .bind(kind.map(|k| k.as_str()))
        .bind(limit.map(|n| n as i64))
        .fetch_all(&self.pool)
        .await
        .map_err(storage_error("fetch journey events"))?;

        let mut events = rows
            .into_iter()
            .map(|row| {
                let payload: Value = row
                    .try_get("payload")
                    .map_err(storage_error("read journey event"))?;
                Ok(serde_json::from_value(payload)?)
            })
            .collect::<Result<Vec<JourneyEvent>, StoreError>>()?;
        events.reverse();
        Ok(events)
    }
}
