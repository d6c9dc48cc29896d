//! SQLite checkpoint store.
//!
//! Implements `CheckpointStore` from `chatloom-core`. Each turn inserts one
//! row keyed by `(thread_id, step)`; the conversation state is stored as a
//! JSON document.

use chatloom_core::checkpoint::store::CheckpointStore;
use chatloom_types::chat::{Checkpoint, ConversationState, ThreadId};
use chatloom_types::error::RepositoryError;
use sqlx::Row;
use uuid::Uuid;

use super::pool::DatabasePool;
use super::{format_datetime, parse_datetime};

/// SQLite-backed implementation of `CheckpointStore`.
pub struct SqliteCheckpointStore {
    pool: DatabasePool,
}

impl SqliteCheckpointStore {
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }
}

struct CheckpointRow {
    thread_id: String,
    step: i64,
    state: String,
    created_at: String,
}

impl CheckpointRow {
    fn from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            thread_id: row.try_get("thread_id")?,
            step: row.try_get("step")?,
            state: row.try_get("state")?,
            created_at: row.try_get("created_at")?,
        })
    }

    fn into_checkpoint(self) -> Result<Checkpoint, RepositoryError> {
        let thread_id = Uuid::parse_str(&self.thread_id)
            .map_err(|e| RepositoryError::Query(format!("invalid thread_id: {e}")))?;
        let state: ConversationState = serde_json::from_str(&self.state)
            .map_err(|e| RepositoryError::Query(format!("invalid checkpoint state: {e}")))?;

        Ok(Checkpoint {
            thread_id,
            step: self.step as u32,
            state,
            created_at: parse_datetime(&self.created_at)?,
        })
    }
}

fn rows_to_checkpoints(rows: &[sqlx::sqlite::SqliteRow]) -> Result<Vec<Checkpoint>, RepositoryError> {
    let mut checkpoints = Vec::with_capacity(rows.len());
    for row in rows {
        let checkpoint_row =
            CheckpointRow::from_row(row).map_err(|e| RepositoryError::Query(e.to_string()))?;
        checkpoints.push(checkpoint_row.into_checkpoint()?);
    }
    Ok(checkpoints)
}

impl CheckpointStore for SqliteCheckpointStore {
    async fn save(&self, checkpoint: &Checkpoint) -> Result<(), RepositoryError> {
        let state = serde_json::to_string(&checkpoint.state)
            .map_err(|e| RepositoryError::Query(format!("failed to serialize state: {e}")))?;

        sqlx::query(
            "INSERT INTO checkpoints (thread_id, step, state, created_at) VALUES (?, ?, ?, ?)",
        )
        .bind(checkpoint.thread_id.to_string())
        .bind(checkpoint.step as i64)
        .bind(state)
        .bind(format_datetime(&checkpoint.created_at))
        .execute(&self.pool.writer)
        .await
        .map_err(|e| match e.as_database_error() {
            Some(db) if db.is_unique_violation() => RepositoryError::Conflict(format!(
                "checkpoint {} step {} already exists",
                checkpoint.thread_id, checkpoint.step
            )),
            _ => RepositoryError::Query(e.to_string()),
        })?;

        Ok(())
    }

    async fn load(&self, thread_id: &ThreadId) -> Result<Option<Checkpoint>, RepositoryError> {
        let row = sqlx::query(
            "SELECT * FROM checkpoints WHERE thread_id = ? ORDER BY step DESC LIMIT 1",
        )
        .bind(thread_id.to_string())
        .fetch_optional(&self.pool.reader)
        .await
        .map_err(|e| RepositoryError::Query(e.to_string()))?;

        match row {
            Some(row) => {
                let checkpoint_row = CheckpointRow::from_row(&row)
                    .map_err(|e| RepositoryError::Query(e.to_string()))?;
                Ok(Some(checkpoint_row.into_checkpoint()?))
            }
            None => Ok(None),
        }
    }

    async fn list(&self, thread_id: &ThreadId) -> Result<Vec<Checkpoint>, RepositoryError> {
        let rows = sqlx::query("SELECT * FROM checkpoints WHERE thread_id = ? ORDER BY step ASC")
            .bind(thread_id.to_string())
            .fetch_all(&self.pool.reader)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        rows_to_checkpoints(&rows)
    }

    async fn delete_thread(&self, thread_id: &ThreadId) -> Result<(), RepositoryError> {
        sqlx::query("DELETE FROM checkpoints WHERE thread_id = ?")
            .bind(thread_id.to_string())
            .execute(&self.pool.writer)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        Ok(())
    }
}
