//! SQLite thread metadata repository.
//!
//! Implements `MetadataRepository` from `chatloom-core`. Rows are keyed by
//! `(user_id, thread_id)`; dates are RFC 3339 strings.

use chatloom_core::metadata::repository::MetadataRepository;
use chatloom_types::chat::{ChatMode, ThreadId, ThreadMetadata};
use chatloom_types::error::RepositoryError;
use chrono::{DateTime, Utc};
use sqlx::Row;
use uuid::Uuid;

use super::pool::DatabasePool;
use super::{format_datetime, parse_datetime};

/// SQLite-backed implementation of `MetadataRepository`.
pub struct SqliteMetadataRepository {
    pool: DatabasePool,
}

impl SqliteMetadataRepository {
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }
}

struct ThreadMetadataRow {
    user_id: String,
    thread_id: String,
    chat_mode: String,
    created_date: String,
    update_date: String,
}

impl ThreadMetadataRow {
    fn from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            user_id: row.try_get("user_id")?,
            thread_id: row.try_get("thread_id")?,
            chat_mode: row.try_get("chat_mode")?,
            created_date: row.try_get("created_date")?,
            update_date: row.try_get("update_date")?,
        })
    }

    fn into_metadata(self) -> Result<ThreadMetadata, RepositoryError> {
        let thread_id = Uuid::parse_str(&self.thread_id)
            .map_err(|e| RepositoryError::Query(format!("invalid thread_id: {e}")))?;
        let chat_mode: ChatMode = self
            .chat_mode
            .parse()
            .map_err(|e: String| RepositoryError::Query(e))?;

        Ok(ThreadMetadata {
            user_id: self.user_id,
            thread_id,
            chat_mode,
            created_date: parse_datetime(&self.created_date)?,
            update_date: parse_datetime(&self.update_date)?,
        })
    }
}

impl MetadataRepository for SqliteMetadataRepository {
    async fn get(
        &self,
        user_id: &str,
        thread_id: &ThreadId,
    ) -> Result<Option<ThreadMetadata>, RepositoryError> {
        let row = sqlx::query("SELECT * FROM thread_metadata WHERE user_id = ? AND thread_id = ?")
            .bind(user_id)
            .bind(thread_id.to_string())
            .fetch_optional(&self.pool.reader)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        match row {
            Some(row) => {
                let metadata_row = ThreadMetadataRow::from_row(&row)
                    .map_err(|e| RepositoryError::Query(e.to_string()))?;
                Ok(Some(metadata_row.into_metadata()?))
            }
            None => Ok(None),
        }
    }

    async fn put(&self, record: &ThreadMetadata) -> Result<(), RepositoryError> {
        sqlx::query(
            r#"INSERT INTO thread_metadata (user_id, thread_id, chat_mode, created_date, update_date)
               VALUES (?, ?, ?, ?, ?)
               ON CONFLICT(user_id, thread_id) DO UPDATE SET
                   chat_mode = excluded.chat_mode,
                   created_date = excluded.created_date,
                   update_date = excluded.update_date"#,
        )
        .bind(&record.user_id)
        .bind(record.thread_id.to_string())
        .bind(record.chat_mode.tag())
        .bind(format_datetime(&record.created_date))
        .bind(format_datetime(&record.update_date))
        .execute(&self.pool.writer)
        .await
        .map_err(|e| RepositoryError::Query(e.to_string()))?;

        Ok(())
    }

    async fn touch(
        &self,
        user_id: &str,
        thread_id: &ThreadId,
        update_date: DateTime<Utc>,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            "UPDATE thread_metadata SET update_date = ? WHERE user_id = ? AND thread_id = ?",
        )
        .bind(format_datetime(&update_date))
        .bind(user_id)
        .bind(thread_id.to_string())
        .execute(&self.pool.writer)
        .await
        .map_err(|e| RepositoryError::Query(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }

    async fn query_user(&self, user_id: &str) -> Result<Vec<ThreadMetadata>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT * FROM thread_metadata WHERE user_id = ? ORDER BY update_date DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool.reader)
        .await
        .map_err(|e| RepositoryError::Query(e.to_string()))?;

        let mut records = Vec::with_capacity(rows.len());
        for row in &rows {
            let metadata_row = ThreadMetadataRow::from_row(row)
                .map_err(|e| RepositoryError::Query(e.to_string()))?;
            records.push(metadata_row.into_metadata()?);
        }

        Ok(records)
    }

    async fn delete(&self, user_id: &str, thread_id: &ThreadId) -> Result<(), RepositoryError> {
        sqlx::query("DELETE FROM thread_metadata WHERE user_id = ? AND thread_id = ?")
            .bind(user_id)
            .bind(thread_id.to_string())
            .execute(&self.pool.writer)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        Ok(())
    }
}
