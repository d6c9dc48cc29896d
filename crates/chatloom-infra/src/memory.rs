//! Process-local stores backed by `DashMap`.
//!
//! Used when `checkpoint_backend = "memory"` and in tests. Contents are lost
//! when the process exits.

use chatloom_core::checkpoint::store::CheckpointStore;
use chatloom_core::metadata::repository::MetadataRepository;
use chatloom_types::chat::{Checkpoint, ThreadId, ThreadMetadata};
use chatloom_types::error::RepositoryError;
use chrono::{DateTime, Utc};
use dashmap::DashMap;

/// In-memory `CheckpointStore`. Snapshots per thread are kept in step order.
#[derive(Default)]
pub struct InMemoryCheckpointStore {
    threads: DashMap<ThreadId, Vec<Checkpoint>>,
}

impl InMemoryCheckpointStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CheckpointStore for InMemoryCheckpointStore {
    async fn save(&self, checkpoint: &Checkpoint) -> Result<(), RepositoryError> {
        let mut history = self.threads.entry(checkpoint.thread_id).or_default();
        match history.binary_search_by_key(&checkpoint.step, |c| c.step) {
            Ok(_) => Err(RepositoryError::Conflict(format!(
                "checkpoint {} step {} already exists",
                checkpoint.thread_id, checkpoint.step
            ))),
            Err(pos) => {
                history.insert(pos, checkpoint.clone());
                Ok(())
            }
        }
    }

    async fn load(&self, thread_id: &ThreadId) -> Result<Option<Checkpoint>, RepositoryError> {
        Ok(self
            .threads
            .get(thread_id)
            .and_then(|history| history.last().cloned()))
    }

    async fn list(&self, thread_id: &ThreadId) -> Result<Vec<Checkpoint>, RepositoryError> {
        Ok(self
            .threads
            .get(thread_id)
            .map(|history| history.clone())
            .unwrap_or_default())
    }

    async fn delete_thread(&self, thread_id: &ThreadId) -> Result<(), RepositoryError> {
        self.threads.remove(thread_id);
        Ok(())
    }
}

/// In-memory `MetadataRepository` keyed by `(user_id, thread_id)`.
#[derive(Default)]
pub struct InMemoryMetadataRepository {
    records: DashMap<(String, ThreadId), ThreadMetadata>,
}

impl InMemoryMetadataRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

impl MetadataRepository for InMemoryMetadataRepository {
    async fn get(
        &self,
        user_id: &str,
        thread_id: &ThreadId,
    ) -> Result<Option<ThreadMetadata>, RepositoryError> {
        Ok(self
            .records
            .get(&(user_id.to_string(), *thread_id))
            .map(|record| record.clone()))
    }

    async fn put(&self, record: &ThreadMetadata) -> Result<(), RepositoryError> {
        self.records
            .insert((record.user_id.clone(), record.thread_id), record.clone());
        Ok(())
    }

    async fn touch(
        &self,
        user_id: &str,
        thread_id: &ThreadId,
        update_date: DateTime<Utc>,
    ) -> Result<(), RepositoryError> {
        let mut record = self
            .records
            .get_mut(&(user_id.to_string(), *thread_id))
            .ok_or(RepositoryError::NotFound)?;
        record.update_date = update_date;
        Ok(())
    }

    async fn query_user(&self, user_id: &str) -> Result<Vec<ThreadMetadata>, RepositoryError> {
        Ok(self
            .records
            .iter()
            .filter(|entry| entry.key().0 == user_id)
            .map(|entry| entry.value().clone())
            .collect())
    }

    async fn delete(&self, user_id: &str, thread_id: &ThreadId) -> Result<(), RepositoryError> {
        self.records.remove(&(user_id.to_string(), *thread_id));
        Ok(())
    }
}
