//! Runtime selection of the checkpoint backend.
//!
//! `checkpoint_backend` in `config.toml` picks the store at startup, while the
//! session manager is generic over one concrete `CheckpointStore`. This enum
//! implements the trait by delegating to whichever store was configured.

use chatloom_core::checkpoint::store::CheckpointStore;
use chatloom_types::chat::{Checkpoint, ThreadId};
use chatloom_types::config::CheckpointBackend;
use chatloom_types::error::RepositoryError;

use crate::memory::InMemoryCheckpointStore;
use crate::sqlite::checkpoint::SqliteCheckpointStore;
use crate::sqlite::pool::DatabasePool;

/// The configured checkpoint store.
pub enum ConfiguredCheckpointStore {
    Sqlite(SqliteCheckpointStore),
    Memory(InMemoryCheckpointStore),
}

impl ConfiguredCheckpointStore {
    /// Open the store named by `backend`. The SQLite store shares `pool` with
    /// the metadata repository.
    pub fn open(backend: CheckpointBackend, pool: DatabasePool) -> Self {
        match backend {
            CheckpointBackend::Sqlite => Self::Sqlite(SqliteCheckpointStore::new(pool)),
            CheckpointBackend::Memory => Self::Memory(InMemoryCheckpointStore::new()),
        }
    }

    pub fn backend(&self) -> CheckpointBackend {
        match self {
            Self::Sqlite(_) => CheckpointBackend::Sqlite,
            Self::Memory(_) => CheckpointBackend::Memory,
        }
    }
}

impl CheckpointStore for ConfiguredCheckpointStore {
    async fn save(&self, checkpoint: &Checkpoint) -> Result<(), RepositoryError> {
        match self {
            Self::Sqlite(store) => store.save(checkpoint).await,
            Self::Memory(store) => store.save(checkpoint).await,
        }
    }

    async fn load(&self, thread_id: &ThreadId) -> Result<Option<Checkpoint>, RepositoryError> {
        match self {
            Self::Sqlite(store) => store.load(thread_id).await,
            Self::Memory(store) => store.load(thread_id).await,
        }
    }

    async fn list(&self, thread_id: &ThreadId) -> Result<Vec<Checkpoint>, RepositoryError> {
        match self {
            Self::Sqlite(store) => store.list(thread_id).await,
            Self::Memory(store) => store.list(thread_id).await,
        }
    }

    async fn delete_thread(&self, thread_id: &ThreadId) -> Result<(), RepositoryError> {
        match self {
            Self::Sqlite(store) => store.delete_thread(thread_id).await,
            Self::Memory(store) => store.delete_thread(thread_id).await,
        }
    }
}
