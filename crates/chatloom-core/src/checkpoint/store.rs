//! CheckpointStore trait definition.
//!
//! A checkpoint is a serialized snapshot of a thread's conversation state,
//! written once per turn. Snapshots for a thread are append-only: the latest
//! one is the resume point, earlier ones form the thread's state history.

use chatloom_types::chat::{Checkpoint, ThreadId};
use chatloom_types::error::RepositoryError;

/// Trait for per-thread checkpoint persistence.
///
/// Uses native async fn in traits (RPITIT, Rust 2024 edition).
/// Implementations live in chatloom-infra.
pub trait CheckpointStore: Send + Sync {
    /// Persist a new snapshot. `(thread_id, step)` must not already exist.
    fn save(
        &self,
        checkpoint: &Checkpoint,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    /// Latest snapshot for a thread, or `None` if the thread has none.
    fn load(
        &self,
        thread_id: &ThreadId,
    ) -> impl std::future::Future<Output = Result<Option<Checkpoint>, RepositoryError>> + Send;

    /// Every snapshot for a thread, ordered by step ASC.
    fn list(
        &self,
        thread_id: &ThreadId,
    ) -> impl std::future::Future<Output = Result<Vec<Checkpoint>, RepositoryError>> + Send;

    /// Remove all snapshots for a thread. No-op if there are none.
    fn delete_thread(
        &self,
        thread_id: &ThreadId,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;
}
