//! MetadataRepository trait definition.

use chatloom_types::chat::{ThreadId, ThreadMetadata};
use chatloom_types::error::RepositoryError;
use chrono::{DateTime, Utc};

/// Repository trait for thread metadata records keyed by `(user_id, thread_id)`.
///
/// Implementations live in chatloom-infra (e.g., `SqliteMetadataRepository`).
pub trait MetadataRepository: Send + Sync {
    /// Fetch one record.
    fn get(
        &self,
        user_id: &str,
        thread_id: &ThreadId,
    ) -> impl std::future::Future<Output = Result<Option<ThreadMetadata>, RepositoryError>> + Send;

    /// Insert or fully replace a record.
    fn put(
        &self,
        record: &ThreadMetadata,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    /// Set only `update_date` on an existing record.
    ///
    /// Returns `RepositoryError::NotFound` if the record does not exist.
    fn touch(
        &self,
        user_id: &str,
        thread_id: &ThreadId,
        update_date: DateTime<Utc>,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    /// All records owned by a user, in no particular order.
    fn query_user(
        &self,
        user_id: &str,
    ) -> impl std::future::Future<Output = Result<Vec<ThreadMetadata>, RepositoryError>> + Send;

    /// Delete one record. No-op if it does not exist.
    fn delete(
        &self,
        user_id: &str,
        thread_id: &ThreadId,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;
}
