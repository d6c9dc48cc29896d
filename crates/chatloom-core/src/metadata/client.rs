//! Soft-failing metadata client.
//!
//! `MetadataStore` wraps a `MetadataRepository` and implements the contract
//! the session manager relies on: every operation completes, backend failures
//! are logged and converted into `false`, empty, or `None` results. Sidebar
//! listing degrades to "no chats" instead of taking the UI down.

use chatloom_types::chat::{ChatMode, ThreadId, ThreadMetadata};
use chrono::Utc;
use tracing::{debug, error, warn};

use super::repository::MetadataRepository;

/// Metadata client used by the session manager.
pub struct MetadataStore<R: MetadataRepository> {
    repo: R,
}

impl<R: MetadataRepository> MetadataStore<R> {
    /// Create a new client backed by the given repository.
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Access the underlying repository.
    pub fn repo(&self) -> &R {
        &self.repo
    }

    /// Create the record for a thread, or bump `update_date` if it exists.
    ///
    /// `is_new` is the caller's belief about whether the thread is new. A
    /// mismatch with what the store holds is a reconciliation signal: it is
    /// logged and the store's view wins. Returns `false` on backend failure.
    pub async fn upsert(
        &self,
        user_id: &str,
        thread_id: &ThreadId,
        mode: ChatMode,
        is_new: bool,
    ) -> bool {
        let now = Utc::now();

        let existing = match self.repo.get(user_id, thread_id).await {
            Ok(existing) => existing,
            Err(e) => {
                error!(user_id, thread_id = %thread_id, error = %e, "Error reading thread metadata");
                return false;
            }
        };

        let result = match existing {
            Some(_) => {
                if is_new {
                    warn!(
                        user_id,
                        thread_id = %thread_id,
                        "Caller marked thread as new but a metadata record already exists"
                    );
                }
                self.repo.touch(user_id, thread_id, now).await
            }
            None => {
                if !is_new {
                    warn!(
                        user_id,
                        thread_id = %thread_id,
                        "Caller marked thread as existing but no metadata record was found"
                    );
                }
                let record = ThreadMetadata {
                    user_id: user_id.to_string(),
                    thread_id: *thread_id,
                    chat_mode: mode,
                    created_date: now,
                    update_date: now,
                };
                self.repo.put(&record).await
            }
        };

        match result {
            Ok(()) => {
                debug!(user_id, thread_id = %thread_id, "Thread metadata saved");
                true
            }
            Err(e) => {
                error!(user_id, thread_id = %thread_id, error = %e, "Error saving thread metadata");
                false
            }
        }
    }

    /// Every thread id owned by the user, unordered. Empty on failure.
    pub async fn list_threads(&self, user_id: &str) -> Vec<ThreadId> {
        match self.repo.query_user(user_id).await {
            Ok(records) => records.into_iter().map(|r| r.thread_id).collect(),
            Err(e) => {
                error!(user_id, error = %e, "Error getting user threads");
                Vec::new()
            }
        }
    }

    /// The full record, or `None` if it is missing or the lookup failed.
    pub async fn get_details(&self, user_id: &str, thread_id: &ThreadId) -> Option<ThreadMetadata> {
        match self.repo.get(user_id, thread_id).await {
            Ok(record) => record,
            Err(e) => {
                error!(user_id, thread_id = %thread_id, error = %e, "Error getting thread details");
                None
            }
        }
    }

    /// Delete one record. Returns `false` on failure.
    pub async fn delete(&self, user_id: &str, thread_id: &ThreadId) -> bool {
        match self.repo.delete(user_id, thread_id).await {
            Ok(()) => true,
            Err(e) => {
                error!(user_id, thread_id = %thread_id, error = %e, "Error deleting thread metadata");
                false
            }
        }
    }

    /// Delete every record owned by the user, one at a time.
    ///
    /// Not transactional: a failure part-way leaves the remaining records in
    /// place. Every record is attempted; the result is `true` only if all
    /// deletions succeeded.
    pub async fn delete_all(&self, user_id: &str) -> bool {
        let records = match self.repo.query_user(user_id).await {
            Ok(records) => records,
            Err(e) => {
                error!(user_id, error = %e, "Error listing threads for deletion");
                return false;
            }
        };

        let mut all_ok = true;
        for record in &records {
            if !self.delete(user_id, &record.thread_id).await {
                all_ok = false;
            }
        }

        if !all_ok {
            warn!(user_id, "Partial deletion of thread metadata");
        }
        all_ok
    }
}
