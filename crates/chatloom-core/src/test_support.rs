//! Shared mocks for unit tests in this crate.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use chatloom_types::chat::{Checkpoint, ThreadId, ThreadMetadata};
use chatloom_types::error::RepositoryError;
use chatloom_types::llm::{
    CompletionRequest, CompletionResponse, LlmError, MessageRole, ProviderCapabilities, StopReason,
    Usage,
};
use chrono::{DateTime, Utc};

use crate::checkpoint::store::CheckpointStore;
use crate::llm::box_provider::BoxLlmProvider;
use crate::llm::generator::{GeneratorSettings, ResponseGenerator};
use crate::metadata::repository::MetadataRepository;

enum Behavior {
    Echo,
    Fail,
    Slow(Duration),
}

/// Provider that answers "echo: {last user message}", fails, or stalls.
pub struct MockProvider {
    behavior: Behavior,
    capabilities: ProviderCapabilities,
    pub calls: Arc<AtomicUsize>,
    pub requests: Arc<Mutex<Vec<CompletionRequest>>>,
}

impl MockProvider {
    fn with(behavior: Behavior) -> Self {
        Self {
            behavior,
            capabilities: ProviderCapabilities {
                max_context_tokens: 8_192,
                max_output_tokens: 1_024,
            },
            calls: Arc::new(AtomicUsize::new(0)),
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn echo() -> Self {
        Self::with(Behavior::Echo)
    }

    pub fn failing() -> Self {
        Self::with(Behavior::Fail)
    }

    pub fn slow(delay: Duration) -> Self {
        Self::with(Behavior::Slow(delay))
    }
}

impl crate::llm::provider::LlmProvider for MockProvider {
    fn name(&self) -> &str {
        "mock"
    }

    fn capabilities(&self) -> &ProviderCapabilities {
        &self.capabilities
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<CompletionResponse, LlmError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().unwrap().push(request.clone());

        match self.behavior {
            Behavior::Fail => {
                return Err(LlmError::Provider {
                    message: "mock failure".to_string(),
                });
            }
            Behavior::Slow(delay) => tokio::time::sleep(delay).await,
            Behavior::Echo => {}
        }

        let last_user = request
            .messages
            .iter()
            .rev()
            .find(|m| m.role == MessageRole::User)
            .map(|m| m.content.clone())
            .unwrap_or_default();

        Ok(CompletionResponse {
            id: "mock-1".to_string(),
            content: format!("echo: {last_user}"),
            model: request.model.clone(),
            stop_reason: StopReason::EndTurn,
            usage: Usage::default(),
        })
    }
}

pub fn settings_with_timeout(timeout: Duration) -> GeneratorSettings {
    GeneratorSettings {
        timeout,
        ..Default::default()
    }
}

pub fn echo_generator() -> ResponseGenerator {
    ResponseGenerator::new(
        BoxLlmProvider::new(MockProvider::echo()),
        GeneratorSettings::default(),
    )
}

pub fn failing_generator() -> ResponseGenerator {
    ResponseGenerator::new(
        BoxLlmProvider::new(MockProvider::failing()),
        GeneratorSettings::default(),
    )
}

/// HashMap-backed checkpoint store.
#[derive(Default)]
pub struct MockCheckpointStore {
    pub snapshots: Mutex<HashMap<ThreadId, Vec<Checkpoint>>>,
    pub fail_saves: bool,
}

impl CheckpointStore for MockCheckpointStore {
    async fn save(&self, checkpoint: &Checkpoint) -> Result<(), RepositoryError> {
        if self.fail_saves {
            return Err(RepositoryError::Connection);
        }
        let mut snapshots = self.snapshots.lock().unwrap();
        let history = snapshots.entry(checkpoint.thread_id).or_default();
        if history.iter().any(|c| c.step == checkpoint.step) {
            return Err(RepositoryError::Conflict(format!(
                "step {} already exists",
                checkpoint.step
            )));
        }
        history.push(checkpoint.clone());
        Ok(())
    }

    async fn load(&self, thread_id: &ThreadId) -> Result<Option<Checkpoint>, RepositoryError> {
        let snapshots = self.snapshots.lock().unwrap();
        Ok(snapshots
            .get(thread_id)
            .and_then(|h| h.iter().max_by_key(|c| c.step))
            .cloned())
    }

    async fn list(&self, thread_id: &ThreadId) -> Result<Vec<Checkpoint>, RepositoryError> {
        let snapshots = self.snapshots.lock().unwrap();
        let mut history = snapshots.get(thread_id).cloned().unwrap_or_default();
        history.sort_by_key(|c| c.step);
        Ok(history)
    }

    async fn delete_thread(&self, thread_id: &ThreadId) -> Result<(), RepositoryError> {
        self.snapshots.lock().unwrap().remove(thread_id);
        Ok(())
    }
}

/// HashMap-backed metadata repository with switchable failure modes.
#[derive(Default)]
pub struct MockMetadataRepo {
    pub records: Mutex<HashMap<(String, ThreadId), ThreadMetadata>>,
    pub fail_reads: bool,
    pub fail_writes: bool,
    pub fail_delete_of: Option<ThreadId>,
}

impl MetadataRepository for MockMetadataRepo {
    async fn get(
        &self,
        user_id: &str,
        thread_id: &ThreadId,
    ) -> Result<Option<ThreadMetadata>, RepositoryError> {
        if self.fail_reads {
            return Err(RepositoryError::Connection);
        }
        let records = self.records.lock().unwrap();
        Ok(records.get(&(user_id.to_string(), *thread_id)).cloned())
    }

    async fn put(&self, record: &ThreadMetadata) -> Result<(), RepositoryError> {
        if self.fail_writes {
            return Err(RepositoryError::Connection);
        }
        let mut records = self.records.lock().unwrap();
        records.insert((record.user_id.clone(), record.thread_id), record.clone());
        Ok(())
    }

    async fn touch(
        &self,
        user_id: &str,
        thread_id: &ThreadId,
        update_date: DateTime<Utc>,
    ) -> Result<(), RepositoryError> {
        if self.fail_writes {
            return Err(RepositoryError::Connection);
        }
        let mut records = self.records.lock().unwrap();
        let record = records
            .get_mut(&(user_id.to_string(), *thread_id))
            .ok_or(RepositoryError::NotFound)?;
        record.update_date = update_date;
        Ok(())
    }

    async fn query_user(&self, user_id: &str) -> Result<Vec<ThreadMetadata>, RepositoryError> {
        if self.fail_reads {
            return Err(RepositoryError::Connection);
        }
        let records = self.records.lock().unwrap();
        Ok(records
            .values()
            .filter(|r| r.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn delete(&self, user_id: &str, thread_id: &ThreadId) -> Result<(), RepositoryError> {
        if self.fail_delete_of == Some(*thread_id) {
            return Err(RepositoryError::Query("delete failed".to_string()));
        }
        let mut records = self.records.lock().unwrap();
        records.remove(&(user_id.to_string(), *thread_id));
        Ok(())
    }
}
