//! Session manager: the public entry point for thread lifecycle operations.
//!
//! Owns the checkpoint store, the metadata client, the response generator,
//! and the mode registry. A turn runs exactly one flow, persists the
//! resulting state as a new checkpoint, then records thread metadata.
//!
//! The two stores are written independently. The checkpoint is written first
//! and its failure fails the turn; the metadata write that follows is
//! best-effort and only logged. A thread whose metadata write failed keeps
//! its history but does not appear in the sidebar.

use std::collections::BTreeMap;
use std::sync::Arc;

use chatloom_types::chat::{
    ChatMode, Checkpoint, ConversationState, ThreadId, ThreadMetadata, ThreadSummary,
};
use chatloom_types::error::{FlowError, SessionError};
use chatloom_types::llm::Message;
use chrono::Utc;
use dashmap::DashMap;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::checkpoint::store::CheckpointStore;
use crate::flow::modes::ModeRegistry;
use crate::llm::generator::ResponseGenerator;
use crate::metadata::client::MetadataStore;
use crate::metadata::repository::MetadataRepository;

/// Orchestrates turns, history reads, sidebar listing, and deletion.
///
/// Generic over the storage backends so the API layer can pick SQLite or
/// in-memory implementations at startup.
pub struct SessionManager<C: CheckpointStore, M: MetadataRepository> {
    checkpoints: C,
    metadata: MetadataStore<M>,
    generator: ResponseGenerator,
    registry: ModeRegistry,
    /// Per-thread turn locks. Two turns on one thread serialize. An entry
    /// lives only while some caller holds or waits on it.
    locks: DashMap<ThreadId, Arc<Mutex<()>>>,
}

impl<C: CheckpointStore, M: MetadataRepository> SessionManager<C, M> {
    /// Build a manager, compiling every registered flow.
    pub fn new(checkpoints: C, metadata: M, generator: ResponseGenerator) -> Result<Self, FlowError> {
        Ok(Self {
            checkpoints,
            metadata: MetadataStore::new(metadata),
            generator,
            registry: ModeRegistry::new()?,
            locks: DashMap::new(),
        })
    }

    pub fn generator(&self) -> &ResponseGenerator {
        &self.generator
    }

    pub fn checkpoint_store(&self) -> &C {
        &self.checkpoints
    }

    pub fn metadata(&self) -> &MetadataStore<M> {
        &self.metadata
    }

    /// Registered modes in display order.
    pub fn modes(&self) -> &'static [ChatMode] {
        self.registry.modes()
    }

    /// Allocate a fresh, time-sortable thread id.
    pub fn new_thread_id() -> ThreadId {
        Uuid::now_v7()
    }

    fn thread_lock(&self, thread_id: &ThreadId) -> Arc<Mutex<()>> {
        self.locks.entry(*thread_id).or_default().clone()
    }

    /// Drop a thread's lock entry once no other caller holds or waits on it.
    ///
    /// `lock` is the caller's own handle, so a count of two means only the
    /// map and the caller reference it.
    fn release_lock(&self, thread_id: &ThreadId, lock: Arc<Mutex<()>>) {
        self.locks.remove_if(thread_id, |_, entry| {
            Arc::ptr_eq(entry, &lock) && Arc::strong_count(entry) == 2
        });
    }

    /// Number of threads with a live lock entry.
    pub fn active_locks(&self) -> usize {
        self.locks.len()
    }

    /// Start a new thread with its first message.
    pub async fn start_thread(
        &self,
        user_id: &str,
        text: &str,
        mode: &str,
    ) -> Result<(ThreadId, String), SessionError> {
        let thread_id = Self::new_thread_id();
        let reply = self.turn(user_id, &thread_id, text, mode, true).await?;
        Ok((thread_id, reply))
    }

    /// Process one inbound message and return the assistant's reply.
    ///
    /// For an existing thread the recorded mode wins over `mode`; a mismatch
    /// is logged. Nothing is persisted if the flow fails.
    #[tracing::instrument(skip(self, thread_id, text), fields(thread_id = %thread_id))]
    pub async fn turn(
        &self,
        user_id: &str,
        thread_id: &ThreadId,
        text: &str,
        mode: &str,
        is_new_thread: bool,
    ) -> Result<String, SessionError> {
        let requested = ModeRegistry::parse_mode(mode)?;

        let lock = self.thread_lock(thread_id);
        let result = {
            let _guard = lock.lock().await;
            self.run_turn(user_id, thread_id, text, requested, is_new_thread)
                .await
        };
        self.release_lock(thread_id, lock);
        result
    }

    async fn run_turn(
        &self,
        user_id: &str,
        thread_id: &ThreadId,
        text: &str,
        requested: ChatMode,
        is_new_thread: bool,
    ) -> Result<String, SessionError> {
        let (mut state, step) = match self.checkpoints.load(thread_id).await? {
            Some(checkpoint) => {
                if checkpoint.state.mode != requested {
                    warn!(
                        recorded = %checkpoint.state.mode,
                        requested = %requested,
                        "Mode cannot change on an existing thread; using recorded mode"
                    );
                }
                (checkpoint.state, checkpoint.step + 1)
            }
            None => (ConversationState::new(requested), 0),
        };
        state.last_human_message = text.to_string();

        let flow = self.registry.flow(state.mode)?;
        let state = flow.run(state, &self.generator).await?;

        let reply = state.last_reply().ok_or(FlowError::NoReply)?.to_string();
        let active_mode = state.mode;

        self.checkpoints
            .save(&Checkpoint {
                thread_id: *thread_id,
                step,
                state,
                created_at: Utc::now(),
            })
            .await?;
        debug!(step, "Checkpoint saved");

        if !self
            .metadata
            .upsert(user_id, thread_id, active_mode, is_new_thread)
            .await
        {
            warn!("Thread metadata not recorded; thread will be missing from the sidebar");
        }

        if step == 0 {
            info!(mode = %active_mode, "Thread created");
        }

        Ok(reply)
    }

    /// Full ordered message sequence for a thread. Empty for an unknown thread.
    pub async fn history(&self, thread_id: &ThreadId) -> Result<Vec<Message>, SessionError> {
        Ok(self
            .checkpoints
            .load(thread_id)
            .await?
            .map(|checkpoint| checkpoint.state.messages)
            .unwrap_or_default())
    }

    /// Every snapshot recorded for a thread, oldest first.
    pub async fn checkpoints(&self, thread_id: &ThreadId) -> Result<Vec<Checkpoint>, SessionError> {
        Ok(self.checkpoints.list(thread_id).await?)
    }

    /// Metadata for one of the user's threads.
    pub async fn thread_details(&self, user_id: &str, thread_id: &ThreadId) -> Option<ThreadMetadata> {
        self.metadata.get_details(user_id, thread_id).await
    }

    /// Sidebar entries for every thread the user owns.
    ///
    /// Threads whose metadata vanished between listing and lookup are
    /// skipped. A failed checkpoint read leaves `first_message` empty.
    pub async fn list_for_sidebar(&self, user_id: &str) -> BTreeMap<ThreadId, ThreadSummary> {
        let mut sidebar = BTreeMap::new();

        for thread_id in self.metadata.list_threads(user_id).await {
            let Some(details) = self.metadata.get_details(user_id, &thread_id).await else {
                warn!(user_id, thread_id = %thread_id, "Listed thread has no metadata; skipping");
                continue;
            };

            let first_message = match self.checkpoints.load(&thread_id).await {
                Ok(checkpoint) => checkpoint
                    .and_then(|c| c.state.first_message().map(str::to_string)),
                Err(e) => {
                    error!(user_id, thread_id = %thread_id, error = %e, "Error reading thread history");
                    None
                }
            };

            sidebar.insert(
                thread_id,
                ThreadSummary {
                    first_message,
                    mode: details.chat_mode,
                    created: details.created_date,
                    updated: details.update_date,
                },
            );
        }

        sidebar
    }

    /// Delete one of the user's threads: checkpoints first, then metadata.
    ///
    /// `ThreadNotFound` when the user has no metadata record for the thread;
    /// nothing is deleted in that case. Otherwise best-effort: `Ok(false)`
    /// when part of the deletion failed.
    pub async fn delete_thread(&self, user_id: &str, thread_id: &ThreadId) -> Result<bool, SessionError> {
        if self.metadata.get_details(user_id, thread_id).await.is_none() {
            warn!(user_id, thread_id = %thread_id, "Refusing to delete a thread the user does not own");
            return Err(SessionError::ThreadNotFound(*thread_id));
        }

        let lock = self.thread_lock(thread_id);
        let deleted = {
            let _guard = lock.lock().await;
            let checkpoints_ok = match self.checkpoints.delete_thread(thread_id).await {
                Ok(()) => true,
                Err(e) => {
                    error!(user_id, thread_id = %thread_id, error = %e, "Error deleting thread checkpoints");
                    false
                }
            };
            let metadata_ok = self.metadata.delete(user_id, thread_id).await;
            checkpoints_ok && metadata_ok
        };
        self.release_lock(thread_id, lock);

        Ok(deleted)
    }

    /// Delete every thread the user owns: checkpoints first, then metadata.
    ///
    /// Not atomic. Failures are logged and reported as `false`; whatever
    /// could be deleted stays deleted.
    pub async fn delete_all(&self, user_id: &str) -> bool {
        let threads = self.metadata.list_threads(user_id).await;
        let mut all_ok = true;

        for thread_id in &threads {
            if let Err(e) = self.checkpoints.delete_thread(thread_id).await {
                error!(user_id, thread_id = %thread_id, error = %e, "Error deleting thread checkpoints");
                all_ok = false;
            }
        }

        if !self.metadata.delete_all(user_id).await {
            all_ok = false;
        }

        info!(user_id, threads = threads.len(), success = all_ok, "Deleted all threads");
        all_ok
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::collections::HashSet;
    use std::sync::atomic::Ordering;

    use crate::llm::box_provider::BoxLlmProvider;
    use crate::llm::generator::GeneratorSettings;
    use crate::test_support::{
        MockCheckpointStore, MockMetadataRepo, MockProvider, echo_generator, failing_generator,
    };
    use chatloom_types::llm::{LlmError, MessageRole};

    type TestManager = SessionManager<MockCheckpointStore, MockMetadataRepo>;

    fn manager() -> TestManager {
        SessionManager::new(
            MockCheckpointStore::default(),
            MockMetadataRepo::default(),
            echo_generator(),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_turns_append_human_assistant_pairs() {
        let manager = manager();
        let thread = TestManager::new_thread_id();

        manager.turn("u1", &thread, "one", "qna", true).await.unwrap();
        manager.turn("u1", &thread, "two", "qna", false).await.unwrap();
        manager.turn("u1", &thread, "three", "qna", false).await.unwrap();

        let history = manager.history(&thread).await.unwrap();
        assert_eq!(
            history,
            vec![
                Message::human("one"),
                Message::assistant("echo: one"),
                Message::human("two"),
                Message::assistant("echo: two"),
                Message::human("three"),
                Message::assistant("echo: three"),
            ]
        );
    }

    #[tokio::test]
    async fn test_start_thread_creates_record_with_equal_timestamps() {
        let manager = manager();

        let (first, reply) = manager.start_thread("u1", "Hello", "qna").await.unwrap();
        let (second, _) = manager.start_thread("u1", "Hello", "qna").await.unwrap();

        assert_eq!(reply, "echo: Hello");
        assert_ne!(first, second);
        let record = manager.thread_details("u1", &first).await.unwrap();
        assert_eq!(record.created_date, record.update_date);
        assert_eq!(record.chat_mode, ChatMode::Qna);
    }

    #[tokio::test]
    async fn test_second_turn_advances_update_date_only() {
        let manager = manager();
        let (thread, _) = manager.start_thread("u1", "first", "qna").await.unwrap();
        let before = manager.thread_details("u1", &thread).await.unwrap();

        manager.turn("u1", &thread, "second", "qna", false).await.unwrap();
        let after = manager.thread_details("u1", &thread).await.unwrap();

        assert_eq!(after.created_date, before.created_date);
        assert!(after.update_date >= before.update_date);
    }

    #[tokio::test]
    async fn test_sidebar_is_scoped_to_user() {
        let manager = manager();
        let mut alice = HashSet::new();

        for i in 0..3 {
            let (a, _) = manager.start_thread("alice", &format!("a{i}"), "qna").await.unwrap();
            alice.insert(a);
            manager.start_thread("bob", &format!("b{i}"), "content_gen").await.unwrap();
        }

        let sidebar = manager.list_for_sidebar("alice").await;
        let ids: HashSet<ThreadId> = sidebar.keys().copied().collect();
        assert_eq!(ids, alice);
        assert!(sidebar.values().all(|s| s.mode == ChatMode::Qna));
        assert!(sidebar.values().all(|s| s.first_message.as_deref().unwrap().starts_with('a')));
    }

    #[tokio::test]
    async fn test_sidebar_thread_without_messages_has_no_first_message() {
        let manager = manager();
        let thread = TestManager::new_thread_id();
        manager
            .metadata()
            .upsert("u1", &thread, ChatMode::Qna, true)
            .await;

        let sidebar = manager.list_for_sidebar("u1").await;
        assert_eq!(sidebar[&thread].first_message, None);
    }

    #[tokio::test]
    async fn test_delete_all_empties_sidebar_and_history() {
        let manager = manager();
        let (a, _) = manager.start_thread("u1", "a", "qna").await.unwrap();
        manager.start_thread("u1", "b", "content_gen").await.unwrap();
        let (other, _) = manager.start_thread("u2", "c", "qna").await.unwrap();

        assert!(manager.delete_all("u1").await);

        assert!(manager.list_for_sidebar("u1").await.is_empty());
        assert!(manager.history(&a).await.unwrap().is_empty());
        // Other users are untouched.
        assert_eq!(manager.history(&other).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_delete_all_reports_partial_failure() {
        let keep = TestManager::new_thread_id();
        let manager = SessionManager::new(
            MockCheckpointStore::default(),
            MockMetadataRepo {
                fail_delete_of: Some(keep),
                ..Default::default()
            },
            echo_generator(),
        )
        .unwrap();
        manager.turn("u1", &keep, "x", "qna", true).await.unwrap();
        manager.start_thread("u1", "y", "qna").await.unwrap();

        assert!(!manager.delete_all("u1").await);
        let remaining: Vec<ThreadId> = manager.list_for_sidebar("u1").await.into_keys().collect();
        assert_eq!(remaining, vec![keep]);
    }

    #[tokio::test]
    async fn test_delete_thread_removes_one() {
        let manager = manager();
        let (a, _) = manager.start_thread("u1", "a", "qna").await.unwrap();
        let (b, _) = manager.start_thread("u1", "b", "qna").await.unwrap();

        assert!(manager.delete_thread("u1", &a).await.unwrap());

        let sidebar = manager.list_for_sidebar("u1").await;
        assert!(!sidebar.contains_key(&a));
        assert!(sidebar.contains_key(&b));
        assert!(manager.history(&a).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_qna_hello_appends_human_then_assistant() {
        let manager = manager();
        let (thread, reply) = manager.start_thread("u1", "Hello", "qna").await.unwrap();

        let history = manager.history(&thread).await.unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0], Message::human("Hello"));
        assert_eq!(history[1].role, MessageRole::Assistant);
        assert!(!history[1].content.is_empty());
        assert_eq!(history[1].content, reply);
    }

    #[tokio::test]
    async fn test_unknown_mode_is_rejected_before_any_write() {
        let manager = manager();
        let thread = TestManager::new_thread_id();

        let err = manager
            .turn("u1", &thread, "Hello", "nonexistent", true)
            .await
            .unwrap_err();

        assert!(matches!(err, SessionError::UnknownMode(ref tag) if tag == "nonexistent"));
        assert!(manager.history(&thread).await.unwrap().is_empty());
        assert!(manager.list_for_sidebar("u1").await.is_empty());
    }

    #[tokio::test]
    async fn test_generation_failure_persists_nothing() {
        let manager = SessionManager::new(
            MockCheckpointStore::default(),
            MockMetadataRepo::default(),
            failing_generator(),
        )
        .unwrap();
        let thread = TestManager::new_thread_id();

        let err = manager
            .turn("u1", &thread, "Hello", "qna", true)
            .await
            .unwrap_err();

        assert!(matches!(err, SessionError::Generation(LlmError::Provider { .. })));
        assert!(manager.history(&thread).await.unwrap().is_empty());
        assert!(manager.thread_details("u1", &thread).await.is_none());
    }

    #[tokio::test]
    async fn test_checkpoint_failure_fails_turn_and_skips_metadata() {
        let manager = SessionManager::new(
            MockCheckpointStore {
                fail_saves: true,
                ..Default::default()
            },
            MockMetadataRepo::default(),
            echo_generator(),
        )
        .unwrap();
        let thread = TestManager::new_thread_id();

        let err = manager
            .turn("u1", &thread, "Hello", "qna", true)
            .await
            .unwrap_err();

        assert!(matches!(err, SessionError::Checkpoint(_)));
        assert!(manager.thread_details("u1", &thread).await.is_none());
    }

    #[tokio::test]
    async fn test_metadata_failure_keeps_history_but_hides_thread() {
        let manager = SessionManager::new(
            MockCheckpointStore::default(),
            MockMetadataRepo {
                fail_writes: true,
                ..Default::default()
            },
            echo_generator(),
        )
        .unwrap();

        let (thread, reply) = manager.start_thread("u1", "Hello", "qna").await.unwrap();

        assert_eq!(reply, "echo: Hello");
        assert_eq!(manager.history(&thread).await.unwrap().len(), 2);
        assert!(manager.list_for_sidebar("u1").await.is_empty());
    }

    #[tokio::test]
    async fn test_existing_thread_keeps_recorded_mode() {
        let manager = manager();
        let (thread, reply) = manager
            .start_thread("u1", "Write something", "content_gen")
            .await
            .unwrap();
        assert_eq!(reply, "Hello World");

        let reply = manager
            .turn("u1", &thread, "Now answer a question", "qna", false)
            .await
            .unwrap();

        assert_eq!(reply, "Hello World");
        let record = manager.thread_details("u1", &thread).await.unwrap();
        assert_eq!(record.chat_mode, ChatMode::ContentGen);
    }

    #[tokio::test]
    async fn test_each_turn_adds_a_checkpoint() {
        let manager = manager();
        let (thread, _) = manager.start_thread("u1", "a", "qna").await.unwrap();
        manager.turn("u1", &thread, "b", "qna", false).await.unwrap();

        let snapshots = manager.checkpoints(&thread).await.unwrap();
        let steps: Vec<u32> = snapshots.iter().map(|c| c.step).collect();
        assert_eq!(steps, vec![0, 1]);
        assert_eq!(snapshots[0].state.messages.len(), 2);
        assert_eq!(snapshots[1].state.messages.len(), 4);
        assert_eq!(snapshots[1].state.last_human_message, "b");
    }

    #[tokio::test]
    async fn test_content_gen_never_calls_provider() {
        let provider = MockProvider::echo();
        let calls = provider.calls.clone();
        let manager = SessionManager::new(
            MockCheckpointStore::default(),
            MockMetadataRepo::default(),
            ResponseGenerator::new(BoxLlmProvider::new(provider), GeneratorSettings::default()),
        )
        .unwrap();

        manager.start_thread("u1", "anything", "content_gen").await.unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_concurrent_turns_on_one_thread_serialize() {
        let manager = Arc::new(manager());
        let (thread, _) = manager.start_thread("u1", "start", "qna").await.unwrap();

        let mut handles = Vec::new();
        for i in 0..8 {
            let manager = Arc::clone(&manager);
            handles.push(tokio::spawn(async move {
                manager
                    .turn("u1", &thread, &format!("msg {i}"), "qna", false)
                    .await
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let history = manager.history(&thread).await.unwrap();
        assert_eq!(history.len(), 2 + 8 * 2);
        // Every human message is immediately followed by its own reply.
        for pair in history.chunks(2) {
            assert_eq!(pair[0].role, MessageRole::User);
            assert_eq!(pair[1].content, format!("echo: {}", pair[0].content));
        }
        assert_eq!(manager.checkpoints(&thread).await.unwrap().len(), 9);
        assert_eq!(manager.active_locks(), 0);
    }

    #[tokio::test]
    async fn test_delete_thread_of_another_user_is_refused() {
        let manager = manager();
        let (thread, _) = manager.start_thread("alice", "secret", "qna").await.unwrap();

        let err = manager.delete_thread("bob", &thread).await.unwrap_err();
        assert!(matches!(err, SessionError::ThreadNotFound(id) if id == thread));

        assert_eq!(manager.history(&thread).await.unwrap().len(), 2);
        let sidebar = manager.list_for_sidebar("alice").await;
        assert_eq!(sidebar[&thread].first_message.as_deref(), Some("secret"));
    }

    #[tokio::test]
    async fn test_lock_entries_are_released_after_turns() {
        let manager = manager();
        let (thread, _) = manager.start_thread("u1", "a", "qna").await.unwrap();
        manager.turn("u1", &thread, "b", "qna", false).await.unwrap();
        assert_eq!(manager.active_locks(), 0);

        // Failed turns release their entry too.
        let failing = SessionManager::new(
            MockCheckpointStore::default(),
            MockMetadataRepo::default(),
            failing_generator(),
        )
        .unwrap();
        failing.start_thread("u1", "a", "qna").await.unwrap_err();
        assert_eq!(failing.active_locks(), 0);
    }
}
