//! Thread, mode, and conversation state types for Chatloom.
//!
//! These types model the conversation threads a user keeps with the
//! assistant: the closed set of chat modes, per-thread metadata records,
//! sidebar summaries, and the checkpointed conversation state.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use std::fmt;
use std::str::FromStr;

pub use crate::llm::{Message, MessageRole};

/// Thread identifiers are UUID v7: globally unique and time-sortable.
pub type ThreadId = Uuid;

/// Conversation mode selecting which flow a turn executes.
///
/// The set is closed and known at startup. Tags outside this set are
/// rejected when parsed.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum ChatMode {
    #[default]
    Qna,
    ContentGen,
}

impl ChatMode {
    /// Every registered mode, in display order.
    pub fn all() -> &'static [ChatMode] {
        &[ChatMode::Qna, ChatMode::ContentGen]
    }

    /// Stable identifier used in storage and on the wire.
    pub fn tag(&self) -> &'static str {
        match self {
            ChatMode::Qna => "qna",
            ChatMode::ContentGen => "content_gen",
        }
    }

    /// Human-readable label for mode pickers and thread headers.
    pub fn label(&self) -> &'static str {
        match self {
            ChatMode::Qna => "QnA",
            ChatMode::ContentGen => "Content Generation",
        }
    }
}

impl fmt::Display for ChatMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl FromStr for ChatMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "qna" => Ok(ChatMode::Qna),
            "content_gen" => Ok(ChatMode::ContentGen),
            other => Err(format!("unknown chat mode: '{other}'")),
        }
    }
}

/// Metadata record for a thread, keyed by `(user_id, thread_id)`.
///
/// `created_date` is set once; `update_date` is bumped on every turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThreadMetadata {
    pub user_id: String,
    pub thread_id: ThreadId,
    pub chat_mode: ChatMode,
    pub created_date: DateTime<Utc>,
    pub update_date: DateTime<Utc>,
}

/// One sidebar entry: what the UI needs to render a thread link.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThreadSummary {
    /// Content of the first stored message; `None` when the thread has no
    /// messages yet.
    pub first_message: Option<String>,
    pub mode: ChatMode,
    pub created: DateTime<Utc>,
    pub updated: DateTime<Utc>,
}

/// Conversation state carried through a flow and checkpointed per thread.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConversationState {
    /// Raw text of the most recent inbound message.
    pub last_human_message: String,
    /// Append-only message sequence.
    pub messages: Vec<Message>,
    pub mode: ChatMode,
}

impl ConversationState {
    /// Fresh state for a new thread in the given mode.
    pub fn new(mode: ChatMode) -> Self {
        Self {
            last_human_message: String::new(),
            messages: Vec::new(),
            mode,
        }
    }

    /// Append messages produced by a flow step, preserving order.
    pub fn append(&mut self, messages: impl IntoIterator<Item = Message>) {
        self.messages.extend(messages);
    }

    /// The most recent assistant message, if the sequence ends with one.
    pub fn last_reply(&self) -> Option<&str> {
        self.messages
            .last()
            .filter(|m| m.role == MessageRole::Assistant)
            .map(|m| m.content.as_str())
    }

    /// The first stored message, used as a thread's sidebar label.
    pub fn first_message(&self) -> Option<&str> {
        self.messages.first().map(|m| m.content.as_str())
    }
}

/// A durable snapshot of a thread's state after one turn.
///
/// `step` starts at 0 for the first turn and increments by one per turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Checkpoint {
    pub thread_id: ThreadId,
    pub step: u32,
    pub state: ConversationState,
    pub created_at: DateTime<Utc>,
}
