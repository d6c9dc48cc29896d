use thiserror::Error;

use crate::chat::ThreadId;
use crate::llm::LlmError;

/// Errors from repository operations (used by trait definitions in chatloom-core).
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database connection error")]
    Connection,

    #[error("query error: {0}")]
    Query(String),

    #[error("entity not found")]
    NotFound,

    #[error("conflict: {0}")]
    Conflict(String),
}

/// Errors from building or running a conversation flow.
#[derive(Debug, Error)]
pub enum FlowError {
    #[error("flow has no entry edge from START")]
    MissingEntry,

    #[error("flow has more than one entry edge from START")]
    MultipleEntries,

    #[error("edge references unknown node '{0}'")]
    UnknownNode(String),

    #[error("node '{0}' is declared more than once")]
    DuplicateNode(String),

    #[error("node '{0}' must have exactly one outgoing edge")]
    BranchingNode(String),

    #[error("cycle detected involving node '{0}'")]
    CycleDetected(String),

    #[error("node '{0}' is unreachable from START")]
    Unreachable(String),

    #[error("flow ended without an assistant reply")]
    NoReply,
}

/// Errors surfaced by the session manager to its callers.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("unknown chat mode: '{0}'")]
    UnknownMode(String),

    /// The user owns no thread with this id.
    #[error("thread '{0}' not found")]
    ThreadNotFound(ThreadId),

    #[error("generation failed: {0}")]
    Generation(#[from] LlmError),

    #[error("checkpoint store error: {0}")]
    Checkpoint(#[from] RepositoryError),

    #[error("flow error: {0}")]
    Flow(#[from] FlowError),
}
