//! Shared domain types for Chatloom.
//!
//! This crate contains the core domain types used across the workspace:
//! chat modes, thread metadata, conversation state and checkpoints, LLM
//! request/response shapes, configuration, and their associated error types.
//!
//! Zero infrastructure dependencies -- only serde, uuid, chrono, thiserror.

pub mod chat;
pub mod config;
pub mod error;
pub mod llm;
