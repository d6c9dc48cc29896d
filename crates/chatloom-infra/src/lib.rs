//! Infrastructure layer for Chatloom.
//!
//! Implements the storage traits defined in `chatloom-core` (SQLite and
//! in-memory), the OpenAI-compatible generation provider, and the config
//! file loader.

pub mod backend;
pub mod config;
pub mod llm;
pub mod memory;
pub mod sqlite;
