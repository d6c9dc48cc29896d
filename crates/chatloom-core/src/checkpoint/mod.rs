//! Conversation checkpoint persistence abstractions.
//!
//! Defines the `CheckpointStore` trait that the infrastructure layer
//! implements (SQLite and in-memory backends).

pub mod store;
