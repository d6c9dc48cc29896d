//! Conversation flow graphs and the per-mode registry.

pub mod graph;
pub mod modes;
pub mod node;
