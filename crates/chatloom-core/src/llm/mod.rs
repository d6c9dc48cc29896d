//! Generation provider abstractions for Chatloom.
//!
//! - `LlmProvider`: RPITIT trait for concrete provider implementations
//! - `BoxLlmProvider`: Object-safe wrapper for dynamic dispatch
//! - `ResponseGenerator`: message list (+ system instruction) to one reply

pub mod box_provider;
pub mod generator;
pub mod provider;
