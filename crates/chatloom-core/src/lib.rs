//! Business logic and port definitions for Chatloom.
//!
//! This crate defines the storage traits that the infrastructure layer
//! implements, plus the conversation flows, the response generator, and the
//! session manager built on top of them. It depends only on `chatloom-types`,
//! never on `chatloom-infra` or any database/IO crate.

pub mod checkpoint;
pub mod flow;
pub mod llm;
pub mod metadata;
pub mod session;

#[cfg(test)]
pub(crate) mod test_support;
