//! Thread metadata persistence.
//!
//! - `MetadataRepository`: raw, fallible key-value access keyed by
//!   `(user_id, thread_id)`, implemented in chatloom-infra.
//! - `MetadataStore`: the client the session manager talks to. It never
//!   fails; backend errors are logged and turned into empty results.

pub mod client;
pub mod repository;
