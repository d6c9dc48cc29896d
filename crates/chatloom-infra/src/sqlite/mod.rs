//! SQLite storage layer.
//!
//! Checkpoint and thread metadata stores backed by SQLite with WAL mode and
//! split read/write connection pools.

pub mod checkpoint;
pub mod metadata;
pub mod pool;

use chatloom_types::error::RepositoryError;
use chrono::{DateTime, Utc};

fn parse_datetime(s: &str) -> Result<DateTime<Utc>, RepositoryError> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| RepositoryError::Query(format!("invalid datetime: {e}")))
}

fn format_datetime(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339()
}
