//! REST API request handlers.

pub mod message;
pub mod mode;
pub mod thread;

use chatloom_types::chat::ThreadId;

use crate::http::error::AppError;

/// Parse a thread id from a path parameter, returning a 400 error on invalid format.
fn parse_thread_id(s: &str) -> Result<ThreadId, AppError> {
    s.parse::<ThreadId>()
        .map_err(|_| AppError::Validation(format!("Invalid thread id: {s}")))
}
