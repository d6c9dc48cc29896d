//! Thread message history.
//!
//! Endpoints:
//! - GET /api/v1/threads/{thread_id}/messages - Ordered messages of a thread

use axum::Json;
use axum::extract::{Path, State};

use chatloom_types::chat::Message;

use super::parse_thread_id;
use crate::http::error::AppError;
use crate::http::response::{ApiResponse, RequestTimer};
use crate::state::AppState;

/// GET /api/v1/threads/{thread_id}/messages - Full message sequence, oldest
/// first. An unknown thread yields an empty list.
pub async fn get_messages(
    State(state): State<AppState>,
    Path(thread_id): Path<String>,
) -> Result<Json<ApiResponse<Vec<Message>>>, AppError> {
    let timer = RequestTimer::start();
    let thread_id = parse_thread_id(&thread_id)?;

    let messages = state.sessions.history(&thread_id).await?;

    Ok(Json(timer.success(messages).with_link(
        "self",
        &format!("/api/v1/threads/{thread_id}/messages"),
    )))
}
