//! Thread lifecycle HTTP handlers.
//!
//! Endpoints:
//! - GET    /api/v1/users/{user_id}/threads                     - Sidebar listing
//! - POST   /api/v1/users/{user_id}/threads                     - Start a thread
//! - DELETE /api/v1/users/{user_id}/threads                     - Delete every thread
//! - GET    /api/v1/users/{user_id}/threads/{thread_id}         - Thread metadata
//! - DELETE /api/v1/users/{user_id}/threads/{thread_id}         - Delete one thread
//! - POST   /api/v1/users/{user_id}/threads/{thread_id}/turns   - Continue a thread

use std::collections::BTreeMap;

use axum::Json;
use axum::extract::{Path, State};
use serde::{Deserialize, Serialize};

use chatloom_types::chat::{ChatMode, ThreadId, ThreadMetadata, ThreadSummary};

use super::parse_thread_id;
use crate::http::error::AppError;
use crate::http::response::{ApiResponse, RequestTimer};
use crate::state::AppState;

/// Request body for starting a thread.
#[derive(Debug, Deserialize)]
pub struct StartThreadRequest {
    pub message: String,
    /// Mode tag; the default mode when omitted.
    #[serde(default)]
    pub mode: Option<String>,
}

/// Request body for a follow-up turn. The thread's recorded mode is used
/// when `mode` is omitted.
#[derive(Debug, Deserialize)]
pub struct TurnRequest {
    pub message: String,
    #[serde(default)]
    pub mode: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct TurnResponse {
    pub thread_id: ThreadId,
    pub reply: String,
}

#[derive(Debug, Serialize)]
pub struct DeleteResponse {
    /// `false` when part of the deletion failed; see server logs.
    pub success: bool,
}

fn require_message(message: &str) -> Result<(), AppError> {
    if message.trim().is_empty() {
        return Err(AppError::Validation("message must not be empty".to_string()));
    }
    Ok(())
}

/// GET /api/v1/users/{user_id}/threads - Sidebar entries keyed by thread id.
pub async fn list_threads(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<ApiResponse<BTreeMap<ThreadId, ThreadSummary>>>, AppError> {
    let timer = RequestTimer::start();

    let sidebar = state.sessions.list_for_sidebar(&user_id).await;

    Ok(Json(
        timer
            .success(sidebar)
            .with_link("self", &format!("/api/v1/users/{user_id}/threads")),
    ))
}

/// POST /api/v1/users/{user_id}/threads - Start a thread with its first message.
pub async fn start_thread(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Json(body): Json<StartThreadRequest>,
) -> Result<Json<ApiResponse<TurnResponse>>, AppError> {
    let timer = RequestTimer::start();
    require_message(&body.message)?;

    let mode = body
        .mode
        .unwrap_or_else(|| ChatMode::default().tag().to_string());
    let (thread_id, reply) = state
        .sessions
        .start_thread(&user_id, &body.message, &mode)
        .await?;

    Ok(Json(
        timer
            .success(TurnResponse { thread_id, reply })
            .with_link("self", &format!("/api/v1/users/{user_id}/threads/{thread_id}"))
            .with_link("messages", &format!("/api/v1/threads/{thread_id}/messages")),
    ))
}

/// POST /api/v1/users/{user_id}/threads/{thread_id}/turns - Send a message on
/// an existing thread.
pub async fn post_turn(
    State(state): State<AppState>,
    Path((user_id, thread_id)): Path<(String, String)>,
    Json(body): Json<TurnRequest>,
) -> Result<Json<ApiResponse<TurnResponse>>, AppError> {
    let timer = RequestTimer::start();
    let thread_id = parse_thread_id(&thread_id)?;
    require_message(&body.message)?;

    let details = state
        .sessions
        .thread_details(&user_id, &thread_id)
        .await
        .ok_or_else(|| AppError::NotFound(format!("Thread '{thread_id}' not found")))?;

    let mode = body
        .mode
        .unwrap_or_else(|| details.chat_mode.tag().to_string());
    let reply = state
        .sessions
        .turn(&user_id, &thread_id, &body.message, &mode, false)
        .await?;

    Ok(Json(
        timer
            .success(TurnResponse { thread_id, reply })
            .with_link("messages", &format!("/api/v1/threads/{thread_id}/messages")),
    ))
}

/// GET /api/v1/users/{user_id}/threads/{thread_id} - Thread metadata.
pub async fn get_thread(
    State(state): State<AppState>,
    Path((user_id, thread_id)): Path<(String, String)>,
) -> Result<Json<ApiResponse<ThreadMetadata>>, AppError> {
    let timer = RequestTimer::start();
    let thread_id = parse_thread_id(&thread_id)?;

    let details = state
        .sessions
        .thread_details(&user_id, &thread_id)
        .await
        .ok_or_else(|| AppError::NotFound(format!("Thread '{thread_id}' not found")))?;

    Ok(Json(
        timer
            .success(details)
            .with_link("messages", &format!("/api/v1/threads/{thread_id}/messages")),
    ))
}

/// DELETE /api/v1/users/{user_id}/threads/{thread_id} - Delete one thread.
/// 404 when the user does not own the thread.
pub async fn delete_thread(
    State(state): State<AppState>,
    Path((user_id, thread_id)): Path<(String, String)>,
) -> Result<Json<ApiResponse<DeleteResponse>>, AppError> {
    let timer = RequestTimer::start();
    let thread_id = parse_thread_id(&thread_id)?;

    let success = state.sessions.delete_thread(&user_id, &thread_id).await?;

    Ok(Json(timer.success(DeleteResponse { success })))
}

/// DELETE /api/v1/users/{user_id}/threads - Delete every thread the user owns.
pub async fn delete_all_threads(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<ApiResponse<DeleteResponse>>, AppError> {
    let timer = RequestTimer::start();

    let success = state.sessions.delete_all(&user_id).await;

    Ok(Json(timer.success(DeleteResponse { success })))
}
