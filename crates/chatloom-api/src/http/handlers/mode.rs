//! Chat mode listing.
//!
//! Endpoints:
//! - GET /api/v1/modes - List registered modes with display labels

use axum::Json;
use axum::extract::State;
use serde::Serialize;

use chatloom_types::chat::ChatMode;

use crate::http::error::AppError;
use crate::http::response::{ApiResponse, RequestTimer};
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct ModeView {
    pub tag: &'static str,
    pub label: &'static str,
    pub default: bool,
}

/// GET /api/v1/modes - List the modes a new thread can start in.
pub async fn list_modes(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<ModeView>>>, AppError> {
    let timer = RequestTimer::start();

    let modes = state
        .sessions
        .modes()
        .iter()
        .map(|mode| ModeView {
            tag: mode.tag(),
            label: mode.label(),
            default: *mode == ChatMode::default(),
        })
        .collect();

    Ok(Json(timer.success(modes).with_link("self", "/api/v1/modes")))
}
