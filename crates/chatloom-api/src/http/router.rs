//! Axum router configuration with middleware.
//!
//! All routes are under `/api/v1/`.
//! Middleware: CORS, tracing.

use axum::Router;
use axum::routing::{get, post};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::http::handlers;
use crate::state::AppState;

/// Build the complete API router with all routes and middleware.
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api_routes = Router::new()
        .route("/modes", get(handlers::mode::list_modes))
        // Threads (user-scoped)
        .route(
            "/users/{user_id}/threads",
            get(handlers::thread::list_threads)
                .post(handlers::thread::start_thread)
                .delete(handlers::thread::delete_all_threads),
        )
        .route(
            "/users/{user_id}/threads/{thread_id}",
            get(handlers::thread::get_thread).delete(handlers::thread::delete_thread),
        )
        .route(
            "/users/{user_id}/threads/{thread_id}/turns",
            post(handlers::thread::post_turn),
        )
        // Messages
        .route(
            "/threads/{thread_id}/messages",
            get(handlers::message::get_messages),
        );

    Router::new()
        .nest("/api/v1", api_routes)
        .route("/health", get(health_check))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// GET /health - Liveness check.
async fn health_check() -> axum::Json<serde_json::Value> {
    axum::Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
