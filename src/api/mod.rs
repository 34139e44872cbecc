//! HTTP API module
//!
//! The control surface of the process: user actions (toggle, reset) come in
//! here and clock views go out.

pub mod handlers;
pub mod responses;

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::state::AppState;
use handlers::*;

/// Create the HTTP router with all endpoints
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/status", get(status_handler))
        .route("/health", get(health_handler))
        .route("/clock/:mode", get(clock_handler))
        .route("/clock/:mode/toggle", post(toggle_handler))
        .route("/clock/:mode/start", post(start_handler))
        .route("/clock/:mode/pause", post(pause_handler))
        .route("/clock/:mode/reset", post(reset_handler))
        .route("/clock/:mode/query", post(query_handler))
        .route("/clock/:mode/duration", post(duration_handler))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
