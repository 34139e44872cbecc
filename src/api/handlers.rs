//! HTTP endpoint handlers

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use chrono::Utc;
use tracing::{error, info};

use super::responses::{
    ApiResponse, ClockView, DurationRequest, HealthResponse, QueryResponse, StatusResponse,
};
use crate::{
    clock::Millis,
    state::{AppState, Mode},
};

fn respond(state: &AppState, mode: Mode, message: String) -> Json<ApiResponse> {
    let clock = ClockView::capture(state.keeper(mode), state.subseconds);
    Json(ApiResponse::new(message, clock))
}

/// Handle POST /clock/:mode/toggle - start if stopped, pause if running
pub async fn toggle_handler(
    State(state): State<Arc<AppState>>,
    Path(mode): Path<Mode>,
) -> Json<ApiResponse> {
    let new_state = state.toggle(mode);
    let verb = if new_state.running { "started" } else { "paused" };
    info!("Toggle endpoint called - {} {}", mode, verb);
    respond(&state, mode, format!("{} {}", mode, verb))
}

/// Handle POST /clock/:mode/start
pub async fn start_handler(
    State(state): State<Arc<AppState>>,
    Path(mode): Path<Mode>,
) -> Json<ApiResponse> {
    state.start(mode);
    respond(&state, mode, format!("{} running", mode))
}

/// Handle POST /clock/:mode/pause
pub async fn pause_handler(
    State(state): State<Arc<AppState>>,
    Path(mode): Path<Mode>,
) -> Json<ApiResponse> {
    state.pause(mode);
    respond(&state, mode, format!("{} paused", mode))
}

/// Handle POST /clock/:mode/reset
pub async fn reset_handler(
    State(state): State<Arc<AppState>>,
    Path(mode): Path<Mode>,
) -> Json<ApiResponse> {
    state.reset(mode);
    info!("Reset endpoint called - {} cleared", mode);
    respond(&state, mode, format!("{} reset", mode))
}

/// Handle POST /clock/:mode/query - ask the authoritative peer for an update
pub async fn query_handler(
    State(state): State<Arc<AppState>>,
    Path(mode): Path<Mode>,
) -> Result<Json<QueryResponse>, StatusCode> {
    match state.query(mode) {
        Ok(sent) => Ok(Json(QueryResponse {
            mode,
            sent,
            timestamp: Utc::now(),
        })),
        Err(e) => {
            error!("Failed to send {} query: {}", mode, e);
            Err(StatusCode::BAD_GATEWAY)
        }
    }
}

/// Handle POST /clock/:mode/duration - set the countdown target (resets the timer)
pub async fn duration_handler(
    State(state): State<Arc<AppState>>,
    Path(mode): Path<Mode>,
    Json(request): Json<DurationRequest>,
) -> Result<Json<ApiResponse>, StatusCode> {
    if mode != Mode::Timer {
        return Err(StatusCode::BAD_REQUEST);
    }
    let duration = Millis::try_from(request.seconds)
        .ok()
        .and_then(|seconds| seconds.checked_mul(1_000))
        .ok_or(StatusCode::BAD_REQUEST)?;
    state.set_timer_duration(duration);
    info!("Timer duration set to {}s", request.seconds);
    Ok(respond(
        &state,
        Mode::Timer,
        format!("timer duration set to {}s", request.seconds),
    ))
}

/// Handle GET /clock/:mode - current view of one clock
pub async fn clock_handler(
    State(state): State<Arc<AppState>>,
    Path(mode): Path<Mode>,
) -> Json<ClockView> {
    Json(ClockView::capture(state.keeper(mode), state.subseconds))
}

/// Handle GET /status - Return current status of both clocks
pub async fn status_handler(State(state): State<Arc<AppState>>) -> Json<StatusResponse> {
    let (last_action, last_action_time) = state.get_last_action();

    Json(StatusResponse {
        stopwatch: ClockView::capture(&state.stopwatch, state.subseconds),
        timer: ClockView::capture(&state.timer, state.subseconds),
        uptime: state.get_uptime(),
        port: state.port,
        host: state.host.clone(),
        node: state.node.clone(),
        sync_enabled: state.sync().is_some(),
        last_action,
        last_action_time,
    })
}

/// Handle GET /health - Health check endpoint
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::ok())
}
