//! API response structures

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    clock::Millis,
    state::{Mode, Phase, TimeKeeper},
};

/// Snapshot of one clock as seen by the control API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClockView {
    pub mode: Mode,
    pub phase: Phase,
    pub running: bool,
    pub reset: bool,
    pub display: String,
    pub elapsed_ms: Millis,
    pub remaining_ms: Option<Millis>,
    pub duration_ms: Option<Millis>,
    pub visible: bool,
}

impl ClockView {
    pub fn capture(keeper: &TimeKeeper, subseconds: bool) -> Self {
        let now = keeper.now_ms();
        let state = keeper.snapshot();
        Self {
            mode: state.mode,
            phase: state.phase(now),
            running: state.running,
            reset: state.reset,
            display: state.time_string(now, subseconds),
            elapsed_ms: state.elapsed(now),
            remaining_ms: state.remaining(now),
            duration_ms: (state.mode == Mode::Timer).then_some(state.duration),
            visible: keeper.is_visible(),
        }
    }
}

/// API response structure for state change endpoints
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse {
    pub status: String,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    pub clock: ClockView,
}

impl ApiResponse {
    pub fn new(message: String, clock: ClockView) -> Self {
        Self {
            status: "ok".to_string(),
            message,
            timestamp: Utc::now(),
            clock,
        }
    }
}

/// Status of both clocks plus server metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusResponse {
    pub stopwatch: ClockView,
    pub timer: ClockView,
    pub uptime: String,
    pub port: u16,
    pub host: String,
    pub node: String,
    pub sync_enabled: bool,
    pub last_action: Option<String>,
    pub last_action_time: Option<DateTime<Utc>>,
}

/// Result of asking peers for a fresh update
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryResponse {
    pub mode: Mode,
    pub sent: bool,
    pub timestamp: DateTime<Utc>,
}

/// Body of `POST /clock/timer/duration`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DurationRequest {
    pub seconds: u64,
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: DateTime<Utc>,
    pub version: String,
}

impl HealthResponse {
    /// Create a new health response
    pub fn ok() -> Self {
        Self {
            status: "ok".to_string(),
            timestamp: Utc::now(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}
