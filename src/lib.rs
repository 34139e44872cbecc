//! Tickwatch - a persistent stopwatch and countdown timer
//!
//! Two independent clocks (stopwatch and timer) whose state survives process
//! restarts and is mirrored to a companion process over a small signal
//! protocol. Visible surfaces are refreshed once per wall-clock second.

pub mod api;
pub mod clock;
pub mod config;
pub mod display;
pub mod error;
pub mod observer;
pub mod persistence;
pub mod scheduler;
pub mod state;
pub mod sync;
pub mod tasks;
pub mod utils;

// Re-export commonly used types
pub use api::create_router;
pub use clock::{ClockSource, ManualClock, Millis, SystemClock};
pub use config::Config;
pub use error::{Error, Result};
pub use state::{AppState, Mode, TimeKeeper, TimeState};
pub use utils::signals::shutdown_signal;
