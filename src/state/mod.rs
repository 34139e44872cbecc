//! State management module
//!
//! This module contains the per-mode clock state machine, its owner and the
//! process-wide application state.

pub mod app_state;
pub mod keeper;
pub mod mode;
pub mod time_state;

// Re-export main types
pub use app_state::AppState;
pub use keeper::{ExpiryPolicy, TimeKeeper};
pub use mode::Mode;
pub use time_state::{format_elapsed, Phase, TimeState};
