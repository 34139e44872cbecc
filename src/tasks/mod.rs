//! Background tasks module
//!
//! This module contains background tasks that run alongside the HTTP server.

pub mod sync_listener;
pub mod timer_expiry;

// Re-export main functions
pub use sync_listener::sync_listener_task;
pub use timer_expiry::timer_expiry_task;
