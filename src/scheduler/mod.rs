//! Display refresh module
//!
//! One [`RefreshScheduler`] per surface keeps the rendered clock text fresh
//! while it is visible and running.

pub mod refresh;
pub mod surface;
pub mod wakeup;

pub use refresh::{bind_surface, RefreshScheduler};
pub use surface::Surface;
pub use wakeup::Wakeup;
