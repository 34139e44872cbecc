//! # Listener trait.
//!
//! Implemented by anything that reacts to [`StateChanged`] events: the
//! persistence bridge, the sync channel and every refresh scheduler.
//!
//! ## Rules
//! - Called synchronously on the thread that mutated the state.
//! - Must not block; hand slow work to a task.
//! - Errors and panics are caught by the bus and logged as listener faults.

use super::StateChanged;
use crate::error::Result;

pub trait Listener: Send + Sync + 'static {
    /// Handles one state change.
    fn on_state_changed(&self, event: &StateChanged) -> Result<()>;

    /// Name used in logs when this listener faults.
    ///
    /// The default uses `type_name::<Self>()`, which can be verbose.
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}
