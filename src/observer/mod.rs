//! In-process observer bus
//!
//! State mutations are published as [`StateChanged`] events and delivered
//! synchronously to registered [`Listener`]s.

pub mod bus;
pub mod event;
pub mod listener;

pub use bus::{ListenerId, ObserverBus};
pub use event::{Cause, StateChanged};
pub use listener::Listener;
