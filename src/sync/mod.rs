//! Cross-process synchronization module
//!
//! Two payload-free signals per mode keep a companion process in step:
//! `update` ("re-read storage") and `query` ("send me an update").

pub mod channel;
pub mod signal;
pub mod transport;

pub use channel::SyncChannel;
pub use signal::{Frame, Signal, SignalKind};
pub use transport::{Inbox, LoopbackBus, LoopbackTransport, Transport, UdpTransport};
