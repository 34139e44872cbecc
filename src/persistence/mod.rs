//! Durable state module
//!
//! Snapshots of each mode are written on every mutation and read back at
//! process start or when a peer announces a change.

pub mod bridge;
pub mod snapshot;
pub mod store;

pub use bridge::PersistenceBridge;
pub use snapshot::Snapshot;
pub use store::{FileStore, MemoryStore, SnapshotStore};
