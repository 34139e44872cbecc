//! Error types shared by the state, persistence, scheduler and sync layers.
//!
//! None of these are fatal to the process: callers log them and degrade to
//! "state behaves as freshly reset" or "this surface stops updating".

use std::{io, path::PathBuf};

use thiserror::Error;

/// Errors produced by tickwatch components.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum Error {
    /// Durable storage could not be read or written.
    #[error("storage unavailable at {path:?}: {source}")]
    StorageUnavailable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A stored snapshot exists but could not be decoded.
    #[error("corrupt snapshot in {namespace}: {source}")]
    CorruptSnapshot {
        namespace: String,
        #[source]
        source: serde_json::Error,
    },

    /// An observer failed while handling a state change.
    #[error("listener '{listener}' failed: {reason}")]
    ListenerFault { listener: &'static str, reason: String },

    /// A refresh fired against a surface that has been torn down.
    #[error("surface '{surface}' is no longer alive")]
    StaleSurface { surface: String },

    /// The sync transport could not encode or send a frame.
    #[error("sync transport error: {0}")]
    Transport(String),

    /// A sync signal name did not match any known mode/kind pair.
    #[error("unknown sync signal: {0}")]
    UnknownSignal(String),

    /// A mode name did not match `stopwatch` or `timer`.
    #[error("unknown mode: {0}")]
    UnknownMode(String),

    /// A scheduler was bound outside of a Tokio runtime.
    #[error("no tokio runtime available: {0}")]
    NoRuntime(#[from] tokio::runtime::TryCurrentError),
}

impl Error {
    /// Returns a short stable label (snake_case) for use in logs.
    pub fn as_label(&self) -> &'static str {
        match self {
            Error::StorageUnavailable { .. } => "storage_unavailable",
            Error::CorruptSnapshot { .. } => "corrupt_snapshot",
            Error::ListenerFault { .. } => "listener_fault",
            Error::StaleSurface { .. } => "stale_surface",
            Error::Transport(_) => "transport",
            Error::UnknownSignal(_) => "unknown_signal",
            Error::UnknownMode(_) => "unknown_mode",
            Error::NoRuntime(_) => "no_runtime",
        }
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
