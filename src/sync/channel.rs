//! Cross-process Update/Query protocol

use std::sync::Arc;

use tracing::{debug, info, warn};

use super::{Frame, Signal, SignalKind, Transport};
use crate::{
    error::Result,
    observer::{Listener, StateChanged},
    state::{AppState, Mode},
};

/// Announces local mutations and reacts to peers' signals.
///
/// Signals never carry state. An Update only means "re-read storage", which
/// makes duplicate or reordered delivery harmless.
pub struct SyncChannel {
    origin: String,
    transport: Arc<dyn Transport>,
    answers_queries: bool,
}

impl SyncChannel {
    /// `answers_queries` should be true for exactly one process per device
    /// so a Query yields a single Update.
    pub fn new(origin: impl Into<String>, transport: Arc<dyn Transport>, answers_queries: bool) -> Self {
        Self {
            origin: origin.into(),
            transport,
            answers_queries,
        }
    }

    pub fn origin(&self) -> &str {
        &self.origin
    }

    pub fn answers_queries(&self) -> bool {
        self.answers_queries
    }

    fn send(&self, signal: Signal) -> Result<()> {
        debug!("Sending {} via {}", signal, self.transport.name());
        self.transport.send(&Frame::new(self.origin.clone(), signal))
    }

    pub fn broadcast_update(&self, mode: Mode) -> Result<()> {
        self.send(Signal::update(mode))
    }

    /// Asks the authoritative process to broadcast its current state.
    pub fn send_query(&self, mode: Mode) -> Result<()> {
        self.send(Signal::query(mode))
    }

    /// Applies one received frame to `app`.
    pub fn handle(&self, frame: &Frame, app: &AppState) -> Result<()> {
        if frame.origin == self.origin {
            return Ok(());
        }
        let mode = frame.signal.mode;
        debug!("Received {} from {}", frame.signal, frame.origin);

        match frame.signal.kind {
            SignalKind::Query if self.answers_queries => self.answer_query(mode, app),
            SignalKind::Query => Ok(()),
            SignalKind::Update => self.apply_update(mode, app),
        }
    }

    /// Makes sure storage holds our current state, then announces it.
    fn answer_query(&self, mode: Mode, app: &AppState) -> Result<()> {
        let current = app.keeper(mode).snapshot();
        let stored = match app.persistence().try_load(mode) {
            Ok(stored) => stored,
            Err(e) => {
                warn!("Failed to read {} state while answering query: {}", mode, e);
                None
            }
        };
        if stored.as_ref() != Some(&current) {
            if let Err(e) = app.persistence().save(&current) {
                warn!("Failed to store {} state for query reply: {}", mode, e);
            }
        }
        info!("Answering {} query from peer", mode);
        self.broadcast_update(mode)
    }

    /// Re-reads storage and mirrors it locally.
    fn apply_update(&self, mode: Mode, app: &AppState) -> Result<()> {
        match app.persistence().try_load(mode)? {
            Some(state) => {
                app.keeper(mode).restore(state);
            }
            None => debug!("Update for {} but nothing stored yet", mode),
        }
        Ok(())
    }
}

impl std::fmt::Debug for SyncChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncChannel")
            .field("origin", &self.origin)
            .field("transport", &self.transport.name())
            .field("answers_queries", &self.answers_queries)
            .finish()
    }
}

impl Listener for SyncChannel {
    fn on_state_changed(&self, event: &StateChanged) -> Result<()> {
        if !event.cause.is_mutation() {
            return Ok(());
        }
        self.broadcast_update(event.mode)
    }

    fn name(&self) -> &'static str {
        "sync"
    }
}
