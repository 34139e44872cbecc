//! Bridge between keepers and durable storage

use std::sync::Arc;

use tracing::{debug, warn};

use super::{Snapshot, SnapshotStore};
use crate::{
    clock::ClockSource,
    error::Result,
    observer::{Listener, StateChanged},
    state::{Mode, TimeState},
};

/// Saves every mutation and restores state at startup.
///
/// Failure policy: a failed load yields the fallback (reset) state, a failed
/// save is reported to the caller (the observer bus logs it) and the next
/// mutation naturally tries again.
pub struct PersistenceBridge {
    store: Arc<dyn SnapshotStore>,
    clock: Arc<dyn ClockSource>,
}

impl PersistenceBridge {
    pub fn new(store: Arc<dyn SnapshotStore>, clock: Arc<dyn ClockSource>) -> Self {
        Self { store, clock }
    }

    pub fn save(&self, state: &TimeState) -> Result<()> {
        let snapshot = Snapshot::capture(state, self.clock.now_ms());
        self.store.write(&state.mode.namespace(), &snapshot)
    }

    /// Reads the stored state, if any. Errors are returned to the caller.
    pub fn try_load(&self, mode: Mode) -> Result<Option<TimeState>> {
        Ok(self
            .store
            .read(&mode.namespace())?
            .map(|snapshot| snapshot.into_state(mode)))
    }

    /// Stored state for `mode`, or a fresh reset state.
    pub fn load(&self, mode: Mode) -> TimeState {
        self.load_or(TimeState::new(mode))
    }

    /// Stored state for `fallback.mode`, or `fallback` when nothing usable is
    /// stored.
    pub fn load_or(&self, fallback: TimeState) -> TimeState {
        let mode = fallback.mode;
        match self.try_load(mode) {
            Ok(Some(state)) => {
                debug!("Restored {} from storage", mode);
                state
            }
            Ok(None) => {
                debug!("No stored {} state, starting reset", mode);
                fallback
            }
            Err(e) => {
                warn!("Failed to load {} state, treating as reset: {}", mode, e);
                fallback
            }
        }
    }
}

impl std::fmt::Debug for PersistenceBridge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("PersistenceBridge")
    }
}

impl Listener for PersistenceBridge {
    fn on_state_changed(&self, event: &StateChanged) -> Result<()> {
        if !event.cause.is_mutation() {
            return Ok(());
        }
        self.save(&event.state)
    }

    fn name(&self) -> &'static str {
        "persistence"
    }
}

#[cfg(test)]
mod tests {
    use std::{io, path::PathBuf};

    use super::*;
    use crate::{
        clock::ManualClock,
        error::Error,
        observer::Cause,
        persistence::{FileStore, MemoryStore},
    };

    struct BrokenStore;

    impl SnapshotStore for BrokenStore {
        fn read(&self, _namespace: &str) -> Result<Option<Snapshot>> {
            Err(Error::StorageUnavailable {
                path: PathBuf::from("/nowhere"),
                source: io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
            })
        }

        fn write(&self, namespace: &str, _snapshot: &Snapshot) -> Result<()> {
            self.read(namespace).map(|_| ())
        }
    }

    fn bridge(store: Arc<dyn SnapshotStore>) -> PersistenceBridge {
        PersistenceBridge::new(store, Arc::new(ManualClock::new(50_000)))
    }

    #[test]
    fn save_then_load_is_identity() {
        let dir = tempfile::tempdir().unwrap();
        let bridge = bridge(Arc::new(FileStore::new(dir.path())));

        let mut running = TimeState::stopwatch();
        running.start(1_000);
        running.pause(2_500);
        running.start(40_000);

        let mut timer = TimeState::timer(90_000);
        timer.start(3_000);
        timer.pause(9_000);

        for state in [running, timer, TimeState::stopwatch(), TimeState::timer(5_000)] {
            bridge.save(&state).unwrap();
            assert_eq!(bridge.load(state.mode), state);
        }
    }

    #[test]
    fn missing_snapshot_loads_reset() {
        let bridge = bridge(Arc::new(MemoryStore::new()));
        assert_eq!(bridge.load(Mode::Stopwatch), TimeState::stopwatch());
        assert_eq!(bridge.load_or(TimeState::timer(7_000)), TimeState::timer(7_000));
    }

    #[test]
    fn unavailable_storage_loads_reset_and_reports_save_errors() {
        let bridge = bridge(Arc::new(BrokenStore));
        assert_eq!(bridge.load(Mode::Timer), TimeState::new(Mode::Timer));

        let err = bridge.save(&TimeState::stopwatch()).unwrap_err();
        assert_eq!(err.as_label(), "storage_unavailable");
    }

    #[test]
    fn listener_saves_mutations_only() {
        let store = Arc::new(MemoryStore::new());
        let bridge = bridge(store.clone());

        let mut state = TimeState::stopwatch();
        state.start(100);
        bridge
            .on_state_changed(&StateChanged {
                mode: Mode::Stopwatch,
                cause: Cause::Visibility,
                state: state.clone(),
            })
            .unwrap();
        assert_eq!(store.read("tickwatch.stopwatch").unwrap(), None);

        bridge
            .on_state_changed(&StateChanged {
                mode: Mode::Stopwatch,
                cause: Cause::Started,
                state: state.clone(),
            })
            .unwrap();
        let saved = store.read("tickwatch.stopwatch").unwrap().unwrap();
        assert_eq!(saved.update_timestamp, 50_000);
        assert_eq!(saved.into_state(Mode::Stopwatch), state);
    }
}
