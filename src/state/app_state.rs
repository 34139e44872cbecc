//! Main application state management

use std::{
    sync::{Arc, Mutex},
    time::Instant,
};

use chrono::{DateTime, Utc};
use tracing::{info, warn};

use super::{Mode, TimeKeeper, TimeState};
use crate::{
    clock::{ClockSource, Millis},
    config::Config,
    error::Result,
    persistence::{PersistenceBridge, SnapshotStore},
    sync::SyncChannel,
};

/// Process context: both clocks plus the components listening to them.
///
/// Listener order on each keeper is persistence first, then sync, then any
/// refresh schedulers, so peers that react to an Update read the new state.
#[derive(Debug)]
pub struct AppState {
    pub stopwatch: Arc<TimeKeeper>,
    pub timer: Arc<TimeKeeper>,
    persistence: Arc<PersistenceBridge>,
    sync: Option<Arc<SyncChannel>>,
    /// Server metadata
    pub start_time: Instant,
    pub port: u16,
    pub host: String,
    pub node: String,
    pub subseconds: bool,
    /// Last action tracking
    pub last_action: Mutex<Option<String>>,
    pub last_action_time: Mutex<Option<DateTime<Utc>>>,
}

impl AppState {
    /// Restores both clocks from `store` and wires persistence.
    pub fn new(config: &Config, clock: Arc<dyn ClockSource>, store: Arc<dyn SnapshotStore>) -> Self {
        let persistence = Arc::new(PersistenceBridge::new(store, Arc::clone(&clock)));

        let stopwatch = persistence.load(Mode::Stopwatch);
        let timer = persistence.load_or(TimeState::timer(config.timer_duration_ms()));
        info!(
            "Restored stopwatch={} timer={}",
            stopwatch.time_string(clock.now_ms(), true),
            timer.time_string(clock.now_ms(), true)
        );

        let stopwatch = Arc::new(TimeKeeper::new(stopwatch, Arc::clone(&clock), config.expiry));
        let timer = Arc::new(TimeKeeper::new(timer, clock, config.expiry));
        stopwatch.subscribe(&persistence);
        timer.subscribe(&persistence);

        Self {
            stopwatch,
            timer,
            persistence,
            sync: None,
            start_time: Instant::now(),
            port: config.port,
            host: config.host.clone(),
            node: config.node.clone(),
            subseconds: config.subseconds,
            last_action: Mutex::new(None),
            last_action_time: Mutex::new(None),
        }
    }

    /// Announces every mutation through `sync`.
    pub fn with_sync(mut self, sync: Arc<SyncChannel>) -> Self {
        self.stopwatch.subscribe(&sync);
        self.timer.subscribe(&sync);
        self.sync = Some(sync);
        self
    }

    pub fn keeper(&self, mode: Mode) -> &Arc<TimeKeeper> {
        match mode {
            Mode::Stopwatch => &self.stopwatch,
            Mode::Timer => &self.timer,
        }
    }

    pub fn persistence(&self) -> &PersistenceBridge {
        &self.persistence
    }

    pub fn sync(&self) -> Option<&Arc<SyncChannel>> {
        self.sync.as_ref()
    }

    fn record_action(&self, action: String) {
        if let Ok(mut last_action) = self.last_action.lock() {
            *last_action = Some(action);
        }
        if let Ok(mut last_time) = self.last_action_time.lock() {
            *last_time = Some(Utc::now());
        }
    }

    /// User pressed start/pause.
    pub fn toggle(&self, mode: Mode) -> TimeState {
        self.record_action(format!("{}-toggle", mode));
        self.keeper(mode).toggle()
    }

    pub fn start(&self, mode: Mode) -> TimeState {
        self.record_action(format!("{}-start", mode));
        self.keeper(mode).start()
    }

    pub fn pause(&self, mode: Mode) -> TimeState {
        self.record_action(format!("{}-pause", mode));
        self.keeper(mode).pause()
    }

    /// User pressed reset.
    pub fn reset(&self, mode: Mode) -> TimeState {
        self.record_action(format!("{}-reset", mode));
        self.keeper(mode).reset()
    }

    pub fn set_timer_duration(&self, duration: Millis) -> TimeState {
        self.record_action("timer-duration".to_string());
        self.timer.set_duration(duration)
    }

    /// Asks peers for a fresh Update. Returns false when sync is disabled.
    pub fn query(&self, mode: Mode) -> Result<bool> {
        match &self.sync {
            Some(sync) => {
                sync.send_query(mode)?;
                Ok(true)
            }
            None => {
                warn!("Query for {} requested but sync is disabled", mode);
                Ok(false)
            }
        }
    }

    /// Calculate server uptime as a formatted string
    pub fn get_uptime(&self) -> String {
        let duration = self.start_time.elapsed();
        let hours = duration.as_secs() / 3600;
        let minutes = (duration.as_secs() % 3600) / 60;
        let seconds = duration.as_secs() % 60;

        if hours > 0 {
            format!("{}h {}m {}s", hours, minutes, seconds)
        } else if minutes > 0 {
            format!("{}m {}s", minutes, seconds)
        } else {
            format!("{}s", seconds)
        }
    }

    /// Get last action information
    pub fn get_last_action(&self) -> (Option<String>, Option<DateTime<Utc>>) {
        let last_action = self.last_action.lock().ok().and_then(|a| a.clone());
        let last_action_time = self.last_action_time.lock().ok().and_then(|t| *t);
        (last_action, last_action_time)
    }
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::*;
    use crate::{clock::ManualClock, persistence::MemoryStore};

    fn config(args: &[&str]) -> Config {
        Config::parse_from(std::iter::once("tickwatch").chain(args.iter().copied()))
    }

    #[test]
    fn fresh_start_uses_configured_timer_duration() {
        let clock = Arc::new(ManualClock::new(0));
        let state = AppState::new(&config(&["--timer", "2"]), clock, Arc::new(MemoryStore::new()));
        assert_eq!(state.timer.snapshot(), TimeState::timer(120_000));
        assert_eq!(state.stopwatch.snapshot(), TimeState::stopwatch());
    }

    #[test]
    fn mutations_survive_a_restart() {
        let clock = Arc::new(ManualClock::new(1_000));
        let store = Arc::new(MemoryStore::new());
        let first = AppState::new(&config(&[]), clock.clone(), store.clone());
        first.toggle(Mode::Stopwatch);
        clock.advance(2_000);
        first.toggle(Mode::Stopwatch);
        first.toggle(Mode::Timer);
        drop(first);

        let second = AppState::new(&config(&[]), clock.clone(), store);
        let stopwatch = second.stopwatch.snapshot();
        assert!(!stopwatch.running);
        assert_eq!(stopwatch.prior_elapsed, 2_000);
        assert!(second.timer.is_running());
    }

    #[test]
    fn tracks_last_action() {
        let state = AppState::new(
            &config(&[]),
            Arc::new(ManualClock::new(0)),
            Arc::new(MemoryStore::new()),
        );
        assert_eq!(state.get_last_action(), (None, None));
        state.reset(Mode::Timer);
        let (action, time) = state.get_last_action();
        assert_eq!(action.as_deref(), Some("timer-reset"));
        assert!(time.is_some());
        assert!(!state.query(Mode::Timer).unwrap());
    }
}
