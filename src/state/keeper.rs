//! Owner of one mode's clock state

use std::{
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc, Mutex, MutexGuard, PoisonError,
    },
    time::Duration,
};

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tracing::{debug, info};

use super::{Mode, Phase, TimeState};
use crate::{
    clock::{ClockSource, Millis},
    observer::{Cause, Listener, ListenerId, ObserverBus, StateChanged},
};

/// What happens when a running countdown reaches zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ExpiryPolicy {
    /// Keep accumulating; the display holds at zero
    #[default]
    Hold,
    /// Pause the timer exactly at its duration
    Stop,
}

/// Explicitly constructed owner of one mode's [`TimeState`].
///
/// All mutations go through here: the state is updated under the lock, the
/// lock is released, and the [`ObserverBus`] is notified before the call
/// returns. Mutations are serialized with their notifications, so listeners
/// and watchers see states in the order they were applied. Listeners may read
/// the keeper but must not mutate it.
pub struct TimeKeeper {
    mode: Mode,
    state: Mutex<TimeState>,
    /// Held from before a mutation until its listeners have run
    publishing: Mutex<()>,
    clock: Arc<dyn ClockSource>,
    bus: ObserverBus,
    /// Number of surfaces currently showing this clock
    visible_surfaces: AtomicUsize,
    expiry: ExpiryPolicy,
    /// Latest state for async watchers
    state_tx: watch::Sender<TimeState>,
}

impl std::fmt::Debug for TimeKeeper {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TimeKeeper")
            .field("mode", &self.mode)
            .field("state", &*self.lock())
            .field("bus", &self.bus)
            .field("visible_surfaces", &self.visible_surfaces)
            .field("expiry", &self.expiry)
            .finish()
    }
}

impl TimeKeeper {
    pub fn new(initial: TimeState, clock: Arc<dyn ClockSource>, expiry: ExpiryPolicy) -> Self {
        let initial = initial.normalized();
        let (state_tx, _) = watch::channel(initial.clone());
        Self {
            mode: initial.mode,
            state: Mutex::new(initial),
            publishing: Mutex::new(()),
            clock,
            bus: ObserverBus::new(),
            visible_surfaces: AtomicUsize::new(0),
            expiry,
            state_tx,
        }
    }

    fn lock(&self) -> MutexGuard<'_, TimeState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Applies `updater`; when it reports a cause, listeners are notified
    /// with the new state before this returns. `None` means "no change".
    fn update<F>(&self, updater: F) -> Option<TimeState>
    where
        F: FnOnce(&mut TimeState, Millis) -> Option<Cause>,
    {
        let _publishing = self.publishing.lock().unwrap_or_else(PoisonError::into_inner);
        let now = self.clock.now_ms();
        let mut state = self.lock();
        let cause = updater(&mut state, now);
        let new_state = state.clone();
        drop(state); // listeners may read the keeper

        match cause {
            Some(cause) => {
                info!("{} {:?}: {}", self.mode, cause, new_state.time_string(now, true));
                self.publish(cause, new_state.clone());
                Some(new_state)
            }
            None => {
                debug!("{} update ignored, state unchanged", self.mode);
                None
            }
        }
    }

    fn publish(&self, cause: Cause, state: TimeState) {
        self.state_tx.send_replace(state.clone());
        self.bus.notify_all(&StateChanged {
            mode: self.mode,
            cause,
            state,
        });
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn expiry_policy(&self) -> ExpiryPolicy {
        self.expiry
    }

    pub fn now_ms(&self) -> Millis {
        self.clock.now_ms()
    }

    /// Consistent copy of every state field.
    pub fn snapshot(&self) -> TimeState {
        self.lock().clone()
    }

    pub fn is_running(&self) -> bool {
        self.lock().running
    }

    pub fn phase(&self) -> Phase {
        let now = self.clock.now_ms();
        self.lock().phase(now)
    }

    pub fn time_string(&self, subseconds: bool) -> String {
        let now = self.clock.now_ms();
        self.lock().time_string(now, subseconds)
    }

    pub fn start(&self) -> TimeState {
        self.update(|state, now| state.start(now).then_some(Cause::Started))
            .unwrap_or_else(|| self.snapshot())
    }

    pub fn pause(&self) -> TimeState {
        self.update(|state, now| state.pause(now).then_some(Cause::Paused))
            .unwrap_or_else(|| self.snapshot())
    }

    /// Click: pause if running, otherwise start.
    pub fn toggle(&self) -> TimeState {
        self.update(|state, now| {
            if state.toggle(now) {
                Some(Cause::Started)
            } else {
                Some(Cause::Paused)
            }
        })
        .unwrap_or_else(|| self.snapshot())
    }

    /// Always notifies, even when already reset.
    pub fn reset(&self) -> TimeState {
        self.update(|state, _| {
            state.reset();
            Some(Cause::Reset)
        })
        .unwrap_or_else(|| self.snapshot())
    }

    pub fn set_duration(&self, duration: Millis) -> TimeState {
        self.update(|state, _| {
            state.set_duration(duration);
            Some(Cause::DurationSet)
        })
        .unwrap_or_else(|| self.snapshot())
    }

    /// Replaces the state with one read from durable storage.
    pub fn restore(&self, restored: TimeState) -> TimeState {
        let restored = restored.normalized();
        self.update(move |state, _| {
            if *state == restored {
                return None;
            }
            *state = restored;
            Some(Cause::Restored)
        })
        .unwrap_or_else(|| self.snapshot())
    }

    /// Applies [`ExpiryPolicy::Stop`] if the countdown has reached zero.
    /// Returns true if the timer was stopped by this call.
    pub fn expire_if_due(&self) -> bool {
        if self.expiry != ExpiryPolicy::Stop {
            return false;
        }
        self.update(|state, now| {
            if state.due_in(now) == Some(0) {
                state.expire();
                Some(Cause::Expired)
            } else {
                None
            }
        })
        .is_some()
    }

    /// Time until a running countdown must be stopped, if the policy cares.
    pub fn expiry_due_in(&self, state: &TimeState) -> Option<Duration> {
        if self.expiry != ExpiryPolicy::Stop {
            return None;
        }
        state
            .due_in(self.clock.now_ms())
            .map(|ms| Duration::from_millis(ms.max(0) as u64))
    }

    /// Records a surface showing or hiding this clock.
    pub fn mark_visible(&self, visible: bool) {
        if visible {
            self.visible_surfaces.fetch_add(1, Ordering::SeqCst);
        } else {
            self.release_visible();
        }
        let _publishing = self.publishing.lock().unwrap_or_else(PoisonError::into_inner);
        self.publish(Cause::Visibility, self.snapshot());
    }

    /// Drops one visible surface without notifying. Used on teardown paths
    /// that may run inside a notification pass.
    pub fn release_visible(&self) {
        let _ = self
            .visible_surfaces
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1));
    }

    /// Whether any surface currently wants second-granularity updates.
    pub fn is_visible(&self) -> bool {
        self.visible_surfaces.load(Ordering::SeqCst) > 0
    }

    pub fn subscribe<L: Listener>(&self, listener: &Arc<L>) -> ListenerId {
        self.bus.subscribe(listener)
    }

    pub fn unsubscribe(&self, id: ListenerId) -> bool {
        self.bus.unsubscribe(id)
    }

    pub fn watch(&self) -> watch::Receiver<TimeState> {
        self.state_tx.subscribe()
    }
}
