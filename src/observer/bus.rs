//! # Synchronous observer bus.
//!
//! [`ObserverBus`] fans a [`StateChanged`] event out to every registered
//! [`Listener`] before the mutating call returns.
//!
//! ```text
//!   TimeKeeper::toggle()
//!        │
//!        └── notify_all(&event) ──► persistence ──► sync ──► scheduler 1 ──► scheduler N
//!                                   (subscription order, caller's thread)
//! ```
//!
//! ## Rules
//! - The bus only holds `Weak` references; owners keep listeners alive.
//! - The listener set is snapshotted before each pass. A listener removed
//!   during the pass is skipped for the rest of it.
//! - A failing or panicking listener is logged and skipped; the others still
//!   run.
//! - The registry lock is not held while a listener runs, so listeners may
//!   subscribe or unsubscribe during a pass.

use std::{
    panic::{catch_unwind, AssertUnwindSafe},
    sync::{Arc, Mutex, MutexGuard, PoisonError, Weak},
};

use tracing::{debug, error, warn};

use super::{Listener, StateChanged};
use crate::error::Error;

/// Handle returned by [`ObserverBus::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

struct Entry {
    id: ListenerId,
    name: &'static str,
    listener: Weak<dyn Listener>,
}

#[derive(Default)]
struct Registry {
    next_id: u64,
    entries: Vec<Entry>,
}

#[derive(Default)]
pub struct ObserverBus {
    registry: Mutex<Registry>,
}

impl ObserverBus {
    pub fn new() -> Self {
        Self::default()
    }

    fn registry(&self) -> MutexGuard<'_, Registry> {
        self.registry.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Registers a listener without taking ownership of it.
    pub fn subscribe<L: Listener>(&self, listener: &Arc<L>) -> ListenerId {
        let name = listener.name();
        let listener: Arc<dyn Listener> = listener.clone();
        let mut registry = self.registry();
        registry.next_id += 1;
        let id = ListenerId(registry.next_id);
        registry.entries.push(Entry {
            id,
            name,
            listener: Arc::downgrade(&listener),
        });
        debug!("Listener '{}' subscribed as {:?}", name, id);
        id
    }

    /// Removes a listener. Returns false if it was not subscribed.
    pub fn unsubscribe(&self, id: ListenerId) -> bool {
        let mut registry = self.registry();
        let before = registry.entries.len();
        registry.entries.retain(|entry| entry.id != id);
        registry.entries.len() != before
    }

    pub fn is_subscribed(&self, id: ListenerId) -> bool {
        self.registry().entries.iter().any(|entry| entry.id == id)
    }

    pub fn len(&self) -> usize {
        self.registry().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Delivers `event` to every current listener, in subscription order.
    ///
    /// Returns the number of listeners that handled the event successfully.
    pub fn notify_all(&self, event: &StateChanged) -> usize {
        let snapshot: Vec<(ListenerId, &'static str, Weak<dyn Listener>)> = self
            .registry()
            .entries
            .iter()
            .map(|entry| (entry.id, entry.name, entry.listener.clone()))
            .collect();

        let mut delivered = 0;
        for (id, name, weak) in snapshot {
            if !self.is_subscribed(id) {
                continue;
            }
            let Some(listener) = weak.upgrade() else {
                debug!("Listener '{}' was dropped, pruning", name);
                self.unsubscribe(id);
                continue;
            };

            match catch_unwind(AssertUnwindSafe(|| listener.on_state_changed(event))) {
                Ok(Ok(())) => delivered += 1,
                Ok(Err(e)) => {
                    warn!(
                        listener = name,
                        label = e.as_label(),
                        "Listener fault on {} {:?}: {}",
                        event.mode,
                        event.cause,
                        e
                    );
                }
                Err(panic) => {
                    let reason = panic
                        .downcast_ref::<&str>()
                        .map(|s| s.to_string())
                        .or_else(|| panic.downcast_ref::<String>().cloned())
                        .unwrap_or_else(|| "unknown panic".to_string());
                    let fault = Error::ListenerFault { listener: name, reason };
                    error!(
                        label = fault.as_label(),
                        "Panic on {} {:?}: {}", event.mode, event.cause, fault
                    );
                }
            }
        }
        delivered
    }
}

impl std::fmt::Debug for ObserverBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObserverBus")
            .field("listeners", &self.len())
            .finish()
    }
}
