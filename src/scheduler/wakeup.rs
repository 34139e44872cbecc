//! Single-shot wake-up timer

use std::time::Duration;

use tokio::{runtime::Handle, task::JoinHandle};

struct Pending {
    generation: u64,
    handle: JoinHandle<()>,
}

/// At most one pending wake-up at any time.
///
/// Arming cancels whatever was pending. Each arm gets a generation number so
/// a wake-up that raced with a newer arm can be recognised and ignored.
#[derive(Default)]
pub struct Wakeup {
    generation: u64,
    pending: Option<Pending>,
}

impl Wakeup {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces any pending wake-up with one that calls `fire` after `delay`.
    pub fn arm<F>(&mut self, runtime: &Handle, delay: Duration, fire: F) -> u64
    where
        F: FnOnce(u64) + Send + 'static,
    {
        self.cancel();
        self.generation += 1;
        let generation = self.generation;
        let handle = runtime.spawn(async move {
            tokio::time::sleep(delay).await;
            fire(generation);
        });
        self.pending = Some(Pending { generation, handle });
        generation
    }

    /// Aborts the pending wake-up. Returns true if one was pending.
    pub fn cancel(&mut self) -> bool {
        match self.pending.take() {
            Some(pending) => {
                pending.handle.abort();
                true
            }
            None => false,
        }
    }

    /// Called from a firing wake-up: clears it if it is still the current
    /// one. Returns false for stale generations.
    pub fn claim(&mut self, generation: u64) -> bool {
        match &self.pending {
            Some(pending) if pending.generation == generation => {
                self.pending = None;
                true
            }
            _ => false,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }
}

impl Drop for Wakeup {
    fn drop(&mut self) {
        self.cancel();
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    };

    use super::*;

    #[tokio::test(start_paused = true)]
    async fn rearming_replaces_the_pending_wakeup() {
        let fired = Arc::new(AtomicU64::new(0));
        let mut wakeup = Wakeup::new();
        let runtime = Handle::current();

        for _ in 0..3 {
            let fired = Arc::clone(&fired);
            wakeup.arm(&runtime, Duration::from_millis(500), move |generation| {
                fired.store(generation, Ordering::SeqCst);
            });
        }
        assert!(wakeup.is_pending());

        tokio::time::sleep(Duration::from_millis(600)).await;
        // only the last arm survives
        assert_eq!(fired.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_prevents_firing() {
        let fired = Arc::new(AtomicU64::new(0));
        let mut wakeup = Wakeup::new();
        let f = Arc::clone(&fired);
        wakeup.arm(&Handle::current(), Duration::from_millis(100), move |g| {
            f.store(g, Ordering::SeqCst);
        });
        assert!(wakeup.cancel());
        assert!(!wakeup.is_pending());
        assert!(!wakeup.cancel());

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn claim_ignores_stale_generations() {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_time()
            .build()
            .unwrap();
        let mut wakeup = Wakeup::new();
        let first = wakeup.arm(runtime.handle(), Duration::from_secs(60), |_| {});
        let second = wakeup.arm(runtime.handle(), Duration::from_secs(60), |_| {});
        assert!(!wakeup.claim(first));
        assert!(wakeup.is_pending());
        assert!(wakeup.claim(second));
        assert!(!wakeup.is_pending());
    }
}
