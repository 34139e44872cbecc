//! # Per-surface refresh scheduler.
//!
//! Keeps one surface's text current to within a second while the surface is
//! visible and its clock is running, and does nothing otherwise.
//!
//! ```text
//!   show / layout / state change ──► redraw ──► reschedule ──┐
//!                                        ▲                    │ visible && running
//!                                        │                    ▼
//!                                      fire ◄──── Wakeup (1000 - now % 1000 ms)
//! ```
//!
//! ## Rules
//! - `reschedule` is the only place a wake-up is armed; arming replaces any
//!   pending one, so there is never more than one per surface.
//! - Hiding the surface cancels the pending wake-up before returning.
//! - The surface is held weakly; once it is dropped or reports itself dead
//!   the loop stops quietly.

use std::{
    sync::{
        atomic::{AtomicBool, AtomicU64, Ordering},
        Arc, Mutex, MutexGuard, PoisonError, Weak,
    },
    time::Duration,
};

use tokio::runtime::Handle;
use tracing::{debug, info};

use super::{Surface, Wakeup};
use crate::{
    error::{Error, Result},
    observer::{Cause, Listener, ListenerId, StateChanged},
    state::TimeKeeper,
};

pub struct RefreshScheduler {
    name: String,
    surface: Weak<dyn Surface>,
    keeper: Arc<TimeKeeper>,
    subseconds: bool,
    visible: AtomicBool,
    wakeup: Mutex<Wakeup>,
    runtime: Handle,
    this: Weak<RefreshScheduler>,
    listener: Mutex<Option<ListenerId>>,
    redraws: AtomicU64,
}

impl RefreshScheduler {
    /// Associates `surface` with `keeper`. The scheduler starts hidden; call
    /// [`set_visible`](Self::set_visible) to begin refreshing.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn bind<S: Surface>(
        surface: &Arc<S>,
        keeper: Arc<TimeKeeper>,
        subseconds: bool,
    ) -> Result<Arc<Self>> {
        let runtime = Handle::try_current()?;
        let name = format!("{}/{}", keeper.mode(), surface.name());
        let surface: Arc<dyn Surface> = surface.clone();

        let scheduler = Arc::new_cyclic(|this| Self {
            name,
            surface: Arc::downgrade(&surface),
            keeper,
            subseconds,
            visible: AtomicBool::new(false),
            wakeup: Mutex::new(Wakeup::new()),
            runtime,
            this: this.clone(),
            listener: Mutex::new(None),
            redraws: AtomicU64::new(0),
        });

        let id = scheduler.keeper.subscribe(&scheduler);
        *scheduler.listener.lock().unwrap_or_else(PoisonError::into_inner) = Some(id);
        info!("Bound surface {}", scheduler.name);
        Ok(scheduler)
    }

    fn wakeup(&self) -> MutexGuard<'_, Wakeup> {
        self.wakeup.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_visible(&self) -> bool {
        self.visible.load(Ordering::SeqCst)
    }

    /// Whether a wake-up is currently outstanding.
    pub fn is_pending(&self) -> bool {
        self.wakeup().is_pending()
    }

    /// Number of frames handed to the surface so far.
    pub fn redraw_count(&self) -> u64 {
        self.redraws.load(Ordering::SeqCst)
    }

    /// Surface visibility changed. Hiding cancels synchronously.
    pub fn set_visible(&self, visible: bool) {
        let was = self.visible.swap(visible, Ordering::SeqCst);
        debug!("{} visible: {}", self.name, visible);
        if was != visible {
            self.keeper.mark_visible(visible);
        }

        if visible {
            self.trigger();
        } else if self.wakeup().cancel() {
            debug!("{} hidden, pending refresh cancelled", self.name);
        }
    }

    /// Size or layout changed. Some shells report this without a matching
    /// visibility change, so treat it as "visible now".
    pub fn on_layout_changed(&self) {
        self.set_visible(true);
    }

    /// Redraw now and decide whether to keep ticking.
    pub fn trigger(&self) {
        self.redraw();
        self.reschedule();
    }

    fn fire(&self, generation: u64) {
        if !self.wakeup().claim(generation) {
            debug!("{} dropped stale wake-up {}", self.name, generation);
            return;
        }
        self.redraw();
        self.reschedule();
    }

    fn live_surface(&self) -> Option<Arc<dyn Surface>> {
        self.surface.upgrade().filter(|surface| surface.is_alive())
    }

    fn redraw(&self) -> bool {
        let Some(surface) = self.live_surface() else {
            return false;
        };
        let text = self.keeper.time_string(self.subseconds);
        surface.render_text(&text);
        self.redraws.fetch_add(1, Ordering::SeqCst);
        true
    }

    /// The single arming path.
    fn reschedule(&self) {
        let mut wakeup = self.wakeup();

        if self.live_surface().is_none() {
            wakeup.cancel();
            let stale = Error::StaleSurface { surface: self.name.clone() };
            debug!("{}, refresh loop stopped", stale);
            return;
        }

        if self.is_visible() && self.keeper.is_running() {
            let now = self.keeper.now_ms();
            let delay = Duration::from_millis((1_000 - now.rem_euclid(1_000)) as u64);
            let this = self.this.clone();
            wakeup.arm(&self.runtime, delay, move |generation| {
                if let Some(scheduler) = this.upgrade() {
                    scheduler.fire(generation);
                }
            });
        } else if wakeup.cancel() {
            debug!("{} refresh loop idle", self.name);
        }
    }
}

impl Listener for RefreshScheduler {
    fn on_state_changed(&self, event: &StateChanged) -> Result<()> {
        // visibility events do not change the rendered text
        if event.cause != Cause::Visibility {
            self.trigger();
        }
        Ok(())
    }

    fn name(&self) -> &'static str {
        "refresh_scheduler"
    }
}

impl Drop for RefreshScheduler {
    fn drop(&mut self) {
        let listener = self.listener.get_mut().unwrap_or_else(PoisonError::into_inner);
        if let Some(id) = listener.take() {
            self.keeper.unsubscribe(id);
        }
        if self.visible.swap(false, Ordering::SeqCst) {
            self.keeper.release_visible();
        }
    }
}

/// Binds `surface` to `keeper` and shows it immediately.
pub fn bind_surface<S: Surface>(
    surface: &Arc<S>,
    keeper: Arc<TimeKeeper>,
    subseconds: bool,
) -> Result<Arc<RefreshScheduler>> {
    let scheduler = RefreshScheduler::bind(surface, keeper, subseconds)?;
    scheduler.set_visible(true);
    Ok(scheduler)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        clock::ManualClock,
        state::{ExpiryPolicy, TimeState},
    };

    struct TestSurface {
        frames: Mutex<Vec<String>>,
        alive: AtomicBool,
    }

    impl TestSurface {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                frames: Mutex::new(Vec::new()),
                alive: AtomicBool::new(true),
            })
        }

        fn frames(&self) -> Vec<String> {
            self.frames.lock().unwrap().clone()
        }
    }

    impl Surface for TestSurface {
        fn render_text(&self, text: &str) {
            self.frames.lock().unwrap().push(text.to_string());
        }

        fn is_alive(&self) -> bool {
            self.alive.load(Ordering::SeqCst)
        }

        fn name(&self) -> &str {
            "test"
        }
    }

    fn keeper() -> (Arc<ManualClock>, Arc<TimeKeeper>) {
        let clock = Arc::new(ManualClock::new(10_300));
        let keeper = Arc::new(TimeKeeper::new(
            TimeState::stopwatch(),
            clock.clone(),
            ExpiryPolicy::Hold,
        ));
        (clock, keeper)
    }

    #[tokio::test(start_paused = true)]
    async fn idle_while_not_running() {
        let (_clock, keeper) = keeper();
        let surface = TestSurface::new();
        let scheduler = bind_surface(&surface, keeper, false).unwrap();

        assert_eq!(surface.frames(), vec!["00:00:00"]);
        assert!(!scheduler.is_pending());
    }

    #[tokio::test(start_paused = true)]
    async fn hiding_cancels_the_pending_wakeup() {
        let (_clock, keeper) = keeper();
        keeper.start();
        let surface = TestSurface::new();
        let scheduler = bind_surface(&surface, keeper.clone(), false).unwrap();
        assert!(scheduler.is_pending());
        assert!(keeper.is_visible());

        scheduler.set_visible(false);
        assert!(!scheduler.is_pending());
        assert!(!keeper.is_visible());

        tokio::time::sleep(Duration::from_secs(3)).await;
        assert_eq!(surface.frames().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn wakes_at_the_top_of_the_next_second() {
        let (clock, keeper) = keeper();
        keeper.start();
        let surface = TestSurface::new();
        let scheduler = bind_surface(&surface, keeper.clone(), false).unwrap();

        // 10_300 % 1000 = 300, so the first wake-up is 700ms out
        tokio::time::sleep(Duration::from_millis(699)).await;
        assert_eq!(scheduler.redraw_count(), 1);

        clock.set(11_000);
        tokio::time::sleep(Duration::from_millis(2)).await;
        assert_eq!(scheduler.redraw_count(), 2);
        assert_eq!(surface.frames().last().unwrap(), "00:00:00");
        assert!(scheduler.is_pending());

        clock.set(12_000);
        tokio::time::sleep(Duration::from_millis(1_000)).await;
        assert_eq!(scheduler.redraw_count(), 3);
        assert_eq!(surface.frames().last().unwrap(), "00:00:01");
    }

    #[tokio::test(start_paused = true)]
    async fn repeated_triggers_keep_a_single_wakeup() {
        let (_clock, keeper) = keeper();
        keeper.start();
        let surface = TestSurface::new();
        let scheduler = bind_surface(&surface, keeper.clone(), false).unwrap();
        for _ in 0..4 {
            scheduler.trigger();
            scheduler.on_layout_changed();
        }
        let before = scheduler.redraw_count();
        assert!(scheduler.is_pending());

        tokio::time::sleep(Duration::from_millis(701)).await;
        assert_eq!(scheduler.redraw_count(), before + 1);
    }

    #[tokio::test(start_paused = true)]
    async fn state_changes_redraw_and_stop_the_loop() {
        let (clock, keeper) = keeper();
        let surface = TestSurface::new();
        let scheduler = bind_surface(&surface, keeper.clone(), true).unwrap();
        assert!(!scheduler.is_pending());

        keeper.toggle();
        assert!(scheduler.is_pending());

        clock.advance(1_250);
        keeper.toggle();
        assert!(!scheduler.is_pending());
        assert_eq!(surface.frames().last().unwrap(), "00:00:01.25");
    }

    #[tokio::test(start_paused = true)]
    async fn layout_changes_are_idempotent() {
        let (_clock, keeper) = keeper();
        let surface = TestSurface::new();
        let scheduler = RefreshScheduler::bind(&surface, keeper.clone(), false).unwrap();
        scheduler.on_layout_changed();
        scheduler.on_layout_changed();
        assert!(scheduler.is_visible());

        scheduler.set_visible(false);
        assert!(!keeper.is_visible());
    }

    #[tokio::test(start_paused = true)]
    async fn stale_surface_stops_rescheduling() {
        let (_clock, keeper) = keeper();
        keeper.start();
        let surface = TestSurface::new();
        let scheduler = bind_surface(&surface, keeper.clone(), false).unwrap();
        assert!(scheduler.is_pending());

        drop(surface);
        tokio::time::sleep(Duration::from_millis(701)).await;
        assert!(!scheduler.is_pending());
        assert_eq!(scheduler.redraw_count(), 1);

        // state changes against the dead surface are harmless
        keeper.toggle();
        assert!(!scheduler.is_pending());
    }

    #[tokio::test(start_paused = true)]
    async fn dead_surface_is_detected_via_liveness() {
        let (_clock, keeper) = keeper();
        keeper.start();
        let surface = TestSurface::new();
        let scheduler = bind_surface(&surface, keeper, false).unwrap();
        surface.alive.store(false, Ordering::SeqCst);

        scheduler.trigger();
        assert!(!scheduler.is_pending());
        assert_eq!(surface.frames().len(), 1);
    }

    #[test]
    fn binding_requires_a_runtime() {
        let (_clock, keeper) = keeper();
        let surface = TestSurface::new();
        let err = RefreshScheduler::bind(&surface, keeper, false).err().unwrap();
        assert_eq!(err.as_label(), "no_runtime");
    }
}
