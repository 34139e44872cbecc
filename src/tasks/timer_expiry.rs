//! Countdown expiry background task

use std::sync::Arc;

use tokio::time::sleep;
use tracing::{debug, info};

use crate::state::{ExpiryPolicy, Mode, TimeKeeper};

/// Stops a running countdown when it reaches zero, under
/// [`ExpiryPolicy::Stop`]. Returns immediately for any other policy or mode.
pub async fn timer_expiry_task(keeper: Arc<TimeKeeper>) {
    if keeper.mode() != Mode::Timer || keeper.expiry_policy() != ExpiryPolicy::Stop {
        debug!("Timer expiry task not needed for {}", keeper.mode());
        return;
    }
    info!("Starting timer expiry task");

    let mut state_rx = keeper.watch();
    loop {
        let due_in = {
            let state = state_rx.borrow_and_update();
            keeper.expiry_due_in(&state)
        };

        match due_in {
            Some(delay) => {
                tokio::select! {
                    _ = sleep(delay) => {
                        if keeper.expire_if_due() {
                            info!("Countdown reached zero, timer stopped");
                        }
                    }
                    changed = state_rx.changed() => {
                        if changed.is_err() {
                            break;
                        }
                    }
                }
            }
            None => {
                // Not running: wait for the next change
                if state_rx.changed().await.is_err() {
                    break;
                }
            }
        }
    }

    debug!("Timer state channel closed, expiry task stopping");
}
