//! Sync receive background task

use std::sync::Arc;

use tracing::{info, warn};

use crate::{
    state::AppState,
    sync::{Inbox, SyncChannel},
};

/// Drains the transport inbox and applies each frame to the local clocks.
///
/// Runs until every sender of the inbox is gone.
pub async fn sync_listener_task(sync: Arc<SyncChannel>, mut inbox: Inbox, state: Arc<AppState>) {
    info!("Starting sync listener task as '{}'", sync.origin());

    while let Some(frame) = inbox.recv().await {
        if let Err(e) = sync.handle(&frame, &state) {
            warn!(
                label = e.as_label(),
                "Failed to handle {} from {}: {}", frame.signal, frame.origin, e
            );
        }
    }

    info!("Sync inbox closed, listener task stopping");
}
