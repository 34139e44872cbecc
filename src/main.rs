//! Tickwatch - a persistent stopwatch and countdown timer
//!
//! This is the main entry point for the tickwatch application.

use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{info, warn};

use tickwatch::{
    api::create_router,
    clock::{ClockSource, SystemClock},
    config::Config,
    display::ConsoleSurface,
    persistence::{FileStore, SnapshotStore},
    scheduler::bind_surface,
    state::{AppState, Mode},
    sync::{SyncChannel, UdpTransport},
    tasks::{sync_listener_task, timer_expiry_task},
    utils::shutdown_signal,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::parse();

    // Initialize tracing with appropriate log level
    tracing_subscriber::fmt()
        .with_env_filter(format!("tickwatch={},tower_http=info", config.log_level()))
        .init();

    info!("Starting tickwatch server v{}", env!("CARGO_PKG_VERSION"));
    info!(
        "Configuration: host={}, port={}, node={}, role={:?}, timer={}min, expiry={:?}",
        config.host, config.port, config.node, config.role, config.timer, config.expiry
    );

    let clock: Arc<dyn ClockSource> = Arc::new(SystemClock);
    let store: Arc<dyn SnapshotStore> = Arc::new(FileStore::new(&config.data_dir));
    info!("Persisting clock state under {}", config.data_dir.display());

    let mut state = AppState::new(&config, clock, store);

    // Wire the companion sync channel when a bind address was given
    let mut sync_inbox = None;
    if let Some(bind) = config.sync_bind {
        let (transport, inbox) = UdpTransport::bind(bind, config.peers.clone()).await?;
        let sync = Arc::new(SyncChannel::new(
            config.node.clone(),
            transport,
            config.role.answers_queries(),
        ));
        state = state.with_sync(Arc::clone(&sync));
        sync_inbox = Some((sync, inbox));
    }
    let state = Arc::new(state);

    if let Some((sync, inbox)) = sync_inbox {
        let listener_state = Arc::clone(&state);
        let listener_sync = Arc::clone(&sync);
        tokio::spawn(async move {
            sync_listener_task(listener_sync, inbox, listener_state).await;
        });

        if !sync.answers_queries() {
            for mode in Mode::ALL {
                if let Err(e) = sync.send_query(mode) {
                    warn!("Failed to query {} state from peers: {}", mode, e);
                }
            }
        }
    }

    // Start the countdown expiry background task
    let timer = Arc::clone(&state.timer);
    tokio::spawn(async move {
        timer_expiry_task(timer).await;
    });

    // Terminal surfaces live as long as main
    let mut surfaces = Vec::new();
    if config.display {
        for mode in Mode::ALL {
            let surface = Arc::new(ConsoleSurface::new(mode.as_str()));
            let scheduler = bind_surface(&surface, Arc::clone(state.keeper(mode)), config.subseconds)?;
            surfaces.push((surface, scheduler));
        }
    }

    // Create HTTP router with all endpoints
    let app = create_router(Arc::clone(&state));

    // Bind to the specified address
    let addr = config.address();
    let listener = TcpListener::bind(&addr).await?;

    info!("Server running on http://{}", addr);
    info!("Endpoints:");
    info!("  POST /clock/:mode/toggle   - Start or pause a clock");
    info!("  POST /clock/:mode/start    - Start a clock");
    info!("  POST /clock/:mode/pause    - Pause a clock");
    info!("  POST /clock/:mode/reset    - Reset a clock");
    info!("  POST /clock/:mode/query    - Ask peers for the latest state");
    info!("  POST /clock/timer/duration - Set the countdown duration");
    info!("  GET  /clock/:mode          - Current view of one clock");
    info!("  GET  /status               - Both clocks and server info");
    info!("  GET  /health               - Health check");

    // Setup graceful shutdown
    let server = axum::serve(listener, app);

    tokio::select! {
        result = server => {
            if let Err(e) = result {
                tracing::error!("Server error: {}", e);
            }
        }
        _ = shutdown_signal() => {
            info!("Shutdown signal received");
        }
    }

    for (surface, _scheduler) in &surfaces {
        surface.close();
    }
    drop(surfaces);

    info!("Server shutdown complete");
    Ok(())
}
