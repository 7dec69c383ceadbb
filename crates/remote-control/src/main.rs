//! TV Remote client entry point.
//!
//! Wires the HTTP client factory into the connection controller, pumps
//! controller events into the log, and drives one session from the command
//! line: connect to the address given as the first argument (falling back to
//! the last-used address from the config file), then wait for Ctrl-C.
//!
//! # Architecture
//!
//! ```text
//! main()
//!  └─ load_config()              -- TOML config, defaults on first run
//!  └─ HttpClientFactory          -- shared reqwest pool, per-exchange timeout
//!  └─ ConnectionController::new  -- state machine + event channel
//!  └─ event pump (Tokio task)    -- ConnectionEvent -> log lines
//!  └─ ui_bridge::connect(...)    -- start the session
//!  └─ ctrl_c().await             -- clean disconnect on shutdown
//! ```
//!
//! A graphical shell would replace the event pump and the Ctrl-C wait with
//! its own loop; everything it needs is behind `infrastructure::ui_bridge`.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use remote_control::application::connection::{ConnectionController, ConnectionEvent, ControllerConfig};
use remote_control::infrastructure::http::HttpClientFactory;
use remote_control::infrastructure::storage::{load_config, save_config};
use remote_control::infrastructure::ui_bridge::{self, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration first: it carries the default log level.
    let config = load_config().unwrap_or_default();

    // Initialise structured logging.  Level is overridden by `RUST_LOG`.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config.app.log_level.clone())),
        )
        .init();

    info!("TV Remote client starting");

    let factory = Arc::new(
        HttpClientFactory::new(Duration::from_secs(config.remote.request_timeout_secs))
            .context("failed to build HTTP client")?,
    );
    let controller_config = ControllerConfig {
        port: config.remote.port,
        poll_interval: Duration::from_secs(config.remote.poll_interval_secs),
    };
    let (controller, mut events) = ConnectionController::new(factory, controller_config);
    let state = AppState::new(Arc::clone(&controller));

    // ── Event pump ────────────────────────────────────────────────────────────
    tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            match event {
                ConnectionEvent::Connecting { address } => info!("connecting to {address}..."),
                ConnectionEvent::Connected { address } => info!("connected to {address}"),
                ConnectionEvent::ConnectFailed { reason } => warn!("connect failed: {reason}"),
                ConnectionEvent::Disconnected => info!("disconnected"),
                ConnectionEvent::ConnectionLost { reason } => {
                    warn!("connection lost: {reason}")
                }
                ConnectionEvent::CommandFailed { label, reason } => {
                    warn!("{label} failed: {reason}")
                }
            }
        }
    });

    // ── Connect ───────────────────────────────────────────────────────────────
    let address = std::env::args()
        .nth(1)
        .or_else(|| config.app.last_address.clone());
    let Some(address) = address else {
        anyhow::bail!("usage: tv-remote <server-address>");
    };

    let result = ui_bridge::connect(&state, &address).await;
    if result.success {
        // Remember the address for the next start.
        let mut updated = config.clone();
        updated.app.last_address = Some(address.clone());
        if let Err(e) = save_config(&updated) {
            warn!("could not persist config: {e}");
        }
    } else if let Some(error) = result.error {
        warn!("connect rejected: {error}");
    }

    info!("TV Remote client ready.  Press Ctrl-C to exit.");
    tokio::signal::ctrl_c().await?;

    ui_bridge::disconnect(&state).await;
    info!("TV Remote client stopped");
    Ok(())
}
