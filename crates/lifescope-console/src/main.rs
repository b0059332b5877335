//! Observatory console binary for the Lifescope client.
//!
//! This is the entry point that wires together configuration, the
//! synchronization session, the spatial projector, and the render
//! loop. It mirrors a remote simulation backend into a local store and
//! renders a live scene summary until interrupted.
//!
//! # Startup Sequence
//!
//! 1. Initialize structured logging (tracing)
//! 2. Load configuration from `lifescope.yaml`
//! 3. Start the synchronization session (pull lanes, push channel, dispatcher)
//! 4. Build the projector from the session seed
//! 5. Run the render loop until Ctrl-C
//! 6. Tear the render loop and the session down

mod config;
mod driver;
mod error;

use std::path::Path;
use std::time::Duration;

use lifescope_scene::Projector;
use lifescope_sync::SyncSession;
use tokio::sync::watch;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::config::ConsoleConfig;
use crate::driver::{RenderLoop, SummarySink};
use crate::error::ConsoleError;

/// Application entry point for the observatory console.
///
/// Initializes all subsystems and runs the render loop until the
/// process is interrupted.
///
/// # Errors
///
/// Returns an error if any initialization step fails.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. Initialize structured logging.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .init();

    info!("lifescope-console starting");

    // 2. Load configuration.
    let config = load_config()?;
    info!(
        rest_url = config.connection.rest_url,
        ws_url = config.connection.ws_url,
        events_limit = config.sync.events_limit,
        frame_interval_ms = config.render.frame_interval_ms,
        "Configuration loaded"
    );

    // 3. Start the synchronization session.
    let session = SyncSession::start(config.sync_config()).map_err(ConsoleError::from)?;
    info!("Synchronization session started");

    // 4. Build the projector. An unpinned seed is drawn fresh and
    //    logged so the session's scene can be reproduced.
    let seed = config.scene.seed.unwrap_or_else(rand::random::<u64>);
    let projector = Projector::new(seed);
    info!(seed, pinned = config.scene.seed.is_some(), "Projector built");

    // 5. Start the render loop.
    let sink = SummarySink::new(Duration::from_secs(config.render.summary_interval_secs));
    let render = RenderLoop::new(
        session.store().clone(),
        projector,
        Box::new(sink),
        Duration::from_millis(config.render.frame_interval_ms),
    );
    let (stop_tx, stop_rx) = watch::channel(false);
    let render_task = tokio::spawn(render.run(stop_rx));
    info!("Render loop started");

    // 6. Wait for the interrupt.
    tokio::signal::ctrl_c().await?;
    info!("Interrupt received, shutting down");

    // 7. Stop the render loop first, then the session behind it.
    let _ = stop_tx.send(true);
    if let Err(error) = render_task.await {
        warn!(error = %error, "render loop ended abnormally");
    }
    session.shutdown().await;

    info!("lifescope-console shutdown complete");
    Ok(())
}

/// Load the console configuration from `lifescope.yaml`.
///
/// Looks for the config file relative to the current working
/// directory. When the file is absent, defaults are used; the
/// `LIFESCOPE_REST_URL` / `LIFESCOPE_WS_URL` environment overrides
/// still apply.
fn load_config() -> Result<ConsoleConfig, ConsoleError> {
    let config_path = Path::new("lifescope.yaml");
    if config_path.exists() {
        let config = ConsoleConfig::from_file(config_path)?;
        Ok(config)
    } else {
        info!("Config file not found, using defaults");
        let mut config = ConsoleConfig::default();
        config.connection.apply_env_overrides();
        Ok(config)
    }
}
