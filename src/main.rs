//! Command Center — entry point.
//!
//! Loads configuration, initialises structured logging, launches the two
//! background fetches, serves the snapshot to the dashboard, and logs each
//! published bundle until Ctrl+C.

use anyhow::Result;
use std::sync::Arc;
use tracing::{info, warn};

use command_center::config::AppConfig;
use command_center::dashboard;
use command_center::engine::controller::{RetryPolicy, SnapshotController};
use command_center::feed::http::HttpFeed;
use command_center::feed::SnapshotFeed;

const CONFIG_PATH: &str = "config.toml";

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (non-fatal if missing)
    let _ = dotenv::dotenv();

    let cfg = AppConfig::load_or_default(CONFIG_PATH)?;

    init_logging();

    info!(
        base_url = %cfg.api.base_url,
        timeout_secs = cfg.api.timeout_secs,
        max_retries = cfg.api.max_retries,
        "Command Center starting up"
    );

    // -- Initialise components -------------------------------------------

    let feed = HttpFeed::new(&cfg.api)?;
    info!(feed = feed.name(), "Snapshot feed ready");

    let controller = Arc::new(SnapshotController::new(
        Arc::new(feed),
        RetryPolicy::from(&cfg.api),
    ));

    if cfg.dashboard.enabled {
        dashboard::spawn_dashboard(Arc::clone(&controller), cfg.dashboard.port).await?;
    } else {
        warn!("Dashboard disabled; snapshot is only logged");
    }

    controller.start();

    // -- Main loop -------------------------------------------------------

    let mut updates = controller.subscribe();
    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            changed = updates.changed() => {
                if changed.is_err() {
                    break;
                }
                let bundle = updates.borrow_and_update().clone();
                info!(
                    revision = bundle.revision,
                    phase = %bundle.phase,
                    points = bundle.points.len(),
                    leaders = bundle.leaders.len(),
                    quadrants = ?bundle.quadrant_counts(),
                    sentiment_feed = ?bundle.sentiment_feed,
                    grid_feed = ?bundle.grid_feed,
                    "Snapshot published"
                );
            }
            _ = &mut shutdown => {
                info!("Shutdown signal received.");
                break;
            }
        }
    }

    controller.shutdown();
    info!(final_state = %controller.snapshot(), "Command Center shut down cleanly.");

    Ok(())
}

/// Initialise the `tracing` subscriber.
fn init_logging() {
    use tracing_subscriber::{fmt, EnvFilter};

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("command_center=info"));

    let json_logging = std::env::var("COMMAND_CENTER_LOG_JSON").is_ok();

    if json_logging {
        fmt()
            .json()
            .with_env_filter(env_filter)
            .with_target(true)
            .with_thread_ids(true)
            .init();
    } else {
        fmt()
            .with_env_filter(env_filter)
            .with_target(true)
            .init();
    }
}
