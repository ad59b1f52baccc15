//! Tracker binary for Z-Day.
//!
//! This is the composition root: it builds the one shared nation table and
//! hands it to every component, runs the two supervised background loops
//! against the `NationStates` API, serves the query surface, and persists
//! the table on the way out.
//!
//! # Startup Sequence
//!
//! 1. Initialize structured logging (tracing)
//! 2. Load configuration from `zday-config.yaml`
//! 3. Restore the nation table from the state file
//! 4. Build the `NationStates` client and the reconciler
//! 5. Spawn the supervised happenings and region sync loops
//! 6. Start the query server
//! 7. Wait for `Ctrl-C`
//! 8. Trigger shutdown and wait for the loops and server to stop
//! 9. Save the nation table

mod error;

use std::path::Path;
use std::sync::Arc;

use tracing::info;
use tracing_subscriber::EnvFilter;
use zday_core::config::TrackerConfig;
use zday_core::feed::HappeningFeed;
use zday_core::fetcher::SnapshotFetcher;
use zday_core::persist;
use zday_core::reconcile::Reconciler;
use zday_core::select::Selector;
use zday_core::shutdown::ShutdownSignal;
use zday_core::supervisor::Supervisor;
use zday_core::sync::RegionSync;
use zday_nationstates::NationStatesClient;
use zday_observer::server::ServerConfig;
use zday_observer::state::AppState;

use crate::error::EngineError;

/// Path of the configuration file, relative to the working directory.
const CONFIG_PATH: &str = "zday-config.yaml";

/// Application entry point for the tracker.
///
/// # Errors
///
/// Returns an error if any startup step fails, if waiting for `Ctrl-C`
/// fails, or if the table cannot be saved on shutdown.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. Initialize structured logging.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .init();

    info!("zday-engine starting");

    run().await?;

    info!("zday-engine shutdown complete");
    Ok(())
}

async fn run() -> Result<(), EngineError> {
    // 2. Load configuration.
    let config = TrackerConfig::load(Path::new(CONFIG_PATH))?;
    let region = config.tracker.region_name();
    info!(
        region = %region,
        poll_secs = config.tracker.happenings_poll_secs,
        sync_item_delay_ms = config.tracker.sync_item_delay_ms,
        stale_after_secs = config.tracker.stale_after_secs,
        cure_threshold = config.selection.cure_recompute_threshold,
        "Configuration loaded"
    );

    // 3. Restore the nation table.
    let state_path = Path::new(&config.persistence.state_path);
    let table = persist::load(state_path).await?;
    info!(records = table.len().await, "Nation table ready");

    // 4. Build the API client and the reconciler all writers share.
    let client = Arc::new(NationStatesClient::new(&config.api)?);
    let fetcher = SnapshotFetcher::new(client, region.clone());
    let reconciler =
        Reconciler::new(table.clone(), fetcher).with_stale_after(config.tracker.stale_after());
    info!(
        base_url = %config.api.base_url,
        min_request_interval_ms = config.api.min_request_interval_ms,
        "NationStates client ready"
    );

    // 5. Spawn the supervised background loops.
    let shutdown = ShutdownSignal::new();
    let supervisor = Supervisor::new(config.tracker.supervisor_cooldown(), shutdown.clone());

    let feed = HappeningFeed::new(reconciler.clone(), config.tracker.poll_interval());
    let feed_state = feed.subscribe();
    let feed_handle = supervisor.spawn(feed);

    let sync = RegionSync::new(reconciler, config.tracker.sync_item_delay());
    let sync_handle = supervisor.spawn(sync);
    info!("Background loops started");

    // 6. Start the query server.
    let selector = Selector::new(
        table.clone(),
        config.selection.cure_recompute_threshold,
        config.selection.inactivity_window(),
    );
    let app_state = Arc::new(AppState::new(
        table.clone(),
        selector,
        feed_state,
        region,
        config.observer.nation_url_base.clone(),
    ));
    let server_config = ServerConfig::from(&config.observer);
    let observer_handle =
        zday_observer::spawn_observer(&server_config, app_state, shutdown.clone()).await?;
    info!(port = server_config.port, "Query server started");

    // 7. Wait for Ctrl-C.
    tokio::signal::ctrl_c().await?;
    info!("Shutdown requested");

    // 8. Stop everything.
    shutdown.trigger();
    for (name, handle) in [("happenings", feed_handle), ("region-sync", sync_handle)] {
        match handle.await {
            Ok(failures) => info!(task = name, failures, "Background loop stopped"),
            Err(e) => tracing::warn!(task = name, error = %e, "Background loop panicked"),
        }
    }
    if let Err(e) = observer_handle.await {
        tracing::warn!(error = %e, "Query server task panicked");
    }

    // 9. Save the nation table.
    persist::save(&table, state_path).await?;

    Ok(())
}
