//! Query server startup helper for embedding in the engine.
//!
//! Provides [`spawn_observer`], which binds the listening socket eagerly
//! (so a taken port fails startup instead of a background task) and then
//! serves on a background Tokio task until shutdown.

use std::sync::Arc;

use tokio::task::JoinHandle;
use zday_core::shutdown::ShutdownSignal;

use crate::server::{self, ServerConfig, ServerError};
use crate::state::AppState;

/// Errors that can occur when spawning the query server.
#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    /// The server failed to bind or start.
    #[error("server start error: {0}")]
    Server(#[from] ServerError),
}

/// Spawn the query server on a background Tokio task.
///
/// The returned handle completes after `shutdown` is triggered and
/// in-flight requests have drained.
///
/// # Errors
///
/// Returns [`StartupError::Server`] if the address cannot be bound.
pub async fn spawn_observer(
    config: &ServerConfig,
    state: Arc<AppState>,
    shutdown: ShutdownSignal,
) -> Result<JoinHandle<()>, StartupError> {
    let listener = server::bind(config).await?;

    let handle = tokio::spawn(async move {
        if let Err(e) = server::serve(listener, state, shutdown).await {
            tracing::error!(error = %e, "Query server exited with error");
        }
    });

    tracing::info!(host = %config.host, port = config.port, "Query server spawned on background task");

    Ok(handle)
}
