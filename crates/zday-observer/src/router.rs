//! Axum router construction for the query server.

use std::sync::Arc;

use axum::Router;
use axum::routing::get;
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::state::AppState;

/// Build the complete Axum router.
///
/// The router includes:
/// - `GET /` -- minimal HTML status page
/// - `GET /cure` -- redirect to the current cure target
/// - `GET /exterminate` -- redirect to an extermination target
/// - `GET /api/nations` -- list tracked nations
/// - `GET /api/nations/{name}` -- single tracked nation
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        // Status page
        .route("/", get(handlers::index))
        // Targets
        .route("/cure", get(handlers::cure))
        .route("/exterminate", get(handlers::exterminate))
        // REST API
        .route("/api/nations", get(handlers::list_nations))
        .route("/api/nations/{name}", get(handlers::get_nation))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
