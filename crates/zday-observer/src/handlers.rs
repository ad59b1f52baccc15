//! Endpoint handlers for the query server.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET` | `/` | Minimal HTML status page |
//! | `GET` | `/cure` | `303` to the current cure target |
//! | `GET` | `/exterminate` | `303` to an extermination target |
//! | `GET` | `/api/nations` | List tracked nations (filterable) |
//! | `GET` | `/api/nations/{name}` | Single tracked nation |

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::response::{Html, IntoResponse, Redirect};
use tracing::info;
use zday_types::{NationName, Record};

use crate::error::ObserverError;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Query parameter structs
// ---------------------------------------------------------------------------

/// Query parameters for the `GET /api/nations` endpoint.
#[derive(Debug, Default, serde::Deserialize)]
pub struct NationsQuery {
    /// Keep only exporting (`true`) or non-exporting (`false`) nations.
    pub exporting: Option<bool>,
    /// Keep only nations inside (`true`) or outside (`false`) the region.
    pub in_region: Option<bool>,
}

impl NationsQuery {
    fn matches(&self, record: &Record) -> bool {
        self.exporting.is_none_or(|want| record.is_export == want)
            && self.in_region.is_none_or(|want| record.in_region == want)
    }
}

// ---------------------------------------------------------------------------
// GET / -- minimal HTML status page
// ---------------------------------------------------------------------------

/// Serve a minimal HTML page showing tracker status and links.
pub async fn index(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let (tracked, exporting, in_region) = state
        .table
        .read_with(|map| {
            map.values().fold((0_usize, 0_usize, 0_usize), |(t, e, r), rec| {
                (
                    t.saturating_add(1),
                    e.saturating_add(usize::from(rec.is_export)),
                    r.saturating_add(usize::from(rec.in_region)),
                )
            })
        })
        .await;
    let region = escape(state.region.as_str());
    let feed = escape(&state.feed_state().to_string());

    Html(format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="utf-8">
    <title>Z-Day Tracker</title>
    <style>
        body {{ font-family: sans-serif; margin: 2rem auto; max-width: 40rem; }}
        .metric {{ display: inline-block; margin-right: 2rem; }}
        .value {{ font-size: 2rem; color: #8b0000; }}
        li {{ margin: 0.25rem 0; }}
    </style>
</head>
<body>
    <h1>Z-Day Tracker</h1>
    <p>Region: {region}</p>
    <p>Happenings feed: {feed}</p>

    <div>
        <div class="metric">
            <div class="label">Tracked</div>
            <div class="value">{tracked}</div>
        </div>
        <div class="metric">
            <div class="label">Exporting</div>
            <div class="value">{exporting}</div>
        </div>
        <div class="metric">
            <div class="label">In region</div>
            <div class="value">{in_region}</div>
        </div>
    </div>

    <h2>Targets</h2>
    <ul>
        <li><a href="/cure">/cure</a>: largest non-exporting horde</li>
        <li><a href="/exterminate">/exterminate</a>: a quiet exporter</li>
    </ul>

    <h2>API</h2>
    <ul>
        <li><a href="/api/nations">/api/nations</a>: tracked nations, filter with ?exporting= and ?in_region=</li>
        <li>/api/nations/{{name}}: one nation</li>
    </ul>
</body>
</html>"#
    ))
}

/// Minimal HTML text escaping.
fn escape(raw: &str) -> String {
    raw.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

// ---------------------------------------------------------------------------
// GET /cure, GET /exterminate -- target redirects
// ---------------------------------------------------------------------------

/// Redirect to the nation most in need of cure missiles.
///
/// # Errors
///
/// Returns [`ObserverError::Select`] (`503`) if no nation qualifies yet.
pub async fn cure(State(state): State<Arc<AppState>>) -> Result<Redirect, ObserverError> {
    let target = state.selector.cure_target().await?;
    info!(nation = %target.name, zombies = target.zombies, "Cure target served");
    Ok(Redirect::to(&state.nation_url(&target.name)))
}

/// Redirect to an exporter whose zombies should be exterminated.
///
/// # Errors
///
/// Returns [`ObserverError::Select`] (`503`) if no exporter qualifies yet.
pub async fn exterminate(State(state): State<Arc<AppState>>) -> Result<Redirect, ObserverError> {
    let target = state.selector.exterminate_target().await?;
    info!(nation = %target.name, zombies = target.zombies, "Extermination target served");
    Ok(Redirect::to(&state.nation_url(&target.name)))
}

// ---------------------------------------------------------------------------
// GET /api/nations -- tracked nations
// ---------------------------------------------------------------------------

/// List tracked nations ordered by name, optionally filtered.
pub async fn list_nations(
    State(state): State<Arc<AppState>>,
    Query(query): Query<NationsQuery>,
) -> Json<Vec<Record>> {
    let records = state
        .table
        .read_with(|map| {
            map.values()
                .filter(|record| query.matches(record))
                .cloned()
                .collect()
        })
        .await;
    Json(records)
}

/// Return a single tracked nation.
///
/// # Errors
///
/// Returns [`ObserverError::NotFound`] if the nation is not tracked.
pub async fn get_nation(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> Result<Json<Record>, ObserverError> {
    let nation = NationName::new(&name);
    state
        .table
        .get(&nation)
        .await
        .map(Json)
        .ok_or_else(|| ObserverError::NotFound(format!("nation {nation} is not tracked")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escapes_markup() {
        assert_eq!(escape("<b>&\"x\""), "&lt;b&gt;&amp;&quot;x&quot;");
    }
}
