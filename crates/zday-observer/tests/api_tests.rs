//! Integration tests for the query API endpoints.
//!
//! Tests use Axum's `Router` directly via `tower::ServiceExt` without
//! starting a TCP server. This validates handler logic and routing
//! without needing a live network connection.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use chrono::Utc;
use serde_json::Value;
use tokio::sync::watch;
use tower::ServiceExt;
use zday_core::feed::FeedState;
use zday_core::select::Selector;
use zday_core::shutdown::ShutdownSignal;
use zday_core::table::NationTable;
use zday_observer::router::build_router;
use zday_observer::server::ServerConfig;
use zday_observer::spawn_observer;
use zday_observer::state::AppState;
use zday_types::{NEVER_ACTIVE, NationName, Record, RegionName};

const URL_BASE: &str = "https://www.nationstates.net/nation=";

fn record(name: &str, is_export: bool, zombies: i64, in_region: bool) -> Record {
    Record {
        name: NationName::new(name),
        is_export,
        zombies,
        in_region,
        refreshed_at: Utc::now(),
        last_active_at: NEVER_ACTIVE,
    }
}

fn make_state(records: Vec<Record>, feed: FeedState) -> Arc<AppState> {
    let table = NationTable::from_records(records);
    let selector = Selector::new(table.clone(), 40, Duration::from_secs(300));
    let (_, receiver) = watch::channel(feed);
    Arc::new(AppState::new(
        table,
        selector,
        receiver,
        RegionName::new("the communist bloc"),
        URL_BASE.to_owned(),
    ))
}

fn populated() -> Arc<AppState> {
    make_state(
        vec![
            record("kethania", false, 10, true),
            record("testlandia", false, 400, true),
            record("horde", true, 900, true),
            record("drifter", true, 50, false),
        ],
        FeedState::Streaming { cursor: 42 },
    )
}

async fn get(state: Arc<AppState>, uri: &str) -> axum::response::Response {
    build_router(state)
        .oneshot(Request::get(uri).body(Body::empty()).unwrap())
        .await
        .unwrap()
}

async fn body_to_json(body: Body) -> Value {
    let bytes = axum::body::to_bytes(body, usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn location(response: &axum::response::Response) -> &str {
    response
        .headers()
        .get(header::LOCATION)
        .unwrap()
        .to_str()
        .unwrap()
}

// =========================================================================
// Tests
// =========================================================================

#[tokio::test]
async fn index_shows_region_counts_and_feed() {
    let response = get(populated(), "/").await;

    assert_eq!(response.status(), StatusCode::OK);
    let content_type = response
        .headers()
        .get("content-type")
        .unwrap()
        .to_str()
        .unwrap();
    assert!(content_type.contains("text/html"));

    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let html = String::from_utf8(bytes.to_vec()).unwrap();
    assert!(html.contains("the_communist_bloc"));
    assert!(html.contains("streaming (cursor 42)"));
    assert!(html.contains(r#"<div class="value">4</div>"#));
    assert!(html.contains(r#"<div class="value">2</div>"#));
    assert!(html.contains(r#"<div class="value">3</div>"#));
    assert!(html.contains(r#"href="/cure""#));
    assert!(html.contains(r#"href="/exterminate""#));
}

#[tokio::test]
async fn cure_redirects_to_largest_non_exporter() {
    let response = get(populated(), "/cure").await;

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), format!("{URL_BASE}testlandia"));
}

#[tokio::test]
async fn exterminate_redirects_to_an_exporter() {
    let response = get(populated(), "/exterminate").await;

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    let target = location(&response);
    assert!(
        target == format!("{URL_BASE}horde") || target == format!("{URL_BASE}drifter"),
        "unexpected target {target}"
    );
}

#[tokio::test]
async fn targets_are_unavailable_on_an_empty_table() {
    let state = make_state(Vec::new(), FeedState::Connecting);

    for uri in ["/cure", "/exterminate"] {
        let response = get(Arc::clone(&state), uri).await;
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        let json = body_to_json(response.into_body()).await;
        assert_eq!(json["status"], 503);
        assert!(json["error"].as_str().unwrap().contains("try again later"));
    }
}

#[tokio::test]
async fn list_nations_is_sorted() {
    let response = get(populated(), "/api/nations").await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_to_json(response.into_body()).await;
    let names: Vec<&str> = json
        .as_array()
        .unwrap()
        .iter()
        .map(|n| n["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["drifter", "horde", "kethania", "testlandia"]);
}

#[tokio::test]
async fn list_nations_filters() {
    let response = get(populated(), "/api/nations?exporting=true&in_region=true").await;

    let json = body_to_json(response.into_body()).await;
    let nations = json.as_array().unwrap();
    assert_eq!(nations.len(), 1);
    assert_eq!(nations[0]["name"], "horde");
    assert_eq!(nations[0]["zombies"], 900);
}

#[tokio::test]
async fn get_nation_normalizes_the_path() {
    let response = get(populated(), "/api/nations/Testlandia").await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["name"], "testlandia");
    assert_eq!(json["is_export"], false);
}

#[tokio::test]
async fn get_untracked_nation_is_404() {
    let response = get(populated(), "/api/nations/ghost").await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["status"], 404);
}

#[tokio::test]
async fn unknown_route_is_404() {
    let response = get(populated(), "/nonexistent").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn spawned_server_stops_on_shutdown() {
    let shutdown = ShutdownSignal::new();
    let config = ServerConfig {
        host: String::from("127.0.0.1"),
        port: 0,
    };
    let handle = spawn_observer(&config, populated(), shutdown.clone())
        .await
        .unwrap();

    shutdown.trigger();
    tokio::time::timeout(Duration::from_secs(5), handle)
        .await
        .unwrap()
        .unwrap();
}
