//! Integration tests for the `NationStates` client.
//!
//! Each test runs a small Axum app on a loopback port that answers like
//! the `NationStates` API, and points a real [`NationStatesClient`] at it.

#![allow(
    clippy::unwrap_used,
    clippy::unreachable,
    clippy::indexing_slicing,
    clippy::arithmetic_side_effects
)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use axum::Router;
use axum::extract::{Query, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use zday_core::config::ApiConfig;
use zday_core::source::{NationSource, SourceError};
use zday_nationstates::NationStatesClient;
use zday_types::{NationName, RegionName, ZombieAction};

const USER_AGENT: &str = "zday-tracker tests (operator: testlandia)";

#[derive(Default)]
struct Seen {
    user_agents: Vec<String>,
    queries: Vec<HashMap<String, String>>,
}

type Shared = Arc<Mutex<Seen>>;

async fn api(
    State(seen): State<Shared>,
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    {
        let mut seen = seen.lock().unwrap();
        seen.user_agents.push(
            headers
                .get(header::USER_AGENT)
                .and_then(|v| v.to_str().ok())
                .unwrap_or_default()
                .to_owned(),
        );
        seen.queries.push(params.clone());
    }

    let param = |key: &str| params.get(key).map(String::as_str);
    match (param("q"), param("nation"), param("region")) {
        (Some("region"), Some("ghost"), _) | (Some("zombie"), Some("ghost"), _) => {
            (StatusCode::NOT_FOUND, "Unknown nation").into_response()
        }
        (Some("region"), Some(nation), _) => format!(
            r#"<NATION id="{nation}"><REGION>The Communist Bloc</REGION></NATION>"#
        )
        .into_response(),
        (Some("zombie"), Some(nation), _) => format!(
            r#"<NATION id="{nation}"><ZOMBIE><ACTION>export</ACTION><ZOMBIES>1200</ZOMBIES><SURVIVORS>5</SURVIVORS><DEAD>0</DEAD></ZOMBIE></NATION>"#
        )
        .into_response(),
        (Some("nations"), _, Some("crowded")) => (
            StatusCode::TOO_MANY_REQUESTS,
            [(header::RETRY_AFTER, "12")],
            "slow down",
        )
            .into_response(),
        (Some("nations"), _, Some(region)) => format!(
            r#"<REGION id="{region}"><NATIONS>kethania:testlandia</NATIONS></REGION>"#
        )
        .into_response(),
        (Some("happenings"), _, _) => {
            let since: u64 = param("sinceid").and_then(|s| s.parse().ok()).unwrap_or(0);
            let events: String = [
                (41_u64, "@@a@@ unleashed a zombie horde upon @@b@@, infecting 3 survivors."),
                (42, "@@b@@ fired cure missiles at @@a@@, curing 1 infected."),
            ]
            .iter()
            .filter(|(id, _)| *id > since)
            .map(|(id, text)| {
                let timestamp = 1_509_000_000 + id;
                format!(
                    "<EVENT id=\"{id}\"><TIMESTAMP>{timestamp}</TIMESTAMP><TEXT><![CDATA[{text}]]></TEXT></EVENT>"
                )
            })
            .collect();
            format!("<WORLD><HAPPENINGS>{events}</HAPPENINGS></WORLD>").into_response()
        }
        _ => (StatusCode::BAD_REQUEST, "bad request").into_response(),
    }
}

async fn spawn_api(min_request_interval_ms: u64) -> (NationStatesClient, Shared) {
    let seen = Shared::default();
    let app = Router::new()
        .route("/cgi-bin/api.cgi", get(api))
        .with_state(Arc::clone(&seen));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move { axum::serve(listener, app).await });

    let config = ApiConfig {
        base_url: format!("http://{addr}/cgi-bin/api.cgi"),
        user_agent: USER_AGENT.to_owned(),
        min_request_interval_ms,
    };
    (NationStatesClient::new(&config).unwrap(), seen)
}

#[tokio::test]
async fn nation_lookups_are_parsed_and_identified() {
    let (client, seen) = spawn_api(0).await;
    let nation = NationName::new("Kethania");

    let region = client.nation_region(&nation).await.unwrap();
    let status = client.nation_zombie(&nation).await.unwrap();

    assert_eq!(region, RegionName::new("the communist bloc"));
    assert_eq!(status.action, ZombieAction::Export);
    assert_eq!(status.zombies, 1200);

    let seen = seen.lock().unwrap();
    assert!(seen.user_agents.iter().all(|ua| ua == USER_AGENT));
    assert_eq!(seen.queries[0].get("nation").unwrap(), "kethania");
}

#[tokio::test]
async fn missing_nation_is_not_found() {
    let (client, _) = spawn_api(0).await;
    let ghost = NationName::new("ghost");

    assert_eq!(
        client.nation_zombie(&ghost).await,
        Err(SourceError::NotFound(ghost.clone()))
    );
    assert!(client.nation_region(&ghost).await.unwrap_err().is_not_found());
}

#[tokio::test]
async fn region_listing_and_rate_limiting() {
    let (client, _) = spawn_api(0).await;

    let names = client
        .region_nations(&RegionName::new("the_communist_bloc"))
        .await
        .unwrap();
    assert_eq!(
        names,
        vec![NationName::new("kethania"), NationName::new("testlandia")]
    );

    let err = client
        .region_nations(&RegionName::new("crowded"))
        .await
        .unwrap_err();
    let SourceError::Upstream(message) = err else {
        unreachable!("rate limiting is an upstream failure");
    };
    assert!(message.contains("retry after 12s"));
}

#[tokio::test]
async fn happenings_honor_since_id() {
    let (client, seen) = spawn_api(0).await;
    let region = RegionName::new("the_communist_bloc");

    let head = client.happenings(&region, None).await.unwrap();
    assert_eq!(head.iter().map(|h| h.id).collect::<Vec<_>>(), vec![41, 42]);
    assert_eq!(head[0].timestamp.timestamp(), 1_509_000_041);

    let newer = client.happenings(&region, Some(41)).await.unwrap();
    assert_eq!(newer.len(), 1);
    assert_eq!(newer[0].text, "@@b@@ fired cure missiles at @@a@@, curing 1 infected.");

    let seen = seen.lock().unwrap();
    assert_eq!(seen.queries[0].get("view").unwrap(), "region.the_communist_bloc");
    assert!(!seen.queries[0].contains_key("sinceid"));
    assert_eq!(seen.queries[1].get("sinceid").unwrap(), "41");
}

#[tokio::test]
async fn requests_are_spaced_out() {
    let (client, _) = spawn_api(150).await;
    let nation = NationName::new("testlandia");

    let start = Instant::now();
    for _ in 0..3 {
        client.nation_region(&nation).await.unwrap();
    }
    assert!(start.elapsed() >= Duration::from_millis(300));
}

#[test]
fn rejects_unparseable_base_url() {
    let config = ApiConfig {
        base_url: "not a url".to_owned(),
        ..ApiConfig::default()
    };
    assert!(NationStatesClient::new(&config).is_err());
}
