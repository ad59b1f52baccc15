//! HTTP client for the `NationStates` API.
//!
//! Every request carries the configured `User-Agent` (the API refuses
//! anonymous clients) and requests are spaced at least
//! `min_request_interval` apart across all callers, so the ingestion and
//! sync loops share one rate budget.

use std::time::Duration;

use reqwest::{StatusCode, Url};
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::debug;
use zday_core::config::ApiConfig;
use zday_core::source::{NationSource, SourceError};
use zday_types::{Happening, NationName, RegionName, ZombieStatus};

use crate::error::ClientError;
use crate::xml;

/// Per-request timeout. A hung request would otherwise stall a loop forever.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// A rate-limited `NationStates` API client.
#[derive(Debug)]
pub struct NationStatesClient {
    http: reqwest::Client,
    base_url: Url,
    min_interval: Duration,
    last_request: Mutex<Option<Instant>>,
}

impl NationStatesClient {
    /// Build a client from API settings.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::BaseUrl`] if `base_url` does not parse and
    /// [`ClientError::Build`] if the HTTP client cannot be constructed.
    pub fn new(config: &ApiConfig) -> Result<Self, ClientError> {
        let base_url = Url::parse(&config.base_url).map_err(|e| ClientError::BaseUrl {
            url: config.base_url.clone(),
            reason: e.to_string(),
        })?;
        let http = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Self {
            http,
            base_url,
            min_interval: config.min_request_interval(),
            last_request: Mutex::new(None),
        })
    }

    /// Wait until the next request slot is free and claim it.
    async fn throttle(&self) {
        let mut last = self.last_request.lock().await;
        if let Some(next) = last.and_then(|previous| previous.checked_add(self.min_interval)) {
            tokio::time::sleep_until(next).await;
        }
        *last = Some(Instant::now());
    }

    /// Issue one GET. `Ok(None)` means the API answered 404.
    async fn get(&self, query: &[(&str, &str)]) -> Result<Option<String>, SourceError> {
        self.throttle().await;
        debug!(?query, "NationStates API request");

        let response = self
            .http
            .get(self.base_url.clone())
            .query(query)
            .send()
            .await
            .map_err(|e| SourceError::Upstream(format!("request failed: {e}")))?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get(reqwest::header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .unwrap_or("unknown");
            return Err(SourceError::Upstream(format!(
                "rate limited by NationStates (retry after {retry_after}s)"
            )));
        }
        if !status.is_success() {
            return Err(SourceError::Upstream(format!(
                "NationStates returned {status}"
            )));
        }

        response
            .text()
            .await
            .map(Some)
            .map_err(|e| SourceError::Upstream(format!("failed to read response body: {e}")))
    }

    async fn nation_shard(&self, nation: &NationName, shard: &str) -> Result<String, SourceError> {
        self.get(&[("nation", nation.as_str()), ("q", shard)])
            .await?
            .ok_or_else(|| SourceError::NotFound(nation.clone()))
    }
}

fn malformed(what: &str, e: &impl std::fmt::Display) -> SourceError {
    SourceError::Upstream(format!("malformed {what} response: {e}"))
}

impl NationSource for NationStatesClient {
    async fn happenings(
        &self,
        region: &RegionName,
        since_id: Option<u64>,
    ) -> Result<Vec<Happening>, SourceError> {
        let view = format!("region.{region}");
        let since = since_id.map(|id| id.to_string());
        let mut query = vec![("q", "happenings"), ("view", view.as_str())];
        if let Some(since) = &since {
            query.push(("sinceid", since.as_str()));
        }

        let body = self
            .get(&query)
            .await?
            .ok_or_else(|| SourceError::Upstream(format!("happenings for {region} not found")))?;
        xml::happenings(&body).map_err(|e| malformed("happenings", &e))
    }

    async fn region_nations(&self, region: &RegionName) -> Result<Vec<NationName>, SourceError> {
        let body = self
            .get(&[("region", region.as_str()), ("q", "nations")])
            .await?
            .ok_or_else(|| SourceError::Upstream(format!("region {region} not found")))?;
        xml::region_nations(&body).map_err(|e| malformed("region nations", &e))
    }

    async fn nation_region(&self, nation: &NationName) -> Result<RegionName, SourceError> {
        let body = self.nation_shard(nation, "region").await?;
        xml::nation_region(&body).map_err(|e| malformed("nation region", &e))
    }

    async fn nation_zombie(&self, nation: &NationName) -> Result<ZombieStatus, SourceError> {
        let body = self.nation_shard(nation, "zombie").await?;
        xml::zombie_status(&body).map_err(|e| malformed("nation zombie", &e))
    }
}
