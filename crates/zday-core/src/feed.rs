//! The happenings ingestion loop.
//!
//! [`HappeningFeed`] polls the region's happenings at a fixed interval and
//! hands each new happening, in id order, to the [`Reconciler`]. A nation
//! that vanished upstream only costs the happening that referenced it;
//! any other failure ends the run so the supervisor can reconnect.
//!
//! Reconnecting starts from the head of the feed again. Happenings that
//! arrived while the loop was down are not replayed.

use std::time::Duration;

use serde::Serialize;
use tokio::sync::watch;
use tracing::{debug, info, warn};
use zday_types::Happening;

use crate::reconcile::Reconciler;
use crate::source::{NationSource, SourceError};
use crate::supervisor::Supervised;

/// Connection state of the happenings feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum FeedState {
    /// Fetching the head of the feed to position the cursor.
    Connecting,
    /// Polling for happenings newer than `cursor`.
    Streaming {
        /// Id of the newest happening seen.
        cursor: u64,
    },
    /// The last run ended with an error; waiting for the supervisor.
    Faulted,
}

impl core::fmt::Display for FeedState {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Connecting => f.write_str("connecting"),
            Self::Streaming { cursor } => write!(f, "streaming (cursor {cursor})"),
            Self::Faulted => f.write_str("faulted"),
        }
    }
}

/// Polls the happenings feed and applies each happening.
#[derive(Debug)]
pub struct HappeningFeed<S> {
    reconciler: Reconciler<S>,
    poll_interval: Duration,
    state: watch::Sender<FeedState>,
}

impl<S: NationSource> HappeningFeed<S> {
    /// Create a feed polling every `poll_interval`.
    pub fn new(reconciler: Reconciler<S>, poll_interval: Duration) -> Self {
        let (state, _) = watch::channel(FeedState::Connecting);
        Self {
            reconciler,
            poll_interval,
            state,
        }
    }

    /// Subscribe to feed state changes.
    pub fn subscribe(&self) -> watch::Receiver<FeedState> {
        self.state.subscribe()
    }

    /// The current feed state.
    pub fn state(&self) -> FeedState {
        *self.state.borrow()
    }

    fn set_state(&self, state: FeedState) {
        let previous = self.state.send_replace(state);
        // Cursor advances are not transitions.
        if std::mem::discriminant(&previous) != std::mem::discriminant(&state) {
            info!(from = %previous, to = %state, "Happenings feed state changed");
        }
    }

    /// Connect and stream until an unrecoverable error.
    ///
    /// # Errors
    ///
    /// Returns the first [`SourceError::Upstream`] from polling the feed or
    /// from a snapshot a happening required.
    pub async fn run_once(&self) -> Result<(), SourceError> {
        self.set_state(FeedState::Connecting);
        let result = self.stream().await;
        if result.is_err() {
            self.set_state(FeedState::Faulted);
        }
        result
    }

    async fn stream(&self) -> Result<(), SourceError> {
        let source = self.reconciler.fetcher().source();
        let region = self.reconciler.region();

        let head = source.happenings(region, None).await?;
        let mut cursor = head.iter().map(|h| h.id).max().unwrap_or(0);
        self.set_state(FeedState::Streaming { cursor });
        info!(region = %region, cursor, "Subscribed to region happenings");

        loop {
            tokio::time::sleep(self.poll_interval).await;

            let mut batch = source.happenings(region, Some(cursor)).await?;
            batch.retain(|h| h.id > cursor);
            batch.sort_by_key(|h| h.id);

            for happening in &batch {
                self.process(happening).await?;
                cursor = cursor.max(happening.id);
                self.set_state(FeedState::Streaming { cursor });
            }
        }
    }

    async fn process(&self, happening: &Happening) -> Result<(), SourceError> {
        match self.reconciler.apply_happening(happening).await {
            Ok(applied) => {
                debug!(id = happening.id, ?applied, "Happening processed");
                Ok(())
            }
            Err(SourceError::NotFound(nation)) => {
                warn!(
                    id = happening.id,
                    nation = %nation,
                    "Happening references a nation that no longer exists, skipping"
                );
                Ok(())
            }
            Err(e) => Err(e),
        }
    }
}

impl<S: NationSource> Supervised for HappeningFeed<S> {
    type Error = SourceError;

    fn name(&self) -> &'static str {
        "happenings"
    }

    async fn run(&self) -> Result<(), SourceError> {
        self.run_once().await
    }
}
