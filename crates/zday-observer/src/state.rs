//! Shared application state for the query server.
//!
//! [`AppState`] holds handles onto the tracker's live state: the nation
//! table, the selector over it, and the ingestion loop's feed state. The
//! server only reads through these handles.

use tokio::sync::watch;
use zday_core::feed::FeedState;
use zday_core::select::Selector;
use zday_core::table::NationTable;
use zday_types::{NationName, RegionName};

/// State shared by every request handler.
#[derive(Debug)]
pub struct AppState {
    /// The tracked nations.
    pub table: NationTable,
    /// Target selection over [`AppState::table`].
    pub selector: Selector,
    /// Latest state of the happenings feed.
    pub feed: watch::Receiver<FeedState>,
    /// The tracked region.
    pub region: RegionName,
    /// Prefix that a nation name is appended to for its page URL.
    pub nation_url_base: String,
}

impl AppState {
    /// Bundle the tracker handles the server reads from.
    pub const fn new(
        table: NationTable,
        selector: Selector,
        feed: watch::Receiver<FeedState>,
        region: RegionName,
        nation_url_base: String,
    ) -> Self {
        Self {
            table,
            selector,
            feed,
            region,
            nation_url_base,
        }
    }

    /// Canonical page URL for `nation`.
    pub fn nation_url(&self, nation: &NationName) -> String {
        format!("{}{nation}", self.nation_url_base)
    }

    /// The feed state as of now.
    pub fn feed_state(&self) -> FeedState {
        *self.feed.borrow()
    }
}
