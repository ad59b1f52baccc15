//! Target selection over the nation table.
//!
//! - **Cure target**: the non-exporting nation with the most zombies. The
//!   choice is memoized and only recomputed once the cached target drops
//!   below a zombie threshold (or stops qualifying), so a clearly dominant
//!   target is handed out without scanning the table on every request.
//! - **Extermination target**: a uniformly random exporter with more than
//!   one zombie, preferring exporters that have not sent a horde within
//!   the inactivity window.

use std::collections::BTreeMap;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use rand::seq::IndexedRandom;
use zday_types::{NEVER_ACTIVE, NationName, Record};

use crate::memo::Memo;
use crate::table::NationTable;

/// Which selection query was asked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Query {
    /// Where to fire cure missiles.
    Cure,
    /// Whose zombies to exterminate.
    Exterminate,
}

impl core::fmt::Display for Query {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Cure => f.write_str("cure"),
            Self::Exterminate => f.write_str("exterminate"),
        }
    }
}

/// Errors from a selection query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum SelectError {
    /// No tracked nation qualifies right now.
    #[error("no candidates for {query} target yet")]
    NoCandidates {
        /// The query that came up empty.
        query: Query,
    },
}

/// Answers the two selection queries against a shared table.
#[derive(Debug)]
pub struct Selector {
    table: NationTable,
    cure_threshold: i64,
    inactivity_window: Duration,
    cure: Mutex<Memo<NationName>>,
}

impl Selector {
    /// Create a selector over `table`.
    pub const fn new(table: NationTable, cure_threshold: i64, inactivity_window: Duration) -> Self {
        Self {
            table,
            cure_threshold,
            inactivity_window,
            cure: Mutex::new(Memo::new()),
        }
    }

    /// The non-exporting nation with the most zombies.
    ///
    /// Returns the cached target while it is still tracked, still not
    /// exporting, and still has at least the threshold number of zombies.
    ///
    /// # Errors
    ///
    /// Returns [`SelectError::NoCandidates`] if no tracked nation is
    /// non-exporting.
    pub async fn cure_target(&self) -> Result<Record, SelectError> {
        let threshold = self.cure_threshold;
        self.table
            .read_with(|map| {
                let mut memo = self.cure.lock().unwrap_or_else(PoisonError::into_inner);
                memo.resolve(
                    |name| {
                        map.get(name)
                            .is_some_and(|r| !r.is_export && r.zombies >= threshold)
                    },
                    || best_cure_candidate(map),
                )
                .and_then(|name| map.get(name))
                .cloned()
            })
            .await
            .ok_or(SelectError::NoCandidates { query: Query::Cure })
    }

    /// How many full scans the cure query has performed.
    pub fn cure_recomputations(&self) -> u64 {
        self.cure
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .recomputations()
    }

    /// A random exporter with more than one zombie, preferring idle ones.
    ///
    /// # Errors
    ///
    /// Returns [`SelectError::NoCandidates`] if no exporter has more than
    /// one zombie.
    pub async fn exterminate_target(&self) -> Result<Record, SelectError> {
        self.exterminate_target_at(Utc::now()).await
    }

    /// [`Selector::exterminate_target`] evaluated as of `now`.
    ///
    /// # Errors
    ///
    /// See [`Selector::exterminate_target`].
    pub async fn exterminate_target_at(&self, now: DateTime<Utc>) -> Result<Record, SelectError> {
        let idle_before = TimeDelta::from_std(self.inactivity_window)
            .ok()
            .and_then(|window| now.checked_sub_signed(window))
            .unwrap_or(NEVER_ACTIVE);

        self.table
            .read_with(|map| {
                let exporters: Vec<&Record> = map
                    .values()
                    .filter(|r| r.is_export && r.zombies > 1)
                    .collect();
                let idle: Vec<&Record> = exporters
                    .iter()
                    .copied()
                    .filter(|r| r.last_active_at < idle_before)
                    .collect();
                let pool = if idle.is_empty() { exporters } else { idle };

                pool.choose(&mut rand::rng()).map(|r| (*r).clone())
            })
            .await
            .ok_or(SelectError::NoCandidates {
                query: Query::Exterminate,
            })
    }
}

/// Full scan for the non-exporting nation with the most zombies.
///
/// Ties go to the alphabetically last name (`max_by_key` keeps the last
/// maximum in iteration order).
fn best_cure_candidate(map: &BTreeMap<NationName, Record>) -> Option<NationName> {
    map.values()
        .filter(|r| !r.is_export)
        .max_by_key(|r| r.zombies)
        .map(|r| r.name.clone())
}
