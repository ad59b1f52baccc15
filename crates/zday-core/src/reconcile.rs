//! Reconciliation of happenings and snapshots into the nation table.
//!
//! Two paths write to the table:
//!
//! - [`Reconciler::apply_snapshot`] replaces a record's snapshot-derived
//!   fields with a fresh authoritative fetch.
//! - [`Reconciler::apply_happening`] applies a parsed happening as a delta.
//!
//! The freshness rule ties them together: a happening only touches
//! `is_export` or `zombies` if it is strictly newer than the record's
//! `refreshed_at`. A snapshot taken after the happening already accounts
//! for it, so applying the delta again would double count.
//!
//! A tracked nation whose last refresh is older than the staleness window
//! is re-fetched before a happening touching it applies, so a busy nation
//! does not serve stale counts until the next sync cycle reaches it.
//!
//! Happenings are assumed to arrive in feed order. Two happenings for the
//! same nation within one refresh interval are applied in arrival order
//! with no further reordering protection.

use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use tracing::{debug, info};
use zday_types::{Happening, NationName, Record, RegionName, TransferKind};

use crate::fetcher::SnapshotFetcher;
use crate::happening::{self, Delta};
use crate::source::{NationSource, SourceError};
use crate::table::NationTable;

/// Default age past which a touched record is re-fetched.
pub const DEFAULT_STALE_AFTER: Duration = Duration::from_secs(300);

/// What applying a happening did to the table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applied {
    /// The happening matched neither known shape.
    Ignored,
    /// A transfer happening was applied.
    Transfer {
        /// Whether the sender's export flag was updated (fresh enough).
        export_updated: bool,
        /// Whether the recipient's zombie count was updated (fresh enough).
        zombies_updated: bool,
    },
    /// A nation left the tracked region.
    LeftRegion,
    /// A nation joined the tracked region and was refreshed.
    JoinedRegion,
    /// A relocation between two other regions.
    ForeignRelocation,
}

/// Whether a lookup found an existing record or had to fetch one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Grabbed {
    Existing,
    Refreshed,
    Fetched,
}

/// Applies snapshots and happenings to a shared [`NationTable`].
#[derive(Debug)]
pub struct Reconciler<S> {
    table: NationTable,
    fetcher: SnapshotFetcher<S>,
    stale_after: Duration,
}

impl<S> Clone for Reconciler<S> {
    fn clone(&self) -> Self {
        Self {
            table: self.table.clone(),
            fetcher: self.fetcher.clone(),
            stale_after: self.stale_after,
        }
    }
}

impl<S: NationSource> Reconciler<S> {
    /// Create a reconciler writing into `table`.
    ///
    /// Touched records older than [`DEFAULT_STALE_AFTER`] are re-fetched.
    pub const fn new(table: NationTable, fetcher: SnapshotFetcher<S>) -> Self {
        Self {
            table,
            fetcher,
            stale_after: DEFAULT_STALE_AFTER,
        }
    }

    /// Set the age past which a record touched by a happening is re-fetched.
    #[must_use]
    pub const fn with_stale_after(mut self, stale_after: Duration) -> Self {
        self.stale_after = stale_after;
        self
    }

    /// The table this reconciler writes into.
    pub const fn table(&self) -> &NationTable {
        &self.table
    }

    /// The tracked region.
    pub const fn region(&self) -> &RegionName {
        self.fetcher.region()
    }

    /// The snapshot fetcher.
    pub const fn fetcher(&self) -> &SnapshotFetcher<S> {
        &self.fetcher
    }

    /// Refresh `nation` from an authoritative snapshot.
    ///
    /// Creates the record if it does not exist; keeps `last_active_at` if
    /// it does. The table lock is taken only after the fetch completes.
    ///
    /// # Errors
    ///
    /// On [`SourceError::NotFound`] the record is removed and the error is
    /// returned so the caller can skip the nation. Other errors leave the
    /// table untouched.
    pub async fn apply_snapshot(&self, nation: &NationName) -> Result<Record, SourceError> {
        match self.fetcher.fetch(nation).await {
            Ok(snapshot) => {
                let record = self.table.apply_snapshot(nation, &snapshot).await;
                debug!(
                    nation = %nation,
                    zombies = record.zombies,
                    is_export = record.is_export,
                    in_region = record.in_region,
                    "Nation refreshed"
                );
                Ok(record)
            }
            Err(SourceError::NotFound(name)) => {
                if self.table.remove(nation).await.is_some() {
                    info!(nation = %nation, "Nation no longer exists, record removed");
                }
                Err(SourceError::NotFound(name))
            }
            Err(e) => Err(e),
        }
    }

    /// Make sure `nation` is tracked and recently refreshed.
    ///
    /// Fetches a first snapshot for an unknown nation, and a fresh one for
    /// a record last refreshed before the staleness window.
    async fn grab(&self, nation: &NationName) -> Result<Grabbed, SourceError> {
        let refreshed_at = self
            .table
            .read_with(|map| map.get(nation).map(|r| r.refreshed_at))
            .await;

        match refreshed_at {
            None => {
                self.apply_snapshot(nation).await?;
                debug!(nation = %nation, "Started tracking nation");
                Ok(Grabbed::Fetched)
            }
            Some(at) if self.is_stale(at, Utc::now()) => {
                self.apply_snapshot(nation).await?;
                debug!(nation = %nation, last_refresh = %at, "Stale nation refreshed");
                Ok(Grabbed::Refreshed)
            }
            Some(_) => Ok(Grabbed::Existing),
        }
    }

    fn is_stale(&self, refreshed_at: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        TimeDelta::from_std(self.stale_after)
            .ok()
            .and_then(|window| now.checked_sub_signed(window))
            .is_some_and(|cutoff| refreshed_at < cutoff)
    }

    /// Parse and apply one happening.
    ///
    /// # Errors
    ///
    /// Returns the error of any snapshot fetch the happening required
    /// (a first sighting, or a nation joining the region).
    pub async fn apply_happening(&self, happening: &Happening) -> Result<Applied, SourceError> {
        let Some(delta) = happening::parse(happening) else {
            debug!(id = happening.id, "Ignoring unrecognized happening");
            return Ok(Applied::Ignored);
        };
        self.apply_delta(delta).await
    }

    /// Apply an already parsed happening.
    ///
    /// # Errors
    ///
    /// See [`Reconciler::apply_happening`].
    pub async fn apply_delta(&self, delta: Delta) -> Result<Applied, SourceError> {
        match delta {
            Delta::Transfer {
                sender,
                recipient,
                kind,
                amount,
                timestamp,
            } => {
                self.apply_transfer(&sender, &recipient, kind, amount, timestamp)
                    .await
            }
            Delta::Relocation {
                nation,
                from,
                to,
                timestamp,
            } => self.apply_relocation(&nation, &from, &to, timestamp).await,
        }
    }

    async fn apply_transfer(
        &self,
        sender: &NationName,
        recipient: &NationName,
        kind: TransferKind,
        amount: i64,
        timestamp: DateTime<Utc>,
    ) -> Result<Applied, SourceError> {
        self.grab(sender).await?;
        self.grab(recipient).await?;

        let export_updated = self
            .table
            .update(sender, |record| {
                record.last_active_at = timestamp;
                if record.accepts_event_at(timestamp) {
                    record.is_export = kind.sender_exports();
                    true
                } else {
                    false
                }
            })
            .await
            .unwrap_or(false);

        let change = match kind {
            TransferKind::Infecting => amount,
            TransferKind::Curing => amount.saturating_neg(),
        };
        let zombies_updated = self
            .table
            .update(recipient, |record| {
                if record.accepts_event_at(timestamp) {
                    record.zombies = record.zombies.saturating_add(change);
                    true
                } else {
                    false
                }
            })
            .await
            .unwrap_or(false);

        debug!(
            sender = %sender,
            recipient = %recipient,
            ?kind,
            amount,
            export_updated,
            zombies_updated,
            "Transfer applied"
        );

        Ok(Applied::Transfer {
            export_updated,
            zombies_updated,
        })
    }

    async fn apply_relocation(
        &self,
        nation: &NationName,
        from: &RegionName,
        to: &RegionName,
        timestamp: DateTime<Utc>,
    ) -> Result<Applied, SourceError> {
        if from == self.region() {
            self.grab(nation).await?;
            self.table
                .update(nation, |record| record.in_region = false)
                .await;
            info!(nation = %nation, to = %to, "Nation left the region");
            Ok(Applied::LeftRegion)
        } else if to == self.region() {
            // A first sighting or stale refresh already fetched a snapshot;
            // otherwise force one so membership is re-derived now.
            if self.grab(nation).await? == Grabbed::Existing {
                self.apply_snapshot(nation).await?;
            }
            // Newcomers count as freshly active so they are not struck first.
            self.table
                .update(nation, |record| record.last_active_at = timestamp)
                .await;
            info!(nation = %nation, from = %from, "Nation joined the region");
            Ok(Applied::JoinedRegion)
        } else {
            Ok(Applied::ForeignRelocation)
        }
    }
}
