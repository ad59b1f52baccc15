//! The periodic region sync loop.
//!
//! Each cycle refreshes every nation currently listed in the region plus
//! every nation already tracked, so nations that left are still kept
//! current. After each successful refresh the loop sleeps for a fixed
//! delay to stay within the API rate budget. The very first cycle after
//! process start skips that delay to fill the table quickly.

use std::collections::BTreeSet;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use tracing::{debug, info};
use zday_types::NationName;

use crate::reconcile::Reconciler;
use crate::source::{NationSource, SourceError};
use crate::supervisor::Supervised;

/// Outcome of one sync cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleReport {
    /// Nations refreshed successfully.
    pub refreshed: u64,
    /// Nations found to no longer exist (and removed).
    pub removed: u64,
    /// Whether the per-nation delay was applied.
    pub throttled: bool,
}

/// Refreshes the whole tracked population, forever.
#[derive(Debug)]
pub struct RegionSync<S> {
    reconciler: Reconciler<S>,
    item_delay: Duration,
    warmed_up: AtomicBool,
    cycles: AtomicU64,
}

impl<S: NationSource> RegionSync<S> {
    /// Create a sync loop sleeping `item_delay` after each throttled refresh.
    pub const fn new(reconciler: Reconciler<S>, item_delay: Duration) -> Self {
        Self {
            reconciler,
            item_delay,
            warmed_up: AtomicBool::new(false),
            cycles: AtomicU64::new(0),
        }
    }

    /// Number of cycles completed since process start.
    pub fn cycles(&self) -> u64 {
        self.cycles.load(Ordering::SeqCst)
    }

    /// Run one full cycle.
    ///
    /// Warm-up (no delay) lasts until the first cycle completes, so a
    /// first cycle cut short by a failure is retried unthrottled too.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError::Upstream`] if the listing or any refresh
    /// fails for a reason other than the nation being gone.
    pub async fn run_cycle(&self) -> Result<CycleReport, SourceError> {
        let throttled = self.warmed_up.load(Ordering::SeqCst);
        let region = self.reconciler.region();

        let mut names: BTreeSet<NationName> = self
            .reconciler
            .fetcher()
            .source()
            .region_nations(region)
            .await?
            .into_iter()
            .collect();
        let listed = names.len();
        names.extend(self.reconciler.table().names().await);

        let mut report = CycleReport {
            throttled,
            ..CycleReport::default()
        };

        for name in &names {
            match self.reconciler.apply_snapshot(name).await {
                Ok(_) => {
                    report.refreshed = report.refreshed.saturating_add(1);
                    if throttled {
                        tokio::time::sleep(self.item_delay).await;
                    }
                }
                Err(SourceError::NotFound(_)) => {
                    report.removed = report.removed.saturating_add(1);
                    debug!(nation = %name, "Skipping nation that no longer exists");
                }
                Err(e) => return Err(e),
            }
        }

        self.warmed_up.store(true, Ordering::SeqCst);
        let cycle = self.cycles.fetch_add(1, Ordering::SeqCst).saturating_add(1);
        info!(
            cycle,
            listed,
            tracked = names.len(),
            refreshed = report.refreshed,
            removed = report.removed,
            throttled,
            "Region sync cycle complete"
        );
        Ok(report)
    }
}

impl<S: NationSource> Supervised for RegionSync<S> {
    type Error = SourceError;

    fn name(&self) -> &'static str {
        "region-sync"
    }

    async fn run(&self) -> Result<(), SourceError> {
        loop {
            let report = self.run_cycle().await?;
            // An empty cycle never sleeps on its own.
            if report.refreshed == 0 {
                tokio::time::sleep(self.item_delay).await;
            }
        }
    }
}
