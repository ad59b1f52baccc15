//! Snapshot fetching: one authoritative view of one nation.

use std::sync::Arc;

use chrono::Utc;
use zday_types::{NationName, RegionName, Snapshot};

use crate::source::{NationSource, SourceError};

/// Builds [`Snapshot`]s by combining a nation's region and zombie lookups.
#[derive(Debug)]
pub struct SnapshotFetcher<S> {
    source: Arc<S>,
    region: RegionName,
}

impl<S> Clone for SnapshotFetcher<S> {
    fn clone(&self) -> Self {
        Self {
            source: Arc::clone(&self.source),
            region: self.region.clone(),
        }
    }
}

impl<S: NationSource> SnapshotFetcher<S> {
    /// Create a fetcher judging region membership against `region`.
    pub const fn new(source: Arc<S>, region: RegionName) -> Self {
        Self { source, region }
    }

    /// The tracked region.
    pub const fn region(&self) -> &RegionName {
        &self.region
    }

    /// The underlying source.
    pub const fn source(&self) -> &Arc<S> {
        &self.source
    }

    /// Fetch a fresh snapshot of `nation`.
    ///
    /// Both lookups run concurrently; the snapshot is stamped when both
    /// have completed.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError::NotFound`] if either lookup reports the nation
    /// gone, or [`SourceError::Upstream`] on any other failure.
    pub async fn fetch(&self, nation: &NationName) -> Result<Snapshot, SourceError> {
        let (region, zombie) = tokio::try_join!(
            self.source.nation_region(nation),
            self.source.nation_zombie(nation),
        )?;

        Ok(Snapshot {
            is_export: zombie.action.is_export(),
            zombies: zombie.zombies,
            in_region: region == self.region,
            taken_at: Utc::now(),
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use zday_types::ZombieAction;

    use super::*;
    use crate::stub::StubSource;

    #[tokio::test]
    async fn combines_region_and_zombie_lookups() {
        let source = Arc::new(StubSource::new("the_communist_bloc"));
        source.set_nation("a", "The Communist Bloc", ZombieAction::Export, 120);
        source.set_nation("b", "Lazarus", ZombieAction::Research, 7);
        let fetcher = SnapshotFetcher::new(source, RegionName::new("the communist bloc"));

        let a = fetcher.fetch(&NationName::new("A")).await.unwrap();
        assert!(a.is_export);
        assert!(a.in_region);
        assert_eq!(a.zombies, 120);

        let b = fetcher.fetch(&NationName::new("b")).await.unwrap();
        assert!(!b.is_export);
        assert!(!b.in_region);
    }

    #[tokio::test]
    async fn missing_nation_is_not_found() {
        let source = Arc::new(StubSource::new("the_communist_bloc"));
        let fetcher = SnapshotFetcher::new(source, RegionName::new("the_communist_bloc"));
        let err = fetcher.fetch(&NationName::new("ghost")).await.unwrap_err();
        assert_eq!(err, SourceError::NotFound(NationName::new("ghost")));
    }
}
