//! The remote source the tracker reads from.
//!
//! [`NationSource`] is everything the tracker needs from the `NationStates`
//! API: the region-scoped happenings feed, the region's population listing,
//! and the two per-nation lookups that make up a snapshot. Rate limiting,
//! transport, and the wire format are the implementation's business.

use std::future::Future;

use zday_types::{Happening, NationName, RegionName, ZombieStatus};

/// Errors surfaced by a [`NationSource`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SourceError {
    /// The nation no longer exists upstream (ceased to exist or never did).
    #[error("nation not found: {0}")]
    NotFound(NationName),

    /// A network, rate-limit, or payload failure. Not recovered locally.
    #[error("upstream failure: {0}")]
    Upstream(String),
}

impl SourceError {
    /// Whether this is [`SourceError::NotFound`].
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

/// A source of nation data and region happenings.
///
/// Methods return `Send` futures so the background loops built on top can
/// run on spawned Tokio tasks.
pub trait NationSource: Send + Sync + 'static {
    /// Fetch region happenings.
    ///
    /// With `since_id = None` returns the most recent page of the feed;
    /// otherwise only happenings whose id is greater than `since_id`. The
    /// order of the returned vector is unspecified.
    fn happenings(
        &self,
        region: &RegionName,
        since_id: Option<u64>,
    ) -> impl Future<Output = Result<Vec<Happening>, SourceError>> + Send;

    /// List the nations currently residing in `region`.
    fn region_nations(
        &self,
        region: &RegionName,
    ) -> impl Future<Output = Result<Vec<NationName>, SourceError>> + Send;

    /// Look up the region a nation resides in.
    fn nation_region(
        &self,
        nation: &NationName,
    ) -> impl Future<Output = Result<RegionName, SourceError>> + Send;

    /// Look up a nation's Z-Day status.
    fn nation_zombie(
        &self,
        nation: &NationName,
    ) -> impl Future<Output = Result<ZombieStatus, SourceError>> + Send;
}
