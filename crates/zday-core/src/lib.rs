//! Nation table, reconciliation, ingestion loops, and target selection for
//! the Z-Day tracker.
//!
//! Two supervised loops keep one shared [`NationTable`] current: the
//! [`HappeningFeed`] applies per-event deltas from the region's happenings,
//! and [`RegionSync`] periodically re-reads every nation's authoritative
//! state. Both funnel through the [`Reconciler`], which lets a fresher
//! snapshot win over an older event. The [`Selector`] answers the cure and
//! exterminate queries from the table.
//!
//! # Modules
//!
//! - [`config`] -- Configuration loading from `zday-config.yaml` into
//!   strongly-typed structs.
//! - [`source`] -- The [`NationSource`] trait for the remote API.
//! - [`stub`] -- [`StubSource`], an in-memory source for tests.
//! - [`table`] -- The shared nation table.
//! - [`fetcher`] -- Combines two lookups into one [`Snapshot`].
//! - [`happening`] -- Parses happening text into deltas.
//! - [`reconcile`] -- Applies snapshots and deltas to the table.
//! - [`feed`] -- The happenings ingestion loop.
//! - [`sync`] -- The periodic region sync loop.
//! - [`supervisor`] -- Restart-on-failure wrapper for the loops.
//! - [`shutdown`] -- Process-wide shutdown signal.
//! - [`memo`] -- Cached value with a recompute predicate.
//! - [`select`] -- Cure and extermination target selection.
//! - [`persist`] -- Saving and restoring the table.
//!
//! [`NationTable`]: table::NationTable
//! [`HappeningFeed`]: feed::HappeningFeed
//! [`RegionSync`]: sync::RegionSync
//! [`Reconciler`]: reconcile::Reconciler
//! [`Selector`]: select::Selector
//! [`NationSource`]: source::NationSource
//! [`StubSource`]: stub::StubSource
//! [`Snapshot`]: zday_types::Snapshot

pub mod config;
pub mod feed;
pub mod fetcher;
pub mod happening;
pub mod memo;
pub mod persist;
pub mod reconcile;
pub mod select;
pub mod shutdown;
pub mod source;
pub mod stub;
pub mod supervisor;
pub mod sync;
pub mod table;
