//! In-memory [`NationSource`] for tests and offline runs.
//!
//! [`StubSource`] holds a scripted world: nations with their region and
//! Z-Day status, and an append-only happenings feed. Failures can be
//! queued to exercise the supervisor paths.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use zday_types::{Happening, NationName, RegionName, ZombieAction, ZombieStatus};

use crate::source::{NationSource, SourceError};

/// Maximum number of happenings returned for an unbounded (`since_id = None`) poll.
const LATEST_PAGE: usize = 100;

#[derive(Debug, Default)]
struct World {
    nations: BTreeMap<NationName, (RegionName, ZombieStatus)>,
    happenings: Vec<Happening>,
    feed_failures: u32,
    listing_failures: u32,
    lookup_failures: u32,
}

/// A scripted, in-memory nation source.
#[derive(Debug)]
pub struct StubSource {
    region: RegionName,
    world: Mutex<World>,
    zombie_lookups: AtomicU64,
    next_happening_id: AtomicU64,
}

impl StubSource {
    /// Create an empty world around the tracked `region`.
    pub fn new(region: &str) -> Self {
        Self {
            region: RegionName::new(region),
            world: Mutex::new(World::default()),
            zombie_lookups: AtomicU64::new(0),
            next_happening_id: AtomicU64::new(1),
        }
    }

    fn world(&self) -> MutexGuard<'_, World> {
        self.world.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Create or overwrite a nation.
    pub fn set_nation(&self, name: &str, region: &str, action: ZombieAction, zombies: i64) {
        self.world().nations.insert(
            NationName::new(name),
            (RegionName::new(region), ZombieStatus { action, zombies }),
        );
    }

    /// Make a nation cease to exist.
    pub fn remove_nation(&self, name: &str) {
        self.world().nations.remove(&NationName::new(name));
    }

    /// Append a happening to the feed, returning its id.
    pub fn push_happening(&self, timestamp: DateTime<Utc>, text: &str) -> u64 {
        let id = self.next_happening_id.fetch_add(1, Ordering::SeqCst);
        self.world().happenings.push(Happening {
            id,
            timestamp,
            text: text.to_owned(),
        });
        id
    }

    /// Make the next `count` feed polls fail with an upstream error.
    pub fn fail_feed(&self, count: u32) {
        self.world().feed_failures = count;
    }

    /// Make the next `count` region listings fail with an upstream error.
    pub fn fail_listing(&self, count: u32) {
        self.world().listing_failures = count;
    }

    /// Make the next `count` zombie lookups fail with an upstream error.
    pub fn fail_lookups(&self, count: u32) {
        self.world().lookup_failures = count;
    }

    /// Number of zombie lookups served so far (one per snapshot).
    pub fn zombie_lookups(&self) -> u64 {
        self.zombie_lookups.load(Ordering::SeqCst)
    }

    /// The region this stub was created around.
    pub const fn region(&self) -> &RegionName {
        &self.region
    }
}

/// Consume one queued failure, if any.
fn take_failure(counter: &mut u32, what: &str) -> Result<(), SourceError> {
    if *counter == 0 {
        return Ok(());
    }
    *counter = counter.saturating_sub(1);
    Err(SourceError::Upstream(format!("scripted {what} failure")))
}

impl NationSource for StubSource {
    async fn happenings(
        &self,
        _region: &RegionName,
        since_id: Option<u64>,
    ) -> Result<Vec<Happening>, SourceError> {
        let mut world = self.world();
        take_failure(&mut world.feed_failures, "feed")?;
        let page = match since_id {
            Some(since) => world
                .happenings
                .iter()
                .filter(|h| h.id > since)
                .cloned()
                .collect(),
            None => world
                .happenings
                .iter()
                .rev()
                .take(LATEST_PAGE)
                .cloned()
                .collect(),
        };
        Ok(page)
    }

    async fn region_nations(&self, region: &RegionName) -> Result<Vec<NationName>, SourceError> {
        let mut world = self.world();
        take_failure(&mut world.listing_failures, "listing")?;
        Ok(world
            .nations
            .iter()
            .filter(|(_, (home, _))| home == region)
            .map(|(name, _)| name.clone())
            .collect())
    }

    async fn nation_region(&self, nation: &NationName) -> Result<RegionName, SourceError> {
        self.world()
            .nations
            .get(nation)
            .map(|(region, _)| region.clone())
            .ok_or_else(|| SourceError::NotFound(nation.clone()))
    }

    async fn nation_zombie(&self, nation: &NationName) -> Result<ZombieStatus, SourceError> {
        let mut world = self.world();
        take_failure(&mut world.lookup_failures, "lookup")?;
        self.zombie_lookups.fetch_add(1, Ordering::SeqCst);
        world
            .nations
            .get(nation)
            .map(|(_, status)| status.clone())
            .ok_or_else(|| SourceError::NotFound(nation.clone()))
    }
}
