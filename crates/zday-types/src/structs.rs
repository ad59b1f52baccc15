//! Core record and payload structs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::enums::ZombieAction;
use crate::ids::NationName;

/// Activity timestamp given to nations never yet seen acting in a happening.
pub const NEVER_ACTIVE: DateTime<Utc> = DateTime::<Utc>::UNIX_EPOCH;

/// Tracked state of one nation.
///
/// Created the first time a nation is referenced (by a happening or a
/// region listing) and populated from an authoritative snapshot; mutated
/// afterwards by happenings and periodic refreshes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    /// Normalized nation name. Immutable; the table key.
    pub name: NationName,
    /// Whether the nation is currently exporting zombies.
    pub is_export: bool,
    /// Current zombie count. Happenings may push it below zero until the
    /// next refresh corrects it.
    pub zombies: i64,
    /// Whether the nation currently resides in the tracked region.
    pub in_region: bool,
    /// When the last authoritative snapshot was applied.
    pub refreshed_at: DateTime<Utc>,
    /// When the nation last acted as the sender of a happening.
    pub last_active_at: DateTime<Utc>,
}

impl Record {
    /// Build a fresh record from its first snapshot.
    pub fn from_snapshot(name: NationName, snapshot: &Snapshot) -> Self {
        Self {
            name,
            is_export: snapshot.is_export,
            zombies: snapshot.zombies,
            in_region: snapshot.in_region,
            refreshed_at: snapshot.taken_at,
            last_active_at: NEVER_ACTIVE,
        }
    }

    /// Overwrite the authoritative fields from a snapshot, keeping
    /// `last_active_at`.
    ///
    /// Returns `false` (and changes nothing) if the snapshot is older than
    /// the one already applied.
    pub fn apply_snapshot(&mut self, snapshot: &Snapshot) -> bool {
        if snapshot.taken_at < self.refreshed_at {
            return false;
        }
        self.is_export = snapshot.is_export;
        self.zombies = snapshot.zombies;
        self.in_region = snapshot.in_region;
        self.refreshed_at = snapshot.taken_at;
        true
    }

    /// Whether an event at `timestamp` is newer than the last snapshot and
    /// may therefore mutate snapshot-derived fields.
    pub fn accepts_event_at(&self, timestamp: DateTime<Utc>) -> bool {
        timestamp > self.refreshed_at
    }
}

/// An authoritative view of one nation, combined from the region and
/// zombie lookups.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Whether the nation is exporting zombies.
    pub is_export: bool,
    /// Current zombie count.
    pub zombies: i64,
    /// Whether the nation resides in the tracked region.
    pub in_region: bool,
    /// When both lookups completed.
    pub taken_at: DateTime<Utc>,
}

/// Z-Day status of a nation as reported by the API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZombieStatus {
    /// The nation's chosen action.
    pub action: ZombieAction,
    /// Zombie count.
    pub zombies: i64,
}

/// A raw happening from the region event feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Happening {
    /// Feed-assigned, monotonically increasing event id.
    pub id: u64,
    /// When the event occurred.
    pub timestamp: DateTime<Utc>,
    /// Event text, with nations as `@@name@@` and regions as `%%name%%`.
    pub text: String,
}
