//! The nation table: the tracker's single piece of shared mutable state.
//!
//! [`NationTable`] is a cheaply cloneable handle to one map of
//! [`Record`]s behind a single [`RwLock`]. Every mutation happens inside
//! one write-lock critical section, so readers never observe a partially
//! updated record. The lock is never held across an API call.

use std::collections::BTreeMap;
use std::sync::Arc;

use tokio::sync::RwLock;
use zday_types::{NationName, Record, Snapshot};

/// Shared, concurrently accessed map from nation name to its [`Record`].
#[derive(Debug, Clone, Default)]
pub struct NationTable {
    inner: Arc<RwLock<BTreeMap<NationName, Record>>>,
}

impl NationTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a table holding `records`, keyed by their names.
    pub fn from_records(records: impl IntoIterator<Item = Record>) -> Self {
        let map = records
            .into_iter()
            .map(|record| (record.name.clone(), record))
            .collect();
        Self {
            inner: Arc::new(RwLock::new(map)),
        }
    }

    /// A copy of the record for `name`, if tracked.
    pub async fn get(&self, name: &NationName) -> Option<Record> {
        self.inner.read().await.get(name).cloned()
    }

    /// Whether `name` is tracked.
    pub async fn contains(&self, name: &NationName) -> bool {
        self.inner.read().await.contains_key(name)
    }

    /// Insert or replace a record.
    pub async fn upsert(&self, record: Record) {
        self.inner
            .write()
            .await
            .insert(record.name.clone(), record);
    }

    /// Stop tracking `name`, returning its last record.
    pub async fn remove(&self, name: &NationName) -> Option<Record> {
        self.inner.write().await.remove(name)
    }

    /// Apply an authoritative snapshot, creating the record if needed.
    ///
    /// Returns the record as it stands afterwards. A snapshot older than
    /// the record's last refresh leaves it untouched.
    pub async fn apply_snapshot(&self, name: &NationName, snapshot: &Snapshot) -> Record {
        let mut map = self.inner.write().await;
        let record = map
            .entry(name.clone())
            .and_modify(|record| {
                if !record.apply_snapshot(snapshot) {
                    tracing::debug!(nation = %name, "Discarded snapshot older than current record");
                }
            })
            .or_insert_with(|| Record::from_snapshot(name.clone(), snapshot));
        record.clone()
    }

    /// Mutate the record for `name` atomically.
    ///
    /// Returns `None` without calling `f` if `name` is not tracked.
    pub async fn update<R>(&self, name: &NationName, f: impl FnOnce(&mut Record) -> R) -> Option<R> {
        self.inner.write().await.get_mut(name).map(f)
    }

    /// Run `f` against the whole map under one read lock.
    ///
    /// `f` must not block; writers wait until it returns.
    pub async fn read_with<R>(&self, f: impl FnOnce(&BTreeMap<NationName, Record>) -> R) -> R {
        let map = self.inner.read().await;
        f(&map)
    }

    /// A consistent copy of every record, ordered by name.
    pub async fn values(&self) -> Vec<Record> {
        self.inner.read().await.values().cloned().collect()
    }

    /// Every tracked name, ordered.
    pub async fn names(&self) -> Vec<NationName> {
        self.inner.read().await.keys().cloned().collect()
    }

    /// Number of tracked nations.
    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }

    /// Whether no nation is tracked.
    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.is_empty()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::arithmetic_side_effects)]
mod tests {
    use chrono::{Duration, Utc};

    use super::*;

    fn snapshot(zombies: i64) -> Snapshot {
        Snapshot {
            is_export: false,
            zombies,
            in_region: true,
            taken_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn apply_snapshot_inserts_then_updates() {
        let table = NationTable::new();
        let name = NationName::new("Testlandia");

        let created = table.apply_snapshot(&name, &snapshot(10)).await;
        assert_eq!(created.zombies, 10);
        assert_eq!(table.len().await, 1);

        table
            .update(&name, |r| r.last_active_at = r.refreshed_at)
            .await
            .unwrap();
        let mut later = snapshot(20);
        later.taken_at = created.refreshed_at + Duration::seconds(1);
        let updated = table.apply_snapshot(&name, &later).await;
        assert_eq!(updated.zombies, 20);
        assert_eq!(updated.last_active_at, created.refreshed_at);
    }

    #[tokio::test]
    async fn update_missing_record_is_none() {
        let table = NationTable::new();
        let touched = table
            .update(&NationName::new("ghost"), |r| r.zombies = 1)
            .await;
        assert!(touched.is_none());
        assert!(table.is_empty().await);
    }

    #[tokio::test]
    async fn remove_and_values_are_consistent() {
        let table = NationTable::new();
        for name in ["b", "a", "c"] {
            table.apply_snapshot(&NationName::new(name), &snapshot(1)).await;
        }
        assert!(table.remove(&NationName::new("b")).await.is_some());

        let names: Vec<_> = table.values().await.into_iter().map(|r| r.name).collect();
        assert_eq!(names, vec![NationName::new("a"), NationName::new("c")]);
        assert_eq!(table.names().await, names);
        assert!(!table.contains(&NationName::new("b")).await);
    }

    #[tokio::test]
    async fn clones_share_state() {
        let table = NationTable::new();
        let handle = table.clone();
        handle.apply_snapshot(&NationName::new("a"), &snapshot(1)).await;
        assert!(table.get(&NationName::new("a")).await.is_some());
    }
}
