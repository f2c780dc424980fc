//! # Backup Ledger
//!
//! Before every vehicle mutation the API writes the current active list to a new
//! entry keyed `{storage_key}-backup-{timestamp}`. The timestamp is ISO-8601 basic
//! format in UTC with microseconds, so sorting keys lexicographically also sorts
//! them chronologically.
//!
//! Two writes inside the same microsecond would collide, so a new entry is always
//! stamped strictly after the newest existing one.
//!
//! Retention is count based: after each write, entries beyond the newest
//! `backup_retention` are removed. A retention of `0` keeps every entry.

use super::backend::StorageBackend;
use super::DealerStore;
use crate::error::{DealerError, Result};
use crate::model::Vehicle;
use chrono::{DateTime, Duration, NaiveDateTime, Utc};
use tracing::debug;

const BACKUP_INFIX: &str = "-backup-";
const TIMESTAMP_FORMAT: &str = "%Y%m%dT%H%M%S%.6fZ";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackupEntry {
    pub key: String,
    pub timestamp: DateTime<Utc>,
}

pub fn format_backup_timestamp(ts: DateTime<Utc>) -> String {
    ts.format(TIMESTAMP_FORMAT).to_string()
}

fn truncate_to_micros(ts: DateTime<Utc>) -> DateTime<Utc> {
    DateTime::from_timestamp_micros(ts.timestamp_micros()).unwrap_or(ts)
}

pub fn parse_backup_timestamp(s: &str) -> Option<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(s, TIMESTAMP_FORMAT)
        .ok()
        .map(|naive| naive.and_utc())
}

impl<B: StorageBackend> DealerStore<B> {
    fn backup_prefix(&self) -> String {
        format!("{}{}", self.storage_key, BACKUP_INFIX)
    }

    /// All ledger entries, oldest first. Keys with an unparseable suffix are skipped.
    pub(crate) fn backup_entries(&self) -> Result<Vec<BackupEntry>> {
        let prefix = self.backup_prefix();
        let mut keys: Vec<String> = self
            .backend
            .keys()?
            .into_iter()
            .filter(|k| k.starts_with(&prefix))
            .collect();
        keys.sort();

        Ok(keys
            .into_iter()
            .filter_map(|key| {
                let timestamp = parse_backup_timestamp(&key[prefix.len()..])?;
                Some(BackupEntry { key, timestamp })
            })
            .collect())
    }

    pub(crate) fn append_backup(&self, vehicles: &[Vehicle]) -> Result<BackupEntry> {
        let mut timestamp = truncate_to_micros(Utc::now());
        if let Some(latest) = self.backup_entries()?.last() {
            if latest.timestamp >= timestamp {
                timestamp = latest.timestamp + Duration::microseconds(1);
            }
        }

        let key = format!(
            "{}{}",
            self.backup_prefix(),
            format_backup_timestamp(timestamp)
        );
        let payload = serde_json::to_string(vehicles).map_err(DealerError::Serialization)?;
        self.backend.set(&key, &payload)?;
        debug!(key = %key, vehicles = vehicles.len(), "wrote backup");

        Ok(BackupEntry { key, timestamp })
    }

    pub(crate) fn backup_vehicles(&self, entry: &BackupEntry) -> Result<Vec<Vehicle>> {
        let raw = self
            .backend
            .get(&entry.key)?
            .ok_or_else(|| DealerError::Store(format!("Backup {} is missing", entry.key)))?;
        serde_json::from_str(&raw).map_err(DealerError::Serialization)
    }

    pub(crate) fn apply_retention(&self) -> Result<usize> {
        if self.backup_retention == 0 {
            return Ok(0);
        }
        let entries = self.backup_entries()?;
        if entries.len() <= self.backup_retention {
            return Ok(0);
        }

        let excess = entries.len() - self.backup_retention;
        for entry in &entries[..excess] {
            self.backend.remove(&entry.key)?;
        }
        debug!(removed = excess, kept = self.backup_retention, "pruned backups");
        Ok(excess)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{DataStore, InMemoryStore};
    use crate::test_utils::vehicle;

    #[test]
    fn timestamps_round_trip_and_sort() {
        let now = Utc::now();
        let later = now + Duration::milliseconds(5);
        let a = format_backup_timestamp(now);
        let b = format_backup_timestamp(later);
        assert!(a < b);
        let parsed = parse_backup_timestamp(&a).unwrap();
        assert_eq!(parsed.timestamp_micros(), now.timestamp_micros());
    }

    #[test]
    fn backups_are_ordered_and_unique() {
        let mut store = InMemoryStore::new();
        let v = vehicle("Ford", "Focus", 10_000.0);

        let first = store.write_backup(&[]).unwrap();
        let second = store.write_backup(std::slice::from_ref(&v)).unwrap();
        let third = store.write_backup(&[v.clone(), v]).unwrap();

        assert!(first.timestamp < second.timestamp);
        assert!(second.timestamp < third.timestamp);

        let entries = store.list_backups().unwrap();
        assert_eq!(entries, vec![first, second, third.clone()]);
        assert_eq!(store.read_backup(&third).unwrap().len(), 2);
    }

    #[test]
    fn retention_keeps_newest() {
        let mut store = InMemoryStore::new().with_backup_retention(3);
        let mut written = Vec::new();
        for _ in 0..5 {
            written.push(store.write_backup(&[]).unwrap());
        }

        let entries = store.list_backups().unwrap();
        assert_eq!(entries.len(), 3);
        assert_eq!(entries, written[2..].to_vec());
    }

    #[test]
    fn zero_retention_keeps_everything() {
        let mut store = InMemoryStore::new().with_backup_retention(0);
        for _ in 0..25 {
            store.write_backup(&[]).unwrap();
        }
        assert_eq!(store.list_backups().unwrap().len(), 25);
        assert_eq!(store.prune_backups().unwrap(), 0);
    }

    #[test]
    fn other_keys_are_ignored() {
        let store = InMemoryStore::new();
        store.backend().set("dealer-inventory", "{}").unwrap();
        store
            .backend()
            .set("dealer-inventory-backup-garbage", "[]")
            .unwrap();
        store
            .backend()
            .set("other-backup-20240101T000000.000000Z", "[]")
            .unwrap();
        assert!(store.list_backups().unwrap().is_empty());
    }
}
