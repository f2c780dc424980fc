use crate::commands::{CmdMessage, CmdResult};
use crate::error::{DealerError, Result};
use crate::model::Vehicle;
use crate::state::InventoryState;
use crate::store::{BackupEntry, DataStore};
use chrono::{DateTime, Utc};
use std::collections::HashSet;
use uuid::Uuid;

/// Lists ledger entries, newest first.
pub fn list<S: DataStore>(store: &S) -> Result<CmdResult> {
    let mut entries = store.list_backups()?;
    entries.reverse();

    let mut result = CmdResult::default();
    if entries.is_empty() {
        result.add_message(CmdMessage::info("No backups yet."));
    }
    result.backups = entries;
    Ok(result)
}

pub fn prune<S: DataStore>(store: &mut S) -> Result<CmdResult> {
    let removed = store.prune_backups()?;
    let mut result = CmdResult::default();
    if store.backup_retention() == 0 {
        result.add_message(CmdMessage::info(
            "Retention is 0 (keep everything); nothing pruned.",
        ));
    } else if removed == 0 {
        result.add_message(CmdMessage::info(format!(
            "Within retention ({}); nothing pruned.",
            store.backup_retention()
        )));
    } else {
        result.add_message(CmdMessage::success(format!(
            "Pruned {} backup(s), keeping the newest {}.",
            removed,
            store.backup_retention()
        )));
    }
    Ok(result)
}

/// Finds a ledger entry by full key, by timestamp suffix, or by 1-based position
/// in the newest-first listing. `None` selects the newest entry.
pub fn find_entry<S: DataStore>(store: &S, selector: Option<&str>) -> Result<BackupEntry> {
    let entries = store.list_backups()?;
    let found = match selector {
        None => entries.last().cloned(),
        Some(sel) => {
            let by_key = entries
                .iter()
                .find(|e| e.key == sel || e.key.ends_with(sel))
                .cloned();
            by_key.or_else(|| {
                sel.parse::<usize>()
                    .ok()
                    .and_then(|pos| pos.checked_sub(1))
                    .and_then(|i| entries.iter().rev().nth(i).cloned())
            })
        }
    };
    found.ok_or_else(|| match selector {
        Some(sel) => DealerError::Store(format!("No backup matches '{}'", sel)),
        None => DealerError::Store("No backups to restore from".to_string()),
    })
}

/// Replaces the active collection with a backup's vehicle list.
///
/// Active vehicles the backup does not contain are soft-deleted, stamped with
/// `deleted_at`, so they stay recoverable.
pub fn restore(
    state: &mut InventoryState,
    entry: &BackupEntry,
    vehicles: Vec<Vehicle>,
    deleted_at: DateTime<Utc>,
) -> CmdResult {
    let count = vehicles.len();
    let restored_ids: HashSet<Uuid> = vehicles.iter().map(|v| v.id).collect();

    // A restored vehicle must not also sit in the deleted collection
    state
        .deleted_vehicles
        .retain(|d| !restored_ids.contains(&d.id));

    let mut displaced = 0;
    for mut v in std::mem::replace(&mut state.vehicles, vehicles) {
        if restored_ids.contains(&v.id) {
            continue;
        }
        v.backup_timestamp = Some(deleted_at);
        state.deleted_vehicles.push(v);
        displaced += 1;
    }

    let mut result = CmdResult::default();
    result.add_message(CmdMessage::success(format!(
        "Restored {} vehicle(s) from {}",
        count, entry.key
    )));
    if displaced > 0 {
        result.add_message(CmdMessage::info(format!(
            "Moved {} vehicle(s) not in the backup to deleted",
            displaced
        )));
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemoryStore;
    use crate::test_utils::vehicle;
    use chrono::Utc;

    #[test]
    fn list_is_newest_first() {
        let mut store = InMemoryStore::new();
        let a = store.write_backup(&[]).unwrap();
        let b = store.write_backup(&[]).unwrap();
        let res = list(&store).unwrap();
        assert_eq!(res.backups, vec![b, a]);
    }

    #[test]
    fn find_by_key_suffix_and_position() {
        let mut store = InMemoryStore::new();
        let a = store.write_backup(&[]).unwrap();
        let b = store.write_backup(&[]).unwrap();

        assert_eq!(find_entry(&store, None).unwrap(), b);
        assert_eq!(find_entry(&store, Some("2")).unwrap(), a);
        assert_eq!(find_entry(&store, Some(&a.key)).unwrap(), a);
        let suffix = &b.key[b.key.len() - 10..];
        assert_eq!(find_entry(&store, Some(suffix)).unwrap(), b);
        assert!(find_entry(&store, Some("9")).is_err());
    }

    #[test]
    fn empty_ledger_has_nothing_to_restore() {
        let store = InMemoryStore::new();
        assert!(find_entry(&store, None).is_err());
    }

    #[test]
    fn restore_replaces_active_and_dedupes_deleted() {
        let kept = vehicle("Ford", "Focus", 9_000.0);
        let displaced = vehicle("Kia", "Rio", 7_000.0);
        let mut state = InventoryState::with_vehicles(vec![displaced.clone()]);
        let mut gone = kept.clone();
        gone.backup_timestamp = Some(Utc::now());
        state.deleted_vehicles.push(gone);

        let entry = BackupEntry {
            key: "dealer-inventory-backup-x".into(),
            timestamp: Utc::now(),
        };
        let deleted_at = Utc::now();
        let res = restore(&mut state, &entry, vec![kept.clone()], deleted_at);
        assert_eq!(state.vehicles, vec![kept]);
        assert_eq!(state.deleted_vehicles.len(), 1);
        assert_eq!(state.deleted_vehicles[0].id, displaced.id);
        assert_eq!(state.deleted_vehicles[0].backup_timestamp, Some(deleted_at));
        assert!(res.messages[1].content.contains("Moved 1"));
    }

    #[test]
    fn restore_keeps_vehicles_present_in_both() {
        let shared = vehicle("Ford", "Focus", 9_000.0);
        let mut edited = shared.clone();
        edited.price = 8_500.0;
        let mut state = InventoryState::with_vehicles(vec![edited]);

        let entry = BackupEntry {
            key: "dealer-inventory-backup-x".into(),
            timestamp: Utc::now(),
        };
        let res = restore(&mut state, &entry, vec![shared.clone()], Utc::now());
        assert_eq!(state.vehicles, vec![shared]);
        assert!(state.deleted_vehicles.is_empty());
        assert_eq!(res.messages.len(), 1);
    }

    #[test]
    fn prune_reports_removed() {
        let mut store = InMemoryStore::new().with_backup_retention(0);
        for _ in 0..4 {
            store.write_backup(&[]).unwrap();
        }
        let mut store = store.with_backup_retention(2);
        let res = prune(&mut store).unwrap();
        assert!(res.messages[0].content.contains("Pruned 2"));
        assert_eq!(store.list_backups().unwrap().len(), 2);
    }
}
