//! # State Document
//!
//! The whole store is one JSON document under the storage key:
//!
//! ```json
//! { "version": 1, "state": { "vehicles": [...], "deletedVehicles": [...], ... } }
//! ```
//!
//! ## Load-Time Recovery
//!
//! Loading runs a single shape check. If the document is not valid JSON, if
//! `state.vehicles` is missing or is not an array, or if the document otherwise
//! fails to decode, the vehicle list is restored from the newest readable backup.
//! Whatever else in the document still decodes (drafts, deleted vehicles) is kept.
//! With no usable backup the store starts empty. Recovery is best effort: the
//! newest backup may itself be stale.
//!
//! There are no migrations yet. Documents from a newer schema are refused rather
//! than silently downgraded.

use super::backend::StorageBackend;
use super::DealerStore;
use crate::error::{DealerError, Result};
use crate::model::Vehicle;
use crate::state::InventoryState;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashSet;
use tracing::{info, warn};
use uuid::Uuid;

pub const SCHEMA_VERSION: u32 = 1;

#[derive(Serialize)]
struct DocumentRef<'a> {
    version: u32,
    state: &'a InventoryState,
}

#[derive(Deserialize)]
struct Document {
    version: u32,
    state: InventoryState,
}

/// Result of loading the state document.
#[derive(Debug, Clone, Default)]
pub struct LoadOutcome {
    pub state: InventoryState,
    /// Key of the backup the vehicle list was restored from, if recovery ran.
    pub recovered_from: Option<String>,
}

impl<B: StorageBackend> DealerStore<B> {
    pub(crate) fn save_document(&self, state: &InventoryState) -> Result<()> {
        let doc = DocumentRef {
            version: SCHEMA_VERSION,
            state,
        };
        let content = serde_json::to_string_pretty(&doc).map_err(DealerError::Serialization)?;
        self.backend.set(&self.storage_key, &content)?;
        info!(
            vehicles = state.vehicles.len(),
            deleted = state.deleted_vehicles.len(),
            "saved state"
        );
        Ok(())
    }

    pub(crate) fn load_document(&self) -> Result<LoadOutcome> {
        let Some(raw) = self.backend.get(&self.storage_key)? else {
            return Ok(LoadOutcome::default());
        };

        let value: Value = match serde_json::from_str(&raw) {
            Ok(value) => value,
            Err(e) => {
                warn!(error = %e, "state document is not valid JSON");
                return self.recover(None);
            }
        };

        if let Some(version) = value.get("version").and_then(Value::as_u64) {
            if version > u64::from(SCHEMA_VERSION) {
                return Err(DealerError::Store(format!(
                    "State was written by a newer schema (v{}), this build reads v{}",
                    version, SCHEMA_VERSION
                )));
            }
        }

        let has_vehicle_list = value
            .get("state")
            .and_then(|s| s.get("vehicles"))
            .is_some_and(Value::is_array);
        if !has_vehicle_list {
            warn!("state document has no vehicle list");
            return self.recover(value.get("state").cloned());
        }

        match serde_json::from_value::<Document>(value.clone()) {
            Ok(doc) => {
                info!(
                    version = doc.version,
                    vehicles = doc.state.vehicles.len(),
                    "loaded state"
                );
                Ok(LoadOutcome {
                    state: doc.state,
                    recovered_from: None,
                })
            }
            Err(e) => {
                warn!(error = %e, "state document failed to decode");
                self.recover(value.get("state").cloned())
            }
        }
    }

    /// Rebuilds the state around the newest readable backup.
    fn recover(&self, partial_state: Option<Value>) -> Result<LoadOutcome> {
        let mut restored: Option<(String, Vec<Vehicle>)> = None;
        for entry in self.backup_entries()?.into_iter().rev() {
            match self.backup_vehicles(&entry) {
                Ok(vehicles) => {
                    restored = Some((entry.key, vehicles));
                    break;
                }
                Err(e) => warn!(key = %entry.key, error = %e, "skipping unreadable backup"),
            }
        }

        let (recovered_from, vehicles) = match restored {
            Some((key, vehicles)) => (Some(key), vehicles),
            None => {
                warn!("no usable backup found, starting from an empty inventory");
                (None, Vec::new())
            }
        };

        let mut state = partial_state
            .and_then(|mut s| {
                let obj = s.as_object_mut()?;
                obj.insert("vehicles".to_string(), Value::Array(Vec::new()));
                serde_json::from_value::<InventoryState>(s).ok()
            })
            .unwrap_or_default();
        state.vehicles = vehicles;
        // A deletion recorded in the document is newer than any pre-image backup
        let deleted_ids: HashSet<Uuid> = state.deleted_vehicles.iter().map(|v| v.id).collect();
        state.vehicles.retain(|v| !deleted_ids.contains(&v.id));

        if let Some(key) = &recovered_from {
            warn!(backup = %key, vehicles = state.vehicles.len(), "restored vehicles from backup");
        }

        Ok(LoadOutcome {
            state,
            recovered_from,
        })
    }
}

#[cfg(test)]
mod tests {
    use crate::model::SavedDraft;
    use crate::state::InventoryState;
    use crate::store::backend::StorageBackend;
    use crate::store::{DataStore, InMemoryStore};
    use crate::test_utils::vehicle;
    use chrono::Utc;
    use uuid::Uuid;

    #[test]
    fn missing_document_loads_empty_state() {
        let store = InMemoryStore::new();
        let outcome = store.load_state().unwrap();
        assert!(outcome.state.vehicles.is_empty());
        assert!(outcome.recovered_from.is_none());
    }

    #[test]
    fn save_then_load() {
        let mut store = InMemoryStore::new();
        let state = InventoryState::with_vehicles(vec![vehicle("Ford", "Focus", 9_000.0)]);
        store.save_state(&state).unwrap();

        let loaded = store.load_state().unwrap();
        assert_eq!(loaded.state.vehicles, state.vehicles);
        assert_eq!(loaded.state.total_value, 9_000.0);
        assert!(loaded.recovered_from.is_none());
    }

    #[test]
    fn document_carries_schema_version() {
        let mut store = InMemoryStore::new();
        store.save_state(&InventoryState::default()).unwrap();
        let raw = store.backend().get("dealer-inventory").unwrap().unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(value["version"], 1);
        assert!(value["state"]["deletedVehicles"].is_array());
    }

    #[test]
    fn non_array_vehicles_recovers_from_latest_backup() {
        let mut store = InMemoryStore::new();
        let old = vehicle("Old", "Car", 1_000.0);
        let newer = vehicle("New", "Car", 2_000.0);
        store.write_backup(std::slice::from_ref(&old)).unwrap();
        let latest = store.write_backup(&[old.clone(), newer.clone()]).unwrap();

        let draft = SavedDraft {
            id: Uuid::new_v4(),
            vehicle: Default::default(),
            last_modified: Utc::now(),
            title: "Kept".into(),
        };
        let doc = serde_json::json!({
            "version": 1,
            "state": { "vehicles": "oops", "draftVehicles": [draft] }
        });
        store
            .backend()
            .set("dealer-inventory", &doc.to_string())
            .unwrap();

        let outcome = store.load_state().unwrap();
        assert_eq!(outcome.recovered_from, Some(latest.key));
        assert_eq!(outcome.state.vehicles, vec![old, newer]);
        assert_eq!(outcome.state.draft_vehicles.len(), 1);
        assert_eq!(outcome.state.draft_vehicles[0].title, "Kept");
    }

    #[test]
    fn recovery_keeps_deleted_vehicles_out_of_the_active_list() {
        let mut store = InMemoryStore::new();
        let mut gone = vehicle("Ford", "Focus", 9_000.0);
        let kept = vehicle("Kia", "Rio", 7_000.0);
        store.write_backup(&[gone.clone(), kept.clone()]).unwrap();

        gone.backup_timestamp = Some(Utc::now());
        let doc = serde_json::json!({
            "version": 1,
            "state": { "vehicles": "oops", "deletedVehicles": [gone.clone()] }
        });
        store
            .backend()
            .set("dealer-inventory", &doc.to_string())
            .unwrap();

        let outcome = store.load_state().unwrap();
        assert_eq!(outcome.state.vehicles, vec![kept]);
        assert_eq!(outcome.state.deleted_vehicles.len(), 1);
        assert_eq!(outcome.state.deleted_vehicles[0].id, gone.id);
    }

    #[test]
    fn corrupt_json_without_backups_starts_empty() {
        let store = InMemoryStore::new();
        store.backend().set("dealer-inventory", "{not json").unwrap();

        let outcome = store.load_state().unwrap();
        assert!(outcome.state.vehicles.is_empty());
        assert!(outcome.recovered_from.is_none());
    }

    #[test]
    fn unreadable_newest_backup_falls_back_to_older() {
        let mut store = InMemoryStore::new();
        let v = vehicle("Mazda", "3", 15_000.0);
        let good = store.write_backup(std::slice::from_ref(&v)).unwrap();
        let bad = store.write_backup(&[]).unwrap();
        store.backend().set(&bad.key, "garbage").unwrap();
        store.backend().set("dealer-inventory", "{}").unwrap();

        let outcome = store.load_state().unwrap();
        assert_eq!(outcome.recovered_from, Some(good.key));
        assert_eq!(outcome.state.vehicles, vec![v]);
    }

    #[test]
    fn newer_schema_is_refused() {
        let store = InMemoryStore::new();
        store
            .backend()
            .set("dealer-inventory", r#"{"version": 99, "state": {"vehicles": []}}"#)
            .unwrap();
        assert!(store.load_state().is_err());
    }
}
