//! # API Facade
//!
//! [`DealerApi`] is the single owner of the in-memory [`InventoryState`] and the
//! only way to change it. Every UI (the CLI today) goes through it.
//!
//! ## Mutation Sequence
//!
//! Vehicle mutations run in a fixed order:
//!
//! 1. Check the target id exists (unknown ids fail before anything is written).
//! 2. Write the current active list to the backup ledger.
//! 3. Apply the command to a *copy* of the state.
//! 4. Recompute every aggregate.
//! 5. Persist the copy, then swap it in.
//!
//! A failure at any step leaves the in-memory state exactly as it was. Draft
//! operations skip step 2: drafts are not inventory.
//!
//! ## What the API Does NOT Do
//!
//! - **Business logic**: that belongs in `commands/*.rs`
//! - **Presentation**: it returns [`CmdResult`], never strings for a terminal
//!
//! ## Generic Over DataStore
//!
//! - Production: `DealerApi<FileStore>`
//! - Testing: `DealerApi<InMemoryStore>`

use crate::commands::{self, CmdMessage, CmdResult, DealerPaths, MetricsReport};
use crate::config::DealerConfig;
use crate::error::{DealerError, Result};
use crate::index::{index_vehicles, parse_selectors, DisplayVehicle, VehicleSelector};
use crate::metrics::{InventoryMetrics, SalesMetrics};
use crate::model::{SavedDraft, Vehicle, VehicleInput, VehicleStatus};
use crate::state::InventoryState;
use crate::store::{BackupEntry, DataStore};
use chrono::{DateTime, Utc};
use std::path::Path;
use tracing::{debug, warn};
use uuid::Uuid;

pub use crate::commands::config::ConfigAction;
pub use crate::commands::list::{SortOrder, VehicleFilter};

pub struct DealerApi<S: DataStore> {
    store: S,
    state: InventoryState,
    config: DealerConfig,
    paths: DealerPaths,
    recovered_from: Option<String>,
}

impl<S: DataStore> DealerApi<S> {
    /// Loads the persisted state (recovering from backups when needed) and
    /// recomputes every aggregate.
    pub fn open(store: S, config: DealerConfig, paths: DealerPaths) -> Result<Self> {
        let outcome = store.load_state()?;
        let mut state = outcome.state;
        state.recompute(Utc::now());
        if let Some(key) = &outcome.recovered_from {
            warn!(backup = %key, "inventory was restored from a backup");
        }
        Ok(Self {
            store,
            state,
            config,
            paths,
            recovered_from: outcome.recovered_from,
        })
    }

    fn require_active(&self, id: &Uuid) -> Result<()> {
        if self.state.contains(id) {
            Ok(())
        } else {
            Err(DealerError::VehicleNotFound(*id))
        }
    }

    fn mutate_vehicles<F>(&mut self, op: &str, apply: F) -> Result<CmdResult>
    where
        F: FnOnce(&mut InventoryState, DateTime<Utc>, &BackupEntry) -> Result<CmdResult>,
    {
        let entry = self.store.write_backup(&self.state.vehicles)?;
        let now = Utc::now();
        let mut next = self.state.clone();
        let result = apply(&mut next, now, &entry)?;
        next.recompute(now);
        self.store.save_state(&next)?;
        self.state = next;
        debug!(op, backup = %entry.key, "committed");
        Ok(result)
    }

    fn mutate_drafts<F>(&mut self, apply: F) -> Result<CmdResult>
    where
        F: FnOnce(&mut InventoryState, DateTime<Utc>) -> Result<CmdResult>,
    {
        let mut next = self.state.clone();
        let result = apply(&mut next, Utc::now())?;
        self.store.save_state(&next)?;
        self.state = next;
        Ok(result)
    }

    // --- Vehicle repository ---

    pub fn add_vehicle(&mut self, input: VehicleInput) -> Result<CmdResult> {
        let placeholder = self.config.placeholder_image.clone();
        self.mutate_vehicles("add", |state, now, _| {
            commands::vehicles::add(state, input, &placeholder, now)
        })
    }

    pub fn update_vehicle(&mut self, id: &Uuid, input: VehicleInput) -> Result<CmdResult> {
        self.require_active(id)?;
        self.mutate_vehicles("update", |state, now, _| {
            commands::vehicles::update(state, id, input, now)
        })
    }

    pub fn delete_vehicle(&mut self, id: &Uuid) -> Result<CmdResult> {
        self.require_active(id)?;
        self.mutate_vehicles("delete", |state, _, entry| {
            commands::vehicles::delete(state, id, entry.timestamp)
        })
    }

    pub fn restore_vehicle(&mut self, id: &Uuid) -> Result<CmdResult> {
        if self.state.deleted_vehicle(id).is_none() {
            return Err(DealerError::VehicleNotFound(*id));
        }
        self.mutate_vehicles("restore", |state, now, _| {
            commands::vehicles::restore(state, id, now)
        })
    }

    pub fn toggle_favorite(&mut self, id: &Uuid) -> Result<CmdResult> {
        self.require_active(id)?;
        self.mutate_vehicles("favorite", |state, now, _| {
            commands::status::toggle_favorite(state, id, now)
        })
    }

    pub fn toggle_featured(&mut self, id: &Uuid) -> Result<CmdResult> {
        self.require_active(id)?;
        self.mutate_vehicles("feature", |state, now, _| {
            commands::status::toggle_featured(state, id, now)
        })
    }

    pub fn update_status(&mut self, id: &Uuid, status: VehicleStatus) -> Result<CmdResult> {
        self.require_active(id)?;
        self.mutate_vehicles("status", |state, now, _| {
            commands::status::update_status(state, id, status, now)
        })
    }

    pub fn increment_views(&mut self, id: &Uuid) -> Result<CmdResult> {
        self.require_active(id)?;
        self.mutate_vehicles("view", |state, _, _| {
            commands::status::increment_views(state, id)
        })
    }

    pub fn get_vehicle(&self, id: &Uuid) -> Result<Vehicle> {
        commands::vehicles::get(&self.state, id)
    }

    pub fn list_vehicles(&self, filter: &VehicleFilter, order: SortOrder) -> CmdResult {
        commands::list::run(&self.state, filter, order)
    }

    /// Resolves display indexes, ranges and UUIDs against the current state.
    ///
    /// Deleted indexes (`d1`) and UUIDs of deleted vehicles resolve too; callers
    /// that need an active vehicle get `VehicleNotFound` from the operation itself.
    pub fn resolve<I: AsRef<str>>(&self, inputs: &[I]) -> Result<Vec<DisplayVehicle>> {
        let selectors = parse_selectors(inputs).map_err(DealerError::Api)?;
        let indexed = index_vehicles(&self.state.vehicles, &self.state.deleted_vehicles);

        let mut out: Vec<DisplayVehicle> = Vec::new();
        for selector in selectors {
            let found = match &selector {
                VehicleSelector::Index(idx) => indexed.iter().find(|dv| &dv.index == idx),
                VehicleSelector::Id(id) => indexed.iter().find(|dv| &dv.vehicle.id == id),
            };
            let dv = found.ok_or_else(|| match &selector {
                VehicleSelector::Id(id) => DealerError::VehicleNotFound(*id),
                VehicleSelector::Index(idx) => {
                    DealerError::Api(format!("No vehicle at index {}", idx))
                }
            })?;
            if !out.iter().any(|seen| seen.vehicle.id == dv.vehicle.id) {
                out.push(dv.clone());
            }
        }
        Ok(out)
    }

    pub fn resolve_ids<I: AsRef<str>>(&self, inputs: &[I]) -> Result<Vec<Uuid>> {
        Ok(self
            .resolve(inputs)?
            .into_iter()
            .map(|dv| dv.vehicle.id)
            .collect())
    }

    pub fn metrics(&self) -> CmdResult {
        CmdResult::default().with_metrics(MetricsReport::from_state(&self.state))
    }

    // --- Drafts ---

    pub fn save_draft(&mut self, input: VehicleInput) -> Result<CmdResult> {
        self.mutate_drafts(|state, now| Ok(commands::drafts::save_draft(state, input, now)))
    }

    pub fn clear_draft(&mut self) -> Result<CmdResult> {
        self.mutate_drafts(|state, _| Ok(commands::drafts::clear_draft(state)))
    }

    pub fn show_draft(&self) -> CmdResult {
        commands::drafts::show_draft(&self.state)
    }

    pub fn save_draft_to_list(
        &mut self,
        input: VehicleInput,
        title: Option<String>,
    ) -> Result<CmdResult> {
        self.mutate_drafts(|state, now| {
            Ok(commands::drafts::save_draft_to_list(state, input, title, now))
        })
    }

    pub fn load_draft_from_list(&mut self, id: &Uuid) -> Result<CmdResult> {
        self.mutate_drafts(|state, _| commands::drafts::load_draft_from_list(state, id))
    }

    pub fn delete_draft_from_list(&mut self, id: &Uuid) -> Result<CmdResult> {
        self.mutate_drafts(|state, _| commands::drafts::delete_draft_from_list(state, id))
    }

    pub fn list_drafts(&self) -> CmdResult {
        commands::drafts::list_drafts(&self.state)
    }

    pub fn resolve_draft(&self, selector: &str) -> Result<Uuid> {
        commands::drafts::resolve_draft(&self.state, selector)
    }

    // --- Backups & maintenance ---

    pub fn list_backups(&self) -> Result<CmdResult> {
        commands::backups::list(&self.store)
    }

    pub fn prune_backups(&mut self) -> Result<CmdResult> {
        commands::backups::prune(&mut self.store)
    }

    /// Replaces the active list with a backup's. `None` restores the newest one.
    pub fn restore_backup(&mut self, selector: Option<&str>) -> Result<CmdResult> {
        let entry = commands::backups::find_entry(&self.store, selector)?;
        let vehicles = self.store.read_backup(&entry)?;
        self.mutate_vehicles("restore-backup", |state, _, pre| {
            Ok(commands::backups::restore(
                state,
                &entry,
                vehicles,
                pre.timestamp,
            ))
        })
    }

    pub fn doctor(&mut self) -> Result<CmdResult> {
        let mut result =
            self.mutate_vehicles("doctor", |state, _, _| commands::doctor::run(state))?;
        if let Some(key) = self.recovered_from.take() {
            result.add_message(CmdMessage::warning(format!(
                "Inventory was restored from backup {} when it was loaded",
                key
            )));
        }
        Ok(result)
    }

    pub fn export(&self, output: &Path) -> Result<CmdResult> {
        commands::export::run(&self.store, &self.state, output)
    }

    pub fn import(&mut self, path: &Path) -> Result<CmdResult> {
        let inputs = commands::import::read_inputs(path)?;
        let placeholder = self.config.placeholder_image.clone();
        self.mutate_vehicles("import", |state, now, _| {
            commands::import::run(state, inputs, &placeholder, now)
        })
    }

    pub fn config(&self, action: ConfigAction) -> Result<CmdResult> {
        commands::config::run(&self.paths, action)
    }

    // --- Read accessors ---

    pub fn state(&self) -> &InventoryState {
        &self.state
    }

    pub fn vehicles(&self) -> &[Vehicle] {
        &self.state.vehicles
    }

    pub fn deleted_vehicles(&self) -> &[Vehicle] {
        &self.state.deleted_vehicles
    }

    pub fn sales_metrics(&self) -> &SalesMetrics {
        &self.state.sales_metrics
    }

    pub fn inventory_metrics(&self) -> &InventoryMetrics {
        &self.state.inventory_metrics
    }

    pub fn total_value(&self) -> f64 {
        self.state.total_value
    }

    pub fn total_views(&self) -> u64 {
        self.state.total_views
    }

    pub fn total_likes(&self) -> usize {
        self.state.total_likes
    }

    pub fn draft(&self) -> Option<&VehicleInput> {
        self.state.draft_vehicle.as_ref()
    }

    pub fn drafts(&self) -> &[SavedDraft] {
        &self.state.draft_vehicles
    }

    /// Backup key the state was recovered from at open, if any.
    pub fn recovered_from(&self) -> Option<&str> {
        self.recovered_from.as_deref()
    }

    pub fn store(&self) -> &S {
        &self.store
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemoryStore;
    use std::path::PathBuf;

    fn api() -> DealerApi<InMemoryStore> {
        api_with(InMemoryStore::new())
    }

    fn api_with(store: InMemoryStore) -> DealerApi<InMemoryStore> {
        let paths = DealerPaths {
            data: PathBuf::from("unused"),
        };
        DealerApi::open(store, DealerConfig::default(), paths).unwrap()
    }

    fn add(api: &mut DealerApi<InMemoryStore>, make: &str, model: &str, price: f64) -> Uuid {
        api.add_vehicle(VehicleInput::new(make, model, 2020, price))
            .unwrap()
            .affected_vehicles[0]
            .id
    }

    #[test]
    fn every_vehicle_mutation_writes_a_backup_first() {
        let mut api = api();
        let id = add(&mut api, "Ford", "Focus", 10_000.0);
        api.update_status(&id, VehicleStatus::Pending).unwrap();
        api.toggle_favorite(&id).unwrap();
        api.increment_views(&id).unwrap();

        let entries = api.store().list_backups().unwrap();
        assert_eq!(entries.len(), 4);
        // The first backup holds the pre-image of the add: an empty list
        assert!(api.store().read_backup(&entries[0]).unwrap().is_empty());
        let before_views = api.store().read_backup(&entries[3]).unwrap();
        assert_eq!(before_views[0].views, 0);
        assert!(before_views[0].favorites);
    }

    #[test]
    fn drafts_do_not_write_backups() {
        let mut api = api();
        api.save_draft(VehicleInput::new("Ford", "Focus", 2020, 0.0))
            .unwrap();
        api.save_draft_to_list(VehicleInput::default(), None).unwrap();
        assert!(api.store().list_backups().unwrap().is_empty());
        assert!(api.draft().is_some());
        assert_eq!(api.drafts().len(), 1);
    }

    #[test]
    fn unknown_id_writes_nothing() {
        let mut api = api();
        let missing = Uuid::new_v4();
        assert!(matches!(
            api.delete_vehicle(&missing),
            Err(DealerError::VehicleNotFound(_))
        ));
        assert!(api.restore_vehicle(&missing).is_err());
        assert!(api.store().list_backups().unwrap().is_empty());
    }

    #[test]
    fn failed_write_leaves_state_untouched() {
        let mut api = api();
        add(&mut api, "Ford", "Focus", 10_000.0);
        let before = api.state().clone();

        api.store().backend().set_simulate_write_error(true);
        assert!(api.add_vehicle(VehicleInput::new("Kia", "Rio", 2020, 7_000.0)).is_err());
        assert_eq!(api.state(), &before);
    }

    #[test]
    fn aggregates_follow_mutations() {
        let mut api = api();
        let a = add(&mut api, "Ford", "Focus", 10_000.0);
        add(&mut api, "Kia", "Rio", 7_000.0);
        assert_eq!(api.total_value(), 17_000.0);

        api.update_status(&a, VehicleStatus::Sold).unwrap();
        assert_eq!(api.total_value(), 7_000.0);
        assert_eq!(api.sales_metrics().total_sold, 1);
        assert_eq!(api.sales_metrics().total_revenue, 10_000.0);

        api.toggle_favorite(&a).unwrap();
        assert_eq!(api.total_likes(), 1);
        api.delete_vehicle(&a).unwrap();
        assert_eq!(api.total_likes(), 0);
        assert_eq!(api.sales_metrics().total_sold, 0);
    }

    #[test]
    fn delete_stamps_backup_timestamp() {
        let mut api = api();
        let id = add(&mut api, "Ford", "Focus", 10_000.0);
        api.delete_vehicle(&id).unwrap();

        let latest = api.store().list_backups().unwrap().pop().unwrap();
        assert_eq!(
            api.deleted_vehicles()[0].backup_timestamp,
            Some(latest.timestamp)
        );

        api.restore_vehicle(&id).unwrap();
        assert_eq!(api.get_vehicle(&id).unwrap().version, 2);
        assert!(api.deleted_vehicles().is_empty());
    }

    #[test]
    fn state_survives_reopen() {
        let mut api = api();
        let id = add(&mut api, "Ford", "Focus", 10_000.0);
        api.save_draft_to_list(VehicleInput::default(), Some("later".into()))
            .unwrap();

        let DealerApi { store, .. } = api;
        let reopened = api_with(store);
        assert_eq!(reopened.vehicles()[0].id, id);
        assert_eq!(reopened.drafts()[0].title, "later");
        assert!(reopened.recovered_from().is_none());
    }

    #[test]
    fn resolves_indexes_and_ids() {
        let mut api = api();
        let first = add(&mut api, "Ford", "Focus", 10_000.0);
        let second = add(&mut api, "Kia", "Rio", 7_000.0);

        let ids = api.resolve_ids(&["1-2"]).unwrap();
        assert_eq!(ids.len(), 2);
        assert!(ids.contains(&first) && ids.contains(&second));
        assert_eq!(api.resolve_ids(&[first.to_string()]).unwrap(), vec![first]);
        assert!(api.resolve_ids(&["9"]).is_err());
    }

    #[test]
    fn restore_backup_rolls_back_and_is_itself_backed_up() {
        let mut api = api();
        add(&mut api, "Ford", "Focus", 10_000.0);
        let rio = add(&mut api, "Kia", "Rio", 7_000.0);
        // Newest backup is the pre-image of the second add
        api.restore_backup(None).unwrap();
        assert_eq!(api.vehicles().len(), 1);

        let backups = api.store().list_backups().unwrap();
        assert_eq!(backups.len(), 3);
        let newest = backups.iter().max_by_key(|e| e.timestamp).unwrap();

        // The vehicle missing from the backup is soft-deleted, not dropped
        assert_eq!(api.deleted_vehicles().len(), 1);
        let displaced = &api.deleted_vehicles()[0];
        assert_eq!(displaced.id, rio);
        assert_eq!(displaced.backup_timestamp, Some(newest.timestamp));

        api.restore_vehicle(&rio).unwrap();
        assert_eq!(api.vehicles().len(), 2);
        assert!(api.deleted_vehicles().is_empty());
    }

    #[test]
    fn metrics_report_mirrors_state() {
        let mut api = api();
        add(&mut api, "Ford", "Focus", 10_000.0);
        let report = api.metrics().metrics.unwrap();
        assert_eq!(report.total_value, 10_000.0);
        assert_eq!(report.inventory.price_ranges.len(), 5);
    }
}
