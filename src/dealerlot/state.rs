use crate::metrics::{
    calculate_inventory_metrics, calculate_sales_metrics, calculate_total_value,
    InventoryMetrics, SalesMetrics,
};
use crate::model::{SavedDraft, Vehicle, VehicleInput};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Everything the dealer store knows, as one serializable document.
///
/// The aggregate fields (`total_value` through `inventory_metrics`) are derived data:
/// they are rewritten by [`InventoryState::recompute`] after every mutation and are
/// persisted only so readers of the raw document see the same figures the app does.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct InventoryState {
    pub vehicles: Vec<Vehicle>,
    pub deleted_vehicles: Vec<Vehicle>,
    pub total_value: f64,
    pub total_views: u64,
    pub total_likes: usize,
    pub sales_metrics: SalesMetrics,
    pub inventory_metrics: InventoryMetrics,
    pub draft_vehicle: Option<VehicleInput>,
    pub draft_vehicles: Vec<SavedDraft>,
}

impl InventoryState {
    pub fn with_vehicles(vehicles: Vec<Vehicle>) -> Self {
        let mut state = Self {
            vehicles,
            ..Default::default()
        };
        state.recompute(Utc::now());
        state
    }

    /// Recomputes every derived aggregate from the active collection.
    pub fn recompute(&mut self, now: DateTime<Utc>) {
        self.total_value = calculate_total_value(&self.vehicles);
        self.total_views = self.vehicles.iter().map(|v| v.views).sum();
        self.total_likes = self.vehicles.iter().filter(|v| v.favorites).count();
        self.sales_metrics = calculate_sales_metrics(&self.vehicles);
        self.inventory_metrics = calculate_inventory_metrics(&self.vehicles, now);
    }

    pub fn vehicle(&self, id: &Uuid) -> Option<&Vehicle> {
        self.vehicles.iter().find(|v| &v.id == id)
    }

    pub(crate) fn vehicle_mut(&mut self, id: &Uuid) -> Option<&mut Vehicle> {
        self.vehicles.iter_mut().find(|v| &v.id == id)
    }

    pub fn deleted_vehicle(&self, id: &Uuid) -> Option<&Vehicle> {
        self.deleted_vehicles.iter().find(|v| &v.id == id)
    }

    pub fn contains(&self, id: &Uuid) -> bool {
        self.vehicle(id).is_some()
    }
}
