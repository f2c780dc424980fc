use super::vehicles::display_name;
use super::{active_mut, CmdMessage, CmdResult};
use crate::error::Result;
use crate::model::VehicleStatus;
use crate::state::InventoryState;
use chrono::{DateTime, Utc};
use tracing::debug;
use uuid::Uuid;

pub fn toggle_favorite(
    state: &mut InventoryState,
    id: &Uuid,
    now: DateTime<Utc>,
) -> Result<CmdResult> {
    let vehicle = active_mut(state, id)?;
    vehicle.favorites = !vehicle.favorites;
    vehicle.version += 1;
    vehicle.last_modified = now;

    let verb = if vehicle.favorites {
        "Favorited"
    } else {
        "Unfavorited"
    };
    let vehicle = vehicle.clone();
    let mut result = CmdResult::default();
    result.add_message(CmdMessage::success(format!(
        "{}: {}",
        verb,
        display_name(&vehicle)
    )));
    Ok(result.with_affected_vehicles(vec![vehicle]))
}

pub fn toggle_featured(
    state: &mut InventoryState,
    id: &Uuid,
    now: DateTime<Utc>,
) -> Result<CmdResult> {
    let vehicle = active_mut(state, id)?;
    vehicle.featured = !vehicle.featured;
    vehicle.version += 1;
    vehicle.last_modified = now;

    let verb = if vehicle.featured {
        "Featured"
    } else {
        "Unfeatured"
    };
    let vehicle = vehicle.clone();
    let mut result = CmdResult::default();
    result.add_message(CmdMessage::success(format!(
        "{}: {}",
        verb,
        display_name(&vehicle)
    )));
    Ok(result.with_affected_vehicles(vec![vehicle]))
}

pub fn update_status(
    state: &mut InventoryState,
    id: &Uuid,
    status: VehicleStatus,
    now: DateTime<Utc>,
) -> Result<CmdResult> {
    let vehicle = active_mut(state, id)?;
    let previous = vehicle.status;
    vehicle.apply_status(status, now);
    vehicle.version += 1;
    vehicle.last_modified = now;
    debug!(id = %id, from = %previous, to = %status, "status change");

    let vehicle = vehicle.clone();
    let mut result = CmdResult::default();
    result.add_message(CmdMessage::success(format!(
        "{} is now {}",
        display_name(&vehicle),
        status
    )));
    Ok(result.with_affected_vehicles(vec![vehicle]))
}

/// Counts a detail-page view. Views are not edits: `version` and
/// `last_modified` stay as they are.
pub fn increment_views(state: &mut InventoryState, id: &Uuid) -> Result<CmdResult> {
    let vehicle = active_mut(state, id)?;
    vehicle.views += 1;

    let vehicle = vehicle.clone();
    let mut result = CmdResult::default();
    result.add_message(CmdMessage::info(format!(
        "{} has {} views",
        display_name(&vehicle),
        vehicle.views
    )));
    Ok(result.with_affected_vehicles(vec![vehicle]))
}
