//! Create, read, update, soft-delete and restore.
//!
//! Deletion is soft: the record moves to `deleted_vehicles` carrying the timestamp
//! of the backup written just before it left, and `restore` moves it back.

use super::{active_mut, CmdMessage, CmdResult};
use crate::error::{DealerError, Result};
use crate::model::{TitleStatus, Vehicle, VehicleInput, VehicleStatus};
use crate::state::InventoryState;
use chrono::{DateTime, Datelike, Utc};
use tracing::debug;
use uuid::Uuid;

const DEFAULT_CONDITION: &str = "Used";

/// Builds a new active vehicle from a partial input, filling every default.
pub fn build_vehicle(input: VehicleInput, placeholder_image: &str, now: DateTime<Utc>) -> Vehicle {
    let year = input.year.unwrap_or_else(|| now.year());
    let make = input.make.unwrap_or_default();
    let model = input.model.unwrap_or_default();
    let title = match input.title {
        Some(title) if !title.trim().is_empty() => title,
        _ if !make.is_empty() && !model.is_empty() => format!("{} {} {}", year, make, model),
        _ => String::new(),
    };

    let gallery = input.images.unwrap_or_default();
    let image = input
        .image
        .filter(|i| !i.is_empty())
        .or_else(|| gallery.first().cloned())
        .unwrap_or_else(|| placeholder_image.to_string());
    let images = if gallery.is_empty() {
        vec![image.clone()]
    } else {
        gallery
    };

    let mut vehicle = Vehicle {
        id: Uuid::new_v4(),
        title,
        make,
        model,
        year,
        price: input.price.unwrap_or(0.0),
        mileage: input.mileage.unwrap_or(0),
        location: input.location.unwrap_or_default(),
        condition: input
            .condition
            .unwrap_or_else(|| DEFAULT_CONDITION.to_string()),
        transmission: input.transmission.unwrap_or_default(),
        fuel_type: input.fuel_type.unwrap_or_default(),
        body_style: input.body_style.unwrap_or_default(),
        image,
        images,
        description: input.description.unwrap_or_default(),
        features: input.features.unwrap_or_default(),
        specifications: input.specifications.unwrap_or_default(),
        status: VehicleStatus::Available,
        favorites: input.favorites.unwrap_or(false),
        featured: input.featured.unwrap_or(false),
        views: 0,
        title_status: input.title_status.unwrap_or(TitleStatus::Clean),
        date_added: now,
        date_sold: None,
        last_modified: now,
        purchase_price: input.purchase_price,
        sold_price: None,
        ev_incentives: input.ev_incentives,
        version: 1,
        is_draft: false,
        backup_timestamp: None,
    };

    if input.status == Some(VehicleStatus::Sold) {
        vehicle.sold_price = input.sold_price;
    }
    vehicle.apply_status(input.status.unwrap_or_default(), now);
    vehicle
}

pub fn add(
    state: &mut InventoryState,
    input: VehicleInput,
    placeholder_image: &str,
    now: DateTime<Utc>,
) -> Result<CmdResult> {
    let vehicle = build_vehicle(input, placeholder_image, now);
    debug!(id = %vehicle.id, "adding vehicle");

    state.draft_vehicle = None;
    state.vehicles.push(vehicle.clone());

    let mut result = CmdResult::default();
    result.add_message(CmdMessage::success(format!(
        "Vehicle added: {}",
        display_name(&vehicle)
    )));
    Ok(result.with_affected_vehicles(vec![vehicle]))
}

/// Merges every `Some` field of `input` over the stored vehicle.
pub fn update(
    state: &mut InventoryState,
    id: &Uuid,
    input: VehicleInput,
    now: DateTime<Utc>,
) -> Result<CmdResult> {
    let vehicle = active_mut(state, id)?;
    merge(vehicle, input, now);
    vehicle.version += 1;
    vehicle.last_modified = now;
    debug!(id = %id, version = vehicle.version, "updated vehicle");

    let updated = vehicle.clone();
    let mut result = CmdResult::default();
    result.add_message(CmdMessage::success(format!(
        "Vehicle updated: {}",
        display_name(&updated)
    )));
    Ok(result.with_affected_vehicles(vec![updated]))
}

fn merge(vehicle: &mut Vehicle, input: VehicleInput, now: DateTime<Utc>) {
    if let Some(title) = input.title {
        vehicle.title = title;
    }
    if let Some(make) = input.make {
        vehicle.make = make;
    }
    if let Some(model) = input.model {
        vehicle.model = model;
    }
    if let Some(year) = input.year {
        vehicle.year = year;
    }
    if let Some(price) = input.price {
        vehicle.price = price;
    }
    if let Some(mileage) = input.mileage {
        vehicle.mileage = mileage;
    }
    if let Some(location) = input.location {
        vehicle.location = location;
    }
    if let Some(condition) = input.condition {
        vehicle.condition = condition;
    }
    if let Some(transmission) = input.transmission {
        vehicle.transmission = transmission;
    }
    if let Some(fuel_type) = input.fuel_type {
        vehicle.fuel_type = fuel_type;
    }
    if let Some(body_style) = input.body_style {
        vehicle.body_style = body_style;
    }
    if let Some(description) = input.description {
        vehicle.description = description;
    }
    if let Some(features) = input.features {
        vehicle.features = features;
    }
    if let Some(specifications) = input.specifications {
        vehicle.specifications = specifications;
    }
    if let Some(favorites) = input.favorites {
        vehicle.favorites = favorites;
    }
    if let Some(featured) = input.featured {
        vehicle.featured = featured;
    }
    if let Some(title_status) = input.title_status {
        vehicle.title_status = title_status;
    }
    if let Some(is_draft) = input.is_draft {
        vehicle.is_draft = is_draft;
    }
    if input.purchase_price.is_some() {
        vehicle.purchase_price = input.purchase_price;
    }
    if input.ev_incentives.is_some() {
        vehicle.ev_incentives = input.ev_incentives;
    }

    match (input.images, input.image) {
        (Some(gallery), _) if !gallery.is_empty() => vehicle.set_images(gallery),
        (Some(_), Some(image)) => vehicle.set_images(vec![image]),
        (Some(_), None) => vehicle.images.clear(),
        (None, Some(image)) => vehicle.set_primary_image(image),
        (None, None) => {}
    }

    let target = input.status.unwrap_or(vehicle.status);
    if target == VehicleStatus::Sold && input.sold_price.is_some() {
        vehicle.sold_price = input.sold_price;
    }
    vehicle.apply_status(target, now);
}

pub fn delete(
    state: &mut InventoryState,
    id: &Uuid,
    backup_timestamp: DateTime<Utc>,
) -> Result<CmdResult> {
    let pos = state
        .vehicles
        .iter()
        .position(|v| &v.id == id)
        .ok_or(DealerError::VehicleNotFound(*id))?;

    let mut vehicle = state.vehicles.remove(pos);
    vehicle.backup_timestamp = Some(backup_timestamp);
    debug!(id = %id, "soft-deleted vehicle");
    state.deleted_vehicles.push(vehicle.clone());

    let mut result = CmdResult::default();
    result.add_message(CmdMessage::success(format!(
        "Vehicle deleted: {}",
        display_name(&vehicle)
    )));
    Ok(result.with_affected_vehicles(vec![vehicle]))
}

pub fn restore(state: &mut InventoryState, id: &Uuid, now: DateTime<Utc>) -> Result<CmdResult> {
    let pos = state
        .deleted_vehicles
        .iter()
        .position(|v| &v.id == id)
        .ok_or(DealerError::VehicleNotFound(*id))?;

    let mut vehicle = state.deleted_vehicles.remove(pos);
    vehicle.backup_timestamp = None;
    vehicle.version += 1;
    vehicle.last_modified = now;
    debug!(id = %id, version = vehicle.version, "restored vehicle");

    // A restored id always wins over a stale active copy
    state.vehicles.retain(|v| &v.id != id);
    state.vehicles.push(vehicle.clone());

    let mut result = CmdResult::default();
    result.add_message(CmdMessage::success(format!(
        "Vehicle restored: {}",
        display_name(&vehicle)
    )));
    Ok(result.with_affected_vehicles(vec![vehicle]))
}

pub fn get(state: &InventoryState, id: &Uuid) -> Result<Vehicle> {
    state
        .vehicle(id)
        .cloned()
        .ok_or(DealerError::VehicleNotFound(*id))
}

pub(crate) fn display_name(vehicle: &Vehicle) -> String {
    if vehicle.title.is_empty() {
        vehicle.id.to_string()
    } else {
        vehicle.title.clone()
    }
}
