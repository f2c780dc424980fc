//! Repairs records that break the inventory invariants.
//!
//! Hand-edited or old documents can carry a gallery out of sync with the primary
//! image, sale fields that disagree with the status, repeated ids, or a zero
//! version. Each is fixed in place and counted. A vehicle present in both
//! collections is treated as deleted and its active copy is dropped.

use crate::commands::{CmdMessage, CmdResult};
use crate::error::Result;
use crate::model::{Vehicle, VehicleStatus};
use crate::state::InventoryState;
use std::collections::HashSet;
use tracing::debug;
use uuid::Uuid;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DoctorReport {
    pub image_mirrors: usize,
    pub sale_fields: usize,
    pub duplicate_ids: usize,
    pub stale_actives: usize,
    pub versions: usize,
}

impl DoctorReport {
    pub fn total(&self) -> usize {
        self.image_mirrors
            + self.sale_fields
            + self.duplicate_ids
            + self.stale_actives
            + self.versions
    }
}

fn repair_images(v: &mut Vehicle) -> bool {
    match v.images.first() {
        Some(first) if first != &v.image => {
            v.image = first.clone();
            true
        }
        None if !v.image.is_empty() => {
            v.images.push(v.image.clone());
            true
        }
        _ => false,
    }
}

fn repair_sale_fields(v: &mut Vehicle) -> bool {
    if v.status == VehicleStatus::Sold {
        if v.date_sold.is_none() {
            v.date_sold = Some(v.last_modified);
            return true;
        }
        false
    } else if v.date_sold.is_some() || v.sold_price.is_some() {
        v.date_sold = None;
        v.sold_price = None;
        true
    } else {
        false
    }
}

pub fn diagnose(state: &mut InventoryState) -> DoctorReport {
    let mut report = DoctorReport::default();
    let mut seen: HashSet<Uuid> = HashSet::new();

    let deleted_ids: HashSet<Uuid> = state.deleted_vehicles.iter().map(|v| v.id).collect();
    let before = state.vehicles.len();
    state.vehicles.retain(|v| {
        let stale = deleted_ids.contains(&v.id);
        if stale {
            debug!(id = %v.id, "dropped active copy of a deleted vehicle");
        }
        !stale
    });
    report.stale_actives = before - state.vehicles.len();

    // Active records are visited first, so they keep their ids
    for v in state
        .vehicles
        .iter_mut()
        .chain(state.deleted_vehicles.iter_mut())
    {
        if repair_images(v) {
            report.image_mirrors += 1;
        }
        if repair_sale_fields(v) {
            report.sale_fields += 1;
        }
        if v.version < 1 {
            v.version = 1;
            report.versions += 1;
        }
        if !seen.insert(v.id) {
            let fresh = Uuid::new_v4();
            debug!(old = %v.id, new = %fresh, "reassigned duplicate id");
            v.id = fresh;
            seen.insert(fresh);
            report.duplicate_ids += 1;
        }
    }

    report
}

pub fn run(state: &mut InventoryState) -> Result<CmdResult> {
    let report = diagnose(state);
    let mut result = CmdResult::default();

    if report.total() == 0 {
        result.add_message(CmdMessage::success("No inconsistencies found."));
        return Ok(result);
    }

    result.add_message(CmdMessage::warning("Inconsistencies found and fixed:"));
    let lines = [
        (report.image_mirrors, "primary image(s) re-synced with the gallery"),
        (report.sale_fields, "sale date/price field(s) aligned with status"),
        (report.duplicate_ids, "duplicate id(s) reassigned"),
        (report.stale_actives, "active copy(ies) of deleted vehicles removed"),
        (report.versions, "version counter(s) reset to 1"),
    ];
    for (count, what) in lines {
        if count > 0 {
            result.add_message(CmdMessage::info(format!("  - {} {}", count, what)));
        }
    }
    Ok(result)
}
