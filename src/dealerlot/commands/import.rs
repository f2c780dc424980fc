use crate::commands::{vehicles, CmdMessage, CmdResult};
use crate::error::{DealerError, Result};
use crate::model::VehicleInput;
use crate::state::InventoryState;
use chrono::{DateTime, Utc};
use std::fs;
use std::path::Path;

/// Reads a JSON array of vehicle inputs.
///
/// Unknown fields are ignored, so an exported `inventory.json` imports cleanly
/// (every record gets a fresh id).
pub fn read_inputs(path: &Path) -> Result<Vec<VehicleInput>> {
    let content = fs::read_to_string(path).map_err(DealerError::Io)?;
    serde_json::from_str(&content).map_err(|e| {
        DealerError::Api(format!(
            "{} is not a JSON array of vehicles: {}",
            path.display(),
            e
        ))
    })
}

pub fn run(
    state: &mut InventoryState,
    inputs: Vec<VehicleInput>,
    placeholder_image: &str,
    now: DateTime<Utc>,
) -> Result<CmdResult> {
    let mut result = CmdResult::default();
    let draft = state.draft_vehicle.clone();

    for input in inputs {
        let added = vehicles::add(state, input, placeholder_image, now)?;
        result.affected_vehicles.extend(added.affected_vehicles);
    }
    // Bulk import is not a form submission; the draft in progress survives
    state.draft_vehicle = draft;

    if result.affected_vehicles.is_empty() {
        result.add_message(CmdMessage::info("Nothing to import."));
    } else {
        result.add_message(CmdMessage::success(format!(
            "Imported {} vehicle(s)",
            result.affected_vehicles.len()
        )));
    }
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::VehicleStatus;
    use crate::test_utils::vehicle;

    #[test]
    fn imports_partial_records() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lot.json");
        fs::write(
            &path,
            r#"[{"make":"Toyota","model":"Prius","year":2018,"price":16000},
               {"make":"Tesla","model":"Model Y","status":"sold","price":41000}]"#,
        )
        .unwrap();

        let mut state = InventoryState::default();
        let inputs = read_inputs(&path).unwrap();
        let res = run(&mut state, inputs, "/p.jpg", Utc::now()).unwrap();
        assert_eq!(res.affected_vehicles.len(), 2);
        assert_eq!(state.vehicles[0].title, "2018 Toyota Prius");
        assert_eq!(state.vehicles[1].status, VehicleStatus::Sold);
        assert_eq!(state.vehicles[1].sold_price, Some(41_000.0));
    }

    #[test]
    fn exported_inventory_reimports() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("inventory.json");
        let original = vehicle("Ford", "Focus", 9_000.0);
        fs::write(&path, serde_json::to_string(&vec![original.clone()]).unwrap()).unwrap();

        let mut state = InventoryState::default();
        run(&mut state, read_inputs(&path).unwrap(), "/p.jpg", Utc::now()).unwrap();
        assert_eq!(state.vehicles[0].make, "Ford");
        assert_eq!(state.vehicles[0].image, original.image);
        assert_ne!(state.vehicles[0].id, original.id);
    }

    #[test]
    fn rejects_non_array() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.json");
        fs::write(&path, r#"{"make":"Ford"}"#).unwrap();
        assert!(read_inputs(&path).is_err());
    }

    #[test]
    fn keeps_current_draft() {
        let mut state = InventoryState {
            draft_vehicle: Some(VehicleInput::new("Mini", "Cooper", 2015, 0.0)),
            ..Default::default()
        };
        run(&mut state, vec![VehicleInput::default()], "/p.jpg", Utc::now()).unwrap();
        assert!(state.draft_vehicle.is_some());
    }
}
