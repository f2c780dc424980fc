//! The current-draft slot and the bounded saved-drafts list.
//!
//! Drafts are never validated; any partial form is accepted as-is. The saved list
//! is newest first and holds at most [`DRAFT_LIST_CAP`] entries.

use super::{CmdMessage, CmdResult};
use crate::error::{DealerError, Result};
use crate::model::{SavedDraft, VehicleInput};
use crate::state::InventoryState;
use chrono::{DateTime, Utc};
use uuid::Uuid;

pub const DRAFT_LIST_CAP: usize = 10;

pub fn save_draft(state: &mut InventoryState, mut input: VehicleInput, now: DateTime<Utc>) -> CmdResult {
    input.is_draft = Some(true);
    input.last_modified = Some(now);
    state.draft_vehicle = Some(input.clone());

    let mut result = CmdResult::default();
    result.draft = Some(input);
    result.add_message(CmdMessage::success("Draft saved"));
    result
}

pub fn clear_draft(state: &mut InventoryState) -> CmdResult {
    let had_draft = state.draft_vehicle.take().is_some();
    let mut result = CmdResult::default();
    if had_draft {
        result.add_message(CmdMessage::success("Draft cleared"));
    } else {
        result.add_message(CmdMessage::info("No draft to clear"));
    }
    result
}

pub fn show_draft(state: &InventoryState) -> CmdResult {
    let mut result = CmdResult::default();
    result.draft = state.draft_vehicle.clone();
    if result.draft.is_none() {
        result.add_message(CmdMessage::info("No draft in progress"));
    }
    result
}

fn default_title(input: &VehicleInput, now: DateTime<Utc>) -> String {
    let stamp = now.format("%Y-%m-%d %H:%M:%S");
    match (input.make.as_deref(), input.model.as_deref()) {
        (Some(make), Some(model)) if !make.is_empty() && !model.is_empty() => {
            format!("{} {} - {}", make, model, stamp)
        }
        _ => format!("Untitled Draft - {}", stamp),
    }
}

pub fn save_draft_to_list(
    state: &mut InventoryState,
    input: VehicleInput,
    title: Option<String>,
    now: DateTime<Utc>,
) -> CmdResult {
    let title = title
        .filter(|t| !t.trim().is_empty())
        .unwrap_or_else(|| default_title(&input, now));
    let draft = SavedDraft {
        id: Uuid::new_v4(),
        vehicle: input,
        last_modified: now,
        title,
    };

    state.draft_vehicles.insert(0, draft.clone());
    state.draft_vehicles.truncate(DRAFT_LIST_CAP);

    let mut result = CmdResult::default();
    result.add_message(CmdMessage::success(format!("Draft stashed: {}", draft.title)));
    result.with_drafts(vec![draft])
}

/// Copies a saved draft into the current-draft slot. The saved entry stays.
pub fn load_draft_from_list(state: &mut InventoryState, id: &Uuid) -> Result<CmdResult> {
    let draft = state
        .draft_vehicles
        .iter()
        .find(|d| &d.id == id)
        .cloned()
        .ok_or(DealerError::DraftNotFound(*id))?;

    state.draft_vehicle = Some(draft.vehicle.clone());

    let mut result = CmdResult::default();
    result.draft = Some(draft.vehicle.clone());
    result.add_message(CmdMessage::success(format!("Draft loaded: {}", draft.title)));
    Ok(result.with_drafts(vec![draft]))
}

pub fn delete_draft_from_list(state: &mut InventoryState, id: &Uuid) -> Result<CmdResult> {
    let pos = state
        .draft_vehicles
        .iter()
        .position(|d| &d.id == id)
        .ok_or(DealerError::DraftNotFound(*id))?;
    let draft = state.draft_vehicles.remove(pos);

    let mut result = CmdResult::default();
    result.add_message(CmdMessage::success(format!("Draft dropped: {}", draft.title)));
    Ok(result.with_drafts(vec![draft]))
}

pub fn list_drafts(state: &InventoryState) -> CmdResult {
    let mut result = CmdResult::default().with_drafts(state.draft_vehicles.clone());
    if result.drafts.is_empty() {
        result.add_message(CmdMessage::info("No saved drafts"));
    }
    result
}

/// Resolves a 1-based position in the saved list (newest first) or a draft id.
pub fn resolve_draft(state: &InventoryState, selector: &str) -> Result<Uuid> {
    if let Ok(id) = Uuid::parse_str(selector) {
        return Ok(id);
    }
    let pos: usize = selector
        .parse()
        .map_err(|_| DealerError::Api(format!("Invalid draft reference: {}", selector)))?;
    pos.checked_sub(1)
        .and_then(|i| state.draft_vehicles.get(i))
        .map(|d| d.id)
        .ok_or_else(|| DealerError::Api(format!("No saved draft at position {}", pos)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn save_draft_marks_and_stamps() {
        let mut state = InventoryState::default();
        let now = Utc::now();
        save_draft(&mut state, VehicleInput::new("Jeep", "Wrangler", 2017, 0.0), now);
        let draft = state.draft_vehicle.as_ref().unwrap();
        assert_eq!(draft.is_draft, Some(true));
        assert_eq!(draft.last_modified, Some(now));

        clear_draft(&mut state);
        assert!(state.draft_vehicle.is_none());
    }

    #[test]
    fn default_titles() {
        let mut state = InventoryState::default();
        let now = Utc::now();
        save_draft_to_list(&mut state, VehicleInput::new("Jeep", "Wrangler", 2017, 0.0), None, now);
        save_draft_to_list(&mut state, VehicleInput::default(), None, now);
        save_draft_to_list(&mut state, VehicleInput::default(), Some("Trade-in".into()), now);

        let titles: Vec<&str> = state.draft_vehicles.iter().map(|d| d.title.as_str()).collect();
        assert_eq!(titles[0], "Trade-in");
        assert!(titles[1].starts_with("Untitled Draft - "));
        assert!(titles[2].starts_with("Jeep Wrangler - "));
    }

    #[test]
    fn list_is_capped_and_evicts_oldest() {
        let mut state = InventoryState::default();
        let start = Utc::now();
        for i in 0..11 {
            save_draft_to_list(
                &mut state,
                VehicleInput::default(),
                Some(format!("draft {}", i)),
                start + Duration::seconds(i),
            );
        }
        assert_eq!(state.draft_vehicles.len(), DRAFT_LIST_CAP);
        assert_eq!(state.draft_vehicles[0].title, "draft 10");
        assert!(state.draft_vehicles.iter().all(|d| d.title != "draft 0"));
    }

    #[test]
    fn load_and_delete_by_id() {
        let mut state = InventoryState::default();
        let saved = save_draft_to_list(
            &mut state,
            VehicleInput::new("Ram", "1500", 2016, 21_000.0),
            None,
            Utc::now(),
        )
        .drafts
        .remove(0);

        load_draft_from_list(&mut state, &saved.id).unwrap();
        assert_eq!(state.draft_vehicle.as_ref(), Some(&saved.vehicle));
        assert_eq!(state.draft_vehicles.len(), 1);

        delete_draft_from_list(&mut state, &saved.id).unwrap();
        assert!(state.draft_vehicles.is_empty());
        assert!(matches!(
            delete_draft_from_list(&mut state, &saved.id),
            Err(DealerError::DraftNotFound(_))
        ));
        assert!(load_draft_from_list(&mut state, &saved.id).is_err());
    }

    #[test]
    fn resolves_positions() {
        let mut state = InventoryState::default();
        save_draft_to_list(&mut state, VehicleInput::default(), Some("a".into()), Utc::now());
        save_draft_to_list(&mut state, VehicleInput::default(), Some("b".into()), Utc::now());
        let id = resolve_draft(&state, "2").unwrap();
        assert_eq!(state.draft_vehicles[1].id, id);
        assert!(resolve_draft(&state, "0").is_err());
        assert!(resolve_draft(&state, "3").is_err());
        assert!(resolve_draft(&state, "x").is_err());
    }
}
