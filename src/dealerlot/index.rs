//! # Display Indexes
//!
//! Vehicle ids are UUIDs, which nobody wants to type at a terminal. Like a lot
//! board, the CLI numbers vehicles instead:
//!
//! - `1`, `2`, ... every active vehicle, newest listing first
//! - `f1`, `f2`, ... featured vehicles (these also keep their regular number)
//! - `d1`, `d2`, ... soft-deleted vehicles, most recently deleted first
//!
//! Numbers are derived on every call from the current state, so they are stable
//! only as long as the inventory does not change. Full UUIDs are always accepted
//! as well.

use crate::model::Vehicle;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// A user-facing index for a vehicle.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DisplayIndex {
    Featured(usize),
    Regular(usize),
    Deleted(usize),
}

impl fmt::Display for DisplayIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DisplayIndex::Featured(i) => write!(f, "f{}", i),
            DisplayIndex::Regular(i) => write!(f, "{}", i),
            DisplayIndex::Deleted(i) => write!(f, "d{}", i),
        }
    }
}

impl FromStr for DisplayIndex {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Some(rest) = s.strip_prefix('f') {
            if let Ok(n) = rest.parse() {
                return Ok(DisplayIndex::Featured(n));
            }
        }
        if let Some(rest) = s.strip_prefix('d') {
            if let Ok(n) = rest.parse() {
                return Ok(DisplayIndex::Deleted(n));
            }
        }
        if let Ok(n) = s.parse() {
            return Ok(DisplayIndex::Regular(n));
        }
        Err(format!("Invalid index format: {}", s))
    }
}

/// A user input selecting a vehicle, either by display index or by id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VehicleSelector {
    Index(DisplayIndex),
    Id(Uuid),
}

impl fmt::Display for VehicleSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VehicleSelector::Index(idx) => write!(f, "{}", idx),
            VehicleSelector::Id(id) => write!(f, "{}", id),
        }
    }
}

#[derive(Debug, Clone)]
pub struct DisplayVehicle {
    pub vehicle: Vehicle,
    pub index: DisplayIndex,
}

/// Assigns canonical display indexes.
///
/// Featured vehicles appear **twice**: once with a `Featured` index and once with
/// their `Regular` index, so regular numbers do not shift when a vehicle is
/// featured. The returned list is ordered featured, regular, deleted.
pub fn index_vehicles(active: &[Vehicle], deleted: &[Vehicle]) -> Vec<DisplayVehicle> {
    let mut active: Vec<&Vehicle> = active.iter().collect();
    active.sort_by(|a, b| {
        b.date_added
            .cmp(&a.date_added)
            .then_with(|| a.id.cmp(&b.id))
    });

    let mut deleted: Vec<&Vehicle> = deleted.iter().collect();
    deleted.sort_by(|a, b| {
        b.backup_timestamp
            .cmp(&a.backup_timestamp)
            .then_with(|| a.id.cmp(&b.id))
    });

    let featured = active
        .iter()
        .filter(|v| v.featured)
        .enumerate()
        .map(|(i, v)| DisplayVehicle {
            vehicle: (*v).clone(),
            index: DisplayIndex::Featured(i + 1),
        });
    let regular = active.iter().enumerate().map(|(i, v)| DisplayVehicle {
        vehicle: (*v).clone(),
        index: DisplayIndex::Regular(i + 1),
    });
    let removed = deleted.iter().enumerate().map(|(i, v)| DisplayVehicle {
        vehicle: (*v).clone(),
        index: DisplayIndex::Deleted(i + 1),
    });

    featured.chain(regular).chain(removed).collect()
}

/// Parses a single input that may be an index, a range (`2-4`, `d1-d3`) or a UUID.
pub fn parse_selector(s: &str) -> Result<Vec<VehicleSelector>, String> {
    if let Ok(id) = Uuid::parse_str(s) {
        return Ok(vec![VehicleSelector::Id(id)]);
    }
    parse_index_or_range(s).map(|idxs| idxs.into_iter().map(VehicleSelector::Index).collect())
}

pub fn parse_selectors<I: AsRef<str>>(inputs: &[I]) -> Result<Vec<VehicleSelector>, String> {
    let mut out = Vec::new();
    for input in inputs {
        out.extend(parse_selector(input.as_ref())?);
    }
    Ok(out)
}

fn parse_index_or_range(s: &str) -> Result<Vec<DisplayIndex>, String> {
    if let Some(dash_pos) = s.find('-') {
        if dash_pos > 0 {
            let start = DisplayIndex::from_str(&s[..dash_pos])?;
            let end = DisplayIndex::from_str(&s[dash_pos + 1..])?;
            return expand_range(start, end);
        }
    }
    DisplayIndex::from_str(s).map(|idx| vec![idx])
}

fn expand_range(start: DisplayIndex, end: DisplayIndex) -> Result<Vec<DisplayIndex>, String> {
    let (s, e) = match (&start, &end) {
        (DisplayIndex::Regular(s), DisplayIndex::Regular(e))
        | (DisplayIndex::Featured(s), DisplayIndex::Featured(e))
        | (DisplayIndex::Deleted(s), DisplayIndex::Deleted(e)) => (*s, *e),
        _ => {
            return Err(format!(
                "Invalid range: {} and {} are different index types",
                start, end
            ))
        }
    };
    if s > e {
        return Err(format!(
            "Invalid range: start ({}) must be <= end ({})",
            start, end
        ));
    }
    Ok((s..=e)
        .map(|n| match start {
            DisplayIndex::Regular(_) => DisplayIndex::Regular(n),
            DisplayIndex::Featured(_) => DisplayIndex::Featured(n),
            DisplayIndex::Deleted(_) => DisplayIndex::Deleted(n),
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::vehicle;
    use chrono::{Duration, Utc};

    #[test]
    fn parses_index_kinds() {
        assert_eq!("3".parse(), Ok(DisplayIndex::Regular(3)));
        assert_eq!("f2".parse(), Ok(DisplayIndex::Featured(2)));
        assert_eq!("d1".parse(), Ok(DisplayIndex::Deleted(1)));
        assert!("x1".parse::<DisplayIndex>().is_err());
    }

    #[test]
    fn parses_ranges_and_ids() {
        let id = Uuid::new_v4();
        let selectors = parse_selectors(&["1-3".to_string(), id.to_string()]).unwrap();
        assert_eq!(
            selectors,
            vec![
                VehicleSelector::Index(DisplayIndex::Regular(1)),
                VehicleSelector::Index(DisplayIndex::Regular(2)),
                VehicleSelector::Index(DisplayIndex::Regular(3)),
                VehicleSelector::Id(id),
            ]
        );
        assert!(parse_selector("3-1").is_err());
        assert!(parse_selector("1-d2").is_err());
    }

    #[test]
    fn featured_vehicles_keep_regular_index() {
        let now = Utc::now();
        let mut older = vehicle("Ford", "Focus", 9_000.0);
        older.date_added = now - Duration::days(5);
        older.featured = true;
        let mut newer = vehicle("Kia", "Rio", 11_000.0);
        newer.date_added = now - Duration::days(1);
        let mut gone = vehicle("Fiat", "500", 7_000.0);
        gone.backup_timestamp = Some(now);

        let indexed = index_vehicles(&[older.clone(), newer.clone()], &[gone.clone()]);
        let pairs: Vec<(String, uuid::Uuid)> = indexed
            .iter()
            .map(|dv| (dv.index.to_string(), dv.vehicle.id))
            .collect();
        assert_eq!(
            pairs,
            vec![
                ("f1".to_string(), older.id),
                ("1".to_string(), newer.id),
                ("2".to_string(), older.id),
                ("d1".to_string(), gone.id),
            ]
        );
    }
}
