use crate::commands::CmdResult;
use crate::index::{index_vehicles, DisplayIndex, DisplayVehicle};
use crate::model::VehicleStatus;
use crate::state::InventoryState;
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortOrder {
    #[default]
    Newest,
    Oldest,
    PriceLow,
    PriceHigh,
    MileageLow,
    YearNewest,
    MostViewed,
}

impl FromStr for SortOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace('_', "-").as_str() {
            "newest" => Ok(SortOrder::Newest),
            "oldest" => Ok(SortOrder::Oldest),
            "price-low" => Ok(SortOrder::PriceLow),
            "price-high" => Ok(SortOrder::PriceHigh),
            "mileage-low" => Ok(SortOrder::MileageLow),
            "year-newest" => Ok(SortOrder::YearNewest),
            "most-viewed" => Ok(SortOrder::MostViewed),
            other => Err(format!("Unknown sort order: {}", other)),
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SortOrder::Newest => "newest",
            SortOrder::Oldest => "oldest",
            SortOrder::PriceLow => "price-low",
            SortOrder::PriceHigh => "price-high",
            SortOrder::MileageLow => "mileage-low",
            SortOrder::YearNewest => "year-newest",
            SortOrder::MostViewed => "most-viewed",
        };
        write!(f, "{}", name)
    }
}

#[derive(Debug, Clone, Default)]
pub struct VehicleFilter {
    pub status: Option<VehicleStatus>,
    pub make: Option<String>,
    pub fuel_type: Option<String>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    pub min_year: Option<i32>,
    pub max_year: Option<i32>,
    pub search: Option<String>,
    pub favorites_only: bool,
    pub featured_only: bool,
    /// List the deleted collection instead of the active one
    pub deleted: bool,
}

impl VehicleFilter {
    fn matches(&self, dv: &DisplayVehicle) -> bool {
        let v = &dv.vehicle;
        if let Some(status) = self.status {
            if v.status != status {
                return false;
            }
        }
        if let Some(make) = &self.make {
            if !v.make.eq_ignore_ascii_case(make) {
                return false;
            }
        }
        if let Some(fuel) = &self.fuel_type {
            if !v.fuel_type.eq_ignore_ascii_case(fuel) {
                return false;
            }
        }
        if self.min_price.is_some_and(|min| v.price < min) {
            return false;
        }
        if self.max_price.is_some_and(|max| v.price > max) {
            return false;
        }
        if self.min_year.is_some_and(|min| v.year < min) {
            return false;
        }
        if self.max_year.is_some_and(|max| v.year > max) {
            return false;
        }
        if self.favorites_only && !v.favorites {
            return false;
        }
        if let Some(term) = &self.search {
            let term = term.to_lowercase();
            let hit = [&v.title, &v.make, &v.model, &v.description]
                .iter()
                .any(|field| field.to_lowercase().contains(&term));
            if !hit {
                return false;
            }
        }
        true
    }
}

fn compare(order: SortOrder, a: &DisplayVehicle, b: &DisplayVehicle) -> Ordering {
    let (a, b) = (&a.vehicle, &b.vehicle);
    match order {
        SortOrder::Newest => b.date_added.cmp(&a.date_added),
        SortOrder::Oldest => a.date_added.cmp(&b.date_added),
        SortOrder::PriceLow => a.price.total_cmp(&b.price),
        SortOrder::PriceHigh => b.price.total_cmp(&a.price),
        SortOrder::MileageLow => a.mileage.cmp(&b.mileage),
        SortOrder::YearNewest => b.year.cmp(&a.year),
        SortOrder::MostViewed => b.views.cmp(&a.views),
    }
}

/// Lists vehicles with their display indexes.
///
/// With the default order, featured vehicles come first under their `f` index and
/// again under their regular one. Any other order lists each vehicle once.
pub fn run(state: &InventoryState, filter: &VehicleFilter, order: SortOrder) -> CmdResult {
    let indexed = index_vehicles(&state.vehicles, &state.deleted_vehicles);

    let plain = order == SortOrder::Newest && !filter.featured_only;
    let mut listed: Vec<DisplayVehicle> = indexed
        .into_iter()
        .filter(|dv| match (&dv.index, filter.deleted) {
            (DisplayIndex::Deleted(_), deleted) => deleted,
            (_, true) => false,
            (DisplayIndex::Featured(_), false) => plain || filter.featured_only,
            (DisplayIndex::Regular(_), false) => !filter.featured_only,
        })
        .filter(|dv| filter.matches(dv))
        .collect();

    if !plain {
        listed.sort_by(|a, b| compare(order, a, b));
    }

    CmdResult::default().with_listed_vehicles(listed)
}
