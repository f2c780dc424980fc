//! # Derived Analytics
//!
//! Pure functions that derive the dashboard aggregates from a vehicle collection.
//!
//! Nothing here is incremental: [`crate::state::InventoryState::recompute`] calls every
//! function over the full active collection after each mutation. A dealer's lot holds
//! tens to a few hundred vehicles, so a full pass is cheap and keeps the aggregates
//! trivially consistent with the data.
//!
//! Scoping rules:
//! - Sales figures look at sold vehicles only.
//! - Inventory figures look at vehicles that are *not* sold, with two exceptions that
//!   are about sales performance: `best_performing_models` and `peak_sales_days`.
//! - Every average or percentage over an empty set is `0.0`.

use crate::model::{days_between, Vehicle};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

const TOP_FEATURES: usize = 10;
const TOP_MODELS: usize = 5;
const TOP_MAKES: usize = 5;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SalesMetrics {
    pub total_sold: usize,
    pub total_revenue: f64,
    pub total_profit: f64,
    pub average_time_to_sell: f64,
    pub ev_incentives_total: f64,
    pub ev_sales_percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LabelCount {
    pub label: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelPerformance {
    pub model: String,
    pub sold: usize,
    pub average_days_to_sell: f64,
    pub average_profit: f64,
    pub average_views: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceRangeCount {
    pub range: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryMetrics {
    pub average_age: f64,
    pub ev_inventory_percentage: f64,
    pub average_ev_incentive: f64,
    pub popular_features: Vec<LabelCount>,
    pub best_performing_models: Vec<ModelPerformance>,
    pub peak_sales_days: Vec<LabelCount>,
    pub popular_makes: Vec<LabelCount>,
    pub price_ranges: Vec<PriceRangeCount>,
}

impl Default for InventoryMetrics {
    fn default() -> Self {
        Self {
            average_age: 0.0,
            ev_inventory_percentage: 0.0,
            average_ev_incentive: 0.0,
            popular_features: Vec::new(),
            best_performing_models: Vec::new(),
            peak_sales_days: Vec::new(),
            popular_makes: Vec::new(),
            price_ranges: price_ranges(std::iter::empty()),
        }
    }
}

/// Price histogram buckets as `[min, max)`; the last bucket is open-ended.
const PRICE_BUCKETS: [(&str, f64, f64); 5] = [
    ("Under $10k", 0.0, 10_000.0),
    ("$10k-$25k", 10_000.0, 25_000.0),
    ("$25k-$50k", 25_000.0, 50_000.0),
    ("$50k-$100k", 50_000.0, 100_000.0),
    ("Over $100k", 100_000.0, f64::INFINITY),
];

pub fn calculate_sales_metrics(vehicles: &[Vehicle]) -> SalesMetrics {
    let sold: Vec<&Vehicle> = vehicles.iter().filter(|v| v.is_sold()).collect();
    let total_sold = sold.len();

    let total_revenue = sold.iter().map(|v| v.effective_sale_price()).sum();
    let total_profit = sold.iter().map(|v| v.profit()).sum();

    // Non-positive durations are bad data and drop out of the sample
    let durations: Vec<f64> = sold
        .iter()
        .filter_map(|v| v.days_to_sell())
        .filter(|days| *days > 0.0)
        .collect();

    let sold_electric: Vec<&&Vehicle> = sold.iter().filter(|v| v.is_electric()).collect();
    let ev_incentives_total = sold_electric
        .iter()
        .filter_map(|v| v.ev_incentives.as_ref())
        .map(|inc| inc.total)
        .sum();

    SalesMetrics {
        total_sold,
        total_revenue,
        total_profit,
        average_time_to_sell: mean(&durations),
        ev_incentives_total,
        ev_sales_percentage: percentage(sold_electric.len(), total_sold),
    }
}

pub fn calculate_inventory_metrics(vehicles: &[Vehicle], now: DateTime<Utc>) -> InventoryMetrics {
    let unsold: Vec<&Vehicle> = vehicles.iter().filter(|v| !v.is_sold()).collect();
    let sold: Vec<&Vehicle> = vehicles.iter().filter(|v| v.is_sold()).collect();

    let ages: Vec<f64> = unsold
        .iter()
        .map(|v| days_between(v.date_added, now))
        .filter(|age| *age > 0.0)
        .collect();

    let electric: Vec<&&Vehicle> = unsold.iter().filter(|v| v.is_electric()).collect();
    let incentives: Vec<f64> = electric
        .iter()
        .map(|v| v.ev_incentives.as_ref().map_or(0.0, |inc| inc.total))
        .collect();

    let features = count_labels(
        unsold
            .iter()
            .flat_map(|v| v.features.iter().map(String::as_str)),
    );
    let makes = count_labels(unsold.iter().map(|v| v.make.as_str()));
    let weekdays: Vec<String> = sold
        .iter()
        .filter_map(|v| v.date_sold)
        .map(|d| d.format("%A").to_string())
        .collect();
    let sale_days = count_labels(weekdays.iter().map(String::as_str));

    InventoryMetrics {
        average_age: mean(&ages),
        ev_inventory_percentage: percentage(electric.len(), unsold.len()),
        average_ev_incentive: mean(&incentives),
        popular_features: top(features, TOP_FEATURES),
        best_performing_models: best_performing_models(&sold),
        peak_sales_days: sale_days,
        popular_makes: top(makes, TOP_MAKES),
        price_ranges: price_ranges(unsold.iter().map(|v| v.price)),
    }
}

/// Total list value of everything still on the lot.
pub fn calculate_total_value(vehicles: &[Vehicle]) -> f64 {
    vehicles
        .iter()
        .filter(|v| !v.is_sold())
        .map(|v| v.price)
        .sum()
}

fn best_performing_models(sold: &[&Vehicle]) -> Vec<ModelPerformance> {
    let mut groups: HashMap<String, Vec<&Vehicle>> = HashMap::new();
    for &v in sold {
        groups.entry(v.model_key()).or_default().push(v);
    }

    let mut models: Vec<ModelPerformance> = groups
        .into_iter()
        .map(|(model, group)| {
            let days: Vec<f64> = group
                .iter()
                .filter_map(|v| v.days_to_sell())
                .filter(|d| *d > 0.0)
                .collect();
            let profits: Vec<f64> = group.iter().map(|v| v.profit()).collect();
            let views: Vec<f64> = group.iter().map(|v| v.views as f64).collect();
            ModelPerformance {
                model,
                sold: group.len(),
                average_days_to_sell: mean(&days),
                average_profit: mean(&profits),
                average_views: mean(&views),
            }
        })
        .collect();

    models.sort_by(|a, b| {
        b.average_profit
            .total_cmp(&a.average_profit)
            .then_with(|| a.model.cmp(&b.model))
    });
    models.truncate(TOP_MODELS);
    models
}

fn price_ranges(prices: impl Iterator<Item = f64>) -> Vec<PriceRangeCount> {
    let mut counts = [0usize; PRICE_BUCKETS.len()];
    for price in prices {
        if let Some(i) = PRICE_BUCKETS
            .iter()
            .position(|(_, min, max)| price >= *min && price < *max)
        {
            counts[i] += 1;
        } else if price < 0.0 {
            counts[0] += 1;
        }
    }
    PRICE_BUCKETS
        .iter()
        .zip(counts)
        .map(|((label, _, _), count)| PriceRangeCount {
            range: label.to_string(),
            count,
        })
        .collect()
}

/// Frequency count sorted by count descending, then label ascending.
fn count_labels<'a>(labels: impl Iterator<Item = &'a str>) -> Vec<LabelCount> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for label in labels {
        *counts.entry(label).or_insert(0) += 1;
    }
    let mut sorted: Vec<LabelCount> = counts
        .into_iter()
        .map(|(label, count)| LabelCount {
            label: label.to_string(),
            count,
        })
        .collect();
    sorted.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.label.cmp(&b.label)));
    sorted
}

fn top(mut counts: Vec<LabelCount>, n: usize) -> Vec<LabelCount> {
    counts.truncate(n);
    counts
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

fn percentage(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64 * 100.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{EvIncentives, VehicleStatus};
    use crate::test_utils::vehicle;
    use chrono::{Duration, TimeZone};

    fn sold(make: &str, model: &str, price: f64, purchase: f64, days: i64) -> Vehicle {
        let mut v = vehicle(make, model, price);
        v.purchase_price = Some(purchase);
        v.status = VehicleStatus::Sold;
        v.date_sold = Some(v.date_added + Duration::days(days));
        v.sold_price = Some(price);
        v
    }

    #[test]
    fn empty_collection_yields_zeros() {
        let sales = calculate_sales_metrics(&[]);
        assert_eq!(sales, SalesMetrics::default());
        assert_eq!(sales.ev_sales_percentage, 0.0);
        assert_eq!(sales.average_time_to_sell, 0.0);
        assert_eq!(calculate_total_value(&[]), 0.0);

        let inventory = calculate_inventory_metrics(&[], Utc::now());
        assert_eq!(inventory.average_age, 0.0);
        assert_eq!(inventory.ev_inventory_percentage, 0.0);
        assert_eq!(inventory.average_ev_incentive, 0.0);
        assert_eq!(inventory.price_ranges.len(), 5);
        assert!(inventory.price_ranges.iter().all(|r| r.count == 0));
    }

    #[test]
    fn profit_and_revenue_use_sold_price() {
        let mut v = vehicle("Ford", "Mustang", 50_000.0);
        v.purchase_price = Some(30_000.0);
        v.status = VehicleStatus::Sold;
        v.sold_price = Some(48_000.0);
        v.date_sold = Some(v.date_added + Duration::days(3));

        let m = calculate_sales_metrics(&[v]);
        assert_eq!(m.total_sold, 1);
        assert_eq!(m.total_revenue, 48_000.0);
        assert_eq!(m.total_profit, 18_000.0);
        assert_eq!(m.average_time_to_sell, 3.0);
    }

    #[test]
    fn ev_sales_percentage_counts_electric_share() {
        let mut vehicles: Vec<Vehicle> = (0..3)
            .map(|_| sold("Ford", "F-150", 40_000.0, 30_000.0, 5))
            .collect();
        for _ in 0..2 {
            let mut ev = sold("Tesla", "Model Y", 45_000.0, 38_000.0, 5);
            ev.fuel_type = "Electric".into();
            ev.ev_incentives = Some(EvIncentives::new(7_500.0, 1_000.0, 0.0));
            vehicles.push(ev);
        }

        let m = calculate_sales_metrics(&vehicles);
        assert_eq!(m.total_sold, 5);
        assert_eq!(m.ev_sales_percentage, 40.0);
        assert_eq!(m.ev_incentives_total, 17_000.0);
    }

    #[test]
    fn non_positive_sale_durations_are_dropped() {
        let good = sold("Honda", "Civic", 20_000.0, 15_000.0, 4);
        let zero = sold("Honda", "Civic", 20_000.0, 15_000.0, 0);
        let negative = sold("Honda", "Civic", 20_000.0, 15_000.0, -2);

        let m = calculate_sales_metrics(&[good, zero, negative]);
        assert_eq!(m.total_sold, 3);
        assert_eq!(m.average_time_to_sell, 4.0);
    }

    #[test]
    fn total_value_excludes_sold() {
        let a = vehicle("Ford", "Focus", 10_000.0);
        let b = vehicle("Ford", "Fiesta", 8_000.0);
        let c = sold("Ford", "Escape", 25_000.0, 20_000.0, 2);
        assert_eq!(calculate_total_value(&[a, b, c]), 18_000.0);
    }

    #[test]
    fn price_ranges_are_half_open() {
        let prices = [9_999.0, 10_000.0, 25_000.0, 49_999.99, 100_000.0, 250_000.0];
        let vehicles: Vec<Vehicle> = prices
            .iter()
            .map(|p| vehicle("Make", "Model", *p))
            .collect();
        let m = calculate_inventory_metrics(&vehicles, Utc::now());
        let counts: Vec<usize> = m.price_ranges.iter().map(|r| r.count).collect();
        assert_eq!(counts, vec![1, 1, 2, 0, 2]);
    }

    #[test]
    fn popular_features_and_makes_are_ranked() {
        let mut a = vehicle("Toyota", "Camry", 20_000.0);
        a.features = vec!["Sunroof".into(), "Bluetooth".into()];
        let mut b = vehicle("Toyota", "RAV4", 28_000.0);
        b.features = vec!["Bluetooth".into()];
        let mut c = vehicle("Honda", "Accord", 22_000.0);
        c.features = vec!["Bluetooth".into(), "Heated Seats".into()];

        let m = calculate_inventory_metrics(&[a, b, c], Utc::now());
        assert_eq!(m.popular_features[0].label, "Bluetooth");
        assert_eq!(m.popular_features[0].count, 3);
        assert_eq!(m.popular_features.len(), 3);
        assert_eq!(m.popular_makes[0].label, "Toyota");
        assert_eq!(m.popular_makes[0].count, 2);
    }

    #[test]
    fn best_models_are_sorted_by_average_profit() {
        let vehicles = vec![
            sold("Ford", "F-150", 40_000.0, 30_000.0, 10),
            sold("Ford", "F-150", 42_000.0, 30_000.0, 20),
            sold("Honda", "Civic", 20_000.0, 18_000.0, 5),
            vehicle("BMW", "M3", 70_000.0),
        ];
        let m = calculate_inventory_metrics(&vehicles, Utc::now());
        assert_eq!(m.best_performing_models.len(), 2);
        let best = &m.best_performing_models[0];
        assert_eq!(best.model, "Ford F-150");
        assert_eq!(best.sold, 2);
        assert_eq!(best.average_profit, 11_000.0);
        assert_eq!(best.average_days_to_sell, 15.0);
    }

    #[test]
    fn peak_sales_days_bucket_by_weekday() {
        // 2024-01-01 was a Monday
        let monday = Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap();
        let mut vehicles = Vec::new();
        for offset in [0, 7, 1] {
            let mut v = sold("Kia", "Soul", 15_000.0, 10_000.0, 1);
            v.date_added = monday - Duration::days(30);
            v.date_sold = Some(monday + Duration::days(offset));
            vehicles.push(v);
        }
        let m = calculate_inventory_metrics(&vehicles, Utc::now());
        assert_eq!(m.peak_sales_days[0].label, "Monday");
        assert_eq!(m.peak_sales_days[0].count, 2);
        assert_eq!(m.peak_sales_days[1].label, "Tuesday");
    }

    #[test]
    fn inventory_age_and_ev_share() {
        let now = Utc::now();
        let mut old = vehicle("Nissan", "Leaf", 18_000.0);
        old.date_added = now - Duration::days(10);
        old.fuel_type = "Electric".into();
        old.ev_incentives = Some(EvIncentives::new(4_000.0, 0.0, 0.0));
        let mut new = vehicle("Nissan", "Altima", 22_000.0);
        new.date_added = now - Duration::days(2);

        let m = calculate_inventory_metrics(&[old, new], now);
        assert_eq!(m.average_age, 6.0);
        assert_eq!(m.ev_inventory_percentage, 50.0);
        assert_eq!(m.average_ev_incentive, 4_000.0);
    }
}
