use chrono::{DateTime, Utc};
use colored::Colorize;
use dealerlot::commands::{CmdMessage, MessageLevel, MetricsReport};
use dealerlot::config::{DealerConfig, CONFIG_KEYS};
use dealerlot::finance::{AuctionCosts, AuctionRoi, LoanQuote};
use dealerlot::index::{DisplayIndex, DisplayVehicle};
use dealerlot::model::{SavedDraft, Specifications, Vehicle, VehicleInput, VehicleStatus};
use dealerlot::store::BackupEntry;
use std::path::PathBuf;
use timeago::Formatter;
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

const LINE_WIDTH: usize = 100;
const TIME_WIDTH: usize = 14;
const PRICE_WIDTH: usize = 12;
const STATUS_WIDTH: usize = 10;
const FAVORITE_MARKER: &str = "♥";
const FEATURED_MARKER: &str = "★";

pub(super) fn print_messages(messages: &[CmdMessage]) {
    for message in messages {
        match message.level {
            MessageLevel::Info => println!("{}", message.content.dimmed()),
            MessageLevel::Success => println!("{}", message.content.green()),
            MessageLevel::Warning => println!("{}", message.content.yellow()),
            MessageLevel::Error => println!("{}", message.content.red()),
        }
    }
}

fn money(amount: f64) -> String {
    let whole = amount.abs().round() as u64;
    let digits = whole.to_string();
    let mut grouped = String::new();
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    if amount < 0.0 && whole > 0 {
        format!("-${}", grouped)
    } else {
        format!("${}", grouped)
    }
}

fn status_label(status: VehicleStatus) -> colored::ColoredString {
    let label = status.to_string();
    match status {
        VehicleStatus::Available => label.green(),
        VehicleStatus::Pending => label.yellow(),
        VehicleStatus::Sold => label.dimmed(),
    }
}

pub(super) fn print_vehicle_list(vehicles: &[DisplayVehicle]) {
    if vehicles.is_empty() {
        println!("No vehicles found.");
        return;
    }

    let has_featured = vehicles
        .iter()
        .any(|dv| matches!(dv.index, DisplayIndex::Featured(_)));
    if has_featured {
        println!();
    }

    let mut last_was_featured = false;
    for dv in vehicles {
        let is_featured_entry = matches!(dv.index, DisplayIndex::Featured(_));
        if last_was_featured && !is_featured_entry {
            println!();
        }
        last_was_featured = is_featured_entry;

        let v = &dv.vehicle;
        let idx_str = format!("{}. ", dv.index);
        let left_prefix = if is_featured_entry {
            format!("  {} ", FEATURED_MARKER)
        } else {
            "    ".to_string()
        };
        let marker = if v.favorites {
            format!("{} ", FAVORITE_MARKER)
        } else {
            "  ".to_string()
        };

        let when = match dv.index {
            DisplayIndex::Deleted(_) => v.backup_timestamp.unwrap_or(v.last_modified),
            _ => v.date_added,
        };
        let time_ago = format_time_ago(when);
        let price = format!("{:>width$}", money(v.price), width = PRICE_WIDTH);
        let status = format!("{:<width$}", v.status.to_string(), width = STATUS_WIDTH);

        let fixed_width = left_prefix.width()
            + idx_str.width()
            + marker.width()
            + PRICE_WIDTH
            + 1
            + STATUS_WIDTH
            + TIME_WIDTH;
        let available = LINE_WIDTH.saturating_sub(fixed_width);

        let label = format!("{} · {} mi", v.title, v.mileage);
        let label_display = truncate_to_width(&label, available);
        let padding = available.saturating_sub(label_display.width());

        let idx_colored = match dv.index {
            DisplayIndex::Featured(_) => idx_str.yellow(),
            DisplayIndex::Deleted(_) => idx_str.red(),
            DisplayIndex::Regular(_) => idx_str.normal(),
        };
        let status_colored = match v.status {
            VehicleStatus::Available => status.green(),
            VehicleStatus::Pending => status.yellow(),
            VehicleStatus::Sold => status.dimmed(),
        };

        println!(
            "{}{}{}{}{} {}{}{}",
            left_prefix,
            idx_colored,
            label_display,
            " ".repeat(padding),
            marker,
            price,
            status_colored,
            time_ago.dimmed()
        );
    }
}

pub(super) fn print_vehicles_full(vehicles: &[DisplayVehicle]) {
    for (i, dv) in vehicles.iter().enumerate() {
        if i > 0 {
            println!("\n================================\n");
        }
        println!(
            "{} {}",
            dv.index.to_string().yellow(),
            dv.vehicle.title.bold()
        );
        println!("--------------------------------");
        print_vehicle_details(&dv.vehicle);
    }
}

fn field(label: &str, value: impl std::fmt::Display) {
    let label = format!("{:<16}", format!("{}:", label));
    println!("{}{}", label.dimmed(), value);
}

fn print_vehicle_details(v: &Vehicle) {
    field("Id", v.id);
    field("Price", money(v.price));
    field("Status", status_label(v.status));
    field("Year", v.year);
    field("Mileage", format!("{} mi", v.mileage));
    field("Condition", &v.condition);
    field("Title", v.title_status);
    if !v.location.is_empty() {
        field("Location", &v.location);
    }
    if !v.transmission.is_empty() {
        field("Transmission", &v.transmission);
    }
    if !v.fuel_type.is_empty() {
        field("Fuel", &v.fuel_type);
    }
    if !v.body_style.is_empty() {
        field("Body", &v.body_style);
    }
    field("Views", v.views);
    if v.favorites || v.featured {
        let flags: Vec<&str> = [(v.favorites, "favorite"), (v.featured, "featured")]
            .iter()
            .filter(|(on, _)| *on)
            .map(|(_, name)| *name)
            .collect();
        field("Flags", flags.join(", "));
    }
    if let Some(cost) = v.purchase_price {
        field("Purchase", money(cost));
    }
    if v.is_sold() {
        field("Sold for", money(v.effective_sale_price()));
        field("Profit", money(v.profit()));
        if let Some(sold) = v.date_sold {
            field("Sold on", sold.format("%Y-%m-%d"));
        }
        if let Some(days) = v.days_to_sell() {
            field("Days to sell", format!("{:.1}", days));
        }
    }
    if let Some(ev) = &v.ev_incentives {
        field(
            "EV incentives",
            format!(
                "{} (federal {}, state {}, local {})",
                money(ev.total),
                money(ev.federal),
                money(ev.state),
                money(ev.local)
            ),
        );
    }
    field("Listed", v.date_added.format("%Y-%m-%d %H:%M"));
    field("Version", v.version);
    if let Some(deleted) = v.backup_timestamp {
        field("Deleted", deleted.format("%Y-%m-%d %H:%M"));
    }
    if !v.images.is_empty() {
        field("Images", v.images.join(", "));
    }
    if !v.features.is_empty() {
        field("Features", v.features.join(", "));
    }
    print_specifications(&v.specifications);
    if !v.description.is_empty() {
        println!();
        println!("{}", v.description);
    }
}

fn print_specifications(specs: &Specifications) {
    let mut rows: Vec<(String, String)> = Vec::new();
    let mut push = |k: &str, v: Option<String>| {
        if let Some(v) = v {
            rows.push((k.to_string(), v));
        }
    };
    match specs {
        Specifications::Combustion {
            engine,
            horsepower,
            cylinders,
            mpg_city,
            mpg_highway,
            drivetrain,
        } => {
            push("engine", engine.clone());
            push("horsepower", horsepower.map(|n| n.to_string()));
            push("cylinders", cylinders.map(|n| n.to_string()));
            push("mpg city", mpg_city.map(|n| n.to_string()));
            push("mpg highway", mpg_highway.map(|n| n.to_string()));
            push("drivetrain", drivetrain.clone());
        }
        Specifications::Electric {
            battery_kwh,
            range_miles,
            charge_time_hours,
            motors,
            drivetrain,
        } => {
            push("battery", battery_kwh.map(|n| format!("{} kWh", n)));
            push("range", range_miles.map(|n| format!("{} mi", n)));
            push("charge time", charge_time_hours.map(|n| format!("{} h", n)));
            push("motors", motors.map(|n| n.to_string()));
            push("drivetrain", drivetrain.clone());
        }
        Specifications::Hybrid {
            engine,
            battery_kwh,
            electric_range_miles,
            mpg_combined,
            drivetrain,
        } => {
            push("engine", engine.clone());
            push("battery", battery_kwh.map(|n| format!("{} kWh", n)));
            push("electric range", electric_range_miles.map(|n| format!("{} mi", n)));
            push("mpg combined", mpg_combined.map(|n| n.to_string()));
            push("drivetrain", drivetrain.clone());
        }
        Specifications::Custom(map) => {
            for (k, v) in map {
                push(k.as_str(), Some(v.to_string()));
            }
        }
    }

    if rows.is_empty() {
        return;
    }
    println!("{} ({})", "Specifications".dimmed(), specs.category());
    for (k, v) in rows {
        println!("  {:<16}{}", k, v);
    }
}

pub(super) fn print_metrics(report: &MetricsReport) {
    let sales = &report.sales;
    let inv = &report.inventory;

    println!("{}", "Inventory".bold());
    field("Value", money(report.total_value));
    field("Views", report.total_views);
    field("Favorites", report.total_likes);
    field("Average age", format!("{:.1} days", inv.average_age));
    field("EV share", format!("{:.1}%", inv.ev_inventory_percentage));
    field("Avg EV credit", money(inv.average_ev_incentive));

    println!();
    println!("{}", "Sales".bold());
    field("Sold", sales.total_sold);
    field("Revenue", money(sales.total_revenue));
    field("Profit", money(sales.total_profit));
    field("Days to sell", format!("{:.1}", sales.average_time_to_sell));
    field("EV credits", money(sales.ev_incentives_total));
    field("EV sales", format!("{:.1}%", sales.ev_sales_percentage));

    if !inv.best_performing_models.is_empty() {
        println!();
        println!("{}", "Best performing models".bold());
        for m in &inv.best_performing_models {
            println!(
                "  {:<28}{:>4} sold {:>8.1} days {:>12} avg profit {:>8.1} views",
                truncate_to_width(&m.model, 28),
                m.sold,
                m.average_days_to_sell,
                money(m.average_profit),
                m.average_views
            );
        }
    }

    let labelled = [
        ("Popular makes", &inv.popular_makes),
        ("Popular features", &inv.popular_features),
        ("Peak sales days", &inv.peak_sales_days),
    ];
    for (heading, counts) in labelled {
        if counts.is_empty() {
            continue;
        }
        println!();
        println!("{}", heading.bold());
        for c in counts {
            println!("  {:<28}{:>4}", truncate_to_width(&c.label, 28), c.count);
        }
    }

    if inv.price_ranges.iter().any(|r| r.count > 0) {
        println!();
        println!("{}", "Price ranges".bold());
        for r in &inv.price_ranges {
            println!("  {:<28}{:>4}", r.range, r.count);
        }
    }
}

pub(super) fn print_draft(draft: &VehicleInput) {
    let json = serde_json::to_string_pretty(draft).unwrap_or_default();
    println!("{}", "Current draft".bold());
    println!("{}", json);
}

pub(super) fn print_drafts(drafts: &[SavedDraft]) {
    for (i, d) in drafts.iter().enumerate() {
        let idx = format!("{}. ", i + 1);
        let time_ago = format_time_ago(d.last_modified);
        let available = LINE_WIDTH.saturating_sub(4 + idx.width() + TIME_WIDTH);
        let title = truncate_to_width(&d.title, available);
        let padding = available.saturating_sub(title.width());
        println!(
            "    {}{}{}{}",
            idx,
            title,
            " ".repeat(padding),
            time_ago.dimmed()
        );
    }
}

pub(super) fn print_backups(backups: &[BackupEntry]) {
    for (i, b) in backups.iter().enumerate() {
        println!(
            "    {:<4}{}  {}",
            format!("{}.", i + 1),
            b.timestamp.format("%Y-%m-%d %H:%M:%S%.3f"),
            format_time_ago(b.timestamp).trim_start().dimmed()
        );
    }
}

pub(super) fn print_paths(paths: &[PathBuf]) {
    for p in paths {
        println!("{}", p.display());
    }
}

pub(super) fn print_config(config: &DealerConfig) {
    for key in CONFIG_KEYS {
        if let Some(value) = config.get(key) {
            println!("{} = {}", key, value);
        }
    }
}

pub(super) fn print_loan(quote: &LoanQuote) {
    field("Financed", money(quote.principal));
    field("APR", format!("{:.2}%", quote.apr_percent));
    field("Term", format!("{} months", quote.months));
    field("Monthly", format!("${:.2}", quote.monthly_payment).bold());
    field("Total paid", money(quote.total_paid));
    field("Interest", money(quote.total_interest));
}

pub(super) fn print_auction_roi(costs: &AuctionCosts, roi: &AuctionRoi) {
    field("Hammer", money(costs.hammer_price));
    field("All-in cost", money(roi.total_cost));
    field("Sale", money(costs.expected_sale_price));
    let profit = money(roi.expected_profit);
    let profit = if roi.expected_profit < 0.0 {
        profit.red()
    } else {
        profit.green()
    };
    field("Profit", profit);
    field("ROI", format!("{:.1}%", roi.roi_percent).bold());
}

fn truncate_to_width(s: &str, max_width: usize) -> String {
    if s.width() <= max_width {
        return s.to_string();
    }
    let mut result = String::new();
    let mut current_width = 0;
    for c in s.chars() {
        let char_width = c.width().unwrap_or(0);
        if current_width + char_width > max_width.saturating_sub(1) {
            result.push('…');
            return result;
        }
        result.push(c);
        current_width += char_width;
    }
    result
}

fn format_time_ago(timestamp: DateTime<Utc>) -> String {
    let duration = Utc::now().signed_duration_since(timestamp);
    let formatter = Formatter::new();
    let time_str = formatter.convert(duration.to_std().unwrap_or_default());
    format!("{:>width$}", time_str, width = TIME_WIDTH)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn money_groups_thousands() {
        assert_eq!(money(0.0), "$0");
        assert_eq!(money(999.4), "$999");
        assert_eq!(money(18_500.0), "$18,500");
        assert_eq!(money(1_234_567.0), "$1,234,567");
        assert_eq!(money(-2_500.0), "-$2,500");
    }

    #[test]
    fn truncation_respects_display_width() {
        assert_eq!(truncate_to_width("Civic", 10), "Civic");
        let cut = truncate_to_width("2021 Mercedes-Benz GLE 350", 10);
        assert!(cut.ends_with('…'));
        assert!(cut.width() <= 10);
    }
}
