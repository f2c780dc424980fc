use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VehicleStatus {
    #[default]
    Available,
    Pending,
    Sold,
}

impl fmt::Display for VehicleStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VehicleStatus::Available => write!(f, "available"),
            VehicleStatus::Pending => write!(f, "pending"),
            VehicleStatus::Sold => write!(f, "sold"),
        }
    }
}

impl FromStr for VehicleStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "available" => Ok(VehicleStatus::Available),
            "pending" => Ok(VehicleStatus::Pending),
            "sold" => Ok(VehicleStatus::Sold),
            other => Err(format!("Unknown status: {}", other)),
        }
    }
}

/// Title (lien) brand of the vehicle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TitleStatus {
    #[default]
    Clean,
    Salvage,
    Rebuilt,
}

impl fmt::Display for TitleStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TitleStatus::Clean => write!(f, "Clean"),
            TitleStatus::Salvage => write!(f, "Salvage"),
            TitleStatus::Rebuilt => write!(f, "Rebuilt"),
        }
    }
}

impl FromStr for TitleStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "clean" => Ok(TitleStatus::Clean),
            "salvage" => Ok(TitleStatus::Salvage),
            "rebuilt" => Ok(TitleStatus::Rebuilt),
            other => Err(format!("Unknown title status: {}", other)),
        }
    }
}

/// A single free-form specification value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SpecValue {
    Number(f64),
    Text(String),
}

impl fmt::Display for SpecValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SpecValue::Number(n) => write!(f, "{}", n),
            SpecValue::Text(t) => write!(f, "{}", t),
        }
    }
}

/// Technical specifications, shaped by the vehicle's powertrain category.
///
/// Vehicles that fit none of the known categories (trailers, motorcycles, imports
/// with odd data) carry a `Custom` attribute bag instead.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "category", rename_all = "lowercase")]
pub enum Specifications {
    Combustion {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        engine: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        horsepower: Option<u32>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        cylinders: Option<u8>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        mpg_city: Option<f64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        mpg_highway: Option<f64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        drivetrain: Option<String>,
    },
    Electric {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        battery_kwh: Option<f64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        range_miles: Option<u32>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        charge_time_hours: Option<f64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        motors: Option<u8>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        drivetrain: Option<String>,
    },
    Hybrid {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        engine: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        battery_kwh: Option<f64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        electric_range_miles: Option<u32>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        mpg_combined: Option<f64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        drivetrain: Option<String>,
    },
    Custom(BTreeMap<String, SpecValue>),
}

impl Default for Specifications {
    fn default() -> Self {
        Specifications::Custom(BTreeMap::new())
    }
}

impl Specifications {
    pub fn category(&self) -> &'static str {
        match self {
            Specifications::Combustion { .. } => "combustion",
            Specifications::Electric { .. } => "electric",
            Specifications::Hybrid { .. } => "hybrid",
            Specifications::Custom(_) => "custom",
        }
    }
}

/// Breakdown of EV purchase incentives attached to a vehicle.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EvIncentives {
    pub federal: f64,
    pub state: f64,
    pub local: f64,
    pub total: f64,
}

impl EvIncentives {
    pub fn new(federal: f64, state: f64, local: f64) -> Self {
        Self {
            federal,
            state,
            local,
            total: federal + state + local,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Vehicle {
    pub id: Uuid,
    pub title: String,
    pub make: String,
    pub model: String,
    pub year: i32,
    pub price: f64,
    pub mileage: u32,
    pub location: String,
    pub condition: String,
    pub transmission: String,
    pub fuel_type: String,
    pub body_style: String,
    pub image: String,
    pub images: Vec<String>,
    pub description: String,
    pub features: Vec<String>,
    #[serde(default)]
    pub specifications: Specifications,
    pub status: VehicleStatus,
    pub favorites: bool,
    pub featured: bool,
    pub views: u64,
    pub title_status: TitleStatus,
    pub date_added: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_sold: Option<DateTime<Utc>>,
    pub last_modified: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub purchase_price: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sold_price: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ev_incentives: Option<EvIncentives>,
    pub version: u64,
    #[serde(default)]
    pub is_draft: bool,
    // Only set while the vehicle sits in the deleted collection
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backup_timestamp: Option<DateTime<Utc>>,
}

impl Vehicle {
    pub fn is_sold(&self) -> bool {
        self.status == VehicleStatus::Sold
    }

    pub fn is_electric(&self) -> bool {
        self.fuel_type.eq_ignore_ascii_case("electric")
            || matches!(self.specifications, Specifications::Electric { .. })
    }

    /// Price the vehicle actually sold for, falling back to the list price.
    pub fn effective_sale_price(&self) -> f64 {
        self.sold_price.unwrap_or(self.price)
    }

    pub fn profit(&self) -> f64 {
        self.effective_sale_price() - self.purchase_price.unwrap_or(0.0)
    }

    /// Whole-and-fractional days between listing and sale, if sold.
    pub fn days_to_sell(&self) -> Option<f64> {
        self.date_sold
            .map(|sold| days_between(self.date_added, sold))
    }

    pub fn model_key(&self) -> String {
        format!("{} {}", self.make, self.model)
    }

    /// Moves the vehicle into or out of `Sold`, keeping `date_sold` and
    /// `sold_price` consistent with the status.
    pub fn apply_status(&mut self, status: VehicleStatus, now: DateTime<Utc>) {
        match (self.status, status) {
            (VehicleStatus::Sold, VehicleStatus::Sold) => {}
            (_, VehicleStatus::Sold) => {
                self.date_sold = Some(now);
                if self.sold_price.is_none() {
                    self.sold_price = Some(self.price);
                }
            }
            (_, _) => {
                self.date_sold = None;
                self.sold_price = None;
            }
        }
        self.status = status;
    }

    /// Sets the primary image, keeping it at the head of the gallery.
    pub fn set_primary_image(&mut self, image: String) {
        if self.images.is_empty() {
            self.images.push(image.clone());
        } else {
            self.images[0] = image.clone();
        }
        self.image = image;
    }

    /// Replaces the gallery; the primary image follows its first entry.
    pub fn set_images(&mut self, images: Vec<String>) {
        if let Some(first) = images.first() {
            self.image = first.clone();
        }
        self.images = images;
    }
}

pub(crate) fn days_between(from: DateTime<Utc>, to: DateTime<Utc>) -> f64 {
    (to - from).num_seconds() as f64 / 86_400.0
}

/// A partial vehicle: the shape of add/update payloads and of form drafts.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct VehicleInput {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub make: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub year: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mileage: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub condition: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transmission: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fuel_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body_style: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub images: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub features: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub specifications: Option<Specifications>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<VehicleStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub favorites: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub featured: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title_status: Option<TitleStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub purchase_price: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sold_price: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ev_incentives: Option<EvIncentives>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_draft: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_modified: Option<DateTime<Utc>>,
}

impl VehicleInput {
    pub fn new(make: impl Into<String>, model: impl Into<String>, year: i32, price: f64) -> Self {
        Self {
            make: Some(make.into()),
            model: Some(model.into()),
            year: Some(year),
            price: Some(price),
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self == &VehicleInput::default()
    }
}

/// An entry in the saved-drafts list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedDraft {
    pub id: Uuid,
    pub vehicle: VehicleInput,
    pub last_modified: DateTime<Utc>,
    pub title: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn sample() -> Vehicle {
        let now = Utc::now();
        Vehicle {
            id: Uuid::new_v4(),
            title: "2020 Tesla Model 3".into(),
            make: "Tesla".into(),
            model: "Model 3".into(),
            year: 2020,
            price: 35_000.0,
            mileage: 20_000,
            location: String::new(),
            condition: "Used".into(),
            transmission: "Automatic".into(),
            fuel_type: "Electric".into(),
            body_style: "Sedan".into(),
            image: "a.jpg".into(),
            images: vec!["a.jpg".into(), "b.jpg".into()],
            description: String::new(),
            features: vec![],
            specifications: Specifications::default(),
            status: VehicleStatus::Available,
            favorites: false,
            featured: false,
            views: 0,
            title_status: TitleStatus::Clean,
            date_added: now - Duration::days(10),
            date_sold: None,
            last_modified: now,
            purchase_price: Some(30_000.0),
            sold_price: None,
            ev_incentives: None,
            version: 1,
            is_draft: false,
            backup_timestamp: None,
        }
    }

    #[test]
    fn status_parses_case_insensitively() {
        assert_eq!("Sold".parse::<VehicleStatus>(), Ok(VehicleStatus::Sold));
        assert!("gone".parse::<VehicleStatus>().is_err());
    }

    #[test]
    fn apply_status_stamps_and_clears_sale_fields() {
        let mut v = sample();
        let now = Utc::now();
        v.apply_status(VehicleStatus::Sold, now);
        assert_eq!(v.date_sold, Some(now));
        assert_eq!(v.sold_price, Some(35_000.0));

        v.apply_status(VehicleStatus::Pending, now);
        assert!(v.date_sold.is_none());
        assert!(v.sold_price.is_none());
    }

    #[test]
    fn primary_image_stays_at_gallery_head() {
        let mut v = sample();
        v.set_primary_image("c.jpg".into());
        assert_eq!(v.images, vec!["c.jpg".to_string(), "b.jpg".to_string()]);

        v.set_images(vec!["x.jpg".into()]);
        assert_eq!(v.image, "x.jpg");
    }

    #[test]
    fn electric_detection_uses_fuel_type_or_specs() {
        let mut v = sample();
        assert!(v.is_electric());
        v.fuel_type = "Gasoline".into();
        assert!(!v.is_electric());
        v.specifications = Specifications::Electric {
            battery_kwh: Some(75.0),
            range_miles: None,
            charge_time_hours: None,
            motors: Some(2),
            drivetrain: None,
        };
        assert!(v.is_electric());
    }

    #[test]
    fn specifications_serialize_with_category_tag() {
        let spec = Specifications::Combustion {
            engine: Some("2.0L I4".into()),
            horsepower: Some(255),
            cylinders: Some(4),
            mpg_city: None,
            mpg_highway: None,
            drivetrain: None,
        };
        let json = serde_json::to_value(&spec).unwrap();
        assert_eq!(json["category"], "combustion");
        assert_eq!(json["horsepower"], 255);
    }

    #[test]
    fn custom_specifications_accept_mixed_values() {
        let json = r#"{"category":"custom","axles":2,"hitch":"gooseneck"}"#;
        let spec: Specifications = serde_json::from_str(json).unwrap();
        match spec {
            Specifications::Custom(map) => {
                assert_eq!(map.get("axles"), Some(&SpecValue::Number(2.0)));
                assert_eq!(map.get("hitch"), Some(&SpecValue::Text("gooseneck".into())));
            }
            other => panic!("unexpected spec {:?}", other),
        }
    }

    #[test]
    fn vehicle_input_defaults_are_empty() {
        assert!(VehicleInput::default().is_empty());
        assert!(!VehicleInput::new("Ford", "F-150", 2019, 30_000.0).is_empty());
    }
}
