use crate::model::{Specifications, TitleStatus, Vehicle, VehicleStatus};
use chrono::{Duration, Utc};
use uuid::Uuid;

/// A fully-populated available vehicle listed one day ago.
pub fn vehicle(make: &str, model: &str, price: f64) -> Vehicle {
    let now = Utc::now();
    let image = format!("/images/{}-{}.jpg", make, model).to_lowercase();
    Vehicle {
        id: Uuid::new_v4(),
        title: format!("2021 {} {}", make, model),
        make: make.to_string(),
        model: model.to_string(),
        year: 2021,
        price,
        mileage: 25_000,
        location: "Main Lot".to_string(),
        condition: "Used".to_string(),
        transmission: "Automatic".to_string(),
        fuel_type: "Gasoline".to_string(),
        body_style: "Sedan".to_string(),
        image: image.clone(),
        images: vec![image],
        description: String::new(),
        features: Vec::new(),
        specifications: Specifications::default(),
        status: VehicleStatus::Available,
        favorites: false,
        featured: false,
        views: 0,
        title_status: TitleStatus::Clean,
        date_added: now - Duration::days(1),
        date_sold: None,
        last_modified: now,
        purchase_price: None,
        sold_price: None,
        ev_incentives: None,
        version: 1,
        is_draft: false,
        backup_timestamp: None,
    }
}

#[cfg(test)]
pub use env::TestEnv;
