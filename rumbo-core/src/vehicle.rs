use serde::{Deserialize, Serialize};

/// Selection-time vehicle projection offered by the catalog.
///
/// Only the `SelectedVehicle` subset is persisted into the session.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Vehicle {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub capacity: u32,
    pub luggage_capacity: u32,
    pub price: f64,
    #[serde(default)]
    pub image_url: Option<String>,
}

impl Vehicle {
    /// Projection copied into the session when this vehicle is chosen.
    pub fn selected(&self) -> SelectedVehicle {
        SelectedVehicle {
            id: self.id.clone(),
            name: self.name.clone(),
            price: self.price,
        }
    }
}

/// The persisted `{id, name, price}` projection of a chosen vehicle.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SelectedVehicle {
    pub id: String,
    pub name: String,
    pub price: f64,
}

/// Substitute used when neither the session nor the catalog can name the
/// selected vehicle. The authoritative total still comes from the quote
/// whenever that call succeeds.
pub const FALLBACK_VEHICLE_ID: &str = "standard-sedan";
pub const FALLBACK_VEHICLE_NAME: &str = "Standard Sedan";
pub const FALLBACK_VEHICLE_PRICE: f64 = 50.0;

pub fn fallback_vehicle() -> SelectedVehicle {
    SelectedVehicle {
        id: FALLBACK_VEHICLE_ID.to_string(),
        name: FALLBACK_VEHICLE_NAME.to_string(),
        price: FALLBACK_VEHICLE_PRICE,
    }
}
