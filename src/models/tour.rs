//! Modelo de Tour
//!
//! Una tour se identifica de forma natural por `(date, tourNumber)`; ese par es
//! la clave de conflicto del upsert.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::repositories::{Collection, StoredEntity};

/// Estado de la tour - mapea al campo status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum TourStatus {
    #[default]
    Pending,
    Active,
    Completed,
    Cancelled,
}

/// Tipo de tour
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum TourType {
    #[default]
    #[serde(rename = "Fest Tour")]
    Fixed,
    #[serde(rename = "Springer")]
    Relief,
}

/// Tour principal - mapea a la tabla tours
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Tour {
    pub id: Uuid,
    #[serde(rename = "user_id", default)]
    pub user_id: Option<Uuid>,
    pub tour_number: String,
    #[serde(default)]
    pub city: String,
    pub driver_id: Uuid,
    /// Conductor en formación que acompaña la tour
    #[serde(default)]
    pub beginner_driver_id: Option<Uuid>,
    #[serde(default)]
    pub vehicle_plate: Option<String>,
    pub date: NaiveDate,
    #[serde(default)]
    pub status: TourStatus,
    #[serde(default)]
    pub tour_type: TourType,
    #[serde(default)]
    pub progress: u32,
    #[serde(default)]
    pub total_packages: u32,
    #[serde(default)]
    pub total_stops: u32,
}

impl Tour {
    /// El conductor participa en la tour, como titular o en formación
    pub fn involves(&self, driver_id: Uuid) -> bool {
        self.driver_id == driver_id || self.beginner_driver_id == Some(driver_id)
    }
}

impl StoredEntity for Tour {
    const COLLECTION: Collection = Collection::Tours;
    const NULLABLE_FIELDS: &'static [&'static str] =
        &["date", "beginnerDriverId", "vehiclePlate", "user_id"];

    fn id(&self) -> Uuid {
        self.id
    }
}
