//! Modelo de Complaint
//!
//! Los campos `*_snapshot` se copian de la tour y del conductor al crear la
//! reclamación y nunca se vuelven a escribir.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::repositories::{Collection, StoredEntity};

/// Estado de la reclamación - los valores serializados son los de la tabla
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum ComplaintStatus {
    #[default]
    #[serde(rename = "PENDING")]
    Pending,
    #[serde(rename = "ERLEDIGT")]
    Resolved,
    #[serde(rename = "SCHADEN")]
    Damage,
}

impl ComplaintStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, ComplaintStatus::Pending)
    }
}

/// Complaint principal - mapea a la tabla complaints
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Complaint {
    pub id: Uuid,
    #[serde(rename = "user_id", default)]
    pub user_id: Option<Uuid>,
    pub tour_id: Uuid,

    #[serde(rename = "tour_number_snapshot", default)]
    pub tour_number_snapshot: String,
    #[serde(rename = "tour_date_snapshot", default)]
    pub tour_date_snapshot: Option<NaiveDate>,
    #[serde(rename = "driver_name_snapshot", default)]
    pub driver_name_snapshot: String,
    #[serde(rename = "vehicle_plate_snapshot", default)]
    pub vehicle_plate_snapshot: String,

    #[serde(default)]
    pub tour_number: String,
    pub driver_id: Uuid,
    pub package_number: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub postal_code: String,
    #[serde(default)]
    pub status: ComplaintStatus,
    #[serde(default)]
    pub resolved: bool,
    #[serde(default)]
    pub resolved_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub date: Option<NaiveDate>,
}

impl StoredEntity for Complaint {
    const COLLECTION: Collection = Collection::Complaints;
    const NULLABLE_FIELDS: &'static [&'static str] =
        &["date", "resolvedAt", "tour_date_snapshot", "user_id"];
    const WRITE_ONCE_FIELDS: &'static [&'static str] = &[
        "tour_number_snapshot",
        "tour_date_snapshot",
        "driver_name_snapshot",
        "vehicle_plate_snapshot",
    ];

    fn id(&self) -> Uuid {
        self.id
    }
}
