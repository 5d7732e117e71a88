//! Modelo de Driver
//!
//! Este módulo contiene el struct Driver y su estado de disponibilidad.
//! Los nombres de campo serializados coinciden con las columnas de la tabla
//! `drivers` (camelCase, salvo `created_at` y `user_id`).

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::repositories::{Collection, StoredEntity};

/// Disponibilidad del conductor - los valores serializados son los de la tabla
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
pub enum DriverStatus {
    #[default]
    #[serde(rename = "Available")]
    Available,
    #[serde(rename = "Fehlt")]
    Absent,
    #[serde(rename = "Urlaub")]
    OnLeave,
    #[serde(rename = "Sick")]
    Sick,
}

impl DriverStatus {
    pub const ALL: [DriverStatus; 4] = [
        DriverStatus::Available,
        DriverStatus::Absent,
        DriverStatus::OnLeave,
        DriverStatus::Sick,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DriverStatus::Available => "AVAILABLE",
            DriverStatus::Absent => "ABSENT",
            DriverStatus::OnLeave => "ON_LEAVE",
            DriverStatus::Sick => "SICK",
        }
    }
}

impl std::fmt::Display for DriverStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Rango de fechas opcional (vacaciones o baja médica)
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct DateRange {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

impl DateRange {
    pub fn new(start: Option<NaiveDate>, end: Option<NaiveDate>) -> Self {
        Self { start, end }
    }

    pub fn is_empty(&self) -> bool {
        self.start.is_none() && self.end.is_none()
    }
}

/// Driver principal - mapea a la tabla drivers
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Driver {
    pub id: Uuid,
    #[serde(rename = "user_id", default)]
    pub user_id: Option<Uuid>,
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub gls_number: String,
    #[serde(default)]
    pub phone: String,
    /// Matrícula del vehículo asignado (clave foránea desnormalizada).
    /// Solo el registro de asignaciones la modifica.
    #[serde(default)]
    pub plate: Option<String>,
    #[serde(default)]
    pub is_beginner: bool,
    #[serde(default)]
    pub status: DriverStatus,
    #[serde(rename = "created_at")]
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub vacation_start: Option<NaiveDate>,
    #[serde(default)]
    pub vacation_end: Option<NaiveDate>,
    #[serde(default)]
    pub sick_start: Option<NaiveDate>,
    #[serde(default)]
    pub sick_end: Option<NaiveDate>,
}

impl Driver {
    /// Nuevo conductor: siempre AVAILABLE y sin vehículo
    pub fn new(first_name: String, last_name: String, gls_number: String, phone: String, is_beginner: bool) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id: None,
            first_name,
            last_name,
            gls_number,
            phone,
            plate: None,
            is_beginner,
            status: DriverStatus::Available,
            created_at: Utc::now(),
            vacation_start: None,
            vacation_end: None,
            sick_start: None,
            sick_end: None,
        }
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name).trim().to_string()
    }

    /// Matrícula actual, ignorando valores vacíos heredados
    pub fn current_plate(&self) -> Option<&str> {
        self.plate.as_deref().filter(|p| !p.trim().is_empty())
    }

    pub fn holds_vehicle(&self) -> bool {
        self.current_plate().is_some()
    }

    pub fn vacation(&self) -> DateRange {
        DateRange::new(self.vacation_start, self.vacation_end)
    }

    pub fn sick_leave(&self) -> DateRange {
        DateRange::new(self.sick_start, self.sick_end)
    }
}

impl StoredEntity for Driver {
    const COLLECTION: Collection = Collection::Drivers;
    const NULLABLE_FIELDS: &'static [&'static str] = &[
        "plate",
        "vacationStart",
        "vacationEnd",
        "sickStart",
        "sickEnd",
        "user_id",
    ];
    const WRITE_ONCE_FIELDS: &'static [&'static str] = &["created_at"];

    fn id(&self) -> Uuid {
        self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_driver_wire_format() {
        let driver = Driver::new(
            "Ana".to_string(),
            "Pop".to_string(),
            "GLS-77".to_string(),
            "+49 170 000".to_string(),
            true,
        );
        let value = serde_json::to_value(&driver).unwrap();

        assert_eq!(value["firstName"], "Ana");
        assert_eq!(value["glsNumber"], "GLS-77");
        assert_eq!(value["isBeginner"], true);
        assert_eq!(value["status"], "Available");
        assert!(value.get("created_at").is_some());
        assert_eq!(value["plate"], serde_json::Value::Null);
    }

    #[test]
    fn test_driver_status_legacy_values() {
        let record = json!({
            "id": Uuid::new_v4(),
            "firstName": "Ion",
            "lastName": "Rus",
            "status": "Urlaub",
            "created_at": "2026-01-10T08:00:00Z"
        });
        let driver: Driver = serde_json::from_value(record).unwrap();
        assert_eq!(driver.status, DriverStatus::OnLeave);
        assert_eq!(driver.plate, None);
        assert!(!driver.holds_vehicle());
    }

    #[test]
    fn test_current_plate_ignores_blank() {
        let mut driver = Driver::new("A".into(), "B".into(), String::new(), String::new(), false);
        driver.plate = Some("  ".to_string());
        assert_eq!(driver.current_plate(), None);
        driver.plate = Some("B NT 123".to_string());
        assert_eq!(driver.current_plate(), Some("B NT 123"));
    }
}
