//! Modelo de FuelCardRequest
//!
//! En memoria se usa camelCase; la tabla `fuel_cards` usa nombres en minúsculas
//! concatenadas (`driverid`, `cardnumber`, ...). `FuelCardRow` es la forma de
//! frontera y las conversiones entre ambas son puras y totales.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::repositories::{Collection, StoreError, StoredEntity};

/// Estado de custodia de la tarjeta
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FuelCardStatus {
    #[default]
    Pending,
    Accepted,
    Returned,
}

impl FuelCardStatus {
    /// PENDING y ACCEPTED bloquean una nueva solicitud del mismo conductor
    pub fn is_outstanding(&self) -> bool {
        !matches!(self, FuelCardStatus::Returned)
    }
}

/// Solicitud de tarjeta de combustible (modelo interno)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FuelCardRequest {
    pub id: Uuid,
    #[serde(rename = "user_id", default)]
    pub user_id: Option<Uuid>,
    pub driver_id: Uuid,
    pub driver_name: String,
    pub vehicle_plate: String,
    /// Kilometraje declarado al solicitar
    pub mileage: u32,
    #[serde(default)]
    pub card_number: Option<String>,
    pub request_date: DateTime<Utc>,
    #[serde(default)]
    pub accepted_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub return_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub status: FuelCardStatus,
}

/// Fila tal como la guarda la tabla `fuel_cards`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FuelCardRow {
    pub id: Uuid,
    #[serde(default)]
    pub user_id: Option<Uuid>,
    pub driverid: Uuid,
    pub drivername: String,
    pub vehicleplate: String,
    pub mileage: u32,
    #[serde(default)]
    pub cardnumber: Option<String>,
    pub requestdate: DateTime<Utc>,
    #[serde(default)]
    pub accepteddate: Option<DateTime<Utc>>,
    #[serde(default)]
    pub returndate: Option<DateTime<Utc>>,
    #[serde(default)]
    pub status: FuelCardStatus,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

impl From<FuelCardRequest> for FuelCardRow {
    fn from(request: FuelCardRequest) -> Self {
        Self {
            id: request.id,
            user_id: request.user_id,
            driverid: request.driver_id,
            drivername: request.driver_name,
            vehicleplate: request.vehicle_plate,
            mileage: request.mileage,
            cardnumber: non_empty(request.card_number),
            requestdate: request.request_date,
            accepteddate: request.accepted_date,
            returndate: request.return_date,
            status: request.status,
        }
    }
}

impl From<FuelCardRow> for FuelCardRequest {
    fn from(row: FuelCardRow) -> Self {
        Self {
            id: row.id,
            user_id: row.user_id,
            driver_id: row.driverid,
            driver_name: row.drivername,
            vehicle_plate: row.vehicleplate,
            mileage: row.mileage,
            card_number: non_empty(row.cardnumber),
            request_date: row.requestdate,
            accepted_date: row.accepteddate,
            return_date: row.returndate,
            status: row.status,
        }
    }
}

impl StoredEntity for FuelCardRequest {
    const COLLECTION: Collection = Collection::FuelCards;
    const NULLABLE_FIELDS: &'static [&'static str] =
        &["cardnumber", "accepteddate", "returndate", "user_id"];
    const WRITE_ONCE_FIELDS: &'static [&'static str] =
        &["driverid", "drivername", "vehicleplate", "requestdate"];

    fn id(&self) -> Uuid {
        self.id
    }

    fn to_record(&self) -> Result<Value, StoreError> {
        Ok(serde_json::to_value(FuelCardRow::from(self.clone()))?)
    }

    fn from_record(record: Value) -> Result<Self, StoreError> {
        let row: FuelCardRow = serde_json::from_value(record)?;
        Ok(row.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> FuelCardRequest {
        FuelCardRequest {
            id: Uuid::new_v4(),
            user_id: Some(Uuid::new_v4()),
            driver_id: Uuid::new_v4(),
            driver_name: "Ana Pop".to_string(),
            vehicle_plate: "B NT 123".to_string(),
            mileage: 125_400,
            card_number: Some("DKV-0042".to_string()),
            request_date: Utc::now(),
            accepted_date: Some(Utc::now()),
            return_date: None,
            status: FuelCardStatus::Accepted,
        }
    }

    #[test]
    fn test_wire_keys_are_lowercase() {
        let record = sample().to_record().unwrap();
        for key in ["driverid", "drivername", "vehicleplate", "cardnumber", "requestdate", "accepteddate", "returndate"] {
            assert!(record.get(key).is_some(), "falta la clave {}", key);
        }
        assert!(record.get("driverId").is_none());
        assert_eq!(record["status"], "ACCEPTED");
    }

    #[test]
    fn test_mapping_round_trip() {
        let original = sample();
        let record = original.to_record().unwrap();
        let back = FuelCardRequest::from_record(record).unwrap();
        assert_eq!(back, original);

        let pending = FuelCardRequest {
            card_number: None,
            accepted_date: None,
            status: FuelCardStatus::Pending,
            ..sample()
        };
        let back = FuelCardRequest::from_record(pending.to_record().unwrap()).unwrap();
        assert_eq!(back, pending);
    }

    #[test]
    fn test_empty_card_number_is_absent() {
        let request = FuelCardRequest {
            card_number: Some(String::new()),
            ..sample()
        };
        let record = request.to_record().unwrap();
        assert_eq!(record["cardnumber"], Value::Null);

        let row = json!({
            "id": Uuid::new_v4(),
            "driverid": Uuid::new_v4(),
            "drivername": "Ion Rus",
            "vehicleplate": "HH AB 9",
            "mileage": 10,
            "cardnumber": "",
            "requestdate": "2026-10-01T07:30:00Z",
            "status": "PENDING"
        });
        let parsed = FuelCardRequest::from_record(row).unwrap();
        assert_eq!(parsed.card_number, None);
        assert_eq!(parsed.status, FuelCardStatus::Pending);
    }
}
