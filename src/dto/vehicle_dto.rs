use chrono::NaiveDate;
use serde::{Deserialize, Deserializer};
use uuid::Uuid;
use validator::Validate;

use crate::services::status_machine::ServiceMode;
use crate::services::vehicle_service::{NewVehicle, PlateParts, ServiceRequest, VehicleEdit, VehicleFilter};
use crate::utils::validation::validate_not_blank;

// Partes de la matrícula: ciudad, letras y números
#[derive(Debug, Deserialize, Validate)]
pub struct PlateRequest {
    #[validate(custom = "validate_not_blank")]
    pub city: String,
    #[validate(custom = "validate_not_blank")]
    pub letters: String,
    #[validate(custom = "validate_not_blank")]
    pub numbers: String,
}

impl From<PlateRequest> for PlateParts {
    fn from(request: PlateRequest) -> Self {
        Self {
            city: request.city,
            letters: request.letters,
            numbers: request.numbers,
        }
    }
}

// Request para crear un vehículo
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateVehicleRequest {
    #[validate(custom = "validate_not_blank")]
    pub name: String,
    #[validate]
    pub plate: PlateRequest,
    pub hu_expiration: Option<NaiveDate>,
}

impl From<CreateVehicleRequest> for NewVehicle {
    fn from(request: CreateVehicleRequest) -> Self {
        Self {
            name: request.name,
            plate: request.plate.into(),
            hu_expiration: request.hu_expiration,
        }
    }
}

// Distingue "campo ausente" de "campo a null"
fn explicit_null<'de, D>(deserializer: D) -> Result<Option<Option<NaiveDate>>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<NaiveDate>::deserialize(deserializer).map(Some)
}

// Request para actualizar un vehículo
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateVehicleRequest {
    #[validate(custom = "validate_not_blank")]
    pub name: Option<String>,
    #[validate]
    pub plate: Option<PlateRequest>,
    #[serde(default, deserialize_with = "explicit_null")]
    pub hu_expiration: Option<Option<NaiveDate>>,
}

impl From<UpdateVehicleRequest> for VehicleEdit {
    fn from(request: UpdateVehicleRequest) -> Self {
        Self {
            name: request.name,
            plate: request.plate.map(Into::into),
            hu_expiration: request.hu_expiration,
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AssignVehicleRequest {
    pub driver_id: Uuid,
    /// Firma del conductor al recibir el vehículo
    #[validate(custom = "validate_not_blank")]
    pub signature: String,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct EnterServiceRequest {
    pub mode: ServiceMode,
    #[serde(default)]
    #[validate(custom = "validate_not_blank")]
    pub location: String,
    #[serde(default)]
    #[validate(custom = "validate_not_blank")]
    pub problem: String,
    pub end_date: Option<NaiveDate>,
}

impl From<EnterServiceRequest> for ServiceRequest {
    fn from(request: EnterServiceRequest) -> Self {
        Self {
            mode: request.mode,
            location: request.location,
            problem: request.problem,
            end_date: request.end_date,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct VehicleListQuery {
    #[serde(default)]
    pub filter: VehicleFilter,
    pub search: Option<String>,
}
