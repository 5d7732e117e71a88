use chrono::NaiveDate;
use serde::Deserialize;
use validator::Validate;

use crate::models::{DateRange, DriverStatus};
use crate::services::driver_service::{DriverFilter, DriverProfile, NewDriver, StatusChange};
use crate::services::status_machine::LeaveReturn;
use crate::utils::validation::validate_not_blank;

// Request para dar de alta un conductor
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateDriverRequest {
    #[validate(custom = "validate_not_blank")]
    pub first_name: String,
    #[validate(custom = "validate_not_blank")]
    pub last_name: String,
    #[serde(default)]
    pub gls_number: String,
    #[serde(default)]
    #[validate(length(max = 32))]
    pub phone: String,
    #[serde(default)]
    pub is_beginner: bool,
}

impl From<CreateDriverRequest> for NewDriver {
    fn from(request: CreateDriverRequest) -> Self {
        Self {
            first_name: request.first_name,
            last_name: request.last_name,
            gls_number: request.gls_number,
            phone: request.phone,
            is_beginner: request.is_beginner,
        }
    }
}

// Request para editar el perfil
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateDriverRequest {
    #[validate(custom = "validate_not_blank")]
    pub first_name: Option<String>,
    #[validate(custom = "validate_not_blank")]
    pub last_name: Option<String>,
    pub gls_number: Option<String>,
    #[validate(length(max = 32))]
    pub phone: Option<String>,
    pub is_beginner: Option<bool>,
}

impl From<UpdateDriverRequest> for DriverProfile {
    fn from(request: UpdateDriverRequest) -> Self {
        Self {
            first_name: request.first_name,
            last_name: request.last_name,
            gls_number: request.gls_number,
            phone: request.phone,
            is_beginner: request.is_beginner,
        }
    }
}

// Request de cambio de disponibilidad
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ChangeStatusRequest {
    pub status: DriverStatus,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    /// Obligatorio al pasar a vacaciones con vehículo asignado
    pub leave_return: Option<LeaveReturn>,
}

impl From<ChangeStatusRequest> for StatusChange {
    fn from(request: ChangeStatusRequest) -> Self {
        let range = DateRange::new(request.start_date, request.end_date);
        Self {
            status: request.status,
            range: (!range.is_empty()).then_some(range),
            leave_return: request.leave_return,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct DriverListQuery {
    #[serde(default)]
    pub filter: DriverFilter,
    pub search: Option<String>,
}
