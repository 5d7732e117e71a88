use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use crate::models::ComplaintStatus;
use crate::services::complaint_service::{ComplaintEdit, NewComplaint};
use crate::utils::validation::validate_not_blank;

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateComplaintRequest {
    pub tour_id: Uuid,
    #[validate(custom = "validate_not_blank")]
    pub package_number: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    #[validate(length(max = 10))]
    pub postal_code: String,
}

impl From<CreateComplaintRequest> for NewComplaint {
    fn from(request: CreateComplaintRequest) -> Self {
        Self {
            tour_id: request.tour_id,
            package_number: request.package_number,
            address: request.address,
            postal_code: request.postal_code,
        }
    }
}

#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateComplaintRequest {
    #[validate(custom = "validate_not_blank")]
    pub package_number: Option<String>,
    pub address: Option<String>,
    #[validate(length(max = 10))]
    pub postal_code: Option<String>,
}

impl From<UpdateComplaintRequest> for ComplaintEdit {
    fn from(request: UpdateComplaintRequest) -> Self {
        Self {
            package_number: request.package_number,
            address: request.address,
            postal_code: request.postal_code,
        }
    }
}

// El operador vuelve a escribir el número de paquete para confirmar
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ResolveComplaintRequest {
    pub status: ComplaintStatus,
    pub confirmation: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComplaintListQuery {
    pub status: Option<ComplaintStatus>,
    pub driver_id: Option<Uuid>,
}
