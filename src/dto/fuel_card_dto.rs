use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use crate::utils::validation::validate_not_blank;

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct FuelCardRequestBody {
    pub driver_id: Uuid,
    #[validate(custom = "validate_not_blank")]
    pub vehicle_plate: String,
    pub mileage: u32,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AcceptFuelCardRequest {
    #[validate(custom = "validate_not_blank")]
    pub card_number: String,
}
