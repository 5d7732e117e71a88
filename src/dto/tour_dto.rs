use chrono::NaiveDate;
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use crate::models::TourType;
use crate::services::control_service::ChecklistInput;
use crate::services::tour_service::{NewStopPlan, TourSchedule};
use crate::utils::validation::validate_not_blank;

// Programar o actualizar la tour de (date, tourNumber)
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleTourRequest {
    #[validate(custom = "validate_not_blank")]
    pub tour_number: String,
    pub date: NaiveDate,
    #[serde(default)]
    pub city: String,
    pub driver_id: Uuid,
    pub beginner_driver_id: Option<Uuid>,
    pub vehicle_plate: Option<String>,
    #[serde(default)]
    pub tour_type: TourType,
}

impl From<ScheduleTourRequest> for TourSchedule {
    fn from(request: ScheduleTourRequest) -> Self {
        Self {
            tour_number: request.tour_number,
            date: request.date,
            city: request.city,
            driver_id: request.driver_id,
            beginner_driver_id: request.beginner_driver_id,
            vehicle_plate: request.vehicle_plate,
            tour_type: request.tour_type,
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CompleteTourRequest {
    pub total_stops: u32,
    pub total_packages: u32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TourListQuery {
    pub date: NaiveDate,
    pub driver_id: Option<Uuid>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateStopPlanRequest {
    pub date: Option<NaiveDate>,
    #[serde(default)]
    pub addresses: String,
    #[serde(default)]
    pub packages: u32,
    #[serde(default)]
    pub stops: u32,
}

impl From<CreateStopPlanRequest> for NewStopPlan {
    fn from(request: CreateStopPlanRequest) -> Self {
        Self {
            date: request.date,
            addresses: request.addresses,
            packages: request.packages,
            stops: request.stops,
        }
    }
}

// Control de seguridad del conductor
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateControlRequest {
    pub driver_id: Uuid,
    #[serde(default)]
    pub safety_net: bool,
    #[serde(default)]
    pub fire_extinguisher: bool,
    #[serde(default)]
    pub safe_shoes: bool,
    #[serde(default)]
    pub cleanliness: bool,
    pub signature: Option<String>,
}

impl From<CreateControlRequest> for ChecklistInput {
    fn from(request: CreateControlRequest) -> Self {
        Self {
            driver_id: request.driver_id,
            safety_net: request.safety_net,
            fire_extinguisher: request.fire_extinguisher,
            safe_shoes: request.safe_shoes,
            cleanliness: request.cleanliness,
            signature: request.signature,
        }
    }
}
