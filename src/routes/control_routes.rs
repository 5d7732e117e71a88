use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::dto::tour_dto::CreateControlRequest;
use crate::dto::ApiResponse;
use crate::models::ControlChecklist;
use crate::services::control_service::driver_controls;
use crate::services::ControlService;
use crate::state::AppState;
use crate::utils::errors::AppError;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ControlListQuery {
    driver_id: Option<Uuid>,
}

pub fn create_control_router() -> Router<AppState> {
    Router::new().route("/", get(list).post(record))
}

async fn list(State(state): State<AppState>, Query(query): Query<ControlListQuery>) -> Json<Vec<ControlChecklist>> {
    let session = state.session.lock().await;
    let controls = match query.driver_id {
        Some(driver_id) => driver_controls(session.data(), driver_id).into_iter().cloned().collect(),
        None => session.data().controls.clone(),
    };
    Json(controls)
}

async fn record(
    State(state): State<AppState>,
    Json(request): Json<CreateControlRequest>,
) -> Result<Json<ApiResponse<ControlChecklist>>, AppError> {
    let mut session = state.session.lock().await;
    let checklist = ControlService::new(&mut session).record(request.into()).await?;
    Ok(Json(ApiResponse::success(checklist)))
}
