use axum::{
    extract::{Path, Query, State},
    routing::{get, post},
    Json, Router,
};
use uuid::Uuid;
use validator::Validate;

use crate::dto::driver_dto::{ChangeStatusRequest, CreateDriverRequest, DriverListQuery, UpdateDriverRequest};
use crate::dto::ApiResponse;
use crate::models::Driver;
use crate::services::driver_service::{assignment_candidates, count_drivers, list_drivers, DriverCounts};
use crate::services::{AssignmentRegistry, DriverService};
use crate::state::AppState;
use crate::utils::errors::AppError;

pub fn create_driver_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list).post(create))
        .route("/counts", get(counts))
        .route("/candidates", get(candidates))
        .route("/:id", get(get_driver).put(update).delete(delete_driver))
        .route("/:id/status", post(change_status))
        .route("/:id/release", post(release_vehicle))
}

async fn list(
    State(state): State<AppState>,
    Query(query): Query<DriverListQuery>,
) -> Result<Json<Vec<Driver>>, AppError> {
    let session = state.session.lock().await;
    let drivers = list_drivers(session.data(), query.filter, query.search.as_deref())
        .into_iter()
        .cloned()
        .collect();
    Ok(Json(drivers))
}

async fn counts(State(state): State<AppState>) -> Json<DriverCounts> {
    let session = state.session.lock().await;
    Json(count_drivers(session.data()))
}

async fn candidates(State(state): State<AppState>) -> Json<Vec<Driver>> {
    let session = state.session.lock().await;
    Json(assignment_candidates(session.data()).into_iter().cloned().collect())
}

async fn get_driver(State(state): State<AppState>, Path(id): Path<Uuid>) -> Result<Json<Driver>, AppError> {
    let session = state.session.lock().await;
    Ok(Json(session.get::<Driver>(id)?))
}

async fn create(
    State(state): State<AppState>,
    Json(request): Json<CreateDriverRequest>,
) -> Result<Json<ApiResponse<Driver>>, AppError> {
    request.validate()?;
    let mut session = state.session.lock().await;
    let driver = DriverService::new(&mut session).create(request.into()).await?;
    Ok(Json(ApiResponse::success_with_message(driver, "Conductor creado")))
}

async fn update(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateDriverRequest>,
) -> Result<Json<ApiResponse<Driver>>, AppError> {
    request.validate()?;
    let mut session = state.session.lock().await;
    let driver = DriverService::new(&mut session).update_profile(id, request.into()).await?;
    Ok(Json(ApiResponse::success(driver)))
}

async fn change_status(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<ChangeStatusRequest>,
) -> Result<Json<ApiResponse<Driver>>, AppError> {
    request.validate()?;
    let mut session = state.session.lock().await;
    let driver = DriverService::new(&mut session).change_status(id, request.into()).await?;
    Ok(Json(ApiResponse::success(driver)))
}

async fn release_vehicle(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<Driver>>, AppError> {
    let mut session = state.session.lock().await;
    AssignmentRegistry::new(&mut session).release_driver(id).await?;
    Ok(Json(ApiResponse::success_with_message(
        session.get::<Driver>(id)?,
        "Vehículo liberado",
    )))
}

async fn delete_driver(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<()>>, AppError> {
    let mut session = state.session.lock().await;
    DriverService::new(&mut session).delete(id).await?;
    Ok(Json(ApiResponse::done("Conductor eliminado")))
}
