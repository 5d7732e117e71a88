use axum::{
    extract::{Path, Query, State},
    routing::{get, post},
    Json, Router,
};
use uuid::Uuid;
use validator::Validate;

use crate::dto::vehicle_dto::{
    AssignVehicleRequest, CreateVehicleRequest, EnterServiceRequest, UpdateVehicleRequest, VehicleListQuery,
};
use crate::dto::ApiResponse;
use crate::models::InventoryItem;
use crate::services::vehicle_service::list_vehicles;
use crate::services::{AssignmentRegistry, VehicleService};
use crate::state::AppState;
use crate::utils::errors::AppError;

pub fn create_vehicle_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list).post(create))
        .route("/:id", get(get_vehicle).put(update))
        .route("/:id/assign", post(assign))
        .route("/:id/release", post(release))
        .route("/:id/service", post(enter_service).delete(clear_service_schedule))
        .route("/:id/service/return", post(return_from_service))
}

async fn list(
    State(state): State<AppState>,
    Query(query): Query<VehicleListQuery>,
) -> Json<Vec<InventoryItem>> {
    let session = state.session.lock().await;
    Json(
        list_vehicles(session.data(), query.filter, query.search.as_deref())
            .into_iter()
            .cloned()
            .collect(),
    )
}

async fn get_vehicle(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<InventoryItem>, AppError> {
    let session = state.session.lock().await;
    Ok(Json(session.get::<InventoryItem>(id)?))
}

async fn create(
    State(state): State<AppState>,
    Json(request): Json<CreateVehicleRequest>,
) -> Result<Json<ApiResponse<InventoryItem>>, AppError> {
    request.validate()?;
    let mut session = state.session.lock().await;
    let vehicle = VehicleService::new(&mut session).create(request.into()).await?;
    Ok(Json(ApiResponse::success_with_message(vehicle, "Vehículo creado")))
}

async fn update(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateVehicleRequest>,
) -> Result<Json<ApiResponse<InventoryItem>>, AppError> {
    request.validate()?;
    let mut session = state.session.lock().await;
    let vehicle = VehicleService::new(&mut session).update(id, request.into()).await?;
    Ok(Json(ApiResponse::success(vehicle)))
}

async fn assign(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<AssignVehicleRequest>,
) -> Result<Json<ApiResponse<InventoryItem>>, AppError> {
    request.validate()?;
    let mut session = state.session.lock().await;
    AssignmentRegistry::new(&mut session)
        .assign(request.driver_id, id, &request.signature)
        .await?;
    Ok(Json(ApiResponse::success_with_message(
        session.get::<InventoryItem>(id)?,
        "Vehículo asignado",
    )))
}

async fn release(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<InventoryItem>>, AppError> {
    let mut session = state.session.lock().await;
    AssignmentRegistry::new(&mut session).release_vehicle(id).await?;
    Ok(Json(ApiResponse::success_with_message(
        session.get::<InventoryItem>(id)?,
        "Vehículo liberado",
    )))
}

async fn enter_service(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<EnterServiceRequest>,
) -> Result<Json<ApiResponse<InventoryItem>>, AppError> {
    request.validate()?;
    let mut session = state.session.lock().await;
    let vehicle = VehicleService::new(&mut session).enter_service(id, request.into()).await?;
    Ok(Json(ApiResponse::success(vehicle)))
}

async fn return_from_service(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<InventoryItem>>, AppError> {
    let mut session = state.session.lock().await;
    let vehicle = VehicleService::new(&mut session).return_from_service(id).await?;
    Ok(Json(ApiResponse::success(vehicle)))
}

async fn clear_service_schedule(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<InventoryItem>>, AppError> {
    let mut session = state.session.lock().await;
    let vehicle = VehicleService::new(&mut session).clear_service_schedule(id).await?;
    Ok(Json(ApiResponse::success(vehicle)))
}
