use axum::{
    extract::{Path, Query, State},
    routing::{get, post},
    Json, Router,
};
use uuid::Uuid;
use validator::Validate;

use crate::dto::fuel_card_dto::{AcceptFuelCardRequest, FuelCardRequestBody};
use crate::dto::{ApiResponse, SearchQuery};
use crate::models::FuelCardRequest;
use crate::services::fuel_card_service::{active_request, pending_requests, search_history};
use crate::services::FuelCardService;
use crate::state::AppState;
use crate::utils::errors::AppError;

pub fn create_fuel_card_router() -> Router<AppState> {
    Router::new()
        .route("/", get(history).post(request_card))
        .route("/pending", get(pending))
        .route("/drivers/:driver_id/active", get(active_for_driver))
        .route("/:id/accept", post(accept))
        .route("/:id/return", post(return_card))
}

async fn history(State(state): State<AppState>, Query(query): Query<SearchQuery>) -> Json<Vec<FuelCardRequest>> {
    let session = state.session.lock().await;
    Json(
        search_history(session.data(), query.search.as_deref())
            .into_iter()
            .cloned()
            .collect(),
    )
}

async fn pending(State(state): State<AppState>) -> Json<Vec<FuelCardRequest>> {
    let session = state.session.lock().await;
    Json(pending_requests(session.data()).into_iter().cloned().collect())
}

async fn active_for_driver(
    State(state): State<AppState>,
    Path(driver_id): Path<Uuid>,
) -> Json<Option<FuelCardRequest>> {
    let session = state.session.lock().await;
    Json(active_request(session.data(), driver_id).cloned())
}

async fn request_card(
    State(state): State<AppState>,
    Json(request): Json<FuelCardRequestBody>,
) -> Result<Json<ApiResponse<FuelCardRequest>>, AppError> {
    request.validate()?;
    let mut session = state.session.lock().await;
    let card = FuelCardService::new(&mut session)
        .request(request.driver_id, &request.vehicle_plate, request.mileage)
        .await?;
    Ok(Json(ApiResponse::success_with_message(card, "Solicitud registrada")))
}

async fn accept(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<AcceptFuelCardRequest>,
) -> Result<Json<ApiResponse<FuelCardRequest>>, AppError> {
    request.validate()?;
    let mut session = state.session.lock().await;
    let card = FuelCardService::new(&mut session)
        .accept(id, &request.card_number)
        .await?;
    Ok(Json(ApiResponse::success(card)))
}

async fn return_card(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<FuelCardRequest>>, AppError> {
    let mut session = state.session.lock().await;
    let card = FuelCardService::new(&mut session).return_card(id).await?;
    Ok(Json(ApiResponse::success(card)))
}
