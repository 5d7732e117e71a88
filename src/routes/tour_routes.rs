use axum::{
    extract::{Path, Query, State},
    routing::{get, post},
    Json, Router,
};
use uuid::Uuid;
use validator::Validate;

use crate::dto::tour_dto::{CompleteTourRequest, CreateStopPlanRequest, ScheduleTourRequest, TourListQuery};
use crate::dto::ApiResponse;
use crate::models::{StopPlan, Tour};
use crate::services::tour_service::{driver_day_tours, tours_for_date};
use crate::services::TourService;
use crate::state::AppState;
use crate::utils::errors::AppError;

pub fn create_tour_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list).post(schedule))
        .route("/:id", get(get_tour))
        .route("/:id/complete", post(complete))
}

pub fn create_stop_router() -> Router<AppState> {
    Router::new().route("/", get(list_stop_plans).post(record_stop_plan))
}

async fn list(State(state): State<AppState>, Query(query): Query<TourListQuery>) -> Json<Vec<Tour>> {
    let session = state.session.lock().await;
    let tours = match query.driver_id {
        Some(driver_id) => driver_day_tours(session.data(), driver_id, query.date),
        None => tours_for_date(session.data(), query.date),
    };
    Json(tours.into_iter().cloned().collect())
}

async fn get_tour(State(state): State<AppState>, Path(id): Path<Uuid>) -> Result<Json<Tour>, AppError> {
    let session = state.session.lock().await;
    Ok(Json(session.get::<Tour>(id)?))
}

async fn schedule(
    State(state): State<AppState>,
    Json(request): Json<ScheduleTourRequest>,
) -> Result<Json<ApiResponse<Tour>>, AppError> {
    request.validate()?;
    let mut session = state.session.lock().await;
    let tour = TourService::new(&mut session).schedule(request.into()).await?;
    Ok(Json(ApiResponse::success(tour)))
}

async fn complete(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<CompleteTourRequest>,
) -> Result<Json<ApiResponse<Tour>>, AppError> {
    let mut session = state.session.lock().await;
    let tour = TourService::new(&mut session)
        .complete(id, request.total_stops, request.total_packages)
        .await?;
    Ok(Json(ApiResponse::success_with_message(tour, "Tour completada")))
}

async fn list_stop_plans(State(state): State<AppState>) -> Json<Vec<StopPlan>> {
    let session = state.session.lock().await;
    Json(session.data().stops.clone())
}

async fn record_stop_plan(
    State(state): State<AppState>,
    Json(request): Json<CreateStopPlanRequest>,
) -> Result<Json<ApiResponse<StopPlan>>, AppError> {
    let mut session = state.session.lock().await;
    let plan = TourService::new(&mut session).record_stop_plan(request.into()).await?;
    Ok(Json(ApiResponse::success(plan)))
}
