use axum::{
    extract::{Path, Query, State},
    routing::{get, post},
    Json, Router,
};
use uuid::Uuid;
use validator::Validate;

use crate::dto::complaint_dto::{
    ComplaintListQuery, CreateComplaintRequest, ResolveComplaintRequest, UpdateComplaintRequest,
};
use crate::dto::ApiResponse;
use crate::models::Complaint;
use crate::services::complaint_service::list_complaints;
use crate::services::ComplaintService;
use crate::state::AppState;
use crate::utils::errors::AppError;

pub fn create_complaint_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list).post(create))
        .route("/:id", get(get_complaint).put(update))
        .route("/:id/resolve", post(resolve))
}

async fn list(
    State(state): State<AppState>,
    Query(query): Query<ComplaintListQuery>,
) -> Json<Vec<Complaint>> {
    let session = state.session.lock().await;
    Json(
        list_complaints(session.data(), query.status)
            .into_iter()
            .filter(|c| query.driver_id.map_or(true, |id| c.driver_id == id))
            .cloned()
            .collect(),
    )
}

async fn get_complaint(State(state): State<AppState>, Path(id): Path<Uuid>) -> Result<Json<Complaint>, AppError> {
    let session = state.session.lock().await;
    Ok(Json(session.get::<Complaint>(id)?))
}

async fn create(
    State(state): State<AppState>,
    Json(request): Json<CreateComplaintRequest>,
) -> Result<Json<ApiResponse<Complaint>>, AppError> {
    request.validate()?;
    let mut session = state.session.lock().await;
    let complaint = ComplaintService::new(&mut session).create(request.into()).await?;
    Ok(Json(ApiResponse::success_with_message(complaint, "Reclamación registrada")))
}

async fn update(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateComplaintRequest>,
) -> Result<Json<ApiResponse<Complaint>>, AppError> {
    request.validate()?;
    let mut session = state.session.lock().await;
    let complaint = ComplaintService::new(&mut session)
        .update_details(id, request.into())
        .await?;
    Ok(Json(ApiResponse::success(complaint)))
}

async fn resolve(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<ResolveComplaintRequest>,
) -> Result<Json<ApiResponse<Complaint>>, AppError> {
    let mut session = state.session.lock().await;
    let complaint = ComplaintService::new(&mut session)
        .resolve(id, request.status, &request.confirmation)
        .await?;
    Ok(Json(ApiResponse::success_with_message(complaint, "Reclamación cerrada")))
}
