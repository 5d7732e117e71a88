use axum::{
    extract::{Path, Query, State},
    routing::{get, post},
    Json, Router,
};
use uuid::Uuid;
use validator::Validate;

use crate::dto::inventory_dto::{CreateItemRequest, HandOutRequest, InventoryListQuery, UpdateItemRequest};
use crate::dto::ApiResponse;
use crate::models::{AssignmentRecord, InventoryItem};
use crate::services::inventory_ledger::{current_holders, driver_records, list_items, Holder};
use crate::services::InventoryLedger;
use crate::state::AppState;
use crate::utils::errors::AppError;

pub fn create_inventory_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list).post(create))
        .route("/:id", get(get_item).put(update))
        .route("/:id/holders", get(holders))
        .route("/:id/hand-out", post(hand_out))
        .route("/:id/records/:record_id/return", post(mark_returned))
        .route("/drivers/:driver_id/records", get(records_for_driver))
}

async fn list(
    State(state): State<AppState>,
    Query(query): Query<InventoryListQuery>,
) -> Json<Vec<InventoryItem>> {
    let session = state.session.lock().await;
    Json(
        list_items(session.data(), query.item_type, query.category, query.search.as_deref())
            .into_iter()
            .cloned()
            .collect(),
    )
}

async fn get_item(State(state): State<AppState>, Path(id): Path<Uuid>) -> Result<Json<InventoryItem>, AppError> {
    let session = state.session.lock().await;
    Ok(Json(session.get::<InventoryItem>(id)?))
}

async fn create(
    State(state): State<AppState>,
    Json(request): Json<CreateItemRequest>,
) -> Result<Json<ApiResponse<InventoryItem>>, AppError> {
    request.validate()?;
    let mut session = state.session.lock().await;
    let item = InventoryLedger::new(&mut session).create(request.into()).await?;
    Ok(Json(ApiResponse::success(item)))
}

async fn update(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateItemRequest>,
) -> Result<Json<ApiResponse<InventoryItem>>, AppError> {
    request.validate()?;
    let mut session = state.session.lock().await;
    let item = InventoryLedger::new(&mut session).update(id, request.into()).await?;
    Ok(Json(ApiResponse::success(item)))
}

async fn holders(State(state): State<AppState>, Path(id): Path<Uuid>) -> Result<Json<Vec<Holder>>, AppError> {
    let session = state.session.lock().await;
    let item = session.get::<InventoryItem>(id)?;
    Ok(Json(current_holders(session.data(), &item)))
}

async fn hand_out(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<HandOutRequest>,
) -> Result<Json<ApiResponse<AssignmentRecord>>, AppError> {
    request.validate()?;
    let mut session = state.session.lock().await;
    let record = InventoryLedger::new(&mut session)
        .hand_out(id, request.driver_id, request.quantity, &request.signature)
        .await?;
    Ok(Json(ApiResponse::success_with_message(record, "Material entregado")))
}

async fn mark_returned(
    State(state): State<AppState>,
    Path((id, record_id)): Path<(Uuid, String)>,
) -> Result<Json<ApiResponse<InventoryItem>>, AppError> {
    let mut session = state.session.lock().await;
    let item = InventoryLedger::new(&mut session).mark_returned(id, &record_id).await?;
    Ok(Json(ApiResponse::success_with_message(item, "Material devuelto")))
}

async fn records_for_driver(
    State(state): State<AppState>,
    Path(driver_id): Path<Uuid>,
) -> Json<Vec<AssignmentRecord>> {
    let session = state.session.lock().await;
    Json(driver_records(session.data(), driver_id).into_iter().cloned().collect())
}
