//! Rutas transversales: panel, auditoría de asignaciones, sesión y
//! reintento de sagas a medias.

use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use serde_json::{json, Value};
use tracing::info;

use crate::dto::ApiResponse;
use crate::services::assignment_registry::audit;
use crate::services::dashboard_service::{summary, DashboardSummary};
use crate::services::reconciliation::WritePlan;
use crate::services::InvariantBreach;
use crate::state::AppState;
use crate::utils::errors::AppError;

pub fn create_dashboard_router() -> Router<AppState> {
    Router::new().route("/", get(dashboard))
}

pub fn create_assignment_router() -> Router<AppState> {
    Router::new().route("/audit", get(assignment_audit))
}

pub fn create_session_router() -> Router<AppState> {
    Router::new()
        .route("/", get(session_status))
        .route("/refresh", post(refresh))
}

pub fn create_reconciliation_router() -> Router<AppState> {
    Router::new()
        .route("/pending", get(pending_plan))
        .route("/retry", post(retry))
}

async fn dashboard(State(state): State<AppState>) -> Json<DashboardSummary> {
    let session = state.session.lock().await;
    let today = Utc::now().date_naive();
    Json(summary(session.data(), today, state.config.alert_horizons))
}

async fn assignment_audit(State(state): State<AppState>) -> Json<Value> {
    let session = state.session.lock().await;
    let breaches: Vec<InvariantBreach> = audit(&session);
    Json(json!({
        "consistent": breaches.is_empty(),
        "breaches": breaches,
    }))
}

async fn session_status(State(state): State<AppState>) -> Json<Value> {
    let session = state.session.lock().await;
    let data = session.data();
    Json(json!({
        "open": session.is_open(),
        "operatorId": session.operator_id(),
        "pendingWrites": session.pending_plan().map_or(0, |plan| plan.steps.len()),
        "drivers": data.drivers.len(),
        "inventory": data.inventory.len(),
        "tours": data.tours.len(),
    }))
}

async fn refresh(State(state): State<AppState>) -> Result<Json<ApiResponse<()>>, AppError> {
    let mut session = state.session.lock().await;
    session.refresh().await?;
    info!("🔄 Sesión recargada desde el store");
    Ok(Json(ApiResponse::done("Colecciones recargadas")))
}

async fn pending_plan(State(state): State<AppState>) -> Json<Option<WritePlan>> {
    let session = state.session.lock().await;
    Json(session.pending_plan().cloned())
}

async fn retry(State(state): State<AppState>) -> Result<Json<ApiResponse<usize>>, AppError> {
    let mut session = state.session.lock().await;
    let applied = session.retry_pending().await?;
    Ok(Json(ApiResponse::success_with_message(applied, "Escrituras pendientes aplicadas")))
}
