//! Routers HTTP
//!
//! Un router por área, anidados bajo `/api`, sobre la sesión compartida.

pub mod complaint_routes;
pub mod control_routes;
pub mod driver_routes;
pub mod fleet_routes;
pub mod fuel_card_routes;
pub mod inventory_routes;
pub mod tour_routes;
pub mod vehicle_routes;

use axum::{routing::get, Json, Router};
use serde_json::{json, Value};
use tower_http::trace::TraceLayer;

use crate::middleware::cors_layer;
use crate::state::AppState;

/// Router completo de la aplicación con CORS y trazas
pub fn create_app_router(state: AppState) -> Router {
    let cors = cors_layer(&state.config.cors_origins);

    Router::new()
        .route("/health", get(health))
        .nest("/api/session", fleet_routes::create_session_router())
        .nest("/api/drivers", driver_routes::create_driver_router())
        .nest("/api/vehicles", vehicle_routes::create_vehicle_router())
        .nest("/api/inventory", inventory_routes::create_inventory_router())
        .nest("/api/complaints", complaint_routes::create_complaint_router())
        .nest("/api/fuel-cards", fuel_card_routes::create_fuel_card_router())
        .nest("/api/tours", tour_routes::create_tour_router())
        .nest("/api/stops", tour_routes::create_stop_router())
        .nest("/api/controls", control_routes::create_control_router())
        .nest("/api/dashboard", fleet_routes::create_dashboard_router())
        .nest("/api/assignments", fleet_routes::create_assignment_router())
        .nest("/api/reconciliation", fleet_routes::create_reconciliation_router())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
