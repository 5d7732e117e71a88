use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;

use fleet_operations::config::EnvironmentConfig;
use fleet_operations::repositories::{EntityRepository, InMemoryStore};
use fleet_operations::routes::create_app_router;
use fleet_operations::{AppState, FleetSession};

async fn create_test_app() -> Router {
    let store = Arc::new(InMemoryStore::new());
    let session = FleetSession::open(EntityRepository::new(store), Some(Uuid::new_v4()))
        .await
        .unwrap();
    create_app_router(AppState::new(EnvironmentConfig::default(), session))
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

async fn create_driver(app: &Router, first_name: &str) -> String {
    let (status, body) = send(
        app,
        "POST",
        "/api/drivers",
        Some(json!({ "firstName": first_name, "lastName": "Pop", "glsNumber": "GLS-1" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    body["data"]["id"].as_str().unwrap().to_string()
}

async fn create_vehicle(app: &Router) -> String {
    let (status, body) = send(
        app,
        "POST",
        "/api/vehicles",
        Some(json!({
            "name": "Sprinter",
            "plate": { "city": "b", "letters": "nt", "numbers": "123" }
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["plate"], "B NT 123");
    body["data"]["id"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn test_health_check() {
    let app = create_test_app().await;
    let (status, body) = send(&app, "GET", "/health", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_invalid_driver_payload_rejected() {
    let app = create_test_app().await;
    let (status, body) = send(
        &app,
        "POST",
        "/api/drivers",
        Some(json!({ "firstName": "  ", "lastName": "Pop" })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "INVALID_REQUEST");
}

#[tokio::test]
async fn test_assignment_over_http() {
    let app = create_test_app().await;
    let driver_id = create_driver(&app, "Ana").await;
    let vehicle_id = create_vehicle(&app).await;

    let (status, body) = send(
        &app,
        "POST",
        &format!("/api/vehicles/{}/assign", vehicle_id),
        Some(json!({ "driverId": driver_id, "signature": "sig1" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["vehicleStatus"], "Allocated");

    let (_, driver) = send(&app, "GET", &format!("/api/drivers/{}", driver_id), None).await;
    assert_eq!(driver["plate"], "B NT 123");

    let (_, audit) = send(&app, "GET", "/api/assignments/audit", None).await;
    assert_eq!(audit["consistent"], true);

    // Vacaciones con vehículo sin decisión: 409
    let (status, body) = send(
        &app,
        "POST",
        &format!("/api/drivers/{}/status", driver_id),
        Some(json!({ "status": "Urlaub" })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "LEAVE_RETURN_DECISION_REQUIRED");

    let (status, body) = send(
        &app,
        "POST",
        &format!("/api/drivers/{}/status", driver_id),
        Some(json!({ "status": "Urlaub", "leaveReturn": "returned" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["plate"], Value::Null);

    let (_, vehicle) = send(&app, "GET", &format!("/api/vehicles/{}", vehicle_id), None).await;
    assert_eq!(vehicle["vehicleStatus"], "Active");
    assert_eq!(vehicle["assignedTo"], Value::Null);
}

#[tokio::test]
async fn test_service_entry_requires_location_and_problem() {
    let app = create_test_app().await;
    let vehicle_id = create_vehicle(&app).await;
    let uri = format!("/api/vehicles/{}/service", vehicle_id);

    let (status, body) = send(
        &app,
        "POST",
        &uri,
        Some(json!({ "mode": "immediate", "location": "", "problem": "Bremsen" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "INVALID_REQUEST");

    let (status, body) = send(
        &app,
        "POST",
        &uri,
        Some(json!({ "mode": "immediate", "location": "Werkstatt Nord", "problem": "Bremsen" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["vehicleStatus"], "Service");
    assert_eq!(body["data"]["serviceLocation"], "Werkstatt Nord");
}

#[tokio::test]
async fn test_inventory_filtered_by_category() {
    let app = create_test_app().await;
    for (name, consumable) in [("Handschuhe", true), ("Scanner", false)] {
        let (status, _) = send(
            &app,
            "POST",
            "/api/inventory",
            Some(json!({ "type": "Other", "name": name, "quantity": 5, "isConsumable": consumable })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }

    let (status, body) = send(&app, "GET", "/api/inventory?category=consumable", None).await;
    assert_eq!(status, StatusCode::OK);
    let items = body.as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["name"], "Handschuhe");
}

#[tokio::test]
async fn test_unknown_driver_is_not_found() {
    let app = create_test_app().await;
    let (status, body) = send(&app, "GET", &format!("/api/drivers/{}", Uuid::new_v4()), None).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "NOT_FOUND");
}

#[tokio::test]
async fn test_fuel_card_lifecycle_over_http() {
    let app = create_test_app().await;
    let driver_id = create_driver(&app, "Ion").await;

    let (status, body) = send(
        &app,
        "POST",
        "/api/fuel-cards",
        Some(json!({ "driverId": driver_id, "vehiclePlate": "B NT 123", "mileage": 1200 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "PENDING");
    let card_id = body["data"]["id"].as_str().unwrap().to_string();

    let (status, _) = send(&app, "POST", &format!("/api/fuel-cards/{}/return", card_id), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = send(
        &app,
        "POST",
        &format!("/api/fuel-cards/{}/accept", card_id),
        Some(json!({ "cardNumber": "DKV-1" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "ACCEPTED");

    let (_, pending) = send(&app, "GET", "/api/fuel-cards/pending", None).await;
    assert_eq!(pending.as_array().map(Vec::len), Some(0));
}

#[tokio::test]
async fn test_dashboard_and_retry_without_pending() {
    let app = create_test_app().await;
    create_vehicle(&app).await;

    let (status, body) = send(&app, "GET", "/api/dashboard", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["metrics"]["vehicles"], 1);

    let (status, _) = send(&app, "POST", "/api/reconciliation/retry", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
