//! Métricas del panel y alertas de mantenimiento y taller
//!
//! Todo se calcula sobre las colecciones ya cargadas en la sesión.

use chrono::NaiveDate;
use serde::Serialize;
use uuid::Uuid;

use crate::models::{FuelCardStatus, VehicleStatus};
use crate::services::session::FleetData;
use crate::services::status_machine::{classify_deadline, Urgency};

/// Horizontes de aviso en días
#[derive(Debug, Clone, Copy)]
pub struct AlertHorizons {
    pub hu_warning_days: i64,
    pub service_warning_days: i64,
}

impl Default for AlertHorizons {
    fn default() -> Self {
        Self {
            hu_warning_days: 30,
            service_warning_days: 3,
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DashboardMetrics {
    pub drivers: usize,
    pub vehicles: usize,
    pub pending_complaints: usize,
    pub vehicles_in_service: usize,
    pub inventory_items: usize,
    pub fuel_cards: usize,
    pub pending_fuel_requests: usize,
}

/// Inspección técnica (HU) vencida o próxima
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct MaintenanceAlert {
    pub vehicle_id: Uuid,
    pub name: String,
    pub plate: Option<String>,
    pub hu_expiration: NaiveDate,
    pub days_left: i64,
    pub expired: bool,
}

/// Vehículo en taller o con una ventana programada
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ServiceAlert {
    pub vehicle_id: Uuid,
    pub name: String,
    pub plate: Option<String>,
    pub in_service: bool,
    pub service_end_date: Option<NaiveDate>,
    pub days_left: Option<i64>,
    pub urgent: bool,
    pub location: Option<String>,
    pub problem: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSummary {
    pub metrics: DashboardMetrics,
    pub maintenance_alerts: Vec<MaintenanceAlert>,
    pub service_alerts: Vec<ServiceAlert>,
}

pub fn metrics(data: &FleetData) -> DashboardMetrics {
    DashboardMetrics {
        drivers: data.drivers.len(),
        vehicles: data.vehicles().count(),
        pending_complaints: data.complaints.iter().filter(|c| !c.resolved).count(),
        vehicles_in_service: data
            .vehicles()
            .filter(|v| v.status() == VehicleStatus::InService)
            .count(),
        inventory_items: data.inventory.iter().filter(|i| !i.is_vehicle()).count(),
        fuel_cards: data.fuel_cards.len(),
        pending_fuel_requests: data
            .fuel_cards
            .iter()
            .filter(|fc| fc.status == FuelCardStatus::Pending)
            .count(),
    }
}

/// Vehículos con la HU vencida o dentro del horizonte, la más próxima primero
pub fn maintenance_alerts(data: &FleetData, today: NaiveDate, horizon_days: i64) -> Vec<MaintenanceAlert> {
    let mut alerts: Vec<MaintenanceAlert> = data
        .vehicles()
        .filter_map(|v| {
            let hu = v.hu_expiration?;
            let urgency = classify_deadline(hu, today, horizon_days);
            urgency.needs_attention().then(|| MaintenanceAlert {
                vehicle_id: v.id,
                name: v.name.clone(),
                plate: v.current_plate().map(str::to_string),
                hu_expiration: hu,
                days_left: urgency.days_left(),
                expired: matches!(urgency, Urgency::Expired { .. }),
            })
        })
        .collect();
    alerts.sort_by_key(|a| a.days_left);
    alerts
}

/// Vehículos en taller o con ventana programada, por fecha de fin.
/// Los que no tienen fecha van al final.
pub fn service_alerts(data: &FleetData, today: NaiveDate, urgent_days: i64) -> Vec<ServiceAlert> {
    let mut alerts: Vec<ServiceAlert> = data
        .vehicles()
        .filter(|v| v.status() == VehicleStatus::InService || v.service_end_date.is_some())
        .map(|v| {
            let days_left = v
                .service_end_date
                .map(|end| classify_deadline(end, today, urgent_days).days_left());
            ServiceAlert {
                vehicle_id: v.id,
                name: v.name.clone(),
                plate: v.current_plate().map(str::to_string),
                in_service: v.status() == VehicleStatus::InService,
                service_end_date: v.service_end_date,
                days_left,
                urgent: days_left.map_or(false, |d| d <= urgent_days),
                location: v.service_location.clone(),
                problem: v.service_problem.clone(),
            }
        })
        .collect();
    alerts.sort_by_key(|a| (a.service_end_date.is_none(), a.service_end_date));
    alerts
}

pub fn summary(data: &FleetData, today: NaiveDate, horizons: AlertHorizons) -> DashboardSummary {
    DashboardSummary {
        metrics: metrics(data),
        maintenance_alerts: maintenance_alerts(data, today, horizons.hu_warning_days),
        service_alerts: service_alerts(data, today, horizons.service_warning_days),
    }
}
