//! Custodia de tarjetas de combustible
//!
//! PENDING -> ACCEPTED -> RETURNED, lineal: sin saltos ni reapertura. Un
//! conductor no puede tener más de una solicitud PENDING o ACCEPTED.

use chrono::Utc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::models::{Driver, FuelCardRequest, FuelCardStatus};
use crate::services::session::{FleetData, FleetSession};
use crate::utils::errors::{conflict_error, validation_error, AppResult};
use crate::utils::validation::require_non_empty;

/// Solicitud abierta (PENDING o ACCEPTED) del conductor
pub fn active_request(data: &FleetData, driver_id: Uuid) -> Option<&FuelCardRequest> {
    data.fuel_cards
        .iter()
        .find(|fc| fc.driver_id == driver_id && fc.status.is_outstanding())
}

/// Cola de solicitudes pendientes, las más antiguas primero
pub fn pending_requests(data: &FleetData) -> Vec<&FuelCardRequest> {
    let mut pending: Vec<&FuelCardRequest> = data
        .fuel_cards
        .iter()
        .filter(|fc| fc.status == FuelCardStatus::Pending)
        .collect();
    pending.sort_by_key(|fc| fc.request_date);
    pending
}

/// Historial con búsqueda por conductor, matrícula o número de tarjeta,
/// las más recientes primero
pub fn search_history<'a>(data: &'a FleetData, search: Option<&str>) -> Vec<&'a FuelCardRequest> {
    let needle = search.map(|s| s.trim().to_lowercase()).filter(|s| !s.is_empty());
    let mut history: Vec<&FuelCardRequest> = data
        .fuel_cards
        .iter()
        .filter(|fc| match &needle {
            Some(needle) => {
                fc.driver_name.to_lowercase().contains(needle.as_str())
                    || fc.vehicle_plate.to_lowercase().contains(needle.as_str())
                    || fc
                        .card_number
                        .as_deref()
                        .map_or(false, |c| c.to_lowercase().contains(needle.as_str()))
            }
            None => true,
        })
        .collect();
    history.sort_by(|a, b| b.request_date.cmp(&a.request_date));
    history
}

fn require_status(request: &FuelCardRequest, expected: FuelCardStatus, action: &str) -> AppResult<()> {
    if request.status != expected {
        warn!("⚠️ {} rechazado: solicitud {} en {:?}", action, request.id, request.status);
        return Err(validation_error(format!(
            "{} solo es válido desde {:?} (estado actual {:?})",
            action, expected, request.status
        )));
    }
    Ok(())
}

pub struct FuelCardService<'a> {
    session: &'a mut FleetSession,
}

impl<'a> FuelCardService<'a> {
    pub fn new(session: &'a mut FleetSession) -> Self {
        Self { session }
    }

    /// Nueva solicitud PENDING, sin número de tarjeta
    pub async fn request(self, driver_id: Uuid, vehicle_plate: &str, mileage: u32) -> AppResult<FuelCardRequest> {
        let driver = self.session.get::<Driver>(driver_id)?;
        let vehicle_plate = require_non_empty("vehiclePlate", vehicle_plate)?.trim().to_string();

        if let Some(open) = active_request(self.session.data(), driver_id) {
            warn!("⚠️ El conductor {} ya tiene la solicitud {} abierta", driver_id, open.id);
            return Err(conflict_error("Fuel card request", "driver", &driver.full_name()));
        }

        let request = FuelCardRequest {
            id: Uuid::new_v4(),
            user_id: self.session.operator_id(),
            driver_id,
            driver_name: driver.full_name(),
            vehicle_plate,
            mileage,
            card_number: None,
            request_date: Utc::now(),
            accepted_date: None,
            return_date: None,
            status: FuelCardStatus::Pending,
        };

        let request = self.session.create(request).await?;
        info!("⛽ Solicitud de tarjeta {} para {}", request.id, request.driver_name);
        Ok(request)
    }

    /// Aceptar una solicitud PENDING asignando la tarjeta
    pub async fn accept(self, request_id: Uuid, card_number: &str) -> AppResult<FuelCardRequest> {
        let mut request = self.session.get::<FuelCardRequest>(request_id)?;
        require_status(&request, FuelCardStatus::Pending, "accept")?;
        let card_number = require_non_empty("cardNumber", card_number)?.trim().to_string();

        request.card_number = Some(card_number);
        request.accepted_date = Some(Utc::now());
        request.status = FuelCardStatus::Accepted;
        request.user_id = self.session.operator_id().or(request.user_id);

        let request = self.session.update(request).await?;
        info!("💳 Tarjeta {:?} entregada a {}", request.card_number, request.driver_name);
        Ok(request)
    }

    /// Registrar la devolución de una tarjeta ACCEPTED
    pub async fn return_card(self, request_id: Uuid) -> AppResult<FuelCardRequest> {
        let mut request = self.session.get::<FuelCardRequest>(request_id)?;
        require_status(&request, FuelCardStatus::Accepted, "return")?;

        request.return_date = Some(Utc::now());
        request.status = FuelCardStatus::Returned;
        request.user_id = self.session.operator_id().or(request.user_id);

        let request = self.session.update(request).await?;
        info!("↩️ Tarjeta {:?} devuelta por {}", request.card_number, request.driver_name);
        Ok(request)
    }
}
