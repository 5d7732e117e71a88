//! Máquinas de estado de conductor y vehículo
//!
//! Definiciones puras: deciden si una transición es válida y qué efecto tiene
//! sobre el registro, sin tocar el store. Los servicios traducen la decisión a
//! un plan de escrituras.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::models::{DateRange, Driver, DriverStatus, VehicleStatus};
use crate::utils::errors::{validation_error, AppError, AppResult};
use crate::utils::validation::validate_date_range;

/// Decisión del operador cuando un conductor con vehículo pasa a vacaciones
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum LeaveReturn {
    /// El vehículo vuelve a la base y se libera
    Returned,
    /// El vehículo se queda con el conductor
    Stays,
}

/// Resultado de clasificar una transición de disponibilidad
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DriverTransition {
    /// Una única escritura del conductor
    Commit,
    /// Entra en vacaciones con vehículo: requiere decisión explícita
    LeaveWithVehicle { plate: String },
}

/// AVAILABLE -> cualquier estado, cualquier estado -> AVAILABLE.
/// Repetir el estado actual solo actualiza las fechas.
pub fn validate_driver_transition(from: DriverStatus, to: DriverStatus) -> AppResult<()> {
    let allowed = from == to || from == DriverStatus::Available || to == DriverStatus::Available;
    if !allowed {
        return Err(validation_error(format!(
            "Transición de estado no permitida: {} -> {}",
            from, to
        )));
    }
    Ok(())
}

pub fn classify_driver_transition(driver: &Driver, to: DriverStatus) -> AppResult<DriverTransition> {
    validate_driver_transition(driver.status, to)?;

    let entering_leave = to == DriverStatus::OnLeave && driver.status != DriverStatus::OnLeave;
    match driver.current_plate() {
        Some(plate) if entering_leave => Ok(DriverTransition::LeaveWithVehicle {
            plate: plate.to_string(),
        }),
        _ => Ok(DriverTransition::Commit),
    }
}

/// Exigir la decisión de devolución cuando la transición la necesita
pub fn require_leave_decision(
    driver: &Driver,
    transition: &DriverTransition,
    decision: Option<LeaveReturn>,
) -> AppResult<Option<LeaveReturn>> {
    match (transition, decision) {
        (DriverTransition::LeaveWithVehicle { plate }, None) => Err(AppError::LeaveReturnDecisionRequired {
            driver_id: driver.id,
            plate: plate.clone(),
        }),
        (DriverTransition::LeaveWithVehicle { .. }, Some(decision)) => Ok(Some(decision)),
        (DriverTransition::Commit, _) => Ok(None),
    }
}

/// Aplicar el nuevo estado y, si se indica, el rango de fechas asociado.
///
/// Salir de vacaciones o baja no borra las fechas; quedan como historial.
pub fn apply_driver_status(driver: &mut Driver, to: DriverStatus, range: Option<DateRange>) -> AppResult<()> {
    if let Some(range) = range.filter(|r| !r.is_empty()) {
        validate_date_range(range.start, range.end)?;
        match to {
            DriverStatus::OnLeave => {
                driver.vacation_start = range.start;
                driver.vacation_end = range.end;
            }
            DriverStatus::Sick => {
                driver.sick_start = range.start;
                driver.sick_end = range.end;
            }
            _ => {}
        }
    }
    driver.status = to;
    Ok(())
}

/// Modo de entrada en taller
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ServiceMode {
    /// El vehículo entra en taller ahora
    Immediate,
    /// Solo se registra la ventana prevista; el estado no cambia
    Scheduled,
}

/// Transiciones válidas del vehículo
pub fn validate_vehicle_transition(from: VehicleStatus, to: VehicleStatus) -> AppResult<()> {
    use VehicleStatus::*;

    let allowed = matches!(
        (from, to),
        (Active, Allocated) | (Allocated, Active) | (Active, InService) | (Allocated, InService) | (InService, Active)
    );
    if !allowed {
        return Err(validation_error(format!(
            "Transición de vehículo no permitida: {} -> {}",
            from, to
        )));
    }
    Ok(())
}

/// Clasificación de urgencia de una fecha límite
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(tag = "level", rename_all = "snake_case")]
pub enum Urgency {
    Expired { days_overdue: i64 },
    DueSoon { days_left: i64 },
    Clear { days_left: i64 },
}

impl Urgency {
    pub fn needs_attention(&self) -> bool {
        !matches!(self, Urgency::Clear { .. })
    }

    pub fn days_left(&self) -> i64 {
        match self {
            Urgency::Expired { days_overdue } => -days_overdue,
            Urgency::DueSoon { days_left } | Urgency::Clear { days_left } => *days_left,
        }
    }
}

/// Urgencia de una fecha respecto a `today` con un horizonte en días.
///
/// Vencida si la fecha ya pasó; próxima si quedan `horizon_days` días o menos.
pub fn classify_deadline(deadline: NaiveDate, today: NaiveDate, horizon_days: i64) -> Urgency {
    let days_left = (deadline - today).num_days();
    if days_left < 0 {
        Urgency::Expired {
            days_overdue: -days_left,
        }
    } else if days_left <= horizon_days {
        Urgency::DueSoon { days_left }
    } else {
        Urgency::Clear { days_left }
    }
}
