//! Servicio de conductores
//!
//! Alta, edición de perfil, cambios de disponibilidad y baja. La matrícula
//! del conductor nunca se edita aquí; solo el registro de asignaciones la
//! toca, incluida la liberación por vacaciones o por baja del conductor.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

use crate::models::{DateRange, Driver, DriverStatus};
use crate::services::assignment_registry::release_held_vehicle_plan;
use crate::services::reconciliation::{Reconciler, WritePlan};
use crate::services::session::{FleetData, FleetSession};
use crate::services::status_machine::{
    apply_driver_status, classify_driver_transition, require_leave_decision, LeaveReturn,
};
use crate::utils::errors::AppResult;
use crate::utils::validation::require_non_empty;

/// Datos de alta; el estado y la matrícula no se aceptan
#[derive(Debug, Clone, Default)]
pub struct NewDriver {
    pub first_name: String,
    pub last_name: String,
    pub gls_number: String,
    pub phone: String,
    pub is_beginner: bool,
}

/// Campos de perfil editables
#[derive(Debug, Clone, Default)]
pub struct DriverProfile {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub gls_number: Option<String>,
    pub phone: Option<String>,
    pub is_beginner: Option<bool>,
}

/// Cambio de disponibilidad solicitado por el operador
#[derive(Debug, Clone)]
pub struct StatusChange {
    pub status: DriverStatus,
    pub range: Option<DateRange>,
    pub leave_return: Option<LeaveReturn>,
}

/// Filtro del listado de conductores
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DriverFilter {
    #[default]
    All,
    Associated,
    Unassociated,
    Available,
    Absent,
    OnLeave,
    Sick,
}

impl DriverFilter {
    pub fn matches(&self, driver: &Driver) -> bool {
        match self {
            DriverFilter::All => true,
            DriverFilter::Associated => driver.holds_vehicle(),
            DriverFilter::Unassociated => !driver.holds_vehicle(),
            DriverFilter::Available => driver.status == DriverStatus::Available,
            DriverFilter::Absent => driver.status == DriverStatus::Absent,
            DriverFilter::OnLeave => driver.status == DriverStatus::OnLeave,
            DriverFilter::Sick => driver.status == DriverStatus::Sick,
        }
    }
}

/// Contadores por filtro
#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct DriverCounts {
    pub all: usize,
    pub associated: usize,
    pub unassociated: usize,
    pub available: usize,
    pub absent: usize,
    pub on_leave: usize,
    pub sick: usize,
}

/// Listado filtrado con búsqueda por nombre o número GLS
pub fn list_drivers<'a>(data: &'a FleetData, filter: DriverFilter, search: Option<&str>) -> Vec<&'a Driver> {
    let needle = search.map(|s| s.trim().to_lowercase()).filter(|s| !s.is_empty());
    data.drivers
        .iter()
        .filter(|d| filter.matches(d))
        .filter(|d| match &needle {
            Some(needle) => {
                d.full_name().to_lowercase().contains(needle.as_str())
                    || d.gls_number.to_lowercase().contains(needle.as_str())
            }
            None => true,
        })
        .collect()
}

pub fn count_drivers(data: &FleetData) -> DriverCounts {
    let count = |filter: DriverFilter| data.drivers.iter().filter(|d| filter.matches(d)).count();
    DriverCounts {
        all: data.drivers.len(),
        associated: count(DriverFilter::Associated),
        unassociated: count(DriverFilter::Unassociated),
        available: count(DriverFilter::Available),
        absent: count(DriverFilter::Absent),
        on_leave: count(DriverFilter::OnLeave),
        sick: count(DriverFilter::Sick),
    }
}

/// Conductores sin vehículo, candidatos a una asignación
pub fn assignment_candidates(data: &FleetData) -> Vec<&Driver> {
    data.drivers.iter().filter(|d| !d.holds_vehicle()).collect()
}

pub struct DriverService<'a> {
    session: &'a mut FleetSession,
}

impl<'a> DriverService<'a> {
    pub fn new(session: &'a mut FleetSession) -> Self {
        Self { session }
    }

    /// Alta de conductor: siempre AVAILABLE y sin vehículo
    pub async fn create(self, input: NewDriver) -> AppResult<Driver> {
        require_non_empty("firstName", &input.first_name)?;
        require_non_empty("lastName", &input.last_name)?;

        let mut driver = Driver::new(
            input.first_name.trim().to_string(),
            input.last_name.trim().to_string(),
            input.gls_number.trim().to_string(),
            input.phone.trim().to_string(),
            input.is_beginner,
        );
        driver.user_id = self.session.operator_id();

        let driver = self.session.create(driver).await?;
        info!("👤 Conductor creado: {} ({})", driver.full_name(), driver.id);
        Ok(driver)
    }

    /// Editar datos de perfil sin tocar matrícula ni estado
    pub async fn update_profile(self, driver_id: Uuid, profile: DriverProfile) -> AppResult<Driver> {
        let mut driver = self.session.get::<Driver>(driver_id)?;

        if let Some(first_name) = profile.first_name {
            driver.first_name = require_non_empty("firstName", &first_name)?.trim().to_string();
        }
        if let Some(last_name) = profile.last_name {
            driver.last_name = require_non_empty("lastName", &last_name)?.trim().to_string();
        }
        if let Some(gls_number) = profile.gls_number {
            driver.gls_number = gls_number.trim().to_string();
        }
        if let Some(phone) = profile.phone {
            driver.phone = phone.trim().to_string();
        }
        if let Some(is_beginner) = profile.is_beginner {
            driver.is_beginner = is_beginner;
        }

        self.session.update(driver).await
    }

    /// Cambiar la disponibilidad del conductor.
    ///
    /// Pasar a vacaciones con vehículo exige la decisión de devolución. Con
    /// `Returned` se libera el vehículo antes de escribir al conductor.
    pub async fn change_status(self, driver_id: Uuid, change: StatusChange) -> AppResult<Driver> {
        let driver = self.session.get::<Driver>(driver_id)?;
        let transition = classify_driver_transition(&driver, change.status)?;
        let decision = require_leave_decision(&driver, &transition, change.leave_return)?;

        let mut updated = driver.clone();
        apply_driver_status(&mut updated, change.status, change.range)?;

        let operation = format!("status {} -> {}", driver.status, change.status);
        let plan = match decision {
            Some(LeaveReturn::Returned) => {
                // Matrícula y estado del conductor van en una sola escritura
                updated.plate = None;
                release_held_vehicle_plan(self.session.data(), &driver, &operation)
                    .driver(format!("driver {} on leave without vehicle", driver_id), updated)
            }
            Some(LeaveReturn::Stays) => {
                debug!("🚚 El vehículo {:?} se queda con el conductor", driver.current_plate());
                WritePlan::new(operation.clone()).driver(format!("driver {} on leave with vehicle", driver_id), updated)
            }
            None => WritePlan::new(operation.clone()).driver(format!("driver {} status", driver_id), updated),
        };

        Reconciler::new(self.session).execute(plan).await?;
        info!("🔁 Conductor {}: {}", driver_id, operation);
        self.session.get::<Driver>(driver_id)
    }

    /// Baja del conductor: libera su vehículo y después borra el registro
    pub async fn delete(self, driver_id: Uuid) -> AppResult<()> {
        let driver = self.session.get::<Driver>(driver_id)?;
        let operation = format!("delete driver {}", driver_id);

        let plan = release_held_vehicle_plan(self.session.data(), &driver, &operation)
            .delete_driver(format!("delete driver {}", driver_id), driver_id);

        Reconciler::new(self.session).execute(plan).await?;
        info!("🗑️ Conductor {} eliminado", driver_id);
        Ok(())
    }
}
