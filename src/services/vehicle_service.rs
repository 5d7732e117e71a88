//! Servicio de vehículos
//!
//! Registro de vehículos y máquina de taller. Entrar en taller de forma
//! inmediata anula cualquier asignación y limpia la matrícula del conductor;
//! volver de taller no la restaura.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::models::{InventoryItem, VehicleStatus};
use crate::services::assignment_registry::clear_holders;
use crate::services::reconciliation::{Reconciler, WritePlan};
use crate::services::session::{FleetData, FleetSession};
use crate::services::status_machine::{validate_vehicle_transition, ServiceMode};
use crate::utils::errors::{conflict_error, not_found_error, validation_error, AppResult};
use crate::utils::validation::{compose_plate, require_non_empty};

/// Partes de la matrícula tal como las introduce el operador
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PlateParts {
    pub city: String,
    pub letters: String,
    pub numbers: String,
}

impl PlateParts {
    pub fn compose(&self) -> AppResult<String> {
        compose_plate(&self.city, &self.letters, &self.numbers)
    }
}

#[derive(Debug, Clone, Default)]
pub struct NewVehicle {
    pub name: String,
    pub plate: PlateParts,
    pub hu_expiration: Option<NaiveDate>,
}

/// Edición del vehículo; `hu_expiration: Some(None)` borra la fecha
#[derive(Debug, Clone, Default)]
pub struct VehicleEdit {
    pub name: Option<String>,
    pub plate: Option<PlateParts>,
    pub hu_expiration: Option<Option<NaiveDate>>,
}

#[derive(Debug, Clone)]
pub struct ServiceRequest {
    pub mode: ServiceMode,
    pub location: String,
    pub problem: String,
    pub end_date: Option<NaiveDate>,
}

/// Filtro del listado de vehículos
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VehicleFilter {
    #[default]
    All,
    Allocated,
    Active,
    Service,
}

impl VehicleFilter {
    pub fn matches(&self, vehicle: &InventoryItem) -> bool {
        match self {
            VehicleFilter::All => true,
            VehicleFilter::Allocated => vehicle.status() == VehicleStatus::Allocated,
            VehicleFilter::Active => vehicle.status() == VehicleStatus::Active,
            VehicleFilter::Service => vehicle.status() == VehicleStatus::InService,
        }
    }
}

pub fn list_vehicles<'a>(data: &'a FleetData, filter: VehicleFilter, search: Option<&str>) -> Vec<&'a InventoryItem> {
    let needle = search.map(|s| s.trim().to_lowercase()).filter(|s| !s.is_empty());
    data.vehicles()
        .filter(|v| filter.matches(v))
        .filter(|v| match &needle {
            Some(needle) => {
                v.name.to_lowercase().contains(needle.as_str())
                    || v.current_plate().map_or(false, |p| p.to_lowercase().contains(needle.as_str()))
            }
            None => true,
        })
        .collect()
}

/// El vehículo está vinculado a un conductor por cualquiera de los dos lados
fn is_held(data: &FleetData, vehicle: &InventoryItem) -> bool {
    vehicle.assigned_to.is_some()
        || vehicle
            .current_plate()
            .map_or(false, |p| data.drivers_with_plate(p).next().is_some())
}

fn ensure_unique_plate(data: &FleetData, plate: &str, except: Option<Uuid>) -> AppResult<()> {
    let taken = data
        .vehicles()
        .filter(|v| Some(v.id) != except)
        .any(|v| v.current_plate().map_or(false, |p| p.eq_ignore_ascii_case(plate)));
    if taken {
        return Err(conflict_error("Vehicle", "plate", plate));
    }
    Ok(())
}

pub struct VehicleService<'a> {
    session: &'a mut FleetSession,
}

impl<'a> VehicleService<'a> {
    pub fn new(session: &'a mut FleetSession) -> Self {
        Self { session }
    }

    fn vehicle(&self, vehicle_id: Uuid) -> AppResult<InventoryItem> {
        self.session
            .find::<InventoryItem>(vehicle_id)
            .filter(|i| i.is_vehicle())
            .cloned()
            .ok_or_else(|| not_found_error("Vehicle", &vehicle_id.to_string()))
    }

    /// Alta de vehículo con matrícula compuesta y única
    pub async fn create(self, input: NewVehicle) -> AppResult<InventoryItem> {
        require_non_empty("name", &input.name)?;
        let plate = input.plate.compose()?;
        ensure_unique_plate(self.session.data(), &plate, None)?;

        let mut vehicle = InventoryItem::new_vehicle(input.name.trim().to_string(), plate, input.hu_expiration);
        vehicle.user_id = self.session.operator_id();

        let vehicle = self.session.create(vehicle).await?;
        info!("🚐 Vehículo creado: {} ({})", vehicle.name, vehicle.current_plate().unwrap_or("-"));
        Ok(vehicle)
    }

    /// Editar nombre, matrícula o fecha de inspección.
    ///
    /// La matrícula no se puede cambiar mientras el vehículo esté asignado.
    pub async fn update(self, vehicle_id: Uuid, edit: VehicleEdit) -> AppResult<InventoryItem> {
        let mut vehicle = self.vehicle(vehicle_id)?;

        if let Some(name) = edit.name {
            vehicle.name = require_non_empty("name", &name)?.trim().to_string();
        }
        if let Some(parts) = edit.plate {
            let plate = parts.compose()?;
            if vehicle.current_plate() != Some(plate.as_str()) {
                if is_held(self.session.data(), &vehicle) {
                    return Err(validation_error(
                        "No se puede cambiar la matrícula de un vehículo asignado",
                    ));
                }
                ensure_unique_plate(self.session.data(), &plate, Some(vehicle_id))?;
                vehicle.plate = Some(plate);
            }
        }
        if let Some(hu_expiration) = edit.hu_expiration {
            vehicle.hu_expiration = hu_expiration;
        }

        self.session.update(vehicle).await
    }

    /// Entrada en taller, inmediata o programada
    pub async fn enter_service(self, vehicle_id: Uuid, request: ServiceRequest) -> AppResult<InventoryItem> {
        let vehicle = self.vehicle(vehicle_id)?;
        let label = vehicle.current_plate().unwrap_or("-").to_string();
        require_non_empty("location", &request.location)?;
        require_non_empty("problem", &request.problem)?;

        let plan = match request.mode {
            ServiceMode::Immediate => {
                validate_vehicle_transition(vehicle.status(), VehicleStatus::InService)?;

                let mut in_service = vehicle.clone();
                in_service.clear_assignment();
                in_service.vehicle_status = Some(VehicleStatus::InService);
                in_service.service_location = Some(request.location.trim().to_string());
                in_service.service_problem = Some(request.problem.trim().to_string());
                in_service.service_end_date = None;

                let plan = WritePlan::new(format!("service {}", label))
                    .vehicle(format!("vehicle {} into service", label), in_service);
                clear_holders(plan, self.session.data(), &vehicle)
            }
            ServiceMode::Scheduled => {
                if vehicle.status() == VehicleStatus::InService {
                    return Err(validation_error("El vehículo ya está en taller"));
                }
                let end_date = request
                    .end_date
                    .ok_or_else(|| validation_error("La fecha de fin del taller es requerida"))?;

                let mut scheduled = vehicle.clone();
                scheduled.service_location = Some(request.location.trim().to_string());
                scheduled.service_problem = Some(request.problem.trim().to_string());
                scheduled.service_end_date = Some(end_date);

                WritePlan::new(format!("schedule service {}", label))
                    .vehicle(format!("vehicle {} service window", label), scheduled)
            }
        };

        Reconciler::new(self.session).execute(plan).await?;
        info!("🔧 Vehículo {} en taller ({:?})", label, request.mode);
        self.vehicle(vehicle_id)
    }

    /// Volver de taller: ACTIVE, sin datos de taller y sin asignación
    pub async fn return_from_service(self, vehicle_id: Uuid) -> AppResult<InventoryItem> {
        let mut vehicle = self.vehicle(vehicle_id)?;
        if vehicle.status() != VehicleStatus::InService {
            return Err(validation_error("El vehículo no está en taller"));
        }
        validate_vehicle_transition(VehicleStatus::InService, VehicleStatus::Active)?;

        vehicle.vehicle_status = Some(VehicleStatus::Active);
        vehicle.clear_service();
        vehicle.clear_assignment();

        let vehicle = self.session.update(vehicle).await?;
        info!("✅ Vehículo {} de vuelta del taller", vehicle.current_plate().unwrap_or("-"));
        Ok(vehicle)
    }

    /// Anular una ventana de taller programada
    pub async fn clear_service_schedule(self, vehicle_id: Uuid) -> AppResult<InventoryItem> {
        let mut vehicle = self.vehicle(vehicle_id)?;
        if !vehicle.has_scheduled_service() {
            return Err(validation_error("El vehículo no tiene taller programado"));
        }
        vehicle.clear_service();
        self.session.update(vehicle).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Driver;
    use crate::repositories::{EntityRepository, InMemoryStore};
    use crate::services::assignment_registry::{audit, AssignmentRegistry};
    use crate::utils::errors::AppError;
    use std::sync::Arc;

    fn parts(city: &str, letters: &str, numbers: &str) -> PlateParts {
        PlateParts {
            city: city.into(),
            letters: letters.into(),
            numbers: numbers.into(),
        }
    }

    async fn session() -> FleetSession {
        let store = Arc::new(InMemoryStore::new());
        FleetSession::open(EntityRepository::new(store), None).await.unwrap()
    }

    async fn allocated(session: &mut FleetSession) -> (Uuid, Uuid) {
        let vehicle = VehicleService::new(session)
            .create(NewVehicle {
                name: "Sprinter".into(),
                plate: parts("b", "nt", "123"),
                hu_expiration: None,
            })
            .await
            .unwrap()
            .id;
        let driver = session
            .create(Driver::new("Ana".into(), "Pop".into(), String::new(), String::new(), false))
            .await
            .unwrap()
            .id;
        AssignmentRegistry::new(session).assign(driver, vehicle, "sig").await.unwrap();
        (driver, vehicle)
    }

    fn service(mode: ServiceMode, end_date: Option<NaiveDate>) -> ServiceRequest {
        ServiceRequest {
            mode,
            location: "Werkstatt Nord".into(),
            problem: "Bremsen".into(),
            end_date,
        }
    }

    #[tokio::test]
    async fn test_plate_is_composed_and_unique() {
        let mut session = session().await;
        let (_, vehicle) = allocated(&mut session).await;
        assert_eq!(
            session.get::<InventoryItem>(vehicle).unwrap().plate.as_deref(),
            Some("B NT 123")
        );

        let err = VehicleService::new(&mut session)
            .create(NewVehicle {
                name: "Other".into(),
                plate: parts("B", "NT", "123"),
                hu_expiration: None,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_plate_edit_refused_while_assigned() {
        let mut session = session().await;
        let (_, vehicle) = allocated(&mut session).await;

        let err = VehicleService::new(&mut session)
            .update(
                vehicle,
                VehicleEdit {
                    plate: Some(parts("HH", "AB", "9")),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn test_service_requires_location_and_problem() {
        let mut session = session().await;
        let (driver, vehicle) = allocated(&mut session).await;

        for mode in [ServiceMode::Immediate, ServiceMode::Scheduled] {
            let err = VehicleService::new(&mut session)
                .enter_service(
                    vehicle,
                    ServiceRequest {
                        location: "  ".into(),
                        ..service(mode, NaiveDate::from_ymd_opt(2026, 10, 30))
                    },
                )
                .await
                .unwrap_err();
            assert!(matches!(err, AppError::Validation(_)));

            let err = VehicleService::new(&mut session)
                .enter_service(
                    vehicle,
                    ServiceRequest {
                        problem: String::new(),
                        ..service(mode, NaiveDate::from_ymd_opt(2026, 10, 30))
                    },
                )
                .await
                .unwrap_err();
            assert!(matches!(err, AppError::Validation(_)));
        }

        assert_eq!(
            session.get::<InventoryItem>(vehicle).unwrap().status(),
            VehicleStatus::Allocated
        );
        assert!(session.get::<Driver>(driver).unwrap().plate.is_some());
    }

    #[tokio::test]
    async fn test_immediate_service_clears_driver_and_return_does_not_restore() {
        let mut session = session().await;
        let (driver, vehicle) = allocated(&mut session).await;

        let in_service = VehicleService::new(&mut session)
            .enter_service(vehicle, service(ServiceMode::Immediate, NaiveDate::from_ymd_opt(2026, 10, 30)))
            .await
            .unwrap();
        assert_eq!(in_service.status(), VehicleStatus::InService);
        assert_eq!(in_service.assigned_to, None);
        assert_eq!(in_service.service_end_date, None);
        assert_eq!(in_service.service_location.as_deref(), Some("Werkstatt Nord"));
        assert_eq!(session.get::<Driver>(driver).unwrap().plate, None);

        let back = VehicleService::new(&mut session)
            .return_from_service(vehicle)
            .await
            .unwrap();
        assert_eq!(back.status(), VehicleStatus::Active);
        assert_eq!(back.assigned_to, None);
        assert_eq!(back.service_location, None);
        assert_eq!(session.get::<Driver>(driver).unwrap().plate, None);
        assert!(audit(&session).is_empty());
    }

    #[tokio::test]
    async fn test_scheduled_service_keeps_status_and_assignment() {
        let mut session = session().await;
        let (driver, vehicle) = allocated(&mut session).await;
        let end = NaiveDate::from_ymd_opt(2026, 10, 22);

        let scheduled = VehicleService::new(&mut session)
            .enter_service(vehicle, service(ServiceMode::Scheduled, end))
            .await
            .unwrap();
        assert_eq!(scheduled.status(), VehicleStatus::Allocated);
        assert_eq!(scheduled.assigned_to, Some(driver));
        assert_eq!(scheduled.service_end_date, end);
        assert!(scheduled.has_scheduled_service());

        let cleared = VehicleService::new(&mut session)
            .clear_service_schedule(vehicle)
            .await
            .unwrap();
        assert_eq!(cleared.service_end_date, None);
        assert_eq!(cleared.assigned_to, Some(driver));

        let err = VehicleService::new(&mut session)
            .enter_service(vehicle, service(ServiceMode::Scheduled, None))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn test_return_requires_service() {
        let mut session = session().await;
        let (_, vehicle) = allocated(&mut session).await;
        assert!(VehicleService::new(&mut session)
            .return_from_service(vehicle)
            .await
            .is_err());
    }

    #[tokio::test]
    async fn test_list_filter_and_search() {
        let mut session = session().await;
        allocated(&mut session).await;
        VehicleService::new(&mut session)
            .create(NewVehicle {
                name: "Crafter".into(),
                plate: parts("HH", "AB", "9"),
                hu_expiration: None,
            })
            .await
            .unwrap();

        let data = session.data();
        assert_eq!(list_vehicles(data, VehicleFilter::All, None).len(), 2);
        assert_eq!(list_vehicles(data, VehicleFilter::Allocated, None).len(), 1);
        assert_eq!(list_vehicles(data, VehicleFilter::Active, Some("hh ab")).len(), 1);
        assert_eq!(list_vehicles(data, VehicleFilter::Service, None).len(), 0);
    }
}
