//! Registro de asignaciones conductor <-> vehículo
//!
//! Único punto que lee y escribe el vínculo por matrícula entre `Driver.plate`
//! y `InventoryItem.assigned_to`. Mantiene la biyección: como mucho un
//! vehículo por conductor y un conductor por vehículo.
//!
//! Orden de escritura fijo: liberar el vehículo anterior, después el vehículo
//! nuevo y por último el conductor.

use std::collections::BTreeMap;
use std::fmt;

use chrono::Utc;
use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::models::{Driver, InventoryItem, VehicleStatus};
use crate::services::reconciliation::{Reconciler, WritePlan};
use crate::services::session::{FleetData, FleetSession};
use crate::services::status_machine::validate_vehicle_transition;
use crate::utils::errors::{not_found_error, validation_error, AppError, AppResult};
use crate::utils::validation::require_non_empty;

/// Ruptura detectada del invariante de asignación
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum InvariantBreach {
    /// Varios conductores referencian la misma matrícula
    DuplicatePlate { plate: String, driver_ids: Vec<Uuid> },
    /// El vehículo apunta a un conductor que no tiene su matrícula
    DanglingAssignment {
        vehicle_id: Uuid,
        plate: Option<String>,
        assigned_to: Uuid,
    },
    /// El conductor referencia una matrícula que no le está asignada
    UnclaimedPlate { driver_id: Uuid, plate: String },
    /// ALLOCATED sin asignación o asignación sin ALLOCATED
    StatusMismatch {
        vehicle_id: Uuid,
        status: VehicleStatus,
        assigned: bool,
    },
}

impl InvariantBreach {
    /// La ruptura afecta a alguno de los registros indicados
    pub fn touches(&self, driver_ids: &[Uuid], vehicle_ids: &[Uuid]) -> bool {
        match self {
            InvariantBreach::DuplicatePlate { driver_ids: ids, .. } => ids.iter().any(|id| driver_ids.contains(id)),
            InvariantBreach::DanglingAssignment {
                vehicle_id,
                assigned_to,
                ..
            } => vehicle_ids.contains(vehicle_id) || driver_ids.contains(assigned_to),
            InvariantBreach::UnclaimedPlate { driver_id, .. } => driver_ids.contains(driver_id),
            InvariantBreach::StatusMismatch { vehicle_id, .. } => vehicle_ids.contains(vehicle_id),
        }
    }
}

impl fmt::Display for InvariantBreach {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InvariantBreach::DuplicatePlate { plate, driver_ids } => {
                write!(f, "plate '{}' held by {} drivers", plate, driver_ids.len())
            }
            InvariantBreach::DanglingAssignment {
                vehicle_id,
                plate,
                assigned_to,
            } => write!(
                f,
                "vehicle {} ({}) assigned to driver {} who does not reference it",
                vehicle_id,
                plate.as_deref().unwrap_or("-"),
                assigned_to
            ),
            InvariantBreach::UnclaimedPlate { driver_id, plate } => {
                write!(f, "driver {} references plate '{}' not assigned to them", driver_id, plate)
            }
            InvariantBreach::StatusMismatch {
                vehicle_id,
                status,
                assigned,
            } => write!(f, "vehicle {} is {} with assigned={}", vehicle_id, status, assigned),
        }
    }
}

/// Comprobación completa de la biyección conductor <-> vehículo
pub fn check_assignment_invariants(drivers: &[Driver], inventory: &[InventoryItem]) -> Vec<InvariantBreach> {
    let mut breaches = Vec::new();

    let mut holders: BTreeMap<&str, Vec<Uuid>> = BTreeMap::new();
    for driver in drivers {
        if let Some(plate) = driver.current_plate() {
            holders.entry(plate).or_default().push(driver.id);
        }
    }

    for (plate, ids) in &holders {
        if ids.len() > 1 {
            breaches.push(InvariantBreach::DuplicatePlate {
                plate: plate.to_string(),
                driver_ids: ids.clone(),
            });
        }
    }

    let vehicles: Vec<&InventoryItem> = inventory.iter().filter(|i| i.is_vehicle()).collect();

    for vehicle in &vehicles {
        let plate_holders = vehicle
            .current_plate()
            .and_then(|p| holders.get(p))
            .cloned()
            .unwrap_or_default();

        if let Some(assigned_to) = vehicle.assigned_to {
            if !plate_holders.contains(&assigned_to) {
                breaches.push(InvariantBreach::DanglingAssignment {
                    vehicle_id: vehicle.id,
                    plate: vehicle.current_plate().map(str::to_string),
                    assigned_to,
                });
            }
        }

        for holder in plate_holders.iter().filter(|id| vehicle.assigned_to != Some(**id)) {
            breaches.push(InvariantBreach::UnclaimedPlate {
                driver_id: *holder,
                plate: vehicle.current_plate().unwrap_or_default().to_string(),
            });
        }

        let assigned = vehicle.assigned_to.is_some();
        let consistent = match vehicle.status() {
            VehicleStatus::Allocated => assigned,
            VehicleStatus::Active => !assigned,
            VehicleStatus::InService => true,
        };
        if !consistent {
            breaches.push(InvariantBreach::StatusMismatch {
                vehicle_id: vehicle.id,
                status: vehicle.status(),
                assigned,
            });
        }
    }

    for (plate, ids) in &holders {
        if !vehicles.iter().any(|v| v.current_plate() == Some(*plate)) {
            for id in ids {
                breaches.push(InvariantBreach::UnclaimedPlate {
                    driver_id: *id,
                    plate: plate.to_string(),
                });
            }
        }
    }

    breaches
}

/// Vehículo que sostiene el conductor: por asignación o, si no, por matrícula
pub(crate) fn held_vehicle<'d>(data: &'d FleetData, driver: &Driver) -> Option<&'d InventoryItem> {
    data.vehicles()
        .find(|v| v.assigned_to == Some(driver.id))
        .or_else(|| driver.current_plate().and_then(|plate| data.vehicle_by_plate(plate)))
}

/// Copia del vehículo liberado: sin asignación y ACTIVE (salvo si está en taller)
pub(crate) fn released_vehicle(vehicle: &InventoryItem) -> InventoryItem {
    let mut released = vehicle.clone();
    released.clear_assignment();
    if released.status() != VehicleStatus::InService {
        released.vehicle_status = Some(VehicleStatus::Active);
    }
    released
}

/// Paso de liberación del vehículo que sostiene `driver`, si lo hay
pub(crate) fn release_held_vehicle_plan(data: &FleetData, driver: &Driver, operation: &str) -> WritePlan {
    let mut plan = WritePlan::new(operation);
    if let Some(vehicle) = held_vehicle(data, driver) {
        plan = plan.vehicle(
            format!("release vehicle {}", vehicle.current_plate().unwrap_or("-")),
            released_vehicle(vehicle),
        );
    }
    plan
}

/// Pasos para liberar lo que sostiene `driver`: vehículo primero, conductor después
pub(crate) fn release_driver_plan(data: &FleetData, driver: &Driver, operation: &str) -> WritePlan {
    let mut plan = release_held_vehicle_plan(data, driver, operation);
    if driver.plate.is_some() {
        let mut cleared = driver.clone();
        cleared.plate = None;
        plan = plan.driver(format!("clear plate of driver {}", driver.id), cleared);
    }
    plan
}

/// Pasos para liberar un vehículo y limpiar a quien lo referencie
pub(crate) fn release_vehicle_plan(data: &FleetData, vehicle: &InventoryItem, operation: &str) -> WritePlan {
    let plan = WritePlan::new(operation).vehicle(
        format!("release vehicle {}", vehicle.current_plate().unwrap_or("-")),
        released_vehicle(vehicle),
    );
    clear_holders(plan, data, vehicle)
}

/// Añadir al plan la limpieza de matrícula de quien sostenga `vehicle`
pub(crate) fn clear_holders(mut plan: WritePlan, data: &FleetData, vehicle: &InventoryItem) -> WritePlan {
    for driver in &data.drivers {
        let by_plate = vehicle.current_plate().is_some() && driver.current_plate() == vehicle.current_plate();
        let by_assignment = vehicle.assigned_to == Some(driver.id) && driver.plate.is_some();
        if by_plate || by_assignment {
            let mut cleared = driver.clone();
            cleared.plate = None;
            plan = plan.driver(format!("clear plate of driver {}", driver.id), cleared);
        }
    }
    plan
}

/// Plan de `assign` validado contra el estado conocido
pub fn plan_assign(data: &FleetData, driver_id: Uuid, vehicle_id: Uuid, signature: &str) -> AppResult<WritePlan> {
    require_non_empty("signature", signature)?;

    let driver = data
        .driver(driver_id)
        .ok_or_else(|| not_found_error("Driver", &driver_id.to_string()))?;
    let vehicle = data
        .item(vehicle_id)
        .filter(|i| i.is_vehicle())
        .ok_or_else(|| not_found_error("Vehicle", &vehicle_id.to_string()))?;
    let plate = vehicle
        .current_plate()
        .ok_or_else(|| validation_error("El vehículo no tiene matrícula"))?;

    if vehicle.status() != VehicleStatus::Active {
        return Err(validation_error(format!(
            "El vehículo {} no está disponible ({})",
            plate,
            vehicle.status()
        )));
    }
    validate_vehicle_transition(vehicle.status(), VehicleStatus::Allocated)?;

    if let Some(other) = data.drivers_with_plate(plate).find(|d| d.id != driver_id) {
        warn!("⚠️ La matrícula {} ya la tiene el conductor {}", plate, other.id);
        return Err(AppError::Conflict(format!(
            "Plate '{}' is already referenced by driver {}",
            plate, other.id
        )));
    }

    let mut plan = WritePlan::new("assign");

    if let Some(previous) = held_vehicle(data, driver).filter(|v| v.id != vehicle_id) {
        plan = plan.vehicle(
            format!("release previous vehicle {}", previous.current_plate().unwrap_or("-")),
            released_vehicle(previous),
        );
    }

    let mut allocated = vehicle.clone();
    allocated.assigned_to = Some(driver_id);
    allocated.vehicle_status = Some(VehicleStatus::Allocated);
    allocated.assignment_date = Some(Utc::now());
    allocated.signature = Some(signature.to_string());
    plan = plan.vehicle(format!("allocate vehicle {}", plate), allocated);

    let mut holder = driver.clone();
    holder.plate = Some(plate.to_string());
    plan = plan.driver(format!("set plate of driver {}", driver_id), holder);

    Ok(plan)
}

/// Operaciones del registro sobre la sesión
pub struct AssignmentRegistry<'a> {
    session: &'a mut FleetSession,
}

impl<'a> AssignmentRegistry<'a> {
    pub fn new(session: &'a mut FleetSession) -> Self {
        Self { session }
    }

    /// Asignar un vehículo ACTIVE a un conductor, liberando antes el que tuviera
    pub async fn assign(self, driver_id: Uuid, vehicle_id: Uuid, signature: &str) -> AppResult<()> {
        let plan = match plan_assign(self.session.data(), driver_id, vehicle_id, signature) {
            Ok(plan) => plan,
            Err(e) => {
                warn!("⚠️ Asignación rechazada: {}", e);
                return Err(e);
            }
        };

        Reconciler::new(self.session).execute(plan).await?;
        info!("🚚 Vehículo {} asignado al conductor {}", vehicle_id, driver_id);
        Ok(())
    }

    /// Liberar el vehículo del conductor
    pub async fn release_driver(self, driver_id: Uuid) -> AppResult<()> {
        let driver = self.session.get::<Driver>(driver_id)?;
        let plan = release_driver_plan(self.session.data(), &driver, "release");
        if plan.is_empty() {
            warn!("⚠️ El conductor {} no tiene vehículo", driver_id);
            return Err(validation_error("El conductor no tiene vehículo asignado"));
        }

        Reconciler::new(self.session).execute(plan).await?;
        info!("🔓 Vehículo liberado del conductor {}", driver_id);
        Ok(())
    }

    /// Liberar el vehículo y limpiar la matrícula de su conductor
    pub async fn release_vehicle(self, vehicle_id: Uuid) -> AppResult<()> {
        let vehicle = self
            .session
            .find::<InventoryItem>(vehicle_id)
            .filter(|v| v.is_vehicle())
            .cloned()
            .ok_or_else(|| not_found_error("Vehicle", &vehicle_id.to_string()))?;

        let has_holder = vehicle.assigned_to.is_some()
            || vehicle
                .current_plate()
                .map_or(false, |p| self.session.data().drivers_with_plate(p).next().is_some());
        if !has_holder {
            warn!("⚠️ El vehículo {} no está asignado", vehicle_id);
            return Err(validation_error("El vehículo no está asignado"));
        }

        let plan = release_vehicle_plan(self.session.data(), &vehicle, "release");
        Reconciler::new(self.session).execute(plan).await?;
        info!("🔓 Vehículo {} liberado", vehicle_id);
        Ok(())
    }
}

/// Auditoría bajo demanda de todo el conjunto
pub fn audit(session: &FleetSession) -> Vec<InvariantBreach> {
    let data = session.data();
    let breaches = check_assignment_invariants(&data.drivers, &data.inventory);
    for breach in &breaches {
        warn!("🚨 {}", breach);
    }
    breaches
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repositories::{Collection, EntityRepository, InMemoryStore};
    use std::sync::Arc;

    struct Fixture {
        store: Arc<InMemoryStore>,
        session: FleetSession,
        driver: Uuid,
        v1: Uuid,
        v2: Uuid,
    }

    async fn fixture() -> Fixture {
        let store = Arc::new(InMemoryStore::new());
        let mut session = FleetSession::open(EntityRepository::new(store.clone()), None)
            .await
            .unwrap();

        let driver = session
            .create(Driver::new("Ana".into(), "Pop".into(), "GLS-1".into(), String::new(), false))
            .await
            .unwrap()
            .id;
        let v1 = session
            .create(InventoryItem::new_vehicle("Sprinter".into(), "B NT 123".into(), None))
            .await
            .unwrap()
            .id;
        let v2 = session
            .create(InventoryItem::new_vehicle("Crafter".into(), "B NT 456".into(), None))
            .await
            .unwrap()
            .id;

        Fixture {
            store,
            session,
            driver,
            v1,
            v2,
        }
    }

    fn vehicle(session: &FleetSession, id: Uuid) -> InventoryItem {
        session.get::<InventoryItem>(id).unwrap()
    }

    #[tokio::test]
    async fn test_assign_sets_both_sides() {
        let mut f = fixture().await;
        AssignmentRegistry::new(&mut f.session)
            .assign(f.driver, f.v1, "sig1")
            .await
            .unwrap();

        let v = vehicle(&f.session, f.v1);
        assert_eq!(v.status(), VehicleStatus::Allocated);
        assert_eq!(v.assigned_to, Some(f.driver));
        assert_eq!(v.signature.as_deref(), Some("sig1"));
        assert!(v.assignment_date.is_some());
        assert_eq!(f.session.get::<Driver>(f.driver).unwrap().plate.as_deref(), Some("B NT 123"));
        assert!(audit(&f.session).is_empty());
    }

    #[tokio::test]
    async fn test_reassign_releases_previous_vehicle_first() {
        let mut f = fixture().await;
        AssignmentRegistry::new(&mut f.session)
            .assign(f.driver, f.v1, "sig1")
            .await
            .unwrap();
        let before = f.store.write_count().await;

        AssignmentRegistry::new(&mut f.session)
            .assign(f.driver, f.v2, "sig2")
            .await
            .unwrap();

        let writes = f.store.writes().await;
        let ids: Vec<&str> = writes[before..].iter().map(|w| w.id.as_str()).collect();
        assert_eq!(ids, vec![f.v1.to_string(), f.v2.to_string(), f.driver.to_string()]);

        let old = vehicle(&f.session, f.v1);
        assert_eq!(old.assigned_to, None);
        assert_eq!(old.status(), VehicleStatus::Active);
        let new = vehicle(&f.session, f.v2);
        assert_eq!(new.assigned_to, Some(f.driver));
        assert_eq!(new.status(), VehicleStatus::Allocated);
        assert!(audit(&f.session).is_empty());
    }

    #[tokio::test]
    async fn test_assign_preconditions() {
        let mut f = fixture().await;

        let err = AssignmentRegistry::new(&mut f.session)
            .assign(f.driver, f.v1, "  ")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));

        let other = f
            .session
            .create(Driver::new("Ion".into(), "Rus".into(), String::new(), String::new(), false))
            .await
            .unwrap()
            .id;
        AssignmentRegistry::new(&mut f.session)
            .assign(other, f.v1, "sig")
            .await
            .unwrap();

        let before = f.store.write_count().await;
        let err = AssignmentRegistry::new(&mut f.session)
            .assign(f.driver, f.v1, "sig")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        assert_eq!(f.store.write_count().await, before);
    }

    #[tokio::test]
    async fn test_driver_write_failure_reports_pending_and_retry_repairs() {
        let mut f = fixture().await;
        f.store.fail_next_upsert(Collection::Drivers).await;

        let err = AssignmentRegistry::new(&mut f.session)
            .assign(f.driver, f.v1, "sig1")
            .await
            .unwrap_err();

        let AppError::InvariantViolation(report) = err else {
            panic!("expected invariant violation");
        };
        assert_eq!(report.pending.len(), 1);
        assert!(report
            .breaches
            .iter()
            .any(|b| matches!(b, InvariantBreach::DanglingAssignment { .. })));
        assert_eq!(vehicle(&f.session, f.v1).assigned_to, Some(f.driver));
        assert_eq!(f.session.get::<Driver>(f.driver).unwrap().plate, None);

        assert_eq!(f.session.retry_pending().await.unwrap(), 1);
        assert!(f.session.pending_plan().is_none());
        assert!(audit(&f.session).is_empty());
    }

    #[tokio::test]
    async fn test_pending_plan_dropped_when_its_records_change() {
        let mut f = fixture().await;
        f.store.fail_next_upsert(Collection::Drivers).await;
        assert!(AssignmentRegistry::new(&mut f.session)
            .assign(f.driver, f.v1, "sig1")
            .await
            .is_err());

        // Otro vehículo: el plan sigue vigente
        let mut other = vehicle(&f.session, f.v2);
        other.name = "Crafter XL".into();
        f.session.update(other).await.unwrap();
        assert!(f.session.pending_plan().is_some());

        let mut driver = f.session.get::<Driver>(f.driver).unwrap();
        driver.phone = "0170".into();
        f.session.update(driver).await.unwrap();
        assert!(f.session.pending_plan().is_none());
        assert_eq!(f.session.get::<Driver>(f.driver).unwrap().plate, None);
    }

    #[tokio::test]
    async fn test_assign_refuses_plate_held_by_another_driver() {
        let mut f = fixture().await;
        let mut stray = Driver::new("Ion".into(), "Rus".into(), String::new(), String::new(), false);
        stray.plate = Some("B NT 123".into());
        f.session.create(stray).await.unwrap();

        let before = f.store.write_count().await;
        let err = AssignmentRegistry::new(&mut f.session)
            .assign(f.driver, f.v1, "sig1")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
        assert_eq!(f.store.write_count().await, before);
        assert_eq!(vehicle(&f.session, f.v1).assigned_to, None);
    }

    #[tokio::test]
    async fn test_release_from_either_side() {
        let mut f = fixture().await;
        AssignmentRegistry::new(&mut f.session)
            .assign(f.driver, f.v1, "sig1")
            .await
            .unwrap();
        AssignmentRegistry::new(&mut f.session)
            .release_vehicle(f.v1)
            .await
            .unwrap();
        assert_eq!(f.session.get::<Driver>(f.driver).unwrap().plate, None);
        assert_eq!(vehicle(&f.session, f.v1).status(), VehicleStatus::Active);

        AssignmentRegistry::new(&mut f.session)
            .assign(f.driver, f.v2, "sig2")
            .await
            .unwrap();
        AssignmentRegistry::new(&mut f.session)
            .release_driver(f.driver)
            .await
            .unwrap();
        let v = vehicle(&f.session, f.v2);
        assert_eq!(v.assigned_to, None);
        assert_eq!(v.signature, None);
        assert_eq!(v.assignment_date, None);
        assert!(audit(&f.session).is_empty());

        let err = AssignmentRegistry::new(&mut f.session)
            .release_driver(f.driver)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[test]
    fn test_check_detects_breaches() {
        let mut a = Driver::new("A".into(), "A".into(), String::new(), String::new(), false);
        let mut b = Driver::new("B".into(), "B".into(), String::new(), String::new(), false);
        a.plate = Some("B NT 1".into());
        b.plate = Some("B NT 1".into());

        let mut v = InventoryItem::new_vehicle("Van".into(), "B NT 1".into(), None);
        v.assigned_to = Some(a.id);

        let breaches = check_assignment_invariants(&[a.clone(), b.clone()], &[v.clone()]);
        assert!(breaches
            .iter()
            .any(|x| matches!(x, InvariantBreach::DuplicatePlate { .. })));
        assert!(breaches
            .iter()
            .any(|x| matches!(x, InvariantBreach::UnclaimedPlate { driver_id, .. } if *driver_id == b.id)));
        assert!(breaches
            .iter()
            .any(|x| matches!(x, InvariantBreach::StatusMismatch { .. })));

        v.vehicle_status = Some(VehicleStatus::Allocated);
        let breaches = check_assignment_invariants(&[a], &[v]);
        assert!(breaches.is_empty());
    }
}
