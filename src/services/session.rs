//! Sesión de flota
//!
//! Contexto explícito que reemplaza el estado global: posee el repositorio,
//! las colecciones en memoria, el id del operador y el último plan de
//! escrituras que quedó a medias. Se abre al iniciar sesión y se cierra al
//! salir.
//!
//! Las colecciones locales solo cambian después de que el store confirma
//! cada escritura.

use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::models::{
    Complaint, ControlChecklist, Driver, FuelCardRequest, InventoryItem, StopPlan, Tour,
};
use crate::repositories::{EntityRepository, StoredEntity};
use crate::services::reconciliation::{Reconciler, WritePlan};
use crate::utils::errors::{not_found_error, validation_error, AppResult};
use crate::utils::validation::null_if_empty;

/// Colecciones cargadas desde el store
#[derive(Debug, Clone, Default, Serialize)]
pub struct FleetData {
    pub drivers: Vec<Driver>,
    pub inventory: Vec<InventoryItem>,
    pub tours: Vec<Tour>,
    pub complaints: Vec<Complaint>,
    pub controls: Vec<ControlChecklist>,
    pub fuel_cards: Vec<FuelCardRequest>,
    pub stops: Vec<StopPlan>,
}

impl FleetData {
    pub fn driver(&self, id: Uuid) -> Option<&Driver> {
        self.drivers.iter().find(|d| d.id == id)
    }

    pub fn item(&self, id: Uuid) -> Option<&InventoryItem> {
        self.inventory.iter().find(|i| i.id == id)
    }

    pub fn vehicles(&self) -> impl Iterator<Item = &InventoryItem> {
        self.inventory.iter().filter(|i| i.is_vehicle())
    }

    pub fn vehicle_by_plate(&self, plate: &str) -> Option<&InventoryItem> {
        self.vehicles().find(|v| v.current_plate() == Some(plate))
    }

    /// Conductores que referencian la matrícula
    pub fn drivers_with_plate<'a>(&'a self, plate: &'a str) -> impl Iterator<Item = &'a Driver> + 'a {
        self.drivers.iter().filter(move |d| d.current_plate() == Some(plate))
    }
}

/// Entidad con colección propia dentro de la sesión
pub trait SessionEntity: StoredEntity {
    const LABEL: &'static str;

    fn rows(data: &FleetData) -> &Vec<Self>;
    fn rows_mut(data: &mut FleetData) -> &mut Vec<Self>;

    /// Identifica el mismo registro del store
    fn same_record(&self, other: &Self) -> bool {
        self.id() == other.id()
    }
}

macro_rules! session_entity {
    ($entity:ty, $field:ident, $label:literal) => {
        impl SessionEntity for $entity {
            const LABEL: &'static str = $label;

            fn rows(data: &FleetData) -> &Vec<Self> {
                &data.$field
            }

            fn rows_mut(data: &mut FleetData) -> &mut Vec<Self> {
                &mut data.$field
            }
        }
    };
}

session_entity!(Driver, drivers, "Driver");
session_entity!(InventoryItem, inventory, "Inventory item");
session_entity!(Complaint, complaints, "Complaint");
session_entity!(ControlChecklist, controls, "Control");
session_entity!(FuelCardRequest, fuel_cards, "Fuel card request");
session_entity!(StopPlan, stops, "Stop plan");

impl SessionEntity for Tour {
    const LABEL: &'static str = "Tour";

    fn rows(data: &FleetData) -> &Vec<Self> {
        &data.tours
    }

    fn rows_mut(data: &mut FleetData) -> &mut Vec<Self> {
        &mut data.tours
    }

    /// Las tours se fusionan por `(date, tourNumber)`
    fn same_record(&self, other: &Self) -> bool {
        self.id == other.id || (self.date == other.date && self.tour_number == other.tour_number)
    }
}

pub struct FleetSession {
    repository: EntityRepository,
    data: FleetData,
    operator_id: Option<Uuid>,
    pending: Option<WritePlan>,
    open: bool,
}

impl FleetSession {
    /// Sesión cerrada, sin datos cargados
    pub fn new(repository: EntityRepository, operator_id: Option<Uuid>) -> Self {
        Self {
            repository,
            data: FleetData::default(),
            operator_id,
            pending: None,
            open: false,
        }
    }

    /// Abrir la sesión cargando todas las colecciones
    pub async fn open(repository: EntityRepository, operator_id: Option<Uuid>) -> AppResult<Self> {
        let mut session = Self::new(repository, operator_id);
        session.refresh().await?;
        Ok(session)
    }

    /// Recargar todas las colecciones; si una lectura falla se conserva el
    /// último estado conocido
    pub async fn refresh(&mut self) -> AppResult<()> {
        let data = FleetData {
            drivers: self.repository.load_all().await?,
            inventory: self.repository.load_all().await?,
            tours: self.repository.load_all().await?,
            complaints: self.repository.load_all().await?,
            controls: self.repository.load_all().await?,
            fuel_cards: self.repository.load_all().await?,
            stops: self.repository.load_all().await?,
        };

        info!(
            "🔄 Sesión cargada: {} conductores, {} artículos, {} tours, {} reclamaciones",
            data.drivers.len(),
            data.inventory.len(),
            data.tours.len(),
            data.complaints.len()
        );
        self.data = data;
        self.open = true;
        Ok(())
    }

    /// Cerrar la sesión y soltar las colecciones
    pub fn close(&mut self) {
        self.data = FleetData::default();
        self.pending = None;
        self.open = false;
        info!("👋 Sesión cerrada");
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn data(&self) -> &FleetData {
        &self.data
    }

    pub fn operator_id(&self) -> Option<Uuid> {
        self.operator_id
    }

    pub fn find<E: SessionEntity>(&self, id: Uuid) -> Option<&E> {
        E::rows(&self.data).iter().find(|e| e.id() == id)
    }

    /// Copia del registro o `NotFound`
    pub fn get<E: SessionEntity>(&self, id: Uuid) -> AppResult<E> {
        self.find::<E>(id)
            .cloned()
            .ok_or_else(|| not_found_error(E::LABEL, &id.to_string()))
    }

    fn ensure_open(&self) -> AppResult<()> {
        if !self.open {
            return Err(validation_error("La sesión no está abierta"));
        }
        Ok(())
    }

    /// Crear el registro y, confirmado, añadirlo a la colección local
    pub async fn create<E: SessionEntity>(&mut self, entity: E) -> AppResult<E> {
        self.ensure_open()?;
        let saved = self.repository.create(&entity).await?;
        Ok(self.apply_confirmed(entity, saved))
    }

    /// Actualizar el registro y, confirmado, reemplazarlo en la colección local
    pub async fn update<E: SessionEntity>(&mut self, entity: E) -> AppResult<E> {
        self.ensure_open()?;
        let saved = self.repository.update(&entity).await?;
        Ok(self.apply_confirmed(entity, saved))
    }

    pub async fn remove<E: SessionEntity>(&mut self, id: Uuid) -> AppResult<()> {
        self.ensure_open()?;
        self.repository.delete::<E>(id).await?;
        self.discard_stale_pending(id);
        E::rows_mut(&mut self.data).retain(|e| e.id() != id);
        Ok(())
    }

    /// Usar la versión devuelta por el store; si no se puede leer, la enviada
    fn apply_confirmed<E: SessionEntity>(&mut self, sent: E, mut saved: serde_json::Value) -> E {
        self.discard_stale_pending(sent.id());
        null_if_empty(&mut saved, E::NULLABLE_FIELDS);
        let entity = match E::from_record(saved) {
            Ok(entity) => entity,
            Err(e) => {
                warn!("⚠️ Respuesta del store ilegible en {}: {}", E::COLLECTION, e);
                sent
            }
        };

        let rows = E::rows_mut(&mut self.data);
        rows.retain(|row| row.id() == entity.id() || !row.same_record(&entity));
        match rows.iter().position(|row| row.id() == entity.id()) {
            Some(pos) => rows[pos] = entity.clone(),
            None => rows.push(entity.clone()),
        }
        entity
    }

    /// Plan que quedó a medias en la última saga
    pub fn pending_plan(&self) -> Option<&WritePlan> {
        self.pending.as_ref()
    }

    pub(crate) fn set_pending(&mut self, plan: Option<WritePlan>) {
        self.pending = plan;
    }

    /// Una escritura confirmada sobre un registro de la saga incompleta deja
    /// obsoletas las copias guardadas en el plan pendiente
    fn discard_stale_pending(&mut self, id: Uuid) {
        if self.pending.as_ref().map_or(false, |plan| plan.mentions(id)) {
            if let Some(plan) = self.pending.take() {
                warn!(
                    "🗑️ Plan pendiente de '{}' descartado: el registro {} cambió después",
                    plan.operation, id
                );
            }
        }
    }

    /// Reemitir, en orden, las escrituras pendientes de la última saga.
    ///
    /// Nunca se llama automáticamente. Devuelve el número de pasos aplicados.
    pub async fn retry_pending(&mut self) -> AppResult<usize> {
        let plan = self
            .pending
            .take()
            .ok_or_else(|| validation_error("No hay escrituras pendientes"))?;
        let steps = plan.steps.len();

        info!("🔁 Reintentando {} escrituras de '{}'", steps, plan.operation);
        match Reconciler::new(self).execute(plan.clone()).await {
            Ok(()) => Ok(steps),
            Err(e) => {
                if self.pending.is_none() {
                    self.pending = Some(plan);
                }
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repositories::{Collection, InMemoryStore};
    use chrono::NaiveDate;
    use serde_json::json;
    use std::sync::Arc;

    async fn session_with(store: Arc<InMemoryStore>) -> FleetSession {
        FleetSession::open(EntityRepository::new(store), Some(Uuid::new_v4()))
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_open_loads_collections() {
        let store = Arc::new(InMemoryStore::new());
        store
            .seed(
                Collection::Drivers,
                vec![json!({
                    "id": Uuid::new_v4(),
                    "firstName": "Ana",
                    "lastName": "Pop",
                    "created_at": "2026-01-10T08:00:00Z"
                })],
            )
            .await;

        let mut session = session_with(store).await;
        assert!(session.is_open());
        assert_eq!(session.data().drivers.len(), 1);

        session.close();
        assert!(!session.is_open());
        assert!(session.data().drivers.is_empty());
    }

    #[tokio::test]
    async fn test_failed_write_leaves_local_state() {
        let store = Arc::new(InMemoryStore::new());
        let mut session = session_with(store.clone()).await;

        let driver = session
            .create(Driver::new("Ana".into(), "Pop".into(), String::new(), String::new(), false))
            .await
            .unwrap();

        store.fail_next_upsert(Collection::Drivers).await;
        let mut edited = driver.clone();
        edited.phone = "0170".to_string();
        assert!(session.update(edited).await.is_err());
        assert_eq!(session.get::<Driver>(driver.id).unwrap().phone, "");
    }

    #[tokio::test]
    async fn test_closed_session_rejects_writes() {
        let store = Arc::new(InMemoryStore::new());
        let mut session = FleetSession::new(EntityRepository::new(store.clone()), None);
        let result = session
            .create(Driver::new("Ana".into(), "Pop".into(), String::new(), String::new(), false))
            .await;
        assert!(result.is_err());
        assert_eq!(store.write_count().await, 0);
    }

    #[tokio::test]
    async fn test_tour_natural_key_replaces_local_row() {
        let store = Arc::new(InMemoryStore::new());
        let mut session = session_with(store).await;
        let date = NaiveDate::from_ymd_opt(2026, 10, 19).unwrap();

        let tour = |progress| Tour {
            id: Uuid::new_v4(),
            user_id: None,
            tour_number: "7".to_string(),
            city: "Berlin".to_string(),
            driver_id: Uuid::new_v4(),
            beginner_driver_id: None,
            vehicle_plate: None,
            date,
            status: Default::default(),
            tour_type: Default::default(),
            progress,
            total_packages: 0,
            total_stops: 0,
        };

        let first = session.create(tour(0)).await.unwrap();
        let second = session.create(tour(50)).await.unwrap();

        assert_eq!(second.id, first.id);
        assert_eq!(session.data().tours.len(), 1);
        assert_eq!(session.data().tours[0].progress, 50);
    }
}
