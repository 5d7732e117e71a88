//! Repositorio tipado sobre el Entity Store
//!
//! Aplica las reglas de frontera de cada entidad: los campos opcionales nunca
//! viajan como string vacío y los campos de solo-creación (snapshots) se quitan
//! de los payloads de actualización.

use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::repositories::{EntityStore, StoreError, StoredEntity};
use crate::utils::validation::null_if_empty;

#[derive(Clone)]
pub struct EntityRepository {
    store: Arc<dyn EntityStore>,
}

impl EntityRepository {
    pub fn new(store: Arc<dyn EntityStore>) -> Self {
        Self { store }
    }

    /// Cargar todos los registros de la colección de `E`.
    ///
    /// Los registros que no se pueden decodificar se omiten con un warning.
    pub async fn load_all<E: StoredEntity>(&self) -> Result<Vec<E>, StoreError> {
        let records = self.store.fetch_all(E::COLLECTION).await?;
        let total = records.len();

        let mut entities = Vec::with_capacity(total);
        for mut record in records {
            null_if_empty(&mut record, E::NULLABLE_FIELDS);
            match E::from_record(record) {
                Ok(entity) => entities.push(entity),
                Err(e) => warn!("⚠️ Registro omitido en {}: {}", E::COLLECTION, e),
            }
        }

        debug!("📦 {}: {}/{} registros cargados", E::COLLECTION, entities.len(), total);
        Ok(entities)
    }

    /// Crear el registro completo, snapshots incluidos
    pub async fn create<E: StoredEntity>(&self, entity: &E) -> Result<Value, StoreError> {
        let mut record = entity.to_record()?;
        null_if_empty(&mut record, E::NULLABLE_FIELDS);
        self.store.upsert(E::COLLECTION, record).await
    }

    /// Actualizar un registro existente sin reescribir los campos de solo-creación
    pub async fn update<E: StoredEntity>(&self, entity: &E) -> Result<Value, StoreError> {
        let record = update_payload(entity)?;
        self.store.upsert(E::COLLECTION, record).await
    }

    pub async fn delete<E: StoredEntity>(&self, id: Uuid) -> Result<(), StoreError> {
        self.store.delete(E::COLLECTION, &id.to_string()).await
    }
}

/// Payload de actualización: nulos normalizados y campos de solo-creación fuera
pub fn update_payload<E: StoredEntity>(entity: &E) -> Result<Value, StoreError> {
    let mut record = entity.to_record()?;
    null_if_empty(&mut record, E::NULLABLE_FIELDS);
    if let Value::Object(map) = &mut record {
        for field in E::WRITE_ONCE_FIELDS {
            map.remove(*field);
        }
    }
    Ok(record)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Complaint, ComplaintStatus, Driver};
    use crate::repositories::{Collection, InMemoryStore};
    use serde_json::json;

    fn complaint() -> Complaint {
        Complaint {
            id: Uuid::new_v4(),
            user_id: None,
            tour_id: Uuid::new_v4(),
            tour_number_snapshot: "T-12".to_string(),
            tour_date_snapshot: chrono::NaiveDate::from_ymd_opt(2026, 10, 1),
            driver_name_snapshot: "Ana Pop".to_string(),
            vehicle_plate_snapshot: "B NT 123".to_string(),
            tour_number: "T-12".to_string(),
            driver_id: Uuid::new_v4(),
            package_number: "PKG-991".to_string(),
            address: "Hauptstr. 1".to_string(),
            postal_code: "10115".to_string(),
            status: ComplaintStatus::Pending,
            resolved: false,
            resolved_at: None,
            date: None,
        }
    }

    #[test]
    fn test_update_payload_strips_snapshots() {
        let payload = update_payload(&complaint()).unwrap();
        assert!(payload.get("tour_number_snapshot").is_none());
        assert!(payload.get("vehicle_plate_snapshot").is_none());
        assert_eq!(payload["packageNumber"], "PKG-991");
    }

    #[tokio::test]
    async fn test_snapshots_survive_updates() {
        let store = Arc::new(InMemoryStore::new());
        let repository = EntityRepository::new(store.clone());

        let mut original = complaint();
        repository.create(&original).await.unwrap();

        original.vehicle_plate_snapshot = "HH XX 1".to_string();
        original.address = "Nebenstr. 2".to_string();
        repository.update(&original).await.unwrap();

        let loaded: Vec<Complaint> = repository.load_all().await.unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].vehicle_plate_snapshot, "B NT 123");
        assert_eq!(loaded[0].address, "Nebenstr. 2");
    }

    #[tokio::test]
    async fn test_load_skips_undecodable_and_normalizes_blank() {
        let store = Arc::new(InMemoryStore::new());
        let id = Uuid::new_v4();
        store
            .seed(
                Collection::Drivers,
                vec![
                    json!({
                        "id": id,
                        "firstName": "Ana",
                        "lastName": "Pop",
                        "plate": "",
                        "vacationStart": "",
                        "created_at": "2026-01-10T08:00:00Z"
                    }),
                    json!({ "id": "not-a-uuid", "firstName": 3 }),
                ],
            )
            .await;

        let repository = EntityRepository::new(store);
        let drivers: Vec<Driver> = repository.load_all().await.unwrap();

        assert_eq!(drivers.len(), 1);
        assert_eq!(drivers[0].id, id);
        assert_eq!(drivers[0].plate, None);
        assert_eq!(drivers[0].vacation_start, None);
    }
}
