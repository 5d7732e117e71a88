//! Entity Store en memoria
//!
//! Backend de desarrollo y doble de pruebas. Reproduce la semántica de fusión
//! del store remoto, guarda un registro de escrituras y permite inyectar
//! fallos puntuales por colección.

use std::collections::HashMap;

use serde_json::{Map, Value};
use tokio::sync::{Mutex, RwLock};
use tracing::debug;
use uuid::Uuid;

use crate::repositories::{Collection, EntityStore, StoreError};

/// Tipo de escritura registrada
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteKind {
    Upsert,
    Delete,
}

/// Entrada del registro de escrituras confirmadas
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteLogEntry {
    pub collection: Collection,
    pub kind: WriteKind,
    pub id: String,
}

#[derive(Default)]
pub struct InMemoryStore {
    collections: RwLock<HashMap<Collection, Vec<Map<String, Value>>>>,
    write_log: Mutex<Vec<WriteLogEntry>>,
    /// Colección -> número de upserts que aún se dejan pasar antes de fallar
    failures: Mutex<HashMap<Collection, usize>>,
    unavailable: RwLock<bool>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cargar registros tal cual, sin pasar por el registro de escrituras
    pub async fn seed(&self, collection: Collection, records: Vec<Value>) {
        let mut collections = self.collections.write().await;
        let rows = collections.entry(collection).or_default();
        for record in records {
            if let Value::Object(map) = record {
                rows.push(map);
            }
        }
    }

    /// El próximo upsert sobre `collection` falla
    pub async fn fail_next_upsert(&self, collection: Collection) {
        self.fail_upsert_after(collection, 0).await;
    }

    /// Deja pasar `successes` upserts sobre `collection` y falla el siguiente
    pub async fn fail_upsert_after(&self, collection: Collection, successes: usize) {
        self.failures.lock().await.insert(collection, successes);
    }

    /// Simula la caída del store para todas las operaciones
    pub async fn set_unavailable(&self, unavailable: bool) {
        *self.unavailable.write().await = unavailable;
    }

    pub async fn writes(&self) -> Vec<WriteLogEntry> {
        self.write_log.lock().await.clone()
    }

    pub async fn write_count(&self) -> usize {
        self.write_log.lock().await.len()
    }

    pub async fn record(&self, collection: Collection, id: &str) -> Option<Value> {
        let collections = self.collections.read().await;
        collections
            .get(&collection)
            .and_then(|rows| rows.iter().find(|row| id_of(row) == Some(id)))
            .map(|row| Value::Object(row.clone()))
    }

    async fn check_available(&self) -> Result<(), StoreError> {
        if *self.unavailable.read().await {
            return Err(StoreError::Unavailable("in-memory store offline".to_string()));
        }
        Ok(())
    }

    async fn take_injected_failure(&self, collection: Collection) -> bool {
        let mut failures = self.failures.lock().await;
        match failures.get_mut(&collection) {
            Some(0) => {
                failures.remove(&collection);
                true
            }
            Some(remaining) => {
                *remaining -= 1;
                false
            }
            None => false,
        }
    }
}

fn id_of(row: &Map<String, Value>) -> Option<&str> {
    row.get("id").and_then(Value::as_str)
}

/// Posición del registro existente que coincide con la clave de conflicto
fn find_existing(rows: &[Map<String, Value>], collection: Collection, record: &Map<String, Value>) -> Option<usize> {
    let key = collection.conflict_key();
    let by_key = key.iter().all(|field| record.get(*field).map_or(false, |v| !v.is_null()));

    if by_key {
        if let Some(pos) = rows
            .iter()
            .position(|row| key.iter().all(|field| row.get(*field) == record.get(*field)))
        {
            return Some(pos);
        }
    }

    let id = id_of(record)?;
    rows.iter().position(|row| id_of(row) == Some(id))
}

#[async_trait::async_trait]
impl EntityStore for InMemoryStore {
    async fn fetch_all(&self, collection: Collection) -> Result<Vec<Value>, StoreError> {
        self.check_available().await?;
        let collections = self.collections.read().await;
        Ok(collections
            .get(&collection)
            .map(|rows| rows.iter().cloned().map(Value::Object).collect())
            .unwrap_or_default())
    }

    async fn upsert(&self, collection: Collection, record: Value) -> Result<Value, StoreError> {
        self.check_available().await?;
        if self.take_injected_failure(collection).await {
            return Err(StoreError::Injected(collection));
        }

        let Value::Object(mut incoming) = record else {
            return Err(StoreError::Rejected {
                collection,
                status: 400,
                message: "record must be a JSON object".to_string(),
            });
        };

        let mut collections = self.collections.write().await;
        let rows = collections.entry(collection).or_default();

        let saved = match find_existing(rows, collection, &incoming) {
            Some(pos) => {
                // La fila conserva su id aunque coincida por clave natural
                incoming.remove("id");
                let row = &mut rows[pos];
                for (key, value) in incoming {
                    row.insert(key, value);
                }
                row.clone()
            }
            None => {
                if id_of(&incoming).is_none() {
                    incoming.insert("id".to_string(), Value::String(Uuid::new_v4().to_string()));
                }
                rows.push(incoming.clone());
                incoming
            }
        };

        let id = id_of(&saved).unwrap_or_default().to_string();
        debug!("💾 upsert {} {}", collection, id);
        self.write_log.lock().await.push(WriteLogEntry {
            collection,
            kind: WriteKind::Upsert,
            id,
        });

        Ok(Value::Object(saved))
    }

    async fn delete(&self, collection: Collection, id: &str) -> Result<(), StoreError> {
        self.check_available().await?;
        let mut collections = self.collections.write().await;
        if let Some(rows) = collections.get_mut(&collection) {
            rows.retain(|row| id_of(row) != Some(id));
        }

        debug!("🗑️ delete {} {}", collection, id);
        self.write_log.lock().await.push(WriteLogEntry {
            collection,
            kind: WriteKind::Delete,
            id: id.to_string(),
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_upsert_merges_by_id() {
        let store = InMemoryStore::new();
        store
            .upsert(Collection::Drivers, json!({ "id": "d1", "firstName": "Ana", "plate": "B NT 123" }))
            .await
            .unwrap();

        let saved = store
            .upsert(Collection::Drivers, json!({ "id": "d1", "phone": "0170", "plate": null }))
            .await
            .unwrap();

        assert_eq!(saved["firstName"], "Ana");
        assert_eq!(saved["phone"], "0170");
        assert_eq!(saved["plate"], Value::Null);
        assert_eq!(store.fetch_all(Collection::Drivers).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_upsert_assigns_id() {
        let store = InMemoryStore::new();
        let saved = store.upsert(Collection::Stops, json!({ "stops": 12 })).await.unwrap();
        let id = saved["id"].as_str().unwrap();
        assert!(Uuid::parse_str(id).is_ok());
    }

    #[tokio::test]
    async fn test_tours_merge_on_natural_key() {
        let store = InMemoryStore::new();
        store
            .upsert(Collection::Tours, json!({ "id": "t1", "date": "2026-10-19", "tourNumber": "7", "progress": 0 }))
            .await
            .unwrap();
        let saved = store
            .upsert(Collection::Tours, json!({ "id": "t2", "date": "2026-10-19", "tourNumber": "7", "progress": 40 }))
            .await
            .unwrap();

        assert_eq!(saved["id"], "t1");
        assert_eq!(saved["progress"], 40);
        assert_eq!(store.fetch_all(Collection::Tours).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_injected_failure_is_one_shot() {
        let store = InMemoryStore::new();
        store.fail_upsert_after(Collection::Inventory, 1).await;

        assert!(store.upsert(Collection::Inventory, json!({ "id": "a" })).await.is_ok());
        let err = store.upsert(Collection::Inventory, json!({ "id": "b" })).await.unwrap_err();
        assert!(matches!(err, StoreError::Injected(Collection::Inventory)));
        assert!(store.upsert(Collection::Inventory, json!({ "id": "b" })).await.is_ok());
        assert_eq!(store.write_count().await, 2);
    }

    #[tokio::test]
    async fn test_unavailable_store() {
        let store = InMemoryStore::new();
        store.set_unavailable(true).await;
        assert!(matches!(
            store.fetch_all(Collection::Drivers).await,
            Err(StoreError::Unavailable(_))
        ));
    }
}
