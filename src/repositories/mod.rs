//! Repositories - acceso al Entity Store
//!
//! El store externo solo expone tres operaciones por colección:
//! `fetch_all`, `upsert` y `delete`. No hay transacciones ni integridad
//! referencial; los invariantes entre entidades viven en `services`.
//!
//! Semántica de `upsert`: fusión por `id`. Las claves presentes en el payload
//! sobrescriben, las ausentes se conservan y un `null` explícito limpia el
//! campo. Un registro sin `id` recibe uno asignado por el store.

pub mod entity_repository;
pub mod memory_store;
pub mod postgres_store;

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use uuid::Uuid;

pub use entity_repository::EntityRepository;
pub use memory_store::InMemoryStore;
pub use postgres_store::PostgresStore;

/// Colecciones del store
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Collection {
    Drivers,
    Inventory,
    Tours,
    Complaints,
    Controls,
    FuelCards,
    Stops,
}

impl Collection {
    pub const ALL: [Collection; 7] = [
        Collection::Drivers,
        Collection::Inventory,
        Collection::Tours,
        Collection::Complaints,
        Collection::Controls,
        Collection::FuelCards,
        Collection::Stops,
    ];

    /// Nombre de la tabla en el store
    pub fn table_name(&self) -> &'static str {
        match self {
            Collection::Drivers => "drivers",
            Collection::Inventory => "inventory",
            Collection::Tours => "tours",
            Collection::Complaints => "complaints",
            Collection::Controls => "controls",
            Collection::FuelCards => "fuel_cards",
            Collection::Stops => "stops",
        }
    }

    /// Clave natural usada como conflicto en el upsert
    pub fn conflict_key(&self) -> &'static [&'static str] {
        match self {
            Collection::Tours => &["date", "tourNumber"],
            _ => &["id"],
        }
    }
}

impl std::fmt::Display for Collection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.table_name())
    }
}

/// Errores de la frontera de persistencia
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(String),

    #[error("{collection} rejected the operation ({status}): {message}")]
    Rejected {
        collection: Collection,
        status: u16,
        message: String,
    },

    #[error("could not decode record: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// Fallo provocado a propósito por el store en memoria
    #[error("injected failure on {0}")]
    Injected(Collection),
}

/// Cliente del Entity Store
#[async_trait::async_trait]
pub trait EntityStore: Send + Sync {
    async fn fetch_all(&self, collection: Collection) -> Result<Vec<Value>, StoreError>;

    /// Guarda el registro y devuelve la versión persistida
    async fn upsert(&self, collection: Collection, record: Value) -> Result<Value, StoreError>;

    async fn delete(&self, collection: Collection, id: &str) -> Result<(), StoreError>;
}

/// Entidad con colección propia en el store
pub trait StoredEntity: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    const COLLECTION: Collection;

    /// Campos opcionales que nunca se guardan como string vacío
    const NULLABLE_FIELDS: &'static [&'static str] = &[];

    /// Campos que solo se escriben al crear el registro
    const WRITE_ONCE_FIELDS: &'static [&'static str] = &[];

    fn id(&self) -> Uuid;

    fn to_record(&self) -> Result<Value, StoreError> {
        Ok(serde_json::to_value(self)?)
    }

    fn from_record(record: Value) -> Result<Self, StoreError> {
        Ok(serde_json::from_value(record)?)
    }
}
