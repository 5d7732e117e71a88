//! Entity Store sobre PostgreSQL
//!
//! Cada colección es una tabla de documentos JSONB. El upsert fusiona con
//! `data || EXCLUDED.data`, de modo que las claves ausentes se conservan y un
//! `null` explícito limpia el campo.

use serde_json::Value;
use sqlx::{types::Json, PgPool};
use tracing::{debug, info};
use uuid::Uuid;

use crate::repositories::{Collection, EntityStore, StoreError};

#[derive(Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Crear las tablas de documentos si no existen
    pub async fn ensure_schema(&self) -> Result<(), StoreError> {
        for collection in Collection::ALL {
            let table = collection.table_name();
            let ddl = format!(
                r#"
                CREATE TABLE IF NOT EXISTS {table} (
                    id UUID PRIMARY KEY,
                    data JSONB NOT NULL,
                    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
                    updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
                )
                "#
            );
            sqlx::query(&ddl).execute(&self.pool).await?;
        }

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS tours_natural_key ON tours ((data->>'date'), (data->>'tourNumber'))",
        )
        .execute(&self.pool)
        .await?;

        info!("✅ Esquema de documentos verificado ({} colecciones)", Collection::ALL.len());
        Ok(())
    }

    /// Id de la fila que ya ocupa la clave natural del registro, si la hay
    async fn existing_by_natural_key(
        &self,
        collection: Collection,
        record: &serde_json::Map<String, Value>,
    ) -> Result<Option<Uuid>, StoreError> {
        let key = collection.conflict_key();
        if key.iter().all(|field| *field == "id") {
            return Ok(None);
        }

        let mut values = Vec::with_capacity(key.len());
        for field in key {
            match record.get(*field).and_then(Value::as_str) {
                Some(value) => values.push(value.to_string()),
                None => return Ok(None),
            }
        }

        let conditions = key
            .iter()
            .enumerate()
            .map(|(i, field)| format!("data->>'{}' = ${}", field, i + 1))
            .collect::<Vec<_>>()
            .join(" AND ");
        let sql = format!("SELECT id FROM {} WHERE {} LIMIT 1", collection.table_name(), conditions);

        let mut query = sqlx::query_scalar::<_, Uuid>(&sql);
        for value in values {
            query = query.bind(value);
        }
        Ok(query.fetch_optional(&self.pool).await?)
    }
}

fn parse_id(collection: Collection, id: &str) -> Result<Uuid, StoreError> {
    Uuid::parse_str(id).map_err(|e| StoreError::Rejected {
        collection,
        status: 400,
        message: format!("invalid id '{}': {}", id, e),
    })
}

#[async_trait::async_trait]
impl EntityStore for PostgresStore {
    async fn fetch_all(&self, collection: Collection) -> Result<Vec<Value>, StoreError> {
        let sql = format!("SELECT data FROM {} ORDER BY created_at", collection.table_name());
        let rows = sqlx::query_scalar::<_, Value>(&sql).fetch_all(&self.pool).await?;
        debug!("📦 {} filas leídas de {}", rows.len(), collection);
        Ok(rows)
    }

    async fn upsert(&self, collection: Collection, record: Value) -> Result<Value, StoreError> {
        let Value::Object(mut map) = record else {
            return Err(StoreError::Rejected {
                collection,
                status: 400,
                message: "record must be a JSON object".to_string(),
            });
        };

        let id = match self.existing_by_natural_key(collection, &map).await? {
            Some(existing) => existing,
            None => match map.get("id").and_then(Value::as_str) {
                Some(id) => parse_id(collection, id)?,
                None => Uuid::new_v4(),
            },
        };
        map.insert("id".to_string(), Value::String(id.to_string()));

        let table = collection.table_name();
        let sql = format!(
            r#"
            INSERT INTO {table} (id, data) VALUES ($1, $2)
            ON CONFLICT (id) DO UPDATE
            SET data = {table}.data || EXCLUDED.data, updated_at = now()
            RETURNING data
            "#
        );

        let saved = sqlx::query_scalar::<_, Value>(&sql)
            .bind(id)
            .bind(Json(Value::Object(map)))
            .fetch_one(&self.pool)
            .await?;

        debug!("💾 upsert {} {}", collection, id);
        Ok(saved)
    }

    async fn delete(&self, collection: Collection, id: &str) -> Result<(), StoreError> {
        let id = parse_id(collection, id)?;
        let sql = format!("DELETE FROM {} WHERE id = $1", collection.table_name());
        sqlx::query(&sql).bind(id).execute(&self.pool).await?;
        debug!("🗑️ delete {} {}", collection, id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_id_rejects_garbage() {
        let err = parse_id(Collection::Drivers, "abc").unwrap_err();
        assert!(matches!(err, StoreError::Rejected { status: 400, .. }));
        assert!(parse_id(Collection::Drivers, &Uuid::new_v4().to_string()).is_ok());
    }
}
