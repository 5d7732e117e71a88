//! Cliente REST de Supabase (PostgREST)
//!
//! Implementa el Entity Store contra `/rest/v1/<tabla>`. Los upserts usan
//! `resolution=merge-duplicates`, así que solo se actualizan las columnas
//! presentes en el payload.

use std::time::Duration;

use reqwest::{Client, RequestBuilder, Response};
use serde_json::Value;
use tracing::{debug, error, info};

use crate::repositories::{Collection, EntityStore, StoreError};

#[derive(Clone)]
pub struct SupabaseStore {
    client: Client,
    base_url: String,
    api_key: String,
}

impl SupabaseStore {
    pub fn new(base_url: &str, api_key: &str) -> Result<Self, StoreError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(15))
            .user_agent("FleetOperations/1.0")
            .build()?;

        info!("🌐 Cliente Supabase configurado para {}", base_url);
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        })
    }

    fn table_url(&self, collection: Collection) -> String {
        format!("{}/rest/v1/{}", self.base_url, collection.table_name())
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
    }

    /// Convertir respuestas no exitosas en `StoreError::Rejected`
    async fn check(collection: Collection, response: Response) -> Result<Response, StoreError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let message = response.text().await.unwrap_or_default();
        error!("❌ Supabase rechazó la operación sobre {} ({}): {}", collection, status, message);
        Err(StoreError::Rejected {
            collection,
            status: status.as_u16(),
            message,
        })
    }
}

/// Parámetro `on_conflict` para colecciones con clave natural
fn on_conflict(collection: Collection) -> Option<String> {
    let key = collection.conflict_key();
    if key.iter().all(|field| *field == "id") {
        None
    } else {
        Some(key.join(","))
    }
}

#[async_trait::async_trait]
impl EntityStore for SupabaseStore {
    async fn fetch_all(&self, collection: Collection) -> Result<Vec<Value>, StoreError> {
        let request = self
            .client
            .get(self.table_url(collection))
            .query(&[("select", "*")]);

        let response = self.authorized(request).send().await?;
        let response = Self::check(collection, response).await?;
        let rows: Vec<Value> = response.json().await?;

        debug!("📦 {} filas leídas de {}", rows.len(), collection);
        Ok(rows)
    }

    async fn upsert(&self, collection: Collection, record: Value) -> Result<Value, StoreError> {
        let mut request = self
            .client
            .post(self.table_url(collection))
            .header("Prefer", "resolution=merge-duplicates,return=representation")
            .json(&record);
        if let Some(key) = on_conflict(collection) {
            request = request.query(&[("on_conflict", key)]);
        }

        let response = self.authorized(request).send().await?;
        let response = Self::check(collection, response).await?;
        let mut rows: Vec<Value> = response.json().await?;

        if rows.is_empty() {
            return Err(StoreError::Rejected {
                collection,
                status: 204,
                message: "upsert returned no representation".to_string(),
            });
        }
        debug!("💾 upsert {} confirmado", collection);
        Ok(rows.swap_remove(0))
    }

    async fn delete(&self, collection: Collection, id: &str) -> Result<(), StoreError> {
        let request = self
            .client
            .delete(self.table_url(collection))
            .query(&[("id", format!("eq.{}", id))]);

        let response = self.authorized(request).send().await?;
        Self::check(collection, response).await?;
        debug!("🗑️ delete {} {}", collection, id);
        Ok(())
    }
}
