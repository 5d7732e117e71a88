//! Configuración de variables de entorno
//!
//! Este módulo lee la configuración del proceso. Las variables que faltan
//! toman un valor por defecto salvo las credenciales del backend elegido.

use std::env;
use std::str::FromStr;

use uuid::Uuid;

use crate::services::dashboard_service::AlertHorizons;
use crate::utils::errors::{AppError, AppResult};

/// Backend de persistencia del Entity Store
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Memory,
    Postgres,
    Supabase,
}

impl FromStr for StoreBackend {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "memory" => Ok(StoreBackend::Memory),
            "postgres" => Ok(StoreBackend::Postgres),
            "supabase" => Ok(StoreBackend::Supabase),
            other => Err(AppError::Config(format!("STORE_BACKEND desconocido: '{}'", other))),
        }
    }
}

/// Configuración del entorno
#[derive(Debug, Clone)]
pub struct EnvironmentConfig {
    pub environment: String,
    pub host: String,
    pub port: u16,
    pub log_level: String,
    pub store_backend: StoreBackend,
    pub database_url: Option<String>,
    pub supabase_url: Option<String>,
    pub supabase_key: Option<String>,
    pub cors_origins: Vec<String>,
    /// Operador que firma los registros creados en esta sesión
    pub operator_id: Option<Uuid>,
    pub alert_horizons: AlertHorizons,
}

impl Default for EnvironmentConfig {
    fn default() -> Self {
        Self {
            environment: "development".to_string(),
            host: "0.0.0.0".to_string(),
            port: 3000,
            log_level: "info".to_string(),
            store_backend: StoreBackend::Memory,
            database_url: None,
            supabase_url: None,
            supabase_key: None,
            cors_origins: vec!["*".to_string()],
            operator_id: None,
            alert_horizons: AlertHorizons::default(),
        }
    }
}

fn var(name: &str) -> Option<String> {
    env::var(name).ok().map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

fn parse_var<T: FromStr>(name: &str, default: T) -> AppResult<T> {
    match var(name) {
        Some(raw) => raw
            .parse()
            .map_err(|_| AppError::Config(format!("{} no es un valor válido: '{}'", name, raw))),
        None => Ok(default),
    }
}

impl EnvironmentConfig {
    /// Leer la configuración de las variables de entorno
    pub fn from_env() -> AppResult<Self> {
        let defaults = Self::default();

        let store_backend = match var("STORE_BACKEND") {
            Some(raw) => raw.parse()?,
            None => defaults.store_backend,
        };

        let config = Self {
            environment: var("ENVIRONMENT").unwrap_or(defaults.environment),
            host: var("HOST").unwrap_or(defaults.host),
            port: parse_var("PORT", defaults.port)?,
            log_level: var("LOG_LEVEL").unwrap_or(defaults.log_level),
            store_backend,
            database_url: var("DATABASE_URL"),
            supabase_url: var("SUPABASE_URL"),
            supabase_key: var("SUPABASE_KEY"),
            cors_origins: var("CORS_ORIGINS")
                .map(|origins| {
                    origins
                        .split(',')
                        .map(|s| s.trim().to_string())
                        .filter(|s| !s.is_empty())
                        .collect()
                })
                .unwrap_or(defaults.cors_origins),
            operator_id: var("OPERATOR_ID")
                .map(|raw| {
                    Uuid::parse_str(&raw)
                        .map_err(|_| AppError::Config(format!("OPERATOR_ID no es un UUID: '{}'", raw)))
                })
                .transpose()?,
            alert_horizons: AlertHorizons {
                hu_warning_days: parse_var("HU_WARNING_DAYS", defaults.alert_horizons.hu_warning_days)?,
                service_warning_days: parse_var(
                    "SERVICE_WARNING_DAYS",
                    defaults.alert_horizons.service_warning_days,
                )?,
            },
        };

        config.validate()?;
        Ok(config)
    }

    /// Credenciales obligatorias según el backend
    pub fn validate(&self) -> AppResult<()> {
        match self.store_backend {
            StoreBackend::Memory => Ok(()),
            StoreBackend::Postgres if self.database_url.is_none() => Err(AppError::Config(
                "DATABASE_URL es obligatorio con STORE_BACKEND=postgres".to_string(),
            )),
            StoreBackend::Supabase if self.supabase_url.is_none() || self.supabase_key.is_none() => {
                Err(AppError::Config(
                    "SUPABASE_URL y SUPABASE_KEY son obligatorios con STORE_BACKEND=supabase".to_string(),
                ))
            }
            _ => Ok(()),
        }
    }

    /// Verificar si estamos en modo desarrollo
    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }

    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    /// Obtener la dirección del servidor
    pub fn server_url(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
