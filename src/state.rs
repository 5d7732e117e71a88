//! Shared application state
//!
//! Este módulo define el estado compartido de la aplicación que se pasa
//! a través del router de Axum. La sesión de flota es única por proceso y
//! se serializa con un mutex: un solo flujo de escrituras a la vez.

use std::sync::Arc;

use tokio::sync::Mutex;

use crate::config::environment::EnvironmentConfig;
use crate::services::session::FleetSession;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<EnvironmentConfig>,
    pub session: Arc<Mutex<FleetSession>>,
}

impl AppState {
    pub fn new(config: EnvironmentConfig, session: FleetSession) -> Self {
        Self {
            config: Arc::new(config),
            session: Arc::new(Mutex::new(session)),
        }
    }
}
