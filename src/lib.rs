//! Operaciones de flota
//!
//! Conductores, vehículos, material, tours, reclamaciones, controles y
//! tarjetas de combustible sobre un store remoto sin transacciones
//! multi-registro. El motor de asignaciones mantiene la relación uno a uno
//! entre conductor y vehículo.

pub mod clients;
pub mod config;
pub mod dto;
pub mod middleware;
pub mod models;
pub mod repositories;
pub mod routes;
pub mod services;
pub mod state;
pub mod utils;

pub use services::session::FleetSession;
pub use state::AppState;
pub use utils::errors::{AppError, AppResult};
