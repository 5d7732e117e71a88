//! Data Transfer Objects
//!
//! Cuerpos y query strings de la API. Se validan con `validator` antes de
//! convertirse en las entradas de cada servicio.

pub mod common_dto;
pub mod complaint_dto;
pub mod driver_dto;
pub mod fuel_card_dto;
pub mod inventory_dto;
pub mod tour_dto;
pub mod vehicle_dto;

pub use common_dto::{ApiResponse, SearchQuery};
