//! Middleware del sistema
//!
//! Este módulo contiene las capas HTTP compartidas por todos los routers.

pub mod cors;

pub use cors::cors_layer;
