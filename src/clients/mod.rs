//! Clients - HTTP clients for external APIs
//!
//! This module contains the HTTP-backed Entity Store implementation.

pub mod supabase_client;

pub use supabase_client::SupabaseStore;
