//! Modelos del sistema
//!
//! Este módulo contiene todos los modelos de datos. Los nombres serializados
//! coinciden con las columnas de cada colección del store.

pub mod complaint;
pub mod control;
pub mod driver;
pub mod fuel_card;
pub mod inventory;
pub mod stop_plan;
pub mod tour;

pub use complaint::{Complaint, ComplaintStatus};
pub use control::ControlChecklist;
pub use driver::{DateRange, Driver, DriverStatus};
pub use fuel_card::{FuelCardRequest, FuelCardRow, FuelCardStatus};
pub use inventory::{AssignmentRecord, InventoryItem, InventoryType, ItemCategory, VehicleStatus};
pub use stop_plan::StopPlan;
pub use tour::{Tour, TourStatus, TourType};
