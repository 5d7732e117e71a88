//! Services module
//!
//! Este módulo contiene la lógica de negocio: la sesión de flota, el motor
//! de asignaciones y las máquinas de estado de cada flujo. Todas las reglas
//! se evalúan sobre las colecciones en memoria; solo las escrituras tocan
//! el store.

pub mod assignment_registry;
pub mod complaint_service;
pub mod control_service;
pub mod dashboard_service;
pub mod driver_service;
pub mod fuel_card_service;
pub mod inventory_ledger;
pub mod reconciliation;
pub mod session;
pub mod status_machine;
pub mod tour_service;
pub mod vehicle_service;

pub use assignment_registry::{AssignmentRegistry, InvariantBreach};
pub use complaint_service::ComplaintService;
pub use control_service::ControlService;
pub use driver_service::DriverService;
pub use fuel_card_service::FuelCardService;
pub use inventory_ledger::InventoryLedger;
pub use reconciliation::{InvariantReport, Reconciler, WritePlan};
pub use session::{FleetData, FleetSession};
pub use tour_service::TourService;
pub use vehicle_service::VehicleService;
