//! Modelo de Inventory
//!
//! Vehículos y material (ropa, consumibles, activos) comparten la tabla
//! `inventory`; el campo `type` distingue la variante.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::repositories::{Collection, StoredEntity};

/// Tipo de artículo - mapea al campo `type`
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum InventoryType {
    #[serde(rename = "Clothing")]
    Clothing,
    #[serde(rename = "Vehicle")]
    Vehicle,
    #[default]
    #[serde(rename = "Other")]
    Other,
}

/// Categoría de material no vehicular
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ItemCategory {
    Apparel,
    Consumable,
    Asset,
}

/// Estado del vehículo - los valores serializados son los de la tabla
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
pub enum VehicleStatus {
    #[default]
    #[serde(rename = "Active")]
    Active,
    #[serde(rename = "Allocated")]
    Allocated,
    #[serde(rename = "Service")]
    InService,
}

impl VehicleStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            VehicleStatus::Active => "ACTIVE",
            VehicleStatus::Allocated => "ALLOCATED",
            VehicleStatus::InService => "IN_SERVICE",
        }
    }
}

impl std::fmt::Display for VehicleStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Registro de entrega de material a un conductor.
///
/// Inmutable una vez escrito, salvo el sello `returned_at`. La matrícula es una
/// foto del momento de la entrega y nunca se recalcula.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AssignmentRecord {
    pub id: String,
    pub driver_id: Uuid,
    pub item_id: Uuid,
    pub quantity: u32,
    pub date: DateTime<Utc>,
    #[serde(default)]
    pub signature: String,
    #[serde(default)]
    pub returned_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub driver_plate_at_time: Option<String>,
}

impl AssignmentRecord {
    pub fn is_outstanding(&self) -> bool {
        self.returned_at.is_none()
    }
}

/// Artículo de inventario (vehículo o material)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct InventoryItem {
    pub id: Uuid,
    #[serde(rename = "user_id", default)]
    pub user_id: Option<Uuid>,
    #[serde(rename = "type", default)]
    pub item_type: InventoryType,
    pub name: String,
    #[serde(default)]
    pub size: Option<String>,
    #[serde(default)]
    pub quantity: u32,
    #[serde(default)]
    pub is_consumable: bool,
    #[serde(default)]
    pub brand: Option<String>,

    // Campos de vehículo
    #[serde(default)]
    pub plate: Option<String>,
    #[serde(default)]
    pub assigned_to: Option<Uuid>,
    #[serde(default)]
    pub signature: Option<String>,
    #[serde(default)]
    pub assignment_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub vehicle_status: Option<VehicleStatus>,
    #[serde(default)]
    pub service_location: Option<String>,
    #[serde(default)]
    pub service_problem: Option<String>,
    #[serde(default)]
    pub service_end_date: Option<NaiveDate>,
    #[serde(default)]
    pub hu_expiration: Option<NaiveDate>,

    #[serde(default)]
    pub history: Vec<AssignmentRecord>,
}

impl InventoryItem {
    /// Nuevo vehículo, siempre ACTIVE y sin asignación
    pub fn new_vehicle(name: String, plate: String, hu_expiration: Option<NaiveDate>) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id: None,
            item_type: InventoryType::Vehicle,
            name,
            size: None,
            quantity: 1,
            is_consumable: false,
            brand: None,
            plate: Some(plate),
            assigned_to: None,
            signature: None,
            assignment_date: None,
            vehicle_status: Some(VehicleStatus::Active),
            service_location: None,
            service_problem: None,
            service_end_date: None,
            hu_expiration,
            history: Vec::new(),
        }
    }

    /// Nuevo artículo de material
    pub fn new_item(
        item_type: InventoryType,
        name: String,
        quantity: u32,
        size: Option<String>,
        brand: Option<String>,
        is_consumable: bool,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id: None,
            item_type,
            name,
            size,
            quantity,
            is_consumable,
            brand,
            plate: None,
            assigned_to: None,
            signature: None,
            assignment_date: None,
            vehicle_status: None,
            service_location: None,
            service_problem: None,
            service_end_date: None,
            hu_expiration: None,
            history: Vec::new(),
        }
    }

    pub fn is_vehicle(&self) -> bool {
        self.item_type == InventoryType::Vehicle
    }

    /// Estado efectivo; un vehículo sin estado guardado cuenta como ACTIVE
    pub fn status(&self) -> VehicleStatus {
        self.vehicle_status.unwrap_or_default()
    }

    pub fn current_plate(&self) -> Option<&str> {
        self.plate.as_deref().filter(|p| !p.trim().is_empty())
    }

    pub fn category(&self) -> Option<ItemCategory> {
        match self.item_type {
            InventoryType::Vehicle => None,
            InventoryType::Clothing => Some(ItemCategory::Apparel),
            InventoryType::Other if self.is_consumable => Some(ItemCategory::Consumable),
            InventoryType::Other => Some(ItemCategory::Asset),
        }
    }

    /// Tiene una ventana de taller programada pero aún no iniciada
    pub fn has_scheduled_service(&self) -> bool {
        self.service_end_date.is_some() && self.status() != VehicleStatus::InService
    }

    /// Limpia los campos de asignación (no toca el estado)
    pub(crate) fn clear_assignment(&mut self) {
        self.assigned_to = None;
        self.signature = None;
        self.assignment_date = None;
    }

    pub(crate) fn clear_service(&mut self) {
        self.service_location = None;
        self.service_problem = None;
        self.service_end_date = None;
    }
}

impl StoredEntity for InventoryItem {
    const COLLECTION: Collection = Collection::Inventory;
    const NULLABLE_FIELDS: &'static [&'static str] = &[
        "plate",
        "assignedTo",
        "signature",
        "assignmentDate",
        "serviceLocation",
        "serviceProblem",
        "serviceEndDate",
        "huExpiration",
        "size",
        "brand",
        "user_id",
    ];

    fn id(&self) -> Uuid {
        self.id
    }
}
