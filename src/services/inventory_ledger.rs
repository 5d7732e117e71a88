//! Libro de entregas de material (inventario no vehicular)
//!
//! Cada entrega descuenta stock y añade un `AssignmentRecord` inmutable al
//! historial del artículo, con la matrícula que el conductor tenía en ese
//! momento. Esa matrícula es un hecho histórico y nunca se recalcula.

use chrono::Utc;
use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::models::{AssignmentRecord, Driver, InventoryItem, InventoryType, ItemCategory};
use crate::services::session::{FleetData, FleetSession};
use crate::utils::errors::{not_found_error, validation_error, AppResult};
use crate::utils::validation::require_non_empty;

#[derive(Debug, Clone, Default)]
pub struct NewItem {
    pub item_type: InventoryType,
    pub name: String,
    pub quantity: u32,
    pub size: Option<String>,
    pub brand: Option<String>,
    pub is_consumable: bool,
}

#[derive(Debug, Clone, Default)]
pub struct ItemEdit {
    pub name: Option<String>,
    pub quantity: Option<u32>,
    pub size: Option<String>,
    pub brand: Option<String>,
    pub is_consumable: Option<bool>,
}

/// Entrega pendiente de devolución, con el conductor que la tiene
#[derive(Debug, Clone, Serialize)]
pub struct Holder {
    pub record: AssignmentRecord,
    pub driver_name: Option<String>,
}

/// Material no vehicular, opcionalmente por tipo o categoría y con búsqueda
/// por nombre o marca
pub fn list_items<'a>(
    data: &'a FleetData,
    item_type: Option<InventoryType>,
    category: Option<ItemCategory>,
    search: Option<&str>,
) -> Vec<&'a InventoryItem> {
    let needle = search.map(|s| s.trim().to_lowercase()).filter(|s| !s.is_empty());
    data.inventory
        .iter()
        .filter(|i| !i.is_vehicle())
        .filter(|i| item_type.map_or(true, |t| i.item_type == t))
        .filter(|i| category.map_or(true, |c| i.category() == Some(c)))
        .filter(|i| match &needle {
            Some(needle) => {
                i.name.to_lowercase().contains(needle.as_str())
                    || i.brand.as_deref().map_or(false, |b| b.to_lowercase().contains(needle.as_str()))
            }
            None => true,
        })
        .collect()
}

/// Quién tiene actualmente material del artículo
pub fn current_holders(data: &FleetData, item: &InventoryItem) -> Vec<Holder> {
    item.history
        .iter()
        .filter(|r| r.is_outstanding())
        .map(|record| Holder {
            record: record.clone(),
            driver_name: data.driver(record.driver_id).map(Driver::full_name),
        })
        .collect()
}

/// Entregas de un conductor en todo el inventario
pub fn driver_records(data: &FleetData, driver_id: Uuid) -> Vec<&AssignmentRecord> {
    data.inventory
        .iter()
        .flat_map(|i| i.history.iter())
        .filter(|r| r.driver_id == driver_id)
        .collect()
}

/// Aplicar una entrega sobre una copia del artículo
pub fn apply_hand_out(
    item: &InventoryItem,
    driver: &Driver,
    quantity: u32,
    signature: &str,
) -> AppResult<InventoryItem> {
    if item.is_vehicle() {
        return Err(validation_error("Los vehículos se asignan, no se entregan"));
    }
    require_non_empty("signature", signature)?;
    if quantity == 0 || quantity > item.quantity {
        return Err(validation_error(format!(
            "Cantidad inválida: {} (stock disponible {})",
            quantity, item.quantity
        )));
    }

    let mut updated = item.clone();
    updated.quantity = item.quantity.saturating_sub(quantity);
    updated.history.push(AssignmentRecord {
        id: format!("rec-{}", Uuid::new_v4()),
        driver_id: driver.id,
        item_id: item.id,
        quantity,
        date: Utc::now(),
        signature: signature.to_string(),
        returned_at: None,
        driver_plate_at_time: driver.current_plate().map(str::to_string),
    });
    Ok(updated)
}

pub struct InventoryLedger<'a> {
    session: &'a mut FleetSession,
}

impl<'a> InventoryLedger<'a> {
    pub fn new(session: &'a mut FleetSession) -> Self {
        Self { session }
    }

    fn item(&self, item_id: Uuid) -> AppResult<InventoryItem> {
        self.session
            .find::<InventoryItem>(item_id)
            .filter(|i| !i.is_vehicle())
            .cloned()
            .ok_or_else(|| not_found_error("Inventory item", &item_id.to_string()))
    }

    pub async fn create(self, input: NewItem) -> AppResult<InventoryItem> {
        require_non_empty("name", &input.name)?;
        if input.item_type == InventoryType::Vehicle {
            return Err(validation_error("Los vehículos se registran en el parque"));
        }

        let mut item = InventoryItem::new_item(
            input.item_type,
            input.name.trim().to_string(),
            input.quantity,
            input.size,
            input.brand,
            input.is_consumable,
        );
        item.user_id = self.session.operator_id();

        let item = self.session.create(item).await?;
        info!("📦 Artículo creado: {} (stock {})", item.name, item.quantity);
        Ok(item)
    }

    /// Editar datos del artículo; el historial no se toca
    pub async fn update(self, item_id: Uuid, edit: ItemEdit) -> AppResult<InventoryItem> {
        let mut item = self.item(item_id)?;
        if let Some(name) = edit.name {
            item.name = require_non_empty("name", &name)?.trim().to_string();
        }
        if let Some(quantity) = edit.quantity {
            item.quantity = quantity;
        }
        if let Some(size) = edit.size {
            item.size = Some(size);
        }
        if let Some(brand) = edit.brand {
            item.brand = Some(brand);
        }
        if let Some(is_consumable) = edit.is_consumable {
            item.is_consumable = is_consumable;
        }
        self.session.update(item).await
    }

    /// Entregar `quantity` unidades a un conductor
    pub async fn hand_out(self, item_id: Uuid, driver_id: Uuid, quantity: u32, signature: &str) -> AppResult<AssignmentRecord> {
        let item = self.item(item_id)?;
        let driver = self.session.get::<Driver>(driver_id)?;

        let updated = match apply_hand_out(&item, &driver, quantity, signature) {
            Ok(updated) => updated,
            Err(e) => {
                warn!("⚠️ Entrega rechazada de {}: {}", item.name, e);
                return Err(e);
            }
        };
        let record = updated
            .history
            .last()
            .cloned()
            .ok_or_else(|| validation_error("No se pudo registrar la entrega"))?;

        let saved = self.session.update(updated).await?;
        info!(
            "📤 {} x{} entregado a {} (stock restante {})",
            saved.name,
            quantity,
            driver.full_name(),
            saved.quantity
        );
        Ok(record)
    }

    /// Sellar la devolución de una entrega no consumible y reponer stock
    pub async fn mark_returned(self, item_id: Uuid, record_id: &str) -> AppResult<InventoryItem> {
        let mut item = self.item(item_id)?;
        if item.is_consumable {
            return Err(validation_error("Los consumibles no se devuelven"));
        }

        let record = item
            .history
            .iter_mut()
            .find(|r| r.id == record_id)
            .ok_or_else(|| not_found_error("Assignment record", record_id))?;
        if record.returned_at.is_some() {
            return Err(validation_error("La entrega ya fue devuelta"));
        }
        record.returned_at = Some(Utc::now());
        let quantity = record.quantity;
        item.quantity = item.quantity.saturating_add(quantity);

        let item = self.session.update(item).await?;
        info!("📥 Devolución registrada en {} (+{})", item.name, quantity);
        Ok(item)
    }
}
