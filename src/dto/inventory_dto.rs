use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use crate::models::{InventoryType, ItemCategory};
use crate::services::inventory_ledger::{ItemEdit, NewItem};
use crate::utils::validation::validate_not_blank;

// Request para crear un artículo de material
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateItemRequest {
    #[serde(rename = "type")]
    pub item_type: InventoryType,
    #[validate(custom = "validate_not_blank")]
    pub name: String,
    #[serde(default)]
    pub quantity: u32,
    pub size: Option<String>,
    pub brand: Option<String>,
    #[serde(default)]
    pub is_consumable: bool,
}

impl From<CreateItemRequest> for NewItem {
    fn from(request: CreateItemRequest) -> Self {
        Self {
            item_type: request.item_type,
            name: request.name,
            quantity: request.quantity,
            size: request.size,
            brand: request.brand,
            is_consumable: request.is_consumable,
        }
    }
}

#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateItemRequest {
    #[validate(custom = "validate_not_blank")]
    pub name: Option<String>,
    pub quantity: Option<u32>,
    pub size: Option<String>,
    pub brand: Option<String>,
    pub is_consumable: Option<bool>,
}

impl From<UpdateItemRequest> for ItemEdit {
    fn from(request: UpdateItemRequest) -> Self {
        Self {
            name: request.name,
            quantity: request.quantity,
            size: request.size,
            brand: request.brand,
            is_consumable: request.is_consumable,
        }
    }
}

// Entrega de material a un conductor
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct HandOutRequest {
    pub driver_id: Uuid,
    #[validate(range(min = 1))]
    pub quantity: u32,
    #[validate(custom = "validate_not_blank")]
    pub signature: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct InventoryListQuery {
    #[serde(rename = "type")]
    pub item_type: Option<InventoryType>,
    pub category: Option<ItemCategory>,
    pub search: Option<String>,
}
