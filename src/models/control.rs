//! Modelo de ControlChecklist (control de seguridad del vehículo)

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::repositories::{Collection, StoredEntity};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ControlChecklist {
    pub id: Uuid,
    #[serde(rename = "user_id", default)]
    pub user_id: Option<Uuid>,
    pub driver_id: Uuid,
    pub date: DateTime<Utc>,
    #[serde(default)]
    pub safety_net: bool,
    #[serde(default)]
    pub fire_extinguisher: bool,
    #[serde(default)]
    pub safe_shoes: bool,
    #[serde(default)]
    pub cleanliness: bool,
    #[serde(default)]
    pub signature: Option<String>,
}

impl ControlChecklist {
    pub fn all_passed(&self) -> bool {
        self.safety_net && self.fire_extinguisher && self.safe_shoes && self.cleanliness
    }
}

impl StoredEntity for ControlChecklist {
    const COLLECTION: Collection = Collection::Controls;
    const NULLABLE_FIELDS: &'static [&'static str] = &["date", "signature", "user_id"];

    fn id(&self) -> Uuid {
        self.id
    }
}
