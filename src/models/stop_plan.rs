//! Modelo de StopPlan

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::repositories::{Collection, StoredEntity};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StopPlan {
    pub id: Uuid,
    #[serde(rename = "user_id", default)]
    pub user_id: Option<Uuid>,
    #[serde(default)]
    pub date: Option<NaiveDate>,
    #[serde(default)]
    pub addresses: String,
    #[serde(default)]
    pub packages: u32,
    #[serde(default)]
    pub stops: u32,
}

impl StoredEntity for StopPlan {
    const COLLECTION: Collection = Collection::Stops;
    const NULLABLE_FIELDS: &'static [&'static str] = &["date", "user_id"];

    fn id(&self) -> Uuid {
        self.id
    }
}
