//! Controles de seguridad del conductor

use chrono::Utc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::models::{ControlChecklist, Driver};
use crate::services::session::{FleetData, FleetSession};
use crate::utils::errors::AppResult;

#[derive(Debug, Clone, Default)]
pub struct ChecklistInput {
    pub driver_id: Uuid,
    pub safety_net: bool,
    pub fire_extinguisher: bool,
    pub safe_shoes: bool,
    pub cleanliness: bool,
    pub signature: Option<String>,
}

/// Controles del conductor, los más recientes primero
pub fn driver_controls(data: &FleetData, driver_id: Uuid) -> Vec<&ControlChecklist> {
    let mut controls: Vec<&ControlChecklist> = data
        .controls
        .iter()
        .filter(|c| c.driver_id == driver_id)
        .collect();
    controls.sort_by(|a, b| b.date.cmp(&a.date));
    controls
}

pub struct ControlService<'a> {
    session: &'a mut FleetSession,
}

impl<'a> ControlService<'a> {
    pub fn new(session: &'a mut FleetSession) -> Self {
        Self { session }
    }

    pub async fn record(self, input: ChecklistInput) -> AppResult<ControlChecklist> {
        let driver = self.session.get::<Driver>(input.driver_id)?;

        let checklist = ControlChecklist {
            id: Uuid::new_v4(),
            user_id: self.session.operator_id(),
            driver_id: driver.id,
            date: Utc::now(),
            safety_net: input.safety_net,
            fire_extinguisher: input.fire_extinguisher,
            safe_shoes: input.safe_shoes,
            cleanliness: input.cleanliness,
            signature: input.signature.filter(|s| !s.trim().is_empty()),
        };

        let checklist = self.session.create(checklist).await?;
        if checklist.all_passed() {
            info!("🦺 Control superado por {}", driver.full_name());
        } else {
            warn!("⚠️ Control con fallos para {}", driver.full_name());
        }
        Ok(checklist)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repositories::{EntityRepository, InMemoryStore};
    use std::sync::Arc;

    #[tokio::test]
    async fn test_record_and_list() {
        let store = Arc::new(InMemoryStore::new());
        let mut session = FleetSession::open(EntityRepository::new(store), None).await.unwrap();
        let driver = session
            .create(Driver::new("Ana".into(), "Pop".into(), String::new(), String::new(), false))
            .await
            .unwrap()
            .id;

        let passed = ControlService::new(&mut session)
            .record(ChecklistInput {
                driver_id: driver,
                safety_net: true,
                fire_extinguisher: true,
                safe_shoes: true,
                cleanliness: true,
                signature: Some("sig".into()),
            })
            .await
            .unwrap();
        assert!(passed.all_passed());

        let failed = ControlService::new(&mut session)
            .record(ChecklistInput {
                driver_id: driver,
                safety_net: true,
                signature: Some("  ".into()),
                ..Default::default()
            })
            .await
            .unwrap();
        assert!(!failed.all_passed());
        assert_eq!(failed.signature, None);
        assert_eq!(driver_controls(session.data(), driver).len(), 2);
    }

    #[tokio::test]
    async fn test_unknown_driver_rejected() {
        let store = Arc::new(InMemoryStore::new());
        let mut session = FleetSession::open(EntityRepository::new(store.clone()), None)
            .await
            .unwrap();
        let result = ControlService::new(&mut session)
            .record(ChecklistInput {
                driver_id: Uuid::new_v4(),
                ..Default::default()
            })
            .await;
        assert!(result.is_err());
        assert_eq!(store.write_count().await, 0);
    }
}
