//! Flujo de reclamaciones
//!
//! PENDING -> ERLEDIGT | SCHADEN, ambos terminales. La resolución exige que el
//! operador vuelva a escribir el número de paquete; si no coincide exactamente
//! no se escribe nada.

use chrono::Utc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::models::{Complaint, ComplaintStatus, Driver, Tour};
use crate::services::session::{FleetData, FleetSession};
use crate::utils::errors::{validation_error, AppResult};
use crate::utils::validation::require_non_empty;

#[derive(Debug, Clone, Default)]
pub struct NewComplaint {
    pub tour_id: Uuid,
    pub package_number: String,
    pub address: String,
    pub postal_code: String,
}

#[derive(Debug, Clone, Default)]
pub struct ComplaintEdit {
    pub package_number: Option<String>,
    pub address: Option<String>,
    pub postal_code: Option<String>,
}

/// Reclamaciones, las más recientes primero, opcionalmente por estado
pub fn list_complaints(data: &FleetData, status: Option<ComplaintStatus>) -> Vec<&Complaint> {
    let mut complaints: Vec<&Complaint> = data
        .complaints
        .iter()
        .filter(|c| status.map_or(true, |s| c.status == s))
        .collect();
    complaints.sort_by(|a, b| b.date.cmp(&a.date));
    complaints
}

pub fn driver_complaints(data: &FleetData, driver_id: Uuid) -> Vec<&Complaint> {
    data.complaints.iter().filter(|c| c.driver_id == driver_id).collect()
}

/// Comprobar el token y aplicar el estado terminal sobre una copia
pub fn apply_resolution(complaint: &Complaint, target: ComplaintStatus, token: &str) -> AppResult<Complaint> {
    if complaint.status != ComplaintStatus::Pending {
        return Err(validation_error("La reclamación ya está cerrada"));
    }
    if !target.is_terminal() {
        return Err(validation_error("El estado de destino debe ser final"));
    }
    if token != complaint.package_number {
        return Err(validation_error("El número de paquete no coincide"));
    }

    let mut resolved = complaint.clone();
    resolved.status = target;
    resolved.resolved = true;
    resolved.resolved_at = Some(Utc::now());
    Ok(resolved)
}

pub struct ComplaintService<'a> {
    session: &'a mut FleetSession,
}

impl<'a> ComplaintService<'a> {
    pub fn new(session: &'a mut FleetSession) -> Self {
        Self { session }
    }

    /// Crear la reclamación con las fotos de la tour y del conductor
    pub async fn create(self, input: NewComplaint) -> AppResult<Complaint> {
        require_non_empty("packageNumber", &input.package_number)?;
        let tour = self.session.get::<Tour>(input.tour_id)?;
        let driver_name = self
            .session
            .find::<Driver>(tour.driver_id)
            .map(Driver::full_name)
            .unwrap_or_else(|| "Unknown".to_string());

        let complaint = Complaint {
            id: Uuid::new_v4(),
            user_id: self.session.operator_id(),
            tour_id: tour.id,
            tour_number_snapshot: tour.tour_number.clone(),
            tour_date_snapshot: Some(tour.date),
            driver_name_snapshot: driver_name,
            vehicle_plate_snapshot: tour.vehicle_plate.clone().unwrap_or_default(),
            tour_number: tour.tour_number.clone(),
            driver_id: tour.driver_id,
            package_number: input.package_number.trim().to_string(),
            address: input.address.trim().to_string(),
            postal_code: input.postal_code.trim().to_string(),
            status: ComplaintStatus::Pending,
            resolved: false,
            resolved_at: None,
            date: Some(tour.date),
        };

        let complaint = self.session.create(complaint).await?;
        info!("📝 Reclamación {} creada para la tour {}", complaint.package_number, complaint.tour_number);
        Ok(complaint)
    }

    /// Editar los datos del paquete mientras siga pendiente
    pub async fn update_details(self, complaint_id: Uuid, edit: ComplaintEdit) -> AppResult<Complaint> {
        let mut complaint = self.session.get::<Complaint>(complaint_id)?;
        if complaint.status != ComplaintStatus::Pending {
            return Err(validation_error("Solo se pueden editar reclamaciones pendientes"));
        }

        if let Some(package_number) = edit.package_number {
            complaint.package_number = require_non_empty("packageNumber", &package_number)?.trim().to_string();
        }
        if let Some(address) = edit.address {
            complaint.address = address.trim().to_string();
        }
        if let Some(postal_code) = edit.postal_code {
            complaint.postal_code = postal_code.trim().to_string();
        }
        self.session.update(complaint).await
    }

    /// Resolver con confirmación por número de paquete
    pub async fn resolve(self, complaint_id: Uuid, target: ComplaintStatus, token: &str) -> AppResult<Complaint> {
        let complaint = self.session.get::<Complaint>(complaint_id)?;
        let resolved = match apply_resolution(&complaint, target, token) {
            Ok(resolved) => resolved,
            Err(e) => {
                warn!("⚠️ Resolución rechazada de {}: {}", complaint_id, e);
                return Err(e);
            }
        };

        let resolved = self.session.update(resolved).await?;
        info!("✅ Reclamación {} cerrada como {:?}", resolved.package_number, resolved.status);
        Ok(resolved)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repositories::{EntityRepository, InMemoryStore};
    use crate::utils::errors::AppError;
    use chrono::NaiveDate;
    use std::sync::Arc;

    async fn setup() -> (Arc<InMemoryStore>, FleetSession, Uuid) {
        let store = Arc::new(InMemoryStore::new());
        let mut session = FleetSession::open(EntityRepository::new(store.clone()), None)
            .await
            .unwrap();
        let driver = session
            .create(Driver::new("Ana".into(), "Pop".into(), String::new(), String::new(), false))
            .await
            .unwrap();
        let tour = session
            .create(Tour {
                id: Uuid::new_v4(),
                user_id: None,
                tour_number: "12".into(),
                city: "Berlin".into(),
                driver_id: driver.id,
                beginner_driver_id: None,
                vehicle_plate: Some("B NT 123".into()),
                date: NaiveDate::from_ymd_opt(2026, 10, 19).unwrap(),
                status: Default::default(),
                tour_type: Default::default(),
                progress: 0,
                total_packages: 0,
                total_stops: 0,
            })
            .await
            .unwrap();
        let complaint = ComplaintService::new(&mut session)
            .create(NewComplaint {
                tour_id: tour.id,
                package_number: "PKG-991".into(),
                address: "Hauptstr. 1".into(),
                postal_code: "10115".into(),
            })
            .await
            .unwrap();
        (store, session, complaint.id)
    }

    #[tokio::test]
    async fn test_create_captures_snapshots() {
        let (_, session, id) = setup().await;
        let complaint = session.get::<Complaint>(id).unwrap();
        assert_eq!(complaint.tour_number_snapshot, "12");
        assert_eq!(complaint.driver_name_snapshot, "Ana Pop");
        assert_eq!(complaint.vehicle_plate_snapshot, "B NT 123");
        assert_eq!(complaint.status, ComplaintStatus::Pending);
    }

    #[tokio::test]
    async fn test_wrong_token_performs_no_write() {
        let (store, mut session, id) = setup().await;
        let before = store.write_count().await;

        for token in ["pkg-991", "PKG-99", " PKG-991"] {
            let err = ComplaintService::new(&mut session)
                .resolve(id, ComplaintStatus::Resolved, token)
                .await
                .unwrap_err();
            assert!(matches!(err, AppError::Validation(_)));
        }
        assert_eq!(store.write_count().await, before);
        assert_eq!(session.get::<Complaint>(id).unwrap().status, ComplaintStatus::Pending);
    }

    #[tokio::test]
    async fn test_matching_token_resolves() {
        let (_, mut session, id) = setup().await;
        let resolved = ComplaintService::new(&mut session)
            .resolve(id, ComplaintStatus::Damage, "PKG-991")
            .await
            .unwrap();

        assert_eq!(resolved.status, ComplaintStatus::Damage);
        assert!(resolved.resolved);
        assert!(resolved.resolved_at.is_some());
        assert_eq!(resolved.vehicle_plate_snapshot, "B NT 123");

        // Terminal: no se puede volver a resolver ni editar
        assert!(ComplaintService::new(&mut session)
            .resolve(id, ComplaintStatus::Resolved, "PKG-991")
            .await
            .is_err());
        assert!(ComplaintService::new(&mut session)
            .update_details(id, ComplaintEdit::default())
            .await
            .is_err());
    }

    #[tokio::test]
    async fn test_pending_target_rejected() {
        let (_, mut session, id) = setup().await;
        assert!(ComplaintService::new(&mut session)
            .resolve(id, ComplaintStatus::Pending, "PKG-991")
            .await
            .is_err());
    }

    #[tokio::test]
    async fn test_edit_details_while_pending() {
        let (_, mut session, id) = setup().await;
        let edited = ComplaintService::new(&mut session)
            .update_details(
                id,
                ComplaintEdit {
                    address: Some("Nebenstr. 2".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(edited.address, "Nebenstr. 2");
        assert_eq!(edited.tour_number_snapshot, "12");
        assert_eq!(driver_complaints(session.data(), edited.driver_id).len(), 1);
        assert_eq!(list_complaints(session.data(), Some(ComplaintStatus::Pending)).len(), 1);
    }
}
