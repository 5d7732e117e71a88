//! Capa de reconciliación
//!
//! Traduce cada transición en un plan ordenado de upserts y lo ejecuta paso a
//! paso contra el store. No hay transacción que abarque conductor y vehículo:
//! si un paso falla después de que otro ya se confirmó, se informa un
//! `InvariantViolation` con las escrituras pendientes y no se intenta ninguna
//! reparación automática. El plan pendiente queda en la sesión para un
//! reintento explícito.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::models::{Driver, InventoryItem};
use crate::services::assignment_registry::{check_assignment_invariants, InvariantBreach};
use crate::services::session::FleetSession;
use crate::utils::errors::{AppError, AppResult};

/// Escritura individual de una saga
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", content = "record", rename_all = "snake_case")]
pub enum EntityWrite {
    Vehicle(InventoryItem),
    Driver(Driver),
    DeleteDriver(Uuid),
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PlannedWrite {
    pub label: String,
    #[serde(flatten)]
    pub write: EntityWrite,
}

/// Secuencia ordenada de escrituras de una operación
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct WritePlan {
    pub operation: String,
    pub steps: Vec<PlannedWrite>,
    /// Registros de la operación completa, también los ya confirmados
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub related: Vec<Uuid>,
}

impl WritePlan {
    pub fn new(operation: impl Into<String>) -> Self {
        Self {
            operation: operation.into(),
            steps: Vec::new(),
            related: Vec::new(),
        }
    }

    pub fn vehicle(mut self, label: impl Into<String>, vehicle: InventoryItem) -> Self {
        self.push(label, EntityWrite::Vehicle(vehicle));
        self
    }

    pub fn driver(mut self, label: impl Into<String>, driver: Driver) -> Self {
        self.push(label, EntityWrite::Driver(driver));
        self
    }

    pub fn delete_driver(mut self, label: impl Into<String>, driver_id: Uuid) -> Self {
        self.push(label, EntityWrite::DeleteDriver(driver_id));
        self
    }

    pub fn push(&mut self, label: impl Into<String>, write: EntityWrite) {
        self.steps.push(PlannedWrite {
            label: label.into(),
            write,
        });
    }

    /// Añadir al final los pasos de otro plan
    pub fn extend(mut self, other: WritePlan) -> Self {
        self.steps.extend(other.steps);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Ids de conductores y vehículos que toca el plan
    pub fn touched(&self) -> (Vec<Uuid>, Vec<Uuid>) {
        let mut drivers = Vec::new();
        let mut vehicles = Vec::new();
        for step in &self.steps {
            match &step.write {
                EntityWrite::Vehicle(v) => vehicles.push(v.id),
                EntityWrite::Driver(d) => drivers.push(d.id),
                EntityWrite::DeleteDriver(id) => drivers.push(*id),
            }
        }
        (drivers, vehicles)
    }

    /// Si el plan, o la operación de la que proviene, toca el registro
    pub fn mentions(&self, id: Uuid) -> bool {
        if self.related.contains(&id) {
            return true;
        }
        let (drivers, vehicles) = self.touched();
        drivers.contains(&id) || vehicles.contains(&id)
    }
}

/// Informe de un invariante roto tras una secuencia de escrituras
#[derive(Debug, Clone, Serialize)]
pub struct InvariantReport {
    pub operation: String,
    pub breaches: Vec<InvariantBreach>,
    /// Escrituras que no llegaron a confirmarse, en orden
    pub pending: Vec<PlannedWrite>,
    pub cause: Option<String>,
}

impl fmt::Display for InvariantReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {} breach(es)", self.operation, self.breaches.len())?;
        if !self.pending.is_empty() {
            write!(f, ", {} pending write(s)", self.pending.len())?;
        }
        if let Some(cause) = &self.cause {
            write!(f, " (cause: {})", cause)?;
        }
        for breach in &self.breaches {
            write!(f, "; {}", breach)?;
        }
        Ok(())
    }
}

/// Ejecutor de planes sobre la sesión
pub struct Reconciler<'a> {
    session: &'a mut FleetSession,
}

impl<'a> Reconciler<'a> {
    pub fn new(session: &'a mut FleetSession) -> Self {
        Self { session }
    }

    /// Ejecutar el plan en orden y verificar el invariante de asignación.
    ///
    /// Si falla el primer paso no se aplicó nada y se devuelve el error del
    /// store. Si falla un paso posterior, el plan restante queda pendiente.
    pub async fn execute(mut self, plan: WritePlan) -> AppResult<()> {
        let total = plan.steps.len();
        let (driver_ids, vehicle_ids) = plan.touched();

        for (index, step) in plan.steps.iter().enumerate() {
            info!("🔄 [{}] paso {}/{}: {}", plan.operation, index + 1, total, step.label);

            if let Err(e) = self.apply(step.write.clone()).await {
                if index == 0 {
                    warn!("⚠️ [{}] no aplicado: {}", plan.operation, e);
                    return Err(e);
                }

                let mut related = plan.related.clone();
                for id in driver_ids.iter().chain(vehicle_ids.iter()) {
                    if !related.contains(id) {
                        related.push(*id);
                    }
                }
                let pending = WritePlan {
                    operation: plan.operation.clone(),
                    steps: plan.steps[index..].to_vec(),
                    related,
                };
                let data = self.session.data();
                let breaches = check_assignment_invariants(&data.drivers, &data.inventory)
                    .into_iter()
                    .filter(|b| b.touches(&driver_ids, &vehicle_ids))
                    .collect();

                let report = InvariantReport {
                    operation: plan.operation.clone(),
                    breaches,
                    pending: pending.steps.clone(),
                    cause: Some(e.to_string()),
                };
                error!("🚨 [{}] saga incompleta: {}", plan.operation, report);
                self.session.set_pending(Some(pending));
                return Err(AppError::InvariantViolation(report));
            }

            info!("✅ [{}] paso {}/{} confirmado", plan.operation, index + 1, total);
        }

        self.verify(&plan.operation, &driver_ids, &vehicle_ids)
    }

    async fn apply(&mut self, write: EntityWrite) -> AppResult<()> {
        match write {
            EntityWrite::Vehicle(vehicle) => {
                self.session.update(vehicle).await?;
            }
            EntityWrite::Driver(driver) => {
                self.session.update(driver).await?;
            }
            EntityWrite::DeleteDriver(id) => {
                self.session.remove::<Driver>(id).await?;
            }
        }
        Ok(())
    }

    /// Post-condición: ninguna ruptura sobre los registros tocados
    fn verify(&self, operation: &str, driver_ids: &[Uuid], vehicle_ids: &[Uuid]) -> AppResult<()> {
        let data = self.session.data();
        let (own, foreign): (Vec<_>, Vec<_>) = check_assignment_invariants(&data.drivers, &data.inventory)
            .into_iter()
            .partition(|b| b.touches(driver_ids, vehicle_ids));

        for breach in &foreign {
            warn!("⚠️ Invariante roto fuera de '{}': {}", operation, breach);
        }

        if own.is_empty() {
            return Ok(());
        }

        let report = InvariantReport {
            operation: operation.to_string(),
            breaches: own,
            pending: Vec::new(),
            cause: None,
        };
        error!("🚨 Post-condición fallida: {}", report);
        Err(AppError::InvariantViolation(report))
    }
}
