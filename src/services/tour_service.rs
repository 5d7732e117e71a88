//! Planificación de tours y registro de planes de paradas
//!
//! Una tour se identifica por `(date, tourNumber)`: programar dos veces la
//! misma pareja actualiza la existente y conserva su id.

use std::cmp::Ordering;

use chrono::NaiveDate;
use tracing::info;
use uuid::Uuid;

use crate::models::{Driver, StopPlan, Tour, TourStatus, TourType};
use crate::services::session::{FleetData, FleetSession};
use crate::utils::errors::{validation_error, AppResult};
use crate::utils::validation::require_non_empty;

#[derive(Debug, Clone)]
pub struct TourSchedule {
    pub tour_number: String,
    pub date: NaiveDate,
    pub city: String,
    pub driver_id: Uuid,
    pub beginner_driver_id: Option<Uuid>,
    pub vehicle_plate: Option<String>,
    pub tour_type: TourType,
}

#[derive(Debug, Clone)]
pub struct NewStopPlan {
    pub date: Option<NaiveDate>,
    pub addresses: String,
    pub packages: u32,
    pub stops: u32,
}

/// Orden natural de números de tour: "2" < "10" < "10a"
pub fn natural_cmp(a: &str, b: &str) -> Ordering {
    let mut left = a.chars().peekable();
    let mut right = b.chars().peekable();

    loop {
        match (left.peek().copied(), right.peek().copied()) {
            (None, None) => return Ordering::Equal,
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(x), Some(y)) if x.is_ascii_digit() && y.is_ascii_digit() => {
                let mut nx = String::new();
                while let Some(c) = left.peek().copied().filter(char::is_ascii_digit) {
                    nx.push(c);
                    left.next();
                }
                let mut ny = String::new();
                while let Some(c) = right.peek().copied().filter(char::is_ascii_digit) {
                    ny.push(c);
                    right.next();
                }
                let nx = nx.trim_start_matches('0');
                let ny = ny.trim_start_matches('0');
                let ord = nx.len().cmp(&ny.len()).then_with(|| nx.cmp(ny));
                if ord != Ordering::Equal {
                    return ord;
                }
            }
            (Some(x), Some(y)) => {
                let ord = x.to_lowercase().cmp(y.to_lowercase());
                if ord != Ordering::Equal {
                    return ord;
                }
                left.next();
                right.next();
            }
        }
    }
}

/// Tours del día en orden natural de número
pub fn tours_for_date(data: &FleetData, date: NaiveDate) -> Vec<&Tour> {
    let mut tours: Vec<&Tour> = data.tours.iter().filter(|t| t.date == date).collect();
    tours.sort_by(|a, b| natural_cmp(&a.tour_number, &b.tour_number));
    tours
}

/// Tours del día en las que participa el conductor, también como aprendiz
pub fn driver_day_tours(data: &FleetData, driver_id: Uuid, date: NaiveDate) -> Vec<&Tour> {
    tours_for_date(data, date)
        .into_iter()
        .filter(|t| t.involves(driver_id))
        .collect()
}

pub fn find_by_natural_key<'a>(data: &'a FleetData, date: NaiveDate, tour_number: &str) -> Option<&'a Tour> {
    data.tours
        .iter()
        .find(|t| t.date == date && t.tour_number == tour_number)
}

pub struct TourService<'a> {
    session: &'a mut FleetSession,
}

impl<'a> TourService<'a> {
    pub fn new(session: &'a mut FleetSession) -> Self {
        Self { session }
    }

    /// Programar o actualizar la tour de `(date, tourNumber)`
    pub async fn schedule(self, input: TourSchedule) -> AppResult<Tour> {
        let tour_number = require_non_empty("tourNumber", &input.tour_number)?.trim().to_string();
        self.session.get::<Driver>(input.driver_id)?;
        if let Some(beginner) = input.beginner_driver_id {
            if beginner == input.driver_id {
                return Err(validation_error("El aprendiz no puede ser el conductor de la tour"));
            }
            self.session.get::<Driver>(beginner)?;
        }

        let existing = find_by_natural_key(self.session.data(), input.date, &tour_number).cloned();
        let vehicle_plate = input
            .vehicle_plate
            .map(|p| p.trim().to_string())
            .filter(|p| !p.is_empty());

        let tour = match existing {
            Some(mut tour) => {
                tour.city = input.city.trim().to_string();
                tour.driver_id = input.driver_id;
                tour.beginner_driver_id = input.beginner_driver_id;
                tour.vehicle_plate = vehicle_plate;
                tour.tour_type = input.tour_type;
                info!("🗓️ Actualizando tour {} del {}", tour.tour_number, tour.date);
                self.session.update(tour).await?
            }
            None => {
                let tour = Tour {
                    id: Uuid::new_v4(),
                    user_id: self.session.operator_id(),
                    tour_number,
                    city: input.city.trim().to_string(),
                    driver_id: input.driver_id,
                    beginner_driver_id: input.beginner_driver_id,
                    vehicle_plate,
                    date: input.date,
                    status: TourStatus::Pending,
                    tour_type: input.tour_type,
                    progress: 0,
                    total_packages: 0,
                    total_stops: 0,
                };
                info!("🗓️ Programando tour {} del {}", tour.tour_number, tour.date);
                self.session.create(tour).await?
            }
        };
        Ok(tour)
    }

    /// Cerrar la tour con los totales de paradas y paquetes
    pub async fn complete(self, tour_id: Uuid, total_stops: u32, total_packages: u32) -> AppResult<Tour> {
        let mut tour = self.session.get::<Tour>(tour_id)?;
        if matches!(tour.status, TourStatus::Completed | TourStatus::Cancelled) {
            return Err(validation_error(format!(
                "La tour {} ya está cerrada ({:?})",
                tour.tour_number, tour.status
            )));
        }

        tour.total_stops = total_stops;
        tour.total_packages = total_packages;
        tour.status = TourStatus::Completed;
        let tour = self.session.update(tour).await?;
        info!("🏁 Tour {} completada: {} paradas, {} paquetes", tour.tour_number, total_stops, total_packages);
        Ok(tour)
    }

    pub async fn record_stop_plan(self, input: NewStopPlan) -> AppResult<StopPlan> {
        let plan = StopPlan {
            id: Uuid::new_v4(),
            user_id: self.session.operator_id(),
            date: input.date,
            addresses: input.addresses.trim().to_string(),
            packages: input.packages,
            stops: input.stops,
        };
        let plan = self.session.create(plan).await?;
        info!("📍 Plan de paradas {} registrado ({} paradas)", plan.id, plan.stops);
        Ok(plan)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repositories::{EntityRepository, InMemoryStore};
    use std::sync::Arc;

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 19).unwrap()
    }

    fn schedule(number: &str, driver_id: Uuid) -> TourSchedule {
        TourSchedule {
            tour_number: number.to_string(),
            date: day(),
            city: "Berlin".into(),
            driver_id,
            beginner_driver_id: None,
            vehicle_plate: None,
            tour_type: TourType::Fixed,
        }
    }

    async fn setup() -> (FleetSession, Uuid, Uuid) {
        let store = Arc::new(InMemoryStore::new());
        let mut session = FleetSession::open(EntityRepository::new(store), Some(Uuid::new_v4()))
            .await
            .unwrap();
        let a = session
            .create(Driver::new("Ana".into(), "Pop".into(), String::new(), String::new(), false))
            .await
            .unwrap()
            .id;
        let b = session
            .create(Driver::new("Ion".into(), "Rus".into(), String::new(), String::new(), true))
            .await
            .unwrap()
            .id;
        (session, a, b)
    }

    #[test]
    fn test_natural_order() {
        let mut numbers = vec!["10", "2", "1a", "01", "1"];
        numbers.sort_by(|a, b| natural_cmp(a, b));
        assert_eq!(numbers, vec!["01", "1", "1a", "2", "10"]);
    }

    #[tokio::test]
    async fn test_schedule_upserts_on_natural_key() {
        let (mut session, a, b) = setup().await;
        let first = TourService::new(&mut session).schedule(schedule("7", a)).await.unwrap();
        let second = TourService::new(&mut session).schedule(schedule("7", b)).await.unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(session.data().tours.len(), 1);
        assert_eq!(session.data().tours[0].driver_id, b);
    }

    #[tokio::test]
    async fn test_day_listing_and_trainee() {
        let (mut session, a, b) = setup().await;
        TourService::new(&mut session).schedule(schedule("10", a)).await.unwrap();
        TourService::new(&mut session)
            .schedule(TourSchedule {
                beginner_driver_id: Some(b),
                ..schedule("2", a)
            })
            .await
            .unwrap();

        let numbers: Vec<&str> = tours_for_date(session.data(), day())
            .iter()
            .map(|t| t.tour_number.as_str())
            .collect();
        assert_eq!(numbers, vec!["2", "10"]);
        assert_eq!(driver_day_tours(session.data(), a, day()).len(), 2);
        assert_eq!(driver_day_tours(session.data(), b, day()).len(), 1);
    }

    #[tokio::test]
    async fn test_complete_sets_totals() {
        let (mut session, a, _) = setup().await;
        let tour = TourService::new(&mut session).schedule(schedule("3", a)).await.unwrap();
        let done = TourService::new(&mut session).complete(tour.id, 120, 180).await.unwrap();

        assert_eq!(done.status, TourStatus::Completed);
        assert_eq!(done.total_stops, 120);
        assert_eq!(done.total_packages, 180);
        assert!(TourService::new(&mut session).complete(tour.id, 1, 1).await.is_err());
    }

    #[tokio::test]
    async fn test_schedule_rejects_unknown_driver() {
        let (mut session, _, _) = setup().await;
        assert!(TourService::new(&mut session)
            .schedule(schedule("1", Uuid::new_v4()))
            .await
            .is_err());
    }

    #[tokio::test]
    async fn test_stop_plan_stamps_operator() {
        let (mut session, _, _) = setup().await;
        let plan = TourService::new(&mut session)
            .record_stop_plan(NewStopPlan {
                date: Some(day()),
                addresses: "Hauptstr. 1\nNebenstr. 2".into(),
                packages: 14,
                stops: 2,
            })
            .await
            .unwrap();
        assert_eq!(plan.user_id, session.operator_id());
        assert_eq!(session.data().stops.len(), 1);
    }
}
