use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::Mutex;
use tracing::debug;

use crate::domain::core::{
    Customer, CustomerId, CustomerRepository, Reservation, ReservationId, ReservationRepository,
};
use crate::domain::{DataAccessError, Entity};

/// プロセス内のストア。PostgreSQL と同じ並び順・結合の規則で動作する。
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    tables: Arc<Mutex<Tables>>,
}

#[derive(Debug, Default)]
struct Tables {
    customers: Vec<Customer>,
    reservations: Vec<Reservation>,
    customer_seq: i32,
    reservation_seq: i32,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn unsaved<E: Entity>() -> DataAccessError {
    DataAccessError::ClientSideError(format!("cannot update an unsaved {}", E::ENTITY_NAME).into())
}

fn stored_customer(id: CustomerId, entity: &Customer) -> Customer {
    Customer::restore(
        id,
        entity.first_name().to_owned(),
        entity.middle_name().map(str::to_owned),
        entity.last_name().to_owned(),
        entity.phone().to_owned(),
        entity.notes().map(str::to_owned),
    )
}

fn stored_reservation(
    id: ReservationId,
    entity: &Reservation,
) -> Result<Reservation, DataAccessError> {
    Reservation::restore(
        id,
        entity.customer_id(),
        entity.num_guests(),
        entity.start_at(),
        entity.notes().map(str::to_owned),
    )
    .map_err(|e| DataAccessError::WriteError(Box::new(e)))
}

#[async_trait]
impl CustomerRepository for MemoryStore {
    async fn find_all(&self) -> Result<Vec<Customer>, DataAccessError> {
        let tables = self.tables.lock().await;
        let mut customers = tables.customers.clone();
        customers.sort_by(|a, b| {
            (a.last_name(), a.first_name()).cmp(&(b.last_name(), b.first_name()))
        });
        Ok(customers)
    }

    async fn find_by_id(&self, id: CustomerId) -> Result<Option<Customer>, DataAccessError> {
        let tables = self.tables.lock().await;
        Ok(tables
            .customers
            .iter()
            .find(|c| c.id() == Some(id))
            .cloned())
    }

    async fn find_best(&self, limit: usize) -> Result<Vec<Customer>, DataAccessError> {
        let tables = self.tables.lock().await;
        let mut counts = HashMap::<CustomerId, usize>::new();
        for reservation in &tables.reservations {
            *counts.entry(reservation.customer_id()).or_default() += 1;
        }
        let mut ranked = tables
            .customers
            .iter()
            .filter_map(|c| Some((counts.get(&c.id()?).copied()?, c)))
            .collect::<Vec<_>>();
        ranked.sort_by(|a, b| b.0.cmp(&a.0));
        Ok(ranked
            .into_iter()
            .take(limit)
            .map(|(_, c)| c.clone())
            .collect())
    }

    async fn insert(&mut self, entity: &Customer) -> Result<CustomerId, DataAccessError> {
        let mut tables = self.tables.lock().await;
        tables.customer_seq += 1;
        let id = CustomerId::from(tables.customer_seq);
        tables.customers.push(stored_customer(id, entity));
        debug!(%id, "Customer created");
        Ok(id)
    }

    async fn update(&mut self, entity: &Customer) -> Result<(), DataAccessError> {
        let id = entity.id().ok_or_else(unsaved::<Customer>)?;
        let mut tables = self.tables.lock().await;
        if let Some(row) = tables.customers.iter_mut().find(|c| c.id() == Some(id)) {
            *row = stored_customer(id, entity);
        }
        Ok(())
    }
}

#[async_trait]
impl ReservationRepository for MemoryStore {
    async fn find_by_customer(
        &self,
        customer_id: CustomerId,
    ) -> Result<Vec<Reservation>, DataAccessError> {
        let tables = self.tables.lock().await;
        Ok(tables
            .reservations
            .iter()
            .filter(|r| r.customer_id() == customer_id)
            .cloned()
            .collect())
    }

    async fn find_next_by_customer(
        &self,
        customer_id: CustomerId,
        after: DateTime<Utc>,
    ) -> Result<Option<Reservation>, DataAccessError> {
        let tables = self.tables.lock().await;
        Ok(tables
            .reservations
            .iter()
            .filter(|r| r.customer_id() == customer_id && r.start_at() > after)
            .min_by_key(|r| r.start_at())
            .cloned())
    }

    async fn insert(&mut self, entity: &Reservation) -> Result<ReservationId, DataAccessError> {
        let mut tables = self.tables.lock().await;
        let id = ReservationId::from(tables.reservation_seq + 1);
        let row = stored_reservation(id, entity)?;
        tables.reservation_seq += 1;
        tables.reservations.push(row);
        debug!(%id, "Reservation created");
        Ok(id)
    }

    async fn update(&mut self, entity: &Reservation) -> Result<(), DataAccessError> {
        let id = entity.id().ok_or_else(unsaved::<Reservation>)?;
        let row = stored_reservation(id, entity)?;
        let mut tables = self.tables.lock().await;
        if let Some(existing) = tables.reservations.iter_mut().find(|r| r.id() == Some(id)) {
            *existing = row;
        }
        Ok(())
    }
}
