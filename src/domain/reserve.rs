use chrono::{DateTime, Utc};

use super::core::{CustomerId, Reservation, ReservationRepository};
use super::LunchlyError;

/// 予約に関するユースケース
#[derive(Clone)]
pub struct ReserveService<S> {
    store: S,
}

impl<S> ReserveService<S>
where
    S: ReservationRepository,
{
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// 予約を作成して保存する。人数が不正な場合は保存しない。
    pub async fn reserve(
        &mut self,
        customer_id: CustomerId,
        num_guests: i32,
        start_at: DateTime<Utc>,
        notes: Option<String>,
    ) -> Result<Reservation, LunchlyError> {
        let mut reservation = Reservation::new(customer_id, num_guests, start_at, notes)?;
        reservation.save(&mut self.store).await?;
        Ok(reservation)
    }

    pub async fn reservations_for_customer(
        &self,
        customer_id: CustomerId,
    ) -> Result<Vec<Reservation>, LunchlyError> {
        Reservation::for_customer(&self.store, customer_id).await
    }

    pub async fn next_for_customer(
        &self,
        customer_id: CustomerId,
    ) -> Result<Option<Reservation>, LunchlyError> {
        Reservation::next_for_customer(&self.store, customer_id, Utc::now()).await
    }

    pub async fn save(&mut self, reservation: &mut Reservation) -> Result<(), LunchlyError> {
        reservation.save(&mut self.store).await?;
        Ok(())
    }
}
