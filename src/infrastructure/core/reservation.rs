use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::Row;
use tracing::{debug, info};

use crate::domain::core::{CustomerId, Reservation, ReservationId, ReservationRepository};
use crate::domain::{DataAccessError, Entity};
use crate::infrastructure::PgStore;

/// `reservations` の行から予約を復元する。人数が不正な行は読み込みエラーとする。
pub fn reservation_from_row(row: &PgRow) -> Result<Reservation, DataAccessError> {
    Reservation::restore(
        ReservationId::from(row.try_get::<i32, _>("id")?),
        CustomerId::from(row.try_get::<i32, _>("customer_id")?),
        row.try_get("num_guests")?,
        row.try_get("start_at")?,
        row.try_get("notes")?,
    )
    .map_err(|e| DataAccessError::ReadError(Box::new(e)))
}

#[async_trait]
impl ReservationRepository for PgStore {
    async fn find_by_customer(
        &self,
        customer_id: CustomerId,
    ) -> Result<Vec<Reservation>, DataAccessError> {
        debug!(%customer_id, "Loading reservations");
        sqlx::query(
            r#"
            SELECT id, customer_id, num_guests, start_at, notes
            FROM reservations
            WHERE customer_id = $1
            "#,
        )
        .bind(*customer_id)
        .fetch_all(self.pool())
        .await?
        .iter()
        .map(reservation_from_row)
        .collect()
    }

    async fn find_next_by_customer(
        &self,
        customer_id: CustomerId,
        after: DateTime<Utc>,
    ) -> Result<Option<Reservation>, DataAccessError> {
        debug!(%customer_id, %after, "Loading next reservation");
        sqlx::query(
            r#"
            SELECT id, customer_id, num_guests, start_at, notes
            FROM reservations
            WHERE start_at > $1 AND customer_id = $2
            ORDER BY start_at ASC
            LIMIT 1
            "#,
        )
        .bind(after)
        .bind(*customer_id)
        .fetch_optional(self.pool())
        .await?
        .as_ref()
        .map(reservation_from_row)
        .transpose()
    }

    async fn insert(&mut self, entity: &Reservation) -> Result<ReservationId, DataAccessError> {
        let row = sqlx::query(
            r#"
            INSERT INTO reservations (customer_id, num_guests, start_at, notes)
            VALUES ($1, $2, $3, $4)
            RETURNING id
            "#,
        )
        .bind(*entity.customer_id())
        .bind(entity.num_guests())
        .bind(entity.start_at())
        .bind(entity.notes())
        .fetch_one(self.pool())
        .await?;
        let id = ReservationId::from(row.try_get::<i32, _>("id")?);
        info!(%id, customer_id = %entity.customer_id(), "Reservation created");
        Ok(id)
    }

    async fn update(&mut self, entity: &Reservation) -> Result<(), DataAccessError> {
        let Some(id) = entity.id() else {
            return Err(DataAccessError::ClientSideError(
                "cannot update an unsaved reservation".into(),
            ));
        };
        let result = sqlx::query(
            r#"
            UPDATE reservations
            SET customer_id = $1, num_guests = $2, start_at = $3, notes = $4
            WHERE id = $5
            "#,
        )
        .bind(*entity.customer_id())
        .bind(entity.num_guests())
        .bind(entity.start_at())
        .bind(entity.notes())
        .bind(*id)
        .execute(self.pool())
        .await?;
        debug!(%id, rows = result.rows_affected(), "Reservation updated");
        Ok(())
    }
}
