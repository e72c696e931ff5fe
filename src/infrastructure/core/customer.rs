use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::Row;
use tracing::{debug, info};

use crate::domain::core::{Customer, CustomerId, CustomerRepository};
use crate::domain::{DataAccessError, Entity};
use crate::infrastructure::PgStore;

/// `customers` の行からお客様を復元する
pub fn customer_from_row(row: &PgRow) -> Result<Customer, DataAccessError> {
    Ok(Customer::restore(
        CustomerId::from(row.try_get::<i32, _>("id")?),
        row.try_get("first_name")?,
        row.try_get("middle_name")?,
        row.try_get("last_name")?,
        row.try_get("phone")?,
        row.try_get("notes")?,
    ))
}

#[async_trait]
impl CustomerRepository for PgStore {
    async fn find_all(&self) -> Result<Vec<Customer>, DataAccessError> {
        debug!("Loading all customers");
        sqlx::query(
            r#"
            SELECT id, first_name, middle_name, last_name, phone, notes
            FROM customers
            ORDER BY last_name, first_name
            "#,
        )
        .fetch_all(self.pool())
        .await?
        .iter()
        .map(customer_from_row)
        .collect()
    }

    async fn find_by_id(&self, id: CustomerId) -> Result<Option<Customer>, DataAccessError> {
        debug!(%id, "Loading customer");
        sqlx::query(
            r#"
            SELECT id, first_name, middle_name, last_name, phone, notes
            FROM customers
            WHERE id = $1
            "#,
        )
        .bind(*id)
        .fetch_optional(self.pool())
        .await?
        .as_ref()
        .map(customer_from_row)
        .transpose()
    }

    async fn find_best(&self, limit: usize) -> Result<Vec<Customer>, DataAccessError> {
        debug!(limit, "Loading best customers");
        sqlx::query(
            r#"
            SELECT customers.id,
                customers.first_name,
                customers.middle_name,
                customers.last_name,
                customers.phone,
                customers.notes
            FROM customers
            JOIN reservations ON customers.id = reservations.customer_id
            GROUP BY customers.id
            ORDER BY COUNT(reservations.id) DESC
            LIMIT $1
            "#,
        )
        .bind(i64::try_from(limit).unwrap_or(i64::MAX))
        .fetch_all(self.pool())
        .await?
        .iter()
        .map(customer_from_row)
        .collect()
    }

    async fn insert(&mut self, entity: &Customer) -> Result<CustomerId, DataAccessError> {
        let row = sqlx::query(
            r#"
            INSERT INTO customers (first_name, middle_name, last_name, phone, notes)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id
            "#,
        )
        .bind(entity.first_name())
        .bind(entity.middle_name())
        .bind(entity.last_name())
        .bind(entity.phone())
        .bind(entity.notes())
        .fetch_one(self.pool())
        .await?;
        let id = CustomerId::from(row.try_get::<i32, _>("id")?);
        info!(%id, "Customer created");
        Ok(id)
    }

    async fn update(&mut self, entity: &Customer) -> Result<(), DataAccessError> {
        let Some(id) = entity.id() else {
            return Err(DataAccessError::ClientSideError(
                "cannot update an unsaved customer".into(),
            ));
        };
        let result = sqlx::query(
            r#"
            UPDATE customers
            SET first_name = $1, middle_name = $2, last_name = $3, phone = $4, notes = $5
            WHERE id = $6
            "#,
        )
        .bind(entity.first_name())
        .bind(entity.middle_name())
        .bind(entity.last_name())
        .bind(entity.phone())
        .bind(entity.notes())
        .bind(*id)
        .execute(self.pool())
        .await?;
        debug!(%id, rows = result.rows_affected(), "Customer updated");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};

    use crate::domain::core::Reservation;
    use crate::infrastructure::connect;
    use crate::Database;

    use super::*;

    // LUNCHLY_DATABASE_URL に接続できるPostgreSQLが必要
    #[tokio::test]
    #[ignore]
    async fn test_repository() {
        let url = std::env::var("LUNCHLY_DATABASE_URL").unwrap();
        let mut store = connect(&Database {
            url,
            max_connections: 2,
        })
        .await
        .unwrap();
        store.migrate().await.unwrap();

        let mut customer = Customer::new(
            "Jane".to_owned(),
            Some("Q".to_owned()),
            "Doe".to_owned(),
            "555-0100".to_owned(),
            None,
        );
        let id = customer.save(&mut store).await.unwrap();
        assert_eq!(Customer::get(&store, id).await.unwrap(), customer);

        customer.change_notes(Some("regular".to_owned()));
        customer.save(&mut store).await.unwrap();
        assert_eq!(
            Customer::get(&store, id).await.unwrap().notes(),
            Some("regular")
        );

        let start_at = Utc::now() + Duration::days(3);
        let mut reservation = Reservation::new(id, 2, start_at, None).unwrap();
        reservation.save(&mut store).await.unwrap();
        let loaded = customer.reservations(&store).await.unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].num_guests(), 2);

        assert!(Customer::best(&store, 100)
            .await
            .unwrap()
            .iter()
            .any(|c| c.id() == Some(id)));
    }
}
