pub mod core;
mod memory;

use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing::info;

use crate::domain::DataAccessError;
use crate::Database;

pub use self::memory::MemoryStore;

impl From<sqlx::Error> for DataAccessError {
    fn from(value: sqlx::Error) -> Self {
        match value {
            sqlx::Error::Configuration(_)
            | sqlx::Error::Io(_)
            | sqlx::Error::Tls(_)
            | sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed
            | sqlx::Error::WorkerCrashed => Self::ConnectionError(Box::new(value)),
            sqlx::Error::Database(_) | sqlx::Error::Protocol(_) => {
                Self::QueryError(Box::new(value))
            }
            sqlx::Error::RowNotFound
            | sqlx::Error::TypeNotFound { .. }
            | sqlx::Error::ColumnIndexOutOfBounds { .. }
            | sqlx::Error::ColumnNotFound(_)
            | sqlx::Error::ColumnDecode { .. }
            | sqlx::Error::Decode(_) => Self::ReadError(Box::new(value)),
            sqlx::Error::Encode(_) => Self::WriteError(Box::new(value)),
            _ => Self::ClientSideError(Box::new(value)),
        }
    }
}

/// PostgreSQL をバックエンドとするストア
#[derive(Clone, Debug)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// テーブルがなければ作成する
    pub async fn migrate(&self) -> Result<(), DataAccessError> {
        info!("Running lunchly migrations");

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS customers (
                id SERIAL PRIMARY KEY,
                first_name TEXT NOT NULL,
                middle_name TEXT,
                last_name TEXT NOT NULL,
                phone TEXT NOT NULL DEFAULT '',
                notes TEXT
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS reservations (
                id SERIAL PRIMARY KEY,
                customer_id INTEGER NOT NULL REFERENCES customers (id),
                start_at TIMESTAMPTZ NOT NULL,
                num_guests INTEGER NOT NULL CHECK (num_guests > 0),
                notes TEXT
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS reservations_customer_id_idx ON reservations (customer_id)",
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

/// 設定に従ってデータベースに接続する
pub async fn connect(database: &Database) -> Result<PgStore, DataAccessError> {
    let pool = PgPoolOptions::new()
        .max_connections(database.max_connections)
        .connect(&database.url)
        .await?;
    info!(max_connections = database.max_connections, "Connected to database");
    Ok(PgStore::new(pool))
}
