//! Measurement Repository

use crate::StorageError;
use serde::{Deserialize, Serialize};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use sqlx::FromRow;
use std::str::FromStr;
use tracing::{debug, info};

const CREATE_TABLE: &str = "CREATE TABLE IF NOT EXISTS measurements (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    hour INTEGER NOT NULL,
    date TEXT NOT NULL,
    temperature REAL NOT NULL,
    wind_speed REAL NOT NULL
)";

const CREATE_INDEX: &str =
    "CREATE INDEX IF NOT EXISTS idx_measurements_hour_date ON measurements (hour, date)";

/// A stored weather sample
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Measurement {
    pub id: i64,
    /// Hour of day (0-23) the sample was taken
    pub hour: u32,
    /// Calendar date the sample was taken, already formatted
    pub date: String,
    pub temperature: f64,
    #[serde(rename = "windspeed")]
    pub wind_speed: f64,
}

/// A sample that has not been stored yet
#[derive(Debug, Clone, PartialEq)]
pub struct NewMeasurement {
    pub hour: u32,
    pub date: String,
    pub temperature: f64,
    pub wind_speed: f64,
}

/// SQLite-backed measurement store
///
/// Cloning is cheap: clones share the same connection pool.
#[derive(Debug, Clone)]
pub struct MeasurementStore {
    pool: SqlitePool,
}

impl MeasurementStore {
    /// Open (or create) the database at `url` and make sure the schema exists
    pub async fn connect(url: &str) -> Result<Self, StorageError> {
        info!("Opening measurement store at {}", url);

        let options = SqliteConnectOptions::from_str(url)
            .map_err(|e| StorageError::InvalidUrl(e.to_string()))?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?;

        let store = Self { pool };
        store.migrate().await?;
        Ok(store)
    }

    /// Create a private in-memory store
    ///
    /// Uses a single connection that never expires, since every SQLite
    /// memory connection is its own database.
    pub async fn in_memory() -> Result<Self, StorageError> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")
            .map_err(|e| StorageError::InvalidUrl(e.to_string()))?;

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;

        let store = Self { pool };
        store.migrate().await?;
        Ok(store)
    }

    async fn migrate(&self) -> Result<(), StorageError> {
        sqlx::query(CREATE_TABLE).execute(&self.pool).await?;
        sqlx::query(CREATE_INDEX).execute(&self.pool).await?;
        debug!("Measurement schema ready");
        Ok(())
    }

    /// Latest measurement for an hour on a given date, if any
    pub async fn find_by_hour_and_date(
        &self,
        hour: u32,
        date: &str,
    ) -> Result<Option<Measurement>, StorageError> {
        let row = sqlx::query_as::<_, Measurement>(
            "SELECT id, hour, date, temperature, wind_speed FROM measurements
             WHERE hour = ? AND date = ?
             ORDER BY id DESC LIMIT 1",
        )
        .bind(hour)
        .bind(date)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    /// All measurements for an hour, oldest first
    pub async fn find_by_hour(&self, hour: u32) -> Result<Vec<Measurement>, StorageError> {
        let rows = sqlx::query_as::<_, Measurement>(
            "SELECT id, hour, date, temperature, wind_speed FROM measurements
             WHERE hour = ?
             ORDER BY id",
        )
        .bind(hour)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    /// Insert a measurement; the id is assigned by SQLite
    pub async fn insert(&self, record: NewMeasurement) -> Result<Measurement, StorageError> {
        let stored = sqlx::query_as::<_, Measurement>(
            "INSERT INTO measurements (hour, date, temperature, wind_speed)
             VALUES (?, ?, ?, ?)
             RETURNING id, hour, date, temperature, wind_speed",
        )
        .bind(record.hour)
        .bind(&record.date)
        .bind(record.temperature)
        .bind(record.wind_speed)
        .fetch_one(&self.pool)
        .await?;

        debug!("Inserted measurement with ID {}", stored.id);
        Ok(stored)
    }

    /// Total number of stored measurements
    pub async fn count(&self) -> Result<i64, StorageError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM measurements")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    /// Close the pool; later calls fail with a database error
    pub async fn close(&self) {
        self.pool.close().await;
    }
}
