use std::path::Path;

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions},
    FromRow,
};

use super::{ResultStore, StoreError};
use crate::observation::Observation;

const CREATE_TABLE: &str = r#"
    CREATE TABLE IF NOT EXISTS Results (
        Id INTEGER PRIMARY KEY AUTOINCREMENT,
        Endpoint TEXT NOT NULL,
        LatencyMs INTEGER NOT NULL,
        StatusCode INTEGER NOT NULL,
        Timestamp TEXT NOT NULL
    )"#;

#[derive(Debug, FromRow)]
struct ResultRow {
    id: i64,
    endpoint: String,
    latency_ms: i64,
    status_code: i64,
    timestamp: String,
}

impl TryFrom<ResultRow> for Observation {
    type Error = StoreError;

    fn try_from(row: ResultRow) -> Result<Self, Self::Error> {
        let corrupt = |reason: String| StoreError::Corrupt { id: row.id, reason };
        let latency_ms = u64::try_from(row.latency_ms)
            .map_err(|_| corrupt(format!("negative latency {}", row.latency_ms)))?;
        let status_code = u16::try_from(row.status_code)
            .map_err(|_| corrupt(format!("status {} out of range", row.status_code)))?;
        let timestamp = DateTime::parse_from_rfc3339(&row.timestamp)
            .map_err(|e| corrupt(format!("timestamp '{}': {e}", row.timestamp)))?
            .with_timezone(&Utc);

        Ok(Observation {
            endpoint: row.endpoint,
            latency_ms,
            status_code,
            timestamp,
        })
    }
}

/// SQLite-backed store using the `Results` table layout.
///
/// The pool holds a single connection, so concurrent appends are serialized
/// and each insert is its own statement.
#[derive(Debug, Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Open (or create) the database at `path`, keeping any existing rows.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await?;
        sqlx::query(CREATE_TABLE).execute(&pool).await?;
        Ok(Self { pool })
    }

    /// Open the database at `path` and drop rows left by earlier runs.
    pub async fn create(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let store = Self::open(path).await?;
        sqlx::query("DELETE FROM Results")
            .execute(&store.pool)
            .await?;
        Ok(store)
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}

#[async_trait]
impl ResultStore for SqliteStore {
    async fn append(&self, observation: Observation) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO Results (Endpoint, LatencyMs, StatusCode, Timestamp) VALUES (?, ?, ?, ?)",
        )
        .bind(observation.endpoint)
        .bind(i64::try_from(observation.latency_ms).unwrap_or(i64::MAX))
        .bind(i64::from(observation.status_code))
        .bind(
            observation
                .timestamp
                .to_rfc3339_opts(SecondsFormat::AutoSi, false),
        )
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn query_all(&self) -> Result<Vec<Observation>, StoreError> {
        let rows: Vec<ResultRow> = sqlx::query_as(
            "SELECT Id AS id, Endpoint AS endpoint, LatencyMs AS latency_ms, \
             StatusCode AS status_code, Timestamp AS timestamp \
             FROM Results ORDER BY Id",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Observation::try_from).collect()
    }
}
