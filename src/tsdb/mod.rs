//! Time-series storage module
//!
//! Points are written to an InfluxDB 1.x server over its HTTP API

mod influx;
mod point;

pub use influx::InfluxClient;
pub use point::{encode_batch, Point};

use async_trait::async_trait;
use thiserror::Error;

/// Time-series store errors
#[derive(Debug, Error)]
pub enum TsdbError {
    /// Transport-level failure
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    /// Server answered with a non-success status
    #[error("InfluxDB error: {status} - {body}")]
    Status { status: u16, body: String },
    /// Response body did not match the expected shape
    #[error("Failed to decode InfluxDB response: {0}")]
    Decode(#[from] serde_json::Error),
    /// Server accepted the request but the statement failed
    #[error("InfluxDB query failed: {0}")]
    Query(String),
}

/// Trait for time-series sink implementations
#[async_trait]
pub trait TimeSeriesStore: Send + Sync {
    /// Names of all databases on the server
    async fn list_databases(&self) -> Result<Vec<String>, TsdbError>;

    /// Create a database
    async fn create_database(&self, name: &str) -> Result<(), TsdbError>;

    /// Write a batch of points to `database`
    async fn write_points(&self, database: &str, points: &[Point]) -> Result<(), TsdbError>;

    /// Create `name` unless the server already lists it.
    ///
    /// Returns whether the database was created.
    async fn ensure_database(&self, name: &str) -> Result<bool, TsdbError> {
        let databases = self.list_databases().await?;
        if databases.iter().any(|db| db == name) {
            return Ok(false);
        }

        self.create_database(name).await?;
        tracing::info!(database = %name, "Created time-series database");
        Ok(true)
    }
}
