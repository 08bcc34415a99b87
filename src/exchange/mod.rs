//! Exchange market-data module
//!
//! Public trade and historic-rate endpoints of the exchange REST API

mod coinbase;
mod types;

pub use coinbase::{CoinbaseClient, CoinbaseConfig, COINBASE_API_URL};
pub use types::{coerce_decimal, Candle, CoercionError, RawCandle, RawTrade, Trade, CANDLE_FIELDS};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::time::Duration;
use thiserror::Error;

/// Exchange client errors
#[derive(Debug, Error)]
pub enum ExchangeError {
    /// Transport-level failure
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    /// Exchange answered with a non-success status
    #[error("Exchange API error: {status} - {message}")]
    Status { status: u16, message: String },
    /// Response body did not match the expected shape
    #[error("Failed to decode exchange response: {0}")]
    Decode(#[from] serde_json::Error),
    /// Payload values could not be coerced to typed records
    #[error(transparent)]
    Coercion(#[from] CoercionError),
    /// Base URL cannot carry product path segments
    #[error("Invalid exchange URL: {0}")]
    InvalidUrl(String),
}

/// Trait for exchange market-data implementations
#[async_trait]
pub trait Exchange: Send + Sync {
    /// Fetch the most recent page of trades for a product
    async fn fetch_trades(&self, product_id: &str) -> Result<Vec<RawTrade>, ExchangeError>;

    /// Fetch positional candle rows covering `[start, end]` at the given granularity
    async fn fetch_historic_rates(
        &self,
        product_id: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        granularity: Duration,
    ) -> Result<Vec<RawCandle>, ExchangeError>;
}
