//! Incremental trade feed
//!
//! Returns the trades a product has printed since the last request, tracking
//! the delivered high-water mark in an [`OffsetStore`].

use crate::exchange::{CoercionError, Exchange, ExchangeError, RawTrade, Trade};
use crate::offset::{OffsetError, OffsetStore};
use crate::telemetry::{increment_counter, CounterMetric};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Trade feed errors
#[derive(Debug, Error)]
pub enum FeedError {
    #[error(transparent)]
    Exchange(#[from] ExchangeError),
    #[error(transparent)]
    Offset(#[from] OffsetError),
}

impl From<CoercionError> for FeedError {
    fn from(e: CoercionError) -> Self {
        FeedError::Exchange(e.into())
    }
}

/// Keep trades newer than `offset`, coerced and tagged with `product_id`.
///
/// Exchange order is preserved.
pub fn select_new_trades(
    trades: Vec<RawTrade>,
    offset: i64,
    product_id: &str,
) -> Result<Vec<Trade>, CoercionError> {
    trades
        .into_iter()
        .filter(|t| t.trade_id > offset)
        .map(|t| t.coerce(product_id))
        .collect()
}

/// Serves each trade id to consumers at most once per product
pub struct TradeFeed {
    exchange: Arc<dyn Exchange>,
    offsets: Arc<dyn OffsetStore>,
    locks: Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>,
}

impl TradeFeed {
    pub fn new(exchange: Arc<dyn Exchange>, offsets: Arc<dyn OffsetStore>) -> Self {
        Self {
            exchange,
            offsets,
            locks: Mutex::new(HashMap::new()),
        }
    }

    /// Lock serializing read-offset/fetch/write-offset for one product
    fn product_lock<'a>(&'a self, product_id: &'a str) -> ProductLock<'a> {
        let mut locks = self.locks.lock().unwrap_or_else(|e| e.into_inner());
        let lock = locks.entry(product_id.to_string()).or_default().clone();
        ProductLock {
            locks: &self.locks,
            product_id,
            lock,
        }
    }

    /// Fetch trades newer than the product's offset and advance the offset.
    ///
    /// Not idempotent: a repeated call against an unchanged exchange returns
    /// nothing.
    pub async fn new_trades(&self, product_id: &str) -> Result<Vec<Trade>, FeedError> {
        let slot = self.product_lock(product_id);
        let _guard = slot.lock.lock().await;

        let offset = self.offsets.get_offset(product_id).await?;
        let fetched = self.exchange.fetch_trades(product_id).await?;
        let fetched_count = fetched.len();

        let trades = select_new_trades(fetched, offset, product_id)?;

        if let Some(newest) = trades.iter().map(|t| t.trade_id).max() {
            self.offsets.set_offset(product_id, newest).await?;
        }

        increment_counter(
            CounterMetric::TradesServed,
            Some(product_id),
            trades.len() as u64,
        );
        tracing::debug!(
            prod_id = %product_id,
            offset,
            fetched = fetched_count,
            new = trades.len(),
            "Served trade feed"
        );

        Ok(trades)
    }
}

/// Handle on a product's lock; the map entry goes away with its last handle
struct ProductLock<'a> {
    locks: &'a Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>,
    product_id: &'a str,
    lock: Arc<tokio::sync::Mutex<()>>,
}

impl Drop for ProductLock<'_> {
    fn drop(&mut self) {
        let mut locks = self.locks.lock().unwrap_or_else(|e| e.into_inner());
        // Handles are only cloned under `locks`: two means the map's and ours
        if Arc::strong_count(&self.lock) == 2 {
            locks.remove(self.product_id);
        }
    }
}
