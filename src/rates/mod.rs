//! Bucketed rate ingestion
//!
//! Each tick fetches one interval of fixed-granularity candles for a product
//! and writes them to the time-series store as `rates` points. A window that
//! fails is not retried and is never backfilled by later ticks.

use crate::exchange::{Candle, CoercionError, Exchange, ExchangeError};
use crate::telemetry::{increment_counter, CounterMetric};
use crate::tsdb::{Point, TimeSeriesStore, TsdbError};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Measurement every candle point is written under
pub const RATES_MEASUREMENT: &str = "rates";

/// Tag carrying the product id
pub const PROD_ID_TAG: &str = "prod_id";

/// Rate ingestion errors
#[derive(Debug, Error)]
pub enum IngestError {
    #[error(transparent)]
    Exchange(#[from] ExchangeError),
    #[error(transparent)]
    Tsdb(#[from] TsdbError),
    /// Interval too large to subtract from the current time
    #[error("Ingest interval out of range: {0:?}")]
    IntervalOutOfRange(Duration),
}

impl From<CoercionError> for IngestError {
    fn from(e: CoercionError) -> Self {
        IngestError::Exchange(e.into())
    }
}

/// Build the point a candle is stored as
pub fn candle_point(product_id: &str, candle: &Candle) -> Point {
    candle
        .fields()
        .into_iter()
        .fold(
            Point::new(RATES_MEASUREMENT, candle.time).tag(PROD_ID_TAG, product_id),
            |point, (name, value)| point.field(name, value),
        )
}

/// Fetches recent candles and writes them to the time-series store
pub struct RateIngestor {
    exchange: Arc<dyn Exchange>,
    store: Arc<dyn TimeSeriesStore>,
    database: String,
    interval: Duration,
    granularity: Duration,
}

impl RateIngestor {
    pub fn new(
        exchange: Arc<dyn Exchange>,
        store: Arc<dyn TimeSeriesStore>,
        database: impl Into<String>,
        interval: Duration,
        granularity: Duration,
    ) -> Self {
        Self {
            exchange,
            store,
            database: database.into(),
            interval,
            granularity,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Ingest the interval ending now
    ///
    /// Returns the number of points written.
    pub async fn ingest_recent_rates(&self, product_id: &str) -> Result<usize, IngestError> {
        self.ingest_last(product_id, self.interval).await
    }

    /// Ingest the `window` ending now
    pub async fn ingest_last(&self, product_id: &str, window: Duration) -> Result<usize, IngestError> {
        let span =
            chrono::Duration::from_std(window).map_err(|_| IngestError::IntervalOutOfRange(window))?;
        let end = Utc::now();
        let start = end
            .checked_sub_signed(span)
            .ok_or(IngestError::IntervalOutOfRange(window))?;

        self.ingest_window(product_id, start, end).await
    }

    /// Ingest candles covering `[start, end]`
    pub async fn ingest_window(
        &self,
        product_id: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<usize, IngestError> {
        let rows = self
            .exchange
            .fetch_historic_rates(product_id, start, end, self.granularity)
            .await?;

        let points = rows
            .iter()
            .map(|row| Candle::from_row(row).map(|candle| candle_point(product_id, &candle)))
            .collect::<Result<Vec<_>, _>>()?;

        if self.store.ensure_database(&self.database).await? {
            increment_counter(CounterMetric::DatabasesCreated, None, 1);
        }
        self.store.write_points(&self.database, &points).await?;

        increment_counter(
            CounterMetric::CandlesWritten,
            Some(product_id),
            points.len() as u64,
        );
        tracing::info!(
            prod_id = %product_id,
            count = points.len(),
            start = %start,
            end = %end,
            "Ingested rates"
        );

        Ok(points.len())
    }
}
