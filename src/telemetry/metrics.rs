//! Prometheus metrics

use std::net::SocketAddr;

/// Counter metric types
#[derive(Debug, Clone, Copy)]
pub enum CounterMetric {
    /// Trades returned by the feed endpoint
    TradesServed,
    /// Candle points written to the time-series store
    CandlesWritten,
    /// Scheduled ingestion ticks that failed
    IngestFailures,
    /// Time-series databases created on demand
    DatabasesCreated,
}

impl CounterMetric {
    fn name(self) -> &'static str {
        match self {
            CounterMetric::TradesServed => "tick_trades_served_total",
            CounterMetric::CandlesWritten => "tick_candles_written_total",
            CounterMetric::IngestFailures => "tick_ingest_failures_total",
            CounterMetric::DatabasesCreated => "tick_databases_created_total",
        }
    }
}

/// Increment a counter, labelled by product when one applies
pub fn increment_counter(metric: CounterMetric, prod_id: Option<&str>, value: u64) {
    let name = metric.name();
    match prod_id {
        Some(prod_id) => ::metrics::counter!(name, "prod_id" => prod_id.to_string()).increment(value),
        None => ::metrics::counter!(name).increment(value),
    }
}

/// Serve `/metrics` in Prometheus text format on `port`
pub fn init_metrics(port: u16) -> anyhow::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    metrics_exporter_prometheus::PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .map_err(|e| anyhow::anyhow!("Failed to start metrics exporter: {}", e))?;

    tracing::info!(%addr, "Metrics exporter listening");
    Ok(())
}
