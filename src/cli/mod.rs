//! CLI interface for tick
//!
//! Provides subcommands for:
//! - `serve`: Run the trade feed API and scheduled rate ingestion
//! - `ingest`: Ingest one window of rates for a product now
//! - `offset`: Inspect or repair a stored trade offset
//! - `config`: Show the effective configuration

mod ingest;
mod offset;
mod serve;

pub use ingest::IngestArgs;
pub use offset::{OffsetAction, OffsetArgs};
pub use serve::ServeArgs;

use crate::config::Config;
use crate::exchange::{CoinbaseClient, CoinbaseConfig, Exchange};
use crate::rates::RateIngestor;
use crate::tsdb::InfluxClient;
use clap::{Parser, Subcommand};
use std::sync::Arc;

#[derive(Parser, Debug)]
#[command(name = "tick")]
#[command(about = "Exchange rate ingestion and incremental trade feed")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Path to configuration file
    #[arg(short, long, default_value = "config.toml")]
    pub config: String,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Serve the trade feed and run scheduled rate ingestion
    Serve(ServeArgs),
    /// Ingest one window of rates for a product
    Ingest(IngestArgs),
    /// Inspect or repair stored trade offsets
    Offset(OffsetArgs),
    /// Show the effective configuration
    Config,
}

fn exchange_client(config: &Config) -> anyhow::Result<Arc<dyn Exchange>> {
    let client = CoinbaseClient::with_config(CoinbaseConfig::from(&config.exchange))?;
    Ok(Arc::new(client))
}

fn rate_ingestor(config: &Config, exchange: Arc<dyn Exchange>) -> anyhow::Result<RateIngestor> {
    let influx = InfluxClient::new(config.influx.clone())?;
    let database = influx.database().to_string();

    Ok(RateIngestor::new(
        exchange,
        Arc::new(influx),
        database,
        config.ingest.interval(),
        config.ingest.granularity(),
    ))
}
