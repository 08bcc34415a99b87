//! Configuration types for tick

use crate::telemetry::LogFormat;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::PathBuf;
use std::time::Duration;

/// Root configuration structure
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub exchange: ExchangeConfig,
    #[serde(default)]
    pub influx: InfluxConfig,
    #[serde(default)]
    pub ingest: IngestConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub offsets: OffsetConfig,
    #[serde(default)]
    pub telemetry: TelemetryConfig,
}

/// Exchange REST API configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ExchangeConfig {
    #[serde(default = "default_exchange_url")]
    pub base_url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// The exchange rejects requests that carry no User-Agent
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

fn default_exchange_url() -> String {
    crate::exchange::COINBASE_API_URL.to_string()
}
fn default_timeout_secs() -> u64 {
    10
}
fn default_user_agent() -> String {
    concat!("tick/", env!("CARGO_PKG_VERSION")).to_string()
}

impl Default for ExchangeConfig {
    fn default() -> Self {
        Self {
            base_url: default_exchange_url(),
            timeout_secs: default_timeout_secs(),
            user_agent: default_user_agent(),
        }
    }
}

/// InfluxDB connection configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct InfluxConfig {
    #[serde(default = "default_influx_url")]
    pub url: String,
    #[serde(default = "default_influx_credential")]
    pub username: String,
    #[serde(default = "default_influx_credential")]
    pub password: String,
    /// Target database, created on first ingest if missing
    #[serde(default = "default_influx_database")]
    pub database: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_influx_url() -> String {
    "http://influxdb:8086".to_string()
}
fn default_influx_credential() -> String {
    "root".to_string()
}
fn default_influx_database() -> String {
    "rates".to_string()
}

impl Default for InfluxConfig {
    fn default() -> Self {
        Self {
            url: default_influx_url(),
            username: default_influx_credential(),
            password: default_influx_credential(),
            database: default_influx_database(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Rate ingestion configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct IngestConfig {
    /// Cadence between ingestion ticks per product (seconds)
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,

    /// Candle width requested from the exchange (seconds)
    #[serde(default = "default_granularity_secs")]
    pub granularity_secs: u64,

    /// Products scheduled for ingestion, one job each
    #[serde(default = "default_products")]
    pub products: Vec<String>,
}

fn default_interval_secs() -> u64 {
    60
}
fn default_granularity_secs() -> u64 {
    10
}
fn default_products() -> Vec<String> {
    vec![
        "BTC-USD".to_string(),
        "ETH-USD".to_string(),
        "LTC-USD".to_string(),
    ]
}

impl IngestConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    pub fn granularity(&self) -> Duration {
        Duration::from_secs(self.granularity_secs)
    }
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_interval_secs(),
            granularity_secs: default_granularity_secs(),
            products: default_products(),
        }
    }
}

/// HTTP server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,
}

fn default_bind_addr() -> String {
    "0.0.0.0:9999".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
        }
    }
}

/// Offset store configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct OffsetConfig {
    /// SQLite database file holding one row per product
    #[serde(default = "default_offsets_path")]
    pub path: PathBuf,
}

fn default_offsets_path() -> PathBuf {
    PathBuf::from("offsets.db")
}

impl Default for OffsetConfig {
    fn default() -> Self {
        Self {
            path: default_offsets_path(),
        }
    }
}

/// Telemetry configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TelemetryConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default)]
    pub log_format: LogFormat,
    /// Prometheus exporter port; exporter disabled when unset
    #[serde(default)]
    pub metrics_port: Option<u16>,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_format: LogFormat::default(),
            metrics_port: None,
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    pub fn load(path: impl AsRef<std::path::Path>) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings the ingestor and scheduler cannot run with
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.ingest.interval_secs == 0 {
            anyhow::bail!("ingest.interval_secs must be greater than zero");
        }
        if self.ingest.granularity_secs == 0 {
            anyhow::bail!("ingest.granularity_secs must be greater than zero");
        }
        if self.ingest.products.is_empty() {
            anyhow::bail!("ingest.products must list at least one product");
        }

        let mut seen = HashSet::new();
        for product in &self.ingest.products {
            if product.trim().is_empty() {
                anyhow::bail!("ingest.products contains an empty product id");
            }
            if !seen.insert(product.as_str()) {
                anyhow::bail!("ingest.products lists {} more than once", product);
            }
        }

        Ok(())
    }
}
