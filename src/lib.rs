//! tick: exchange market-data poller
//!
//! This library provides the core components for:
//! - Incremental trade feed with per-product offset tracking
//! - Periodic bucketed-rate ingestion into InfluxDB
//! - Coinbase Exchange public REST client
//! - SQLite offset storage
//! - HTTP API and recurring job scheduling
//! - Logging and metrics

pub mod api;
pub mod cli;
pub mod config;
pub mod exchange;
pub mod feed;
pub mod offset;
pub mod rates;
pub mod scheduler;
pub mod telemetry;
pub mod tsdb;
