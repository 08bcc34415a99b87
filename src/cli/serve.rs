//! Serve command implementation

use crate::api;
use crate::config::Config;
use crate::feed::TradeFeed;
use crate::offset::SqliteOffsetStore;
use crate::scheduler::Scheduler;
use clap::Args;
use std::sync::Arc;

#[derive(Args, Debug)]
pub struct ServeArgs {
    /// Address to bind the HTTP server to (overrides server.bind_addr)
    #[arg(long)]
    pub bind: Option<String>,

    /// Serve the trade feed without scheduling rate ingestion
    #[arg(long)]
    pub no_ingest: bool,
}

impl ServeArgs {
    pub async fn execute(&self, config: &Config) -> anyhow::Result<()> {
        let exchange = super::exchange_client(config)?;
        let offsets = Arc::new(SqliteOffsetStore::open(&config.offsets.path)?);
        let feed = Arc::new(TradeFeed::new(exchange.clone(), offsets));

        let mut scheduler = None;
        if !self.no_ingest {
            let ingestor = super::rate_ingestor(config, exchange)?;
            let mut jobs = Scheduler::new(Arc::new(ingestor));
            jobs.start(&config.ingest.products)?;
            scheduler = Some(jobs);
        }

        let bind_addr = self.bind.as_deref().unwrap_or(&config.server.bind_addr);
        let listener = tokio::net::TcpListener::bind(bind_addr).await?;
        tracing::info!(addr = %bind_addr, "API server listening");

        let served = axum::serve(listener, api::router(feed))
            .with_graceful_shutdown(shutdown_signal())
            .await;

        if let Some(mut jobs) = scheduler {
            jobs.stop().await;
        }

        served?;
        Ok(())
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
