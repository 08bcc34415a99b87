//! Ingest command implementation

use crate::config::Config;
use clap::Args;
use std::time::Duration;

#[derive(Args, Debug)]
pub struct IngestArgs {
    /// Product to ingest (e.g. BTC-USD)
    #[arg(short, long)]
    pub product: String,

    /// Window length in minutes, ending now (defaults to the ingest interval)
    #[arg(long)]
    pub minutes: Option<u64>,
}

impl IngestArgs {
    pub async fn execute(&self, config: &Config) -> anyhow::Result<()> {
        let exchange = super::exchange_client(config)?;
        let ingestor = super::rate_ingestor(config, exchange)?;

        let window = self
            .minutes
            .map(|m| Duration::from_secs(m.saturating_mul(60)))
            .unwrap_or_else(|| config.ingest.interval());

        tracing::info!(prod_id = %self.product, ?window, "Ingesting rates");
        let written = ingestor.ingest_last(&self.product, window).await?;
        println!("Wrote {} points for {}", written, self.product);

        Ok(())
    }
}
