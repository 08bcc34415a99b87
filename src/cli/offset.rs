//! Offset command implementation

use crate::config::Config;
use crate::offset::{OffsetStore, SqliteOffsetStore, NO_OFFSET};
use clap::{Args, Subcommand};

#[derive(Args, Debug)]
pub struct OffsetArgs {
    #[command(subcommand)]
    pub action: OffsetAction,
}

#[derive(Subcommand, Debug)]
pub enum OffsetAction {
    /// Print the last delivered trade id for a product
    Get { product: String },
    /// Overwrite the last delivered trade id for a product
    Set {
        product: String,
        #[arg(allow_negative_numbers = true)]
        value: i64,
    },
}

impl OffsetArgs {
    pub async fn execute(&self, config: &Config) -> anyhow::Result<()> {
        let store = SqliteOffsetStore::open(&config.offsets.path)?;

        match &self.action {
            OffsetAction::Get { product } => {
                let offset = store.get_offset(product).await?;
                if offset == NO_OFFSET {
                    println!("{}: no trades delivered yet", product);
                } else {
                    println!("{}: {}", product, offset);
                }
            }
            OffsetAction::Set { product, value } => {
                store.set_offset(product, *value).await?;
                tracing::info!(prod_id = %product, offset = value, "Offset overwritten");
                println!("{}: {}", product, value);
            }
        }

        Ok(())
    }
}
