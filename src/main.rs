use clap::Parser;
use std::path::Path;
use tick::cli::{Cli, Commands};
use tick::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let config = if Path::new(&cli.config).exists() {
        Config::load(&cli.config)?
    } else {
        eprintln!("Warning: config file {} not found", cli.config);
        eprintln!("Using default configuration");
        Config::default()
    };

    // Initialize telemetry
    let _telemetry = tick::telemetry::init_telemetry(&config.telemetry)?;

    match cli.command {
        Commands::Serve(args) => {
            tracing::info!("Starting trade feed and rate ingestion");
            args.execute(&config).await?;
        }
        Commands::Ingest(args) => {
            args.execute(&config).await?;
        }
        Commands::Offset(args) => {
            args.execute(&config).await?;
        }
        Commands::Config => {
            println!("Current configuration:");
            print!("{}", toml::to_string_pretty(&config)?);
        }
    }

    Ok(())
}
