//! Main entry point for the wp-rest-harvester CLI

use clap::Parser;
use tracing::error;
use tracing_subscriber::EnvFilter;
use wp_rest_harvester::cli::{Cli, Commands};
use wp_rest_harvester::metrics::init_metrics;

/// Initialize tracing subscriber with optional JSON formatting
///
/// Logs go to stderr so records written to stdout stay clean.
fn init_tracing() {
    let json_format = std::env::var("LOG_FORMAT")
        .map(|v| v.to_lowercase() == "json")
        .unwrap_or(false);

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("wp_rest_harvester=info"));

    if json_format {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    if let Some(addr) = cli.metrics_addr {
        init_metrics(addr)?;
    }

    match cli.command {
        Commands::Fetch(ref args) => args.execute(&cli).await?,
        Commands::Routes(ref args) => args.execute(&cli).await?,
    }
    Ok(())
}

#[tokio::main]
async fn main() {
    init_tracing();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        error!("Command failed: {:#}", e);
        std::process::exit(1);
    }
}
