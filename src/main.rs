//! rostack-exporter - OpenStack control-plane metrics exporter
//!
//! This binary serves a metrics endpoint that polls an OpenStack deployment
//! on every scrape and emits InfluxDB line protocol.

use anyhow::Result;
use clap::Parser;
use tracing::info;

use rostack_exporter::{cli::Cli, config::Config, server};

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Initialize logging
    rostack_exporter::init_logging(&cli.log_level.to_string())?;

    info!(
        version = env!("CARGO_PKG_VERSION"),
        "Starting rostack-exporter"
    );

    // Load configuration and apply CLI overrides
    let mut config = Config::load_or_default(&cli.config)?;
    cli.apply_overrides(&mut config);
    config.validate()?;

    if cli.validate {
        println!("Configuration is valid");
        return Ok(());
    }

    let port = config.server.port;

    // Start server
    server::run(config, port).await?;

    Ok(())
}
