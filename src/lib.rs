//! rostack-exporter library
//!
//! This crate polls an OpenStack deployment on every scrape: it authenticates
//! against the identity service, resolves service endpoints from the catalog,
//! gathers identity and compute state, and serves the result as InfluxDB line
//! protocol over HTTP.

pub mod auth;
pub mod catalog;
pub mod cli;
pub mod client;
pub mod config;
pub mod emitter;
pub mod error;
pub mod format;
pub mod plugin;
pub mod pollers;
pub mod server;

use anyhow::Result;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialize the logging subsystem
///
/// # Arguments
/// * `level` - Log level string (trace, debug, info, warn, error)
///
/// # Errors
/// Returns an error if the logging system fails to initialize
pub fn init_logging(level: &str) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    Ok(())
}
