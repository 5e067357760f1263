//! CLI argument parsing for rostack-exporter
//!
//! This module provides the command-line interface using clap derive macros.
//!
//! # Options
//!
//! - `--config` / `-c`: Configuration file path (default: config.yaml, env: ROSTACK_CONFIG)
//! - `--port` / `-p`: Server port (overrides config file, env: ROSTACK_PORT)
//! - `--bind-address`: Server bind address (env: ROSTACK_BIND_ADDRESS)
//! - `--metrics-path`: Metrics endpoint path (env: ROSTACK_METRICS_PATH)
//! - `--identity-endpoint`: OpenStack identity URL (env: ROSTACK_IDENTITY_ENDPOINT)
//! - `--username`: Identity username (env: ROSTACK_USERNAME)
//! - `--password`: Identity password (env: ROSTACK_PASSWORD)
//! - `--domain`: Identity domain name (env: ROSTACK_DOMAIN)
//! - `--project`: Project name for scoped authentication (env: ROSTACK_PROJECT)
//! - `--interface`: Preferred catalog interface (env: ROSTACK_INTERFACE)
//! - `--region`: Catalog region filter (env: ROSTACK_REGION)
//! - `--timeout`: HTTP timeout in milliseconds (env: ROSTACK_TIMEOUT)
//! - `--insecure`: Skip TLS certificate verification (env: ROSTACK_INSECURE)
//! - `--all-tenants`: List servers across all tenants (env: ROSTACK_ALL_TENANTS)
//! - `--validate`: Validate configuration without starting server
//! - `--log-level` / `-l`: Log level (trace/debug/info/warn/error, env: ROSTACK_LOG_LEVEL)
//!
//! # Precedence
//!
//! Configuration values are resolved in the following order (highest to lowest priority):
//! 1. CLI arguments
//! 2. Environment variables
//! 3. Configuration file
//! 4. Default values

use clap::{Parser, ValueEnum};
use std::path::PathBuf;

use crate::catalog::Interface;
use crate::config::Config;

/// rostack-exporter - OpenStack control-plane metrics exporter written in Rust
///
/// Polls an OpenStack deployment (identity and compute services) on every
/// scrape and serves the measurements as InfluxDB line protocol.
///
/// Environment variables can be used for all configuration options.
/// CLI arguments take precedence over environment variables,
/// which take precedence over config file values.
#[derive(Parser, Debug)]
#[command(name = "rostack-exporter")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to configuration file
    #[arg(
        short,
        long,
        value_name = "FILE",
        default_value = "config.yaml",
        env = "ROSTACK_CONFIG"
    )]
    pub config: PathBuf,

    /// Server port (overrides config file)
    #[arg(short, long, value_name = "PORT", env = "ROSTACK_PORT")]
    pub port: Option<u16>,

    /// Server bind address (overrides config file)
    /// Supported values: IP addresses (0.0.0.0, 127.0.0.1, ::1) or "localhost"
    #[arg(long, value_name = "ADDRESS", env = "ROSTACK_BIND_ADDRESS")]
    pub bind_address: Option<String>,

    /// Metrics endpoint path (overrides config file)
    /// Must start with '/' and not conflict with '/' or '/health'
    #[arg(long, value_name = "PATH", env = "ROSTACK_METRICS_PATH")]
    pub metrics_path: Option<String>,

    /// OpenStack identity endpoint URL (overrides config file)
    #[arg(long, value_name = "URL", env = "ROSTACK_IDENTITY_ENDPOINT")]
    pub identity_endpoint: Option<String>,

    /// Identity username (overrides config file)
    #[arg(long, value_name = "USERNAME", env = "ROSTACK_USERNAME")]
    pub username: Option<String>,

    /// Identity password (overrides config file)
    #[arg(long, value_name = "PASSWORD", env = "ROSTACK_PASSWORD")]
    pub password: Option<String>,

    /// Identity domain name (overrides config file)
    #[arg(long, value_name = "DOMAIN", env = "ROSTACK_DOMAIN")]
    pub domain: Option<String>,

    /// Project name for scoped authentication (overrides config file)
    #[arg(long, value_name = "PROJECT", env = "ROSTACK_PROJECT")]
    pub project: Option<String>,

    /// Preferred catalog endpoint interface (overrides config file)
    #[arg(long, value_enum, env = "ROSTACK_INTERFACE")]
    pub interface: Option<Interface>,

    /// Catalog region filter (overrides config file)
    #[arg(long, value_name = "REGION", env = "ROSTACK_REGION")]
    pub region: Option<String>,

    /// HTTP timeout in milliseconds (overrides config file)
    #[arg(long, value_name = "MS", env = "ROSTACK_TIMEOUT")]
    pub timeout: Option<u64>,

    /// Skip TLS certificate verification (overrides config file)
    #[arg(long, env = "ROSTACK_INSECURE")]
    pub insecure: Option<bool>,

    /// List servers across all tenants (overrides config file)
    #[arg(long, env = "ROSTACK_ALL_TENANTS")]
    pub all_tenants: Option<bool>,

    /// Validate configuration without starting server
    #[arg(long)]
    pub validate: bool,

    /// Log level
    #[arg(
        short,
        long,
        value_enum,
        default_value = "info",
        env = "ROSTACK_LOG_LEVEL"
    )]
    pub log_level: LogLevel,
}

impl Cli {
    /// Apply CLI overrides on top of a loaded configuration
    pub fn apply_overrides(&self, config: &mut Config) {
        if let Some(port) = self.port {
            config.server.port = port;
        }
        if let Some(ref bind_address) = self.bind_address {
            config.server.bind_address = bind_address.clone();
        }
        if let Some(ref metrics_path) = self.metrics_path {
            config.server.path = metrics_path.clone();
        }
        if let Some(ref identity_endpoint) = self.identity_endpoint {
            config.openstack.identity_endpoint = identity_endpoint.clone();
        }
        if let Some(ref username) = self.username {
            config.openstack.username = username.clone();
        }
        if let Some(ref password) = self.password {
            config.openstack.password = password.clone();
        }
        if let Some(ref domain) = self.domain {
            config.openstack.domain = domain.clone();
        }
        if let Some(ref project) = self.project {
            config.openstack.project = Some(project.clone());
        }
        if let Some(interface) = self.interface {
            config.openstack.interface = interface;
        }
        if let Some(ref region) = self.region {
            config.openstack.region = Some(region.clone());
        }
        if let Some(timeout) = self.timeout {
            config.openstack.timeout_ms = timeout;
        }
        if let Some(insecure) = self.insecure {
            config.openstack.insecure_skip_verify = insecure;
        }
        if let Some(all_tenants) = self.all_tenants {
            config.openstack.server_all_tenants = all_tenants;
        }
    }
}

/// Log level options
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    /// Trace level - most verbose
    Trace,
    /// Debug level
    Debug,
    /// Info level - default
    Info,
    /// Warn level
    Warn,
    /// Error level - least verbose
    Error,
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LogLevel::Trace => write!(f, "trace"),
            LogLevel::Debug => write!(f, "debug"),
            LogLevel::Info => write!(f, "info"),
            LogLevel::Warn => write!(f, "warn"),
            LogLevel::Error => write!(f, "error"),
        }
    }
}

impl From<LogLevel> for tracing::Level {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Trace => tracing::Level::TRACE,
            LogLevel::Debug => tracing::Level::DEBUG,
            LogLevel::Info => tracing::Level::INFO,
            LogLevel::Warn => tracing::Level::WARN,
            LogLevel::Error => tracing::Level::ERROR,
        }
    }
}
