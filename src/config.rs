//! Configuration management for rostack-exporter
//!
//! Handles loading and validating configuration from YAML files.

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

use crate::catalog::Interface;

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Error reading the configuration file
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    /// Error parsing the configuration file
    #[error("Failed to parse config file: {0}")]
    ParseError(#[from] serde_yaml::Error),

    /// Configuration validation error
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// Service names recognized in `enabled_services`
pub const KNOWN_SERVICES: &[&str] = &["projects", "hypervisors", "flavors", "servers"];

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// OpenStack control-plane configuration
    #[serde(default)]
    pub openstack: OpenStackConfig,

    /// HTTP server configuration
    #[serde(default)]
    pub server: ServerConfig,
}

/// OpenStack control-plane configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenStackConfig {
    /// Identity (Keystone) endpoint URL
    #[serde(default = "default_identity_endpoint")]
    pub identity_endpoint: String,

    /// Identity username
    #[serde(default)]
    pub username: String,

    /// Identity password
    #[serde(default)]
    pub password: String,

    /// Identity domain name
    #[serde(default = "default_domain")]
    pub domain: String,

    /// Optional project name for scoped authentication
    pub project: Option<String>,

    /// Services to poll each cycle (default: all known)
    #[serde(default = "default_enabled_services")]
    pub enabled_services: Vec<String>,

    /// Preferred catalog endpoint interface
    #[serde(default)]
    pub interface: Interface,

    /// Optional region filter for catalog endpoints
    pub region: Option<String>,

    /// Per-request timeout in milliseconds
    #[serde(default = "default_timeout")]
    pub timeout_ms: u64,

    /// Skip TLS certificate verification
    #[serde(default)]
    pub insecure_skip_verify: bool,

    /// Request servers across all tenants
    #[serde(default)]
    pub server_all_tenants: bool,
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Metrics endpoint path
    #[serde(default = "default_metrics_path")]
    pub path: String,

    /// Server bind address
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
}

// Default value functions
fn default_identity_endpoint() -> String {
    "http://localhost:5000".to_string()
}

fn default_domain() -> String {
    "default".to_string()
}

fn default_enabled_services() -> Vec<String> {
    KNOWN_SERVICES.iter().map(|s| s.to_string()).collect()
}

fn default_timeout() -> u64 {
    5000
}

fn default_port() -> u16 {
    9180
}

fn default_metrics_path() -> String {
    "/metrics".to_string()
}

fn default_bind_address() -> String {
    "0.0.0.0".to_string()
}

impl Default for OpenStackConfig {
    fn default() -> Self {
        Self {
            identity_endpoint: default_identity_endpoint(),
            username: String::new(),
            password: String::new(),
            domain: default_domain(),
            project: None,
            enabled_services: default_enabled_services(),
            interface: Interface::default(),
            region: None,
            timeout_ms: default_timeout(),
            insecure_skip_verify: false,
            server_all_tenants: false,
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            path: default_metrics_path(),
            bind_address: default_bind_address(),
        }
    }
}

impl OpenStackConfig {
    /// Check whether a service is enabled for this cycle
    pub fn service_enabled(&self, name: &str) -> bool {
        self.enabled_services.iter().any(|s| s == name)
    }
}

impl Config {
    /// Load configuration from a YAML file
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed.
    ///
    /// # Note
    /// Validation is deferred until CLI overrides have been merged in; call
    /// [`Config::validate`] on the final configuration.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)?;
        let config: Config = serde_yaml::from_str(&contents)?;
        Ok(config)
    }

    /// Load configuration from a YAML file, falling back to defaults if not found
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();

        if !path.exists() {
            tracing::warn!(
                path = %path.display(),
                "Config file not found, using defaults"
            );
            return Ok(Self::default());
        }

        Self::load(path)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if url::Url::parse(&self.openstack.identity_endpoint).is_err() {
            return Err(ConfigError::ValidationError(format!(
                "Invalid identity endpoint URL '{}'",
                self.openstack.identity_endpoint
            )));
        }

        if self.openstack.username.is_empty() {
            return Err(ConfigError::ValidationError(
                "Identity username must not be empty".to_string(),
            ));
        }

        if self.openstack.password.is_empty() {
            return Err(ConfigError::ValidationError(
                "Identity password must not be empty".to_string(),
            ));
        }

        for service in &self.openstack.enabled_services {
            if !KNOWN_SERVICES.contains(&service.as_str()) {
                return Err(ConfigError::ValidationError(format!(
                    "Unknown service '{}' in enabled_services (known: {})",
                    service,
                    KNOWN_SERVICES.join(", ")
                )));
            }
        }

        if self.openstack.timeout_ms == 0 {
            return Err(ConfigError::ValidationError(
                "Request timeout must be greater than 0".to_string(),
            ));
        }

        if self.server.port == 0 {
            return Err(ConfigError::ValidationError(
                "Server port must be greater than 0".to_string(),
            ));
        }

        if !self.server.path.starts_with('/') {
            return Err(ConfigError::ValidationError(
                "Metrics path must start with '/'".to_string(),
            ));
        }

        if self.server.path == "/" || self.server.path == "/health" {
            return Err(ConfigError::ValidationError(format!(
                "Metrics path '{}' conflicts with a built-in endpoint",
                self.server.path
            )));
        }

        Ok(())
    }
}
