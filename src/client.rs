//! OpenStack HTTP client
//!
//! Thin wrapper around `reqwest` with connection pooling, a bounded
//! per-request timeout, an optional TLS-verification bypass, and the
//! `X-Auth-Token` header for authenticated calls. Requests are single-shot;
//! retrying is left to the next poll cycle.

use reqwest::{Client, ClientBuilder};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, instrument};

use crate::error::{AuthError, PollError};

/// Authenticated OpenStack HTTP client
#[derive(Clone)]
pub struct OpenStackClient {
    client: Client,
    token: Option<String>,
}

impl OpenStackClient {
    /// Create a new client
    ///
    /// # Arguments
    /// * `timeout_ms` - per-request timeout in milliseconds
    /// * `insecure_skip_verify` - disable TLS certificate verification
    pub fn new(timeout_ms: u64, insecure_skip_verify: bool) -> Result<Self, AuthError> {
        let client = ClientBuilder::new()
            .timeout(Duration::from_millis(timeout_ms))
            .pool_max_idle_per_host(10)
            .pool_idle_timeout(Duration::from_secs(30))
            .danger_accept_invalid_certs(insecure_skip_verify)
            .build()
            .map_err(AuthError::HttpClientInit)?;

        Ok(Self {
            client,
            token: None,
        })
    }

    /// Attach the bearer token for this poll cycle
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Whether a token is attached
    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    /// The underlying reqwest client, for the authenticator's raw requests
    pub(crate) fn http(&self) -> &Client {
        &self.client
    }

    /// Authenticated GET returning a decoded JSON body
    #[instrument(skip(self), fields(url = %url))]
    pub async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, PollError> {
        debug!("Sending GET request");

        let mut req = self.client.get(url);
        if let Some(token) = &self.token {
            req = req.header("X-Auth-Token", token);
        }

        let response = req.send().await.map_err(PollError::from)?;

        let status = response.status();
        if !status.is_success() {
            return Err(PollError::HttpStatus(status.as_u16()));
        }

        let body = response.text().await.map_err(PollError::from)?;

        serde_json::from_str(&body).map_err(|e| PollError::Decode(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_new() {
        let client = OpenStackClient::new(5000, false);
        assert!(client.is_ok());
    }

    #[test]
    fn test_client_with_token() {
        let client = OpenStackClient::new(5000, false)
            .unwrap()
            .with_token("gAAAAABg");
        assert!(client.is_authenticated());
    }

    #[test]
    fn test_client_insecure() {
        let client = OpenStackClient::new(5000, true);
        assert!(client.is_ok());
    }
}
