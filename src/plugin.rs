//! Poll cycle orchestration
//!
//! A cycle authenticates from scratch, resolves endpoints from the fresh
//! catalog, builds the lookup tables, then runs every enabled poller. Only
//! discovery and authentication abort the cycle; everything after degrades
//! per service.

use tracing::{debug, info, instrument, warn};

use crate::auth;
use crate::catalog;
use crate::client::OpenStackClient;
use crate::config::OpenStackConfig;
use crate::emitter::Accumulator;
use crate::error::{AuthError, EmitError};
use crate::pollers::{self, PollFailure};

/// Summary of one completed poll cycle
#[derive(Debug, Default)]
pub struct CycleOutcome {
    /// Measurements handed to the accumulator
    pub emitted: usize,
    /// Services that failed this cycle
    pub failures: Vec<PollFailure>,
    /// Measurements the accumulator refused
    pub emit_errors: Vec<EmitError>,
}

/// The OpenStack metrics plugin
pub struct OpenStackPlugin {
    config: OpenStackConfig,
}

impl OpenStackPlugin {
    /// Create a plugin from its configuration
    pub fn new(config: OpenStackConfig) -> Self {
        Self { config }
    }

    /// Run one full poll cycle into the accumulator
    ///
    /// Identical control-plane state yields identical measurements; the cycle
    /// holds no state of its own between runs.
    #[instrument(skip(self, acc))]
    pub async fn run_cycle(
        &self,
        acc: &mut dyn Accumulator,
    ) -> Result<CycleOutcome, AuthError> {
        let client = OpenStackClient::new(
            self.config.timeout_ms,
            self.config.insecure_skip_verify,
        )?;

        let versioned_base = auth::discover(&client, &self.config.identity_endpoint).await?;
        let token = auth::authenticate(&client, &versioned_base, &self.config).await?;
        let client = client.with_token(token.value);

        let region = self.config.region.as_deref();
        let identity_base = catalog::resolve(
            &token.catalog,
            "identity",
            self.config.interface,
            region,
        );
        let compute_base = catalog::resolve(
            &token.catalog,
            "compute",
            self.config.interface,
            region,
        );

        let mut outcome = CycleOutcome::default();

        let (ctx, context_failures) =
            pollers::build_context(&client, &self.config, identity_base.as_deref(), compute_base.as_deref())
                .await;
        outcome.failures.extend(context_failures);

        for poller in pollers::registry(&self.config) {
            if !self.config.service_enabled(poller.name()) {
                continue;
            }

            let base = match poller.service_type() {
                "identity" => identity_base.as_deref(),
                "compute" => compute_base.as_deref(),
                _ => None,
            };

            let Some(base) = base else {
                debug!(
                    service = poller.name(),
                    service_type = poller.service_type(),
                    "No catalog endpoint, skipping"
                );
                continue;
            };

            match poller.poll(&client, base, &ctx, acc).await {
                Ok(stats) => {
                    outcome.emitted += stats.emitted;
                    outcome.emit_errors.extend(stats.emit_errors);
                }
                Err(error) => {
                    warn!(service = poller.name(), error = %error, "Service poll failed");
                    outcome.failures.push(PollFailure {
                        service: poller.name().to_string(),
                        error,
                    });
                }
            }
        }

        info!(
            emitted = outcome.emitted,
            failed_services = outcome.failures.len(),
            "Poll cycle complete"
        );

        Ok(outcome)
    }
}
