//! Per-service pollers
//!
//! One poller per enabled control-plane service. Pollers share a
//! [`PollContext`] of lookup tables built once per cycle, so measurement
//! enrichment never triggers extra requests mid-emission. A poller failure is
//! recorded and isolated; the sibling pollers still run.

pub mod compute;
pub mod identity;

use std::collections::HashMap;

use async_trait::async_trait;
use tracing::warn;

use crate::client::OpenStackClient;
use crate::config::OpenStackConfig;
use crate::emitter::Accumulator;
use crate::error::{EmitError, PollError};

/// Lookup tables shared by the pollers of one cycle
///
/// A table is `None` when its source fetch failed or was disabled; dependent
/// enrichment then degrades instead of failing the cycle.
#[derive(Debug, Default)]
pub struct PollContext {
    /// Project id to project name
    pub projects: Option<HashMap<String, String>>,
    /// Flavor id to flavor record
    pub flavors: Option<HashMap<String, compute::Flavor>>,
}

/// Outcome of one poller run
#[derive(Debug, Default)]
pub struct PollStats {
    /// Measurements handed to the accumulator
    pub emitted: usize,
    /// Measurements the accumulator refused
    pub emit_errors: Vec<EmitError>,
}

impl PollStats {
    /// Record one emission attempt
    pub fn record(&mut self, result: Result<(), EmitError>) {
        match result {
            Ok(()) => self.emitted += 1,
            Err(e) => self.emit_errors.push(e),
        }
    }
}

/// A failed service fetch within an otherwise surviving cycle
#[derive(Debug)]
pub struct PollFailure {
    /// Service name from the configuration vocabulary
    pub service: String,
    /// What went wrong
    pub error: PollError,
}

/// One pollable control-plane service
#[async_trait]
pub trait Poller: Send + Sync {
    /// Service name as it appears in `enabled_services`
    fn name(&self) -> &'static str;

    /// Catalog service type this poller needs an endpoint for
    fn service_type(&self) -> &'static str;

    /// Fetch the service and emit its measurements
    async fn poll(
        &self,
        client: &OpenStackClient,
        base_url: &str,
        ctx: &PollContext,
        acc: &mut dyn Accumulator,
    ) -> Result<PollStats, PollError>;
}

/// The fixed poller table, in emission order
pub fn registry(config: &OpenStackConfig) -> Vec<Box<dyn Poller>> {
    vec![
        Box::new(identity::ProjectsPoller),
        Box::new(compute::HypervisorsPoller),
        Box::new(compute::ServersPoller {
            all_tenants: config.server_all_tenants,
        }),
    ]
}

/// Build the cycle's lookup tables
///
/// Projects are fetched when either the identity measurement or server
/// enrichment needs them; flavors only when enabled. Fetch failures land in
/// the returned failure list and leave the table absent.
pub async fn build_context(
    client: &OpenStackClient,
    config: &OpenStackConfig,
    identity_base: Option<&str>,
    compute_base: Option<&str>,
) -> (PollContext, Vec<PollFailure>) {
    let mut ctx = PollContext::default();
    let mut failures = Vec::new();

    let wants_projects =
        config.service_enabled("projects") || config.service_enabled("servers");
    if wants_projects {
        if let Some(base) = identity_base {
            match identity::list_projects(client, base).await {
                Ok(projects) => {
                    ctx.projects = Some(
                        projects
                            .into_iter()
                            .map(|p| (p.id, p.name))
                            .collect(),
                    );
                }
                Err(error) => {
                    warn!(service = "projects", error = %error, "Service fetch failed");
                    failures.push(PollFailure {
                        service: "projects".to_string(),
                        error,
                    });
                }
            }
        }
    }

    if config.service_enabled("flavors") {
        if let Some(base) = compute_base {
            match compute::list_flavors(client, base).await {
                Ok(flavors) => {
                    ctx.flavors =
                        Some(flavors.into_iter().map(|f| (f.id.clone(), f)).collect());
                }
                Err(error) => {
                    warn!(service = "flavors", error = %error, "Service fetch failed");
                    failures.push(PollFailure {
                        service: "flavors".to_string(),
                        error,
                    });
                }
            }
        }
    }

    (ctx, failures)
}
