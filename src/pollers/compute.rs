//! Compute service pollers
//!
//! Hypervisor capacity and per-server inventory, enriched through the flavor
//! and project lookup tables. Capacity counters the service omits stay absent
//! in the emitted measurements instead of being zero-filled.

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use crate::client::OpenStackClient;
use crate::emitter::{Accumulator, Measurement};
use crate::error::PollError;

use super::{PollContext, PollStats, Poller};

/// One hypervisor as reported by the compute service
#[derive(Debug, Clone, Deserialize)]
pub struct Hypervisor {
    /// Hostname, used as the measurement's name tag
    pub hypervisor_hostname: String,
    /// Total vCPU capacity
    #[serde(default)]
    pub vcpus: Option<i64>,
    /// vCPUs currently allocated
    #[serde(default)]
    pub vcpus_used: Option<i64>,
    /// Total memory in MiB
    #[serde(default)]
    pub memory_mb: Option<i64>,
    /// Memory currently allocated in MiB
    #[serde(default)]
    pub memory_mb_used: Option<i64>,
    /// Instances running on this hypervisor
    #[serde(default)]
    pub running_vms: Option<i64>,
}

/// One instance size definition
#[derive(Debug, Clone, Deserialize)]
pub struct Flavor {
    /// Flavor id, referenced by servers
    pub id: String,
    /// Flavor name
    #[serde(default)]
    pub name: String,
    /// vCPU count
    #[serde(default)]
    pub vcpus: Option<i64>,
    /// Memory in MiB
    #[serde(default)]
    pub ram: Option<i64>,
    /// Root disk in GiB
    #[serde(default)]
    pub disk: Option<i64>,
}

/// One server instance
#[derive(Debug, Clone, Deserialize)]
pub struct Server {
    /// Server id
    pub id: String,
    /// Server name, used as the measurement's name tag
    pub name: String,
    /// Lifecycle status as reported, e.g. "ACTIVE", "SHUTOFF"
    #[serde(default)]
    pub status: String,
    /// Owning project id
    #[serde(default)]
    pub tenant_id: String,
    /// Flavor reference
    #[serde(default)]
    pub flavor: ServerFlavor,
}

/// Flavor reference embedded in a server record
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ServerFlavor {
    /// Flavor id; newer API microversions may omit it
    #[serde(default)]
    pub id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct HypervisorList {
    #[serde(default)]
    hypervisors: Vec<Hypervisor>,
}

#[derive(Debug, Deserialize)]
struct FlavorList {
    #[serde(default)]
    flavors: Vec<Flavor>,
}

#[derive(Debug, Deserialize)]
struct ServerList {
    #[serde(default)]
    servers: Vec<Server>,
}

/// List hypervisors with capacity details
pub async fn list_hypervisors(
    client: &OpenStackClient,
    base: &str,
) -> Result<Vec<Hypervisor>, PollError> {
    let url = format!("{}/os-hypervisors/detail", base.trim_end_matches('/'));
    let list: HypervisorList = client.get_json(&url).await?;
    debug!(count = list.hypervisors.len(), "Listed hypervisors");
    Ok(list.hypervisors)
}

/// List flavor definitions with size details
pub async fn list_flavors(client: &OpenStackClient, base: &str) -> Result<Vec<Flavor>, PollError> {
    let url = format!("{}/flavors/detail", base.trim_end_matches('/'));
    let list: FlavorList = client.get_json(&url).await?;
    debug!(count = list.flavors.len(), "Listed flavors");
    Ok(list.flavors)
}

/// List server instances
pub async fn list_servers(
    client: &OpenStackClient,
    base: &str,
    all_tenants: bool,
) -> Result<Vec<Server>, PollError> {
    let mut url = format!("{}/servers/detail", base.trim_end_matches('/'));
    if all_tenants {
        url.push_str("?all_tenants=true");
    }
    let list: ServerList = client.get_json(&url).await?;
    debug!(count = list.servers.len(), all_tenants, "Listed servers");
    Ok(list.servers)
}

/// Flatten one hypervisor into its measurement
fn hypervisor_measurement(hypervisor: &Hypervisor) -> Measurement {
    Measurement::new("openstack_hypervisor")
        .with_tag("name", hypervisor.hypervisor_hostname.clone())
        .with_optional_field("vcpus", hypervisor.vcpus)
        .with_optional_field("vcpus_used", hypervisor.vcpus_used)
        .with_optional_field("memory_mb", hypervisor.memory_mb)
        .with_optional_field("memory_mb_used", hypervisor.memory_mb_used)
        .with_optional_field("running_vms", hypervisor.running_vms)
}

/// Flatten one server into its measurement
///
/// The project tag prefers the human-readable name from the lookup table and
/// falls back to the raw tenant id. Size fields come from the flavor table;
/// an unknown or missing flavor id leaves them absent.
pub fn server_measurement(server: &Server, ctx: &PollContext) -> Measurement {
    let project = ctx
        .projects
        .as_ref()
        .and_then(|table| table.get(&server.tenant_id))
        .cloned()
        .unwrap_or_else(|| server.tenant_id.clone());

    let flavor = server
        .flavor
        .id
        .as_ref()
        .and_then(|id| ctx.flavors.as_ref().and_then(|table| table.get(id)));

    Measurement::new("openstack_server")
        .with_tag("name", server.name.clone())
        .with_tag("project", project)
        .with_field("status", server.status.to_lowercase())
        .with_optional_field("vcpus", flavor.and_then(|f| f.vcpus))
        .with_optional_field("ram_mb", flavor.and_then(|f| f.ram))
        .with_optional_field("disk_gb", flavor.and_then(|f| f.disk))
}

/// Emits one measurement per hypervisor
pub struct HypervisorsPoller;

#[async_trait]
impl Poller for HypervisorsPoller {
    fn name(&self) -> &'static str {
        "hypervisors"
    }

    fn service_type(&self) -> &'static str {
        "compute"
    }

    async fn poll(
        &self,
        client: &OpenStackClient,
        base_url: &str,
        _ctx: &PollContext,
        acc: &mut dyn Accumulator,
    ) -> Result<PollStats, PollError> {
        let mut stats = PollStats::default();
        for hypervisor in list_hypervisors(client, base_url).await? {
            stats.record(acc.add(hypervisor_measurement(&hypervisor)));
        }
        Ok(stats)
    }
}

/// Emits one enriched measurement per server
pub struct ServersPoller {
    /// Ask the compute service for servers across all tenants
    pub all_tenants: bool,
}

#[async_trait]
impl Poller for ServersPoller {
    fn name(&self) -> &'static str {
        "servers"
    }

    fn service_type(&self) -> &'static str {
        "compute"
    }

    async fn poll(
        &self,
        client: &OpenStackClient,
        base_url: &str,
        ctx: &PollContext,
        acc: &mut dyn Accumulator,
    ) -> Result<PollStats, PollError> {
        let mut stats = PollStats::default();
        for server in list_servers(client, base_url, self.all_tenants).await? {
            stats.record(acc.add(server_measurement(&server, ctx)));
        }
        Ok(stats)
    }
}
