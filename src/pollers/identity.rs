//! Identity service poller
//!
//! Lists projects and condenses them into the `openstack_identity`
//! measurement. The project table also feeds server enrichment.

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use crate::client::OpenStackClient;
use crate::emitter::{Accumulator, Measurement};
use crate::error::PollError;

use super::{PollContext, PollStats, Poller};

/// One project as listed by the identity service
#[derive(Debug, Clone, Deserialize)]
pub struct Project {
    /// Project id, referenced by servers as tenant_id
    pub id: String,
    /// Human-readable project name
    pub name: String,
    /// Whether the project is enabled
    #[serde(default)]
    pub enabled: bool,
    /// Owning domain
    #[serde(default)]
    pub domain_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ProjectList {
    #[serde(default)]
    projects: Vec<Project>,
}

/// One service registration as listed by the identity service
///
/// The catalog embedded in the token normally covers endpoint resolution;
/// this explicit listing exists as a diagnostic fallback.
#[derive(Debug, Clone, Deserialize)]
pub struct Service {
    /// Service id
    pub id: String,
    /// Service type, e.g. "identity", "compute"
    #[serde(rename = "type")]
    pub service_type: String,
    /// Service name
    #[serde(default)]
    pub name: String,
    /// Whether the service is enabled
    #[serde(default)]
    pub enabled: bool,
}

#[derive(Debug, Deserialize)]
struct ServiceList {
    #[serde(default)]
    services: Vec<Service>,
}

/// Append the v3 path segment unless the base already carries it
///
/// Catalogs advertise the identity endpoint both versioned and unversioned in
/// the wild.
fn versioned(base: &str) -> String {
    let trimmed = base.trim_end_matches('/');
    if trimmed.ends_with("/v3") {
        trimmed.to_string()
    } else {
        format!("{trimmed}/v3")
    }
}

/// List all projects visible to the token
pub async fn list_projects(
    client: &OpenStackClient,
    base: &str,
) -> Result<Vec<Project>, PollError> {
    let url = format!("{}/projects", versioned(base));
    let list: ProjectList = client.get_json(&url).await?;
    debug!(count = list.projects.len(), "Listed projects");
    Ok(list.projects)
}

/// List the registered services directly, bypassing the token catalog
pub async fn list_services(
    client: &OpenStackClient,
    base: &str,
) -> Result<Vec<Service>, PollError> {
    let url = format!("{}/services", versioned(base));
    let list: ServiceList = client.get_json(&url).await?;
    debug!(count = list.services.len(), "Listed services");
    Ok(list.services)
}

/// Emits the identity summary measurement
///
/// Works entirely from the context table; the project fetch already happened
/// during context construction.
pub struct ProjectsPoller;

#[async_trait]
impl Poller for ProjectsPoller {
    fn name(&self) -> &'static str {
        "projects"
    }

    fn service_type(&self) -> &'static str {
        "identity"
    }

    async fn poll(
        &self,
        _client: &OpenStackClient,
        _base_url: &str,
        ctx: &PollContext,
        acc: &mut dyn Accumulator,
    ) -> Result<PollStats, PollError> {
        let mut stats = PollStats::default();

        if let Some(projects) = &ctx.projects {
            let measurement = Measurement::new("openstack_identity")
                .with_field("projects", projects.len() as i64);
            stats.record(acc.add(measurement));
        }

        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::emitter::{FieldValue, MeasurementBuffer};

    #[test]
    fn test_versioned_base() {
        assert_eq!(versioned("http://id.example"), "http://id.example/v3");
        assert_eq!(versioned("http://id.example/v3"), "http://id.example/v3");
        assert_eq!(versioned("http://id.example/v3/"), "http://id.example/v3");
    }

    #[test]
    fn test_project_list_decoding() {
        let json = r#"{
            "projects": [
                {"id": "0a65", "name": "admin", "enabled": true, "domain_id": "default"},
                {"id": "f9c1", "name": "demo", "enabled": true, "domain_id": "default"}
            ],
            "links": {"self": "http://id.example/v3/projects", "previous": null, "next": null}
        }"#;
        let list: ProjectList = serde_json::from_str(json).expect("project list should decode");
        assert_eq!(list.projects.len(), 2);
        assert_eq!(list.projects[0].name, "admin");
    }

    #[test]
    fn test_service_list_decoding() {
        let json = r#"{
            "services": [
                {"id": "ad3iu6", "type": "compute", "name": "nova", "enabled": true},
                {"id": "0be6e3", "type": "identity", "name": "keystone", "enabled": true}
            ]
        }"#;
        let list: ServiceList = serde_json::from_str(json).expect("service list should decode");
        assert_eq!(list.services.len(), 2);
        assert_eq!(list.services[0].service_type, "compute");
    }

    #[tokio::test]
    async fn test_identity_measurement_from_context() {
        let mut ctx = PollContext::default();
        ctx.projects = Some(
            [("a".to_string(), "admin".to_string()), ("b".to_string(), "demo".to_string())]
                .into_iter()
                .collect(),
        );

        let client = OpenStackClient::new(1000, false).unwrap();
        let mut buffer = MeasurementBuffer::new();
        let stats = ProjectsPoller
            .poll(&client, "http://unused", &ctx, &mut buffer)
            .await
            .unwrap();

        assert_eq!(stats.emitted, 1);
        let m = &buffer.measurements()[0];
        assert_eq!(m.name, "openstack_identity");
        assert!(m.tags.is_empty());
        assert_eq!(m.fields.get("projects"), Some(&FieldValue::Integer(2)));
    }

    #[tokio::test]
    async fn test_no_measurement_without_project_table() {
        let ctx = PollContext::default();
        let client = OpenStackClient::new(1000, false).unwrap();
        let mut buffer = MeasurementBuffer::new();
        let stats = ProjectsPoller
            .poll(&client, "http://unused", &ctx, &mut buffer)
            .await
            .unwrap();

        assert_eq!(stats.emitted, 0);
        assert!(buffer.is_empty());
    }
}
