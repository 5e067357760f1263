//! Service catalog types and endpoint resolution
//!
//! The identity service embeds a catalog of sub-services in every token
//! response. This module maps a logical service type ("compute", "identity")
//! to a concrete base URL, honoring the configured interface preference and
//! an optional region filter.

use serde::{Deserialize, Serialize};

/// Catalog endpoint interface kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Interface {
    /// Publicly reachable endpoint (default)
    #[default]
    Public,
    /// Endpoint on the internal management network
    Internal,
    /// Administrative endpoint
    Admin,
    /// Interface kind this exporter does not know about; never selected
    #[serde(other)]
    #[value(skip)]
    Unknown,
}

impl std::fmt::Display for Interface {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Interface::Public => write!(f, "public"),
            Interface::Internal => write!(f, "internal"),
            Interface::Admin => write!(f, "admin"),
            Interface::Unknown => write!(f, "unknown"),
        }
    }
}

/// One service advertised in the catalog
#[derive(Debug, Clone, Deserialize)]
pub struct CatalogEntry {
    /// Service type, e.g. "identity", "compute", "volumev3"
    #[serde(rename = "type")]
    pub service_type: String,
    /// Service name, e.g. "keystone", "nova"
    #[serde(default)]
    pub name: String,
    /// Endpoints in catalog order
    #[serde(default)]
    pub endpoints: Vec<Endpoint>,
}

/// One network endpoint of a catalog entry
#[derive(Debug, Clone, Deserialize)]
pub struct Endpoint {
    /// Interface kind
    pub interface: Interface,
    /// Region identifier
    #[serde(default)]
    pub region: Option<String>,
    /// Base URL
    pub url: String,
}

/// Resolve a service type to a base URL
///
/// Candidate interfaces are tried starting from `preferred` and falling back
/// through public, internal, admin. Within an interface, the first endpoint in
/// catalog scan order that passes the region filter wins; the pick is
/// deterministic, not a load-balance decision. Absence of a match is not an
/// error; the caller skips the dependent poller.
pub fn resolve(
    catalog: &[CatalogEntry],
    service_type: &str,
    preferred: Interface,
    region: Option<&str>,
) -> Option<String> {
    for interface in candidate_interfaces(preferred) {
        for entry in catalog.iter().filter(|e| e.service_type == service_type) {
            for endpoint in &entry.endpoints {
                if endpoint.interface != interface {
                    continue;
                }
                if let Some(wanted) = region {
                    if endpoint.region.as_deref() != Some(wanted) {
                        continue;
                    }
                }
                return Some(endpoint.url.trim_end_matches('/').to_string());
            }
        }
    }
    None
}

/// Preference order starting at the configured interface
fn candidate_interfaces(preferred: Interface) -> Vec<Interface> {
    let mut order = vec![preferred];
    for fallback in [Interface::Public, Interface::Internal, Interface::Admin] {
        if fallback != preferred {
            order.push(fallback);
        }
    }
    order
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(service_type: &str, endpoints: Vec<Endpoint>) -> CatalogEntry {
        CatalogEntry {
            service_type: service_type.to_string(),
            name: String::new(),
            endpoints,
        }
    }

    fn endpoint(interface: Interface, region: &str, url: &str) -> Endpoint {
        Endpoint {
            interface,
            region: Some(region.to_string()),
            url: url.to_string(),
        }
    }

    fn sample_catalog() -> Vec<CatalogEntry> {
        vec![
            entry(
                "identity",
                vec![
                    endpoint(Interface::Internal, "RegionOne", "http://keystone.int"),
                    endpoint(Interface::Public, "RegionOne", "http://keystone.pub/"),
                ],
            ),
            entry(
                "compute",
                vec![
                    endpoint(Interface::Admin, "RegionOne", "http://nova.adm/v2.1/t"),
                    endpoint(Interface::Public, "RegionOne", "http://nova.pub/v2.1/t"),
                    endpoint(Interface::Public, "RegionTwo", "http://nova2.pub/v2.1/t"),
                ],
            ),
        ]
    }

    #[test]
    fn test_resolve_preferred_interface() {
        let catalog = sample_catalog();
        assert_eq!(
            resolve(&catalog, "compute", Interface::Public, None).as_deref(),
            Some("http://nova.pub/v2.1/t")
        );
        assert_eq!(
            resolve(&catalog, "compute", Interface::Admin, None).as_deref(),
            Some("http://nova.adm/v2.1/t")
        );
    }

    #[test]
    fn test_resolve_trims_trailing_slash() {
        let catalog = sample_catalog();
        assert_eq!(
            resolve(&catalog, "identity", Interface::Public, None).as_deref(),
            Some("http://keystone.pub")
        );
    }

    #[test]
    fn test_resolve_falls_back_through_interfaces() {
        // Identity has no admin endpoint; preference falls back to public.
        let catalog = sample_catalog();
        assert_eq!(
            resolve(&catalog, "identity", Interface::Admin, None).as_deref(),
            Some("http://keystone.pub")
        );
    }

    #[test]
    fn test_resolve_region_filter() {
        let catalog = sample_catalog();
        assert_eq!(
            resolve(&catalog, "compute", Interface::Public, Some("RegionTwo")).as_deref(),
            Some("http://nova2.pub/v2.1/t")
        );
        assert_eq!(
            resolve(&catalog, "compute", Interface::Public, Some("RegionNine")),
            None
        );
    }

    #[test]
    fn test_resolve_missing_service_is_none() {
        let catalog = sample_catalog();
        assert_eq!(resolve(&catalog, "volumev3", Interface::Public, None), None);
    }

    #[test]
    fn test_resolve_scan_order_first() {
        let catalog = vec![entry(
            "compute",
            vec![
                endpoint(Interface::Public, "RegionOne", "http://first"),
                endpoint(Interface::Public, "RegionOne", "http://second"),
            ],
        )];
        assert_eq!(
            resolve(&catalog, "compute", Interface::Public, None).as_deref(),
            Some("http://first")
        );
    }

    #[test]
    fn test_unknown_interface_decodes_and_is_never_selected() {
        let json = r#"{
            "type": "compute",
            "name": "nova",
            "endpoints": [
                {"interface": "wormhole", "region": "RegionOne", "url": "http://odd"},
                {"interface": "public", "region": "RegionOne", "url": "http://nova.pub"}
            ]
        }"#;
        let entry: CatalogEntry = serde_json::from_str(json).expect("entry should decode");
        assert_eq!(entry.endpoints[0].interface, Interface::Unknown);
        assert_eq!(
            resolve(&[entry], "compute", Interface::Public, None).as_deref(),
            Some("http://nova.pub")
        );
    }
}
