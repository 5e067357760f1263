//! Identity version discovery and token issuance
//!
//! Each poll cycle starts here: probe the identity endpoint for its newest
//! stable v3 API, then trade the configured credentials for a token and the
//! embedded service catalog. Nothing is cached between cycles, so credential
//! rotation and catalog changes take effect on the next scrape.

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::catalog::CatalogEntry;
use crate::client::OpenStackClient;
use crate::config::OpenStackConfig;
use crate::error::AuthError;

/// An issued identity token and the catalog it carries
#[derive(Debug, Clone)]
pub struct Token {
    /// Opaque token value, sent as X-Auth-Token on every polled request
    pub value: String,
    /// Token expiry timestamp as reported by the identity service
    pub expires_at: Option<String>,
    /// Service catalog embedded in the token response
    pub catalog: Vec<CatalogEntry>,
}

#[derive(Debug, Deserialize)]
struct VersionDocument {
    versions: VersionList,
}

#[derive(Debug, Deserialize)]
struct VersionList {
    #[serde(default)]
    values: Vec<VersionEntry>,
}

#[derive(Debug, Deserialize)]
struct VersionEntry {
    id: String,
    status: String,
    #[serde(default)]
    links: Vec<VersionLink>,
}

#[derive(Debug, Deserialize)]
struct VersionLink {
    rel: String,
    href: String,
}

#[derive(Debug, Deserialize)]
struct TokenDocument {
    token: TokenBody,
}

#[derive(Debug, Deserialize)]
struct TokenBody {
    #[serde(default)]
    expires_at: Option<String>,
    #[serde(default)]
    catalog: Vec<CatalogEntry>,
}

#[derive(Debug, Serialize)]
struct AuthRequest<'a> {
    auth: AuthBlock<'a>,
}

#[derive(Debug, Serialize)]
struct AuthBlock<'a> {
    identity: IdentityBlock<'a>,
    #[serde(skip_serializing_if = "Option::is_none")]
    scope: Option<ScopeBlock<'a>>,
}

#[derive(Debug, Serialize)]
struct IdentityBlock<'a> {
    methods: [&'a str; 1],
    password: PasswordBlock<'a>,
}

#[derive(Debug, Serialize)]
struct PasswordBlock<'a> {
    user: UserBlock<'a>,
}

#[derive(Debug, Serialize)]
struct UserBlock<'a> {
    name: &'a str,
    domain: DomainBlock<'a>,
    password: &'a str,
}

#[derive(Debug, Serialize)]
struct DomainBlock<'a> {
    name: &'a str,
}

#[derive(Debug, Serialize)]
struct ScopeBlock<'a> {
    project: ScopeProject<'a>,
}

#[derive(Debug, Serialize)]
struct ScopeProject<'a> {
    name: &'a str,
    domain: DomainBlock<'a>,
}

impl<'a> AuthRequest<'a> {
    fn new(config: &'a OpenStackConfig) -> Self {
        Self {
            auth: AuthBlock {
                identity: IdentityBlock {
                    methods: ["password"],
                    password: PasswordBlock {
                        user: UserBlock {
                            name: &config.username,
                            domain: DomainBlock {
                                name: &config.domain,
                            },
                            password: &config.password,
                        },
                    },
                },
                scope: config.project.as_deref().map(|project| ScopeBlock {
                    project: ScopeProject {
                        name: project,
                        domain: DomainBlock {
                            name: &config.domain,
                        },
                    },
                }),
            },
        }
    }
}

/// Discover the newest stable v3 API base URL at the identity endpoint
///
/// The unversioned endpoint answers with a multiple-choices document listing
/// the API versions it serves. Only v3 versions whose status is stable or
/// current qualify; the newest one wins and its self link becomes the
/// versioned base for authentication and identity polling.
#[instrument(skip(client))]
pub async fn discover(client: &OpenStackClient, endpoint: &str) -> Result<String, AuthError> {
    let url = endpoint.trim_end_matches('/');

    let response = client
        .http()
        .get(url)
        .send()
        .await
        .map_err(AuthError::HttpRequest)?;

    let body = response.text().await.map_err(AuthError::HttpRequest)?;

    let document: VersionDocument = serde_json::from_str(&body)
        .map_err(|e| AuthError::Discovery(format!("malformed version document: {e}")))?;

    let base = document
        .versions
        .values
        .iter()
        .filter(|v| {
            let status = v.status.to_ascii_lowercase();
            status == "stable" || status == "current"
        })
        .filter_map(|v| parse_version(&v.id).map(|parsed| (parsed, v)))
        .filter(|((major, _), _)| *major == 3)
        .max_by_key(|(parsed, _)| *parsed)
        .and_then(|(_, v)| {
            v.links
                .iter()
                .find(|l| l.rel == "self")
                .map(|l| l.href.trim_end_matches('/').to_string())
        })
        .ok_or_else(|| {
            AuthError::Discovery(format!("no stable v3 identity API advertised at {url}"))
        })?;

    debug!(base = %base, "Discovered identity API base");

    Ok(base)
}

/// Parse a version id like "v3.14" into (major, minor)
fn parse_version(id: &str) -> Option<(u32, u32)> {
    let trimmed = id.strip_prefix('v').unwrap_or(id);
    match trimmed.split_once('.') {
        Some((major, minor)) => Some((major.parse().ok()?, minor.parse().ok()?)),
        None => Some((trimmed.parse().ok()?, 0)),
    }
}

/// Trade credentials for a token and the service catalog
///
/// `base` is the versioned identity URL from [`discover`]. A 2xx answer must
/// carry the token in the X-Subject-Token header; the body supplies expiry,
/// scope, and the catalog.
#[instrument(skip(client, config), fields(username = %config.username))]
pub async fn authenticate(
    client: &OpenStackClient,
    base: &str,
    config: &OpenStackConfig,
) -> Result<Token, AuthError> {
    let url = format!("{}/auth/tokens", base.trim_end_matches('/'));
    let request = AuthRequest::new(config);

    let response = client
        .http()
        .post(&url)
        .json(&request)
        .send()
        .await
        .map_err(AuthError::HttpRequest)?;

    let status = response.status();
    if !status.is_success() {
        return Err(AuthError::Rejected(status.as_u16()));
    }

    let value = response
        .headers()
        .get("X-Subject-Token")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
        .ok_or(AuthError::MissingToken)?;

    let body = response.text().await.map_err(AuthError::HttpRequest)?;

    let document: TokenDocument = serde_json::from_str(&body)
        .map_err(|e| AuthError::Decode(format!("malformed token response: {e}")))?;

    debug!(
        catalog_entries = document.token.catalog.len(),
        "Token issued"
    );

    Ok(Token {
        value,
        expires_at: document.token.expires_at,
        catalog: document.token.catalog,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_version() {
        assert_eq!(parse_version("v3.14"), Some((3, 14)));
        assert_eq!(parse_version("v3"), Some((3, 0)));
        assert_eq!(parse_version("2.0"), Some((2, 0)));
        assert_eq!(parse_version("banana"), None);
    }

    #[test]
    fn test_unscoped_request_body() {
        let config = OpenStackConfig {
            username: "monitor".to_string(),
            password: "hunter2".to_string(),
            domain: "default".to_string(),
            ..OpenStackConfig::default()
        };

        let body = serde_json::to_string(&AuthRequest::new(&config)).unwrap();
        assert_eq!(
            body,
            r#"{"auth":{"identity":{"methods":["password"],"password":{"user":{"name":"monitor","domain":{"name":"default"},"password":"hunter2"}}}}}"#
        );
    }

    #[test]
    fn test_scoped_request_body() {
        let config = OpenStackConfig {
            username: "monitor".to_string(),
            password: "hunter2".to_string(),
            domain: "default".to_string(),
            project: Some("admin".to_string()),
            ..OpenStackConfig::default()
        };

        let body = serde_json::to_string(&AuthRequest::new(&config)).unwrap();
        assert_eq!(
            body,
            r#"{"auth":{"identity":{"methods":["password"],"password":{"user":{"name":"monitor","domain":{"name":"default"},"password":"hunter2"}}},"scope":{"project":{"name":"admin","domain":{"name":"default"}}}}}"#
        );
    }

    #[test]
    fn test_token_document_decoding() {
        // Scoped responses carry extra blocks (project, roles); only expiry
        // and the catalog are consumed.
        let json = r#"{
            "token": {
                "expires_at": "2021-03-26T04:25:39.000000Z",
                "methods": ["password"],
                "project": {"id": "0a6578bd69454ba1a497daa853a77483", "name": "admin"},
                "roles": [{"id": "51b2", "name": "admin"}],
                "catalog": [
                    {"type": "identity", "name": "keystone",
                     "endpoints": [{"interface": "public", "region": "RegionOne",
                                    "url": "http://id.example"}]}
                ]
            }
        }"#;
        let document: TokenDocument = serde_json::from_str(json).expect("token should decode");
        assert_eq!(
            document.token.expires_at.as_deref(),
            Some("2021-03-26T04:25:39.000000Z")
        );
        assert_eq!(document.token.catalog.len(), 1);
        assert_eq!(document.token.catalog[0].service_type, "identity");
    }

    #[test]
    fn test_version_document_selection() {
        let json = r#"{
            "versions": {
                "values": [
                    {"id": "v2.0", "status": "deprecated",
                     "links": [{"rel": "self", "href": "http://id.example/v2.0/"}]},
                    {"id": "v3.14", "status": "stable",
                     "links": [{"rel": "self", "href": "http://id.example/v3/"}]}
                ]
            }
        }"#;
        let document: VersionDocument = serde_json::from_str(json).unwrap();
        let stable: Vec<_> = document
            .versions
            .values
            .iter()
            .filter(|v| v.status == "stable")
            .collect();
        assert_eq!(stable.len(), 1);
        assert_eq!(stable[0].links[0].href, "http://id.example/v3/");
    }
}
