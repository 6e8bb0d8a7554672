// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Keystone authentication and service catalog handling.
//!
//! Credentials come from a standard `clouds.yaml` file; the path is taken
//! from `OS_CLIENT_CONFIG_FILE` and the cloud entry from `OS_CLOUD`. A
//! session is one issued token plus the endpoint map extracted from the
//! catalog; the client keeps at most one session and re-authenticates when
//! it expires.

use super::error::{check_response, OpenStackError};
use serde::Deserialize;
use serde_json::json;
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{debug, info};
use url::Url;

/// Parsed `clouds.yaml` document.
#[derive(Clone, Debug, Deserialize)]
pub struct CloudsFile {
    pub clouds: BTreeMap<String, CloudConfig>,
}

/// One cloud entry from `clouds.yaml`.
#[derive(Clone, Debug, Deserialize)]
pub struct CloudConfig {
    pub auth: AuthConfig,
    #[serde(default)]
    pub region_name: Option<String>,
    /// Endpoint interface to select from the catalog; defaults to `public`
    #[serde(default)]
    pub interface: Option<String>,
}

/// The `auth` block of a cloud entry.
#[derive(Clone, Debug, Deserialize)]
pub struct AuthConfig {
    pub auth_url: String,
    pub username: String,
    pub password: String,
    #[serde(default)]
    pub user_domain_name: Option<String>,
    #[serde(default)]
    pub project_name: Option<String>,
    #[serde(default)]
    pub project_domain_name: Option<String>,
}

/// Load one cloud's configuration from a `clouds.yaml` file.
///
/// # Errors
///
/// Returns [`OpenStackError::Config`] when the file is unreadable, does not
/// parse, or lacks the requested cloud.
pub fn load_cloud_config(path: &Path, cloud: &str) -> Result<CloudConfig, OpenStackError> {
    let raw = std::fs::read_to_string(path).map_err(|e| {
        OpenStackError::Config(format!("cannot read clouds config {}: {e}", path.display()))
    })?;
    let file: CloudsFile = serde_yaml::from_str(&raw)
        .map_err(|e| OpenStackError::Config(format!("invalid clouds config: {e}")))?;

    file.clouds
        .get(cloud)
        .cloned()
        .ok_or_else(|| OpenStackError::Config(format!("cloud '{cloud}' not found in clouds config")))
}

/// One authenticated session: a token and the endpoints resolved from the
/// service catalog.
#[derive(Clone, Debug)]
pub struct Session {
    pub token: String,
    endpoints: BTreeMap<String, String>,
}

impl Session {
    /// Base URL for a catalog service type (`identity`, `compute`, `image`,
    /// `network`, `volumev3`).
    ///
    /// # Errors
    ///
    /// Returns [`OpenStackError::Config`] when the catalog has no endpoint
    /// for the service.
    pub fn endpoint(&self, service_type: &str) -> Result<&str, OpenStackError> {
        self.endpoints
            .get(service_type)
            .map(String::as_str)
            .ok_or_else(|| {
                OpenStackError::Config(format!("no '{service_type}' endpoint in service catalog"))
            })
    }
}

#[derive(Deserialize)]
struct TokenResponse {
    token: TokenBody,
}

#[derive(Deserialize)]
struct TokenBody {
    #[serde(default)]
    catalog: Vec<CatalogEntry>,
}

#[derive(Deserialize)]
struct CatalogEntry {
    #[serde(rename = "type")]
    service_type: String,
    #[serde(default)]
    endpoints: Vec<CatalogEndpoint>,
}

#[derive(Deserialize)]
struct CatalogEndpoint {
    interface: String,
    url: String,
    #[serde(default)]
    region: Option<String>,
}

/// Keystone answers with or without a version suffix depending on deployment.
fn normalize_identity_url(raw: &str) -> Result<String, OpenStackError> {
    let url = Url::parse(raw)
        .map_err(|e| OpenStackError::Config(format!("invalid identity endpoint '{raw}': {e}")))?;
    let trimmed = url.as_str().trim_end_matches('/').to_string();
    if trimmed.ends_with("/v3") {
        Ok(trimmed)
    } else {
        Ok(format!("{trimmed}/v3"))
    }
}

/// Authenticate against Keystone v3 and resolve the service catalog.
///
/// Scope: project-scoped when `project_name` is set, otherwise unscoped.
///
/// # Errors
///
/// Returns an error when the token request fails or the catalog lacks the
/// requested interface.
pub async fn authenticate(
    http: &reqwest::Client,
    config: &CloudConfig,
) -> Result<Session, OpenStackError> {
    let auth = &config.auth;
    let user_domain = auth.user_domain_name.as_deref().unwrap_or("Default");

    let mut body = json!({
        "auth": {
            "identity": {
                "methods": ["password"],
                "password": {
                    "user": {
                        "name": auth.username,
                        "domain": {"name": user_domain},
                        "password": auth.password,
                    }
                }
            }
        }
    });

    if let Some(project) = &auth.project_name {
        let project_domain = auth.project_domain_name.as_deref().unwrap_or(user_domain);
        body["auth"]["scope"] = json!({
            "project": {"name": project, "domain": {"name": project_domain}}
        });
    }

    let identity_url = normalize_identity_url(&auth.auth_url)?;
    debug!(url = %identity_url, user = %auth.username, "Requesting Keystone token");

    let resp = http
        .post(format!("{identity_url}/auth/tokens"))
        .json(&body)
        .send()
        .await?;
    let resp = check_response(resp).await?;

    let token = resp
        .headers()
        .get("X-Subject-Token")
        .and_then(|v| v.to_str().ok())
        .map(ToString::to_string)
        .ok_or_else(|| OpenStackError::Decode("token response without X-Subject-Token".into()))?;

    let parsed: TokenResponse = resp.json().await?;
    let interface = config.interface.as_deref().unwrap_or("public");
    let region = config.region_name.as_deref();

    let mut endpoints = BTreeMap::new();
    for entry in parsed.token.catalog {
        let chosen = entry
            .endpoints
            .iter()
            .filter(|e| e.interface == interface)
            .find(|e| region.is_none() || e.region.as_deref() == region)
            .or_else(|| entry.endpoints.iter().find(|e| e.interface == interface));

        if let Some(endpoint) = chosen {
            let url = if entry.service_type == "identity" {
                normalize_identity_url(&endpoint.url)?
            } else {
                endpoint.url.trim_end_matches('/').to_string()
            };
            endpoints.insert(entry.service_type, url);
        }
    }

    // Deployments without a catalog entry for identity still need one
    endpoints
        .entry("identity".to_string())
        .or_insert(identity_url);

    info!(
        services = endpoints.len(),
        "Authenticated against Keystone, service catalog resolved"
    );

    Ok(Session { token, endpoints })
}

#[cfg(test)]
#[path = "auth_tests.rs"]
mod auth_tests;
