// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Federation mapping management.
//!
//! One remote mapping document (`{idp_name}_oidc_mapping`) holds the rules
//! for every project sharing an identity provider. Updates are full
//! read-modify-write cycles on the latest fetch: drop this project's rule,
//! append the new one, write back. A concurrent writer can still lose an
//! add; the drift timer re-adds it on the next tick.

use crate::constants::FEDERATION_PROTOCOL_ID;
use crate::crd::FederationRef;
use crate::names::{group_name, mapping_name};
use crate::openstack::{
    MappingDomainRef, MappingGroup, MappingLocal, MappingRemote, MappingRule, MappingUser,
    OpenStackClient,
};
use anyhow::{Context as _, Result};
use k8s_openapi::api::core::v1::ConfigMap;
use kube::{Api, Client};
use tracing::{debug, info};

/// Federation settings loaded from the referenced ConfigMap.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FederationConfig {
    pub idp_name: String,
    pub idp_remote_id: String,
    pub sso_domain: String,
}

/// Load federation settings from the ConfigMap a CR points at.
///
/// Returns `None` when the reference is absent, the ConfigMap is missing,
/// or the `idp-name` key is empty.
pub async fn load_federation_config(
    client: &Client,
    cr_namespace: &str,
    federation_ref: Option<&FederationRef>,
) -> Result<Option<FederationConfig>> {
    let Some(federation_ref) = federation_ref else {
        return Ok(None);
    };

    let namespace = federation_ref
        .config_map_namespace
        .as_deref()
        .unwrap_or(cr_namespace);
    let api: Api<ConfigMap> = Api::namespaced(client.clone(), namespace);

    let cm = match api.get(&federation_ref.config_map_name).await {
        Ok(cm) => cm,
        Err(kube::Error::Api(e)) if e.code == 404 => {
            debug!(
                namespace,
                name = %federation_ref.config_map_name,
                "Federation ConfigMap not found"
            );
            return Ok(None);
        }
        Err(e) => {
            return Err(e).with_context(|| {
                format!(
                    "reading federation ConfigMap {namespace}/{}",
                    federation_ref.config_map_name
                )
            })
        }
    };

    let data = cm.data.unwrap_or_default();
    let get = |key: &str| data.get(key).cloned().unwrap_or_default();

    let config = FederationConfig {
        idp_name: get("idp-name"),
        idp_remote_id: get("idp-remote-id"),
        sso_domain: get("sso-domain"),
    };

    if config.idp_name.is_empty() {
        return Ok(None);
    }
    Ok(Some(config))
}

/// Generate the mapping rule for a project.
///
/// Maps OIDC subjects to an ephemeral user and drops them into the
/// project's derived group.
#[must_use]
pub fn generate_mapping_rule(project_name: &str, users: &[String], domain: &str) -> MappingRule {
    MappingRule {
        local: vec![
            MappingLocal {
                user: Some(MappingUser {
                    name: "{0}".to_string(),
                    domain: MappingDomainRef {
                        name: domain.to_string(),
                    },
                    r#type: Some("ephemeral".to_string()),
                }),
                group: None,
            },
            MappingLocal {
                user: None,
                group: Some(MappingGroup {
                    name: group_name(project_name),
                    domain: MappingDomainRef {
                        name: domain.to_string(),
                    },
                }),
            },
        ],
        remote: vec![
            MappingRemote {
                r#type: "HTTP_OIDC_SUB".to_string(),
                any_one_of: None,
            },
            MappingRemote {
                r#type: "HTTP_OIDC_SUB".to_string(),
                any_one_of: Some(users.to_vec()),
            },
        ],
    }
}

/// Whether a rule belongs to the given derived group name.
#[must_use]
pub fn rule_matches_group(rule: &MappingRule, group: &str) -> bool {
    rule.local
        .iter()
        .any(|local| local.group.as_ref().is_some_and(|g| g.name == group))
}

/// Manages the shared federation mapping across all projects of one IdP.
pub struct FederationManager<'a> {
    os: &'a OpenStackClient,
    idp_name: String,
    idp_remote_id: String,
    sso_domain: String,
    mapping_name: String,
}

impl<'a> FederationManager<'a> {
    #[must_use]
    pub fn new(os: &'a OpenStackClient, config: &FederationConfig) -> Self {
        Self {
            os,
            idp_name: config.idp_name.clone(),
            idp_remote_id: config.idp_remote_id.clone(),
            sso_domain: config.sso_domain.clone(),
            mapping_name: mapping_name(&config.idp_name),
        }
    }

    /// Name of the shared mapping document.
    #[must_use]
    pub fn mapping_name(&self) -> &str {
        &self.mapping_name
    }

    /// Ensure the identity provider exists.
    pub async fn ensure_identity_provider(&self) -> Result<()> {
        if self.os.get_identity_provider(&self.idp_name).await?.is_none() {
            self.os
                .create_identity_provider(&self.idp_name, &[self.idp_remote_id.clone()])
                .await?;
            info!(idp = %self.idp_name, "Created identity provider");
        }
        Ok(())
    }

    /// Ensure the `openid` federation protocol exists for this mapping.
    pub async fn ensure_protocol(&self) -> Result<()> {
        if self
            .os
            .get_federation_protocol(&self.idp_name, FEDERATION_PROTOCOL_ID)
            .await?
            .is_none()
        {
            self.os
                .create_federation_protocol(
                    &self.idp_name,
                    FEDERATION_PROTOCOL_ID,
                    &self.mapping_name,
                )
                .await?;
            info!(protocol = FEDERATION_PROTOCOL_ID, "Created federation protocol");
        }
        Ok(())
    }

    /// Current rules of the mapping document, empty when absent.
    pub async fn current_rules(&self) -> Result<Vec<MappingRule>> {
        Ok(self
            .os
            .get_mapping(&self.mapping_name)
            .await?
            .map(|m| m.rules)
            .unwrap_or_default())
    }

    /// Create or update the mapping document with the given rules.
    async fn write_rules(&self, rules: &[MappingRule]) -> Result<()> {
        if self.os.get_mapping(&self.mapping_name).await?.is_some() {
            self.os.update_mapping(&self.mapping_name, rules).await?;
            info!(mapping = %self.mapping_name, "Updated mapping");
        } else {
            self.os.create_mapping(&self.mapping_name, rules).await?;
            info!(mapping = %self.mapping_name, "Created mapping");
        }
        Ok(())
    }

    /// Add or overwrite the rule for a project.
    ///
    /// No-op when the user list is empty; remove the rule instead.
    pub async fn add_project_mapping(&self, project_name: &str, users: &[String]) -> Result<()> {
        if users.is_empty() {
            debug!(project = project_name, "No users, skipping mapping");
            return Ok(());
        }

        self.ensure_identity_provider().await?;

        let group = group_name(project_name);
        let mut rules: Vec<MappingRule> = self
            .current_rules()
            .await?
            .into_iter()
            .filter(|rule| !rule_matches_group(rule, &group))
            .collect();
        rules.push(generate_mapping_rule(project_name, users, &self.sso_domain));

        self.write_rules(&rules).await?;
        self.ensure_protocol().await?;

        info!(
            project = project_name,
            users = users.len(),
            "Updated federation mapping"
        );
        Ok(())
    }

    /// Remove the rule for a project, writing back only when changed.
    pub async fn remove_project_mapping(&self, project_name: &str) -> Result<()> {
        let group = group_name(project_name);
        let current = self.current_rules().await?;
        let remaining: Vec<MappingRule> = current
            .iter()
            .filter(|rule| !rule_matches_group(rule, &group))
            .cloned()
            .collect();

        if remaining.len() != current.len() {
            self.write_rules(&remaining).await?;
            info!(project = project_name, "Removed federation mapping");
        } else {
            debug!(project = project_name, "No federation mapping found");
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "federation_tests.rs"]
mod federation_tests;
