// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Keystone operations: domains, projects, groups, users, roles and
//! federation primitives.
//!
//! Finder operations return `Ok(None)` on a miss and never create. Deletes
//! are idempotent: a 404 from the remote is swallowed. Role assignments and
//! group membership changes swallow conflicts, since "already assigned" is
//! the desired state.

use super::error::{check_response, OpenStackError};
use super::types::*;
use super::{OpenStackClient, SERVICE_IDENTITY};
use reqwest::Method;
use serde_json::json;
use tracing::{debug, info};

impl OpenStackClient {
    // ------------------------------------------------------------------
    // Domain operations
    // ------------------------------------------------------------------

    /// Find a domain by name, falling back to id lookup.
    pub async fn get_domain(&self, name_or_id: &str) -> Result<Option<Domain>, OpenStackError> {
        self.call(SERVICE_IDENTITY, "get_domain", || async {
            let resp = self
                .request(Method::GET, SERVICE_IDENTITY, "domains")
                .await?
                .query(&[("name", name_or_id)])
                .send()
                .await?;
            let list: DomainListEnvelope = check_response(resp).await?.json().await?;
            if let Some(domain) = list.domains.into_iter().next() {
                return Ok(Some(domain));
            }

            let by_id = self
                .request(
                    Method::GET,
                    SERVICE_IDENTITY,
                    &format!("domains/{name_or_id}"),
                )
                .await?
                .send()
                .await?;
            match check_response(by_id).await {
                Ok(resp) => {
                    let envelope: DomainEnvelope = resp.json().await?;
                    Ok(Some(envelope.domain))
                }
                Err(e) if e.is_not_found() => Ok(None),
                Err(e) => Err(e),
            }
        })
        .await
    }

    pub async fn create_domain(
        &self,
        name: &str,
        description: &str,
        enabled: bool,
    ) -> Result<Domain, OpenStackError> {
        info!(domain = name, "Creating domain");
        self.call(SERVICE_IDENTITY, "create_domain", || async {
            let resp = self
                .request(Method::POST, SERVICE_IDENTITY, "domains")
                .await?
                .json(&json!({"domain": {
                    "name": name,
                    "description": description,
                    "enabled": enabled,
                }}))
                .send()
                .await?;
            let envelope: DomainEnvelope = check_response(resp).await?.json().await?;
            Ok(envelope.domain)
        })
        .await
    }

    pub async fn update_domain(
        &self,
        domain_id: &str,
        description: &str,
        enabled: bool,
    ) -> Result<(), OpenStackError> {
        info!(domain_id, "Updating domain");
        let path = format!("domains/{domain_id}");
        self.call(SERVICE_IDENTITY, "update_domain", || async {
            let resp = self
                .request(Method::PATCH, SERVICE_IDENTITY, &path)
                .await?
                .json(&json!({"domain": {"description": description, "enabled": enabled}}))
                .send()
                .await?;
            check_response(resp).await?;
            Ok(())
        })
        .await
    }

    /// Delete a domain. Keystone requires the domain to be disabled first,
    /// which this method handles.
    pub async fn delete_domain(&self, domain_id: &str) -> Result<(), OpenStackError> {
        info!(domain_id, "Deleting domain");
        let path = format!("domains/{domain_id}");

        let disable = self
            .call(SERVICE_IDENTITY, "disable_domain", || async {
                let resp = self
                    .request(Method::PATCH, SERVICE_IDENTITY, &path)
                    .await?
                    .json(&json!({"domain": {"enabled": false}}))
                    .send()
                    .await?;
                check_response(resp).await?;
                Ok(())
            })
            .await;
        match disable {
            Ok(()) => {}
            Err(e) if e.is_not_found() => return Ok(()),
            Err(e) => return Err(e),
        }

        let result = self
            .call(SERVICE_IDENTITY, "delete_domain", || async {
                let resp = self
                    .request(Method::DELETE, SERVICE_IDENTITY, &path)
                    .await?
                    .send()
                    .await?;
                check_response(resp).await?;
                Ok(())
            })
            .await;
        swallow_not_found(result)
    }

    // ------------------------------------------------------------------
    // Project operations
    // ------------------------------------------------------------------

    /// Find a project by name within a domain (given by name).
    pub async fn get_project(
        &self,
        name: &str,
        domain: &str,
    ) -> Result<Option<Project>, OpenStackError> {
        let Some(domain_obj) = self.get_domain(domain).await? else {
            return Ok(None);
        };

        self.call(SERVICE_IDENTITY, "get_project", || async {
            let resp = self
                .request(Method::GET, SERVICE_IDENTITY, "projects")
                .await?
                .query(&[("name", name), ("domain_id", &domain_obj.id)])
                .send()
                .await?;
            let list: ProjectListEnvelope = check_response(resp).await?.json().await?;
            Ok(list.projects.into_iter().next())
        })
        .await
    }

    /// Create a project in a domain (given by name).
    ///
    /// # Errors
    ///
    /// Fails with [`OpenStackError::Config`] when the domain does not exist.
    pub async fn create_project(
        &self,
        name: &str,
        domain: &str,
        description: &str,
        enabled: bool,
    ) -> Result<Project, OpenStackError> {
        let domain_obj = self
            .get_domain(domain)
            .await?
            .ok_or_else(|| OpenStackError::Config(format!("domain not found: {domain}")))?;

        info!(project = name, domain, "Creating project");
        self.call(SERVICE_IDENTITY, "create_project", || async {
            let resp = self
                .request(Method::POST, SERVICE_IDENTITY, "projects")
                .await?
                .json(&json!({"project": {
                    "name": name,
                    "domain_id": domain_obj.id,
                    "description": description,
                    "enabled": enabled,
                }}))
                .send()
                .await?;
            let envelope: ProjectEnvelope = check_response(resp).await?.json().await?;
            Ok(envelope.project)
        })
        .await
    }

    pub async fn update_project(
        &self,
        project_id: &str,
        description: Option<&str>,
        enabled: Option<bool>,
    ) -> Result<(), OpenStackError> {
        let mut updates = serde_json::Map::new();
        if let Some(description) = description {
            updates.insert("description".into(), json!(description));
        }
        if let Some(enabled) = enabled {
            updates.insert("enabled".into(), json!(enabled));
        }
        if updates.is_empty() {
            return Ok(());
        }

        info!(project_id, "Updating project");
        let path = format!("projects/{project_id}");
        self.call(SERVICE_IDENTITY, "update_project", || async {
            let resp = self
                .request(Method::PATCH, SERVICE_IDENTITY, &path)
                .await?
                .json(&json!({"project": updates}))
                .send()
                .await?;
            check_response(resp).await?;
            Ok(())
        })
        .await
    }

    pub async fn delete_project(&self, project_id: &str) -> Result<(), OpenStackError> {
        info!(project_id, "Deleting project");
        let path = format!("projects/{project_id}");
        let result = self
            .call(SERVICE_IDENTITY, "delete_project", || async {
                let resp = self
                    .request(Method::DELETE, SERVICE_IDENTITY, &path)
                    .await?
                    .send()
                    .await?;
                check_response(resp).await?;
                Ok(())
            })
            .await;
        swallow_not_found(result)
    }

    /// Attach a tag to a project; already-present tags are fine.
    pub async fn add_project_tag(
        &self,
        project_id: &str,
        tag: &str,
    ) -> Result<(), OpenStackError> {
        let path = format!("projects/{project_id}/tags/{tag}");
        let result = self
            .call(SERVICE_IDENTITY, "add_project_tag", || async {
                let resp = self
                    .request(Method::PUT, SERVICE_IDENTITY, &path)
                    .await?
                    .send()
                    .await?;
                check_response(resp).await?;
                Ok(())
            })
            .await;
        swallow_conflict(result)
    }

    /// List projects in a domain carrying a tag; used by the legacy GC scan.
    pub async fn list_projects_with_tag(
        &self,
        domain_id: &str,
        tag: &str,
    ) -> Result<Vec<Project>, OpenStackError> {
        self.call(SERVICE_IDENTITY, "list_projects_with_tag", || async {
            let resp = self
                .request(Method::GET, SERVICE_IDENTITY, "projects")
                .await?
                .query(&[("domain_id", domain_id), ("tags", tag)])
                .send()
                .await?;
            let list: ProjectListEnvelope = check_response(resp).await?.json().await?;
            Ok(list.projects)
        })
        .await
    }

    // ------------------------------------------------------------------
    // Group operations
    // ------------------------------------------------------------------

    /// Find a group by name within a domain (given by name).
    pub async fn get_group(
        &self,
        name: &str,
        domain: &str,
    ) -> Result<Option<Group>, OpenStackError> {
        let Some(domain_obj) = self.get_domain(domain).await? else {
            return Ok(None);
        };

        self.call(SERVICE_IDENTITY, "get_group", || async {
            let resp = self
                .request(Method::GET, SERVICE_IDENTITY, "groups")
                .await?
                .query(&[("name", name), ("domain_id", &domain_obj.id)])
                .send()
                .await?;
            let list: GroupListEnvelope = check_response(resp).await?.json().await?;
            Ok(list.groups.into_iter().next())
        })
        .await
    }

    pub async fn get_group_by_id(&self, group_id: &str) -> Result<Option<Group>, OpenStackError> {
        let path = format!("groups/{group_id}");
        self.call(SERVICE_IDENTITY, "get_group_by_id", || async {
            let resp = self
                .request(Method::GET, SERVICE_IDENTITY, &path)
                .await?
                .send()
                .await?;
            match check_response(resp).await {
                Ok(resp) => {
                    let envelope: GroupEnvelope = resp.json().await?;
                    Ok(Some(envelope.group))
                }
                Err(e) if e.is_not_found() => Ok(None),
                Err(e) => Err(e),
            }
        })
        .await
    }

    pub async fn create_group(
        &self,
        name: &str,
        domain: &str,
        description: &str,
    ) -> Result<Group, OpenStackError> {
        let domain_obj = self
            .get_domain(domain)
            .await?
            .ok_or_else(|| OpenStackError::Config(format!("domain not found: {domain}")))?;

        info!(group = name, domain, "Creating group");
        self.call(SERVICE_IDENTITY, "create_group", || async {
            let resp = self
                .request(Method::POST, SERVICE_IDENTITY, "groups")
                .await?
                .json(&json!({"group": {
                    "name": name,
                    "domain_id": domain_obj.id,
                    "description": description,
                }}))
                .send()
                .await?;
            let envelope: GroupEnvelope = check_response(resp).await?.json().await?;
            Ok(envelope.group)
        })
        .await
    }

    pub async fn delete_group(&self, group_id: &str) -> Result<(), OpenStackError> {
        info!(group_id, "Deleting group");
        let path = format!("groups/{group_id}");
        let result = self
            .call(SERVICE_IDENTITY, "delete_group", || async {
                let resp = self
                    .request(Method::DELETE, SERVICE_IDENTITY, &path)
                    .await?
                    .send()
                    .await?;
                check_response(resp).await?;
                Ok(())
            })
            .await;
        swallow_not_found(result)
    }

    pub async fn list_group_users(&self, group_id: &str) -> Result<Vec<User>, OpenStackError> {
        let path = format!("groups/{group_id}/users");
        self.call(SERVICE_IDENTITY, "list_group_users", || async {
            let resp = self
                .request(Method::GET, SERVICE_IDENTITY, &path)
                .await?
                .send()
                .await?;
            let list: UserListEnvelope = check_response(resp).await?.json().await?;
            Ok(list.users)
        })
        .await
    }

    pub async fn add_user_to_group(
        &self,
        user_id: &str,
        group_id: &str,
    ) -> Result<(), OpenStackError> {
        let path = format!("groups/{group_id}/users/{user_id}");
        let result = self
            .call(SERVICE_IDENTITY, "add_user_to_group", || async {
                let resp = self
                    .request(Method::PUT, SERVICE_IDENTITY, &path)
                    .await?
                    .send()
                    .await?;
                check_response(resp).await?;
                Ok(())
            })
            .await;
        swallow_conflict(result)
    }

    pub async fn remove_user_from_group(
        &self,
        user_id: &str,
        group_id: &str,
    ) -> Result<(), OpenStackError> {
        let path = format!("groups/{group_id}/users/{user_id}");
        let result = self
            .call(SERVICE_IDENTITY, "remove_user_from_group", || async {
                let resp = self
                    .request(Method::DELETE, SERVICE_IDENTITY, &path)
                    .await?
                    .send()
                    .await?;
                check_response(resp).await?;
                Ok(())
            })
            .await;
        swallow_not_found(result)
    }

    // ------------------------------------------------------------------
    // User and role operations
    // ------------------------------------------------------------------

    /// Find a user by name within a domain (given by name). Federated users
    /// only materialise after their first SSO login.
    pub async fn get_user(
        &self,
        name: &str,
        domain: &str,
    ) -> Result<Option<User>, OpenStackError> {
        let Some(domain_obj) = self.get_domain(domain).await? else {
            return Ok(None);
        };

        self.call(SERVICE_IDENTITY, "get_user", || async {
            let resp = self
                .request(Method::GET, SERVICE_IDENTITY, "users")
                .await?
                .query(&[("name", name), ("domain_id", &domain_obj.id)])
                .send()
                .await?;
            let list: UserListEnvelope = check_response(resp).await?.json().await?;
            Ok(list.users.into_iter().next())
        })
        .await
    }

    pub async fn get_role(&self, name: &str) -> Result<Option<Role>, OpenStackError> {
        self.call(SERVICE_IDENTITY, "get_role", || async {
            let resp = self
                .request(Method::GET, SERVICE_IDENTITY, "roles")
                .await?
                .query(&[("name", name)])
                .send()
                .await?;
            let list: RoleListEnvelope = check_response(resp).await?.json().await?;
            Ok(list.roles.into_iter().next())
        })
        .await
    }

    /// Assign a role to a group on a project; already-assigned is fine.
    pub async fn assign_role_to_group(
        &self,
        role_id: &str,
        group_id: &str,
        project_id: &str,
    ) -> Result<(), OpenStackError> {
        debug!(role_id, group_id, project_id, "Assigning role to group");
        let path = format!("projects/{project_id}/groups/{group_id}/roles/{role_id}");
        let result = self
            .call(SERVICE_IDENTITY, "assign_role_to_group", || async {
                let resp = self
                    .request(Method::PUT, SERVICE_IDENTITY, &path)
                    .await?
                    .send()
                    .await?;
                check_response(resp).await?;
                Ok(())
            })
            .await;
        swallow_conflict(result)
    }

    /// Revoke a role from a group on a project; not-assigned is fine.
    pub async fn revoke_role_from_group(
        &self,
        role_id: &str,
        group_id: &str,
        project_id: &str,
    ) -> Result<(), OpenStackError> {
        debug!(role_id, group_id, project_id, "Revoking role from group");
        let path = format!("projects/{project_id}/groups/{group_id}/roles/{role_id}");
        let result = self
            .call(SERVICE_IDENTITY, "revoke_role_from_group", || async {
                let resp = self
                    .request(Method::DELETE, SERVICE_IDENTITY, &path)
                    .await?
                    .send()
                    .await?;
                check_response(resp).await?;
                Ok(())
            })
            .await;
        swallow_not_found(result)
    }

    // ------------------------------------------------------------------
    // Federation operations
    // ------------------------------------------------------------------

    pub async fn get_identity_provider(
        &self,
        idp_id: &str,
    ) -> Result<Option<IdentityProvider>, OpenStackError> {
        let path = format!("OS-FEDERATION/identity_providers/{idp_id}");
        self.call(SERVICE_IDENTITY, "get_identity_provider", || async {
            let resp = self
                .request(Method::GET, SERVICE_IDENTITY, &path)
                .await?
                .send()
                .await?;
            match check_response(resp).await {
                Ok(resp) => {
                    let envelope: IdentityProviderEnvelope = resp.json().await?;
                    Ok(Some(envelope.identity_provider))
                }
                Err(e) if e.is_not_found() => Ok(None),
                Err(e) => Err(e),
            }
        })
        .await
    }

    pub async fn create_identity_provider(
        &self,
        idp_id: &str,
        remote_ids: &[String],
    ) -> Result<IdentityProvider, OpenStackError> {
        info!(idp = idp_id, "Creating identity provider");
        let path = format!("OS-FEDERATION/identity_providers/{idp_id}");
        self.call(SERVICE_IDENTITY, "create_identity_provider", || async {
            let resp = self
                .request(Method::PUT, SERVICE_IDENTITY, &path)
                .await?
                .json(&json!({"identity_provider": {
                    "remote_ids": remote_ids,
                    "enabled": true,
                }}))
                .send()
                .await?;
            let envelope: IdentityProviderEnvelope = check_response(resp).await?.json().await?;
            Ok(envelope.identity_provider)
        })
        .await
    }

    pub async fn get_mapping(&self, mapping_id: &str) -> Result<Option<Mapping>, OpenStackError> {
        let path = format!("OS-FEDERATION/mappings/{mapping_id}");
        self.call(SERVICE_IDENTITY, "get_mapping", || async {
            let resp = self
                .request(Method::GET, SERVICE_IDENTITY, &path)
                .await?
                .send()
                .await?;
            match check_response(resp).await {
                Ok(resp) => {
                    let envelope: MappingEnvelope = resp.json().await?;
                    Ok(Some(envelope.mapping))
                }
                Err(e) if e.is_not_found() => Ok(None),
                Err(e) => Err(e),
            }
        })
        .await
    }

    pub async fn create_mapping(
        &self,
        mapping_id: &str,
        rules: &[MappingRule],
    ) -> Result<Mapping, OpenStackError> {
        info!(mapping = mapping_id, "Creating mapping");
        let path = format!("OS-FEDERATION/mappings/{mapping_id}");
        self.call(SERVICE_IDENTITY, "create_mapping", || async {
            let resp = self
                .request(Method::PUT, SERVICE_IDENTITY, &path)
                .await?
                .json(&json!({"mapping": {"rules": rules}}))
                .send()
                .await?;
            let envelope: MappingEnvelope = check_response(resp).await?.json().await?;
            Ok(envelope.mapping)
        })
        .await
    }

    pub async fn update_mapping(
        &self,
        mapping_id: &str,
        rules: &[MappingRule],
    ) -> Result<Mapping, OpenStackError> {
        info!(mapping = mapping_id, "Updating mapping");
        let path = format!("OS-FEDERATION/mappings/{mapping_id}");
        self.call(SERVICE_IDENTITY, "update_mapping", || async {
            let resp = self
                .request(Method::PATCH, SERVICE_IDENTITY, &path)
                .await?
                .json(&json!({"mapping": {"rules": rules}}))
                .send()
                .await?;
            let envelope: MappingEnvelope = check_response(resp).await?.json().await?;
            Ok(envelope.mapping)
        })
        .await
    }

    pub async fn get_federation_protocol(
        &self,
        idp_id: &str,
        protocol_id: &str,
    ) -> Result<Option<FederationProtocol>, OpenStackError> {
        let path = format!("OS-FEDERATION/identity_providers/{idp_id}/protocols/{protocol_id}");
        self.call(SERVICE_IDENTITY, "get_federation_protocol", || async {
            let resp = self
                .request(Method::GET, SERVICE_IDENTITY, &path)
                .await?
                .send()
                .await?;
            match check_response(resp).await {
                Ok(resp) => {
                    let envelope: FederationProtocolEnvelope = resp.json().await?;
                    Ok(Some(envelope.protocol))
                }
                Err(e) if e.is_not_found() => Ok(None),
                Err(e) => Err(e),
            }
        })
        .await
    }

    pub async fn create_federation_protocol(
        &self,
        idp_id: &str,
        protocol_id: &str,
        mapping_id: &str,
    ) -> Result<FederationProtocol, OpenStackError> {
        info!(idp = idp_id, protocol = protocol_id, "Creating federation protocol");
        let path = format!("OS-FEDERATION/identity_providers/{idp_id}/protocols/{protocol_id}");
        self.call(SERVICE_IDENTITY, "create_federation_protocol", || async {
            let resp = self
                .request(Method::PUT, SERVICE_IDENTITY, &path)
                .await?
                .json(&json!({"protocol": {"mapping_id": mapping_id}}))
                .send()
                .await?;
            let envelope: FederationProtocolEnvelope = check_response(resp).await?.json().await?;
            Ok(envelope.protocol)
        })
        .await
    }
}

/// Deletes are idempotent: map a remote 404 to success.
pub(crate) fn swallow_not_found(result: Result<(), OpenStackError>) -> Result<(), OpenStackError> {
    match result {
        Err(e) if e.is_not_found() => {
            debug!("Resource already absent");
            Ok(())
        }
        other => other,
    }
}

/// "Already exists" conflicts mean the desired state is already in place.
pub(crate) fn swallow_conflict(result: Result<(), OpenStackError>) -> Result<(), OpenStackError> {
    match result {
        Err(e) if e.is_conflict() => {
            debug!("Resource already in desired state");
            Ok(())
        }
        other => other,
    }
}
