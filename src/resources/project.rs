// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Project and user-group management.
//!
//! Every project gets a companion user group named `{sanitized}-users` in
//! the same domain, and the implicit `member` role assignment that lets
//! federated users land in the project.

use crate::constants::{MANAGED_BY_DESCRIPTION_PREFIX, MANAGED_BY_TAG, MEMBER_ROLE};
use crate::names::group_name;
use crate::openstack::OpenStackClient;
use anyhow::Result;
use tracing::{info, warn};

/// Remote ids of a project and its user group.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProjectInfo {
    pub project_id: String,
    pub group_id: Option<String>,
}

/// Ensure a project and its user group exist.
///
/// Returns the pair `(project_id, group_id)`.
///
/// # Errors
///
/// Fails when the domain is missing or a remote call errors out.
pub async fn ensure_project(
    os: &OpenStackClient,
    name: &str,
    domain: &str,
    description: &str,
    enabled: bool,
) -> Result<(String, String)> {
    let project_id = match os.get_project(name, domain).await? {
        Some(project) => {
            info!(project = name, id = %project.id, "Project already exists");
            if project.description.as_deref().unwrap_or_default() != description
                || project.enabled != enabled
            {
                os.update_project(&project.id, Some(description), Some(enabled))
                    .await?;
            }
            project.id
        }
        None => {
            let project = os.create_project(name, domain, description, enabled).await?;
            info!(project = name, id = %project.id, "Created project");
            project.id
        }
    };
    // Tag existing projects too, so pre-registry deployments stay marked
    os.add_project_tag(&project_id, MANAGED_BY_TAG).await?;

    let group = group_name(name);
    let group_id = match os.get_group(&group, domain).await? {
        Some(existing) => {
            info!(group = %group, id = %existing.id, "Group already exists");
            existing.id
        }
        None => {
            // Groups have no tag support; mark ownership in the description
            let description = format!("{MANAGED_BY_DESCRIPTION_PREFIX}Users for {name}");
            let created = os.create_group(&group, domain, &description).await?;
            info!(group = %group, id = %created.id, "Created group");
            created.id
        }
    };

    match os.get_role(MEMBER_ROLE).await? {
        Some(role) => {
            os.assign_role_to_group(&role.id, &group_id, &project_id)
                .await?;
        }
        None => warn!("Role '{MEMBER_ROLE}' not found, skipping role assignment"),
    }

    Ok((project_id, group_id))
}

/// Delete a project and its associated group, tolerating partial failure.
pub async fn delete_project(
    os: &OpenStackClient,
    project_id: &str,
    group_id: Option<&str>,
) -> Result<()> {
    if let Some(group_id) = group_id {
        if let Err(e) = os.delete_group(group_id).await {
            warn!(group_id, error = %e, "Failed to delete group");
        }
    }

    os.delete_project(project_id).await?;
    Ok(())
}

/// Look up a project and its derived group; `None` when the project is gone.
pub async fn get_project_info(
    os: &OpenStackClient,
    name: &str,
    domain: &str,
) -> Result<Option<ProjectInfo>> {
    let Some(project) = os.get_project(name, domain).await? else {
        return Ok(None);
    };

    let group = os.get_group(&group_name(name), domain).await?;
    Ok(Some(ProjectInfo {
        project_id: project.id,
        group_id: group.map(|g| g.id),
    }))
}
