// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Role binding application for projects.
//!
//! Each binding's role always goes to the project's own user group, since
//! federated users land there via the mapping. Explicit groups get the same
//! role; explicit users are synced into the user group by membership, with
//! missing users tolerated (they materialise after first SSO login).

use crate::crd::RoleBindingSpec;
use crate::openstack::OpenStackClient;
use anyhow::Result;
use std::collections::HashSet;
use tracing::{debug, info, warn};

/// Apply role bindings to a project.
pub async fn apply_role_bindings(
    os: &OpenStackClient,
    project_id: &str,
    group_id: Option<&str>,
    bindings: &[RoleBindingSpec],
    project_domain: &str,
) -> Result<()> {
    if bindings.is_empty() {
        debug!(project_id, "No role bindings specified");
        return Ok(());
    }

    for binding in bindings {
        let Some(role) = os.get_role(&binding.role).await? else {
            warn!(role = %binding.role, "Role not found, skipping");
            continue;
        };

        if let Some(group_id) = group_id {
            os.assign_role_to_group(&role.id, group_id, project_id)
                .await?;
            info!(
                role = %binding.role,
                group_id,
                project_id,
                "Assigned role to project group"
            );
        }

        let group_domain = binding.group_domain.as_deref().unwrap_or(project_domain);
        for group_name in &binding.groups {
            match os.get_group(group_name, group_domain).await? {
                Some(group) => {
                    os.assign_role_to_group(&role.id, &group.id, project_id)
                        .await?;
                    info!(
                        role = %binding.role,
                        group = %group_name,
                        project_id,
                        "Assigned role to explicit group"
                    );
                }
                None => warn!(
                    group = %group_name,
                    domain = %group_domain,
                    "Group not found"
                ),
            }
        }

        let user_domain = binding.user_domain.as_deref().unwrap_or(project_domain);
        if let Some(group_id) = group_id {
            sync_users_to_group(os, &binding.users, user_domain, group_id).await?;
        }
    }

    Ok(())
}

/// Sync group membership to match the desired user list.
///
/// Adds missing members, removes members outside the set, and skips users
/// the directory does not know yet.
async fn sync_users_to_group(
    os: &OpenStackClient,
    desired_users: &[String],
    user_domain: &str,
    group_id: &str,
) -> Result<()> {
    let current_members = os.list_group_users(group_id).await?;
    let current_names: HashSet<&str> = current_members.iter().map(|u| u.name.as_str()).collect();

    for username in desired_users {
        if current_names.contains(username.as_str()) {
            continue;
        }
        match os.get_user(username, user_domain).await? {
            Some(user) => {
                os.add_user_to_group(&user.id, group_id).await?;
                info!(user = %username, group_id, "Added user to group");
            }
            None => debug!(
                user = %username,
                domain = %user_domain,
                "User not found, will be added after first SSO login"
            ),
        }
    }

    let desired: HashSet<&str> = desired_users.iter().map(String::as_str).collect();
    for member in &current_members {
        if !desired.contains(member.name.as_str()) {
            os.remove_user_from_group(&member.id, group_id).await?;
            info!(user = %member.name, group_id, "Removed user from group");
        }
    }

    Ok(())
}

/// Collect every user across all bindings, deduplicated, in first-seen
/// order. These users feed the federation mapping.
#[must_use]
pub fn users_from_role_bindings(bindings: &[RoleBindingSpec]) -> Vec<String> {
    let mut users = Vec::new();
    let mut seen = HashSet::new();
    for binding in bindings {
        for user in &binding.users {
            if seen.insert(user.as_str()) {
                users.push(user.clone());
            }
        }
    }
    users
}

#[cfg(test)]
#[path = "role_binding_tests.rs"]
mod role_binding_tests;
