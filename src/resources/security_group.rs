// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Security group management.
//!
//! Groups are created in two passes so that rules can reference sibling
//! groups from the same CR: pass one ensures every group and builds a
//! name → id map, pass two creates the rules against that map.

use crate::constants::MANAGED_BY_TAG;
use crate::crd::{SecurityGroupSpec, SecurityGroupStatus};
use crate::openstack::{OpenStackClient, SecurityGroupRuleCreate};
use anyhow::Result;
use std::collections::BTreeMap;
use tracing::{info, warn};

/// Ensure all specified security groups exist with their rules.
///
/// Returns status entries in spec order.
pub async fn ensure_security_groups(
    os: &OpenStackClient,
    project_id: &str,
    specs: &[SecurityGroupSpec],
) -> Result<Vec<SecurityGroupStatus>> {
    let tags = vec![MANAGED_BY_TAG.to_string()];
    let mut statuses = Vec::with_capacity(specs.len());
    let mut name_to_id: BTreeMap<String, String> = BTreeMap::new();

    // Pass 1: ensure the groups themselves
    for spec in specs {
        let sg_id = match os.get_security_group(&spec.name, project_id).await? {
            Some(group) => {
                info!(security_group = %spec.name, id = %group.id, "Security group already exists");
                group.id
            }
            None => {
                let group = os
                    .create_security_group(&spec.name, project_id, &spec.description, &tags)
                    .await?;
                info!(security_group = %spec.name, id = %group.id, "Created security group");
                group.id
            }
        };

        name_to_id.insert(spec.name.clone(), sg_id.clone());
        statuses.push(SecurityGroupStatus {
            name: spec.name.clone(),
            id: Some(sg_id),
        });
    }

    // Pass 2: rules, now that every referenced group resolves
    for spec in specs {
        let sg_id = &name_to_id[&spec.name];

        for rule in &spec.rules {
            let remote_group_id = match &rule.remote_group_name {
                Some(remote_name) => match name_to_id.get(remote_name) {
                    Some(id) => Some(id.clone()),
                    None => {
                        warn!(
                            security_group = %spec.name,
                            remote_group = %remote_name,
                            "Remote security group not found, skipping rule"
                        );
                        continue;
                    }
                },
                None => None,
            };

            os.create_security_group_rule(&SecurityGroupRuleCreate {
                security_group_id: sg_id.clone(),
                direction: rule.direction.clone(),
                protocol: rule.protocol.clone(),
                port_range_min: rule.port_range_min,
                port_range_max: rule.port_range_max,
                remote_ip_prefix: rule.remote_ip_prefix.clone(),
                remote_group_id,
                ethertype: rule.ethertype.clone(),
            })
            .await?;
        }
    }

    Ok(statuses)
}

/// Delete all recorded security groups, warning and continuing on failure.
pub async fn delete_security_groups(os: &OpenStackClient, statuses: &[SecurityGroupStatus]) {
    for status in statuses {
        if let Some(sg_id) = &status.id {
            if let Err(e) = os.delete_security_group(sg_id).await {
                warn!(sg_id, error = %e, "Failed to delete security group");
            }
        }
    }
}
