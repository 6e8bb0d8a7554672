// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Project-scope garbage collection tick.
//!
//! Walks the registry for orphaned security groups, tenant networks, groups
//! and projects (in that order), removes the federation rules of orphaned
//! projects, and finally runs the legacy tag scan over the managed domain
//! for projects that predate the registry. Every remote delete is
//! idempotent, so the registry path and the tag path may both fire for the
//! same project without harm.

use super::{GcOutcome, PROJECT_GC_ORDER};
use crate::constants::MANAGED_BY_TAG;
use crate::context::Context;
use crate::crd::{NetworkStatus, OpenstackProject};
use crate::metrics::PROJECT_GC_DELETED_RESOURCES;
use crate::names::group_name;
use crate::openstack::OpenStackClient;
use crate::registry::NamedRecord;
use crate::resources::federation::{FederationConfig, FederationManager};
use crate::resources::network::delete_network;
use anyhow::Result;
use kube::api::{Api, ListParams};
use kube::ResourceExt;
use std::collections::HashSet;
use tracing::{debug, error, info, warn};

fn extra_string(record: &NamedRecord, key: &str) -> Option<String> {
    record
        .record
        .extra
        .get(key)
        .and_then(|v| v.as_str())
        .map(ToString::to_string)
}

async fn delete_orphan(
    os: &OpenStackClient,
    kind: &str,
    orphan: &NamedRecord,
) -> Result<()> {
    match kind {
        "security_groups" => os.delete_security_group(&orphan.record.id).await?,
        "networks" => {
            let status = NetworkStatus {
                name: orphan.name.clone(),
                network_id: Some(orphan.record.id.clone()),
                subnet_id: extra_string(orphan, "subnet_id"),
                router_id: extra_string(orphan, "router_id"),
            };
            delete_network(os, &status).await;
        }
        "groups" => os.delete_group(&orphan.record.id).await?,
        "projects" => os.delete_project(&orphan.record.id).await?,
        other => anyhow::bail!("unknown registry kind: {other}"),
    }
    Ok(())
}

fn metric_type(kind: &str) -> &'static str {
    match kind {
        "security_groups" => "security_group",
        "networks" => "network",
        "groups" => "group",
        _ => "project",
    }
}

/// One project GC tick.
pub async fn collect_project_garbage(ctx: &Context) -> Result<GcOutcome> {
    let api: Api<OpenstackProject> = if ctx.config.watch_namespace.is_empty() {
        Api::all(ctx.client.clone())
    } else {
        Api::namespaced(ctx.client.clone(), &ctx.config.watch_namespace)
    };
    let crs = api.list(&ListParams::default()).await?;

    let expected_cr_names: HashSet<String> = crs.items.iter().map(ResourceExt::name_any).collect();
    let expected_projects: HashSet<String> =
        crs.items.iter().map(|cr| cr.spec.name.clone()).collect();
    debug!(?expected_projects, "Expected projects");

    let os = ctx.openstack().await?;
    let registry = ctx.registry().await;
    let mut outcome = GcOutcome::new();

    // Registry-driven orphan deletion in dependency order
    for kind in PROJECT_GC_ORDER {
        let orphans = registry.get_orphans(kind, &expected_cr_names).await?;
        for orphan in orphans {
            match delete_orphan(&os, kind, &orphan).await {
                Ok(()) => {
                    registry.unregister(kind, &orphan.name).await?;
                    PROJECT_GC_DELETED_RESOURCES
                        .with_label_values(&[metric_type(kind)])
                        .inc();
                    outcome
                        .entry(kind.to_string())
                        .or_default()
                        .push(orphan.name.clone());
                    info!(kind, name = %orphan.name, "Deleted orphaned resource");
                }
                Err(e) => {
                    error!(kind, name = %orphan.name, error = %e, "Failed to delete orphan");
                }
            }
        }
    }

    // Federation rules of orphaned projects; the shared mapping stays
    let mapping_orphans = registry
        .get_orphans("federation_mappings", &expected_cr_names)
        .await?;
    for orphan in mapping_orphans {
        let Some(idp_name) = extra_string(&orphan, "idp_name") else {
            warn!(project = %orphan.name, "Mapping record without idp_name, unregistering only");
            registry.unregister("federation_mappings", &orphan.name).await?;
            continue;
        };

        let config = FederationConfig {
            idp_name,
            idp_remote_id: String::new(),
            sso_domain: String::new(),
        };
        match FederationManager::new(&os, &config)
            .remove_project_mapping(&orphan.name)
            .await
        {
            Ok(()) => {
                registry.unregister("federation_mappings", &orphan.name).await?;
                PROJECT_GC_DELETED_RESOURCES
                    .with_label_values(&["mapping"])
                    .inc();
                outcome
                    .entry("federation_mappings".to_string())
                    .or_default()
                    .push(orphan.name.clone());
                info!(project = %orphan.name, "Removed orphaned federation rule");
            }
            Err(e) => {
                error!(project = %orphan.name, error = %e, "Failed to remove federation rule");
            }
        }
    }

    // Legacy tag-based scan for projects that predate the registry
    collect_tagged_orphans(ctx, &os, &expected_projects, &mut outcome).await?;

    Ok(outcome)
}

/// Delete tag-marked projects (and their derived groups) in the managed
/// domain that have no corresponding CR.
async fn collect_tagged_orphans(
    ctx: &Context,
    os: &OpenStackClient,
    expected_projects: &HashSet<String>,
    outcome: &mut GcOutcome,
) -> Result<()> {
    let managed_domain = &ctx.config.managed_domain;
    let Some(domain) = os.get_domain(managed_domain).await? else {
        warn!(domain = %managed_domain, "Domain not found, skipping tag scan");
        return Ok(());
    };

    let projects = os.list_projects_with_tag(&domain.id, MANAGED_BY_TAG).await?;
    debug!(
        count = projects.len(),
        domain = %managed_domain,
        "Found operator-managed projects"
    );

    for project in projects {
        if expected_projects.contains(&project.name) {
            continue;
        }
        info!(project = %project.name, domain = %managed_domain, "Found orphaned tagged project");

        let group = group_name(&project.name);
        match os.get_group(&group, managed_domain).await {
            Ok(Some(existing)) => match os.delete_group(&existing.id).await {
                Ok(()) => {
                    PROJECT_GC_DELETED_RESOURCES
                        .with_label_values(&["group"])
                        .inc();
                    outcome
                        .entry("groups".to_string())
                        .or_default()
                        .push(group.clone());
                    info!(group = %group, "Deleted orphaned group");
                }
                Err(e) => error!(group = %group, error = %e, "Failed to delete group"),
            },
            Ok(None) => {}
            Err(e) => error!(group = %group, error = %e, "Failed to look up group"),
        }

        match os.delete_project(&project.id).await {
            Ok(()) => {
                PROJECT_GC_DELETED_RESOURCES
                    .with_label_values(&["project"])
                    .inc();
                outcome
                    .entry("projects".to_string())
                    .or_default()
                    .push(project.name.clone());
                info!(project = %project.name, "Deleted orphaned project");
            }
            Err(e) => error!(project = %project.name, error = %e, "Failed to delete project"),
        }
    }

    Ok(())
}
