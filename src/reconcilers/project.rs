// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! `OpenstackProject` reconciliation.
//!
//! Create sequence, each step idempotent: project + user group with the
//! implicit member role, quotas, tenant networks, two-pass security groups,
//! role bindings and the federation mapping. Deletion reverses the order.
//! The drift check confirms the remote project still exists and re-ensures
//! the federation rule; a project deleted out-of-band resets the phase to
//! `Pending` and clears the recorded ids so the next pass recreates it.

use crate::constants::{DRIFT_CHECK_INTERVAL_SECS, KIND_PROJECT};
use crate::context::Context;
use crate::crd::{
    NetworkStatus, OpenstackProject, OpenstackProjectSpec, OpenstackProjectStatus, Phase,
};
use crate::errors::Error;
use crate::names::{group_name, is_valid_uuid, now_iso};
use crate::openstack::OpenStackClient;
use crate::reconcilers::status::set_condition;
use crate::reconcilers::{publish_warning, truncate_message};
use crate::registry::Registry;
use crate::resources::federation::{load_federation_config, FederationManager};
use crate::resources::network::{delete_network, delete_networks, ensure_networks};
use crate::resources::project::{delete_project, ensure_project, get_project_info};
use crate::resources::quota::apply_quotas;
use crate::resources::role_binding::{apply_role_bindings, users_from_role_bindings};
use crate::resources::security_group::{delete_security_groups, ensure_security_groups};
use kube::api::{Api, Patch, PatchParams};
use kube::runtime::controller::Action;
use kube::ResourceExt;
use serde_json::json;
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

fn api_for(ctx: &Context, project: &OpenstackProject) -> Api<OpenstackProject> {
    Api::namespaced(
        ctx.client.clone(),
        &project.namespace().unwrap_or_default(),
    )
}

async fn patch_status(
    api: &Api<OpenstackProject>,
    name: &str,
    status: &OpenstackProjectStatus,
) -> Result<(), kube::Error> {
    api.patch_status(
        name,
        &PatchParams::default(),
        &Patch::Merge(&json!({"status": status})),
    )
    .await?;
    Ok(())
}

fn validate(spec: &OpenstackProjectSpec) -> Result<(), Error> {
    if spec.name.is_empty() || spec.domain.is_empty() {
        return Err(Error::Permanent(
            "spec.name and spec.domain are required".to_string(),
        ));
    }
    Ok(())
}

/// Apply handler: dispatches between create, update and the drift check.
pub async fn reconcile(
    ctx: Arc<Context>,
    project: Arc<OpenstackProject>,
) -> Result<Action, Error> {
    let name = project.name_any();
    let namespace = project.namespace().unwrap_or_default();
    let api = api_for(&ctx, &project);
    let mut status = project.status.clone().unwrap_or_default();

    let generation_changed = project.metadata.generation != status.observed_generation;
    if status.project_id.is_some() && !generation_changed && status.phase == Phase::Ready {
        debug!("Reconciling OpenstackProject: {namespace}/{name}");
        let result = check_drift(&ctx, &project, &mut status).await;
        patch_status(&api, &name, &status).await?;
        result?;
        // A drift reset cleared the ids; recreate on the next pass instead
        // of waiting out the full interval
        let delay = if status.phase == Phase::Ready {
            DRIFT_CHECK_INTERVAL_SECS
        } else {
            1
        };
        return Ok(Action::requeue(Duration::from_secs(delay)));
    }

    let operation = if status.project_id.is_none() {
        "create"
    } else {
        "update"
    };
    info!(
        "{} OpenstackProject: {namespace}/{name}",
        if operation == "create" { "Creating" } else { "Updating" }
    );

    let start = Instant::now();
    let result = if operation == "create" {
        create(&ctx, &project, &mut status).await
    } else {
        update(&ctx, &project, &mut status).await
    };

    if let Err(e) = &result {
        status.phase = Phase::Error;
        set_condition(
            &mut status.conditions,
            "Ready",
            "False",
            "Error",
            &truncate_message(&e.to_string()),
        );
    }
    patch_status(&api, &name, &status).await?;

    let duration = start.elapsed();
    match result {
        Ok(()) => {
            crate::metrics::record_reconcile(KIND_PROJECT, operation, "success", duration);
            info!("Successfully reconciled OpenstackProject: {namespace}/{name}");
            Ok(Action::requeue(Duration::from_secs(
                DRIFT_CHECK_INTERVAL_SECS,
            )))
        }
        Err(e) => {
            crate::metrics::record_reconcile(KIND_PROJECT, operation, e.status_label(), duration);
            let reason = if operation == "create" {
                "CreateFailed"
            } else {
                "UpdateFailed"
            };
            publish_warning(&ctx.client, project.as_ref(), reason, &e.to_string()).await;
            Err(e)
        }
    }
}

/// Full create sequence; every step finds before it creates.
async fn create(
    ctx: &Context,
    project: &OpenstackProject,
    status: &mut OpenstackProjectStatus,
) -> Result<(), Error> {
    let spec = &project.spec;
    let cr_name = project.name_any();
    let namespace = project.namespace().unwrap_or_default();

    status.phase = Phase::Provisioning;
    status.observed_generation = project.metadata.generation;
    status.conditions.clear();

    validate(spec)?;

    let os = ctx.openstack().await?;
    let registry = ctx.registry().await;
    let description = spec.description.clone().unwrap_or_default();

    // 1. Project and user group
    set_condition(&mut status.conditions, "ProjectReady", "False", "Creating", "");
    let (project_id, group_id) =
        ensure_project(&os, &spec.name, &spec.domain, &description, spec.enabled).await?;
    status.project_id = Some(project_id.clone());
    status.group_id = Some(group_id.clone());
    registry
        .register("projects", &spec.name, &project_id, &cr_name, None)
        .await?;
    registry
        .register("groups", &group_name(&spec.name), &group_id, &cr_name, None)
        .await?;
    set_condition(&mut status.conditions, "ProjectReady", "True", "Created", "");

    // 2. Quotas
    if let Some(quotas) = &spec.quotas {
        set_condition(&mut status.conditions, "QuotasReady", "False", "Applying", "");
        apply_quotas(&os, &project_id, quotas).await?;
        set_condition(&mut status.conditions, "QuotasReady", "True", "Applied", "");
    }

    // 3. Networks
    if !spec.networks.is_empty() {
        set_condition(&mut status.conditions, "NetworksReady", "False", "Creating", "");
        let networks = ensure_networks(&os, &project_id, &spec.networks).await?;
        for network in &networks {
            register_network(&registry, network, &cr_name).await?;
        }
        status.networks = networks;
        set_condition(&mut status.conditions, "NetworksReady", "True", "Created", "");
    }

    // 4. Security groups
    if !spec.security_groups.is_empty() {
        set_condition(
            &mut status.conditions,
            "SecurityGroupsReady",
            "False",
            "Creating",
            "",
        );
        let groups = ensure_security_groups(&os, &project_id, &spec.security_groups).await?;
        for group in &groups {
            registry
                .register(
                    "security_groups",
                    &group.name,
                    group.id.as_deref().unwrap_or_default(),
                    &cr_name,
                    None,
                )
                .await?;
        }
        status.security_groups = groups;
        set_condition(
            &mut status.conditions,
            "SecurityGroupsReady",
            "True",
            "Created",
            "",
        );
    }

    // 5. Role bindings
    if !spec.role_bindings.is_empty() {
        apply_role_bindings(
            &os,
            &project_id,
            Some(&group_id),
            &spec.role_bindings,
            &spec.domain,
        )
        .await?;
    }

    // 6. Federation mapping
    if spec.federation_ref.is_some() && !spec.role_bindings.is_empty() {
        if let Some(config) =
            load_federation_config(&ctx.client, &namespace, spec.federation_ref.as_ref()).await?
        {
            set_condition(
                &mut status.conditions,
                "FederationReady",
                "False",
                "Configuring",
                "",
            );
            let users = users_from_role_bindings(&spec.role_bindings);
            if !users.is_empty() {
                let manager = FederationManager::new(&os, &config);
                manager.add_project_mapping(&spec.name, &users).await?;
                register_mapping(&registry, &spec.name, &manager, &config.idp_name, &cr_name)
                    .await?;
            }
            set_condition(
                &mut status.conditions,
                "FederationReady",
                "True",
                "Configured",
                "",
            );
        }
    }

    status.phase = Phase::Ready;
    status.last_sync_time = Some(now_iso());
    Ok(())
}

/// Update path: converges every sub-resource against the current spec.
async fn update(
    ctx: &Context,
    project: &OpenstackProject,
    status: &mut OpenstackProjectStatus,
) -> Result<(), Error> {
    let spec = &project.spec;
    let cr_name = project.name_any();
    let namespace = project.namespace().unwrap_or_default();

    status.phase = Phase::Provisioning;
    status.observed_generation = project.metadata.generation;

    validate(spec)?;

    let os = ctx.openstack().await?;
    let registry = ctx.registry().await;

    // Legacy statuses can carry a group name where the id belongs
    resolve_group_id(&os, spec, status).await?;

    if status.project_id.is_none() {
        // Drift cleared the ids, or the status predates this operator
        return create(ctx, project, status).await;
    }

    let description = spec.description.clone().unwrap_or_default();
    let (project_id, group_id) =
        ensure_project(&os, &spec.name, &spec.domain, &description, spec.enabled).await?;
    status.project_id = Some(project_id.clone());
    status.group_id = Some(group_id.clone());
    registry
        .register("projects", &spec.name, &project_id, &cr_name, None)
        .await?;
    registry
        .register("groups", &group_name(&spec.name), &group_id, &cr_name, None)
        .await?;

    if let Some(quotas) = &spec.quotas {
        apply_quotas(&os, &project_id, quotas).await?;
        set_condition(&mut status.conditions, "QuotasReady", "True", "Updated", "");
    }

    // Networks: drop recorded entries that left the spec, re-ensure the rest
    let desired: HashSet<&str> = spec.networks.iter().map(|n| n.name.as_str()).collect();
    let removed: Vec<NetworkStatus> = status
        .networks
        .iter()
        .filter(|n| !desired.contains(n.name.as_str()))
        .cloned()
        .collect();
    for network in &removed {
        delete_network(&os, network).await;
        registry.unregister("networks", &network.name).await?;
    }
    let networks = ensure_networks(&os, &project_id, &spec.networks).await?;
    for network in &networks {
        register_network(&registry, network, &cr_name).await?;
    }
    status.networks = networks;
    set_condition(&mut status.conditions, "NetworksReady", "True", "Updated", "");

    // Security groups: same converge pattern
    let desired: HashSet<&str> = spec
        .security_groups
        .iter()
        .map(|g| g.name.as_str())
        .collect();
    let removed: Vec<_> = status
        .security_groups
        .iter()
        .filter(|g| !desired.contains(g.name.as_str()))
        .cloned()
        .collect();
    delete_security_groups(&os, &removed).await;
    for group in &removed {
        registry.unregister("security_groups", &group.name).await?;
    }
    let groups = ensure_security_groups(&os, &project_id, &spec.security_groups).await?;
    for group in &groups {
        registry
            .register(
                "security_groups",
                &group.name,
                group.id.as_deref().unwrap_or_default(),
                &cr_name,
                None,
            )
            .await?;
    }
    status.security_groups = groups;
    set_condition(
        &mut status.conditions,
        "SecurityGroupsReady",
        "True",
        "Updated",
        "",
    );

    // Role bindings and federation are always reapplied, repairing state
    // even when the spec did not change
    if !spec.role_bindings.is_empty() {
        apply_role_bindings(
            &os,
            &project_id,
            Some(&group_id),
            &spec.role_bindings,
            &spec.domain,
        )
        .await?;
    }

    if spec.federation_ref.is_some() {
        if let Some(config) =
            load_federation_config(&ctx.client, &namespace, spec.federation_ref.as_ref()).await?
        {
            let users = users_from_role_bindings(&spec.role_bindings);
            let manager = FederationManager::new(&os, &config);
            if users.is_empty() {
                manager.remove_project_mapping(&spec.name).await?;
                registry.unregister("federation_mappings", &spec.name).await?;
            } else {
                manager.add_project_mapping(&spec.name, &users).await?;
                register_mapping(&registry, &spec.name, &manager, &config.idp_name, &cr_name)
                    .await?;
            }
            set_condition(
                &mut status.conditions,
                "FederationReady",
                "True",
                "Updated",
                "",
            );
        }
    }

    status.phase = Phase::Ready;
    status.last_sync_time = Some(now_iso());
    Ok(())
}

/// Periodic drift check for Ready projects.
async fn check_drift(
    ctx: &Context,
    project: &OpenstackProject,
    status: &mut OpenstackProjectStatus,
) -> Result<(), Error> {
    let spec = &project.spec;
    let cr_name = project.name_any();
    let namespace = project.namespace().unwrap_or_default();

    let os = ctx.openstack().await?;

    let Some(info) = get_project_info(&os, &spec.name, &spec.domain).await? else {
        warn!(
            project = %spec.name,
            "Project not found in OpenStack, triggering recreate"
        );
        status.phase = Phase::Pending;
        status.project_id = None;
        status.group_id = None;
        return Ok(());
    };

    if Some(info.project_id.as_str()) != status.project_id.as_deref() {
        warn!(
            project = %spec.name,
            expected = ?status.project_id,
            actual = %info.project_id,
            "Project ID mismatch"
        );
        status.phase = Phase::Pending;
        status.project_id = Some(info.project_id);
        status.group_id = info.group_id;
        return Ok(());
    }

    // Re-ensure federation idempotently; self-heals an out-of-band mapping
    // deletion
    if spec.federation_ref.is_some() && !spec.role_bindings.is_empty() {
        if let Some(config) =
            load_federation_config(&ctx.client, &namespace, spec.federation_ref.as_ref()).await?
        {
            let users = users_from_role_bindings(&spec.role_bindings);
            if !users.is_empty() {
                let registry = ctx.registry().await;
                let manager = FederationManager::new(&os, &config);
                manager.add_project_mapping(&spec.name, &users).await?;
                register_mapping(&registry, &spec.name, &manager, &config.idp_name, &cr_name)
                    .await?;
            }
        }
    }

    status.last_sync_time = Some(now_iso());
    Ok(())
}

/// Cleanup handler: teardown in reverse creation order, warn-and-continue
/// per sub-step, registry entries always removed.
pub async fn cleanup(
    ctx: Arc<Context>,
    project: Arc<OpenstackProject>,
) -> Result<Action, Error> {
    let name = project.name_any();
    let namespace = project.namespace().unwrap_or_default();
    info!("Deleting OpenstackProject: {namespace}/{name}");

    let start = Instant::now();
    let result = teardown(&ctx, &project).await;
    let duration = start.elapsed();

    match result {
        Ok(()) => {
            crate::metrics::record_reconcile(KIND_PROJECT, "delete", "success", duration);
            info!("Successfully deleted OpenstackProject: {namespace}/{name}");
            Ok(Action::await_change())
        }
        Err(e) => {
            crate::metrics::record_reconcile(KIND_PROJECT, "delete", e.status_label(), duration);
            publish_warning(&ctx.client, project.as_ref(), "DeleteFailed", &e.to_string()).await;
            Err(e)
        }
    }
}

async fn teardown(ctx: &Context, project: &OpenstackProject) -> Result<(), Error> {
    let spec = &project.spec;
    let namespace = project.namespace().unwrap_or_default();
    let status = project.status.clone().unwrap_or_default();

    let os = ctx.openstack().await?;
    let registry = ctx.registry().await;

    // 1. This project's federation rule; the shared document stays
    if spec.federation_ref.is_some() {
        if let Some(config) =
            load_federation_config(&ctx.client, &namespace, spec.federation_ref.as_ref()).await?
        {
            FederationManager::new(&os, &config)
                .remove_project_mapping(&spec.name)
                .await?;
        }
    }
    registry.unregister("federation_mappings", &spec.name).await?;

    // 2. Security groups
    delete_security_groups(&os, &status.security_groups).await;
    for group in &status.security_groups {
        registry.unregister("security_groups", &group.name).await?;
    }

    // 3. Networks (interface → router → subnet → network)
    delete_networks(&os, &status.networks).await;
    for network in &status.networks {
        registry.unregister("networks", &network.name).await?;
    }

    // 4. Project and group
    match &status.project_id {
        Some(project_id) => {
            delete_project(&os, project_id, status.group_id.as_deref()).await?;
        }
        None => warn!(
            "No projectId in status for {}/{}, nothing to delete remotely",
            namespace,
            project.name_any()
        ),
    }
    registry.unregister("groups", &group_name(&spec.name)).await?;
    registry.unregister("projects", &spec.name).await?;

    Ok(())
}

/// Repair a `groupId` that is not a valid UUID, or points at a group that
/// no longer exists, by resolving the derived group name.
async fn resolve_group_id(
    os: &OpenStackClient,
    spec: &OpenstackProjectSpec,
    status: &mut OpenstackProjectStatus,
) -> Result<(), Error> {
    let Some(stored) = status.group_id.clone() else {
        return Ok(());
    };

    if is_valid_uuid(&stored) {
        if os.get_group_by_id(&stored).await?.is_some() {
            return Ok(());
        }
        warn!(group_id = %stored, "Group not found by id, resolving by name");
    } else {
        info!(stored = %stored, "Stored groupId is not a UUID, resolving by name");
    }

    let expected = group_name(&spec.name);
    match os.get_group(&expected, &spec.domain).await? {
        Some(group) => {
            info!(group = %expected, id = %group.id, "Resolved group, correcting stored value");
            status.group_id = Some(group.id);
        }
        None => {
            warn!(
                project = %spec.name,
                expected_group = %expected,
                "Could not resolve group for project"
            );
            status.group_id = None;
        }
    }
    Ok(())
}

async fn register_network(
    registry: &Registry,
    network: &NetworkStatus,
    cr_name: &str,
) -> Result<(), Error> {
    let mut extra = BTreeMap::new();
    if let Some(subnet_id) = &network.subnet_id {
        extra.insert("subnet_id".to_string(), json!(subnet_id));
    }
    if let Some(router_id) = &network.router_id {
        extra.insert("router_id".to_string(), json!(router_id));
    }
    registry
        .register(
            "networks",
            &network.name,
            network.network_id.as_deref().unwrap_or_default(),
            cr_name,
            Some(extra),
        )
        .await?;
    Ok(())
}

async fn register_mapping(
    registry: &Registry,
    project_name: &str,
    manager: &FederationManager<'_>,
    idp_name: &str,
    cr_name: &str,
) -> Result<(), Error> {
    let mut extra = BTreeMap::new();
    extra.insert("idp_name".to_string(), json!(idp_name));
    registry
        .register(
            "federation_mappings",
            project_name,
            manager.mapping_name(),
            cr_name,
            Some(extra),
        )
        .await?;
    Ok(())
}
