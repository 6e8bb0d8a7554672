// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! `OpenstackNetwork` (provider network) reconciliation.
//!
//! Provider attributes and subnet layout are immutable; any change to them
//! triggers delete-then-recreate of the whole network with its subnets
//! first (condition reason `Recreated`).

use crate::constants::{DRIFT_CHECK_INTERVAL_SECS, KIND_NETWORK};
use crate::context::Context;
use crate::crd::{OpenstackNetwork, OpenstackNetworkStatus, Phase};
use crate::errors::Error;
use crate::names::now_iso;
use crate::reconcilers::status::set_condition;
use crate::reconcilers::{publish_warning, truncate_message};
use crate::registry::Registry;
use crate::resources::provider_network::{
    delete_provider_network, ensure_provider_network, get_provider_network_info,
    provider_network_needs_recreate, ProviderNetworkInfo,
};
use kube::api::{Api, Patch, PatchParams};
use kube::runtime::controller::Action;
use kube::ResourceExt;
use serde_json::json;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

async fn patch_status(
    ctx: &Context,
    name: &str,
    status: &OpenstackNetworkStatus,
) -> Result<(), kube::Error> {
    let api: Api<OpenstackNetwork> = Api::all(ctx.client.clone());
    api.patch_status(
        name,
        &PatchParams::default(),
        &Patch::Merge(&json!({"status": status})),
    )
    .await?;
    Ok(())
}

fn subnet_ids(status: &OpenstackNetworkStatus) -> Vec<String> {
    status
        .subnets
        .iter()
        .filter_map(|s| s.subnet_id.clone())
        .collect()
}

async fn register(
    registry: &Registry,
    name: &str,
    info: &ProviderNetworkInfo,
    cr_name: &str,
) -> Result<(), Error> {
    let ids: Vec<String> = info
        .subnets
        .iter()
        .filter_map(|s| s.subnet_id.clone())
        .collect();
    let mut extra = BTreeMap::new();
    extra.insert("subnets".to_string(), json!(ids));
    registry
        .register("provider_networks", name, &info.network_id, cr_name, Some(extra))
        .await?;
    Ok(())
}

/// Apply handler for `OpenstackNetwork`.
pub async fn reconcile(
    ctx: Arc<Context>,
    network: Arc<OpenstackNetwork>,
) -> Result<Action, Error> {
    let name = network.name_any();
    let mut status = network.status.clone().unwrap_or_default();

    let generation_changed = network.metadata.generation != status.observed_generation;
    if status.network_id.is_some() && !generation_changed && status.phase == Phase::Ready {
        debug!("Reconciling OpenstackNetwork: {name}");
        let result = check_drift(&ctx, &network, &mut status).await;
        patch_status(&ctx, &name, &status).await?;
        result?;
        let delay = if status.phase == Phase::Ready {
            DRIFT_CHECK_INTERVAL_SECS
        } else {
            1
        };
        return Ok(Action::requeue(Duration::from_secs(delay)));
    }

    let operation = if status.network_id.is_none() {
        "create"
    } else {
        "update"
    };
    info!("Reconciling OpenstackNetwork: {name} ({operation})");

    let start = Instant::now();
    let result = apply(&ctx, &network, &mut status, operation).await;

    if let Err(e) = &result {
        status.phase = Phase::Error;
        set_condition(
            &mut status.conditions,
            "NetworkReady",
            "False",
            "Error",
            &truncate_message(&e.to_string()),
        );
    }
    patch_status(&ctx, &name, &status).await?;

    let duration = start.elapsed();
    match result {
        Ok(()) => {
            crate::metrics::record_reconcile(KIND_NETWORK, operation, "success", duration);
            info!("Successfully reconciled OpenstackNetwork: {name}");
            Ok(Action::requeue(Duration::from_secs(
                DRIFT_CHECK_INTERVAL_SECS,
            )))
        }
        Err(e) => {
            crate::metrics::record_reconcile(KIND_NETWORK, operation, e.status_label(), duration);
            let reason = if operation == "create" {
                "CreateFailed"
            } else {
                "UpdateFailed"
            };
            publish_warning(&ctx.client, network.as_ref(), reason, &e.to_string()).await;
            Err(e)
        }
    }
}

async fn apply(
    ctx: &Context,
    network: &OpenstackNetwork,
    status: &mut OpenstackNetworkStatus,
    operation: &str,
) -> Result<(), Error> {
    let spec = &network.spec;
    let cr_name = network.name_any();

    status.phase = Phase::Provisioning;
    status.observed_generation = network.metadata.generation;

    if spec.name.is_empty() {
        return Err(Error::Permanent("spec.name is required".to_string()));
    }

    let os = ctx.openstack().await?;
    let registry = ctx.registry().await;

    if operation == "create" || status.network_id.is_none() {
        set_condition(&mut status.conditions, "NetworkReady", "False", "Creating", "");

        let info = ensure_provider_network(&os, spec).await?;
        register(&registry, &spec.name, &info, &cr_name).await?;
        status.network_id = Some(info.network_id);
        status.subnets = info.subnets;

        set_condition(&mut status.conditions, "NetworkReady", "True", "Created", "");
    } else {
        let network_id = status.network_id.clone().unwrap_or_default();
        let remote = get_provider_network_info(&os, &spec.name).await?;
        let remote_network = os.get_network_by_name(&spec.name).await?;

        let needs_recreate = match (&remote, &remote_network) {
            (Some(info), Some(remote_network)) => {
                provider_network_needs_recreate(spec, remote_network, &info.subnets)
            }
            _ => true,
        };

        if needs_recreate {
            info!(network = %spec.name, "Network requires recreate due to property change");
            delete_provider_network(&os, &network_id, &subnet_ids(status)).await?;
            registry.unregister("provider_networks", &spec.name).await?;

            let info = ensure_provider_network(&os, spec).await?;
            register(&registry, &spec.name, &info, &cr_name).await?;
            status.network_id = Some(info.network_id);
            status.subnets = info.subnets;
            set_condition(&mut status.conditions, "NetworkReady", "True", "Recreated", "");
        } else {
            set_condition(&mut status.conditions, "NetworkReady", "True", "Updated", "");
        }
    }

    status.phase = Phase::Ready;
    status.last_sync_time = Some(now_iso());
    Ok(())
}

async fn check_drift(
    ctx: &Context,
    network: &OpenstackNetwork,
    status: &mut OpenstackNetworkStatus,
) -> Result<(), Error> {
    let os = ctx.openstack().await?;

    let Some(info) = get_provider_network_info(&os, &network.spec.name).await? else {
        warn!(network = %network.spec.name, "Network not found, triggering recreate");
        status.phase = Phase::Pending;
        status.network_id = None;
        status.subnets = Vec::new();
        return Ok(());
    };

    if Some(info.network_id.as_str()) != status.network_id.as_deref() {
        warn!(network = %network.spec.name, "Network ID mismatch");
        status.phase = Phase::Pending;
        status.network_id = Some(info.network_id);
        return Ok(());
    }

    status.last_sync_time = Some(now_iso());
    Ok(())
}

/// Cleanup handler for `OpenstackNetwork`.
pub async fn cleanup(
    ctx: Arc<Context>,
    network: Arc<OpenstackNetwork>,
) -> Result<Action, Error> {
    let name = network.name_any();
    info!("Deleting OpenstackNetwork: {name}");

    let start = Instant::now();
    let result = teardown(&ctx, &network).await;
    let duration = start.elapsed();

    match result {
        Ok(()) => {
            crate::metrics::record_reconcile(KIND_NETWORK, "delete", "success", duration);
            info!("Successfully deleted OpenstackNetwork: {name}");
            Ok(Action::await_change())
        }
        Err(e) => {
            crate::metrics::record_reconcile(KIND_NETWORK, "delete", e.status_label(), duration);
            publish_warning(&ctx.client, network.as_ref(), "DeleteFailed", &e.to_string()).await;
            Err(e)
        }
    }
}

async fn teardown(ctx: &Context, network: &OpenstackNetwork) -> Result<(), Error> {
    let status = network.status.clone().unwrap_or_default();
    let registry = ctx.registry().await;

    match &status.network_id {
        Some(network_id) => {
            let os = ctx.openstack().await?;
            delete_provider_network(&os, network_id, &subnet_ids(&status)).await?;
        }
        None => warn!(
            "No networkId in status for {}, nothing to delete remotely",
            network.name_any()
        ),
    }

    registry
        .unregister("provider_networks", &network.spec.name)
        .await?;
    Ok(())
}
