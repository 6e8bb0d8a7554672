// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! `OpenstackFlavor` reconciliation.
//!
//! Core flavor attributes are immutable at the remote. The update path
//! consults [`flavor_needs_recreate`] against the live flavor and branches
//! between delete-then-create (condition reason `Recreated`) and an
//! in-place extra-specs update.

use crate::constants::{DRIFT_CHECK_INTERVAL_SECS, KIND_FLAVOR};
use crate::context::Context;
use crate::crd::{OpenstackFlavor, OpenstackFlavorStatus, Phase};
use crate::errors::Error;
use crate::names::now_iso;
use crate::reconcilers::status::set_condition;
use crate::reconcilers::{publish_warning, truncate_message};
use crate::resources::flavor::{delete_flavor, ensure_flavor, flavor_needs_recreate};
use kube::api::{Api, Patch, PatchParams};
use kube::runtime::controller::Action;
use kube::ResourceExt;
use serde_json::json;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

async fn patch_status(
    ctx: &Context,
    name: &str,
    status: &OpenstackFlavorStatus,
) -> Result<(), kube::Error> {
    let api: Api<OpenstackFlavor> = Api::all(ctx.client.clone());
    api.patch_status(
        name,
        &PatchParams::default(),
        &Patch::Merge(&json!({"status": status})),
    )
    .await?;
    Ok(())
}

/// Apply handler for `OpenstackFlavor`.
pub async fn reconcile(
    ctx: Arc<Context>,
    flavor: Arc<OpenstackFlavor>,
) -> Result<Action, Error> {
    let name = flavor.name_any();
    let mut status = flavor.status.clone().unwrap_or_default();

    let generation_changed = flavor.metadata.generation != status.observed_generation;
    if status.flavor_id.is_some() && !generation_changed && status.phase == Phase::Ready {
        debug!("Reconciling OpenstackFlavor: {name}");
        let result = check_drift(&ctx, &flavor, &mut status).await;
        patch_status(&ctx, &name, &status).await?;
        result?;
        let delay = if status.phase == Phase::Ready {
            DRIFT_CHECK_INTERVAL_SECS
        } else {
            1
        };
        return Ok(Action::requeue(Duration::from_secs(delay)));
    }

    let operation = if status.flavor_id.is_none() {
        "create"
    } else {
        "update"
    };
    info!("Reconciling OpenstackFlavor: {name} ({operation})");

    let start = Instant::now();
    let result = apply(&ctx, &flavor, &mut status, operation).await;

    if let Err(e) = &result {
        status.phase = Phase::Error;
        set_condition(
            &mut status.conditions,
            "FlavorReady",
            "False",
            "Error",
            &truncate_message(&e.to_string()),
        );
    }
    patch_status(&ctx, &name, &status).await?;

    let duration = start.elapsed();
    match result {
        Ok(()) => {
            crate::metrics::record_reconcile(KIND_FLAVOR, operation, "success", duration);
            info!("Successfully reconciled OpenstackFlavor: {name}");
            Ok(Action::requeue(Duration::from_secs(
                DRIFT_CHECK_INTERVAL_SECS,
            )))
        }
        Err(e) => {
            crate::metrics::record_reconcile(KIND_FLAVOR, operation, e.status_label(), duration);
            let reason = if operation == "create" {
                "CreateFailed"
            } else {
                "UpdateFailed"
            };
            publish_warning(&ctx.client, flavor.as_ref(), reason, &e.to_string()).await;
            Err(e)
        }
    }
}

async fn apply(
    ctx: &Context,
    flavor: &OpenstackFlavor,
    status: &mut OpenstackFlavorStatus,
    operation: &str,
) -> Result<(), Error> {
    let spec = &flavor.spec;
    let cr_name = flavor.name_any();

    status.phase = Phase::Provisioning;
    status.observed_generation = flavor.metadata.generation;

    if spec.name.is_empty() {
        return Err(Error::Permanent("spec.name is required".to_string()));
    }

    let os = ctx.openstack().await?;
    let registry = ctx.registry().await;

    if operation == "create" || status.flavor_id.is_none() {
        set_condition(&mut status.conditions, "FlavorReady", "False", "Creating", "");
        let flavor_id = ensure_flavor(&os, spec).await?;
        registry
            .register("flavors", &spec.name, &flavor_id, &cr_name, None)
            .await?;
        status.flavor_id = Some(flavor_id);
        set_condition(&mut status.conditions, "FlavorReady", "True", "Created", "");
    } else {
        let flavor_id = status.flavor_id.clone().unwrap_or_default();
        let remote = os.get_flavor(&spec.name).await?;

        match remote {
            Some(remote) if flavor_needs_recreate(spec, &remote) => {
                info!(
                    flavor = %spec.name,
                    "Flavor requires recreate due to immutable property change"
                );
                delete_flavor(&os, &flavor_id).await?;
                registry.unregister("flavors", &spec.name).await?;

                let new_flavor_id = ensure_flavor(&os, spec).await?;
                registry
                    .register("flavors", &spec.name, &new_flavor_id, &cr_name, None)
                    .await?;
                status.flavor_id = Some(new_flavor_id);
                set_condition(&mut status.conditions, "FlavorReady", "True", "Recreated", "");
            }
            Some(_) => {
                // Only extra specs can change in place
                os.set_flavor_extra_specs(&flavor_id, &spec.extra_specs)
                    .await?;
                set_condition(&mut status.conditions, "FlavorReady", "True", "Updated", "");
            }
            None => {
                // Remote flavor vanished; recreate from spec
                let flavor_id = ensure_flavor(&os, spec).await?;
                registry
                    .register("flavors", &spec.name, &flavor_id, &cr_name, None)
                    .await?;
                status.flavor_id = Some(flavor_id);
                set_condition(&mut status.conditions, "FlavorReady", "True", "Created", "");
            }
        }
    }

    status.phase = Phase::Ready;
    status.last_sync_time = Some(now_iso());
    Ok(())
}

async fn check_drift(
    ctx: &Context,
    flavor: &OpenstackFlavor,
    status: &mut OpenstackFlavorStatus,
) -> Result<(), Error> {
    let os = ctx.openstack().await?;

    let Some(remote) = os.get_flavor(&flavor.spec.name).await? else {
        warn!(flavor = %flavor.spec.name, "Flavor not found, triggering recreate");
        status.phase = Phase::Pending;
        status.flavor_id = None;
        return Ok(());
    };

    if Some(remote.id.as_str()) != status.flavor_id.as_deref() {
        warn!(flavor = %flavor.spec.name, "Flavor ID mismatch");
        status.phase = Phase::Pending;
        status.flavor_id = Some(remote.id);
        return Ok(());
    }

    status.last_sync_time = Some(now_iso());
    Ok(())
}

/// Cleanup handler for `OpenstackFlavor`.
pub async fn cleanup(
    ctx: Arc<Context>,
    flavor: Arc<OpenstackFlavor>,
) -> Result<Action, Error> {
    let name = flavor.name_any();
    info!("Deleting OpenstackFlavor: {name}");

    let start = Instant::now();
    let result = teardown(&ctx, &flavor).await;
    let duration = start.elapsed();

    match result {
        Ok(()) => {
            crate::metrics::record_reconcile(KIND_FLAVOR, "delete", "success", duration);
            info!("Successfully deleted OpenstackFlavor: {name}");
            Ok(Action::await_change())
        }
        Err(e) => {
            crate::metrics::record_reconcile(KIND_FLAVOR, "delete", e.status_label(), duration);
            publish_warning(&ctx.client, flavor.as_ref(), "DeleteFailed", &e.to_string()).await;
            Err(e)
        }
    }
}

async fn teardown(ctx: &Context, flavor: &OpenstackFlavor) -> Result<(), Error> {
    let status = flavor.status.clone().unwrap_or_default();
    let registry = ctx.registry().await;

    match &status.flavor_id {
        Some(flavor_id) => {
            let os = ctx.openstack().await?;
            delete_flavor(&os, flavor_id).await?;
        }
        None => warn!(
            "No flavorId in status for {}, nothing to delete remotely",
            flavor.name_any()
        ),
    }

    registry.unregister("flavors", &flavor.spec.name).await?;
    Ok(())
}
