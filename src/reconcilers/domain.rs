// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! `OpenstackDomain` reconciliation.
//!
//! Domains update in place for description/enabled and must be disabled
//! before deletion (the client handles the disable).

use crate::constants::{DRIFT_CHECK_INTERVAL_SECS, KIND_DOMAIN};
use crate::context::Context;
use crate::crd::{OpenstackDomain, OpenstackDomainStatus, Phase};
use crate::errors::Error;
use crate::names::now_iso;
use crate::reconcilers::status::set_condition;
use crate::reconcilers::{publish_warning, truncate_message};
use crate::resources::domain::{delete_domain, ensure_domain, get_domain_info};
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
    status: &OpenstackDomainStatus,
) -> Result<(), kube::Error> {
    let api: Api<OpenstackDomain> = Api::all(ctx.client.clone());
    api.patch_status(
        name,
        &PatchParams::default(),
        &Patch::Merge(&json!({"status": status})),
    )
    .await?;
    Ok(())
}

/// Apply handler for `OpenstackDomain`.
pub async fn reconcile(
    ctx: Arc<Context>,
    domain: Arc<OpenstackDomain>,
) -> Result<Action, Error> {
    let name = domain.name_any();
    let mut status = domain.status.clone().unwrap_or_default();

    let generation_changed = domain.metadata.generation != status.observed_generation;
    if status.domain_id.is_some() && !generation_changed && status.phase == Phase::Ready {
        debug!("Reconciling OpenstackDomain: {name}");
        let result = check_drift(&ctx, &domain, &mut status).await;
        patch_status(&ctx, &name, &status).await?;
        result?;
        let delay = if status.phase == Phase::Ready {
            DRIFT_CHECK_INTERVAL_SECS
        } else {
            1
        };
        return Ok(Action::requeue(Duration::from_secs(delay)));
    }

    let operation = if status.domain_id.is_none() {
        "create"
    } else {
        "update"
    };
    info!("Reconciling OpenstackDomain: {name} ({operation})");

    let start = Instant::now();
    let result = apply(&ctx, &domain, &mut status, operation).await;

    if let Err(e) = &result {
        status.phase = Phase::Error;
        set_condition(
            &mut status.conditions,
            "DomainReady",
            "False",
            "Error",
            &truncate_message(&e.to_string()),
        );
    }
    patch_status(&ctx, &name, &status).await?;

    let duration = start.elapsed();
    match result {
        Ok(()) => {
            crate::metrics::record_reconcile(KIND_DOMAIN, operation, "success", duration);
            info!("Successfully reconciled OpenstackDomain: {name}");
            Ok(Action::requeue(Duration::from_secs(
                DRIFT_CHECK_INTERVAL_SECS,
            )))
        }
        Err(e) => {
            crate::metrics::record_reconcile(KIND_DOMAIN, operation, e.status_label(), duration);
            let reason = if operation == "create" {
                "CreateFailed"
            } else {
                "UpdateFailed"
            };
            publish_warning(&ctx.client, domain.as_ref(), reason, &e.to_string()).await;
            Err(e)
        }
    }
}

async fn apply(
    ctx: &Context,
    domain: &OpenstackDomain,
    status: &mut OpenstackDomainStatus,
    operation: &str,
) -> Result<(), Error> {
    let spec = &domain.spec;
    let cr_name = domain.name_any();

    status.phase = Phase::Provisioning;
    status.observed_generation = domain.metadata.generation;

    if spec.name.is_empty() {
        return Err(Error::Permanent("spec.name is required".to_string()));
    }

    let os = ctx.openstack().await?;
    let registry = ctx.registry().await;

    set_condition(&mut status.conditions, "DomainReady", "False", "Creating", "");

    let domain_id = ensure_domain(&os, &spec.name, &spec.description, spec.enabled).await?;
    registry
        .register("domains", &spec.name, &domain_id, &cr_name, None)
        .await?;
    status.domain_id = Some(domain_id);

    let reason = if operation == "create" { "Created" } else { "Updated" };
    set_condition(&mut status.conditions, "DomainReady", "True", reason, "");
    status.phase = Phase::Ready;
    status.last_sync_time = Some(now_iso());
    Ok(())
}

async fn check_drift(
    ctx: &Context,
    domain: &OpenstackDomain,
    status: &mut OpenstackDomainStatus,
) -> Result<(), Error> {
    let os = ctx.openstack().await?;

    let Some(info) = get_domain_info(&os, &domain.spec.name).await? else {
        warn!(domain = %domain.spec.name, "Domain not found, triggering recreate");
        status.phase = Phase::Pending;
        status.domain_id = None;
        return Ok(());
    };

    if Some(info.domain_id.as_str()) != status.domain_id.as_deref() {
        warn!(domain = %domain.spec.name, "Domain ID mismatch");
        status.phase = Phase::Pending;
        status.domain_id = Some(info.domain_id);
        return Ok(());
    }

    status.last_sync_time = Some(now_iso());
    Ok(())
}

/// Cleanup handler for `OpenstackDomain`.
pub async fn cleanup(
    ctx: Arc<Context>,
    domain: Arc<OpenstackDomain>,
) -> Result<Action, Error> {
    let name = domain.name_any();
    info!("Deleting OpenstackDomain: {name}");

    let start = Instant::now();
    let result = teardown(&ctx, &domain).await;
    let duration = start.elapsed();

    match result {
        Ok(()) => {
            crate::metrics::record_reconcile(KIND_DOMAIN, "delete", "success", duration);
            info!("Successfully deleted OpenstackDomain: {name}");
            Ok(Action::await_change())
        }
        Err(e) => {
            crate::metrics::record_reconcile(KIND_DOMAIN, "delete", e.status_label(), duration);
            publish_warning(&ctx.client, domain.as_ref(), "DeleteFailed", &e.to_string()).await;
            Err(e)
        }
    }
}

async fn teardown(ctx: &Context, domain: &OpenstackDomain) -> Result<(), Error> {
    let status = domain.status.clone().unwrap_or_default();
    let registry = ctx.registry().await;

    match &status.domain_id {
        Some(domain_id) => {
            let os = ctx.openstack().await?;
            delete_domain(&os, domain_id).await?;
        }
        None => warn!(
            "No domainId in status for {}, nothing to delete remotely",
            domain.name_any()
        ),
    }

    registry.unregister("domains", &domain.spec.name).await?;
    Ok(())
}
