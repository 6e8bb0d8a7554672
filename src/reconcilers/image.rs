// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! `OpenstackImage` reconciliation.
//!
//! Two modes governed by `spec.external`. Managed images are created and
//! imported asynchronously via web-download; the status poll (a 30-second
//! requeue while phase is Provisioning or Pending) maps the remote state to
//! the CR: `active` means Ready, `killed` or `deleted` is a permanent
//! failure, anything else stays Provisioning. External images are never
//! created or deleted; only their settings are asserted, and a missing
//! external image parks the CR in Pending with a retried temporary error.

use crate::constants::{DRIFT_CHECK_INTERVAL_SECS, IMAGE_POLL_INTERVAL_SECS, KIND_IMAGE};
use crate::context::Context;
use crate::crd::{OpenstackImage, OpenstackImageStatus, Phase};
use crate::errors::Error;
use crate::names::now_iso;
use crate::openstack::ImageSettings;
use crate::reconcilers::status::set_condition;
use crate::reconcilers::{publish_warning, truncate_message};
use crate::resources::image::{delete_image, ensure_image, ensure_image_settings, get_image_state};
use kube::api::{Api, Patch, PatchParams};
use kube::runtime::controller::Action;
use kube::ResourceExt;
use serde_json::json;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

async fn patch_status(
    ctx: &Context,
    name: &str,
    status: &OpenstackImageStatus,
) -> Result<(), kube::Error> {
    let api: Api<OpenstackImage> = Api::all(ctx.client.clone());
    api.patch_status(
        name,
        &PatchParams::default(),
        &Patch::Merge(&json!({"status": status})),
    )
    .await?;
    Ok(())
}

fn requeue_for(status: &OpenstackImageStatus) -> Action {
    match status.phase {
        Phase::Provisioning | Phase::Pending => {
            Action::requeue(Duration::from_secs(IMAGE_POLL_INTERVAL_SECS))
        }
        _ => Action::requeue(Duration::from_secs(DRIFT_CHECK_INTERVAL_SECS)),
    }
}

fn import_failed(status: &OpenstackImageStatus) -> bool {
    matches!(status.upload_status.as_deref(), Some("killed" | "deleted"))
}

fn settings_from_spec(image: &OpenstackImage) -> ImageSettings {
    ImageSettings {
        visibility: image.spec.visibility.clone(),
        protected: image.spec.protected,
        tags: image.spec.tags.clone(),
        properties: image.spec.properties.clone(),
    }
}

/// Apply handler for `OpenstackImage`.
pub async fn reconcile(ctx: Arc<Context>, image: Arc<OpenstackImage>) -> Result<Action, Error> {
    let name = image.name_any();
    let mut status = image.status.clone().unwrap_or_default();
    let generation_changed = image.metadata.generation != status.observed_generation;

    // Import failures are permanent until the spec changes
    if import_failed(&status) && !generation_changed {
        debug!("OpenstackImage {name} import failed permanently, waiting for spec change");
        return Ok(Action::requeue(Duration::from_secs(
            DRIFT_CHECK_INTERVAL_SECS,
        )));
    }

    // Status poll for a running import
    if !generation_changed
        && status.image_id.is_some()
        && matches!(status.phase, Phase::Provisioning | Phase::Pending)
        && !image.spec.external
    {
        let result = poll_import(&ctx, &image, &mut status).await;
        patch_status(&ctx, &name, &status).await?;
        result?;
        return Ok(requeue_for(&status));
    }

    // Drift check for Ready images
    if status.image_id.is_some() && !generation_changed && status.phase == Phase::Ready {
        debug!("Reconciling OpenstackImage: {name}");
        let result = check_drift(&ctx, &image, &mut status).await;
        patch_status(&ctx, &name, &status).await?;
        result?;
        return Ok(requeue_for(&status));
    }

    let operation = if status.image_id.is_none() {
        "create"
    } else {
        "update"
    };
    info!("Reconciling OpenstackImage: {name} ({operation})");

    let start = Instant::now();
    let result = apply(&ctx, &image, &mut status, operation).await;

    if let Err(e) = &result {
        // A Pending phase means the external image is merely absent; keep it
        if status.phase != Phase::Pending {
            status.phase = Phase::Error;
            set_condition(
                &mut status.conditions,
                "ImageReady",
                "False",
                "Error",
                &truncate_message(&e.to_string()),
            );
        }
    }
    patch_status(&ctx, &name, &status).await?;

    let duration = start.elapsed();
    match result {
        Ok(()) => {
            crate::metrics::record_reconcile(KIND_IMAGE, operation, "success", duration);
            info!("Successfully reconciled OpenstackImage: {name}");
            Ok(requeue_for(&status))
        }
        Err(e) => {
            crate::metrics::record_reconcile(KIND_IMAGE, operation, e.status_label(), duration);
            let reason = if operation == "create" {
                "CreateFailed"
            } else {
                "UpdateFailed"
            };
            publish_warning(&ctx.client, image.as_ref(), reason, &e.to_string()).await;
            Err(e)
        }
    }
}

async fn apply(
    ctx: &Context,
    image: &OpenstackImage,
    status: &mut OpenstackImageStatus,
    operation: &str,
) -> Result<(), Error> {
    let spec = &image.spec;
    let cr_name = image.name_any();

    status.phase = Phase::Provisioning;
    status.observed_generation = image.metadata.generation;

    if spec.name.is_empty() {
        return Err(Error::Permanent("spec.name is required".to_string()));
    }
    if !spec.external && spec.content.is_none() {
        return Err(Error::Permanent(
            "spec.content is required for managed images".to_string(),
        ));
    }

    let os = ctx.openstack().await?;

    if spec.external {
        // External: assert settings on a pre-existing image, never create
        set_condition(&mut status.conditions, "ImageReady", "False", "Configuring", "");

        let Some((image_id, upload_status)) = ensure_image_settings(&os, spec).await? else {
            set_condition(
                &mut status.conditions,
                "ImageReady",
                "False",
                "NotFound",
                &format!("External image '{}' not found in OpenStack", spec.name),
            );
            status.phase = Phase::Pending;
            status.last_sync_time = Some(now_iso());
            warn!(image = %spec.name, "External image not found, will retry");
            return Err(Error::Other(anyhow::anyhow!(
                "external image not found: {}",
                spec.name
            )));
        };

        // External images are not owned, so they are not registered for GC
        status.image_id = Some(image_id);
        status.upload_status = Some(upload_status);
        set_condition(&mut status.conditions, "ImageReady", "True", "Configured", "");
        status.phase = Phase::Ready;
        status.last_sync_time = Some(now_iso());
        return Ok(());
    }

    let registry = ctx.registry().await;

    if operation == "create" || status.image_id.is_none() {
        set_condition(&mut status.conditions, "ImageReady", "False", "Creating", "");

        let (image_id, upload_status) = ensure_image(&os, spec).await?;
        registry
            .register("images", &spec.name, &image_id, &cr_name, None)
            .await?;
        status.image_id = Some(image_id);
        status.upload_status = Some(upload_status.clone());

        if upload_status == "active" {
            set_condition(&mut status.conditions, "ImageReady", "True", "Active", "");
            status.phase = Phase::Ready;
        } else {
            set_condition(
                &mut status.conditions,
                "ImageReady",
                "False",
                "Importing",
                &format!("Image import in progress (status: {upload_status})"),
            );
            // Stay in Provisioning until the poll sees a terminal state
        }
    } else {
        // Only metadata can change in place; a new content URL needs
        // delete-then-recreate by the user
        let image_id = status.image_id.clone().unwrap_or_default();
        os.update_image(&image_id, &settings_from_spec(image)).await?;
        set_condition(&mut status.conditions, "ImageReady", "True", "Updated", "");
        status.phase = Phase::Ready;
    }

    status.last_sync_time = Some(now_iso());
    Ok(())
}

/// Poll the import state of a managed image until it goes terminal.
async fn poll_import(
    ctx: &Context,
    image: &OpenstackImage,
    status: &mut OpenstackImageStatus,
) -> Result<(), Error> {
    let name = image.name_any();
    let os = ctx.openstack().await?;
    let image_id = status.image_id.clone().unwrap_or_default();
    debug!("Polling image status for {name}");

    let Some(state) = get_image_state(&os, &image_id).await? else {
        warn!(image = %name, "Image not found, triggering recreate");
        status.phase = Phase::Pending;
        status.image_id = None;
        status.upload_status = None;
        return Ok(());
    };

    status.upload_status = Some(state.status.clone());
    if state.checksum.is_some() {
        status.checksum = state.checksum;
    }
    if state.size.is_some() {
        status.size_bytes = state.size;
    }

    match state.status.as_str() {
        "active" => {
            info!(image = %name, "Image import completed successfully");
            set_condition(&mut status.conditions, "ImageReady", "True", "Active", "");
            status.phase = Phase::Ready;
        }
        "killed" | "deleted" => {
            error!(image = %name, status = %state.status, "Image import failed");
            set_condition(
                &mut status.conditions,
                "ImageReady",
                "False",
                "ImportFailed",
                &format!("Image status: {}", state.status),
            );
            status.phase = Phase::Error;
        }
        other => {
            set_condition(
                &mut status.conditions,
                "ImageReady",
                "False",
                "Importing",
                &format!("Image status: {other}"),
            );
        }
    }

    status.last_sync_time = Some(now_iso());
    Ok(())
}

async fn check_drift(
    ctx: &Context,
    image: &OpenstackImage,
    status: &mut OpenstackImageStatus,
) -> Result<(), Error> {
    let spec = &image.spec;
    let os = ctx.openstack().await?;

    let Some(remote) = os.get_image(&spec.name).await? else {
        if spec.external {
            warn!(image = %spec.name, "External image not found");
            set_condition(
                &mut status.conditions,
                "ImageReady",
                "False",
                "NotFound",
                &format!("External image '{}' not found in OpenStack", spec.name),
            );
        } else {
            warn!(image = %spec.name, "Image not found, triggering recreate");
        }
        status.phase = Phase::Pending;
        status.image_id = None;
        return Ok(());
    };

    if Some(remote.id.as_str()) != status.image_id.as_deref() {
        warn!(image = %spec.name, "Image ID mismatch");
        status.phase = Phase::Pending;
        status.image_id = Some(remote.id);
        return Ok(());
    }

    // Re-assert settings when the remote drifted
    if remote.visibility.as_deref() != Some(spec.visibility.as_str())
        || remote.protected != spec.protected
    {
        info!(image = %spec.name, "Drift detected, updating settings");
        os.update_image(&remote.id, &settings_from_spec(image)).await?;
    }

    status.last_sync_time = Some(now_iso());
    Ok(())
}

/// Cleanup handler for `OpenstackImage`.
pub async fn cleanup(ctx: Arc<Context>, image: Arc<OpenstackImage>) -> Result<Action, Error> {
    let name = image.name_any();
    info!("Deleting OpenstackImage: {name}");

    if image.spec.external {
        // External images are not owned by the operator
        info!("Skipping deletion of external image {name}");
        return Ok(Action::await_change());
    }

    let start = Instant::now();
    let result = teardown(&ctx, &image).await;
    let duration = start.elapsed();

    match result {
        Ok(()) => {
            crate::metrics::record_reconcile(KIND_IMAGE, "delete", "success", duration);
            info!("Successfully deleted OpenstackImage: {name}");
            Ok(Action::await_change())
        }
        Err(e) => {
            crate::metrics::record_reconcile(KIND_IMAGE, "delete", e.status_label(), duration);
            publish_warning(&ctx.client, image.as_ref(), "DeleteFailed", &e.to_string()).await;
            Err(e)
        }
    }
}

async fn teardown(ctx: &Context, image: &OpenstackImage) -> Result<(), Error> {
    let status = image.status.clone().unwrap_or_default();
    let registry = ctx.registry().await;

    match &status.image_id {
        Some(image_id) => {
            let os = ctx.openstack().await?;
            delete_image(&os, image_id).await?;
        }
        None => warn!(
            "No imageId in status for {}, nothing to delete remotely",
            image.name_any()
        ),
    }

    registry.unregister("images", &image.spec.name).await?;
    Ok(())
}

#[cfg(test)]
#[path = "image_tests.rs"]
mod image_tests;
