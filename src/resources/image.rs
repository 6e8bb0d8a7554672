// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Image management.
//!
//! Managed images are created as metadata plus an asynchronous web-download
//! import; callers poll [`get_image_state`] until the remote status goes
//! terminal. External images are never created or deleted, only their
//! settings are asserted.

use crate::crd::OpenstackImageSpec;
use crate::openstack::{ImageCreate, ImageSettings, OpenStackClient};
use anyhow::Result;
use tracing::info;

/// Remote import state of an image.
#[derive(Clone, Debug)]
pub struct ImageState {
    pub status: String,
    pub checksum: Option<String>,
    pub size: Option<i64>,
}

fn settings_from_spec(spec: &OpenstackImageSpec) -> ImageSettings {
    ImageSettings {
        visibility: spec.visibility.clone(),
        protected: spec.protected,
        tags: spec.tags.clone(),
        properties: spec.properties.clone(),
    }
}

/// Ensure a managed image exists, starting the web-download import for
/// fresh images.
///
/// Returns `(image_id, upload_status)`; the import completes asynchronously.
///
/// # Errors
///
/// Fails when `spec.content` is absent; the reconciler validates this
/// before calling.
pub async fn ensure_image(
    os: &OpenStackClient,
    spec: &OpenstackImageSpec,
) -> Result<(String, String)> {
    if let Some(existing) = os.get_image(&spec.name).await? {
        info!(image = %spec.name, id = %existing.id, "Image already exists");
        os.update_image(&existing.id, &settings_from_spec(spec))
            .await?;
        return Ok((existing.id, existing.status));
    }

    let content = spec
        .content
        .as_ref()
        .ok_or_else(|| anyhow::anyhow!("managed image without content"))?;

    let image = os
        .create_image(&ImageCreate {
            name: spec.name.clone(),
            disk_format: content.disk_format.clone(),
            container_format: content.container_format.clone(),
            visibility: spec.visibility.clone(),
            protected: spec.protected,
            tags: spec.tags.clone(),
            properties: spec.properties.clone(),
        })
        .await?;
    info!(image = %spec.name, id = %image.id, "Created image");

    info!(image = %spec.name, url = %content.source.url, "Starting web-download");
    os.import_image_from_url(&image.id, &content.source.url)
        .await?;

    let status = os
        .get_image_by_id(&image.id)
        .await?
        .map_or_else(|| "queued".to_string(), |i| i.status);

    Ok((image.id, status))
}

/// Assert settings on a pre-existing external image.
///
/// Returns `None` when the image does not exist yet; the caller surfaces a
/// temporary error and retries from the timer.
pub async fn ensure_image_settings(
    os: &OpenStackClient,
    spec: &OpenstackImageSpec,
) -> Result<Option<(String, String)>> {
    let Some(existing) = os.get_image(&spec.name).await? else {
        return Ok(None);
    };

    os.update_image(&existing.id, &settings_from_spec(spec))
        .await?;
    Ok(Some((existing.id, existing.status)))
}

/// Current import state of an image; `None` when the image disappeared.
pub async fn get_image_state(
    os: &OpenStackClient,
    image_id: &str,
) -> Result<Option<ImageState>> {
    Ok(os.get_image_by_id(image_id).await?.map(|image| ImageState {
        status: image.status,
        checksum: image.checksum,
        size: image.size,
    }))
}

/// Delete an image; protected images are unprotected by the client first.
pub async fn delete_image(os: &OpenStackClient, image_id: &str) -> Result<()> {
    os.delete_image(image_id).await?;
    Ok(())
}
