// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Glance operations: image metadata, asynchronous web-download imports and
//! property updates.
//!
//! Glance updates use the JSON-patch media type; the helper below computes
//! the patch from the desired settings. Protected images are unprotected
//! before deletion.

use super::error::{check_response, OpenStackError};
use super::identity::swallow_not_found;
use super::types::{Image, ImageCreate, ImageListEnvelope, ImageSettings};
use super::{OpenStackClient, SERVICE_IMAGE};
use reqwest::Method;
use serde_json::json;
use tracing::info;

const GLANCE_PATCH_CONTENT_TYPE: &str = "application/openstack-images-v2.1-json-patch";

impl OpenStackClient {
    /// Find an image by name.
    pub async fn get_image(&self, name: &str) -> Result<Option<Image>, OpenStackError> {
        self.call(SERVICE_IMAGE, "get_image", || async {
            let resp = self
                .request(Method::GET, SERVICE_IMAGE, "v2/images")
                .await?
                .query(&[("name", name)])
                .send()
                .await?;
            let list: ImageListEnvelope = check_response(resp).await?.json().await?;
            Ok(list.images.into_iter().next())
        })
        .await
    }

    pub async fn get_image_by_id(&self, image_id: &str) -> Result<Option<Image>, OpenStackError> {
        let path = format!("v2/images/{image_id}");
        self.call(SERVICE_IMAGE, "get_image_by_id", || async {
            let resp = self
                .request(Method::GET, SERVICE_IMAGE, &path)
                .await?
                .send()
                .await?;
            match check_response(resp).await {
                Ok(resp) => Ok(Some(resp.json().await?)),
                Err(e) if e.is_not_found() => Ok(None),
                Err(e) => Err(e),
            }
        })
        .await
    }

    /// Create image metadata; the payload arrives separately via import.
    pub async fn create_image(&self, create: &ImageCreate) -> Result<Image, OpenStackError> {
        info!(image = %create.name, "Creating image");
        self.call(SERVICE_IMAGE, "create_image", || async {
            let mut body = json!({
                "name": create.name,
                "disk_format": create.disk_format,
                "container_format": create.container_format,
                "visibility": create.visibility,
                "protected": create.protected,
                "tags": create.tags,
            });
            // Free-form properties ride along as top-level keys
            for (key, value) in &create.properties {
                body[key] = json!(value);
            }

            let resp = self
                .request(Method::POST, SERVICE_IMAGE, "v2/images")
                .await?
                .json(&body)
                .send()
                .await?;
            Ok(check_response(resp).await?.json().await?)
        })
        .await
    }

    /// Start an asynchronous server-side fetch of the image payload.
    pub async fn import_image_from_url(
        &self,
        image_id: &str,
        url: &str,
    ) -> Result<(), OpenStackError> {
        info!(image_id, url, "Starting web-download import");
        let path = format!("v2/images/{image_id}/import");
        self.call(SERVICE_IMAGE, "import_image_from_url", || async {
            let resp = self
                .request(Method::POST, SERVICE_IMAGE, &path)
                .await?
                .json(&json!({"method": {"name": "web-download", "uri": url}}))
                .send()
                .await?;
            check_response(resp).await?;
            Ok(())
        })
        .await
    }

    /// Assert visibility, protected flag, tags and properties on an image.
    pub async fn update_image(
        &self,
        image_id: &str,
        settings: &ImageSettings,
    ) -> Result<(), OpenStackError> {
        info!(image_id, "Updating image settings");
        let patch = image_settings_patch(settings);
        let path = format!("v2/images/{image_id}");
        self.call(SERVICE_IMAGE, "update_image", || async {
            let resp = self
                .request(Method::PATCH, SERVICE_IMAGE, &path)
                .await?
                .header("Content-Type", GLANCE_PATCH_CONTENT_TYPE)
                .json(&patch)
                .send()
                .await?;
            check_response(resp).await?;
            Ok(())
        })
        .await
    }

    /// Delete an image, lifting the protected flag first when set.
    pub async fn delete_image(&self, image_id: &str) -> Result<(), OpenStackError> {
        info!(image_id, "Deleting image");

        if let Some(image) = self.get_image_by_id(image_id).await? {
            if image.protected {
                let path = format!("v2/images/{image_id}");
                self.call(SERVICE_IMAGE, "unprotect_image", || async {
                    let resp = self
                        .request(Method::PATCH, SERVICE_IMAGE, &path)
                        .await?
                        .header("Content-Type", GLANCE_PATCH_CONTENT_TYPE)
                        .json(&json!([
                            {"op": "replace", "path": "/protected", "value": false}
                        ]))
                        .send()
                        .await?;
                    check_response(resp).await?;
                    Ok(())
                })
                .await?;
            }
        }

        let path = format!("v2/images/{image_id}");
        let result = self
            .call(SERVICE_IMAGE, "delete_image", || async {
                let resp = self
                    .request(Method::DELETE, SERVICE_IMAGE, &path)
                    .await?
                    .send()
                    .await?;
                check_response(resp).await?;
                Ok(())
            })
            .await;
        swallow_not_found(result)
    }
}

/// Build the Glance JSON patch for the mutable image settings.
fn image_settings_patch(settings: &ImageSettings) -> serde_json::Value {
    let mut ops = vec![
        json!({"op": "replace", "path": "/visibility", "value": settings.visibility}),
        json!({"op": "replace", "path": "/protected", "value": settings.protected}),
        json!({"op": "replace", "path": "/tags", "value": settings.tags}),
    ];
    for (key, value) in &settings.properties {
        ops.push(json!({"op": "add", "path": format!("/{key}"), "value": value}));
    }
    serde_json::Value::Array(ops)
}

#[cfg(test)]
mod tests {
    use super::image_settings_patch;
    use crate::openstack::types::ImageSettings;
    use std::collections::BTreeMap;

    #[test]
    fn test_settings_patch_covers_all_mutable_fields() {
        let mut properties = BTreeMap::new();
        properties.insert("os_distro".to_string(), "debian".to_string());

        let patch = image_settings_patch(&ImageSettings {
            visibility: "public".into(),
            protected: true,
            tags: vec!["lts".into()],
            properties,
        });

        let ops = patch.as_array().unwrap();
        assert_eq!(ops.len(), 4);
        assert_eq!(ops[0]["path"], "/visibility");
        assert_eq!(ops[0]["value"], "public");
        assert_eq!(ops[1]["path"], "/protected");
        assert_eq!(ops[1]["value"], true);
        assert_eq!(ops[2]["path"], "/tags");
        assert_eq!(ops[3]["path"], "/os_distro");
        assert_eq!(ops[3]["op"], "add");
    }
}
