// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Flavor management.
//!
//! Flavors are immutable in OpenStack for their core attributes. The
//! recreate predicate compares the spec against the remote flavor over the
//! immutable field set; the update path branches on it between
//! delete-then-create and an in-place extra-specs update.

use crate::crd::OpenstackFlavorSpec;
use crate::openstack::compute::FlavorCreate;
use crate::openstack::{Flavor, OpenStackClient};
use anyhow::Result;
use tracing::info;

/// Ensure a flavor exists; returns its id.
///
/// Extra specs are applied on both the existing and freshly created flavor.
pub async fn ensure_flavor(os: &OpenStackClient, spec: &OpenstackFlavorSpec) -> Result<String> {
    if let Some(existing) = os.get_flavor(&spec.name).await? {
        info!(flavor = %spec.name, id = %existing.id, "Flavor already exists");
        os.set_flavor_extra_specs(&existing.id, &spec.extra_specs)
            .await?;
        return Ok(existing.id);
    }

    let flavor = os
        .create_flavor(&FlavorCreate {
            name: spec.name.clone(),
            vcpus: spec.vcpus,
            ram: spec.ram,
            disk: spec.disk,
            ephemeral: spec.ephemeral,
            swap: spec.swap,
            is_public: spec.is_public,
            description: spec.description.clone(),
        })
        .await?;
    info!(flavor = %spec.name, id = %flavor.id, "Created flavor");

    os.set_flavor_extra_specs(&flavor.id, &spec.extra_specs)
        .await?;
    Ok(flavor.id)
}

/// Delete a flavor.
pub async fn delete_flavor(os: &OpenStackClient, flavor_id: &str) -> Result<()> {
    os.delete_flavor(flavor_id).await?;
    Ok(())
}

/// Whether the spec differs from the remote flavor on an immutable field
/// (vcpus, ram, disk, ephemeral, swap, isPublic).
#[must_use]
pub fn flavor_needs_recreate(spec: &OpenstackFlavorSpec, remote: &Flavor) -> bool {
    spec.vcpus != remote.vcpus
        || spec.ram != remote.ram
        || spec.disk != remote.disk
        || spec.ephemeral != remote.ephemeral
        || spec.swap != remote.swap
        || spec.is_public != remote.is_public
}

#[cfg(test)]
#[path = "flavor_tests.rs"]
mod flavor_tests;
