// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Quota application for projects.
//!
//! Three independent sub-calls (compute, storage, network); absent sub-maps
//! are skipped. Field-name translation happens in the client layer.

use crate::crd::ProjectQuotas;
use crate::openstack::OpenStackClient;
use anyhow::Result;
use tracing::debug;

/// Apply the quota sub-maps present in the spec to a project.
pub async fn apply_quotas(
    os: &OpenStackClient,
    project_id: &str,
    quotas: &ProjectQuotas,
) -> Result<()> {
    if let Some(compute) = &quotas.compute {
        os.set_compute_quotas(project_id, compute).await?;
    }
    if let Some(storage) = &quotas.storage {
        os.set_volume_quotas(project_id, storage).await?;
    }
    if let Some(network) = &quotas.network {
        os.set_network_quotas(project_id, network).await?;
    }
    if quotas.compute.is_none() && quotas.storage.is_none() && quotas.network.is_none() {
        debug!(project_id, "No quotas specified");
    }
    Ok(())
}
