// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Identity domain management.

use crate::openstack::OpenStackClient;
use anyhow::Result;
use tracing::info;

/// Remote state of a domain, as needed by the drift check.
#[derive(Clone, Debug)]
pub struct DomainInfo {
    pub domain_id: String,
    pub description: Option<String>,
    pub enabled: bool,
}

/// Ensure a domain exists with the given configuration; returns its id.
pub async fn ensure_domain(
    os: &OpenStackClient,
    name: &str,
    description: &str,
    enabled: bool,
) -> Result<String> {
    if let Some(existing) = os.get_domain(name).await? {
        info!(domain = name, id = %existing.id, "Domain already exists");
        if existing.description.as_deref().unwrap_or_default() != description
            || existing.enabled != enabled
        {
            os.update_domain(&existing.id, description, enabled).await?;
        }
        return Ok(existing.id);
    }

    let domain = os.create_domain(name, description, enabled).await?;
    info!(domain = name, id = %domain.id, "Created domain");
    Ok(domain.id)
}

/// Delete a domain. The client disables it first, as Keystone requires.
pub async fn delete_domain(os: &OpenStackClient, domain_id: &str) -> Result<()> {
    os.delete_domain(domain_id).await?;
    Ok(())
}

/// Look up a domain by name; `None` when absent.
pub async fn get_domain_info(os: &OpenStackClient, name: &str) -> Result<Option<DomainInfo>> {
    Ok(os.get_domain(name).await?.map(|domain| DomainInfo {
        domain_id: domain.id,
        description: domain.description,
        enabled: domain.enabled,
    }))
}
