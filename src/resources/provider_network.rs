// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Provider network management.
//!
//! Provider networks are admin-created and largely immutable: the provider
//! attributes and the subnet layout can only change through
//! delete-then-recreate, subnets first.

use crate::crd::{OpenstackNetworkSpec, ProviderSubnetSpec, ProviderSubnetStatus};
use crate::openstack::{
    AllocationPoolRange, Network, OpenStackClient, ProviderNetworkCreate, SubnetCreate,
};
use anyhow::Result;
use tracing::{info, warn};

/// Remote state of a provider network, as needed by the drift check.
#[derive(Clone, Debug)]
pub struct ProviderNetworkInfo {
    pub network_id: String,
    pub subnets: Vec<ProviderSubnetStatus>,
}

/// Ensure a provider network and its subnets exist.
pub async fn ensure_provider_network(
    os: &OpenStackClient,
    spec: &OpenstackNetworkSpec,
) -> Result<ProviderNetworkInfo> {
    if let Some(existing) = os.get_network_by_name(&spec.name).await? {
        info!(network = %spec.name, id = %existing.id, "Provider network already exists");
        let subnets = subnet_statuses(os, &existing.id).await?;
        return Ok(ProviderNetworkInfo {
            network_id: existing.id,
            subnets,
        });
    }

    let network = os
        .create_provider_network(&ProviderNetworkCreate {
            name: spec.name.clone(),
            network_type: spec.provider_network_type.clone(),
            physical_network: spec.provider_physical_network.clone(),
            segmentation_id: spec.provider_segmentation_id,
            external: spec.external,
            shared: spec.shared,
            description: spec.description.clone(),
        })
        .await?;
    info!(network = %spec.name, id = %network.id, "Created provider network");

    let mut subnets = Vec::with_capacity(spec.subnets.len());
    for subnet_spec in &spec.subnets {
        subnets.push(ensure_subnet(os, &network.id, subnet_spec).await?);
    }

    Ok(ProviderNetworkInfo {
        network_id: network.id,
        subnets,
    })
}

async fn ensure_subnet(
    os: &OpenStackClient,
    network_id: &str,
    spec: &ProviderSubnetSpec,
) -> Result<ProviderSubnetStatus> {
    if let Some(existing) = os.get_subnet(&spec.name, network_id).await? {
        info!(subnet = %spec.name, id = %existing.id, "Subnet already exists");
        return Ok(ProviderSubnetStatus {
            name: spec.name.clone(),
            subnet_id: Some(existing.id),
        });
    }

    let allocation_pools = if spec.allocation_pools.is_empty() {
        None
    } else {
        Some(
            spec.allocation_pools
                .iter()
                .map(|pool| AllocationPoolRange {
                    start: pool.start.clone(),
                    end: pool.end.clone(),
                })
                .collect(),
        )
    };

    let subnet = os
        .create_subnet(&SubnetCreate {
            name: spec.name.clone(),
            network_id: network_id.to_string(),
            cidr: spec.cidr.clone(),
            gateway_ip: spec.gateway_ip.clone(),
            enable_dhcp: spec.enable_dhcp,
            dns_nameservers: spec.dns_nameservers.clone(),
            allocation_pools,
            tags: vec![],
        })
        .await?;
    info!(subnet = %spec.name, id = %subnet.id, "Created subnet");

    Ok(ProviderSubnetStatus {
        name: spec.name.clone(),
        subnet_id: Some(subnet.id),
    })
}

async fn subnet_statuses(
    os: &OpenStackClient,
    network_id: &str,
) -> Result<Vec<ProviderSubnetStatus>> {
    Ok(os
        .list_subnets(network_id)
        .await?
        .into_iter()
        .map(|subnet| ProviderSubnetStatus {
            name: subnet.name,
            subnet_id: Some(subnet.id),
        })
        .collect())
}

/// Delete a provider network, its subnets first. Subnet failures warn and
/// continue so the network deletion still gets attempted.
pub async fn delete_provider_network(
    os: &OpenStackClient,
    network_id: &str,
    subnet_ids: &[String],
) -> Result<()> {
    for subnet_id in subnet_ids {
        if let Err(e) = os.delete_subnet(subnet_id).await {
            warn!(subnet_id, error = %e, "Failed to delete subnet");
        }
    }

    os.delete_network(network_id).await?;
    Ok(())
}

/// Look up a provider network by name; `None` when absent.
pub async fn get_provider_network_info(
    os: &OpenStackClient,
    name: &str,
) -> Result<Option<ProviderNetworkInfo>> {
    let Some(network) = os.get_network_by_name(name).await? else {
        return Ok(None);
    };

    let subnets = subnet_statuses(os, &network.id).await?;
    Ok(Some(ProviderNetworkInfo {
        network_id: network.id,
        subnets,
    }))
}

/// Whether the spec differs from the remote network on an immutable
/// provider attribute, or the subnet layout changed.
#[must_use]
pub fn provider_network_needs_recreate(
    spec: &OpenstackNetworkSpec,
    remote: &Network,
    remote_subnets: &[ProviderSubnetStatus],
) -> bool {
    if remote.provider_network_type.as_deref() != Some(spec.provider_network_type.as_str())
        || remote.provider_physical_network != spec.provider_physical_network
        || remote.provider_segmentation_id != spec.provider_segmentation_id
        || remote.external != spec.external
        || remote.shared != spec.shared
    {
        return true;
    }

    let mut spec_names: Vec<&str> = spec.subnets.iter().map(|s| s.name.as_str()).collect();
    let mut remote_names: Vec<&str> = remote_subnets.iter().map(|s| s.name.as_str()).collect();
    spec_names.sort_unstable();
    remote_names.sort_unstable();
    spec_names != remote_names
}

#[cfg(test)]
#[path = "provider_network_tests.rs"]
mod provider_network_tests;
