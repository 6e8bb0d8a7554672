// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Tenant network, subnet and router management.
//!
//! One network spec expands into network → subnet (`{name}-subnet`) →
//! optional router (`{name}-router`) with gateway and subnet interface,
//! created in that order and torn down in reverse. A subnet whose CIDR no
//! longer matches the spec is recreated in place.

use crate::constants::MANAGED_BY_TAG;
use crate::crd::{NetworkStatus, ProjectNetworkSpec};
use crate::openstack::{OpenStackClient, SubnetCreate};
use anyhow::Result;
use tracing::{info, warn};

fn resource_tags() -> Vec<String> {
    vec![MANAGED_BY_TAG.to_string()]
}

/// Ensure a network, its subnet, and optionally a router exist.
///
/// Returns the recorded ids for the CR status.
pub async fn ensure_network(
    os: &OpenStackClient,
    project_id: &str,
    spec: &ProjectNetworkSpec,
) -> Result<NetworkStatus> {
    let mut status = NetworkStatus {
        name: spec.name.clone(),
        ..Default::default()
    };

    let network_id = match os.get_network(&spec.name, project_id).await? {
        Some(network) => {
            info!(network = %spec.name, id = %network.id, "Network already exists");
            network.id
        }
        None => {
            let network = os
                .create_network(&spec.name, project_id, &resource_tags())
                .await?;
            info!(network = %spec.name, id = %network.id, "Created network");
            network.id
        }
    };
    status.network_id = Some(network_id.clone());

    let subnet_name = format!("{}-subnet", spec.name);
    let subnet_id = ensure_subnet(os, &network_id, &subnet_name, spec).await?;
    status.subnet_id = Some(subnet_id.clone());

    if let Some(router_spec) = &spec.router {
        let router_name = format!("{}-router", spec.name);

        let external_network_id = match &router_spec.external_network {
            Some(name) => match os.get_external_network(name).await? {
                Some(network) => Some(network.id),
                None => {
                    warn!(
                        external_network = %name,
                        "External network not found, router will not have a gateway"
                    );
                    None
                }
            },
            None => None,
        };

        let router_id = match os.get_router(&router_name, project_id).await? {
            Some(router) => {
                info!(router = %router_name, id = %router.id, "Router already exists");
                router.id
            }
            None => {
                let router = os
                    .create_router(
                        &router_name,
                        project_id,
                        external_network_id.as_deref(),
                        router_spec.enable_snat,
                        &resource_tags(),
                    )
                    .await?;
                info!(router = %router_name, id = %router.id, "Created router");
                router.id
            }
        };

        os.add_router_interface(&router_id, &subnet_id).await?;
        status.router_id = Some(router_id);
    }

    Ok(status)
}

/// Find or create the subnet, recreating it when the CIDR drifted from the
/// spec.
async fn ensure_subnet(
    os: &OpenStackClient,
    network_id: &str,
    subnet_name: &str,
    spec: &ProjectNetworkSpec,
) -> Result<String> {
    if let Some(existing) = os.get_subnet(subnet_name, network_id).await? {
        if existing.cidr == spec.cidr {
            info!(subnet = subnet_name, id = %existing.id, "Subnet already exists");
            return Ok(existing.id);
        }
        info!(
            subnet = subnet_name,
            old_cidr = %existing.cidr,
            new_cidr = %spec.cidr,
            "Subnet CIDR changed, recreating"
        );
        os.delete_subnet(&existing.id).await?;
    }

    let subnet = os
        .create_subnet(&SubnetCreate {
            name: subnet_name.to_string(),
            network_id: network_id.to_string(),
            cidr: spec.cidr.clone(),
            gateway_ip: None,
            enable_dhcp: spec.enable_dhcp,
            dns_nameservers: spec.dns_nameservers.clone(),
            allocation_pools: None,
            tags: resource_tags(),
        })
        .await?;
    info!(subnet = subnet_name, id = %subnet.id, "Created subnet");
    Ok(subnet.id)
}

/// Ensure all specified networks exist, returning their statuses in order.
pub async fn ensure_networks(
    os: &OpenStackClient,
    project_id: &str,
    specs: &[ProjectNetworkSpec],
) -> Result<Vec<NetworkStatus>> {
    let mut statuses = Vec::with_capacity(specs.len());
    for spec in specs {
        statuses.push(ensure_network(os, project_id, spec).await?);
    }
    Ok(statuses)
}

/// Delete one network with its router and subnet, in reverse dependency
/// order: interface-remove → router → subnet → network. Each step warns and
/// continues so the rest of the teardown can proceed.
pub async fn delete_network(os: &OpenStackClient, status: &NetworkStatus) {
    if let (Some(router_id), Some(subnet_id)) = (&status.router_id, &status.subnet_id) {
        if let Err(e) = os.remove_router_interface(router_id, subnet_id).await {
            warn!(router_id, subnet_id, error = %e, "Failed to remove router interface");
        }
    }

    if let Some(router_id) = &status.router_id {
        if let Err(e) = os.delete_router(router_id).await {
            warn!(router_id, error = %e, "Failed to delete router");
        }
    }

    if let Some(subnet_id) = &status.subnet_id {
        if let Err(e) = os.delete_subnet(subnet_id).await {
            warn!(subnet_id, error = %e, "Failed to delete subnet");
        }
    }

    if let Some(network_id) = &status.network_id {
        if let Err(e) = os.delete_network(network_id).await {
            warn!(network_id, error = %e, "Failed to delete network");
        }
    }
}

/// Delete all recorded networks.
pub async fn delete_networks(os: &OpenStackClient, statuses: &[NetworkStatus]) {
    for status in statuses {
        delete_network(os, status).await;
    }
}
