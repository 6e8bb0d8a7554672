// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Neutron operations: tenant networks, subnets, routers, security groups
//! and provider networks.
//!
//! Router interface changes swallow conflict/not-found, matching the ensure
//! and teardown semantics of the callers. All created resources carry the
//! managed-by tag.

use super::error::{check_response, OpenStackError};
use super::identity::{swallow_conflict, swallow_not_found};
use super::types::*;
use super::{OpenStackClient, SERVICE_NETWORK};
use reqwest::Method;
use serde_json::json;
use tracing::{info, warn};

impl OpenStackClient {
    // ------------------------------------------------------------------
    // Network operations
    // ------------------------------------------------------------------

    /// Find a tenant network by name within a project.
    pub async fn get_network(
        &self,
        name: &str,
        project_id: &str,
    ) -> Result<Option<Network>, OpenStackError> {
        self.call(SERVICE_NETWORK, "get_network", || async {
            let resp = self
                .request(Method::GET, SERVICE_NETWORK, "v2.0/networks")
                .await?
                .query(&[("name", name), ("project_id", project_id)])
                .send()
                .await?;
            let list: NetworkListEnvelope = check_response(resp).await?.json().await?;
            Ok(list.networks.into_iter().next())
        })
        .await
    }

    /// Find any network by name, regardless of project. Used for provider
    /// networks, which are admin-owned.
    pub async fn get_network_by_name(
        &self,
        name: &str,
    ) -> Result<Option<Network>, OpenStackError> {
        self.call(SERVICE_NETWORK, "get_network_by_name", || async {
            let resp = self
                .request(Method::GET, SERVICE_NETWORK, "v2.0/networks")
                .await?
                .query(&[("name", name)])
                .send()
                .await?;
            let list: NetworkListEnvelope = check_response(resp).await?.json().await?;
            Ok(list.networks.into_iter().next())
        })
        .await
    }

    /// Find an external network by name.
    pub async fn get_external_network(
        &self,
        name: &str,
    ) -> Result<Option<Network>, OpenStackError> {
        self.call(SERVICE_NETWORK, "get_external_network", || async {
            let resp = self
                .request(Method::GET, SERVICE_NETWORK, "v2.0/networks")
                .await?
                .query(&[("name", name), ("router:external", "true")])
                .send()
                .await?;
            let list: NetworkListEnvelope = check_response(resp).await?.json().await?;
            Ok(list.networks.into_iter().next())
        })
        .await
    }

    /// Create a tenant network.
    pub async fn create_network(
        &self,
        name: &str,
        project_id: &str,
        tags: &[String],
    ) -> Result<Network, OpenStackError> {
        info!(network = name, project_id, "Creating network");
        let network = self
            .call(SERVICE_NETWORK, "create_network", || async {
                let resp = self
                    .request(Method::POST, SERVICE_NETWORK, "v2.0/networks")
                    .await?
                    .json(&json!({"network": {"name": name, "project_id": project_id}}))
                    .send()
                    .await?;
                let envelope: NetworkEnvelope = check_response(resp).await?.json().await?;
                Ok(envelope.network)
            })
            .await?;

        self.tag_resource("networks", &network.id, tags).await;
        Ok(network)
    }

    /// Create a provider network with its infrastructure attributes.
    pub async fn create_provider_network(
        &self,
        create: &ProviderNetworkCreate,
    ) -> Result<Network, OpenStackError> {
        info!(network = %create.name, network_type = %create.network_type, "Creating provider network");
        self.call(SERVICE_NETWORK, "create_provider_network", || async {
            let mut network = json!({
                "name": create.name,
                "provider:network_type": create.network_type,
                "router:external": create.external,
                "shared": create.shared,
                "description": create.description,
            });
            if let Some(physical) = &create.physical_network {
                network["provider:physical_network"] = json!(physical);
            }
            if let Some(segmentation_id) = create.segmentation_id {
                network["provider:segmentation_id"] = json!(segmentation_id);
            }

            let resp = self
                .request(Method::POST, SERVICE_NETWORK, "v2.0/networks")
                .await?
                .json(&json!({"network": network}))
                .send()
                .await?;
            let envelope: NetworkEnvelope = check_response(resp).await?.json().await?;
            Ok(envelope.network)
        })
        .await
    }

    pub async fn delete_network(&self, network_id: &str) -> Result<(), OpenStackError> {
        info!(network_id, "Deleting network");
        let path = format!("v2.0/networks/{network_id}");
        let result = self
            .call(SERVICE_NETWORK, "delete_network", || async {
                let resp = self
                    .request(Method::DELETE, SERVICE_NETWORK, &path)
                    .await?
                    .send()
                    .await?;
                check_response(resp).await?;
                Ok(())
            })
            .await;
        swallow_not_found(result)
    }

    // ------------------------------------------------------------------
    // Subnet operations
    // ------------------------------------------------------------------

    /// Find a subnet by name within a network.
    pub async fn get_subnet(
        &self,
        name: &str,
        network_id: &str,
    ) -> Result<Option<Subnet>, OpenStackError> {
        self.call(SERVICE_NETWORK, "get_subnet", || async {
            let resp = self
                .request(Method::GET, SERVICE_NETWORK, "v2.0/subnets")
                .await?
                .query(&[("name", name), ("network_id", network_id)])
                .send()
                .await?;
            let list: SubnetListEnvelope = check_response(resp).await?.json().await?;
            Ok(list.subnets.into_iter().next())
        })
        .await
    }

    /// List all subnets on a network.
    pub async fn list_subnets(&self, network_id: &str) -> Result<Vec<Subnet>, OpenStackError> {
        self.call(SERVICE_NETWORK, "list_subnets", || async {
            let resp = self
                .request(Method::GET, SERVICE_NETWORK, "v2.0/subnets")
                .await?
                .query(&[("network_id", network_id)])
                .send()
                .await?;
            let list: SubnetListEnvelope = check_response(resp).await?.json().await?;
            Ok(list.subnets)
        })
        .await
    }

    /// Create an IPv4 subnet.
    pub async fn create_subnet(&self, create: &SubnetCreate) -> Result<Subnet, OpenStackError> {
        info!(subnet = %create.name, cidr = %create.cidr, "Creating subnet");
        let subnet = self
            .call(SERVICE_NETWORK, "create_subnet", || async {
                let mut subnet = json!({
                    "name": create.name,
                    "network_id": create.network_id,
                    "cidr": create.cidr,
                    "ip_version": 4,
                    "enable_dhcp": create.enable_dhcp,
                    "dns_nameservers": create.dns_nameservers,
                });
                if let Some(gateway_ip) = &create.gateway_ip {
                    subnet["gateway_ip"] = json!(gateway_ip);
                }
                if let Some(pools) = &create.allocation_pools {
                    subnet["allocation_pools"] = json!(pools);
                }

                let resp = self
                    .request(Method::POST, SERVICE_NETWORK, "v2.0/subnets")
                    .await?
                    .json(&json!({"subnet": subnet}))
                    .send()
                    .await?;
                let envelope: SubnetEnvelope = check_response(resp).await?.json().await?;
                Ok(envelope.subnet)
            })
            .await?;

        self.tag_resource("subnets", &subnet.id, &create.tags).await;
        Ok(subnet)
    }

    pub async fn delete_subnet(&self, subnet_id: &str) -> Result<(), OpenStackError> {
        info!(subnet_id, "Deleting subnet");
        let path = format!("v2.0/subnets/{subnet_id}");
        let result = self
            .call(SERVICE_NETWORK, "delete_subnet", || async {
                let resp = self
                    .request(Method::DELETE, SERVICE_NETWORK, &path)
                    .await?
                    .send()
                    .await?;
                check_response(resp).await?;
                Ok(())
            })
            .await;
        swallow_not_found(result)
    }

    // ------------------------------------------------------------------
    // Router operations
    // ------------------------------------------------------------------

    /// Find a router by name within a project.
    pub async fn get_router(
        &self,
        name: &str,
        project_id: &str,
    ) -> Result<Option<Router>, OpenStackError> {
        self.call(SERVICE_NETWORK, "get_router", || async {
            let resp = self
                .request(Method::GET, SERVICE_NETWORK, "v2.0/routers")
                .await?
                .query(&[("name", name), ("project_id", project_id)])
                .send()
                .await?;
            let list: RouterListEnvelope = check_response(resp).await?.json().await?;
            Ok(list.routers.into_iter().next())
        })
        .await
    }

    /// Create a router, optionally with an external gateway.
    pub async fn create_router(
        &self,
        name: &str,
        project_id: &str,
        external_network_id: Option<&str>,
        enable_snat: bool,
        tags: &[String],
    ) -> Result<Router, OpenStackError> {
        info!(router = name, project_id, "Creating router");
        let router = self
            .call(SERVICE_NETWORK, "create_router", || async {
                let mut router = json!({"name": name, "project_id": project_id});
                if let Some(network_id) = external_network_id {
                    router["external_gateway_info"] = json!({
                        "network_id": network_id,
                        "enable_snat": enable_snat,
                    });
                }

                let resp = self
                    .request(Method::POST, SERVICE_NETWORK, "v2.0/routers")
                    .await?
                    .json(&json!({"router": router}))
                    .send()
                    .await?;
                let envelope: RouterEnvelope = check_response(resp).await?.json().await?;
                Ok(envelope.router)
            })
            .await?;

        self.tag_resource("routers", &router.id, tags).await;
        Ok(router)
    }

    /// Attach a subnet interface to a router; already-attached is fine.
    pub async fn add_router_interface(
        &self,
        router_id: &str,
        subnet_id: &str,
    ) -> Result<(), OpenStackError> {
        info!(router_id, subnet_id, "Adding router interface");
        let path = format!("v2.0/routers/{router_id}/add_router_interface");
        let result = self
            .call(SERVICE_NETWORK, "add_router_interface", || async {
                let resp = self
                    .request(Method::PUT, SERVICE_NETWORK, &path)
                    .await?
                    .json(&json!({"subnet_id": subnet_id}))
                    .send()
                    .await?;
                check_response(resp).await?;
                Ok(())
            })
            .await;
        swallow_conflict(result)
    }

    /// Detach a subnet interface from a router; already-detached is fine.
    pub async fn remove_router_interface(
        &self,
        router_id: &str,
        subnet_id: &str,
    ) -> Result<(), OpenStackError> {
        info!(router_id, subnet_id, "Removing router interface");
        let path = format!("v2.0/routers/{router_id}/remove_router_interface");
        let result = self
            .call(SERVICE_NETWORK, "remove_router_interface", || async {
                let resp = self
                    .request(Method::PUT, SERVICE_NETWORK, &path)
                    .await?
                    .json(&json!({"subnet_id": subnet_id}))
                    .send()
                    .await?;
                check_response(resp).await?;
                Ok(())
            })
            .await;
        swallow_not_found(result)
    }

    pub async fn delete_router(&self, router_id: &str) -> Result<(), OpenStackError> {
        info!(router_id, "Deleting router");
        let path = format!("v2.0/routers/{router_id}");
        let result = self
            .call(SERVICE_NETWORK, "delete_router", || async {
                let resp = self
                    .request(Method::DELETE, SERVICE_NETWORK, &path)
                    .await?
                    .send()
                    .await?;
                check_response(resp).await?;
                Ok(())
            })
            .await;
        swallow_not_found(result)
    }

    // ------------------------------------------------------------------
    // Security group operations
    // ------------------------------------------------------------------

    /// Find a security group by name within a project.
    pub async fn get_security_group(
        &self,
        name: &str,
        project_id: &str,
    ) -> Result<Option<SecurityGroup>, OpenStackError> {
        self.call(SERVICE_NETWORK, "get_security_group", || async {
            let resp = self
                .request(Method::GET, SERVICE_NETWORK, "v2.0/security-groups")
                .await?
                .query(&[("name", name), ("project_id", project_id)])
                .send()
                .await?;
            let list: SecurityGroupListEnvelope = check_response(resp).await?.json().await?;
            Ok(list.security_groups.into_iter().next())
        })
        .await
    }

    pub async fn create_security_group(
        &self,
        name: &str,
        project_id: &str,
        description: &str,
        tags: &[String],
    ) -> Result<SecurityGroup, OpenStackError> {
        info!(security_group = name, project_id, "Creating security group");
        let group = self
            .call(SERVICE_NETWORK, "create_security_group", || async {
                let resp = self
                    .request(Method::POST, SERVICE_NETWORK, "v2.0/security-groups")
                    .await?
                    .json(&json!({"security_group": {
                        "name": name,
                        "project_id": project_id,
                        "description": description,
                    }}))
                    .send()
                    .await?;
                let envelope: SecurityGroupEnvelope = check_response(resp).await?.json().await?;
                Ok(envelope.security_group)
            })
            .await?;

        self.tag_resource("security-groups", &group.id, tags).await;
        Ok(group)
    }

    pub async fn delete_security_group(&self, sg_id: &str) -> Result<(), OpenStackError> {
        info!(sg_id, "Deleting security group");
        let path = format!("v2.0/security-groups/{sg_id}");
        let result = self
            .call(SERVICE_NETWORK, "delete_security_group", || async {
                let resp = self
                    .request(Method::DELETE, SERVICE_NETWORK, &path)
                    .await?
                    .send()
                    .await?;
                check_response(resp).await?;
                Ok(())
            })
            .await;
        swallow_not_found(result)
    }

    /// Create a security group rule; "already present" conflicts are
    /// swallowed.
    pub async fn create_security_group_rule(
        &self,
        create: &SecurityGroupRuleCreate,
    ) -> Result<(), OpenStackError> {
        info!(
            security_group_id = %create.security_group_id,
            direction = %create.direction,
            protocol = ?create.protocol,
            "Creating security group rule"
        );

        let result = self
            .call(SERVICE_NETWORK, "create_security_group_rule", || async {
                let mut rule = json!({
                    "security_group_id": create.security_group_id,
                    "direction": create.direction,
                    "ethertype": create.ethertype,
                });
                // "any" means no protocol filter on the wire
                if let Some(protocol) = create.protocol.as_deref().filter(|p| *p != "any") {
                    rule["protocol"] = json!(protocol);
                }
                if let Some(port) = create.port_range_min {
                    rule["port_range_min"] = json!(port);
                }
                if let Some(port) = create.port_range_max {
                    rule["port_range_max"] = json!(port);
                }
                if let Some(prefix) = &create.remote_ip_prefix {
                    rule["remote_ip_prefix"] = json!(prefix);
                }
                if let Some(remote_group_id) = &create.remote_group_id {
                    rule["remote_group_id"] = json!(remote_group_id);
                }

                let resp = self
                    .request(Method::POST, SERVICE_NETWORK, "v2.0/security-group-rules")
                    .await?
                    .json(&json!({"security_group_rule": rule}))
                    .send()
                    .await?;
                check_response(resp).await?;
                Ok(())
            })
            .await;
        swallow_conflict(result)
    }

    // ------------------------------------------------------------------
    // Tagging
    // ------------------------------------------------------------------

    /// Best-effort tagging; tags are a legacy GC marker, the registry is
    /// authoritative.
    async fn tag_resource(&self, resource: &'static str, resource_id: &str, tags: &[String]) {
        for tag in tags {
            let path = format!("v2.0/{resource}/{resource_id}/tags/{tag}");
            let result = self
                .call(SERVICE_NETWORK, "tag_resource", || async {
                    let resp = self
                        .request(Method::PUT, SERVICE_NETWORK, &path)
                        .await?
                        .send()
                        .await?;
                    check_response(resp).await?;
                    Ok(())
                })
                .await;
            if let Err(e) = swallow_conflict(result) {
                warn!(resource, resource_id, tag, error = %e, "Failed to tag resource");
            }
        }
    }
}
