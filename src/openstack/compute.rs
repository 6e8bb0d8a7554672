// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Nova and Cinder operations: flavors and per-project quotas.
//!
//! The quota setters translate the CR's camelCase quota fields into the
//! wire-level names each service expects; absent fields are simply not sent.

use super::error::{check_response, OpenStackError};
use super::identity::swallow_not_found;
use super::types::{Flavor, FlavorEnvelope, FlavorListEnvelope};
use super::{OpenStackClient, SERVICE_COMPUTE, SERVICE_NETWORK, SERVICE_VOLUME};
use crate::crd::{ComputeQuotas, NetworkQuotas, StorageQuotas};
use reqwest::Method;
use serde_json::json;
use std::collections::BTreeMap;
use tracing::info;

/// Translate compute quota spec fields to Nova quota-set keys.
#[must_use]
pub fn compute_quota_args(quotas: &ComputeQuotas) -> BTreeMap<&'static str, i64> {
    let mut args = BTreeMap::new();
    if let Some(v) = quotas.instances {
        args.insert("instances", v);
    }
    if let Some(v) = quotas.cores {
        args.insert("cores", v);
    }
    if let Some(v) = quotas.ram_mb {
        args.insert("ram", v);
    }
    if let Some(v) = quotas.server_groups {
        args.insert("server_groups", v);
    }
    if let Some(v) = quotas.server_group_members {
        args.insert("server_group_members", v);
    }
    args
}

/// Translate storage quota spec fields to Cinder quota-set keys.
#[must_use]
pub fn storage_quota_args(quotas: &StorageQuotas) -> BTreeMap<&'static str, i64> {
    let mut args = BTreeMap::new();
    if let Some(v) = quotas.volumes {
        args.insert("volumes", v);
    }
    if let Some(v) = quotas.volumes_gb {
        args.insert("gigabytes", v);
    }
    if let Some(v) = quotas.snapshots {
        args.insert("snapshots", v);
    }
    if let Some(v) = quotas.backups {
        args.insert("backups", v);
    }
    if let Some(v) = quotas.backups_gb {
        args.insert("backup_gigabytes", v);
    }
    args
}

/// Translate network quota spec fields to Neutron quota keys.
#[must_use]
pub fn network_quota_args(quotas: &NetworkQuotas) -> BTreeMap<&'static str, i64> {
    let mut args = BTreeMap::new();
    if let Some(v) = quotas.floating_ips {
        args.insert("floatingip", v);
    }
    if let Some(v) = quotas.networks {
        args.insert("network", v);
    }
    if let Some(v) = quotas.subnets {
        args.insert("subnet", v);
    }
    if let Some(v) = quotas.routers {
        args.insert("router", v);
    }
    if let Some(v) = quotas.ports {
        args.insert("port", v);
    }
    if let Some(v) = quotas.security_groups {
        args.insert("security_group", v);
    }
    if let Some(v) = quotas.security_group_rules {
        args.insert("security_group_rule", v);
    }
    args
}

/// Parameters for creating a flavor.
#[derive(Clone, Debug)]
pub struct FlavorCreate {
    pub name: String,
    pub vcpus: i64,
    pub ram: i64,
    pub disk: i64,
    pub ephemeral: i64,
    pub swap: i64,
    pub is_public: bool,
    pub description: Option<String>,
}

impl OpenStackClient {
    // ------------------------------------------------------------------
    // Flavor operations
    // ------------------------------------------------------------------

    /// Find a flavor by name. Nova has no name filter, so this lists and
    /// matches locally.
    pub async fn get_flavor(&self, name: &str) -> Result<Option<Flavor>, OpenStackError> {
        self.call(SERVICE_COMPUTE, "get_flavor", || async {
            let resp = self
                .request(Method::GET, SERVICE_COMPUTE, "flavors/detail")
                .await?
                .query(&[("is_public", "None")])
                .send()
                .await?;
            let list: FlavorListEnvelope = check_response(resp).await?.json().await?;
            Ok(list.flavors.into_iter().find(|f| f.name == name))
        })
        .await
    }

    pub async fn create_flavor(&self, create: &FlavorCreate) -> Result<Flavor, OpenStackError> {
        info!(flavor = %create.name, "Creating flavor");
        self.call(SERVICE_COMPUTE, "create_flavor", || async {
            let mut flavor = json!({
                "name": create.name,
                "vcpus": create.vcpus,
                "ram": create.ram,
                "disk": create.disk,
                "OS-FLV-EXT-DATA:ephemeral": create.ephemeral,
                "swap": create.swap,
                "os-flavor-access:is_public": create.is_public,
            });
            if let Some(description) = &create.description {
                flavor["description"] = json!(description);
            }

            let resp = self
                .request(Method::POST, SERVICE_COMPUTE, "flavors")
                .await?
                .json(&json!({"flavor": flavor}))
                .send()
                .await?;
            let envelope: FlavorEnvelope = check_response(resp).await?.json().await?;
            Ok(envelope.flavor)
        })
        .await
    }

    pub async fn delete_flavor(&self, flavor_id: &str) -> Result<(), OpenStackError> {
        info!(flavor_id, "Deleting flavor");
        let path = format!("flavors/{flavor_id}");
        let result = self
            .call(SERVICE_COMPUTE, "delete_flavor", || async {
                let resp = self
                    .request(Method::DELETE, SERVICE_COMPUTE, &path)
                    .await?
                    .send()
                    .await?;
                check_response(resp).await?;
                Ok(())
            })
            .await;
        swallow_not_found(result)
    }

    /// Replace extra specs on a flavor; the only in-place-mutable attribute.
    pub async fn set_flavor_extra_specs(
        &self,
        flavor_id: &str,
        extra_specs: &BTreeMap<String, String>,
    ) -> Result<(), OpenStackError> {
        if extra_specs.is_empty() {
            return Ok(());
        }

        info!(flavor_id, "Setting flavor extra specs");
        let path = format!("flavors/{flavor_id}/os-extra_specs");
        self.call(SERVICE_COMPUTE, "set_flavor_extra_specs", || async {
            let resp = self
                .request(Method::POST, SERVICE_COMPUTE, &path)
                .await?
                .json(&json!({"extra_specs": extra_specs}))
                .send()
                .await?;
            check_response(resp).await?;
            Ok(())
        })
        .await
    }

    // ------------------------------------------------------------------
    // Quota operations
    // ------------------------------------------------------------------

    pub async fn set_compute_quotas(
        &self,
        project_id: &str,
        quotas: &ComputeQuotas,
    ) -> Result<(), OpenStackError> {
        let args = compute_quota_args(quotas);
        if args.is_empty() {
            return Ok(());
        }

        info!(project_id, ?args, "Setting compute quotas");
        let path = format!("os-quota-sets/{project_id}");
        self.call(SERVICE_COMPUTE, "set_compute_quotas", || async {
            let resp = self
                .request(Method::PUT, SERVICE_COMPUTE, &path)
                .await?
                .json(&json!({"quota_set": args}))
                .send()
                .await?;
            check_response(resp).await?;
            Ok(())
        })
        .await
    }

    pub async fn set_volume_quotas(
        &self,
        project_id: &str,
        quotas: &StorageQuotas,
    ) -> Result<(), OpenStackError> {
        let args = storage_quota_args(quotas);
        if args.is_empty() {
            return Ok(());
        }

        info!(project_id, ?args, "Setting volume quotas");
        let path = format!("os-quota-sets/{project_id}");
        self.call(SERVICE_VOLUME, "set_volume_quotas", || async {
            let resp = self
                .request(Method::PUT, SERVICE_VOLUME, &path)
                .await?
                .json(&json!({"quota_set": args}))
                .send()
                .await?;
            check_response(resp).await?;
            Ok(())
        })
        .await
    }

    pub async fn set_network_quotas(
        &self,
        project_id: &str,
        quotas: &NetworkQuotas,
    ) -> Result<(), OpenStackError> {
        let args = network_quota_args(quotas);
        if args.is_empty() {
            return Ok(());
        }

        info!(project_id, ?args, "Setting network quotas");
        let path = format!("v2.0/quotas/{project_id}");
        self.call(SERVICE_NETWORK, "set_network_quotas", || async {
            let resp = self
                .request(Method::PUT, SERVICE_NETWORK, &path)
                .await?
                .json(&json!({"quota": args}))
                .send()
                .await?;
            check_response(resp).await?;
            Ok(())
        })
        .await
    }
}

#[cfg(test)]
#[path = "compute_tests.rs"]
mod compute_tests;
