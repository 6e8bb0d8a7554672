// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Cluster-scope garbage collection tick.
//!
//! Compares the registry against the live cluster-scoped CRs and deletes
//! orphaned provider networks (subnets first), images, flavors and domains,
//! in that order. A CRD that is not installed yet simply contributes an
//! empty expected set.

use super::{GcOutcome, CLUSTER_GC_ORDER};
use crate::context::Context;
use crate::crd::{OpenstackDomain, OpenstackFlavor, OpenstackImage, OpenstackNetwork};
use crate::metrics::CLUSTER_GC_DELETED_RESOURCES;
use crate::openstack::OpenStackClient;
use crate::registry::NamedRecord;
use crate::resources::provider_network::delete_provider_network;
use anyhow::Result;
use kube::api::{Api, ListParams};
use kube::{Client, ResourceExt};
use std::collections::{HashMap, HashSet};
use tracing::{error, info};

/// List the names of all CRs of a kind; a missing CRD yields an empty set.
async fn expected_cr_names<K>(client: &Client) -> Result<HashSet<String>>
where
    K: kube::Resource<DynamicType = (), Scope = kube::core::ClusterResourceScope>
        + Clone
        + std::fmt::Debug
        + serde::de::DeserializeOwned,
{
    let api: Api<K> = Api::all(client.clone());
    match api.list(&ListParams::default()).await {
        Ok(list) => Ok(list.items.iter().map(ResourceExt::name_any).collect()),
        Err(kube::Error::Api(e)) if e.code == 404 => Ok(HashSet::new()),
        Err(e) => Err(e.into()),
    }
}

fn subnet_ids(orphan: &NamedRecord) -> Vec<String> {
    orphan
        .record
        .extra
        .get("subnets")
        .and_then(|v| v.as_array())
        .map(|subnets| {
            subnets
                .iter()
                .filter_map(|s| s.as_str())
                .map(ToString::to_string)
                .collect()
        })
        .unwrap_or_default()
}

async fn delete_orphan(os: &OpenStackClient, kind: &str, orphan: &NamedRecord) -> Result<()> {
    match kind {
        "provider_networks" => {
            delete_provider_network(os, &orphan.record.id, &subnet_ids(orphan)).await?;
        }
        "images" => os.delete_image(&orphan.record.id).await?,
        "flavors" => os.delete_flavor(&orphan.record.id).await?,
        "domains" => os.delete_domain(&orphan.record.id).await?,
        other => anyhow::bail!("unknown registry kind: {other}"),
    }
    Ok(())
}

fn metric_type(kind: &str) -> &'static str {
    match kind {
        "provider_networks" => "provider_network",
        "images" => "image",
        "flavors" => "flavor",
        _ => "domain",
    }
}

/// One cluster GC tick.
pub async fn collect_cluster_garbage(ctx: &Context) -> Result<GcOutcome> {
    let mut expected: HashMap<&str, HashSet<String>> = HashMap::new();
    expected.insert(
        "domains",
        expected_cr_names::<OpenstackDomain>(&ctx.client).await?,
    );
    expected.insert(
        "flavors",
        expected_cr_names::<OpenstackFlavor>(&ctx.client).await?,
    );
    expected.insert(
        "images",
        expected_cr_names::<OpenstackImage>(&ctx.client).await?,
    );
    expected.insert(
        "provider_networks",
        expected_cr_names::<OpenstackNetwork>(&ctx.client).await?,
    );

    let os = ctx.openstack().await?;
    let registry = ctx.registry().await;
    let mut outcome = GcOutcome::new();
    let empty = HashSet::new();

    for kind in CLUSTER_GC_ORDER {
        let expected_names = expected.get(kind).unwrap_or(&empty);
        let orphans = registry.get_orphans(kind, expected_names).await?;

        for orphan in orphans {
            match delete_orphan(&os, kind, &orphan).await {
                Ok(()) => {
                    registry.unregister(kind, &orphan.name).await?;
                    CLUSTER_GC_DELETED_RESOURCES
                        .with_label_values(&[metric_type(kind)])
                        .inc();
                    outcome
                        .entry(kind.to_string())
                        .or_default()
                        .push(orphan.name.clone());
                    info!(kind, name = %orphan.name, "Deleted orphaned resource");
                }
                Err(e) => {
                    error!(kind, name = %orphan.name, error = %e, "Failed to delete orphan");
                }
            }
        }
    }

    Ok(outcome)
}
