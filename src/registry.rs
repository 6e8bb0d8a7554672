// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Managed-resource registry backed by a ConfigMap.
//!
//! Every OpenStack resource the operator has ever created gets one record
//! here, keyed by `(kind, name)`. The registry is the ground truth for
//! garbage collection: orphan detection compares records against the live
//! set of CRs and never depends on OpenStack-side tagging.
//!
//! Storage layout: a single ConfigMap
//! (`openstack-operator/openstack-operator-managed-resources`) with one JSON
//! blob per kind under key `{kind}.json`, created on first write. Writes are
//! read-modify-write cycles carrying the ConfigMap `resourceVersion`; a 409
//! conflict retries the whole cycle.

use crate::constants::{REGISTRY_CONFIGMAP_NAME, REGISTRY_CONFIGMAP_NAMESPACE};
use anyhow::{Context as _, Result};
use k8s_openapi::api::core::v1::ConfigMap;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use kube::api::{Api, PostParams};
use kube::Client;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use tracing::{debug, info, warn};

/// Resource kinds tracked in the registry, one JSON blob each.
pub const RESOURCE_KINDS: [&str; 9] = [
    "domains",
    "flavors",
    "images",
    "provider_networks",
    "projects",
    "groups",
    "networks",
    "security_groups",
    "federation_mappings",
];

/// Retries for the read-modify-write cycle on resourceVersion conflicts.
const WRITE_CONFLICT_RETRIES: usize = 5;

/// One registry record, stored under its resource name inside a kind blob.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RegistryRecord {
    /// The OpenStack resource id
    pub id: String,
    /// The Kubernetes CR that owns this resource
    pub cr_name: String,
    /// Kind-specific metadata (subnet ids, idp name, ...)
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

/// A record together with its name, as returned by queries.
#[derive(Clone, Debug, PartialEq)]
pub struct NamedRecord {
    pub name: String,
    pub record: RegistryRecord,
}

type KindBlob = BTreeMap<String, RegistryRecord>;

/// Registry for tracking operator-managed OpenStack resources.
pub struct Registry {
    api: Api<ConfigMap>,
}

impl Registry {
    /// Create a registry client against the well-known ConfigMap location.
    #[must_use]
    pub fn new(client: Client) -> Self {
        Self {
            api: Api::namespaced(client, REGISTRY_CONFIGMAP_NAMESPACE),
        }
    }

    /// Read the ConfigMap; `None` when it does not exist yet.
    async fn read_configmap(&self) -> Result<Option<ConfigMap>> {
        match self.api.get(REGISTRY_CONFIGMAP_NAME).await {
            Ok(cm) => Ok(Some(cm)),
            Err(kube::Error::Api(e)) if e.code == 404 => Ok(None),
            Err(e) => Err(e).context("reading registry ConfigMap"),
        }
    }

    fn parse_blob(data: Option<&BTreeMap<String, String>>, kind: &str) -> Result<KindBlob> {
        let key = format!("{kind}.json");
        match data.and_then(|d| d.get(&key)) {
            Some(raw) => serde_json::from_str(raw)
                .with_context(|| format!("corrupt registry blob {key}")),
            None => Ok(KindBlob::new()),
        }
    }

    /// Read one kind's records.
    async fn load(&self, kind: &str) -> Result<KindBlob> {
        let cm = self.read_configmap().await?;
        Self::parse_blob(cm.as_ref().and_then(|cm| cm.data.as_ref()), kind)
    }

    /// Apply a mutation to one kind blob with a CAS retry loop.
    ///
    /// The mutation runs against freshly read data on every attempt, so a
    /// lost race simply re-applies the same logical change.
    async fn mutate<F>(&self, kind: &str, mutate: F) -> Result<()>
    where
        F: Fn(&mut KindBlob) -> bool,
    {
        for attempt in 0..WRITE_CONFLICT_RETRIES {
            let existing = self.read_configmap().await?;

            let Some(mut cm) = existing else {
                // First write: create the ConfigMap with just this blob
                let mut blob = KindBlob::new();
                if !mutate(&mut blob) {
                    return Ok(());
                }
                let mut data = BTreeMap::new();
                data.insert(format!("{kind}.json"), serde_json::to_string(&blob)?);
                let cm = ConfigMap {
                    metadata: ObjectMeta {
                        name: Some(REGISTRY_CONFIGMAP_NAME.to_string()),
                        ..Default::default()
                    },
                    data: Some(data),
                    ..Default::default()
                };
                info!(
                    "Creating managed resources ConfigMap: {}/{}",
                    REGISTRY_CONFIGMAP_NAMESPACE, REGISTRY_CONFIGMAP_NAME
                );
                match self.api.create(&PostParams::default(), &cm).await {
                    Ok(_) => return Ok(()),
                    Err(kube::Error::Api(e)) if e.code == 409 => {
                        debug!("Registry ConfigMap appeared concurrently, retrying");
                        continue;
                    }
                    Err(e) => return Err(e).context("creating registry ConfigMap"),
                }
            };

            let mut blob = Self::parse_blob(cm.data.as_ref(), kind)?;
            if !mutate(&mut blob) {
                return Ok(());
            }

            cm.data
                .get_or_insert_with(BTreeMap::new)
                .insert(format!("{kind}.json"), serde_json::to_string(&blob)?);

            // The replace carries resourceVersion from the read; a concurrent
            // writer makes it fail with 409 and we re-run the cycle
            match self
                .api
                .replace(REGISTRY_CONFIGMAP_NAME, &PostParams::default(), &cm)
                .await
            {
                Ok(_) => return Ok(()),
                Err(kube::Error::Api(e)) if e.code == 409 => {
                    warn!(
                        kind,
                        attempt, "Registry write conflict, retrying read-modify-write"
                    );
                }
                Err(e) => return Err(e).context("updating registry ConfigMap"),
            }
        }

        anyhow::bail!("registry write for kind '{kind}' kept conflicting")
    }

    /// Register a managed resource (upsert).
    pub async fn register(
        &self,
        kind: &str,
        name: &str,
        id: &str,
        cr_name: &str,
        extra: Option<BTreeMap<String, serde_json::Value>>,
    ) -> Result<()> {
        let record = RegistryRecord {
            id: id.to_string(),
            cr_name: cr_name.to_string(),
            extra: extra.unwrap_or_default(),
        };
        self.mutate(kind, |blob| {
            if blob.get(name) == Some(&record) {
                return false;
            }
            blob.insert(name.to_string(), record.clone());
            true
        })
        .await?;
        debug!(kind, name, id, cr = cr_name, "Registered resource");
        Ok(())
    }

    /// Remove a resource from the registry; idempotent.
    pub async fn unregister(&self, kind: &str, name: &str) -> Result<()> {
        self.mutate(kind, |blob| blob.remove(name).is_some()).await?;
        debug!(kind, name, "Unregistered resource");
        Ok(())
    }

    /// Get one record by key.
    pub async fn get(&self, kind: &str, name: &str) -> Result<Option<RegistryRecord>> {
        Ok(self.load(kind).await?.get(name).cloned())
    }

    /// All records of a kind owned by a specific CR.
    pub async fn get_by_cr(&self, kind: &str, cr_name: &str) -> Result<Vec<NamedRecord>> {
        Ok(records_owned_by(&self.load(kind).await?, cr_name))
    }

    /// All records of a kind.
    pub async fn get_all(&self, kind: &str) -> Result<Vec<NamedRecord>> {
        Ok(self
            .load(kind)
            .await?
            .into_iter()
            .map(|(name, record)| NamedRecord { name, record })
            .collect())
    }

    /// Records whose owning CR is not in the expected set.
    pub async fn get_orphans(
        &self,
        kind: &str,
        expected_cr_names: &HashSet<String>,
    ) -> Result<Vec<NamedRecord>> {
        Ok(orphans_of(&self.load(kind).await?, expected_cr_names))
    }
}

/// Pure orphan computation over one kind blob.
fn orphans_of(blob: &KindBlob, expected_cr_names: &HashSet<String>) -> Vec<NamedRecord> {
    blob.iter()
        .filter(|(_, record)| !expected_cr_names.contains(&record.cr_name))
        .map(|(name, record)| NamedRecord {
            name: name.clone(),
            record: record.clone(),
        })
        .collect()
}

/// Pure ownership filter over one kind blob.
fn records_owned_by(blob: &KindBlob, cr_name: &str) -> Vec<NamedRecord> {
    blob.iter()
        .filter(|(_, record)| record.cr_name == cr_name)
        .map(|(name, record)| NamedRecord {
            name: name.clone(),
            record: record.clone(),
        })
        .collect()
}

#[cfg(test)]
#[path = "registry_tests.rs"]
mod registry_tests;
