// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Shared context for all controllers.
//!
//! The operator needs at most one OpenStack client and one registry per
//! process. Both are lazily initialised behind a mutex inside [`Context`],
//! which is passed as `Arc<Context>` to every controller and GC daemon.
//! The lock only guards construction; no remote call is ever made while it
//! is held.

use crate::openstack::OpenStackClient;
use crate::registry::Registry;
use anyhow::Result;
use kube::Client;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::info;

/// Operator configuration resolved from environment variables at startup.
#[derive(Clone, Debug)]
pub struct OperatorConfig {
    /// Restrict project reconciliation to one namespace; empty = cluster-wide
    pub watch_namespace: String,
    /// Prometheus scrape port
    pub metrics_port: u16,
    /// Seconds between project GC ticks
    pub gc_interval_secs: u64,
    /// Seconds between cluster-scoped GC ticks
    pub cluster_gc_interval_secs: u64,
    /// Domain scanned by the legacy tag-based project GC
    pub managed_domain: String,
}

impl OperatorConfig {
    /// Load configuration from the environment, falling back to defaults.
    #[must_use]
    pub fn from_env() -> Self {
        let watch_namespace = std::env::var("WATCH_NAMESPACE").unwrap_or_default();
        let metrics_port = std::env::var("METRICS_PORT")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(crate::constants::DEFAULT_METRICS_PORT);
        let gc_interval_secs = std::env::var("GC_INTERVAL_SECONDS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(crate::constants::DEFAULT_GC_INTERVAL_SECS);
        let cluster_gc_interval_secs = std::env::var("CLUSTER_GC_INTERVAL_SECONDS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(crate::constants::DEFAULT_CLUSTER_GC_INTERVAL_SECS);
        let managed_domain = std::env::var("MANAGED_DOMAIN")
            .unwrap_or_else(|_| crate::constants::DEFAULT_MANAGED_DOMAIN.to_string());

        Self {
            watch_namespace,
            metrics_port,
            gc_interval_secs,
            cluster_gc_interval_secs,
            managed_domain,
        }
    }
}

/// Shared context passed to all controllers.
pub struct Context {
    /// Kubernetes client for API operations
    pub client: Client,

    /// Operator configuration from the environment
    pub config: OperatorConfig,

    openstack: Mutex<Option<Arc<OpenStackClient>>>,
    registry: Mutex<Option<Arc<Registry>>>,
}

impl Context {
    #[must_use]
    pub fn new(client: Client, config: OperatorConfig) -> Self {
        Self {
            client,
            config,
            openstack: Mutex::new(None),
            registry: Mutex::new(None),
        }
    }

    /// Get or lazily create the shared OpenStack client.
    ///
    /// # Errors
    ///
    /// Returns an error when the clouds configuration cannot be loaded.
    pub async fn openstack(&self) -> Result<Arc<OpenStackClient>> {
        let mut guard = self.openstack.lock().await;
        if let Some(client) = guard.as_ref() {
            return Ok(client.clone());
        }

        let client = Arc::new(OpenStackClient::from_env()?);
        info!(cloud = client.cloud_name(), "OpenStack client initialized");
        *guard = Some(client.clone());
        Ok(client)
    }

    /// Get or lazily create the shared registry.
    pub async fn registry(&self) -> Arc<Registry> {
        let mut guard = self.registry.lock().await;
        if let Some(registry) = guard.as_ref() {
            return registry.clone();
        }

        let registry = Arc::new(Registry::new(self.client.clone()));
        *guard = Some(registry.clone());
        registry
    }

    /// Close connections on shutdown.
    pub async fn close(&self) {
        if let Some(client) = self.openstack.lock().await.take() {
            client.close().await;
        }
    }
}

#[cfg(test)]
#[path = "context_tests.rs"]
mod context_tests;
