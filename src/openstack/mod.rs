// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! OpenStack client: a typed wrapper over the OpenStack REST APIs.
//!
//! All remote calls go through a single [`OpenStackClient::call`] primitive
//! that (1) acquires a rate-limit slot, (2) times the call, (3) retries
//! transient failures with exponential backoff and (4) records metrics.
//! Individual operations never carry their own retry code.
//!
//! The client holds one lazily initialised Keystone session (token plus
//! service catalog) behind an async lock; it is recreated on 401 and on
//! [`OpenStackClient::close`]. The client is cheap to share via `Arc` and
//! safe to use from concurrent reconcilers.
//!
//! Operation groups live in their own files:
//!
//! - [`identity`] - domains, projects, groups, users, roles, federation
//! - [`compute`] - flavors and compute quotas
//! - [`image`] - images and web-download imports
//! - [`network`] - networks, subnets, routers, security groups, provider
//!   networks and network quotas

pub mod auth;
pub mod compute;
pub mod error;
pub mod identity;
pub mod image;
pub mod network;
pub mod ratelimit;
pub mod retry;
pub mod types;

pub use ratelimit::RateLimiter;
pub use retry::RetryPolicy;
pub use types::*;

use auth::{authenticate, load_cloud_config, CloudConfig, Session};
use error::OpenStackError;
use reqwest::Method;
use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

/// Catalog service types the operator talks to.
pub(crate) const SERVICE_IDENTITY: &str = "identity";
pub(crate) const SERVICE_COMPUTE: &str = "compute";
pub(crate) const SERVICE_IMAGE: &str = "image";
pub(crate) const SERVICE_NETWORK: &str = "network";
pub(crate) const SERVICE_VOLUME: &str = "volumev3";

/// Typed wrapper around the OpenStack REST APIs with retry, rate limiting
/// and idempotent-lookup helpers.
pub struct OpenStackClient {
    http: reqwest::Client,
    config: CloudConfig,
    cloud_name: String,
    session: RwLock<Option<Arc<Session>>>,
    limiter: RateLimiter,
    retry: RetryPolicy,
}

impl OpenStackClient {
    /// Build a client from the environment.
    ///
    /// Reads `OS_CLOUD` (default `openstack`) and `OS_CLIENT_CONFIG_FILE`
    /// for the clouds.yaml path, plus the rate-limit knobs
    /// `OPENSTACK_MAX_CONCURRENT_CALLS` and `OPENSTACK_REQUESTS_PER_SECOND`.
    ///
    /// # Errors
    ///
    /// Returns an error when the clouds config is missing or unparseable.
    pub fn from_env() -> Result<Self, OpenStackError> {
        let cloud_name = std::env::var("OS_CLOUD")
            .unwrap_or_else(|_| crate::constants::DEFAULT_CLOUD_NAME.to_string());
        let config_path = std::env::var("OS_CLIENT_CONFIG_FILE")
            .map(PathBuf::from)
            .map_err(|_| {
                OpenStackError::Config("OS_CLIENT_CONFIG_FILE is not set".to_string())
            })?;

        let max_concurrent = std::env::var("OPENSTACK_MAX_CONCURRENT_CALLS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(crate::constants::DEFAULT_MAX_CONCURRENT_CALLS);
        let requests_per_second = std::env::var("OPENSTACK_REQUESTS_PER_SECOND")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(crate::constants::DEFAULT_REQUESTS_PER_SECOND);

        let config = load_cloud_config(&config_path, &cloud_name)?;
        Ok(Self::new(
            config,
            cloud_name,
            max_concurrent,
            requests_per_second,
        ))
    }

    /// Build a client from an explicit cloud configuration.
    #[must_use]
    pub fn new(
        config: CloudConfig,
        cloud_name: String,
        max_concurrent: usize,
        requests_per_second: f64,
    ) -> Self {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .unwrap_or_default();

        Self {
            http,
            config,
            cloud_name,
            session: RwLock::new(None),
            limiter: RateLimiter::new(max_concurrent, requests_per_second),
            retry: RetryPolicy::default(),
        }
    }

    /// Name of the configured cloud, used for the operator info metric.
    #[must_use]
    pub fn cloud_name(&self) -> &str {
        &self.cloud_name
    }

    /// Override the retry policy; tests use short delays.
    #[must_use]
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Get or create the Keystone session.
    async fn session(&self) -> Result<Arc<Session>, OpenStackError> {
        if let Some(session) = self.session.read().await.as_ref() {
            return Ok(session.clone());
        }

        let mut guard = self.session.write().await;
        // Another task may have authenticated while we waited for the lock
        if let Some(session) = guard.as_ref() {
            return Ok(session.clone());
        }

        info!(cloud = %self.cloud_name, "Connecting to OpenStack cloud");
        let session = Arc::new(authenticate(&self.http, &self.config).await?);
        *guard = Some(session.clone());
        Ok(session)
    }

    /// Drop the cached session so the next call re-authenticates.
    async fn invalidate_session(&self) {
        *self.session.write().await = None;
    }

    /// Close the connection. The next call re-authenticates from scratch.
    pub async fn close(&self) {
        self.invalidate_session().await;
    }

    /// Build a request against a catalog service with the auth token set.
    pub(crate) async fn request(
        &self,
        method: Method,
        service: &str,
        path: &str,
    ) -> Result<reqwest::RequestBuilder, OpenStackError> {
        let session = self.session().await?;
        let base = session.endpoint(service)?;
        let url = format!("{}/{}", base.trim_end_matches('/'), path.trim_start_matches('/'));
        Ok(self
            .http
            .request(method, url)
            .header("X-Auth-Token", session.token.clone()))
    }

    /// Execute one logical API operation: rate limit, time, retry, metrics.
    ///
    /// The closure is re-invoked on each attempt so that a refreshed session
    /// is picked up after a 401.
    ///
    /// # Errors
    ///
    /// Returns the final classified error once retries are exhausted or the
    /// failure is not transient.
    pub(crate) async fn call<T, F, Fut>(
        &self,
        service: &'static str,
        operation: &'static str,
        f: F,
    ) -> Result<T, OpenStackError>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<T, OpenStackError>>,
    {
        let mut attempt: u32 = 0;

        loop {
            let _permit = self.limiter.acquire().await;
            let start = Instant::now();
            let result = f().await;
            let duration = start.elapsed();

            match result {
                Ok(value) => {
                    crate::metrics::record_api_call(service, operation, true, duration);
                    if attempt > 0 {
                        debug!(service, operation, attempt, "API call succeeded after retries");
                    }
                    return Ok(value);
                }
                Err(e) if e.is_transient() && attempt < self.retry.max_retries => {
                    crate::metrics::record_api_call(service, operation, false, duration);
                    crate::metrics::record_api_retry(service, operation);

                    if matches!(e, OpenStackError::Unauthorized) {
                        self.invalidate_session().await;
                    }

                    let delay = self.retry.delay_for(attempt);
                    attempt += 1;
                    warn!(
                        service,
                        operation,
                        attempt,
                        retry_in = ?delay,
                        error = %e,
                        "Transient API failure, will retry"
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) => {
                    crate::metrics::record_api_call(service, operation, false, duration);
                    return Err(e);
                }
            }
        }
    }
}

impl std::fmt::Debug for OpenStackClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenStackClient")
            .field("cloud", &self.cloud_name)
            .field("limiter", &self.limiter)
            .finish()
    }
}

#[cfg(test)]
#[path = "client_tests.rs"]
mod client_tests;
