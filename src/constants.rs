// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Global constants for the OpenStack operator.
//!
//! This module contains all numeric and string constants used throughout the codebase.
//! Constants are organized by category for easy maintenance.

// ============================================================================
// API Constants
// ============================================================================

/// API group for all operator CRDs
pub const API_GROUP: &str = "sunet.se";

/// API version for all operator CRDs
pub const API_VERSION: &str = "v1alpha1";

/// Fully qualified API version (group/version)
pub const API_GROUP_VERSION: &str = "sunet.se/v1alpha1";

/// Kind name for `OpenstackProject` resource
pub const KIND_PROJECT: &str = "OpenstackProject";

/// Kind name for `OpenstackDomain` resource
pub const KIND_DOMAIN: &str = "OpenstackDomain";

/// Kind name for `OpenstackFlavor` resource
pub const KIND_FLAVOR: &str = "OpenstackFlavor";

/// Kind name for `OpenstackImage` resource
pub const KIND_IMAGE: &str = "OpenstackImage";

/// Kind name for `OpenstackNetwork` resource (provider networks)
pub const KIND_NETWORK: &str = "OpenstackNetwork";

/// Finalizer advertised on every CR; deletion is blocked until the delete
/// handler removes it
pub const FINALIZER: &str = "sunet.se/openstack-operator";

// ============================================================================
// Managed-Resource Markers
// ============================================================================

/// Tag used to identify operator-managed OpenStack resources
pub const MANAGED_BY_TAG: &str = "managed-by-openstack-operator";

/// Description prefix for resources that don't support tags (e.g. groups)
pub const MANAGED_BY_DESCRIPTION_PREFIX: &str = "[managed-by-openstack-operator] ";

// ============================================================================
// Registry Constants
// ============================================================================

/// Name of the ConfigMap holding the managed-resource registry
pub const REGISTRY_CONFIGMAP_NAME: &str = "openstack-operator-managed-resources";

/// Namespace of the registry ConfigMap
pub const REGISTRY_CONFIGMAP_NAMESPACE: &str = "openstack-operator";

// ============================================================================
// Reconciliation Timing Constants
// ============================================================================

/// Requeue delay after a transient reconcile failure (60 seconds)
pub const ERROR_REQUEUE_SECS: u64 = 60;

/// Requeue interval for Ready resources; drives the periodic drift check
pub const DRIFT_CHECK_INTERVAL_SECS: u64 = 300;

/// Requeue interval for images still importing (the status poll)
pub const IMAGE_POLL_INTERVAL_SECS: u64 = 30;

/// Truncation limit for error messages written into conditions
pub const CONDITION_MESSAGE_MAX_LEN: usize = 200;

// ============================================================================
// Garbage Collection Constants
// ============================================================================

/// Default interval between project GC ticks (10 minutes)
pub const DEFAULT_GC_INTERVAL_SECS: u64 = 600;

/// Default interval between cluster-scoped GC ticks (10 minutes)
pub const DEFAULT_CLUSTER_GC_INTERVAL_SECS: u64 = 600;

/// Default domain scanned for tag-marked orphan projects
pub const DEFAULT_MANAGED_DOMAIN: &str = "sso-users";

/// Grace period for GC daemons to exit on shutdown
pub const GC_SHUTDOWN_GRACE_SECS: u64 = 10;

// ============================================================================
// OpenStack Client Constants
// ============================================================================

/// Default cloud name in clouds.yaml
pub const DEFAULT_CLOUD_NAME: &str = "openstack";

/// Default maximum concurrent OpenStack API calls
pub const DEFAULT_MAX_CONCURRENT_CALLS: usize = 10;

/// Default OpenStack API requests per second (averaged)
pub const DEFAULT_REQUESTS_PER_SECOND: f64 = 20.0;

/// Maximum retries for transient OpenStack API failures
pub const OPENSTACK_MAX_RETRIES: u32 = 3;

/// Initial retry delay for OpenStack API failures (1 second)
pub const OPENSTACK_RETRY_INITIAL_SECS: f64 = 1.0;

/// Exponential growth factor between OpenStack retries
pub const OPENSTACK_RETRY_BACKOFF: f64 = 2.0;

/// Federation protocol id; single-protocol deployments only
pub const FEDERATION_PROTOCOL_ID: &str = "openid";

/// Implicit role assigned to every project's user group
pub const MEMBER_ROLE: &str = "member";

// ============================================================================
// Leader Election Constants
// ============================================================================

/// Default leader election lease duration (15 seconds)
pub const DEFAULT_LEASE_DURATION_SECS: u64 = 15;

/// Default leader election retry period (2 seconds)
pub const DEFAULT_LEASE_RETRY_PERIOD_SECS: u64 = 2;

// ============================================================================
// Runtime Constants
// ============================================================================

/// Number of worker threads for Tokio runtime
pub const TOKIO_WORKER_THREADS: usize = 4;

// ============================================================================
// Metrics Server Constants
// ============================================================================

/// Default port for the Prometheus metrics HTTP server
pub const DEFAULT_METRICS_PORT: u16 = 9090;

/// Path for Prometheus metrics endpoint
pub const METRICS_SERVER_PATH: &str = "/metrics";

/// Bind address for metrics HTTP server
pub const METRICS_SERVER_BIND_ADDRESS: &str = "0.0.0.0";

/// Operator version advertised in the info metric
pub const OPERATOR_VERSION: &str = env!("CARGO_PKG_VERSION");
