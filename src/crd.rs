// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Custom Resource Definitions (CRDs) for OpenStack tenant management.
//!
//! This module defines all Kubernetes Custom Resource Definitions used by the
//! operator to manage OpenStack resources declaratively.
//!
//! # Resource Types
//!
//! ## Namespace-scoped
//!
//! - [`OpenstackProject`] - A tenant: project, user group, quotas, tenant
//!   networks, security groups, role bindings and federation mapping
//!
//! ## Cluster-scoped
//!
//! - [`OpenstackDomain`] - A Keystone identity domain
//! - [`OpenstackFlavor`] - A compute flavor (immutable core attributes)
//! - [`OpenstackImage`] - A Glance image, managed (web-download import) or
//!   external (settings-only)
//! - [`OpenstackNetwork`] - An admin provider network with subnets
//!
//! # Example: Creating a Project
//!
//! ```rust,no_run
//! use openstack_operator::crd::{OpenstackProjectSpec, ProjectNetworkSpec};
//!
//! let spec = OpenstackProjectSpec {
//!     name: "alpha.example.se".to_string(),
//!     domain: "sso-users".to_string(),
//!     description: Some("Tenant alpha".to_string()),
//!     enabled: true,
//!     quotas: None,
//!     networks: vec![ProjectNetworkSpec {
//!         name: "internal".to_string(),
//!         cidr: "10.0.0.0/24".to_string(),
//!         enable_dhcp: true,
//!         dns_nameservers: vec![],
//!         router: None,
//!     }],
//!     security_groups: vec![],
//!     role_bindings: vec![],
//!     federation_ref: None,
//! };
//! ```

use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

fn default_true() -> bool {
    true
}

fn default_ethertype() -> String {
    "IPv4".to_string()
}

fn default_visibility() -> String {
    "private".to_string()
}

fn default_container_format() -> String {
    "bare".to_string()
}

fn default_network_type() -> String {
    "flat".to_string()
}

/// Lifecycle phase of a managed resource.
///
/// Every CR kind shares the same phase progression:
/// `Pending` → `Provisioning` → `Ready`, with `Error` on failure.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub enum Phase {
    /// Not yet reconciled, or cleared for recreation after drift
    #[default]
    Pending,
    /// Reconciliation in progress (or an async import still running)
    Provisioning,
    /// Observed state matches the declared state
    Ready,
    /// Last reconcile failed; see the `Ready` condition for details
    Error,
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Phase::Pending => "Pending",
            Phase::Provisioning => "Provisioning",
            Phase::Ready => "Ready",
            Phase::Error => "Error",
        };
        f.write_str(s)
    }
}

/// Condition represents an observation of a resource's current state.
///
/// One entry per `type`; `lastTransitionTime` moves only when `status`
/// changes.
#[derive(Clone, Debug, Serialize, Deserialize, Default, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Condition {
    /// Type of condition, e.g. `Ready`, `ProjectReady`, `NetworksReady`.
    pub r#type: String,

    /// Status of the condition: True, False, or Unknown.
    pub status: String,

    /// Brief CamelCase reason for the condition's last transition.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,

    /// Human-readable message indicating details about the transition.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    /// Last time the condition transitioned from one status to another (RFC3339).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_transition_time: Option<String>,
}

// ============================================================================
// OpenstackProject
// ============================================================================

/// Compute quota knobs; field names map onto Nova quota-set keys.
#[derive(Clone, Debug, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ComputeQuotas {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instances: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cores: Option<i64>,
    /// RAM quota in megabytes (maps to `ram`)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ram_mb: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub server_groups: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub server_group_members: Option<i64>,
}

/// Block-storage quota knobs; field names map onto Cinder quota-set keys.
#[derive(Clone, Debug, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct StorageQuotas {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub volumes: Option<i64>,
    /// Total volume capacity in gigabytes (maps to `gigabytes`)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub volumes_gb: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub snapshots: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backups: Option<i64>,
    /// Total backup capacity in gigabytes (maps to `backup_gigabytes`)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backups_gb: Option<i64>,
}

/// Network quota knobs; field names map onto Neutron quota keys.
#[derive(Clone, Debug, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct NetworkQuotas {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub floating_ips: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub networks: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subnets: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub routers: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ports: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub security_groups: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub security_group_rules: Option<i64>,
}

/// Per-service quota sub-maps. Absent sub-maps are skipped during apply.
#[derive(Clone, Debug, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProjectQuotas {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub compute: Option<ComputeQuotas>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub storage: Option<StorageQuotas>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub network: Option<NetworkQuotas>,
}

/// Router attached to a tenant network's subnet.
#[derive(Clone, Debug, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct RouterSpec {
    /// Name of the external network to use as gateway; no gateway when absent
    #[serde(skip_serializing_if = "Option::is_none")]
    pub external_network: Option<String>,

    /// Enable source NAT on the gateway
    #[serde(default = "default_true")]
    pub enable_snat: bool,
}

/// A tenant network with one subnet and an optional router.
///
/// The subnet is named `{name}-subnet` and the router `{name}-router`.
#[derive(Clone, Debug, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProjectNetworkSpec {
    /// Network name, unique within the project
    pub name: String,

    /// IPv4 CIDR for the subnet, e.g. `10.0.0.0/24`
    pub cidr: String,

    /// Enable DHCP on the subnet
    #[serde(default = "default_true")]
    pub enable_dhcp: bool,

    /// DNS nameservers pushed to the subnet
    #[serde(default)]
    pub dns_nameservers: Vec<String>,

    /// Optional router with external gateway
    #[serde(skip_serializing_if = "Option::is_none")]
    pub router: Option<RouterSpec>,
}

/// One security group rule.
#[derive(Clone, Debug, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SecurityGroupRuleSpec {
    /// Traffic direction: `ingress` or `egress`
    pub direction: String,

    /// IP protocol (`tcp`, `udp`, `icmp`, ...); `any` or absent matches all
    #[serde(skip_serializing_if = "Option::is_none")]
    pub protocol: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub port_range_min: Option<i32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub port_range_max: Option<i32>,

    /// Remote CIDR the rule applies to
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remote_ip_prefix: Option<String>,

    /// Name of another security group in the same CR; resolved to its id
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remote_group_name: Option<String>,

    #[serde(default = "default_ethertype")]
    pub ethertype: String,
}

/// A security group with its rule graph.
#[derive(Clone, Debug, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SecurityGroupSpec {
    pub name: String,

    #[serde(default)]
    pub description: String,

    #[serde(default)]
    pub rules: Vec<SecurityGroupRuleSpec>,
}

/// Assignment of a role to the project's user group, plus optional explicit
/// groups and users.
#[derive(Clone, Debug, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct RoleBindingSpec {
    /// Keystone role name, e.g. `member`
    pub role: String,

    /// Users synced into the project's user group (by username / OIDC sub)
    #[serde(default)]
    pub users: Vec<String>,

    /// Additional explicit groups to assign the role to
    #[serde(default)]
    pub groups: Vec<String>,

    /// Domain the users live in; defaults to the project domain
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_domain: Option<String>,

    /// Domain the explicit groups live in; defaults to the project domain
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group_domain: Option<String>,
}

/// Pointer to the ConfigMap holding federation (OIDC) settings.
///
/// The ConfigMap carries keys `idp-name`, `idp-remote-id` and `sso-domain`.
#[derive(Clone, Debug, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct FederationRef {
    pub config_map_name: String,

    /// Defaults to the CR's namespace
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config_map_namespace: Option<String>,
}

/// Recorded ids of one tenant network.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct NetworkStatus {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub network_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subnet_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub router_id: Option<String>,
}

/// Recorded id of one security group.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SecurityGroupStatus {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
}

/// `OpenstackProject` status
#[derive(Clone, Debug, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct OpenstackProjectStatus {
    #[serde(default)]
    pub phase: Phase,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub observed_generation: Option<i64>,
    #[serde(default)]
    pub conditions: Vec<Condition>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_sync_time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group_id: Option<String>,
    #[serde(default)]
    pub networks: Vec<NetworkStatus>,
    #[serde(default)]
    pub security_groups: Vec<SecurityGroupStatus>,
}

/// `OpenstackProject` declares a tenant: a Keystone project with its user
/// group, quotas, tenant networks, security groups, role bindings and an
/// optional federation mapping.
#[derive(CustomResource, Clone, Debug, Serialize, Deserialize, JsonSchema)]
#[kube(
    group = "sunet.se",
    version = "v1alpha1",
    kind = "OpenstackProject",
    namespaced,
    shortname = "osproject",
    doc = "OpenstackProject declares an OpenStack tenant reconciled by the operator.",
    printcolumn = r#"{"name":"Project","type":"string","jsonPath":".spec.name"}"#,
    printcolumn = r#"{"name":"Domain","type":"string","jsonPath":".spec.domain"}"#,
    printcolumn = r#"{"name":"Phase","type":"string","jsonPath":".status.phase"}"#,
    printcolumn = r#"{"name":"Age","type":"date","jsonPath":".metadata.creationTimestamp"}"#
)]
#[kube(status = "OpenstackProjectStatus")]
#[serde(rename_all = "camelCase")]
pub struct OpenstackProjectSpec {
    /// OpenStack project name; also drives the derived user-group name
    pub name: String,

    /// Keystone domain the project and its group live in
    pub domain: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub quotas: Option<ProjectQuotas>,

    #[serde(default)]
    pub networks: Vec<ProjectNetworkSpec>,

    #[serde(default)]
    pub security_groups: Vec<SecurityGroupSpec>,

    #[serde(default)]
    pub role_bindings: Vec<RoleBindingSpec>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub federation_ref: Option<FederationRef>,
}

// ============================================================================
// OpenstackDomain
// ============================================================================

/// `OpenstackDomain` status
#[derive(Clone, Debug, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct OpenstackDomainStatus {
    #[serde(default)]
    pub phase: Phase,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub observed_generation: Option<i64>,
    #[serde(default)]
    pub conditions: Vec<Condition>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_sync_time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub domain_id: Option<String>,
}

/// `OpenstackDomain` declares a Keystone identity domain.
///
/// Domains must be disabled before they can be deleted; the operator handles
/// that during teardown.
#[derive(CustomResource, Clone, Debug, Serialize, Deserialize, JsonSchema)]
#[kube(
    group = "sunet.se",
    version = "v1alpha1",
    kind = "OpenstackDomain",
    shortname = "osdomain",
    printcolumn = r#"{"name":"Domain","type":"string","jsonPath":".spec.name"}"#,
    printcolumn = r#"{"name":"Phase","type":"string","jsonPath":".status.phase"}"#,
    printcolumn = r#"{"name":"Age","type":"date","jsonPath":".metadata.creationTimestamp"}"#
)]
#[kube(status = "OpenstackDomainStatus")]
#[serde(rename_all = "camelCase")]
pub struct OpenstackDomainSpec {
    /// Keystone domain name
    pub name: String,

    #[serde(default)]
    pub description: String,

    #[serde(default = "default_true")]
    pub enabled: bool,
}

// ============================================================================
// OpenstackFlavor
// ============================================================================

/// `OpenstackFlavor` status
#[derive(Clone, Debug, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct OpenstackFlavorStatus {
    #[serde(default)]
    pub phase: Phase,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub observed_generation: Option<i64>,
    #[serde(default)]
    pub conditions: Vec<Condition>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_sync_time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flavor_id: Option<String>,
}

/// `OpenstackFlavor` declares a compute flavor.
///
/// Core attributes (vcpus, ram, disk, ephemeral, swap, isPublic) are
/// immutable at the remote; changing any of them makes the operator delete
/// and recreate the flavor. Only `extraSpecs` can change in place.
#[derive(CustomResource, Clone, Debug, Serialize, Deserialize, JsonSchema)]
#[kube(
    group = "sunet.se",
    version = "v1alpha1",
    kind = "OpenstackFlavor",
    shortname = "osflavor",
    printcolumn = r#"{"name":"Flavor","type":"string","jsonPath":".spec.name"}"#,
    printcolumn = r#"{"name":"VCPUs","type":"integer","jsonPath":".spec.vcpus"}"#,
    printcolumn = r#"{"name":"RAM","type":"integer","jsonPath":".spec.ram"}"#,
    printcolumn = r#"{"name":"Phase","type":"string","jsonPath":".status.phase"}"#
)]
#[kube(status = "OpenstackFlavorStatus")]
#[serde(rename_all = "camelCase")]
pub struct OpenstackFlavorSpec {
    /// Flavor name, unique cloud-wide
    pub name: String,

    pub vcpus: i64,

    /// RAM in megabytes
    pub ram: i64,

    /// Root disk in gigabytes
    #[serde(default)]
    pub disk: i64,

    /// Ephemeral disk in gigabytes
    #[serde(default)]
    pub ephemeral: i64,

    /// Swap in megabytes
    #[serde(default)]
    pub swap: i64,

    #[serde(default = "default_true")]
    pub is_public: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Scheduler hints etc.; the only in-place-mutable attribute
    #[serde(default)]
    pub extra_specs: BTreeMap<String, String>,
}

// ============================================================================
// OpenstackImage
// ============================================================================

/// Where the image bytes come from for a managed image.
#[derive(Clone, Debug, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ImageSource {
    /// URL fetched server-side via the web-download import method
    pub url: String,
}

/// Image payload description for managed images.
#[derive(Clone, Debug, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ImageContent {
    /// Disk format, e.g. `qcow2`, `raw`
    pub disk_format: String,

    #[serde(default = "default_container_format")]
    pub container_format: String,

    pub source: ImageSource,
}

/// `OpenstackImage` status
#[derive(Clone, Debug, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct OpenstackImageStatus {
    #[serde(default)]
    pub phase: Phase,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub observed_generation: Option<i64>,
    #[serde(default)]
    pub conditions: Vec<Condition>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_sync_time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_id: Option<String>,
    /// Remote image state (`queued`, `saving`, `active`, `killed`, ...)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub upload_status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub checksum: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size_bytes: Option<i64>,
}

/// `OpenstackImage` declares a Glance image.
///
/// Two modes: managed images are created by the operator and imported
/// asynchronously from `content.source.url`; external images
/// (`external: true`) are never created or deleted, the operator only
/// asserts visibility/protected/tags/properties on a pre-existing image.
#[derive(CustomResource, Clone, Debug, Serialize, Deserialize, JsonSchema)]
#[kube(
    group = "sunet.se",
    version = "v1alpha1",
    kind = "OpenstackImage",
    shortname = "osimage",
    printcolumn = r#"{"name":"Image","type":"string","jsonPath":".spec.name"}"#,
    printcolumn = r#"{"name":"Upload","type":"string","jsonPath":".status.uploadStatus"}"#,
    printcolumn = r#"{"name":"Phase","type":"string","jsonPath":".status.phase"}"#
)]
#[kube(status = "OpenstackImageStatus")]
#[serde(rename_all = "camelCase")]
pub struct OpenstackImageSpec {
    /// Glance image name
    pub name: String,

    /// `public`, `private`, `shared` or `community`
    #[serde(default = "default_visibility")]
    pub visibility: String,

    #[serde(default)]
    pub protected: bool,

    #[serde(default)]
    pub tags: Vec<String>,

    /// Free-form image properties (os_distro, hw_disk_bus, ...)
    #[serde(default)]
    pub properties: BTreeMap<String, String>,

    /// Required for managed images; ignored for external ones
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<ImageContent>,

    /// When true the image pre-exists and is not owned by the operator
    #[serde(default)]
    pub external: bool,
}

// ============================================================================
// OpenstackNetwork (provider networks)
// ============================================================================

/// One allocation pool range inside a provider subnet.
#[derive(Clone, Debug, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct AllocationPool {
    pub start: String,
    pub end: String,
}

/// A subnet on a provider network.
#[derive(Clone, Debug, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProviderSubnetSpec {
    pub name: String,

    pub cidr: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub gateway_ip: Option<String>,

    #[serde(default = "default_true")]
    pub enable_dhcp: bool,

    #[serde(default)]
    pub dns_nameservers: Vec<String>,

    #[serde(default)]
    pub allocation_pools: Vec<AllocationPool>,
}

/// Recorded id of one provider subnet.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProviderSubnetStatus {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subnet_id: Option<String>,
}

/// `OpenstackNetwork` status
#[derive(Clone, Debug, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct OpenstackNetworkStatus {
    #[serde(default)]
    pub phase: Phase,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub observed_generation: Option<i64>,
    #[serde(default)]
    pub conditions: Vec<Condition>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_sync_time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub network_id: Option<String>,
    #[serde(default)]
    pub subnets: Vec<ProviderSubnetStatus>,
}

/// `OpenstackNetwork` declares an admin provider network backed by physical
/// infrastructure.
///
/// The provider attributes (type, physical network, segmentation id,
/// external, shared) are immutable; any change triggers delete-then-recreate
/// of the whole network, subnets first.
#[derive(CustomResource, Clone, Debug, Serialize, Deserialize, JsonSchema)]
#[kube(
    group = "sunet.se",
    version = "v1alpha1",
    kind = "OpenstackNetwork",
    shortname = "osnetwork",
    printcolumn = r#"{"name":"Network","type":"string","jsonPath":".spec.name"}"#,
    printcolumn = r#"{"name":"Type","type":"string","jsonPath":".spec.providerNetworkType"}"#,
    printcolumn = r#"{"name":"Phase","type":"string","jsonPath":".status.phase"}"#
)]
#[kube(status = "OpenstackNetworkStatus")]
#[serde(rename_all = "camelCase")]
pub struct OpenstackNetworkSpec {
    /// Provider network name
    pub name: String,

    /// `flat`, `vlan`, `vxlan`, `gre` or `geneve`
    #[serde(default = "default_network_type")]
    pub provider_network_type: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider_physical_network: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider_segmentation_id: Option<i64>,

    /// Routable from tenant routers when true
    #[serde(default)]
    pub external: bool,

    /// Visible to all projects when true
    #[serde(default)]
    pub shared: bool,

    #[serde(default)]
    pub description: String,

    #[serde(default)]
    pub subnets: Vec<ProviderSubnetSpec>,
}

#[cfg(test)]
#[path = "crd_tests.rs"]
mod crd_tests;
