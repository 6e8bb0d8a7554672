// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Wire types for the OpenStack REST APIs.
//!
//! Only the fields the operator reads or writes are modelled; everything
//! else in the remote payloads is ignored during deserialization.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// ============================================================================
// Identity (Keystone)
// ============================================================================

/// A Keystone identity domain.
#[derive(Clone, Debug, Deserialize)]
pub struct Domain {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub enabled: bool,
}

#[derive(Deserialize)]
pub(crate) struct DomainEnvelope {
    pub domain: Domain,
}

#[derive(Deserialize)]
pub(crate) struct DomainListEnvelope {
    pub domains: Vec<Domain>,
}

/// A Keystone project (tenant).
#[derive(Clone, Debug, Deserialize)]
pub struct Project {
    pub id: String,
    pub name: String,
    pub domain_id: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub tags: Vec<String>,
}

#[derive(Deserialize)]
pub(crate) struct ProjectEnvelope {
    pub project: Project,
}

#[derive(Deserialize)]
pub(crate) struct ProjectListEnvelope {
    pub projects: Vec<Project>,
}

/// A Keystone group.
#[derive(Clone, Debug, Deserialize)]
pub struct Group {
    pub id: String,
    pub name: String,
    pub domain_id: String,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Deserialize)]
pub(crate) struct GroupEnvelope {
    pub group: Group,
}

#[derive(Deserialize)]
pub(crate) struct GroupListEnvelope {
    pub groups: Vec<Group>,
}

/// A Keystone user.
#[derive(Clone, Debug, Deserialize)]
pub struct User {
    pub id: String,
    pub name: String,
}

#[derive(Deserialize)]
pub(crate) struct UserListEnvelope {
    pub users: Vec<User>,
}

/// A Keystone role.
#[derive(Clone, Debug, Deserialize)]
pub struct Role {
    pub id: String,
    pub name: String,
}

#[derive(Deserialize)]
pub(crate) struct RoleListEnvelope {
    pub roles: Vec<Role>,
}

// ============================================================================
// Federation (OS-FEDERATION)
// ============================================================================

/// An identity provider registered with Keystone.
#[derive(Clone, Debug, Deserialize)]
pub struct IdentityProvider {
    pub id: String,
    #[serde(default)]
    pub remote_ids: Vec<String>,
    #[serde(default)]
    pub enabled: bool,
}

#[derive(Deserialize)]
pub(crate) struct IdentityProviderEnvelope {
    pub identity_provider: IdentityProvider,
}

/// Domain reference inside a mapping rule (`{"name": "sso-domain"}`).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MappingDomainRef {
    pub name: String,
}

/// The ephemeral user side of a mapping rule's `local` entry.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MappingUser {
    pub name: String,
    pub domain: MappingDomainRef,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub r#type: Option<String>,
}

/// The group side of a mapping rule's `local` entry.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MappingGroup {
    pub name: String,
    pub domain: MappingDomainRef,
}

/// One `local` entry; Keystone allows either a user or a group per entry.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MappingLocal {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<MappingUser>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group: Option<MappingGroup>,
}

/// One `remote` matcher of a mapping rule.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MappingRemote {
    pub r#type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub any_one_of: Option<Vec<String>>,
}

/// One federation mapping rule.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MappingRule {
    #[serde(default)]
    pub local: Vec<MappingLocal>,
    #[serde(default)]
    pub remote: Vec<MappingRemote>,
}

/// The shared federation mapping document.
#[derive(Clone, Debug, Deserialize)]
pub struct Mapping {
    pub id: String,
    #[serde(default)]
    pub rules: Vec<MappingRule>,
}

#[derive(Deserialize)]
pub(crate) struct MappingEnvelope {
    pub mapping: Mapping,
}

/// A federation protocol binding an IdP to a mapping.
#[derive(Clone, Debug, Deserialize)]
pub struct FederationProtocol {
    pub id: String,
    pub mapping_id: String,
}

#[derive(Deserialize)]
pub(crate) struct FederationProtocolEnvelope {
    pub protocol: FederationProtocol,
}

// ============================================================================
// Compute (Nova)
// ============================================================================

/// Nova returns `swap` as an empty string on older microversions.
fn deserialize_swap<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Swap {
        Int(i64),
        Text(String),
    }

    match Swap::deserialize(deserializer)? {
        Swap::Int(v) => Ok(v),
        Swap::Text(s) if s.is_empty() => Ok(0),
        Swap::Text(s) => s.parse().map_err(serde::de::Error::custom),
    }
}

/// A compute flavor.
#[derive(Clone, Debug, Deserialize)]
pub struct Flavor {
    pub id: String,
    pub name: String,
    pub vcpus: i64,
    pub ram: i64,
    pub disk: i64,
    #[serde(rename = "OS-FLV-EXT-DATA:ephemeral", default)]
    pub ephemeral: i64,
    #[serde(deserialize_with = "deserialize_swap", default)]
    pub swap: i64,
    #[serde(rename = "os-flavor-access:is_public", default)]
    pub is_public: bool,
}

#[derive(Deserialize)]
pub(crate) struct FlavorEnvelope {
    pub flavor: Flavor,
}

#[derive(Deserialize)]
pub(crate) struct FlavorListEnvelope {
    pub flavors: Vec<Flavor>,
}

// ============================================================================
// Image (Glance)
// ============================================================================

/// A Glance image. Glance v2 returns a flat document, no envelope.
#[derive(Clone, Debug, Deserialize)]
pub struct Image {
    pub id: String,
    pub name: Option<String>,
    /// `queued`, `saving`, `importing`, `active`, `killed`, `deleted`, ...
    pub status: String,
    #[serde(default)]
    pub visibility: Option<String>,
    #[serde(default)]
    pub protected: bool,
    #[serde(default)]
    pub checksum: Option<String>,
    #[serde(default)]
    pub size: Option<i64>,
    #[serde(default)]
    pub tags: Vec<String>,
}

#[derive(Deserialize)]
pub(crate) struct ImageListEnvelope {
    pub images: Vec<Image>,
}

/// Parameters for creating a Glance image.
#[derive(Clone, Debug)]
pub struct ImageCreate {
    pub name: String,
    pub disk_format: String,
    pub container_format: String,
    pub visibility: String,
    pub protected: bool,
    pub tags: Vec<String>,
    pub properties: BTreeMap<String, String>,
}

/// Mutable image settings asserted on both managed and external images.
#[derive(Clone, Debug)]
pub struct ImageSettings {
    pub visibility: String,
    pub protected: bool,
    pub tags: Vec<String>,
    pub properties: BTreeMap<String, String>,
}

// ============================================================================
// Network (Neutron)
// ============================================================================

/// A Neutron network, tenant or provider.
#[derive(Clone, Debug, Deserialize)]
pub struct Network {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub project_id: Option<String>,
    #[serde(rename = "router:external", default)]
    pub external: bool,
    #[serde(default)]
    pub shared: bool,
    #[serde(rename = "provider:network_type", default)]
    pub provider_network_type: Option<String>,
    #[serde(rename = "provider:physical_network", default)]
    pub provider_physical_network: Option<String>,
    #[serde(rename = "provider:segmentation_id", default)]
    pub provider_segmentation_id: Option<i64>,
    /// Ids of the subnets on this network
    #[serde(default)]
    pub subnets: Vec<String>,
}

#[derive(Deserialize)]
pub(crate) struct NetworkEnvelope {
    pub network: Network,
}

#[derive(Deserialize)]
pub(crate) struct NetworkListEnvelope {
    pub networks: Vec<Network>,
}

/// Parameters for creating a provider network.
#[derive(Clone, Debug)]
pub struct ProviderNetworkCreate {
    pub name: String,
    pub network_type: String,
    pub physical_network: Option<String>,
    pub segmentation_id: Option<i64>,
    pub external: bool,
    pub shared: bool,
    pub description: String,
}

/// A Neutron subnet.
#[derive(Clone, Debug, Deserialize)]
pub struct Subnet {
    pub id: String,
    pub name: String,
    pub network_id: String,
    pub cidr: String,
    #[serde(default)]
    pub gateway_ip: Option<String>,
    #[serde(default)]
    pub enable_dhcp: bool,
    #[serde(default)]
    pub dns_nameservers: Vec<String>,
}

#[derive(Deserialize)]
pub(crate) struct SubnetEnvelope {
    pub subnet: Subnet,
}

#[derive(Deserialize)]
pub(crate) struct SubnetListEnvelope {
    pub subnets: Vec<Subnet>,
}

/// One allocation pool range passed to subnet creation.
#[derive(Clone, Debug, Serialize)]
pub struct AllocationPoolRange {
    pub start: String,
    pub end: String,
}

/// Parameters for creating a subnet.
#[derive(Clone, Debug, Default)]
pub struct SubnetCreate {
    pub name: String,
    pub network_id: String,
    pub cidr: String,
    pub gateway_ip: Option<String>,
    pub enable_dhcp: bool,
    pub dns_nameservers: Vec<String>,
    pub allocation_pools: Option<Vec<AllocationPoolRange>>,
    pub tags: Vec<String>,
}

/// A Neutron router.
#[derive(Clone, Debug, Deserialize)]
pub struct Router {
    pub id: String,
    pub name: String,
}

#[derive(Deserialize)]
pub(crate) struct RouterEnvelope {
    pub router: Router,
}

#[derive(Deserialize)]
pub(crate) struct RouterListEnvelope {
    pub routers: Vec<Router>,
}

/// A Neutron security group.
#[derive(Clone, Debug, Deserialize)]
pub struct SecurityGroup {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Deserialize)]
pub(crate) struct SecurityGroupEnvelope {
    pub security_group: SecurityGroup,
}

#[derive(Deserialize)]
pub(crate) struct SecurityGroupListEnvelope {
    pub security_groups: Vec<SecurityGroup>,
}

/// Parameters for creating a security group rule.
#[derive(Clone, Debug, Default)]
pub struct SecurityGroupRuleCreate {
    pub security_group_id: String,
    pub direction: String,
    pub protocol: Option<String>,
    pub port_range_min: Option<i32>,
    pub port_range_max: Option<i32>,
    pub remote_ip_prefix: Option<String>,
    pub remote_group_id: Option<String>,
    pub ethertype: String,
}

#[cfg(test)]
#[path = "types_tests.rs"]
mod types_tests;
