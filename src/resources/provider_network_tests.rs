// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Unit tests for `provider_network.rs`

#[cfg(test)]
mod tests {
    use super::super::provider_network_needs_recreate;
    use crate::crd::{OpenstackNetworkSpec, ProviderSubnetSpec, ProviderSubnetStatus};
    use crate::openstack::Network;

    fn spec() -> OpenstackNetworkSpec {
        serde_json::from_value(serde_json::json!({
            "name": "physnet1",
            "providerNetworkType": "vlan",
            "providerPhysicalNetwork": "physnet1",
            "providerSegmentationId": 100,
            "external": true,
            "shared": false,
            "subnets": [{"name": "physnet1-v4", "cidr": "192.0.2.0/24"}]
        }))
        .unwrap()
    }

    fn remote() -> Network {
        serde_json::from_value(serde_json::json!({
            "id": "n1",
            "name": "physnet1",
            "router:external": true,
            "shared": false,
            "provider:network_type": "vlan",
            "provider:physical_network": "physnet1",
            "provider:segmentation_id": 100,
            "subnets": ["s1"]
        }))
        .unwrap()
    }

    fn remote_subnets() -> Vec<ProviderSubnetStatus> {
        vec![ProviderSubnetStatus {
            name: "physnet1-v4".into(),
            subnet_id: Some("s1".into()),
        }]
    }

    #[test]
    fn test_matching_network_needs_no_recreate() {
        assert!(!provider_network_needs_recreate(
            &spec(),
            &remote(),
            &remote_subnets()
        ));
    }

    #[test]
    fn test_provider_attribute_changes_trigger_recreate() {
        let mut s = spec();
        s.provider_network_type = "vxlan".into();
        assert!(provider_network_needs_recreate(&s, &remote(), &remote_subnets()));

        let mut s = spec();
        s.provider_segmentation_id = Some(200);
        assert!(provider_network_needs_recreate(&s, &remote(), &remote_subnets()));

        let mut s = spec();
        s.external = false;
        assert!(provider_network_needs_recreate(&s, &remote(), &remote_subnets()));

        let mut s = spec();
        s.shared = true;
        assert!(provider_network_needs_recreate(&s, &remote(), &remote_subnets()));
    }

    #[test]
    fn test_subnet_layout_change_triggers_recreate() {
        let mut s = spec();
        s.subnets.push(ProviderSubnetSpec {
            name: "physnet1-v4-b".into(),
            cidr: "198.51.100.0/24".into(),
            gateway_ip: None,
            enable_dhcp: true,
            dns_nameservers: vec![],
            allocation_pools: vec![],
        });

        assert!(provider_network_needs_recreate(&s, &remote(), &remote_subnets()));
    }

    #[test]
    fn test_subnet_order_does_not_matter() {
        let mut s = spec();
        s.subnets.push(ProviderSubnetSpec {
            name: "b".into(),
            cidr: "198.51.100.0/24".into(),
            gateway_ip: None,
            enable_dhcp: true,
            dns_nameservers: vec![],
            allocation_pools: vec![],
        });
        s.subnets.reverse();

        let remote_subnets = vec![
            ProviderSubnetStatus {
                name: "b".into(),
                subnet_id: Some("s2".into()),
            },
            ProviderSubnetStatus {
                name: "physnet1-v4".into(),
                subnet_id: Some("s1".into()),
            },
        ];

        assert!(!provider_network_needs_recreate(&s, &remote(), &remote_subnets));
    }
}
