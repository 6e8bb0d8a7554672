// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Unit tests for `types.rs`

#[cfg(test)]
mod tests {
    use super::super::{Flavor, MappingRule, Network};

    #[test]
    fn test_flavor_deserializes_nova_extensions() {
        let flavor: Flavor = serde_json::from_value(serde_json::json!({
            "id": "f1",
            "name": "m1",
            "vcpus": 2,
            "ram": 2048,
            "disk": 20,
            "OS-FLV-EXT-DATA:ephemeral": 10,
            "swap": 512,
            "os-flavor-access:is_public": true
        }))
        .unwrap();

        assert_eq!(flavor.ephemeral, 10);
        assert_eq!(flavor.swap, 512);
        assert!(flavor.is_public);
    }

    #[test]
    fn test_flavor_swap_empty_string_maps_to_zero() {
        let flavor: Flavor = serde_json::from_value(serde_json::json!({
            "id": "f1",
            "name": "m1",
            "vcpus": 1,
            "ram": 512,
            "disk": 1,
            "swap": ""
        }))
        .unwrap();

        assert_eq!(flavor.swap, 0);
        assert_eq!(flavor.ephemeral, 0);
    }

    #[test]
    fn test_network_provider_attributes() {
        let network: Network = serde_json::from_value(serde_json::json!({
            "id": "n1",
            "name": "physnet1",
            "router:external": true,
            "shared": false,
            "provider:network_type": "vlan",
            "provider:physical_network": "physnet1",
            "provider:segmentation_id": 100,
            "subnets": ["s1", "s2"]
        }))
        .unwrap();

        assert!(network.external);
        assert_eq!(network.provider_network_type.as_deref(), Some("vlan"));
        assert_eq!(network.provider_segmentation_id, Some(100));
        assert_eq!(network.subnets.len(), 2);
    }

    #[test]
    fn test_mapping_rule_round_trip_skips_absent_fields() {
        let json = serde_json::json!({
            "local": [
                {"user": {"name": "{0}", "domain": {"name": "sso"}, "type": "ephemeral"}},
                {"group": {"name": "alpha-example-se-users", "domain": {"name": "sso"}}}
            ],
            "remote": [
                {"type": "HTTP_OIDC_SUB"},
                {"type": "HTTP_OIDC_SUB", "any_one_of": ["alice@x"]}
            ]
        });

        let rule: MappingRule = serde_json::from_value(json.clone()).unwrap();
        assert_eq!(rule.local.len(), 2);
        assert!(rule.local[0].user.is_some());
        assert!(rule.local[1].group.is_some());
        assert_eq!(rule.remote[1].any_one_of.as_deref(), Some(&["alice@x".to_string()][..]));

        // Re-serialization must not invent null fields Keystone would reject
        let back = serde_json::to_value(&rule).unwrap();
        assert_eq!(back, json);
    }
}
