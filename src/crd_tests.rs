// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Unit tests for `crd.rs`

#[cfg(test)]
mod tests {
    use super::super::*;

    #[test]
    fn test_project_spec_defaults() {
        let spec: OpenstackProjectSpec = serde_json::from_value(serde_json::json!({
            "name": "alpha.example.se",
            "domain": "sso-users"
        }))
        .unwrap();

        assert!(spec.enabled, "enabled should default to true");
        assert!(spec.networks.is_empty());
        assert!(spec.security_groups.is_empty());
        assert!(spec.role_bindings.is_empty());
        assert!(spec.quotas.is_none());
        assert!(spec.federation_ref.is_none());
    }

    #[test]
    fn test_project_network_spec_defaults() {
        let net: ProjectNetworkSpec = serde_json::from_value(serde_json::json!({
            "name": "dmz",
            "cidr": "10.0.1.0/24",
            "router": {"externalNetwork": "public"}
        }))
        .unwrap();

        assert!(net.enable_dhcp, "DHCP should default to enabled");
        assert!(net.dns_nameservers.is_empty());
        let router = net.router.unwrap();
        assert_eq!(router.external_network.as_deref(), Some("public"));
        assert!(router.enable_snat, "SNAT should default to enabled");
    }

    #[test]
    fn test_security_group_rule_defaults() {
        let rule: SecurityGroupRuleSpec = serde_json::from_value(serde_json::json!({
            "direction": "ingress",
            "protocol": "tcp",
            "portRangeMin": 22,
            "portRangeMax": 22
        }))
        .unwrap();

        assert_eq!(rule.ethertype, "IPv4");
        assert!(rule.remote_group_name.is_none());
    }

    #[test]
    fn test_quota_field_names_are_camel_case() {
        let quotas: ProjectQuotas = serde_json::from_value(serde_json::json!({
            "compute": {"instances": 10, "ramMB": 2048, "serverGroups": 2},
            "storage": {"volumesGB": 100, "backupsGB": 50},
            "network": {"floatingIps": 4, "securityGroupRules": 100}
        }))
        .unwrap();

        let compute = quotas.compute.unwrap();
        assert_eq!(compute.ram_mb, Some(2048));
        assert_eq!(compute.server_groups, Some(2));
        let storage = quotas.storage.unwrap();
        assert_eq!(storage.volumes_gb, Some(100));
        assert_eq!(storage.backups_gb, Some(50));
        let network = quotas.network.unwrap();
        assert_eq!(network.floating_ips, Some(4));
        assert_eq!(network.security_group_rules, Some(100));
    }

    #[test]
    fn test_phase_serializes_as_pascal_case() {
        assert_eq!(serde_json::to_value(Phase::Ready).unwrap(), "Ready");
        assert_eq!(
            serde_json::to_value(Phase::Provisioning).unwrap(),
            "Provisioning"
        );
        assert_eq!(Phase::default(), Phase::Pending);
    }

    #[test]
    fn test_project_status_round_trip() {
        let status = OpenstackProjectStatus {
            phase: Phase::Ready,
            observed_generation: Some(3),
            project_id: Some("p1".into()),
            group_id: Some("g1".into()),
            networks: vec![NetworkStatus {
                name: "internal".into(),
                network_id: Some("n1".into()),
                subnet_id: Some("s1".into()),
                router_id: None,
            }],
            ..Default::default()
        };

        let value = serde_json::to_value(&status).unwrap();
        assert_eq!(value["phase"], "Ready");
        assert_eq!(value["projectId"], "p1");
        assert_eq!(value["networks"][0]["networkId"], "n1");
        assert!(
            value["networks"][0].get("routerId").is_none(),
            "absent routerId should not serialize"
        );

        let back: OpenstackProjectStatus = serde_json::from_value(value).unwrap();
        assert_eq!(back.networks, status.networks);
    }

    #[test]
    fn test_image_spec_managed_and_external_modes() {
        let managed: OpenstackImageSpec = serde_json::from_value(serde_json::json!({
            "name": "debian-12",
            "content": {"diskFormat": "qcow2", "source": {"url": "https://img/x.qcow2"}}
        }))
        .unwrap();
        assert!(!managed.external);
        assert_eq!(managed.visibility, "private");
        let content = managed.content.unwrap();
        assert_eq!(content.container_format, "bare");

        let external: OpenstackImageSpec = serde_json::from_value(serde_json::json!({
            "name": "vendor-image",
            "external": true,
            "visibility": "public"
        }))
        .unwrap();
        assert!(external.external);
        assert!(external.content.is_none());
    }

    #[test]
    fn test_provider_network_spec_defaults() {
        let spec: OpenstackNetworkSpec = serde_json::from_value(serde_json::json!({
            "name": "physnet1",
            "subnets": [{"name": "physnet1-v4", "cidr": "192.0.2.0/24"}]
        }))
        .unwrap();

        assert_eq!(spec.provider_network_type, "flat");
        assert!(!spec.external);
        assert!(!spec.shared);
        assert!(spec.subnets[0].enable_dhcp);
        assert!(spec.subnets[0].allocation_pools.is_empty());
    }

    #[test]
    fn test_crd_kinds_and_scopes() {
        use kube::Resource;

        assert_eq!(OpenstackProject::kind(&()), "OpenstackProject");
        assert_eq!(OpenstackProject::group(&()), "sunet.se");
        assert_eq!(OpenstackProject::version(&()), "v1alpha1");
        assert_eq!(OpenstackProject::plural(&()), "openstackprojects");
        assert_eq!(OpenstackDomain::plural(&()), "openstackdomains");
        assert_eq!(OpenstackFlavor::plural(&()), "openstackflavors");
        assert_eq!(OpenstackImage::plural(&()), "openstackimages");
        assert_eq!(OpenstackNetwork::plural(&()), "openstacknetworks");
    }
}
