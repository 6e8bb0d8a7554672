// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Unit tests for `compute.rs`

#[cfg(test)]
mod tests {
    use super::super::{compute_quota_args, network_quota_args, storage_quota_args};
    use crate::crd::{ComputeQuotas, NetworkQuotas, StorageQuotas};

    #[test]
    fn test_compute_quota_field_mapping() {
        let quotas = ComputeQuotas {
            instances: Some(10),
            cores: Some(20),
            ram_mb: Some(4096),
            server_groups: Some(2),
            server_group_members: Some(5),
        };

        let args = compute_quota_args(&quotas);
        assert_eq!(args.get("instances"), Some(&10));
        assert_eq!(args.get("cores"), Some(&20));
        assert_eq!(args.get("ram"), Some(&4096));
        assert_eq!(args.get("server_groups"), Some(&2));
        assert_eq!(args.get("server_group_members"), Some(&5));
        assert!(!args.contains_key("ramMB"), "spec name must not leak to the wire");
    }

    #[test]
    fn test_storage_quota_field_mapping() {
        let quotas = StorageQuotas {
            volumes: Some(10),
            volumes_gb: Some(500),
            snapshots: Some(20),
            backups: Some(5),
            backups_gb: Some(100),
        };

        let args = storage_quota_args(&quotas);
        assert_eq!(args.get("volumes"), Some(&10));
        assert_eq!(args.get("gigabytes"), Some(&500));
        assert_eq!(args.get("snapshots"), Some(&20));
        assert_eq!(args.get("backups"), Some(&5));
        assert_eq!(args.get("backup_gigabytes"), Some(&100));
    }

    #[test]
    fn test_network_quota_field_mapping() {
        let quotas = NetworkQuotas {
            floating_ips: Some(4),
            networks: Some(5),
            subnets: Some(10),
            routers: Some(2),
            ports: Some(100),
            security_groups: Some(10),
            security_group_rules: Some(100),
        };

        let args = network_quota_args(&quotas);
        assert_eq!(args.get("floatingip"), Some(&4));
        assert_eq!(args.get("network"), Some(&5));
        assert_eq!(args.get("subnet"), Some(&10));
        assert_eq!(args.get("router"), Some(&2));
        assert_eq!(args.get("port"), Some(&100));
        assert_eq!(args.get("security_group"), Some(&10));
        assert_eq!(args.get("security_group_rule"), Some(&100));
    }

    #[test]
    fn test_absent_fields_are_not_sent() {
        let args = compute_quota_args(&ComputeQuotas {
            cores: Some(8),
            ..Default::default()
        });
        assert_eq!(args.len(), 1);

        assert!(storage_quota_args(&StorageQuotas::default()).is_empty());
        assert!(network_quota_args(&NetworkQuotas::default()).is_empty());
    }
}
