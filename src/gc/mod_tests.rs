// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Unit tests for `gc/mod.rs`

#[cfg(test)]
mod tests {
    use super::super::{CLUSTER_GC_ORDER, PROJECT_GC_ORDER};
    use crate::registry::RESOURCE_KINDS;

    /// Dependent resources must be deleted before the things they depend on.
    #[test]
    fn test_project_gc_deletion_order() {
        assert_eq!(
            PROJECT_GC_ORDER,
            ["security_groups", "networks", "groups", "projects"]
        );
    }

    #[test]
    fn test_cluster_gc_deletion_order() {
        assert_eq!(
            CLUSTER_GC_ORDER,
            ["provider_networks", "images", "flavors", "domains"]
        );
    }

    /// Every GC-handled kind must exist in the registry kind list.
    #[test]
    fn test_gc_kinds_are_registry_kinds() {
        for kind in PROJECT_GC_ORDER.iter().chain(CLUSTER_GC_ORDER.iter()) {
            assert!(
                RESOURCE_KINDS.contains(kind),
                "{kind} missing from registry kinds"
            );
        }
        assert!(RESOURCE_KINDS.contains(&"federation_mappings"));
    }
}
