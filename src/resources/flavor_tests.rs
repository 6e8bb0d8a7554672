// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Unit tests for `flavor.rs`

#[cfg(test)]
mod tests {
    use super::super::flavor_needs_recreate;
    use crate::crd::OpenstackFlavorSpec;
    use crate::openstack::Flavor;
    use std::collections::BTreeMap;

    fn spec() -> OpenstackFlavorSpec {
        OpenstackFlavorSpec {
            name: "m1".into(),
            vcpus: 2,
            ram: 2048,
            disk: 20,
            ephemeral: 0,
            swap: 0,
            is_public: true,
            description: None,
            extra_specs: BTreeMap::new(),
        }
    }

    fn remote() -> Flavor {
        serde_json::from_value(serde_json::json!({
            "id": "f1",
            "name": "m1",
            "vcpus": 2,
            "ram": 2048,
            "disk": 20,
            "OS-FLV-EXT-DATA:ephemeral": 0,
            "swap": 0,
            "os-flavor-access:is_public": true
        }))
        .unwrap()
    }

    #[test]
    fn test_identical_flavor_needs_no_recreate() {
        assert!(!flavor_needs_recreate(&spec(), &remote()));
    }

    #[test]
    fn test_each_immutable_field_triggers_recreate() {
        let remote = remote();

        let mut s = spec();
        s.vcpus = 4;
        assert!(flavor_needs_recreate(&s, &remote));

        let mut s = spec();
        s.ram = 4096;
        assert!(flavor_needs_recreate(&s, &remote));

        let mut s = spec();
        s.disk = 40;
        assert!(flavor_needs_recreate(&s, &remote));

        let mut s = spec();
        s.ephemeral = 8;
        assert!(flavor_needs_recreate(&s, &remote));

        let mut s = spec();
        s.swap = 1024;
        assert!(flavor_needs_recreate(&s, &remote));

        let mut s = spec();
        s.is_public = false;
        assert!(flavor_needs_recreate(&s, &remote));
    }

    #[test]
    fn test_extra_specs_change_does_not_trigger_recreate() {
        let mut s = spec();
        s.extra_specs
            .insert("hw:cpu_policy".into(), "dedicated".into());
        assert!(!flavor_needs_recreate(&s, &remote()));
    }
}
