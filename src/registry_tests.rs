// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Unit tests for `registry.rs`

#[cfg(test)]
mod tests {
    use super::super::{orphans_of, records_owned_by, RegistryRecord};
    use std::collections::{BTreeMap, HashSet};

    fn record(id: &str, cr_name: &str) -> RegistryRecord {
        RegistryRecord {
            id: id.to_string(),
            cr_name: cr_name.to_string(),
            extra: BTreeMap::new(),
        }
    }

    #[test]
    fn test_orphans_are_records_without_a_cr() {
        let mut blob = BTreeMap::new();
        blob.insert("alpha.example.se".to_string(), record("P1", "alpha"));
        blob.insert("ghost".to_string(), record("P7", "ghost"));

        let expected: HashSet<String> = ["alpha".to_string()].into_iter().collect();
        let orphans = orphans_of(&blob, &expected);

        assert_eq!(orphans.len(), 1);
        assert_eq!(orphans[0].name, "ghost");
        assert_eq!(orphans[0].record.id, "P7");
    }

    #[test]
    fn test_no_orphans_when_all_crs_exist() {
        let mut blob = BTreeMap::new();
        blob.insert("a".to_string(), record("1", "cr-a"));
        blob.insert("b".to_string(), record("2", "cr-b"));

        let expected: HashSet<String> =
            ["cr-a".to_string(), "cr-b".to_string()].into_iter().collect();
        assert!(orphans_of(&blob, &expected).is_empty());
    }

    #[test]
    fn test_empty_expected_set_orphans_everything() {
        let mut blob = BTreeMap::new();
        blob.insert("a".to_string(), record("1", "cr-a"));

        assert_eq!(orphans_of(&blob, &HashSet::new()).len(), 1);
    }

    #[test]
    fn test_records_owned_by_filters_on_cr_name() {
        let mut blob = BTreeMap::new();
        blob.insert("internal".to_string(), record("n1", "alpha"));
        blob.insert("dmz".to_string(), record("n2", "alpha"));
        blob.insert("other".to_string(), record("n3", "beta"));

        let owned = records_owned_by(&blob, "alpha");
        assert_eq!(owned.len(), 2);
        assert!(owned.iter().all(|r| r.record.cr_name == "alpha"));
    }

    #[test]
    fn test_record_extra_round_trips_unknown_fields() {
        let raw = serde_json::json!({
            "id": "net-1",
            "cr_name": "physnet1",
            "subnets": ["s1", "s2"]
        });

        let record: RegistryRecord = serde_json::from_value(raw.clone()).unwrap();
        assert_eq!(record.id, "net-1");
        assert_eq!(
            record.extra.get("subnets"),
            Some(&serde_json::json!(["s1", "s2"]))
        );

        // The flattened extra bag must survive re-serialization unchanged
        assert_eq!(serde_json::to_value(&record).unwrap(), raw);
    }

    #[test]
    fn test_blob_serialization_is_stable() {
        let mut blob = BTreeMap::new();
        blob.insert("b".to_string(), record("2", "cr-b"));
        blob.insert("a".to_string(), record("1", "cr-a"));

        let raw = serde_json::to_string(&blob).unwrap();
        // BTreeMap keys serialize sorted, keeping ConfigMap diffs readable
        assert!(raw.find("\"a\"").unwrap() < raw.find("\"b\"").unwrap());
    }
}
