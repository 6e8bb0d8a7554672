// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Unit tests for `reconcilers/status.rs`

#[cfg(test)]
mod tests {
    use super::super::{find_condition, set_condition};
    use crate::crd::Condition;

    #[test]
    fn test_new_condition_is_appended_with_timestamp() {
        let mut conditions = Vec::new();
        set_condition(&mut conditions, "ProjectReady", "False", "Creating", "");

        assert_eq!(conditions.len(), 1);
        assert_eq!(conditions[0].r#type, "ProjectReady");
        assert_eq!(conditions[0].status, "False");
        assert_eq!(conditions[0].reason.as_deref(), Some("Creating"));
        assert!(conditions[0].last_transition_time.is_some());
    }

    #[test]
    fn test_at_most_one_entry_per_type() {
        let mut conditions = Vec::new();
        set_condition(&mut conditions, "Ready", "False", "Error", "boom");
        set_condition(&mut conditions, "Ready", "True", "Reconciled", "");
        set_condition(&mut conditions, "QuotasReady", "True", "Applied", "");
        set_condition(&mut conditions, "Ready", "True", "Reconciled", "");

        assert_eq!(conditions.len(), 2);
        let ready = find_condition(&conditions, "Ready").unwrap();
        assert_eq!(ready.status, "True");
    }

    #[test]
    fn test_transition_time_only_moves_on_status_change() {
        let mut conditions = vec![Condition {
            r#type: "Ready".into(),
            status: "True".into(),
            reason: Some("Reconciled".into()),
            message: Some(String::new()),
            last_transition_time: Some("2024-01-01T00:00:00+00:00".into()),
        }];

        // Same status: reason/message refresh, timestamp stays
        set_condition(&mut conditions, "Ready", "True", "Resynced", "drift check");
        assert_eq!(
            conditions[0].last_transition_time.as_deref(),
            Some("2024-01-01T00:00:00+00:00")
        );
        assert_eq!(conditions[0].reason.as_deref(), Some("Resynced"));
        assert_eq!(conditions[0].message.as_deref(), Some("drift check"));

        // Status flip: timestamp moves
        set_condition(&mut conditions, "Ready", "False", "Error", "remote gone");
        assert_ne!(
            conditions[0].last_transition_time.as_deref(),
            Some("2024-01-01T00:00:00+00:00")
        );
        assert_eq!(conditions[0].status, "False");
    }

    #[test]
    fn test_find_condition_misses_unknown_types() {
        let conditions = Vec::new();
        assert!(find_condition(&conditions, "Ready").is_none());
    }
}
