// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Unit tests for `role_binding.rs`

#[cfg(test)]
mod tests {
    use super::super::users_from_role_bindings;
    use crate::crd::RoleBindingSpec;

    fn binding(role: &str, users: &[&str]) -> RoleBindingSpec {
        RoleBindingSpec {
            role: role.to_string(),
            users: users.iter().map(ToString::to_string).collect(),
            groups: vec![],
            user_domain: None,
            group_domain: None,
        }
    }

    #[test]
    fn test_users_are_collected_across_bindings() {
        let bindings = vec![
            binding("member", &["alice@x", "bob@x"]),
            binding("admin", &["carol@x"]),
        ];

        assert_eq!(
            users_from_role_bindings(&bindings),
            vec!["alice@x", "bob@x", "carol@x"]
        );
    }

    #[test]
    fn test_duplicate_users_are_deduplicated_in_first_seen_order() {
        let bindings = vec![
            binding("member", &["alice@x", "bob@x"]),
            binding("admin", &["bob@x", "alice@x", "dave@x"]),
        ];

        assert_eq!(
            users_from_role_bindings(&bindings),
            vec!["alice@x", "bob@x", "dave@x"]
        );
    }

    #[test]
    fn test_no_bindings_yields_no_users() {
        assert!(users_from_role_bindings(&[]).is_empty());
        assert!(users_from_role_bindings(&[binding("member", &[])]).is_empty());
    }
}
