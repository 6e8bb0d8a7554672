// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Unit tests for `names.rs`

#[cfg(test)]
mod tests {
    use super::super::{group_name, is_valid_uuid, mapping_name, now_iso, sanitize_name};

    #[test]
    fn test_sanitize_mixed_case_with_dots_and_underscores() {
        assert_eq!(
            sanitize_name("My_Project.Example.COM"),
            "my-project-example-com"
        );
    }

    #[test]
    fn test_sanitize_collapses_hyphen_runs() {
        assert_eq!(sanitize_name("a..b__c--d"), "a-b-c-d");
    }

    #[test]
    fn test_sanitize_trims_leading_and_trailing_hyphens() {
        assert_eq!(sanitize_name(".leading.and.trailing."), "leading-and-trailing");
        assert_eq!(sanitize_name("---x---"), "x");
    }

    #[test]
    fn test_sanitize_drops_disallowed_characters() {
        assert_eq!(sanitize_name("tenant (prod) #1"), "tenantprod1");
        assert_eq!(sanitize_name("åäö"), "");
    }

    #[test]
    fn test_sanitize_already_clean_name_is_unchanged() {
        assert_eq!(sanitize_name("alpha-example-se"), "alpha-example-se");
    }

    #[test]
    fn test_group_name_appends_users_suffix() {
        assert_eq!(group_name("alpha.example.se"), "alpha-example-se-users");
        assert_eq!(group_name("ghost"), "ghost-users");
    }

    #[test]
    fn test_mapping_name_format() {
        assert_eq!(mapping_name("sso"), "sso_oidc_mapping");
    }

    #[test]
    fn test_uuid_accepts_canonical_form() {
        assert!(is_valid_uuid("3f2b6a0e-9a1c-4a53-8f5d-0b9f1c2d3e4f"));
    }

    #[test]
    fn test_uuid_accepts_hyphenless_form() {
        assert!(is_valid_uuid("3f2b6a0e9a1c4a538f5d0b9f1c2d3e4f"));
    }

    #[test]
    fn test_uuid_accepts_upper_case() {
        assert!(is_valid_uuid("3F2B6A0E-9A1C-4A53-8F5D-0B9F1C2D3E4F"));
    }

    #[test]
    fn test_uuid_rejects_names_and_empty() {
        assert!(!is_valid_uuid(""));
        assert!(!is_valid_uuid("None"));
        assert!(!is_valid_uuid("alpha-example-se-users"));
    }

    #[test]
    fn test_now_iso_is_rfc3339() {
        let ts = now_iso();
        assert!(chrono::DateTime::parse_from_rfc3339(&ts).is_ok());
    }
}
