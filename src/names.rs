// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Derived naming and identifier helpers.
//!
//! Project names arrive as arbitrary DNS-ish strings (`alpha.example.se`);
//! the companion OpenStack resources use a sanitized form of that name.
//! This module owns the sanitization rules plus the UUID check used by the
//! group-id self-healing path.

use chrono::Utc;
use uuid::Uuid;

/// Convert a project name to a safe group/resource name.
///
/// Lowercases, replaces dots and underscores with hyphens, drops anything
/// outside `[a-z0-9-]`, collapses hyphen runs and trims leading/trailing
/// hyphens.
///
/// # Example
///
/// ```
/// use openstack_operator::names::sanitize_name;
///
/// assert_eq!(sanitize_name("My_Project.Example.COM"), "my-project-example-com");
/// ```
#[must_use]
pub fn sanitize_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut last_was_hyphen = false;

    for c in name.chars() {
        let mapped = match c {
            '.' | '_' | '-' => Some('-'),
            c if c.is_ascii_alphanumeric() => Some(c.to_ascii_lowercase()),
            _ => None,
        };
        match mapped {
            Some('-') => {
                if !last_was_hyphen {
                    out.push('-');
                    last_was_hyphen = true;
                }
            }
            Some(c) => {
                out.push(c);
                last_was_hyphen = false;
            }
            None => {}
        }
    }

    out.trim_matches('-').to_string()
}

/// Generate the user-group name for a project.
///
/// # Example
///
/// ```
/// use openstack_operator::names::group_name;
///
/// assert_eq!(group_name("alpha.example.se"), "alpha-example-se-users");
/// ```
#[must_use]
pub fn group_name(project_name: &str) -> String {
    format!("{}-users", sanitize_name(project_name))
}

/// Name of the shared federation mapping document for an identity provider.
#[must_use]
pub fn mapping_name(idp_name: &str) -> String {
    format!("{idp_name}_oidc_mapping")
}

/// Check whether a string is a valid UUID.
///
/// Used to detect legacy `status.groupId` values that hold a group name
/// instead of an id. Accepts canonical, hyphenless and upper-case forms;
/// rejects empty strings and arbitrary names.
#[must_use]
pub fn is_valid_uuid(value: &str) -> bool {
    Uuid::try_parse(value).is_ok()
}

/// Current UTC time in RFC3339 format, used for `lastSyncTime` and
/// condition transition timestamps.
#[must_use]
pub fn now_iso() -> String {
    Utc::now().to_rfc3339()
}

#[cfg(test)]
#[path = "names_tests.rs"]
mod names_tests;
