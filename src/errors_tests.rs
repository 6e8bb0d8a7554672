// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Unit tests for `errors.rs`

#[cfg(test)]
mod tests {
    use super::super::Error;
    use crate::openstack::error::OpenStackError;

    #[test]
    fn test_permanent_classification() {
        let err = Error::Permanent("spec.name and spec.domain are required".into());
        assert!(err.is_permanent());
        assert_eq!(err.status_label(), "permanent_error");
    }

    #[test]
    fn test_openstack_errors_are_transient_at_the_boundary() {
        let err = Error::OpenStack(OpenStackError::Transient {
            status: 503,
            message: "service unavailable".into(),
        });
        assert!(!err.is_permanent());
        assert_eq!(err.status_label(), "error");
    }

    #[test]
    fn test_anyhow_errors_are_transient_at_the_boundary() {
        let err = Error::Other(anyhow::anyhow!("boom"));
        assert!(!err.is_permanent());
    }

    #[test]
    fn test_permanent_message_is_displayed_verbatim() {
        let err = Error::Permanent("spec.vcpus is required".into());
        assert_eq!(err.to_string(), "spec.vcpus is required");
    }
}
