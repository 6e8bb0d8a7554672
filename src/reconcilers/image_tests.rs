// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Unit tests for `reconcilers/image.rs`

#[cfg(test)]
mod tests {
    use super::super::{import_failed, requeue_for};
    use crate::constants::{DRIFT_CHECK_INTERVAL_SECS, IMAGE_POLL_INTERVAL_SECS};
    use crate::crd::{OpenstackImageStatus, Phase};
    use kube::runtime::controller::Action;
    use std::time::Duration;

    fn status(phase: Phase, upload_status: Option<&str>) -> OpenstackImageStatus {
        OpenstackImageStatus {
            phase,
            upload_status: upload_status.map(ToString::to_string),
            ..Default::default()
        }
    }

    #[test]
    fn test_importing_images_requeue_on_the_poll_interval() {
        let action = requeue_for(&status(Phase::Provisioning, Some("saving")));
        assert_eq!(
            action,
            Action::requeue(Duration::from_secs(IMAGE_POLL_INTERVAL_SECS))
        );

        let action = requeue_for(&status(Phase::Pending, None));
        assert_eq!(
            action,
            Action::requeue(Duration::from_secs(IMAGE_POLL_INTERVAL_SECS))
        );
    }

    #[test]
    fn test_ready_images_requeue_on_the_drift_interval() {
        let action = requeue_for(&status(Phase::Ready, Some("active")));
        assert_eq!(
            action,
            Action::requeue(Duration::from_secs(DRIFT_CHECK_INTERVAL_SECS))
        );
    }

    #[test]
    fn test_import_failure_detection() {
        assert!(import_failed(&status(Phase::Error, Some("killed"))));
        assert!(import_failed(&status(Phase::Error, Some("deleted"))));
        assert!(!import_failed(&status(Phase::Provisioning, Some("saving"))));
        assert!(!import_failed(&status(Phase::Ready, Some("active"))));
        assert!(!import_failed(&status(Phase::Pending, None)));
    }
}
