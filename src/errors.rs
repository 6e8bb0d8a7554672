// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Reconciler boundary errors.
//!
//! Three failure categories exist at the reconciler boundary:
//!
//! - **Permanent** - the spec is self-inconsistent (missing required fields).
//!   The phase goes to `Error` and stays there until the spec changes; the
//!   error policy does not requeue.
//! - **Transient** - any other remote or control-plane failure. The remote
//!   client has already retried with backoff; above that, the reconcile is
//!   requeued after a fixed 60s delay.
//! - **Partial teardown** is not an error variant: delete paths log and
//!   continue per sub-step, and only surface an error if a sub-step threw.

use crate::openstack::error::OpenStackError;

/// Error returned by reconcile and cleanup handlers.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The spec cannot be acted on; no amount of retrying helps.
    #[error("{0}")]
    Permanent(String),

    /// Kubernetes API failure; retried after a delay.
    #[error(transparent)]
    Kube(#[from] kube::Error),

    /// Remote OpenStack failure that survived the client's own retries.
    #[error(transparent)]
    OpenStack(#[from] OpenStackError),

    /// Anything else bubbling up from resource modules.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl Error {
    /// Permanent errors are not requeued; the phase stays `Error` until the
    /// spec changes.
    #[must_use]
    pub fn is_permanent(&self) -> bool {
        matches!(self, Error::Permanent(_))
    }

    /// Metrics status label for this error.
    #[must_use]
    pub fn status_label(&self) -> &'static str {
        if self.is_permanent() {
            "permanent_error"
        } else {
            "error"
        }
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[cfg(test)]
#[path = "errors_tests.rs"]
mod errors_tests;
