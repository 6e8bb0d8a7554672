// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Reconciliation logic for all operator Custom Resources.
//!
//! One module per CR kind. Each follows the same protocol:
//!
//! 1. Set `phase = Provisioning` and `observedGeneration`
//! 2. Validate required spec fields; missing fields are permanent errors
//! 3. Run the kind-specific steps, flipping per-step conditions around each
//! 4. On success set `phase = Ready` and `lastSyncTime`
//! 5. On transient failure set `phase = Error`, write a truncated message
//!    into the `Ready` condition and requeue after 60 seconds
//!
//! The kube-rs mapping of the four logical entry points: the finalizer's
//! Cleanup event is the delete handler; Apply dispatches on recorded state -
//! no remote id yet means create, a generation change means update, and an
//! unchanged Ready resource gets the periodic drift check. Controllers
//! requeue Ready resources every 5 minutes to drive that check; images
//! requeue every 30 seconds while an import is running.

pub mod domain;
pub mod flavor;
pub mod image;
pub mod project;
pub mod provider_network;
pub mod status;

use crate::constants::CONDITION_MESSAGE_MAX_LEN;
use kube::runtime::events::{Event, EventType, Recorder, Reporter};
use kube::{Client, Resource};
use tracing::debug;

/// Truncate an error message for conditions and events.
#[must_use]
pub fn truncate_message(message: &str) -> String {
    if message.chars().count() <= CONDITION_MESSAGE_MAX_LEN {
        message.to_string()
    } else {
        message.chars().take(CONDITION_MESSAGE_MAX_LEN).collect()
    }
}

/// Emit a Warning event for a failed operation; best-effort.
pub async fn publish_warning<K>(client: &Client, resource: &K, reason: &str, message: &str)
where
    K: Resource<DynamicType = ()>,
{
    let recorder = Recorder::new(
        client.clone(),
        Reporter {
            controller: "openstack-operator".into(),
            instance: None,
        },
    );

    let event = Event {
        type_: EventType::Warning,
        reason: reason.to_string(),
        note: Some(truncate_message(message)),
        action: "Reconcile".to_string(),
        secondary: None,
    };

    if let Err(e) = recorder.publish(&event, &resource.object_ref(&())).await {
        debug!(reason, error = %e, "Failed to publish warning event");
    }
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod mod_tests;
