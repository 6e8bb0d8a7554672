// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Status condition helpers.
//!
//! Conditions keep one entry per `type`; `lastTransitionTime` moves only
//! when the `status` field actually flips, while `reason` and `message`
//! always track the latest observation.

use crate::crd::Condition;
use crate::names::now_iso;

/// Set or update a condition in a conditions list.
///
/// Updates the existing entry for the type if present (refreshing the
/// transition time only on a status change), appends a new entry otherwise.
pub fn set_condition(
    conditions: &mut Vec<Condition>,
    condition_type: &str,
    status: &str,
    reason: &str,
    message: &str,
) {
    for condition in conditions.iter_mut() {
        if condition.r#type == condition_type {
            if condition.status != status {
                condition.status = status.to_string();
                condition.last_transition_time = Some(now_iso());
            }
            condition.reason = Some(reason.to_string());
            condition.message = Some(message.to_string());
            return;
        }
    }

    conditions.push(Condition {
        r#type: condition_type.to_string(),
        status: status.to_string(),
        reason: Some(reason.to_string()),
        message: Some(message.to_string()),
        last_transition_time: Some(now_iso()),
    });
}

/// Find a condition by type.
#[must_use]
pub fn find_condition<'a>(
    conditions: &'a [Condition],
    condition_type: &str,
) -> Option<&'a Condition> {
    conditions.iter().find(|c| c.r#type == condition_type)
}

#[cfg(test)]
#[path = "status_tests.rs"]
mod status_tests;
