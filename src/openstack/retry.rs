// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Retry policy for transient OpenStack API failures.
//!
//! The client retries transient failures (429/5xx/transport) with
//! exponential backoff: 3 retries, 1s initial delay, doubling each attempt,
//! with ±10% jitter to avoid thundering herds. Non-transient failures are
//! surfaced immediately.

use crate::constants::{OPENSTACK_MAX_RETRIES, OPENSTACK_RETRY_BACKOFF, OPENSTACK_RETRY_INITIAL_SECS};
use rand::RngExt;
use std::time::Duration;

/// Backoff parameters for the client's retry loop.
#[derive(Clone, Debug)]
pub struct RetryPolicy {
    /// Number of retries after the initial attempt
    pub max_retries: u32,
    /// Delay before the first retry
    pub initial_delay: Duration,
    /// Multiplier between consecutive delays
    pub backoff: f64,
    /// Randomization factor applied to each delay (0.1 = ±10%)
    pub jitter: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: OPENSTACK_MAX_RETRIES,
            initial_delay: Duration::from_secs_f64(OPENSTACK_RETRY_INITIAL_SECS),
            backoff: OPENSTACK_RETRY_BACKOFF,
            jitter: 0.1,
        }
    }
}

impl RetryPolicy {
    /// Delay before the retry following the given zero-based attempt, with
    /// jitter applied.
    #[must_use]
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let base = self.initial_delay.as_secs_f64() * self.backoff.powi(attempt as i32);
        if self.jitter <= 0.0 {
            return Duration::from_secs_f64(base);
        }

        let delta = base * self.jitter;
        let jittered = rand::rng().random_range((base - delta)..=(base + delta));
        Duration::from_secs_f64(jittered.max(0.0))
    }
}

#[cfg(test)]
#[path = "retry_tests.rs"]
mod retry_tests;
