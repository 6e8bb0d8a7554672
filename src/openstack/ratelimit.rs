// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Rate limiting for OpenStack API calls.
//!
//! Every remote call acquires a slot before touching the network. The gate
//! combines a concurrency bound (semaphore) with a minimum interval between
//! calls, so the operator neither floods the control plane with parallel
//! requests nor exceeds a sustained request rate.

use crate::metrics::RATE_LIMIT_WAIT_SECONDS;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, OwnedSemaphorePermit, Semaphore};
use tokio::time::Instant;
use tracing::info;

/// Slot held for the duration of one API call; concurrency is released on drop.
pub struct RateLimitPermit {
    _permit: OwnedSemaphorePermit,
}

/// Combined concurrency + request-rate gate shared by all reconcilers.
pub struct RateLimiter {
    semaphore: Arc<Semaphore>,
    min_interval: Duration,
    last_call: Mutex<Option<Instant>>,
    max_concurrent: usize,
    requests_per_second: f64,
}

impl RateLimiter {
    /// Create a rate limiter.
    ///
    /// # Arguments
    ///
    /// * `max_concurrent` - Maximum number of in-flight API calls
    /// * `requests_per_second` - Sustained request rate; zero disables the
    ///   interval gate
    #[must_use]
    pub fn new(max_concurrent: usize, requests_per_second: f64) -> Self {
        let min_interval = if requests_per_second > 0.0 {
            Duration::from_secs_f64(1.0 / requests_per_second)
        } else {
            Duration::ZERO
        };

        info!(
            max_concurrent,
            requests_per_second, "Rate limiter initialized"
        );

        Self {
            semaphore: Arc::new(Semaphore::new(max_concurrent)),
            min_interval,
            last_call: Mutex::new(None),
            max_concurrent,
            requests_per_second,
        }
    }

    /// Acquire a rate limit slot, waiting for both a concurrency permit and
    /// the minimum inter-call interval.
    ///
    /// Total wait time (semaphore + interval) over 1ms is observed to the
    /// `rate_limit_wait_seconds` histogram.
    pub async fn acquire(&self) -> RateLimitPermit {
        let wait_start = Instant::now();

        let permit = self
            .semaphore
            .clone()
            .acquire_owned()
            .await
            .expect("rate limiter semaphore closed");

        if !self.min_interval.is_zero() {
            // The lock serializes interval enforcement across callers
            let mut last_call = self.last_call.lock().await;
            let now = Instant::now();
            if let Some(last) = *last_call {
                let next_slot = last + self.min_interval;
                if next_slot > now {
                    tokio::time::sleep_until(next_slot).await;
                }
            }
            *last_call = Some(Instant::now());
        }

        let waited = wait_start.elapsed();
        if waited > Duration::from_millis(1) {
            RATE_LIMIT_WAIT_SECONDS.observe(waited.as_secs_f64());
        }

        RateLimitPermit { _permit: permit }
    }
}

impl std::fmt::Debug for RateLimiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RateLimiter")
            .field("max_concurrent", &self.max_concurrent)
            .field("requests_per_second", &self.requests_per_second)
            .finish()
    }
}

#[cfg(test)]
#[path = "ratelimit_tests.rs"]
mod ratelimit_tests;
