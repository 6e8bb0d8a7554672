// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Unit tests for `ratelimit.rs`

#[cfg(test)]
mod tests {
    use super::super::RateLimiter;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::time::Instant;

    /// With max_concurrent=2, five concurrent acquirers never exceed 2 active.
    #[tokio::test]
    async fn test_concurrency_bound_is_respected() {
        let limiter = Arc::new(RateLimiter::new(2, 0.0));
        let active = Arc::new(AtomicUsize::new(0));
        let max_seen = Arc::new(AtomicUsize::new(0));

        let mut handles = Vec::new();
        for _ in 0..5 {
            let limiter = limiter.clone();
            let active = active.clone();
            let max_seen = max_seen.clone();
            handles.push(tokio::spawn(async move {
                let _permit = limiter.acquire().await;
                let now_active = active.fetch_add(1, Ordering::SeqCst) + 1;
                max_seen.fetch_max(now_active, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(20)).await;
                active.fetch_sub(1, Ordering::SeqCst);
            }));
        }

        for handle in handles {
            handle.await.unwrap();
        }

        assert!(
            max_seen.load(Ordering::SeqCst) <= 2,
            "at most 2 acquirers may be active, saw {}",
            max_seen.load(Ordering::SeqCst)
        );
    }

    /// With rps=10, three sequential acquires take at least 0.2s.
    #[tokio::test(start_paused = true)]
    async fn test_minimum_interval_between_calls() {
        let limiter = RateLimiter::new(10, 10.0);

        let start = Instant::now();
        for _ in 0..3 {
            let _permit = limiter.acquire().await;
        }
        let elapsed = start.elapsed();

        assert!(
            elapsed >= Duration::from_millis(200),
            "three acquires at 10 rps should take >= 0.2s, took {elapsed:?}"
        );
    }

    /// Zero rps disables the interval gate entirely.
    #[tokio::test(start_paused = true)]
    async fn test_zero_rps_does_not_wait() {
        let limiter = RateLimiter::new(4, 0.0);

        let start = Instant::now();
        for _ in 0..10 {
            let _permit = limiter.acquire().await;
        }

        assert_eq!(start.elapsed(), Duration::ZERO);
    }
}
