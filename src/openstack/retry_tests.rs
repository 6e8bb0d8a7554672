// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Unit tests for `retry.rs`

#[cfg(test)]
mod tests {
    use super::super::RetryPolicy;
    use std::time::Duration;

    #[test]
    fn test_default_policy_matches_client_contract() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_retries, 3);
        assert_eq!(policy.initial_delay, Duration::from_secs(1));
        #[allow(clippy::float_cmp)]
        {
            assert_eq!(policy.backoff, 2.0);
        }
    }

    #[test]
    fn test_delays_grow_exponentially_without_jitter() {
        let policy = RetryPolicy {
            jitter: 0.0,
            ..RetryPolicy::default()
        };

        assert_eq!(policy.delay_for(0), Duration::from_secs(1));
        assert_eq!(policy.delay_for(1), Duration::from_secs(2));
        assert_eq!(policy.delay_for(2), Duration::from_secs(4));
    }

    #[test]
    fn test_jitter_stays_within_bounds() {
        let policy = RetryPolicy::default();

        for attempt in 0..3 {
            let base = 2.0_f64.powi(attempt);
            let delay = policy.delay_for(attempt as u32).as_secs_f64();
            assert!(
                delay >= base * 0.9 && delay <= base * 1.1,
                "attempt {attempt}: delay {delay} outside ±10% of {base}"
            );
        }
    }
}
