// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Unit tests for `context.rs`

#[cfg(test)]
mod tests {
    use super::super::OperatorConfig;

    // Environment-variable tests mutate process state; keep them in one
    // test to avoid interference under the parallel test runner.
    #[test]
    fn test_config_defaults_and_overrides() {
        let keys = [
            "WATCH_NAMESPACE",
            "METRICS_PORT",
            "GC_INTERVAL_SECONDS",
            "CLUSTER_GC_INTERVAL_SECONDS",
            "MANAGED_DOMAIN",
        ];
        for key in keys {
            std::env::remove_var(key);
        }

        let config = OperatorConfig::from_env();
        assert_eq!(config.watch_namespace, "");
        assert_eq!(config.metrics_port, 9090);
        assert_eq!(config.gc_interval_secs, 600);
        assert_eq!(config.cluster_gc_interval_secs, 600);
        assert_eq!(config.managed_domain, "sso-users");

        std::env::set_var("WATCH_NAMESPACE", "tenants");
        std::env::set_var("METRICS_PORT", "9999");
        std::env::set_var("GC_INTERVAL_SECONDS", "120");
        std::env::set_var("MANAGED_DOMAIN", "customers");

        let config = OperatorConfig::from_env();
        assert_eq!(config.watch_namespace, "tenants");
        assert_eq!(config.metrics_port, 9999);
        assert_eq!(config.gc_interval_secs, 120);
        assert_eq!(config.managed_domain, "customers");

        std::env::set_var("METRICS_PORT", "not-a-port");
        let config = OperatorConfig::from_env();
        assert_eq!(
            config.metrics_port, 9090,
            "unparseable values fall back to the default"
        );

        for key in keys {
            std::env::remove_var(key);
        }
    }
}
