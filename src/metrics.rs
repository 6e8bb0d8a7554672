// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Prometheus metrics for the OpenStack operator.
//!
//! All metrics use the `openstack_operator_` prefix and live in a global
//! registry exposed via the `/metrics` endpoint.
//!
//! # Metrics Categories
//!
//! - **Reconciliation Metrics** - Per-kind reconcile counts, durations and
//!   in-progress gauge
//! - **OpenStack API Metrics** - Call counts, durations, retries and
//!   rate-limit wait time
//! - **Garbage Collection Metrics** - Run counts, deleted resources and
//!   durations for both GC scopes
//! - **Operator Info** - Version and cloud name
//!
//! Prometheus metrics with labels don't appear until first use, so
//! [`init_metrics`] pre-initialises every label combination at startup to
//! make zero values scrapable.

use prometheus::{
    CounterVec, Encoder, GaugeVec, Histogram, HistogramOpts, HistogramVec, IntGaugeVec, Opts,
    Registry, TextEncoder,
};
use std::sync::LazyLock;
use std::time::Duration;

/// Namespace prefix for all operator metrics
const METRICS_NAMESPACE: &str = "openstack_operator";

/// Global Prometheus metrics registry
///
/// All metrics are registered in this registry and exposed via the
/// `/metrics` endpoint.
pub static METRICS_REGISTRY: LazyLock<Registry> = LazyLock::new(Registry::new);

// ============================================================================
// Reconciliation Metrics
// ============================================================================

/// Total number of reconciliations by resource kind, operation and outcome
///
/// Labels:
/// - `resource`: CR kind (e.g. `OpenstackProject`)
/// - `operation`: `create`, `update` or `delete`
/// - `status`: `success`, `error` or `permanent_error`
pub static RECONCILE_TOTAL: LazyLock<CounterVec> = LazyLock::new(|| {
    let opts = Opts::new(
        format!("{METRICS_NAMESPACE}_reconcile_total"),
        "Total number of reconciliations",
    );
    let counter = CounterVec::new(opts, &["resource", "operation", "status"]).unwrap();
    METRICS_REGISTRY
        .register(Box::new(counter.clone()))
        .unwrap();
    counter
});

/// Time spent in reconciliation by resource kind and operation
pub static RECONCILE_DURATION: LazyLock<HistogramVec> = LazyLock::new(|| {
    let opts = HistogramOpts::new(
        format!("{METRICS_NAMESPACE}_reconcile_duration_seconds"),
        "Time spent in reconciliation",
    )
    .buckets(vec![0.1, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0, 120.0]);
    let histogram = HistogramVec::new(opts, &["resource", "operation"]).unwrap();
    METRICS_REGISTRY
        .register(Box::new(histogram.clone()))
        .unwrap();
    histogram
});

/// Number of reconciliations currently in progress, by resource kind
pub static RECONCILE_IN_PROGRESS: LazyLock<GaugeVec> = LazyLock::new(|| {
    let opts = Opts::new(
        format!("{METRICS_NAMESPACE}_reconcile_in_progress"),
        "Number of reconciliations currently in progress",
    );
    let gauge = GaugeVec::new(opts, &["resource"]).unwrap();
    METRICS_REGISTRY.register(Box::new(gauge.clone())).unwrap();
    gauge
});

// ============================================================================
// OpenStack API Metrics
// ============================================================================

/// Total number of OpenStack API calls by service, operation and outcome
pub static OPENSTACK_API_CALLS: LazyLock<CounterVec> = LazyLock::new(|| {
    let opts = Opts::new(
        format!("{METRICS_NAMESPACE}_openstack_api_calls_total"),
        "Total number of OpenStack API calls",
    );
    let counter = CounterVec::new(opts, &["service", "operation", "status"]).unwrap();
    METRICS_REGISTRY
        .register(Box::new(counter.clone()))
        .unwrap();
    counter
});

/// Time spent in OpenStack API calls by service and operation
pub static OPENSTACK_API_DURATION: LazyLock<HistogramVec> = LazyLock::new(|| {
    let opts = HistogramOpts::new(
        format!("{METRICS_NAMESPACE}_openstack_api_duration_seconds"),
        "Time spent in OpenStack API calls",
    )
    .buckets(vec![0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0]);
    let histogram = HistogramVec::new(opts, &["service", "operation"]).unwrap();
    METRICS_REGISTRY
        .register(Box::new(histogram.clone()))
        .unwrap();
    histogram
});

/// Total number of OpenStack API call retries by service and operation
pub static OPENSTACK_API_RETRIES: LazyLock<CounterVec> = LazyLock::new(|| {
    let opts = Opts::new(
        format!("{METRICS_NAMESPACE}_openstack_api_retries_total"),
        "Total number of OpenStack API call retries",
    );
    let counter = CounterVec::new(opts, &["service", "operation"]).unwrap();
    METRICS_REGISTRY
        .register(Box::new(counter.clone()))
        .unwrap();
    counter
});

/// Time spent waiting for a rate limit slot; only waits over 1ms are recorded
pub static RATE_LIMIT_WAIT_SECONDS: LazyLock<Histogram> = LazyLock::new(|| {
    let opts = HistogramOpts::new(
        format!("{METRICS_NAMESPACE}_rate_limit_wait_seconds"),
        "Time spent waiting for rate limit slot",
    )
    .buckets(vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5]);
    let histogram = Histogram::with_opts(opts).unwrap();
    METRICS_REGISTRY
        .register(Box::new(histogram.clone()))
        .unwrap();
    histogram
});

// ============================================================================
// Garbage Collection Metrics
// ============================================================================

/// Total number of cluster-scoped garbage collection runs by outcome
pub static CLUSTER_GC_RUNS: LazyLock<CounterVec> = LazyLock::new(|| {
    let opts = Opts::new(
        format!("{METRICS_NAMESPACE}_cluster_gc_runs_total"),
        "Total number of cluster-scoped garbage collection runs",
    );
    let counter = CounterVec::new(opts, &["status"]).unwrap();
    METRICS_REGISTRY
        .register(Box::new(counter.clone()))
        .unwrap();
    counter
});

/// Total number of cluster-scoped resources deleted by garbage collection
pub static CLUSTER_GC_DELETED_RESOURCES: LazyLock<CounterVec> = LazyLock::new(|| {
    let opts = Opts::new(
        format!("{METRICS_NAMESPACE}_cluster_gc_deleted_resources_total"),
        "Total number of cluster-scoped resources deleted by garbage collection",
    );
    let counter = CounterVec::new(opts, &["resource_type"]).unwrap();
    METRICS_REGISTRY
        .register(Box::new(counter.clone()))
        .unwrap();
    counter
});

/// Time spent in cluster-scoped garbage collection
pub static CLUSTER_GC_DURATION: LazyLock<Histogram> = LazyLock::new(|| {
    let opts = HistogramOpts::new(
        format!("{METRICS_NAMESPACE}_cluster_gc_duration_seconds"),
        "Time spent in cluster-scoped garbage collection",
    )
    .buckets(vec![1.0, 5.0, 10.0, 30.0, 60.0, 120.0, 300.0]);
    let histogram = Histogram::with_opts(opts).unwrap();
    METRICS_REGISTRY
        .register(Box::new(histogram.clone()))
        .unwrap();
    histogram
});

/// Total number of project garbage collection runs by outcome
pub static PROJECT_GC_RUNS: LazyLock<CounterVec> = LazyLock::new(|| {
    let opts = Opts::new(
        format!("{METRICS_NAMESPACE}_project_gc_runs_total"),
        "Total number of project garbage collection runs",
    );
    let counter = CounterVec::new(opts, &["status"]).unwrap();
    METRICS_REGISTRY
        .register(Box::new(counter.clone()))
        .unwrap();
    counter
});

/// Total number of project resources deleted by garbage collection
pub static PROJECT_GC_DELETED_RESOURCES: LazyLock<CounterVec> = LazyLock::new(|| {
    let opts = Opts::new(
        format!("{METRICS_NAMESPACE}_project_gc_deleted_resources_total"),
        "Total number of project resources deleted by garbage collection",
    );
    let counter = CounterVec::new(opts, &["resource_type"]).unwrap();
    METRICS_REGISTRY
        .register(Box::new(counter.clone()))
        .unwrap();
    counter
});

/// Time spent in project garbage collection
pub static PROJECT_GC_DURATION: LazyLock<Histogram> = LazyLock::new(|| {
    let opts = HistogramOpts::new(
        format!("{METRICS_NAMESPACE}_project_gc_duration_seconds"),
        "Time spent in project garbage collection",
    )
    .buckets(vec![1.0, 5.0, 10.0, 30.0, 60.0, 120.0, 300.0]);
    let histogram = Histogram::with_opts(opts).unwrap();
    METRICS_REGISTRY
        .register(Box::new(histogram.clone()))
        .unwrap();
    histogram
});

// ============================================================================
// Operator Info
// ============================================================================

/// Info-style metric advertising operator version and cloud; value is always 1
pub static OPERATOR_INFO: LazyLock<IntGaugeVec> = LazyLock::new(|| {
    let opts = Opts::new(
        format!("{METRICS_NAMESPACE}_info"),
        "Information about the OpenStack operator",
    );
    let gauge = IntGaugeVec::new(opts, &["version", "cloud"]).unwrap();
    METRICS_REGISTRY.register(Box::new(gauge.clone())).unwrap();
    gauge
});

// ============================================================================
// Helper Functions
// ============================================================================

/// Record a reconciliation outcome and its duration.
pub fn record_reconcile(resource: &str, operation: &str, status: &str, duration: Duration) {
    RECONCILE_TOTAL
        .with_label_values(&[resource, operation, status])
        .inc();
    RECONCILE_DURATION
        .with_label_values(&[resource, operation])
        .observe(duration.as_secs_f64());
}

/// Record one OpenStack API call outcome and its duration.
pub fn record_api_call(service: &str, operation: &str, success: bool, duration: Duration) {
    let status = if success { "success" } else { "error" };
    OPENSTACK_API_CALLS
        .with_label_values(&[service, operation, status])
        .inc();
    OPENSTACK_API_DURATION
        .with_label_values(&[service, operation])
        .observe(duration.as_secs_f64());
}

/// Record one OpenStack API retry.
pub fn record_api_retry(service: &str, operation: &str) {
    OPENSTACK_API_RETRIES
        .with_label_values(&[service, operation])
        .inc();
}

/// Set operator info labels; the gauge value carries no meaning.
pub fn set_operator_info(version: &str, cloud: &str) {
    OPERATOR_INFO.with_label_values(&[version, cloud]).set(1);
}

/// Initialize all metrics with zero values.
///
/// Prometheus metrics with labels don't appear until used; this ensures all
/// label combinations are visible immediately at startup.
pub fn init_metrics() {
    let resources = [
        crate::constants::KIND_PROJECT,
        crate::constants::KIND_DOMAIN,
        crate::constants::KIND_FLAVOR,
        crate::constants::KIND_IMAGE,
        crate::constants::KIND_NETWORK,
    ];
    let operations = ["create", "update", "delete"];
    let statuses = ["success", "error", "permanent_error"];

    for resource in resources {
        RECONCILE_IN_PROGRESS.with_label_values(&[resource]).set(0.0);
        for operation in operations {
            RECONCILE_DURATION.with_label_values(&[resource, operation]);
            for status in statuses {
                RECONCILE_TOTAL.with_label_values(&[resource, operation, status]);
            }
        }
    }

    for status in ["success", "error"] {
        CLUSTER_GC_RUNS.with_label_values(&[status]);
        PROJECT_GC_RUNS.with_label_values(&[status]);
    }

    for resource_type in ["domain", "flavor", "image", "provider_network"] {
        CLUSTER_GC_DELETED_RESOURCES.with_label_values(&[resource_type]);
    }
    for resource_type in ["project", "group", "network", "security_group", "mapping"] {
        PROJECT_GC_DELETED_RESOURCES.with_label_values(&[resource_type]);
    }

    // Touch the histograms without labels so they scrape as zero
    LazyLock::force(&RATE_LIMIT_WAIT_SECONDS);
    LazyLock::force(&CLUSTER_GC_DURATION);
    LazyLock::force(&PROJECT_GC_DURATION);
}

/// Gather and encode all metrics in Prometheus text format.
///
/// # Errors
///
/// Returns error if encoding fails.
pub fn gather_metrics() -> Result<String, prometheus::Error> {
    let encoder = TextEncoder::new();
    let metric_families = METRICS_REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer)?;
    String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(format!("UTF-8 error: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_reconcile() {
        record_reconcile("TestKind", "create", "success", Duration::from_millis(500));

        let counter = RECONCILE_TOTAL.with_label_values(&["TestKind", "create", "success"]);
        assert!(counter.get() > 0.0);

        let histogram = RECONCILE_DURATION.with_label_values(&["TestKind", "create"]);
        assert!(histogram.get_sample_count() > 0);
    }

    #[test]
    fn test_record_api_call_and_retry() {
        record_api_call("identity", "get_domain", true, Duration::from_millis(30));
        record_api_call("identity", "get_domain", false, Duration::from_millis(30));
        record_api_retry("identity", "get_domain");

        let success = OPENSTACK_API_CALLS.with_label_values(&["identity", "get_domain", "success"]);
        let error = OPENSTACK_API_CALLS.with_label_values(&["identity", "get_domain", "error"]);
        assert!(success.get() > 0.0);
        assert!(error.get() > 0.0);
        assert!(
            OPENSTACK_API_RETRIES
                .with_label_values(&["identity", "get_domain"])
                .get()
                > 0.0
        );
    }

    #[test]
    fn test_init_and_gather_metrics() {
        init_metrics();
        set_operator_info("0.0.0-test", "test-cloud");

        let text = gather_metrics().expect("gathering metrics should succeed");
        assert!(text.contains("openstack_operator_reconcile_total"));
        assert!(text.contains("openstack_operator_project_gc_runs_total"));
        assert!(text.contains("openstack_operator_rate_limit_wait_seconds"));
        assert!(text.contains("openstack_operator_info"));
    }
}
