// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Garbage collection daemons.
//!
//! Two long-running background tasks, one per scope: namespaced project
//! resources and cluster-scoped primitives. Each tick walks the registry,
//! compares it against the live set of CRs and deletes orphans in
//! dependency order. Failures on individual orphans are logged and
//! isolated; the tick continues.
//!
//! The daemons run only while this replica holds the operator lease, which
//! preserves the contract of at most one GC tick in progress per scope.
//! They exit within the shutdown grace period when the stop signal fires.

pub mod cluster;
pub mod project;

use crate::context::Context;
use crate::metrics::{
    CLUSTER_GC_DURATION, CLUSTER_GC_RUNS, PROJECT_GC_DURATION, PROJECT_GC_RUNS,
};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::watch;
use tracing::{debug, error, info};

/// Orphans deleted by one tick, grouped by resource type.
pub type GcOutcome = BTreeMap<String, Vec<String>>;

/// Deletion order for namespaced project resources.
pub const PROJECT_GC_ORDER: [&str; 4] = ["security_groups", "networks", "groups", "projects"];

/// Deletion order for cluster-scoped resources.
pub const CLUSTER_GC_ORDER: [&str; 4] = ["provider_networks", "images", "flavors", "domains"];

fn total_deleted(outcome: &GcOutcome) -> usize {
    outcome.values().map(Vec::len).sum()
}

/// Run the project GC daemon until the shutdown signal fires.
///
/// `leader` gates each tick; `None` means leadership is not enforced
/// (single-replica deployments).
pub async fn run_project_gc(
    ctx: Arc<Context>,
    mut shutdown: watch::Receiver<bool>,
    leader: Option<watch::Receiver<bool>>,
) {
    let interval = Duration::from_secs(ctx.config.gc_interval_secs);
    info!(interval_secs = ctx.config.gc_interval_secs, "Project GC daemon started");

    loop {
        tokio::select! {
            _ = shutdown.changed() => {
                info!("Project GC daemon stopping");
                return;
            }
            () = tokio::time::sleep(interval) => {}
        }

        if let Some(leader) = &leader {
            if !*leader.borrow() {
                debug!("Project GC skipped, not the leader");
                continue;
            }
        }

        info!("Running garbage collection for domain {}", ctx.config.managed_domain);
        let start = Instant::now();
        match project::collect_project_garbage(&ctx).await {
            Ok(outcome) => {
                PROJECT_GC_DURATION.observe(start.elapsed().as_secs_f64());
                if total_deleted(&outcome) > 0 {
                    info!(?outcome, "Project GC completed");
                } else {
                    debug!("Project GC completed: no orphaned resources found");
                }
                PROJECT_GC_RUNS.with_label_values(&["success"]).inc();
            }
            Err(e) => {
                PROJECT_GC_DURATION.observe(start.elapsed().as_secs_f64());
                error!(error = %e, "Project garbage collection failed");
                PROJECT_GC_RUNS.with_label_values(&["error"]).inc();
            }
        }
    }
}

/// Run the cluster-scoped GC daemon until the shutdown signal fires.
pub async fn run_cluster_gc(
    ctx: Arc<Context>,
    mut shutdown: watch::Receiver<bool>,
    leader: Option<watch::Receiver<bool>>,
) {
    let interval = Duration::from_secs(ctx.config.cluster_gc_interval_secs);
    info!(
        interval_secs = ctx.config.cluster_gc_interval_secs,
        "Cluster GC daemon started"
    );

    loop {
        tokio::select! {
            _ = shutdown.changed() => {
                info!("Cluster GC daemon stopping");
                return;
            }
            () = tokio::time::sleep(interval) => {}
        }

        if let Some(leader) = &leader {
            if !*leader.borrow() {
                debug!("Cluster GC skipped, not the leader");
                continue;
            }
        }

        info!("Running cluster-scoped garbage collection");
        let start = Instant::now();
        match cluster::collect_cluster_garbage(&ctx).await {
            Ok(outcome) => {
                CLUSTER_GC_DURATION.observe(start.elapsed().as_secs_f64());
                if total_deleted(&outcome) > 0 {
                    info!(?outcome, "Cluster GC completed");
                } else {
                    debug!("Cluster GC completed: no orphaned resources found");
                }
                CLUSTER_GC_RUNS.with_label_values(&["success"]).inc();
            }
            Err(e) => {
                CLUSTER_GC_DURATION.observe(start.elapsed().as_secs_f64());
                error!(error = %e, "Cluster garbage collection failed");
                CLUSTER_GC_RUNS.with_label_values(&["error"]).inc();
            }
        }
    }
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod mod_tests;
