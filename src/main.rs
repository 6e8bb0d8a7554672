// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

use anyhow::Result;
use axum::{routing::get, Router};
use futures::StreamExt;
use kube::api::Api;
use kube::runtime::{controller::Action, finalizer, watcher::Config as WatcherConfig, Controller};
use kube::{Client, ResourceExt};
use kube_lease_manager::LeaseManagerBuilder;
use openstack_operator::constants::{
    DEFAULT_CLOUD_NAME, DEFAULT_LEASE_DURATION_SECS, DEFAULT_LEASE_RETRY_PERIOD_SECS,
    ERROR_REQUEUE_SECS, FINALIZER, GC_SHUTDOWN_GRACE_SECS, KIND_DOMAIN, KIND_FLAVOR, KIND_IMAGE,
    KIND_NETWORK, KIND_PROJECT, METRICS_SERVER_BIND_ADDRESS, METRICS_SERVER_PATH,
    OPERATOR_VERSION, TOKIO_WORKER_THREADS,
};
use openstack_operator::context::{Context, OperatorConfig};
use openstack_operator::crd::{
    OpenstackDomain, OpenstackFlavor, OpenstackImage, OpenstackNetwork, OpenstackProject,
};
use openstack_operator::errors::Error as ReconcileError;
use openstack_operator::metrics::{self, RECONCILE_IN_PROGRESS};
use openstack_operator::{gc, reconcilers};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

fn main() -> Result<()> {
    // Build Tokio runtime with custom thread names
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(TOKIO_WORKER_THREADS)
        .thread_name("openstack-operator")
        .enable_all()
        .build()?;

    runtime.block_on(async_main())
}

/// Initialize logging with custom format
///
/// Respects `RUST_LOG` environment variable if set, otherwise defaults to INFO level.
/// Respects `RUST_LOG_FORMAT` environment variable for output format (json or text).
fn initialize_logging() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    let log_format = std::env::var("RUST_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());

    match log_format.to_lowercase().as_str() {
        "json" => {
            tracing_subscriber::fmt()
                .with_env_filter(env_filter)
                .with_file(true)
                .with_line_number(true)
                .with_thread_names(true)
                .with_target(false)
                .json()
                .init();
        }
        _ => {
            tracing_subscriber::fmt()
                .with_env_filter(env_filter)
                .with_file(true)
                .with_line_number(true)
                .with_thread_names(true)
                .with_target(false)
                .with_ansi(true)
                .compact()
                .init();
        }
    }

    info!("Starting OpenStack operator");
}

/// Start the Prometheus metrics HTTP server
fn start_metrics_server(port: u16) -> tokio::task::JoinHandle<()> {
    info!(
        bind_address = METRICS_SERVER_BIND_ADDRESS,
        port,
        path = METRICS_SERVER_PATH,
        "Starting Prometheus metrics HTTP server"
    );

    tokio::spawn(async move {
        async fn metrics_handler() -> String {
            match metrics::gather_metrics() {
                Ok(metrics_text) => metrics_text,
                Err(e) => {
                    error!("Failed to gather metrics: {}", e);
                    String::from("# Error gathering metrics\n")
                }
            }
        }

        let app = Router::new().route(METRICS_SERVER_PATH, get(metrics_handler));

        let bind_addr = format!("{METRICS_SERVER_BIND_ADDRESS}:{port}");
        let listener = match tokio::net::TcpListener::bind(&bind_addr).await {
            Ok(listener) => listener,
            Err(e) => {
                error!("Failed to bind metrics server to {bind_addr}: {e}");
                return;
            }
        };

        info!("Metrics server listening on http://{bind_addr}{METRICS_SERVER_PATH}");

        if let Err(e) = axum::serve(listener, app).await {
            error!("Metrics server error: {e}");
        }
    })
}

/// Leader election configuration
struct LeaderElectionConfig {
    enabled: bool,
    lease_name: String,
    lease_namespace: String,
    identity: String,
    lease_duration: u64,
    retry_period: u64,
}

/// Load leader election configuration from environment variables
fn load_leader_election_config() -> LeaderElectionConfig {
    let enabled = std::env::var("OPERATOR_ENABLE_LEADER_ELECTION")
        .unwrap_or_else(|_| "true".to_string())
        .parse::<bool>()
        .unwrap_or(true);

    let lease_name = std::env::var("OPERATOR_LEASE_NAME")
        .unwrap_or_else(|_| "openstack-operator-leader".to_string());

    let lease_namespace = std::env::var("OPERATOR_LEASE_NAMESPACE")
        .or_else(|_| std::env::var("POD_NAMESPACE"))
        .unwrap_or_else(|_| "openstack-operator".to_string());

    let lease_duration = std::env::var("OPERATOR_LEASE_DURATION_SECONDS")
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .unwrap_or(DEFAULT_LEASE_DURATION_SECS);

    let retry_period = std::env::var("OPERATOR_LEASE_RETRY_PERIOD_SECONDS")
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .unwrap_or(DEFAULT_LEASE_RETRY_PERIOD_SECS);

    let identity = std::env::var("POD_NAME")
        .or_else(|_| std::env::var("HOSTNAME"))
        .unwrap_or_else(|_| format!("openstack-operator-{}", rand::random::<u32>()));

    LeaderElectionConfig {
        enabled,
        lease_name,
        lease_namespace,
        identity,
        lease_duration,
        retry_period,
    }
}

/// Watcher configuration that only triggers on semantic (spec) changes.
///
/// Status patches made by the reconcilers themselves must not re-trigger
/// reconciliation; periodic work rides on the requeue actions instead.
#[inline]
fn semantic_watcher_config() -> WatcherConfig {
    WatcherConfig::default().any_semantic()
}

async fn async_main() -> Result<()> {
    initialize_logging();

    let config = OperatorConfig::from_env();
    let client = Client::try_default().await?;
    let context = Arc::new(Context::new(client.clone(), config));

    let _metrics_handle = start_metrics_server(context.config.metrics_port);

    metrics::init_metrics();
    let cloud = std::env::var("OS_CLOUD").unwrap_or_else(|_| DEFAULT_CLOUD_NAME.to_string());
    metrics::set_operator_info(OPERATOR_VERSION, &cloud);
    info!("OpenStack operator started (version {OPERATOR_VERSION})");

    let leader_election = load_leader_election_config();
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let run_result = if leader_election.enabled {
        info!(
            lease_name = %leader_election.lease_name,
            lease_namespace = %leader_election.lease_namespace,
            identity = %leader_election.identity,
            lease_duration_secs = leader_election.lease_duration,
            "Leader election enabled"
        );

        let lease_manager =
            LeaseManagerBuilder::new(client.clone(), &leader_election.lease_name)
                .with_namespace(&leader_election.lease_namespace)
                .with_identity(&leader_election.identity)
                .with_duration(leader_election.lease_duration)
                .with_grace(leader_election.retry_period)
                .build()
                .await?;

        let (leader_rx, _lease_handle) = lease_manager.watch().await;

        info!("Starting leader election, waiting to acquire leadership...");
        let mut rx = leader_rx.clone();
        while !*rx.borrow_and_update() {
            rx.changed().await?;
        }
        info!("Leadership acquired! Starting controllers...");

        let gc_handles = spawn_gc_daemons(
            context.clone(),
            shutdown_rx.clone(),
            Some(leader_rx.clone()),
        );

        let result: Result<()> = tokio::select! {
            result = tokio::signal::ctrl_c() => {
                info!("Received SIGINT (Ctrl+C), initiating graceful shutdown...");
                result.map_err(anyhow::Error::from)
            }
            result = wait_for_sigterm() => {
                info!("Received SIGTERM (pod termination), initiating graceful shutdown...");
                result
            }
            result = monitor_leadership(leader_rx) => {
                match result {
                    Ok(()) => {
                        warn!("Leadership lost! Stopping all controllers...");
                        anyhow::bail!("Leadership lost - stepping down")
                    }
                    Err(e) => {
                        error!("Leadership monitor error: {:?}", e);
                        anyhow::bail!("Leadership monitoring failed: {e}")
                    }
                }
            }
            result = run_all_controllers(context.clone()) => {
                result
            }
        };

        shutdown(&context, &shutdown_tx, gc_handles).await;
        result
    } else {
        warn!("Leader election DISABLED - running without high availability");

        let gc_handles = spawn_gc_daemons(context.clone(), shutdown_rx.clone(), None);

        let result: Result<()> = tokio::select! {
            result = tokio::signal::ctrl_c() => {
                info!("Received SIGINT (Ctrl+C), initiating graceful shutdown...");
                result.map_err(anyhow::Error::from)
            }
            result = wait_for_sigterm() => {
                info!("Received SIGTERM (pod termination), initiating graceful shutdown...");
                result
            }
            result = run_all_controllers(context.clone()) => {
                result
            }
        };

        shutdown(&context, &shutdown_tx, gc_handles).await;
        result
    };

    run_result?;
    info!("Graceful shutdown completed successfully");
    Ok(())
}

/// Wait for SIGTERM; pends forever on non-Unix platforms.
async fn wait_for_sigterm() -> Result<()> {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        let mut sigterm = signal(SignalKind::terminate())?;
        sigterm.recv().await;
        Ok(())
    }
    #[cfg(not(unix))]
    {
        std::future::pending::<()>().await;
        Ok(())
    }
}

/// Monitor leadership status - returns when leadership is lost
async fn monitor_leadership(mut leader_rx: watch::Receiver<bool>) -> Result<()> {
    loop {
        leader_rx.changed().await?;
        if !*leader_rx.borrow() {
            return Ok(());
        }
    }
}

/// Spawn both GC daemons; they tick only while this replica leads.
fn spawn_gc_daemons(
    context: Arc<Context>,
    shutdown_rx: watch::Receiver<bool>,
    leader_rx: Option<watch::Receiver<bool>>,
) -> Vec<tokio::task::JoinHandle<()>> {
    vec![
        tokio::spawn(gc::run_project_gc(
            context.clone(),
            shutdown_rx.clone(),
            leader_rx.clone(),
        )),
        tokio::spawn(gc::run_cluster_gc(context, shutdown_rx, leader_rx)),
    ]
}

/// Signal the GC daemons, give them the grace period, then close handles.
async fn shutdown(
    context: &Arc<Context>,
    shutdown_tx: &watch::Sender<bool>,
    gc_handles: Vec<tokio::task::JoinHandle<()>>,
) {
    info!("Stopping GC daemons...");
    let _ = shutdown_tx.send(true);

    for handle in gc_handles {
        if tokio::time::timeout(Duration::from_secs(GC_SHUTDOWN_GRACE_SECS), handle)
            .await
            .is_err()
        {
            warn!("GC daemon did not stop within the grace period");
        }
    }

    context.close().await;
}

/// Run all controllers; any controller exiting is fatal.
async fn run_all_controllers(context: Arc<Context>) -> Result<()> {
    tokio::select! {
        result = run_project_controller(context.clone()) => {
            error!("CRITICAL: OpenstackProject controller exited unexpectedly: {:?}", result);
            result?;
            anyhow::bail!("OpenstackProject controller exited unexpectedly without error")
        }
        result = run_domain_controller(context.clone()) => {
            error!("CRITICAL: OpenstackDomain controller exited unexpectedly: {:?}", result);
            result?;
            anyhow::bail!("OpenstackDomain controller exited unexpectedly without error")
        }
        result = run_flavor_controller(context.clone()) => {
            error!("CRITICAL: OpenstackFlavor controller exited unexpectedly: {:?}", result);
            result?;
            anyhow::bail!("OpenstackFlavor controller exited unexpectedly without error")
        }
        result = run_image_controller(context.clone()) => {
            error!("CRITICAL: OpenstackImage controller exited unexpectedly: {:?}", result);
            result?;
            anyhow::bail!("OpenstackImage controller exited unexpectedly without error")
        }
        result = run_network_controller(context.clone()) => {
            error!("CRITICAL: OpenstackNetwork controller exited unexpectedly: {:?}", result);
            result?;
            anyhow::bail!("OpenstackNetwork controller exited unexpectedly without error")
        }
    }
}

/// Map finalizer errors back onto the reconciler error type.
fn map_finalizer_error(e: finalizer::Error<ReconcileError>) -> ReconcileError {
    match e {
        finalizer::Error::ApplyFailed(err) | finalizer::Error::CleanupFailed(err) => err,
        finalizer::Error::AddFinalizer(err) | finalizer::Error::RemoveFinalizer(err) => {
            ReconcileError::Kube(err)
        }
        finalizer::Error::UnnamedObject => {
            ReconcileError::Other(anyhow::anyhow!("resource has no name"))
        }
        finalizer::Error::InvalidFinalizer => {
            ReconcileError::Other(anyhow::anyhow!("invalid finalizer name"))
        }
    }
}

/// Error policy shared by all controllers.
///
/// Permanent (validation) errors wait for a spec change; everything else is
/// requeued after the fixed delay.
#[allow(clippy::needless_pass_by_value)] // Signature required by kube::runtime::Controller
fn error_policy<K>(resource: Arc<K>, err: &ReconcileError, _ctx: Arc<Context>) -> Action
where
    K: ResourceExt,
{
    if err.is_permanent() {
        error!(
            error = %err,
            resource = %resource.name_any(),
            "Permanent reconciliation error - waiting for spec change"
        );
        Action::await_change()
    } else {
        error!(
            error = %err,
            resource = %resource.name_any(),
            "Reconciliation error - will retry in {}s",
            ERROR_REQUEUE_SECS
        );
        Action::requeue(Duration::from_secs(ERROR_REQUEUE_SECS))
    }
}

/// Run the `OpenstackProject` controller
async fn run_project_controller(context: Arc<Context>) -> Result<()> {
    info!("Starting OpenstackProject controller");

    let api: Api<OpenstackProject> = if context.config.watch_namespace.is_empty() {
        Api::all(context.client.clone())
    } else {
        info!(
            namespace = %context.config.watch_namespace,
            "Watching a single namespace"
        );
        Api::namespaced(context.client.clone(), &context.config.watch_namespace)
    };

    Controller::new(api, semantic_watcher_config())
        .run(reconcile_project_wrapper, error_policy, context)
        .for_each(|_| futures::future::ready(()))
        .await;

    Ok(())
}

/// Reconcile wrapper for `OpenstackProject`
async fn reconcile_project_wrapper(
    project: Arc<OpenstackProject>,
    ctx: Arc<Context>,
) -> Result<Action, ReconcileError> {
    debug!(
        name = %project.name_any(),
        namespace = ?project.namespace(),
        "Reconcile wrapper called for OpenstackProject"
    );
    RECONCILE_IN_PROGRESS.with_label_values(&[KIND_PROJECT]).inc();

    let api: Api<OpenstackProject> = Api::namespaced(
        ctx.client.clone(),
        &project.namespace().unwrap_or_default(),
    );
    let result = finalizer(&api, FINALIZER, project, |event| async {
        match event {
            finalizer::Event::Apply(p) => reconcilers::project::reconcile(ctx.clone(), p).await,
            finalizer::Event::Cleanup(p) => reconcilers::project::cleanup(ctx.clone(), p).await,
        }
    })
    .await;

    RECONCILE_IN_PROGRESS.with_label_values(&[KIND_PROJECT]).dec();
    result.map_err(map_finalizer_error)
}

/// Run the `OpenstackDomain` controller
async fn run_domain_controller(context: Arc<Context>) -> Result<()> {
    info!("Starting OpenstackDomain controller");

    let api: Api<OpenstackDomain> = Api::all(context.client.clone());
    Controller::new(api, semantic_watcher_config())
        .run(reconcile_domain_wrapper, error_policy, context)
        .for_each(|_| futures::future::ready(()))
        .await;

    Ok(())
}

/// Reconcile wrapper for `OpenstackDomain`
async fn reconcile_domain_wrapper(
    domain: Arc<OpenstackDomain>,
    ctx: Arc<Context>,
) -> Result<Action, ReconcileError> {
    RECONCILE_IN_PROGRESS.with_label_values(&[KIND_DOMAIN]).inc();

    let api: Api<OpenstackDomain> = Api::all(ctx.client.clone());
    let result = finalizer(&api, FINALIZER, domain, |event| async {
        match event {
            finalizer::Event::Apply(d) => reconcilers::domain::reconcile(ctx.clone(), d).await,
            finalizer::Event::Cleanup(d) => reconcilers::domain::cleanup(ctx.clone(), d).await,
        }
    })
    .await;

    RECONCILE_IN_PROGRESS.with_label_values(&[KIND_DOMAIN]).dec();
    result.map_err(map_finalizer_error)
}

/// Run the `OpenstackFlavor` controller
async fn run_flavor_controller(context: Arc<Context>) -> Result<()> {
    info!("Starting OpenstackFlavor controller");

    let api: Api<OpenstackFlavor> = Api::all(context.client.clone());
    Controller::new(api, semantic_watcher_config())
        .run(reconcile_flavor_wrapper, error_policy, context)
        .for_each(|_| futures::future::ready(()))
        .await;

    Ok(())
}

/// Reconcile wrapper for `OpenstackFlavor`
async fn reconcile_flavor_wrapper(
    flavor: Arc<OpenstackFlavor>,
    ctx: Arc<Context>,
) -> Result<Action, ReconcileError> {
    RECONCILE_IN_PROGRESS.with_label_values(&[KIND_FLAVOR]).inc();

    let api: Api<OpenstackFlavor> = Api::all(ctx.client.clone());
    let result = finalizer(&api, FINALIZER, flavor, |event| async {
        match event {
            finalizer::Event::Apply(f) => reconcilers::flavor::reconcile(ctx.clone(), f).await,
            finalizer::Event::Cleanup(f) => reconcilers::flavor::cleanup(ctx.clone(), f).await,
        }
    })
    .await;

    RECONCILE_IN_PROGRESS.with_label_values(&[KIND_FLAVOR]).dec();
    result.map_err(map_finalizer_error)
}

/// Run the `OpenstackImage` controller
async fn run_image_controller(context: Arc<Context>) -> Result<()> {
    info!("Starting OpenstackImage controller");

    let api: Api<OpenstackImage> = Api::all(context.client.clone());
    Controller::new(api, semantic_watcher_config())
        .run(reconcile_image_wrapper, error_policy, context)
        .for_each(|_| futures::future::ready(()))
        .await;

    Ok(())
}

/// Reconcile wrapper for `OpenstackImage`
async fn reconcile_image_wrapper(
    image: Arc<OpenstackImage>,
    ctx: Arc<Context>,
) -> Result<Action, ReconcileError> {
    RECONCILE_IN_PROGRESS.with_label_values(&[KIND_IMAGE]).inc();

    let api: Api<OpenstackImage> = Api::all(ctx.client.clone());
    let result = finalizer(&api, FINALIZER, image, |event| async {
        match event {
            finalizer::Event::Apply(i) => reconcilers::image::reconcile(ctx.clone(), i).await,
            finalizer::Event::Cleanup(i) => reconcilers::image::cleanup(ctx.clone(), i).await,
        }
    })
    .await;

    RECONCILE_IN_PROGRESS.with_label_values(&[KIND_IMAGE]).dec();
    result.map_err(map_finalizer_error)
}

/// Run the `OpenstackNetwork` controller
async fn run_network_controller(context: Arc<Context>) -> Result<()> {
    info!("Starting OpenstackNetwork controller");

    let api: Api<OpenstackNetwork> = Api::all(context.client.clone());
    Controller::new(api, semantic_watcher_config())
        .run(reconcile_network_wrapper, error_policy, context)
        .for_each(|_| futures::future::ready(()))
        .await;

    Ok(())
}

/// Reconcile wrapper for `OpenstackNetwork`
async fn reconcile_network_wrapper(
    network: Arc<OpenstackNetwork>,
    ctx: Arc<Context>,
) -> Result<Action, ReconcileError> {
    RECONCILE_IN_PROGRESS.with_label_values(&[KIND_NETWORK]).inc();

    let api: Api<OpenstackNetwork> = Api::all(ctx.client.clone());
    let result = finalizer(&api, FINALIZER, network, |event| async {
        match event {
            finalizer::Event::Apply(n) => {
                reconcilers::provider_network::reconcile(ctx.clone(), n).await
            }
            finalizer::Event::Cleanup(n) => {
                reconcilers::provider_network::cleanup(ctx.clone(), n).await
            }
        }
    })
    .await;

    RECONCILE_IN_PROGRESS.with_label_values(&[KIND_NETWORK]).dec();
    result.map_err(map_finalizer_error)
}
