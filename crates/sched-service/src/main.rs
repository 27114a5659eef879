//! Scheduler Service
//!
//! Entry point for the verified meeting scheduler. Wires the verification
//! core (decision backend + lifecycle monitor) to the Postgres store and
//! the HTTP surface, starts the background pending sweep, and serves until
//! shutdown.

#![warn(clippy::pedantic)]

use std::sync::Arc;

use anyhow::Context;
use sched_core::monitor::LifecycleMonitor;
use sched_core::solver::{DecisionBackend, IntervalBackend};
use sched_service::config::Config;
use sched_service::observability::metrics::init_metrics_recorder;
use sched_service::routes::{build_routes, AppState};
use sched_service::services::SchedulingService;
use sched_service::store::{MeetingStore, PgStore};
use sched_service::tasks::pending_checker::start_pending_checker;
use sqlx::postgres::PgPoolOptions;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "sched_service=debug,sched_core=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Scheduler Service");

    // Load configuration
    let config = Config::from_env().map_err(|e| {
        error!("Failed to load configuration: {}", e);
        e
    })?;

    info!(
        bind_address = %config.bind_address,
        solver_enabled = config.solver_enabled,
        solver_timeout_ms = config.solver_timeout_ms,
        slot_increment_minutes = config.slot_increment_minutes,
        pending_check_interval_seconds = config.pending_check_interval_seconds,
        "Configuration loaded successfully"
    );

    // Metrics recorder must be installed before any metric is recorded.
    let metrics_handle =
        init_metrics_recorder().map_err(|e| anyhow::anyhow!("Metrics init failed: {e}"))?;

    // Database pool and store
    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(&config.database_url)
        .await
        .context("Failed to connect to database")?;
    let store: Arc<dyn MeetingStore> = Arc::new(PgStore::new(pool));

    // Verification core: decision backend and runtime monitor. Both are
    // process-wide singletons shared across request handlers. The monitor
    // is volatile and rebuilds from zero on restart.
    let backend: Arc<dyn DecisionBackend> = Arc::new(IntervalBackend::new(config.solver_timeout()));
    backend.set_enabled(config.solver_enabled);
    let monitor = Arc::new(LifecycleMonitor::new());

    let service = Arc::new(SchedulingService::new(
        store.clone(),
        backend,
        monitor.clone(),
        &config,
    ));

    let state = Arc::new(AppState {
        store,
        service,
        monitor: monitor.clone(),
        config: config.clone(),
    });

    // Background pending sweep
    let cancel_token = CancellationToken::new();
    let sweep_task = tokio::spawn(start_pending_checker(
        monitor,
        config.pending_check_interval_seconds,
        cancel_token.clone(),
    ));

    // Serve
    let app = build_routes(state, metrics_handle);
    let listener = tokio::net::TcpListener::bind(&config.bind_address)
        .await
        .with_context(|| format!("Failed to bind {}", config.bind_address))?;
    info!(bind_address = %config.bind_address, "Listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(cancel_token))
        .await
        .context("Server error")?;

    // Let the sweep finish its current iteration.
    sweep_task.await.context("Pending sweep task panicked")?;

    info!("Scheduler Service stopped");
    Ok(())
}

/// Resolve on SIGTERM or ctrl-c and cancel the background tasks.
async fn shutdown_signal(cancel_token: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to install ctrl-c handler");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => error!(error = %e, "Failed to install SIGTERM handler"),
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    info!("Shutdown signal received");
    cancel_token.cancel();
}
