//! Pending sweep background task.
//!
//! Periodically runs the monitor's pending sweep: every created meeting
//! whose start has passed without a confirmation or rejection is flagged
//! as unresolved. This is the checkpoint caller of the resolution
//! property; the sweep is also reachable on demand via the verification
//! API.
//!
//! # Graceful Shutdown
//!
//! The task supports graceful shutdown via a cancellation token. When the
//! token is cancelled, the task completes its current iteration and exits
//! cleanly.

use chrono::Utc;
use sched_core::monitor::LifecycleMonitor;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{info, instrument, warn};

use crate::observability::metrics;

/// Start the pending sweep background task.
///
/// Runs the sweep on a fixed interval until the cancellation token is
/// triggered.
///
/// # Arguments
///
/// * `monitor` - Runtime lifecycle monitor
/// * `interval_seconds` - Sweep interval
/// * `cancel_token` - Token for graceful shutdown
#[instrument(skip_all, name = "sched.task.pending_checker")]
pub async fn start_pending_checker(
    monitor: Arc<LifecycleMonitor>,
    interval_seconds: u64,
    cancel_token: CancellationToken,
) {
    info!(
        target: "sched.task.pending_checker",
        check_interval = interval_seconds,
        "Starting pending sweep task"
    );

    let mut interval = tokio::time::interval(Duration::from_secs(interval_seconds));

    loop {
        tokio::select! {
            _ = interval.tick() => {
                let raised = monitor.check_pending(Utc::now());
                if !raised.is_empty() {
                    for violation in &raised {
                        metrics::record_violation(
                            &violation.property,
                            violation.severity.as_str(),
                        );
                    }
                    warn!(
                        target: "sched.task.pending_checker",
                        unresolved = raised.len(),
                        "Pending sweep raised violations"
                    );
                }
            }
            _ = cancel_token.cancelled() => {
                info!(
                    target: "sched.task.pending_checker",
                    "Pending sweep task received shutdown signal, exiting"
                );
                break;
            }
        }
    }

    info!(
        target: "sched.task.pending_checker",
        "Pending sweep task stopped"
    );
}
