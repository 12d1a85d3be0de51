//! Metrics for observability.
//!
//! Exports Prometheus-compatible metrics for:
//! - Closure sizes
//! - Metadata stamping and commits
//! - Dispatch outcomes and latency
//! - Errors by type
//!
//! # Metric Naming Convention
//!
//! All metrics are prefixed with `replication_` and follow Prometheus conventions:
//! - Counters end in `_total`
//! - Gauges represent current state
//! - Histograms track distributions (duration, size)
//!
//! # Usage
//!
//! ```rust,no_run
//! use replication_orchestrator::metrics;
//! use std::time::Duration;
//!
//! metrics::record_closure_size("ADD", 12);
//! metrics::record_dispatch("remote", "publish", "ACCEPTED", true, Duration::from_millis(40));
//! ```

use metrics::{counter, gauge, histogram};
use std::time::Duration;

/// Record how many nodes a computed closure holds.
pub fn record_closure_size(operation: &str, size: usize) {
    histogram!("replication_closure_size", "operation" => operation.to_string()).record(size as f64);
}

/// Record nodes stamped with tracking properties.
pub fn record_stamped_nodes(service: &str, count: usize) {
    counter!("replication_stamped_nodes_total", "service" => service.to_string()).increment(count as u64);
}

/// Record a metadata commit.
pub fn record_commit(service: &str, success: bool) {
    let status = if success { "success" } else { "failure" };
    counter!("replication_commit_total", "service" => service.to_string(), "status" => status).increment(1);
}

/// Record a dispatch outcome and how long the backend took.
pub fn record_dispatch(service: &str, agent: &str, state: &str, accepted: bool, duration: Duration) {
    let status = if accepted { "accepted" } else { "rejected" };
    counter!(
        "replication_dispatch_total",
        "service" => service.to_string(),
        "agent" => agent.to_string(),
        "state" => state.to_string(),
        "status" => status
    )
    .increment(1);
    histogram!(
        "replication_dispatch_duration_seconds",
        "service" => service.to_string(),
        "agent" => agent.to_string()
    )
    .record(duration.as_secs_f64());
}

/// Record errors by type.
pub fn record_error(service: &str, error_type: &str) {
    counter!("replication_errors_total", "service" => service.to_string(), "error_type" => error_type.to_string()).increment(1);
}

/// Gauge for number of registered orchestrator instances.
pub fn set_registered_services(count: usize) {
    gauge!("replication_registered_services").set(count as f64);
}
