// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Prometheus metrics for the Space controller.
//!
//! All metrics use the namespace prefix `kf_dev_spaces_` (prometheus-safe version of
//! "spaces.kf.dev").
//!
//! # Metrics Categories
//!
//! - **Reconciliation Metrics** - Reconcile outcomes, durations and requeues
//! - **Dependent Metrics** - Writes issued against dependent resources
//! - **Retry Metrics** - Spaces waiting out a backoff
//!
//! # Example
//!
//! ```rust,no_run
//! use kf_spaces::metrics::record_reconciliation_success;
//!
//! record_reconciliation_success(std::time::Duration::from_millis(40));
//! ```

use prometheus::{
    CounterVec, Encoder, HistogramOpts, HistogramVec, IntGauge, Opts, Registry, TextEncoder,
};
use std::sync::LazyLock;
use std::time::Duration;

/// Namespace prefix for all Space controller metrics (prometheus-safe)
const METRICS_NAMESPACE: &str = "kf_dev_spaces";

/// Global Prometheus metrics registry
///
/// All metrics are registered in this registry and exposed via the `/metrics` endpoint.
pub static METRICS_REGISTRY: LazyLock<Registry> = LazyLock::new(Registry::new);

// ============================================================================
// Reconciliation Metrics
// ============================================================================

/// Total number of reconciliations by outcome
///
/// Labels:
/// - `outcome`: `success`, `stalled` or `error`
pub static RECONCILIATION_TOTAL: LazyLock<CounterVec> = LazyLock::new(|| {
    let opts = Opts::new(
        format!("{METRICS_NAMESPACE}_reconciliations_total"),
        "Total number of Space reconciliations by outcome",
    );
    let counter = CounterVec::new(opts, &["outcome"]).unwrap();
    METRICS_REGISTRY
        .register(Box::new(counter.clone()))
        .unwrap();
    counter
});

/// Duration of reconciliations in seconds
pub static RECONCILIATION_DURATION_SECONDS: LazyLock<HistogramVec> = LazyLock::new(|| {
    let opts = HistogramOpts::new(
        format!("{METRICS_NAMESPACE}_reconciliation_duration_seconds"),
        "Duration of Space reconciliations in seconds by outcome",
    )
    .buckets(vec![0.001, 0.01, 0.1, 0.5, 1.0, 2.0, 5.0, 10.0, 30.0, 60.0]);
    let histogram = HistogramVec::new(opts, &["outcome"]).unwrap();
    METRICS_REGISTRY
        .register(Box::new(histogram.clone()))
        .unwrap();
    histogram
});

/// Total number of requeue operations
///
/// Labels:
/// - `reason`: `error`, `stalled` or `dirty`
pub static REQUEUE_TOTAL: LazyLock<CounterVec> = LazyLock::new(|| {
    let opts = Opts::new(
        format!("{METRICS_NAMESPACE}_requeues_total"),
        "Total number of Space requeues by reason",
    );
    let counter = CounterVec::new(opts, &["reason"]).unwrap();
    METRICS_REGISTRY
        .register(Box::new(counter.clone()))
        .unwrap();
    counter
});

// ============================================================================
// Dependent Metrics
// ============================================================================

/// Total number of writes against dependent resources
///
/// Labels:
/// - `kind`: `Namespace`, `Role`, `ResourceQuota` or `LimitRange`
/// - `operation`: `create` or `replace`
pub static DEPENDENT_WRITES_TOTAL: LazyLock<CounterVec> = LazyLock::new(|| {
    let opts = Opts::new(
        format!("{METRICS_NAMESPACE}_dependent_writes_total"),
        "Total number of dependent resource writes by kind and operation",
    );
    let counter = CounterVec::new(opts, &["kind", "operation"]).unwrap();
    METRICS_REGISTRY
        .register(Box::new(counter.clone()))
        .unwrap();
    counter
});

/// Total number of failed dependent syncs by kind and condition reason
pub static DEPENDENT_ERRORS_TOTAL: LazyLock<CounterVec> = LazyLock::new(|| {
    let opts = Opts::new(
        format!("{METRICS_NAMESPACE}_dependent_errors_total"),
        "Total number of dependent sync failures by kind and reason",
    );
    let counter = CounterVec::new(opts, &["kind", "reason"]).unwrap();
    METRICS_REGISTRY
        .register(Box::new(counter.clone()))
        .unwrap();
    counter
});

// ============================================================================
// Retry Metrics
// ============================================================================

/// Number of Spaces currently retrying with backoff
pub static BACKOFF_SPACES: LazyLock<IntGauge> = LazyLock::new(|| {
    let gauge = IntGauge::new(
        format!("{METRICS_NAMESPACE}_backoff_spaces"),
        "Number of Spaces whose last reconcile failed and are waiting to retry",
    )
    .unwrap();
    METRICS_REGISTRY.register(Box::new(gauge.clone())).unwrap();
    gauge
});

// ============================================================================
// Helper Functions
// ============================================================================

fn record_reconciliation(outcome: &str, duration: Duration) {
    RECONCILIATION_TOTAL.with_label_values(&[outcome]).inc();
    RECONCILIATION_DURATION_SECONDS
        .with_label_values(&[outcome])
        .observe(duration.as_secs_f64());
}

/// Record a reconciliation where every dependent converged
pub fn record_reconciliation_success(duration: Duration) {
    record_reconciliation("success", duration);
}

/// Record a reconciliation that ended in a terminal failure
pub fn record_reconciliation_stalled(duration: Duration) {
    record_reconciliation("stalled", duration);
}

/// Record a reconciliation that will be retried
pub fn record_reconciliation_error(duration: Duration) {
    record_reconciliation("error", duration);
}

/// Record a requeue
///
/// # Arguments
/// * `reason` - Reason for requeue (e.g., `error`, `stalled`)
pub fn record_requeue(reason: &str) {
    REQUEUE_TOTAL.with_label_values(&[reason]).inc();
}

/// Record a dependent create
pub fn record_dependent_created(kind: &str) {
    DEPENDENT_WRITES_TOTAL
        .with_label_values(&[kind, "create"])
        .inc();
}

/// Record a dependent replace
pub fn record_dependent_updated(kind: &str) {
    DEPENDENT_WRITES_TOTAL
        .with_label_values(&[kind, "replace"])
        .inc();
}

/// Record a failed dependent sync
///
/// # Arguments
/// * `kind` - Dependent kind
/// * `reason` - Condition reason reported for the failure
pub fn record_dependent_error(kind: &str, reason: &str) {
    DEPENDENT_ERRORS_TOTAL
        .with_label_values(&[kind, reason])
        .inc();
}

/// Set the number of Spaces currently backing off
#[allow(clippy::cast_possible_wrap)]
pub fn set_backoff_spaces(count: usize) {
    BACKOFF_SPACES.set(count as i64);
}

/// Gather and encode all metrics in Prometheus text format
///
/// # Errors
/// Returns error if encoding fails
pub fn gather_metrics() -> Result<String, prometheus::Error> {
    let encoder = TextEncoder::new();
    let metric_families = METRICS_REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer)?;
    String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(format!("UTF-8 error: {e}")))
}
