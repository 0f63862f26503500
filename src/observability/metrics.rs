//! # Metrics
//!
//! Prometheus metrics for monitoring the provider.
//!
//! ## Metrics Exposed
//!
//! - `provider_magento_reconciliations_total` - Reconciles per kind
//! - `provider_magento_reconciliation_errors_total` - Failed reconciles per kind and reason
//! - `provider_magento_reconciliation_duration_seconds` - Reconcile duration per kind
//! - `provider_magento_external_operations_total` - Magento API calls per kind and operation
//! - `provider_magento_external_operation_errors_total` - Failed Magento API calls per kind and operation
//! - `provider_magento_external_operation_duration_seconds` - Magento API call duration
//! - `provider_magento_managed_kinds` - Kinds with a running reconciliation loop
//! - `provider_magento_discovery_failures_total` - Kinds that could not be set up

use anyhow::Result;
use prometheus::{HistogramVec, IntCounter, IntCounterVec, IntGauge, Registry};
use std::sync::LazyLock;

// Metrics
pub(crate) static REGISTRY: LazyLock<Registry> = LazyLock::new(Registry::new);

static RECONCILIATIONS_TOTAL: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        prometheus::Opts::new(
            "provider_magento_reconciliations_total",
            "Total number of reconciliations by kind",
        ),
        &["kind"],
    )
    .expect("Failed to create RECONCILIATIONS_TOTAL metric - this should never happen")
});

static RECONCILIATION_ERRORS_TOTAL: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        prometheus::Opts::new(
            "provider_magento_reconciliation_errors_total",
            "Total number of reconciliation errors by kind and reason",
        ),
        &["kind", "reason"],
    )
    .expect("Failed to create RECONCILIATION_ERRORS_TOTAL metric - this should never happen")
});

static RECONCILIATION_DURATION: LazyLock<HistogramVec> = LazyLock::new(|| {
    HistogramVec::new(
        prometheus::HistogramOpts::new(
            "provider_magento_reconciliation_duration_seconds",
            "Duration of reconciliation in seconds by kind",
        )
        .buckets(vec![0.1, 0.5, 1.0, 2.0, 5.0, 10.0, 30.0]),
        &["kind"],
    )
    .expect("Failed to create RECONCILIATION_DURATION metric - this should never happen")
});

static EXTERNAL_OPERATIONS_TOTAL: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        prometheus::Opts::new(
            "provider_magento_external_operations_total",
            "Total number of Magento API operations by kind and operation",
        ),
        &["kind", "operation"],
    )
    .expect("Failed to create EXTERNAL_OPERATIONS_TOTAL metric - this should never happen")
});

static EXTERNAL_OPERATION_ERRORS_TOTAL: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        prometheus::Opts::new(
            "provider_magento_external_operation_errors_total",
            "Total number of failed Magento API operations by kind and operation",
        ),
        &["kind", "operation"],
    )
    .expect("Failed to create EXTERNAL_OPERATION_ERRORS_TOTAL metric - this should never happen")
});

static EXTERNAL_OPERATION_DURATION: LazyLock<HistogramVec> = LazyLock::new(|| {
    HistogramVec::new(
        prometheus::HistogramOpts::new(
            "provider_magento_external_operation_duration_seconds",
            "Duration of Magento API operations in seconds",
        )
        .buckets(vec![0.05, 0.1, 0.5, 1.0, 2.0, 5.0]),
        &["kind", "operation"],
    )
    .expect("Failed to create EXTERNAL_OPERATION_DURATION metric - this should never happen")
});

static MANAGED_KINDS: LazyLock<IntGauge> = LazyLock::new(|| {
    IntGauge::new(
        "provider_magento_managed_kinds",
        "Number of kinds with a running reconciliation loop",
    )
    .expect("Failed to create MANAGED_KINDS metric - this should never happen")
});

static DISCOVERY_FAILURES_TOTAL: LazyLock<IntCounter> = LazyLock::new(|| {
    IntCounter::new(
        "provider_magento_discovery_failures_total",
        "Total number of kinds that could not be set up for reconciliation",
    )
    .expect("Failed to create DISCOVERY_FAILURES_TOTAL metric - this should never happen")
});

#[allow(
    clippy::missing_errors_doc,
    reason = "Error documentation is provided in doc comments"
)]
/// Register every metric with the process registry
///
/// Fails if called twice, since prometheus rejects duplicate collectors.
pub fn register_metrics() -> Result<()> {
    REGISTRY.register(Box::new(RECONCILIATIONS_TOTAL.clone()))?;
    REGISTRY.register(Box::new(RECONCILIATION_ERRORS_TOTAL.clone()))?;
    REGISTRY.register(Box::new(RECONCILIATION_DURATION.clone()))?;
    REGISTRY.register(Box::new(EXTERNAL_OPERATIONS_TOTAL.clone()))?;
    REGISTRY.register(Box::new(EXTERNAL_OPERATION_ERRORS_TOTAL.clone()))?;
    REGISTRY.register(Box::new(EXTERNAL_OPERATION_DURATION.clone()))?;
    REGISTRY.register(Box::new(MANAGED_KINDS.clone()))?;
    REGISTRY.register(Box::new(DISCOVERY_FAILURES_TOTAL.clone()))?;
    Ok(())
}

pub fn increment_reconciliations(kind: &str) {
    RECONCILIATIONS_TOTAL.with_label_values(&[kind]).inc();
}

pub fn increment_reconciliation_errors(kind: &str, reason: &str) {
    RECONCILIATION_ERRORS_TOTAL
        .with_label_values(&[kind, reason])
        .inc();
}

pub fn observe_reconciliation_duration(kind: &str, duration: f64) {
    RECONCILIATION_DURATION
        .with_label_values(&[kind])
        .observe(duration);
}

/// Record one completed Magento API operation
pub fn record_external_operation(kind: &str, operation: &str, duration: f64) {
    EXTERNAL_OPERATIONS_TOTAL
        .with_label_values(&[kind, operation])
        .inc();
    EXTERNAL_OPERATION_DURATION
        .with_label_values(&[kind, operation])
        .observe(duration);
}

pub fn increment_external_operation_errors(kind: &str, operation: &str) {
    EXTERNAL_OPERATION_ERRORS_TOTAL
        .with_label_values(&[kind, operation])
        .inc();
}

pub fn set_managed_kinds(count: usize) {
    MANAGED_KINDS.set(i64::try_from(count).unwrap_or(i64::MAX));
}

pub fn increment_discovery_failures() {
    DISCOVERY_FAILURES_TOTAL.inc();
}
