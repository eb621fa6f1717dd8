//! Metrics collection for observability
//!
//! Prometheus metrics for monitoring the ledger dispatch surface.
//!
//! # Metrics
//!
//! - `ledger_operations_total` - Total dispatched operations
//! - `ledger_conflicts_total` - Operations rejected as already recorded
//! - `ledger_failures_total` - Operations that failed for any other reason
//! - `ledger_operation_duration_seconds` - Histogram of operation latencies

use prometheus::{Histogram, HistogramOpts, IntCounter, Registry};
use std::sync::Arc;

/// Metrics collector
#[derive(Clone)]
pub struct Metrics {
    /// Total dispatched operations
    pub operations_total: IntCounter,

    /// Conflicts (double-submission rejections)
    pub conflicts_total: IntCounter,

    /// Other failures
    pub failures_total: IntCounter,

    /// Operation duration histogram
    pub operation_duration: Histogram,

    /// Prometheus registry
    pub registry: Arc<Registry>,
}

impl Metrics {
    /// Create new metrics collector with its own registry
    pub fn new() -> prometheus::Result<Self> {
        let registry = Arc::new(Registry::new());

        let operations_total = IntCounter::new(
            "ledger_operations_total",
            "Total dispatched operations",
        )?;
        registry.register(Box::new(operations_total.clone()))?;

        let conflicts_total = IntCounter::new(
            "ledger_conflicts_total",
            "Operations rejected as already recorded",
        )?;
        registry.register(Box::new(conflicts_total.clone()))?;

        let failures_total = IntCounter::new(
            "ledger_failures_total",
            "Operations that failed for any other reason",
        )?;
        registry.register(Box::new(failures_total.clone()))?;

        let operation_duration = Histogram::with_opts(
            HistogramOpts::new(
                "ledger_operation_duration_seconds",
                "Histogram of operation latencies",
            )
            .buckets(vec![0.001, 0.005, 0.010, 0.025, 0.050, 0.100, 0.250, 0.500, 1.0]),
        )?;
        registry.register(Box::new(operation_duration.clone()))?;

        Ok(Self {
            operations_total,
            conflicts_total,
            failures_total,
            operation_duration,
            registry,
        })
    }

    /// Record a dispatched operation
    pub fn record_operation(&self) {
        self.operations_total.inc();
    }

    /// Record a conflict rejection
    pub fn record_conflict(&self) {
        self.conflicts_total.inc();
    }

    /// Record a non-conflict failure
    pub fn record_failure(&self) {
        self.failures_total.inc();
    }

    /// Record operation duration
    pub fn record_duration(&self, duration_seconds: f64) {
        self.operation_duration.observe(duration_seconds);
    }

    /// Get metrics registry
    pub fn registry(&self) -> &Registry {
        &self.registry
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new().expect("Failed to create metrics")
    }
}
