//! Metrics collection using Prometheus
//!
//! This module records recomputation passes and match lifecycle events
//! for the skill ledger.

use crate::ledger::engine::ReplayReport;
use anyhow::Result;
use prometheus::{
    Encoder, Histogram, HistogramOpts, IntCounter, IntCounterVec, IntGauge, Opts, Registry,
    TextEncoder,
};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Main metrics collector for the ledger
#[derive(Clone)]
pub struct MetricsCollector {
    /// Prometheus registry
    registry: Arc<Registry>,

    /// Ledger state and lifecycle metrics
    ledger_metrics: LedgerMetrics,

    /// Performance metrics
    performance_metrics: PerformanceMetrics,
}

/// Ledger state and lifecycle metrics
#[derive(Clone)]
pub struct LedgerMetrics {
    /// Completed recomputation passes by trigger
    pub recomputations_total: IntCounterVec,

    /// Matches folded into a timeline across all passes
    pub matches_replayed_total: IntCounter,

    /// Observations in the current timeline
    pub observations: IntGauge,

    /// Registered users
    pub users: IntGauge,

    /// Match lifecycle events (created, partially_approved, fully_approved, deleted)
    pub match_events_total: IntCounterVec,

    /// Failed operations by operation and error kind
    pub failures_total: IntCounterVec,
}

/// Performance metrics
#[derive(Clone)]
pub struct PerformanceMetrics {
    /// Wall time of a full recomputation pass
    pub recompute_duration: Histogram,
}

impl MetricsCollector {
    /// Create a new metrics collector with default registry
    pub fn new() -> Result<Self> {
        let registry = Arc::new(Registry::new());
        Self::with_registry(registry)
    }

    /// Create a new metrics collector with custom registry
    pub fn with_registry(registry: Arc<Registry>) -> Result<Self> {
        let ledger_metrics = LedgerMetrics::new(&registry)?;
        let performance_metrics = PerformanceMetrics::new(&registry)?;

        Ok(Self {
            registry,
            ledger_metrics,
            performance_metrics,
        })
    }

    /// Get the Prometheus registry
    pub fn registry(&self) -> Arc<Registry> {
        self.registry.clone()
    }

    pub fn ledger(&self) -> &LedgerMetrics {
        &self.ledger_metrics
    }

    pub fn performance(&self) -> &PerformanceMetrics {
        &self.performance_metrics
    }

    /// Record a committed recomputation pass
    pub fn record_recomputation(&self, trigger: &str, report: &ReplayReport, duration: Duration) {
        self.ledger_metrics
            .recomputations_total
            .with_label_values(&[trigger])
            .inc();
        self.ledger_metrics
            .matches_replayed_total
            .inc_by(report.matches_replayed as u64);
        self.ledger_metrics
            .observations
            .set(report.observations as i64);
        self.performance_metrics
            .recompute_duration
            .observe(duration.as_secs_f64());
    }

    /// Record a match lifecycle event
    pub fn record_match_event(&self, event: &str) {
        self.ledger_metrics
            .match_events_total
            .with_label_values(&[event])
            .inc();
    }

    /// Record a failed ledger operation
    pub fn record_failure(&self, operation: &str, kind: &str) {
        self.ledger_metrics
            .failures_total
            .with_label_values(&[operation, kind])
            .inc();
    }

    pub fn set_user_count(&self, users: usize) {
        self.ledger_metrics.users.set(users as i64);
    }

    /// Render all metrics in the Prometheus text exposition format
    pub fn encode_text(&self) -> Result<String> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
        Ok(String::from_utf8(buffer)?)
    }

    /// Create a timer for measuring operation duration
    pub fn start_timer(&self) -> MetricsTimer {
        MetricsTimer::new()
    }
}

/// Timer for measuring operation durations
pub struct MetricsTimer {
    start: Instant,
}

impl MetricsTimer {
    fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    /// Get the elapsed duration
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    /// Stop the timer and return the duration
    pub fn stop(self) -> Duration {
        self.elapsed()
    }
}

impl LedgerMetrics {
    fn new(registry: &Registry) -> Result<Self> {
        let recomputations_total = IntCounterVec::new(
            Opts::new(
                "skill_ledger_recomputations_total",
                "Completed rating recomputation passes",
            ),
            &["trigger"],
        )?;
        registry.register(Box::new(recomputations_total.clone()))?;

        let matches_replayed_total = IntCounter::new(
            "skill_ledger_matches_replayed_total",
            "Matches replayed across all recomputation passes",
        )?;
        registry.register(Box::new(matches_replayed_total.clone()))?;

        let observations = IntGauge::new(
            "skill_ledger_observations",
            "Rating observations in the current timeline",
        )?;
        registry.register(Box::new(observations.clone()))?;

        let users = IntGauge::new("skill_ledger_users", "Registered users")?;
        registry.register(Box::new(users.clone()))?;

        let match_events_total = IntCounterVec::new(
            Opts::new("skill_ledger_match_events_total", "Match lifecycle events"),
            &["event"],
        )?;
        registry.register(Box::new(match_events_total.clone()))?;

        let failures_total = IntCounterVec::new(
            Opts::new("skill_ledger_failures_total", "Failed ledger operations"),
            &["operation", "kind"],
        )?;
        registry.register(Box::new(failures_total.clone()))?;

        Ok(Self {
            recomputations_total,
            matches_replayed_total,
            observations,
            users,
            match_events_total,
            failures_total,
        })
    }
}

impl PerformanceMetrics {
    fn new(registry: &Registry) -> Result<Self> {
        let recompute_duration = Histogram::with_opts(
            HistogramOpts::new(
                "skill_ledger_recompute_duration_seconds",
                "Duration of full rating recomputation passes",
            )
            .buckets(vec![0.0005, 0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0, 5.0]),
        )?;
        registry.register(Box::new(recompute_duration.clone()))?;

        Ok(Self { recompute_duration })
    }
}
