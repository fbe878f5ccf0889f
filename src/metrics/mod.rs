//! Metrics for the skill ledger
//!
//! Prometheus counters and histograms for recomputation passes and match
//! lifecycle events.

pub mod collector;

pub use collector::{LedgerMetrics, MetricsCollector, MetricsTimer, PerformanceMetrics};
