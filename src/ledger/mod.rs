//! Match ledger: approval workflow, recomputation engine and the caller-facing service
//!
//! Matches only influence ratings once both teams approve them. Any change to
//! the set of eligible matches rebuilds the whole rating timeline.

pub mod approval;
pub mod engine;
pub mod manager;

// Re-export commonly used types
pub use approval::{ApprovalState, ApprovalTransition};
pub use engine::{RecomputationEngine, ReplayReport, SeedAnchor};
pub use manager::{ApprovalOutcome, Ledger, RecomputeTrigger};
