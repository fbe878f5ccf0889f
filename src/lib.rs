//! Skill Ledger - Elo and TrueSkill ratings derived from approved match history
//!
//! This crate records matches between teams of users, gates them behind a
//! two-team approval workflow and rebuilds per-user rating timelines by
//! replaying every approved match in order.

pub mod config;
pub mod error;
pub mod ledger;
pub mod metrics;
pub mod rating;
pub mod store;
pub mod types;
pub mod utils;

// Re-export commonly used types and traits
pub use error::{LedgerError, Result};
pub use types::*;

// Re-export key components
pub use ledger::{ApprovalState, Ledger, RecomputationEngine};
pub use store::{InMemoryLedgerStore, LedgerStore};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
