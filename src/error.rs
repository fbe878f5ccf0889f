//! Error types for the rating ledger
//!
//! Failures are typed with `LedgerError` and carried through `anyhow::Result`
//! so callers can recover the variant with `downcast_ref`.

/// Result type alias for convenience
pub type Result<T> = anyhow::Result<T>;

/// Custom error types for ledger operations
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LedgerError {
    #[error("Validation failed: {reason}")]
    Validation { reason: String },

    #[error("User {user_id} is not a participant in match {match_id}")]
    NotAParticipant { user_id: String, match_id: String },

    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    #[error("Inconsistent rating history: {reason}")]
    InconsistentHistory { reason: String },

    #[error("Storage error: {message}")]
    Storage { message: String },

    #[error("Configuration error: {message}")]
    Configuration { message: String },
}

impl LedgerError {
    /// Short label used for metrics and log fields
    pub fn kind(&self) -> &'static str {
        match self {
            LedgerError::Validation { .. } => "validation",
            LedgerError::NotAParticipant { .. } => "not_a_participant",
            LedgerError::NotFound { .. } => "not_found",
            LedgerError::InconsistentHistory { .. } => "inconsistent_history",
            LedgerError::Storage { .. } => "storage",
            LedgerError::Configuration { .. } => "configuration",
        }
    }

    pub(crate) fn validation(reason: impl Into<String>) -> Self {
        LedgerError::Validation {
            reason: reason.into(),
        }
    }

    pub(crate) fn not_found(entity: &'static str, id: impl ToString) -> Self {
        LedgerError::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    pub(crate) fn inconsistent(reason: impl Into<String>) -> Self {
        LedgerError::InconsistentHistory {
            reason: reason.into(),
        }
    }

    pub(crate) fn lock_poisoned(what: &str) -> Self {
        LedgerError::Storage {
            message: format!("Failed to acquire {} lock", what),
        }
    }
}

/// Label an arbitrary error for metrics, falling back to "other"
pub fn error_kind(error: &anyhow::Error) -> &'static str {
    error
        .downcast_ref::<LedgerError>()
        .map(LedgerError::kind)
        .unwrap_or("other")
}
