//! Utility functions for the rating ledger

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Generate a new unique user ID
pub fn generate_user_id() -> Uuid {
    Uuid::new_v4()
}

/// Generate a new unique match ID
pub fn generate_match_id() -> Uuid {
    Uuid::new_v4()
}

/// Get the current UTC timestamp
pub fn current_timestamp() -> DateTime<Utc> {
    Utc::now()
}

/// Arithmetic mean, or None for an empty slice
pub fn average(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Trim and upper-case a shortname
pub fn normalize_shortname(shortname: &str) -> String {
    shortname.trim().to_uppercase()
}
