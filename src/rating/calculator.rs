//! Team rating calculator trait
//!
//! The skill-rating update for a two-team outcome sits behind this trait so
//! the replay engine does not depend on a particular rating library.

use crate::types::TrueSkillValue;
use serde::{Deserialize, Serialize};

/// Updated ratings for both teams, in the same order as the input
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamUpdate {
    pub winners: Vec<TrueSkillValue>,
    pub losers: Vec<TrueSkillValue>,
}

/// Trait for updating the ratings of two teams after one beats the other
pub trait TeamRatingCalculator: Send + Sync {
    /// Jointly update both teams' ratings for a decided (non-draw) match
    ///
    /// # Arguments
    /// * `winners` - Current ratings of the winning team, in membership order
    /// * `losers` - Current ratings of the losing team, in membership order
    ///
    /// # Returns
    /// New ratings with the same cardinality and order as the inputs
    fn update_teams(
        &self,
        winners: &[TrueSkillValue],
        losers: &[TrueSkillValue],
    ) -> crate::error::Result<TeamUpdate>;

    /// Rating assigned to a user before their first match
    fn initial_rating(&self) -> TrueSkillValue;

    /// Get current configuration as JSON
    fn config(&self) -> serde_json::Value;
}
