//! TrueSkill rating system implementation
//!
//! This module provides a concrete implementation of the team rating calculator
//! using the two-team TrueSkill update from the skillratings crate.

use crate::config::RatingConfig;
use crate::error::LedgerError;
use crate::rating::calculator::{TeamRatingCalculator, TeamUpdate};
use crate::types::TrueSkillValue;
use skillratings::trueskill::{trueskill_two_teams, TrueSkillConfig, TrueSkillRating};
use skillratings::Outcomes;

/// TrueSkill calculator for two-team matches
#[derive(Debug)]
pub struct TrueSkillCalculator {
    config: TrueSkillConfig,
    initial_rating: TrueSkillValue,
}

impl TrueSkillCalculator {
    /// Create a calculator from the rating configuration
    pub fn new(config: &RatingConfig) -> crate::error::Result<Self> {
        config.validate()?;
        Ok(Self::from_config(config))
    }

    fn from_config(config: &RatingConfig) -> Self {
        Self {
            config: TrueSkillConfig {
                draw_probability: config.trueskill_draw_probability,
                beta: config.trueskill_beta,
                default_dynamics: config.trueskill_dynamics,
            },
            initial_rating: config.initial_trueskill(),
        }
    }
}

impl Default for TrueSkillCalculator {
    fn default() -> Self {
        Self::from_config(&RatingConfig::default())
    }
}

impl TeamRatingCalculator for TrueSkillCalculator {
    fn update_teams(
        &self,
        winners: &[TrueSkillValue],
        losers: &[TrueSkillValue],
    ) -> crate::error::Result<TeamUpdate> {
        if winners.is_empty() || losers.is_empty() {
            return Err(LedgerError::inconsistent(
                "TrueSkill update requires two non-empty teams",
            )
            .into());
        }

        let team_one: Vec<TrueSkillRating> = winners.iter().map(|&v| v.into()).collect();
        let team_two: Vec<TrueSkillRating> = losers.iter().map(|&v| v.into()).collect();

        let (new_winners, new_losers) =
            trueskill_two_teams(&team_one, &team_two, &Outcomes::WIN, &self.config);

        Ok(TeamUpdate {
            winners: new_winners.into_iter().map(TrueSkillValue::from).collect(),
            losers: new_losers.into_iter().map(TrueSkillValue::from).collect(),
        })
    }

    fn initial_rating(&self) -> TrueSkillValue {
        self.initial_rating
    }

    fn config(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "trueskill",
            "draw_probability": self.config.draw_probability,
            "beta": self.config.beta,
            "default_dynamics": self.config.default_dynamics,
            "initial_mean": self.initial_rating.mean,
            "initial_deviation": self.initial_rating.deviation,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seed() -> TrueSkillValue {
        TrueSkillValue::default()
    }

    #[test]
    fn test_calculator_creation() {
        let calculator = TrueSkillCalculator::new(&RatingConfig::default()).unwrap();
        assert_eq!(calculator.initial_rating().mean, 25.0);
        assert_eq!(calculator.initial_rating().deviation, 8.333);
        assert_eq!(calculator.config()["type"], "trueskill");
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = RatingConfig {
            trueskill_beta: 0.0,
            ..RatingConfig::default()
        };
        assert!(TrueSkillCalculator::new(&config).is_err());
    }

    #[test]
    fn test_one_versus_one() {
        let calculator = TrueSkillCalculator::default();
        let update = calculator.update_teams(&[seed()], &[seed()]).unwrap();

        assert_eq!(update.winners.len(), 1);
        assert_eq!(update.losers.len(), 1);

        let winner = update.winners[0];
        let loser = update.losers[0];
        assert!(winner.mean > 25.0);
        assert!(loser.mean < 25.0);
        // Symmetric start: gains mirror losses
        assert!(((winner.mean - 25.0) - (25.0 - loser.mean)).abs() < 1e-9);
        assert!(winner.deviation < 8.333);
        assert!(loser.deviation < 8.333);
    }

    #[test]
    fn test_cardinality_and_order_preserved() {
        let calculator = TrueSkillCalculator::default();
        let strong = TrueSkillValue {
            mean: 35.0,
            deviation: 2.0,
        };
        let weak = TrueSkillValue {
            mean: 15.0,
            deviation: 8.0,
        };

        let update = calculator
            .update_teams(&[strong, weak], &[seed(), seed(), seed()])
            .unwrap();

        assert_eq!(update.winners.len(), 2);
        assert_eq!(update.losers.len(), 3);
        // The uncertain player moves further than the established one
        assert!(update.winners[1].mean - weak.mean > update.winners[0].mean - strong.mean);
        assert!(update.winners[0].mean > update.winners[1].mean);
    }

    #[test]
    fn test_deterministic() {
        let calculator = TrueSkillCalculator::default();
        let a = calculator.update_teams(&[seed(), seed()], &[seed()]).unwrap();
        let b = calculator.update_teams(&[seed(), seed()], &[seed()]).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_empty_team_rejected() {
        let calculator = TrueSkillCalculator::default();
        assert!(calculator.update_teams(&[], &[seed()]).is_err());
    }
}
