//! Rating system configuration

use crate::error::LedgerError;
use crate::types::TrueSkillValue;
use serde::{Deserialize, Serialize};

/// Seed values and TrueSkill parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RatingConfig {
    pub seed_elo: f64,
    pub seed_trueskill_mean: f64,
    pub seed_trueskill_deviation: f64,
    /// Performance variance (TrueSkill beta)
    pub trueskill_beta: f64,
    /// Additive dynamics factor (TrueSkill tau)
    pub trueskill_dynamics: f64,
    pub trueskill_draw_probability: f64,
}

impl Default for RatingConfig {
    fn default() -> Self {
        Self {
            seed_elo: 1500.0,
            seed_trueskill_mean: 25.0,
            seed_trueskill_deviation: 8.333,
            trueskill_beta: 25.0 / 6.0,
            trueskill_dynamics: 25.0 / 300.0,
            trueskill_draw_probability: 0.1,
        }
    }
}

impl RatingConfig {
    /// TrueSkill rating given to a user before their first match
    pub fn initial_trueskill(&self) -> TrueSkillValue {
        TrueSkillValue {
            mean: self.seed_trueskill_mean,
            deviation: self.seed_trueskill_deviation,
        }
    }

    /// Validate configuration parameters
    pub fn validate(&self) -> crate::error::Result<()> {
        let finite = [
            self.seed_elo,
            self.seed_trueskill_mean,
            self.seed_trueskill_deviation,
            self.trueskill_beta,
            self.trueskill_dynamics,
            self.trueskill_draw_probability,
        ];
        if finite.iter().any(|value| !value.is_finite()) {
            return Err(LedgerError::Configuration {
                message: "Rating parameters must be finite".to_string(),
            }
            .into());
        }

        if self.seed_trueskill_deviation <= 0.0 {
            return Err(LedgerError::Configuration {
                message: "Seed TrueSkill deviation must be positive".to_string(),
            }
            .into());
        }

        if self.trueskill_beta <= 0.0 {
            return Err(LedgerError::Configuration {
                message: "TrueSkill beta must be positive".to_string(),
            }
            .into());
        }

        if self.trueskill_dynamics < 0.0 {
            return Err(LedgerError::Configuration {
                message: "TrueSkill dynamics must be non-negative".to_string(),
            }
            .into());
        }

        if !(0.0..1.0).contains(&self.trueskill_draw_probability) {
            return Err(LedgerError::Configuration {
                message: "TrueSkill draw probability must be in [0, 1)".to_string(),
            }
            .into());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        let config = RatingConfig::default();
        assert_eq!(config.seed_elo, 1500.0);
        assert_eq!(config.seed_trueskill_mean, 25.0);
        assert_eq!(config.seed_trueskill_deviation, 8.333);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_initial_trueskill_follows_seeds() {
        let config = RatingConfig {
            seed_trueskill_mean: 30.0,
            seed_trueskill_deviation: 5.0,
            ..RatingConfig::default()
        };
        let initial = config.initial_trueskill();
        assert_eq!(initial.mean, 30.0);
        assert_eq!(initial.deviation, 5.0);

        assert_eq!(TrueSkillValue::default(), RatingConfig::default().initial_trueskill());
    }

    #[test]
    fn test_validation() {
        let mut config = RatingConfig::default();
        config.seed_trueskill_deviation = 0.0;
        assert!(config.validate().is_err());

        config = RatingConfig::default();
        config.trueskill_draw_probability = 1.0;
        assert!(config.validate().is_err());

        config = RatingConfig::default();
        config.seed_elo = f64::NAN;
        assert!(config.validate().is_err());

        config = RatingConfig::default();
        config.trueskill_dynamics = -0.1;
        assert!(config.validate().is_err());
    }
}
