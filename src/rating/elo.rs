//! Team Elo delta calculation
//!
//! Teams are compared by the average Elo of their members. The resulting
//! delta is applied uniformly: added to every winner, subtracted from every loser.

use crate::error::{LedgerError, Result};
use crate::utils::average;
use skillratings::elo::{expected_score, EloRating};

/// Elo change for the winning side given both team averages.
///
/// `importance` acts as the K-factor and must be positive; match creation
/// validates it before any replay reaches this point.
pub fn elo_delta(winner_avg: f64, loser_avg: f64, importance: f64) -> f64 {
    let (expected_win, _expected_loss) = expected_score(
        &EloRating { rating: winner_avg },
        &EloRating { rating: loser_avg },
    );
    importance * (1.0 - expected_win)
}

/// Elo change for a match given the current ratings of both teams
pub fn team_elo_delta(winner_elos: &[f64], loser_elos: &[f64], importance: f64) -> Result<f64> {
    let winner_avg = average(winner_elos)
        .ok_or_else(|| LedgerError::inconsistent("Winning team has no members"))?;
    let loser_avg = average(loser_elos)
        .ok_or_else(|| LedgerError::inconsistent("Losing team has no members"))?;

    Ok(elo_delta(winner_avg, loser_avg, importance))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_equal_teams_split_importance() {
        assert_eq!(elo_delta(1500.0, 1500.0, 30.0), 15.0);
        assert_eq!(elo_delta(1234.5, 1234.5, 8.0), 4.0);
    }

    #[test]
    fn test_upset_pays_more_than_expected_win() {
        let favourite_wins = elo_delta(1700.0, 1500.0, 32.0);
        let underdog_wins = elo_delta(1500.0, 1700.0, 32.0);
        assert!(underdog_wins > 16.0);
        assert!(favourite_wins < 16.0);
        // Expected scores of both sides sum to one
        assert!((favourite_wins + underdog_wins - 32.0).abs() < 1e-9);
    }

    #[test]
    fn test_matches_closed_form() {
        let (w, l, k) = (1620.0_f64, 1480.0_f64, 24.0_f64);
        let q_w = 10f64.powf(w / 400.0);
        let q_l = 10f64.powf(l / 400.0);
        let expected = k * (1.0 - q_w / (q_w + q_l));
        assert!((elo_delta(w, l, k) - expected).abs() < 1e-9);
    }

    #[test]
    fn test_team_delta_uses_averages() {
        let delta = team_elo_delta(&[1400.0, 1600.0], &[1500.0], 30.0).unwrap();
        assert_eq!(delta, 15.0);
    }

    #[test]
    fn test_team_delta_rejects_empty_team() {
        let err = team_elo_delta(&[], &[1500.0], 30.0).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<LedgerError>(),
            Some(LedgerError::InconsistentHistory { .. })
        ));
    }

    proptest! {
        #[test]
        fn prop_symmetric_teams_give_half_importance(
            avg in 0.0f64..3000.0,
            importance in 0.1f64..200.0,
        ) {
            let delta = elo_delta(avg, avg, importance);
            prop_assert!((delta - importance / 2.0).abs() < 1e-9);
        }

        #[test]
        fn prop_increasing_in_importance(
            winner in 500.0f64..2500.0,
            loser in 500.0f64..2500.0,
            importance in 0.1f64..100.0,
            extra in 0.1f64..100.0,
        ) {
            prop_assert!(elo_delta(winner, loser, importance + extra) > elo_delta(winner, loser, importance));
        }

        #[test]
        fn prop_increasing_in_underdog_gap(
            winner in 500.0f64..2500.0,
            loser in 500.0f64..2500.0,
            importance in 1.0f64..100.0,
            step in 1.0f64..200.0,
        ) {
            // A weaker winner (larger loser - winner gap) earns a larger delta
            prop_assert!(elo_delta(winner - step, loser, importance) > elo_delta(winner, loser, importance));
        }

        #[test]
        fn prop_delta_bounded_by_importance(
            winner in 0.0f64..3000.0,
            loser in 0.0f64..3000.0,
            importance in 0.1f64..100.0,
        ) {
            let delta = elo_delta(winner, loser, importance);
            prop_assert!(delta > 0.0);
            prop_assert!(delta < importance);
        }
    }
}
