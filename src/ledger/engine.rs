//! Full-history rating recomputation
//!
//! The engine never mutates the store. It folds the ordered list of eligible
//! matches over a freshly seeded timeline and hands the result back to the
//! caller, which swaps it in with a single commit.

use crate::config::RatingConfig;
use crate::error::{LedgerError, Result};
use crate::rating::{team_elo_delta, RatingTimeline, TeamRatingCalculator, TrueSkillCalculator};
use crate::store::LedgerStore;
use crate::types::{Match, RatingKind, RatingObservation, TrueSkillValue, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info};

/// Point in time from which a user's history is rebuilt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeedAnchor {
    pub user_id: UserId,
    pub timestamp: DateTime<Utc>,
}

/// Summary of one recomputation pass
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplayReport {
    pub users_seeded: usize,
    pub matches_replayed: usize,
    pub observations: usize,
}

/// Rebuilds rating timelines from match history
pub struct RecomputationEngine {
    seed_elo: f64,
    trueskill: Arc<dyn TeamRatingCalculator>,
}

impl RecomputationEngine {
    /// Create an engine using the TrueSkill calculator from configuration
    pub fn new(config: &RatingConfig) -> Result<Self> {
        let calculator = TrueSkillCalculator::new(config)?;
        Ok(Self::with_calculator(config.seed_elo, Arc::new(calculator)))
    }

    /// Create an engine with a custom team rating calculator
    pub fn with_calculator(seed_elo: f64, trueskill: Arc<dyn TeamRatingCalculator>) -> Self {
        Self {
            seed_elo,
            trueskill,
        }
    }

    /// The three seed observations for a user
    pub fn seed_observations(
        &self,
        user_id: UserId,
        timestamp: DateTime<Utc>,
    ) -> [RatingObservation; 3] {
        let initial = self.trueskill.initial_rating();
        let seed = |kind, value| RatingObservation {
            user_id,
            kind,
            value,
            timestamp,
            source_match: None,
        };
        [
            seed(RatingKind::Elo, self.seed_elo),
            seed(RatingKind::TrueskillMean, initial.mean),
            seed(RatingKind::TrueskillDeviation, initial.deviation),
        ]
    }

    /// Capture every user's earliest activity before the timeline is replaced
    pub fn capture_anchors(store: &dyn LedgerStore) -> Result<Vec<SeedAnchor>> {
        let mut anchors = Vec::new();
        for user in store.list_users()? {
            anchors.push(SeedAnchor {
                user_id: user.id,
                timestamp: store.earliest_activity(&user.id)?,
            });
        }
        Ok(anchors)
    }

    /// Build a new timeline for `matches` as they would stand in the store.
    /// Reads anchors from the store; writes nothing.
    pub fn rebuild(
        &self,
        store: &dyn LedgerStore,
        matches: &[Match],
    ) -> Result<(RatingTimeline, ReplayReport)> {
        let anchors = Self::capture_anchors(store)?;
        self.replay(&anchors, matches)
    }

    /// Seed every anchored user, then fold each eligible match into the timeline.
    /// Each match reads the newest values of the timeline being built, whatever
    /// the wall clock says.
    pub fn replay(
        &self,
        anchors: &[SeedAnchor],
        matches: &[Match],
    ) -> Result<(RatingTimeline, ReplayReport)> {
        let mut timeline = RatingTimeline::new();
        for anchor in anchors {
            for observation in self.seed_observations(anchor.user_id, anchor.timestamp) {
                timeline.append(observation);
            }
        }

        let ordered = Match::in_replay_order(matches);
        for game in &ordered {
            self.apply_match(&mut timeline, game)?;
        }

        let report = ReplayReport {
            users_seeded: anchors.len(),
            matches_replayed: ordered.len(),
            observations: timeline.len(),
        };
        info!(
            "Replayed {} matches for {} users ({} observations)",
            report.matches_replayed, report.users_seeded, report.observations
        );
        Ok((timeline, report))
    }

    fn apply_match(&self, timeline: &mut RatingTimeline, game: &Match) -> Result<()> {
        let winner_elos = latest_values(timeline, &game.winners, RatingKind::Elo)?;
        let loser_elos = latest_values(timeline, &game.losers, RatingKind::Elo)?;
        let winner_skills = latest_skills(timeline, &game.winners)?;
        let loser_skills = latest_skills(timeline, &game.losers)?;

        let delta = team_elo_delta(&winner_elos, &loser_elos, game.importance)?;
        let update = self.trueskill.update_teams(&winner_skills, &loser_skills)?;

        if update.winners.len() != game.winners.len() || update.losers.len() != game.losers.len() {
            return Err(LedgerError::inconsistent(format!(
                "Team rating update for match {} returned {}v{} ratings for a {}v{} match",
                game.id,
                update.winners.len(),
                update.losers.len(),
                game.winners.len(),
                game.losers.len()
            ))
            .into());
        }

        debug!("Match {}: elo delta {:.3}", game.id, delta);

        let observe = |user_id: UserId, kind, value| RatingObservation {
            user_id,
            kind,
            value,
            timestamp: game.timestamp,
            source_match: Some(game.id),
        };

        let skills = game
            .winners
            .iter()
            .zip(&update.winners)
            .chain(game.losers.iter().zip(&update.losers));
        for (&user_id, skill) in skills {
            timeline.append(observe(user_id, RatingKind::TrueskillMean, skill.mean));
            timeline.append(observe(user_id, RatingKind::TrueskillDeviation, skill.deviation));
        }

        for (&user_id, elo) in game.winners.iter().zip(&winner_elos) {
            timeline.append(observe(user_id, RatingKind::Elo, elo + delta));
        }
        for (&user_id, elo) in game.losers.iter().zip(&loser_elos) {
            timeline.append(observe(user_id, RatingKind::Elo, elo - delta));
        }

        Ok(())
    }
}

fn latest_values(timeline: &RatingTimeline, users: &[UserId], kind: RatingKind) -> Result<Vec<f64>> {
    users
        .iter()
        .map(|user_id| {
            timeline.latest_value(user_id, kind).ok_or_else(|| {
                anyhow::Error::from(LedgerError::inconsistent(format!(
                    "User {} has no {} observation",
                    user_id, kind
                )))
            })
        })
        .collect()
}

fn latest_skills(timeline: &RatingTimeline, users: &[UserId]) -> Result<Vec<TrueSkillValue>> {
    let means = latest_values(timeline, users, RatingKind::TrueskillMean)?;
    let deviations = latest_values(timeline, users, RatingKind::TrueskillDeviation)?;
    Ok(means
        .into_iter()
        .zip(deviations)
        .map(|(mean, deviation)| TrueSkillValue { mean, deviation })
        .collect())
}
