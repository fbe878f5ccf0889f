//! Append-only rating timeline
//!
//! Observations are kept in append order. Lookups are indexed per
//! (user, kind) so replaying a long history stays cheap.

use crate::types::{MatchId, RatingKind, RatingObservation, UserId};
use chrono::{DateTime, Utc};
use std::collections::HashMap;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RatingTimeline {
    observations: Vec<RatingObservation>,
    index: HashMap<(UserId, RatingKind), Vec<usize>>,
}

impl RatingTimeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a timeline from observations in their original append order
    pub fn from_observations(observations: Vec<RatingObservation>) -> Self {
        let mut timeline = Self::new();
        for observation in observations {
            timeline.append(observation);
        }
        timeline
    }

    pub fn append(&mut self, observation: RatingObservation) {
        let position = self.observations.len();
        self.index
            .entry((observation.user_id, observation.kind))
            .or_default()
            .push(position);
        self.observations.push(observation);
    }

    /// Most recent value at or before `now`. On equal timestamps the later append wins.
    pub fn current_value(&self, user_id: &UserId, kind: RatingKind, now: DateTime<Utc>) -> Option<f64> {
        self.positions(user_id, kind)
            .iter()
            .copied()
            .filter(|&i| self.observations[i].timestamp <= now)
            .max_by_key(|&i| (self.observations[i].timestamp, i))
            .map(|i| self.observations[i].value)
    }

    /// Newest value regardless of the clock. On equal timestamps the later append wins.
    pub fn latest_value(&self, user_id: &UserId, kind: RatingKind) -> Option<f64> {
        self.positions(user_id, kind)
            .iter()
            .copied()
            .max_by_key(|&i| (self.observations[i].timestamp, i))
            .map(|i| self.observations[i].value)
    }

    /// Timestamp of the earliest observation of `kind` for the user
    pub fn earliest_timestamp(&self, user_id: &UserId, kind: RatingKind) -> Option<DateTime<Utc>> {
        self.positions(user_id, kind)
            .iter()
            .map(|&i| self.observations[i].timestamp)
            .min()
    }

    /// Observations of one kind for a user, ordered by timestamp then append order
    pub fn history(&self, user_id: &UserId, kind: RatingKind) -> Vec<RatingObservation> {
        let mut history: Vec<RatingObservation> = self
            .positions(user_id, kind)
            .iter()
            .map(|&i| self.observations[i].clone())
            .collect();
        history.sort_by_key(|observation| observation.timestamp);
        history
    }

    /// Number of observations attributed to a match
    pub fn count_for_match(&self, match_id: &MatchId) -> usize {
        self.observations
            .iter()
            .filter(|observation| observation.source_match.as_ref() == Some(match_id))
            .count()
    }

    pub fn observations(&self) -> &[RatingObservation] {
        &self.observations
    }

    pub fn into_observations(self) -> Vec<RatingObservation> {
        self.observations
    }

    pub fn len(&self) -> usize {
        self.observations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }

    fn positions(&self, user_id: &UserId, kind: RatingKind) -> &[usize] {
        self.index
            .get(&(*user_id, kind))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}
