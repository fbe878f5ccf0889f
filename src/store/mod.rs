//! Ledger storage interface
//!
//! This module defines the repository the ledger and recomputation engine
//! work against: users, matches and the rating timeline. Writes go through
//! `WriteBatch` so a whole recomputation lands as one atomic unit.

pub mod memory;
pub mod snapshot;

pub use memory::InMemoryLedgerStore;
pub use snapshot::{load_snapshot, save_snapshot, LedgerSnapshot};

use crate::error::Result;
use crate::rating::RatingTimeline;
use crate::types::{Match, MatchId, RatingKind, RatingObservation, User, UserId};
use chrono::{DateTime, Utc};
use std::sync::MutexGuard;

/// Held for the duration of a read-replay-commit sequence.
/// While alive, no other writer can start.
pub struct ExclusiveGuard<'a> {
    _guard: MutexGuard<'a, ()>,
}

impl<'a> ExclusiveGuard<'a> {
    pub fn new(guard: MutexGuard<'a, ()>) -> Self {
        Self { _guard: guard }
    }
}

/// Set of changes applied atomically by `LedgerStore::commit`
///
/// Application order: user upserts, match upserts, match removals,
/// timeline replacement, observation appends.
#[derive(Debug, Clone, Default)]
pub struct WriteBatch {
    pub users: Vec<User>,
    pub matches: Vec<Match>,
    pub removed_matches: Vec<MatchId>,
    pub timeline: Option<RatingTimeline>,
    pub observations: Vec<RatingObservation>,
}

impl WriteBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn upsert_user(mut self, user: User) -> Self {
        self.users.push(user);
        self
    }

    pub fn upsert_match(mut self, game: Match) -> Self {
        self.matches.push(game);
        self
    }

    pub fn remove_match(mut self, match_id: MatchId) -> Self {
        self.removed_matches.push(match_id);
        self
    }

    /// Replace every stored observation with the given timeline
    pub fn replace_timeline(mut self, timeline: RatingTimeline) -> Self {
        self.timeline = Some(timeline);
        self
    }

    pub fn append_observation(mut self, observation: RatingObservation) -> Self {
        self.observations.push(observation);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
            && self.matches.is_empty()
            && self.removed_matches.is_empty()
            && self.timeline.is_none()
            && self.observations.is_empty()
    }
}

/// Trait for ledger storage operations
pub trait LedgerStore: Send + Sync {
    /// Serialise writers. Every mutating ledger operation holds this guard
    /// from its first read until its commit.
    fn exclusive(&self) -> Result<ExclusiveGuard<'_>>;

    /// Apply a batch of changes as a single atomic unit
    fn commit(&self, batch: WriteBatch) -> Result<()>;

    /// Reserve the next match insertion sequence number
    fn next_match_sequence(&self) -> Result<u64>;

    /// Get a user by id
    fn get_user(&self, user_id: &UserId) -> Result<Option<User>>;

    /// Find a user by (upper-case) shortname
    fn find_user_by_shortname(&self, shortname: &str) -> Result<Option<User>>;

    /// Find a user by nickname
    fn find_user_by_nickname(&self, nickname: &str) -> Result<Option<User>>;

    /// All users in creation order
    fn list_users(&self) -> Result<Vec<User>>;

    /// Get a match by id
    fn get_match(&self, match_id: &MatchId) -> Result<Option<Match>>;

    /// All matches in insertion order
    fn list_matches(&self) -> Result<Vec<Match>>;

    /// Most recent observation value at or before `now`
    fn current_value(&self, user_id: &UserId, kind: RatingKind, now: DateTime<Utc>) -> Result<f64>;

    /// Timestamp of the user's first elo observation, or account creation if none
    fn earliest_activity(&self, user_id: &UserId) -> Result<DateTime<Utc>>;

    /// Observations of one kind for a user in timeline order
    fn observations_for(&self, user_id: &UserId, kind: RatingKind) -> Result<Vec<RatingObservation>>;

    /// Every observation in append order
    fn all_observations(&self) -> Result<Vec<RatingObservation>>;

    /// Append a single observation
    fn append_observation(&self, observation: RatingObservation) -> Result<()> {
        self.commit(WriteBatch::new().append_observation(observation))
    }

    /// Remove every rating observation
    fn delete_all_observations(&self) -> Result<()> {
        self.commit(WriteBatch::new().replace_timeline(RatingTimeline::new()))
    }

    /// Fully approved matches ordered by timestamp, ties by insertion order
    fn eligible_matches(&self) -> Result<Vec<Match>> {
        let matches = self.list_matches()?;
        Ok(Match::in_replay_order(&matches).into_iter().cloned().collect())
    }

    /// Matches the user played in, in insertion order
    fn matches_for_user(&self, user_id: &UserId) -> Result<Vec<Match>> {
        Ok(self
            .list_matches()?
            .into_iter()
            .filter(|game| game.is_participant(user_id))
            .collect())
    }
}
