//! In-memory ledger store
//!
//! All state sits behind one `RwLock`, so a committed batch becomes visible
//! to readers all at once. A separate mutex serialises writers.

use crate::error::{LedgerError, Result};
use crate::rating::RatingTimeline;
use crate::store::snapshot::LedgerSnapshot;
use crate::store::{ExclusiveGuard, LedgerStore, WriteBatch};
use crate::types::{Match, MatchId, RatingKind, RatingObservation, User, UserId};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{Mutex, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::debug;

#[derive(Debug, Default)]
struct LedgerState {
    users: HashMap<UserId, User>,
    user_order: Vec<UserId>,
    matches: HashMap<MatchId, Match>,
    timeline: RatingTimeline,
    next_sequence: u64,
}

impl LedgerState {
    fn upsert_user(&mut self, user: User) {
        if !self.users.contains_key(&user.id) {
            self.user_order.push(user.id);
        }
        self.users.insert(user.id, user);
    }

    fn upsert_match(&mut self, game: Match) {
        if game.sequence >= self.next_sequence {
            self.next_sequence = game.sequence + 1;
        }
        self.matches.insert(game.id, game);
    }
}

/// In-memory ledger storage implementation
#[derive(Debug, Default)]
pub struct InMemoryLedgerStore {
    state: RwLock<LedgerState>,
    writer: Mutex<()>,
}

impl InMemoryLedgerStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Restore a store from a snapshot
    pub fn from_snapshot(snapshot: LedgerSnapshot) -> Self {
        let mut state = LedgerState {
            next_sequence: snapshot.next_sequence,
            ..LedgerState::default()
        };
        for user in snapshot.users {
            state.upsert_user(user);
        }
        for game in snapshot.matches {
            state.upsert_match(game);
        }
        state.timeline = RatingTimeline::from_observations(snapshot.observations);

        Self {
            state: RwLock::new(state),
            writer: Mutex::new(()),
        }
    }

    /// Capture the full store contents
    pub fn to_snapshot(&self) -> Result<LedgerSnapshot> {
        let state = self.read()?;

        let users = state
            .user_order
            .iter()
            .filter_map(|id| state.users.get(id).cloned())
            .collect();
        let mut matches: Vec<Match> = state.matches.values().cloned().collect();
        matches.sort_by_key(|game| game.sequence);

        Ok(LedgerSnapshot {
            users,
            matches,
            observations: state.timeline.observations().to_vec(),
            next_sequence: state.next_sequence,
        })
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, LedgerState>> {
        self.state
            .read()
            .map_err(|_| LedgerError::lock_poisoned("ledger read").into())
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, LedgerState>> {
        self.state
            .write()
            .map_err(|_| LedgerError::lock_poisoned("ledger write").into())
    }
}

impl LedgerStore for InMemoryLedgerStore {
    fn exclusive(&self) -> Result<ExclusiveGuard<'_>> {
        let guard = self
            .writer
            .lock()
            .map_err(|_| LedgerError::lock_poisoned("ledger writer"))?;
        Ok(ExclusiveGuard::new(guard))
    }

    fn commit(&self, batch: WriteBatch) -> Result<()> {
        if batch.is_empty() {
            return Ok(());
        }

        let mut state = self.write()?;
        debug!(
            "Committing batch: {} users, {} matches, {} removals, timeline replaced: {}, {} appends",
            batch.users.len(),
            batch.matches.len(),
            batch.removed_matches.len(),
            batch.timeline.is_some(),
            batch.observations.len()
        );

        for user in batch.users {
            state.upsert_user(user);
        }
        for game in batch.matches {
            state.upsert_match(game);
        }
        for match_id in &batch.removed_matches {
            state.matches.remove(match_id);
        }
        if let Some(timeline) = batch.timeline {
            state.timeline = timeline;
        }
        for observation in batch.observations {
            state.timeline.append(observation);
        }

        Ok(())
    }

    fn next_match_sequence(&self) -> Result<u64> {
        let mut state = self.write()?;
        let sequence = state.next_sequence;
        state.next_sequence += 1;
        Ok(sequence)
    }

    fn get_user(&self, user_id: &UserId) -> Result<Option<User>> {
        Ok(self.read()?.users.get(user_id).cloned())
    }

    fn find_user_by_shortname(&self, shortname: &str) -> Result<Option<User>> {
        Ok(self
            .read()?
            .users
            .values()
            .find(|user| user.shortname == shortname)
            .cloned())
    }

    fn find_user_by_nickname(&self, nickname: &str) -> Result<Option<User>> {
        Ok(self
            .read()?
            .users
            .values()
            .find(|user| user.nickname == nickname)
            .cloned())
    }

    fn list_users(&self) -> Result<Vec<User>> {
        let state = self.read()?;
        Ok(state
            .user_order
            .iter()
            .filter_map(|id| state.users.get(id).cloned())
            .collect())
    }

    fn get_match(&self, match_id: &MatchId) -> Result<Option<Match>> {
        Ok(self.read()?.matches.get(match_id).cloned())
    }

    fn list_matches(&self) -> Result<Vec<Match>> {
        let mut matches: Vec<Match> = self.read()?.matches.values().cloned().collect();
        matches.sort_by_key(|game| game.sequence);
        Ok(matches)
    }

    fn current_value(&self, user_id: &UserId, kind: RatingKind, now: DateTime<Utc>) -> Result<f64> {
        self.read()?
            .timeline
            .current_value(user_id, kind, now)
            .ok_or_else(|| LedgerError::not_found("Rating", format!("{} for user {}", kind, user_id)).into())
    }

    fn earliest_activity(&self, user_id: &UserId) -> Result<DateTime<Utc>> {
        let state = self.read()?;
        let user = state
            .users
            .get(user_id)
            .ok_or_else(|| LedgerError::not_found("User", user_id))?;

        Ok(state
            .timeline
            .earliest_timestamp(user_id, RatingKind::Elo)
            .unwrap_or(user.created_at))
    }

    fn observations_for(&self, user_id: &UserId, kind: RatingKind) -> Result<Vec<RatingObservation>> {
        Ok(self.read()?.timeline.history(user_id, kind))
    }

    fn all_observations(&self) -> Result<Vec<RatingObservation>> {
        Ok(self.read()?.timeline.observations().to_vec())
    }
}
