//! Test fixtures and mock implementations for integration testing

#![allow(dead_code)]

use mockall::mock;
use skill_ledger::config::RatingConfig;
use skill_ledger::error::{LedgerError, Result};
use skill_ledger::metrics::MetricsCollector;
use skill_ledger::rating::{TeamRatingCalculator, TeamUpdate};
use skill_ledger::store::{ExclusiveGuard, InMemoryLedgerStore, LedgerStore, WriteBatch};
use skill_ledger::types::{
    Match, MatchId, NewMatch, RatingKind, RatingObservation, TrueSkillValue, User, UserId,
};
use skill_ledger::{Ledger, RecomputationEngine};
use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

mock! {
    pub TeamCalculator {}

    impl TeamRatingCalculator for TeamCalculator {
        fn update_teams(
            &self,
            winners: &[TrueSkillValue],
            losers: &[TrueSkillValue],
        ) -> Result<TeamUpdate>;
        fn initial_rating(&self) -> TrueSkillValue;
        fn config(&self) -> serde_json::Value;
    }
}

/// Store wrapper whose commits can be made to fail on demand
#[derive(Debug, Default)]
pub struct FaultyStore {
    inner: InMemoryLedgerStore,
    fail_commits: AtomicBool,
    commits: AtomicUsize,
}

impl FaultyStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_commits(&self, fail: bool) {
        self.fail_commits.store(fail, Ordering::SeqCst);
    }

    /// Number of successful commits
    pub fn commit_count(&self) -> usize {
        self.commits.load(Ordering::SeqCst)
    }
}

impl LedgerStore for FaultyStore {
    fn exclusive(&self) -> Result<ExclusiveGuard<'_>> {
        self.inner.exclusive()
    }

    fn commit(&self, batch: WriteBatch) -> Result<()> {
        if self.fail_commits.load(Ordering::SeqCst) {
            return Err(LedgerError::Storage {
                message: "injected commit failure".to_string(),
            }
            .into());
        }
        self.inner.commit(batch)?;
        self.commits.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn next_match_sequence(&self) -> Result<u64> {
        self.inner.next_match_sequence()
    }

    fn get_user(&self, user_id: &UserId) -> Result<Option<User>> {
        self.inner.get_user(user_id)
    }

    fn find_user_by_shortname(&self, shortname: &str) -> Result<Option<User>> {
        self.inner.find_user_by_shortname(shortname)
    }

    fn find_user_by_nickname(&self, nickname: &str) -> Result<Option<User>> {
        self.inner.find_user_by_nickname(nickname)
    }

    fn list_users(&self) -> Result<Vec<User>> {
        self.inner.list_users()
    }

    fn get_match(&self, match_id: &MatchId) -> Result<Option<Match>> {
        self.inner.get_match(match_id)
    }

    fn list_matches(&self) -> Result<Vec<Match>> {
        self.inner.list_matches()
    }

    fn current_value(&self, user_id: &UserId, kind: RatingKind, now: DateTime<Utc>) -> Result<f64> {
        self.inner.current_value(user_id, kind, now)
    }

    fn earliest_activity(&self, user_id: &UserId) -> Result<DateTime<Utc>> {
        self.inner.earliest_activity(user_id)
    }

    fn observations_for(&self, user_id: &UserId, kind: RatingKind) -> Result<Vec<RatingObservation>> {
        self.inner.observations_for(user_id, kind)
    }

    fn all_observations(&self) -> Result<Vec<RatingObservation>> {
        self.inner.all_observations()
    }
}

/// Ledger over a fresh in-memory store
pub fn create_test_ledger() -> Ledger {
    let store = Arc::new(InMemoryLedgerStore::new());
    Ledger::new(store, &RatingConfig::default()).expect("ledger")
}

/// Mock calculator seeded from the default rating configuration
pub fn seeded_calculator() -> MockTeamCalculator {
    let mut calculator = MockTeamCalculator::new();
    calculator
        .expect_initial_rating()
        .returning(|| RatingConfig::default().initial_trueskill());
    calculator
}

/// Ledger whose TrueSkill updates come from `calculator`
pub fn create_ledger_with_calculator(
    store: Arc<dyn LedgerStore>,
    calculator: MockTeamCalculator,
) -> Ledger {
    let engine = RecomputationEngine::with_calculator(1500.0, Arc::new(calculator));
    let metrics = Arc::new(MetricsCollector::new().expect("metrics"));
    Ledger::with_engine(store, engine, metrics)
}

/// Register users with the given shortnames (nickname = lower-case shortname)
pub fn register(ledger: &Ledger, shortnames: &[&str]) -> Vec<User> {
    shortnames
        .iter()
        .map(|name| {
            ledger
                .create_user(name, &name.to_lowercase())
                .expect("create user")
        })
        .collect()
}

pub fn match_input(winners: &[&User], losers: &[&User], importance: f64) -> NewMatch {
    NewMatch {
        winners: winners.iter().map(|user| user.id).collect(),
        losers: losers.iter().map(|user| user.id).collect(),
        winner_score: 10,
        loser_score: 6,
        importance,
        timestamp: None,
    }
}

/// Create a match recorded by the first winner, then approved by the first loser
pub fn play(ledger: &Ledger, winners: &[&User], losers: &[&User], importance: f64) -> Match {
    let game = ledger
        .create_match(match_input(winners, losers, importance), Some(winners[0].id))
        .expect("create match");
    ledger
        .approve_match(&game.id, &losers[0].id)
        .expect("approve match")
        .game
}

/// Like `play`, with an explicit match time
pub fn play_at(ledger: &Ledger, winners: &[&User], losers: &[&User], timestamp: DateTime<Utc>) -> Match {
    let mut input = match_input(winners, losers, 30.0);
    input.timestamp = Some(timestamp);
    let game = ledger
        .create_match(input, Some(winners[0].id))
        .expect("create match");
    ledger
        .approve_match(&game.id, &losers[0].id)
        .expect("approve match")
        .game
}

pub fn downcast(err: &anyhow::Error) -> &LedgerError {
    err.downcast_ref::<LedgerError>()
        .expect("error should be a LedgerError")
}
