//! Ledger service: the caller-facing API over a store
//!
//! Every mutating operation holds the store's exclusive guard from its first
//! read until its final commit. When an operation changes which matches are
//! eligible, the new match state and the rebuilt timeline are committed in one
//! batch, so a failed replay leaves the store exactly as it was.

use crate::config::RatingConfig;
use crate::error::{error_kind, LedgerError, Result};
use crate::ledger::approval::{ApprovalState, ApprovalTransition};
use crate::ledger::engine::{RecomputationEngine, ReplayReport};
use crate::metrics::MetricsCollector;
use crate::store::{LedgerStore, WriteBatch};
use crate::types::{
    LeaderboardEntry, Match, MatchId, NewMatch, RatingKind, RatingObservation, TrueSkillValue,
    User, UserId,
};
use crate::utils::{current_timestamp, generate_match_id, generate_user_id, normalize_shortname};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// What caused a recomputation pass
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RecomputeTrigger {
    Manual,
    MatchCreated,
    MatchApproved,
    MatchDeleted,
}

impl RecomputeTrigger {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecomputeTrigger::Manual => "manual",
            RecomputeTrigger::MatchCreated => "match_created",
            RecomputeTrigger::MatchApproved => "match_approved",
            RecomputeTrigger::MatchDeleted => "match_deleted",
        }
    }
}

/// Result of an approval request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApprovalOutcome {
    pub game: Match,
    pub transition: ApprovalTransition,
    /// Present when the approval completed the match and ratings were rebuilt
    pub replay: Option<ReplayReport>,
}

/// The rating ledger
pub struct Ledger {
    store: Arc<dyn LedgerStore>,
    engine: RecomputationEngine,
    metrics: Arc<MetricsCollector>,
}

impl Ledger {
    /// Create a ledger with the default TrueSkill calculator
    pub fn new(store: Arc<dyn LedgerStore>, config: &RatingConfig) -> Result<Self> {
        let engine = RecomputationEngine::new(config)?;
        let metrics = Arc::new(MetricsCollector::new()?);
        Ok(Self::with_engine(store, engine, metrics))
    }

    /// Create a ledger from explicit components
    pub fn with_engine(
        store: Arc<dyn LedgerStore>,
        engine: RecomputationEngine,
        metrics: Arc<MetricsCollector>,
    ) -> Self {
        Self {
            store,
            engine,
            metrics,
        }
    }

    pub fn store(&self) -> Arc<dyn LedgerStore> {
        self.store.clone()
    }

    pub fn metrics(&self) -> Arc<MetricsCollector> {
        self.metrics.clone()
    }

    /// Register a user and write their seed ratings
    pub fn create_user(&self, shortname: &str, nickname: &str) -> Result<User> {
        let result = self.create_user_inner(shortname, nickname);
        self.track("create_user", result)
    }

    /// Change a user's shortname and nickname
    pub fn update_user(&self, user_id: &UserId, shortname: &str, nickname: &str) -> Result<User> {
        let result = self.update_user_inner(user_id, shortname, nickname);
        self.track("update_user", result)
    }

    /// Record a match. A creator who played in it approves for their team.
    pub fn create_match(&self, new_match: NewMatch, creator: Option<UserId>) -> Result<Match> {
        let result = self.create_match_inner(new_match, creator);
        self.track("create_match", result)
    }

    /// Approve a match on behalf of the approver's team
    pub fn approve_match(&self, match_id: &MatchId, approver: &UserId) -> Result<ApprovalOutcome> {
        let result = self.approve_match_inner(match_id, approver);
        self.track("approve_match", result)
    }

    /// Remove a match and rebuild every rating without it
    pub fn delete_match(&self, match_id: &MatchId) -> Result<ReplayReport> {
        let result = self.delete_match_inner(match_id);
        self.track("delete_match", result)
    }

    /// Rebuild the full rating timeline from match history
    pub fn recompute_all(&self) -> Result<ReplayReport> {
        let result = self.recompute_all_inner();
        self.track("recompute_all", result)
    }

    pub fn current_elo(&self, user_id: &UserId) -> Result<f64> {
        self.require_user(user_id)?;
        self.store
            .current_value(user_id, RatingKind::Elo, current_timestamp())
    }

    pub fn current_trueskill(&self, user_id: &UserId) -> Result<TrueSkillValue> {
        self.require_user(user_id)?;
        let now = current_timestamp();
        Ok(TrueSkillValue {
            mean: self
                .store
                .current_value(user_id, RatingKind::TrueskillMean, now)?,
            deviation: self
                .store
                .current_value(user_id, RatingKind::TrueskillDeviation, now)?,
        })
    }

    /// Every user with current ratings, highest elo first
    pub fn leaderboard(&self) -> Result<Vec<LeaderboardEntry>> {
        let mut entries = Vec::new();
        for user in self.store.list_users()? {
            let elo = self.current_elo(&user.id)?;
            let trueskill = self.current_trueskill(&user.id)?;
            entries.push(LeaderboardEntry {
                user,
                elo,
                trueskill,
            });
        }

        entries.sort_by(|a, b| {
            b.elo
                .partial_cmp(&a.elo)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.user.shortname.cmp(&b.user.shortname))
        });
        Ok(entries)
    }

    /// A user's observations of one kind, oldest first
    pub fn rating_history(&self, user_id: &UserId, kind: RatingKind) -> Result<Vec<RatingObservation>> {
        self.require_user(user_id)?;
        self.store.observations_for(user_id, kind)
    }

    pub fn match_details(&self, match_id: &MatchId) -> Result<Match> {
        self.require_match(match_id)
    }

    pub fn matches_for_user(&self, user_id: &UserId) -> Result<Vec<Match>> {
        self.require_user(user_id)?;
        self.store.matches_for_user(user_id)
    }

    /// Matches still waiting for the user's team to approve
    pub fn pending_approvals(&self, user_id: &UserId) -> Result<Vec<Match>> {
        self.require_user(user_id)?;
        Ok(self
            .store
            .matches_for_user(user_id)?
            .into_iter()
            .filter(|game| {
                game.team_of(user_id)
                    .map(|team| !game.approval.approved_by(team))
                    .unwrap_or(false)
            })
            .collect())
    }

    pub fn user_by_shortname(&self, shortname: &str) -> Result<User> {
        let shortname = normalize_shortname(shortname);
        self.store
            .find_user_by_shortname(&shortname)?
            .ok_or_else(|| LedgerError::not_found("User", shortname).into())
    }

    fn create_user_inner(&self, shortname: &str, nickname: &str) -> Result<User> {
        let shortname = normalize_shortname(shortname);
        let nickname = nickname.trim().to_string();
        if shortname.is_empty() || nickname.is_empty() {
            return Err(LedgerError::validation("Shortname and nickname must not be empty").into());
        }

        let _guard = self.store.exclusive()?;
        self.ensure_names_available(&shortname, &nickname, None)?;

        let user = User {
            id: generate_user_id(),
            shortname,
            nickname,
            created_at: current_timestamp(),
        };

        let mut batch = WriteBatch::new().upsert_user(user.clone());
        for observation in self.engine.seed_observations(user.id, user.created_at) {
            batch = batch.append_observation(observation);
        }
        self.store.commit(batch)?;

        self.metrics.set_user_count(self.store.list_users()?.len());
        info!("Created user {} ({})", user.shortname, user.id);
        Ok(user)
    }

    fn update_user_inner(&self, user_id: &UserId, shortname: &str, nickname: &str) -> Result<User> {
        let shortname = normalize_shortname(shortname);
        let nickname = nickname.trim().to_string();
        if shortname.is_empty() || nickname.is_empty() {
            return Err(LedgerError::validation("Shortname and nickname must not be empty").into());
        }

        let _guard = self.store.exclusive()?;
        let mut user = self.require_user(user_id)?;
        self.ensure_names_available(&shortname, &nickname, Some(user_id))?;

        user.shortname = shortname;
        user.nickname = nickname;
        self.store.commit(WriteBatch::new().upsert_user(user.clone()))?;

        info!("Updated user {} to {} / {}", user.id, user.shortname, user.nickname);
        Ok(user)
    }

    fn create_match_inner(&self, new_match: NewMatch, creator: Option<UserId>) -> Result<Match> {
        validate_new_match(&new_match)?;

        let _guard = self.store.exclusive()?;

        let now = current_timestamp();
        let timestamp = new_match.timestamp.unwrap_or(now);
        if timestamp > now {
            return Err(LedgerError::validation(format!(
                "Match timestamp {} is in the future",
                timestamp
            ))
            .into());
        }
        for user_id in new_match.winners.iter().chain(&new_match.losers) {
            self.require_user(user_id)?;
            let earliest = self.store.earliest_activity(user_id)?;
            if timestamp < earliest {
                return Err(LedgerError::validation(format!(
                    "Match timestamp {} precedes the first activity of user {}",
                    timestamp, user_id
                ))
                .into());
            }
        }
        if let Some(creator) = &creator {
            self.require_user(creator)?;
        }

        let mut game = Match {
            id: generate_match_id(),
            sequence: 0,
            winners: new_match.winners,
            losers: new_match.losers,
            winner_score: new_match.winner_score,
            loser_score: new_match.loser_score,
            importance: new_match.importance,
            timestamp,
            approval: ApprovalState::Unapproved,
        };
        let creator_team = creator.as_ref().and_then(|id| game.team_of(id));
        game.approval = ApprovalState::on_creation(creator_team);
        game.sequence = self.store.next_match_sequence()?;

        let batch = WriteBatch::new().upsert_match(game.clone());
        if game.is_eligible() {
            let mut matches = self.store.list_matches()?;
            matches.push(game.clone());
            self.replay_and_commit(&matches, batch, RecomputeTrigger::MatchCreated)?;
        } else {
            self.store.commit(batch)?;
        }

        self.metrics.record_match_event("created");
        info!(
            "Created match {} ({} v {}, {})",
            game.id,
            game.winners.len(),
            game.losers.len(),
            game.approval
        );
        Ok(game)
    }

    fn approve_match_inner(&self, match_id: &MatchId, approver: &UserId) -> Result<ApprovalOutcome> {
        let _guard = self.store.exclusive()?;

        self.require_user(approver)?;
        let mut game = self.require_match(match_id)?;
        let team = game.team_of(approver).ok_or_else(|| LedgerError::NotAParticipant {
            user_id: approver.to_string(),
            match_id: match_id.to_string(),
        })?;

        let transition = game.approval.approve(team);
        if transition.is_noop() {
            debug!("Match {} already approved by {}", match_id, team);
            return Ok(ApprovalOutcome {
                game,
                transition,
                replay: None,
            });
        }

        game.approval = transition.to;
        let batch = WriteBatch::new().upsert_match(game.clone());

        let replay = if transition.completes_approval() {
            let matches: Vec<Match> = self
                .store
                .list_matches()?
                .into_iter()
                .map(|stored| if stored.id == game.id { game.clone() } else { stored })
                .collect();
            let report = self.replay_and_commit(&matches, batch, RecomputeTrigger::MatchApproved)?;
            self.metrics.record_match_event("fully_approved");
            Some(report)
        } else {
            self.store.commit(batch)?;
            self.metrics.record_match_event("partially_approved");
            None
        };

        info!("Match {} approved by {}: now {}", match_id, team, game.approval);
        Ok(ApprovalOutcome {
            game,
            transition,
            replay,
        })
    }

    fn delete_match_inner(&self, match_id: &MatchId) -> Result<ReplayReport> {
        let _guard = self.store.exclusive()?;

        let game = self.require_match(match_id)?;
        let matches: Vec<Match> = self
            .store
            .list_matches()?
            .into_iter()
            .filter(|stored| stored.id != game.id)
            .collect();

        let batch = WriteBatch::new().remove_match(game.id);
        let report = self.replay_and_commit(&matches, batch, RecomputeTrigger::MatchDeleted)?;

        self.metrics.record_match_event("deleted");
        info!("Deleted match {}", match_id);
        Ok(report)
    }

    fn recompute_all_inner(&self) -> Result<ReplayReport> {
        let _guard = self.store.exclusive()?;
        let matches = self.store.eligible_matches()?;
        self.replay_and_commit(&matches, WriteBatch::new(), RecomputeTrigger::Manual)
    }

    /// Replay `matches` and commit the new timeline together with `batch`.
    /// Callers must hold the exclusive guard.
    fn replay_and_commit(
        &self,
        matches: &[Match],
        batch: WriteBatch,
        trigger: RecomputeTrigger,
    ) -> Result<ReplayReport> {
        let timer = self.metrics.start_timer();

        let (timeline, report) = self
            .engine
            .rebuild(self.store.as_ref(), matches)?;
        self.store.commit(batch.replace_timeline(timeline))?;

        let duration = timer.stop();
        self.metrics
            .record_recomputation(trigger.as_str(), &report, duration);
        debug!(
            "Recomputation ({}) committed in {:?}",
            trigger.as_str(),
            duration
        );
        Ok(report)
    }

    fn ensure_names_available(
        &self,
        shortname: &str,
        nickname: &str,
        current: Option<&UserId>,
    ) -> Result<()> {
        let is_other = |user: &User| Some(&user.id) != current;

        if self
            .store
            .find_user_by_shortname(shortname)?
            .filter(is_other)
            .is_some()
        {
            return Err(LedgerError::validation("Someone has already used that shortname").into());
        }
        if self
            .store
            .find_user_by_nickname(nickname)?
            .filter(is_other)
            .is_some()
        {
            return Err(LedgerError::validation("Someone has already used that nickname").into());
        }
        Ok(())
    }

    fn require_user(&self, user_id: &UserId) -> Result<User> {
        self.store
            .get_user(user_id)?
            .ok_or_else(|| LedgerError::not_found("User", user_id).into())
    }

    fn require_match(&self, match_id: &MatchId) -> Result<Match> {
        self.store
            .get_match(match_id)?
            .ok_or_else(|| LedgerError::not_found("Match", match_id).into())
    }

    fn track<T>(&self, operation: &str, result: Result<T>) -> Result<T> {
        if let Err(e) = &result {
            let kind = error_kind(e);
            warn!("{} failed ({}): {}", operation, kind, e);
            self.metrics.record_failure(operation, kind);
        }
        result
    }
}

/// Reject malformed match input before anything is written
fn validate_new_match(new_match: &NewMatch) -> Result<()> {
    if new_match.winners.is_empty() || new_match.losers.is_empty() {
        return Err(LedgerError::validation("Both teams need at least one player").into());
    }

    let winners: HashSet<&UserId> = new_match.winners.iter().collect();
    let losers: HashSet<&UserId> = new_match.losers.iter().collect();
    if winners.len() != new_match.winners.len() || losers.len() != new_match.losers.len() {
        return Err(LedgerError::validation("A player is listed twice on the same team").into());
    }
    if !winners.is_disjoint(&losers) {
        return Err(LedgerError::validation("A player cannot be on both teams").into());
    }

    if !new_match.importance.is_finite() || new_match.importance <= 0.0 {
        return Err(LedgerError::validation(format!(
            "Importance must be a positive number, got {}",
            new_match.importance
        ))
        .into());
    }

    Ok(())
}
