//! Common types used throughout the rating ledger

use crate::config::RatingConfig;
use crate::ledger::approval::ApprovalState;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use skillratings::trueskill::TrueSkillRating;
use uuid::Uuid;

/// Unique identifier for users
pub type UserId = Uuid;

/// Unique identifier for matches
pub type MatchId = Uuid;

/// A registered player
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    /// Short display tag, always upper-case
    pub shortname: String,
    pub nickname: String,
    pub created_at: DateTime<Utc>,
}

/// Side of a match
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Team {
    Winners,
    Losers,
}

impl std::fmt::Display for Team {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Team::Winners => write!(f, "winners"),
            Team::Losers => write!(f, "losers"),
        }
    }
}

/// A recorded match between two teams
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Match {
    pub id: MatchId,
    /// Store-assigned insertion order, used to break timestamp ties during replay
    pub sequence: u64,
    pub winners: Vec<UserId>,
    pub losers: Vec<UserId>,
    pub winner_score: u32,
    pub loser_score: u32,
    /// Scales the Elo delta magnitude
    pub importance: f64,
    pub timestamp: DateTime<Utc>,
    pub approval: ApprovalState,
}

impl Match {
    /// Team the user played on, if any
    pub fn team_of(&self, user_id: &UserId) -> Option<Team> {
        if self.winners.contains(user_id) {
            Some(Team::Winners)
        } else if self.losers.contains(user_id) {
            Some(Team::Losers)
        } else {
            None
        }
    }

    pub fn is_participant(&self, user_id: &UserId) -> bool {
        self.team_of(user_id).is_some()
    }

    /// Only fully approved matches affect ratings
    pub fn is_eligible(&self) -> bool {
        self.approval.is_fully_approved()
    }

    /// Eligible matches in replay order: timestamp, then insertion sequence
    pub fn in_replay_order(matches: &[Match]) -> Vec<&Match> {
        let mut eligible: Vec<&Match> = matches.iter().filter(|game| game.is_eligible()).collect();
        eligible.sort_by_key(|game| (game.timestamp, game.sequence));
        eligible
    }

    /// Participant links, winners first
    pub fn participants(&self) -> impl Iterator<Item = Participant> + '_ {
        let winners = self.winners.iter().map(|user_id| Participant {
            user_id: *user_id,
            win: true,
        });
        let losers = self.losers.iter().map(|user_id| Participant {
            user_id: *user_id,
            win: false,
        });
        winners.chain(losers)
    }
}

/// Link between a user and a match they played in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    pub user_id: UserId,
    pub win: bool,
}

/// Input for recording a new match
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewMatch {
    pub winners: Vec<UserId>,
    pub losers: Vec<UserId>,
    pub winner_score: u32,
    pub loser_score: u32,
    pub importance: f64,
    /// Defaults to the time of creation
    pub timestamp: Option<DateTime<Utc>>,
}

/// Kind of rating signal an observation records
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RatingKind {
    Elo,
    TrueskillMean,
    TrueskillDeviation,
}

impl RatingKind {
    pub const ALL: [RatingKind; 3] = [
        RatingKind::Elo,
        RatingKind::TrueskillMean,
        RatingKind::TrueskillDeviation,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RatingKind::Elo => "elo",
            RatingKind::TrueskillMean => "trueskill_mean",
            RatingKind::TrueskillDeviation => "trueskill_deviation",
        }
    }
}

impl std::fmt::Display for RatingKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for RatingKind {
    type Err = crate::error::LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "elo" => Ok(RatingKind::Elo),
            "trueskill_mean" | "trueskill_mu" | "mean" => Ok(RatingKind::TrueskillMean),
            "trueskill_deviation" | "trueskill_sigma" | "deviation" => {
                Ok(RatingKind::TrueskillDeviation)
            }
            other => Err(crate::error::LedgerError::validation(format!(
                "Unknown rating kind: {}",
                other
            ))),
        }
    }
}

/// Immutable timestamped rating value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RatingObservation {
    pub user_id: UserId,
    pub kind: RatingKind,
    pub value: f64,
    pub timestamp: DateTime<Utc>,
    /// None for seed observations
    pub source_match: Option<MatchId>,
}

impl RatingObservation {
    pub fn is_seed(&self) -> bool {
        self.source_match.is_none()
    }
}

/// TrueSkill mean and deviation for one player
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrueSkillValue {
    pub mean: f64,
    pub deviation: f64,
}

/// The configured seed rating
impl Default for TrueSkillValue {
    fn default() -> Self {
        RatingConfig::default().initial_trueskill()
    }
}

impl From<TrueSkillRating> for TrueSkillValue {
    fn from(rating: TrueSkillRating) -> Self {
        Self {
            mean: rating.rating,
            deviation: rating.uncertainty,
        }
    }
}

impl From<TrueSkillValue> for TrueSkillRating {
    fn from(value: TrueSkillValue) -> Self {
        Self {
            rating: value.mean,
            uncertainty: value.deviation,
        }
    }
}

/// One row of the ranking table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    pub user: User,
    pub elo: f64,
    pub trueskill: TrueSkillValue,
}
