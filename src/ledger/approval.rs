//! Two-party match approval state machine
//!
//! Each team approves independently. Transitions only ever add approvals,
//! and a match affects ratings only once both teams have approved.

use crate::types::Team;
use serde::{Deserialize, Serialize};

/// Approval state of a match
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApprovalState {
    #[default]
    Unapproved,
    WinnersApproved,
    LosersApproved,
    FullyApproved,
}

/// Result of applying one team's approval
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApprovalTransition {
    pub from: ApprovalState,
    pub to: ApprovalState,
}

impl ApprovalTransition {
    /// True only for the step that enters `FullyApproved`
    pub fn completes_approval(&self) -> bool {
        !self.from.is_fully_approved() && self.to.is_fully_approved()
    }

    pub fn is_noop(&self) -> bool {
        self.from == self.to
    }
}

impl ApprovalState {
    /// Initial state for a match recorded by `creator_team`'s member, if any
    pub fn on_creation(creator_team: Option<Team>) -> Self {
        match creator_team {
            Some(team) => ApprovalState::Unapproved.approve(team).to,
            None => ApprovalState::Unapproved,
        }
    }

    /// Build a state from the two raw flags
    pub fn from_flags(approved_by_winner: bool, approved_by_loser: bool) -> Self {
        match (approved_by_winner, approved_by_loser) {
            (false, false) => ApprovalState::Unapproved,
            (true, false) => ApprovalState::WinnersApproved,
            (false, true) => ApprovalState::LosersApproved,
            (true, true) => ApprovalState::FullyApproved,
        }
    }

    pub fn approved_by_winner(&self) -> bool {
        matches!(
            self,
            ApprovalState::WinnersApproved | ApprovalState::FullyApproved
        )
    }

    pub fn approved_by_loser(&self) -> bool {
        matches!(
            self,
            ApprovalState::LosersApproved | ApprovalState::FullyApproved
        )
    }

    pub fn approved_by(&self, team: Team) -> bool {
        match team {
            Team::Winners => self.approved_by_winner(),
            Team::Losers => self.approved_by_loser(),
        }
    }

    pub fn is_fully_approved(&self) -> bool {
        *self == ApprovalState::FullyApproved
    }

    pub fn is_partially_approved(&self) -> bool {
        matches!(
            self,
            ApprovalState::WinnersApproved | ApprovalState::LosersApproved
        )
    }

    /// Record `team`'s approval. Never clears an existing approval.
    pub fn approve(self, team: Team) -> ApprovalTransition {
        let to = match team {
            Team::Winners => Self::from_flags(true, self.approved_by_loser()),
            Team::Losers => Self::from_flags(self.approved_by_winner(), true),
        };
        ApprovalTransition { from: self, to }
    }
}

impl std::fmt::Display for ApprovalState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ApprovalState::Unapproved => write!(f, "unapproved"),
            ApprovalState::WinnersApproved => write!(f, "approved by winners"),
            ApprovalState::LosersApproved => write!(f, "approved by losers"),
            ApprovalState::FullyApproved => write!(f, "fully approved"),
        }
    }
}
