//! Rating calculations and the observation timeline
//!
//! Elo deltas are computed from team averages; TrueSkill updates go through
//! the `TeamRatingCalculator` trait backed by the skillratings crate.

pub mod calculator;
pub mod elo;
pub mod timeline;
pub mod trueskill;

// Re-export commonly used types
pub use calculator::{TeamRatingCalculator, TeamUpdate};
pub use elo::{elo_delta, team_elo_delta};
pub use timeline::RatingTimeline;
pub use trueskill::TrueSkillCalculator;
