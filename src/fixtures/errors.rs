//! Fixture generation error types.

use crate::tournament::TeamId;
use thiserror::Error;

/// Fixture generation errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FixtureError {
    /// Too few teams for the requested schedule
    #[error("not enough teams: need {needed}, have {current}")]
    NotEnoughTeams { needed: usize, current: usize },

    /// Knockout draws need a power-of-two field
    #[error("knockout draw needs a power-of-two team count >= 2, got {0}")]
    FieldNotPowerOfTwo(usize),

    /// A team appears more than once in the supplied input
    #[error("team {0} appears more than once")]
    DuplicateTeam(TeamId),

    /// A manual pairing puts a team against itself
    #[error("team {0} cannot be paired against itself")]
    TeamPairedWithItself(TeamId),

    /// A supplied team is not part of the approved registration set
    #[error("team {0} is not an approved participant")]
    UnknownTeam(TeamId),

    /// The supplied input does not cover every approved team
    #[error("input must cover every approved team exactly once: {missing} missing")]
    IncompleteCoverage { missing: usize },

    /// Manual group assignment does not match the configured group count
    #[error("expected {expected} groups, assignment uses {got}")]
    GroupCountMismatch { expected: u32, got: u32 },

    /// A group ended up too small to play a round robin
    #[error("group {group} has {size} team(s), need at least 2")]
    GroupTooSmall { group: u32, size: usize },

    /// The opening pair must stay together in one group
    #[error("opening teams must be assigned to the same group")]
    OpeningPairSplit,

    /// The opening pair references a team outside the draw
    #[error("opening team {0} is not part of the draw")]
    OpeningTeamNotInDraw(TeamId),
}

/// Result type for fixture generation
pub type FixtureResult<T> = Result<T, FixtureError>;
