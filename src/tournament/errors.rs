//! Tournament aggregate error types.

use super::models::{TeamId, TournamentStatus};
use thiserror::Error;

/// Tournament aggregate errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TournamentError {
    /// Status transition not present in the adjacency table
    #[error("illegal status transition: {from} -> {to}")]
    InvalidTransition {
        from: TournamentStatus,
        to: TournamentStatus,
    },

    /// Opening teams can no longer change once any match exists
    #[error("opening teams are locked once matches exist")]
    OpeningTeamsLocked,

    /// Opening team is not part of the registered set
    #[error("team {0} is not registered for this tournament")]
    OpeningTeamNotRegistered(TeamId),

    /// Opening pair must be two distinct teams
    #[error("opening teams must be two distinct teams")]
    OpeningTeamsIdentical,

    /// Knockout capacity must be a power of two
    #[error("knockout capacity must be a power of two and >= 2, got {0}")]
    CapacityNotPowerOfTwo(u32),

    /// min_teams/max_teams out of order
    #[error("invalid team bounds: min {min} > max {max}")]
    TeamBoundsInvalid { min: u32, max: u32 },

    /// Group configuration does not fit the format
    #[error("invalid group configuration: {0}")]
    GroupConfigInvalid(String),
}

/// Result type for tournament aggregate operations
pub type TournamentResult<T> = Result<T, TournamentError>;
