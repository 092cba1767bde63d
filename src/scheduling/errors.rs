//! Scheduling orchestrator error types.

use thiserror::Error;

use crate::fixtures::FixtureError;
use crate::matches::MatchId;
use crate::store::StoreError;
use crate::tournament::{TeamId, TournamentError, TournamentId};

/// Transport-facing classification of a scheduling error.
///
/// The orchestrator never owns a wire format; callers map these to whatever
/// status codes their transport uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// A referenced tournament/match/registration does not exist
    NotFound,
    /// The caller may not perform this operation
    Forbidden,
    /// Caller-correctable input or business-rule violation
    BadRequest,
    /// State-machine violation, duplicate generation, or lost race
    Conflict,
    /// Storage or serialization failure
    Internal,
}

/// Scheduling errors
#[derive(Debug, Error)]
pub enum SchedulingError {
    /// Tournament aggregate rejected the operation
    #[error(transparent)]
    Tournament(#[from] TournamentError),

    /// Fixture generation or manual-input validation failed
    #[error(transparent)]
    Fixture(#[from] FixtureError),

    /// Storage failure
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("Tournament not found: {0}")]
    TournamentNotFound(TournamentId),

    #[error("Match not found: {0}")]
    MatchNotFound(MatchId),

    #[error("Registration not found: {0}")]
    RegistrationNotFound(uuid::Uuid),

    /// One-shot generation guard
    #[error("Matches already exist for tournament {0}")]
    MatchesAlreadyExist(TournamentId),

    /// Another scheduling operation holds the tournament lock
    #[error("Scheduling is busy for tournament {0}")]
    LockTimeout(TournamentId),

    #[error("Operation requires {required} scheduling mode")]
    WrongSchedulingMode { required: &'static str },

    /// Operation is not valid in the tournament's current state
    #[error("Invalid state for this operation: {0}")]
    InvalidState(String),

    #[error("Pending payment reviews block fixture generation")]
    PendingPayments,

    #[error("Not enough teams: {current} registered, {required} required")]
    NotEnoughTeams { current: usize, required: usize },

    #[error("An opening match must be selected first")]
    OpeningMatchRequired,

    #[error("A finished match result is immutable: {0}")]
    MatchAlreadyFinished(MatchId),

    #[error("Team {0} is not playing in this match")]
    TeamNotInMatch(TeamId),

    #[error("Invalid qualifier selection: {0}")]
    InvalidQualifiers(String),

    /// For embedders that surface their own authorization decisions through
    /// the same error type
    #[error("Operation not permitted: {0}")]
    Forbidden(String),
}

impl SchedulingError {
    /// Classify this error for the caller's transport layer.
    pub fn kind(&self) -> ErrorKind {
        match self {
            SchedulingError::TournamentNotFound(_)
            | SchedulingError::MatchNotFound(_)
            | SchedulingError::RegistrationNotFound(_) => ErrorKind::NotFound,

            SchedulingError::Forbidden(_) => ErrorKind::Forbidden,

            SchedulingError::Fixture(_)
            | SchedulingError::WrongSchedulingMode { .. }
            | SchedulingError::PendingPayments
            | SchedulingError::NotEnoughTeams { .. }
            | SchedulingError::OpeningMatchRequired
            | SchedulingError::TeamNotInMatch(_)
            | SchedulingError::InvalidQualifiers(_) => ErrorKind::BadRequest,

            SchedulingError::MatchesAlreadyExist(_)
            | SchedulingError::LockTimeout(_)
            | SchedulingError::InvalidState(_)
            | SchedulingError::MatchAlreadyFinished(_) => ErrorKind::Conflict,

            SchedulingError::Tournament(e) => match e {
                TournamentError::InvalidTransition { .. }
                | TournamentError::OpeningTeamsLocked => ErrorKind::Conflict,
                _ => ErrorKind::BadRequest,
            },

            SchedulingError::Store(e) => match e {
                StoreError::TournamentNotFound(_)
                | StoreError::MatchNotFound(_)
                | StoreError::RegistrationNotFound(_) => ErrorKind::NotFound,
                StoreError::Database(_) | StoreError::Corrupt(_) | StoreError::Config(_) => {
                    ErrorKind::Internal
                }
            },
        }
    }
}

/// Result type for scheduling operations
pub type SchedulingResult<T> = Result<T, SchedulingError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tournament::TournamentStatus;
    use uuid::Uuid;

    #[test]
    fn test_kind_classification() {
        assert_eq!(
            SchedulingError::TournamentNotFound(Uuid::new_v4()).kind(),
            ErrorKind::NotFound
        );
        assert_eq!(
            SchedulingError::LockTimeout(Uuid::new_v4()).kind(),
            ErrorKind::Conflict
        );
        assert_eq!(
            SchedulingError::MatchesAlreadyExist(Uuid::new_v4()).kind(),
            ErrorKind::Conflict
        );
        assert_eq!(
            SchedulingError::PendingPayments.kind(),
            ErrorKind::BadRequest
        );
        assert_eq!(
            SchedulingError::Tournament(TournamentError::InvalidTransition {
                from: TournamentStatus::Draft,
                to: TournamentStatus::Active,
            })
            .kind(),
            ErrorKind::Conflict
        );
        assert_eq!(
            SchedulingError::Tournament(TournamentError::OpeningTeamsIdentical).kind(),
            ErrorKind::BadRequest
        );
        assert_eq!(
            SchedulingError::Fixture(FixtureError::FieldNotPowerOfTwo(6)).kind(),
            ErrorKind::BadRequest
        );
        assert_eq!(
            SchedulingError::Forbidden("not the organizer".to_string()).kind(),
            ErrorKind::Forbidden
        );
        assert_eq!(
            SchedulingError::Store(StoreError::Config("DATABASE_URL is not set".to_string()))
                .kind(),
            ErrorKind::Internal
        );
    }
}
