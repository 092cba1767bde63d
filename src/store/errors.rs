//! Storage error types.

use crate::matches::MatchId;
use crate::tournament::TournamentId;
use thiserror::Error;

/// Errors from the persistence layer
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Tournament not found: {0}")]
    TournamentNotFound(TournamentId),

    #[error("Match not found: {0}")]
    MatchNotFound(MatchId),

    #[error("Registration not found: {0}")]
    RegistrationNotFound(uuid::Uuid),

    /// A configuration value is missing or unusable
    #[error("Invalid database configuration: {0}")]
    Config(String),

    /// A stored value failed to decode (enum string, event payload)
    #[error("Corrupt stored value: {0}")]
    Corrupt(String),
}

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;
