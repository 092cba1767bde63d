//! Repository trait definitions for testability and dependency injection.
//!
//! The scheduling manager is written against these traits, never a concrete
//! backend. Postgres implementations live in [`super::pg`], the in-memory
//! implementation in [`super::memory`].

use async_trait::async_trait;
use uuid::Uuid;

use super::errors::StoreResult;
use crate::matches::{Match, MatchId};
use crate::registration::TeamRegistration;
use crate::tournament::{Tournament, TournamentId, TournamentStatus};

/// Trait for tournament repository operations
#[async_trait]
pub trait TournamentStore: Send + Sync {
    /// Persist a new tournament
    async fn insert_tournament(&self, tournament: &Tournament) -> StoreResult<()>;

    /// Find a tournament by ID
    async fn get_tournament(&self, id: TournamentId) -> StoreResult<Option<Tournament>>;

    /// Persist the full current state of a tournament
    async fn update_tournament(&self, tournament: &Tournament) -> StoreResult<()>;

    /// List tournaments, optionally filtered by status
    async fn list_tournaments(
        &self,
        status: Option<TournamentStatus>,
    ) -> StoreResult<Vec<Tournament>>;
}

/// Trait for team registration repository operations
#[async_trait]
pub trait RegistrationStore: Send + Sync {
    /// Persist a new registration
    async fn insert_registration(&self, registration: &TeamRegistration) -> StoreResult<()>;

    /// Find a registration by ID
    async fn get_registration(&self, id: Uuid) -> StoreResult<Option<TeamRegistration>>;

    /// Persist the full current state of a registration
    async fn update_registration(&self, registration: &TeamRegistration) -> StoreResult<()>;

    /// All registrations of one tournament
    async fn registrations_for(
        &self,
        tournament_id: TournamentId,
    ) -> StoreResult<Vec<TeamRegistration>>;
}

/// Trait for match repository operations
#[async_trait]
pub trait MatchStore: Send + Sync {
    /// Persist a batch of generated matches
    async fn insert_matches(&self, matches: &[Match]) -> StoreResult<()>;

    /// Find a match by ID
    async fn get_match(&self, id: MatchId) -> StoreResult<Option<Match>>;

    /// Persist the full current state of a match
    async fn update_match(&self, m: &Match) -> StoreResult<()>;

    /// All matches of one tournament
    async fn matches_for(&self, tournament_id: TournamentId) -> StoreResult<Vec<Match>>;

    /// Delete every match of one tournament. Used by schedule reset.
    async fn delete_matches_for(&self, tournament_id: TournamentId) -> StoreResult<()>;
}
