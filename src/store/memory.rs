//! In-memory store used by embedders and tests.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;
use uuid::Uuid;

use super::errors::{StoreError, StoreResult};
use super::repository::{MatchStore, RegistrationStore, TournamentStore};
use crate::matches::{Match, MatchId};
use crate::registration::TeamRegistration;
use crate::tournament::{Tournament, TournamentId, TournamentStatus};

/// A single in-memory backend implementing all three repository traits.
///
/// Not a test double only: the library is embeddable, and an embedder that
/// does not want Postgres can run the whole scheduling manager on this.
#[derive(Default)]
pub struct MemoryStore {
    tournaments: Mutex<HashMap<TournamentId, Tournament>>,
    registrations: Mutex<HashMap<Uuid, TeamRegistration>>,
    matches: Mutex<HashMap<MatchId, Match>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tournament(self, tournament: Tournament) -> Self {
        self.tournaments
            .lock()
            .unwrap()
            .insert(tournament.id, tournament);
        self
    }
}

#[async_trait]
impl TournamentStore for MemoryStore {
    async fn insert_tournament(&self, tournament: &Tournament) -> StoreResult<()> {
        self.tournaments
            .lock()
            .unwrap()
            .insert(tournament.id, tournament.clone());
        Ok(())
    }

    async fn get_tournament(&self, id: TournamentId) -> StoreResult<Option<Tournament>> {
        Ok(self.tournaments.lock().unwrap().get(&id).cloned())
    }

    async fn update_tournament(&self, tournament: &Tournament) -> StoreResult<()> {
        let mut tournaments = self.tournaments.lock().unwrap();
        match tournaments.get_mut(&tournament.id) {
            Some(stored) => {
                *stored = tournament.clone();
                Ok(())
            }
            None => Err(StoreError::TournamentNotFound(tournament.id)),
        }
    }

    async fn list_tournaments(
        &self,
        status: Option<TournamentStatus>,
    ) -> StoreResult<Vec<Tournament>> {
        let mut tournaments: Vec<Tournament> = self
            .tournaments
            .lock()
            .unwrap()
            .values()
            .filter(|t| status.is_none_or(|s| t.status == s))
            .cloned()
            .collect();
        tournaments.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(tournaments)
    }
}

#[async_trait]
impl RegistrationStore for MemoryStore {
    async fn insert_registration(&self, registration: &TeamRegistration) -> StoreResult<()> {
        self.registrations
            .lock()
            .unwrap()
            .insert(registration.id, registration.clone());
        Ok(())
    }

    async fn get_registration(&self, id: Uuid) -> StoreResult<Option<TeamRegistration>> {
        Ok(self.registrations.lock().unwrap().get(&id).cloned())
    }

    async fn update_registration(&self, registration: &TeamRegistration) -> StoreResult<()> {
        let mut registrations = self.registrations.lock().unwrap();
        match registrations.get_mut(&registration.id) {
            Some(stored) => {
                *stored = registration.clone();
                Ok(())
            }
            None => Err(StoreError::RegistrationNotFound(registration.id)),
        }
    }

    async fn registrations_for(
        &self,
        tournament_id: TournamentId,
    ) -> StoreResult<Vec<TeamRegistration>> {
        let mut regs: Vec<TeamRegistration> = self
            .registrations
            .lock()
            .unwrap()
            .values()
            .filter(|r| r.tournament_id == tournament_id)
            .cloned()
            .collect();
        regs.sort_by(|a, b| a.registered_at.cmp(&b.registered_at));
        Ok(regs)
    }
}

#[async_trait]
impl MatchStore for MemoryStore {
    async fn insert_matches(&self, matches: &[Match]) -> StoreResult<()> {
        let mut stored = self.matches.lock().unwrap();
        for m in matches {
            stored.insert(m.id, m.clone());
        }
        Ok(())
    }

    async fn get_match(&self, id: MatchId) -> StoreResult<Option<Match>> {
        Ok(self.matches.lock().unwrap().get(&id).cloned())
    }

    async fn update_match(&self, m: &Match) -> StoreResult<()> {
        let mut matches = self.matches.lock().unwrap();
        match matches.get_mut(&m.id) {
            Some(stored) => {
                *stored = m.clone();
                Ok(())
            }
            None => Err(StoreError::MatchNotFound(m.id)),
        }
    }

    async fn matches_for(&self, tournament_id: TournamentId) -> StoreResult<Vec<Match>> {
        let mut matches: Vec<Match> = self
            .matches
            .lock()
            .unwrap()
            .values()
            .filter(|m| m.tournament_id == tournament_id)
            .cloned()
            .collect();
        matches.sort_by(|a, b| {
            (a.round_number, a.ordinal, a.created_at, a.id)
                .cmp(&(b.round_number, b.ordinal, b.created_at, b.id))
        });
        Ok(matches)
    }

    async fn delete_matches_for(&self, tournament_id: TournamentId) -> StoreResult<()> {
        self.matches
            .lock()
            .unwrap()
            .retain(|_, m| m.tournament_id != tournament_id);
        Ok(())
    }
}
