//! Scheduling orchestrator.
//!
//! Every mutating operation follows the same shape: acquire the
//! per-tournament lock with a bounded timeout, load, validate, delegate to
//! the pure components, persist, release the lock on every path, then notify
//! best-effort. Reads (standings) never take the lock.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use uuid::Uuid;

use super::errors::{SchedulingError, SchedulingResult};
use crate::cache::{DEFAULT_STANDINGS_TTL, StandingsCache};
use crate::events::{ChangeNotifier, UpdateEvent};
use crate::fixtures::{groups, knockout, round_robin};
use crate::lifecycle::{self, ReconcileAction};
use crate::lock::NamedLock;
use crate::matches::{Match, MatchEvent, MatchEventKind, MatchId, MatchStatus, Score};
use crate::registration::{RegistrationStatus, TeamRegistration};
use crate::standings::{StandingsRow, calculator};
use crate::store::{MatchStore, RegistrationStore, TournamentStore};
use crate::tournament::{
    EffectiveMode, LegType, SchedulingMode, TeamId, Tournament, TournamentId, TournamentStatus,
};

/// Default bound on lock acquisition before an operation fails with Conflict
pub const DEFAULT_LOCK_TIMEOUT: Duration = Duration::from_secs(30);

/// The scheduling use-case layer. Holds trait objects for every external
/// capability so backends are swappable per deployment.
pub struct SchedulingManager {
    tournaments: Arc<dyn TournamentStore>,
    registrations: Arc<dyn RegistrationStore>,
    matches: Arc<dyn MatchStore>,
    lock: Arc<dyn NamedLock>,
    cache: Arc<dyn StandingsCache>,
    notifier: Arc<dyn ChangeNotifier>,
    lock_timeout: Duration,
}

impl SchedulingManager {
    pub fn new(
        tournaments: Arc<dyn TournamentStore>,
        registrations: Arc<dyn RegistrationStore>,
        matches: Arc<dyn MatchStore>,
        lock: Arc<dyn NamedLock>,
        cache: Arc<dyn StandingsCache>,
        notifier: Arc<dyn ChangeNotifier>,
    ) -> Self {
        Self {
            tournaments,
            registrations,
            matches,
            lock,
            cache,
            notifier,
            lock_timeout: DEFAULT_LOCK_TIMEOUT,
        }
    }

    pub fn with_lock_timeout(mut self, timeout: Duration) -> Self {
        self.lock_timeout = timeout;
        self
    }

    /// Generate the full fixture set for a random-mode tournament and
    /// activate it. One-shot: rejected once any match exists.
    pub async fn generate_fixtures(
        &self,
        tournament_id: TournamentId,
    ) -> SchedulingResult<Vec<Match>> {
        let key = self.acquire(tournament_id).await?;
        let result = self.generate_fixtures_locked(tournament_id).await;
        self.lock.release(&key).await;
        result
    }

    /// Store organizer-supplied group assignments for a manual-mode
    /// tournament. Pre-draw only.
    pub async fn assign_teams_to_groups(
        &self,
        tournament_id: TournamentId,
        assignments: &[(TeamId, u32)],
    ) -> SchedulingResult<()> {
        let key = self.acquire(tournament_id).await?;
        let result = self
            .assign_teams_to_groups_locked(tournament_id, assignments)
            .await;
        self.lock.release(&key).await;
        result
    }

    /// Select the opening pair. Pre-draw only; overwrites a previous pick.
    pub async fn set_opening_match(
        &self,
        tournament_id: TournamentId,
        team_a: TeamId,
        team_b: TeamId,
    ) -> SchedulingResult<()> {
        let key = self.acquire(tournament_id).await?;
        let result = self
            .set_opening_match_locked(tournament_id, team_a, team_b)
            .await;
        self.lock.release(&key).await;
        result
    }

    /// Drop the selected opening pair. Pre-draw only.
    pub async fn clear_opening_match(&self, tournament_id: TournamentId) -> SchedulingResult<()> {
        let key = self.acquire(tournament_id).await?;
        let result = self.clear_opening_match_locked(tournament_id).await;
        self.lock.release(&key).await;
        result
    }

    /// Create round 1 of a knockout-only tournament from organizer pairings
    /// and activate it.
    pub async fn create_manual_knockout_matches(
        &self,
        tournament_id: TournamentId,
        pairs: &[(TeamId, TeamId)],
    ) -> SchedulingResult<Vec<Match>> {
        let key = self.acquire(tournament_id).await?;
        let result = self
            .create_manual_knockout_matches_locked(tournament_id, pairs)
            .await;
        self.lock.release(&key).await;
        result
    }

    /// Move the tournament to Active, generating fixtures first when a
    /// random-mode tournament has none yet.
    pub async fn start_tournament(&self, tournament_id: TournamentId) -> SchedulingResult<()> {
        let key = self.acquire(tournament_id).await?;
        let result = self.start_tournament_locked(tournament_id).await;
        self.lock.release(&key).await;
        result
    }

    /// Delete every match and clear opening/group state so the schedule can
    /// be regenerated.
    pub async fn reset_schedule(&self, tournament_id: TournamentId) -> SchedulingResult<()> {
        let key = self.acquire(tournament_id).await?;
        let result = self.reset_schedule_locked(tournament_id).await;
        self.lock.release(&key).await;
        result
    }

    /// Move a waiting-list registration to pending payment if capacity
    /// allows.
    pub async fn promote_waiting_team(
        &self,
        tournament_id: TournamentId,
        registration_id: Uuid,
    ) -> SchedulingResult<()> {
        let key = self.acquire(tournament_id).await?;
        let result = self
            .promote_waiting_team_locked(tournament_id, registration_id)
            .await;
        self.lock.release(&key).await;
        result
    }

    /// Confirm knockout qualifiers for a manual-qualification tournament and
    /// generate the first knockout round. `qualifiers` is the bracket
    /// seeding order chosen by the organizer.
    pub async fn confirm_qualifiers(
        &self,
        tournament_id: TournamentId,
        qualifiers: &[TeamId],
    ) -> SchedulingResult<Vec<Match>> {
        let key = self.acquire(tournament_id).await?;
        let result = self
            .confirm_qualifiers_locked(tournament_id, qualifiers)
            .await;
        self.lock.release(&key).await;
        result
    }

    /// Record a match result. Finished results are immutable unless
    /// `correction` is set. Runs the lifecycle reconciler afterwards.
    pub async fn record_match_result(
        &self,
        tournament_id: TournamentId,
        match_id: MatchId,
        score: Score,
        status: MatchStatus,
        correction: bool,
    ) -> SchedulingResult<()> {
        let key = self.acquire(tournament_id).await?;
        let result = self
            .record_match_result_locked(tournament_id, match_id, score, status, correction)
            .await;
        self.lock.release(&key).await;
        result
    }

    /// Award a match to `winner` by the fixed forfeit score.
    pub async fn forfeit_match(
        &self,
        tournament_id: TournamentId,
        match_id: MatchId,
        winner: TeamId,
    ) -> SchedulingResult<()> {
        let key = self.acquire(tournament_id).await?;
        let result = self
            .forfeit_match_locked(tournament_id, match_id, winner)
            .await;
        self.lock.release(&key).await;
        result
    }

    /// Attach a goal/card event to an unfinished match.
    pub async fn add_match_event(
        &self,
        tournament_id: TournamentId,
        match_id: MatchId,
        team_id: TeamId,
        kind: MatchEventKind,
        minute: Option<u32>,
    ) -> SchedulingResult<MatchEvent> {
        let key = self.acquire(tournament_id).await?;
        let result = self
            .add_match_event_locked(tournament_id, match_id, team_id, kind, minute)
            .await;
        self.lock.release(&key).await;
        result
    }

    /// The standings table, optionally filtered to one group. Runs outside
    /// the lock; cached briefly.
    pub async fn standings(
        &self,
        tournament_id: TournamentId,
        group: Option<u32>,
    ) -> SchedulingResult<Vec<StandingsRow>> {
        let cache_key = standings_key(tournament_id, group);
        if let Some(bytes) = self.cache.get(&cache_key).await
            && let Ok(table) = serde_json::from_slice::<Vec<StandingsRow>>(&bytes)
        {
            return Ok(table);
        }

        let _ = self.load_tournament(tournament_id).await?;
        let matches = self.matches.matches_for(tournament_id).await?;
        let registrations = self.registrations.registrations_for(tournament_id).await?;
        let table = calculator::compute(&matches, &registrations, group);

        if let Ok(bytes) = serde_json::to_vec(&table) {
            self.cache
                .set(&cache_key, bytes, DEFAULT_STANDINGS_TTL)
                .await;
        }
        Ok(table)
    }

    // ---- locked bodies ----

    async fn generate_fixtures_locked(
        &self,
        tournament_id: TournamentId,
    ) -> SchedulingResult<Vec<Match>> {
        let tournament = self.load_tournament(tournament_id).await?;
        if tournament.scheduling_mode != SchedulingMode::Random {
            return Err(SchedulingError::WrongSchedulingMode { required: "random" });
        }
        require_pre_draw_status(&tournament)?;
        if !self.matches.matches_for(tournament_id).await?.is_empty() {
            return Err(SchedulingError::MatchesAlreadyExist(tournament_id));
        }

        let mut registrations = self.registrations.registrations_for(tournament_id).await?;
        if registrations.iter().any(|r| r.status.is_payment_pending()) {
            return Err(SchedulingError::PendingPayments);
        }
        let teams = approved_team_ids(&registrations);
        if teams.len() < tournament.min_teams as usize {
            return Err(SchedulingError::NotEnoughTeams {
                current: teams.len(),
                required: tournament.min_teams as usize,
            });
        }

        let opening = tournament.opening_pair();
        if tournament.effective_mode().requires_opening_match() && opening.is_none() {
            return Err(SchedulingError::OpeningMatchRequired);
        }

        let mut assigned_groups = false;
        let generated = match tournament.format.has_groups() {
            false if tournament.format.has_knockout() => {
                let mut rng = rand::rng();
                knockout::draw_round_one(
                    tournament_id,
                    &teams,
                    knockout_two_legged(&tournament),
                    opening,
                    &mut rng,
                )?
            }
            false => round_robin::schedule(tournament_id, &teams, tournament.leg_type, opening)?,
            true => {
                let partitioned = {
                    let mut rng = rand::rng();
                    groups::partition(&teams, tournament.number_of_groups, opening, &mut rng)?
                };
                for (group_idx, members) in partitioned.iter().enumerate() {
                    for team in members {
                        if let Some(reg) =
                            registrations.iter_mut().find(|r| r.team_id == *team)
                        {
                            reg.group_id = Some(group_idx as u32);
                            reg.updated_at = Utc::now();
                        }
                    }
                }
                assigned_groups = true;
                groups::schedule(tournament_id, &partitioned, tournament.leg_type, opening)?
            }
        };

        if assigned_groups {
            for reg in registrations
                .iter()
                .filter(|r| r.status == RegistrationStatus::Approved)
            {
                self.registrations.update_registration(reg).await?;
            }
        }

        let generated = self.commit_generated(tournament, generated).await?;
        log::info!(
            "Generated {} matches for tournament {tournament_id}",
            generated.len()
        );
        Ok(generated)
    }

    /// Persist a generated fixture set, activate the tournament and notify.
    async fn commit_generated(
        &self,
        mut tournament: Tournament,
        generated: Vec<Match>,
    ) -> SchedulingResult<Vec<Match>> {
        let tournament_id = tournament.id;
        self.matches.insert_matches(&generated).await?;

        tournament.opening_match_id = generated
            .iter()
            .find(|m| m.is_opening_match)
            .map(|m| m.id);
        tournament.change_status(TournamentStatus::Active)?;
        self.tournaments.update_tournament(&tournament).await?;

        self.invalidate_standings(tournament_id).await;
        self.notifier
            .notify(UpdateEvent::MatchesGenerated {
                tournament_id,
                matches: generated.clone(),
            })
            .await;
        self.notifier
            .notify(UpdateEvent::TournamentUpdated { tournament })
            .await;
        Ok(generated)
    }

    async fn assign_teams_to_groups_locked(
        &self,
        tournament_id: TournamentId,
        assignments: &[(TeamId, u32)],
    ) -> SchedulingResult<()> {
        let tournament = self.load_tournament(tournament_id).await?;
        if tournament.scheduling_mode != SchedulingMode::Manual {
            return Err(SchedulingError::WrongSchedulingMode { required: "manual" });
        }
        if tournament.status != TournamentStatus::RegistrationClosed {
            return Err(SchedulingError::InvalidState(format!(
                "cannot assign groups while {}",
                tournament.status
            )));
        }
        if !self.matches.matches_for(tournament_id).await?.is_empty() {
            return Err(SchedulingError::MatchesAlreadyExist(tournament_id));
        }

        let mut registrations = self.registrations.registrations_for(tournament_id).await?;
        let approved = approved_team_ids(&registrations);
        groups::validate_assignments(
            assignments,
            &approved,
            tournament.number_of_groups,
            tournament.opening_pair(),
        )?;

        for &(team, group) in assignments {
            if let Some(reg) = registrations.iter_mut().find(|r| r.team_id == team) {
                reg.group_id = Some(group);
                reg.updated_at = Utc::now();
                self.registrations.update_registration(reg).await?;
            }
        }

        self.notifier
            .notify(UpdateEvent::TournamentUpdated { tournament })
            .await;
        log::info!("Stored manual group assignment for tournament {tournament_id}");
        Ok(())
    }

    async fn set_opening_match_locked(
        &self,
        tournament_id: TournamentId,
        team_a: TeamId,
        team_b: TeamId,
    ) -> SchedulingResult<()> {
        let mut tournament = self.load_tournament(tournament_id).await?;
        let matches_exist = !self.matches.matches_for(tournament_id).await?.is_empty();
        let registrations = self.registrations.registrations_for(tournament_id).await?;
        let approved = approved_team_ids(&registrations);

        tournament.set_opening_teams(team_a, team_b, &approved, matches_exist)?;
        if tournament.status == TournamentStatus::WaitingForOpeningMatchSelection {
            tournament.change_status(TournamentStatus::RegistrationClosed)?;
        }
        self.tournaments.update_tournament(&tournament).await?;

        self.notifier
            .notify(UpdateEvent::TournamentUpdated { tournament })
            .await;
        Ok(())
    }

    async fn clear_opening_match_locked(
        &self,
        tournament_id: TournamentId,
    ) -> SchedulingResult<()> {
        let mut tournament = self.load_tournament(tournament_id).await?;
        if !self.matches.matches_for(tournament_id).await?.is_empty() {
            return Err(SchedulingError::MatchesAlreadyExist(tournament_id));
        }

        tournament.clear_opening_teams();
        self.tournaments.update_tournament(&tournament).await?;
        self.notifier
            .notify(UpdateEvent::TournamentUpdated { tournament })
            .await;
        Ok(())
    }

    async fn create_manual_knockout_matches_locked(
        &self,
        tournament_id: TournamentId,
        pairs: &[(TeamId, TeamId)],
    ) -> SchedulingResult<Vec<Match>> {
        let tournament = self.load_tournament(tournament_id).await?;
        if tournament.scheduling_mode != SchedulingMode::Manual {
            return Err(SchedulingError::WrongSchedulingMode { required: "manual" });
        }
        if tournament.format.has_groups() || !tournament.format.has_knockout() {
            return Err(SchedulingError::InvalidState(format!(
                "manual pairings require a knockout-only format, got {}",
                tournament.format.as_str()
            )));
        }
        require_pre_draw_status(&tournament)?;
        if !self.matches.matches_for(tournament_id).await?.is_empty() {
            return Err(SchedulingError::MatchesAlreadyExist(tournament_id));
        }

        let registrations = self.registrations.registrations_for(tournament_id).await?;
        let approved = approved_team_ids(&registrations);
        knockout::validate_manual_pairings(pairs, &approved)?;

        let generated = knockout::pairs_to_matches(
            tournament_id,
            pairs,
            1,
            knockout_two_legged(&tournament),
            tournament.opening_pair(),
        );
        let generated = self.commit_generated(tournament, generated).await?;
        log::info!(
            "Created {} manual knockout matches for tournament {tournament_id}",
            generated.len()
        );
        Ok(generated)
    }

    async fn start_tournament_locked(&self, tournament_id: TournamentId) -> SchedulingResult<()> {
        let mut tournament = self.load_tournament(tournament_id).await?;
        require_pre_draw_status(&tournament)?;

        let registrations = self.registrations.registrations_for(tournament_id).await?;
        let teams = approved_team_ids(&registrations);
        if teams.len() < tournament.min_teams as usize {
            return Err(SchedulingError::NotEnoughTeams {
                current: teams.len(),
                required: tournament.min_teams as usize,
            });
        }

        if tournament.effective_mode().requires_opening_match()
            && tournament.opening_pair().is_none()
        {
            // Park the tournament until the organizer picks the pair
            if tournament.status == TournamentStatus::RegistrationClosed {
                tournament.change_status(TournamentStatus::WaitingForOpeningMatchSelection)?;
                self.tournaments.update_tournament(&tournament).await?;
                self.notifier
                    .notify(UpdateEvent::TournamentUpdated { tournament })
                    .await;
            }
            return Err(SchedulingError::OpeningMatchRequired);
        }

        if self.matches.matches_for(tournament_id).await?.is_empty() {
            match tournament.scheduling_mode {
                // Generation moves the tournament to Active itself
                SchedulingMode::Random => {
                    self.generate_fixtures_locked(tournament_id).await?;
                }
                // Manual knockouts need explicit pairings; manual leagues
                // and groups schedule from the stored assignments.
                SchedulingMode::Manual => {
                    if tournament.format.has_knockout() && !tournament.format.has_groups() {
                        return Err(SchedulingError::InvalidState(
                            "manual knockout pairings have not been created".to_string(),
                        ));
                    }
                    let generated = if tournament.format.has_groups() {
                        let assigned = assigned_groups_of(&tournament, &registrations)?;
                        groups::schedule(
                            tournament_id,
                            &assigned,
                            tournament.leg_type,
                            tournament.opening_pair(),
                        )?
                    } else {
                        round_robin::schedule(
                            tournament_id,
                            &teams,
                            tournament.leg_type,
                            tournament.opening_pair(),
                        )?
                    };
                    self.commit_generated(tournament, generated).await?;
                }
            }
            log::info!("Tournament {tournament_id} started");
            return Ok(());
        }

        tournament.change_status(TournamentStatus::Active)?;
        self.tournaments.update_tournament(&tournament).await?;
        self.notifier
            .notify(UpdateEvent::TournamentUpdated { tournament })
            .await;
        log::info!("Tournament {tournament_id} started");
        Ok(())
    }

    async fn reset_schedule_locked(&self, tournament_id: TournamentId) -> SchedulingResult<()> {
        let mut tournament = self.load_tournament(tournament_id).await?;
        if matches!(
            tournament.status,
            TournamentStatus::Active | TournamentStatus::Completed
        ) {
            return Err(SchedulingError::InvalidState(format!(
                "cannot reset the schedule while {}",
                tournament.status
            )));
        }

        self.matches.delete_matches_for(tournament_id).await?;

        let mut registrations = self.registrations.registrations_for(tournament_id).await?;
        for reg in registrations
            .iter_mut()
            .filter(|r| r.group_id.is_some() || r.is_qualified_for_knockout)
        {
            reg.group_id = None;
            reg.is_qualified_for_knockout = false;
            reg.updated_at = Utc::now();
            self.registrations.update_registration(reg).await?;
        }

        tournament.clear_opening_teams();
        if tournament.status == TournamentStatus::WaitingForOpeningMatchSelection {
            tournament.change_status(TournamentStatus::RegistrationClosed)?;
        }
        self.tournaments.update_tournament(&tournament).await?;

        self.invalidate_standings(tournament_id).await;
        self.notifier
            .notify(UpdateEvent::TournamentUpdated { tournament })
            .await;
        log::info!("Schedule reset for tournament {tournament_id}");
        Ok(())
    }

    async fn promote_waiting_team_locked(
        &self,
        tournament_id: TournamentId,
        registration_id: Uuid,
    ) -> SchedulingResult<()> {
        let mut tournament = self.load_tournament(tournament_id).await?;
        let mut registration = self
            .registrations
            .get_registration(registration_id)
            .await?
            .filter(|r| r.tournament_id == tournament_id)
            .ok_or(SchedulingError::RegistrationNotFound(registration_id))?;

        if registration.status != RegistrationStatus::WaitingList {
            return Err(SchedulingError::InvalidState(format!(
                "registration is {}, not waiting-listed",
                registration.status
            )));
        }
        if !tournament.has_capacity() {
            return Err(SchedulingError::InvalidState(
                "tournament is at capacity".to_string(),
            ));
        }

        registration.status = RegistrationStatus::PendingPayment;
        registration.updated_at = Utc::now();
        self.registrations.update_registration(&registration).await?;

        tournament.current_teams += 1;
        tournament.updated_at = Utc::now();
        self.tournaments.update_tournament(&tournament).await?;

        self.notifier
            .notify(UpdateEvent::TournamentUpdated { tournament })
            .await;
        log::info!(
            "Promoted registration {registration_id} off the waiting list for tournament {tournament_id}"
        );
        Ok(())
    }

    async fn confirm_qualifiers_locked(
        &self,
        tournament_id: TournamentId,
        qualifiers: &[TeamId],
    ) -> SchedulingResult<Vec<Match>> {
        let mut tournament = self.load_tournament(tournament_id).await?;
        if tournament.status != TournamentStatus::ManualQualificationPending {
            return Err(SchedulingError::InvalidState(format!(
                "qualifier confirmation requires pending qualification, tournament is {}",
                tournament.status
            )));
        }

        let mut registrations = self.registrations.registrations_for(tournament_id).await?;
        validate_qualifiers(&tournament, &registrations, qualifiers)?;

        for reg in registrations
            .iter_mut()
            .filter(|r| r.status == RegistrationStatus::Approved && r.group_id.is_some())
        {
            if qualifiers.contains(&reg.team_id) {
                reg.is_qualified_for_knockout = true;
            } else {
                reg.status = RegistrationStatus::Eliminated;
            }
            reg.updated_at = Utc::now();
            self.registrations.update_registration(reg).await?;
        }

        let existing = self.matches.matches_for(tournament_id).await?;
        let next_round = existing.iter().map(|m| m.round_number).max().unwrap_or(0) + 1;
        let generated = knockout::next_round(
            tournament_id,
            qualifiers,
            next_round,
            knockout_two_legged(&tournament),
        )?;
        self.matches.insert_matches(&generated).await?;

        tournament.change_status(TournamentStatus::QualificationConfirmed)?;
        tournament.change_status(TournamentStatus::Active)?;
        self.tournaments.update_tournament(&tournament).await?;

        self.invalidate_standings(tournament_id).await;
        self.notifier
            .notify(UpdateEvent::MatchesGenerated {
                tournament_id,
                matches: generated.clone(),
            })
            .await;
        self.notifier
            .notify(UpdateEvent::TournamentUpdated {
                tournament: tournament.clone(),
            })
            .await;

        log::info!(
            "Confirmed {} qualifiers for tournament {tournament_id}",
            qualifiers.len()
        );
        Ok(generated)
    }

    async fn record_match_result_locked(
        &self,
        tournament_id: TournamentId,
        match_id: MatchId,
        score: Score,
        status: MatchStatus,
        correction: bool,
    ) -> SchedulingResult<()> {
        let mut m = self.load_match(tournament_id, match_id).await?;
        if m.is_finished() && !correction {
            return Err(SchedulingError::MatchAlreadyFinished(match_id));
        }

        m.score = Some(score);
        m.status = status;
        m.updated_at = Utc::now();
        self.matches.update_match(&m).await?;

        self.invalidate_standings(tournament_id).await;
        self.notifier
            .notify(UpdateEvent::MatchUpdated {
                tournament_id,
                match_snapshot: m.clone(),
            })
            .await;

        if m.is_finished() {
            self.reconcile(tournament_id).await?;
        }
        Ok(())
    }

    async fn forfeit_match_locked(
        &self,
        tournament_id: TournamentId,
        match_id: MatchId,
        winner: TeamId,
    ) -> SchedulingResult<()> {
        let mut m = self.load_match(tournament_id, match_id).await?;
        if !m.involves(winner) {
            return Err(SchedulingError::TeamNotInMatch(winner));
        }
        if m.is_finished() {
            return Err(SchedulingError::MatchAlreadyFinished(match_id));
        }

        m.forfeited(winner);
        self.matches.update_match(&m).await?;

        self.invalidate_standings(tournament_id).await;
        self.notifier
            .notify(UpdateEvent::MatchUpdated {
                tournament_id,
                match_snapshot: m.clone(),
            })
            .await;
        log::info!("Match {match_id} forfeited in favour of team {winner}");

        self.reconcile(tournament_id).await
    }

    async fn add_match_event_locked(
        &self,
        tournament_id: TournamentId,
        match_id: MatchId,
        team_id: TeamId,
        kind: MatchEventKind,
        minute: Option<u32>,
    ) -> SchedulingResult<MatchEvent> {
        let mut m = self.load_match(tournament_id, match_id).await?;
        if !m.involves(team_id) {
            return Err(SchedulingError::TeamNotInMatch(team_id));
        }
        if m.is_finished() {
            return Err(SchedulingError::MatchAlreadyFinished(match_id));
        }

        let event = MatchEvent::new(team_id, kind, minute);
        m.events.push(event.clone());
        m.updated_at = Utc::now();
        self.matches.update_match(&m).await?;

        self.invalidate_standings(tournament_id).await;
        self.notifier
            .notify(UpdateEvent::MatchUpdated {
                tournament_id,
                match_snapshot: m,
            })
            .await;
        Ok(event)
    }

    /// Run the lifecycle reconciler over current results and apply whatever
    /// it decides.
    async fn reconcile(&self, tournament_id: TournamentId) -> SchedulingResult<()> {
        let mut tournament = self.load_tournament(tournament_id).await?;
        let matches = self.matches.matches_for(tournament_id).await?;
        let mut registrations = self.registrations.registrations_for(tournament_id).await?;

        match lifecycle::decide(&tournament, &matches, &registrations) {
            ReconcileAction::Nothing => Ok(()),

            ReconcileAction::EnterManualQualification => {
                tournament.change_status(TournamentStatus::ManualQualificationPending)?;
                self.tournaments.update_tournament(&tournament).await?;
                self.notifier
                    .notify(UpdateEvent::TournamentUpdated { tournament })
                    .await;
                log::info!(
                    "Tournament {tournament_id} awaits manual qualifier confirmation"
                );
                Ok(())
            }

            ReconcileAction::AdvanceToKnockout { qualifiers } => {
                for reg in registrations
                    .iter_mut()
                    .filter(|r| r.status == RegistrationStatus::Approved && r.group_id.is_some())
                {
                    if qualifiers.contains(&reg.team_id) {
                        reg.is_qualified_for_knockout = true;
                    } else {
                        reg.status = RegistrationStatus::Eliminated;
                    }
                    reg.updated_at = Utc::now();
                    self.registrations.update_registration(reg).await?;
                }

                let next_round =
                    matches.iter().map(|m| m.round_number).max().unwrap_or(0) + 1;
                let generated = knockout::next_round(
                    tournament_id,
                    &qualifiers,
                    next_round,
                    knockout_two_legged(&tournament),
                )?;
                self.matches.insert_matches(&generated).await?;

                self.notifier
                    .notify(UpdateEvent::MatchesGenerated {
                        tournament_id,
                        matches: generated,
                    })
                    .await;
                log::info!(
                    "Tournament {tournament_id} advanced to the knockout phase"
                );
                Ok(())
            }

            ReconcileAction::NextKnockoutRound {
                round_number,
                winners,
            } => {
                for reg in registrations
                    .iter_mut()
                    .filter(|r| r.status == RegistrationStatus::Approved)
                {
                    let played_knockout = matches
                        .iter()
                        .any(|m| m.group_id.is_none() && m.involves(reg.team_id));
                    if played_knockout && !winners.contains(&reg.team_id) {
                        reg.status = RegistrationStatus::Eliminated;
                        reg.updated_at = Utc::now();
                        self.registrations.update_registration(reg).await?;
                    }
                }

                let generated = knockout::next_round(
                    tournament_id,
                    &winners,
                    round_number,
                    knockout_two_legged(&tournament),
                )?;
                self.matches.insert_matches(&generated).await?;

                self.notifier
                    .notify(UpdateEvent::MatchesGenerated {
                        tournament_id,
                        matches: generated,
                    })
                    .await;
                log::info!(
                    "Generated knockout round {round_number} for tournament {tournament_id}"
                );
                Ok(())
            }

            ReconcileAction::Complete { winner } => {
                tournament.winner_team_id = Some(winner);
                tournament.change_status(TournamentStatus::Completed)?;
                self.tournaments.update_tournament(&tournament).await?;
                self.notifier
                    .notify(UpdateEvent::TournamentUpdated { tournament })
                    .await;
                log::info!("Tournament {tournament_id} completed, winner {winner}");
                Ok(())
            }
        }
    }

    // ---- shared plumbing ----

    async fn acquire(&self, tournament_id: TournamentId) -> SchedulingResult<String> {
        let key = format!("tournament:{tournament_id}");
        if self.lock.acquire(&key, self.lock_timeout).await {
            Ok(key)
        } else {
            log::warn!("Lock acquisition timed out for tournament {tournament_id}");
            Err(SchedulingError::LockTimeout(tournament_id))
        }
    }

    async fn load_tournament(&self, tournament_id: TournamentId) -> SchedulingResult<Tournament> {
        self.tournaments
            .get_tournament(tournament_id)
            .await?
            .ok_or(SchedulingError::TournamentNotFound(tournament_id))
    }

    async fn load_match(
        &self,
        tournament_id: TournamentId,
        match_id: MatchId,
    ) -> SchedulingResult<Match> {
        self.matches
            .get_match(match_id)
            .await?
            .filter(|m| m.tournament_id == tournament_id)
            .ok_or(SchedulingError::MatchNotFound(match_id))
    }

    /// Best effort; a stale entry expires within the TTL anyway
    async fn invalidate_standings(&self, tournament_id: TournamentId) {
        self.cache
            .invalidate(&format!("standings:{tournament_id}"))
            .await;
    }
}

fn standings_key(tournament_id: TournamentId, group: Option<u32>) -> String {
    match group {
        Some(group) => format!("standings:{tournament_id}:group:{group}"),
        None => format!("standings:{tournament_id}"),
    }
}

fn approved_team_ids(registrations: &[TeamRegistration]) -> Vec<TeamId> {
    registrations
        .iter()
        .filter(|r| r.status == RegistrationStatus::Approved)
        .map(|r| r.team_id)
        .collect()
}

/// Group membership lists rebuilt from stored registration assignments
fn assigned_groups_of(
    tournament: &Tournament,
    registrations: &[TeamRegistration],
) -> SchedulingResult<Vec<Vec<TeamId>>> {
    let mut assigned = vec![Vec::new(); tournament.number_of_groups as usize];
    for reg in registrations
        .iter()
        .filter(|r| r.status == RegistrationStatus::Approved)
    {
        match reg.group_id {
            Some(group) if (group as usize) < assigned.len() => {
                assigned[group as usize].push(reg.team_id);
            }
            _ => {
                return Err(SchedulingError::InvalidState(format!(
                    "team {} has no valid group assignment",
                    reg.team_id
                )));
            }
        }
    }
    Ok(assigned)
}

fn require_pre_draw_status(tournament: &Tournament) -> SchedulingResult<()> {
    if matches!(
        tournament.status,
        TournamentStatus::RegistrationClosed | TournamentStatus::WaitingForOpeningMatchSelection
    ) {
        Ok(())
    } else {
        Err(SchedulingError::InvalidState(format!(
            "operation requires a closed, unscheduled tournament, got {}",
            tournament.status
        )))
    }
}

fn knockout_two_legged(tournament: &Tournament) -> bool {
    match tournament.effective_mode() {
        EffectiveMode::Knockout(legs) => legs == LegType::HomeAndAway,
        EffectiveMode::GroupsKnockout { knockout_legs, .. } => {
            knockout_legs == LegType::HomeAndAway
        }
        EffectiveMode::League(_) => false,
    }
}

fn validate_qualifiers(
    tournament: &Tournament,
    registrations: &[TeamRegistration],
    qualifiers: &[TeamId],
) -> SchedulingResult<()> {
    let expected =
        (tournament.number_of_groups * tournament.qualified_teams_per_group) as usize;
    if qualifiers.len() != expected {
        return Err(SchedulingError::InvalidQualifiers(format!(
            "expected {expected} qualifiers, got {}",
            qualifiers.len()
        )));
    }

    let mut per_group = vec![0u32; tournament.number_of_groups as usize];
    for team in qualifiers {
        let Some(reg) = registrations
            .iter()
            .find(|r| r.team_id == *team && r.status == RegistrationStatus::Approved)
        else {
            return Err(SchedulingError::InvalidQualifiers(format!(
                "team {team} has no approved registration"
            )));
        };
        let Some(group) = reg.group_id else {
            return Err(SchedulingError::InvalidQualifiers(format!(
                "team {team} has no group assignment"
            )));
        };
        if qualifiers.iter().filter(|t| **t == *team).count() > 1 {
            return Err(SchedulingError::InvalidQualifiers(format!(
                "team {team} listed more than once"
            )));
        }
        per_group[group as usize] += 1;
    }

    for (group, &count) in per_group.iter().enumerate() {
        if count != tournament.qualified_teams_per_group {
            return Err(SchedulingError::InvalidQualifiers(format!(
                "group {group} supplies {count} qualifiers, expected {}",
                tournament.qualified_teams_per_group
            )));
        }
    }
    Ok(())
}
