//! PostgreSQL implementations of the repository traits.
//!
//! Enum-like fields are stored as their string form and parsed back through
//! `FromStr`; a value that fails to parse surfaces as
//! [`StoreError::Corrupt`] rather than a panic. Match events are stored as a
//! JSON text column.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use super::errors::{StoreError, StoreResult};
use super::repository::{MatchStore, RegistrationStore, TournamentStore};
use crate::matches::{Match, MatchId, Score};
use crate::registration::TeamRegistration;
use crate::tournament::{TeamId, Tournament, TournamentId, TournamentStatus};

/// Default PostgreSQL implementation of `TournamentStore`
pub struct PgTournamentStore {
    pool: PgPool,
}

impl PgTournamentStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Default PostgreSQL implementation of `RegistrationStore`
pub struct PgRegistrationStore {
    pool: PgPool,
}

impl PgRegistrationStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Default PostgreSQL implementation of `MatchStore`
pub struct PgMatchStore {
    pool: PgPool,
}

impl PgMatchStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn tournament_from_row(row: &PgRow) -> StoreResult<Tournament> {
    Ok(Tournament {
        id: row.get("id"),
        name: row.get("name"),
        status: row
            .get::<String, _>("status")
            .parse()
            .map_err(StoreError::Corrupt)?,
        format: row
            .get::<String, _>("format")
            .parse()
            .map_err(StoreError::Corrupt)?,
        leg_type: row
            .get::<String, _>("leg_type")
            .parse()
            .map_err(StoreError::Corrupt)?,
        scheduling_mode: row
            .get::<String, _>("scheduling_mode")
            .parse()
            .map_err(StoreError::Corrupt)?,
        number_of_groups: row.get::<i32, _>("number_of_groups") as u32,
        qualified_teams_per_group: row.get::<i32, _>("qualified_teams_per_group") as u32,
        min_teams: row.get::<i32, _>("min_teams") as u32,
        max_teams: row.get::<i32, _>("max_teams") as u32,
        current_teams: row.get::<i32, _>("current_teams") as u32,
        opening_team_a: row.get("opening_team_a"),
        opening_team_b: row.get("opening_team_b"),
        opening_match_id: row.get("opening_match_id"),
        winner_team_id: row.get("winner_team_id"),
        registration_deadline: row.get("registration_deadline"),
        start_date: row.get("start_date"),
        end_date: row.get("end_date"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}

#[async_trait]
impl TournamentStore for PgTournamentStore {
    async fn insert_tournament(&self, tournament: &Tournament) -> StoreResult<()> {
        sqlx::query(
            "INSERT INTO tournaments (
                id, name, status, format, leg_type, scheduling_mode,
                number_of_groups, qualified_teams_per_group, min_teams, max_teams,
                current_teams, opening_team_a, opening_team_b, opening_match_id,
                winner_team_id, registration_deadline, start_date, end_date,
                created_at, updated_at
             ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10,
                       $11, $12, $13, $14, $15, $16, $17, $18, $19, $20)",
        )
        .bind(tournament.id)
        .bind(&tournament.name)
        .bind(tournament.status.as_str())
        .bind(tournament.format.as_str())
        .bind(tournament.leg_type.as_str())
        .bind(tournament.scheduling_mode.as_str())
        .bind(tournament.number_of_groups as i32)
        .bind(tournament.qualified_teams_per_group as i32)
        .bind(tournament.min_teams as i32)
        .bind(tournament.max_teams as i32)
        .bind(tournament.current_teams as i32)
        .bind(tournament.opening_team_a)
        .bind(tournament.opening_team_b)
        .bind(tournament.opening_match_id)
        .bind(tournament.winner_team_id)
        .bind(tournament.registration_deadline)
        .bind(tournament.start_date)
        .bind(tournament.end_date)
        .bind(tournament.created_at)
        .bind(tournament.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get_tournament(&self, id: TournamentId) -> StoreResult<Option<Tournament>> {
        let row = sqlx::query("SELECT * FROM tournaments WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(tournament_from_row).transpose()
    }

    async fn update_tournament(&self, tournament: &Tournament) -> StoreResult<()> {
        let result = sqlx::query(
            "UPDATE tournaments SET
                name = $2, status = $3, current_teams = $4,
                opening_team_a = $5, opening_team_b = $6, opening_match_id = $7,
                winner_team_id = $8, registration_deadline = $9,
                start_date = $10, end_date = $11, updated_at = $12
             WHERE id = $1",
        )
        .bind(tournament.id)
        .bind(&tournament.name)
        .bind(tournament.status.as_str())
        .bind(tournament.current_teams as i32)
        .bind(tournament.opening_team_a)
        .bind(tournament.opening_team_b)
        .bind(tournament.opening_match_id)
        .bind(tournament.winner_team_id)
        .bind(tournament.registration_deadline)
        .bind(tournament.start_date)
        .bind(tournament.end_date)
        .bind(tournament.updated_at)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::TournamentNotFound(tournament.id));
        }
        Ok(())
    }

    async fn list_tournaments(
        &self,
        status: Option<TournamentStatus>,
    ) -> StoreResult<Vec<Tournament>> {
        let rows = match status {
            Some(status) => {
                sqlx::query(
                    "SELECT * FROM tournaments WHERE status = $1 ORDER BY created_at DESC",
                )
                .bind(status.as_str())
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query("SELECT * FROM tournaments ORDER BY created_at DESC")
                    .fetch_all(&self.pool)
                    .await?
            }
        };

        rows.iter().map(tournament_from_row).collect()
    }
}

fn registration_from_row(row: &PgRow) -> StoreResult<TeamRegistration> {
    Ok(TeamRegistration {
        id: row.get("id"),
        tournament_id: row.get("tournament_id"),
        team_id: row.get("team_id"),
        team_name: row.get("team_name"),
        status: row
            .get::<String, _>("status")
            .parse()
            .map_err(StoreError::Corrupt)?,
        group_id: row.get::<Option<i32>, _>("group_id").map(|g| g as u32),
        is_qualified_for_knockout: row.get("is_qualified_for_knockout"),
        registered_at: row.get("registered_at"),
        updated_at: row.get("updated_at"),
    })
}

#[async_trait]
impl RegistrationStore for PgRegistrationStore {
    async fn insert_registration(&self, registration: &TeamRegistration) -> StoreResult<()> {
        sqlx::query(
            "INSERT INTO team_registrations (
                id, tournament_id, team_id, team_name, status, group_id,
                is_qualified_for_knockout, registered_at, updated_at
             ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
        )
        .bind(registration.id)
        .bind(registration.tournament_id)
        .bind(registration.team_id)
        .bind(&registration.team_name)
        .bind(registration.status.as_str())
        .bind(registration.group_id.map(|g| g as i32))
        .bind(registration.is_qualified_for_knockout)
        .bind(registration.registered_at)
        .bind(registration.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get_registration(&self, id: Uuid) -> StoreResult<Option<TeamRegistration>> {
        let row = sqlx::query("SELECT * FROM team_registrations WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(registration_from_row).transpose()
    }

    async fn update_registration(&self, registration: &TeamRegistration) -> StoreResult<()> {
        let result = sqlx::query(
            "UPDATE team_registrations SET
                status = $2, group_id = $3, is_qualified_for_knockout = $4,
                updated_at = $5
             WHERE id = $1",
        )
        .bind(registration.id)
        .bind(registration.status.as_str())
        .bind(registration.group_id.map(|g| g as i32))
        .bind(registration.is_qualified_for_knockout)
        .bind(registration.updated_at)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::RegistrationNotFound(registration.id));
        }
        Ok(())
    }

    async fn registrations_for(
        &self,
        tournament_id: TournamentId,
    ) -> StoreResult<Vec<TeamRegistration>> {
        let rows = sqlx::query(
            "SELECT * FROM team_registrations
             WHERE tournament_id = $1
             ORDER BY registered_at",
        )
        .bind(tournament_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(registration_from_row).collect()
    }
}

fn match_from_row(row: &PgRow) -> StoreResult<Match> {
    let home_score: Option<i32> = row.get("home_score");
    let away_score: Option<i32> = row.get("away_score");
    let score = match (home_score, away_score) {
        (Some(home), Some(away)) => Some(Score::new(home as u32, away as u32)),
        _ => None,
    };

    let events = serde_json::from_str(row.get::<&str, _>("events"))
        .map_err(|e| StoreError::Corrupt(format!("match events: {e}")))?;

    Ok(Match {
        id: row.get("id"),
        tournament_id: row.get("tournament_id"),
        home_team_id: row.get::<TeamId, _>("home_team_id"),
        away_team_id: row.get::<TeamId, _>("away_team_id"),
        score,
        status: row
            .get::<String, _>("status")
            .parse()
            .map_err(StoreError::Corrupt)?,
        group_id: row.get::<Option<i32>, _>("group_id").map(|g| g as u32),
        round_number: row.get::<i32, _>("round_number") as u32,
        ordinal: row.get::<i32, _>("ordinal") as u32,
        stage_name: row.get("stage_name"),
        is_opening_match: row.get("is_opening_match"),
        forfeit: row.get("forfeit"),
        events,
        kickoff: row.get::<Option<DateTime<Utc>>, _>("kickoff"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}

#[async_trait]
impl MatchStore for PgMatchStore {
    async fn insert_matches(&self, matches: &[Match]) -> StoreResult<()> {
        let mut tx = self.pool.begin().await?;
        for m in matches {
            let events = serde_json::to_string(&m.events)
                .map_err(|e| StoreError::Corrupt(format!("match events: {e}")))?;
            sqlx::query(
                "INSERT INTO matches (
                    id, tournament_id, home_team_id, away_team_id,
                    home_score, away_score, status, group_id, round_number,
                    ordinal, stage_name, is_opening_match, forfeit, events,
                    kickoff, created_at, updated_at
                 ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10,
                           $11, $12, $13, $14, $15, $16, $17)",
            )
            .bind(m.id)
            .bind(m.tournament_id)
            .bind(m.home_team_id)
            .bind(m.away_team_id)
            .bind(m.score.map(|s| s.home as i32))
            .bind(m.score.map(|s| s.away as i32))
            .bind(m.status.as_str())
            .bind(m.group_id.map(|g| g as i32))
            .bind(m.round_number as i32)
            .bind(m.ordinal as i32)
            .bind(&m.stage_name)
            .bind(m.is_opening_match)
            .bind(m.forfeit)
            .bind(events)
            .bind(m.kickoff)
            .bind(m.created_at)
            .bind(m.updated_at)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;
        Ok(())
    }

    async fn get_match(&self, id: MatchId) -> StoreResult<Option<Match>> {
        let row = sqlx::query("SELECT * FROM matches WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(match_from_row).transpose()
    }

    async fn update_match(&self, m: &Match) -> StoreResult<()> {
        let events = serde_json::to_string(&m.events)
            .map_err(|e| StoreError::Corrupt(format!("match events: {e}")))?;
        let result = sqlx::query(
            "UPDATE matches SET
                home_score = $2, away_score = $3, status = $4, forfeit = $5,
                events = $6, kickoff = $7, updated_at = $8
             WHERE id = $1",
        )
        .bind(m.id)
        .bind(m.score.map(|s| s.home as i32))
        .bind(m.score.map(|s| s.away as i32))
        .bind(m.status.as_str())
        .bind(m.forfeit)
        .bind(events)
        .bind(m.kickoff)
        .bind(m.updated_at)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::MatchNotFound(m.id));
        }
        Ok(())
    }

    async fn matches_for(&self, tournament_id: TournamentId) -> StoreResult<Vec<Match>> {
        let rows = sqlx::query(
            "SELECT * FROM matches
             WHERE tournament_id = $1
             ORDER BY round_number, ordinal, created_at",
        )
        .bind(tournament_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(match_from_row).collect()
    }

    async fn delete_matches_for(&self, tournament_id: TournamentId) -> StoreResult<()> {
        sqlx::query("DELETE FROM matches WHERE tournament_id = $1")
            .bind(tournament_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
