//! Match data models.

use crate::tournament::{TeamId, TournamentId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Match ID type
pub type MatchId = Uuid;

/// Score awarded to the non-offending side when a match is forfeited
pub const FORFEIT_SCORE: Score = Score { home: 3, away: 0 };

/// Match lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MatchStatus {
    Scheduled,
    Live,
    Halftime,
    Finished,
    Cancelled,
    Postponed,
    Rescheduled,
}

impl MatchStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchStatus::Scheduled => "scheduled",
            MatchStatus::Live => "live",
            MatchStatus::Halftime => "halftime",
            MatchStatus::Finished => "finished",
            MatchStatus::Cancelled => "cancelled",
            MatchStatus::Postponed => "postponed",
            MatchStatus::Rescheduled => "rescheduled",
        }
    }
}

impl fmt::Display for MatchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for MatchStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "scheduled" => Ok(MatchStatus::Scheduled),
            "live" => Ok(MatchStatus::Live),
            "halftime" => Ok(MatchStatus::Halftime),
            "finished" => Ok(MatchStatus::Finished),
            "cancelled" => Ok(MatchStatus::Cancelled),
            "postponed" => Ok(MatchStatus::Postponed),
            "rescheduled" => Ok(MatchStatus::Rescheduled),
            _ => Err(format!("Unknown match status: {s}")),
        }
    }
}

/// A match score, home goals vs away goals
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Score {
    pub home: u32,
    pub away: u32,
}

impl Score {
    pub fn new(home: u32, away: u32) -> Self {
        Self { home, away }
    }

    pub fn reversed(self) -> Self {
        Self {
            home: self.away,
            away: self.home,
        }
    }
}

impl fmt::Display for Score {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.home, self.away)
    }
}

/// Kind of in-match event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MatchEventKind {
    Goal,
    YellowCard,
    RedCard,
}

/// An in-match event attributed to one team
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchEvent {
    pub id: Uuid,
    pub team_id: TeamId,
    pub kind: MatchEventKind,
    pub minute: Option<u32>,
}

impl MatchEvent {
    pub fn new(team_id: TeamId, kind: MatchEventKind, minute: Option<u32>) -> Self {
        Self {
            id: Uuid::new_v4(),
            team_id,
            kind,
            minute,
        }
    }
}

/// One fixture between two teams.
///
/// `round_number` and `ordinal` (the match's slot within its round) together
/// give every match a stable position in the schedule; knockout winner
/// pairing and the standings form string both rely on that ordering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Match {
    pub id: MatchId,
    pub tournament_id: TournamentId,
    pub home_team_id: TeamId,
    pub away_team_id: TeamId,
    pub score: Option<Score>,
    pub status: MatchStatus,
    pub group_id: Option<u32>,
    pub round_number: u32,
    pub ordinal: u32,
    pub stage_name: Option<String>,
    pub is_opening_match: bool,
    pub forfeit: bool,
    pub events: Vec<MatchEvent>,
    pub kickoff: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Match {
    pub fn new(
        tournament_id: TournamentId,
        home_team_id: TeamId,
        away_team_id: TeamId,
        round_number: u32,
        ordinal: u32,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            tournament_id,
            home_team_id,
            away_team_id,
            score: None,
            status: MatchStatus::Scheduled,
            group_id: None,
            round_number,
            ordinal,
            stage_name: None,
            is_opening_match: false,
            forfeit: false,
            events: Vec::new(),
            kickoff: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_finished(&self) -> bool {
        self.status == MatchStatus::Finished
    }

    pub fn involves(&self, team: TeamId) -> bool {
        self.home_team_id == team || self.away_team_id == team
    }

    /// Winner by score, `None` for a draw or an unfinished match
    pub fn winner(&self) -> Option<TeamId> {
        if !self.is_finished() {
            return None;
        }
        let score = self.score?;
        match score.home.cmp(&score.away) {
            std::cmp::Ordering::Greater => Some(self.home_team_id),
            std::cmp::Ordering::Less => Some(self.away_team_id),
            std::cmp::Ordering::Equal => None,
        }
    }

    /// Award the match to `winner` by the fixed forfeit score. Counts exactly
    /// like a played match.
    pub fn forfeited(&mut self, winner: TeamId) {
        let score = if winner == self.home_team_id {
            FORFEIT_SCORE
        } else {
            FORFEIT_SCORE.reversed()
        };
        self.score = Some(score);
        self.status = MatchStatus::Finished;
        self.forfeit = true;
        self.updated_at = Utc::now();
    }

    /// The unordered pair of participants
    pub fn pair(&self) -> (TeamId, TeamId) {
        if self.home_team_id <= self.away_team_id {
            (self.home_team_id, self.away_team_id)
        } else {
            (self.away_team_id, self.home_team_id)
        }
    }
}
