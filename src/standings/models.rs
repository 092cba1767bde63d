//! Standings data models.

use crate::tournament::TeamId;
use serde::{Deserialize, Serialize};

/// One row of the standings table. Derived data: always recomputed from
/// match results and registrations, never mutated independently.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandingsRow {
    pub team_id: TeamId,
    pub team_name: String,
    pub group_id: Option<u32>,
    pub played: u32,
    pub won: u32,
    pub drawn: u32,
    pub lost: u32,
    pub goals_for: u32,
    pub goals_against: u32,
    pub points: u32,
    pub yellow_cards: u32,
    pub red_cards: u32,
    /// 1-based position after the tie-break cascade
    pub rank: u32,
    /// Up to the five most recent results, oldest first, e.g. "WWDLW"
    pub form: String,
}

impl StandingsRow {
    pub fn goal_difference(&self) -> i64 {
        i64::from(self.goals_for) - i64::from(self.goals_against)
    }
}
