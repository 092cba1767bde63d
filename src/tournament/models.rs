//! Tournament data models and the status state machine.

use super::errors::{TournamentError, TournamentResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Tournament ID type
pub type TournamentId = Uuid;

/// Team ID type
pub type TeamId = Uuid;

/// Tournament lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TournamentStatus {
    /// Created, not yet open for registration
    Draft,
    /// Teams may register
    RegistrationOpen,
    /// Registration closed, schedule not yet generated
    RegistrationClosed,
    /// An opening match must be chosen before fixtures can be generated
    WaitingForOpeningMatchSelection,
    /// Matches exist and are being played
    Active,
    /// Group stage done, organizer must confirm knockout qualifiers
    ManualQualificationPending,
    /// Qualifiers confirmed, next round about to start
    QualificationConfirmed,
    /// Winner decided
    Completed,
    /// Aborted before completion
    Cancelled,
}

impl TournamentStatus {
    /// The explicit transition adjacency table. Any edge not listed here is
    /// illegal and rejected by [`Tournament::change_status`].
    pub fn can_transition_to(self, target: TournamentStatus) -> bool {
        use TournamentStatus::*;
        match (self, target) {
            (Draft, RegistrationOpen) => true,
            (RegistrationOpen, RegistrationClosed) => true,
            (RegistrationClosed, WaitingForOpeningMatchSelection) => true,
            (RegistrationClosed, Active) => true,
            (WaitingForOpeningMatchSelection, RegistrationClosed) => true,
            (WaitingForOpeningMatchSelection, Active) => true,
            (Active, ManualQualificationPending) => true,
            (Active, Completed) => true,
            (ManualQualificationPending, QualificationConfirmed) => true,
            (QualificationConfirmed, Active) => true,
            // Cancellation is allowed from any state that is not terminal.
            (Completed | Cancelled, Cancelled) => false,
            (_, Cancelled) => true,
            _ => false,
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, TournamentStatus::Completed | TournamentStatus::Cancelled)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TournamentStatus::Draft => "draft",
            TournamentStatus::RegistrationOpen => "registration_open",
            TournamentStatus::RegistrationClosed => "registration_closed",
            TournamentStatus::WaitingForOpeningMatchSelection => "waiting_for_opening_match",
            TournamentStatus::Active => "active",
            TournamentStatus::ManualQualificationPending => "manual_qualification_pending",
            TournamentStatus::QualificationConfirmed => "qualification_confirmed",
            TournamentStatus::Completed => "completed",
            TournamentStatus::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for TournamentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for TournamentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "draft" => Ok(TournamentStatus::Draft),
            "registration_open" => Ok(TournamentStatus::RegistrationOpen),
            "registration_closed" => Ok(TournamentStatus::RegistrationClosed),
            "waiting_for_opening_match" => Ok(TournamentStatus::WaitingForOpeningMatchSelection),
            "active" => Ok(TournamentStatus::Active),
            "manual_qualification_pending" => Ok(TournamentStatus::ManualQualificationPending),
            "qualification_confirmed" => Ok(TournamentStatus::QualificationConfirmed),
            "completed" => Ok(TournamentStatus::Completed),
            "cancelled" => Ok(TournamentStatus::Cancelled),
            _ => Err(format!("Unknown tournament status: {s}")),
        }
    }
}

/// Competition format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TournamentFormat {
    /// Everybody plays everybody, one table
    RoundRobin,
    /// Group stage followed by a single-leg knockout phase
    GroupsThenKnockout,
    /// Straight knockout bracket
    KnockoutOnly,
    /// Group stage followed by two-legged knockout ties
    GroupsWithHomeAwayKnockout,
}

impl TournamentFormat {
    pub fn has_groups(self) -> bool {
        matches!(
            self,
            TournamentFormat::GroupsThenKnockout | TournamentFormat::GroupsWithHomeAwayKnockout
        )
    }

    pub fn has_knockout(self) -> bool {
        !matches!(self, TournamentFormat::RoundRobin)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TournamentFormat::RoundRobin => "round_robin",
            TournamentFormat::GroupsThenKnockout => "groups_then_knockout",
            TournamentFormat::KnockoutOnly => "knockout_only",
            TournamentFormat::GroupsWithHomeAwayKnockout => "groups_with_home_away_knockout",
        }
    }
}

impl FromStr for TournamentFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "round_robin" => Ok(TournamentFormat::RoundRobin),
            "groups_then_knockout" => Ok(TournamentFormat::GroupsThenKnockout),
            "knockout_only" => Ok(TournamentFormat::KnockoutOnly),
            "groups_with_home_away_knockout" => Ok(TournamentFormat::GroupsWithHomeAwayKnockout),
            _ => Err(format!("Unknown tournament format: {s}")),
        }
    }
}

/// Whether each pairing is played once or home and away
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LegType {
    SingleLeg,
    HomeAndAway,
}

impl LegType {
    pub fn as_str(&self) -> &'static str {
        match self {
            LegType::SingleLeg => "single_leg",
            LegType::HomeAndAway => "home_and_away",
        }
    }
}

impl FromStr for LegType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "single_leg" => Ok(LegType::SingleLeg),
            "home_and_away" => Ok(LegType::HomeAndAway),
            _ => Err(format!("Unknown leg type: {s}")),
        }
    }
}

/// Who produces the schedule
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SchedulingMode {
    /// The system draws fixtures and groups at random
    Random,
    /// The organizer supplies group assignments or pairings
    Manual,
}

impl SchedulingMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            SchedulingMode::Random => "random",
            SchedulingMode::Manual => "manual",
        }
    }
}

impl FromStr for SchedulingMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "random" => Ok(SchedulingMode::Random),
            "manual" => Ok(SchedulingMode::Manual),
            _ => Err(format!("Unknown scheduling mode: {s}")),
        }
    }
}

/// Display-level mode derived from format + leg type. Decides which
/// validations apply, e.g. whether an opening match is mandatory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EffectiveMode {
    League(LegType),
    GroupsKnockout {
        group_legs: LegType,
        knockout_legs: LegType,
    },
    Knockout(LegType),
}

impl EffectiveMode {
    /// League tournaments pick their opening match before the draw; the
    /// other modes treat opening selection as optional.
    pub fn requires_opening_match(self) -> bool {
        matches!(self, EffectiveMode::League(_))
    }
}

/// Tournament configuration supplied at creation time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TournamentConfig {
    pub name: String,
    pub format: TournamentFormat,
    pub leg_type: LegType,
    pub scheduling_mode: SchedulingMode,
    /// Number of groups for group formats (ignored otherwise)
    pub number_of_groups: u32,
    /// Teams advancing to the knockout phase per group
    pub qualified_teams_per_group: u32,
    pub min_teams: u32,
    pub max_teams: u32,
    pub registration_deadline: Option<DateTime<Utc>>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
}

impl TournamentConfig {
    /// Validate structural rules that must hold before a tournament exists.
    ///
    /// Knockout capacity is checked here, at creation time, so fixture
    /// generation never meets a bracket that cannot be built.
    pub fn validate(&self) -> TournamentResult<()> {
        if self.min_teams > self.max_teams {
            return Err(TournamentError::TeamBoundsInvalid {
                min: self.min_teams,
                max: self.max_teams,
            });
        }

        match self.format {
            TournamentFormat::KnockoutOnly => {
                if self.max_teams < 2 || !self.max_teams.is_power_of_two() {
                    return Err(TournamentError::CapacityNotPowerOfTwo(self.max_teams));
                }
            }
            TournamentFormat::GroupsThenKnockout
            | TournamentFormat::GroupsWithHomeAwayKnockout => {
                if self.number_of_groups == 0 {
                    return Err(TournamentError::GroupConfigInvalid(
                        "number_of_groups must be at least 1".into(),
                    ));
                }
                if self.qualified_teams_per_group == 0 {
                    return Err(TournamentError::GroupConfigInvalid(
                        "qualified_teams_per_group must be at least 1".into(),
                    ));
                }
                let qualifiers = self.number_of_groups * self.qualified_teams_per_group;
                if qualifiers < 2 || !qualifiers.is_power_of_two() {
                    return Err(TournamentError::CapacityNotPowerOfTwo(qualifiers));
                }
            }
            TournamentFormat::RoundRobin => {}
        }

        Ok(())
    }
}

/// The tournament aggregate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tournament {
    pub id: TournamentId,
    pub name: String,
    pub status: TournamentStatus,
    pub format: TournamentFormat,
    pub leg_type: LegType,
    pub scheduling_mode: SchedulingMode,
    pub number_of_groups: u32,
    pub qualified_teams_per_group: u32,
    pub min_teams: u32,
    pub max_teams: u32,
    /// Teams currently counted against capacity (approved or pending payment)
    pub current_teams: u32,
    pub opening_team_a: Option<TeamId>,
    pub opening_team_b: Option<TeamId>,
    pub opening_match_id: Option<Uuid>,
    pub winner_team_id: Option<TeamId>,
    pub registration_deadline: Option<DateTime<Utc>>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Tournament {
    /// Create a tournament in Draft from a validated configuration
    pub fn create(config: TournamentConfig) -> TournamentResult<Self> {
        config.validate()?;

        let now = Utc::now();
        Ok(Self {
            id: Uuid::new_v4(),
            name: config.name,
            status: TournamentStatus::Draft,
            format: config.format,
            leg_type: config.leg_type,
            scheduling_mode: config.scheduling_mode,
            number_of_groups: config.number_of_groups,
            qualified_teams_per_group: config.qualified_teams_per_group,
            min_teams: config.min_teams,
            max_teams: config.max_teams,
            current_teams: 0,
            opening_team_a: None,
            opening_team_b: None,
            opening_match_id: None,
            winner_team_id: None,
            registration_deadline: config.registration_deadline,
            start_date: config.start_date,
            end_date: config.end_date,
            created_at: now,
            updated_at: now,
        })
    }

    /// The single status mutator. Rejects any edge not in the adjacency
    /// table; nothing is partially applied on failure.
    pub fn change_status(&mut self, target: TournamentStatus) -> TournamentResult<()> {
        if !self.status.can_transition_to(target) {
            return Err(TournamentError::InvalidTransition {
                from: self.status,
                to: target,
            });
        }
        self.status = target;
        self.updated_at = Utc::now();
        Ok(())
    }

    /// Select the opening pair. Only valid before any match exists and only
    /// for teams in the registered set. Overwrites a previous selection.
    pub fn set_opening_teams(
        &mut self,
        team_a: TeamId,
        team_b: TeamId,
        registered_team_ids: &[TeamId],
        matches_already_exist: bool,
    ) -> TournamentResult<()> {
        if matches_already_exist {
            return Err(TournamentError::OpeningTeamsLocked);
        }
        if team_a == team_b {
            return Err(TournamentError::OpeningTeamsIdentical);
        }
        for team in [team_a, team_b] {
            if !registered_team_ids.contains(&team) {
                return Err(TournamentError::OpeningTeamNotRegistered(team));
            }
        }

        self.opening_team_a = Some(team_a);
        self.opening_team_b = Some(team_b);
        self.updated_at = Utc::now();
        Ok(())
    }

    /// Reset the opening pair and the recorded opening match. Used by
    /// schedule reset.
    pub fn clear_opening_teams(&mut self) {
        self.opening_team_a = None;
        self.opening_team_b = None;
        self.opening_match_id = None;
        self.updated_at = Utc::now();
    }

    /// The selected opening pair, if both sides are set
    pub fn opening_pair(&self) -> Option<(TeamId, TeamId)> {
        match (self.opening_team_a, self.opening_team_b) {
            (Some(a), Some(b)) => Some((a, b)),
            _ => None,
        }
    }

    /// Derive the display-level mode from format + leg type
    pub fn effective_mode(&self) -> EffectiveMode {
        match self.format {
            TournamentFormat::RoundRobin => EffectiveMode::League(self.leg_type),
            TournamentFormat::KnockoutOnly => EffectiveMode::Knockout(self.leg_type),
            TournamentFormat::GroupsThenKnockout => EffectiveMode::GroupsKnockout {
                group_legs: self.leg_type,
                knockout_legs: LegType::SingleLeg,
            },
            TournamentFormat::GroupsWithHomeAwayKnockout => EffectiveMode::GroupsKnockout {
                group_legs: self.leg_type,
                knockout_legs: LegType::HomeAndAway,
            },
        }
    }

    /// Whether the registration window is still open at `now`
    pub fn is_registration_open(&self, now: DateTime<Utc>) -> bool {
        self.status == TournamentStatus::RegistrationOpen
            && self.registration_deadline.is_none_or(|deadline| now < deadline)
    }

    pub fn has_capacity(&self) -> bool {
        self.current_teams < self.max_teams
    }
}
