//! Team registration data models.

use crate::tournament::{TeamId, TournamentId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Registration status for a team within one tournament
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RegistrationStatus {
    /// Payment receipt uploaded, awaiting organizer review
    PendingPaymentReview,
    /// Registered and counted for scheduling
    Approved,
    /// Registration rejected by the organizer
    Rejected,
    /// Team pulled out; already-played results stand
    Withdrawn,
    /// Knocked out of the competition; results stand
    Eliminated,
    /// Tournament was full at registration time
    WaitingList,
    /// Promoted off the waiting list, payment outstanding
    PendingPayment,
}

impl RegistrationStatus {
    /// Statuses counted against `Tournament::current_teams`
    pub fn counts_toward_capacity(self) -> bool {
        matches!(
            self,
            RegistrationStatus::Approved
                | RegistrationStatus::PendingPayment
                | RegistrationStatus::PendingPaymentReview
        )
    }

    /// Statuses that appear in the standings table. Withdrawn and eliminated
    /// teams keep their played results but stop accruing new ones.
    pub fn counts_for_standings(self) -> bool {
        matches!(
            self,
            RegistrationStatus::Approved
                | RegistrationStatus::Withdrawn
                | RegistrationStatus::Eliminated
        )
    }

    /// A payment decision is still outstanding
    pub fn is_payment_pending(self) -> bool {
        matches!(
            self,
            RegistrationStatus::PendingPayment | RegistrationStatus::PendingPaymentReview
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RegistrationStatus::PendingPaymentReview => "pending_payment_review",
            RegistrationStatus::Approved => "approved",
            RegistrationStatus::Rejected => "rejected",
            RegistrationStatus::Withdrawn => "withdrawn",
            RegistrationStatus::Eliminated => "eliminated",
            RegistrationStatus::WaitingList => "waiting_list",
            RegistrationStatus::PendingPayment => "pending_payment",
        }
    }
}

impl fmt::Display for RegistrationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for RegistrationStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending_payment_review" => Ok(RegistrationStatus::PendingPaymentReview),
            "approved" => Ok(RegistrationStatus::Approved),
            "rejected" => Ok(RegistrationStatus::Rejected),
            "withdrawn" => Ok(RegistrationStatus::Withdrawn),
            "eliminated" => Ok(RegistrationStatus::Eliminated),
            "waiting_list" => Ok(RegistrationStatus::WaitingList),
            "pending_payment" => Ok(RegistrationStatus::PendingPayment),
            _ => Err(format!("Unknown registration status: {s}")),
        }
    }
}

/// A team's registration for one tournament. At most one registration exists
/// per (tournament, team).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamRegistration {
    pub id: Uuid,
    pub tournament_id: TournamentId,
    pub team_id: TeamId,
    /// Denormalized for standings display
    pub team_name: String,
    pub status: RegistrationStatus,
    pub group_id: Option<u32>,
    pub is_qualified_for_knockout: bool,
    pub registered_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TeamRegistration {
    pub fn new(
        tournament_id: TournamentId,
        team_id: TeamId,
        team_name: impl Into<String>,
        status: RegistrationStatus,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            tournament_id,
            team_id,
            team_name: team_name.into(),
            status,
            group_id: None,
            is_qualified_for_knockout: false,
            registered_at: now,
            updated_at: now,
        }
    }
}
