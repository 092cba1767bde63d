//! Tournament aggregate: configuration, lifecycle status and opening-match
//! selection.
//!
//! The tournament status is a closed state machine. Every transition goes
//! through [`Tournament::change_status`], which checks an explicit adjacency
//! table; no other code assigns the status field. Opening-team selection and
//! the derived effective mode live here as well, so the scheduling layer
//! never re-derives those rules.

pub mod errors;
pub mod models;

pub use errors::{TournamentError, TournamentResult};
pub use models::{
    EffectiveMode, LegType, SchedulingMode, TeamId, Tournament, TournamentConfig, TournamentFormat,
    TournamentId, TournamentStatus,
};
