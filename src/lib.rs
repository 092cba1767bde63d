//! # Pitchside
//!
//! A tournament scheduling and standings library.
//!
//! Pitchside organizes multi-team competitions: teams register, an organizer
//! advances the tournament through a guarded lifecycle, fixtures are
//! generated (round robin, knockout brackets, group stages), results are
//! recorded and a standings table is derived on demand. All scheduling
//! mutations for one tournament are serialized by a named lock, so two
//! concurrent administrative actions can never corrupt the schedule.
//!
//! ## Architecture
//!
//! Pure computation is kept free of I/O and orchestration sits on top of it:
//!
//! - [`tournament`]: the aggregate: status state machine, configuration
//!   validation, opening-match selection
//! - [`registration`]: team registrations and their status rules
//! - [`matches`]: match records, scores, goal/card events, forfeits
//! - [`fixtures`]: pure generators: round robin (circle method), knockout
//!   brackets, group partitioning, manual-input validation
//! - [`standings`]: pure, order-independent standings calculator
//! - [`lifecycle`]: the reconciler deciding when results should advance the
//!   tournament
//! - [`scheduling`]: the orchestrator running every use case as
//!   lock -> load -> validate -> commit -> notify
//! - [`store`], [`lock`], [`cache`], [`events`]: trait seams for
//!   persistence, mutual exclusion, standings caching and change
//!   notification, each with a Postgres and/or in-memory implementation
//!
//! ## Example
//!
//! ```
//! use pitchside::tournament::{
//!     LegType, SchedulingMode, Tournament, TournamentConfig, TournamentFormat,
//! };
//!
//! let tournament = Tournament::create(TournamentConfig {
//!     name: "Spring Cup".to_string(),
//!     format: TournamentFormat::KnockoutOnly,
//!     leg_type: LegType::SingleLeg,
//!     scheduling_mode: SchedulingMode::Random,
//!     number_of_groups: 0,
//!     qualified_teams_per_group: 0,
//!     min_teams: 4,
//!     max_teams: 8,
//!     registration_deadline: None,
//!     start_date: None,
//!     end_date: None,
//! })
//! .unwrap();
//! assert_eq!(tournament.status.as_str(), "draft");
//! ```

pub mod cache;
pub mod events;
pub mod fixtures;
pub mod lifecycle;
pub mod lock;
pub mod matches;
pub mod registration;
pub mod scheduling;
pub mod standings;
pub mod store;
pub mod tournament;

pub use matches::{Match, MatchEvent, MatchEventKind, MatchId, MatchStatus, Score};
pub use registration::{RegistrationStatus, TeamRegistration};
pub use scheduling::{ErrorKind, SchedulingError, SchedulingManager, SchedulingResult};
pub use standings::StandingsRow;
pub use tournament::{
    LegType, SchedulingMode, TeamId, Tournament, TournamentConfig, TournamentFormat, TournamentId,
    TournamentStatus,
};
