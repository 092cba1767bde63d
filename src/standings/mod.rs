//! Standings: a pure, order-independent aggregation of match results into a
//! ranked table.

pub mod calculator;
pub mod models;

pub use calculator::compute;
pub use models::StandingsRow;
