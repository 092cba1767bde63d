//! Match records: scores, events, forfeits and winner derivation.

pub mod models;

pub use models::{
    FORFEIT_SCORE, Match, MatchEvent, MatchEventKind, MatchId, MatchStatus, Score,
};
