//! Knockout bracket construction.
//!
//! One kernel, [`pairs_to_matches`], turns pairings into match records for
//! every knockout path: the random round-1 draw, manual organizer pairings
//! and "next round from winners". Two-legged rounds emit a reverse-fixture
//! second leg in the following round number.

use super::errors::{FixtureError, FixtureResult};
use crate::matches::Match;
use crate::tournament::{TeamId, TournamentId};
use rand::Rng;
use rand::seq::SliceRandom;
use std::collections::HashSet;

/// Human-readable stage name for a knockout round with `team_count` teams
pub fn stage_name(team_count: usize) -> String {
    match team_count {
        2 => "Final".to_string(),
        4 => "Semi-final".to_string(),
        8 => "Quarter-final".to_string(),
        n => format!("Round of {n}"),
    }
}

/// Convert pairings into match records.
///
/// Pair order is bracket order: the winner of pair 0 later meets the winner
/// of pair 1, and so on. When an opening pair is present it is moved to
/// slot 0 and its first leg flagged as the opening match.
pub fn pairs_to_matches(
    tournament_id: TournamentId,
    pairs: &[(TeamId, TeamId)],
    round_number: u32,
    two_legged: bool,
    opening_pair: Option<(TeamId, TeamId)>,
) -> Vec<Match> {
    let mut ordered: Vec<(TeamId, TeamId)> = pairs.to_vec();
    if let Some((a, b)) = opening_pair
        && let Some(idx) = ordered.iter().position(|&p| same_pair(p, (a, b)))
    {
        ordered.remove(idx);
        ordered.insert(0, (a, b));
    }

    let stage = stage_name(ordered.len() * 2);
    let mut matches = Vec::with_capacity(ordered.len() * if two_legged { 2 } else { 1 });

    for (ordinal, &(home, away)) in ordered.iter().enumerate() {
        let mut first = Match::new(tournament_id, home, away, round_number, ordinal as u32);
        first.stage_name = Some(stage.clone());
        if ordinal == 0 && opening_pair.is_some_and(|(a, b)| same_pair((home, away), (a, b))) {
            first.is_opening_match = true;
        }
        matches.push(first);
    }
    if two_legged {
        for (ordinal, &(home, away)) in ordered.iter().enumerate() {
            let mut second = Match::new(tournament_id, away, home, round_number + 1, ordinal as u32);
            second.stage_name = Some(stage.clone());
            matches.push(second);
        }
    }

    matches
}

/// Draw round 1 of a knockout bracket at random.
///
/// The field must be a power of two. A selected opening pair is forced into
/// the bracket as pair 0; the rest of the field is shuffled.
pub fn draw_round_one<R: Rng + ?Sized>(
    tournament_id: TournamentId,
    teams: &[TeamId],
    two_legged: bool,
    opening_pair: Option<(TeamId, TeamId)>,
    rng: &mut R,
) -> FixtureResult<Vec<Match>> {
    validate_field(teams)?;

    let mut pool: Vec<TeamId> = teams.to_vec();
    let mut pairs = Vec::with_capacity(teams.len() / 2);

    if let Some((a, b)) = opening_pair {
        for team in [a, b] {
            let idx = pool
                .iter()
                .position(|&t| t == team)
                .ok_or(FixtureError::OpeningTeamNotInDraw(team))?;
            pool.remove(idx);
        }
        pairs.push((a, b));
    }

    pool.shuffle(rng);
    for chunk in pool.chunks_exact(2) {
        pairs.push((chunk[0], chunk[1]));
    }

    Ok(pairs_to_matches(
        tournament_id,
        &pairs,
        1,
        two_legged,
        opening_pair,
    ))
}

/// Validate organizer-supplied pairings against the approved field: every
/// approved team exactly once, no repeats, nobody against themselves.
pub fn validate_manual_pairings(
    pairs: &[(TeamId, TeamId)],
    approved: &[TeamId],
) -> FixtureResult<()> {
    let approved_set: HashSet<TeamId> = approved.iter().copied().collect();
    let mut seen = HashSet::with_capacity(approved.len());

    for &(a, b) in pairs {
        if a == b {
            return Err(FixtureError::TeamPairedWithItself(a));
        }
        for team in [a, b] {
            if !approved_set.contains(&team) {
                return Err(FixtureError::UnknownTeam(team));
            }
            if !seen.insert(team) {
                return Err(FixtureError::DuplicateTeam(team));
            }
        }
    }

    if seen.len() != approved_set.len() {
        return Err(FixtureError::IncompleteCoverage {
            missing: approved_set.len() - seen.len(),
        });
    }
    validate_field(approved)?;
    Ok(())
}

/// Build the next knockout round from the winners of the previous one, in
/// bracket order: winners of pairs (0,1) meet, then (2,3), and so on.
pub fn next_round(
    tournament_id: TournamentId,
    winners: &[TeamId],
    round_number: u32,
    two_legged: bool,
) -> FixtureResult<Vec<Match>> {
    validate_field(winners)?;

    let pairs: Vec<(TeamId, TeamId)> = winners
        .chunks_exact(2)
        .map(|chunk| (chunk[0], chunk[1]))
        .collect();

    Ok(pairs_to_matches(
        tournament_id,
        &pairs,
        round_number,
        two_legged,
        None,
    ))
}

fn validate_field(teams: &[TeamId]) -> FixtureResult<()> {
    if teams.len() < 2 || !teams.len().is_power_of_two() {
        return Err(FixtureError::FieldNotPowerOfTwo(teams.len()));
    }
    let mut seen = HashSet::with_capacity(teams.len());
    for &team in teams {
        if !seen.insert(team) {
            return Err(FixtureError::DuplicateTeam(team));
        }
    }
    Ok(())
}

fn same_pair(x: (TeamId, TeamId), y: (TeamId, TeamId)) -> bool {
    x == y || x == (y.1, y.0)
}
