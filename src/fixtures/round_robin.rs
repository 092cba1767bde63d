//! Round-robin scheduling via the circle (rotation) pairing method.

use super::errors::{FixtureError, FixtureResult};
use crate::matches::Match;
use crate::tournament::{LegType, TeamId, TournamentId};

/// Generate a round-robin schedule for `teams`.
///
/// Single leg: `N·(N-1)/2` matches, one per unordered pair, `⌊N/2⌋` matches
/// per round with a bye when N is odd. Home-and-away doubles the schedule;
/// every reverse leg lands in a later round than its first leg.
///
/// When an opening pair is supplied, the round containing that pairing is
/// relabeled as round 1 and the pairing is moved to the front of it with
/// `is_opening_match` set.
pub fn schedule(
    tournament_id: TournamentId,
    teams: &[TeamId],
    leg_type: LegType,
    opening_pair: Option<(TeamId, TeamId)>,
) -> FixtureResult<Vec<Match>> {
    if teams.len() < 2 {
        return Err(FixtureError::NotEnoughTeams {
            needed: 2,
            current: teams.len(),
        });
    }
    check_distinct(teams)?;
    if let Some((a, b)) = opening_pair {
        for team in [a, b] {
            if !teams.contains(&team) {
                return Err(FixtureError::OpeningTeamNotInDraw(team));
            }
        }
    }

    let mut rounds = circle_rounds(teams);

    if let Some((a, b)) = opening_pair {
        promote_opening_round(&mut rounds, a, b);
    }

    if leg_type == LegType::HomeAndAway {
        let first_leg_rounds = rounds.len();
        for leg in 0..first_leg_rounds {
            let reversed: Vec<(TeamId, TeamId)> =
                rounds[leg].iter().map(|&(h, a)| (a, h)).collect();
            rounds.push(reversed);
        }
    }

    let mut matches = Vec::new();
    for (round_idx, pairs) in rounds.iter().enumerate() {
        for (ordinal, &(home, away)) in pairs.iter().enumerate() {
            let mut m = Match::new(
                tournament_id,
                home,
                away,
                (round_idx + 1) as u32,
                ordinal as u32,
            );
            if round_idx == 0
                && ordinal == 0
                && opening_pair.is_some_and(|(a, b)| same_pair((home, away), (a, b)))
            {
                m.is_opening_match = true;
            }
            matches.push(m);
        }
    }

    Ok(matches)
}

/// The circle method: fix one slot, rotate the rest one step per round.
/// Returns oriented pairs per round, byes already removed.
fn circle_rounds(teams: &[TeamId]) -> Vec<Vec<(TeamId, TeamId)>> {
    let mut slots: Vec<Option<TeamId>> = teams.iter().copied().map(Some).collect();
    if slots.len() % 2 == 1 {
        slots.push(None); // bye
    }
    let n = slots.len();

    let mut rounds = Vec::with_capacity(n - 1);
    for round in 0..n - 1 {
        let mut pairs = Vec::with_capacity(n / 2);
        for i in 0..n / 2 {
            if let (Some(a), Some(b)) = (slots[i], slots[n - 1 - i]) {
                // Alternate orientation so home counts stay balanced
                let (home, away) = if (round + i) % 2 == 0 { (a, b) } else { (b, a) };
                pairs.push((home, away));
            }
        }
        rounds.push(pairs);

        let last = slots.remove(n - 1);
        slots.insert(1, last);
    }
    rounds
}

/// Swap the round containing the opening pairing into position 0 and move
/// the pairing to the front of it, oriented as supplied.
fn promote_opening_round(rounds: &mut [Vec<(TeamId, TeamId)>], a: TeamId, b: TeamId) {
    let location = rounds.iter().enumerate().find_map(|(round_idx, pairs)| {
        pairs
            .iter()
            .position(|&pair| same_pair(pair, (a, b)))
            .map(|pair_idx| (round_idx, pair_idx))
    });

    if let Some((round_idx, pair_idx)) = location {
        rounds.swap(0, round_idx);
        rounds[0].remove(pair_idx);
        rounds[0].insert(0, (a, b));
    }
}

fn same_pair(x: (TeamId, TeamId), y: (TeamId, TeamId)) -> bool {
    x == y || x == (y.1, y.0)
}

fn check_distinct(teams: &[TeamId]) -> FixtureResult<()> {
    let mut seen = std::collections::HashSet::with_capacity(teams.len());
    for &team in teams {
        if !seen.insert(team) {
            return Err(FixtureError::DuplicateTeam(team));
        }
    }
    Ok(())
}
