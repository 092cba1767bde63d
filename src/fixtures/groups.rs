//! Group partitioning and per-group round-robin scheduling.

use super::errors::{FixtureError, FixtureResult};
use super::round_robin;
use crate::matches::Match;
use crate::tournament::{LegType, TeamId, TournamentId};
use rand::Rng;
use rand::seq::SliceRandom;
use std::collections::HashSet;

/// Randomly partition `teams` into `number_of_groups` groups whose sizes
/// differ by at most one. A selected opening pair is kept together by
/// seeding both of its teams into group 0 before the deal.
pub fn partition<R: Rng + ?Sized>(
    teams: &[TeamId],
    number_of_groups: u32,
    opening_pair: Option<(TeamId, TeamId)>,
    rng: &mut R,
) -> FixtureResult<Vec<Vec<TeamId>>> {
    if number_of_groups == 0 {
        return Err(FixtureError::GroupCountMismatch {
            expected: 1,
            got: 0,
        });
    }
    let needed = number_of_groups as usize * 2;
    if teams.len() < needed {
        return Err(FixtureError::NotEnoughTeams {
            needed,
            current: teams.len(),
        });
    }

    let mut pool: Vec<TeamId> = teams.to_vec();
    let mut groups: Vec<Vec<TeamId>> = vec![Vec::new(); number_of_groups as usize];

    if let Some((a, b)) = opening_pair {
        for team in [a, b] {
            let idx = pool
                .iter()
                .position(|&t| t == team)
                .ok_or(FixtureError::OpeningTeamNotInDraw(team))?;
            pool.remove(idx);
            groups[0].push(team);
        }
    }

    pool.shuffle(rng);
    // Deal the remaining teams to the currently smallest group
    for team in pool {
        let target = groups
            .iter()
            .enumerate()
            .min_by_key(|(_, g)| g.len())
            .map(|(idx, _)| idx)
            .unwrap_or(0);
        groups[target].push(team);
    }

    Ok(groups)
}

/// Validate organizer-supplied group assignments: every approved team
/// exactly once, group ids within the configured count, every group big
/// enough to play, the opening pair not split.
pub fn validate_assignments(
    assignments: &[(TeamId, u32)],
    approved: &[TeamId],
    number_of_groups: u32,
    opening_pair: Option<(TeamId, TeamId)>,
) -> FixtureResult<()> {
    let approved_set: HashSet<TeamId> = approved.iter().copied().collect();
    let mut seen = HashSet::with_capacity(assignments.len());
    let mut sizes = vec![0usize; number_of_groups as usize];

    for &(team, group) in assignments {
        if !approved_set.contains(&team) {
            return Err(FixtureError::UnknownTeam(team));
        }
        if !seen.insert(team) {
            return Err(FixtureError::DuplicateTeam(team));
        }
        if group >= number_of_groups {
            return Err(FixtureError::GroupCountMismatch {
                expected: number_of_groups,
                got: group + 1,
            });
        }
        sizes[group as usize] += 1;
    }

    if seen.len() != approved_set.len() {
        return Err(FixtureError::IncompleteCoverage {
            missing: approved_set.len() - seen.len(),
        });
    }

    for (group, &size) in sizes.iter().enumerate() {
        if size < 2 {
            return Err(FixtureError::GroupTooSmall {
                group: group as u32,
                size,
            });
        }
    }

    if let Some((a, b)) = opening_pair {
        let group_of = |team: TeamId| {
            assignments
                .iter()
                .find(|&&(t, _)| t == team)
                .map(|&(_, g)| g)
        };
        match (group_of(a), group_of(b)) {
            (Some(ga), Some(gb)) if ga == gb => {}
            (Some(_), Some(_)) => return Err(FixtureError::OpeningPairSplit),
            _ => {
                let missing = if group_of(a).is_none() { a } else { b };
                return Err(FixtureError::OpeningTeamNotInDraw(missing));
            }
        }
    }

    Ok(())
}

/// Generate an independent round-robin schedule per group. The opening pair,
/// if set, opens its own group's schedule.
pub fn schedule(
    tournament_id: TournamentId,
    groups: &[Vec<TeamId>],
    leg_type: LegType,
    opening_pair: Option<(TeamId, TeamId)>,
) -> FixtureResult<Vec<Match>> {
    let mut matches = Vec::new();

    for (group_idx, members) in groups.iter().enumerate() {
        if members.len() < 2 {
            return Err(FixtureError::GroupTooSmall {
                group: group_idx as u32,
                size: members.len(),
            });
        }

        let group_opening = opening_pair
            .filter(|&(a, b)| members.contains(&a) && members.contains(&b));

        let mut group_matches =
            round_robin::schedule(tournament_id, members, leg_type, group_opening)?;
        for m in &mut group_matches {
            m.group_id = Some(group_idx as u32);
            m.stage_name = Some("Group stage".to_string());
        }
        matches.extend(group_matches);
    }

    Ok(matches)
}
