//! The standings calculator.
//!
//! A pure function over one tournament's matches and registrations. Input
//! order never matters: matches are re-sorted internally by their schedule
//! position, so any permutation of the same match set yields an identical
//! table.

use super::models::StandingsRow;
use crate::matches::{Match, MatchEventKind};
use crate::registration::TeamRegistration;
use crate::tournament::TeamId;
use std::cmp::Ordering;

/// How many results the form string keeps
const FORM_LENGTH: usize = 5;

/// Points awarded for a win / draw
const WIN_POINTS: u32 = 3;
const DRAW_POINTS: u32 = 1;

/// Compute the ranked standings table, optionally restricted to one group.
///
/// Teams with Approved, Withdrawn or Eliminated registrations appear;
/// withdrawn and eliminated teams keep their already-played results. Only
/// finished matches count; forfeits count with their awarded score exactly
/// like a played match.
pub fn compute(
    matches: &[Match],
    registrations: &[TeamRegistration],
    group: Option<u32>,
) -> Vec<StandingsRow> {
    let mut rows: Vec<StandingsRow> = registrations
        .iter()
        .filter(|reg| reg.status.counts_for_standings())
        .filter(|reg| group.is_none() || reg.group_id == group)
        .map(|reg| StandingsRow {
            team_id: reg.team_id,
            team_name: reg.team_name.clone(),
            group_id: reg.group_id,
            played: 0,
            won: 0,
            drawn: 0,
            lost: 0,
            goals_for: 0,
            goals_against: 0,
            points: 0,
            yellow_cards: 0,
            red_cards: 0,
            rank: 0,
            form: String::new(),
        })
        .collect();

    // Schedule position gives a deterministic order independent of how the
    // caller happened to collect the matches.
    let mut counted: Vec<&Match> = matches
        .iter()
        .filter(|m| m.is_finished() && m.score.is_some())
        .filter(|m| group.is_none() || m.group_id == group)
        .collect();
    counted.sort_by_key(|m| (m.group_id, m.round_number, m.ordinal, m.id));

    for row in &mut rows {
        let mut results = Vec::new();
        for m in &counted {
            if !m.involves(row.team_id) {
                continue;
            }
            let score = m.score.expect("filtered on score presence");
            let (gf, ga) = if m.home_team_id == row.team_id {
                (score.home, score.away)
            } else {
                (score.away, score.home)
            };

            row.played += 1;
            row.goals_for += gf;
            row.goals_against += ga;
            match gf.cmp(&ga) {
                Ordering::Greater => {
                    row.won += 1;
                    row.points += WIN_POINTS;
                    results.push('W');
                }
                Ordering::Equal => {
                    row.drawn += 1;
                    row.points += DRAW_POINTS;
                    results.push('D');
                }
                Ordering::Less => {
                    row.lost += 1;
                    results.push('L');
                }
            }

            for event in &m.events {
                if event.team_id != row.team_id {
                    continue;
                }
                match event.kind {
                    MatchEventKind::YellowCard => row.yellow_cards += 1,
                    MatchEventKind::RedCard => row.red_cards += 1,
                    MatchEventKind::Goal => {}
                }
            }
        }

        let skip = results.len().saturating_sub(FORM_LENGTH);
        row.form = results[skip..].iter().collect();
    }

    rank(&mut rows);
    rows
}

/// The tie-break cascade: points, goal difference, goals for, team name.
/// The name floor makes the order total and deterministic.
fn rank(rows: &mut [StandingsRow]) {
    rows.sort_by(|a, b| {
        b.points
            .cmp(&a.points)
            .then_with(|| b.goal_difference().cmp(&a.goal_difference()))
            .then_with(|| b.goals_for.cmp(&a.goals_for))
            .then_with(|| a.team_name.cmp(&b.team_name))
            .then_with(|| a.team_id.cmp(&b.team_id))
    });
    for (idx, row) in rows.iter_mut().enumerate() {
        row.rank = (idx + 1) as u32;
    }
}

/// The top `count` teams of a group by rank. Used for knockout
/// qualification.
pub fn top_of_group(
    matches: &[Match],
    registrations: &[TeamRegistration],
    group: u32,
    count: usize,
) -> Vec<TeamId> {
    compute(matches, registrations, Some(group))
        .into_iter()
        .take(count)
        .map(|row| row.team_id)
        .collect()
}
