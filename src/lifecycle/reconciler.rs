//! Pure decision kernel for tournament progression.
//!
//! [`decide`] looks at a tournament plus its full match and registration
//! sets and answers one question: given the results recorded so far, what
//! should happen next? It never touches storage; the scheduling manager is
//! responsible for applying the returned action.

use crate::matches::{Match, MatchStatus};
use crate::registration::TeamRegistration;
use crate::standings::calculator;
use crate::tournament::{SchedulingMode, TeamId, Tournament, TournamentFormat, TournamentStatus};

/// What a finished batch of results implies for the tournament.
#[derive(Debug, Clone, PartialEq)]
pub enum ReconcileAction {
    /// No progression is due (results outstanding, or nothing to do)
    Nothing,
    /// Group stage is complete and the organizer must confirm qualifiers
    EnterManualQualification,
    /// Group stage is complete; knockout round one should be generated from
    /// these qualifiers, already in bracket seeding order
    AdvanceToKnockout { qualifiers: Vec<TeamId> },
    /// A knockout round is complete; the next round should be generated from
    /// these winners, in bracket order
    NextKnockoutRound { round_number: u32, winners: Vec<TeamId> },
    /// The tournament is decided
    Complete { winner: TeamId },
}

/// Decide the next lifecycle step from recorded results.
///
/// Only `Active` tournaments ever progress. A drawn knockout tie (single
/// match or level aggregate) yields `Nothing`: the tournament holds until
/// the result is corrected. A cancelled match counts as settled without
/// contributing a result, so it cannot hold a league or group stage open
/// forever; postponed and rescheduled matches still await their result.
pub fn decide(
    tournament: &Tournament,
    matches: &[Match],
    registrations: &[TeamRegistration],
) -> ReconcileAction {
    if tournament.status != TournamentStatus::Active || matches.is_empty() {
        return ReconcileAction::Nothing;
    }

    if tournament.format == TournamentFormat::RoundRobin {
        return decide_league(matches, registrations);
    }

    let knockout: Vec<&Match> = matches.iter().filter(|m| m.group_id.is_none()).collect();
    if knockout.is_empty() {
        return decide_group_stage(tournament, matches, registrations);
    }
    decide_knockout(&knockout)
}

/// A match that will never produce a result anymore
fn settled(m: &Match) -> bool {
    m.is_finished() || m.status == MatchStatus::Cancelled
}

fn decide_league(matches: &[Match], registrations: &[TeamRegistration]) -> ReconcileAction {
    if !matches.iter().all(settled) || !matches.iter().any(Match::is_finished) {
        return ReconcileAction::Nothing;
    }
    match calculator::compute(matches, registrations, None).first() {
        Some(leader) => ReconcileAction::Complete {
            winner: leader.team_id,
        },
        None => ReconcileAction::Nothing,
    }
}

fn decide_group_stage(
    tournament: &Tournament,
    matches: &[Match],
    registrations: &[TeamRegistration],
) -> ReconcileAction {
    let group_matches: Vec<&Match> = matches.iter().filter(|m| m.group_id.is_some()).collect();
    if group_matches.is_empty()
        || !group_matches.iter().all(|m| settled(m))
        || !group_matches.iter().any(|m| m.is_finished())
    {
        return ReconcileAction::Nothing;
    }

    match tournament.scheduling_mode {
        SchedulingMode::Manual => ReconcileAction::EnterManualQualification,
        SchedulingMode::Random => match seeded_qualifiers(
            matches,
            registrations,
            tournament.number_of_groups,
            tournament.qualified_teams_per_group,
        ) {
            Some(qualifiers) => ReconcileAction::AdvanceToKnockout { qualifiers },
            None => ReconcileAction::Nothing,
        },
    }
}

/// Bracket seeding order for group qualifiers: group winners meet another
/// group's runner-up, so teams from the same group cannot rematch in round
/// one. With two groups qualifying two each this yields the classic
/// A1-B2, B1-A2 draw.
fn seeded_qualifiers(
    matches: &[Match],
    registrations: &[TeamRegistration],
    number_of_groups: u32,
    per_group: u32,
) -> Option<Vec<TeamId>> {
    let groups = number_of_groups as usize;
    let per_group = per_group as usize;

    let tables: Vec<Vec<TeamId>> = (0..number_of_groups)
        .map(|g| calculator::top_of_group(matches, registrations, g, per_group))
        .collect();
    if tables.iter().any(|t| t.len() < per_group) {
        return None;
    }

    let mut seeds = Vec::with_capacity(groups * per_group);
    for i in 0..groups {
        for rank in 0..per_group {
            let group = if rank % 2 == 0 { i } else { (i + 1) % groups };
            seeds.push(tables[group][rank]);
        }
    }
    Some(seeds)
}

fn decide_knockout(knockout: &[&Match]) -> ReconcileAction {
    let Some(current_round) = knockout.iter().map(|m| m.round_number).max() else {
        return ReconcileAction::Nothing;
    };
    let current_stage = knockout
        .iter()
        .find(|m| m.round_number == current_round)
        .and_then(|m| m.stage_name.clone());

    // A two-legged stage spans two round numbers under one stage name, so
    // collect the stage by name rather than by round.
    let stage: Vec<&Match> = knockout
        .iter()
        .filter(|m| m.stage_name == current_stage)
        .copied()
        .collect();
    if stage.is_empty() || !stage.iter().all(|m| m.is_finished()) {
        return ReconcileAction::Nothing;
    }

    let mut winners: Vec<(u32, TeamId)> = Vec::new();
    let mut seen_pairs: Vec<(TeamId, TeamId)> = Vec::new();
    for m in &stage {
        let pair = m.pair();
        if seen_pairs.contains(&pair) {
            continue;
        }
        seen_pairs.push(pair);

        let legs: Vec<&Match> = stage
            .iter()
            .filter(|x| x.pair() == pair)
            .copied()
            .collect();
        let slot = legs.iter().map(|x| x.ordinal).min().unwrap_or(0);
        match tie_winner(pair, &legs) {
            Some(winner) => winners.push((slot, winner)),
            // Level tie: hold until the result is corrected
            None => return ReconcileAction::Nothing,
        }
    }

    winners.sort_by_key(|&(slot, _)| slot);
    let winners: Vec<TeamId> = winners.into_iter().map(|(_, team)| team).collect();

    match winners.as_slice() {
        [winner] => ReconcileAction::Complete { winner: *winner },
        _ => ReconcileAction::NextKnockoutRound {
            round_number: current_round + 1,
            winners,
        },
    }
}

/// Winner of a one- or two-legged tie on aggregate goals
fn tie_winner(pair: (TeamId, TeamId), legs: &[&Match]) -> Option<TeamId> {
    let goals_of = |team: TeamId| -> u32 {
        legs.iter()
            .filter_map(|m| {
                m.score.map(|s| {
                    if m.home_team_id == team {
                        s.home
                    } else {
                        s.away
                    }
                })
            })
            .sum()
    };

    let (a, b) = pair;
    match goals_of(a).cmp(&goals_of(b)) {
        std::cmp::Ordering::Greater => Some(a),
        std::cmp::Ordering::Less => Some(b),
        std::cmp::Ordering::Equal => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matches::{MatchStatus, Score};
    use crate::registration::{RegistrationStatus, TeamRegistration};
    use crate::tournament::{LegType, TournamentConfig};
    use uuid::Uuid;

    fn tournament(format: TournamentFormat, mode: SchedulingMode) -> Tournament {
        let mut t = Tournament::create(TournamentConfig {
            name: "Cup".to_string(),
            format,
            leg_type: LegType::SingleLeg,
            scheduling_mode: mode,
            number_of_groups: 2,
            qualified_teams_per_group: 2,
            min_teams: 4,
            max_teams: 8,
            registration_deadline: None,
            start_date: None,
            end_date: None,
        })
        .unwrap();
        t.status = TournamentStatus::Active;
        t
    }

    fn registration(tournament_id: Uuid, name: &str, group_id: Option<u32>) -> TeamRegistration {
        let mut reg = TeamRegistration::new(
            tournament_id,
            Uuid::new_v4(),
            name.to_string(),
            RegistrationStatus::Approved,
        );
        reg.group_id = group_id;
        reg
    }

    fn finished(
        tournament_id: Uuid,
        home: TeamId,
        away: TeamId,
        score: (u32, u32),
        round: u32,
        ordinal: u32,
    ) -> Match {
        let mut m = Match::new(tournament_id, home, away, round, ordinal);
        m.score = Some(Score::new(score.0, score.1));
        m.status = MatchStatus::Finished;
        m
    }

    #[test]
    fn test_non_active_tournament_never_progresses() {
        let mut t = tournament(TournamentFormat::RoundRobin, SchedulingMode::Random);
        t.status = TournamentStatus::RegistrationOpen;
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let matches = vec![finished(t.id, a, b, (1, 0), 1, 0)];

        assert_eq!(decide(&t, &matches, &[]), ReconcileAction::Nothing);
    }

    #[test]
    fn test_league_completes_with_points_leader() {
        let t = tournament(TournamentFormat::RoundRobin, SchedulingMode::Random);
        let regs: Vec<TeamRegistration> = ["Alpha", "Beta", "Gamma"]
            .iter()
            .map(|name| registration(t.id, name, None))
            .collect();
        let (a, b, c) = (regs[0].team_id, regs[1].team_id, regs[2].team_id);

        let matches = vec![
            finished(t.id, a, b, (2, 0), 1, 0),
            finished(t.id, b, c, (1, 1), 2, 0),
            finished(t.id, a, c, (3, 1), 3, 0),
        ];

        assert_eq!(
            decide(&t, &matches, &regs),
            ReconcileAction::Complete { winner: a }
        );
    }

    #[test]
    fn test_league_waits_for_outstanding_results() {
        let t = tournament(TournamentFormat::RoundRobin, SchedulingMode::Random);
        let regs: Vec<TeamRegistration> = ["Alpha", "Beta"]
            .iter()
            .map(|name| registration(t.id, name, None))
            .collect();
        let (a, b) = (regs[0].team_id, regs[1].team_id);

        let mut pending = Match::new(t.id, a, b, 1, 0);
        pending.status = MatchStatus::Live;

        assert_eq!(decide(&t, &[pending], &regs), ReconcileAction::Nothing);
    }

    #[test]
    fn test_cancelled_match_does_not_block_league_completion() {
        let t = tournament(TournamentFormat::RoundRobin, SchedulingMode::Random);
        let regs: Vec<TeamRegistration> = ["Alpha", "Beta", "Gamma"]
            .iter()
            .map(|name| registration(t.id, name, None))
            .collect();
        let (a, b, c) = (regs[0].team_id, regs[1].team_id, regs[2].team_id);

        // The b-c fixture was called off; the played results decide it
        let mut cancelled = Match::new(t.id, b, c, 2, 0);
        cancelled.status = MatchStatus::Cancelled;
        let matches = vec![
            finished(t.id, a, b, (2, 0), 1, 0),
            cancelled,
            finished(t.id, a, c, (3, 1), 3, 0),
        ];

        assert_eq!(
            decide(&t, &matches, &regs),
            ReconcileAction::Complete { winner: a }
        );
    }

    #[test]
    fn test_all_matches_cancelled_holds() {
        let t = tournament(TournamentFormat::RoundRobin, SchedulingMode::Random);
        let regs: Vec<TeamRegistration> = ["Alpha", "Beta"]
            .iter()
            .map(|name| registration(t.id, name, None))
            .collect();

        let mut m = Match::new(t.id, regs[0].team_id, regs[1].team_id, 1, 0);
        m.status = MatchStatus::Cancelled;

        assert_eq!(decide(&t, &[m], &regs), ReconcileAction::Nothing);
    }

    /// Two groups of two, single leg: one match per group decides it.
    fn finished_group_stage(t: &Tournament) -> (Vec<TeamRegistration>, Vec<Match>, Vec<TeamId>) {
        let mut regs = Vec::new();
        for (idx, name) in ["A1", "A2", "B1", "B2"].iter().enumerate() {
            regs.push(registration(t.id, name, Some(idx as u32 / 2)));
        }
        let ids: Vec<TeamId> = regs.iter().map(|r| r.team_id).collect();

        let mut m0 = finished(t.id, ids[0], ids[1], (2, 0), 1, 0);
        m0.group_id = Some(0);
        let mut m1 = finished(t.id, ids[2], ids[3], (1, 0), 1, 0);
        m1.group_id = Some(1);

        (regs, vec![m0, m1], ids)
    }

    #[test]
    fn test_manual_mode_asks_for_qualifier_confirmation() {
        let t = tournament(TournamentFormat::GroupsThenKnockout, SchedulingMode::Manual);
        let (regs, matches, _) = finished_group_stage(&t);

        assert_eq!(
            decide(&t, &matches, &regs),
            ReconcileAction::EnterManualQualification
        );
    }

    #[test]
    fn test_random_mode_seeds_cross_group_qualifiers() {
        let t = tournament(TournamentFormat::GroupsThenKnockout, SchedulingMode::Random);
        let (regs, matches, ids) = finished_group_stage(&t);

        // Winner of a group meets the other group's runner-up
        assert_eq!(
            decide(&t, &matches, &regs),
            ReconcileAction::AdvanceToKnockout {
                qualifiers: vec![ids[0], ids[3], ids[2], ids[1]],
            }
        );
    }

    #[test]
    fn test_incomplete_group_stage_holds() {
        let t = tournament(TournamentFormat::GroupsThenKnockout, SchedulingMode::Random);
        let (regs, mut matches, _) = finished_group_stage(&t);
        matches[1].status = MatchStatus::Scheduled;
        matches[1].score = None;

        assert_eq!(decide(&t, &matches, &regs), ReconcileAction::Nothing);
    }

    #[test]
    fn test_cancelled_group_match_does_not_block_qualification() {
        let t = tournament(TournamentFormat::GroupsThenKnockout, SchedulingMode::Random);
        let (regs, mut matches, ids) = finished_group_stage(&t);
        // Group B's match was called off; its table falls back to the
        // tie-break order, which here matches the played result
        matches[1].status = MatchStatus::Cancelled;
        matches[1].score = None;

        assert_eq!(
            decide(&t, &matches, &regs),
            ReconcileAction::AdvanceToKnockout {
                qualifiers: vec![ids[0], ids[3], ids[2], ids[1]],
            }
        );
    }

    #[test]
    fn test_knockout_round_advances_winners_in_bracket_order() {
        let t = tournament(TournamentFormat::KnockoutOnly, SchedulingMode::Random);
        let ids: Vec<TeamId> = (0..4).map(|_| Uuid::new_v4()).collect();

        let mut semis = vec![
            finished(t.id, ids[0], ids[1], (1, 0), 1, 0),
            finished(t.id, ids[2], ids[3], (0, 2), 1, 1),
        ];
        for m in &mut semis {
            m.stage_name = Some("Semi-final".to_string());
        }

        assert_eq!(
            decide(&t, &semis, &[]),
            ReconcileAction::NextKnockoutRound {
                round_number: 2,
                winners: vec![ids[0], ids[3]],
            }
        );
    }

    #[test]
    fn test_drawn_knockout_match_holds_for_correction() {
        let t = tournament(TournamentFormat::KnockoutOnly, SchedulingMode::Random);
        let ids: Vec<TeamId> = (0..4).map(|_| Uuid::new_v4()).collect();

        let mut semis = vec![
            finished(t.id, ids[0], ids[1], (1, 1), 1, 0),
            finished(t.id, ids[2], ids[3], (0, 2), 1, 1),
        ];
        for m in &mut semis {
            m.stage_name = Some("Semi-final".to_string());
        }

        assert_eq!(decide(&t, &semis, &[]), ReconcileAction::Nothing);
    }

    #[test]
    fn test_two_legged_tie_decided_on_aggregate() {
        let t = tournament(TournamentFormat::KnockoutOnly, SchedulingMode::Random);
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();

        // First leg 0-2 against `a`, second leg 3-0: 3-2 on aggregate
        let mut leg1 = finished(t.id, a, b, (0, 2), 1, 0);
        let mut leg2 = finished(t.id, b, a, (0, 3), 2, 0);
        leg1.stage_name = Some("Final".to_string());
        leg2.stage_name = Some("Final".to_string());

        assert_eq!(
            decide(&t, &[leg1, leg2], &[]),
            ReconcileAction::Complete { winner: a }
        );
    }

    #[test]
    fn test_final_result_completes_tournament() {
        let t = tournament(TournamentFormat::KnockoutOnly, SchedulingMode::Random);
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();

        let mut legs = vec![
            finished(t.id, a, b, (1, 0), 1, 0),
            finished(t.id, b, a, (2, 2), 2, 0),
        ];
        for m in &mut legs {
            m.stage_name = Some("Final".to_string());
        }

        assert_eq!(
            decide(&t, &legs, &[]),
            ReconcileAction::Complete { winner: a }
        );
    }
}
