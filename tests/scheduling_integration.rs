/// End-to-end scheduling flows on the in-memory backends.
///
/// These tests drive the `SchedulingManager` the way an embedding service
/// would: seed a tournament and its registrations, run the use-case
/// operations, and assert on the persisted outcome.
use std::sync::Arc;
use std::time::Duration;

use pitchside::cache::MemoryCache;
use pitchside::events::{BroadcastNotifier, UpdateEvent};
use pitchside::lock::{LocalLock, NamedLock};
use pitchside::matches::{Match, MatchEventKind, MatchStatus, Score};
use pitchside::registration::{RegistrationStatus, TeamRegistration};
use pitchside::scheduling::{ErrorKind, SchedulingError, SchedulingManager};
use pitchside::store::{MatchStore, MemoryStore, RegistrationStore, TournamentStore};
use pitchside::tournament::{
    LegType, SchedulingMode, TeamId, Tournament, TournamentConfig, TournamentFormat,
    TournamentStatus,
};

struct Harness {
    store: Arc<MemoryStore>,
    lock: Arc<LocalLock>,
    manager: SchedulingManager,
}

fn harness() -> Harness {
    let store = Arc::new(MemoryStore::new());
    let lock = Arc::new(LocalLock::new());
    let manager = SchedulingManager::new(
        store.clone(),
        store.clone(),
        store.clone(),
        lock.clone(),
        Arc::new(MemoryCache::new()),
        Arc::new(BroadcastNotifier::new()),
    )
    .with_lock_timeout(Duration::from_millis(100));
    Harness {
        store,
        lock,
        manager,
    }
}

async fn seed_tournament(
    store: &MemoryStore,
    format: TournamentFormat,
    mode: SchedulingMode,
    team_count: usize,
    number_of_groups: u32,
    qualified_per_group: u32,
) -> (Tournament, Vec<TeamId>) {
    let mut tournament = Tournament::create(TournamentConfig {
        name: "Integration Cup".to_string(),
        format,
        leg_type: LegType::SingleLeg,
        scheduling_mode: mode,
        number_of_groups,
        qualified_teams_per_group: qualified_per_group,
        min_teams: 2,
        max_teams: team_count.max(2) as u32,
        registration_deadline: None,
        start_date: None,
        end_date: None,
    })
    .unwrap();
    tournament.change_status(TournamentStatus::RegistrationOpen).unwrap();
    tournament.change_status(TournamentStatus::RegistrationClosed).unwrap();
    tournament.current_teams = team_count as u32;
    store.insert_tournament(&tournament).await.unwrap();

    let mut teams = Vec::new();
    for i in 0..team_count {
        let reg = TeamRegistration::new(
            tournament.id,
            uuid::Uuid::new_v4(),
            format!("Team {i:02}"),
            RegistrationStatus::Approved,
        );
        teams.push(reg.team_id);
        store.insert_registration(&reg).await.unwrap();
    }
    (tournament, teams)
}

async fn finish_match(
    manager: &SchedulingManager,
    m: &Match,
    home_goals: u32,
    away_goals: u32,
) {
    manager
        .record_match_result(
            m.tournament_id,
            m.id,
            Score::new(home_goals, away_goals),
            MatchStatus::Finished,
            false,
        )
        .await
        .unwrap();
}

#[tokio::test]
async fn test_four_team_round_robin_runs_to_completion() {
    let h = harness();
    let (tournament, teams) = seed_tournament(
        &h.store,
        TournamentFormat::RoundRobin,
        SchedulingMode::Random,
        4,
        0,
        0,
    )
    .await;

    // League mode: opening pair is mandatory before the draw
    h.manager
        .set_opening_match(tournament.id, teams[0], teams[1])
        .await
        .unwrap();
    let generated = h.manager.generate_fixtures(tournament.id).await.unwrap();

    assert_eq!(generated.len(), 6, "4 teams -> 6 single-leg matches");
    for round in 1..=3 {
        assert_eq!(
            generated.iter().filter(|m| m.round_number == round).count(),
            2,
            "round {round} should hold 2 matches"
        );
    }
    for &team in &teams {
        assert_eq!(generated.iter().filter(|m| m.involves(team)).count(), 3);
    }
    let opener = generated
        .iter()
        .find(|m| m.is_opening_match)
        .expect("opening match flagged");
    assert_eq!(opener.round_number, 1);
    assert_eq!(opener.pair(), if teams[0] <= teams[1] {
        (teams[0], teams[1])
    } else {
        (teams[1], teams[0])
    });

    let active = h.store.get_tournament(tournament.id).await.unwrap().unwrap();
    assert_eq!(active.status, TournamentStatus::Active);
    assert_eq!(active.opening_match_id, Some(opener.id));

    // Team 0 wins every match 1-0; everything else is a draw
    for m in &generated {
        if m.home_team_id == teams[0] {
            finish_match(&h.manager, m, 1, 0).await;
        } else if m.away_team_id == teams[0] {
            finish_match(&h.manager, m, 0, 1).await;
        } else {
            finish_match(&h.manager, m, 2, 2).await;
        }
    }

    let completed = h.store.get_tournament(tournament.id).await.unwrap().unwrap();
    assert_eq!(completed.status, TournamentStatus::Completed);
    assert_eq!(completed.winner_team_id, Some(teams[0]));

    let table = h.manager.standings(tournament.id, None).await.unwrap();
    assert_eq!(table.len(), 4);
    assert_eq!(table[0].team_id, teams[0]);
    assert_eq!(table[0].points, 9);
    assert_eq!(table[0].rank, 1);
}

#[tokio::test]
async fn test_eight_team_knockout_with_opening_pair() {
    let h = harness();
    let (tournament, teams) = seed_tournament(
        &h.store,
        TournamentFormat::KnockoutOnly,
        SchedulingMode::Random,
        8,
        0,
        0,
    )
    .await;

    h.manager
        .set_opening_match(tournament.id, teams[2], teams[5])
        .await
        .unwrap();
    let round_one = h.manager.generate_fixtures(tournament.id).await.unwrap();

    assert_eq!(round_one.len(), 4, "8 teams -> 4 round-1 matches");
    assert!(round_one.iter().all(|m| m.round_number == 1));
    let openers: Vec<&Match> = round_one.iter().filter(|m| m.is_opening_match).collect();
    assert_eq!(openers.len(), 1);
    let expected_pair = if teams[2] <= teams[5] {
        (teams[2], teams[5])
    } else {
        (teams[5], teams[2])
    };
    assert_eq!(openers[0].pair(), expected_pair);
    assert_eq!(openers[0].ordinal, 0);

    // Home sides win the quarter-finals; semis are generated automatically
    for m in &round_one {
        finish_match(&h.manager, m, 2, 0).await;
    }
    let all = h.store.matches_for(tournament.id).await.unwrap();
    let semis: Vec<&Match> = all.iter().filter(|m| m.round_number == 2).collect();
    assert_eq!(semis.len(), 2, "quarter-final winners should meet in semis");
    assert!(semis.iter().all(|m| m.stage_name.as_deref() == Some("Semi-final")));

    for m in &semis {
        finish_match(&h.manager, m, 1, 0).await;
    }
    let all = h.store.matches_for(tournament.id).await.unwrap();
    let finals: Vec<&Match> = all.iter().filter(|m| m.round_number == 3).collect();
    assert_eq!(finals.len(), 1);
    assert_eq!(finals[0].stage_name.as_deref(), Some("Final"));

    finish_match(&h.manager, finals[0], 3, 1).await;
    let completed = h.store.get_tournament(tournament.id).await.unwrap().unwrap();
    assert_eq!(completed.status, TournamentStatus::Completed);
    assert_eq!(completed.winner_team_id, Some(finals[0].home_team_id));
}

#[tokio::test]
async fn test_duplicate_generation_is_a_conflict() {
    let h = harness();
    let (tournament, _) = seed_tournament(
        &h.store,
        TournamentFormat::KnockoutOnly,
        SchedulingMode::Random,
        8,
        0,
        0,
    )
    .await;

    h.manager.generate_fixtures(tournament.id).await.unwrap();
    // Force the status back so only the existing matches can block the rerun
    let mut reopened = h.store.get_tournament(tournament.id).await.unwrap().unwrap();
    reopened.status = TournamentStatus::RegistrationClosed;
    h.store.update_tournament(&reopened).await.unwrap();

    let err = h.manager.generate_fixtures(tournament.id).await.unwrap_err();
    assert!(matches!(err, SchedulingError::MatchesAlreadyExist(_)));
    assert_eq!(err.kind(), ErrorKind::Conflict);
}

#[tokio::test]
async fn test_lock_contention_surfaces_as_conflict() {
    let h = harness();
    let (tournament, _) = seed_tournament(
        &h.store,
        TournamentFormat::KnockoutOnly,
        SchedulingMode::Random,
        8,
        0,
        0,
    )
    .await;

    // Operation A holds the tournament lock
    let key = format!("tournament:{}", tournament.id);
    assert!(h.lock.acquire(&key, Duration::from_millis(10)).await);

    let err = h.manager.generate_fixtures(tournament.id).await.unwrap_err();
    assert!(matches!(err, SchedulingError::LockTimeout(_)));
    assert_eq!(err.kind(), ErrorKind::Conflict);

    // After release the operation goes through
    h.lock.release(&key).await;
    assert!(h.manager.generate_fixtures(tournament.id).await.is_ok());
}

#[tokio::test]
async fn test_group_stage_drives_qualification_and_completion() {
    let h = harness();
    let (tournament, teams) = seed_tournament(
        &h.store,
        TournamentFormat::GroupsThenKnockout,
        SchedulingMode::Random,
        8,
        2,
        2,
    )
    .await;

    let group_matches = h.manager.generate_fixtures(tournament.id).await.unwrap();
    assert_eq!(
        group_matches.len(),
        12,
        "two groups of 4 play 6 matches each"
    );
    assert!(group_matches.iter().all(|m| m.group_id.is_some()));

    // Registrations carry the partition
    let regs = h.store.registrations_for(tournament.id).await.unwrap();
    assert!(regs.iter().all(|r| r.group_id.is_some()));

    // Home sides always win, so group rank follows the draw deterministically
    for m in &group_matches {
        finish_match(&h.manager, m, 2, 0).await;
    }

    // Group stage complete: round 1 of the knockout exists
    let all = h.store.matches_for(tournament.id).await.unwrap();
    let knockout: Vec<&Match> = all.iter().filter(|m| m.group_id.is_none()).collect();
    assert_eq!(knockout.len(), 2, "4 qualifiers -> 2 semi-finals");

    let regs = h.store.registrations_for(tournament.id).await.unwrap();
    let qualified: Vec<&TeamRegistration> =
        regs.iter().filter(|r| r.is_qualified_for_knockout).collect();
    assert_eq!(qualified.len(), 4);
    assert_eq!(
        regs.iter()
            .filter(|r| r.status == RegistrationStatus::Eliminated)
            .count(),
        4,
        "non-qualifiers leave the competition"
    );

    for m in &knockout {
        finish_match(&h.manager, m, 1, 0).await;
    }
    let all = h.store.matches_for(tournament.id).await.unwrap();
    let final_match = all
        .iter()
        .filter(|m| m.group_id.is_none())
        .max_by_key(|m| m.round_number)
        .unwrap();
    assert_eq!(final_match.stage_name.as_deref(), Some("Final"));

    finish_match(&h.manager, final_match, 2, 1).await;
    let completed = h.store.get_tournament(tournament.id).await.unwrap().unwrap();
    assert_eq!(completed.status, TournamentStatus::Completed);
    assert!(teams.contains(&completed.winner_team_id.unwrap()));
}

#[tokio::test]
async fn test_manual_groups_schedule_from_assignments() {
    let h = harness();
    let (tournament, teams) = seed_tournament(
        &h.store,
        TournamentFormat::GroupsThenKnockout,
        SchedulingMode::Manual,
        8,
        2,
        2,
    )
    .await;

    let assignments: Vec<(TeamId, u32)> = teams
        .iter()
        .enumerate()
        .map(|(i, &team)| (team, (i / 4) as u32))
        .collect();
    h.manager
        .assign_teams_to_groups(tournament.id, &assignments)
        .await
        .unwrap();
    h.manager.start_tournament(tournament.id).await.unwrap();

    let matches = h.store.matches_for(tournament.id).await.unwrap();
    assert_eq!(matches.len(), 12);
    for m in &matches {
        let group = m.group_id.unwrap() as usize;
        let members = &teams[group * 4..(group + 1) * 4];
        assert!(members.contains(&m.home_team_id));
        assert!(members.contains(&m.away_team_id));
    }

    // Manual mode: finishing the group stage pauses for confirmation
    for m in &matches {
        finish_match(&h.manager, m, 2, 0).await;
    }
    let pending = h.store.get_tournament(tournament.id).await.unwrap().unwrap();
    assert_eq!(
        pending.status,
        TournamentStatus::ManualQualificationPending
    );

    // Confirm the organizer's bracket: top two of each group, cross-seeded
    let table_a = h.manager.standings(tournament.id, Some(0)).await.unwrap();
    let table_b = h.manager.standings(tournament.id, Some(1)).await.unwrap();
    let qualifiers = vec![
        table_a[0].team_id,
        table_b[1].team_id,
        table_b[0].team_id,
        table_a[1].team_id,
    ];
    let semis = h
        .manager
        .confirm_qualifiers(tournament.id, &qualifiers)
        .await
        .unwrap();
    assert_eq!(semis.len(), 2);

    let active = h.store.get_tournament(tournament.id).await.unwrap().unwrap();
    assert_eq!(active.status, TournamentStatus::Active);
}

#[tokio::test]
async fn test_manual_knockout_pairings_create_round_one() {
    let h = harness();
    let (tournament, teams) = seed_tournament(
        &h.store,
        TournamentFormat::KnockoutOnly,
        SchedulingMode::Manual,
        4,
        0,
        0,
    )
    .await;

    // Manual mode never draws at random
    let err = h.manager.generate_fixtures(tournament.id).await.unwrap_err();
    assert!(matches!(
        err,
        SchedulingError::WrongSchedulingMode { required: "random" }
    ));

    // And pairings cannot be pushed into a random-mode tournament
    let (random_t, random_teams) = seed_tournament(
        &h.store,
        TournamentFormat::KnockoutOnly,
        SchedulingMode::Random,
        4,
        0,
        0,
    )
    .await;
    let err = h
        .manager
        .create_manual_knockout_matches(random_t.id, &[(random_teams[0], random_teams[1])])
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        SchedulingError::WrongSchedulingMode { required: "manual" }
    ));

    // Or into a format that opens with a group stage
    let (grouped_t, _) = seed_tournament(
        &h.store,
        TournamentFormat::GroupsThenKnockout,
        SchedulingMode::Manual,
        8,
        2,
        2,
    )
    .await;
    let err = h
        .manager
        .create_manual_knockout_matches(grouped_t.id, &[])
        .await
        .unwrap_err();
    assert!(matches!(err, SchedulingError::InvalidState(_)));

    // A team drawn twice is rejected before anything is stored
    let err = h
        .manager
        .create_manual_knockout_matches(
            tournament.id,
            &[(teams[0], teams[1]), (teams[0], teams[3])],
        )
        .await
        .unwrap_err();
    assert!(matches!(err, SchedulingError::Fixture(_)));
    assert_eq!(err.kind(), ErrorKind::BadRequest);
    assert!(h.store.matches_for(tournament.id).await.unwrap().is_empty());

    // Valid pairings land as round 1 in the organizer's order and sides
    let pairs = vec![(teams[2], teams[0]), (teams[1], teams[3])];
    let round_one = h
        .manager
        .create_manual_knockout_matches(tournament.id, &pairs)
        .await
        .unwrap();
    assert_eq!(round_one.len(), 2);
    for (i, m) in round_one.iter().enumerate() {
        assert_eq!(m.round_number, 1);
        assert_eq!(m.ordinal, i as u32);
        assert_eq!((m.home_team_id, m.away_team_id), pairs[i]);
        assert_eq!(m.stage_name.as_deref(), Some("Semi-final"));
    }
    let active = h.store.get_tournament(tournament.id).await.unwrap().unwrap();
    assert_eq!(active.status, TournamentStatus::Active);

    let err = h
        .manager
        .create_manual_knockout_matches(tournament.id, &pairs)
        .await
        .unwrap_err();
    assert!(matches!(err, SchedulingError::MatchesAlreadyExist(_)));

    // The bracket runs like any other: home winners meet in the final
    for m in &round_one {
        finish_match(&h.manager, m, 2, 0).await;
    }
    let all = h.store.matches_for(tournament.id).await.unwrap();
    let final_match = all.iter().find(|m| m.round_number == 2).unwrap();
    assert_eq!(final_match.stage_name.as_deref(), Some("Final"));
    assert!(final_match.involves(teams[2]) && final_match.involves(teams[1]));

    finish_match(&h.manager, final_match, 1, 0).await;
    let completed = h.store.get_tournament(tournament.id).await.unwrap().unwrap();
    assert_eq!(completed.status, TournamentStatus::Completed);
    assert_eq!(completed.winner_team_id, Some(final_match.home_team_id));
}

#[tokio::test]
async fn test_forfeit_awards_score_and_advances_bracket() {
    let h = harness();
    let (tournament, _) = seed_tournament(
        &h.store,
        TournamentFormat::KnockoutOnly,
        SchedulingMode::Random,
        4,
        0,
        0,
    )
    .await;
    let round_one = h.manager.generate_fixtures(tournament.id).await.unwrap();
    assert_eq!(round_one.len(), 2);

    // Only a participant can be awarded the match
    let outsider = uuid::Uuid::new_v4();
    let err = h
        .manager
        .forfeit_match(tournament.id, round_one[0].id, outsider)
        .await
        .unwrap_err();
    assert!(matches!(err, SchedulingError::TeamNotInMatch(_)));

    let walkover_winner = round_one[0].away_team_id;
    h.manager
        .forfeit_match(tournament.id, round_one[0].id, walkover_winner)
        .await
        .unwrap();

    let stored = h
        .store
        .get_match(round_one[0].id)
        .await
        .unwrap()
        .unwrap();
    assert!(stored.forfeit);
    assert_eq!(stored.score, Some(Score::new(0, 3)));
    assert_eq!(stored.winner(), Some(walkover_winner));

    // A settled match cannot be forfeited again
    let err = h
        .manager
        .forfeit_match(tournament.id, round_one[0].id, walkover_winner)
        .await
        .unwrap_err();
    assert!(matches!(err, SchedulingError::MatchAlreadyFinished(_)));
    assert_eq!(err.kind(), ErrorKind::Conflict);

    // The walkover counts as a result: finishing the other semi makes the final
    finish_match(&h.manager, &round_one[1], 2, 1).await;
    let all = h.store.matches_for(tournament.id).await.unwrap();
    let final_match = all.iter().find(|m| m.round_number == 2).unwrap();
    assert!(final_match.involves(walkover_winner));
    assert!(final_match.involves(round_one[1].home_team_id));
}

#[tokio::test]
async fn test_match_events_flow_into_standings() {
    let h = harness();
    let (tournament, teams) = seed_tournament(
        &h.store,
        TournamentFormat::RoundRobin,
        SchedulingMode::Random,
        2,
        0,
        0,
    )
    .await;
    h.manager
        .set_opening_match(tournament.id, teams[0], teams[1])
        .await
        .unwrap();
    let generated = h.manager.generate_fixtures(tournament.id).await.unwrap();
    let m = &generated[0];

    let goal = h
        .manager
        .add_match_event(
            tournament.id,
            m.id,
            m.home_team_id,
            MatchEventKind::Goal,
            Some(12),
        )
        .await
        .unwrap();
    assert_eq!(goal.team_id, m.home_team_id);
    h.manager
        .add_match_event(
            tournament.id,
            m.id,
            m.away_team_id,
            MatchEventKind::YellowCard,
            Some(34),
        )
        .await
        .unwrap();

    // Outsiders cannot be booked
    let err = h
        .manager
        .add_match_event(
            tournament.id,
            m.id,
            uuid::Uuid::new_v4(),
            MatchEventKind::RedCard,
            None,
        )
        .await
        .unwrap_err();
    assert!(matches!(err, SchedulingError::TeamNotInMatch(_)));

    let stored = h.store.get_match(m.id).await.unwrap().unwrap();
    assert_eq!(stored.events.len(), 2);

    finish_match(&h.manager, m, 1, 0).await;
    let err = h
        .manager
        .add_match_event(
            tournament.id,
            m.id,
            m.home_team_id,
            MatchEventKind::Goal,
            Some(90),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, SchedulingError::MatchAlreadyFinished(_)));

    let table = h.manager.standings(tournament.id, None).await.unwrap();
    let booked = table.iter().find(|r| r.team_id == m.away_team_id).unwrap();
    assert_eq!(booked.yellow_cards, 1);
}

#[tokio::test]
async fn test_standings_update_after_result_correction() {
    let h = harness();
    let (tournament, teams) = seed_tournament(
        &h.store,
        TournamentFormat::RoundRobin,
        SchedulingMode::Random,
        2,
        0,
        0,
    )
    .await;
    h.manager
        .set_opening_match(tournament.id, teams[0], teams[1])
        .await
        .unwrap();
    let generated = h.manager.generate_fixtures(tournament.id).await.unwrap();
    let m = &generated[0];

    finish_match(&h.manager, m, 1, 0).await;
    let table = h.manager.standings(tournament.id, None).await.unwrap();
    let winner_row = table.iter().find(|r| r.team_id == m.home_team_id).unwrap();
    assert_eq!(winner_row.points, 3);

    // Correct the result to a draw; invalidation makes the next read fresh
    h.manager
        .record_match_result(
            tournament.id,
            m.id,
            Score::new(1, 1),
            MatchStatus::Finished,
            true,
        )
        .await
        .unwrap();
    let table = h.manager.standings(tournament.id, None).await.unwrap();
    assert!(table.iter().all(|r| r.points == 1));
}

#[tokio::test]
async fn test_events_are_emitted_for_generation() {
    let store = Arc::new(MemoryStore::new());
    let notifier = Arc::new(BroadcastNotifier::new());
    let mut receiver = notifier.subscribe();
    let manager = SchedulingManager::new(
        store.clone(),
        store.clone(),
        store.clone(),
        Arc::new(LocalLock::new()),
        Arc::new(MemoryCache::new()),
        notifier,
    );

    let (tournament, _) = seed_tournament(
        &store,
        TournamentFormat::KnockoutOnly,
        SchedulingMode::Random,
        4,
        0,
        0,
    )
    .await;
    manager.generate_fixtures(tournament.id).await.unwrap();

    match receiver.recv().await.unwrap() {
        UpdateEvent::MatchesGenerated {
            tournament_id,
            matches,
        } => {
            assert_eq!(tournament_id, tournament.id);
            assert_eq!(matches.len(), 2);
        }
        other => panic!("expected MatchesGenerated first, got {other:?}"),
    }
    assert!(matches!(
        receiver.recv().await.unwrap(),
        UpdateEvent::TournamentUpdated { .. }
    ));
}
