//! End-to-end tests driving the session loop against real waves.

use harvest_defence_core::{DefenseKind, Event, MatchPhase, Position};
use harvest_defence_session::{Session, SessionConfig};
use harvest_defence_world::WorldConfig;

fn short_path_config(lives: u32, currency: u64) -> SessionConfig {
    let world = WorldConfig::new(vec![Position::new(0.0, 0.0), Position::new(600.0, 0.0)])
        .with_lives(lives)
        .with_starting_currency(currency);
    SessionConfig::new(world, 42)
}

fn run_for(session: &mut Session, total_ms: u64, step_ms: u64) -> Vec<Event> {
    let mut events = Vec::new();
    let mut elapsed = 0;
    while elapsed < total_ms {
        session.tick(step_ms, &mut events);
        elapsed += step_ms;
    }
    events
}

#[test]
fn start_begins_the_match_once() {
    let mut session = Session::new(short_path_config(10, 150)).expect("session");
    let mut events = Vec::new();
    session.start(&mut events);
    session.start(&mut events);
    let starts = events
        .iter()
        .filter(|event| matches!(event, Event::MatchStarted))
        .count();
    assert_eq!(starts, 1);
}

#[test]
fn first_wave_spawns_after_the_opening_delay() {
    let mut session = Session::new(short_path_config(10, 150)).expect("session");
    let mut events = Vec::new();
    session.start(&mut events);

    session.tick(200, &mut events);
    assert!(
        !events
            .iter()
            .any(|event| matches!(event, Event::EnemySpawned { .. })),
        "no spawn before the opening delay"
    );

    session.tick(100, &mut events);
    let spawns = events
        .iter()
        .filter(|event| matches!(event, Event::EnemySpawned { .. }))
        .count();
    assert_eq!(spawns, 1);
    assert_eq!(session.enemies().len(), 1);
}

#[test]
fn undefended_farm_loses_the_match() {
    let mut session = Session::new(short_path_config(2, 150)).expect("session");
    let mut events = Vec::new();
    session.start(&mut events);

    let events = run_for(&mut session, 60_000, 100);

    assert!(events
        .iter()
        .any(|event| matches!(event, Event::EnemyEscaped { .. })));
    assert!(events
        .iter()
        .any(|event| matches!(event, Event::MatchEnded { victory: false, .. })));
    assert_eq!(
        session.summary().phase,
        MatchPhase::GameOver { victory: false }
    );
    assert_eq!(session.summary().lives, 0);

    // A finished match ignores further time.
    let clock = session.clock_ms();
    let mut late = Vec::new();
    session.tick(1_000, &mut late);
    assert_eq!(session.clock_ms(), clock);
}

#[test]
fn defended_farm_earns_kills_and_advances_waves() {
    let mut session = Session::new(short_path_config(50, 500)).expect("session");
    let mut events = Vec::new();
    session.start(&mut events);
    // Cover the whole path with overlapping mage ranges.
    let _ = session
        .place_defense(DefenseKind::IceMage, Position::new(150.0, 30.0), &mut events)
        .expect("first mage");
    let _ = session
        .place_defense(DefenseKind::FireMage, Position::new(450.0, 30.0), &mut events)
        .expect("second mage");

    let events = run_for(&mut session, 120_000, 100);

    assert!(
        events
            .iter()
            .any(|event| matches!(event, Event::EnemyDefeated { by: Some(_), .. })),
        "defences should defeat enemies"
    );
    assert!(
        events
            .iter()
            .any(|event| matches!(event, Event::WaveChanged { wave_number } if *wave_number >= 2)),
        "the match should reach wave two"
    );
    assert!(session.summary().score > 0);
}

#[test]
fn slow_clearing_wave_is_never_force_advanced() {
    let world = WorldConfig::new(vec![Position::new(0.0, 0.0), Position::new(100_000.0, 0.0)])
        .with_lives(10)
        .with_starting_currency(150);
    let mut session = Session::new(SessionConfig::new(world, 42)).expect("session");
    let mut events = Vec::new();
    session.start(&mut events);

    // Undefended enemies crawl a path far too long to clear in 20 seconds.
    let events = run_for(&mut session, 20_000, 100);

    assert!(session.enemies().len() > 0, "enemies should still be alive");
    assert!(
        !events
            .iter()
            .any(|event| matches!(event, Event::WaveChanged { wave_number } if *wave_number >= 2)),
        "the wave must not advance while enemies are active"
    );
    assert!(!events
        .iter()
        .any(|event| matches!(event, Event::WaveAdvanceForced { .. })));
    assert_eq!(session.summary().wave_number, 1);
}

#[test]
fn placement_failure_surfaces_synchronously() {
    let mut session = Session::new(short_path_config(10, 10)).expect("session");
    let mut events = Vec::new();
    session.start(&mut events);
    let error = session
        .place_defense(DefenseKind::Wizard, Position::new(100.0, 100.0), &mut events)
        .unwrap_err();
    assert_eq!(
        error,
        harvest_defence_core::PlacementError::InsufficientFunds
    );
}

#[test]
fn paused_session_ignores_ticks() {
    let mut session = Session::new(short_path_config(10, 150)).expect("session");
    let mut events = Vec::new();
    session.start(&mut events);
    session.pause();
    assert!(session.is_paused());

    let mut paused_events = Vec::new();
    session.tick(5_000, &mut paused_events);
    assert!(paused_events.is_empty());
    assert_eq!(session.clock_ms(), 0);

    session.resume();
    session.tick(1_000, &mut paused_events);
    assert_eq!(session.clock_ms(), 1_000);
}

#[test]
fn force_next_wave_clears_the_field() {
    let mut session = Session::new(short_path_config(10, 150)).expect("session");
    let mut events = Vec::new();
    session.start(&mut events);
    let _ = run_for(&mut session, 2_200, 100);
    assert!(session.enemies().len() > 0);

    let mut events = Vec::new();
    session.force_next_wave(&mut events);
    assert!(session.enemies().is_empty());
    assert_eq!(session.summary().wave_number, 2);
    assert!(events
        .iter()
        .any(|event| matches!(event, Event::WaveChanged { wave_number: 2 })));
}

#[test]
fn special_request_without_nearby_defense_reports_failure() {
    let mut session = Session::new(short_path_config(10, 150)).expect("session");
    let mut events = Vec::new();
    session.start(&mut events);
    assert!(!session.trigger_special_at(Position::new(300.0, 300.0), &mut events));

    let _ = session
        .place_defense(DefenseKind::Wizard, Position::new(300.0, 300.0), &mut events)
        .expect("placement");
    assert!(session.trigger_special_at(Position::new(310.0, 300.0), &mut events));
}

#[test]
fn identical_seeds_replay_identical_histories() {
    let mut first = Session::new(short_path_config(10, 500)).expect("first");
    let mut second = Session::new(short_path_config(10, 500)).expect("second");

    let mut events_a = Vec::new();
    let mut events_b = Vec::new();
    first.start(&mut events_a);
    second.start(&mut events_b);
    let _ = first
        .place_defense(DefenseKind::Cannon, Position::new(200.0, 50.0), &mut events_a)
        .expect("cannon a");
    let _ = second
        .place_defense(DefenseKind::Cannon, Position::new(200.0, 50.0), &mut events_b)
        .expect("cannon b");

    for _ in 0..300 {
        first.tick(100, &mut events_a);
        second.tick(100, &mut events_b);
    }

    assert_eq!(events_a, events_b);
}

#[test]
fn manual_strike_defeats_without_crediting_a_defense() {
    let mut session = Session::new(short_path_config(10, 150)).expect("session");
    let mut events = Vec::new();
    session.start(&mut events);
    let _ = run_for(&mut session, 300, 100);
    let enemy = session.enemies().iter().next().expect("one enemy").id;

    let mut events = Vec::new();
    session.manual_strike(enemy, 999.0, &mut events);
    assert!(events
        .iter()
        .any(|event| matches!(event, Event::EnemyDefeated { by: None, .. })));
}
