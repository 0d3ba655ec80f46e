#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that runs a headless Harvest Defence match.
//!
//! The runner places a small preset defence line, advances the simulation on
//! a fixed cadence, and reports wave transitions and the final summary on
//! standard output. Useful for balancing runs and determinism checks.

use anyhow::Context;
use clap::Parser;
use harvest_defence_core::{DefenseKind, Event, MatchPhase, Position};
use harvest_defence_session::{Session, SessionConfig};
use harvest_defence_world::WorldConfig;

#[derive(Debug, Parser)]
#[command(name = "harvest-defence", about = "Headless Harvest Defence match runner")]
struct Args {
    /// Deterministic seed shared by every random draw in the match.
    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// Simulated match duration in seconds.
    #[arg(long, default_value_t = 120)]
    duration_secs: u64,

    /// Simulated milliseconds advanced per tick.
    #[arg(long, default_value_t = 100)]
    step_ms: u64,

    /// Lives the farm starts with.
    #[arg(long, default_value_t = 10)]
    lives: u32,

    /// Currency the player starts with.
    #[arg(long, default_value_t = 250)]
    currency: u64,
}

const DEFENSE_LINE: [(DefenseKind, f32, f32); 3] = [
    (DefenseKind::IceMage, 200.0, 250.0),
    (DefenseKind::FireMage, 500.0, 350.0),
    (DefenseKind::Wizard, 800.0, 250.0),
];

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();
    anyhow::ensure!(args.step_ms > 0, "step-ms must be positive");

    let world = WorldConfig::default()
        .with_lives(args.lives)
        .with_starting_currency(args.currency);
    let mut session =
        Session::new(SessionConfig::new(world, args.seed)).context("failed to build session")?;

    let mut events = Vec::new();
    session.start(&mut events);
    for (kind, x, y) in DEFENSE_LINE {
        match session.place_defense(kind, Position::new(x, y), &mut events) {
            Ok(id) => log::info!("placed {kind:?} as {id:?} at ({x}, {y})"),
            Err(error) => log::warn!("skipping {kind:?} at ({x}, {y}): {error}"),
        }
    }
    report(&events);

    let total_ms = args.duration_secs.saturating_mul(1_000);
    let mut elapsed_ms = 0;
    while elapsed_ms < total_ms {
        events.clear();
        session.tick(args.step_ms, &mut events);
        elapsed_ms += args.step_ms;
        report(&events);
        if matches!(session.summary().phase, MatchPhase::GameOver { .. }) {
            break;
        }
    }

    let summary = session.summary();
    println!(
        "final: wave {wave}, score {score}, currency {currency}, lives {lives}",
        wave = summary.wave_number,
        score = summary.score,
        currency = summary.currency,
        lives = summary.lives
    );
    Ok(())
}

fn report(events: &[Event]) {
    for event in events {
        match event {
            Event::MatchStarted => println!("match started"),
            Event::WaveChanged { wave_number } => println!("wave {wave_number} begins"),
            Event::WaveAdvanceForced { wave_number } => {
                println!("wave {wave_number} forced by watchdog");
            }
            Event::MatchEnded {
                victory,
                final_score,
                final_wave,
                final_currency,
            } => println!(
                "match ended: victory={victory}, score={final_score}, wave={final_wave}, currency={final_currency}"
            ),
            _ => {}
        }
    }
}
