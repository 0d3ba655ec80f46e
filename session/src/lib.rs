#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Session orchestration for Harvest Defence.
//!
//! A [`Session`] owns the authoritative world together with the wave director
//! and defence controller, and advances all of them from a single [`tick`]
//! entry point. Player intent enters through the dedicated methods; every
//! mutation still flows through the world's command executor, so the event
//! stream remains the only side channel.
//!
//! [`tick`]: Session::tick

use harvest_defence_core::{
    Command, DefenseId, DefenseKind, DefenseView, EnemyId, EnemyView, Event, MatchSummary,
    PlacementError, Position,
};
use harvest_defence_system_defense_control as defense_control;
use harvest_defence_system_wave_director as wave_director;
use harvest_defence_world::{apply, query, ConfigError, World, WorldConfig};

/// Simulated time between two prune passes over the enemy registry.
const PRUNE_INTERVAL_MS: u64 = 1_000;

/// Upper bound on director re-runs within a single tick.
///
/// A wave change produced while absorbing director commands feeds straight
/// back into the director, so the loop must terminate even if every pass
/// produces fresh events.
const MAX_DIRECTOR_PASSES: usize = 4;

const CONTROL_SEED_SALT: u64 = 0x5bd1_e995_7b7d_159b;

/// Configuration required to construct a session.
#[derive(Clone, Debug)]
pub struct SessionConfig {
    world: WorldConfig,
    seed: u64,
}

impl SessionConfig {
    /// Creates a new configuration from a world layout and a deterministic
    /// seed.
    #[must_use]
    pub fn new(world: WorldConfig, seed: u64) -> Self {
        Self { world, seed }
    }
}

/// Owns the world and its systems, and schedules a deterministic game loop.
#[derive(Debug)]
pub struct Session {
    world: World,
    director: wave_director::WaveDirector,
    control: defense_control::DefenseControl,
    command_scratch: Vec<Command>,
    last_prune_ms: u64,
    paused: bool,
    in_tick: bool,
}

impl Session {
    /// Creates a new session ready to start.
    pub fn new(config: SessionConfig) -> Result<Self, ConfigError> {
        let world = World::new(config.world)?;
        Ok(Self {
            world,
            director: wave_director::WaveDirector::new(wave_director::Config::new(config.seed)),
            control: defense_control::DefenseControl::new(defense_control::Config::new(
                config.seed ^ CONTROL_SEED_SALT,
            )),
            command_scratch: Vec::new(),
            last_prune_ms: 0,
            paused: false,
            in_tick: false,
        })
    }

    /// Starts the match and primes the wave director.
    pub fn start(&mut self, out_events: &mut Vec<Event>) {
        let base = out_events.len();
        apply(&mut self.world, Command::StartMatch, out_events);
        self.absorb(out_events, base);
    }

    /// Advances the simulation by `dt_ms` simulated milliseconds.
    ///
    /// A paused session ignores the call entirely. Re-entrant invocation is
    /// rejected rather than corrupting in-flight state.
    pub fn tick(&mut self, dt_ms: u64, out_events: &mut Vec<Event>) {
        if self.paused {
            return;
        }
        if self.in_tick {
            log::error!("tick re-entered; dropping nested call");
            return;
        }
        self.in_tick = true;

        let base = out_events.len();

        // Fixed per-tick order: prune, then movement and timers, then
        // defence attacks, then wave evaluation, so attacks see current
        // positions and the completion check sees post-attack counts.
        let now = query::clock_ms(&self.world);
        if now.saturating_sub(self.last_prune_ms) >= PRUNE_INTERVAL_MS {
            apply(&mut self.world, Command::PruneEnemies, out_events);
            self.last_prune_ms = now;
        }

        apply(&mut self.world, Command::Tick { dt_ms }, out_events);

        let enemies = query::enemy_view(&self.world);
        let defenses = query::defense_view(&self.world);
        let mut commands = std::mem::take(&mut self.command_scratch);
        self.control.handle(&defenses, &enemies, &mut commands);
        for command in commands.drain(..) {
            apply(&mut self.world, command, out_events);
        }
        self.command_scratch = commands;

        // Let the director absorb the tick plus whatever its own commands
        // produce, bounded so a pathological feedback loop cannot spin.
        let mut cursor = base;
        for _ in 0..MAX_DIRECTOR_PASSES {
            if cursor >= out_events.len() {
                break;
            }
            let batch = out_events[cursor..].to_vec();
            cursor = out_events.len();
            let mut commands = std::mem::take(&mut self.command_scratch);
            self.director.handle(
                &batch,
                query::active_enemy_count(&self.world),
                &mut commands,
            );
            for command in commands.drain(..) {
                apply(&mut self.world, command, out_events);
            }
            self.command_scratch = commands;
        }

        self.in_tick = false;
    }

    /// Requests placement of a defence, returning the allocated identifier.
    pub fn place_defense(
        &mut self,
        kind: DefenseKind,
        position: Position,
        out_events: &mut Vec<Event>,
    ) -> Result<DefenseId, PlacementError> {
        harvest_defence_world::place_defense(&mut self.world, kind, position, out_events)
    }

    /// Fires the special attack of the defence nearest to `point`.
    ///
    /// Returns whether a defence was found within the activation radius; the
    /// attack itself may still be rejected silently when it is not armed.
    pub fn trigger_special_at(&mut self, point: Position, out_events: &mut Vec<Event>) -> bool {
        let Some(defense) = query::nearest_defense_to(&self.world, point) else {
            return false;
        };
        apply(&mut self.world, Command::TriggerSpecial { defense }, out_events);
        true
    }

    /// Applies player-issued damage that credits no defence.
    pub fn manual_strike(&mut self, target: EnemyId, damage: f32, out_events: &mut Vec<Event>) {
        let base = out_events.len();
        apply(
            &mut self.world,
            Command::ManualStrike { target, damage },
            out_events,
        );
        self.absorb(out_events, base);
    }

    /// Skips to the next wave, retiring every active enemy without reward.
    pub fn force_next_wave(&mut self, out_events: &mut Vec<Event>) {
        let base = out_events.len();
        apply(&mut self.world, Command::ForceNextWave, out_events);
        self.absorb(out_events, base);
    }

    /// Suspends the game loop; ticks are ignored until [`resume`] is called.
    ///
    /// [`resume`]: Session::resume
    pub fn pause(&mut self) {
        self.paused = true;
    }

    /// Resumes a paused game loop.
    pub fn resume(&mut self) {
        self.paused = false;
    }

    /// Reports whether the game loop is paused.
    #[must_use]
    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Summarises the match-level scalars.
    #[must_use]
    pub fn summary(&self) -> MatchSummary {
        query::match_summary(&self.world)
    }

    /// Captures a read-only view of the active enemies.
    #[must_use]
    pub fn enemies(&self) -> EnemyView {
        query::enemy_view(&self.world)
    }

    /// Captures a read-only view of the placed defences.
    #[must_use]
    pub fn defenses(&self) -> DefenseView {
        query::defense_view(&self.world)
    }

    /// Current simulated clock in milliseconds.
    #[must_use]
    pub fn clock_ms(&self) -> u64 {
        query::clock_ms(&self.world)
    }

    /// Feeds events the director has not yet seen into its state machine.
    ///
    /// Without a time delta the director never emits commands, so a single
    /// pass suffices.
    fn absorb(&mut self, out_events: &mut Vec<Event>, from: usize) {
        if from >= out_events.len() {
            return;
        }
        let batch = out_events[from..].to_vec();
        let mut commands = std::mem::take(&mut self.command_scratch);
        self.director.handle(
            &batch,
            query::active_enemy_count(&self.world),
            &mut commands,
        );
        for command in commands.drain(..) {
            apply(&mut self.world, command, out_events);
        }
        self.command_scratch = commands;
    }
}
