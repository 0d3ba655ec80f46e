#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative world state management for Harvest Defence.
//!
//! The world owns every enemy and defence entity plus the match-level
//! scalars. All mutation flows through [`apply`], which executes a single
//! [`Command`] deterministically and appends the resulting [`Event`] values
//! to the caller's buffer. Read access goes through the [`query`] module.

mod combat;
mod defenses;
mod enemies;

pub use enemies::{ConstructionError, Path, PathError};

use harvest_defence_core::{
    Command, CurrencyReason, DefenseId, DefenseKind, EnemyId, Event, MatchPhase, PlacementError,
    Position, StatusKind, GUARANTEED_KILL_FACTOR, GUARANTEED_KILL_THRESHOLD,
    SPECIAL_DAMAGE_FACTOR, SPECIAL_RANGE_FACTOR,
};
use thiserror::Error;

use crate::defenses::DefenseRegistry;
use crate::enemies::EnemyRegistry;

/// Damage dealt per simulated second while a burn effect is active.
const BURN_DAMAGE_PER_SECOND: f32 = 1.0;

const DEFAULT_BOUNDS: (f32, f32) = (1_000.0, 600.0);
const DEFAULT_LIVES: u32 = 10;
const DEFAULT_STARTING_CURRENCY: u64 = 150;

/// Errors that prevent a world from being constructed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// The enemy path failed validation.
    #[error(transparent)]
    Path(#[from] PathError),
    /// The playfield bounds are degenerate.
    #[error("world bounds must be positive")]
    InvalidBounds,
}

/// Configuration required to construct a world.
#[derive(Clone, Debug)]
pub struct WorldConfig {
    waypoints: Vec<Position>,
    bounds: (f32, f32),
    lives: u32,
    starting_currency: u64,
}

impl WorldConfig {
    /// Creates a configuration with the provided enemy path and defaults
    /// for every other parameter.
    #[must_use]
    pub fn new(waypoints: Vec<Position>) -> Self {
        Self {
            waypoints,
            bounds: DEFAULT_BOUNDS,
            lives: DEFAULT_LIVES,
            starting_currency: DEFAULT_STARTING_CURRENCY,
        }
    }

    /// Overrides the playfield bounds.
    #[must_use]
    pub fn with_bounds(mut self, width: f32, height: f32) -> Self {
        self.bounds = (width, height);
        self
    }

    /// Overrides the number of lives the player starts with.
    #[must_use]
    pub fn with_lives(mut self, lives: u32) -> Self {
        self.lives = lives;
        self
    }

    /// Overrides the currency balance the player starts with.
    #[must_use]
    pub fn with_starting_currency(mut self, currency: u64) -> Self {
        self.starting_currency = currency;
        self
    }
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self::new(vec![Position::new(0.0, 300.0), Position::new(1_000.0, 300.0)])
    }
}

/// Match-level scalars owned by the world.
#[derive(Clone, Debug)]
pub(crate) struct MatchState {
    pub(crate) lives: u32,
    pub(crate) score: u64,
    pub(crate) currency: u64,
    pub(crate) wave_number: u32,
    pub(crate) phase: MatchPhase,
}

impl MatchState {
    pub(crate) fn new(lives: u32, currency: u64, wave_number: u32) -> Self {
        Self {
            lives,
            score: 0,
            currency,
            wave_number,
            phase: MatchPhase::NotStarted,
        }
    }
}

/// Represents the authoritative Harvest Defence session state.
#[derive(Debug)]
pub struct World {
    clock_ms: u64,
    path: Path,
    bounds: (f32, f32),
    match_state: MatchState,
    enemies: EnemyRegistry,
    defenses: DefenseRegistry,
}

impl World {
    /// Creates a new world ready for simulation.
    pub fn new(config: WorldConfig) -> Result<Self, ConfigError> {
        let (width, height) = config.bounds;
        if width <= 0.0 || height <= 0.0 {
            return Err(ConfigError::InvalidBounds);
        }
        let path = Path::new(config.waypoints)?;
        Ok(Self {
            clock_ms: 0,
            path,
            bounds: config.bounds,
            match_state: MatchState::new(config.lives, config.starting_currency, 1),
            enemies: EnemyRegistry::new(),
            defenses: DefenseRegistry::new(),
        })
    }
}

/// Applies the provided command to the world, mutating state deterministically.
pub fn apply(world: &mut World, command: Command, out_events: &mut Vec<Event>) {
    match command {
        Command::StartMatch => {
            if world.match_state.phase == MatchPhase::NotStarted {
                world.match_state.phase = MatchPhase::Active;
                out_events.push(Event::MatchStarted);
            }
        }
        Command::Tick { dt_ms } => tick(world, dt_ms, out_events),
        Command::PruneEnemies => {
            let _ = world.enemies.prune_retired();
        }
        Command::SpawnEnemy { kind, wave } => {
            if world.match_state.phase != MatchPhase::Active {
                return;
            }
            match world.enemies.spawn(kind, &world.path) {
                Ok(id) => out_events.push(Event::EnemySpawned {
                    id,
                    kind,
                    position: world.path.start(),
                }),
                Err(error) => {
                    log::warn!("enemy construction failed in wave {wave}: {error}");
                    out_events.push(Event::SpawnFailed { wave });
                }
            }
        }
        Command::AdvanceWave { wave } => advance_wave(world, wave, false, out_events),
        Command::ForceAdvanceWave { wave } => advance_wave(world, wave, true, out_events),
        Command::ForceNextWave => {
            if world.match_state.phase != MatchPhase::Active {
                return;
            }
            let _ = world.enemies.retire_all_active();
            let next = world.match_state.wave_number.saturating_add(1);
            world.match_state.wave_number = next;
            out_events.push(Event::WaveChanged { wave_number: next });
        }
        Command::PlaceDefense { kind, position } => {
            if let Err(reason) = place_defense(world, kind, position, out_events) {
                out_events.push(Event::DefenseRejected { kind, reason });
            }
        }
        Command::Strike { defense, target } => strike(world, defense, target, out_events),
        Command::TriggerSpecial { defense } => trigger_special(world, defense, out_events),
        Command::ManualStrike { target, damage } => combat::apply_damage(
            &mut world.enemies,
            &mut world.defenses,
            &mut world.match_state,
            target,
            damage,
            None,
            out_events,
        ),
    }
}

/// Places a defence after validating the match phase, bounds, and funds.
///
/// The rejection surfaces synchronously to the caller; the corresponding
/// events are appended on success.
pub fn place_defense(
    world: &mut World,
    kind: DefenseKind,
    position: Position,
    out_events: &mut Vec<Event>,
) -> Result<DefenseId, PlacementError> {
    if matches!(world.match_state.phase, MatchPhase::GameOver { .. }) {
        return Err(PlacementError::MatchNotActive);
    }

    let (width, height) = world.bounds;
    if position.x() < 0.0 || position.y() < 0.0 || position.x() > width || position.y() > height {
        return Err(PlacementError::OutOfBounds);
    }

    let cost = u64::from(kind.stats().cost());
    if world.match_state.currency < cost {
        return Err(PlacementError::InsufficientFunds);
    }

    world.match_state.currency -= cost;
    let id = world.defenses.insert(kind, position);
    out_events.push(Event::CurrencyDelta {
        amount: -(cost as i64),
        reason: CurrencyReason::DefensePurchase,
    });
    out_events.push(Event::DefensePlaced { id, kind, position });
    Ok(id)
}

fn tick(world: &mut World, dt_ms: u64, out_events: &mut Vec<Event>) {
    if world.match_state.phase != MatchPhase::Active {
        return;
    }

    world.clock_ms = world.clock_ms.saturating_add(dt_ms);
    let now = world.clock_ms;
    out_events.push(Event::TimeAdvanced { dt_ms });

    let dt_seconds = dt_ms as f32 / 1_000.0;
    let total_length = world.path.total_length();
    let mut burns: Vec<(EnemyId, f32)> = Vec::new();
    let mut escapes: Vec<EnemyId> = Vec::new();

    for enemy in world.enemies.iter_active_mut() {
        enemy.expire_statuses(now);
        if enemy.has_status(StatusKind::Burn, now) {
            burns.push((enemy.id, BURN_DAMAGE_PER_SECOND * dt_seconds));
        }

        let factor = enemy.speed_factor(now);
        if factor > 0.0 {
            enemy.progress += enemy.speed * factor * dt_seconds;
            if enemy.progress >= total_length {
                escapes.push(enemy.id);
            } else {
                enemy.position = world.path.point_at(enemy.progress);
            }
        }
    }

    for (id, damage) in burns {
        combat::apply_damage(
            &mut world.enemies,
            &mut world.defenses,
            &mut world.match_state,
            id,
            damage,
            None,
            out_events,
        );
    }

    for id in escapes {
        combat::resolve_escape(&mut world.enemies, &mut world.match_state, id, out_events);
    }

    let dt_clamped = u32::try_from(dt_ms).unwrap_or(u32::MAX);
    for defense in world.defenses.iter_mut() {
        defense.cooldown_remaining_ms = defense.cooldown_remaining_ms.saturating_sub(dt_clamped);
    }
}

fn advance_wave(world: &mut World, wave: u32, forced: bool, out_events: &mut Vec<Event>) {
    if world.match_state.phase != MatchPhase::Active {
        return;
    }

    world.match_state.wave_number = wave;
    out_events.push(Event::WaveChanged { wave_number: wave });
    if forced {
        log::warn!("wave-advance watchdog fired; forcing wave {wave}");
        out_events.push(Event::WaveAdvanceForced { wave_number: wave });
    }
}

fn strike(world: &mut World, defense: DefenseId, target: EnemyId, out_events: &mut Vec<Event>) {
    let Some(state) = world.defenses.get(defense) else {
        return;
    };
    if state.cooldown_remaining_ms > 0 {
        return;
    }
    let kind = state.kind;
    let power = state.power_multiplier;
    let stats = kind.stats();

    let Some(enemy) = world.enemies.get(target) else {
        return;
    };
    let target_health = enemy.health;
    let target_position = enemy.position;

    let mut damage = stats.base_damage() * power;
    if target_health <= GUARANTEED_KILL_THRESHOLD {
        damage = target_health * GUARANTEED_KILL_FACTOR;
    }
    combat::apply_damage(
        &mut world.enemies,
        &mut world.defenses,
        &mut world.match_state,
        target,
        damage,
        Some(defense),
        out_events,
    );

    if let Some(aoe) = stats.aoe() {
        let _ = combat::apply_area_damage(
            &mut world.enemies,
            &mut world.defenses,
            &mut world.match_state,
            target_position,
            aoe.radius(),
            stats.base_damage() * aoe.damage_multiplier(),
            stats.element(),
            Some(defense),
            world.clock_ms,
            out_events,
        );
    }

    if let Some(state) = world.defenses.get_mut(defense) {
        state.cooldown_remaining_ms = stats.cooldown_ms();
    }
}

fn trigger_special(world: &mut World, defense: DefenseId, out_events: &mut Vec<Event>) {
    let now = world.clock_ms;
    let Some(state) = world.defenses.get(defense) else {
        return;
    };
    if !state.special_ready(now) {
        return;
    }
    let kind = state.kind;
    let power = state.power_multiplier;
    let position = state.position;
    let stats = kind.stats();

    let radius = stats.range() * SPECIAL_RANGE_FACTOR;
    let damage = stats.base_damage() * power * SPECIAL_DAMAGE_FACTOR;
    let strong_status = stats.element().map(|element| element.strong_status_effect());

    let hits = world.enemies.query_in_radius(position, radius);
    let struck = hits.len() as u32;
    for id in hits {
        combat::apply_damage(
            &mut world.enemies,
            &mut world.defenses,
            &mut world.match_state,
            id,
            damage,
            Some(defense),
            out_events,
        );
        if let Some((status, duration_ms)) = strong_status {
            if let Some(enemy) = world.enemies.get_mut(id) {
                enemy.apply_status(status, now + duration_ms);
            }
        }
    }

    let _ = combat::apply_area_damage(
        &mut world.enemies,
        &mut world.defenses,
        &mut world.match_state,
        position,
        radius,
        stats.base_damage() * kind.special_pulse_multiplier(),
        stats.element(),
        Some(defense),
        now,
        out_events,
    );

    if let Some(state) = world.defenses.get_mut(defense) {
        state.reset_special(now);
    }
    out_events.push(Event::SpecialTriggered { defense, struck });
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use harvest_defence_core::{
        DefenseId, DefenseSnapshot, DefenseView, EnemySnapshot, EnemyView, MatchSummary, Position,
        SPECIAL_ACTIVATION_RADIUS,
    };

    use super::World;

    /// Captures a read-only view of the active enemies.
    #[must_use]
    pub fn enemy_view(world: &World) -> EnemyView {
        EnemyView::from_snapshots(
            world
                .enemies
                .iter_active()
                .map(|enemy| EnemySnapshot {
                    id: enemy.id,
                    kind: enemy.kind,
                    position: enemy.position,
                    health: enemy.health,
                    max_health: enemy.max_health,
                })
                .collect(),
        )
    }

    /// Captures a read-only view of the placed defences.
    #[must_use]
    pub fn defense_view(world: &World) -> DefenseView {
        let now = world.clock_ms;
        DefenseView::from_snapshots(
            world
                .defenses
                .iter()
                .map(|defense| DefenseSnapshot {
                    id: defense.id,
                    kind: defense.kind,
                    position: defense.position,
                    cooldown_remaining_ms: defense.cooldown_remaining_ms,
                    special_charge: defense.special_charge,
                    special_available: defense.special_available,
                    special_ready: defense.special_ready(now),
                    power_multiplier: defense.power_multiplier,
                })
                .collect(),
        )
    }

    /// Summarises the match-level scalars.
    #[must_use]
    pub fn match_summary(world: &World) -> MatchSummary {
        MatchSummary {
            lives: world.match_state.lives,
            score: world.match_state.score,
            currency: world.match_state.currency,
            wave_number: world.match_state.wave_number,
            phase: world.match_state.phase,
        }
    }

    /// Number of enemies currently active on the path.
    #[must_use]
    pub fn active_enemy_count(world: &World) -> u32 {
        world.enemies.active_count() as u32
    }

    /// Current simulated clock in milliseconds.
    #[must_use]
    pub fn clock_ms(world: &World) -> u64 {
        world.clock_ms
    }

    /// Locates the defence nearest to `point` within the special-activation
    /// radius, ties broken by identifier order.
    #[must_use]
    pub fn nearest_defense_to(world: &World, point: Position) -> Option<DefenseId> {
        let mut best: Option<(f32, DefenseId)> = None;
        for defense in world.defenses.iter() {
            let distance = point.distance_to(defense.position);
            if distance > SPECIAL_ACTIVATION_RADIUS {
                continue;
            }
            let candidate = (distance, defense.id);
            match &mut best {
                Some(existing) => {
                    if candidate.0.total_cmp(&existing.0).then(candidate.1.cmp(&existing.1))
                        == std::cmp::Ordering::Less
                    {
                        *existing = candidate;
                    }
                }
                None => best = Some(candidate),
            }
        }
        best.map(|(_, id)| id)
    }
}
