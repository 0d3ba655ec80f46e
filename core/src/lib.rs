#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Harvest Defence combat simulation.
//!
//! This crate defines the message surface that connects the authoritative
//! world, pure systems, and external collaborators. Collaborators and systems
//! submit [`Command`] values describing desired mutations, the world executes
//! those commands via its `apply` entry point, and then broadcasts [`Event`]
//! values for systems and collaborators to react to deterministically.
//! Systems consume event streams, query immutable snapshots, and respond
//! exclusively with new command batches.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Number of credited kills required before a defence's special attack arms.
pub const SPECIAL_CHARGE_THRESHOLD: u32 = 5;

/// Minimum simulated time between two special-attack activations.
pub const SPECIAL_COOLDOWN_MS: u64 = 10_000;

/// Factor applied to a defence's range when its special attack strikes.
pub const SPECIAL_RANGE_FACTOR: f32 = 1.5;

/// Factor applied to a defence's base damage when its special attack strikes.
pub const SPECIAL_DAMAGE_FACTOR: f32 = 2.5;

/// Health at or below which a direct attack force-kills the target.
pub const GUARANTEED_KILL_THRESHOLD: f32 = 2.0;

/// Damage multiplier applied to a target's remaining health by the
/// guaranteed-kill rule.
pub const GUARANTEED_KILL_FACTOR: f32 = 5.0;

/// Radius within which a player-issued special command locates a defence.
pub const SPECIAL_ACTIVATION_RADIUS: f32 = 120.0;

/// Unique identifier assigned to an enemy.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EnemyId(u32);

impl EnemyId {
    /// Creates a new enemy identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Unique identifier assigned to a defence unit.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DefenseId(u32);

impl DefenseId {
    /// Creates a new defence identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Continuous location expressed in world units.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Position {
    x: f32,
    y: f32,
}

impl Position {
    /// Creates a new position from explicit coordinates.
    #[must_use]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Horizontal coordinate in world units.
    #[must_use]
    pub const fn x(&self) -> f32 {
        self.x
    }

    /// Vertical coordinate in world units.
    #[must_use]
    pub const fn y(&self) -> f32 {
        self.y
    }

    /// Computes the Euclidean distance between two positions.
    #[must_use]
    pub fn distance_to(self, other: Position) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }
}

/// Closed set of enemy kinds fielded against the farm.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EnemyKind {
    /// Early-game flyer with low health.
    Bird,
    /// Fast early-game ground runner.
    Rabbit,
    /// Slow early-game ground crawler with extra health.
    Slime,
    /// Quick early-game flyer.
    Bat,
    /// Mid-game ground hunter.
    Wolf,
    /// Tough mid-game ground charger.
    Boar,
    /// Late-game ground juggernaut.
    Golem,
}

impl EnemyKind {
    /// All enemy kinds in canonical order.
    pub const ALL: [EnemyKind; 7] = [
        EnemyKind::Bird,
        EnemyKind::Rabbit,
        EnemyKind::Slime,
        EnemyKind::Bat,
        EnemyKind::Wolf,
        EnemyKind::Boar,
        EnemyKind::Golem,
    ];

    /// Kind spawned when weighted selection yields no eligible candidate.
    pub const FALLBACK: EnemyKind = EnemyKind::Bird;

    /// Retrieves the static stat record for the kind.
    #[must_use]
    pub const fn stats(self) -> EnemyStats {
        match self {
            EnemyKind::Bird => EnemyStats::new(3.0, 80.0, 5, true),
            EnemyKind::Rabbit => EnemyStats::new(4.0, 100.0, 5, false),
            EnemyKind::Slime => EnemyStats::new(6.0, 40.0, 8, false),
            EnemyKind::Bat => EnemyStats::new(3.0, 120.0, 6, true),
            EnemyKind::Wolf => EnemyStats::new(10.0, 90.0, 12, false),
            EnemyKind::Boar => EnemyStats::new(16.0, 60.0, 15, false),
            EnemyKind::Golem => EnemyStats::new(30.0, 30.0, 25, false),
        }
    }
}

/// Static combat statistics attached to an enemy kind.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EnemyStats {
    max_health: f32,
    speed: f32,
    reward: u32,
    flying: bool,
}

impl EnemyStats {
    const fn new(max_health: f32, speed: f32, reward: u32, flying: bool) -> Self {
        Self {
            max_health,
            speed,
            reward,
            flying,
        }
    }

    /// Health the enemy spawns with.
    #[must_use]
    pub const fn max_health(&self) -> f32 {
        self.max_health
    }

    /// Movement speed in world units per simulated second.
    #[must_use]
    pub const fn speed(&self) -> f32 {
        self.speed
    }

    /// Currency granted when the enemy is defeated.
    #[must_use]
    pub const fn reward(&self) -> u32 {
        self.reward
    }

    /// Reports whether the enemy travels above ground-only defences.
    #[must_use]
    pub const fn flying(&self) -> bool {
        self.flying
    }
}

/// Closed set of defence kinds the player may place.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum DefenseKind {
    /// Area caster that slows enemies with ice.
    IceMage,
    /// Area caster that burns enemies over time.
    FireMage,
    /// Long-range single-target caster.
    Wizard,
    /// Short-range ground-only area attacker.
    Cannon,
}

impl DefenseKind {
    /// Retrieves the static stat record for the kind.
    #[must_use]
    pub const fn stats(self) -> DefenseStats {
        match self {
            DefenseKind::IceMage => DefenseStats::new(
                250.0,
                1_000,
                1.2,
                Some(AoeProfile::new(80.0, 0.7)),
                Some(Element::Ice),
                TargetFilter::All,
                50,
            ),
            DefenseKind::FireMage => DefenseStats::new(
                220.0,
                1_200,
                1.5,
                Some(AoeProfile::new(90.0, 0.8)),
                Some(Element::Fire),
                TargetFilter::All,
                60,
            ),
            DefenseKind::Wizard => {
                DefenseStats::new(300.0, 1_500, 2.0, None, None, TargetFilter::All, 80)
            }
            DefenseKind::Cannon => DefenseStats::new(
                200.0,
                2_000,
                3.0,
                Some(AoeProfile::new(100.0, 1.0)),
                None,
                TargetFilter::GroundOnly,
                70,
            ),
        }
    }

    /// Damage multiplier of the self-centred pulse fired by the special
    /// attack.
    #[must_use]
    pub const fn special_pulse_multiplier(self) -> f32 {
        match self {
            DefenseKind::IceMage => 0.5,
            DefenseKind::FireMage => 0.7,
            DefenseKind::Wizard | DefenseKind::Cannon => 0.6,
        }
    }
}

/// Static combat statistics attached to a defence kind.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DefenseStats {
    range: f32,
    cooldown_ms: u32,
    base_damage: f32,
    aoe: Option<AoeProfile>,
    element: Option<Element>,
    allowed_targets: TargetFilter,
    cost: u32,
}

impl DefenseStats {
    #[allow(clippy::too_many_arguments)]
    const fn new(
        range: f32,
        cooldown_ms: u32,
        base_damage: f32,
        aoe: Option<AoeProfile>,
        element: Option<Element>,
        allowed_targets: TargetFilter,
        cost: u32,
    ) -> Self {
        Self {
            range,
            cooldown_ms,
            base_damage,
            aoe,
            element,
            allowed_targets,
            cost,
        }
    }

    /// Targeting range in world units.
    #[must_use]
    pub const fn range(&self) -> f32 {
        self.range
    }

    /// Minimum simulated time between two direct attacks.
    #[must_use]
    pub const fn cooldown_ms(&self) -> u32 {
        self.cooldown_ms
    }

    /// Damage dealt by a direct attack before multipliers.
    #[must_use]
    pub const fn base_damage(&self) -> f32 {
        self.base_damage
    }

    /// Area-of-effect profile, when the kind splashes around its target.
    #[must_use]
    pub const fn aoe(&self) -> Option<AoeProfile> {
        self.aoe
    }

    /// Element applied by the kind's attacks, when any.
    #[must_use]
    pub const fn element(&self) -> Option<Element> {
        self.element
    }

    /// Filter restricting which enemy kinds the defence may target.
    #[must_use]
    pub const fn allowed_targets(&self) -> TargetFilter {
        self.allowed_targets
    }

    /// Currency required to place the defence.
    #[must_use]
    pub const fn cost(&self) -> u32 {
        self.cost
    }
}

/// Splash-damage profile attached to a defence kind.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AoeProfile {
    radius: f32,
    damage_multiplier: f32,
}

impl AoeProfile {
    const fn new(radius: f32, damage_multiplier: f32) -> Self {
        Self {
            radius,
            damage_multiplier,
        }
    }

    /// Splash radius in world units around the struck target.
    #[must_use]
    pub const fn radius(&self) -> f32 {
        self.radius
    }

    /// Factor applied to base damage for every enemy inside the splash.
    #[must_use]
    pub const fn damage_multiplier(&self) -> f32 {
        self.damage_multiplier
    }
}

/// Restriction on the enemy kinds a defence may target.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TargetFilter {
    /// Every enemy kind is a valid target.
    All,
    /// Only non-flying enemy kinds are valid targets.
    GroundOnly,
}

impl TargetFilter {
    /// Reports whether the filter permits targeting the provided kind.
    #[must_use]
    pub const fn allows(self, kind: EnemyKind) -> bool {
        match self {
            TargetFilter::All => true,
            TargetFilter::GroundOnly => !kind.stats().flying(),
        }
    }
}

/// Elemental affinity carried by a defence's attacks.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Element {
    /// Chilling attacks that slow or freeze enemies.
    Ice,
    /// Igniting attacks that burn enemies over time.
    Fire,
}

impl Element {
    /// Status effect applied by ordinary area damage of this element.
    #[must_use]
    pub const fn status_effect(self) -> (StatusKind, u64) {
        match self {
            Element::Ice => (StatusKind::Slow, 2_000),
            Element::Fire => (StatusKind::Burn, 3_000),
        }
    }

    /// Stronger status effect applied by special attacks of this element.
    #[must_use]
    pub const fn strong_status_effect(self) -> (StatusKind, u64) {
        match self {
            Element::Ice => (StatusKind::Freeze, 5_000),
            Element::Fire => (StatusKind::Burn, 5_000),
        }
    }
}

/// Kinds of timed status effects an enemy may carry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StatusKind {
    /// Movement speed halved while active.
    Slow,
    /// Periodic damage while active.
    Burn,
    /// Movement stopped entirely while active.
    Freeze,
}

/// Timed status effect instance attached to an enemy.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StatusEffect {
    /// Kind of effect applied.
    pub kind: StatusKind,
    /// Simulated timestamp at which the effect wears off.
    pub expires_at_ms: u64,
}

/// Lifecycle phase of a match session.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MatchPhase {
    /// The session exists but simulation has not begun.
    NotStarted,
    /// Waves are running and the tick loop advances the simulation.
    Active,
    /// The match concluded; no further simulation occurs.
    GameOver {
        /// Whether the player won the match.
        victory: bool,
    },
}

/// Reason attached to a currency mutation event.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CurrencyReason {
    /// Currency granted for defeating an enemy.
    EnemyReward,
    /// Currency spent placing a defence.
    DefensePurchase,
}

/// Reasons a defence placement request may be rejected by the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Error, Serialize, Deserialize)]
pub enum PlacementError {
    /// The player cannot afford the requested defence.
    #[error("insufficient funds for the requested defence")]
    InsufficientFunds,
    /// The requested position lies outside the configured bounds.
    #[error("placement position lies outside the world bounds")]
    OutOfBounds,
    /// The match has concluded, so placement is disabled.
    #[error("the match is no longer active")]
    MatchNotActive,
}

/// Commands that express all permissible world mutations.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Advances the simulation clock by the provided delta time.
    Tick {
        /// Simulated milliseconds elapsed since the previous tick.
        dt_ms: u64,
    },
    /// Drops retired enemies from the registry.
    PruneEnemies,
    /// Transitions the match from `NotStarted` to `Active`.
    StartMatch,
    /// Requests that a new enemy join the path for the given wave.
    SpawnEnemy {
        /// Kind of enemy to construct.
        kind: EnemyKind,
        /// Wave the spawn is accounted against.
        wave: u32,
    },
    /// Advances the match to the provided wave through normal completion.
    AdvanceWave {
        /// Wave number that becomes current.
        wave: u32,
    },
    /// Advances the match to the provided wave after a watchdog timeout.
    ForceAdvanceWave {
        /// Wave number that becomes current.
        wave: u32,
    },
    /// Externally skips to the next wave, retiring all active enemies.
    ForceNextWave,
    /// Requests placement of a defence at the provided position.
    PlaceDefense {
        /// Kind of defence to construct.
        kind: DefenseKind,
        /// Location of the new defence.
        position: Position,
    },
    /// Resolves a direct attack from a defence against an enemy.
    Strike {
        /// Defence performing the attack.
        defense: DefenseId,
        /// Enemy selected as the primary target.
        target: EnemyId,
    },
    /// Resolves a special attack from the provided defence.
    TriggerSpecial {
        /// Defence whose special attack fires.
        defense: DefenseId,
    },
    /// Applies player-issued damage that credits no defence.
    ManualStrike {
        /// Enemy the player struck.
        target: EnemyId,
        /// Flat damage applied to the target.
        damage: f32,
    },
}

/// Events broadcast by the world after processing commands.
#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    /// Indicates that the simulation clock advanced.
    TimeAdvanced {
        /// Simulated milliseconds that elapsed in the tick.
        dt_ms: u64,
    },
    /// Confirms that the match became active.
    MatchStarted,
    /// Confirms that an enemy was created and joined the path.
    EnemySpawned {
        /// Identifier assigned to the new enemy.
        id: EnemyId,
        /// Kind of the new enemy.
        kind: EnemyKind,
        /// Location the enemy occupies after spawning.
        position: Position,
    },
    /// Reports that enemy construction failed; the spawn still counts
    /// toward the wave quota.
    SpawnFailed {
        /// Wave the failed spawn was accounted against.
        wave: u32,
    },
    /// Confirms that an enemy was defeated and retired.
    EnemyDefeated {
        /// Identifier of the defeated enemy.
        id: EnemyId,
        /// Kind of the defeated enemy.
        kind: EnemyKind,
        /// Currency granted for the defeat.
        reward: u32,
        /// Defence credited with the kill, when one exists.
        by: Option<DefenseId>,
    },
    /// Confirms that an enemy reached the end of the path.
    EnemyEscaped {
        /// Identifier of the escaped enemy.
        id: EnemyId,
    },
    /// Announces that a new wave became current.
    WaveChanged {
        /// Wave number that is now current.
        wave_number: u32,
    },
    /// Reports that the stuck-state watchdog forced a wave transition.
    WaveAdvanceForced {
        /// Wave number that is now current.
        wave_number: u32,
    },
    /// Reports a mutation of the player's currency balance.
    CurrencyDelta {
        /// Signed currency change.
        amount: i64,
        /// Why the balance changed.
        reason: CurrencyReason,
    },
    /// Confirms that a defence was placed into the world.
    DefensePlaced {
        /// Identifier assigned to the defence by the world.
        id: DefenseId,
        /// Kind of defence that was placed.
        kind: DefenseKind,
        /// Location of the new defence.
        position: Position,
    },
    /// Reports that a defence placement request was rejected.
    DefenseRejected {
        /// Kind of defence requested for placement.
        kind: DefenseKind,
        /// Specific reason the placement failed.
        reason: PlacementError,
    },
    /// Confirms that a defence's special attack fired.
    SpecialTriggered {
        /// Defence whose special attack fired.
        defense: DefenseId,
        /// Number of enemies struck by the special.
        struck: u32,
    },
    /// Announces that the match concluded.
    MatchEnded {
        /// Whether the player won the match.
        victory: bool,
        /// Score accumulated over the match.
        final_score: u64,
        /// Wave that was current when the match ended.
        final_wave: u32,
        /// Currency balance when the match ended.
        final_currency: u64,
    },
}

/// Immutable representation of a single enemy's state used for queries.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EnemySnapshot {
    /// Unique identifier assigned to the enemy.
    pub id: EnemyId,
    /// Kind of the enemy.
    pub kind: EnemyKind,
    /// Location currently occupied by the enemy.
    pub position: Position,
    /// Remaining health.
    pub health: f32,
    /// Health the enemy spawned with.
    pub max_health: f32,
}

/// Read-only snapshot describing all active enemies.
#[derive(Clone, Debug, Default)]
pub struct EnemyView {
    snapshots: Vec<EnemySnapshot>,
}

impl EnemyView {
    /// Creates a new enemy view from the provided snapshots.
    #[must_use]
    pub fn from_snapshots(mut snapshots: Vec<EnemySnapshot>) -> Self {
        snapshots.sort_by_key(|snapshot| snapshot.id);
        Self { snapshots }
    }

    /// Iterator over the captured enemy snapshots in identifier order.
    pub fn iter(&self) -> impl Iterator<Item = &EnemySnapshot> {
        self.snapshots.iter()
    }

    /// Number of active enemies captured by the view.
    #[must_use]
    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    /// Reports whether the view captured no enemies.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    /// Consumes the view, yielding the underlying snapshots.
    #[must_use]
    pub fn into_vec(self) -> Vec<EnemySnapshot> {
        self.snapshots
    }
}

/// Immutable representation of a single defence's state used for queries.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DefenseSnapshot {
    /// Identifier allocated to the defence by the world.
    pub id: DefenseId,
    /// Kind of defence that was constructed.
    pub kind: DefenseKind,
    /// Location of the defence.
    pub position: Position,
    /// Simulated milliseconds until the next direct attack may fire.
    pub cooldown_remaining_ms: u32,
    /// Kills credited toward the special attack.
    pub special_charge: u32,
    /// Whether the charge threshold has been crossed.
    pub special_available: bool,
    /// Whether the special attack may fire right now.
    pub special_ready: bool,
    /// Upgrade factor applied to the defence's damage.
    pub power_multiplier: f32,
}

/// Read-only snapshot describing all placed defences.
#[derive(Clone, Debug, Default)]
pub struct DefenseView {
    snapshots: Vec<DefenseSnapshot>,
}

impl DefenseView {
    /// Creates a new defence view from the provided snapshots.
    #[must_use]
    pub fn from_snapshots(mut snapshots: Vec<DefenseSnapshot>) -> Self {
        snapshots.sort_by_key(|snapshot| snapshot.id);
        Self { snapshots }
    }

    /// Iterator over the captured defence snapshots in identifier order.
    pub fn iter(&self) -> impl Iterator<Item = &DefenseSnapshot> {
        self.snapshots.iter()
    }

    /// Number of defences captured by the view.
    #[must_use]
    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    /// Reports whether the view captured no defences.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    /// Consumes the view, yielding the underlying snapshots.
    #[must_use]
    pub fn into_vec(self) -> Vec<DefenseSnapshot> {
        self.snapshots
    }
}

/// Read-only summary of the match-level scalars.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MatchSummary {
    /// Remaining lives.
    pub lives: u32,
    /// Score accumulated from defeats.
    pub score: u64,
    /// Spendable currency balance.
    pub currency: u64,
    /// Wave number that is currently running.
    pub wave_number: u32,
    /// Lifecycle phase of the match.
    pub phase: MatchPhase,
}
