#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Deterministic wave progression system.
//!
//! The director owns the wave lifecycle: it schedules spawn commands on a
//! per-wave cadence, waits for the field to clear once the quota is met, and
//! advances to the next wave. A stuck-state watchdog forces the transition
//! when a requested advance is never confirmed by the world.

use harvest_defence_core::{Command, EnemyKind, Event};
use sha2::{Digest, Sha256};

/// Delay before the first spawn of every wave.
const FIRST_SPAWN_DELAY_MS: u64 = 250;

/// Spawn interval of wave one; later waves shrink it geometrically.
const BASE_SPAWN_INTERVAL_MS: f64 = 1_800.0;

/// Per-wave shrink factor applied to the spawn interval.
const SPAWN_INTERVAL_DECAY: f64 = 0.8;

/// Lower clamp of the spawn interval.
const MIN_SPAWN_INTERVAL_MS: f64 = 450.0;

/// Enemies fielded by wave one.
const BASE_WAVE_QUOTA: u32 = 5;

/// Extra enemies fielded per wave past the first.
const WAVE_QUOTA_GROWTH: u32 = 3;

/// Upper clamp of the per-wave enemy quota.
const MAX_WAVE_QUOTA: u32 = 100;

/// Simulated time the director waits for a requested advance to be
/// confirmed before forcing the transition.
const STUCK_ADVANCE_TIMEOUT_MS: u64 = 8_000;

/// Waves divisible by this value receive the boss weight bonus.
const BOSS_WAVE_PERIOD: u32 = 5;

/// Weight bonus granted to heavy enemy kinds on boss waves.
const BOSS_WEIGHT_BONUS: u64 = 25;

/// Configuration parameters required to construct the wave director.
#[derive(Clone, Copy, Debug)]
pub struct Config {
    global_seed: u64,
}

impl Config {
    /// Creates a new configuration using the provided deterministic seed.
    #[must_use]
    pub const fn new(global_seed: u64) -> Self {
        Self { global_seed }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Phase {
    Idle,
    Spawning,
    AwaitingClear,
    Advancing,
}

/// Stateful system that drives wave progression from the event stream.
#[derive(Debug)]
pub struct WaveDirector {
    global_seed: u64,
    phase: Phase,
    wave: u32,
    quota: u32,
    spawned: u32,
    interval_ms: u64,
    accumulator_ms: u64,
    advancing_ms: u64,
    rng: SplitMix64,
}

impl WaveDirector {
    /// Creates a new director that idles until the match starts.
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self {
            global_seed: config.global_seed,
            phase: Phase::Idle,
            wave: 0,
            quota: 0,
            spawned: 0,
            interval_ms: 0,
            accumulator_ms: 0,
            advancing_ms: 0,
            rng: SplitMix64::new(config.global_seed),
        }
    }

    /// Wave the director is currently running, zero while idle.
    #[must_use]
    pub fn current_wave(&self) -> u32 {
        self.wave
    }

    /// Consumes events and the active-enemy count to emit wave commands.
    pub fn handle(&mut self, events: &[Event], active_enemies: u32, out: &mut Vec<Command>) {
        let mut elapsed_ms = 0u64;
        for event in events {
            match event {
                Event::MatchStarted => self.begin_wave(1),
                Event::WaveChanged { wave_number } => self.begin_wave(*wave_number),
                Event::MatchEnded { .. } => self.phase = Phase::Idle,
                Event::TimeAdvanced { dt_ms } => {
                    elapsed_ms = elapsed_ms.saturating_add(*dt_ms);
                }
                _ => {}
            }
        }

        if elapsed_ms == 0 {
            return;
        }

        match self.phase {
            Phase::Idle => {}
            Phase::Spawning => self.run_spawning(elapsed_ms, out),
            Phase::AwaitingClear => self.run_awaiting_clear(active_enemies, out),
            Phase::Advancing => self.run_advancing(elapsed_ms, out),
        }
    }

    fn begin_wave(&mut self, wave: u32) {
        self.phase = Phase::Spawning;
        self.wave = wave;
        self.quota = quota_for_wave(wave);
        self.spawned = 0;
        self.interval_ms = interval_for_wave(wave);
        self.accumulator_ms = 0;
        self.advancing_ms = 0;
        self.rng = SplitMix64::new(derive_wave_seed(self.global_seed, wave));
        log::debug!(
            "wave {wave} begins: quota {quota}, interval {interval}ms",
            quota = self.quota,
            interval = self.interval_ms
        );
    }

    fn run_spawning(&mut self, elapsed_ms: u64, out: &mut Vec<Command>) {
        self.accumulator_ms = self.accumulator_ms.saturating_add(elapsed_ms);

        while self.spawned < self.quota {
            let threshold = if self.spawned == 0 {
                FIRST_SPAWN_DELAY_MS
            } else {
                self.interval_ms
            };
            if self.accumulator_ms < threshold {
                break;
            }
            self.accumulator_ms -= threshold;

            let kind = select_kind(&mut self.rng, self.wave);
            out.push(Command::SpawnEnemy {
                kind,
                wave: self.wave,
            });
            self.spawned += 1;
        }

        if self.spawned >= self.quota {
            self.phase = Phase::AwaitingClear;
        }
    }

    fn run_awaiting_clear(&mut self, active_enemies: u32, out: &mut Vec<Command>) {
        if active_enemies == 0 {
            self.phase = Phase::Advancing;
            self.advancing_ms = 0;
            out.push(Command::AdvanceWave {
                wave: self.wave.saturating_add(1),
            });
        }
    }

    fn run_advancing(&mut self, elapsed_ms: u64, out: &mut Vec<Command>) {
        self.advancing_ms = self.advancing_ms.saturating_add(elapsed_ms);
        if self.advancing_ms >= STUCK_ADVANCE_TIMEOUT_MS {
            log::warn!(
                "wave {wave} advance unconfirmed after {STUCK_ADVANCE_TIMEOUT_MS}ms; forcing",
                wave = self.wave
            );
            self.advancing_ms = 0;
            out.push(Command::ForceAdvanceWave {
                wave: self.wave.saturating_add(1),
            });
        }
    }
}

/// Number of enemies fielded by the provided wave.
#[must_use]
pub fn quota_for_wave(wave: u32) -> u32 {
    let scaled = BASE_WAVE_QUOTA.saturating_add(WAVE_QUOTA_GROWTH.saturating_mul(wave.saturating_sub(1)));
    scaled.min(MAX_WAVE_QUOTA)
}

/// Spawn interval of the provided wave in simulated milliseconds.
#[must_use]
pub fn interval_for_wave(wave: u32) -> u64 {
    let exponent = wave.saturating_sub(1).min(i32::MAX as u32) as i32;
    let interval = BASE_SPAWN_INTERVAL_MS * SPAWN_INTERVAL_DECAY.powi(exponent);
    interval.max(MIN_SPAWN_INTERVAL_MS) as u64
}

/// Selection weight of an enemy kind on the provided wave.
#[must_use]
pub fn weight_for(kind: EnemyKind, wave: u32) -> u64 {
    let (base, growth, cap, min_wave, boss): (u64, u32, u64, u32, bool) = match kind {
        EnemyKind::Bird => (70, 0, 70, 1, false),
        EnemyKind::Rabbit => (70, 0, 70, 1, false),
        EnemyKind::Slime => (20, 5, 60, 1, false),
        EnemyKind::Bat => (20, 5, 60, 1, false),
        EnemyKind::Wolf => (10, 6, 70, 3, true),
        EnemyKind::Boar => (10, 6, 80, 5, true),
        EnemyKind::Golem => (8, 8, 90, 8, true),
    };

    if wave < min_wave {
        return 0;
    }

    let grown = base + u64::from(growth) * u64::from(wave - min_wave);
    let mut weight = grown.min(cap);
    if boss && wave % BOSS_WAVE_PERIOD == 0 {
        weight += BOSS_WEIGHT_BONUS;
    }
    weight
}

fn select_kind(rng: &mut SplitMix64, wave: u32) -> EnemyKind {
    let total: u64 = EnemyKind::ALL
        .iter()
        .map(|kind| weight_for(*kind, wave))
        .sum();
    if total == 0 {
        return EnemyKind::FALLBACK;
    }

    let roll = rng.next_u64() % total;
    let mut cumulative = 0u64;
    for kind in EnemyKind::ALL {
        cumulative += weight_for(kind, wave);
        if roll < cumulative {
            return kind;
        }
    }
    EnemyKind::FALLBACK
}

fn derive_wave_seed(global_seed: u64, wave: u32) -> u64 {
    let mut hasher = Sha256::new();
    hasher.update(global_seed.to_le_bytes());
    hasher.update(b"wave-director");
    hasher.update(wave.to_le_bytes());
    let digest = hasher.finalize();
    let bytes: [u8; 8] = digest[0..8].try_into().expect("sha256 digest slice length");
    u64::from_le_bytes(bytes)
}

#[derive(Debug)]
struct SplitMix64 {
    state: u64,
}

impl SplitMix64 {
    fn new(seed: u64) -> Self {
        let seed = if seed == 0 { 0x9e3779b97f4a7c15 } else { seed };
        Self { state: seed }
    }

    fn next_u64(&mut self) -> u64 {
        self.state = self.state.wrapping_add(0x9e3779b97f4a7c15);
        let mut z = self.state;
        z = (z ^ (z >> 30)).wrapping_mul(0xbf58476d1ce4e5b9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94d049bb133111eb);
        z ^ (z >> 31)
    }
}
