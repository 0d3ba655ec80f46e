#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! System that computes deterministic defence attacks from world snapshots.
//!
//! Each invocation inspects the latest enemy and defence views and emits one
//! command per defence that is ready to act: a direct [`Command::Strike`]
//! against the nearest eligible enemy, or an opportunistic
//! [`Command::TriggerSpecial`] when the special attack is armed and the roll
//! succeeds.

use harvest_defence_core::{
    Command, DefenseView, EnemyId, EnemySnapshot, EnemyView, Position, TargetFilter,
};

const RNG_MULTIPLIER: u64 = 6_364_136_223_846_793_005;
const RNG_INCREMENT: u64 = 1;

/// Active-enemy count at or below which targeting filters relax.
const RELAXED_FILTER_THRESHOLD: usize = 2;

/// Percentage chance that an armed special fires instead of a direct attack.
const OPPORTUNISTIC_SPECIAL_PERCENT: u64 = 20;

/// Configuration parameters required to construct the defence controller.
#[derive(Clone, Copy, Debug)]
pub struct Config {
    rng_seed: u64,
}

impl Config {
    /// Creates a new configuration using the provided deterministic seed.
    #[must_use]
    pub const fn new(rng_seed: u64) -> Self {
        Self { rng_seed }
    }
}

/// Defence controller that reuses a scratch buffer across invocations.
#[derive(Debug)]
pub struct DefenseControl {
    rng_state: u64,
    candidates: Vec<Candidate>,
}

impl DefenseControl {
    /// Creates a new controller using the supplied configuration.
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self {
            rng_state: config.rng_seed,
            candidates: Vec::new(),
        }
    }

    /// Computes attack commands for the provided world snapshot.
    ///
    /// The output buffer is cleared before populating it with the latest
    /// batch.
    pub fn handle(&mut self, defenses: &DefenseView, enemies: &EnemyView, out: &mut Vec<Command>) {
        out.clear();

        if defenses.is_empty() || enemies.is_empty() {
            return;
        }

        let relaxed = enemies.len() <= RELAXED_FILTER_THRESHOLD;
        self.prepare_candidates(enemies);

        for defense in defenses.iter() {
            if defense.special_ready && self.roll_special() {
                out.push(Command::TriggerSpecial {
                    defense: defense.id,
                });
                continue;
            }

            if defense.cooldown_remaining_ms > 0 {
                continue;
            }

            let stats = defense.kind.stats();
            let target = select_target(
                &self.candidates,
                defense.position,
                stats.range(),
                stats.allowed_targets(),
                relaxed,
            );
            if let Some(target) = target {
                out.push(Command::Strike {
                    defense: defense.id,
                    target,
                });
            }
        }
    }

    fn prepare_candidates(&mut self, enemies: &EnemyView) {
        self.candidates.clear();
        self.candidates.reserve(enemies.len());
        for snapshot in enemies.iter() {
            self.candidates.push(Candidate::from_snapshot(snapshot));
        }
    }

    fn roll_special(&mut self) -> bool {
        self.advance_rng() % 100 < OPPORTUNISTIC_SPECIAL_PERCENT
    }

    fn advance_rng(&mut self) -> u64 {
        self.rng_state = self
            .rng_state
            .wrapping_mul(RNG_MULTIPLIER)
            .wrapping_add(RNG_INCREMENT);
        self.rng_state
    }
}

fn select_target(
    candidates: &[Candidate],
    origin: Position,
    range: f32,
    filter: TargetFilter,
    relaxed: bool,
) -> Option<EnemyId> {
    let mut best: Option<(f32, EnemyId)> = None;

    for candidate in candidates {
        if !relaxed && !filter.allows(candidate.kind) {
            continue;
        }

        let distance = origin.distance_to(candidate.position);
        if distance > range {
            continue;
        }

        let current = (distance, candidate.id);
        match &mut best {
            Some(existing) => {
                if current
                    .0
                    .total_cmp(&existing.0)
                    .then(current.1.cmp(&existing.1))
                    == std::cmp::Ordering::Less
                {
                    *existing = current;
                }
            }
            None => best = Some(current),
        }
    }

    best.map(|(_, id)| id)
}

#[derive(Clone, Copy, Debug)]
struct Candidate {
    id: EnemyId,
    position: Position,
    kind: harvest_defence_core::EnemyKind,
}

impl Candidate {
    fn from_snapshot(snapshot: &EnemySnapshot) -> Self {
        Self {
            id: snapshot.id,
            position: snapshot.position,
            kind: snapshot.kind,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use harvest_defence_core::{
        DefenseId, DefenseKind, DefenseSnapshot, EnemyKind, EnemySnapshot, EnemyView,
    };

    fn defense_snapshot(id: u32, kind: DefenseKind, at: (f32, f32)) -> DefenseSnapshot {
        DefenseSnapshot {
            id: DefenseId::new(id),
            kind,
            position: Position::new(at.0, at.1),
            cooldown_remaining_ms: 0,
            special_charge: 0,
            special_available: false,
            special_ready: false,
            power_multiplier: 1.0,
        }
    }

    fn enemy_snapshot(id: u32, kind: EnemyKind, at: (f32, f32)) -> EnemySnapshot {
        EnemySnapshot {
            id: EnemyId::new(id),
            kind,
            position: Position::new(at.0, at.1),
            health: kind.stats().max_health(),
            max_health: kind.stats().max_health(),
        }
    }

    fn views(
        defenses: Vec<DefenseSnapshot>,
        enemies: Vec<EnemySnapshot>,
    ) -> (DefenseView, EnemyView) {
        (
            DefenseView::from_snapshots(defenses),
            EnemyView::from_snapshots(enemies),
        )
    }

    #[test]
    fn strikes_nearest_enemy_in_range() {
        let mut system = DefenseControl::new(Config::new(1));
        let (defenses, enemies) = views(
            vec![defense_snapshot(0, DefenseKind::Wizard, (0.0, 0.0))],
            vec![
                enemy_snapshot(0, EnemyKind::Rabbit, (200.0, 0.0)),
                enemy_snapshot(1, EnemyKind::Rabbit, (100.0, 0.0)),
                enemy_snapshot(2, EnemyKind::Rabbit, (250.0, 0.0)),
            ],
        );

        let mut out = Vec::new();
        system.handle(&defenses, &enemies, &mut out);

        assert_eq!(
            out,
            vec![Command::Strike {
                defense: DefenseId::new(0),
                target: EnemyId::new(1),
            }]
        );
    }

    #[test]
    fn enemies_beyond_range_are_ignored() {
        let mut system = DefenseControl::new(Config::new(1));
        let (defenses, enemies) = views(
            vec![defense_snapshot(0, DefenseKind::Cannon, (0.0, 0.0))],
            vec![enemy_snapshot(0, EnemyKind::Golem, (500.0, 0.0))],
        );

        let mut out = Vec::new();
        system.handle(&defenses, &enemies, &mut out);
        assert!(out.is_empty());
    }

    #[test]
    fn ground_only_filter_skips_flyers() {
        let mut system = DefenseControl::new(Config::new(1));
        let (defenses, enemies) = views(
            vec![defense_snapshot(0, DefenseKind::Cannon, (0.0, 0.0))],
            vec![
                enemy_snapshot(0, EnemyKind::Bird, (50.0, 0.0)),
                enemy_snapshot(1, EnemyKind::Bat, (60.0, 0.0)),
                enemy_snapshot(2, EnemyKind::Golem, (150.0, 0.0)),
            ],
        );

        let mut out = Vec::new();
        system.handle(&defenses, &enemies, &mut out);

        assert_eq!(
            out,
            vec![Command::Strike {
                defense: DefenseId::new(0),
                target: EnemyId::new(2),
            }]
        );
    }

    #[test]
    fn filter_relaxes_when_few_enemies_remain() {
        let mut system = DefenseControl::new(Config::new(1));
        let (defenses, enemies) = views(
            vec![defense_snapshot(0, DefenseKind::Cannon, (0.0, 0.0))],
            vec![
                enemy_snapshot(0, EnemyKind::Bird, (50.0, 0.0)),
                enemy_snapshot(1, EnemyKind::Bat, (60.0, 0.0)),
            ],
        );

        let mut out = Vec::new();
        system.handle(&defenses, &enemies, &mut out);

        assert_eq!(
            out,
            vec![Command::Strike {
                defense: DefenseId::new(0),
                target: EnemyId::new(0),
            }]
        );
    }

    #[test]
    fn cooling_defense_stays_silent() {
        let mut system = DefenseControl::new(Config::new(1));
        let mut snapshot = defense_snapshot(0, DefenseKind::Wizard, (0.0, 0.0));
        snapshot.cooldown_remaining_ms = 400;
        let (defenses, enemies) = views(
            vec![snapshot],
            vec![enemy_snapshot(0, EnemyKind::Rabbit, (100.0, 0.0))],
        );

        let mut out = Vec::new();
        system.handle(&defenses, &enemies, &mut out);
        assert!(out.is_empty());
    }

    #[test]
    fn armed_special_eventually_fires_instead_of_striking() {
        let mut system = DefenseControl::new(Config::new(7));
        let mut snapshot = defense_snapshot(0, DefenseKind::Wizard, (0.0, 0.0));
        snapshot.special_ready = true;
        let (defenses, enemies) = views(
            vec![snapshot],
            vec![enemy_snapshot(0, EnemyKind::Golem, (100.0, 0.0))],
        );

        let mut out = Vec::new();
        let mut specials = 0;
        let mut strikes = 0;
        for _ in 0..200 {
            system.handle(&defenses, &enemies, &mut out);
            match out.as_slice() {
                [Command::TriggerSpecial { .. }] => specials += 1,
                [Command::Strike { .. }] => strikes += 1,
                other => panic!("unexpected batch {other:?}"),
            }
        }

        assert!(specials > 0, "special should fire across 200 rolls");
        assert!(strikes > 0, "direct attacks should still dominate");
        assert!(strikes > specials);
    }

    #[test]
    fn identical_seeds_replay_identical_rolls() {
        let mut first = DefenseControl::new(Config::new(11));
        let mut second = DefenseControl::new(Config::new(11));
        let mut snapshot = defense_snapshot(0, DefenseKind::Wizard, (0.0, 0.0));
        snapshot.special_ready = true;
        let (defenses, enemies) = views(
            vec![snapshot],
            vec![enemy_snapshot(0, EnemyKind::Golem, (100.0, 0.0))],
        );

        let mut out_a = Vec::new();
        let mut out_b = Vec::new();
        for _ in 0..100 {
            first.handle(&defenses, &enemies, &mut out_a);
            second.handle(&defenses, &enemies, &mut out_b);
            assert_eq!(out_a, out_b);
        }
    }

    #[test]
    fn empty_views_produce_no_commands() {
        let mut system = DefenseControl::new(Config::new(1));
        let (defenses, enemies) = views(Vec::new(), Vec::new());
        let mut out = vec![Command::PruneEnemies];
        system.handle(&defenses, &enemies, &mut out);
        assert!(out.is_empty());
    }
}
