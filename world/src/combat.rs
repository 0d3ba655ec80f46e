//! Shared damage-application and defeat/escape resolution logic.
//!
//! Every attacker (direct strikes, splash damage, specials, burn ticks, and
//! player clicks) funnels through [`apply_damage`] so defeat resolution stays
//! idempotent: an enemy is retired exactly once and produces exactly one
//! reward, no matter how many damage sources race on the same tick.

use harvest_defence_core::{
    CurrencyReason, DefenseId, Element, EnemyId, Event, MatchPhase, Position,
};

use crate::defenses::DefenseRegistry;
use crate::enemies::EnemyRegistry;
use crate::MatchState;

/// Lower clamp of the area-damage falloff curve.
const FALLOFF_FLOOR: f32 = 0.5;

/// Damage scale for an enemy `distance` away from an area-damage `center`.
///
/// Falls linearly from 1.0 at the centre to 0.5 at the rim.
pub(crate) fn falloff(distance: f32, radius: f32) -> f32 {
    if radius <= 0.0 {
        return 1.0;
    }
    (1.0 - 0.5 * (distance / radius)).clamp(FALLOFF_FLOOR, 1.0)
}

/// Subtracts `amount` from the target's health, clamped at zero, and
/// resolves defeat when health reaches zero.
///
/// A kill credits `source` when it names a defence; manual player damage and
/// environmental damage pass `None` and credit nobody. Damage against a
/// retired or unknown enemy is a silent no-op.
pub(crate) fn apply_damage(
    enemies: &mut EnemyRegistry,
    defenses: &mut DefenseRegistry,
    match_state: &mut MatchState,
    target: EnemyId,
    amount: f32,
    source: Option<DefenseId>,
    out_events: &mut Vec<Event>,
) {
    let Some(enemy) = enemies.get_mut(target) else {
        return;
    };

    enemy.health = (enemy.health - amount).max(0.0);
    if enemy.health > 0.0 {
        return;
    }

    let kind = enemy.kind;
    let reward = kind.stats().reward();
    let _ = enemies.retire(target);

    match_state.score += u64::from(reward);
    match_state.currency += u64::from(reward);
    out_events.push(Event::EnemyDefeated {
        id: target,
        kind,
        reward,
        by: source,
    });
    out_events.push(Event::CurrencyDelta {
        amount: i64::from(reward),
        reason: CurrencyReason::EnemyReward,
    });

    if let Some(defense) = source {
        if let Some(state) = defenses.get_mut(defense) {
            state.credit_kill();
        }
    }
}

/// Applies falloff-scaled damage to every active enemy within `radius` of
/// `center`, then applies the element's status effect to the survivors.
///
/// Returns the number of enemies struck.
#[allow(clippy::too_many_arguments)]
pub(crate) fn apply_area_damage(
    enemies: &mut EnemyRegistry,
    defenses: &mut DefenseRegistry,
    match_state: &mut MatchState,
    center: Position,
    radius: f32,
    damage: f32,
    element: Option<Element>,
    source: Option<DefenseId>,
    now_ms: u64,
    out_events: &mut Vec<Event>,
) -> u32 {
    if radius <= 0.0 {
        return 0;
    }

    let hits = enemies.query_in_radius(center, radius);
    let struck = hits.len() as u32;

    for id in hits {
        let Some(enemy) = enemies.get(id) else {
            continue;
        };
        let distance = center.distance_to(enemy.position);
        let scaled = damage * falloff(distance, radius);
        apply_damage(enemies, defenses, match_state, id, scaled, source, out_events);

        if let Some(element) = element {
            if let Some(enemy) = enemies.get_mut(id) {
                let (status, duration_ms) = element.status_effect();
                enemy.apply_status(status, now_ms + duration_ms);
            }
        }
    }

    struck
}

/// Retires an enemy that completed the path, costing the player one life.
///
/// No reward is granted. Reaching zero lives ends the match as a defeat.
pub(crate) fn resolve_escape(
    enemies: &mut EnemyRegistry,
    match_state: &mut MatchState,
    id: EnemyId,
    out_events: &mut Vec<Event>,
) {
    if !enemies.retire(id) {
        return;
    }

    match_state.lives = match_state.lives.saturating_sub(1);
    out_events.push(Event::EnemyEscaped { id });

    if match_state.lives == 0 && match_state.phase == MatchPhase::Active {
        match_state.phase = MatchPhase::GameOver { victory: false };
        out_events.push(Event::MatchEnded {
            victory: false,
            final_score: match_state.score,
            final_wave: match_state.wave_number,
            final_currency: match_state.currency,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::enemies::Path;
    use harvest_defence_core::EnemyKind;

    fn fixtures() -> (EnemyRegistry, DefenseRegistry, MatchState, Path) {
        let path =
            Path::new(vec![Position::new(0.0, 0.0), Position::new(100.0, 0.0)]).expect("path");
        let mut match_state = MatchState::new(10, 150, 1);
        match_state.phase = MatchPhase::Active;
        (
            EnemyRegistry::new(),
            DefenseRegistry::new(),
            match_state,
            path,
        )
    }

    #[test]
    fn falloff_at_rim_is_half_of_center() {
        let at_center = falloff(0.0, 80.0);
        let at_rim = falloff(80.0, 80.0);
        assert!((at_rim - at_center * 0.5).abs() < f32::EPSILON);
    }

    #[test]
    fn falloff_clamps_between_half_and_one() {
        assert_eq!(falloff(0.0, 100.0), 1.0);
        assert_eq!(falloff(500.0, 100.0), 0.5);
    }

    #[test]
    fn defeat_resolution_is_idempotent() {
        let (mut enemies, mut defenses, mut match_state, path) = fixtures();
        let id = enemies.spawn(EnemyKind::Bird, &path).expect("spawn");
        let mut events = Vec::new();

        apply_damage(
            &mut enemies,
            &mut defenses,
            &mut match_state,
            id,
            999.0,
            None,
            &mut events,
        );
        apply_damage(
            &mut enemies,
            &mut defenses,
            &mut match_state,
            id,
            999.0,
            None,
            &mut events,
        );

        let defeats = events
            .iter()
            .filter(|event| matches!(event, Event::EnemyDefeated { .. }))
            .count();
        assert_eq!(defeats, 1, "exactly one defeat event");
        assert_eq!(match_state.score, u64::from(EnemyKind::Bird.stats().reward()));
    }

    #[test]
    fn kill_credits_the_named_defense_only() {
        let (mut enemies, mut defenses, mut match_state, path) = fixtures();
        let enemy = enemies.spawn(EnemyKind::Bird, &path).expect("spawn");
        let credited = defenses.insert(
            harvest_defence_core::DefenseKind::Wizard,
            Position::new(0.0, 0.0),
        );
        let bystander = defenses.insert(
            harvest_defence_core::DefenseKind::Cannon,
            Position::new(10.0, 0.0),
        );
        let mut events = Vec::new();

        apply_damage(
            &mut enemies,
            &mut defenses,
            &mut match_state,
            enemy,
            999.0,
            Some(credited),
            &mut events,
        );

        assert_eq!(defenses.get(credited).expect("credited").special_charge, 1);
        assert_eq!(defenses.get(bystander).expect("bystander").special_charge, 0);
    }

    #[test]
    fn manual_damage_credits_no_defense() {
        let (mut enemies, mut defenses, mut match_state, path) = fixtures();
        let enemy = enemies.spawn(EnemyKind::Bird, &path).expect("spawn");
        let defense = defenses.insert(
            harvest_defence_core::DefenseKind::Wizard,
            Position::new(0.0, 0.0),
        );
        let mut events = Vec::new();

        apply_damage(
            &mut enemies,
            &mut defenses,
            &mut match_state,
            enemy,
            999.0,
            None,
            &mut events,
        );

        assert_eq!(defenses.get(defense).expect("defense").special_charge, 0);
        assert!(events
            .iter()
            .any(|event| matches!(event, Event::EnemyDefeated { by: None, .. })));
    }

    #[test]
    fn escape_decrements_lives_and_ends_match_at_zero() {
        let (mut enemies, _defenses, mut match_state, path) = fixtures();
        match_state.lives = 1;
        let id = enemies.spawn(EnemyKind::Rabbit, &path).expect("spawn");
        let mut events = Vec::new();

        resolve_escape(&mut enemies, &mut match_state, id, &mut events);

        assert_eq!(match_state.lives, 0);
        assert_eq!(match_state.phase, MatchPhase::GameOver { victory: false });
        assert!(events.iter().any(|event| matches!(
            event,
            Event::MatchEnded {
                victory: false,
                ..
            }
        )));
    }

    #[test]
    fn escape_of_retired_enemy_is_a_no_op() {
        let (mut enemies, _defenses, mut match_state, path) = fixtures();
        let id = enemies.spawn(EnemyKind::Rabbit, &path).expect("spawn");
        assert!(enemies.retire(id));
        let lives_before = match_state.lives;
        let mut events = Vec::new();

        resolve_escape(&mut enemies, &mut match_state, id, &mut events);

        assert_eq!(match_state.lives, lives_before);
        assert!(events.is_empty());
    }

    #[test]
    fn area_damage_applies_status_to_survivors() {
        let (mut enemies, mut defenses, mut match_state, path) = fixtures();
        let tough = enemies.spawn(EnemyKind::Golem, &path).expect("spawn");
        let mut events = Vec::new();

        let struck = apply_area_damage(
            &mut enemies,
            &mut defenses,
            &mut match_state,
            Position::new(0.0, 0.0),
            80.0,
            1.0,
            Some(Element::Ice),
            None,
            0,
            &mut events,
        );

        assert_eq!(struck, 1);
        let enemy = enemies.get(tough).expect("survivor");
        assert!(enemy.has_status(harvest_defence_core::StatusKind::Slow, 1_000));
    }
}
