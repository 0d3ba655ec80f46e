//! Authoritative enemy ownership: the registry, the path, and enemy state.

use std::collections::BTreeMap;

use harvest_defence_core::{EnemyId, EnemyKind, Position, StatusEffect, StatusKind};
use thiserror::Error;

/// Movement factor applied while a slow effect is active.
const SLOW_FACTOR: f32 = 0.5;

/// Upper bound on simultaneously active enemies; spawning beyond it fails.
const MAX_ACTIVE_ENEMIES: usize = 1024;

/// Errors that prevent the path from being constructed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum PathError {
    /// A path needs at least two waypoints to define a direction of travel.
    #[error("a path requires at least two waypoints")]
    TooFewWaypoints,
    /// All waypoints coincide, leaving no distance for enemies to cover.
    #[error("the path has zero total length")]
    ZeroLength,
}

/// Errors that prevent an enemy from being constructed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum ConstructionError {
    /// The registry reached its active-enemy capacity.
    #[error("the enemy registry is full")]
    RegistryFull,
}

/// Polyline that enemies traverse from spawn to escape.
#[derive(Clone, Debug)]
pub struct Path {
    waypoints: Vec<Position>,
    segment_lengths: Vec<f32>,
    total_length: f32,
}

impl Path {
    /// Builds a path from the provided waypoints, validating its geometry.
    pub fn new(waypoints: Vec<Position>) -> Result<Self, PathError> {
        if waypoints.len() < 2 {
            return Err(PathError::TooFewWaypoints);
        }

        let mut segment_lengths = Vec::with_capacity(waypoints.len() - 1);
        let mut total_length = 0.0;
        for pair in waypoints.windows(2) {
            let length = pair[0].distance_to(pair[1]);
            segment_lengths.push(length);
            total_length += length;
        }

        if total_length <= 0.0 {
            return Err(PathError::ZeroLength);
        }

        Ok(Self {
            waypoints,
            segment_lengths,
            total_length,
        })
    }

    /// Total arc length of the path in world units.
    #[must_use]
    pub fn total_length(&self) -> f32 {
        self.total_length
    }

    /// Location where enemies enter the path.
    #[must_use]
    pub fn start(&self) -> Position {
        self.waypoints[0]
    }

    /// Interpolates the location at the provided arc-length progress.
    ///
    /// Progress is clamped to the path, so callers never observe positions
    /// beyond the final waypoint.
    #[must_use]
    pub fn point_at(&self, progress: f32) -> Position {
        let mut remaining = progress.clamp(0.0, self.total_length);
        for (index, length) in self.segment_lengths.iter().enumerate() {
            if remaining <= *length && *length > 0.0 {
                let from = self.waypoints[index];
                let to = self.waypoints[index + 1];
                let t = remaining / *length;
                return Position::new(
                    from.x() + (to.x() - from.x()) * t,
                    from.y() + (to.y() - from.y()) * t,
                );
            }
            remaining -= *length;
        }
        self.waypoints[self.waypoints.len() - 1]
    }
}

/// Mutable enemy state owned exclusively by the registry.
#[derive(Clone, Debug)]
pub(crate) struct Enemy {
    pub(crate) id: EnemyId,
    pub(crate) kind: EnemyKind,
    pub(crate) position: Position,
    pub(crate) health: f32,
    pub(crate) max_health: f32,
    pub(crate) speed: f32,
    pub(crate) statuses: Vec<StatusEffect>,
    pub(crate) progress: f32,
    pub(crate) active: bool,
}

impl Enemy {
    fn spawn(id: EnemyId, kind: EnemyKind, path: &Path) -> Self {
        let stats = kind.stats();
        Self {
            id,
            kind,
            position: path.start(),
            health: stats.max_health(),
            max_health: stats.max_health(),
            speed: stats.speed(),
            statuses: Vec::new(),
            progress: 0.0,
            active: true,
        }
    }

    /// Applies or refreshes a timed status effect.
    pub(crate) fn apply_status(&mut self, kind: StatusKind, expires_at_ms: u64) {
        for status in &mut self.statuses {
            if status.kind == kind {
                status.expires_at_ms = status.expires_at_ms.max(expires_at_ms);
                return;
            }
        }
        self.statuses.push(StatusEffect {
            kind,
            expires_at_ms,
        });
    }

    /// Drops every status effect that expired at or before `now`.
    pub(crate) fn expire_statuses(&mut self, now_ms: u64) {
        self.statuses.retain(|status| status.expires_at_ms > now_ms);
    }

    /// Reports whether the provided status is active at `now`.
    pub(crate) fn has_status(&self, kind: StatusKind, now_ms: u64) -> bool {
        self.statuses
            .iter()
            .any(|status| status.kind == kind && status.expires_at_ms > now_ms)
    }

    /// Movement multiplier derived from active status effects.
    pub(crate) fn speed_factor(&self, now_ms: u64) -> f32 {
        if self.has_status(StatusKind::Freeze, now_ms) {
            0.0
        } else if self.has_status(StatusKind::Slow, now_ms) {
            SLOW_FACTOR
        } else {
            1.0
        }
    }
}

/// Registry that owns every enemy entity and manages identifier allocation.
///
/// Membership mutates only through [`EnemyRegistry::spawn`],
/// [`EnemyRegistry::retire`], and [`EnemyRegistry::prune_retired`]; once an
/// enemy is retired, no query returns its identifier again.
#[derive(Debug, Default)]
pub(crate) struct EnemyRegistry {
    entries: BTreeMap<EnemyId, Enemy>,
    next_id: u32,
}

impl EnemyRegistry {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Constructs a new enemy at the path start.
    pub(crate) fn spawn(
        &mut self,
        kind: EnemyKind,
        path: &Path,
    ) -> Result<EnemyId, ConstructionError> {
        if self.active_count() >= MAX_ACTIVE_ENEMIES {
            return Err(ConstructionError::RegistryFull);
        }

        let id = EnemyId::new(self.next_id);
        self.next_id = self.next_id.wrapping_add(1);
        let _ = self.entries.insert(id, Enemy::spawn(id, kind, path));
        Ok(id)
    }

    pub(crate) fn get(&self, id: EnemyId) -> Option<&Enemy> {
        self.entries.get(&id).filter(|enemy| enemy.active)
    }

    pub(crate) fn get_mut(&mut self, id: EnemyId) -> Option<&mut Enemy> {
        self.entries.get_mut(&id).filter(|enemy| enemy.active)
    }

    /// Marks the enemy inactive; queries never return it afterwards.
    pub(crate) fn retire(&mut self, id: EnemyId) -> bool {
        match self.entries.get_mut(&id) {
            Some(enemy) if enemy.active => {
                enemy.active = false;
                true
            }
            _ => false,
        }
    }

    /// Retires every active enemy, returning the identifiers in order.
    pub(crate) fn retire_all_active(&mut self) -> Vec<EnemyId> {
        let mut retired = Vec::new();
        for enemy in self.entries.values_mut() {
            if enemy.active {
                enemy.active = false;
                retired.push(enemy.id);
            }
        }
        retired
    }

    /// Drops retired entries, returning how many were removed.
    pub(crate) fn prune_retired(&mut self) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, enemy| enemy.active);
        before - self.entries.len()
    }

    pub(crate) fn active_count(&self) -> usize {
        self.entries.values().filter(|enemy| enemy.active).count()
    }

    pub(crate) fn iter_active(&self) -> impl Iterator<Item = &Enemy> {
        self.entries.values().filter(|enemy| enemy.active)
    }

    pub(crate) fn iter_active_mut(&mut self) -> impl Iterator<Item = &mut Enemy> {
        self.entries.values_mut().filter(|enemy| enemy.active)
    }

    /// Active enemies within `radius` of `center`, nearest first with the
    /// identifier as the tie-break.
    pub(crate) fn query_in_radius(&self, center: Position, radius: f32) -> Vec<EnemyId> {
        let mut hits: Vec<(f32, EnemyId)> = self
            .iter_active()
            .filter_map(|enemy| {
                let distance = center.distance_to(enemy.position);
                (distance <= radius).then_some((distance, enemy.id))
            })
            .collect();
        hits.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));
        hits.into_iter().map(|(_, id)| id).collect()
    }
}
