//! Authoritative defence state management utilities.

use std::collections::BTreeMap;

use harvest_defence_core::{
    DefenseId, DefenseKind, Position, SPECIAL_CHARGE_THRESHOLD, SPECIAL_COOLDOWN_MS,
};

/// Mutable defence state stored inside the world.
#[derive(Clone, Debug)]
pub(crate) struct DefenseState {
    pub(crate) id: DefenseId,
    pub(crate) kind: DefenseKind,
    pub(crate) position: Position,
    pub(crate) cooldown_remaining_ms: u32,
    pub(crate) special_charge: u32,
    pub(crate) special_available: bool,
    pub(crate) special_last_used_ms: Option<u64>,
    pub(crate) power_multiplier: f32,
}

impl DefenseState {
    fn new(id: DefenseId, kind: DefenseKind, position: Position) -> Self {
        Self {
            id,
            kind,
            position,
            cooldown_remaining_ms: 0,
            special_charge: 0,
            special_available: false,
            special_last_used_ms: None,
            power_multiplier: 1.0,
        }
    }

    /// Credits one kill toward the special charge; saturates at the
    /// threshold so repeated kills never double-count past the cap.
    pub(crate) fn credit_kill(&mut self) {
        self.special_charge = (self.special_charge + 1).min(SPECIAL_CHARGE_THRESHOLD);
        if self.special_charge >= SPECIAL_CHARGE_THRESHOLD {
            self.special_available = true;
        }
    }

    /// Reports whether the special attack may fire at `now`.
    pub(crate) fn special_ready(&self, now_ms: u64) -> bool {
        self.special_available
            && self
                .special_last_used_ms
                .map_or(true, |used| now_ms.saturating_sub(used) >= SPECIAL_COOLDOWN_MS)
    }

    /// Consumes the charge after a special attack fires.
    pub(crate) fn reset_special(&mut self, now_ms: u64) {
        self.special_charge = 0;
        self.special_available = false;
        self.special_last_used_ms = Some(now_ms);
    }
}

/// Registry that stores defences and manages identifier allocation.
#[derive(Debug, Default)]
pub(crate) struct DefenseRegistry {
    entries: BTreeMap<DefenseId, DefenseState>,
    next_id: u32,
}

impl DefenseRegistry {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn insert(&mut self, kind: DefenseKind, position: Position) -> DefenseId {
        let id = DefenseId::new(self.next_id);
        self.next_id = self.next_id.wrapping_add(1);
        let _ = self
            .entries
            .insert(id, DefenseState::new(id, kind, position));
        id
    }

    pub(crate) fn get(&self, id: DefenseId) -> Option<&DefenseState> {
        self.entries.get(&id)
    }

    pub(crate) fn get_mut(&mut self, id: DefenseId) -> Option<&mut DefenseState> {
        self.entries.get_mut(&id)
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = &DefenseState> {
        self.entries.values()
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = &mut DefenseState> {
        self.entries.values_mut()
    }
}
