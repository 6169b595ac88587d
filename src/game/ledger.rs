//! Declared actions awaiting resolution
//!
//! Attacks, charges and pending piloting rolls are recorded here during a
//! phase and read back by the combat resolution layer. Each list is only
//! mutated through `record`, `remove_all_for` and `reset`.

use crate::core::{EntityId, HexCoord};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Anything declared by (and purged with) a single unit
pub trait EntityScoped {
    fn entity(&self) -> EntityId;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PhysicalKind {
    Punch,
    Kick,
    Push,
    Club,
}

/// A declared intent
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntityAction {
    WeaponAttack {
        attacker: EntityId,
        target: EntityId,
        weapon: u32,
    },
    Charge {
        attacker: EntityId,
        target: EntityId,
        from: HexCoord,
    },
    DeathFromAbove {
        attacker: EntityId,
        target: EntityId,
        from: HexCoord,
    },
    PhysicalAttack {
        attacker: EntityId,
        target: EntityId,
        kind: PhysicalKind,
    },
}

impl EntityAction {
    pub fn target(&self) -> EntityId {
        match self {
            EntityAction::WeaponAttack { target, .. }
            | EntityAction::Charge { target, .. }
            | EntityAction::DeathFromAbove { target, .. }
            | EntityAction::PhysicalAttack { target, .. } => *target,
        }
    }

    /// Charges and death-from-above attacks resolve after the physical phase
    pub fn is_displacement(&self) -> bool {
        matches!(
            self,
            EntityAction::Charge { .. } | EntityAction::DeathFromAbove { .. }
        )
    }
}

impl EntityScoped for EntityAction {
    fn entity(&self) -> EntityId {
        match self {
            EntityAction::WeaponAttack { attacker, .. }
            | EntityAction::Charge { attacker, .. }
            | EntityAction::DeathFromAbove { attacker, .. }
            | EntityAction::PhysicalAttack { attacker, .. } => *attacker,
        }
    }
}

impl fmt::Display for EntityAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityAction::WeaponAttack {
                attacker,
                target,
                weapon,
            } => write!(f, "{attacker} fires weapon {weapon} at {target}"),
            EntityAction::Charge { attacker, target, .. } => write!(f, "{attacker} charges {target}"),
            EntityAction::DeathFromAbove { attacker, target, .. } => {
                write!(f, "{attacker} jumps onto {target}")
            }
            EntityAction::PhysicalAttack {
                attacker,
                target,
                kind,
            } => write!(f, "{attacker} attacks {target} ({kind:?})"),
        }
    }
}

/// A piloting skill roll owed at the end of movement
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PilotingRoll {
    pub entity: EntityId,
    pub reason: String,
}

impl PilotingRoll {
    pub fn new(entity: EntityId, reason: impl Into<String>) -> Self {
        PilotingRoll {
            entity,
            reason: reason.into(),
        }
    }
}

impl EntityScoped for PilotingRoll {
    fn entity(&self) -> EntityId {
        self.entity
    }
}

/// Append-only list with per-entity purge
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionList<T> {
    items: Vec<T>,
}

impl<T: EntityScoped> ActionList<T> {
    pub fn new() -> Self {
        ActionList { items: Vec::new() }
    }

    pub fn record(&mut self, item: T) {
        self.items.push(item);
    }

    /// Read-only view in declaration order
    pub fn all(&self) -> &[T] {
        &self.items
    }

    pub fn for_entity(&self, entity: EntityId) -> impl Iterator<Item = &T> {
        self.items.iter().filter(move |item| item.entity() == entity)
    }

    /// Drop everything declared by `entity`; returns how many were dropped
    pub fn remove_all_for(&mut self, entity: EntityId) -> usize {
        let before = self.items.len();
        self.items.retain(|item| item.entity() != entity);
        before - self.items.len()
    }

    pub fn reset(&mut self) {
        self.items.clear();
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl<T: EntityScoped> Default for ActionList<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Everything declared so far this phase
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionLedger {
    /// Attacks declared in the current phase
    pub actions: ActionList<EntityAction>,
    /// Charges and DFAs, resolved at the end of the physical phase
    pub pending_charges: ActionList<EntityAction>,
    /// Rolls owed at the end of movement
    pub pending_rolls: ActionList<PilotingRoll>,
}

impl ActionLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Purge a unit from every list
    pub fn remove_all_for(&mut self, entity: EntityId) -> usize {
        self.actions.remove_all_for(entity)
            + self.pending_charges.remove_all_for(entity)
            + self.pending_rolls.remove_all_for(entity)
    }

    pub fn reset(&mut self) {
        self.actions.reset();
        self.pending_charges.reset();
        self.pending_rolls.reset();
    }
}
