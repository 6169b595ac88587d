//! Entity registry
//!
//! Owns every unit in the match. Live units sit on the roster in insertion
//! order; units that left play move to the graveyard. An id index over the
//! roster is kept in sync with every insertion and removal.

use crate::core::{EntityId, HexCoord, PlayerId, RemovalCondition, Unit};
use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::collections::BTreeMap;

/// Units sharing a hex; stacks are almost always tiny
pub type Occupants = SmallVec<[EntityId; 4]>;

#[derive(Debug, Clone, Default)]
pub struct EntityRegistry {
    roster: Vec<Unit>,
    index: FxHashMap<EntityId, usize>,
    graveyard: Vec<Unit>,
}

impl EntityRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn reindex(&mut self) {
        self.index = self
            .roster
            .iter()
            .enumerate()
            .map(|(i, unit)| (unit.id, i))
            .collect();
    }

    /// Add a unit to the roster; returns false (and changes nothing) if the id is taken
    pub fn add(&mut self, unit: Unit) -> bool {
        if self.contains(unit.id) || self.graveyard.iter().any(|u| u.id == unit.id) {
            return false;
        }
        self.index.insert(unit.id, self.roster.len());
        self.roster.push(unit);
        true
    }

    /// Take a unit out of play
    ///
    /// The unit is moved to the graveyard tagged with `condition`, unless it
    /// never joined the match, in which case it is dropped entirely. Returns
    /// None if the id is not on the roster.
    pub fn remove(&mut self, id: EntityId, condition: RemovalCondition) -> Option<&Unit> {
        let pos = self.index.get(&id).copied()?;
        let mut unit = self.roster.remove(pos);
        self.reindex();

        if condition == RemovalCondition::NeverJoined {
            return None;
        }
        unit.removal = Some(condition);
        unit.done = true;
        self.graveyard.push(unit);
        self.graveyard.last()
    }

    pub fn contains(&self, id: EntityId) -> bool {
        self.index.contains_key(&id)
    }

    pub fn get(&self, id: EntityId) -> Option<&Unit> {
        self.index.get(&id).map(|&i| &self.roster[i])
    }

    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut Unit> {
        let i = *self.index.get(&id)?;
        self.roster.get_mut(i)
    }

    /// Look a unit up on the roster, then in the graveyard
    pub fn get_any(&self, id: EntityId) -> Option<&Unit> {
        self.get(id)
            .or_else(|| self.graveyard.iter().find(|u| u.id == id))
    }

    /// Live units in roster order
    pub fn units(&self) -> &[Unit] {
        &self.roster
    }

    pub fn units_mut(&mut self) -> impl Iterator<Item = &mut Unit> {
        self.roster.iter_mut()
    }

    pub fn graveyard(&self) -> &[Unit] {
        &self.graveyard
    }

    pub fn len(&self) -> usize {
        self.roster.len()
    }

    pub fn is_empty(&self) -> bool {
        self.roster.is_empty()
    }

    /// Roster position of a unit
    pub fn roster_position(&self, id: EntityId) -> Option<usize> {
        self.index.get(&id).copied()
    }

    pub fn entities_owned_by(&self, player: PlayerId) -> usize {
        self.roster.iter().filter(|u| u.owner == player).count()
    }

    /// Owned units still in the fight
    pub fn live_entities_owned_by(&self, player: PlayerId) -> usize {
        self.roster
            .iter()
            .filter(|u| u.owner == player && !u.destroyed)
            .count()
    }

    /// Map from hex to the units standing in it
    ///
    /// Units without a position (undeployed or carried) are left out.
    pub fn position_index(&self) -> BTreeMap<HexCoord, Occupants> {
        let mut map: BTreeMap<HexCoord, Occupants> = BTreeMap::new();
        for unit in &self.roster {
            if let Some(pos) = unit.position {
                map.entry(pos).or_default().push(unit.id);
            }
        }
        map
    }

    /// First targetable unit in a hex
    pub fn first_at(&self, hex: HexCoord) -> Option<&Unit> {
        self.targetable_at(hex).next()
    }

    /// All targetable units in a hex
    pub fn all_at(&self, hex: HexCoord) -> Vec<&Unit> {
        self.targetable_at(hex).collect()
    }

    fn targetable_at(&self, hex: HexCoord) -> impl Iterator<Item = &Unit> {
        self.roster
            .iter()
            .filter(move |u| u.position == Some(hex) && u.is_targetable())
    }

    /// Replace the whole roster; the id index is rebuilt
    ///
    /// # Panics
    /// If two units share an id or a unit is already in the graveyard.
    pub fn replace_roster(&mut self, units: Vec<Unit>) {
        let mut seen = FxHashSet::default();
        for unit in &units {
            assert!(seen.insert(unit.id), "roster id {} appears twice", unit.id);
            assert!(
                !self.graveyard.iter().any(|g| g.id == unit.id),
                "roster unit {} is already in the graveyard",
                unit.id
            );
        }
        self.roster = units;
        self.reindex();
    }

    /// Replace the graveyard wholesale
    ///
    /// # Panics
    /// If a unit has no removal condition or is also on the live roster.
    pub fn replace_graveyard(&mut self, units: Vec<Unit>) {
        for unit in &units {
            assert!(
                unit.removal.is_some(),
                "graveyard unit {} has no removal condition",
                unit.id
            );
            assert!(
                !self.contains(unit.id),
                "graveyard unit {} is still on the roster",
                unit.id
            );
        }
        self.graveyard = units;
    }

    /// Forget every unit, live or removed
    pub fn reset(&mut self) {
        self.roster.clear();
        self.graveyard.clear();
        self.index.clear();
    }

    /// Highest id in use plus one
    pub fn next_free_id(&self) -> EntityId {
        let max = self
            .roster
            .iter()
            .chain(self.graveyard.iter())
            .map(|u| u.id.as_u32())
            .max();
        EntityId::new(max.map_or(0, |m| m + 1))
    }
}

impl Serialize for EntityRegistry {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        use serde::ser::SerializeStruct;
        let mut state = serializer.serialize_struct("EntityRegistry", 2)?;
        state.serialize_field("roster", &self.roster)?;
        state.serialize_field("graveyard", &self.graveyard)?;
        state.end()
    }
}

impl<'de> Deserialize<'de> for EntityRegistry {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct RegistryData {
            roster: Vec<Unit>,
            #[serde(default)]
            graveyard: Vec<Unit>,
        }

        let data = RegistryData::deserialize(deserializer)?;
        let mut registry = EntityRegistry {
            roster: data.roster,
            index: FxHashMap::default(),
            graveyard: data.graveyard,
        };
        registry.reindex();
        Ok(registry)
    }
}
