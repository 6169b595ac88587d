//! Turns and the turn sequencer
//!
//! A phase with turns holds an ordered list of `GameTurn`s. Each turn is a
//! predicate naming which units may act in it; the sequencer walks the list
//! with an index that starts at -1 (no turn taken yet).

use crate::core::{CategoryMask, EntityId, PlayerId, Unit, UnitCategory};
use crate::game::{EntityRegistry, GamePhase};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::fmt;

/// Who may act in a turn
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameTurn {
    /// Any eligible unit of the player
    Player { player: PlayerId },
    /// Only this unit
    SpecificEntity { player: PlayerId, entity: EntityId },
    /// Eligible units of the player whose category is in the mask
    UnitClass { player: PlayerId, mask: CategoryMask },
    /// Units left stranded when their transport was lost
    UnloadStranded { entities: SmallVec<[EntityId; 4]> },
}

impl GameTurn {
    pub fn player(&self) -> Option<PlayerId> {
        match self {
            GameTurn::Player { player }
            | GameTurn::SpecificEntity { player, .. }
            | GameTurn::UnitClass { player, .. } => Some(*player),
            GameTurn::UnloadStranded { .. } => None,
        }
    }

    /// Does this turn name the unit, ignoring its current status?
    pub fn applies_to(&self, unit: &Unit) -> bool {
        match self {
            GameTurn::Player { player } => unit.owner == *player,
            GameTurn::SpecificEntity { entity, .. } => unit.id == *entity,
            GameTurn::UnitClass { player, mask } => {
                unit.owner == *player && mask.contains(unit.category)
            }
            GameTurn::UnloadStranded { entities } => entities.contains(&unit.id),
        }
    }

    /// Can the unit act in this turn right now?
    pub fn is_valid_entity(&self, unit: &Unit, phase: GamePhase, round: u32) -> bool {
        if !self.applies_to(unit) {
            return false;
        }
        match self {
            GameTurn::UnloadStranded { .. } => !unit.done && !unit.destroyed,
            _ => is_eligible_for_phase(unit, phase, round),
        }
    }
}

impl fmt::Display for GameTurn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GameTurn::Player { player } => write!(f, "player {player}"),
            GameTurn::SpecificEntity { entity, .. } => write!(f, "unit {entity}"),
            GameTurn::UnitClass { player, .. } => write!(f, "player {player} (restricted)"),
            GameTurn::UnloadStranded { entities } => {
                write!(f, "stranded units (")?;
                for (i, id) in entities.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{id}")?;
                }
                write!(f, ")")
            }
        }
    }
}

/// Can this unit take a turn in the given phase?
///
/// Units deploy in the deployment phase before the round they are scheduled
/// for. Only Mechs and ProtoMechs make physical attacks.
pub fn is_eligible_for_phase(unit: &Unit, phase: GamePhase, round: u32) -> bool {
    if unit.destroyed || unit.done || unit.removal.is_some() {
        return false;
    }
    let on_board = unit.deployed && unit.position.is_some() && !unit.is_carried();
    match phase {
        GamePhase::Deployment => !unit.deployed && !unit.is_carried() && unit.deploy_round <= round + 1,
        GamePhase::Movement | GamePhase::Firing => on_board && !unit.shut_down,
        GamePhase::Physical => {
            on_board
                && !unit.shut_down
                && !matches!(unit.category, UnitCategory::Infantry | UnitCategory::Aero)
        }
        _ => false,
    }
}

/// First unit in roster order that may act in the turn
pub fn first_eligible(
    turn: &GameTurn,
    registry: &EntityRegistry,
    phase: GamePhase,
    round: u32,
) -> Option<EntityId> {
    registry
        .units()
        .iter()
        .find(|u| turn.is_valid_entity(u, phase, round))
        .map(|u| u.id)
}

/// Next unit after `after` in roster order that may act in the turn
///
/// Wraps around to `first_eligible` when nothing later qualifies, so callers
/// cycling through candidates go round-robin.
pub fn next_eligible(
    turn: &GameTurn,
    registry: &EntityRegistry,
    after: EntityId,
    phase: GamePhase,
    round: u32,
) -> Option<EntityId> {
    let start = registry.roster_position(after).map_or(0, |pos| pos + 1);
    registry.units()[start..]
        .iter()
        .find(|u| turn.is_valid_entity(u, phase, round))
        .map(|u| u.id)
        .or_else(|| first_eligible(turn, registry, phase, round))
}

/// Ordered turns of the current phase
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurnSequencer {
    turns: Vec<GameTurn>,
    /// -1 before the first turn
    index: i32,
}

impl TurnSequencer {
    pub fn new() -> Self {
        TurnSequencer {
            turns: Vec::new(),
            index: -1,
        }
    }

    /// Install a new phase's turns and rewind
    pub fn set_turns(&mut self, turns: Vec<GameTurn>) {
        self.turns = turns;
        self.index = -1;
    }

    pub fn reset(&mut self) {
        self.set_turns(Vec::new());
    }

    pub fn turns(&self) -> &[GameTurn] {
        &self.turns
    }

    pub fn index(&self) -> i32 {
        self.index
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    pub fn current_turn(&self) -> Option<&GameTurn> {
        usize::try_from(self.index)
            .ok()
            .and_then(|i| self.turns.get(i))
    }

    /// Move to the next turn; None once the list is exhausted
    pub fn advance(&mut self) -> Option<&GameTurn> {
        if self.index < self.turns.len() as i32 {
            self.index += 1;
        }
        self.current_turn()
    }

    pub fn has_next(&self) -> bool {
        self.index + 1 < self.turns.len() as i32
    }

    /// Position the next `advance` will land on
    fn next_slot(&self) -> usize {
        usize::try_from(self.index + 1).unwrap_or(0)
    }

    /// Splice a turn in right after the current one; returns its index
    ///
    /// On an exhausted list the last turn counts as current, so the next
    /// `advance` lands on the inserted turn.
    pub fn insert_after_current(&mut self, turn: GameTurn) -> usize {
        let len = self.turns.len() as i32;
        if self.index >= len {
            self.index = len - 1;
        }
        let at = self.next_slot();
        self.turns.insert(at, turn);
        at
    }

    /// Remove the last not-yet-finished turn that names the unit
    ///
    /// Scans from the end back to the current turn inclusive. Returns the
    /// index and the removed turn.
    pub fn remove_last_valid_for(&mut self, unit: &Unit) -> Option<(usize, GameTurn)> {
        let floor = usize::try_from(self.index).unwrap_or(0);
        let pos = (floor..self.turns.len())
            .rev()
            .find(|&i| self.turns[i].applies_to(unit))?;
        Some((pos, self.turns.remove(pos)))
    }
}

impl Default for TurnSequencer {
    fn default() -> Self {
        Self::new()
    }
}
