//! Transition journal
//!
//! Every mutation the game state applies is appended here as a
//! `Transition`. The game state marks a checkpoint at the start of every
//! turn so a driver can see everything that happened during it.

use crate::core::{EntityId, Facing, HexCoord, RemovalCondition};
use crate::game::{GamePhase, GameTurn};
use crate::movement::MovementClass;
use serde::{Deserialize, Serialize};

/// Atomic state transitions
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Transition {
    PhaseChanged {
        from: GamePhase,
        to: GamePhase,
    },

    RoundStarted {
        round: u32,
    },

    TurnsGenerated {
        count: usize,
    },

    TurnAdvanced {
        index: i32,
    },

    TurnInserted {
        index: usize,
        turn: GameTurn,
    },

    TurnRemoved {
        index: usize,
        turn: GameTurn,
    },

    EntityAdded {
        entity: EntityId,
    },

    EntityDeployed {
        entity: EntityId,
        hex: HexCoord,
        facing: Facing,
    },

    EntityMoved {
        entity: EntityId,
        from: Option<HexCoord>,
        to: Option<HexCoord>,
        facing: Facing,
        mp_used: u32,
        class: MovementClass,
    },

    EntityRemoved {
        entity: EntityId,
        condition: RemovalCondition,
    },

    ActionRecorded {
        entity: EntityId,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Journal {
    /// Oldest first
    entries: Vec<Transition>,

    enabled: bool,

    checkpoints: Vec<usize>,
}

impl Journal {
    pub fn new() -> Self {
        Journal {
            entries: Vec::new(),
            enabled: true,
            checkpoints: Vec::new(),
        }
    }

    /// A journal that records nothing
    pub fn disabled() -> Self {
        Journal {
            enabled: false,
            ..Self::new()
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn log(&mut self, transition: Transition) {
        if self.enabled {
            self.entries.push(transition);
        }
    }

    pub fn mark_checkpoint(&mut self) {
        if self.enabled {
            self.checkpoints.push(self.entries.len());
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries recorded after the latest checkpoint
    pub fn since_checkpoint(&self) -> &[Transition] {
        let start = self.checkpoints.last().copied().unwrap_or(0);
        &self.entries[start.min(self.entries.len())..]
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.checkpoints.clear();
    }

    pub fn entries(&self) -> &[Transition] {
        &self.entries
    }
}

impl Default for Journal {
    fn default() -> Self {
        Self::new()
    }
}
