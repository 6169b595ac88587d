//! Movement capabilities per unit category
//!
//! The movement compiler never looks at a concrete unit. It consumes a
//! `MovementConfig` built from anything implementing `MovementProfile`.

use crate::core::{MovementMode, Unit, UnitCategory};

/// Capability interface for moving units
pub trait MovementProfile {
    fn category(&self) -> UnitCategory;
    fn movement_mode(&self) -> MovementMode;

    /// Walking (cruising) MP after heat and damage penalties
    fn walk_mp(&self) -> u32;
    /// Running (flanking) MP derived from walking MP
    fn run_mp(&self) -> u32;
    fn jump_mp(&self) -> u32;

    fn can_go_prone(&self) -> bool;
    fn can_lateral_shift(&self) -> bool;
    /// Lateral shifts rely on a pilot ability rather than the chassis
    fn lateral_shift_is_special(&self) -> bool;
    fn standing_requires_roll(&self) -> bool;
    fn running_risks_fall(&self) -> bool;
    /// Largest elevation change allowed in a single ground step
    fn max_elevation_change(&self) -> u32;
    fn gets_road_bonus(&self) -> bool;
}

/// Run MP is one and a half times walk MP, rounded up
pub fn run_from_walk(walk: u32) -> u32 {
    walk + walk.div_ceil(2)
}

impl MovementProfile for Unit {
    fn category(&self) -> UnitCategory {
        self.category
    }

    fn movement_mode(&self) -> MovementMode {
        self.movement
            .mode
            .unwrap_or_else(|| self.category.default_mode())
    }

    fn walk_mp(&self) -> u32 {
        self.movement.walk_mp.saturating_sub(self.movement.mp_penalty)
    }

    fn run_mp(&self) -> u32 {
        match self.category {
            UnitCategory::Infantry => self.walk_mp(),
            _ => run_from_walk(self.walk_mp()),
        }
    }

    fn jump_mp(&self) -> u32 {
        match self.category {
            UnitCategory::Tank | UnitCategory::Aero => 0,
            _ => self.movement.jump_mp,
        }
    }

    fn can_go_prone(&self) -> bool {
        matches!(self.category, UnitCategory::Mech | UnitCategory::QuadMech)
    }

    fn can_lateral_shift(&self) -> bool {
        match self.category {
            UnitCategory::QuadMech => true,
            UnitCategory::Mech => self.movement.maneuvering_ace,
            _ => false,
        }
    }

    fn lateral_shift_is_special(&self) -> bool {
        self.category != UnitCategory::QuadMech
    }

    fn standing_requires_roll(&self) -> bool {
        self.category == UnitCategory::Mech
    }

    fn running_risks_fall(&self) -> bool {
        self.movement.running_risks_fall
            && matches!(self.category, UnitCategory::Mech | UnitCategory::QuadMech)
    }

    fn max_elevation_change(&self) -> u32 {
        match self.category {
            UnitCategory::Tank => 1,
            UnitCategory::Aero => u32::MAX,
            _ => 2,
        }
    }

    fn gets_road_bonus(&self) -> bool {
        self.category == UnitCategory::Tank
    }
}
