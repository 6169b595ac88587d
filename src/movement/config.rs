//! Inputs to path compilation supplied by collaborators

use crate::board::Terrain;
use crate::core::{MovementMode, MovementProfile, UnitCategory};
use crate::movement::{IllegalReason, MoveState, MoveStep};
use serde::{Deserialize, Serialize};

/// Rule knobs that come from match options rather than the unit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MovementRules {
    pub facing_change_cost: u32,
    pub standing_cost: u32,
    pub pavement_bonus: bool,
}

impl Default for MovementRules {
    fn default() -> Self {
        MovementRules {
            facing_change_cost: 1,
            standing_cost: 2,
            pavement_bonus: true,
        }
    }
}

/// Everything the compiler needs to know about the mover
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MovementConfig {
    pub category: UnitCategory,
    pub mode: MovementMode,

    pub walk_mp: u32,
    pub run_mp: u32,
    pub jump_mp: u32,

    pub turn_cost: u32,
    pub stand_cost: u32,
    pub prone_cost: u32,
    /// Extra MP on top of the hex cost for a lateral shift
    pub lateral_surcharge: u32,

    pub can_go_prone: bool,
    pub can_lateral_shift: bool,
    pub lateral_is_special: bool,
    pub standing_requires_roll: bool,
    pub running_risks_fall: bool,
    pub max_elevation_change: u32,
    /// +1 walk and run MP while the whole path stays on pavement
    pub road_bonus: bool,
}

impl MovementConfig {
    pub fn from_profile(profile: &dyn MovementProfile, rules: &MovementRules) -> Self {
        MovementConfig {
            category: profile.category(),
            mode: profile.movement_mode(),
            walk_mp: profile.walk_mp(),
            run_mp: profile.run_mp(),
            jump_mp: profile.jump_mp(),
            turn_cost: rules.facing_change_cost,
            stand_cost: rules.standing_cost,
            prone_cost: 1,
            lateral_surcharge: 1,
            can_go_prone: profile.can_go_prone(),
            can_lateral_shift: profile.can_lateral_shift(),
            lateral_is_special: profile.lateral_shift_is_special(),
            standing_requires_roll: profile.standing_requires_roll(),
            running_risks_fall: profile.running_risks_fall(),
            max_elevation_change: profile.max_elevation_change(),
            road_bonus: rules.pavement_bonus && profile.gets_road_bonus(),
        }
    }

    /// Plain biped with free facing changes, for previews and tests
    pub fn simple(walk_mp: u32, run_mp: u32) -> Self {
        MovementConfig {
            category: UnitCategory::Mech,
            mode: MovementMode::Biped,
            walk_mp,
            run_mp,
            jump_mp: 0,
            turn_cost: 0,
            stand_cost: 2,
            prone_cost: 1,
            lateral_surcharge: 1,
            can_go_prone: true,
            can_lateral_shift: false,
            lateral_is_special: false,
            standing_requires_roll: false,
            running_risks_fall: false,
            max_elevation_change: 2,
            road_bonus: false,
        }
    }

    pub fn with_jump(mut self, jump_mp: u32) -> Self {
        self.jump_mp = jump_mp;
        self
    }

    pub fn with_lateral_shift(mut self) -> Self {
        self.can_lateral_shift = true;
        self
    }

    pub(crate) fn bonus(&self, only_pavement: bool) -> u32 {
        u32::from(self.road_bonus && only_pavement)
    }
}

/// Unit-status checks the compiler cannot make on its own
///
/// Implemented by the game layer, which can see the roster (transport
/// space, jammed weapons, charge targets).
pub trait StepPreconditions {
    fn check(&self, step: &MoveStep, before: &MoveState) -> Result<(), IllegalReason>;
}

/// Accepts every step
#[derive(Debug, Clone, Copy, Default)]
pub struct NoPreconditions;

impl StepPreconditions for NoPreconditions {
    fn check(&self, _step: &MoveStep, _before: &MoveState) -> Result<(), IllegalReason> {
        Ok(())
    }
}

/// Collaborators handed to the compiler for one compilation
#[derive(Clone, Copy)]
pub struct MoveContext<'a> {
    pub config: &'a MovementConfig,
    pub terrain: &'a dyn Terrain,
    pub preconditions: &'a dyn StepPreconditions,
}

impl<'a> MoveContext<'a> {
    pub fn new(config: &'a MovementConfig, terrain: &'a dyn Terrain) -> Self {
        MoveContext {
            config,
            terrain,
            preconditions: &NoPreconditions,
        }
    }

    pub fn with_preconditions(mut self, preconditions: &'a dyn StepPreconditions) -> Self {
        self.preconditions = preconditions;
        self
    }
}

impl std::fmt::Debug for MoveContext<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MoveContext")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{EntityId, MovementStats, PlayerId, Unit};

    #[test]
    fn test_config_from_profile() {
        let mut stats = MovementStats::walking(4).with_jump(4);
        stats.running_risks_fall = true;
        let mech = Unit::new(EntityId::new(1), PlayerId::new(1), "Griffin", UnitCategory::Mech, stats);

        let config = MovementConfig::from_profile(&mech, &MovementRules::default());
        assert_eq!(config.walk_mp, 4);
        assert_eq!(config.run_mp, 6);
        assert_eq!(config.jump_mp, 4);
        assert_eq!(config.turn_cost, 1);
        assert!(config.running_risks_fall);
        assert!(config.standing_requires_roll);
        assert!(!config.road_bonus);
    }

    #[test]
    fn test_road_bonus_needs_rule_and_profile() {
        let tank = Unit::new(
            EntityId::new(2),
            PlayerId::new(1),
            "Scorpion",
            UnitCategory::Tank,
            MovementStats::walking(4),
        );
        let with_bonus = MovementConfig::from_profile(&tank, &MovementRules::default());
        assert!(with_bonus.road_bonus);
        assert_eq!(with_bonus.bonus(true), 1);
        assert_eq!(with_bonus.bonus(false), 0);

        let rules = MovementRules {
            pavement_bonus: false,
            ..MovementRules::default()
        };
        assert!(!MovementConfig::from_profile(&tank, &rules).road_bonus);
    }
}
