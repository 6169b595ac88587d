//! Match options

use crate::movement::MovementRules;
use crate::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Rule switches chosen before a match starts
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameOptions {
    /// Units may target units of their own side
    pub friendly_fire: bool,
    /// Ground vehicles moving only on pavement get +1 MP
    pub pavement_bonus: bool,
    /// MP cost of each facing change on the ground
    pub facing_change_cost: u32,
    /// MP cost of standing up
    pub standing_cost: u32,
    /// Running with a damaged gyro or hip requires a piloting roll
    pub running_fall_checks: bool,
    /// Keep the transition journal
    pub journal: bool,
}

impl Default for GameOptions {
    fn default() -> Self {
        let rules = MovementRules::default();
        GameOptions {
            friendly_fire: false,
            pavement_bonus: rules.pavement_bonus,
            facing_change_cost: rules.facing_change_cost,
            standing_cost: rules.standing_cost,
            running_fall_checks: true,
            journal: true,
        }
    }
}

impl GameOptions {
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    pub fn movement_rules(&self) -> MovementRules {
        MovementRules {
            facing_change_cost: self.facing_change_cost,
            standing_cost: self.standing_cost,
            pavement_bonus: self.pavement_bonus,
        }
    }
}
