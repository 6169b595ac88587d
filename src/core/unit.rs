//! Combat units and their category tags

use crate::core::{EntityId, Facing, GameEntity, HexCoord, PlayerId, UnitName};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::fmt;

/// Unit categories
///
/// Category-specific behaviour (movement capabilities, phase eligibility) is
/// selected by matching on this tag rather than by separate unit types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UnitCategory {
    Mech,
    QuadMech,
    Tank,
    Infantry,
    ProtoMech,
    Aero,
}

impl UnitCategory {
    pub const ALL: [UnitCategory; 6] = [
        UnitCategory::Mech,
        UnitCategory::QuadMech,
        UnitCategory::Tank,
        UnitCategory::Infantry,
        UnitCategory::ProtoMech,
        UnitCategory::Aero,
    ];

    fn bit(&self) -> u8 {
        1 << (*self as u8)
    }

    /// Default ground movement mode for this category
    pub fn default_mode(&self) -> MovementMode {
        match self {
            UnitCategory::Mech | UnitCategory::ProtoMech => MovementMode::Biped,
            UnitCategory::QuadMech => MovementMode::Quad,
            UnitCategory::Tank => MovementMode::Tracked,
            UnitCategory::Infantry => MovementMode::Foot,
            UnitCategory::Aero => MovementMode::Aerodyne,
        }
    }
}

impl fmt::Display for UnitCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            UnitCategory::Mech => "Mech",
            UnitCategory::QuadMech => "Quad Mech",
            UnitCategory::Tank => "Tank",
            UnitCategory::Infantry => "Infantry",
            UnitCategory::ProtoMech => "ProtoMech",
            UnitCategory::Aero => "Aero",
        };
        write!(f, "{s}")
    }
}

/// Set of unit categories, used by class-restricted turns
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct CategoryMask(u8);

impl CategoryMask {
    pub const NONE: CategoryMask = CategoryMask(0);
    pub const ALL: CategoryMask = CategoryMask(0b11_1111);

    pub fn of(categories: &[UnitCategory]) -> Self {
        categories.iter().fold(Self::NONE, |mask, c| mask.with(*c))
    }

    pub fn with(self, category: UnitCategory) -> Self {
        CategoryMask(self.0 | category.bit())
    }

    pub fn contains(&self, category: UnitCategory) -> bool {
        self.0 & category.bit() != 0
    }
}

/// How a unit moves across terrain; terrain costs depend on it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MovementMode {
    Biped,
    Quad,
    Tracked,
    Wheeled,
    Hover,
    Foot,
    Aerodyne,
}

/// Why a unit left play
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RemovalCondition {
    Salvageable,
    InRetreat,
    Pushed,
    Ejected,
    Captured,
    Devastated,
    /// Never made it into the match; discarded instead of sent to the graveyard
    NeverJoined,
}

/// Movement figures supplied by the unit catalog
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MovementStats {
    pub walk_mp: u32,

    #[serde(default)]
    pub jump_mp: u32,

    /// Heat and damage penalty applied to walking MP
    #[serde(default)]
    pub mp_penalty: u32,

    /// Damaged gyro or hip: running requires a piloting roll
    #[serde(default)]
    pub running_risks_fall: bool,

    /// Pilot may lateral shift without quad legs
    #[serde(default)]
    pub maneuvering_ace: bool,

    /// Overrides the category's default movement mode (e.g. wheeled tanks)
    #[serde(default)]
    pub mode: Option<MovementMode>,
}

impl MovementStats {
    pub fn walking(walk_mp: u32) -> Self {
        MovementStats {
            walk_mp,
            ..Default::default()
        }
    }

    pub fn with_jump(mut self, jump_mp: u32) -> Self {
        self.jump_mp = jump_mp;
        self
    }
}

/// A combat unit on (or waiting to enter) the board
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Unit {
    pub id: EntityId,
    pub owner: PlayerId,
    pub name: UnitName,
    pub category: UnitCategory,
    pub movement: MovementStats,

    /// None while undeployed or stowed inside a transport
    pub position: Option<HexCoord>,
    pub facing: Facing,
    pub elevation: i32,
    pub prone: bool,

    pub deployed: bool,
    /// Earliest round this unit may deploy
    pub deploy_round: u32,

    /// Has already acted in the current phase
    pub done: bool,
    pub destroyed: bool,
    pub shut_down: bool,

    pub carried_by: Option<EntityId>,
    pub carrying: SmallVec<[EntityId; 4]>,
    /// How many units this one can carry
    pub transport_capacity: u8,

    pub weapon_jammed: bool,
    pub clearing_minefield: bool,

    /// Set once the unit leaves play
    pub removal: Option<RemovalCondition>,
}

impl Unit {
    pub fn new(
        id: EntityId,
        owner: PlayerId,
        name: impl Into<UnitName>,
        category: UnitCategory,
        movement: MovementStats,
    ) -> Self {
        Unit {
            id,
            owner,
            name: name.into(),
            category,
            movement,
            position: None,
            facing: Facing::NORTH,
            elevation: 0,
            prone: false,
            deployed: false,
            deploy_round: 0,
            done: false,
            destroyed: false,
            shut_down: false,
            carried_by: None,
            carrying: SmallVec::new(),
            transport_capacity: 0,
            weapon_jammed: false,
            clearing_minefield: false,
            removal: None,
        }
    }

    /// Place the unit on the board and mark it deployed
    pub fn deploy_at(&mut self, position: HexCoord, facing: Facing) {
        self.position = Some(position);
        self.facing = facing;
        self.deployed = true;
    }

    /// Can other units shoot at or ram this one?
    pub fn is_targetable(&self) -> bool {
        !self.destroyed
            && self.removal.is_none()
            && self.deployed
            && self.position.is_some()
            && self.carried_by.is_none()
    }

    pub fn is_carried(&self) -> bool {
        self.carried_by.is_some()
    }

    pub fn has_transport_space(&self) -> bool {
        self.carrying.len() < self.transport_capacity as usize
    }
}

impl GameEntity<EntityId> for Unit {
    fn id(&self) -> EntityId {
        self.id
    }

    fn name(&self) -> &str {
        self.name.as_str()
    }
}
