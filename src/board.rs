//! Board and terrain collaborator
//!
//! The movement compiler only asks the board for costs, destination legality
//! and hazards through the `Terrain` trait. `HexBoard` is the in-crate
//! implementation used by scenarios and tests.

use crate::core::{HexCoord, MovementMode};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

/// Terrain types that affect movement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TerrainKind {
    #[default]
    Clear,
    Pavement,
    LightWoods,
    HeavyWoods,
    Rough,
    Swamp,
    Water {
        depth: u8,
    },
    Building,
}

/// Contents of one hex
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct HexTerrain {
    #[serde(default)]
    pub kind: TerrainKind,
    #[serde(default)]
    pub elevation: i32,
}

impl HexTerrain {
    pub fn new(kind: TerrainKind, elevation: i32) -> Self {
        HexTerrain { kind, elevation }
    }
}

/// Hazards a unit faces on entering a hex
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct HexHazards {
    /// Entering requires a piloting skill roll
    pub piloting_roll: bool,
    /// Unit may become stuck
    pub bog_down: bool,
}

/// Terrain queries consumed by the movement compiler
pub trait Terrain {
    /// Is the hex on the playing area?
    fn contains(&self, hex: HexCoord) -> bool;

    fn elevation(&self, hex: HexCoord) -> i32;

    /// MP needed to move from `from` into the adjacent hex `to`; None if impassable
    fn movement_cost(&self, mode: MovementMode, from: HexCoord, to: HexCoord) -> Option<u32>;

    fn is_legal_destination(&self, mode: MovementMode, hex: HexCoord) -> bool;

    fn hazards(&self, mode: MovementMode, hex: HexCoord) -> HexHazards;

    fn is_pavement(&self, hex: HexCoord) -> bool;

    /// Units may only flee from edge hexes
    fn is_edge(&self, hex: HexCoord) -> bool;
}

/// Serializable board layout used by scenario files
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BoardLayout {
    /// Hexagonal board of this radius around the origin; unbounded if absent
    #[serde(default)]
    pub radius: Option<u32>,
    #[serde(default)]
    pub hexes: Vec<TerrainPatch>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct TerrainPatch {
    pub hex: HexCoord,
    #[serde(flatten)]
    pub terrain: HexTerrain,
}

/// Hexagonal board with sparse terrain; unlisted hexes are clear at elevation 0
///
/// Serialized through `BoardLayout` since JSON maps need string keys.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(from = "BoardLayout", into = "BoardLayout")]
pub struct HexBoard {
    radius: Option<u32>,
    hexes: FxHashMap<HexCoord, HexTerrain>,
}

impl HexBoard {
    /// Unbounded board of clear terrain
    pub fn open() -> Self {
        Self::default()
    }

    pub fn with_radius(radius: u32) -> Self {
        HexBoard {
            radius: Some(radius),
            hexes: FxHashMap::default(),
        }
    }

    pub fn from_layout(layout: &BoardLayout) -> Self {
        let mut board = HexBoard {
            radius: layout.radius,
            hexes: FxHashMap::default(),
        };
        for patch in &layout.hexes {
            board.set(patch.hex, patch.terrain);
        }
        board
    }

    pub fn set(&mut self, hex: HexCoord, terrain: HexTerrain) {
        self.hexes.insert(hex, terrain);
    }

    pub fn terrain(&self, hex: HexCoord) -> HexTerrain {
        self.hexes.get(&hex).copied().unwrap_or_default()
    }

    /// Cost of entering a hex of this kind, ignoring elevation; None if impassable
    fn entry_cost(kind: TerrainKind, mode: MovementMode) -> Option<u32> {
        use MovementMode::*;
        use TerrainKind::*;

        if mode == Aerodyne {
            return Some(1);
        }
        match (kind, mode) {
            (Clear | Pavement, _) => Some(1),
            (LightWoods, Wheeled | Hover) => None,
            (LightWoods, _) => Some(2),
            (HeavyWoods, Tracked | Wheeled | Hover) => None,
            (HeavyWoods, _) => Some(3),
            (Rough, Wheeled | Hover) => None,
            (Rough, _) => Some(2),
            (Swamp, Hover) => Some(1),
            (Swamp, _) => Some(2),
            (Water { depth: 0 }, _) => Some(1),
            (Water { .. }, Hover) => Some(1),
            (Water { .. }, Tracked | Wheeled | Foot) => None,
            (Water { depth: 1 }, _) => Some(2),
            (Water { .. }, _) => Some(4),
            (Building, Tracked | Wheeled | Hover) => None,
            (Building, _) => Some(2),
        }
    }

    fn climb_cost(mode: MovementMode, delta: u32) -> u32 {
        match mode {
            MovementMode::Aerodyne => 0,
            MovementMode::Tracked | MovementMode::Wheeled | MovementMode::Hover => delta * 2,
            _ => delta,
        }
    }
}

impl From<BoardLayout> for HexBoard {
    fn from(layout: BoardLayout) -> Self {
        HexBoard::from_layout(&layout)
    }
}

impl From<HexBoard> for BoardLayout {
    fn from(board: HexBoard) -> Self {
        let mut hexes: Vec<TerrainPatch> = board
            .hexes
            .into_iter()
            .map(|(hex, terrain)| TerrainPatch { hex, terrain })
            .collect();
        hexes.sort_by_key(|patch| patch.hex);
        BoardLayout {
            radius: board.radius,
            hexes,
        }
    }
}

impl Terrain for HexBoard {
    fn contains(&self, hex: HexCoord) -> bool {
        self.radius.map_or(true, |radius| hex.norm() <= radius)
    }

    fn elevation(&self, hex: HexCoord) -> i32 {
        self.terrain(hex).elevation
    }

    fn movement_cost(&self, mode: MovementMode, from: HexCoord, to: HexCoord) -> Option<u32> {
        if !self.contains(to) {
            return None;
        }
        let dest = self.terrain(to);
        let base = Self::entry_cost(dest.kind, mode)?;
        let delta = (dest.elevation - self.elevation(from)).unsigned_abs();
        Some(base + Self::climb_cost(mode, delta))
    }

    fn is_legal_destination(&self, mode: MovementMode, hex: HexCoord) -> bool {
        self.contains(hex) && Self::entry_cost(self.terrain(hex).kind, mode).is_some()
    }

    fn hazards(&self, mode: MovementMode, hex: HexCoord) -> HexHazards {
        let kind = self.terrain(hex).kind;
        let legged = matches!(mode, MovementMode::Biped | MovementMode::Quad);
        HexHazards {
            piloting_roll: legged && matches!(kind, TerrainKind::Water { depth } if depth > 0),
            bog_down: kind == TerrainKind::Swamp
                && !matches!(mode, MovementMode::Hover | MovementMode::Aerodyne),
        }
    }

    fn is_pavement(&self, hex: HexCoord) -> bool {
        self.terrain(hex).kind == TerrainKind::Pavement
    }

    fn is_edge(&self, hex: HexCoord) -> bool {
        self.radius.is_some_and(|radius| hex.norm() == radius)
    }
}
