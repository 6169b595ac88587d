//! Core match types: ids, geometry, units and players

pub mod entity;
pub mod hex;
pub mod player;
pub mod profile;
pub mod types;
pub mod unit;

pub use entity::{EntityId, GameEntity, PlayerId, TeamId};
pub use hex::{Facing, HexCoord};
pub use player::{InitiativeRoll, Player};
pub use profile::{run_from_walk, MovementProfile};
pub use types::{PlayerName, UnitName};
pub use unit::{CategoryMask, MovementMode, MovementStats, RemovalCondition, Unit, UnitCategory};
