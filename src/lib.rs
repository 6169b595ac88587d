//! Hexbattle - authoritative state machine for hex-grid miniatures combat
//!
//! The crate owns the per-match game state (units, players, phases, turn
//! order, declared actions) and the movement-path compiler that turns a
//! sequence of movement commands into a legality-checked final unit state.

pub mod board;
pub mod core;
pub mod error;
pub mod game;
pub mod journal;
pub mod movement;

pub use error::{BattleError, Result};
