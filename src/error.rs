//! Error types for Hexbattle

use crate::core::EntityId;
use crate::movement::IllegalReason;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BattleError {
    #[error("Entity not found: {0}")]
    EntityNotFound(u32),

    #[error("Player not found: {0}")]
    PlayerNotFound(u32),

    #[error("Entity {0} is already registered")]
    DuplicateEntity(u32),

    #[error("Invalid game action: {0}")]
    InvalidAction(String),

    #[error("Illegal move for entity {entity} at step {step}: {reason}")]
    IllegalMove {
        entity: EntityId,
        step: usize,
        reason: IllegalReason,
    },

    #[error("Entity {0} cannot act in the current turn")]
    NotYourTurn(EntityId),

    #[error("Operation not allowed in phase {0}")]
    WrongPhase(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<serde_json::Error> for BattleError {
    fn from(err: serde_json::Error) -> Self {
        BattleError::Serialization(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, BattleError>;
