//! Error types for game operations
//!
//! Every rejected intent maps to one variant. The `Display` text is shown to
//! the player as is.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::cycle::DayPhase;
use crate::types::{GemId, PlayerClass};

/// Reasons a player intent is rejected. A rejection never mutates state.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ActionError {
    #[error("no stats for class {class:?}")]
    UnknownClass { class: PlayerClass },
    #[error("no battle in progress")]
    NoBattle,
    #[error("a battle is already in progress")]
    BattleInProgress,
    #[error("it is not the player's turn")]
    NotPlayerTurn,
    #[error("the player is stunned")]
    Stunned,
    #[error("no gems selected")]
    EmptySelection,
    #[error("hand index {index} is out of range (hand holds {hand_size})")]
    InvalidHandIndex { index: usize, hand_size: usize },
    #[error("hand index {index} selected twice")]
    DuplicateHandIndex { index: usize },
    #[error("not enough stamina: have {have}, need {need}")]
    NotEnoughStamina { have: i32, need: i32 },
    #[error("gems were already played this turn")]
    AlreadyActed,
    #[error("cannot flee during the {phase} phase")]
    CannotFlee { phase: DayPhase },
    #[error("the player has been defeated; start the next day")]
    PlayerDefeated,
    #[error("unknown gem '{key}'")]
    UnknownGem { key: String },
    #[error("unknown enemy '{key}'")]
    UnknownEnemy { key: String },
    #[error("gem {id} not found")]
    GemNotFound { id: GemId },
    #[error("gem {id} is already upgraded")]
    AlreadyUpgraded { id: GemId },
    #[error("not enough zenny: have {have}, need {need}")]
    NotEnoughZenny { have: i32, need: i32 },
}

/// Result type alias for game operations
pub type ActionResult<T> = Result<T, ActionError>;
