//! Turn resolution rules for Gemfall.
//!
//! This crate holds the pure game rules: the combatants and their buffs, the
//! bag/hand/discard gem collections, the proficiency learning curve, the turn
//! engine and the day/phase cycle. It knows nothing about the event bus or the
//! state store; every operation takes the [`GameState`] it works on and returns
//! the [`BattleEvent`]s it produced.

pub mod buffs;
pub mod catalog;
pub mod collections;
pub mod cycle;
pub mod engine;
pub mod error;
pub mod events;
pub mod proficiency;
pub mod rng;
pub mod rules;
pub mod shop;
pub mod state;
pub mod types;

#[cfg(test)]
mod tests;

pub use catalog::ContentCatalog;
pub use error::{ActionError, ActionResult};
pub use events::BattleEvent;
pub use proficiency::{Proficiency, ProficiencyTracker, ProficiencyUpdate};
pub use rng::{BattleRng, XorShiftRng};
pub use rules::Rules;
pub use state::*;
pub use types::*;
