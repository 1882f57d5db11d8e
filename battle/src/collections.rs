//! Bag, hand and discard.
//!
//! The three collections are disjoint and together hold every gem the player
//! owns. Only the shop adds or removes gems; everything else moves them.

use parity_scale_codec::{Decode, Encode};
use serde::{Deserialize, Serialize};

use crate::error::{ActionError, ActionResult};
use crate::rng::BattleRng;
use crate::types::{Gem, GemDefinition, GemId};

#[derive(Debug, Clone, Default, PartialEq, Eq, Encode, Decode, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GemCollections {
    /// Face-down pool, drawn from the back
    pub bag: Vec<Gem>,
    pub hand: Vec<Gem>,
    /// Spent this battle
    pub discard: Vec<Gem>,
    /// Counter for generating unique gem IDs
    pub next_gem_id: u32,
}

impl GemCollections {
    pub fn new() -> Self {
        Self {
            next_gem_id: 1,
            ..Default::default()
        }
    }

    /// Generate a unique gem ID
    pub fn generate_gem_id(&mut self) -> GemId {
        let id = GemId(self.next_gem_id);
        self.next_gem_id += 1;
        id
    }

    /// Create a gem from its definition and put it in the bag
    pub fn add_to_bag(&mut self, def: &GemDefinition) -> GemId {
        let id = self.generate_gem_id();
        self.bag.push(Gem::from_definition(id, def));
        id
    }

    pub fn total(&self) -> usize {
        self.bag.len() + self.hand.len() + self.discard.len()
    }

    /// Draw from the bag until the hand holds `hand_size` gems.
    ///
    /// An empty bag is refilled by shuffling the discard pile into it. Returns
    /// how many gems were drawn and whether a reshuffle happened.
    pub fn draw_to(&mut self, hand_size: usize, rng: &mut impl BattleRng) -> (usize, bool) {
        let mut drawn = 0;
        let mut reshuffled = false;
        while self.hand.len() < hand_size {
            if self.bag.is_empty() {
                if self.discard.is_empty() {
                    break;
                }
                self.bag.append(&mut self.discard);
                rng.shuffle(&mut self.bag);
                reshuffled = true;
            }
            match self.bag.pop() {
                Some(gem) => {
                    self.hand.push(gem);
                    drawn += 1;
                }
                None => break,
            }
        }
        (drawn, reshuffled)
    }

    /// Check a hand selection: every index in range and used once.
    ///
    /// Returns the indices sorted into hand order.
    pub fn validate_selection(&self, indices: &[usize]) -> ActionResult<Vec<usize>> {
        let mut sorted = indices.to_vec();
        sorted.sort_unstable();
        for window in sorted.windows(2) {
            if window[0] == window[1] {
                return Err(ActionError::DuplicateHandIndex { index: window[0] });
            }
        }
        if let Some(&bad) = sorted.iter().find(|&&i| i >= self.hand.len()) {
            return Err(ActionError::InvalidHandIndex {
                index: bad,
                hand_size: self.hand.len(),
            });
        }
        Ok(sorted)
    }

    /// Remove already validated indices from the hand, keeping hand order
    pub fn take_from_hand(&mut self, sorted_indices: &[usize]) -> Vec<Gem> {
        let mut taken: Vec<Gem> = sorted_indices
            .iter()
            .rev()
            .map(|&i| self.hand.remove(i))
            .collect();
        taken.reverse();
        taken
    }

    /// Merge hand and discard back into the bag and shuffle it
    pub fn merge_and_shuffle(&mut self, rng: &mut impl BattleRng) {
        self.bag.append(&mut self.hand);
        self.bag.append(&mut self.discard);
        rng.shuffle(&mut self.bag);
    }

    pub fn find(&self, id: GemId) -> Option<&Gem> {
        self.bag
            .iter()
            .chain(self.hand.iter())
            .chain(self.discard.iter())
            .find(|g| g.id == id)
    }

    pub fn find_mut(&mut self, id: GemId) -> Option<&mut Gem> {
        self.bag
            .iter_mut()
            .chain(self.hand.iter_mut())
            .chain(self.discard.iter_mut())
            .find(|g| g.id == id)
    }

    /// Remove a gem from whichever collection holds it
    pub fn remove(&mut self, id: GemId) -> Option<Gem> {
        for pile in [&mut self.bag, &mut self.hand, &mut self.discard] {
            if let Some(pos) = pile.iter().position(|g| g.id == id) {
                return Some(pile.remove(pos));
            }
        }
        None
    }
}
