//! Gem proficiency learning curve.
//!
//! Each gem type starts with a novice failure chance which drops by a fixed
//! step for every successful use:
//!
//! ```text
//! failure_chance = max(0, base_failure - success_count * decay)
//! ```
//!
//! Failures never undo progress. Gem types flagged as mastered (class starter
//! gems and universal base gems) always report a failure chance of zero.
//! Probabilities are basis points out of [`ROLL_SCALE`].

use std::collections::{BTreeMap, BTreeSet};

use parity_scale_codec::{Decode, Encode};
use serde::{Deserialize, Serialize};

use crate::rng::{BattleRng, ROLL_SCALE};

/// Default novice failure chance (70%)
pub const NOVICE_FAILURE_BP: u32 = 7_000;
/// Default failure reduction per success (10%)
pub const MASTERY_DECAY_BP: u32 = 1_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Encode, Decode, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Proficiency {
    pub success_count: u32,
    /// Basis points, 0 means mastered
    pub failure_chance: u32,
}

impl Proficiency {
    pub fn mastered() -> Self {
        Self {
            success_count: 0,
            failure_chance: 0,
        }
    }

    pub fn is_mastered(&self) -> bool {
        self.failure_chance == 0
    }
}

/// Before/after values of one recorded outcome
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProficiencyUpdate {
    pub gem_key: String,
    pub before: Proficiency,
    pub after: Proficiency,
    pub success: bool,
    /// True only on the outcome that brought the failure chance to zero
    pub mastery_achieved: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProficiencyTracker {
    pub base_failure: u32,
    pub decay: u32,
    /// Successful uses per gem key
    pub successes: BTreeMap<String, u32>,
    /// Keys that are always fully mastered
    pub mastered_keys: BTreeSet<String>,
}

impl ProficiencyTracker {
    pub fn new(base_failure: u32, decay: u32) -> Self {
        Self {
            base_failure: base_failure.min(ROLL_SCALE),
            decay,
            successes: BTreeMap::new(),
            mastered_keys: BTreeSet::new(),
        }
    }

    pub fn with_mastered<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.mastered_keys.extend(keys.into_iter().map(Into::into));
        self
    }

    pub fn failure_for(&self, success_count: u32) -> u32 {
        self.base_failure
            .saturating_sub(success_count.saturating_mul(self.decay))
    }

    pub fn get_proficiency(&self, gem_key: &str) -> Proficiency {
        let success_count = self.successes.get(gem_key).copied().unwrap_or(0);
        if self.mastered_keys.contains(gem_key) {
            return Proficiency {
                success_count,
                failure_chance: 0,
            };
        }
        Proficiency {
            success_count,
            failure_chance: self.failure_for(success_count),
        }
    }

    /// Record a use of the gem type. Only successes change anything.
    pub fn record_outcome(&mut self, gem_key: &str, success: bool) -> ProficiencyUpdate {
        let before = self.get_proficiency(gem_key);
        if success {
            *self.successes.entry(gem_key.to_string()).or_insert(0) += 1;
        }
        let after = self.get_proficiency(gem_key);
        ProficiencyUpdate {
            gem_key: gem_key.to_string(),
            before,
            after,
            success,
            mastery_achieved: before.failure_chance > 0 && after.failure_chance == 0,
        }
    }
}

impl Default for ProficiencyTracker {
    fn default() -> Self {
        Self::new(NOVICE_FAILURE_BP, MASTERY_DECAY_BP)
    }
}

/// Roll whether a gem fizzles. A zero failure chance never fails.
pub fn roll_failure(proficiency: &Proficiency, rng: &mut impl BattleRng) -> bool {
    if proficiency.failure_chance == 0 {
        return false;
    }
    rng.roll_basis_points() < proficiency.failure_chance
}
