use serde::{Deserialize, Serialize};

use crate::proficiency::{MASTERY_DECAY_BP, NOVICE_FAILURE_BP};

/// Number of gems held in hand
pub const HAND_SIZE: usize = 3;
/// Stamina granted for a turn spent without playing gems
pub const REST_STAMINA_BONUS: i32 = 3;
/// Magnitude bonus for gems matching the class colour
pub const CLASS_BONUS_PERCENT: i32 = 50;
/// Incoming damage cut while Defense is active
pub const DEFENSE_REDUCTION_PERCENT: i32 = 50;
/// Outgoing damage cut while Cursed
pub const CURSE_REDUCTION_PERCENT: i32 = 50;
/// Share of the price refunded when selling a gem
pub const SELL_REFUND_PERCENT: i32 = 50;
/// Zenny needed to upgrade a gem
pub const UPGRADE_PRICE: i32 = 10;
/// Enemy turns a Charge lasts
pub const CHARGE_TURNS: u32 = 2;

/// Tunable game rules
///
/// Every field has a default, so a partial JSON object is enough to override
/// a single value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Rules {
    pub hand_size: usize,
    pub rest_stamina_bonus: i32,
    pub class_bonus_percent: i32,
    pub defense_reduction_percent: i32,
    pub curse_reduction_percent: i32,
    pub novice_failure_bp: u32,
    pub mastery_decay_bp: u32,
    pub sell_refund_percent: i32,
    pub upgrade_price: i32,
    pub charge_turns: u32,
}

impl Default for Rules {
    fn default() -> Self {
        Self {
            hand_size: HAND_SIZE,
            rest_stamina_bonus: REST_STAMINA_BONUS,
            class_bonus_percent: CLASS_BONUS_PERCENT,
            defense_reduction_percent: DEFENSE_REDUCTION_PERCENT,
            curse_reduction_percent: CURSE_REDUCTION_PERCENT,
            novice_failure_bp: NOVICE_FAILURE_BP,
            mastery_decay_bp: MASTERY_DECAY_BP,
            sell_refund_percent: SELL_REFUND_PERCENT,
            upgrade_price: UPGRADE_PRICE,
            charge_turns: CHARGE_TURNS,
        }
    }
}
