//! Outcome events produced by the engine, in the order they happened.

use serde::{Deserialize, Serialize};

use crate::cycle::DayPhase;
use crate::proficiency::Proficiency;
use crate::types::{Buff, BuffKind, EnemyAction, GemId, PlayerClass, Side};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "camelCase")]
pub enum BattleEvent {
    #[serde(rename_all = "camelCase")]
    RunStarted { class: PlayerClass, bag_size: usize },
    #[serde(rename_all = "camelCase")]
    BattleStarted {
        enemy: String,
        enemy_health: i32,
        intent: EnemyAction,
    },
    #[serde(rename_all = "camelCase")]
    TurnStarted { side: Side, turn: u32 },
    #[serde(rename_all = "camelCase")]
    TurnEnded { side: Side, turn: u32 },
    #[serde(rename_all = "camelCase")]
    GemsDrawn { count: usize, reshuffled: bool },
    #[serde(rename_all = "camelCase")]
    StaminaSpent { amount: i32, remaining: i32 },
    #[serde(rename_all = "camelCase")]
    StaminaRecovered { amount: i32, stamina: i32 },
    #[serde(rename_all = "camelCase")]
    GemResolved { gem_id: GemId, gem_key: String },
    #[serde(rename_all = "camelCase")]
    GemFailed { gem_id: GemId, gem_key: String },
    #[serde(rename_all = "camelCase")]
    GemsDiscarded { count: usize },
    #[serde(rename_all = "camelCase")]
    ProficiencyUpdated {
        gem_key: String,
        before: Proficiency,
        after: Proficiency,
        success: bool,
    },
    #[serde(rename_all = "camelCase")]
    GemMastered { gem_key: String },
    #[serde(rename_all = "camelCase")]
    DamageTaken {
        target: Side,
        amount: i32,
        blocked: i32,
        remaining_health: i32,
    },
    #[serde(rename_all = "camelCase")]
    Healed { target: Side, amount: i32, health: i32 },
    #[serde(rename_all = "camelCase")]
    BuffApplied { target: Side, buff: Buff },
    #[serde(rename_all = "camelCase")]
    BuffExpired { target: Side, kind: BuffKind },
    #[serde(rename_all = "camelCase")]
    EnemyActed { action: EnemyAction },
    EnemyStunned,
    #[serde(rename_all = "camelCase")]
    EnemyIntent { action: EnemyAction },
    #[serde(rename_all = "camelCase")]
    ZennyChanged { delta: i32, zenny: i32 },
    #[serde(rename_all = "camelCase")]
    BattleVictory { enemy: String, reward: i32 },
    #[serde(rename_all = "camelCase")]
    BattleDefeat { enemy: String },
    #[serde(rename_all = "camelCase")]
    BattleFled { enemy: String },
    #[serde(rename_all = "camelCase")]
    PhaseAdvanced { day: u32, phase: DayPhase },
    #[serde(rename_all = "camelCase")]
    DayStarted { day: u32 },
    #[serde(rename_all = "camelCase")]
    CollectionsReshuffled { bag_size: usize },
    #[serde(rename_all = "camelCase")]
    GemPurchased { gem_id: GemId, gem_key: String, price: i32 },
    #[serde(rename_all = "camelCase")]
    GemSold { gem_id: GemId, gem_key: String, refund: i32 },
    #[serde(rename_all = "camelCase")]
    GemUpgraded { gem_id: GemId, gem_key: String, price: i32 },
}
