//! Named channels and the typed events carried on them.
//!
//! Every [`GameEvent`] knows its own [`Channel`], so a publisher never pairs a
//! payload with the wrong name. Channel names are `SCREAMING_SNAKE_CASE`
//! strings on the JavaScript side.

use gemfall_battle::{ActionError, BattleEvent, GemId, PlayerClass, Proficiency};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter, EnumString};

use crate::bus::BusEvent;

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    AsRefStr,
    Display,
    EnumIter,
    EnumString,
    Serialize,
    Deserialize,
)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Channel {
    // Commands (UI -> game)
    NewRun,
    StartBattle,
    GemsPlay,
    WaitTurn,
    DiscardAndEnd,
    EndTurn,
    FleeBattle,
    StartNextDay,
    AdvancePhase,
    BuyGem,
    SellGem,
    UpgradeGem,
    GemProficiencyQuery,

    // Outcomes (game -> UI)
    RunStarted,
    BattleStarted,
    BattleVictory,
    BattleDefeat,
    BattleFled,
    TurnStarted,
    TurnEnded,
    GemsDrawn,
    StaminaSpent,
    StaminaRecovered,
    GemResolved,
    GemFailed,
    GemsDiscarded,
    GemProficiencyUpdated,
    GemMastered,
    GemProficiencyReport,
    DamageTaken,
    Healed,
    BuffApplied,
    BuffExpired,
    EnemyActed,
    EnemyStunned,
    EnemyIntent,
    ZennyChanged,
    GemPurchased,
    GemSold,
    GemUpgraded,
    PhaseAdvanced,
    DayStarted,
    CollectionsReshuffled,
    ActionRejected,

    // Batch markers
    BatchStart,
    BatchEnd,
}

impl Channel {
    /// Whether the UI publishes on this channel
    pub fn is_command(&self) -> bool {
        matches!(
            self,
            Channel::NewRun
                | Channel::StartBattle
                | Channel::GemsPlay
                | Channel::WaitTurn
                | Channel::DiscardAndEnd
                | Channel::EndTurn
                | Channel::FleeBattle
                | Channel::StartNextDay
                | Channel::AdvancePhase
                | Channel::BuyGem
                | Channel::SellGem
                | Channel::UpgradeGem
                | Channel::GemProficiencyQuery
        )
    }
}

/// A player intent
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "camelCase")]
pub enum Command {
    NewRun { class: PlayerClass },
    #[serde(rename_all = "camelCase")]
    StartBattle { enemy_key: String },
    PlayGems { indices: Vec<usize> },
    Wait,
    DiscardAndEnd { indices: Vec<usize> },
    EndTurn,
    Flee,
    StartNextDay,
    AdvancePhase,
    #[serde(rename_all = "camelCase")]
    BuyGem { gem_key: String },
    #[serde(rename_all = "camelCase")]
    SellGem { gem_id: GemId },
    #[serde(rename_all = "camelCase")]
    UpgradeGem { gem_id: GemId },
    #[serde(rename_all = "camelCase")]
    QueryProficiency { gem_key: String },
}

impl Command {
    pub fn channel(&self) -> Channel {
        match self {
            Command::NewRun { .. } => Channel::NewRun,
            Command::StartBattle { .. } => Channel::StartBattle,
            Command::PlayGems { .. } => Channel::GemsPlay,
            Command::Wait => Channel::WaitTurn,
            Command::DiscardAndEnd { .. } => Channel::DiscardAndEnd,
            Command::EndTurn => Channel::EndTurn,
            Command::Flee => Channel::FleeBattle,
            Command::StartNextDay => Channel::StartNextDay,
            Command::AdvancePhase => Channel::AdvancePhase,
            Command::BuyGem { .. } => Channel::BuyGem,
            Command::SellGem { .. } => Channel::SellGem,
            Command::UpgradeGem { .. } => Channel::UpgradeGem,
            Command::QueryProficiency { .. } => Channel::GemProficiencyQuery,
        }
    }
}

/// Channel an engine outcome is published on
pub fn outcome_channel(event: &BattleEvent) -> Channel {
    match event {
        BattleEvent::RunStarted { .. } => Channel::RunStarted,
        BattleEvent::BattleStarted { .. } => Channel::BattleStarted,
        BattleEvent::BattleVictory { .. } => Channel::BattleVictory,
        BattleEvent::BattleDefeat { .. } => Channel::BattleDefeat,
        BattleEvent::BattleFled { .. } => Channel::BattleFled,
        BattleEvent::TurnStarted { .. } => Channel::TurnStarted,
        BattleEvent::TurnEnded { .. } => Channel::TurnEnded,
        BattleEvent::GemsDrawn { .. } => Channel::GemsDrawn,
        BattleEvent::StaminaSpent { .. } => Channel::StaminaSpent,
        BattleEvent::StaminaRecovered { .. } => Channel::StaminaRecovered,
        BattleEvent::GemResolved { .. } => Channel::GemResolved,
        BattleEvent::GemFailed { .. } => Channel::GemFailed,
        BattleEvent::GemsDiscarded { .. } => Channel::GemsDiscarded,
        BattleEvent::ProficiencyUpdated { .. } => Channel::GemProficiencyUpdated,
        BattleEvent::GemMastered { .. } => Channel::GemMastered,
        BattleEvent::DamageTaken { .. } => Channel::DamageTaken,
        BattleEvent::Healed { .. } => Channel::Healed,
        BattleEvent::BuffApplied { .. } => Channel::BuffApplied,
        BattleEvent::BuffExpired { .. } => Channel::BuffExpired,
        BattleEvent::EnemyActed { .. } => Channel::EnemyActed,
        BattleEvent::EnemyStunned => Channel::EnemyStunned,
        BattleEvent::EnemyIntent { .. } => Channel::EnemyIntent,
        BattleEvent::ZennyChanged { .. } => Channel::ZennyChanged,
        BattleEvent::GemPurchased { .. } => Channel::GemPurchased,
        BattleEvent::GemSold { .. } => Channel::GemSold,
        BattleEvent::GemUpgraded { .. } => Channel::GemUpgraded,
        BattleEvent::PhaseAdvanced { .. } => Channel::PhaseAdvanced,
        BattleEvent::DayStarted { .. } => Channel::DayStarted,
        BattleEvent::CollectionsReshuffled { .. } => Channel::CollectionsReshuffled,
    }
}

/// Everything that travels over the game's bus
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum GameEvent {
    Command(Command),
    Outcome(BattleEvent),
    #[serde(rename_all = "camelCase")]
    ActionRejected {
        command: Channel,
        reason: String,
        /// Set when the engine refused the intent
        error: Option<ActionError>,
    },
    #[serde(rename_all = "camelCase")]
    ProficiencyReport {
        gem_key: String,
        proficiency: Proficiency,
    },
    #[serde(rename_all = "camelCase")]
    BatchStart { batch_id: String, count: usize },
    #[serde(rename_all = "camelCase")]
    BatchEnd { batch_id: String, count: usize },
}

impl From<Command> for GameEvent {
    fn from(command: Command) -> Self {
        GameEvent::Command(command)
    }
}

impl From<BattleEvent> for GameEvent {
    fn from(event: BattleEvent) -> Self {
        GameEvent::Outcome(event)
    }
}

impl BusEvent for GameEvent {
    type Channel = Channel;

    fn channel(&self) -> Channel {
        match self {
            GameEvent::Command(command) => command.channel(),
            GameEvent::Outcome(event) => outcome_channel(event),
            GameEvent::ActionRejected { .. } => Channel::ActionRejected,
            GameEvent::ProficiencyReport { .. } => Channel::GemProficiencyReport,
            GameEvent::BatchStart { .. } => Channel::BatchStart,
            GameEvent::BatchEnd { .. } => Channel::BatchEnd,
        }
    }

    fn batch_start(batch_id: &str, count: usize) -> Self {
        GameEvent::BatchStart {
            batch_id: batch_id.to_string(),
            count,
        }
    }

    fn batch_end(batch_id: &str, count: usize) -> Self {
        GameEvent::BatchEnd {
            batch_id: batch_id.to_string(),
            count,
        }
    }
}
