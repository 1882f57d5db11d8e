use parity_scale_codec::{Decode, Encode};
use serde::{Deserialize, Serialize};

pub use crate::collections::GemCollections;
pub use crate::cycle::{DayPhase, Progress};
use crate::catalog::ContentCatalog;
use crate::error::{ActionError, ActionResult};
use crate::events::BattleEvent;
use crate::proficiency::ProficiencyTracker;
use crate::rng::BattleRng;
use crate::rules::Rules;
use crate::types::{Enemy, Player, PlayerClass};

/// Where a battle stands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Encode, Decode, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TurnStatus {
    AwaitingPlayerAction,
    ResolvingPlayerAction,
    AwaitingEnemyAction,
    ResolvingEnemyAction,
    Victory,
    Defeat,
    Fled,
}

impl TurnStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            TurnStatus::Victory | TurnStatus::Defeat | TurnStatus::Fled
        )
    }
}

/// Per-turn bookkeeping, reset when a player turn starts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Encode, Decode, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TurnFlags {
    /// Gems were played this turn
    pub acted: bool,
    /// The rest bonus was already granted this turn
    pub rest_granted: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BattleState {
    pub enemy: Enemy,
    pub status: TurnStatus,
    /// Player turn number, starting at 1
    pub turn: u32,
    pub flags: TurnFlags,
}

/// The complete game state
///
/// Each field maps to one section of the state document.
#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameState {
    pub player: Player,
    pub gems: GemCollections,
    pub proficiency: ProficiencyTracker,
    pub progress: Progress,
    pub battle: Option<BattleState>,
}

impl GameState {
    /// Start a run: class base stats, the class starter bag (shuffled) and a
    /// tracker that knows which gem types are pre-mastered.
    pub fn new_run(
        class: PlayerClass,
        catalog: &ContentCatalog,
        rules: &Rules,
        rng: &mut impl BattleRng,
    ) -> ActionResult<(Self, Vec<BattleEvent>)> {
        let stats = catalog
            .class(class)
            .ok_or(ActionError::UnknownClass { class })?;

        let mut gems = GemCollections::new();
        for key in &stats.starter_gems {
            let def = catalog
                .gem(key)
                .ok_or_else(|| ActionError::UnknownGem { key: key.clone() })?;
            gems.add_to_bag(def);
        }
        rng.shuffle(&mut gems.bag);

        let proficiency =
            ProficiencyTracker::new(rules.novice_failure_bp, rules.mastery_decay_bp)
                .with_mastered(catalog.mastered_keys());

        let state = Self {
            player: Player::from_class(stats),
            gems,
            proficiency,
            progress: Progress::new(),
            battle: None,
        };
        log::info!(
            "new run: class={:?} bag={}",
            class,
            state.gems.bag.len()
        );
        let events = vec![BattleEvent::RunStarted {
            class,
            bag_size: state.gems.bag.len(),
        }];
        Ok((state, events))
    }

    pub fn in_battle(&self) -> bool {
        self.battle.is_some()
    }
}
