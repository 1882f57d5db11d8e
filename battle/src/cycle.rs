//! Day and phase progression.

use core::fmt;

use parity_scale_codec::{Decode, Encode};
use serde::{Deserialize, Serialize};

use crate::error::{ActionError, ActionResult};
use crate::events::BattleEvent;
use crate::rng::BattleRng;
use crate::state::GameState;

/// Sub-periods of a day, cycled in declaration order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Encode, Decode, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DayPhase {
    Dawn,
    Dusk,
    /// Last phase of the day; fleeing is not allowed
    Dark,
}

impl DayPhase {
    /// The following phase, and whether the day rolls over to reach it
    pub fn next(self) -> (DayPhase, bool) {
        match self {
            DayPhase::Dawn => (DayPhase::Dusk, false),
            DayPhase::Dusk => (DayPhase::Dark, false),
            DayPhase::Dark => (DayPhase::Dawn, true),
        }
    }

    pub fn allows_flee(self) -> bool {
        self != DayPhase::Dark
    }
}

impl fmt::Display for DayPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DayPhase::Dawn => "dawn",
            DayPhase::Dusk => "dusk",
            DayPhase::Dark => "dark",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Encode, Decode, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Progress {
    /// Current day, starting at 1
    pub day: u32,
    pub phase: DayPhase,
}

impl Progress {
    pub fn new() -> Self {
        Self {
            day: 1,
            phase: DayPhase::Dawn,
        }
    }

    /// Step to the next phase. Returns true when a new day began.
    pub fn advance(&mut self) -> bool {
        let (phase, rolled_over) = self.phase.next();
        self.phase = phase;
        if rolled_over {
            self.day += 1;
        }
        rolled_over
    }

    /// Jump straight to dawn of the following day
    pub fn next_day(&mut self) {
        self.day += 1;
        self.phase = DayPhase::Dawn;
    }
}

impl Default for Progress {
    fn default() -> Self {
        Self::new()
    }
}

impl GameState {
    /// Step to the next phase outside battle.
    ///
    /// Every phase change restores stamina and clears buffs. Rolling past
    /// dark starts a new day, which also restores health and reshuffles
    /// every gem back into the bag.
    pub fn advance_phase(&mut self, rng: &mut impl BattleRng) -> ActionResult<Vec<BattleEvent>> {
        if self.in_battle() {
            return Err(ActionError::BattleInProgress);
        }
        let mut events = Vec::new();
        if self.progress.advance() {
            self.begin_day(rng, &mut events);
        } else {
            self.refresh_player(&mut events);
        }
        events.push(BattleEvent::PhaseAdvanced {
            day: self.progress.day,
            phase: self.progress.phase,
        });
        Ok(events)
    }

    /// Skip the rest of the day and start the next one at dawn.
    pub fn start_next_day(&mut self, rng: &mut impl BattleRng) -> ActionResult<Vec<BattleEvent>> {
        if self.in_battle() {
            return Err(ActionError::BattleInProgress);
        }
        let mut events = Vec::new();
        self.progress.next_day();
        self.begin_day(rng, &mut events);
        events.push(BattleEvent::PhaseAdvanced {
            day: self.progress.day,
            phase: self.progress.phase,
        });
        Ok(events)
    }

    fn refresh_player(&mut self, events: &mut Vec<BattleEvent>) {
        let player = &mut self.player;
        let gained = player.recover_stamina(player.max_stamina);
        if gained > 0 {
            events.push(BattleEvent::StaminaRecovered {
                amount: gained,
                stamina: player.stamina,
            });
        }
        for buff in player.buffs.drain(..) {
            events.push(BattleEvent::BuffExpired {
                target: crate::types::Side::Player,
                kind: buff.kind,
            });
        }
    }

    fn begin_day(&mut self, rng: &mut impl BattleRng, events: &mut Vec<BattleEvent>) {
        self.refresh_player(events);
        self.player.health = self.player.max_health;

        self.gems.merge_and_shuffle(rng);
        events.push(BattleEvent::CollectionsReshuffled {
            bag_size: self.gems.bag.len(),
        });

        log::info!("day {} begins", self.progress.day);
        events.push(BattleEvent::DayStarted {
            day: self.progress.day,
        });
    }
}
