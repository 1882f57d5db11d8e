//! Wires the command channels to the turn engine.
//!
//! For every command the session loads the [`GameState`] from the store,
//! runs the engine on it, commits the changed sections back with a single
//! store notification and then publishes the engine's outcome events. No
//! borrow is held while outcomes are published, so an outcome handler may
//! publish the next command straight away.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use gemfall_battle::{
    ActionError, BattleRng, ContentCatalog, GameState, Proficiency, ProficiencyTracker, Rules,
};
use serde_json::Value;
use strum::IntoEnumIterator;
use thiserror::Error;

use crate::bus::{EventBus, HandlerResult, SubscriptionToken};
use crate::channel::{Channel, Command, GameEvent};
use crate::path::paths;
use crate::store::{StateStore, StoreError};

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("no run in progress")]
    NoRun,
    #[error(transparent)]
    Rejected(#[from] ActionError),
    #[error("state store: {0}")]
    Store(#[from] StoreError),
}

impl From<serde_json::Error> for SessionError {
    fn from(err: serde_json::Error) -> Self {
        SessionError::Store(StoreError::from(err))
    }
}

struct SessionCore<R> {
    bus: EventBus<GameEvent>,
    store: StateStore,
    catalog: ContentCatalog,
    rules: Rules,
    rng: RefCell<R>,
}

/// The game logic attached to one bus and one store
pub struct GameSession<R: BattleRng + 'static> {
    core: Rc<SessionCore<R>>,
    subscriptions: Vec<(Channel, SubscriptionToken)>,
}

impl<R: BattleRng + 'static> GameSession<R> {
    /// Subscribe to every command channel.
    ///
    /// Fails if one of the game's state paths falls outside the store's schema.
    pub fn attach(
        bus: &EventBus<GameEvent>,
        store: &StateStore,
        catalog: ContentCatalog,
        rules: Rules,
        rng: R,
    ) -> Result<Self, SessionError> {
        store.schema().check_all(paths::ALL)?;

        let core = Rc::new(SessionCore {
            bus: bus.clone(),
            store: store.clone(),
            catalog,
            rules,
            rng: RefCell::new(rng),
        });

        let subscriptions = Channel::iter()
            .filter(Channel::is_command)
            .map(|channel| {
                let weak: Weak<SessionCore<R>> = Rc::downgrade(&core);
                let token = bus.subscribe(channel, move |event| match (event, weak.upgrade()) {
                    (GameEvent::Command(command), Some(core)) => core.handle(command),
                    _ => Ok(()),
                });
                (channel, token)
            })
            .collect();

        log::info!(
            "session attached: {} gems, {} enemies",
            core.catalog.gems.len(),
            core.catalog.enemies.len()
        );
        Ok(Self {
            core,
            subscriptions,
        })
    }

    /// Stop listening for commands
    pub fn detach(self) {
        for (channel, token) in self.subscriptions {
            self.core.bus.unsubscribe(channel, token);
        }
    }

    /// Publish a command on its channel
    pub fn dispatch(&self, command: Command) {
        self.core.bus.publish(GameEvent::Command(command));
    }

    /// The current state as stored
    pub fn state(&self) -> Result<GameState, SessionError> {
        self.core.load()
    }

    /// Replace the stored state, e.g. from a save
    pub fn restore(&self, state: &GameState) -> Result<(), SessionError> {
        log::info!(
            "restoring day {} ({}), battle={}",
            state.progress.day,
            state.progress.phase,
            state.in_battle()
        );
        self.core.commit(state)
    }

    pub fn proficiency(&self, gem_key: &str) -> Result<Proficiency, SessionError> {
        self.core.proficiency(gem_key)
    }

    pub fn catalog(&self) -> &ContentCatalog {
        &self.core.catalog
    }

    pub fn rules(&self) -> &Rules {
        &self.core.rules
    }
}

impl<R: BattleRng> SessionCore<R> {
    fn handle(&self, command: &Command) -> HandlerResult {
        let channel = command.channel();
        log::debug!("{}: {:?}", channel, command);

        match self.execute(command) {
            Ok(events) => {
                for event in events {
                    self.bus.publish(event);
                }
            }
            Err(SessionError::Rejected(err)) => {
                log::warn!("{} rejected: {}", channel, err);
                self.bus.publish(GameEvent::ActionRejected {
                    command: channel,
                    reason: err.to_string(),
                    error: Some(err),
                });
            }
            Err(err) => {
                match err {
                    SessionError::NoRun => log::warn!("{} rejected: {}", channel, err),
                    _ => log::error!("{} failed: {}", channel, err),
                }
                self.bus.publish(GameEvent::ActionRejected {
                    command: channel,
                    reason: err.to_string(),
                    error: None,
                });
            }
        }
        Ok(())
    }

    fn execute(&self, command: &Command) -> Result<Vec<GameEvent>, SessionError> {
        match command {
            Command::QueryProficiency { gem_key } => {
                let proficiency = self.proficiency(gem_key)?;
                return Ok(vec![GameEvent::ProficiencyReport {
                    gem_key: gem_key.clone(),
                    proficiency,
                }]);
            }
            Command::NewRun { class } => {
                let (state, events) = {
                    let mut rng = self.rng.borrow_mut();
                    GameState::new_run(*class, &self.catalog, &self.rules, &mut *rng)?
                };
                self.commit(&state)?;
                return Ok(events.into_iter().map(GameEvent::from).collect());
            }
            Command::StartBattle { .. } | Command::StartNextDay => self.check_structure(),
            _ => {}
        }

        let mut state = self.load()?;
        let events = {
            let mut rng = self.rng.borrow_mut();
            let rng = &mut *rng;
            let rules = &self.rules;
            match command {
                Command::StartBattle { enemy_key } => {
                    let def = self
                        .catalog
                        .enemy(enemy_key)
                        .ok_or_else(|| ActionError::UnknownEnemy {
                            key: enemy_key.clone(),
                        })?;
                    state.start_battle(def, rules, rng)?
                }
                Command::PlayGems { indices } => state.play_gems(indices, rules, rng)?,
                Command::Wait => state.wait(rules, rng)?,
                Command::DiscardAndEnd { indices } => state.discard_and_end(indices, rules, rng)?,
                Command::EndTurn => state.end_turn(rules, rng)?,
                Command::Flee => state.flee()?,
                Command::StartNextDay => state.start_next_day(rng)?,
                Command::AdvancePhase => state.advance_phase(rng)?,
                Command::BuyGem { gem_key } => {
                    let def = self
                        .catalog
                        .gem(gem_key)
                        .ok_or_else(|| ActionError::UnknownGem {
                            key: gem_key.clone(),
                        })?;
                    state.buy_gem(def)?
                }
                Command::SellGem { gem_id } => state.sell_gem(*gem_id, &self.catalog, rules)?,
                Command::UpgradeGem { gem_id } => state.upgrade_gem(*gem_id, rules)?,
                Command::NewRun { .. } | Command::QueryProficiency { .. } => Vec::new(),
            }
        };

        self.commit(&state)?;
        Ok(events.into_iter().map(GameEvent::from).collect())
    }

    /// Log structural problems before a new day or battle. Never blocks.
    fn check_structure(&self) {
        let validation = self.store.validate();
        for issue in &validation.issues {
            log::warn!("state validation: {}", issue);
        }
    }

    fn has_run(&self) -> bool {
        self.store
            .get(paths::PLAYER)
            .is_some_and(|player| !player.is_null())
    }

    fn load(&self) -> Result<GameState, SessionError> {
        if !self.has_run() {
            return Err(SessionError::NoRun);
        }
        Ok(GameState {
            player: self.store.get_as(paths::PLAYER)?,
            gems: self.store.get_as(paths::GEMS)?,
            proficiency: self.store.get_as(paths::PROFICIENCY)?,
            progress: self.store.get_as(paths::PROGRESS)?,
            battle: self.store.get_as(paths::BATTLE)?,
        })
    }

    /// Write back the sections that changed, with one notification
    fn commit(&self, state: &GameState) -> Result<(), SessionError> {
        let sections = [
            (paths::PLAYER, serde_json::to_value(&state.player)?),
            (paths::GEMS, serde_json::to_value(&state.gems)?),
            (paths::PROFICIENCY, serde_json::to_value(&state.proficiency)?),
            (paths::PROGRESS, serde_json::to_value(&state.progress)?),
            (paths::BATTLE, serde_json::to_value(&state.battle)?),
        ];
        let changed: Vec<(&str, Value)> = sections
            .into_iter()
            .filter(|(path, value)| self.store.get(path).as_ref() != Some(value))
            .collect();
        self.store.batch_update(changed)?;
        Ok(())
    }

    fn proficiency(&self, gem_key: &str) -> Result<Proficiency, SessionError> {
        if !self.has_run() {
            return Err(SessionError::NoRun);
        }
        let tracker: ProficiencyTracker = self.store.get_as(paths::PROFICIENCY)?;
        Ok(tracker.get_proficiency(gem_key))
    }
}
