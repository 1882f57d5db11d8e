//! Game client for browser WASM builds
//!
//! A [`GameClient`] owns one event bus, one state store and the session that
//! connects them. JavaScript sends intents through the methods below and
//! listens with `on`, `on_any` and `on_state`. Outcomes are delivered
//! synchronously, before the intent method returns.
//!
//! Nothing runs on its own: the host calls `tick` (e.g. from
//! `requestAnimationFrame`) to fire delayed events and flush batches.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::fmt::Display;

use gemfall_battle::{GemId, PlayerClass, XorShiftRng};
use gemfall_game::{
    ChangeRecord, Channel, Command, EventBus, GameConfig, GameEvent, GameSession, HandlerError,
    HandlerResult, StateStore, StoreSubscription, SubscriptionToken, TimerHandle,
};
use serde::Serialize;
use serde_json::Value;
use wasm_bindgen::prelude::*;

use crate::save;

/// What `on_any` callbacks receive
#[derive(Serialize)]
struct Delivery<'a> {
    channel: Channel,
    event: &'a GameEvent,
}

/// What `on_state` callbacks receive
#[derive(Serialize)]
struct StateChange<'a> {
    document: &'a Value,
    changes: &'a [ChangeRecord],
}

/// The game exposed to JavaScript
#[wasm_bindgen]
pub struct GameClient {
    bus: EventBus<GameEvent>,
    store: StateStore,
    session: GameSession<XorShiftRng>,
    state_listeners: RefCell<HashMap<u64, StoreSubscription>>,
    next_state_listener: Cell<u64>,
}

#[wasm_bindgen]
impl GameClient {
    /// Create a client.
    ///
    /// `config` may be `undefined`, a partial config object or a JSON string.
    /// Without a `seed` the RNG is seeded from the platform's entropy source.
    #[wasm_bindgen(constructor)]
    pub fn new(config: JsValue, seed: Option<u64>) -> Result<GameClient, JsValue> {
        let config = parse_config(config)?;
        let seed = seed.unwrap_or_else(random_seed);

        let bus = EventBus::new(config.bus);
        let store = StateStore::new(config.store);
        let session = GameSession::attach(
            &bus,
            &store,
            gemfall_assets::default_catalog(),
            config.rules,
            XorShiftRng::seed_from_u64(seed),
        )
        .map_err(js_error)?;

        log::info!("=== GEMFALL CLIENT READY (seed {}) ===", seed);
        Ok(Self {
            bus,
            store,
            session,
            state_listeners: RefCell::new(HashMap::new()),
            next_state_listener: Cell::new(0),
        })
    }

    // ==========================================
    // INTENTS
    // ==========================================

    /// Send any command as `{ type, payload }`
    pub fn send(&self, command: JsValue) -> Result<(), JsValue> {
        let command: Command = serde_wasm_bindgen::from_value(command)
            .map_err(|e| js_error(format!("Failed to parse command: {}", e)))?;
        self.session.dispatch(command);
        Ok(())
    }

    pub fn new_run(&self, class: &str) -> Result<(), JsValue> {
        let class = PlayerClass::parse(class)
            .ok_or_else(|| js_error(format!("Unknown class '{}'", class)))?;
        self.session.dispatch(Command::NewRun { class });
        Ok(())
    }

    pub fn start_battle(&self, enemy_key: String) {
        self.session.dispatch(Command::StartBattle { enemy_key });
    }

    pub fn play_gems(&self, indices: Vec<u32>) {
        self.session.dispatch(Command::PlayGems {
            indices: to_indices(indices),
        });
    }

    pub fn wait(&self) {
        self.session.dispatch(Command::Wait);
    }

    pub fn discard_and_end(&self, indices: Vec<u32>) {
        self.session.dispatch(Command::DiscardAndEnd {
            indices: to_indices(indices),
        });
    }

    pub fn end_turn(&self) {
        self.session.dispatch(Command::EndTurn);
    }

    pub fn flee(&self) {
        self.session.dispatch(Command::Flee);
    }

    pub fn start_next_day(&self) {
        self.session.dispatch(Command::StartNextDay);
    }

    pub fn advance_phase(&self) {
        self.session.dispatch(Command::AdvancePhase);
    }

    pub fn buy_gem(&self, gem_key: String) {
        self.session.dispatch(Command::BuyGem { gem_key });
    }

    pub fn sell_gem(&self, gem_id: u32) {
        self.session.dispatch(Command::SellGem {
            gem_id: GemId(gem_id),
        });
    }

    pub fn upgrade_gem(&self, gem_id: u32) {
        self.session.dispatch(Command::UpgradeGem {
            gem_id: GemId(gem_id),
        });
    }

    /// Answered on `GEM_PROFICIENCY_REPORT`
    pub fn query_proficiency(&self, gem_key: String) {
        self.session.dispatch(Command::QueryProficiency { gem_key });
    }

    // ==========================================
    // SUBSCRIPTIONS
    // ==========================================

    /// Call `callback(event)` for every event on `channel`. Returns a token
    /// for `off`.
    pub fn on(&self, channel: &str, callback: js_sys::Function) -> Result<u64, JsValue> {
        let channel = parse_channel(channel)?;
        let token = self
            .bus
            .subscribe(channel, move |event| call_js(&callback, event));
        Ok(token.0)
    }

    /// Like `on`, but removed after the first delivery
    pub fn once(&self, channel: &str, callback: js_sys::Function) -> Result<u64, JsValue> {
        let channel = parse_channel(channel)?;
        let token = self
            .bus
            .subscribe_once(channel, move |event| call_js(&callback, event));
        Ok(token.0)
    }

    pub fn off(&self, channel: &str, token: u64) -> Result<bool, JsValue> {
        let channel = parse_channel(channel)?;
        Ok(self.bus.unsubscribe(channel, SubscriptionToken(token)))
    }

    /// Call `callback({ channel, event })` for every event on every channel
    pub fn on_any(&self, callback: js_sys::Function) -> u64 {
        let token = self.bus.subscribe_all(move |envelope| {
            call_js(
                &callback,
                &Delivery {
                    channel: envelope.channel,
                    event: &envelope.event,
                },
            )
        });
        token.0
    }

    pub fn off_any(&self, token: u64) -> bool {
        self.bus.unsubscribe_all(SubscriptionToken(token))
    }

    /// Call `callback({ document, changes })` after every store write, with
    /// the whole state document and the `{ path, old, new }` records the
    /// write made
    pub fn on_state(&self, callback: js_sys::Function) -> u64 {
        let subscription = self.store.subscribe(move |document, changes| {
            if let Err(err) = call_js(&callback, &StateChange { document, changes }) {
                log::error!("state listener failed: {}", err);
            }
        });
        let id = self.next_state_listener.get() + 1;
        self.next_state_listener.set(id);
        self.state_listeners.borrow_mut().insert(id, subscription);
        id
    }

    pub fn off_state(&self, id: u64) -> bool {
        let subscription = self.state_listeners.borrow_mut().remove(&id);
        match subscription {
            Some(subscription) => {
                subscription.unsubscribe();
                true
            }
            None => false,
        }
    }

    // ==========================================
    // CLOCK AND QUERIES
    // ==========================================

    /// Move the bus clock forward by `elapsed_ms`
    pub fn tick(&self, elapsed_ms: u32) {
        self.bus.advance(u64::from(elapsed_ms));
    }

    /// Buffer an event to be published with the rest of `batch_id`
    pub fn send_batched(&self, batch_id: &str, command: JsValue) -> Result<(), JsValue> {
        let command: Command = serde_wasm_bindgen::from_value(command)
            .map_err(|e| js_error(format!("Failed to parse command: {}", e)))?;
        self.bus.publish_batched(batch_id, GameEvent::Command(command));
        Ok(())
    }

    /// Publish a command after `delay_ms` of `tick` time. Returns a handle
    /// for `cancel`.
    pub fn send_delayed(&self, command: JsValue, delay_ms: u32) -> Result<u64, JsValue> {
        let command: Command = serde_wasm_bindgen::from_value(command)
            .map_err(|e| js_error(format!("Failed to parse command: {}", e)))?;
        let handle = self
            .bus
            .publish_delayed(GameEvent::Command(command), u64::from(delay_ms));
        Ok(handle.0)
    }

    pub fn cancel(&self, handle: u64) -> bool {
        self.bus.cancel(TimerHandle(handle))
    }

    /// The whole state document
    pub fn get_state(&self) -> Result<JsValue, JsValue> {
        to_js(&self.store.snapshot())
    }

    /// The value at a dotted path, or `undefined`
    pub fn get(&self, path: &str) -> Result<JsValue, JsValue> {
        match self.store.get(path) {
            Some(value) => to_js(&value),
            None => Ok(JsValue::UNDEFINED),
        }
    }

    pub fn validate(&self) -> Result<JsValue, JsValue> {
        to_js(&self.store.validate())
    }

    /// Recent store writes, oldest first
    pub fn history(&self) -> Result<JsValue, JsValue> {
        to_js(&self.store.history())
    }

    pub fn proficiency(&self, gem_key: &str) -> Result<JsValue, JsValue> {
        let proficiency = self.session.proficiency(gem_key).map_err(js_error)?;
        to_js(&proficiency)
    }

    /// Every gem definition, for the shop
    pub fn gem_catalog(&self) -> Result<JsValue, JsValue> {
        to_js(&self.session.catalog().gems)
    }

    /// Every enemy definition, for battle selection
    pub fn enemy_catalog(&self) -> Result<JsValue, JsValue> {
        to_js(&self.session.catalog().enemies)
    }

    // ==========================================
    // SAVES
    // ==========================================

    pub fn export_save(&self) -> Result<Vec<u8>, JsValue> {
        let state = self.session.state().map_err(js_error)?;
        Ok(save::encode(&state))
    }

    pub fn import_save(&self, bytes: &[u8]) -> Result<(), JsValue> {
        let state = save::decode(bytes).map_err(js_error)?;
        self.session.restore(&state).map_err(js_error)
    }
}

fn parse_config(config: JsValue) -> Result<GameConfig, JsValue> {
    if config.is_undefined() || config.is_null() {
        return Ok(GameConfig::default());
    }
    if let Some(json) = config.as_string() {
        return GameConfig::from_json(&json)
            .map_err(|e| js_error(format!("Failed to parse config: {}", e)));
    }
    serde_wasm_bindgen::from_value(config)
        .map_err(|e| js_error(format!("Failed to parse config: {}", e)))
}

fn parse_channel(name: &str) -> Result<Channel, JsValue> {
    name.parse()
        .map_err(|_| js_error(format!("Unknown channel '{}'", name)))
}

fn to_indices(indices: Vec<u32>) -> Vec<usize> {
    indices.into_iter().map(|i| i as usize).collect()
}

fn random_seed() -> u64 {
    let mut bytes = [0u8; 8];
    match getrandom::getrandom(&mut bytes) {
        Ok(()) => u64::from_le_bytes(bytes),
        Err(err) => {
            log::warn!("getrandom failed ({}), seeding from the clock", err);
            js_sys::Date::now() as u64
        }
    }
}

/// Plain objects rather than `Map`s, so the UI can read fields directly
fn to_js<T: Serialize + ?Sized>(value: &T) -> Result<JsValue, JsValue> {
    value
        .serialize(&serde_wasm_bindgen::Serializer::json_compatible())
        .map_err(JsValue::from)
}

fn js_error(err: impl Display) -> JsValue {
    js_sys::Error::new(&err.to_string()).into()
}

fn call_js<T: Serialize + ?Sized>(callback: &js_sys::Function, value: &T) -> HandlerResult {
    let value = to_js(value)
        .map_err(|e| HandlerError::failed(format!("Failed to serialize event: {:?}", e)))?;
    callback.call1(&JsValue::NULL, &value).map_err(|err| {
        web_sys::console::error_2(&JsValue::from_str("gemfall: callback threw"), &err);
        HandlerError::failed("callback threw")
    })?;
    Ok(())
}
