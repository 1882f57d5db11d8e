mod session;

use std::cell::RefCell;
use std::rc::Rc;

use gemfall_battle::{BattleRng, GameState, Rules};

use crate::bus::{BusConfig, BusEvent, EventBus};
use crate::channel::{Channel, Command, GameEvent};
use crate::session::GameSession;
use crate::store::{StateStore, StoreConfig};

// ==========================================
// HELPER FUNCTIONS (Boilerplate Reduction)
// ==========================================

/// Small event type for exercising the bus on its own
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum TestEvent {
    Ping(u32),
    Pong(u32),
    Start(String, usize),
    End(String, usize),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) enum TestChannel {
    Ping,
    Pong,
    Marker,
}

impl BusEvent for TestEvent {
    type Channel = TestChannel;

    fn channel(&self) -> TestChannel {
        match self {
            TestEvent::Ping(_) => TestChannel::Ping,
            TestEvent::Pong(_) => TestChannel::Pong,
            TestEvent::Start(..) | TestEvent::End(..) => TestChannel::Marker,
        }
    }

    fn batch_start(batch_id: &str, count: usize) -> Self {
        TestEvent::Start(batch_id.to_string(), count)
    }

    fn batch_end(batch_id: &str, count: usize) -> Self {
        TestEvent::End(batch_id.to_string(), count)
    }
}

/// Shared log that handlers append to
pub(crate) type Log = Rc<RefCell<Vec<String>>>;

pub(crate) fn new_log() -> Log {
    Rc::new(RefCell::new(Vec::new()))
}

pub(crate) fn entries(log: &Log) -> Vec<String> {
    log.borrow().clone()
}

pub(crate) fn test_bus() -> EventBus<TestEvent> {
    EventBus::new(BusConfig { batch_quiet_ms: 10 })
}

/// Returns the same value forever; 9_999 passes every failure roll
pub(crate) struct FixedRng(pub u32);

impl BattleRng for FixedRng {
    fn next_u32(&mut self) -> u32 {
        self.0
    }
}

pub(crate) struct Harness {
    pub bus: EventBus<GameEvent>,
    pub store: StateStore,
    pub session: GameSession<FixedRng>,
}

impl Harness {
    pub(crate) fn new() -> Self {
        Self::with_rng(FixedRng(9_999))
    }

    pub(crate) fn with_rng(rng: FixedRng) -> Self {
        let bus = EventBus::new(BusConfig::default());
        let store = StateStore::new(StoreConfig::default());
        let session = GameSession::attach(
            &bus,
            &store,
            gemfall_assets::default_catalog(),
            Rules::default(),
            rng,
        )
        .expect("game paths fit the schema");
        Self { bus, store, session }
    }

    pub(crate) fn send(&self, command: Command) {
        self.bus.publish(GameEvent::Command(command));
    }

    pub(crate) fn state(&self) -> GameState {
        self.session.state().expect("a run is in progress")
    }

    /// Record every event published on `channel`
    pub(crate) fn capture(&self, channel: Channel) -> Rc<RefCell<Vec<GameEvent>>> {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        self.bus.subscribe(channel, move |event| {
            sink.borrow_mut().push(event.clone());
            Ok(())
        });
        seen
    }
}
