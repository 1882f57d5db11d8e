//! Channel-keyed publish/subscribe dispatcher.
//!
//! Dispatch is synchronous and re-entrant: a handler may publish while it is
//! being called, and the nested publish runs to completion before the outer
//! one continues. Each publish works from a snapshot of the subscribers taken
//! when it started. A handler removed mid-dispatch is skipped if its turn has
//! not come yet, and a handler added mid-dispatch waits for the next publish.
//!
//! Handler failures (an `Err` or a panic) are logged and never reach the
//! publisher.
//!
//! Time is cooperative. The bus keeps a millisecond clock that only moves
//! when [`EventBus::advance`] is called; delayed publishes and batch quiet
//! windows are measured against it.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt::Debug;
use std::hash::Hash;
use std::panic::{self, AssertUnwindSafe};
use std::rc::Rc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default quiet window before a batch flushes on its own
pub const DEFAULT_BATCH_QUIET_MS: u64 = 16;

/// An event type the bus can route
pub trait BusEvent: Clone + Debug + 'static {
    type Channel: Copy + Eq + Hash + Debug + 'static;

    /// The channel this event is published on
    fn channel(&self) -> Self::Channel;

    /// Marker published before the events of a flushed batch
    fn batch_start(batch_id: &str, count: usize) -> Self;

    /// Marker published after the events of a flushed batch
    fn batch_end(batch_id: &str, count: usize) -> Self;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SubscriptionToken(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TimerHandle(pub u64);

/// What wildcard subscribers receive
#[derive(Debug, Clone, PartialEq)]
pub struct Envelope<E: BusEvent> {
    pub channel: E::Channel,
    pub event: E,
}

#[derive(Debug, Error)]
pub enum HandlerError {
    #[error("{0}")]
    Failed(String),
}

impl HandlerError {
    pub fn failed(message: impl Into<String>) -> Self {
        HandlerError::Failed(message.into())
    }
}

pub type HandlerResult = Result<(), HandlerError>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BusConfig {
    /// Milliseconds without a new event before a batch flushes
    pub batch_quiet_ms: u64,
}

impl Default for BusConfig {
    fn default() -> Self {
        Self {
            batch_quiet_ms: DEFAULT_BATCH_QUIET_MS,
        }
    }
}

type Handler<E> = Rc<dyn Fn(&E) -> HandlerResult>;
type WildcardHandler<E> = Rc<dyn Fn(&Envelope<E>) -> HandlerResult>;

struct Subscription<E> {
    token: SubscriptionToken,
    handler: Handler<E>,
    once: bool,
}

struct Timer<E> {
    handle: TimerHandle,
    due_ms: u64,
    event: E,
}

struct Batch<E> {
    id: String,
    events: Vec<E>,
    flush_at_ms: u64,
}

struct BusInner<E: BusEvent> {
    channels: HashMap<E::Channel, Vec<Subscription<E>>>,
    wildcard: Vec<(SubscriptionToken, WildcardHandler<E>)>,
    timers: Vec<Timer<E>>,
    batches: Vec<Batch<E>>,
    now_ms: u64,
    next_id: u64,
    config: BusConfig,
}

impl<E: BusEvent> BusInner<E> {
    fn next_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    fn is_subscribed(&self, channel: E::Channel, token: SubscriptionToken) -> bool {
        self.channels
            .get(&channel)
            .is_some_and(|subs| subs.iter().any(|s| s.token == token))
    }

    fn remove(&mut self, channel: E::Channel, token: SubscriptionToken) -> bool {
        let Some(subs) = self.channels.get_mut(&channel) else {
            return false;
        };
        let before = subs.len();
        subs.retain(|s| s.token != token);
        subs.len() != before
    }
}

/// Shared handle to one dispatcher. Clones refer to the same bus.
pub struct EventBus<E: BusEvent> {
    inner: Rc<RefCell<BusInner<E>>>,
}

impl<E: BusEvent> Clone for EventBus<E> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<E: BusEvent> Default for EventBus<E> {
    fn default() -> Self {
        Self::new(BusConfig::default())
    }
}

impl<E: BusEvent> EventBus<E> {
    pub fn new(config: BusConfig) -> Self {
        Self {
            inner: Rc::new(RefCell::new(BusInner {
                channels: HashMap::new(),
                wildcard: Vec::new(),
                timers: Vec::new(),
                batches: Vec::new(),
                now_ms: 0,
                next_id: 0,
                config,
            })),
        }
    }

    // ==========================================
    // SUBSCRIPTIONS
    // ==========================================

    pub fn subscribe(
        &self,
        channel: E::Channel,
        handler: impl Fn(&E) -> HandlerResult + 'static,
    ) -> SubscriptionToken {
        self.add(channel, Rc::new(handler), false)
    }

    /// Subscribe for a single delivery; the subscription removes itself first.
    pub fn subscribe_once(
        &self,
        channel: E::Channel,
        handler: impl Fn(&E) -> HandlerResult + 'static,
    ) -> SubscriptionToken {
        self.add(channel, Rc::new(handler), true)
    }

    fn add(&self, channel: E::Channel, handler: Handler<E>, once: bool) -> SubscriptionToken {
        let mut inner = self.inner.borrow_mut();
        let token = SubscriptionToken(inner.next_id());
        inner.channels.entry(channel).or_default().push(Subscription {
            token,
            handler,
            once,
        });
        token
    }

    /// Receive every event on every channel, after the channel's own handlers
    pub fn subscribe_all(
        &self,
        handler: impl Fn(&Envelope<E>) -> HandlerResult + 'static,
    ) -> SubscriptionToken {
        let mut inner = self.inner.borrow_mut();
        let token = SubscriptionToken(inner.next_id());
        inner.wildcard.push((token, Rc::new(handler)));
        token
    }

    /// Remove a channel subscription. Unknown tokens are ignored.
    pub fn unsubscribe(&self, channel: E::Channel, token: SubscriptionToken) -> bool {
        self.inner.borrow_mut().remove(channel, token)
    }

    /// Remove a wildcard subscription. Unknown tokens are ignored.
    pub fn unsubscribe_all(&self, token: SubscriptionToken) -> bool {
        let mut inner = self.inner.borrow_mut();
        let before = inner.wildcard.len();
        inner.wildcard.retain(|(t, _)| *t != token);
        inner.wildcard.len() != before
    }

    pub fn subscriber_count(&self, channel: E::Channel) -> usize {
        self.inner
            .borrow()
            .channels
            .get(&channel)
            .map_or(0, Vec::len)
    }

    // ==========================================
    // DISPATCH
    // ==========================================

    /// Deliver an event to its channel's handlers in subscription order, then
    /// to the wildcard handlers.
    pub fn publish(&self, event: E) {
        let channel = event.channel();
        log::trace!("publish on {:?}", channel);

        let snapshot: Vec<(SubscriptionToken, Handler<E>, bool)> = {
            let inner = self.inner.borrow();
            inner
                .channels
                .get(&channel)
                .map(|subs| {
                    subs.iter()
                        .map(|s| (s.token, Rc::clone(&s.handler), s.once))
                        .collect()
                })
                .unwrap_or_default()
        };

        for (token, handler, once) in snapshot {
            {
                let mut inner = self.inner.borrow_mut();
                if !inner.is_subscribed(channel, token) {
                    continue;
                }
                if once {
                    inner.remove(channel, token);
                }
            }
            let outcome = panic::catch_unwind(AssertUnwindSafe(|| handler(&event)));
            report(channel, token, outcome);
        }

        let wildcard: Vec<(SubscriptionToken, WildcardHandler<E>)> = self
            .inner
            .borrow()
            .wildcard
            .iter()
            .map(|(t, h)| (*t, Rc::clone(h)))
            .collect();
        if wildcard.is_empty() {
            return;
        }
        let envelope = Envelope { channel, event };
        for (token, handler) in wildcard {
            let still_there = self
                .inner
                .borrow()
                .wildcard
                .iter()
                .any(|(t, _)| *t == token);
            if !still_there {
                continue;
            }
            let outcome = panic::catch_unwind(AssertUnwindSafe(|| handler(&envelope)));
            report(channel, token, outcome);
        }
    }

    // ==========================================
    // TIMERS AND BATCHES
    // ==========================================

    /// Publish `event` once the clock has moved `delay_ms` past now
    pub fn publish_delayed(&self, event: E, delay_ms: u64) -> TimerHandle {
        let mut inner = self.inner.borrow_mut();
        let handle = TimerHandle(inner.next_id());
        let due_ms = inner.now_ms + delay_ms;
        inner.timers.push(Timer {
            handle,
            due_ms,
            event,
        });
        handle
    }

    /// Drop a pending delayed publish. Returns false if it already fired.
    pub fn cancel(&self, handle: TimerHandle) -> bool {
        let mut inner = self.inner.borrow_mut();
        let before = inner.timers.len();
        inner.timers.retain(|t| t.handle != handle);
        inner.timers.len() != before
    }

    /// Buffer an event under `batch_id`. Each addition restarts the quiet window.
    pub fn publish_batched(&self, batch_id: &str, event: E) {
        let mut inner = self.inner.borrow_mut();
        let flush_at_ms = inner.now_ms + inner.config.batch_quiet_ms;
        match inner.batches.iter_mut().find(|b| b.id == batch_id) {
            Some(batch) => {
                batch.events.push(event);
                batch.flush_at_ms = flush_at_ms;
            }
            None => inner.batches.push(Batch {
                id: batch_id.to_string(),
                events: vec![event],
                flush_at_ms,
            }),
        }
    }

    /// Emit a batch now, wrapped in start and end markers. Returns how many
    /// events it held (0 if there was no such batch).
    pub fn flush_batch(&self, batch_id: &str) -> usize {
        let batch = {
            let mut inner = self.inner.borrow_mut();
            match inner.batches.iter().position(|b| b.id == batch_id) {
                Some(pos) => inner.batches.remove(pos),
                None => return 0,
            }
        };
        let count = batch.events.len();
        self.publish(E::batch_start(&batch.id, count));
        for event in batch.events {
            self.publish(event);
        }
        self.publish(E::batch_end(&batch.id, count));
        count
    }

    /// Move the clock forward, fire due timers in due order, then flush
    /// batches whose quiet window has passed.
    ///
    /// Only timers already due when the call starts fire. A timer armed by a
    /// handler during the call waits for the next `advance`, even with a
    /// zero delay. A due timer cancelled by an earlier one never fires.
    pub fn advance(&self, elapsed_ms: u64) {
        let (now_ms, mut due_timers) = {
            let mut inner = self.inner.borrow_mut();
            inner.now_ms += elapsed_ms;
            let now_ms = inner.now_ms;
            let due: Vec<(u64, TimerHandle)> = inner
                .timers
                .iter()
                .filter(|t| t.due_ms <= now_ms)
                .map(|t| (t.due_ms, t.handle))
                .collect();
            (now_ms, due)
        };
        due_timers.sort();

        for (_, handle) in due_timers {
            let timer = {
                let mut inner = self.inner.borrow_mut();
                match inner.timers.iter().position(|t| t.handle == handle) {
                    Some(pos) => inner.timers.remove(pos),
                    None => continue,
                }
            };
            self.publish(timer.event);
        }

        let due: Vec<String> = self
            .inner
            .borrow()
            .batches
            .iter()
            .filter(|b| b.flush_at_ms <= now_ms)
            .map(|b| b.id.clone())
            .collect();
        for batch_id in due {
            self.flush_batch(&batch_id);
        }
    }

    pub fn now_ms(&self) -> u64 {
        self.inner.borrow().now_ms
    }

    pub fn pending_timers(&self) -> usize {
        self.inner.borrow().timers.len()
    }

    pub fn pending_batches(&self) -> usize {
        self.inner.borrow().batches.len()
    }
}

fn report<C: Debug>(
    channel: C,
    token: SubscriptionToken,
    outcome: std::thread::Result<HandlerResult>,
) {
    match outcome {
        Ok(Ok(())) => {}
        Ok(Err(err)) => log::error!("handler {} on {:?} failed: {}", token.0, channel, err),
        Err(_) => log::error!("handler {} on {:?} panicked", token.0, channel),
    }
}
