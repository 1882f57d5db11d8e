//! Coordination layer for Gemfall.
//!
//! - [`bus`]: the channel-keyed publish/subscribe dispatcher
//! - [`store`]: the hierarchical state document and its change history
//! - [`channel`]: channel names and the typed events that travel on them
//! - [`session`]: the glue that turns commands into engine calls
//!
//! Everything here is single-threaded. Handles are `Rc<RefCell<_>>` inside
//! and cloning one gives another handle to the same instance.

pub mod bus;
pub mod channel;
pub mod config;
pub mod path;
pub mod session;
pub mod store;

#[cfg(test)]
mod tests;

pub use bus::{
    BusConfig, BusEvent, Envelope, EventBus, HandlerError, HandlerResult, SubscriptionToken,
    TimerHandle,
};
pub use channel::{Channel, Command, GameEvent};
pub use config::GameConfig;
pub use path::{paths, Schema, StatePath};
pub use session::{GameSession, SessionError};
pub use store::{
    ChangeRecord, StateStore, StoreConfig, StoreError, StoreSubscription, Validation,
};
