//! Hierarchical state store.
//!
//! One JSON document addressed by [`StatePath`]s. Writes create missing
//! intermediate objects, keep a bounded history of `(path, old, new)`
//! records and notify the store's own subscribers. Store notifications never
//! travel over the event bus.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::panic::{self, AssertUnwindSafe};
use std::rc::{Rc, Weak};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::path::{Schema, StatePath};

/// Default number of change records kept
pub const DEFAULT_HISTORY_CAP: usize = 100;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("invalid state path '{path}'")]
    InvalidPath { path: String },
    #[error("cannot write through '{path}': not an object")]
    NotAContainer { path: String },
    #[error("nothing stored at '{path}'")]
    MissingPath { path: String },
    #[error("'{path}' is outside every known section")]
    UnknownSection { path: String },
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// One mutation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChangeRecord {
    pub path: StatePath,
    pub old: Option<Value>,
    pub new: Value,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Validation {
    pub valid: bool,
    pub issues: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct StoreConfig {
    /// Change records kept before the oldest is evicted
    pub history_cap: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            history_cap: DEFAULT_HISTORY_CAP,
        }
    }
}

type Listener = Rc<dyn Fn(&Value, &[ChangeRecord])>;

struct StoreInner {
    document: Value,
    history: VecDeque<ChangeRecord>,
    history_cap: usize,
    schema: Schema,
    listeners: Vec<(u64, Listener)>,
    next_listener: u64,
}

impl StoreInner {
    fn record(&mut self, change: ChangeRecord) {
        if self.history_cap == 0 {
            return;
        }
        while self.history.len() >= self.history_cap {
            self.history.pop_front();
        }
        self.history.push_back(change);
    }
}

/// Shared handle to one state document. Clones refer to the same store.
#[derive(Clone)]
pub struct StateStore {
    inner: Rc<RefCell<StoreInner>>,
}

impl Default for StateStore {
    fn default() -> Self {
        Self::new(StoreConfig::default())
    }
}

impl StateStore {
    /// A store holding the game's sections, all empty
    pub fn new(config: StoreConfig) -> Self {
        Self::with_schema(config, Schema::game())
    }

    pub fn with_schema(config: StoreConfig, schema: Schema) -> Self {
        Self {
            inner: Rc::new(RefCell::new(StoreInner {
                document: schema.empty_document(),
                history: VecDeque::new(),
                history_cap: config.history_cap,
                schema,
                listeners: Vec::new(),
                next_listener: 0,
            })),
        }
    }

    // ==========================================
    // READS
    // ==========================================

    /// Value at `path`. Missing or malformed paths read as `None`.
    pub fn get(&self, path: &str) -> Option<Value> {
        let path = StatePath::parse(path).ok()?;
        lookup(&self.inner.borrow().document, &path).cloned()
    }

    /// Deserialize the value at `path`
    pub fn get_as<T: DeserializeOwned>(&self, path: &str) -> Result<T, StoreError> {
        let parsed = StatePath::parse(path)?;
        let inner = self.inner.borrow();
        let value = lookup(&inner.document, &parsed).ok_or_else(|| StoreError::MissingPath {
            path: path.to_string(),
        })?;
        Ok(T::deserialize(value)?)
    }

    /// A copy of the whole document
    pub fn snapshot(&self) -> Value {
        self.inner.borrow().document.clone()
    }

    /// Change records, oldest first
    pub fn history(&self) -> Vec<ChangeRecord> {
        self.inner.borrow().history.iter().cloned().collect()
    }

    pub fn schema(&self) -> Schema {
        self.inner.borrow().schema.clone()
    }

    /// Structural check of the document; reports, never corrects
    pub fn validate(&self) -> Validation {
        let inner = self.inner.borrow();
        inner.schema.validate(&inner.document)
    }

    // ==========================================
    // WRITES
    // ==========================================

    /// Write and notify subscribers
    pub fn set(&self, path: &str, value: impl Into<Value>) -> Result<(), StoreError> {
        let change = self.write(path, value.into())?;
        self.notify(&[change]);
        Ok(())
    }

    /// Write without notifying
    pub fn set_quiet(&self, path: &str, value: impl Into<Value>) -> Result<(), StoreError> {
        self.write(path, value.into()).map(|_| ())
    }

    /// Serialize `value` and write it
    pub fn set_as<T: Serialize>(&self, path: &str, value: &T) -> Result<(), StoreError> {
        self.set(path, serde_json::to_value(value)?)
    }

    /// Read-modify-write in one step
    pub fn update(
        &self,
        path: &str,
        f: impl FnOnce(Option<&Value>) -> Value,
    ) -> Result<(), StoreError> {
        let parsed = StatePath::parse(path)?;
        let current = {
            let inner = self.inner.borrow();
            lookup(&inner.document, &parsed).cloned()
        };
        self.set(path, f(current.as_ref()))
    }

    /// Apply every write with one notification. Nothing is written unless
    /// every entry succeeds.
    pub fn batch_update<P, I>(&self, entries: I) -> Result<(), StoreError>
    where
        P: AsRef<str>,
        I: IntoIterator<Item = (P, Value)>,
    {
        let changes: Vec<ChangeRecord> = {
            let mut inner = self.inner.borrow_mut();
            let mut document = inner.document.clone();
            let mut changes = Vec::new();
            for (path, value) in entries {
                let path = StatePath::parse(path.as_ref())?;
                let old = write_at(&mut document, &path, value.clone())?;
                changes.push(ChangeRecord {
                    path,
                    old,
                    new: value,
                });
            }
            if changes.is_empty() {
                return Ok(());
            }
            inner.document = document;
            for change in &changes {
                inner.record(change.clone());
            }
            changes
        };
        self.notify(&changes);
        Ok(())
    }

    fn write(&self, path: &str, value: Value) -> Result<ChangeRecord, StoreError> {
        let path = StatePath::parse(path)?;
        let mut inner = self.inner.borrow_mut();
        ensure_writable(&inner.document, &path)?;
        let old = write_at(&mut inner.document, &path, value.clone())?;
        let change = ChangeRecord {
            path,
            old,
            new: value,
        };
        inner.record(change.clone());
        Ok(change)
    }

    // ==========================================
    // SUBSCRIPTIONS
    // ==========================================

    /// Be told about every notifying write. The listener gets the whole
    /// document as it stands after the write, then the records the write
    /// made. Keep the returned handle to unsubscribe later.
    pub fn subscribe(
        &self,
        listener: impl Fn(&Value, &[ChangeRecord]) + 'static,
    ) -> StoreSubscription {
        let mut inner = self.inner.borrow_mut();
        inner.next_listener += 1;
        let id = inner.next_listener;
        inner.listeners.push((id, Rc::new(listener)));
        StoreSubscription {
            store: Rc::downgrade(&self.inner),
            id,
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.inner.borrow().listeners.len()
    }

    fn notify(&self, changes: &[ChangeRecord]) {
        let (document, listeners) = {
            let inner = self.inner.borrow();
            if inner.listeners.is_empty() {
                return;
            }
            let listeners: Vec<(u64, Listener)> = inner
                .listeners
                .iter()
                .map(|(id, l)| (*id, Rc::clone(l)))
                .collect();
            (inner.document.clone(), listeners)
        };
        for (id, listener) in listeners {
            if panic::catch_unwind(AssertUnwindSafe(|| listener(&document, changes))).is_err() {
                log::error!("store listener {} panicked", id);
            }
        }
    }
}

/// Handle returned by [`StateStore::subscribe`]
#[derive(Debug)]
pub struct StoreSubscription {
    store: Weak<RefCell<StoreInner>>,
    id: u64,
}

impl StoreSubscription {
    pub fn unsubscribe(self) {
        if let Some(store) = self.store.upgrade() {
            store.borrow_mut().listeners.retain(|(id, _)| *id != self.id);
        }
    }
}

// ==========================================
// DOCUMENT WALKING
// ==========================================

fn lookup<'a>(document: &'a Value, path: &StatePath) -> Option<&'a Value> {
    path.segments()
        .try_fold(document, |node, segment| node.as_object()?.get(segment))
}

/// Fail if some existing intermediate on the path is a non-null scalar
fn ensure_writable(document: &Value, path: &StatePath) -> Result<(), StoreError> {
    let segments: Vec<&str> = path.segments().collect();
    let mut node = document;
    for (depth, segment) in segments.iter().enumerate() {
        let Some(map) = node.as_object() else {
            if node.is_null() {
                return Ok(());
            }
            return Err(StoreError::NotAContainer {
                path: segments[..depth].join("."),
            });
        };
        match map.get(*segment) {
            Some(child) if depth + 1 < segments.len() => node = child,
            _ => return Ok(()),
        }
    }
    Ok(())
}

/// Write `value`, creating objects for missing or null intermediates.
/// Returns the previous value.
fn write_at(document: &mut Value, path: &StatePath, value: Value) -> Result<Option<Value>, StoreError> {
    let segments: Vec<&str> = path.segments().collect();
    insert(document, &segments, 0, value)
}

fn insert(
    node: &mut Value,
    segments: &[&str],
    depth: usize,
    value: Value,
) -> Result<Option<Value>, StoreError> {
    if node.is_null() {
        *node = Value::Object(Map::new());
    }
    let Value::Object(map) = node else {
        return Err(StoreError::NotAContainer {
            path: segments[..depth].join("."),
        });
    };
    let segment = segments[depth];
    if depth + 1 == segments.len() {
        return Ok(map.insert(segment.to_string(), value));
    }
    let child = map
        .entry(segment.to_string())
        .or_insert_with(|| Value::Object(Map::new()));
    insert(child, segments, depth + 1, value)
}
