use std::fmt;

use arbor_fanout::ListenerId;
use serde_json::Value;

use crate::error::StoreError;
use crate::event::{EventKind, StoreEvent};
use crate::store::Store;
use crate::watch::Watch;

/// Read-only view over a store, handed out by [`Store::parent`] and
/// [`Store::root`].
///
/// Reads delegate to the wrapped node. Ancestors reached through a view are
/// views as well. `set`, `delete`, `remove` and `clear` always fail with
/// [`StoreError::ReadOnly`], whatever the arguments.
#[derive(Clone, PartialEq, Eq)]
pub struct ReadonlyStore {
    store: Store,
}

impl ReadonlyStore {
    pub(crate) fn new(store: Store) -> Self {
        Self { store }
    }

    pub(crate) fn inner(&self) -> &Store {
        &self.store
    }

    /// Whether this view wraps the same node as `store`.
    pub fn is(&self, store: &Store) -> bool {
        self.store.ptr_eq(store)
    }

    pub fn child(&self, name: &str) -> Result<ReadonlyStore, StoreError> {
        self.store.child(name).map(ReadonlyStore::new)
    }

    pub fn parent(&self) -> Option<ReadonlyStore> {
        self.store.parent()
    }

    pub fn root(&self) -> ReadonlyStore {
        self.store.root()
    }

    pub fn is_root(&self) -> bool {
        self.store.is_root()
    }

    pub fn path(&self) -> String {
        self.store.path()
    }

    pub fn has(&self, name: &str) -> Result<bool, StoreError> {
        self.store.has(name)
    }

    pub fn get(&self, name: &str) -> Result<Watch, StoreError> {
        self.store.get(name)
    }

    pub fn peek(&self, name: &str) -> Result<Option<Value>, StoreError> {
        self.store.peek(name)
    }

    pub fn keys(&self) -> Vec<String> {
        self.store.keys()
    }

    pub fn child_names(&self) -> Vec<String> {
        self.store.child_names()
    }

    pub fn snapshot(&self) -> Value {
        self.store.snapshot()
    }

    pub fn on<F>(&self, kind: EventKind, listener: F) -> ListenerId
    where
        F: Fn(&StoreEvent) + 'static,
    {
        self.store.on(kind, listener)
    }

    pub fn off(&self, kind: EventKind, id: ListenerId) -> bool {
        self.store.off(kind, id)
    }

    pub fn set(&self, _name: &str, _value: impl Into<Value>) -> Result<&Self, StoreError> {
        Err(StoreError::ReadOnly)
    }

    pub fn delete(&self, _name: &str) -> Result<Option<Value>, StoreError> {
        Err(StoreError::ReadOnly)
    }

    pub fn remove(&self, _name: &str) -> Result<Option<Value>, StoreError> {
        Err(StoreError::ReadOnly)
    }

    pub fn clear(&self, _nested: bool) -> Result<(), StoreError> {
        Err(StoreError::ReadOnly)
    }
}

impl fmt::Debug for ReadonlyStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ReadonlyStore").field(&self.store).finish()
    }
}
