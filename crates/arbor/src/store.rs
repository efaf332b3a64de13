//! Store nodes: local items, lazily created children and a weak link to the
//! parent.

use std::any::Any;
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fmt;
use std::rc::{Rc, Weak};

use arbor_fanout::{EventEmitter, ListenerId};
use serde_json::{Map, Value};
use tracing::{debug, trace};

use crate::error::StoreError;
use crate::event::{EventKind, StoreEvent};
use crate::path::{self, PATH_SEPARATOR};
use crate::readonly::ReadonlyStore;
use crate::watch::Watch;

struct StoreNode {
    name: Option<String>,
    parent: Option<Weak<StoreNode>>,
    items: RefCell<BTreeMap<String, Value>>,
    children: RefCell<BTreeMap<String, Store>>,
    events: EventEmitter<StoreEvent>,
}

/// Handle to one node of a store tree.
///
/// Cloning a `Store` clones the handle, not the node: both handles observe
/// and mutate the same items. Equality is node identity.
#[derive(Clone)]
pub struct Store {
    node: Rc<StoreNode>,
}

impl Store {
    /// Create a root store.
    pub fn new() -> Self {
        Self::build(None, None)
    }

    /// Create a store whose reads fall back to `parent`.
    ///
    /// The new store is not registered among `parent`'s children.
    pub fn with_parent(parent: &Store) -> Self {
        Self::build(None, Some(Rc::downgrade(&parent.node)))
    }

    /// Like [`Store::with_parent`] for a dynamically typed ancestor, which
    /// must be a [`Store`] or a [`ReadonlyStore`].
    pub fn from_ancestor(ancestor: &dyn Any) -> Result<Self, StoreError> {
        if let Some(store) = ancestor.downcast_ref::<Store>() {
            return Ok(Self::with_parent(store));
        }
        if let Some(view) = ancestor.downcast_ref::<ReadonlyStore>() {
            return Ok(Self::with_parent(view.inner()));
        }
        Err(StoreError::InvalidAncestor)
    }

    fn build(name: Option<String>, parent: Option<Weak<StoreNode>>) -> Self {
        Store {
            node: Rc::new(StoreNode {
                name,
                parent,
                items: RefCell::new(BTreeMap::new()),
                children: RefCell::new(BTreeMap::new()),
                events: EventEmitter::new(),
            }),
        }
    }

    // -------------------------------------------------------------------
    // Navigation
    // -------------------------------------------------------------------

    /// Child store at `name`, creating every missing node along the path.
    ///
    /// ```
    /// use arbor::Store;
    ///
    /// let root = Store::new();
    /// let leaf = root.child("a/b").unwrap();
    /// assert_eq!(leaf, root.child("a").unwrap().child("b").unwrap());
    /// ```
    pub fn child(&self, name: &str) -> Result<Store, StoreError> {
        path::resolve_store(self, name)
    }

    pub fn parent(&self) -> Option<ReadonlyStore> {
        self.parent_store().map(ReadonlyStore::new)
    }

    pub fn root(&self) -> ReadonlyStore {
        let mut current = self.clone();
        while let Some(parent) = current.parent_store() {
            current = parent;
        }
        ReadonlyStore::new(current)
    }

    pub fn is_root(&self) -> bool {
        self.parent_store().is_none()
    }

    /// Segment names from the root down to this node, joined with `/`.
    pub fn path(&self) -> String {
        let mut names = Vec::new();
        let mut current = Some(self.clone());
        while let Some(store) = current {
            if let Some(name) = &store.node.name {
                names.push(name.clone());
            }
            current = store.parent_store();
        }
        names.reverse();
        let separator = PATH_SEPARATOR.to_string();
        names.join(separator.as_str())
    }

    pub fn child_names(&self) -> Vec<String> {
        self.node.children.borrow().keys().cloned().collect()
    }

    pub fn ptr_eq(&self, other: &Store) -> bool {
        Rc::ptr_eq(&self.node, &other.node)
    }

    // -------------------------------------------------------------------
    // Items
    // -------------------------------------------------------------------

    /// Whether this node itself holds `name`. Parents and children are never
    /// consulted.
    pub fn has(&self, name: &str) -> Result<bool, StoreError> {
        path::validate_name(name)?;
        Ok(self.node.items.borrow().contains_key(name))
    }

    /// Live values of `name`, falling back to ancestors until a local value
    /// shows up. See [`Watch`].
    pub fn get(&self, name: &str) -> Result<Watch, StoreError> {
        let (store, key) = path::resolve_item(self, name)?;
        Ok(Watch::new(store, key.to_string()))
    }

    /// Current local value of `name` at the resolved node, without
    /// inheritance.
    pub fn peek(&self, name: &str) -> Result<Option<Value>, StoreError> {
        let (store, key) = path::resolve_item(self, name)?;
        Ok(store.local_value(key))
    }

    /// Store `value` under `name` and emit `item-set` on the node that holds
    /// it. Returns `self` for chaining.
    ///
    /// ```
    /// use arbor::Store;
    /// use serde_json::json;
    ///
    /// let root = Store::new();
    /// root.set("a", 1).unwrap().set("b/c", json!({"x": true})).unwrap();
    /// assert!(root.has("a").unwrap());
    /// assert!(root.child("b").unwrap().has("c").unwrap());
    /// ```
    pub fn set(&self, name: &str, value: impl Into<Value>) -> Result<&Self, StoreError> {
        let (store, key) = path::resolve_item(self, name)?;
        store.insert_item(key, value.into());
        Ok(self)
    }

    /// Remove `name` from the node that holds it, emitting `item-removed`
    /// only when something was actually removed.
    pub fn delete(&self, name: &str) -> Result<Option<Value>, StoreError> {
        let (store, key) = path::resolve_item(self, name)?;
        Ok(store.remove_item(key))
    }

    /// Alias of [`Store::delete`].
    pub fn remove(&self, name: &str) -> Result<Option<Value>, StoreError> {
        self.delete(name)
    }

    /// Remove every local item, then emit `store-cleared`. With `nested`,
    /// each child performs the same sequence afterwards, depth-first.
    pub fn clear(&self, nested: bool) {
        let keys = self.keys();
        debug!(path = %self.path(), items = keys.len(), nested, "clearing store");
        for key in keys {
            self.remove_item(&key);
        }
        self.emit(StoreEvent::StoreCleared);
        if nested {
            let children: Vec<Store> = self.node.children.borrow().values().cloned().collect();
            for child in children {
                child.clear(true);
            }
        }
    }

    pub fn keys(&self) -> Vec<String> {
        self.node.items.borrow().keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.node.items.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.node.items.borrow().is_empty()
    }

    /// JSON object of this subtree: local items, then each child under its
    /// name.
    pub fn snapshot(&self) -> Value {
        let mut out: Map<String, Value> = self
            .node
            .items
            .borrow()
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        let children: Vec<(String, Store)> = self
            .node
            .children
            .borrow()
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        for (name, child) in children {
            out.insert(name, child.snapshot());
        }
        Value::Object(out)
    }

    // -------------------------------------------------------------------
    // Events
    // -------------------------------------------------------------------

    pub fn on<F>(&self, kind: EventKind, listener: F) -> ListenerId
    where
        F: Fn(&StoreEvent) + 'static,
    {
        self.node.events.on(kind.as_str(), listener)
    }

    pub fn off(&self, kind: EventKind, id: ListenerId) -> bool {
        self.node.events.off(kind.as_str(), id)
    }

    /// Deliver `event` to this node's listeners for its kind, returning how
    /// many were invoked. Nothing is mutated and nothing propagates to
    /// parents or children.
    pub fn emit(&self, event: StoreEvent) -> usize {
        self.node.events.emit(event.kind().as_str(), &event)
    }

    // -------------------------------------------------------------------
    // Internal
    // -------------------------------------------------------------------

    pub(crate) fn parent_store(&self) -> Option<Store> {
        let node = self.node.parent.as_ref()?.upgrade()?;
        Some(Store { node })
    }

    pub(crate) fn local_value(&self, key: &str) -> Option<Value> {
        self.node.items.borrow().get(key).cloned()
    }

    /// Descend into `segment`, creating the child when neither a child nor an
    /// item of that name exists.
    pub(crate) fn child_segment(&self, segment: &str) -> Result<Store, StoreError> {
        if let Some(child) = self.node.children.borrow().get(segment) {
            return Ok(child.clone());
        }
        if self.node.items.borrow().contains_key(segment) {
            return Err(StoreError::PathResolution {
                segment: segment.to_string(),
            });
        }
        let child = Store::build(Some(segment.to_string()), Some(Rc::downgrade(&self.node)));
        self.node
            .children
            .borrow_mut()
            .insert(segment.to_string(), child.clone());
        debug!(parent = %self.path(), name = segment, "store added");
        self.emit(StoreEvent::StoreAdded {
            name: segment.to_string(),
            child: child.clone(),
        });
        Ok(child)
    }

    fn insert_item(&self, key: &str, value: Value) {
        self.node
            .items
            .borrow_mut()
            .insert(key.to_string(), value.clone());
        trace!(path = %self.path(), key, "item set");
        self.emit(StoreEvent::ItemSet {
            name: key.to_string(),
            value,
        });
    }

    fn remove_item(&self, key: &str) -> Option<Value> {
        let removed = self.node.items.borrow_mut().remove(key);
        if removed.is_some() {
            trace!(path = %self.path(), key, "item removed");
            self.emit(StoreEvent::ItemRemoved {
                name: key.to_string(),
            });
        }
        removed
    }
}

impl Default for Store {
    fn default() -> Self {
        Self::new()
    }
}

impl PartialEq for Store {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl Eq for Store {}

impl fmt::Debug for Store {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Store")
            .field("path", &self.path())
            .field("items", &self.keys())
            .field("children", &self.child_names())
            .finish()
    }
}
