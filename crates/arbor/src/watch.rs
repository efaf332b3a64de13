//! Reactive reads.
//!
//! A [`Watch`] describes the live value sequence of one key on one node. It
//! is cold: nothing happens until [`Watch::subscribe`] is called, and every
//! subscription evaluates the current state on its own.
//!
//! Precedence per subscription:
//!
//! 1. A local value present at subscribe time is delivered immediately.
//! 2. Every later local `item-set` for the key is delivered in order.
//! 3. Until a local value has been seen, values of the same key watched on
//!    the parent (recursively) are delivered instead.
//! 4. The first local value cuts the parent off for good. Removing the local
//!    value later does not bring inheritance back.
//!
//! Removals are not part of the sequence; it only ever carries values.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

use arbor_fanout::ListenerId;
use serde_json::Value;
use tracing::trace;

use crate::event::{EventKind, StoreEvent};
use crate::readonly::ReadonlyStore;
use crate::store::Store;

type Observer = Rc<dyn Fn(&Value)>;

/// Cold live sequence of values for a key, created by [`Store::get`].
#[derive(Clone)]
pub struct Watch {
    store: Store,
    key: String,
}

impl Watch {
    pub(crate) fn new(store: Store, key: String) -> Self {
        Self { store, key }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// The node the key is read from.
    pub fn store(&self) -> ReadonlyStore {
        ReadonlyStore::new(self.store.clone())
    }

    /// Start observing. The returned [`Subscription`] stops delivery when it
    /// is dropped or unsubscribed.
    ///
    /// ```
    /// use std::cell::RefCell;
    /// use std::rc::Rc;
    /// use arbor::Store;
    /// use serde_json::{json, Value};
    ///
    /// let root = Store::new();
    /// let child = root.child("child").unwrap();
    /// let seen: Rc<RefCell<Vec<Value>>> = Rc::default();
    /// let sink = Rc::clone(&seen);
    /// let sub = child.get("key").unwrap().subscribe(move |v| sink.borrow_mut().push(v.clone()));
    ///
    /// root.set("key", "inherited").unwrap();
    /// child.set("key", "local").unwrap();
    /// root.set("key", "ignored").unwrap();
    /// assert_eq!(*seen.borrow(), vec![json!("inherited"), json!("local")]);
    /// sub.unsubscribe();
    /// ```
    pub fn subscribe<F>(&self, observer: F) -> Subscription
    where
        F: Fn(&Value) + 'static,
    {
        self.subscribe_observer(Rc::new(observer))
    }

    fn subscribe_observer(&self, observer: Observer) -> Subscription {
        let state = Rc::new(SubscriptionState::default());
        let current = self.store.local_value(&self.key);

        let listener_id = {
            let state = Rc::clone(&state);
            let observer = Rc::clone(&observer);
            let key = self.key.clone();
            self.store.on(EventKind::ItemSet, move |event| {
                let StoreEvent::ItemSet { name, value } = event else {
                    return;
                };
                if *name != key || state.closed.get() {
                    return;
                }
                if !state.local_active.replace(true) {
                    state.release_inherited();
                }
                observer(value);
            })
        };
        trace!(path = %self.store.path(), key = %self.key, "watch subscribed");

        if let Some(value) = current {
            state.local_active.set(true);
            observer(&value);
        } else if let Some(parent) = self.store.parent_store() {
            let inherited = {
                let state = Rc::clone(&state);
                let gated = move |value: &Value| {
                    if !state.local_active.get() && !state.closed.get() {
                        observer(value);
                    }
                };
                Watch::new(parent, self.key.clone()).subscribe_observer(Rc::new(gated))
            };
            // The parent's current value was delivered synchronously above and
            // the observer may have set a local value or unsubscribed in
            // response.
            if !state.local_active.get() && !state.closed.get() {
                *state.inherited.borrow_mut() = Some(inherited);
            }
        }

        Subscription {
            store: self.store.clone(),
            key: self.key.clone(),
            listener_id: Some(listener_id),
            state,
        }
    }
}

impl fmt::Debug for Watch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Watch")
            .field("path", &self.store.path())
            .field("key", &self.key)
            .finish()
    }
}

#[derive(Default)]
struct SubscriptionState {
    local_active: Cell<bool>,
    closed: Cell<bool>,
    inherited: RefCell<Option<Subscription>>,
}

impl SubscriptionState {
    fn release_inherited(&self) {
        let inherited = self.inherited.borrow_mut().take();
        drop(inherited);
    }
}

/// Active watch subscription. Dropping it unsubscribes.
#[must_use = "dropping a Subscription stops delivery immediately"]
pub struct Subscription {
    store: Store,
    key: String,
    listener_id: Option<ListenerId>,
    state: Rc<SubscriptionState>,
}

impl Subscription {
    pub fn unsubscribe(mut self) {
        self.close();
    }

    pub fn is_closed(&self) -> bool {
        self.state.closed.get()
    }

    /// Whether a local value has taken over from the parent.
    pub fn is_local(&self) -> bool {
        self.state.local_active.get()
    }

    fn close(&mut self) {
        let Some(id) = self.listener_id.take() else {
            return;
        };
        self.state.closed.set(true);
        self.store.off(EventKind::ItemSet, id);
        self.state.release_inherited();
        trace!(path = %self.store.path(), key = %self.key, "watch unsubscribed");
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.close();
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("key", &self.key)
            .field("local", &self.is_local())
            .field("closed", &self.is_closed())
            .finish()
    }
}
