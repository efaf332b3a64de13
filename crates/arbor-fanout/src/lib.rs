//! Synchronous, in-process event emitter.
//!
//! An [`EventEmitter`] maps an event name to an ordered set of listeners.
//! Listeners are registered with [`EventEmitter::on`], which hands back a
//! [`ListenerId`] that can later be passed to [`EventEmitter::off`].
//!
//! # Example
//!
//! ```
//! use std::cell::Cell;
//! use std::rc::Rc;
//! use arbor_fanout::EventEmitter;
//!
//! let emitter = EventEmitter::<u32>::new();
//! let total = Rc::new(Cell::new(0));
//! let sink = Rc::clone(&total);
//! let id = emitter.on("tick", move |n| sink.set(sink.get() + n));
//!
//! emitter.emit("tick", &2);
//! emitter.emit("tock", &100);
//! assert_eq!(total.get(), 2);
//!
//! assert!(emitter.off("tick", id));
//! emitter.emit("tick", &5);
//! assert_eq!(total.get(), 2);
//! ```
//!
//! The emitter is single-threaded and re-entrant: a listener may register or
//! remove listeners, or emit further events, from inside its own callback.
//! Each emission walks a snapshot of the listeners taken when it started.

use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

/// Handle returned by [`EventEmitter::on`].
///
/// Ids are unique per emitter and increase monotonically, so listeners of one
/// event run in registration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ListenerId(u64);

impl ListenerId {
    pub fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ListenerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

type Listener<P> = Rc<dyn Fn(&P)>;

/// Event-name keyed listener registry.
pub struct EventEmitter<P> {
    next_listener_id: Cell<u64>,
    listeners: RefCell<BTreeMap<String, BTreeMap<ListenerId, Listener<P>>>>,
}

impl<P> EventEmitter<P> {
    pub fn new() -> Self {
        Self {
            next_listener_id: Cell::new(1),
            listeners: RefCell::new(BTreeMap::new()),
        }
    }

    /// Register `listener` for `event`.
    pub fn on<F>(&self, event: &str, listener: F) -> ListenerId
    where
        F: Fn(&P) + 'static,
    {
        let id = ListenerId(self.next_listener_id.get());
        self.next_listener_id
            .set(self.next_listener_id.get().saturating_add(1));
        self.listeners
            .borrow_mut()
            .entry(event.to_string())
            .or_default()
            .insert(id, Rc::new(listener));
        id
    }

    /// Remove a listener. Returns `false` when `id` is not registered for
    /// `event`.
    pub fn off(&self, event: &str, id: ListenerId) -> bool {
        let removed = {
            let mut listeners = self.listeners.borrow_mut();
            let Some(bucket) = listeners.get_mut(event) else {
                return false;
            };
            let removed = bucket.remove(&id);
            if bucket.is_empty() {
                listeners.remove(event);
            }
            removed
        };
        // Dropped with the registry unborrowed: the listener may own values
        // whose `Drop` calls back into this emitter.
        removed.is_some()
    }

    /// Invoke every listener of `event` with `payload`, returning how many
    /// listeners the emission started with.
    pub fn emit(&self, event: &str, payload: &P) -> usize {
        // No borrow may be held while listeners run: they are free to call
        // `on`/`off`/`emit` on this same emitter.
        let snapshot: Vec<Listener<P>> = match self.listeners.borrow().get(event) {
            Some(bucket) => bucket.values().cloned().collect(),
            None => return 0,
        };
        for listener in &snapshot {
            listener(payload);
        }
        snapshot.len()
    }

    pub fn listener_count(&self, event: &str) -> usize {
        self.listeners.borrow().get(event).map_or(0, BTreeMap::len)
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.borrow().is_empty()
    }
}

impl<P> Default for EventEmitter<P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P> fmt::Debug for EventEmitter<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let listeners = self.listeners.borrow();
        let mut map = f.debug_map();
        for (event, bucket) in listeners.iter() {
            map.entry(event, &bucket.len());
        }
        map.finish()
    }
}
