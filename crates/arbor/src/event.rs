use std::fmt;
use std::str::FromStr;

use serde_json::Value;
use thiserror::Error;

use crate::store::Store;

/// Names of the events a store emits. The string forms are stable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum EventKind {
    ItemSet,
    ItemRemoved,
    StoreCleared,
    StoreAdded,
}

impl EventKind {
    pub const ALL: [EventKind; 4] = [
        EventKind::ItemSet,
        EventKind::ItemRemoved,
        EventKind::StoreCleared,
        EventKind::StoreAdded,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::ItemSet => "item-set",
            EventKind::ItemRemoved => "item-removed",
            EventKind::StoreCleared => "store-cleared",
            EventKind::StoreAdded => "store-added",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unknown store event '{0}'")]
pub struct UnknownEventKind(pub String);

impl FromStr for EventKind {
    type Err = UnknownEventKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EventKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| UnknownEventKind(s.to_string()))
    }
}

/// Payload delivered to store listeners.
///
/// Events are scoped to the node that was mutated; they are never bubbled to
/// the parent or forwarded to children.
#[derive(Debug, Clone, PartialEq)]
pub enum StoreEvent {
    ItemSet { name: String, value: Value },
    ItemRemoved { name: String },
    StoreCleared,
    /// A child node was created under `name`. Emitted on the parent.
    StoreAdded { name: String, child: Store },
}

impl StoreEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            StoreEvent::ItemSet { .. } => EventKind::ItemSet,
            StoreEvent::ItemRemoved { .. } => EventKind::ItemRemoved,
            StoreEvent::StoreCleared => EventKind::StoreCleared,
            StoreEvent::StoreAdded { .. } => EventKind::StoreAdded,
        }
    }

    /// Item key or child name the event refers to.
    pub fn name(&self) -> Option<&str> {
        match self {
            StoreEvent::ItemSet { name, .. }
            | StoreEvent::ItemRemoved { name }
            | StoreEvent::StoreAdded { name, .. } => Some(name),
            StoreEvent::StoreCleared => None,
        }
    }
}
