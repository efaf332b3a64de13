//! arbor — hierarchical observable key-value store.
//!
//! A [`Store`] is one node of a tree. Each node keeps its own items; child
//! nodes are created on demand from slash-delimited paths, and reads through
//! [`Store::get`] fall back to ancestor values until the node gets a value of
//! its own.
//!
//! # Example
//!
//! ```
//! use std::cell::RefCell;
//! use std::rc::Rc;
//! use arbor::{Store, StoreError};
//! use serde_json::json;
//!
//! let root = Store::new();
//! root.set("theme", "dark").unwrap();
//! let editor = root.child("panels/editor").unwrap();
//!
//! let seen = Rc::new(RefCell::new(Vec::new()));
//! let sink = Rc::clone(&seen);
//! let _sub = editor
//!     .get("theme")
//!     .unwrap()
//!     .subscribe(move |v| sink.borrow_mut().push(v.clone()));
//! editor.set("theme", "light").unwrap();
//! assert_eq!(*seen.borrow(), vec![json!("dark"), json!("light")]);
//!
//! // Ancestors are only reachable read-only.
//! assert_eq!(editor.root().set("theme", "x"), Err(StoreError::ReadOnly));
//! ```
//!
//! Everything is single-threaded: handles are `Rc` based and listeners run
//! synchronously inside the mutating call.

pub mod error;
pub mod event;
pub mod path;
pub mod readonly;
pub mod store;
pub mod watch;

pub use arbor_fanout::ListenerId;
pub use error::StoreError;
pub use event::{EventKind, StoreEvent, UnknownEventKind};
pub use path::{split_path, validate_name, PATH_SEPARATOR};
pub use readonly::ReadonlyStore;
pub use store::Store;
pub use watch::{Subscription, Watch};

/// Returns the crate version at compile time.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
