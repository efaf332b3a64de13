use std::any::Any;
use std::cell::RefCell;
use std::rc::Rc;

use arbor::{EventKind, ReadonlyStore, Store, StoreError, StoreEvent};
use serde_json::json;

fn record(store: &Store) -> Rc<RefCell<Vec<StoreEvent>>> {
    let seen = Rc::new(RefCell::new(Vec::new()));
    for kind in EventKind::ALL {
        let seen = Rc::clone(&seen);
        store.on(kind, move |ev| seen.borrow_mut().push(ev.clone()));
    }
    seen
}

fn removed(name: &str) -> StoreEvent {
    StoreEvent::ItemRemoved { name: name.into() }
}

#[test]
fn invalid_names_are_rejected_by_every_operation() {
    let root = Store::new();
    let child = root.child("child").unwrap();
    for name in ["", " ", "\t", "\n\r", "    "] {
        assert_eq!(root.child(name).unwrap_err(), StoreError::InvalidName, "{name:?}");
        assert_eq!(root.has(name).unwrap_err(), StoreError::InvalidName);
        assert_eq!(root.get(name).unwrap_err(), StoreError::InvalidName);
        assert_eq!(root.peek(name).unwrap_err(), StoreError::InvalidName);
        assert_eq!(root.set(name, 1).unwrap_err(), StoreError::InvalidName);
        assert_eq!(root.delete(name).unwrap_err(), StoreError::InvalidName);
        assert_eq!(root.remove(name).unwrap_err(), StoreError::InvalidName);
        assert_eq!(child.parent().unwrap().child(name).unwrap_err(), StoreError::InvalidName);
        assert_eq!(child.root().has(name).unwrap_err(), StoreError::InvalidName);
        assert_eq!(child.root().get(name).unwrap_err(), StoreError::InvalidName);
    }
    assert_eq!(
        StoreError::InvalidName.to_string(),
        "Parameter name must be non-empty string"
    );
    assert_eq!(root.child_names(), vec!["child".to_string()]);
}

#[test]
fn child_resolution_is_idempotent() {
    let root = Store::new();
    let ab = root.child("a/b").unwrap();
    assert!(ab.ptr_eq(&root.child("a/b").unwrap()));
    assert_eq!(ab, root.child("a").unwrap().child("b").unwrap());
    assert_eq!(root.child_names(), vec!["a".to_string()]);
}

#[test]
fn store_added_fires_once_per_created_node() {
    let root = Store::new();
    let seen = record(&root);
    root.child("a/b").unwrap();
    root.child("a/b").unwrap();
    root.set("a/k", 1).unwrap();
    let adds: Vec<_> = seen
        .borrow()
        .iter()
        .filter(|ev| ev.kind() == EventKind::StoreAdded)
        .map(|ev| ev.name().unwrap().to_string())
        .collect();
    assert_eq!(adds, vec!["a".to_string()]);
}

#[test]
fn bare_key_operations_emit_no_store_added() {
    let root = Store::new();
    let seen = record(&root);
    root.set("k", 1).unwrap();
    root.get("k").unwrap();
    root.delete("k").unwrap();
    assert!(seen
        .borrow()
        .iter()
        .all(|ev| ev.kind() != EventKind::StoreAdded));
    assert!(root.child_names().is_empty());
}

#[test]
fn ancestor_construction() {
    let root = Store::new();
    root.set("k", "v").unwrap();

    let node = Store::from_ancestor(&root).unwrap();
    assert!(node.parent().unwrap().is(&root));
    assert!(root.child_names().is_empty());

    let via_view = Store::from_ancestor(&node.root()).unwrap();
    assert!(via_view.parent().unwrap().is(&root));

    let typed = Store::with_parent(&node);
    assert!(typed.root().is(&root));
    assert_eq!(typed.path(), "");

    let not_stores: [Box<dyn Any>; 4] = [
        Box::new(json!({"k": 1})),
        Box::new("store"),
        Box::new(42u32),
        Box::new(Option::<Store>::None),
    ];
    for bad in &not_stores {
        assert_eq!(
            Store::from_ancestor(&**bad).unwrap_err(),
            StoreError::InvalidAncestor
        );
    }
    assert_eq!(
        StoreError::InvalidAncestor.to_string(),
        "argument must be a Store instance"
    );
}

#[test]
fn explicit_ancestor_is_inherited_from() {
    let root = Store::new();
    let node = Store::with_parent(&root);
    let seen = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&seen);
    let _sub = node
        .get("k")
        .unwrap()
        .subscribe(move |v| sink.borrow_mut().push(v.clone()));
    root.set("k", 1).unwrap();
    assert_eq!(*seen.borrow(), vec![json!(1)]);
}

#[test]
fn has_is_strictly_local() {
    let root = Store::new();
    let child = root.child("child").unwrap();
    assert!(!root.has("k").unwrap());
    root.set("k", 1).unwrap();
    assert!(root.has("k").unwrap());
    assert!(!child.has("k").unwrap());

    child.set("only-child", 1).unwrap();
    assert!(!root.has("only-child").unwrap());
    assert!(!root.has("child/only-child").unwrap());
}

#[test]
fn has_never_creates_nodes() {
    let root = Store::new();
    assert!(!root.has("a/b").unwrap());
    assert!(root.child_names().is_empty());
}

#[test]
fn delete_matrix() {
    let root = Store::new();
    let seen = record(&root);

    assert_eq!(root.delete("never").unwrap(), None);
    assert!(seen.borrow().is_empty());

    root.set("k", json!([1, 2])).unwrap();
    seen.borrow_mut().clear();
    assert_eq!(root.delete("k").unwrap(), Some(json!([1, 2])));
    assert!(!root.has("k").unwrap());
    assert_eq!(*seen.borrow(), vec![removed("k")]);

    assert_eq!(root.remove("k").unwrap(), None);
    assert_eq!(seen.borrow().len(), 1);
}

#[test]
fn delete_through_a_path_targets_the_resolved_node() {
    let root = Store::new();
    root.set("k", "root").unwrap();
    root.set("a/k", "child").unwrap();
    let a = root.child("a").unwrap();
    let root_seen = record(&root);
    let a_seen = record(&a);

    root.delete("a/k").unwrap();
    assert!(root.has("k").unwrap());
    assert!(!a.has("k").unwrap());
    assert!(root_seen.borrow().is_empty());
    assert_eq!(*a_seen.borrow(), vec![removed("k")]);

    // Absent on the child even though the parent holds it.
    root.delete("a/k").unwrap();
    assert_eq!(a_seen.borrow().len(), 1);
}

#[test]
fn clear_emits_removals_then_cleared() {
    let root = Store::new();
    root.set("b", 2).unwrap().set("a", 1).unwrap().set("c", 3).unwrap();
    let seen = record(&root);
    root.clear(false);
    assert_eq!(
        *seen.borrow(),
        vec![
            removed("a"),
            removed("b"),
            removed("c"),
            StoreEvent::StoreCleared
        ]
    );
    for key in ["a", "b", "c"] {
        assert!(!root.has(key).unwrap());
    }
}

#[test]
fn clear_on_empty_store_still_reports_cleared() {
    let root = Store::new();
    let seen = record(&root);
    root.clear(false);
    assert_eq!(*seen.borrow(), vec![StoreEvent::StoreCleared]);
}

#[test]
fn plain_clear_leaves_children_alone() {
    let root = Store::new();
    root.set("k", 1).unwrap();
    root.set("a/k", 2).unwrap();
    let a = root.child("a").unwrap();
    let a_seen = record(&a);
    root.clear(false);
    assert!(a.has("k").unwrap());
    assert!(a_seen.borrow().is_empty());
}

#[test]
fn nested_clear_runs_parent_first_then_children_depth_first() {
    let root = Store::new();
    root.set("k", 0).unwrap();
    root.set("a/k", 1).unwrap();
    root.set("a/x/k", 2).unwrap();
    root.set("b/k", 3).unwrap();

    let log = Rc::new(RefCell::new(Vec::new()));
    for path in ["", "a", "a/x", "b"] {
        let store = if path.is_empty() {
            root.clone()
        } else {
            root.child(path).unwrap()
        };
        for kind in [EventKind::ItemRemoved, EventKind::StoreCleared] {
            let log = Rc::clone(&log);
            let label = path.to_string();
            store.on(kind, move |ev| {
                log.borrow_mut().push(format!("{label}:{}", ev.kind()));
            });
        }
    }

    root.clear(true);
    assert_eq!(
        *log.borrow(),
        vec![
            ":item-removed",
            ":store-cleared",
            "a:item-removed",
            "a:store-cleared",
            "a/x:item-removed",
            "a/x:store-cleared",
            "b:item-removed",
            "b:store-cleared",
        ]
    );
    assert_eq!(root.snapshot(), json!({"a": {"x": {}}, "b": {}}));
}

#[test]
fn listener_sees_each_removal_applied_in_turn() {
    let root = Store::new();
    root.set("a", 1).unwrap().set("b", 2).unwrap();
    let observed = Rc::new(RefCell::new(Vec::new()));
    {
        let observed = Rc::clone(&observed);
        let view = root.root();
        root.on(EventKind::ItemRemoved, move |_| {
            observed
                .borrow_mut()
                .push((view.has("a").unwrap(), view.has("b").unwrap()));
        });
    }
    root.clear(false);
    assert_eq!(*observed.borrow(), vec![(false, true), (false, false)]);
}

#[test]
fn off_stops_a_listener() {
    let root = Store::new();
    let count = Rc::new(RefCell::new(0));
    let sink = Rc::clone(&count);
    let id = root.on(EventKind::ItemSet, move |_| *sink.borrow_mut() += 1);
    root.set("k", 1).unwrap();
    assert!(root.off(EventKind::ItemSet, id));
    assert!(!root.off(EventKind::ItemSet, id));
    root.set("k", 2).unwrap();
    assert_eq!(*count.borrow(), 1);
}

#[test]
fn events_are_not_bubbled() {
    let root = Store::new();
    let a = root.child("a").unwrap();
    let root_seen = record(&root);
    a.set("k", 1).unwrap();
    a.delete("k").unwrap();
    a.clear(true);
    assert!(root_seen.borrow().is_empty());
}

#[test]
fn readonly_views_reject_mutation() {
    let root = Store::new();
    root.set("k", 1).unwrap();
    let leaf = root.child("a/b").unwrap();
    let views: Vec<ReadonlyStore> = vec![
        leaf.root(),
        leaf.parent().unwrap(),
        leaf.parent().unwrap().parent().unwrap(),
    ];
    for view in &views {
        assert_eq!(view.set("k", 2).unwrap_err(), StoreError::ReadOnly);
        assert_eq!(view.set("", 2).unwrap_err(), StoreError::ReadOnly);
        assert_eq!(view.delete("k").unwrap_err(), StoreError::ReadOnly);
        assert_eq!(view.remove("k").unwrap_err(), StoreError::ReadOnly);
        assert_eq!(view.clear(false).unwrap_err(), StoreError::ReadOnly);
        assert_eq!(view.clear(true).unwrap_err(), StoreError::ReadOnly);
    }
    assert_eq!(root.peek("k").unwrap(), Some(json!(1)));
    assert!(root.parent().is_none());
}

#[test]
fn child_rejects_an_item_at_the_final_segment() {
    let root = Store::new();
    root.set("a", 1).unwrap();
    root.set("x/b", 2).unwrap();
    let x = root.child("x").unwrap();
    let root_seen = record(&root);
    let x_seen = record(&x);

    assert_eq!(
        root.child("a").unwrap_err(),
        StoreError::PathResolution { segment: "a".into() }
    );
    assert_eq!(
        root.child("x/b").unwrap_err(),
        StoreError::PathResolution { segment: "b".into() }
    );
    assert_eq!(root.child_names(), vec!["x".to_string()]);
    assert!(x.child_names().is_empty());
    assert!(root_seen.borrow().is_empty());
    assert!(x_seen.borrow().is_empty());
}

#[test]
fn emit_delegates_to_the_node_listeners() {
    let root = Store::new();
    let a = root.child("a").unwrap();
    let root_seen = record(&root);
    let a_seen = record(&a);

    assert_eq!(a.emit(StoreEvent::StoreCleared), 1);
    assert_eq!(a.emit(removed("k")), 1);
    assert_eq!(*a_seen.borrow(), vec![StoreEvent::StoreCleared, removed("k")]);
    assert!(root_seen.borrow().is_empty());
    assert!(a.is_empty());
}
