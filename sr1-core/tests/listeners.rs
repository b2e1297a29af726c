mod common;

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use serde_json::json;
use sr1_core::{path, App};

use common::{count_updates, Harness};

#[test]
fn test_one_broadcast_per_mutation() {
    let h = Harness::new();
    let updates = count_updates(&h.app);
    h.app.state().set(&path!["a"], 1).unwrap();
    h.app.store().set(&path!["b"], 2).unwrap();
    h.app.route().go_to("/c").unwrap();
    h.app.state().update(&[], json!({ "x": 1, "y": 2 })).unwrap();
    assert_eq!(updates.count(), 4);
}

#[test]
fn test_listener_sees_all_containers_rederived() {
    let h = Harness::new();
    let seen = Rc::new(RefCell::new(None));
    let out = seen.clone();
    h.app.on_update(move |app| {
        *out.borrow_mut() = Some((
            app.state().get(&path!["n"]),
            app.store().get(&path!["n"]),
        ));
        Ok(())
    });
    h.app.store().set(&path!["n"], 2).unwrap();
    assert_eq!(*seen.borrow(), Some((None, Some(json!(2)))));
}

#[test]
fn test_removed_listener_is_not_called() {
    let h = Harness::new();
    let calls = Rc::new(Cell::new(0));
    let c = calls.clone();
    let id = h.app.on_update(move |_| {
        c.set(c.get() + 1);
        Ok(())
    });
    h.app.state().set(&path!["a"], 1).unwrap();
    assert!(h.app.remove_update_listener(id));
    h.app.state().set(&path!["a"], 2).unwrap();
    assert_eq!(calls.get(), 1);
    assert_eq!(h.app.listener_count(), 0);
}

#[test]
fn test_subscription_drop_unsubscribes() {
    let h = Harness::new();
    let calls = Rc::new(Cell::new(0));
    {
        let c = calls.clone();
        let _sub = h.app.subscribe(move |_| {
            c.set(c.get() + 1);
            Ok(())
        });
        h.app.state().set(&path!["a"], 1).unwrap();
        assert_eq!(h.app.listener_count(), 1);
    }
    h.app.state().set(&path!["a"], 2).unwrap();
    assert_eq!(calls.get(), 1);
    assert_eq!(h.app.listener_count(), 0);
}

#[test]
fn test_failing_listeners_are_isolated() {
    let h = Harness::new();
    h.app.on_update(|_| Err("listener error".into()));
    h.app.on_update(|_| panic!("listener panic"));
    let updates = count_updates(&h.app);

    h.app.state().set(&path!["a"], 1).unwrap();
    h.app.state().set(&path!["a"], 2).unwrap();
    assert_eq!(updates.count(), 2);
    assert_eq!(h.app.state().get(&path!["a"]), Some(json!(2)));
}

#[test]
fn test_listener_may_write_back() {
    let h = Harness::new();
    h.app.on_update(|app: &App| {
        let n = app.state().get(&path!["n"]).and_then(|v| v.as_i64()).unwrap_or(0);
        let doubled = app.state().get(&path!["doubled"]).and_then(|v| v.as_i64());
        if doubled != Some(n * 2) {
            app.state().set(&path!["doubled"], n * 2)?;
        }
        Ok(())
    });
    h.app.state().set(&path!["n"], 21).unwrap();
    assert_eq!(h.app.state().get(&path!["doubled"]), Some(json!(42)));
}

#[test]
fn test_listener_added_during_broadcast_waits_for_next() {
    let h = Harness::new();
    let late_calls = Rc::new(Cell::new(0));
    let added = Rc::new(Cell::new(false));
    let (late, flag) = (late_calls.clone(), added.clone());
    h.app.on_update(move |app| {
        if !flag.get() {
            flag.set(true);
            let late = late.clone();
            app.on_update(move |_| {
                late.set(late.get() + 1);
                Ok(())
            });
        }
        Ok(())
    });

    h.app.state().set(&path!["a"], 1).unwrap();
    assert_eq!(late_calls.get(), 0);
    h.app.state().set(&path!["a"], 2).unwrap();
    assert_eq!(late_calls.get(), 1);
}

#[test]
fn test_update_fires_each_listener_once_per_call() {
    let h = Harness::new();
    let calls = Rc::new(Cell::new(0));
    let c = calls.clone();
    let id = h.app.on_update(move |_| {
        c.set(c.get() + 1);
        Ok(())
    });

    h.app.update();
    assert_eq!(calls.get(), 1);
    h.app.update();
    h.app.update();
    assert_eq!(calls.get(), 3);

    assert!(h.app.remove_update_listener(id));
    h.app.update();
    assert_eq!(calls.get(), 3);
}
