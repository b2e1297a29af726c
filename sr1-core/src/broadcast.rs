//! Update listeners.
//!
//! Every mutation of any container ends in one broadcast. Listeners run in
//! registration order against a copy of the list taken when the broadcast
//! starts, so adding or removing listeners from inside a listener affects
//! the next broadcast only. A listener that errors or panics is logged and
//! skipped; the others still run.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::rc::Rc;

use crate::app::App;

/// What a listener returns. Errors are logged, never propagated.
pub type ListenerResult = std::result::Result<(), Box<dyn std::error::Error>>;

type Listener = Rc<dyn Fn(&App) -> ListenerResult>;

/// Handle for removing a listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(u64);

impl fmt::Display for ListenerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Default)]
pub struct Broadcaster {
    next_id: Cell<u64>,
    listeners: RefCell<Vec<(ListenerId, Listener)>>,
}

impl Broadcaster {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add<F>(&self, listener: F) -> ListenerId
    where
        F: Fn(&App) -> ListenerResult + 'static,
    {
        let id = ListenerId(self.next_id.get());
        self.next_id.set(id.0 + 1);
        self.listeners.borrow_mut().push((id, Rc::new(listener)));
        id
    }

    /// Returns false if `id` was not registered.
    pub fn remove(&self, id: ListenerId) -> bool {
        let mut listeners = self.listeners.borrow_mut();
        let before = listeners.len();
        listeners.retain(|(other, _)| *other != id);
        listeners.len() != before
    }

    pub fn len(&self) -> usize {
        self.listeners.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.borrow().is_empty()
    }

    /// Call every listener once with `app`.
    pub fn fire(&self, app: &App) {
        let listeners: Vec<(ListenerId, Listener)> = self.listeners.borrow().clone();
        for (id, listener) in listeners {
            match panic::catch_unwind(AssertUnwindSafe(|| listener(app))) {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    log::error!(target: "sr1::broadcast", "listener {} failed: {}", id, e);
                }
                Err(payload) => {
                    log::error!(
                        target: "sr1::broadcast",
                        "listener {} panicked: {}",
                        id,
                        panic_message(payload.as_ref())
                    );
                }
            }
        }
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s
    } else {
        "non-string panic payload"
    }
}

impl fmt::Debug for Broadcaster {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Broadcaster")
            .field("listeners", &self.len())
            .finish()
    }
}

/// Removes its listener when dropped.
#[must_use = "the listener is removed as soon as the subscription is dropped"]
pub struct Subscription<'a> {
    app: &'a App,
    id: ListenerId,
}

impl<'a> Subscription<'a> {
    pub(crate) fn new(app: &'a App, id: ListenerId) -> Self {
        Self { app, id }
    }
}

impl Drop for Subscription<'_> {
    fn drop(&mut self) {
        self.app.remove_update_listener(self.id);
    }
}

impl fmt::Debug for Subscription<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Subscription").field(&self.id).finish()
    }
}
