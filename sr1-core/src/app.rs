//! The application context.
//!
//! An [`App`] owns everything the three containers need: their current
//! snapshots, the address bar, the storage area, a clock and the listener
//! list. Independent apps do not share state, which keeps tests isolated.

use std::cell::RefCell;
use std::fmt;

use serde_json::{Map, Value};
use sr1_types::Snapshot;
use url::Url;

use crate::broadcast::{Broadcaster, ListenerId, ListenerResult, Subscription};
use crate::clock::{Clock, SystemClock};
use crate::config::Config;
use crate::container::{Container, PersistHook};
use crate::error::Result;
use crate::history::{History, MemoryHistory};
use crate::route::{HistoryDebounce, Route, RouteHook};
use crate::state::{State, StateHook};
use crate::storage::{FileStorage, MemoryStorage, Storage};
use crate::store::{Store, StoreHook};

/// Current snapshot of each container.
#[derive(Debug, Default)]
pub(crate) struct Bindings {
    pub(crate) route: RefCell<Snapshot>,
    pub(crate) state: RefCell<Snapshot>,
    pub(crate) store: RefCell<Snapshot>,
}

pub struct App {
    config: Config,
    history: Box<dyn History>,
    storage: Box<dyn Storage>,
    clock: Box<dyn Clock>,
    debounce: HistoryDebounce,
    state_slot: RefCell<Value>,
    bindings: Bindings,
    listeners: Broadcaster,
}

impl App {
    pub fn builder() -> AppBuilder {
        AppBuilder::default()
    }

    /// An app with the default config, an in-memory history at the
    /// configured initial URL, and in-memory storage.
    pub fn in_memory() -> Result<Self> {
        Self::builder().build()
    }

    /// An app persisting its store under the configured storage directory.
    pub fn with_file_storage(config: Config) -> Result<Self> {
        let storage = FileStorage::new(config.storage_dir())?;
        Self::builder().config(config).storage(storage).build()
    }

    pub fn route(&self) -> Route<'_> {
        Container::new(self)
    }

    pub fn state(&self) -> State<'_> {
        Container::new(self)
    }

    pub fn store(&self) -> Store<'_> {
        Container::new(self)
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Storage key of the store.
    pub fn context(&self) -> &str {
        self.config.context()
    }

    /// Absolute URL of the current history entry.
    pub fn location(&self) -> Url {
        self.history.location()
    }

    /// Re-derive every container from its source and notify listeners once.
    pub fn update(&self) {
        self.refresh::<RouteHook>();
        self.refresh::<StateHook>();
        self.refresh::<StoreHook>();
        self.listeners.fire(self);
    }

    fn refresh<H: PersistHook>(&self) {
        let next = Snapshot::new(H::derive(self));
        *H::binding(self).borrow_mut() = next;
    }

    /// Register a listener called after every update.
    pub fn on_update<F>(&self, listener: F) -> ListenerId
    where
        F: Fn(&App) -> ListenerResult + 'static,
    {
        self.listeners.add(listener)
    }

    /// Returns false if `id` was not registered.
    pub fn remove_update_listener(&self, id: ListenerId) -> bool {
        self.listeners.remove(id)
    }

    /// Like [`on_update`](Self::on_update), removed when the returned
    /// guard is dropped.
    pub fn subscribe<F>(&self, listener: F) -> Subscription<'_>
    where
        F: Fn(&App) -> ListenerResult + 'static,
    {
        Subscription::new(self, self.listeners.add(listener))
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    /// The history entry changed underneath us (back/forward).
    pub fn handle_popstate(&self) {
        log::debug!(target: "sr1::route", "popstate {}", self.history.location());
        self.update();
    }

    /// Another writer changed `key` in storage. Updates if it is ours.
    pub fn handle_storage_event(&self, key: &str) -> bool {
        if key != self.context() {
            return false;
        }
        log::debug!(target: "sr1::store", "'{}' changed externally", key);
        self.update();
        true
    }

    /// Ask the storage which keys changed outside this app and update if
    /// ours is among them.
    pub fn poll_storage(&self) -> bool {
        let changed = self.storage.changed_keys();
        changed.iter().any(|key| key == self.context()) && self.handle_storage_event(self.context())
    }

    pub(crate) fn bindings(&self) -> &Bindings {
        &self.bindings
    }

    pub(crate) fn state_slot(&self) -> &RefCell<Value> {
        &self.state_slot
    }

    pub(crate) fn history(&self) -> &dyn History {
        self.history.as_ref()
    }

    pub(crate) fn storage(&self) -> &dyn Storage {
        self.storage.as_ref()
    }

    pub(crate) fn clock(&self) -> &dyn Clock {
        self.clock.as_ref()
    }

    pub(crate) fn debounce(&self) -> &HistoryDebounce {
        &self.debounce
    }
}

impl fmt::Debug for App {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("App")
            .field("context", &self.context())
            .field("location", &self.location().as_str())
            .field("route", &*self.bindings.route.borrow())
            .field("state", &*self.bindings.state.borrow())
            .field("store", &*self.bindings.store.borrow())
            .field("listeners", &self.listeners)
            .finish()
    }
}

/// Assembles an [`App`]. Anything left unset comes from the config.
#[derive(Default)]
pub struct AppBuilder {
    config: Option<Config>,
    history: Option<Box<dyn History>>,
    storage: Option<Box<dyn Storage>>,
    clock: Option<Box<dyn Clock>>,
}

impl AppBuilder {
    pub fn config(mut self, config: Config) -> Self {
        self.config = Some(config);
        self
    }

    pub fn history(mut self, history: impl History + 'static) -> Self {
        self.history = Some(Box::new(history));
        self
    }

    pub fn storage(mut self, storage: impl Storage + 'static) -> Self {
        self.storage = Some(Box::new(storage));
        self
    }

    pub fn clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Some(Box::new(clock));
        self
    }

    /// Build the app and derive every container once. No listener can
    /// exist yet, so nothing is broadcast.
    pub fn build(self) -> Result<App> {
        let config = self.config.unwrap_or_default();
        let history = match self.history {
            Some(history) => history,
            None => Box::new(MemoryHistory::new(config.initial_url())?),
        };
        let app = App {
            debounce: HistoryDebounce::new(config.history_debounce()),
            history,
            storage: self.storage.unwrap_or_else(|| Box::new(MemoryStorage::new())),
            clock: self.clock.unwrap_or_else(|| Box::new(SystemClock::new())),
            state_slot: RefCell::new(Value::Object(Map::new())),
            bindings: Bindings::default(),
            listeners: Broadcaster::new(),
            config,
        };
        app.refresh::<RouteHook>();
        app.refresh::<StateHook>();
        app.refresh::<StoreHook>();
        Ok(app)
    }
}
