#![allow(dead_code)]
//! Test harness utilities for sr1-core integration tests.

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use sr1_core::clock::ManualClock;
use sr1_core::history::MemoryHistory;
use sr1_core::storage::MemoryStorage;
use sr1_core::{App, Config};

/// An app plus handles onto its collaborators, so tests can drive the
/// address bar, the storage area and time from outside.
pub struct Harness {
    pub app: App,
    pub history: MemoryHistory,
    pub storage: MemoryStorage,
    pub clock: ManualClock,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_storage(MemoryStorage::new())
    }

    /// A second tab sharing `storage` with another harness.
    pub fn with_storage(storage: MemoryStorage) -> Self {
        Self::build(Config::default(), storage)
    }

    pub fn with_config(config: Config) -> Self {
        Self::build(config, MemoryStorage::new())
    }

    pub fn build(config: Config, storage: MemoryStorage) -> Self {
        let history = MemoryHistory::new(config.initial_url()).unwrap();
        let clock = ManualClock::new();
        clock.set(Duration::from_secs(1_000));
        let app = App::builder()
            .config(config)
            .history(history.clone())
            .storage(storage.clone())
            .clock(clock.clone())
            .build()
            .unwrap();
        Self {
            app,
            history,
            storage,
            clock,
        }
    }

    /// Move time forward past the history debounce window.
    pub fn wait_out_debounce(&self) {
        let window = self.app.config().history_debounce();
        self.clock.advance(window + Duration::from_millis(1));
    }
}

/// Counts broadcasts. Install with [`count_updates`].
#[derive(Clone, Default)]
pub struct UpdateLog {
    calls: Rc<RefCell<Vec<String>>>,
}

impl UpdateLog {
    pub fn count(&self) -> usize {
        self.calls.borrow().len()
    }

    /// Route path observed at each broadcast.
    pub fn paths(&self) -> Vec<String> {
        self.calls.borrow().clone()
    }
}

pub fn count_updates(app: &App) -> UpdateLog {
    let log = UpdateLog::default();
    let seen = log.clone();
    app.on_update(move |app| {
        seen.calls.borrow_mut().push(app.route().path());
        Ok(())
    });
    log
}
