//! # sr1-core
//!
//! Application state for single-page apps, held in three containers that
//! share one mutation protocol:
//!
//! * [`Route`] mirrors the address bar: path, query string, fragment
//!   settings, plus any extra keys kept in the history entry.
//! * [`State`] lives in memory for as long as the [`App`].
//! * [`Store`] is persisted as JSON in a [`Storage`](storage::Storage) area
//!   and survives restarts.
//!
//! Every change, through any container, re-derives all three and then
//! notifies update listeners exactly once.
//!
//! ```
//! use serde_json::json;
//! use sr1_core::{path, App};
//!
//! let app = App::in_memory()?;
//! app.on_update(|app| {
//!     let _ = app.state().get(&path!["todos"]);
//!     Ok(())
//! });
//!
//! app.state().set(&path!["todos", 0], json!({ "text": "milk", "done": false }))?;
//! app.route().go_to("/todos?filter=open")?;
//!
//! assert_eq!(app.route().get(&path!["query", "filter"]), Some(json!("open")));
//! assert!(app.route().match_path("/todos")?.is_some());
//! # Ok::<(), sr1_core::Error>(())
//! ```

pub mod app;
pub mod broadcast;
pub mod clock;
pub mod codec;
pub mod config;
pub mod container;
pub mod error;
pub mod history;
pub mod link;
pub mod pattern;
pub mod route;
pub mod state;
pub mod storage;
pub mod store;

pub use app::{App, AppBuilder};
pub use broadcast::{ListenerId, ListenerResult, Subscription};
pub use config::Config;
pub use container::{Container, PersistHook};
pub use error::{Error, Result};
pub use link::{ClickEvent, ClickOutcome, Link};
pub use pattern::{MatchOptions, RoutePattern};
pub use route::Route;
pub use state::State;
pub use store::Store;

pub use sr1_types::{mutate, path, KeyPath, PathSegment, Snapshot, View};
