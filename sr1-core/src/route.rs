//! The route: current location as a container.
//!
//! Writing the route writes the address bar. Writes that come in quick
//! succession (a filter typed into a search box, say) collapse into one
//! history entry: a new entry is pushed only when the URL changed AND the
//! previous write is older than the debounce window. [`Route::go`] always
//! pushes.

use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::time::Duration;

use serde_json::{Map, Value};
use sr1_types::{Snapshot, View};

use crate::app::App;
use crate::codec;
use crate::container::{Container, PersistHook};
use crate::error::{Error, Result};
use crate::pattern::{MatchOptions, RoutePattern};

pub struct RouteHook;

pub type Route<'a> = Container<'a, RouteHook>;

/// Time of the last history write, compared against a window.
#[derive(Debug)]
pub struct HistoryDebounce {
    window: Duration,
    last_write: Cell<Option<Duration>>,
}

impl HistoryDebounce {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            last_write: Cell::new(None),
        }
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Forget the last write so the next one may push.
    pub fn reset(&self) {
        self.last_write.set(None);
    }

    /// Whether a write at `now` may push a new entry.
    pub fn allows_push(&self, now: Duration) -> bool {
        match self.last_write.get() {
            None => true,
            Some(at) => now.saturating_sub(at) > self.window,
        }
    }

    pub fn record(&self, now: Duration) {
        self.last_write.set(Some(now));
    }
}

impl PersistHook for RouteHook {
    const NAME: &'static str = "Route";

    fn binding(app: &App) -> &RefCell<Snapshot> {
        &app.bindings().route
    }

    /// The current entry's state object overlaid with the view of the
    /// current location.
    fn derive(app: &App) -> Value {
        let history = app.history();
        let mut route = match history.state() {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        route.extend(codec::view_of(&history.location()).to_map());
        Value::Object(route)
    }

    fn persist(app: &App, next: Value) -> Result<()> {
        let view = View::from_value(&next);
        let url = codec::encode(&view);
        let title = view.desc.unwrap_or_default();
        let now = app.clock().now();
        let history = app.history();
        let current = codec::relative_href(&history.location());

        if app.debounce().allows_push(now) && url != current {
            log::debug!(target: "sr1::route", "push {}", url);
            history.push_state(next, &title, &url)?;
        } else {
            log::debug!(target: "sr1::route", "replace {}", url);
            history.replace_state(next, &title, &url)?;
        }
        app.debounce().record(now);
        Ok(())
    }
}

impl Container<'_, RouteHook> {
    /// Navigate to `href` (resolved against the current location; empty
    /// means the current location) with `patch` laid over the decoded view.
    ///
    /// Staying on the same path merges into the route, keeping keys such
    /// as `desc`; moving to another path replaces it.
    pub fn go(&self, href: &str, patch: &Map<String, Value>) -> Result<()> {
        let app = self.app();
        let location = app.location();
        let view = codec::decode(&location, Some(href).filter(|h| !h.is_empty()))?;
        app.debounce().reset();

        let mut next = view.to_map();
        next.extend(patch.iter().map(|(k, v)| (k.clone(), v.clone())));
        if view.path == location.path() {
            self.update(&[], Value::Object(next))
        } else {
            self.set(&[], Value::Object(next))
        }
    }

    /// [`go`](Self::go) without a patch.
    pub fn go_to(&self, href: &str) -> Result<()> {
        self.go(href, &Map::new())
    }

    /// The route as a typed view.
    pub fn view(&self) -> View {
        View::from_value(&self.snapshot())
    }

    /// Current path.
    pub fn path(&self) -> String {
        self.view().path
    }

    /// Match `pattern` against the current path with default options
    /// (exact, non-strict, case-insensitive).
    pub fn match_path(&self, pattern: &str) -> Result<Option<BTreeMap<String, String>>> {
        self.match_with(pattern, MatchOptions::default())
    }

    pub fn match_with(
        &self,
        pattern: &str,
        options: MatchOptions,
    ) -> Result<Option<BTreeMap<String, String>>> {
        let compiled = RoutePattern::compile(pattern, options)?;
        let path = self.path();
        let params = compiled.matches(&path);
        log::trace!(
            target: "sr1::route",
            "{} against {}: {}",
            compiled.source(),
            path,
            if params.is_some() { "match" } else { "no match" }
        );
        Ok(params)
    }

    /// Route history is not available.
    pub fn history(&self) -> Result<Vec<View>> {
        Err(Error::Unimplemented("history"))
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use sr1_types::path;

    use super::*;
    use crate::clock::ManualClock;
    use crate::history::{History, MemoryHistory};

    struct Fixture {
        app: App,
        history: MemoryHistory,
        clock: ManualClock,
    }

    fn fixture() -> Fixture {
        let history = MemoryHistory::new("http://localhost:1948/").unwrap();
        let clock = ManualClock::new();
        clock.set(Duration::from_secs(100));
        let app = App::builder()
            .history(history.clone())
            .clock(clock.clone())
            .build()
            .unwrap();
        Fixture {
            app,
            history,
            clock,
        }
    }

    #[test]
    fn debounce_window_logic() {
        let d = HistoryDebounce::new(Duration::from_millis(2000));
        assert!(d.allows_push(Duration::ZERO));
        d.record(Duration::from_millis(1000));
        assert!(!d.allows_push(Duration::from_millis(3000)));
        assert!(d.allows_push(Duration::from_millis(3001)));
        d.reset();
        assert!(d.allows_push(Duration::from_millis(1000)));
    }

    #[test]
    fn cold_start_reflects_location() {
        let f = fixture();
        assert_eq!(
            f.app.route().snapshot(),
            json!({ "path": "/", "query": {}, "config": {} })
        );
    }

    #[test]
    fn go_pushes_and_matches() {
        let f = fixture();
        f.app.route().go_to("/yolo/420").unwrap();
        assert_eq!(f.history.location().path(), "/yolo/420");
        assert_eq!(f.history.len(), 2);

        let route = f.app.route();
        let params = route.match_path("/yolo/:page").unwrap().unwrap();
        assert_eq!(params.get("page").map(String::as_str), Some("420"));
        assert_eq!(route.match_path("/pollo/:page").unwrap(), None);
        assert_eq!(route.match_path("/yolo").unwrap(), None);
        let loose = MatchOptions {
            exact: false,
            ..MatchOptions::default()
        };
        assert!(route.match_with("/yolo", loose).unwrap().is_some());
    }

    #[test]
    fn rapid_sets_replace() {
        let f = fixture();
        f.app.route().go_to("/search").unwrap();
        assert_eq!(f.history.len(), 2);

        for q in ["c", "ca", "cat"] {
            f.clock.advance(Duration::from_millis(300));
            f.app.route().set(&path!["query", "q"], q).unwrap();
        }
        assert_eq!(f.history.len(), 2);
        assert_eq!(f.history.location().query(), Some("q=cat"));
    }

    #[test]
    fn set_after_window_pushes() {
        let f = fixture();
        f.app.route().go_to("/search").unwrap();
        f.clock.advance(Duration::from_millis(2001));
        f.app.route().set(&path!["query", "q"], "dog").unwrap();
        assert_eq!(f.history.len(), 3);
    }

    #[test]
    fn unchanged_url_never_pushes() {
        let f = fixture();
        f.clock.advance(Duration::from_secs(10));
        f.app.route().set(&path!["desc"], "Home").unwrap();
        assert_eq!(f.history.len(), 1);
        assert_eq!(f.history.title(), "Home");
        assert_eq!(f.app.route().get(&path!["desc"]), Some(json!("Home")));
    }

    #[test]
    fn go_always_pushes_even_inside_window() {
        let f = fixture();
        f.app.route().go_to("/a").unwrap();
        f.app.route().go_to("/b").unwrap();
        assert_eq!(f.history.len(), 3);
    }

    #[test]
    fn go_same_path_merges() {
        let f = fixture();
        f.app.route().go_to("/list?page=1").unwrap();
        f.app.route().set(&path!["desc"], "List").unwrap();
        f.app.route().go_to("/list?page=2").unwrap();
        let route = f.app.route();
        assert_eq!(route.get(&path!["desc"]), Some(json!("List")));
        assert_eq!(route.get(&path!["query"]), Some(json!({ "page": "2" })));
    }

    #[test]
    fn go_other_path_replaces() {
        let f = fixture();
        f.app.route().go_to("/list").unwrap();
        f.app.route().set(&path!["desc"], "List").unwrap();
        f.app.route().go_to("/detail").unwrap();
        assert_eq!(f.app.route().get(&path!["desc"]), None);
    }

    #[test]
    fn go_with_patch_overlays_view() {
        let f = fixture();
        let patch = json!({ "desc": "Dogs", "config": { "tab": "info" } });
        f.app
            .route()
            .go("/dog?breed=doge", patch.as_object().unwrap())
            .unwrap();
        assert_eq!(
            f.history.location().as_str(),
            "http://localhost:1948/dog?breed=doge#tab=info"
        );
        assert_eq!(f.history.title(), "Dogs");
    }

    #[test]
    fn go_resolves_relative_href() {
        let f = fixture();
        f.app.route().go_to("/yolo/420").unwrap();
        f.app.route().go_to("421").unwrap();
        assert_eq!(f.app.route().path(), "/yolo/421");
    }

    #[test]
    fn route_extra_keys_live_in_history_state() {
        let f = fixture();
        f.app.route().set(&path!["scroll"], 120).unwrap();
        assert_eq!(f.history.state()["scroll"], json!(120));
        f.app.update();
        assert_eq!(f.app.route().get(&path!["scroll"]), Some(json!(120)));
    }

    #[test]
    fn history_is_unimplemented() {
        let f = fixture();
        assert!(matches!(
            f.app.route().history(),
            Err(Error::Unimplemented("history"))
        ));
    }
}
