//! Navigational anchors.
//!
//! A [`Link`] describes where an anchor leads relative to the current route
//! and what a click on it should do. Rendering is up to the host: it asks
//! for [`Link::url`] and [`Link::class`], and forwards clicks to
//! [`Link::click`].

use std::fmt;

use serde_json::{Map, Value};

use crate::app::App;
use crate::codec;
use crate::error::Result;
use crate::View;

/// The parts of a pointer event a link cares about.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ClickEvent {
    pub button: u16,
    pub meta_key: bool,
    pub shift_key: bool,
    pub ctrl_key: bool,
    pub default_prevented: bool,
}

impl ClickEvent {
    /// A plain left click.
    pub fn primary() -> Self {
        Self::default()
    }

    pub fn prevent_default(&mut self) {
        self.default_prevented = true;
    }

    fn is_plain(&self) -> bool {
        self.button == 0
            && !self.meta_key
            && !self.shift_key
            && !self.ctrl_key
            && !self.default_prevented
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClickOutcome {
    /// The link navigated and prevented the default action.
    Navigated,
    /// The host should let the event through.
    PassThrough,
}

type ClickCallback = Box<dyn Fn(&mut ClickEvent)>;

#[derive(Default)]
pub struct Link {
    href: Option<String>,
    view: Map<String, Value>,
    query: Map<String, Value>,
    config: Map<String, Value>,
    class_name: String,
    on_click: Option<ClickCallback>,
}

impl Link {
    /// A link to `href`, resolved against the current location.
    pub fn to(href: impl Into<String>) -> Self {
        Self {
            href: Some(href.into()),
            ..Self::default()
        }
    }

    /// A link that only patches the current route.
    pub fn here() -> Self {
        Self::default()
    }

    /// Route fields laid over the decoded href, and passed to
    /// [`Route::go`](crate::Route::go) on click.
    pub fn view(mut self, view: Map<String, Value>) -> Self {
        self.view = view;
        self
    }

    pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.insert(key.into(), Value::String(value.into()));
        self
    }

    pub fn config(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.config.insert(key.into(), Value::String(value.into()));
        self
    }

    pub fn class_name(mut self, class_name: impl Into<String>) -> Self {
        self.class_name = class_name.into();
        self
    }

    /// Called with every click before the link decides to navigate.
    pub fn on_click<F>(mut self, callback: F) -> Self
    where
        F: Fn(&mut ClickEvent) + 'static,
    {
        self.on_click = Some(Box::new(callback));
        self
    }

    /// The route this link leads to.
    pub fn target(&self, app: &App) -> Result<Map<String, Value>> {
        let mut patch = Map::new();
        patch.insert("query".into(), Value::Object(Map::new()));
        patch.insert("config".into(), Value::Object(Map::new()));
        if let Some(href) = &self.href {
            patch.extend(codec::decode(&app.location(), Some(href))?.to_map());
        }
        patch.extend(self.view.clone());
        merge_into(&mut patch, "query", &self.query);
        merge_into(&mut patch, "config", &self.config);

        let route = app.route().snapshot().to_value();
        let mut next = route.as_object().cloned().unwrap_or_default();
        let same_path = patch.get("path").is_some() && patch.get("path") == route.get("path");
        next.extend(patch.clone());
        if same_path {
            for key in ["query", "config"] {
                let mut merged = route
                    .get(key)
                    .and_then(Value::as_object)
                    .cloned()
                    .unwrap_or_default();
                if let Some(Value::Object(extra)) = patch.get(key) {
                    merged.extend(extra.clone());
                }
                next.insert(key.into(), Value::Object(merged));
            }
        }
        Ok(next)
    }

    /// URL of [`target`](Self::target), relative to the origin.
    pub fn url(&self, app: &App) -> Result<String> {
        let target = self.target(app)?;
        Ok(codec::encode(&View::from_value(&Value::Object(target))))
    }

    /// The class name, plus ` active` when the link points at the current
    /// path.
    pub fn class(&self, app: &App) -> Result<String> {
        let target = View::from_value(&Value::Object(self.target(app)?));
        let mut class = self.class_name.clone();
        if target.path == app.route().path() {
            class.push_str(" active");
        }
        Ok(class)
    }

    pub fn click(&self, app: &App, event: &mut ClickEvent) -> Result<ClickOutcome> {
        if let Some(callback) = &self.on_click {
            callback(event);
        }
        if !event.is_plain() {
            return Ok(ClickOutcome::PassThrough);
        }
        event.prevent_default();
        let url = self.url(app)?;
        app.route().go(&url, &self.view)?;
        Ok(ClickOutcome::Navigated)
    }
}

fn merge_into(target: &mut Map<String, Value>, key: &str, extra: &Map<String, Value>) {
    if extra.is_empty() {
        return;
    }
    let slot = target
        .entry(key)
        .or_insert_with(|| Value::Object(Map::new()));
    if !slot.is_object() {
        *slot = Value::Object(Map::new());
    }
    if let Value::Object(map) = slot {
        map.extend(extra.clone());
    }
}

impl fmt::Debug for Link {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Link")
            .field("href", &self.href)
            .field("view", &self.view)
            .field("query", &self.query)
            .field("config", &self.config)
            .field("class_name", &self.class_name)
            .field("on_click", &self.on_click.is_some())
            .finish()
    }
}
