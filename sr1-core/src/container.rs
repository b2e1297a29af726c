//! The path-mutation protocol shared by Route, State and Store.
//!
//! A [`Container`] is a short-lived handle borrowed from the [`App`]. Every
//! mutation computes the next tree with [`mutate`], hands it to the kind's
//! [`PersistHook`], then asks the app to re-derive all containers and
//! broadcast. Reads always see the binding current at call time.

use std::cell::RefCell;
use std::fmt;
use std::marker::PhantomData;

use serde_json::{Map, Value};
use sr1_types::{mutate, PathSegment, Snapshot};

use crate::app::App;
use crate::error::{Error, Result};

/// What differs between container kinds: where the value lives and how a
/// new value is written there.
pub trait PersistHook {
    /// Name used in logs and error messages.
    const NAME: &'static str;

    /// The app's binding for this container.
    fn binding(app: &App) -> &RefCell<Snapshot>;

    /// Read the current value from its source of truth.
    fn derive(app: &App) -> Value;

    /// Write a new value to the source of truth. Called with an object.
    fn persist(app: &App, next: Value) -> Result<()>;
}

/// A handle onto one container of an [`App`].
pub struct Container<'a, H> {
    app: &'a App,
    hook: PhantomData<H>,
}

impl<'a, H: PersistHook> Container<'a, H> {
    pub(crate) fn new(app: &'a App) -> Self {
        Self {
            app,
            hook: PhantomData,
        }
    }

    pub fn app(&self) -> &'a App {
        self.app
    }

    /// The current frozen value.
    pub fn snapshot(&self) -> Snapshot {
        H::binding(self.app).borrow().clone()
    }

    /// Copy of the value at `path`; the empty path is the whole container.
    pub fn get(&self, path: &[PathSegment]) -> Option<Value> {
        self.snapshot().get(path).cloned()
    }

    /// Write `value` at `path`. The empty path replaces the whole container,
    /// which must then be an object (or `null`, meaning empty).
    pub fn set(&self, path: &[PathSegment], value: impl Into<Value>) -> Result<()> {
        let current = self.snapshot();
        self.commit(mutate::replace(&current, path, value.into())?)
    }

    /// Read-modify-write: `f` receives the value at `path`.
    pub fn set_with<F>(&self, path: &[PathSegment], f: F) -> Result<()>
    where
        F: FnOnce(Option<&Value>) -> Value,
    {
        let current = self.snapshot();
        let value = f(current.get(path));
        self.commit(mutate::replace(&current, path, value)?)
    }

    /// Reset the container to an empty object.
    pub fn reset(&self) -> Result<()> {
        self.commit(Value::Object(Map::new()))
    }

    /// Shallow-merge an object into the value at `path`.
    pub fn update(&self, path: &[PathSegment], value: Value) -> Result<()> {
        let Value::Object(patch) = value else {
            return Err(Error::InvalidArgument(
                "update must not be called with a non-object; use set instead".to_string(),
            ));
        };
        let current = self.snapshot();
        self.commit(mutate::merge(&current, path, &patch)?)
    }

    /// Remove the value at `path`, at any depth.
    pub fn unset(&self, path: &[PathSegment]) -> Result<()> {
        let current = self.snapshot();
        self.commit(mutate::remove(&current, path))
    }

    fn commit(&self, next: Value) -> Result<()> {
        let next = match next {
            Value::Object(_) => next,
            Value::Null => Value::Object(Map::new()),
            other => {
                return Err(Error::InvalidArgument(format!(
                    "{} must be an object, got {}",
                    H::NAME,
                    kind_of(&other)
                )))
            }
        };
        H::persist(self.app, next)?;
        self.app.update();
        Ok(())
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

impl<H: PersistHook> fmt::Debug for Container<'_, H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple(H::NAME).field(&self.snapshot()).finish()
    }
}
