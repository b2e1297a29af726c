//! In-memory application state. Lives as long as the [`App`].

use std::cell::RefCell;

use serde_json::Value;
use sr1_types::Snapshot;

use crate::app::App;
use crate::container::{Container, PersistHook};
use crate::error::Result;

pub struct StateHook;

pub type State<'a> = Container<'a, StateHook>;

impl PersistHook for StateHook {
    const NAME: &'static str = "State";

    fn binding(app: &App) -> &RefCell<Snapshot> {
        &app.bindings().state
    }

    fn derive(app: &App) -> Value {
        app.state_slot().borrow().clone()
    }

    fn persist(app: &App, next: Value) -> Result<()> {
        *app.state_slot().borrow_mut() = next;
        Ok(())
    }
}
