//! The address-bar collaborator.
//!
//! [`History`] is the slice of a browser history API the route needs: the
//! current location, the state object of the current entry, and
//! push/replace. [`MemoryHistory`] keeps the entry stack in memory and adds
//! `back`/`forward` so hosts and tests can simulate navigation; after moving,
//! call [`App::handle_popstate`](crate::App::handle_popstate).

use std::cell::RefCell;
use std::rc::Rc;

use serde_json::Value;
use url::Url;

use crate::error::{Error, Result};

pub trait History {
    /// Absolute URL of the current entry.
    fn location(&self) -> Url;

    /// State object of the current entry (`Value::Null` if none).
    fn state(&self) -> Value;

    /// Add an entry after the current one, dropping any forward entries.
    /// `url` may be relative to the current location.
    fn push_state(&self, state: Value, title: &str, url: &str) -> Result<()>;

    /// Overwrite the current entry.
    fn replace_state(&self, state: Value, title: &str, url: &str) -> Result<()>;
}

#[derive(Debug, Clone)]
struct Entry {
    url: Url,
    state: Value,
    title: String,
}

#[derive(Debug)]
struct Stack {
    entries: Vec<Entry>,
    index: usize,
}

impl Stack {
    fn current(&self) -> &Entry {
        &self.entries[self.index]
    }
}

/// In-memory history. Clones share the same entry stack.
#[derive(Debug, Clone)]
pub struct MemoryHistory {
    stack: Rc<RefCell<Stack>>,
}

impl MemoryHistory {
    /// Start with a single entry at `initial`, which must be absolute.
    pub fn new(initial: &str) -> Result<Self> {
        let url = Url::parse(initial).map_err(|source| Error::InvalidUrl {
            href: initial.to_string(),
            source,
        })?;
        let entry = Entry {
            url,
            state: Value::Null,
            title: String::new(),
        };
        Ok(Self {
            stack: Rc::new(RefCell::new(Stack {
                entries: vec![entry],
                index: 0,
            })),
        })
    }

    /// Step back one entry. Returns false at the start of the stack.
    pub fn back(&self) -> bool {
        let mut stack = self.stack.borrow_mut();
        if stack.index == 0 {
            return false;
        }
        stack.index -= 1;
        true
    }

    /// Step forward one entry. Returns false at the end of the stack.
    pub fn forward(&self) -> bool {
        let mut stack = self.stack.borrow_mut();
        if stack.index + 1 >= stack.entries.len() {
            return false;
        }
        stack.index += 1;
        true
    }

    /// Number of entries in the stack.
    pub fn len(&self) -> usize {
        self.stack.borrow().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Position of the current entry.
    pub fn index(&self) -> usize {
        self.stack.borrow().index
    }

    /// Title of the current entry.
    pub fn title(&self) -> String {
        self.stack.borrow().current().title.clone()
    }

    /// Absolute URLs of every entry, oldest first.
    pub fn hrefs(&self) -> Vec<String> {
        self.stack
            .borrow()
            .entries
            .iter()
            .map(|e| e.url.to_string())
            .collect()
    }

    fn resolve(&self, href: &str) -> Result<Url> {
        self.location().join(href).map_err(|source| Error::InvalidUrl {
            href: href.to_string(),
            source,
        })
    }
}

impl History for MemoryHistory {
    fn location(&self) -> Url {
        self.stack.borrow().current().url.clone()
    }

    fn state(&self) -> Value {
        self.stack.borrow().current().state.clone()
    }

    fn push_state(&self, state: Value, title: &str, url: &str) -> Result<()> {
        let url = self.resolve(url)?;
        let mut stack = self.stack.borrow_mut();
        let keep = stack.index + 1;
        stack.entries.truncate(keep);
        stack.entries.push(Entry {
            url,
            state,
            title: title.to_string(),
        });
        stack.index = keep;
        Ok(())
    }

    fn replace_state(&self, state: Value, title: &str, url: &str) -> Result<()> {
        let url = self.resolve(url)?;
        let mut stack = self.stack.borrow_mut();
        let index = stack.index;
        stack.entries[index] = Entry {
            url,
            state,
            title: title.to_string(),
        };
        Ok(())
    }
}
