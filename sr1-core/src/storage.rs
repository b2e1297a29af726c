//! Persistent key-value storage for the Store.
//!
//! [`Storage`] stores opaque strings under string keys. [`MemoryStorage`]
//! shares one map between clones, so two contexts built on clones behave
//! like two tabs of one origin. [`FileStorage`] keeps one JSON file per key
//! and reports keys that another writer changed since we last touched them.

use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::time::SystemTime;

use crate::error::Result;

pub trait Storage {
    fn get_item(&self, key: &str) -> Result<Option<String>>;

    fn set_item(&self, key: &str, value: &str) -> Result<()>;

    fn remove_item(&self, key: &str) -> Result<()>;

    /// Keys modified by someone else since this handle last read or wrote
    /// them. Backends without change detection report nothing.
    fn changed_keys(&self) -> Vec<String> {
        Vec::new()
    }
}

/// In-memory storage. Clones share the same map.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    items: Rc<RefCell<BTreeMap<String, String>>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Raw contents under `key`, bypassing the trait.
    pub fn raw(&self, key: &str) -> Option<String> {
        self.items.borrow().get(key).cloned()
    }

    pub fn len(&self) -> usize {
        self.items.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.borrow().is_empty()
    }
}

impl Storage for MemoryStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>> {
        Ok(self.raw(key))
    }

    fn set_item(&self, key: &str, value: &str) -> Result<()> {
        self.items
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<()> {
        self.items.borrow_mut().remove(key);
        Ok(())
    }
}

/// Directory-backed storage: `<dir>/<key>.json`.
///
/// Writes go to a temporary file in the same directory and are renamed into
/// place. The mtime seen at our last read or write is remembered per key;
/// a newer mtime on disk means another writer touched the key.
#[derive(Debug)]
pub struct FileStorage {
    dir: PathBuf,
    mtimes: RefCell<HashMap<String, Option<SystemTime>>>,
}

impl FileStorage {
    /// Open (and create if needed) a storage directory.
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self {
            dir,
            mtimes: RefCell::new(HashMap::new()),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File backing `key`. Characters outside `[A-Za-z0-9_-]` are
    /// percent-escaped so every key maps to a distinct, safe file name.
    pub fn file_for(&self, key: &str) -> PathBuf {
        let mut name = String::with_capacity(key.len() + 5);
        for b in key.bytes() {
            if b.is_ascii_alphanumeric() || b == b'_' || b == b'-' {
                name.push(b as char);
            } else {
                name.push_str(&format!("%{:02X}", b));
            }
        }
        name.push_str(".json");
        self.dir.join(name)
    }

    fn remember(&self, key: &str, path: &Path) {
        self.mtimes
            .borrow_mut()
            .insert(key.to_string(), mtime_of(path));
    }
}

fn mtime_of(path: &Path) -> Option<SystemTime> {
    fs::metadata(path).and_then(|m| m.modified()).ok()
}

impl Storage for FileStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>> {
        let path = self.file_for(key);
        let contents = match fs::read_to_string(&path) {
            Ok(contents) => Some(contents),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
            Err(e) => return Err(e.into()),
        };
        self.remember(key, &path);
        Ok(contents)
    }

    fn set_item(&self, key: &str, value: &str) -> Result<()> {
        let path = self.file_for(key);
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, value)?;
        if let Err(e) = fs::rename(&tmp, &path) {
            let _ = fs::remove_file(&tmp);
            return Err(e.into());
        }
        self.remember(key, &path);
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<()> {
        let path = self.file_for(key);
        match fs::remove_file(&path) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }
        self.remember(key, &path);
        Ok(())
    }

    fn changed_keys(&self) -> Vec<String> {
        let mut mtimes = self.mtimes.borrow_mut();
        let mut changed = Vec::new();
        for (key, recorded) in mtimes.iter_mut() {
            let current = mtime_of(&self.file_for(key));
            let modified = match (*recorded, current) {
                (Some(seen), Some(now)) => now > seen,
                (None, None) => false,
                _ => true,
            };
            if modified {
                *recorded = current;
                changed.push(key.clone());
            }
        }
        changed.sort();
        changed
    }
}
