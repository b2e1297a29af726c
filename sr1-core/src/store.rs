//! Persisted application state.
//!
//! The Store is a JSON document in [`Storage`](crate::storage::Storage)
//! under the app's context key. Storage is the source of truth: after every
//! write the in-memory value is read back from it.

use std::cell::RefCell;

use serde_json::{Map, Value};
use sr1_types::Snapshot;

use crate::app::App;
use crate::container::{Container, PersistHook};
use crate::error::Result;

pub struct StoreHook;

pub type Store<'a> = Container<'a, StoreHook>;

impl PersistHook for StoreHook {
    const NAME: &'static str = "Store";

    fn binding(app: &App) -> &RefCell<Snapshot> {
        &app.bindings().store
    }

    fn derive(app: &App) -> Value {
        let context = app.context();
        let text = match app.storage().get_item(context) {
            Ok(Some(text)) => text,
            Ok(None) => return Value::Object(Map::new()),
            Err(e) => {
                log::warn!(target: "sr1::store", "could not read '{}': {}", context, e);
                return Value::Object(Map::new());
            }
        };
        match serde_json::from_str::<Value>(&text) {
            Ok(value @ Value::Object(_)) => value,
            Ok(Value::Null) => Value::Object(Map::new()),
            Ok(_) => {
                log::warn!(target: "sr1::store", "ignoring non-object store under '{}'", context);
                Value::Object(Map::new())
            }
            Err(e) => {
                log::warn!(
                    target: "sr1::store",
                    "ignoring malformed store under '{}': {}",
                    context,
                    e
                );
                Value::Object(Map::new())
            }
        }
    }

    fn persist(app: &App, next: Value) -> Result<()> {
        let text = serde_json::to_string(&next)?;
        if let Err(e) = app.storage().set_item(app.context(), &text) {
            log::error!(target: "sr1::store", "failed to write '{}': {}", app.context(), e);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use sr1_types::path;

    use crate::error::{Error, Result};
    use crate::storage::{MemoryStorage, Storage};
    use crate::{App, Config};

    fn app_on(storage: &MemoryStorage) -> App {
        App::builder().storage(storage.clone()).build().unwrap()
    }

    #[test]
    fn set_writes_json_under_context() {
        let storage = MemoryStorage::new();
        let app = app_on(&storage);
        app.store().set(&path!["message"], "hello world").unwrap();
        let raw = storage.raw("default").unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(parsed["message"], json!("hello world"));
    }

    #[test]
    fn custom_context_key() {
        let storage = MemoryStorage::new();
        let app = App::builder()
            .config(Config::default().with_context("todo"))
            .storage(storage.clone())
            .build()
            .unwrap();
        app.store().set(&path!["n"], 1).unwrap();
        assert!(storage.raw("default").is_none());
        assert!(storage.raw("todo").is_some());
    }

    #[test]
    fn loads_existing_document() {
        let storage = MemoryStorage::new();
        storage.set_item("default", r#"{"saved":[1,2]}"#).unwrap();
        let app = app_on(&storage);
        assert_eq!(app.store().get(&path!["saved", 1]), Some(json!(2)));
    }

    #[test]
    fn malformed_document_yields_empty_store() {
        let storage = MemoryStorage::new();
        storage.set_item("default", "{not json").unwrap();
        let app = app_on(&storage);
        assert_eq!(app.store().snapshot(), json!({}));
    }

    #[test]
    fn non_object_document_yields_empty_store() {
        let storage = MemoryStorage::new();
        storage.set_item("default", "[1,2,3]").unwrap();
        assert_eq!(app_on(&storage).store().snapshot(), json!({}));
        storage.set_item("default", "null").unwrap();
        assert_eq!(app_on(&storage).store().snapshot(), json!({}));
    }

    #[test]
    fn fresh_app_sees_persisted_store() {
        let storage = MemoryStorage::new();
        let first = app_on(&storage);
        first.store().set(&path!["a"], 1).unwrap();
        first.store().set(&path!["b", "c"], "two").unwrap();
        let second = app_on(&storage);
        assert_eq!(second.store().snapshot(), first.store().snapshot().to_value());
    }

    struct ReadOnly;

    impl Storage for ReadOnly {
        fn get_item(&self, _key: &str) -> Result<Option<String>> {
            Ok(Some(r#"{"kept":true}"#.to_string()))
        }

        fn set_item(&self, _key: &str, _value: &str) -> Result<()> {
            Err(Error::Io(std::io::Error::new(
                std::io::ErrorKind::PermissionDenied,
                "read-only",
            )))
        }

        fn remove_item(&self, _key: &str) -> Result<()> {
            Ok(())
        }
    }

    #[test]
    fn write_failure_is_swallowed_and_store_matches_storage() {
        let app = App::builder().storage(ReadOnly).build().unwrap();
        app.store().set(&path!["lost"], 1).unwrap();
        assert_eq!(app.store().snapshot(), json!({ "kept": true }));
    }
}
