use std::fmt;
use std::ops::Deref;
use std::rc::Rc;

use serde::{Serialize, Serializer};
use serde_json::{Map, Value};

use crate::{mutate, PathSegment};

/// A frozen container value.
///
/// Cloning is cheap (reference count). There is no mutable access: every
/// change produces a new snapshot through [`mutate`], so a snapshot a
/// reader holds never changes under it.
///
/// ```compile_fail
/// use serde_json::json;
/// use sr1_types::Snapshot;
///
/// let snapshot = Snapshot::new(json!({ "wumbo": 1 }));
/// snapshot["wumbo"] = json!(42);
/// ```
#[derive(Clone, PartialEq)]
pub struct Snapshot(Rc<Value>);

impl Snapshot {
    pub fn new(value: Value) -> Self {
        Self(Rc::new(value))
    }

    /// An empty object.
    pub fn empty() -> Self {
        Self::new(Value::Object(Map::new()))
    }

    /// Read the value at `path`; the empty path is the whole snapshot.
    pub fn get(&self, path: &[PathSegment]) -> Option<&Value> {
        mutate::get(&self.0, path)
    }

    /// Copy out the underlying value.
    pub fn to_value(&self) -> Value {
        Value::clone(&self.0)
    }

}

impl Default for Snapshot {
    fn default() -> Self {
        Self::empty()
    }
}

impl Deref for Snapshot {
    type Target = Value;

    fn deref(&self) -> &Value {
        &self.0
    }
}

impl From<Value> for Snapshot {
    fn from(value: Value) -> Self {
        Self::new(value)
    }
}

impl PartialEq<Value> for Snapshot {
    fn eq(&self, other: &Value) -> bool {
        *self.0 == *other
    }
}

impl fmt::Debug for Snapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&*self.0, f)
    }
}

impl fmt::Display for Snapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&*self.0, f)
    }
}

impl Serialize for Snapshot {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.0.serialize(serializer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::path;
    use serde_json::json;

    #[test]
    fn default_is_empty_object() {
        assert_eq!(Snapshot::default(), json!({}));
    }

    #[test]
    fn old_snapshot_survives_replacement() {
        let old = Snapshot::new(json!({ "a": { "b": 1 } }));
        let new = Snapshot::new(mutate::replace(&old, &path!["a", "b"], json!(2)).unwrap());
        assert_eq!(old.get(&path!["a", "b"]), Some(&json!(1)));
        assert_eq!(new.get(&path!["a", "b"]), Some(&json!(2)));
    }

    #[test]
    fn serializes_as_inner_value() {
        let s = Snapshot::new(json!({ "message": "hello world" }));
        assert_eq!(serde_json::to_string(&s).unwrap(), r#"{"message":"hello world"}"#);
        assert_eq!(s.to_string(), r#"{"message":"hello world"}"#);
    }
}
