//! Pure path mutation over `serde_json::Value` trees.
//!
//! These functions are the single source of truth for how a container
//! changes. They take the current tree by reference and return the next
//! tree; the input is never modified, so snapshots that readers still hold
//! stay valid.
//!
//! Missing intermediates are created on write: an array when the next
//! segment is an [`PathSegment::Index`], otherwise an object. Scalars in the
//! way are overwritten.

use std::fmt;

use serde_json::{Map, Value};

use crate::PathSegment;

/// Most `null`s a single write may pad an array with.
pub const MAX_ARRAY_GAP: usize = 1024;

/// An array index too far past the end of the array to pad up to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexOutOfRange {
    pub index: usize,
    pub len: usize,
}

impl fmt::Display for IndexOutOfRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "index {} is more than {} past the end of an array of length {}",
            self.index, MAX_ARRAY_GAP, self.len
        )
    }
}

impl std::error::Error for IndexOutOfRange {}

/// Read the value at `path`. The empty path returns `root`.
///
/// Returns `None` as soon as any segment is missing; never panics.
pub fn get<'a>(root: &'a Value, path: &[PathSegment]) -> Option<&'a Value> {
    path.iter().try_fold(root, |node, seg| child(node, seg))
}

fn child<'a>(node: &'a Value, seg: &PathSegment) -> Option<&'a Value> {
    match node {
        Value::Object(map) => map.get(&*seg.as_key()),
        Value::Array(items) => seg.as_index().and_then(|i| items.get(i)),
        _ => None,
    }
}

fn child_mut<'a>(node: &'a mut Value, seg: &PathSegment) -> Option<&'a mut Value> {
    match node {
        Value::Object(map) => map.get_mut(&*seg.as_key()),
        Value::Array(items) => seg.as_index().and_then(move |i| items.get_mut(i)),
        _ => None,
    }
}

/// Return a copy of `root` with `value` written at `path`.
///
/// The empty path discards `root` and returns `value` as is.
pub fn replace(
    root: &Value,
    path: &[PathSegment],
    value: Value,
) -> Result<Value, IndexOutOfRange> {
    if path.is_empty() {
        return Ok(value);
    }
    let mut next = root.clone();
    assign(&mut next, path, value)?;
    Ok(next)
}

/// Write `value` at `path` inside `node`, creating containers on the way.
///
/// Arrays are padded with `null` up to an index at most
/// [`MAX_ARRAY_GAP`] past their end; a farther index fails, possibly
/// after containers above it were created.
pub fn assign(
    node: &mut Value,
    path: &[PathSegment],
    value: Value,
) -> Result<(), IndexOutOfRange> {
    match path.split_first() {
        None => {
            *node = value;
            Ok(())
        }
        Some((head, rest)) => assign(slot(node, head)?, rest, value),
    }
}

/// The child slot for `seg`, coercing `node` into a fitting container first.
fn slot<'a>(node: &'a mut Value, seg: &PathSegment) -> Result<&'a mut Value, IndexOutOfRange> {
    let index = seg.as_index();
    let fits = node.is_object() || (node.is_array() && index.is_some());
    if !fits {
        *node = match seg {
            PathSegment::Index(_) => Value::Array(Vec::new()),
            PathSegment::Key(_) => Value::Object(Map::new()),
        };
    }
    Ok(match node {
        Value::Array(items) => {
            let i = index.unwrap_or(0);
            if i.saturating_sub(items.len()) > MAX_ARRAY_GAP {
                return Err(IndexOutOfRange {
                    index: i,
                    len: items.len(),
                });
            }
            if items.len() <= i {
                items.resize(i + 1, Value::Null);
            }
            &mut items[i]
        }
        Value::Object(map) => map.entry(seg.as_key().into_owned()).or_insert(Value::Null),
        other => other,
    })
}

/// Return a copy of `root` without the value at `path`.
///
/// Works at any depth. A missing intermediate leaves the tree unchanged.
/// Removing an array index shifts later elements down. The empty path
/// yields an empty object.
pub fn remove(root: &Value, path: &[PathSegment]) -> Value {
    let Some((last, parents)) = path.split_last() else {
        return Value::Object(Map::new());
    };
    if get(root, path).is_none() {
        return root.clone();
    }
    let mut next = root.clone();
    let parent = parents
        .iter()
        .try_fold(&mut next, |node, seg| child_mut(node, seg));
    match parent {
        Some(Value::Object(map)) => {
            map.remove(&*last.as_key());
        }
        Some(Value::Array(items)) => {
            if let Some(i) = last.as_index().filter(|i| *i < items.len()) {
                items.remove(i);
            }
        }
        _ => {}
    }
    next
}

/// Shallow-merge `patch` into the object at `path`.
///
/// Equivalent to calling [`replace`] with `path + [key]` for every key of
/// `patch`, in order, but clones `root` once.
pub fn merge(
    root: &Value,
    path: &[PathSegment],
    patch: &Map<String, Value>,
) -> Result<Value, IndexOutOfRange> {
    let mut next = root.clone();
    let mut target = path.to_vec();
    for (key, value) in patch {
        target.push(PathSegment::Key(key.clone()));
        assign(&mut next, &target, value.clone())?;
        target.pop();
    }
    Ok(next)
}
