use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// The part of the route that maps onto a URL.
///
/// `query` is the search string, `config` the fragment; both are flat
/// string maps. `desc` becomes the history entry title.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct View {
    #[serde(default = "root_path")]
    pub path: String,
    #[serde(default)]
    pub query: BTreeMap<String, String>,
    #[serde(default)]
    pub config: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub desc: Option<String>,
}

fn root_path() -> String {
    "/".to_string()
}

impl Default for View {
    fn default() -> Self {
        Self {
            path: root_path(),
            query: BTreeMap::new(),
            config: BTreeMap::new(),
            desc: None,
        }
    }
}

impl View {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            ..Self::default()
        }
    }

    pub fn with_query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.insert(key.into(), value.into());
        self
    }

    pub fn with_config(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.config.insert(key.into(), value.into());
        self
    }

    /// Read a view out of an arbitrary route value.
    ///
    /// Lenient: a missing or empty path becomes `/`, numbers and booleans in
    /// `query`/`config` are stringified, nulls are dropped, and nested
    /// values are kept as compact JSON text.
    pub fn from_value(value: &Value) -> Self {
        let path = value
            .get("path")
            .and_then(Value::as_str)
            .filter(|p| !p.is_empty())
            .map(str::to_string)
            .unwrap_or_else(root_path);
        Self {
            path,
            query: params_from_value(value.get("query")),
            config: params_from_value(value.get("config")),
            desc: value.get("desc").and_then(Value::as_str).map(str::to_string),
        }
    }

    /// The view as route object fields. `desc` is only present when set.
    pub fn to_map(&self) -> Map<String, Value> {
        let mut map = Map::new();
        map.insert("path".into(), Value::String(self.path.clone()));
        map.insert("query".into(), params_to_value(&self.query));
        map.insert("config".into(), params_to_value(&self.config));
        if let Some(desc) = &self.desc {
            map.insert("desc".into(), Value::String(desc.clone()));
        }
        map
    }

    pub fn to_value(&self) -> Value {
        Value::Object(self.to_map())
    }
}

fn params_from_value(value: Option<&Value>) -> BTreeMap<String, String> {
    let Some(Value::Object(map)) = value else {
        return BTreeMap::new();
    };
    map.iter()
        .filter_map(|(k, v)| param_text(v).map(|text| (k.clone(), text)))
        .collect()
}

fn param_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

fn params_to_value(params: &BTreeMap<String, String>) -> Value {
    Value::Object(
        params
            .iter()
            .map(|(k, v)| (k.clone(), Value::String(v.clone())))
            .collect(),
    )
}
