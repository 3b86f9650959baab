//! Opaque key/value settings bags.
//!
//! Templates and data sets arrive from the template repository as loosely
//! typed JSON maps edited by administrators. [`Settings`] wraps such a map and
//! offers lenient typed accessors: numbers may be stored as strings, flags as
//! `"yes"`/`"on"`, lists as arrays or multi-line text. Zero-valued bounds read
//! as unset.
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};

/// Truthy convention shared by every settings flag:
/// `true`, `1`, `"1"`, `"true"`, `"yes"`, `"on"`.
pub fn value_is_true(value: &JsonValue) -> bool {
    match value {
        JsonValue::Bool(flag) => *flag,
        JsonValue::Number(number) => number.as_i64() == Some(1) || number.as_u64() == Some(1),
        JsonValue::String(text) => matches!(text.as_str(), "1" | "true" | "yes" | "on"),
        _ => false,
    }
}

fn json_to_string(value: &JsonValue) -> Option<String> {
    match value {
        JsonValue::String(text) => Some(text.clone()),
        JsonValue::Number(number) => Some(number.to_string()),
        JsonValue::Bool(flag) => Some(flag.to_string()),
        _ => None,
    }
}

fn json_to_u64(value: &JsonValue) -> Option<u64> {
    match value {
        JsonValue::Number(number) => number
            .as_u64()
            .or_else(|| number.as_f64().filter(|f| *f >= 0.0).map(|f| f as u64)),
        JsonValue::String(text) => text.trim().parse().ok(),
        _ => None,
    }
}

/// Settings bag backed by a JSON object.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct Settings(Map<String, JsonValue>);

impl Settings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_map(map: Map<String, JsonValue>) -> Self {
        Self(map)
    }

    /// Builder-style insert, handy for fixtures and programmatic templates.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<JsonValue>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<JsonValue>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&JsonValue> {
        self.0.get(key)
    }

    pub fn as_map(&self) -> &Map<String, JsonValue> {
        &self.0
    }

    pub fn into_map(self) -> Map<String, JsonValue> {
        self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn flag(&self, key: &str) -> bool {
        self.get(key).is_some_and(value_is_true)
    }

    /// Scalar as text, `None` when absent, null or blank.
    pub fn text(&self, key: &str) -> Option<String> {
        self.get(key)
            .and_then(json_to_string)
            .filter(|text| !text.trim().is_empty())
    }

    /// Positive count; zero and unparsable values read as unset.
    pub fn count(&self, key: &str) -> Option<usize> {
        self.get(key)
            .and_then(json_to_u64)
            .filter(|count| *count > 0)
            .map(|count| count as usize)
    }

    pub fn id(&self, key: &str) -> Option<u64> {
        self.get(key).and_then(json_to_u64).filter(|id| *id > 0)
    }

    /// List of non-blank strings from an array or from text split on new
    /// lines and commas.
    pub fn list(&self, key: &str) -> Vec<String> {
        let raw: Vec<String> = match self.get(key) {
            Some(JsonValue::Array(items)) => items.iter().filter_map(json_to_string).collect(),
            Some(JsonValue::String(text)) => text
                .split(['\n', '\r', ','])
                .map(str::to_string)
                .collect(),
            Some(other) => json_to_string(other).into_iter().collect(),
            None => Vec::new(),
        };
        raw.into_iter()
            .map(|item| item.trim().to_string())
            .filter(|item| !item.is_empty())
            .collect()
    }

    /// Positive ids from a list setting; entries that are not ids are dropped.
    pub fn id_list(&self, key: &str) -> Vec<u64> {
        match self.get(key) {
            Some(JsonValue::Array(items)) => items
                .iter()
                .filter_map(json_to_u64)
                .filter(|id| *id > 0)
                .collect(),
            _ => self
                .list(key)
                .iter()
                .filter_map(|item| item.parse().ok())
                .filter(|id| *id > 0)
                .collect(),
        }
    }

    /// `key = value` pairs from multi-line text, or from a JSON object.
    ///
    /// Lines without `=` are kept with an empty value; blank lines are skipped.
    pub fn params(&self, key: &str) -> Vec<(String, String)> {
        match self.get(key) {
            Some(JsonValue::Object(map)) => map
                .iter()
                .filter_map(|(k, v)| json_to_string(v).map(|v| (k.trim().to_string(), v)))
                .collect(),
            Some(JsonValue::String(text)) => parse_params(text),
            _ => Vec::new(),
        }
    }
}

impl From<Map<String, JsonValue>> for Settings {
    fn from(map: Map<String, JsonValue>) -> Self {
        Self(map)
    }
}

/// Parses `key = value` lines; the first `=` separates key from value.
pub fn parse_params(text: &str) -> Vec<(String, String)> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(|line| match line.split_once('=') {
            Some((key, value)) => (key.trim().to_string(), value.trim().to_string()),
            None => (line.to_string(), String::new()),
        })
        .collect()
}
