//! Pass-through query parameters.
//!
//! Inbound query strings are parsed into an open string-keyed mapping and
//! forwarded to the catalog unmodified. Values are either a single string or,
//! when a key repeats or uses the `key[]` array form, a list of strings in the
//! order they appeared.

use std::collections::BTreeMap;

use serde::Serialize;

/// A single query parameter value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum QueryValue {
    Single(String),
    Many(Vec<String>),
}

impl QueryValue {
    /// The value if it is a plain string.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            QueryValue::Single(value) => Some(value),
            QueryValue::Many(_) => None,
        }
    }

    /// All values, in order.
    pub fn values(&self) -> impl Iterator<Item = &str> {
        let values: &[String] = match self {
            QueryValue::Single(value) => std::slice::from_ref(value),
            QueryValue::Many(values) => values,
        };
        values.iter().map(String::as_str)
    }

    fn push(&mut self, value: String) {
        match self {
            QueryValue::Single(first) => {
                *self = QueryValue::Many(vec![std::mem::take(first), value]);
            }
            QueryValue::Many(values) => values.push(value),
        }
    }
}

/// Query parameters of one inbound request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct QueryParams {
    entries: BTreeMap<String, QueryValue>,
}

impl QueryParams {
    /// Create an empty parameter set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a raw `application/x-www-form-urlencoded` query string.
    ///
    /// Decoding is lossy rather than failing: malformed percent escapes are
    /// kept as literal text and left for the upstream to reject.
    pub fn parse(raw: &str) -> Self {
        url::form_urlencoded::parse(raw.as_bytes())
            .map(|(key, value)| (key.into_owned(), value.into_owned()))
            .collect()
    }

    /// Add a value, turning the key into a list if it is already present.
    pub fn append(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.entries.get_mut(&key) {
            Some(existing) => existing.push(value),
            None => {
                let entry = if key.ends_with("[]") {
                    QueryValue::Many(vec![value])
                } else {
                    QueryValue::Single(value)
                };
                self.entries.insert(key, entry);
            }
        }
    }

    /// Builder-style [`append`](Self::append).
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.append(key, value);
        self
    }

    pub fn get(&self, key: &str) -> Option<&QueryValue> {
        self.entries.get(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &QueryValue)> {
        self.entries.iter().map(|(key, value)| (key.as_str(), value))
    }

    /// Flatten into key/value pairs suitable for an outgoing request,
    /// repeating the key once per list element.
    pub fn to_pairs(&self) -> Vec<(String, String)> {
        self.iter()
            .flat_map(|(key, value)| {
                value
                    .values()
                    .map(move |v| (key.to_string(), v.to_string()))
            })
            .collect()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for QueryParams {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut params = QueryParams::new();
        for (key, value) in iter {
            params.append(key, value);
        }
        params
    }
}
