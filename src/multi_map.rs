//! String map where a repeated key keeps every value.

use std::collections::BTreeMap;

/// Value slot of a [`MultiMap`] entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MultiValue {
    /// Only one value was added under the key.
    Single(String),
    /// Values in the order they were added.
    List(Vec<String>),
}

impl MultiValue {
    /// All values of the entry, oldest first.
    pub fn values(&self) -> &[String] {
        match self {
            MultiValue::Single(value) => std::slice::from_ref(value),
            MultiValue::List(values) => values,
        }
    }
}

/// Headers and query parameters of a request.
///
/// Adding a value under a key that is already present turns the entry into a
/// list instead of overwriting it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MultiMap {
    entries: BTreeMap<String, MultiValue>,
}

impl MultiMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let value = value.into();
        let key = key.into();
        match self.entries.remove(&key) {
            None => {
                self.entries.insert(key, MultiValue::Single(value));
            }
            Some(MultiValue::Single(first)) => {
                self.entries.insert(key, MultiValue::List(vec![first, value]));
            }
            Some(MultiValue::List(mut values)) => {
                values.push(value);
                self.entries.insert(key, MultiValue::List(values));
            }
        }
    }

    pub fn get(&self, key: &str) -> Option<&MultiValue> {
        self.entries.get(key)
    }

    /// Case-insensitive key lookup, as header names compare.
    pub fn contains_key_ignore_case(&self, key: &str) -> bool {
        self.entries.keys().any(|k| k.eq_ignore_ascii_case(key))
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Every `(key, value)` pair, with list entries flattened in insertion order.
    pub fn pairs(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().flat_map(|(key, value)| {
            value
                .values()
                .iter()
                .map(move |v| (key.as_str(), v.as_str()))
        })
    }
}
