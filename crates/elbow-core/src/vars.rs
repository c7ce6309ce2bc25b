//! Run-scoped variable bag
//!
//! Seeded from configuration and grown by response exports. Entries are only
//! ever inserted or overwritten, never removed.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Variables visible to `${name}` placeholders.
///
/// Values are kept as JSON so exports of numbers or booleans survive intact.
/// A `null` entry (an export whose source path was missing) reads as absent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Vars(BTreeMap<String, Value>);

impl Vars {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite a variable.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(name.into(), value.into());
    }

    /// Raw stored value, including `null` placeholders for missing exports.
    #[must_use]
    pub fn raw(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    /// Value rendered for substitution. `None` when unset or `null`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<String> {
        match self.0.get(name)? {
            Value::Null => None,
            v => Some(value_to_param_string(v)),
        }
    }

    /// Resolve `name` from the bag, then from the process environment.
    #[must_use]
    pub fn resolve(&self, name: &str) -> Option<String> {
        self.resolve_with(name, |key| std::env::var(key).ok())
    }

    /// Same as [`Vars::resolve`] with a caller-supplied environment.
    pub fn resolve_with<F>(&self, name: &str, env: F) -> Option<String>
    where
        F: Fn(&str) -> Option<String>,
    {
        self.get(name).or_else(|| env(name))
    }

    /// Copy every entry of `other` over this bag.
    pub fn merge(&mut self, other: &Self) {
        for (k, v) in &other.0 {
            self.0.insert(k.clone(), v.clone());
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Vars {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

/// Render a JSON value the way it travels in a URL, header or template.
#[must_use]
pub fn value_to_param_string(v: &Value) -> String {
    match v {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
