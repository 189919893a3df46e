//! Numeric tunables keyed by name.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// String-keyed store of numeric tunables.
///
/// Lookups fall back to a caller-provided default, so authored data only
/// needs to list the values it changes.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Tunables {
    values: BTreeMap<String, f32>,
}

impl Tunables {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the store with the value assigned.
    #[must_use]
    pub fn with(mut self, key: &str, value: f32) -> Self {
        self.set(key, value);
        self
    }

    /// Assigns a value.
    pub fn set(&mut self, key: &str, value: f32) {
        let _ = self.values.insert(key.to_owned(), value);
    }

    /// Reads a value, falling back to `default` when absent.
    #[must_use]
    pub fn value(&self, key: &str, default: f32) -> f32 {
        self.values.get(key).copied().unwrap_or(default)
    }

    /// Number of explicitly assigned values.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Reports whether no value was assigned.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
