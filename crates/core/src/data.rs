//! Immutable key-value input/output bags for work requests.
//!
//! Each work unit receives a bag as input and may return one as output.
//! When a chain advances, the previous unit's output bag is merged over
//! the next unit's declared input (upstream output wins on key conflict).

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Immutable string-keyed value bag attached to a work request.
///
/// Construct via [`InputData::builder`]; the empty bag is the default for
/// units that take no input.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InputData {
    values: HashMap<String, serde_json::Value>,
}

impl InputData {
    /// Start building a bag.
    pub fn builder() -> InputDataBuilder {
        InputDataBuilder {
            values: HashMap::new(),
        }
    }

    /// True when the bag carries no values.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Number of values in the bag.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// True when `key` is present.
    pub fn contains_key(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// Raw value stored under `key`.
    pub fn get(&self, key: &str) -> Option<&serde_json::Value> {
        self.values.get(key)
    }

    /// String value stored under `key`; `None` if absent or not a string.
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.values.get(key).and_then(|v| v.as_str())
    }

    /// Integer value stored under `key`; `None` if absent or not an integer.
    pub fn get_i64(&self, key: &str) -> Option<i64> {
        self.values.get(key).and_then(|v| v.as_i64())
    }

    /// Merge `overlay` over `self`, returning a new bag.
    ///
    /// Keys present in `overlay` win. Used by the chain executor to feed a
    /// unit's output into the next unit's input.
    pub fn merged_with(&self, overlay: &InputData) -> InputData {
        let mut values = self.values.clone();
        for (key, value) in &overlay.values {
            values.insert(key.clone(), value.clone());
        }
        InputData { values }
    }
}

/// Builder for [`InputData`].
#[derive(Debug, Default)]
pub struct InputDataBuilder {
    values: HashMap<String, serde_json::Value>,
}

impl InputDataBuilder {
    /// Store a string value under `key`.
    pub fn put_str(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.values
            .insert(key.into(), serde_json::Value::String(value.into()));
        self
    }

    /// Store an integer value under `key`.
    pub fn put_i64(mut self, key: impl Into<String>, value: i64) -> Self {
        self.values.insert(key.into(), value.into());
        self
    }

    /// Store a boolean value under `key`.
    pub fn put_bool(mut self, key: impl Into<String>, value: bool) -> Self {
        self.values.insert(key.into(), value.into());
        self
    }

    /// Finish the bag.
    pub fn build(self) -> InputData {
        InputData {
            values: self.values,
        }
    }
}
