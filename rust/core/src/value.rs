// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Typed key-value properties that can be attached to any entity.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A typed value stored in a dictionary.
///
/// Serialized untagged so that property paths read naturally
/// (`properties.height` rather than `properties.height.Double`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DictValue {
    Null,
    Bool(bool),
    Int(i64),
    Double(f64),
    String(String),
    List(Vec<DictValue>),
    Map(BTreeMap<String, DictValue>),
}

/// A dictionary is a typed key-value map attached to an entity.
///
/// Ordered by key so that serialized property trees are deterministic.
pub type Dictionary = BTreeMap<String, DictValue>;

impl DictValue {
    /// Returns the numeric value as `f64` for `Int` and `Double`.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            DictValue::Int(i) => Some(*i as f64),
            DictValue::Double(d) => Some(*d),
            _ => None,
        }
    }

    /// Returns the string slice for `String` values.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            DictValue::String(s) => Some(s),
            _ => None,
        }
    }
}

impl From<f64> for DictValue {
    fn from(v: f64) -> Self {
        DictValue::Double(v)
    }
}

impl From<i64> for DictValue {
    fn from(v: i64) -> Self {
        DictValue::Int(v)
    }
}

impl From<bool> for DictValue {
    fn from(v: bool) -> Self {
        DictValue::Bool(v)
    }
}

impl From<&str> for DictValue {
    fn from(v: &str) -> Self {
        DictValue::String(v.to_string())
    }
}

impl From<String> for DictValue {
    fn from(v: String) -> Self {
        DictValue::String(v)
    }
}
