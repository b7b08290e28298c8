// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Comparison oracles consumed by the graph and diffing engines.
//!
//! Entities are compared through their serialized property tree (a
//! `serde_json::Value`). Paths into the tree are dotted, with array items
//! addressed by index: `properties.height`, `fragments.0.kind`.
//!
//! Two traits are injected into the engines:
//! - [`PropertyOracle`] enumerates and looks up properties.
//! - [`IdentityOracle`] decides tolerance-based equivalence. It does so by
//!   reducing an entity to an identity key, so equivalence is transitive and
//!   matching can group by key instead of comparing pairs.

use serde::Serialize;
use serde_json::{Map, Value};

use crate::config::MatchConfig;
use crate::entity::Entity;
use crate::fragment::FragmentType;
use crate::id::ID_FIELD;

/// Name of the fragment list in serialized property trees.
pub const FRAGMENTS_FIELD: &str = "fragments";

// =============================================================================
// Numeric helpers
// =============================================================================

/// Rounds `value` to `places` decimal places. Negative zero becomes zero.
pub fn round_to_places(value: f64, places: u32) -> f64 {
    let factor = 10f64.powi(places.min(308) as i32);
    if !value.is_finite() || !factor.is_finite() {
        return value;
    }
    let rounded = (value * factor).round() / factor;
    if rounded == 0.0 {
        0.0
    } else {
        rounded
    }
}

/// Snaps `value` to the nearest multiple of `tolerance`.
///
/// A non-positive or non-finite tolerance leaves the value untouched.
pub fn quantize(value: f64, tolerance: f64) -> f64 {
    if !value.is_finite() || !tolerance.is_finite() || tolerance <= 0.0 {
        return value;
    }
    let snapped = (value / tolerance).round() * tolerance;
    if snapped == 0.0 {
        0.0
    } else {
        snapped
    }
}

/// Number of decimals needed to print multiples of `tolerance` exactly enough.
pub fn tolerance_decimals(tolerance: f64) -> usize {
    if !tolerance.is_finite() || tolerance <= 0.0 || tolerance >= 1.0 {
        return 0;
    }
    (-tolerance.log10() - 1e-9).ceil().clamp(0.0, 17.0) as usize
}

// =============================================================================
// Property trees
// =============================================================================

/// Serializes any value into a property tree.
///
/// Serialization of the model types cannot fail in practice; a failure is
/// logged and yields `Value::Null`.
pub fn to_tree<T: Serialize + ?Sized>(obj: &T) -> Value {
    serde_json::to_value(obj).unwrap_or_else(|e| {
        tracing::error!(error = %e, "failed to build property tree");
        Value::Null
    })
}

/// Builds an entity's content tree: identity removed, hash fragments removed.
pub fn content_tree(entity: &Entity) -> Value {
    let mut tree = to_tree(entity);
    if let Value::Object(map) = &mut tree {
        map.remove(ID_FIELD);
        strip_fragments(map, FragmentType::Hash);
    }
    tree
}

/// Removes every fragment of the given type from a serialized entity.
pub fn strip_fragments(map: &mut Map<String, Value>, ty: FragmentType) {
    if let Some(Value::Array(fragments)) = map.get_mut(FRAGMENTS_FIELD) {
        fragments.retain(|f| f.get("type").and_then(Value::as_str) != Some(ty.as_str()));
    }
}

/// Looks up a dotted path in a tree.
pub fn property_at<'a>(tree: &'a Value, path: &str) -> Option<&'a Value> {
    if path.is_empty() {
        return Some(tree);
    }
    path.split('.').try_fold(tree, |node, segment| match node {
        Value::Object(map) => map.get(segment),
        Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
        _ => None,
    })
}

/// Flattens a tree into `(dotted path, leaf)` pairs.
///
/// Object keys come out sorted, array items in order. Empty objects and
/// arrays are reported as leaves so that their presence still counts.
pub fn flatten(tree: &Value) -> Vec<(String, Value)> {
    let mut out = Vec::new();
    flatten_into(tree, String::new(), &mut out);
    out
}

fn flatten_into(node: &Value, prefix: String, out: &mut Vec<(String, Value)>) {
    match node {
        Value::Object(map) if !map.is_empty() => {
            for (key, child) in map {
                flatten_into(child, join_path(&prefix, key), out);
            }
        }
        Value::Array(items) if !items.is_empty() => {
            for (i, child) in items.iter().enumerate() {
                flatten_into(child, join_path(&prefix, &i.to_string()), out);
            }
        }
        leaf => out.push((prefix, leaf.clone())),
    }
}

/// Joins a parent path and a segment with a dot.
pub fn join_path(prefix: &str, segment: &str) -> String {
    if prefix.is_empty() {
        segment.to_string()
    } else {
        format!("{prefix}.{segment}")
    }
}

/// Returns `true` if `path` is selected by `name`.
///
/// A name selects a path when it equals the path, is a dotted prefix of it
/// (`properties` selects `properties.height`), or equals its last segment
/// (`height` selects `properties.height`).
pub fn path_matches(path: &str, name: &str) -> bool {
    if path == name {
        return true;
    }
    if path.len() > name.len() && path.starts_with(name) && path.as_bytes()[name.len()] == b'.' {
        return true;
    }
    path.rsplit('.').next() == Some(name)
}

/// Returns `true` if any name in `names` selects `path`.
pub fn path_selected(path: &str, names: &[String]) -> bool {
    names.iter().any(|n| path_matches(path, n))
}

/// Renders a leaf for identity keys, rounding numbers to `places`.
fn render_leaf(leaf: &Value, places: u32) -> String {
    match leaf {
        Value::Number(n) => match n.as_f64() {
            Some(f) => format!("{}", round_to_places(f, places)),
            None => n.to_string(),
        },
        other => other.to_string(),
    }
}

// =============================================================================
// Oracles
// =============================================================================

/// Enumerates and looks up entity properties by dotted path.
pub trait PropertyOracle: Send + Sync {
    /// Returns the property tree of an entity.
    fn tree(&self, entity: &Entity) -> Value;

    /// Returns the value at `path`, if present.
    fn property(&self, entity: &Entity, path: &str) -> Option<Value> {
        property_at(&self.tree(entity), path).cloned()
    }

    /// Returns every leaf property as `(path, value)`.
    fn properties(&self, entity: &Entity) -> Vec<(String, Value)> {
        flatten(&self.tree(entity))
    }
}

/// Property oracle backed by the entity's `serde` representation.
#[derive(Debug, Clone, Copy, Default)]
pub struct SerdePropertyOracle;

impl PropertyOracle for SerdePropertyOracle {
    fn tree(&self, entity: &Entity) -> Value {
        to_tree(entity)
    }
}

/// Decides whether two entities stand for the same thing.
pub trait IdentityOracle: Send + Sync {
    /// Reduces an entity to a key. Entities are equivalent iff their keys match.
    fn identity_key(&self, entity: &Entity, config: &MatchConfig) -> String;
}

/// Whether `oracle` reduces `a` and `b` to the same identity key.
pub fn are_equivalent(
    oracle: &dyn IdentityOracle,
    a: &Entity,
    b: &Entity,
    config: &MatchConfig,
) -> bool {
    oracle.identity_key(a, config) == oracle.identity_key(b, config)
}

/// Identity oracle comparing rounded property trees.
///
/// The identity field and hash fragments never participate. When
/// `properties_to_consider` is non-empty only the selected paths do.
#[derive(Debug, Clone, Copy, Default)]
pub struct PropertyTreeOracle;

impl IdentityOracle for PropertyTreeOracle {
    fn identity_key(&self, entity: &Entity, config: &MatchConfig) -> String {
        let tree = content_tree(entity);
        let mut key = String::new();
        for (path, leaf) in flatten(&tree) {
            if !config.properties_to_consider.is_empty()
                && !path_selected(&path, &config.properties_to_consider)
            {
                continue;
            }
            key.push_str(&path);
            key.push('=');
            key.push_str(&render_leaf(&leaf, config.decimal_places));
            key.push(';');
        }
        key
    }
}
