// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Property-by-property comparison of two objects.

use std::collections::BTreeMap;

use serde_json::Value;

use fabric_core::id::ID_FIELD;
use fabric_core::oracle::{flatten, path_selected, strip_fragments};
use fabric_core::{Entity, FragmentType, PropertyOracle};

use crate::config::DiffConfig;

/// Dotted path → (value in the first object, value in the second).
pub type PropertyDifferences = BTreeMap<String, (Value, Value)>;

/// Compares `a` and `b` leaf by leaf.
///
/// The identity field and hash fragments never count. Numbers closer than
/// the numeric tolerance are equal. A leaf present on one side only is
/// reported against `null`. Returns `None` when nothing differs.
pub fn different_properties(
    a: &Entity,
    b: &Entity,
    config: &DiffConfig,
    oracle: &dyn PropertyOracle,
) -> Option<PropertyDifferences> {
    let left = leaves(oracle.tree(a));
    let right = leaves(oracle.tree(b));

    let mut paths: Vec<&String> = left.keys().chain(right.keys()).collect();
    paths.sort();
    paths.dedup();

    let mut differences = PropertyDifferences::new();
    for path in paths {
        if differences.len() >= config.max_property_differences {
            tracing::debug!(
                limit = config.max_property_differences,
                "property difference limit reached"
            );
            break;
        }
        if path_selected(path, &config.properties_to_ignore) {
            continue;
        }
        if !config.properties_to_consider.is_empty()
            && !path_selected(path, &config.properties_to_consider)
        {
            continue;
        }
        let va = left.get(path).unwrap_or(&Value::Null);
        let vb = right.get(path).unwrap_or(&Value::Null);
        if !leaves_equal(va, vb, config.numeric_tolerance) {
            differences.insert(path.clone(), (va.clone(), vb.clone()));
        }
    }

    (!differences.is_empty()).then_some(differences)
}

fn leaves(mut tree: Value) -> BTreeMap<String, Value> {
    if let Value::Object(map) = &mut tree {
        map.remove(ID_FIELD);
        strip_fragments(map, FragmentType::Hash);
    }
    flatten(&tree).into_iter().collect()
}

fn leaves_equal(a: &Value, b: &Value, tolerance: f64) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => match (x.as_f64(), y.as_f64()) {
            (Some(x), Some(y)) => x == y || (x - y).abs() <= tolerance,
            _ => x == y,
        },
        _ => a == b,
    }
}
