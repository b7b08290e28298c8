// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Unique display names.

use rustc_hash::FxHashSet;

use fabric_core::Entity;

/// Gives every entity a display name not shared with any other.
///
/// Unnamed entities start from their kind. A name already taken gets the
/// smallest free ` (n)` suffix, starting at 2.
pub fn assign_unique_names<'a>(entities: impl IntoIterator<Item = &'a mut Entity>) {
    let mut taken: FxHashSet<String> = FxHashSet::default();
    for entity in entities {
        let base = if !entity.name.is_empty() {
            entity.name.clone()
        } else if !entity.kind.is_empty() {
            entity.kind.clone()
        } else {
            "Entity".to_string()
        };
        let mut candidate = base.clone();
        let mut n = 2;
        while taken.contains(&candidate) {
            candidate = format!("{base} ({n})");
            n += 1;
        }
        entity.name = candidate.clone();
        taken.insert(candidate);
    }
}
