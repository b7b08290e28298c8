// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Content hashes and hash fragments.
//!
//! The hash covers an entity's content tree: the identity field and any hash
//! fragment are left out, as is every property selected by
//! [`DistinctConfig::properties_to_ignore`]. Floating-point leaves are
//! snapped to the numeric tolerance first, so values closer than the
//! tolerance usually hash alike.

use rayon::prelude::*;
use serde_json::Value;
use sha2::{Digest, Sha256};

use fabric_core::oracle::{content_tree, flatten, path_selected, quantize, tolerance_decimals};
use fabric_core::{Entity, HashFragment};

use crate::config::DistinctConfig;

/// Below this many objects hashing stays on the calling thread.
const PARALLEL_THRESHOLD: usize = 256;

/// Computes the SHA-256 content hash of `entity` as lowercase hex.
pub fn compute_hash(entity: &Entity, config: &DistinctConfig) -> String {
    let tree = content_tree(entity);
    let mut hasher = Sha256::new();
    for (path, leaf) in flatten(&tree) {
        if path_selected(&path, &config.properties_to_ignore) {
            continue;
        }
        hasher.update(path.as_bytes());
        hasher.update(b"=");
        hasher.update(render_leaf(&leaf, config.numeric_tolerance).as_bytes());
        hasher.update(b";");
    }
    hex::encode(hasher.finalize())
}

fn render_leaf(leaf: &Value, tolerance: f64) -> String {
    match leaf {
        Value::Number(n) if n.is_f64() => {
            let value = n.as_f64().unwrap_or_default();
            let snapped = quantize(value, tolerance);
            if tolerance.is_finite() && tolerance > 0.0 && snapped.is_finite() {
                format!("{:.*}", tolerance_decimals(tolerance), snapped)
            } else {
                format!("{snapped}")
            }
        }
        other => other.to_string(),
    }
}

/// Returns a copy of `entity` carrying a fresh hash fragment.
///
/// If the entity already had a hash, it becomes the new fragment's
/// `previous_hash`.
pub fn set_hash_fragment(entity: &Entity, config: &DistinctConfig) -> Entity {
    set_hash_fragment_with(entity, compute_hash(entity, config))
}

/// Like [`set_hash_fragment`] with an externally computed hash.
pub fn set_hash_fragment_with(entity: &Entity, hash: impl Into<String>) -> Entity {
    let mut hashed = entity.clone();
    let previous_hash = entity.hash_fragment().map(|h| h.hash.clone());
    hashed.add_or_replace_fragment(HashFragment {
        hash: hash.into(),
        previous_hash,
    });
    hashed
}

/// Hashes every entity, preserving order.
pub fn set_hash_fragments(entities: &[Entity], config: &DistinctConfig) -> Vec<Entity> {
    if entities.len() >= PARALLEL_THRESHOLD {
        entities
            .par_iter()
            .map(|e| set_hash_fragment(e, config))
            .collect()
    } else {
        entities.iter().map(|e| set_hash_fragment(e, config)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fabric_core::{EntityId, Point};

    fn beam() -> Entity {
        Entity::new("Beam")
            .with_name("B1")
            .with_property("length", 6.0)
            .with_point(Point::new(1.0, 2.0, 3.0))
    }

    #[test]
    fn hash_is_hex_sha256() {
        let h = compute_hash(&beam(), &DistinctConfig::default());
        assert_eq!(h.len(), 64);
        assert!(h.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn identity_does_not_affect_hash() {
        let a = beam();
        let b = a.clone().with_id(EntityId::new());
        let cfg = DistinctConfig::default();
        assert_eq!(compute_hash(&a, &cfg), compute_hash(&b, &cfg));
    }

    #[test]
    fn content_changes_change_hash() {
        let cfg = DistinctConfig::default();
        let a = beam();
        let b = beam().with_property("length", 6.5);
        assert_ne!(compute_hash(&a, &cfg), compute_hash(&b, &cfg));
    }

    #[test]
    fn ignored_properties_do_not_affect_hash() {
        let cfg = DistinctConfig {
            properties_to_ignore: vec!["name".into()],
            ..Default::default()
        };
        let a = beam();
        let b = beam().with_name("renamed");
        assert_eq!(compute_hash(&a, &cfg), compute_hash(&b, &cfg));
    }

    #[test]
    fn sub_tolerance_noise_hashes_alike() {
        let cfg = DistinctConfig::default();
        let a = beam().with_property("length", 6.000_000_01);
        let b = beam().with_property("length", 6.000_000_02);
        assert_eq!(compute_hash(&a, &cfg), compute_hash(&b, &cfg));
    }

    #[test]
    fn rehashing_records_previous_hash() {
        let cfg = DistinctConfig::default();
        let original = beam();
        let first = set_hash_fragment(&original, &cfg);
        assert!(original.hash_fragment().is_none());

        let h1 = first.hash_fragment().unwrap().clone();
        assert_eq!(h1.previous_hash, None);

        let second = set_hash_fragment(&first, &cfg);
        let h2 = second.hash_fragment().unwrap();
        assert_eq!(h2.hash, h1.hash);
        assert_eq!(h2.previous_hash.as_deref(), Some(h1.hash.as_str()));
        assert_eq!(second.fragments.len(), 1);
    }

    #[test]
    fn explicit_hash_is_stored() {
        let e = set_hash_fragment_with(&beam(), "abc");
        assert_eq!(e.hash_fragment().unwrap().hash, "abc");
    }

    #[test]
    fn batch_hashing_preserves_order() {
        let items: Vec<Entity> = (0..PARALLEL_THRESHOLD + 10)
            .map(|i| Entity::new("Item").with_property("n", i as i64))
            .collect();
        let hashed = set_hash_fragments(&items, &DistinctConfig::default());
        assert_eq!(hashed.len(), items.len());
        for (a, b) in items.iter().zip(&hashed) {
            assert_eq!(a.id, b.id);
            assert_eq!(
                b.hash_fragment().unwrap().hash,
                compute_hash(a, &DistinctConfig::default())
            );
        }
    }
}
