// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Revision diffing.
//!
//! Classification is one-shot per current object, driven by its hash
//! fragment:
//!
//! | `previous_hash`     | class     |
//! |---------------------|-----------|
//! | none                | created   |
//! | equal to `hash`     | unchanged |
//! | different           | updated   |
//!
//! Previous objects whose hash no current object refers to are deleted.

use std::collections::BTreeMap;

use rayon::prelude::*;
use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};

use fabric_core::{DiagnosticSink, Entity, PropertyOracle, SerdePropertyOracle, TracingSink};

use crate::config::DiffConfig;
use crate::error::{Error, Result};
use crate::properties::{different_properties, PropertyDifferences};
use crate::revision::Revision;

/// Outcome of diffing two revisions.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Diff {
    pub created: Vec<Entity>,
    pub deleted: Vec<Entity>,
    pub updated: Vec<Entity>,
    pub unchanged: Vec<Entity>,
    /// Current hash of an updated object → its property deltas.
    pub modified_properties: BTreeMap<String, PropertyDifferences>,
}

impl Diff {
    /// Concatenates the classifications of two diffs.
    ///
    /// Property deltas are unioned; on a hash present in both, `other` wins.
    pub fn merge(mut self, other: Diff) -> Diff {
        self.created.extend(other.created);
        self.deleted.extend(other.deleted);
        self.updated.extend(other.updated);
        self.unchanged.extend(other.unchanged);
        self.modified_properties.extend(other.modified_properties);
        self
    }

    /// `true` when nothing was created, deleted or updated.
    pub fn is_unchanged(&self) -> bool {
        self.created.is_empty() && self.deleted.is_empty() && self.updated.is_empty()
    }

    /// Number of classified objects across all four lists.
    pub fn len(&self) -> usize {
        self.created.len() + self.deleted.len() + self.updated.len() + self.unchanged.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Diffs revisions using a property oracle and a diagnostic sink.
#[derive(Clone, Copy)]
pub struct DiffEngine<'a> {
    oracle: &'a dyn PropertyOracle,
    sink: &'a dyn DiagnosticSink,
}

impl Default for DiffEngine<'static> {
    fn default() -> Self {
        Self {
            oracle: &SerdePropertyOracle,
            sink: &TracingSink,
        }
    }
}

impl<'a> DiffEngine<'a> {
    pub fn new(oracle: &'a dyn PropertyOracle, sink: &'a dyn DiagnosticSink) -> Self {
        Self { oracle, sink }
    }

    /// Classifies every object of `current` against `previous`.
    ///
    /// Fails only when a current object carries no hash fragment. A previous
    /// object without one is reported and counted as deleted; of several
    /// previous objects sharing a hash, the first one supplies the old
    /// state for property deltas.
    pub fn diffing(&self, previous: &Revision, current: &Revision, config: &DiffConfig) -> Result<Diff> {
        let mut previous_by_hash: FxHashMap<&str, &Entity> = FxHashMap::default();
        for obj in previous.objects() {
            match obj.hash_fragment() {
                Some(h) => {
                    if previous_by_hash.contains_key(h.hash.as_str()) {
                        self.sink.warn(format!(
                            "previous revision holds several objects with hash {}; object {} is not used for property deltas",
                            h.hash, obj.id
                        ));
                    } else {
                        previous_by_hash.insert(h.hash.as_str(), obj);
                    }
                }
                None => self.sink.warn(format!(
                    "previous object {} has no hash fragment and is counted as deleted",
                    obj.id
                )),
            }
        }

        let mut diff = Diff::default();
        let mut referenced: FxHashSet<&str> = FxHashSet::default();
        let mut pending: Vec<(&str, &Entity, &Entity)> = Vec::new();

        for obj in current.objects() {
            let fragment = obj.hash_fragment().ok_or(Error::MissingHash(obj.id))?;
            let Some(previous_hash) = fragment.previous_hash.as_deref() else {
                diff.created.push(obj.clone());
                continue;
            };
            referenced.insert(previous_hash);
            if previous_hash == fragment.hash {
                diff.unchanged.push(obj.clone());
                continue;
            }
            diff.updated.push(obj.clone());
            if !config.enable_property_diffing {
                continue;
            }
            match previous_by_hash.get(previous_hash) {
                Some(old) => pending.push((fragment.hash.as_str(), *old, obj)),
                None => self.sink.warn(format!(
                    "no previous object with hash {previous_hash}; property deltas skipped for {}",
                    obj.id
                )),
            }
        }

        let oracle = self.oracle;
        diff.modified_properties = pending
            .par_iter()
            .filter_map(|(hash, old, new)| {
                different_properties(old, new, config, oracle).map(|d| (hash.to_string(), d))
            })
            .collect::<Vec<_>>()
            .into_iter()
            .collect();

        diff.deleted = previous
            .objects()
            .iter()
            .filter(|obj| match obj.hash_fragment() {
                Some(h) => !referenced.contains(h.hash.as_str()),
                None => true,
            })
            .cloned()
            .collect();

        tracing::debug!(
            previous = %previous.label(),
            current = %current.label(),
            created = diff.created.len(),
            deleted = diff.deleted.len(),
            updated = diff.updated.len(),
            unchanged = diff.unchanged.len(),
            "diffed revisions"
        );
        Ok(diff)
    }

    /// Hashes two raw object sets into revisions and diffs them.
    pub fn diffing_sets(&self, set_a: &[Entity], set_b: &[Entity], config: &DiffConfig) -> Result<Diff> {
        let a = Revision::new(set_a, config.clone(), "");
        let b = Revision::new(set_b, config.clone(), "");
        self.diffing(&a, &b, config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hash::{set_hash_fragment, set_hash_fragment_with};
    use fabric_core::DiagnosticLog;
    use serde_json::json;

    fn hashed(objects: &[Entity]) -> Revision {
        Revision::new(objects, DiffConfig::default(), "a")
    }

    /// Rehashes `prev` objects into a follow-up revision.
    fn next(prev: &Revision, edit: impl Fn(usize, &mut Entity)) -> Revision {
        let cfg = DiffConfig::default().distinct();
        let objects = prev
            .objects()
            .iter()
            .enumerate()
            .map(|(i, o)| {
                let mut o = o.clone();
                edit(i, &mut o);
                set_hash_fragment(&o, &cfg)
            })
            .collect();
        Revision::from_hashed(objects, DiffConfig::default(), "b")
    }

    #[test]
    fn renamed_object_is_updated_with_delta() {
        let a = hashed(&[Entity::new("Room").with_name("X")]);
        let h1 = a.objects()[0].hash_fragment().unwrap().hash.clone();
        let b = next(&a, |_, o| o.name = "Y".into());
        let h2 = b.objects()[0].hash_fragment().unwrap().hash.clone();
        assert_ne!(h1, h2);

        let d = DiffEngine::default().diffing(&a, &b, &DiffConfig::default()).unwrap();
        assert_eq!(d.updated.len(), 1);
        assert!(d.created.is_empty() && d.deleted.is_empty() && d.unchanged.is_empty());
        let delta = &d.modified_properties[&h2];
        assert_eq!(delta.len(), 1);
        assert_eq!(delta["name"], (json!("X"), json!("Y")));
    }

    #[test]
    fn untouched_objects_are_unchanged() {
        let a = hashed(&[Entity::new("Room"), Entity::new("Door")]);
        let b = next(&a, |_, _| {});
        let d = DiffEngine::default().diffing(&a, &b, &DiffConfig::default()).unwrap();
        assert_eq!(d.unchanged.len(), 2);
        assert!(d.is_unchanged());
        assert!(d.modified_properties.is_empty());
    }

    #[test]
    fn new_and_removed_objects() {
        let a = hashed(&[Entity::new("Room"), Entity::new("Door")]);
        let mut b_objects = vec![set_hash_fragment(&a.objects()[0], &DiffConfig::default().distinct())];
        b_objects.push(set_hash_fragment(
            &Entity::new("Window"),
            &DiffConfig::default().distinct(),
        ));
        let b = Revision::from_hashed(b_objects, DiffConfig::default(), "b");

        let d = DiffEngine::default().diffing(&a, &b, &DiffConfig::default()).unwrap();
        assert_eq!(d.unchanged.len(), 1);
        assert_eq!(d.created.len(), 1);
        assert_eq!(d.created[0].kind, "Window");
        assert_eq!(d.deleted.len(), 1);
        assert_eq!(d.deleted[0].kind, "Door");
    }

    #[test]
    fn property_diffing_can_be_disabled() {
        let a = hashed(&[Entity::new("Room").with_name("X")]);
        let b = next(&a, |_, o| o.name = "Y".into());
        let cfg = DiffConfig {
            enable_property_diffing: false,
            ..Default::default()
        };
        let d = DiffEngine::default().diffing(&a, &b, &cfg).unwrap();
        assert_eq!(d.updated.len(), 1);
        assert!(d.modified_properties.is_empty());
    }

    #[test]
    fn missing_current_hash_is_fatal() {
        let a = hashed(&[Entity::new("Room")]);
        let bare = Entity::new("Room");
        let id = bare.id;
        let b = Revision::from_hashed(vec![bare], DiffConfig::default(), "b");
        let err = DiffEngine::default()
            .diffing(&a, &b, &DiffConfig::default())
            .unwrap_err();
        assert!(matches!(err, Error::MissingHash(missing) if missing == id));
    }

    #[test]
    fn unhashed_previous_objects_are_deleted_with_warning() {
        let a = Revision::from_hashed(vec![Entity::new("Room")], DiffConfig::default(), "a");
        let b = hashed(&[Entity::new("Door")]);
        let log = DiagnosticLog::new();
        let engine = DiffEngine::new(&SerdePropertyOracle, &log);
        let d = engine.diffing(&a, &b, &DiffConfig::default()).unwrap();
        assert_eq!(d.deleted.len(), 1);
        assert_eq!(d.created.len(), 1);
        assert_eq!(log.warnings().len(), 1);
    }

    #[test]
    fn unknown_previous_hash_skips_delta_only() {
        let a = hashed(&[Entity::new("Room")]);
        let orphan = set_hash_fragment_with(&Entity::new("Room").with_name("Z"), "stale");
        let orphan = set_hash_fragment(&orphan, &DiffConfig::default().distinct());
        let b = Revision::from_hashed(vec![orphan], DiffConfig::default(), "b");
        let log = DiagnosticLog::new();
        let d = DiffEngine::new(&SerdePropertyOracle, &log)
            .diffing(&a, &b, &DiffConfig::default())
            .unwrap();
        assert_eq!(d.updated.len(), 1);
        assert_eq!(d.deleted.len(), 1);
        assert!(d.modified_properties.is_empty());
        assert_eq!(log.warnings().len(), 1);
    }

    #[test]
    fn duplicate_previous_hashes_warn() {
        let room = Entity::new("Room");
        let twin = room.clone_with_new_id();
        let a = hashed(&[room, twin]);
        let b = next(&a, |_, _| {});
        let log = DiagnosticLog::new();
        let d = DiffEngine::new(&SerdePropertyOracle, &log)
            .diffing(&a, &b, &DiffConfig::default())
            .unwrap();
        assert_eq!(d.unchanged.len(), 2);
        assert!(d.deleted.is_empty());
        assert_eq!(log.warnings().len(), 1);
    }

    #[test]
    fn raw_sets_are_hashed_first() {
        let a = vec![Entity::new("Room"), Entity::new("Door")];
        let b = vec![Entity::new("Room")];
        let d = DiffEngine::default()
            .diffing_sets(&a, &b, &DiffConfig::default())
            .unwrap();
        assert_eq!(d.created.len(), 1);
        assert_eq!(d.deleted.len(), 2);
    }

    #[test]
    fn merge_concatenates() {
        let mut first = Diff::default();
        first.created.push(Entity::new("A"));
        first
            .modified_properties
            .insert("h1".into(), PropertyDifferences::new());
        let mut second = Diff::default();
        second.deleted.push(Entity::new("B"));
        second.unchanged.push(Entity::new("C"));
        second
            .modified_properties
            .insert("h2".into(), PropertyDifferences::new());

        let merged = first.merge(second);
        assert_eq!(merged.len(), 3);
        assert_eq!(merged.modified_properties.len(), 2);
        assert!(!merged.is_unchanged());
    }

    #[test]
    fn every_object_is_classified_once() {
        let objects: Vec<Entity> = (0..6)
            .map(|i| Entity::new("Item").with_property("n", i as i64))
            .collect();
        let a = hashed(&objects);
        let b = next(&a, |i, o| {
            if i % 2 == 0 {
                o.name = format!("renamed {i}");
            }
        });
        let d = DiffEngine::default().diffing(&a, &b, &DiffConfig::default()).unwrap();
        assert_eq!(d.updated.len(), 3);
        assert_eq!(d.unchanged.len(), 3);
        assert_eq!(d.created.len() + d.deleted.len(), 0);
        assert_eq!(d.len(), b.len());
    }
}
