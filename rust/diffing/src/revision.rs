// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Immutable labelled snapshots of hashed objects.

use serde::{Deserialize, Serialize};

use fabric_core::{Entity, EntityId};

use crate::config::DiffConfig;
use crate::hash::set_hash_fragments;

/// One side of a diff.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Revision {
    id: EntityId,
    label: String,
    objects: Vec<Entity>,
    config: DiffConfig,
}

impl Revision {
    /// Hashes copies of `objects` under `config` and snapshots them.
    ///
    /// Objects that were already hashed keep their old hash as the previous
    /// hash, which is what links them to an earlier revision.
    pub fn new(objects: &[Entity], config: DiffConfig, label: impl Into<String>) -> Self {
        let hashed = set_hash_fragments(objects, &config.distinct());
        Self::from_hashed(hashed, config, label)
    }

    /// Snapshots objects whose hash fragments are already set.
    pub fn from_hashed(objects: Vec<Entity>, config: DiffConfig, label: impl Into<String>) -> Self {
        let label = label.into();
        tracing::debug!(label = %label, objects = objects.len(), "created revision");
        Self {
            id: EntityId::new(),
            label,
            objects,
            config,
        }
    }

    pub fn id(&self) -> EntityId {
        self.id
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn objects(&self) -> &[Entity] {
        &self.objects
    }

    pub fn config(&self) -> &DiffConfig {
        &self.config
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    pub fn to_json(&self) -> crate::Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> crate::Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_hashes_without_touching_input() {
        let raw = vec![Entity::new("Door"), Entity::new("Window")];
        let rev = Revision::new(&raw, DiffConfig::default(), "v1");
        assert_eq!(rev.label(), "v1");
        assert_eq!(rev.len(), 2);
        assert!(rev.objects().iter().all(|o| o.hash_fragment().is_some()));
        assert!(raw.iter().all(|o| o.hash_fragment().is_none()));
    }

    #[test]
    fn from_hashed_keeps_fragments() {
        let hashed = Revision::new(&[Entity::new("Door")], DiffConfig::default(), "v1");
        let again = Revision::from_hashed(hashed.objects().to_vec(), DiffConfig::default(), "v1");
        assert_eq!(again.objects(), hashed.objects());
        assert_ne!(again.id(), hashed.id());
    }

    #[test]
    fn json_roundtrip() {
        let rev = Revision::new(&[Entity::new("Door")], DiffConfig::default(), "v1");
        let back = Revision::from_json(&rev.to_json().unwrap()).unwrap();
        assert_eq!(back, rev);
    }
}
