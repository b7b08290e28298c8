// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Tolerance-based entity deduplication.
//!
//! Every entity is reduced to an identity key by an [`IdentityOracle`]; keys
//! are grouped in a single pass so matching stays linear in the number of
//! entities. The first entity encountered in each class is its
//! representative.

use rayon::prelude::*;
use rustc_hash::FxHashMap;

use fabric_core::{Entity, EntityId, IdentityOracle, MatchConfig};

/// Below this many entities keys are computed on the calling thread.
const PARALLEL_THRESHOLD: usize = 256;

/// Result of matching: every input id mapped to its class representative.
#[derive(Debug, Clone, Default)]
pub struct EntityMatches {
    representatives: Vec<Entity>,
    classes: Vec<Vec<EntityId>>,
    lookup: FxHashMap<EntityId, usize>,
}

impl EntityMatches {
    /// Representative of the class `id` belongs to.
    pub fn get(&self, id: EntityId) -> Option<&Entity> {
        self.lookup.get(&id).map(|&c| &self.representatives[c])
    }

    /// Identity of the representative of `id`'s class.
    pub fn canonical_id(&self, id: EntityId) -> Option<EntityId> {
        self.get(id).map(|e| e.id)
    }

    /// Number of distinct input ids.
    pub fn len(&self) -> usize {
        self.lookup.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lookup.is_empty()
    }

    /// One representative per class, in first-encounter order.
    pub fn representatives(&self) -> &[Entity] {
        &self.representatives
    }

    /// Member ids of every class, parallel to [`Self::representatives`].
    pub fn classes(&self) -> &[Vec<EntityId>] {
        &self.classes
    }

    /// Input id → representative id.
    pub fn canonical_map(&self) -> FxHashMap<EntityId, EntityId> {
        self.lookup
            .iter()
            .map(|(&id, &c)| (id, self.representatives[c].id))
            .collect()
    }

    /// Input id → owned copy of the representative.
    pub fn into_map(self) -> FxHashMap<EntityId, Entity> {
        let Self {
            representatives,
            lookup,
            ..
        } = self;
        lookup
            .into_iter()
            .map(|(id, c)| (id, representatives[c].clone()))
            .collect()
    }
}

/// Groups `entities` into equivalence classes under `oracle`.
///
/// Repeated ids are folded into the class of their first occurrence. Empty
/// input yields an empty result; reporting it is up to the caller.
pub fn match_entities(
    entities: &[Entity],
    config: &MatchConfig,
    oracle: &dyn IdentityOracle,
) -> EntityMatches {
    let keys: Vec<String> = if entities.len() >= PARALLEL_THRESHOLD {
        entities
            .par_iter()
            .map(|e| oracle.identity_key(e, config))
            .collect()
    } else {
        entities
            .iter()
            .map(|e| oracle.identity_key(e, config))
            .collect()
    };

    let mut matches = EntityMatches::default();
    let mut by_key: FxHashMap<&str, usize> = FxHashMap::default();

    for (entity, key) in entities.iter().zip(&keys) {
        if matches.lookup.contains_key(&entity.id) {
            continue;
        }
        let class = *by_key.entry(key.as_str()).or_insert_with(|| {
            matches.representatives.push(entity.clone());
            matches.classes.push(Vec::new());
            matches.representatives.len() - 1
        });
        matches.classes[class].push(entity.id);
        matches.lookup.insert(entity.id, class);
    }

    tracing::debug!(
        entities = entities.len(),
        classes = matches.representatives.len(),
        "matched entities"
    );
    matches
}
