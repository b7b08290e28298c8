// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Arena-backed entity graph.
//!
//! Entities live in a [`SlotMap`] and are found by identity through a side
//! index. Relations are kept in insertion order and refer to entities only by
//! [`EntityId`], so a relation may outlive (dangle from) an entity removed
//! from the graph.

use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};
use slotmap::{new_key_type, SlotMap};

use fabric_core::{Entity, EntityId};

use crate::relation::{Relation, RelationKind};
use crate::serialization::GraphSnapshot;

new_key_type! {
    /// Arena key for an entity stored in a [`Graph`].
    pub struct EntityKey;
}

/// A set of uniquely-identified entities and the relations between them.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(into = "GraphSnapshot", from = "GraphSnapshot")]
pub struct Graph {
    entities: SlotMap<EntityKey, Entity>,
    index: FxHashMap<EntityId, EntityKey>,
    /// Relations in insertion order. Multiplicity is preserved.
    pub relations: Vec<Relation>,
}

impl Graph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an entity unless one with the same id is already present.
    ///
    /// Returns `true` if the entity was inserted.
    pub fn add_entity(&mut self, entity: Entity) -> bool {
        if self.index.contains_key(&entity.id) {
            return false;
        }
        let id = entity.id;
        let key = self.entities.insert(entity);
        self.index.insert(id, key);
        true
    }

    pub fn add_relation(&mut self, relation: Relation) {
        self.relations.push(relation);
    }

    pub fn extend_relations(&mut self, relations: impl IntoIterator<Item = Relation>) {
        self.relations.extend(relations);
    }

    pub fn entity(&self, id: EntityId) -> Option<&Entity> {
        self.index.get(&id).and_then(|&k| self.entities.get(k))
    }

    pub fn entity_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        let key = *self.index.get(&id)?;
        self.entities.get_mut(key)
    }

    pub fn contains(&self, id: EntityId) -> bool {
        self.index.contains_key(&id)
    }

    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    pub fn relation_count(&self) -> usize {
        self.relations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty() && self.relations.is_empty()
    }

    /// Iterates over entities in arena order.
    pub fn entities(&self) -> impl Iterator<Item = &Entity> {
        self.entities.values()
    }

    pub fn entities_mut(&mut self) -> impl Iterator<Item = &mut Entity> {
        self.entities.values_mut()
    }

    pub fn entity_ids(&self) -> Vec<EntityId> {
        self.entities.values().map(|e| e.id).collect()
    }

    /// Removes an entity together with every relation touching it.
    pub fn remove_entity(&mut self, id: EntityId) -> Option<Entity> {
        let key = self.index.remove(&id)?;
        let removed = self.entities.remove(key);
        self.relations.retain(|r| !r.touches(id));
        removed
    }

    /// Removes every entity for which `keep` returns `false`.
    pub fn retain_entities(&mut self, mut keep: impl FnMut(&Entity) -> bool) {
        let dropped: Vec<EntityId> = self
            .entities
            .values()
            .filter(|e| !keep(e))
            .map(|e| e.id)
            .collect();
        if dropped.is_empty() {
            return;
        }
        let dropped_set: FxHashSet<EntityId> = dropped.iter().copied().collect();
        for id in &dropped {
            if let Some(key) = self.index.remove(id) {
                self.entities.remove(key);
            }
        }
        self.relations
            .retain(|r| !dropped_set.contains(&r.source) && !dropped_set.contains(&r.target));
    }

    /// Targets of relations leaving `id`, in relation order.
    pub fn destinations(&self, id: EntityId) -> Vec<EntityId> {
        self.relations
            .iter()
            .filter(|r| r.source == id)
            .map(|r| r.target)
            .collect()
    }

    /// Sources of relations entering `id`, in relation order.
    pub fn incoming(&self, id: EntityId) -> Vec<EntityId> {
        self.relations
            .iter()
            .filter(|r| r.target == id)
            .map(|r| r.source)
            .collect()
    }

    /// Rewrites relation endpoints through a canonical-id map.
    ///
    /// Endpoints absent from the map are left as they are.
    pub fn unique_entities(&mut self, canonical: &FxHashMap<EntityId, EntityId>) {
        for relation in &mut self.relations {
            if let Some(&id) = canonical.get(&relation.source) {
                relation.source = id;
            }
            if let Some(&id) = canonical.get(&relation.target) {
                relation.target = id;
            }
            if let RelationKind::Spatial {
                subgraph: Some(sub),
                ..
            } = &mut relation.kind
            {
                sub.remap_entity_ids(canonical);
                sub.unique_entities(canonical);
            }
        }
    }

    /// Re-keys entities under their canonical ids; the first entity to claim
    /// an id keeps it.
    fn remap_entity_ids(&mut self, canonical: &FxHashMap<EntityId, EntityId>) {
        let stale = self
            .entities
            .values()
            .any(|e| canonical.get(&e.id).is_some_and(|&c| c != e.id));
        if !stale {
            return;
        }
        let entities: Vec<Entity> = std::mem::take(&mut self.entities)
            .into_iter()
            .map(|(_, e)| e)
            .collect();
        self.index.clear();
        for mut entity in entities {
            if let Some(&id) = canonical.get(&entity.id) {
                entity.id = id;
            }
            self.add_entity(entity);
        }
    }

    /// Number of relations with at least one endpoint missing from the graph.
    pub fn dangling_relation_count(&self) -> usize {
        self.relations
            .iter()
            .filter(|r| !self.contains(r.source) || !self.contains(r.target))
            .count()
    }
}

impl PartialEq for Graph {
    /// Two graphs are equal when they hold equal entities (by identity, in
    /// any arena order) and identical relation sequences.
    fn eq(&self, other: &Self) -> bool {
        self.entity_count() == other.entity_count()
            && self.relations == other.relations
            && self
                .entities()
                .all(|e| other.entity(e.id).is_some_and(|o| o == e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(n: u128) -> Entity {
        Entity::new("Node").with_id(EntityId::from_u128(n))
    }

    fn id(n: u128) -> EntityId {
        EntityId::from_u128(n)
    }

    fn chain() -> Graph {
        let mut g = Graph::new();
        for n in 1..=3 {
            g.add_entity(node(n));
        }
        g.add_relation(Relation::new(id(1), id(2)));
        g.add_relation(Relation::new(id(2), id(3)));
        g.add_relation(Relation::new(id(1), id(3)));
        g
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let mut g = Graph::new();
        assert!(g.add_entity(node(1)));
        assert!(!g.add_entity(node(1).with_name("other")));
        assert_eq!(g.entity_count(), 1);
        assert_eq!(g.entity(id(1)).unwrap().name, "");
    }

    #[test]
    fn remove_entity_drops_touching_relations() {
        let mut g = chain();
        let removed = g.remove_entity(id(2)).unwrap();
        assert_eq!(removed.id, id(2));
        assert!(!g.contains(id(2)));
        assert_eq!(g.relations, vec![Relation::new(id(1), id(3))]);
        assert!(g.remove_entity(id(2)).is_none());
    }

    #[test]
    fn destinations_and_incoming() {
        let g = chain();
        assert_eq!(g.destinations(id(1)), vec![id(2), id(3)]);
        assert_eq!(g.incoming(id(3)), vec![id(2), id(1)]);
        assert!(g.destinations(id(3)).is_empty());
    }

    #[test]
    fn unique_entities_rewrites_endpoints() {
        let mut g = chain();
        let mut canonical = FxHashMap::default();
        canonical.insert(id(3), id(2));
        g.unique_entities(&canonical);
        assert_eq!(g.relations[0], Relation::new(id(1), id(2)));
        assert_eq!(g.relations[1], Relation::new(id(2), id(2)));
        assert_eq!(g.relations[2], Relation::new(id(1), id(2)));
    }

    #[test]
    fn unique_entities_reaches_embedded_subgraphs() {
        let mut sub = Graph::new();
        sub.add_entity(node(2));
        sub.add_entity(node(3));
        sub.add_relation(Relation::new(id(3), id(2)));
        let mut g = chain();
        g.add_relation(Relation::spatial(id(1), id(3), None, Some(sub)));

        let mut canonical = FxHashMap::default();
        canonical.insert(id(3), id(2));
        g.unique_entities(&canonical);

        let rewritten = g.relations[3].subgraph().unwrap();
        assert_eq!(g.relations[3].target, id(2));
        assert_eq!(rewritten.entity_count(), 1);
        assert!(rewritten.contains(id(2)));
        assert!(!rewritten.contains(id(3)));
        assert_eq!(rewritten.relations, vec![Relation::new(id(2), id(2))]);
        assert_eq!(rewritten.dangling_relation_count(), 0);
    }

    #[test]
    fn retain_entities_filters_relations() {
        let mut g = chain();
        g.retain_entities(|e| e.id != id(1));
        assert_eq!(g.entity_count(), 2);
        assert_eq!(g.relations, vec![Relation::new(id(2), id(3))]);
    }

    #[test]
    fn dangling_relations_are_counted() {
        let mut g = chain();
        g.add_relation(Relation::new(id(3), id(42)));
        assert_eq!(g.dangling_relation_count(), 1);
    }

    #[test]
    fn equality_ignores_arena_order() {
        let a = chain();
        let mut b = Graph::new();
        for n in (1..=3).rev() {
            b.add_entity(node(n));
        }
        b.relations = a.relations.clone();
        assert_eq!(a, b);
        b.relations.pop();
        assert_ne!(a, b);
    }
}
