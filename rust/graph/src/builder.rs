// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Graph construction from entities, relations and curves.
//!
//! [`GraphBuilder::build`] is the deduplicating path: entities are matched
//! into equivalence classes, relations implied by dependency fragments are
//! added to the explicit ones, and every relation endpoint is rewritten to
//! its class representative. Inputs are never mutated; the builder works on
//! copies.

use fabric_core::{
    BoundingBox, Curve, DiagnosticSink, Entity, EntityId, IdentityOracle, MatchConfig, Point,
    PropertyTreeOracle, TracingSink,
};

use crate::graph::Graph;
use crate::matcher::match_entities;
use crate::names::assign_unique_names;
use crate::relation::{relations_from_entities, Relation, RelationDirection};
use crate::spatial::SpatialIndex;

/// Default snapping tolerance for curve endpoints.
pub const DEFAULT_SNAPPING_TOLERANCE: f64 = 1e-6;

/// Options shared by the geometric constructors.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BuildOptions {
    /// Points closer than this are the same node.
    pub snapping_tolerance: f64,
    pub direction: RelationDirection,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            snapping_tolerance: DEFAULT_SNAPPING_TOLERANCE,
            direction: RelationDirection::Forward,
        }
    }
}

/// Builds graphs using an identity oracle and a diagnostic sink.
#[derive(Clone, Copy)]
pub struct GraphBuilder<'a> {
    pub(crate) config: &'a MatchConfig,
    pub(crate) oracle: &'a dyn IdentityOracle,
    pub(crate) sink: &'a dyn DiagnosticSink,
}

static DEFAULT_MATCH_CONFIG: MatchConfig = MatchConfig {
    properties_to_consider: Vec::new(),
    decimal_places: fabric_core::config::DEFAULT_DECIMAL_PLACES,
};

impl Default for GraphBuilder<'static> {
    /// Property-tree identity, default rounding, diagnostics to `tracing`.
    fn default() -> Self {
        Self {
            config: &DEFAULT_MATCH_CONFIG,
            oracle: &PropertyTreeOracle,
            sink: &TracingSink,
        }
    }
}

impl<'a> GraphBuilder<'a> {
    pub fn new(
        config: &'a MatchConfig,
        oracle: &'a dyn IdentityOracle,
        sink: &'a dyn DiagnosticSink,
    ) -> Self {
        Self {
            config,
            oracle,
            sink,
        }
    }

    /// Builds a deduplicated graph.
    ///
    /// 1. Entities embedded in relation sub-graphs join the entity list.
    /// 2. Entities are matched; the first of each class represents it.
    /// 3. Relations derived from dependency fragments follow the explicit ones.
    /// 4. Relation endpoints are rewritten to representatives, including
    ///    those inside embedded sub-graphs.
    /// 5. Display names are made unique.
    ///
    /// No entities at all is reported as a warning and gives an empty graph.
    pub fn build(&self, entities: &[Entity], relations: &[Relation]) -> Graph {
        let mut pool: Vec<Entity> = entities.to_vec();
        for relation in relations {
            if let Some(sub) = relation.subgraph() {
                pool.extend(sub.entities().cloned());
            }
        }
        if pool.is_empty() {
            self.sink.warn("no entities to build a graph from".to_string());
            return Graph::new();
        }

        let matches = match_entities(&pool, self.config, self.oracle);

        let mut graph = Graph::new();
        for representative in matches.representatives() {
            graph.add_entity(representative.clone());
        }
        graph.extend_relations(relations.iter().cloned());
        graph.extend_relations(relations_from_entities(&pool));
        graph.unique_entities(&matches.canonical_map());
        assign_unique_names(graph.entities_mut());

        let dangling = graph.dangling_relation_count();
        if dangling > 0 {
            self.sink.warn(format!(
                "{dangling} relation(s) reference entities missing from the graph"
            ));
        }

        tracing::debug!(
            inputs = pool.len(),
            entities = graph.entity_count(),
            relations = graph.relation_count(),
            "built graph"
        );
        graph
    }

    /// Builds a graph whose relations are `curves`.
    ///
    /// Each curve endpoint snaps to the nearest point-like entity within the
    /// snapping tolerance, existing ones from `entities` first. Otherwise a
    /// copy of `prototype` is placed there. Curves without endpoints are
    /// reported and skipped.
    pub fn from_curves(
        &self,
        curves: &[Curve],
        prototype: &Entity,
        entities: &[Entity],
        options: &BuildOptions,
    ) -> Graph {
        let mut nodes = NodeSnapper::new(entities, options.snapping_tolerance);
        let mut relations = Vec::new();

        for (i, curve) in curves.iter().enumerate() {
            let (Some(start), Some(end)) = (curve.start_point(), curve.end_point()) else {
                self.sink.warn(format!("curve {i} has no endpoints, skipped"));
                continue;
            };
            let source = nodes.find_or_create(start, prototype);
            let target = nodes.find_or_create(end, prototype);
            relations.extend(
                Relation::spatial(source, target, Some(curve.clone()), None)
                    .with_direction(options.direction),
            );
        }

        let mut graph = Graph::new();
        for entity in nodes.into_entities() {
            graph.add_entity(entity);
        }
        graph.extend_relations(relations);
        assign_unique_names(graph.entities_mut());
        graph
    }

    /// Places copies of `prototype` at `points`, skipping any point within the
    /// snapping tolerance of an earlier one.
    pub(crate) fn place_nodes(
        &self,
        points: impl IntoIterator<Item = Point>,
        prototype: &Entity,
        tolerance: f64,
    ) -> Vec<Entity> {
        let mut nodes = NodeSnapper::new(&[], tolerance);
        for point in points {
            if !nodes.contains_near(&point) {
                nodes.create(point, prototype);
            }
        }
        nodes.into_entities()
    }
}

/// Copy of `prototype` with a fresh identity positioned at `point`.
pub(crate) fn place(prototype: &Entity, point: Point) -> Entity {
    prototype.clone_with_new_id().with_point(point)
}

/// Uniform random point inside `bbox`.
pub(crate) fn random_point(bbox: &BoundingBox, rng: &mut impl rand::Rng) -> Point {
    let mut axis = |lo: f64, hi: f64| if hi > lo { rng.gen_range(lo..=hi) } else { lo };
    Point::new(
        axis(bbox.min.x, bbox.max.x),
        axis(bbox.min.y, bbox.max.y),
        axis(bbox.min.z, bbox.max.z),
    )
}

/// Node pool with tolerance-based lookup.
struct NodeSnapper {
    entities: Vec<Entity>,
    /// Spatial-index slot → position in `entities`.
    slots: Vec<usize>,
    index: SpatialIndex,
    tolerance: f64,
}

impl NodeSnapper {
    fn new(existing: &[Entity], tolerance: f64) -> Self {
        let mut snapper = Self {
            entities: existing.to_vec(),
            slots: Vec::new(),
            index: SpatialIndex::new(tolerance),
            tolerance,
        };
        for (i, entity) in snapper.entities.iter().enumerate() {
            if let Some(p) = entity.position() {
                snapper.index.insert(p);
                snapper.slots.push(i);
            }
        }
        snapper
    }

    fn contains_near(&self, point: &Point) -> bool {
        self.index.nearest_within(point, self.tolerance).is_some()
    }

    fn find_or_create(&mut self, point: Point, prototype: &Entity) -> EntityId {
        match self.index.nearest_within(&point, self.tolerance) {
            Some(slot) => self.entities[self.slots[slot]].id,
            None => self.create(point, prototype),
        }
    }

    fn create(&mut self, point: Point, prototype: &Entity) -> EntityId {
        let entity = place(prototype, point);
        let id = entity.id;
        self.index.insert(point);
        self.slots.push(self.entities.len());
        self.entities.push(entity);
        id
    }

    fn into_entities(self) -> Vec<Entity> {
        self.entities
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::relation::{relations_from_link, Link};
    use fabric_core::{DependencyFragment, DiagnosticLog, PropertyTreeOracle};

    fn junction(x: f64) -> Entity {
        Entity::new("Junction").with_point(Point::new(x, 0.0, 0.0))
    }

    #[test]
    fn build_merges_equivalent_entities_and_rewrites_relations() {
        let a = junction(0.0);
        let a2 = junction(0.0);
        let b = junction(1.0);
        let relations = vec![Relation::new(a2.id, b.id), Relation::new(b.id, a.id)];

        let log = DiagnosticLog::new();
        let config = MatchConfig::default();
        let builder = GraphBuilder::new(&config, &PropertyTreeOracle, &log);
        let g = builder.build(&[a.clone(), a2.clone(), b.clone()], &relations);

        assert_eq!(g.entity_count(), 2);
        assert!(g.contains(a.id));
        assert!(!g.contains(a2.id));
        assert_eq!(g.relations[0], Relation::new(a.id, b.id));
        assert_eq!(g.relations[1], Relation::new(b.id, a.id));
        assert!(log.is_empty());
    }

    #[test]
    fn build_adds_dependency_relations() {
        let pump = Entity::new("Pump").with_name("p");
        let valve = Entity::new("Valve")
            .with_name("v")
            .with_fragment(DependencyFragment::Inputs {
                inputs: vec![pump.id],
            });
        let g = GraphBuilder::default().build(&[pump.clone(), valve.clone()], &[]);
        assert_eq!(g.relations, vec![Relation::new(pump.id, valve.id)]);
    }

    #[test]
    fn build_pulls_in_subgraph_entities() {
        let a = junction(0.0);
        let b = junction(4.0);
        let link = Link::new(a.clone(), b.clone());
        let rels = relations_from_link(&link, RelationDirection::Forward);

        let g = GraphBuilder::default().build(&[], &rels);
        assert_eq!(g.entity_count(), 3);
        assert!(g.contains(link.id));
        assert_eq!(g.destinations(a.id), vec![b.id]);
    }

    #[test]
    fn build_without_entities_warns() {
        let log = DiagnosticLog::new();
        let config = MatchConfig::default();
        let g = GraphBuilder::new(&config, &PropertyTreeOracle, &log).build(&[], &[]);
        assert!(g.is_empty());
        assert_eq!(log.warnings().len(), 1);
    }

    #[test]
    fn build_reports_dangling_relations() {
        let a = junction(0.0);
        let log = DiagnosticLog::new();
        let config = MatchConfig::default();
        let g = GraphBuilder::new(&config, &PropertyTreeOracle, &log)
            .build(&[a.clone()], &[Relation::new(a.id, EntityId::new())]);
        assert_eq!(g.relation_count(), 1);
        assert_eq!(log.warnings().len(), 1);
    }

    #[test]
    fn build_keeps_distinct_entities_without_relations() {
        let sensors: Vec<Entity> = ["T1", "T2", "T3"]
            .into_iter()
            .map(|tag| Entity::new("Sensor").with_property("tag", tag))
            .collect();

        let log = DiagnosticLog::new();
        let config = MatchConfig::default();
        let g = GraphBuilder::new(&config, &PropertyTreeOracle, &log).build(&sensors, &[]);

        assert_eq!(g.entity_count(), 3);
        assert_eq!(g.relation_count(), 0);
        assert!(sensors.iter().all(|s| g.contains(s.id)));
        assert!(log.is_empty());
    }

    #[test]
    fn build_rewrites_link_subgraphs_to_representatives() {
        let a = junction(0.0);
        let a2 = junction(0.0);
        let b = junction(4.0);
        let link = Link::new(a2.clone(), b.clone());
        let rels = relations_from_link(&link, RelationDirection::Forward);

        let log = DiagnosticLog::new();
        let config = MatchConfig::default();
        let g = GraphBuilder::new(&config, &PropertyTreeOracle, &log).build(&[a.clone()], &rels);

        assert!(!g.contains(a2.id));
        assert_eq!(g.relations[0].source, a.id);
        let sub = g.relations[0].subgraph().unwrap();
        assert!(sub.contains(a.id));
        assert!(!sub.contains(a2.id));
        assert!(sub.relations.iter().all(|r| r.source != a2.id && r.target != a2.id));
        assert_eq!(sub.dangling_relation_count(), 0);
        assert!(log.is_empty());
    }

    #[test]
    fn build_assigns_unique_names() {
        let g = GraphBuilder::default().build(&[junction(0.0), junction(1.0)], &[]);
        let mut names: Vec<String> = g.entities().map(|e| e.name.clone()).collect();
        names.sort();
        assert_eq!(names, vec!["Junction", "Junction (2)"]);
    }

    #[test]
    fn curves_snap_shared_endpoints() {
        let curves = vec![
            Curve::line(Point::new(0.0, 0.0, 0.0), Point::new(1.0, 0.0, 0.0)),
            Curve::line(Point::new(1.0, 0.0, 1e-9), Point::new(1.0, 1.0, 0.0)),
        ];
        let proto = Entity::new("Node");
        let g = GraphBuilder::default().from_curves(&curves, &proto, &[], &BuildOptions::default());
        assert_eq!(g.entity_count(), 3);
        assert_eq!(g.relation_count(), 2);
        assert_eq!(g.relations[0].target, g.relations[1].source);
    }

    #[test]
    fn curves_reuse_existing_entities_and_expand_direction() {
        let existing = junction(0.0);
        let curves = vec![Curve::line(Point::new(0.0, 0.0, 0.0), Point::new(2.0, 0.0, 0.0))];
        let options = BuildOptions {
            direction: RelationDirection::Both,
            ..Default::default()
        };
        let g = GraphBuilder::default().from_curves(
            &curves,
            &Entity::new("Node"),
            &[existing.clone()],
            &options,
        );
        assert_eq!(g.entity_count(), 2);
        assert_eq!(g.relation_count(), 2);
        assert_eq!(g.relations[0].source, existing.id);
        assert_eq!(g.relations[1].target, existing.id);
    }

    #[test]
    fn degenerate_curve_is_skipped() {
        let log = DiagnosticLog::new();
        let config = MatchConfig::default();
        let curves = vec![Curve::Polyline { points: Vec::new() }];
        let g = GraphBuilder::new(&config, &PropertyTreeOracle, &log).from_curves(
            &curves,
            &Entity::new("Node"),
            &[],
            &BuildOptions::default(),
        );
        assert_eq!(g.entity_count(), 0);
        assert_eq!(log.warnings().len(), 1);
    }
}
