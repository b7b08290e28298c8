// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Adjacency and breadth-first depth queries.

use std::collections::VecDeque;

use rustc_hash::{FxHashMap, FxHashSet};

use fabric_core::{DiagnosticSink, EntityId, TracingSink};

use crate::graph::Graph;
use crate::relation::RelationDirection;

/// Entity id → neighbour ids, without duplicates.
pub type Adjacency = FxHashMap<EntityId, Vec<EntityId>>;

/// Builds the adjacency map of `graph` for `direction`.
///
/// Every entity gets an entry, possibly empty. Neighbours follow relation
/// order; with `Both`, incoming neighbours come before outgoing ones.
/// Relations with an endpoint missing from the graph are skipped.
pub fn adjacency(graph: &Graph, direction: RelationDirection, sink: &dyn DiagnosticSink) -> Adjacency {
    if graph.entity_count() == 0 {
        sink.warn("adjacency requested for an empty graph".to_string());
        return Adjacency::default();
    }

    let mut outgoing: FxHashMap<EntityId, Vec<EntityId>> = FxHashMap::default();
    let mut incoming: FxHashMap<EntityId, Vec<EntityId>> = FxHashMap::default();
    let mut dangling = 0usize;
    for r in &graph.relations {
        if !graph.contains(r.source) || !graph.contains(r.target) {
            dangling += 1;
            continue;
        }
        outgoing.entry(r.source).or_default().push(r.target);
        incoming.entry(r.target).or_default().push(r.source);
    }
    if dangling > 0 {
        tracing::debug!(dangling, "skipped relations with missing endpoints");
    }

    let empty = Vec::new();
    graph
        .entities()
        .map(|e| {
            let out = outgoing.get(&e.id).unwrap_or(&empty);
            let inc = incoming.get(&e.id).unwrap_or(&empty);
            let candidates: Vec<EntityId> = match direction {
                RelationDirection::Forward => out.clone(),
                RelationDirection::Backward => inc.clone(),
                RelationDirection::Both => inc.iter().chain(out.iter()).copied().collect(),
            };
            let mut seen = FxHashSet::default();
            let neighbours = candidates.into_iter().filter(|n| seen.insert(*n)).collect();
            (e.id, neighbours)
        })
        .collect()
}

/// Breadth-first hop counts from `start`.
///
/// Only reachable entities appear; `start` maps to 0. An unknown start is
/// reported as an error and yields an empty map.
pub fn depth_dictionary(
    adjacency: &Adjacency,
    start: EntityId,
    sink: &dyn DiagnosticSink,
) -> FxHashMap<EntityId, usize> {
    let mut depths = FxHashMap::default();
    if !adjacency.contains_key(&start) {
        sink.error(format!("start entity {start} is not part of the graph"));
        return depths;
    }

    let mut queue = VecDeque::new();
    depths.insert(start, 0);
    queue.push_back(start);
    while let Some(node) = queue.pop_front() {
        let depth = depths[&node];
        for &next in adjacency.get(&node).into_iter().flatten() {
            if !depths.contains_key(&next) {
                depths.insert(next, depth + 1);
                queue.push_back(next);
            }
        }
    }
    depths
}

impl Graph {
    /// [`adjacency`] reporting through `tracing`.
    pub fn adjacency(&self, direction: RelationDirection) -> Adjacency {
        adjacency(self, direction, &TracingSink)
    }

    /// [`depth_dictionary`] over the adjacency for `direction`.
    pub fn depth_dictionary(
        &self,
        start: EntityId,
        direction: RelationDirection,
        sink: &dyn DiagnosticSink,
    ) -> FxHashMap<EntityId, usize> {
        depth_dictionary(&adjacency(self, direction, sink), start, sink)
    }
}
