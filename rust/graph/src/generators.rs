// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Synthetic graphs for testing and benchmarking.
//!
//! Randomness always comes from the caller's generator so a seeded
//! generator reproduces the same graph.

use rand::seq::SliceRandom;
use rand::Rng;

use fabric_core::{BoundingBox, Curve, Entity, Point};

use crate::builder::{place, random_point, BuildOptions, GraphBuilder};
use crate::graph::Graph;
use crate::names::assign_unique_names;
use crate::relation::{Relation, RelationDirection};

/// Number of cells along each axis of a grid graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridSize {
    pub width: usize,
    pub length: usize,
    pub height: usize,
}

impl GridSize {
    pub fn new(width: usize, length: usize, height: usize) -> Self {
        Self {
            width,
            length,
            height,
        }
    }

    pub fn cell_count(&self) -> usize {
        self.width * self.length * self.height
    }

    fn index(&self, x: usize, y: usize, z: usize) -> usize {
        (z * self.length + y) * self.width + x
    }

    /// Face-adjacent cells of `(x, y, z)`.
    fn neighbours(&self, x: usize, y: usize, z: usize) -> Vec<usize> {
        let mut out = Vec::with_capacity(6);
        if x > 0 {
            out.push(self.index(x - 1, y, z));
        }
        if x + 1 < self.width {
            out.push(self.index(x + 1, y, z));
        }
        if y > 0 {
            out.push(self.index(x, y - 1, z));
        }
        if y + 1 < self.length {
            out.push(self.index(x, y + 1, z));
        }
        if z > 0 {
            out.push(self.index(x, y, z - 1));
        }
        if z + 1 < self.height {
            out.push(self.index(x, y, z + 1));
        }
        out
    }
}

fn link(from: &Entity, to: &Entity, direction: RelationDirection) -> Vec<Relation> {
    let curve = match (from.position(), to.position()) {
        (Some(a), Some(b)) => Some(Curve::line(a, b)),
        _ => None,
    };
    Relation::spatial(from.id, to.id, curve, None).with_direction(direction)
}

impl<'a> GraphBuilder<'a> {
    /// Random proximity graph.
    ///
    /// Up to `count` copies of `prototype` are scattered uniformly inside
    /// `bbox`; a point within the snapping tolerance of an earlier one is
    /// dropped. Each node is then related to its `branching` nearest
    /// neighbours, or to all others when fewer are available.
    pub fn random<R: Rng>(
        &self,
        count: usize,
        branching: usize,
        bbox: &BoundingBox,
        prototype: &Entity,
        options: &BuildOptions,
        rng: &mut R,
    ) -> Graph {
        if count == 0 {
            self.sink.warn("random graph requested with no entities".to_string());
            return Graph::new();
        }

        let points: Vec<Point> = (0..count).map(|_| random_point(bbox, rng)).collect();
        let nodes = self.place_nodes(points, prototype, options.snapping_tolerance);
        let positions: Vec<Point> = nodes
            .iter()
            .map(|e| e.position().unwrap_or_default())
            .collect();

        let k = branching.min(nodes.len().saturating_sub(1));
        if k < branching {
            tracing::debug!(branching, available = k, "clamped branching factor");
        }

        let mut relations = Vec::with_capacity(nodes.len() * k);
        for (i, node) in nodes.iter().enumerate() {
            let mut others: Vec<(usize, f64)> = positions
                .iter()
                .enumerate()
                .filter(|&(j, _)| j != i)
                .map(|(j, p)| (j, p.distance_squared(&positions[i])))
                .collect();
            others.sort_by(|a, b| a.1.total_cmp(&b.1).then(a.0.cmp(&b.0)));
            for &(j, _) in others.iter().take(k) {
                relations.extend(link(node, &nodes[j], options.direction));
            }
        }

        let mut graph = Graph::new();
        for node in nodes {
            graph.add_entity(node);
        }
        graph.extend_relations(relations);
        assign_unique_names(graph.entities_mut());
        graph
    }

    /// Random grid graph.
    ///
    /// A copy of `prototype` sits at every cell corner `cell_size` apart.
    /// Each cell is related to a random selection of between two and all of
    /// its face-adjacent neighbours; cells with at most two neighbours get
    /// all of them.
    pub fn grid<R: Rng>(
        &self,
        size: GridSize,
        cell_size: f64,
        prototype: &Entity,
        direction: RelationDirection,
        rng: &mut R,
    ) -> Graph {
        if size.cell_count() == 0 {
            self.sink
                .warn(format!("grid graph requested with a zero dimension: {size:?}"));
            return Graph::new();
        }
        if !(cell_size.is_finite() && cell_size > 0.0) {
            self.sink
                .warn(format!("grid graph requested with invalid cell size {cell_size}"));
            return Graph::new();
        }

        let mut nodes = Vec::with_capacity(size.cell_count());
        for z in 0..size.height {
            for y in 0..size.length {
                for x in 0..size.width {
                    let p = Point::new(
                        x as f64 * cell_size,
                        y as f64 * cell_size,
                        z as f64 * cell_size,
                    );
                    nodes.push(place(prototype, p));
                }
            }
        }

        let mut relations = Vec::new();
        for z in 0..size.height {
            for y in 0..size.length {
                for x in 0..size.width {
                    let here = size.index(x, y, z);
                    let neighbours = size.neighbours(x, y, z);
                    let chosen: Vec<usize> = if neighbours.len() <= 2 {
                        neighbours
                    } else {
                        let n = rng.gen_range(2..=neighbours.len());
                        neighbours.choose_multiple(rng, n).copied().collect()
                    };
                    for j in chosen {
                        relations.extend(link(&nodes[here], &nodes[j], direction));
                    }
                }
            }
        }

        let mut graph = Graph::new();
        for node in nodes {
            graph.add_entity(node);
        }
        graph.extend_relations(relations);
        assign_unique_names(graph.entities_mut());
        graph
    }
}
