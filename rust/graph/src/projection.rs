// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Filtered views of a graph.
//!
//! A projection never modifies its input; it works on a copy.

use serde::{Deserialize, Serialize};

use fabric_core::DiagnosticSink;

use crate::graph::Graph;

/// How to project a graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum Projection {
    /// Keep only entities with geometry.
    Geometric,
    /// Keep only entities tagged with a projection fragment.
    Graphical,
    /// Keep everything.
    Spatial,
    #[serde(other)]
    Unknown,
}

/// Applies `projection` to a copy of `graph`.
///
/// Relations touching a dropped entity are dropped with it. An unrecognized
/// projection is reported as an error and yields an empty graph.
pub fn project(graph: &Graph, projection: Projection, sink: &dyn DiagnosticSink) -> Graph {
    let mut projected = graph.clone();
    match projection {
        Projection::Geometric => projected.retain_entities(|e| e.is_geometric()),
        Projection::Graphical => projected.retain_entities(|e| e.projection_fragment().is_some()),
        Projection::Spatial => {}
        Projection::Unknown => {
            sink.error("unrecognized projection".to_string());
            return Graph::new();
        }
    }
    tracing::debug!(
        ?projection,
        before = graph.entity_count(),
        after = projected.entity_count(),
        "projected graph"
    );
    projected
}

impl Graph {
    pub fn project(&self, projection: Projection, sink: &dyn DiagnosticSink) -> Graph {
        project(self, projection, sink)
    }
}
