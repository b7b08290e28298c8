// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! JSON persistence for graphs.
//!
//! Arena keys are an in-memory detail; a snapshot lists entities in arena
//! order and relations in insertion order, both keyed by [`EntityId`].

use serde::{Deserialize, Serialize};

use fabric_core::Entity;

use crate::error::Result;
use crate::graph::Graph;
use crate::relation::Relation;

/// Portable representation of a [`Graph`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GraphSnapshot {
    #[serde(default)]
    pub entities: Vec<Entity>,
    #[serde(default)]
    pub relations: Vec<Relation>,
}

impl From<Graph> for GraphSnapshot {
    fn from(graph: Graph) -> Self {
        Self {
            entities: graph.entities().cloned().collect(),
            relations: graph.relations,
        }
    }
}

impl From<GraphSnapshot> for Graph {
    fn from(snapshot: GraphSnapshot) -> Self {
        let mut graph = Graph::new();
        for entity in snapshot.entities {
            let id = entity.id;
            if !graph.add_entity(entity) {
                tracing::warn!(%id, "duplicate entity in graph snapshot, keeping first");
            }
        }
        graph.relations = snapshot.relations;
        graph
    }
}

impl Graph {
    /// Serializes the graph to a pretty-printed JSON string.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Restores a graph from [`Graph::to_json`] output.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}
