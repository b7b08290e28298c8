// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Directed relations between entities and their extraction from
//! dependency fragments and links.
//!
//! A relation only stores endpoint identifiers. Payload-carrying variants
//! may embed a small sub-graph; that sub-graph holds its own copies of the
//! entities it mentions and refers to them by identifier, so a relation
//! never owns its endpoints.

use serde::{Deserialize, Serialize};

use fabric_core::{Curve, DependencyFragment, Entity, EntityId, Geometry};

use crate::graph::Graph;

/// Direction in which relations may be traversed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum RelationDirection {
    /// Source to target.
    #[default]
    Forward,
    /// Target to source.
    Backward,
    /// Both ways.
    Both,
}

/// Payload carried by a relation.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum RelationKind {
    #[default]
    Plain,
    /// Ordered list of intermediate processes between source and target.
    Process { processes: Vec<EntityId> },
    /// Geometric connection, optionally with the connector's own sub-graph.
    Spatial {
        curve: Option<Curve>,
        subgraph: Option<Graph>,
    },
}

/// A directed edge between two entity identities.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Relation {
    pub source: EntityId,
    pub target: EntityId,
    #[serde(default)]
    pub kind: RelationKind,
}

impl Relation {
    /// Creates a plain relation.
    pub fn new(source: EntityId, target: EntityId) -> Self {
        Self {
            source,
            target,
            kind: RelationKind::Plain,
        }
    }

    /// Creates a process-annotated relation.
    pub fn process(source: EntityId, target: EntityId, processes: Vec<EntityId>) -> Self {
        Self {
            source,
            target,
            kind: RelationKind::Process { processes },
        }
    }

    /// Creates a spatial relation.
    pub fn spatial(
        source: EntityId,
        target: EntityId,
        curve: Option<Curve>,
        subgraph: Option<Graph>,
    ) -> Self {
        Self {
            source,
            target,
            kind: RelationKind::Spatial { curve, subgraph },
        }
    }

    /// Returns a copy with source and target swapped.
    ///
    /// A spatial curve is reversed with it; process lists keep their order.
    pub fn reversed(&self) -> Self {
        let kind = match &self.kind {
            RelationKind::Spatial { curve, subgraph } => RelationKind::Spatial {
                curve: curve.as_ref().map(Curve::reversed),
                subgraph: subgraph.clone(),
            },
            other => other.clone(),
        };
        Self {
            source: self.target,
            target: self.source,
            kind,
        }
    }

    /// Returns `true` if either endpoint is `id`.
    pub fn touches(&self, id: EntityId) -> bool {
        self.source == id || self.target == id
    }

    /// Expands this relation for a traversal direction.
    ///
    /// `Both` yields the relation followed by its reversed duplicate.
    pub fn with_direction(self, direction: RelationDirection) -> Vec<Relation> {
        match direction {
            RelationDirection::Forward => vec![self],
            RelationDirection::Backward => vec![self.reversed()],
            RelationDirection::Both => {
                let back = self.reversed();
                vec![self, back]
            }
        }
    }

    /// Returns the embedded sub-graph, if any.
    pub fn subgraph(&self) -> Option<&Graph> {
        match &self.kind {
            RelationKind::Spatial { subgraph, .. } => subgraph.as_ref(),
            _ => None,
        }
    }
}

// =============================================================================
// Dependency fragments
// =============================================================================

/// Expands one dependency fragment owned by `owner` into relations.
///
/// - `Inputs`: every input → owner
/// - `InputOutput`: input → owner, owner → output
/// - `Dependency`: source → target
/// - `Process`: source → target with the process list
/// - `Spatial`: source → target with the curve
/// - `Unknown`: nothing
pub fn relations_from_dependency(owner: EntityId, dependency: &DependencyFragment) -> Vec<Relation> {
    match dependency {
        DependencyFragment::Inputs { inputs } => inputs
            .iter()
            .map(|&input| Relation::new(input, owner))
            .collect(),
        DependencyFragment::InputOutput { input, output } => vec![
            Relation::new(*input, owner),
            Relation::new(owner, *output),
        ],
        DependencyFragment::Dependency { source, target } => vec![Relation::new(*source, *target)],
        DependencyFragment::Process {
            source,
            target,
            processes,
        } => vec![Relation::process(*source, *target, processes.clone())],
        DependencyFragment::Spatial {
            source,
            target,
            curve,
        } => vec![Relation::spatial(*source, *target, curve.clone(), None)],
        DependencyFragment::Unknown => {
            tracing::debug!(%owner, "ignoring unrecognized dependency fragment");
            Vec::new()
        }
    }
}

/// Expands every dependency fragment of every entity, in entity order.
pub fn relations_from_entities(entities: &[Entity]) -> Vec<Relation> {
    entities
        .iter()
        .flat_map(|e| {
            e.dependencies()
                .flat_map(move |d| relations_from_dependency(e.id, d))
        })
        .collect()
}

// =============================================================================
// Links
// =============================================================================

/// A connector between two endpoint entities, e.g. a duct between two
/// junctions or a bar between two structural nodes.
#[derive(Debug, Clone, PartialEq)]
pub struct Link {
    pub id: EntityId,
    pub name: String,
    pub start: Entity,
    pub end: Entity,
    /// Connector geometry. When absent, a straight line between the endpoint
    /// positions is used if both endpoints are point-like.
    pub curve: Option<Curve>,
}

impl Link {
    pub fn new(start: Entity, end: Entity) -> Self {
        Self {
            id: EntityId::new(),
            name: String::new(),
            start,
            end,
            curve: None,
        }
    }

    pub fn with_curve(mut self, curve: Curve) -> Self {
        self.curve = Some(curve);
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Connector geometry, falling back to a line between endpoint positions.
    pub fn geometry(&self) -> Option<Curve> {
        self.curve.clone().or_else(|| {
            let start = self.start.position()?;
            let end = self.end.position()?;
            Some(Curve::line(start, end))
        })
    }

    /// The synthetic node standing for the connector itself.
    pub fn as_entity(&self) -> Entity {
        let mut node = Entity::new("Link").with_id(self.id).with_name(self.name.clone());
        node.geometry = self.geometry().map(Geometry::Curve);
        node
    }

    /// Sub-graph holding both endpoints and the connector node, joined to
    /// the connector by relations in both directions.
    fn subgraph(&self) -> Graph {
        let connector = self.as_entity();
        let mut graph = Graph::new();
        graph.add_entity(self.start.clone());
        graph.add_entity(self.end.clone());
        graph.add_entity(connector);
        graph.add_relation(Relation::new(self.start.id, self.id));
        graph.add_relation(Relation::new(self.id, self.start.id));
        graph.add_relation(Relation::new(self.end.id, self.id));
        graph.add_relation(Relation::new(self.id, self.end.id));
        graph
    }
}

/// Expands a link into one or two spatial relations.
///
/// The forward relation runs start → end and carries the connector curve and
/// sub-graph. `Backward` yields only its reverse, `Both` yields both.
pub fn relations_from_link(link: &Link, direction: RelationDirection) -> Vec<Relation> {
    let forward = Relation::spatial(
        link.start.id,
        link.end.id,
        link.geometry(),
        Some(link.subgraph()),
    );
    forward.with_direction(direction)
}

/// Expands every link, in order.
pub fn relations_from_links(links: &[Link], direction: RelationDirection) -> Vec<Relation> {
    links
        .iter()
        .flat_map(|l| relations_from_link(l, direction))
        .collect()
}
