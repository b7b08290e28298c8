// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! # Fabric Graph
//!
//! Entity/relation graphs for building-engineering models.
//!
//! - [`GraphBuilder::build`]: deduplicate entities by tolerance and merge
//!   explicit relations with those implied by dependency fragments
//! - [`GraphBuilder::from_curves`], [`GraphBuilder::random`],
//!   [`GraphBuilder::grid`]: geometric constructors
//! - [`adjacency`] and [`depth_dictionary`]: traversal queries
//! - [`project`]: filtered copies of a graph
//!
//! ```
//! use fabric_core::{Entity, Point};
//! use fabric_graph::{GraphBuilder, Relation, RelationDirection};
//!
//! let a = Entity::new("Junction").with_point(Point::new(0.0, 0.0, 0.0));
//! let twin = Entity::new("Junction").with_point(Point::new(0.0, 0.0, 0.0));
//! let b = Entity::new("Junction").with_point(Point::new(5.0, 0.0, 0.0));
//!
//! let graph = GraphBuilder::default().build(
//!     &[a.clone(), twin.clone(), b.clone()],
//!     &[Relation::new(twin.id, b.id)],
//! );
//!
//! assert_eq!(graph.entity_count(), 2);
//! assert_eq!(graph.destinations(a.id), vec![b.id]);
//! let adjacency = graph.adjacency(RelationDirection::Forward);
//! assert_eq!(adjacency[&a.id], vec![b.id]);
//! ```

pub mod builder;
pub mod error;
pub mod generators;
pub mod graph;
pub mod matcher;
pub mod names;
pub mod projection;
pub mod query;
pub mod relation;
pub mod serialization;
pub mod spatial;

pub use builder::{BuildOptions, GraphBuilder, DEFAULT_SNAPPING_TOLERANCE};
pub use error::{Error, Result};
pub use generators::GridSize;
pub use graph::{EntityKey, Graph};
pub use matcher::{match_entities, EntityMatches};
pub use names::assign_unique_names;
pub use projection::{project, Projection};
pub use query::{adjacency, depth_dictionary, Adjacency};
pub use relation::{
    relations_from_dependency, relations_from_entities, relations_from_link, relations_from_links,
    Link, Relation, RelationDirection, RelationKind,
};
pub use serialization::GraphSnapshot;
pub use spatial::SpatialIndex;
