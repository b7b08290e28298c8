// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Fragments: typed side-channel metadata blocks attached to entities.
//!
//! Two fragment families are load-bearing for the engines built on this
//! crate:
//! - [`DependencyFragment`] declares relations to other entities and is
//!   expanded into graph relations.
//! - [`HashFragment`] records the current and previous content hash used
//!   by revision diffing.
//!
//! Fragments are a closed sum type. Tags that a newer producer may emit are
//! still accepted on deserialization and land in the `Unknown` arms so that
//! consumers can apply their documented fallback.

use serde::{Deserialize, Serialize};

use crate::geometry::Curve;
use crate::id::EntityId;
use crate::value::Dictionary;

/// Declares the relation(s) an entity implies to other entities.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum DependencyFragment {
    /// The owner consumes every listed input.
    Inputs { inputs: Vec<EntityId> },
    /// The owner sits between an input and an output.
    InputOutput { input: EntityId, output: EntityId },
    /// Explicit source/target pair, independent of the owner.
    Dependency { source: EntityId, target: EntityId },
    /// Source/target pair annotated with an ordered process list.
    Process {
        source: EntityId,
        target: EntityId,
        processes: Vec<EntityId>,
    },
    /// Source/target pair annotated with a connecting curve.
    Spatial {
        source: EntityId,
        target: EntityId,
        curve: Option<Curve>,
    },
    /// Any dependency kind this crate does not know about.
    #[serde(other)]
    Unknown,
}

/// Current content hash and, for revisions, the hash it replaces.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HashFragment {
    pub hash: String,
    pub previous_hash: Option<String>,
}

/// Marks an entity as part of one or more display groups.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ProjectionFragment {
    pub group_names: Vec<String>,
}

/// Free-form named metadata.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CustomFragment {
    pub name: String,
    pub data: Dictionary,
}

/// Any fragment an entity can carry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Fragment {
    Dependency(DependencyFragment),
    Hash(HashFragment),
    Projection(ProjectionFragment),
    Custom(CustomFragment),
}

/// Discriminant for fragment types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FragmentType {
    Dependency,
    Hash,
    Projection,
    Custom,
}

impl FragmentType {
    /// Returns the type name as used in the serialized `type` tag.
    pub fn as_str(&self) -> &'static str {
        match self {
            FragmentType::Dependency => "Dependency",
            FragmentType::Hash => "Hash",
            FragmentType::Projection => "Projection",
            FragmentType::Custom => "Custom",
        }
    }
}

impl Fragment {
    /// Returns the discriminant of this fragment.
    pub fn fragment_type(&self) -> FragmentType {
        match self {
            Fragment::Dependency(_) => FragmentType::Dependency,
            Fragment::Hash(_) => FragmentType::Hash,
            Fragment::Projection(_) => FragmentType::Projection,
            Fragment::Custom(_) => FragmentType::Custom,
        }
    }
}

impl From<DependencyFragment> for Fragment {
    fn from(f: DependencyFragment) -> Self {
        Fragment::Dependency(f)
    }
}

impl From<HashFragment> for Fragment {
    fn from(f: HashFragment) -> Self {
        Fragment::Hash(f)
    }
}

impl From<ProjectionFragment> for Fragment {
    fn from(f: ProjectionFragment) -> Self {
        Fragment::Projection(f)
    }
}

impl From<CustomFragment> for Fragment {
    fn from(f: CustomFragment) -> Self {
        Fragment::Custom(f)
    }
}
