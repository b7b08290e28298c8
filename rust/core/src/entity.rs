// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The entity: a uniquely identified domain object with properties,
//! optional geometry and an open set of fragments.

use serde::{Deserialize, Serialize};

use crate::fragment::{DependencyFragment, Fragment, FragmentType, HashFragment, ProjectionFragment};
use crate::geometry::{Geometry, Point};
use crate::id::EntityId;
use crate::value::{DictValue, Dictionary};

/// A domain object participating in graphs and revisions.
///
/// # Example
///
/// ```
/// use fabric_core::{Entity, Point};
///
/// let node = Entity::new("Node")
///     .with_name("junction")
///     .with_point(Point::new(1.0, 2.0, 0.0));
///
/// assert!(node.is_geometric());
/// assert_eq!(node.name, "junction");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    pub id: EntityId,
    #[serde(default)]
    pub name: String,
    /// Free type label, e.g. `"Node"`, `"Bar"`, `"Space"`.
    #[serde(default)]
    pub kind: String,
    #[serde(default)]
    pub properties: Dictionary,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub geometry: Option<Geometry>,
    #[serde(default)]
    pub fragments: Vec<Fragment>,
}

impl Entity {
    /// Creates an empty entity of the given kind with a fresh identifier.
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            id: EntityId::new(),
            name: String::new(),
            kind: kind.into(),
            properties: Dictionary::new(),
            geometry: None,
            fragments: Vec::new(),
        }
    }

    pub fn with_id(mut self, id: EntityId) -> Self {
        self.id = id;
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<DictValue>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    pub fn with_point(mut self, point: Point) -> Self {
        self.geometry = Some(Geometry::Point(point));
        self
    }

    pub fn with_geometry(mut self, geometry: Geometry) -> Self {
        self.geometry = Some(geometry);
        self
    }

    pub fn with_fragment(mut self, fragment: impl Into<Fragment>) -> Self {
        self.fragments.push(fragment.into());
        self
    }

    /// Returns a deep copy carrying a fresh identifier.
    pub fn clone_with_new_id(&self) -> Self {
        let mut copy = self.clone();
        copy.id = EntityId::new();
        copy
    }

    /// Returns `true` if the entity exposes point or curve geometry.
    pub fn is_geometric(&self) -> bool {
        self.geometry.is_some()
    }

    /// Returns the point position, if the entity is point-like.
    pub fn position(&self) -> Option<Point> {
        self.geometry.as_ref().and_then(|g| g.as_point().copied())
    }

    /// Adds a fragment, replacing an existing fragment of the same type.
    ///
    /// Custom fragments are replaced by name rather than by type.
    pub fn add_or_replace_fragment(&mut self, fragment: impl Into<Fragment>) {
        let fragment = fragment.into();
        let existing = self.fragments.iter().position(|f| match (f, &fragment) {
            (Fragment::Custom(a), Fragment::Custom(b)) => a.name == b.name,
            _ => f.fragment_type() == fragment.fragment_type(),
        });
        match existing {
            Some(i) => self.fragments[i] = fragment,
            None => self.fragments.push(fragment),
        }
    }

    /// Removes every fragment of the given type. Returns how many were removed.
    pub fn remove_fragments(&mut self, ty: FragmentType) -> usize {
        let before = self.fragments.len();
        self.fragments.retain(|f| f.fragment_type() != ty);
        before - self.fragments.len()
    }

    /// Returns every dependency fragment, in attachment order.
    pub fn dependencies(&self) -> impl Iterator<Item = &DependencyFragment> {
        self.fragments.iter().filter_map(|f| match f {
            Fragment::Dependency(d) => Some(d),
            _ => None,
        })
    }

    /// Returns the hash fragment, if any.
    pub fn hash_fragment(&self) -> Option<&HashFragment> {
        self.fragments.iter().find_map(|f| match f {
            Fragment::Hash(h) => Some(h),
            _ => None,
        })
    }

    /// Returns the projection fragment, if any.
    pub fn projection_fragment(&self) -> Option<&ProjectionFragment> {
        self.fragments.iter().find_map(|f| match f {
            Fragment::Projection(p) => Some(p),
            _ => None,
        })
    }
}
