// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! # Fabric Core
//!
//! Entity model for building-engineering data: uniquely identified domain
//! objects carrying typed properties, optional point/curve geometry and an
//! open set of fragments (dependency metadata, content hashes, projection
//! groups, custom blocks).
//!
//! The crate also defines the collaborators the engines consume:
//!
//! - [`IdentityOracle`]: tolerance-based entity equivalence
//! - [`PropertyOracle`]: property enumeration and dotted-path lookup
//! - [`DiagnosticSink`]: where non-fatal warnings and errors go
//!
//! Deep copies are plain `Clone`: every model type owns its data.

pub mod config;
pub mod diagnostics;
pub mod entity;
pub mod error;
pub mod fragment;
pub mod geometry;
pub mod id;
pub mod oracle;
pub mod value;

pub use config::MatchConfig;
pub use diagnostics::{Diagnostic, DiagnosticLog, DiagnosticSink, Severity, TracingSink};
pub use entity::Entity;
pub use error::{Error, Result};
pub use fragment::{
    CustomFragment, DependencyFragment, Fragment, FragmentType, HashFragment, ProjectionFragment,
};
pub use geometry::{BoundingBox, Curve, Geometry, Point};
pub use id::EntityId;
pub use oracle::{
    are_equivalent, IdentityOracle, PropertyOracle, PropertyTreeOracle, SerdePropertyOracle,
};
pub use value::{DictValue, Dictionary};

/// Property tree value type used by the oracles.
pub use serde_json::Value;
