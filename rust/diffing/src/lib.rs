// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! # Fabric Diffing
//!
//! Content hashing and revision diffing for building-engineering objects.
//!
//! Objects are stamped with a [`HashFragment`](fabric_core::HashFragment)
//! when a revision is taken. Re-hashing an object keeps its old hash as the
//! previous hash, and that link is what the diff follows:
//!
//! ```
//! use fabric_core::Entity;
//! use fabric_diffing::{hash::set_hash_fragment, DiffConfig, DiffEngine, Revision};
//!
//! let config = DiffConfig::default();
//! let before = Revision::new(&[Entity::new("Room").with_name("X")], config.clone(), "v1");
//!
//! let mut renamed = before.objects()[0].clone();
//! renamed.name = "Y".into();
//! let after = Revision::from_hashed(
//!     vec![set_hash_fragment(&renamed, &config.distinct())],
//!     config.clone(),
//!     "v2",
//! );
//!
//! let diff = DiffEngine::default().diffing(&before, &after, &config)?;
//! assert_eq!(diff.updated.len(), 1);
//! assert!(diff.created.is_empty() && diff.deleted.is_empty());
//! # Ok::<(), fabric_diffing::Error>(())
//! ```

pub mod config;
pub mod diff;
pub mod error;
pub mod hash;
pub mod properties;
pub mod revision;

pub use config::{DiffConfig, DistinctConfig};
pub use diff::{Diff, DiffEngine};
pub use error::{Error, Result};
pub use hash::{compute_hash, set_hash_fragment, set_hash_fragment_with, set_hash_fragments};
pub use properties::{different_properties, PropertyDifferences};
pub use revision::Revision;
