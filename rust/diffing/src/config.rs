// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Hashing and diffing configuration.

use serde::{Deserialize, Serialize};

use fabric_core::config::{env_list, env_parse};

use crate::error::{Error, Result};

/// Numeric differences below this are treated as equal.
pub const DEFAULT_NUMERIC_TOLERANCE: f64 = 1e-6;

/// Default cap on reported property differences per object.
pub const DEFAULT_MAX_PROPERTY_DIFFERENCES: usize = 1000;

/// Controls what contributes to an object's content hash.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DistinctConfig {
    /// Property names or dotted paths left out of the hash. The identity
    /// field is always left out.
    pub properties_to_ignore: Vec<String>,
    /// Numeric leaves are snapped to multiples of this before hashing.
    pub numeric_tolerance: f64,
}

impl Default for DistinctConfig {
    fn default() -> Self {
        Self {
            properties_to_ignore: Vec::new(),
            numeric_tolerance: DEFAULT_NUMERIC_TOLERANCE,
        }
    }
}

/// Controls revision diffing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiffConfig {
    /// Compute property-by-property deltas for updated objects.
    pub enable_property_diffing: bool,
    pub properties_to_ignore: Vec<String>,
    /// When non-empty, only these properties are reported as different.
    pub properties_to_consider: Vec<String>,
    pub numeric_tolerance: f64,
    pub max_property_differences: usize,
}

impl Default for DiffConfig {
    fn default() -> Self {
        Self {
            enable_property_diffing: true,
            properties_to_ignore: Vec::new(),
            properties_to_consider: Vec::new(),
            numeric_tolerance: DEFAULT_NUMERIC_TOLERANCE,
            max_property_differences: DEFAULT_MAX_PROPERTY_DIFFERENCES,
        }
    }
}

impl DiffConfig {
    /// The hashing part of this config.
    pub fn distinct(&self) -> DistinctConfig {
        DistinctConfig {
            properties_to_ignore: self.properties_to_ignore.clone(),
            numeric_tolerance: self.numeric_tolerance,
        }
    }

    /// Parses a config from JSON. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Loads overrides from the environment.
    ///
    /// - `FABRIC_DIFF_PROPERTY_DIFFING` (`true`/`false`)
    /// - `FABRIC_DIFF_NUMERIC_TOLERANCE`
    /// - `FABRIC_DIFF_MAX_PROPERTY_DIFFERENCES`
    /// - `FABRIC_DIFF_IGNORE`, `FABRIC_DIFF_CONSIDER` (comma-separated)
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        if let Some(v) = env_parse("FABRIC_DIFF_PROPERTY_DIFFING")? {
            config.enable_property_diffing = v;
        }
        if let Some(v) = env_parse("FABRIC_DIFF_NUMERIC_TOLERANCE")? {
            config.numeric_tolerance = v;
        }
        if let Some(v) = env_parse("FABRIC_DIFF_MAX_PROPERTY_DIFFERENCES")? {
            config.max_property_differences = v;
        }
        if let Some(list) = env_list("FABRIC_DIFF_IGNORE") {
            config.properties_to_ignore = list;
        }
        if let Some(list) = env_list("FABRIC_DIFF_CONSIDER") {
            config.properties_to_consider = list;
        }
        config.validate()?;
        Ok(config)
    }

    /// Rejects a negative or non-finite tolerance.
    pub fn validate(&self) -> Result<()> {
        if !self.numeric_tolerance.is_finite() || self.numeric_tolerance < 0.0 {
            return Err(Error::Core(fabric_core::Error::InvalidConfig(format!(
                "numeric_tolerance must be a finite non-negative number, got {}",
                self.numeric_tolerance
            ))));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let c = DiffConfig::default();
        assert!(c.enable_property_diffing);
        assert_eq!(c.numeric_tolerance, DEFAULT_NUMERIC_TOLERANCE);
        assert_eq!(c.max_property_differences, 1000);
        assert_eq!(c.distinct(), DistinctConfig::default());
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let c = DiffConfig::from_json(r#"{"properties_to_ignore": ["name"]}"#).unwrap();
        assert_eq!(c.properties_to_ignore, vec!["name".to_string()]);
        assert!(c.enable_property_diffing);
        assert_eq!(c.distinct().properties_to_ignore, vec!["name".to_string()]);
    }

    #[test]
    fn negative_tolerance_is_rejected() {
        let err = DiffConfig::from_json(r#"{"numeric_tolerance": -1.0}"#).unwrap_err();
        assert!(matches!(err, Error::Core(fabric_core::Error::InvalidConfig(_))));
    }
}
