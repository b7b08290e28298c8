// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Configuration shared by the matching engines, plus the environment
//! helpers the other crates use to load their own configs.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Default number of decimal places used for tolerance matching.
pub const DEFAULT_DECIMAL_PLACES: u32 = 12;

/// Controls which properties identify an entity and how precisely
/// numeric values are compared.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchConfig {
    /// Property names or dotted paths to compare. Empty compares everything.
    pub properties_to_consider: Vec<String>,
    /// Numeric leaves are rounded to this many decimal places before comparing.
    pub decimal_places: u32,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            properties_to_consider: Vec::new(),
            decimal_places: DEFAULT_DECIMAL_PLACES,
        }
    }
}

impl MatchConfig {
    pub fn new(properties_to_consider: Vec<String>, decimal_places: u32) -> Self {
        Self {
            properties_to_consider,
            decimal_places,
        }
    }

    /// Parses a config from JSON. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Loads overrides from the environment.
    ///
    /// - `FABRIC_MATCH_DECIMAL_PLACES`
    /// - `FABRIC_MATCH_PROPERTIES` (comma-separated)
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        if let Some(dp) = env_parse("FABRIC_MATCH_DECIMAL_PLACES")? {
            config.decimal_places = dp;
        }
        if let Some(list) = env_list("FABRIC_MATCH_PROPERTIES") {
            config.properties_to_consider = list;
        }
        Ok(config)
    }
}

/// Reads and parses an environment variable. Unset variables yield `None`.
pub fn env_parse<T: std::str::FromStr>(name: &str) -> Result<Option<T>> {
    match std::env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| Error::InvalidConfig(format!("{name}={raw}"))),
        Err(_) => Ok(None),
    }
}

/// Reads a comma-separated list from an environment variable.
pub fn env_list(name: &str) -> Option<Vec<String>> {
    std::env::var(name).ok().map(|raw| {
        raw.split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from)
            .collect()
    })
}
