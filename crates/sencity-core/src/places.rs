//! Resolution of "embedded type" places into flat coordinates.
//!
//! Navitia nests a place's coordinate under a key named after its category:
//! `{"embedded_type": "stop_point", "stop_point": {"coord": {...}}}`. The set
//! of categories grows over time, so the mapping from embedded type to nested
//! key is data rather than code and can be overridden from YAML.

use std::collections::{BTreeMap, HashSet};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::ConfigError;

/// Embedded types understood out of the box. Each nests under its own name.
const DEFAULT_EMBEDDED_TYPES: &[&str] = &[
    "address",
    "stop_point",
    "stop_area",
    "poi",
    "administrative_region",
];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaceKind {
    /// Value of the `embedded_type` field.
    pub embedded_type: String,
    /// Key of the nested object holding `coord`. Defaults to the embedded type.
    #[serde(default)]
    pub key: Option<String>,
}

/// YAML shape of a place kinds override file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaceKindsFile {
    pub kinds: Vec<PlaceKind>,
    /// Reject embedded types that are not listed instead of guessing.
    #[serde(default)]
    pub strict: bool,
}

/// Maps an embedded type to the key its coordinate is nested under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaceResolver {
    keys: BTreeMap<String, String>,
    strict: bool,
}

impl Default for PlaceResolver {
    fn default() -> Self {
        Self {
            keys: DEFAULT_EMBEDDED_TYPES
                .iter()
                .map(|t| ((*t).to_string(), (*t).to_string()))
                .collect(),
            strict: false,
        }
    }
}

impl PlaceResolver {
    /// Builds a resolver from a parsed override file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Validation`] if a kind has an empty name or key,
    /// or if the same embedded type is listed twice.
    pub fn from_file(file: PlaceKindsFile) -> Result<Self, ConfigError> {
        let mut seen = HashSet::new();
        let mut keys = BTreeMap::new();

        for kind in file.kinds {
            let embedded_type = kind.embedded_type.trim().to_string();
            if embedded_type.is_empty() {
                return Err(ConfigError::Validation(
                    "place kind embedded_type must be non-empty".to_string(),
                ));
            }
            if !seen.insert(embedded_type.clone()) {
                return Err(ConfigError::Validation(format!(
                    "duplicate place kind: '{embedded_type}'"
                )));
            }
            let key = kind
                .key
                .map(|k| k.trim().to_string())
                .unwrap_or_else(|| embedded_type.clone());
            if key.is_empty() {
                return Err(ConfigError::Validation(format!(
                    "place kind '{embedded_type}' has an empty key"
                )));
            }
            keys.insert(embedded_type, key);
        }

        Ok(Self {
            keys,
            strict: file.strict,
        })
    }

    /// Key under which the coordinate of `embedded_type` is nested, if known.
    #[must_use]
    pub fn key_for<'a>(&'a self, embedded_type: &'a str) -> Option<&'a str> {
        match self.keys.get(embedded_type) {
            Some(key) => Some(key.as_str()),
            None if self.strict => None,
            None => Some(embedded_type),
        }
    }

    /// Extracts the `coord` object of a raw place.
    ///
    /// Returns `None` when the embedded type is unknown (strict mode) or the
    /// nested object has no `coord`.
    #[must_use]
    pub fn nested_coord<'v>(
        &self,
        embedded_type: &str,
        place: &'v serde_json::Map<String, serde_json::Value>,
    ) -> Option<&'v serde_json::Value> {
        let key = self.key_for(embedded_type)?;
        place.get(key)?.get("coord")
    }
}

/// Load a place kinds override file.
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read, parsed, or fails validation.
pub fn load_place_resolver(path: &Path) -> Result<PlaceResolver, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::PlaceKindsIo {
        path: path.display().to_string(),
        source: e,
    })?;

    let file: PlaceKindsFile = serde_yaml::from_str(&content)?;
    PlaceResolver::from_file(file)
}
