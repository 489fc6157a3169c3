//! Field spec catalog.
//!
//! Field specs are declared once per entity type, typically in a YAML
//! file shipped with the app:
//!
//! ```yaml
//! recipes:
//!   searchable: [title, tags]
//!   filterable:
//!     category: exact
//!     dietary: setMembership
//!     calories: numericRange
//!   sortable:
//!     featured: number
//!     reviews: number
//!   pairedCounters:
//!     liked: likes
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{FinderError, Result};
use crate::field_spec::FieldSpec;
use crate::finder::Finder;

/// Entity type name → field spec.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SpecRegistry {
    specs: BTreeMap<String, FieldSpec>,
}

impl SpecRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        SpecRegistry::default()
    }

    /// Parses a YAML catalog.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let registry: SpecRegistry = serde_yaml::from_str(yaml)?;
        debug!(entities = registry.specs.len(), "loaded field spec catalog");
        Ok(registry)
    }

    /// Parses a JSON catalog.
    pub fn from_json(json: &str) -> Result<Self> {
        let registry: SpecRegistry = serde_json::from_str(json)?;
        debug!(entities = registry.specs.len(), "loaded field spec catalog");
        Ok(registry)
    }

    /// Reads a catalog file. `.json` files are parsed as JSON, anything
    /// else as YAML.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => Self::from_json(&text),
            _ => Self::from_yaml(&text),
        }
    }

    /// Adds or replaces the spec of an entity type.
    pub fn insert(&mut self, entity: impl Into<String>, spec: FieldSpec) {
        self.specs.insert(entity.into(), spec);
    }

    /// Looks up the spec of an entity type.
    pub fn get(&self, entity: &str) -> Result<&FieldSpec> {
        self.specs
            .get(entity)
            .ok_or_else(|| FinderError::UnknownEntity {
                entity: entity.to_string(),
            })
    }

    /// Builds a finder for an entity type.
    pub fn finder(&self, entity: &str) -> Result<Finder> {
        self.get(entity).cloned().map(Finder::new)
    }

    /// Declared entity type names, sorted.
    pub fn entities(&self) -> impl Iterator<Item = &str> {
        self.specs.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.specs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }
}
