//! Entity metadata, keyed by entity type.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Entity type every federation participant may publish.
pub const FEDERATION_ENTITY: &str = "federation_entity";

/// Metadata claims grouped by entity type, e.g. `federation_entity`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Metadata(BTreeMap<String, Map<String, Value>>);

impl Metadata {
    /// Empty metadata.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set one claim under `entity_type`.
    pub fn set(&mut self, entity_type: &str, claim: &str, value: impl Into<Value>) {
        self.0
            .entry(entity_type.to_string())
            .or_default()
            .insert(claim.to_string(), value.into());
    }

    /// Read one claim.
    #[must_use]
    pub fn get(&self, entity_type: &str, claim: &str) -> Option<&Value> {
        self.0.get(entity_type)?.get(claim)
    }

    /// Entity types present, in order.
    #[must_use]
    pub fn entity_types(&self) -> Vec<String> {
        self.0.keys().cloned().collect()
    }

    /// Returns true if no entity type has metadata.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
