//! Federation document loading.
//!
//! ```yaml
//! entities:
//!   TA-A: { kind: trust-anchor, identifier: https://ta-a.example.com }
//!   OP-A: { kind: leaf, identifier: https://op-a.example.com }
//! edges:
//!   - TA-A -> OP-A
//! ```

use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;
use tracing::debug;

use crate::types::{EdgeConfig, EntityConfig, EntityKind};
use crate::{FedError, Result};

/// Raw document as written on disk.
#[derive(Debug, Default, Deserialize)]
struct Document {
    #[serde(default)]
    entities: BTreeMap<String, EntityDecl>,
    #[serde(default)]
    edges: Vec<String>,
}

/// Raw entity declaration. Fields are optional so that missing values are
/// reported against the entity name instead of as a YAML error.
#[derive(Debug, Default, Deserialize)]
struct EntityDecl {
    kind: Option<String>,
    identifier: Option<String>,
}

/// Validated federation declarations.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FederationConfig {
    /// Entity declarations keyed by unique name.
    pub entities: BTreeMap<String, EntityConfig>,
    /// Trust edges in declaration order.
    pub edges: Vec<EdgeConfig>,
}

impl FederationConfig {
    /// Load and validate a federation document from a YAML file.
    ///
    /// An unreadable file is [`FedError::Io`]; problems with its content are
    /// config errors.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse and validate a federation document.
    pub fn from_yaml(content: &str) -> Result<Self> {
        let document: Document = serde_yaml::from_str(content)?;
        Self::from_document(document)
    }

    fn from_document(document: Document) -> Result<Self> {
        let mut entities = BTreeMap::new();
        for (name, decl) in document.entities {
            let kind = match decl.kind.as_deref().map(str::trim) {
                None | Some("") => {
                    return Err(FedError::Config(format!("{name}: kind must be present")));
                }
                Some(kind) => kind
                    .parse::<EntityKind>()
                    .map_err(|e| prefixed(&name, e))?,
            };
            let identifier = match decl.identifier.as_deref().map(str::trim) {
                None | Some("") => {
                    return Err(FedError::Config(format!(
                        "{name}: identifier must be present"
                    )));
                }
                Some(identifier) => identifier.to_string(),
            };
            entities.insert(name.clone(), EntityConfig::new(name, kind, identifier));
        }

        let edges = document
            .edges
            .iter()
            .enumerate()
            .map(|(index, edge)| {
                edge.parse::<EdgeConfig>()
                    .map_err(|e| prefixed(&format!("edge {index}"), e))
            })
            .collect::<Result<Vec<_>>>()?;

        debug!(
            entities = entities.len(),
            edges = edges.len(),
            "read federation config"
        );

        Ok(Self { entities, edges })
    }

    /// Names declared under `entities` that no edge mentions.
    pub fn unreferenced(&self) -> Vec<&str> {
        self.entities
            .keys()
            .filter(|name| {
                !self
                    .edges
                    .iter()
                    .any(|edge| &edge.head == *name || &edge.tail == *name)
            })
            .map(String::as_str)
            .collect()
    }
}

/// Prefix a config error's message with where it occurred.
fn prefixed(context: &str, err: FedError) -> FedError {
    match err {
        FedError::Config(message) => FedError::Config(format!("{context}: {message}")),
        other => other,
    }
}
