//! Entity and edge declarations.

use std::fmt;
use std::str::FromStr;

use crate::{FedError, Result};

/// Separator between the superior and the subordinate in an edge string.
pub const EDGE_SEPARATOR: &str = "->";

/// Kind of entity in a minifed federation.
///
/// This does not map 1:1 to OpenID Federation entity types. It describes
/// the role a node plays in the local topology.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    /// A leaf that only publishes its entity configuration.
    Leaf,
    /// Has superiors and subordinates; answers list/fetch.
    Intermediate,
    /// Root of trust; answers list/fetch.
    TrustAnchor,
}

impl EntityKind {
    /// All kinds, in declaration order.
    pub const ALL: [Self; 3] = [Self::Leaf, Self::Intermediate, Self::TrustAnchor];

    /// Whether entities of this kind own a subordinate trust store.
    #[must_use]
    pub const fn owns_trust_store(self) -> bool {
        matches!(self, Self::Intermediate | Self::TrustAnchor)
    }

    /// Config spelling of this kind.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Leaf => "leaf",
            Self::Intermediate => "intermediate",
            Self::TrustAnchor => "trust-anchor",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntityKind {
    type Err = FedError;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s.trim())
            .ok_or_else(|| {
                FedError::Config(format!(
                    "unknown kind '{s}' (expected leaf, intermediate or trust-anchor)"
                ))
            })
    }
}

/// A validated entity declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityConfig {
    /// Unique name used by edges.
    pub name: String,
    /// Role of the entity.
    pub kind: EntityKind,
    /// Entity identifier, an absolute URL.
    pub identifier: String,
}

impl EntityConfig {
    /// Create a new entity declaration.
    pub fn new(name: impl Into<String>, kind: EntityKind, identifier: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind,
            identifier: identifier.into(),
        }
    }
}

/// A trust edge: `head` is the superior, `tail` the subordinate.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EdgeConfig {
    /// Superior entity name.
    pub head: String,
    /// Subordinate entity name.
    pub tail: String,
}

impl EdgeConfig {
    /// Create an edge from superior `head` to subordinate `tail`.
    pub fn new(head: impl Into<String>, tail: impl Into<String>) -> Self {
        Self {
            head: head.into(),
            tail: tail.into(),
        }
    }
}

impl fmt::Display for EdgeConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {EDGE_SEPARATOR} {}", self.head, self.tail)
    }
}

impl FromStr for EdgeConfig {
    type Err = FedError;

    /// Parse `"HEAD -> TAIL"`; whitespace around either name is ignored.
    fn from_str(s: &str) -> Result<Self> {
        let mut parts = s.split(EDGE_SEPARATOR);
        let (Some(head), Some(tail), None) = (parts.next(), parts.next(), parts.next()) else {
            return Err(FedError::Config(format!(
                "edge '{s}' must have the form 'HEAD {EDGE_SEPARATOR} TAIL'"
            )));
        };

        let (head, tail) = (head.trim(), tail.trim());
        if head.is_empty() || tail.is_empty() {
            return Err(FedError::Config(format!("edge '{s}' has an empty endpoint")));
        }

        Ok(Self::new(head, tail))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_parsing() {
        assert_eq!("leaf".parse::<EntityKind>().unwrap(), EntityKind::Leaf);
        assert_eq!(
            "trust-anchor".parse::<EntityKind>().unwrap(),
            EntityKind::TrustAnchor
        );
        assert!("anchor".parse::<EntityKind>().is_err());
    }

    #[test]
    fn test_kind_spelling_round_trips() {
        for kind in EntityKind::ALL {
            assert_eq!(kind.to_string().parse::<EntityKind>().unwrap(), kind);
        }
        assert_eq!(
            " intermediate ".parse::<EntityKind>().unwrap(),
            EntityKind::Intermediate
        );
        assert!("Trust-Anchor".parse::<EntityKind>().is_err());
    }

    #[test]
    fn test_trust_store_capability() {
        assert!(!EntityKind::Leaf.owns_trust_store());
        assert!(EntityKind::Intermediate.owns_trust_store());
        assert!(EntityKind::TrustAnchor.owns_trust_store());
    }

    #[test]
    fn test_edge_parsing_trims() {
        let edge: EdgeConfig = "  TA-A   ->OP-A ".parse().unwrap();
        assert_eq!(edge, EdgeConfig::new("TA-A", "OP-A"));
        assert_eq!(edge.to_string(), "TA-A -> OP-A");
    }

    #[test]
    fn test_malformed_edges() {
        assert!("TA-A OP-A".parse::<EdgeConfig>().is_err());
        assert!("TA-A -> IM-A -> OP-A".parse::<EdgeConfig>().is_err());
        assert!(" -> OP-A".parse::<EdgeConfig>().is_err());
    }
}
