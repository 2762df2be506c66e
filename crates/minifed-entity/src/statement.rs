//! Entity statement claims.

use minifed_core::JwkSet;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;

use crate::metadata::Metadata;

/// Claims of an entity configuration or a subordinate statement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityStatement {
    /// Issuer entity identifier.
    pub iss: String,
    /// Subject entity identifier (equal to `iss` for entity configurations).
    pub sub: String,
    /// Issued at, seconds since the epoch.
    pub iat: i64,
    /// Expiry, seconds since the epoch.
    pub exp: i64,
    /// Subject's federation signing keys.
    pub jwks: JwkSet,
    /// Identifiers of the subject's immediate superiors.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub authority_hints: Vec<String>,
    /// Subject metadata.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Metadata>,
    /// Metadata policy applied to the subject (passed through, not evaluated).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata_policy: Option<Value>,
    /// Trust chain constraints (passed through, not evaluated).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub constraints: Option<Value>,
}

/// How a superior issues statements about its subordinates.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SubordinateStatementsConfig {
    /// Statement lifetime; falls back to the entity configuration validity.
    pub lifetime: Option<Duration>,
    /// `metadata_policy` claim copied into every statement.
    pub metadata_policy: Option<Value>,
    /// `constraints` claim copied into every statement.
    pub constraints: Option<Value>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_optional_claims_omitted() {
        let statement = EntityStatement {
            iss: "https://ta.example.com".into(),
            sub: "https://ta.example.com".into(),
            iat: 1,
            exp: 2,
            jwks: JwkSet { keys: Vec::new() },
            authority_hints: Vec::new(),
            metadata: None,
            metadata_policy: None,
            constraints: None,
        };
        let json = serde_json::to_value(&statement).unwrap();
        assert!(json.get("authority_hints").is_none());
        assert!(json.get("metadata_policy").is_none());
    }
}
