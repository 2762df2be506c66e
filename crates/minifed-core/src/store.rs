//! Subordinate trust records.
//!
//! Each intermediate and trust anchor owns one [`TrustStore`]. It is written
//! once at startup (one record per direct subordinate) and only read while
//! serving list/fetch requests.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::Debug;
use std::sync::RwLock;
use tracing::debug;

use jsonwebtoken::jwk::JwkSet;
use crate::{FedError, Result};

/// Registration status of a subordinate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SubordinateStatus {
    /// Listed and fetchable.
    #[default]
    Active,
    /// Known but refused.
    Blocked,
    /// Awaiting approval.
    Pending,
}

/// What a superior knows about one direct subordinate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubordinateRecord {
    /// Subordinate entity identifier.
    pub entity_id: String,
    /// Subordinate's federation signing keys.
    pub jwks: JwkSet,
    /// Entity types the subordinate publishes metadata for.
    pub entity_types: Vec<String>,
    /// Registration status.
    pub status: SubordinateStatus,
}

impl SubordinateRecord {
    /// Create an active record.
    pub fn active(entity_id: impl Into<String>, jwks: JwkSet, entity_types: Vec<String>) -> Self {
        Self {
            entity_id: entity_id.into(),
            jwks,
            entity_types,
            status: SubordinateStatus::Active,
        }
    }

    /// Returns true if the record may be listed and fetched.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.status == SubordinateStatus::Active
    }
}

/// Key-value store of subordinate records, keyed by entity identifier.
pub trait TrustStore: Send + Sync + Debug {
    /// Insert or replace the record for `entity_id`.
    fn write(&self, entity_id: &str, record: SubordinateRecord) -> Result<()>;

    /// Look up the record for `entity_id`.
    fn read(&self, entity_id: &str) -> Result<Option<SubordinateRecord>>;

    /// All records, ordered by entity identifier.
    fn list(&self) -> Result<Vec<SubordinateRecord>>;
}

/// In-memory trust store. Contents are lost on restart.
#[derive(Debug, Default)]
pub struct MemoryTrustStore {
    records: RwLock<BTreeMap<String, SubordinateRecord>>,
}

impl MemoryTrustStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl TrustStore for MemoryTrustStore {
    fn write(&self, entity_id: &str, record: SubordinateRecord) -> Result<()> {
        if record.entity_id != entity_id {
            return Err(FedError::Store(format!(
                "record for {} written under key {entity_id}",
                record.entity_id
            )));
        }

        let mut records = self
            .records
            .write()
            .map_err(|_| FedError::Store("trust store lock poisoned".into()))?;
        debug!(entity_id = %entity_id, status = ?record.status, "writing subordinate record");
        records.insert(entity_id.to_string(), record);
        Ok(())
    }

    fn read(&self, entity_id: &str) -> Result<Option<SubordinateRecord>> {
        let records = self
            .records
            .read()
            .map_err(|_| FedError::Store("trust store lock poisoned".into()))?;
        Ok(records.get(entity_id).cloned())
    }

    fn list(&self) -> Result<Vec<SubordinateRecord>> {
        let records = self
            .records
            .read()
            .map_err(|_| FedError::Store("trust store lock poisoned".into()))?;
        Ok(records.values().cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::{SigningAlgorithm, SigningIdentity};

    fn record(entity_id: &str) -> SubordinateRecord {
        let identity = SigningIdentity::generate(SigningAlgorithm::Es256).unwrap();
        SubordinateRecord::active(entity_id, identity.jwks(), vec!["federation_entity".into()])
    }

    #[test]
    fn test_write_then_read() {
        let store = MemoryTrustStore::new();
        let op = record("https://op.example.com");
        store.write("https://op.example.com", op.clone()).unwrap();

        assert_eq!(store.read("https://op.example.com").unwrap(), Some(op));
        assert_eq!(store.read("https://other.example.com").unwrap(), None);
    }

    #[test]
    fn test_list_is_ordered() {
        let store = MemoryTrustStore::new();
        store.write("https://op.example.com", record("https://op.example.com")).unwrap();
        store.write("https://im.example.com", record("https://im.example.com")).unwrap();

        let ids: Vec<_> = store.list().unwrap().into_iter().map(|r| r.entity_id).collect();
        assert_eq!(ids, vec!["https://im.example.com", "https://op.example.com"]);
    }

    #[test]
    fn test_rewrite_replaces() {
        let store = MemoryTrustStore::new();
        store.write("https://op.example.com", record("https://op.example.com")).unwrap();
        let mut blocked = record("https://op.example.com");
        blocked.status = SubordinateStatus::Blocked;
        store.write("https://op.example.com", blocked).unwrap();

        let stored = store.read("https://op.example.com").unwrap().unwrap();
        assert!(!stored.is_active());
        assert_eq!(store.list().unwrap().len(), 1);
    }

    #[test]
    fn test_mismatched_key_rejected() {
        let store = MemoryTrustStore::new();
        let err = store
            .write("https://im.example.com", record("https://op.example.com"))
            .unwrap_err();
        assert!(matches!(err, FedError::Store(_)));
    }

    #[test]
    fn test_status_serialization() {
        let json = serde_json::to_string(&SubordinateStatus::Active).unwrap();
        assert_eq!(json, "\"active\"");
    }
}
