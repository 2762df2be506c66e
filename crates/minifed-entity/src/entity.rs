//! A federation entity: identity, metadata and registered endpoints.

use axum::{routing::get, Router};
use chrono::Utc;
use minifed_core::{SigningIdentity, SubordinateRecord, TrustStore};
use std::sync::Arc;
use std::time::Duration;
use url::Url;

use crate::handlers;
use crate::jws::{self, ENTITY_STATEMENT_TYP};
use crate::metadata::{Metadata, FEDERATION_ENTITY};
use crate::statement::{EntityStatement, SubordinateStatementsConfig};
use crate::{EntityError, Result};

/// Path of the entity configuration document.
pub const WELL_KNOWN_PATH: &str = "/.well-known/openid-federation";

/// Where an endpoint is mounted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointConf {
    /// Absolute path, e.g. `/fetch`.
    pub path: String,
}

impl EndpointConf {
    /// Mount an endpoint at `path`.
    pub fn new(path: impl Into<String>) -> Self {
        Self { path: path.into() }
    }
}

/// A store-backed endpoint.
#[derive(Debug, Clone)]
struct StoreEndpoint {
    path: String,
    store: Arc<dyn TrustStore>,
}

/// One federation entity and the endpoints it serves.
#[derive(Debug, Clone)]
pub struct FedEntity {
    identifier: String,
    url: Url,
    authority_hints: Vec<String>,
    metadata: Metadata,
    identity: Arc<SigningIdentity>,
    validity: Duration,
    statements: SubordinateStatementsConfig,
    listing: Option<StoreEndpoint>,
    fetch: Option<StoreEndpoint>,
    resolve: Option<String>,
}

impl FedEntity {
    /// Create an entity.
    ///
    /// `authority_hints` are the identifiers of the entity's immediate
    /// superiors, in order. The signing algorithm is the identity's own, so
    /// key and algorithm cannot disagree.
    pub fn new(
        identifier: &str,
        authority_hints: Vec<String>,
        metadata: Metadata,
        identity: Arc<SigningIdentity>,
        validity: Duration,
        statements: SubordinateStatementsConfig,
    ) -> Result<Self> {
        let url = Url::parse(identifier).map_err(|e| EntityError::InvalidIdentifier {
            identifier: identifier.to_string(),
            reason: e.to_string(),
        })?;
        if url.host_str().is_none() {
            return Err(EntityError::InvalidIdentifier {
                identifier: identifier.to_string(),
                reason: "no host".into(),
            });
        }
        if validity.is_zero() {
            return Err(EntityError::Invalid("validity must be positive".into()));
        }

        Ok(Self {
            identifier: identifier.to_string(),
            url,
            authority_hints,
            metadata,
            identity,
            validity,
            statements,
            listing: None,
            fetch: None,
            resolve: None,
        })
    }

    /// Entity identifier as configured.
    #[must_use]
    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    /// Immediate superiors' identifiers.
    #[must_use]
    pub fn authority_hints(&self) -> &[String] {
        &self.authority_hints
    }

    /// Published metadata, including registered endpoint URLs.
    #[must_use]
    pub const fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    /// Register the subordinate listing endpoint backed by `store`.
    pub fn add_subordinate_listing_endpoint(
        &mut self,
        conf: EndpointConf,
        store: Arc<dyn TrustStore>,
    ) -> Result<()> {
        self.publish_endpoint("federation_list_endpoint", &conf.path)?;
        self.listing = Some(StoreEndpoint {
            path: conf.path,
            store,
        });
        Ok(())
    }

    /// Register the fetch endpoint backed by `store`.
    pub fn add_fetch_endpoint(&mut self, conf: EndpointConf, store: Arc<dyn TrustStore>) -> Result<()> {
        self.publish_endpoint("federation_fetch_endpoint", &conf.path)?;
        self.fetch = Some(StoreEndpoint {
            path: conf.path,
            store,
        });
        Ok(())
    }

    /// Register the resolve endpoint. It answers 501: resolving needs live
    /// discovery of other entities, which the harness cannot do.
    pub fn add_resolve_endpoint(&mut self, conf: EndpointConf) -> Result<()> {
        self.publish_endpoint("federation_resolve_endpoint", &conf.path)?;
        self.resolve = Some(conf.path);
        Ok(())
    }

    fn publish_endpoint(&mut self, claim: &str, path: &str) -> Result<()> {
        if !path.starts_with('/') {
            return Err(EntityError::Invalid(format!(
                "endpoint path '{path}' must start with '/'"
            )));
        }
        let endpoint = self
            .url
            .join(path)
            .map_err(|e| EntityError::Invalid(format!("endpoint path '{path}': {e}")))?;
        self.metadata.set(FEDERATION_ENTITY, claim, endpoint.as_str());
        Ok(())
    }

    /// Self-issued entity configuration claims.
    #[must_use]
    pub fn entity_configuration_payload(&self) -> EntityStatement {
        let (iat, exp) = issued_window(self.validity);
        EntityStatement {
            iss: self.identifier.clone(),
            sub: self.identifier.clone(),
            iat,
            exp,
            jwks: self.identity.jwks(),
            authority_hints: self.authority_hints.clone(),
            metadata: (!self.metadata.is_empty()).then(|| self.metadata.clone()),
            metadata_policy: None,
            constraints: None,
        }
    }

    /// Signed entity configuration.
    pub fn entity_configuration_jwt(&self) -> Result<String> {
        jws::sign(
            &self.identity,
            ENTITY_STATEMENT_TYP,
            &self.entity_configuration_payload(),
        )
    }

    /// Claims of a statement about a direct subordinate.
    #[must_use]
    pub fn subordinate_statement(&self, record: &SubordinateRecord) -> EntityStatement {
        let (iat, exp) = issued_window(self.statements.lifetime.unwrap_or(self.validity));
        EntityStatement {
            iss: self.identifier.clone(),
            sub: record.entity_id.clone(),
            iat,
            exp,
            jwks: record.jwks.clone(),
            authority_hints: Vec::new(),
            metadata: None,
            metadata_policy: self.statements.metadata_policy.clone(),
            constraints: self.statements.constraints.clone(),
        }
    }

    /// Signed statement about a direct subordinate.
    pub fn subordinate_statement_jwt(&self, record: &SubordinateRecord) -> Result<String> {
        jws::sign(
            &self.identity,
            ENTITY_STATEMENT_TYP,
            &self.subordinate_statement(record),
        )
    }

    pub(crate) fn listing_store(&self) -> Option<&Arc<dyn TrustStore>> {
        self.listing.as_ref().map(|endpoint| &endpoint.store)
    }

    pub(crate) fn fetch_store(&self) -> Option<&Arc<dyn TrustStore>> {
        self.fetch.as_ref().map(|endpoint| &endpoint.store)
    }

    /// Router serving the well-known document and every registered endpoint.
    pub fn router(&self) -> Router {
        let mut router = Router::new().route(WELL_KNOWN_PATH, get(handlers::entity_configuration));
        if let Some(listing) = &self.listing {
            router = router.route(&listing.path, get(handlers::list_subordinates));
        }
        if let Some(fetch) = &self.fetch {
            router = router.route(&fetch.path, get(handlers::fetch_subordinate));
        }
        if let Some(path) = &self.resolve {
            router = router.route(path, get(handlers::resolve));
        }
        router.with_state(Arc::new(self.clone()))
    }
}

/// `(iat, exp)` for a statement issued now.
fn issued_window(lifetime: Duration) -> (i64, i64) {
    let iat = Utc::now().timestamp();
    let lifetime = i64::try_from(lifetime.as_secs()).unwrap_or(i64::MAX);
    (iat, iat.saturating_add(lifetime))
}
