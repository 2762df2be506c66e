//! # minifed-entity
//!
//! Federation entity engine for minifed.
//!
//! A [`FedEntity`] wraps one entity's identifier, authority hints, metadata
//! and signing key. It can:
//!
//! - produce its entity configuration (payload and signed JWT), and
//! - serve the federation endpoints as an axum [`Router`](axum::Router):
//!
//! ```text
//! GET /.well-known/openid-federation   entity configuration (every entity)
//! GET /list                            subordinate listing (superiors only)
//! GET /fetch?sub=<entity id>           subordinate statement (superiors only)
//! GET /resolve                         501, live resolution is unsupported
//! ```
//!
//! Trust chain verification and metadata policy evaluation are not done here.

pub mod entity;
pub mod error;
pub mod handlers;
pub mod jws;
pub mod metadata;
pub mod statement;

// Re-exports for convenience.
pub use entity::{EndpointConf, FedEntity};
pub use error::{ApiError, EntityError};
pub use metadata::{Metadata, FEDERATION_ENTITY};
pub use statement::{EntityStatement, SubordinateStatementsConfig};

/// Result type for entity engine operations.
pub type Result<T> = std::result::Result<T, EntityError>;
