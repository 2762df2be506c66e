//! # minifed-core
//!
//! Entity model shared by every part of a minifed federation.
//!
//! ## Contents
//!
//! - **Config**: the YAML federation document (`entities` + `edges`).
//! - **Identity**: per-entity ECDSA signing keys and their JWK form.
//! - **Store**: subordinate trust records and the [`TrustStore`] seam.
//!
//! ```text
//! federation.yaml
//!   entities: TA-A (trust-anchor), IM-A (intermediate), OP-A (leaf)
//!   edges:    TA-A -> OP-A, TA-A -> IM-A
//!
//!        TA-A
//!       /    \
//!    OP-A    IM-A
//! ```

pub mod config;
pub mod error;
pub mod identity;
pub mod store;
pub mod types;

// Re-exports for convenience.
pub use config::FederationConfig;
pub use error::{FedError, Result};
pub use identity::{SigningAlgorithm, SigningIdentity};
pub use jsonwebtoken::jwk::{Jwk, JwkSet};
pub use store::{MemoryTrustStore, SubordinateRecord, SubordinateStatus, TrustStore};
pub use types::{EdgeConfig, EntityConfig, EntityKind};
