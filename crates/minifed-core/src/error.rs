//! Error taxonomy for building and seeding a federation.

use thiserror::Error;

/// Result type alias for minifed operations.
pub type Result<T> = std::result::Result<T, FedError>;

/// Errors raised while turning a federation document into running entities.
///
/// Every variant is fatal at startup. None of them is worth retrying: the
/// inputs are static.
#[derive(Error, Debug)]
pub enum FedError {
    /// Malformed or missing fields, unresolvable edge references, bad URLs.
    #[error("config error: {0}")]
    Config(String),

    /// Key generation or protocol handler creation failed.
    #[error("construction error: {0}")]
    Construction(String),

    /// Seeding a superior's trust store failed.
    #[error("trust write failed for {parent} -> {child}: {reason}")]
    TrustWrite {
        /// Identifier of the superior owning the store.
        parent: String,
        /// Identifier of the subordinate being recorded.
        child: String,
        /// Underlying store failure.
        reason: String,
    },

    /// Trust store read/write failed.
    #[error("store error: {0}")]
    Store(String),

    /// HTTP listener failed to bind or serve.
    #[error("server error: {0}")]
    Server(String),

    /// Federation document could not be read.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML error.
    #[error("yaml error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl FedError {
    /// Returns true if the error comes from the federation document itself.
    #[must_use]
    pub const fn is_config_error(&self) -> bool {
        matches!(self, Self::Config(_) | Self::Yaml(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trust_write_message() {
        let err = FedError::TrustWrite {
            parent: "https://ta.example.com".into(),
            child: "https://op.example.com".into(),
            reason: "lock poisoned".into(),
        };
        assert_eq!(
            err.to_string(),
            "trust write failed for https://ta.example.com -> https://op.example.com: lock poisoned"
        );
        assert!(!err.is_config_error());
    }

    #[test]
    fn test_config_classification() {
        assert!(FedError::Config("x".into()).is_config_error());
        assert!(!FedError::Construction("x".into()).is_config_error());

        let io = FedError::from(std::io::Error::new(std::io::ErrorKind::NotFound, "gone"));
        assert!(!io.is_config_error());
        assert_eq!(io.to_string(), "io error: gone");
    }
}
