//! Engine and HTTP error types.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Errors raised while creating an entity or producing statements.
#[derive(Error, Debug)]
pub enum EntityError {
    /// The entity identifier is not an absolute URL with a host.
    #[error("invalid entity identifier '{identifier}': {reason}")]
    InvalidIdentifier {
        /// Identifier as given.
        identifier: String,
        /// Why it was rejected.
        reason: String,
    },

    /// Entity parameters are inconsistent.
    #[error("invalid entity parameters: {0}")]
    Invalid(String),

    /// JWS encoding failed.
    #[error("jwt error: {0}")]
    Jwt(#[from] jsonwebtoken::errors::Error),

    /// Trust store access failed.
    #[error(transparent)]
    Store(#[from] minifed_core::FedError),
}

/// Federation endpoint errors, rendered as `{"error", "error_description"}`.
#[derive(Error, Debug)]
pub enum ApiError {
    /// Malformed or missing request parameters.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// A query parameter this entity does not implement.
    #[error("unsupported parameter: {0}")]
    UnsupportedParameter(String),

    /// Requested subordinate is not known to this entity.
    #[error("not found: {0}")]
    NotFound(String),

    /// The endpoint exists but is not supported by this harness.
    #[error("unsupported: {0}")]
    Unsupported(String),

    /// Internal failure while answering.
    #[error("server error: {0}")]
    Server(String),
}

/// Federation error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Error code.
    pub error: &'static str,
    /// Human-readable description.
    pub error_description: String,
}

impl ApiError {
    /// HTTP status and federation error code for this error.
    #[must_use]
    pub const fn status(&self) -> (StatusCode, &'static str) {
        match self {
            Self::InvalidRequest(_) => (StatusCode::BAD_REQUEST, "invalid_request"),
            Self::UnsupportedParameter(_) => (StatusCode::BAD_REQUEST, "unsupported_parameter"),
            Self::NotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
            Self::Unsupported(_) => (StatusCode::NOT_IMPLEMENTED, "unsupported"),
            Self::Server(_) => (StatusCode::INTERNAL_SERVER_ERROR, "server_error"),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = self.status();
        let description = match self {
            Self::InvalidRequest(msg)
            | Self::UnsupportedParameter(msg)
            | Self::NotFound(msg)
            | Self::Unsupported(msg)
            | Self::Server(msg) => msg,
        };

        let body = ErrorResponse {
            error: code,
            error_description: description,
        };

        (status, Json(body)).into_response()
    }
}

impl From<EntityError> for ApiError {
    fn from(err: EntityError) -> Self {
        Self::Server(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(
            ApiError::InvalidRequest("x".into()).status(),
            (StatusCode::BAD_REQUEST, "invalid_request")
        );
        assert_eq!(
            ApiError::Unsupported("x".into()).status().0,
            StatusCode::NOT_IMPLEMENTED
        );
    }

    #[test]
    fn test_entity_error_is_server_error() {
        let store = minifed_core::FedError::Store("lock poisoned".into());
        let api: ApiError = EntityError::from(store).into();
        assert_eq!(api.status().1, "server_error");
        assert!(api.to_string().contains("lock poisoned"));
        assert_eq!(api.into_response().status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
