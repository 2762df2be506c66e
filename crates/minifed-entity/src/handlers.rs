//! Federation endpoint handlers.

use axum::{
    extract::{Query, State},
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use minifed_core::SubordinateRecord;
use serde::Deserialize;
use std::sync::Arc;
use tracing::debug;

use crate::entity::FedEntity;
use crate::error::{ApiError, EntityError};

/// Media type of signed entity statements.
pub const ENTITY_STATEMENT_CONTENT_TYPE: &str = "application/entity-statement+jwt";

/// Listing filters this harness does not implement.
const UNSUPPORTED_LIST_PARAMETERS: [&str; 3] = ["trust_marked", "trust_mark_type", "intermediate"];

/// Query of the fetch endpoint.
#[derive(Debug, Deserialize)]
pub struct FetchParams {
    /// Subordinate entity identifier.
    pub sub: Option<String>,
}

fn statement_response(jwt: String) -> Response {
    ([(header::CONTENT_TYPE, ENTITY_STATEMENT_CONTENT_TYPE)], jwt).into_response()
}

/// Entity configuration.
///
/// GET /.well-known/openid-federation
pub async fn entity_configuration(
    State(entity): State<Arc<FedEntity>>,
) -> Result<Response, ApiError> {
    let jwt = entity.entity_configuration_jwt()?;
    Ok(statement_response(jwt))
}

/// List active subordinates, optionally filtered by `entity_type`
/// (repeatable).
///
/// GET /list
pub async fn list_subordinates(
    State(entity): State<Arc<FedEntity>>,
    Query(params): Query<Vec<(String, String)>>,
) -> Result<Json<Vec<String>>, ApiError> {
    if let Some((name, _)) = params
        .iter()
        .find(|(name, _)| UNSUPPORTED_LIST_PARAMETERS.contains(&name.as_str()))
    {
        return Err(ApiError::UnsupportedParameter(format!(
            "'{name}' filtering is not supported"
        )));
    }

    let entity_types: Vec<&str> = params
        .iter()
        .filter(|(name, _)| name == "entity_type")
        .map(|(_, value)| value.as_str())
        .collect();

    let store = entity
        .listing_store()
        .ok_or_else(|| ApiError::NotFound("no subordinate listing endpoint".into()))?;
    let records = store.list().map_err(EntityError::Store)?;

    let ids: Vec<String> = records
        .into_iter()
        .filter(SubordinateRecord::is_active)
        .filter(|record| {
            entity_types.is_empty()
                || record
                    .entity_types
                    .iter()
                    .any(|t| entity_types.contains(&t.as_str()))
        })
        .map(|record| record.entity_id)
        .collect();

    debug!(issuer = %entity.identifier(), count = ids.len(), "listed subordinates");
    Ok(Json(ids))
}

/// Statement about one direct subordinate.
///
/// GET /fetch?sub=<entity id>
pub async fn fetch_subordinate(
    State(entity): State<Arc<FedEntity>>,
    Query(params): Query<FetchParams>,
) -> Result<Response, ApiError> {
    let sub = params
        .sub
        .filter(|sub| !sub.is_empty())
        .ok_or_else(|| ApiError::InvalidRequest("missing required parameter 'sub'".into()))?;
    if sub == entity.identifier() {
        return Err(ApiError::InvalidRequest(
            "'sub' must not be the issuer itself".into(),
        ));
    }

    let store = entity
        .fetch_store()
        .ok_or_else(|| ApiError::NotFound("no fetch endpoint".into()))?;
    let record = store
        .read(&sub)
        .map_err(EntityError::Store)?
        .filter(SubordinateRecord::is_active)
        .ok_or_else(|| ApiError::NotFound(format!("unknown subordinate {sub}")))?;

    debug!(issuer = %entity.identifier(), sub = %sub, "issuing subordinate statement");
    let jwt = entity.subordinate_statement_jwt(&record)?;
    Ok(statement_response(jwt))
}

/// GET /resolve
pub async fn resolve() -> ApiError {
    ApiError::Unsupported("resolve requires live discovery of other entities".into())
}
