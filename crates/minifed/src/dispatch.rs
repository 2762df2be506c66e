//! Virtual-host dispatch: one listener, one router per entity hostname.

use axum::{
    body::Body,
    extract::{Request, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Router,
};
use minifed_core::{FedError, Result};
use std::collections::HashMap;
use std::sync::Arc;
use tower::{ServiceBuilder, ServiceExt};
use tower_http::trace::TraceLayer;
use tracing::{debug, info, warn};

use crate::topology::Topology;

/// Routes each request to the entity registered for its `Host`.
///
/// Hostnames are matched case-insensitively and without port.
#[derive(Clone, Default)]
pub struct HostDispatcher {
    routes: HashMap<String, Router>,
}

impl std::fmt::Debug for HostDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HostDispatcher")
            .field("hosts", &self.hosts())
            .finish()
    }
}

impl HostDispatcher {
    /// Create an empty dispatcher.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `router` for `host`. Returns true if it replaced an earlier
    /// registration.
    pub fn register(&mut self, host: &str, router: Router) -> bool {
        self.routes.insert(host.to_ascii_lowercase(), router).is_some()
    }

    /// Register every node's entity under its hostname. On collision the
    /// node registered last wins.
    pub fn from_topology(topology: &Topology) -> Result<Self> {
        let mut dispatcher = Self::new();
        for node in topology.nodes() {
            let entity = node.entity().ok_or_else(|| {
                FedError::Construction(format!("{}: entity not attached", node.name()))
            })?;
            if dispatcher.register(node.host(), entity.router()) {
                warn!(host = %node.host(), entity = %node.name(), "hostname already registered, replacing");
            }
            info!(host = %node.host(), entity = %node.name(), "registered entity");
        }
        Ok(dispatcher)
    }

    /// Registered hostnames, sorted.
    #[must_use]
    pub fn hosts(&self) -> Vec<&str> {
        let mut hosts: Vec<&str> = self.routes.keys().map(String::as_str).collect();
        hosts.sort_unstable();
        hosts
    }

    /// Number of registered hostnames.
    #[must_use]
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    /// Returns true if nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Single router serving every registered host.
    pub fn into_router(self) -> Router {
        Router::new()
            .fallback(dispatch)
            .with_state(Arc::new(self))
            .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()))
    }
}

async fn dispatch(State(dispatcher): State<Arc<HostDispatcher>>, request: Request) -> Response {
    let Some(host) = request_host(&request) else {
        return (StatusCode::BAD_REQUEST, "missing host").into_response();
    };

    let Some(router) = dispatcher.routes.get(&host) else {
        debug!(%host, "no entity for host");
        return (StatusCode::NOT_FOUND, "unknown host").into_response();
    };

    match router.clone().oneshot(request).await {
        Ok(response) => response,
        Err(never) => match never {},
    }
}

/// Lowercased hostname of a request, from `Host` or the absolute URI.
fn request_host(request: &Request<Body>) -> Option<String> {
    let raw = request
        .headers()
        .get(header::HOST)
        .and_then(|value| value.to_str().ok())
        .or_else(|| request.uri().host())?;
    // A fully qualified name may end in a root dot.
    let host = strip_port(raw.trim()).trim_end_matches('.');
    (!host.is_empty()).then(|| host.to_ascii_lowercase())
}

fn strip_port(authority: &str) -> &str {
    if authority.starts_with('[') {
        // IPv6 literal, keep the brackets as the URL host does.
        return authority
            .find(']')
            .map_or(authority, |end| &authority[..=end]);
    }
    match authority.rsplit_once(':') {
        Some((host, port)) if port.chars().all(|c| c.is_ascii_digit()) => host,
        _ => authority,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::routing::get;
    use http_body_util::BodyExt;

    fn app() -> Router {
        let mut dispatcher = HostDispatcher::new();
        dispatcher.register("ta.example.com", Router::new().route("/", get(|| async { "ta" })));
        dispatcher.register("OP.example.com", Router::new().route("/", get(|| async { "op" })));
        dispatcher.into_router()
    }

    async fn get_host(app: Router, host: Option<&str>) -> (StatusCode, String) {
        let mut builder = axum::http::Request::builder().uri("/");
        if let Some(host) = host {
            builder = builder.header(header::HOST, host);
        }
        let response = app.oneshot(builder.body(Body::empty()).unwrap()).await.unwrap();
        let status = response.status();
        let body = response.into_body().collect().await.unwrap().to_bytes();
        (status, String::from_utf8(body.to_vec()).unwrap())
    }

    #[test]
    fn test_strip_port() {
        assert_eq!(strip_port("ta.example.com:8080"), "ta.example.com");
        assert_eq!(strip_port("ta.example.com"), "ta.example.com");
        assert_eq!(strip_port("[::1]:8080"), "[::1]");
        assert_eq!(strip_port("[::1]"), "[::1]");
    }

    #[test]
    fn test_register_reports_replacement() {
        let mut dispatcher = HostDispatcher::new();
        assert!(!dispatcher.register("a.example.com", Router::new()));
        assert!(dispatcher.register("A.example.com", Router::new()));
        assert_eq!(dispatcher.len(), 1);
        assert_eq!(dispatcher.hosts(), ["a.example.com"]);
    }

    #[tokio::test]
    async fn test_routes_by_host_ignoring_port_and_case() {
        assert_eq!(get_host(app(), Some("ta.example.com:8080")).await, (StatusCode::OK, "ta".into()));
        assert_eq!(get_host(app(), Some("op.example.com")).await, (StatusCode::OK, "op".into()));
        assert_eq!(get_host(app(), Some("TA.Example.com")).await, (StatusCode::OK, "ta".into()));
        assert_eq!(get_host(app(), Some("ta.example.com.")).await, (StatusCode::OK, "ta".into()));
        assert_eq!(get_host(app(), Some("op.example.com.:8080")).await, (StatusCode::OK, "op".into()));
    }

    #[tokio::test]
    async fn test_unknown_and_missing_host() {
        assert_eq!(get_host(app(), Some("rp.example.com")).await.0, StatusCode::NOT_FOUND);
        assert_eq!(get_host(app(), None).await.0, StatusCode::BAD_REQUEST);
        assert_eq!(get_host(app(), Some(".")).await.0, StatusCode::BAD_REQUEST);
    }
}
