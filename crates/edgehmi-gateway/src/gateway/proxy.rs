//! Proxy handlers forwarding requests to table service backends.

use axum::{
    body::Body,
    extract::{Path, State},
    http::{HeaderMap, Request},
    response::Response,
};
use tracing::{debug, info, instrument};

use crate::server::AppState;

use super::error::GatewayError;

/// Handles `/{service}`, the collection root of a table service.
pub async fn proxy_root(
    State(state): State<AppState>,
    Path(service): Path<String>,
    request: Request<Body>,
) -> Result<Response, GatewayError> {
    forward(&state, &service, request).await
}

/// Handles `/{service}/{*rest}`: any sub-path, slashes included.
pub async fn proxy_subpath(
    State(state): State<AppState>,
    Path((service, _rest)): Path<(String, String)>,
    request: Request<Body>,
) -> Result<Response, GatewayError> {
    forward(&state, &service, request).await
}

/// Forwards one request to the backend owning `service` and relays the
/// response unmodified.
///
/// The gateway path equals the backend path (each service namespaces its own
/// routes), so the target is the upstream base plus the original
/// path-and-query, taken raw from the URI to keep percent-encoding intact.
#[instrument(skip(state, request), fields(method = %request.method()))]
async fn forward(
    state: &AppState,
    service: &str,
    request: Request<Body>,
) -> Result<Response, GatewayError> {
    let Some(base) = state.registry.upstream_base(service) else {
        return Err(GatewayError::UnknownService {
            method: request.method().to_string(),
            service: service.to_string(),
        });
    };

    let path_and_query = request
        .uri()
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or("/");
    let target = target_url(base, path_and_query);

    debug!(service, target = %target, "forwarding to table service");

    let (parts, body) = request.into_parts();

    // Hop-by-hop headers stay on this hop; the client derives Host and
    // Content-Length from the target URL and body.
    let mut headers = HeaderMap::new();
    for (name, value) in parts.headers.iter() {
        if is_hop_by_hop_header(name.as_str()) {
            continue;
        }
        headers.append(name.clone(), value.clone());
    }

    let body_bytes = axum::body::to_bytes(body, state.body_limit)
        .await
        .map_err(|e| GatewayError::BadRequest(format!("failed to read request body: {}", e)))?;

    let upstream = state
        .http
        .request(parts.method.clone(), &target)
        .headers(headers)
        .body(body_bytes)
        .timeout(state.request_timeout)
        .send()
        .await
        .map_err(|e| classify_send_error(service, e))?;

    let status = upstream.status();
    info!(service, status = %status, "table service responded");

    let mut builder = Response::builder().status(status);
    for (name, value) in upstream.headers().iter() {
        if !is_hop_by_hop_header(name.as_str()) {
            builder = builder.header(name, value);
        }
    }

    builder
        .body(Body::from_stream(upstream.bytes_stream()))
        .map_err(|e| GatewayError::InternalError(format!("failed to build response: {}", e)))
}

fn classify_send_error(service: &str, e: reqwest::Error) -> GatewayError {
    if e.is_timeout() {
        GatewayError::UpstreamTimeout {
            service: service.to_string(),
        }
    } else {
        GatewayError::UpstreamUnreachable {
            service: service.to_string(),
            detail: e.to_string(),
        }
    }
}

fn target_url(base: &str, path_and_query: &str) -> String {
    format!("{}{}", base.trim_end_matches('/'), path_and_query)
}

/// Checks if a header is a hop-by-hop header that should not be forwarded.
///
/// Hop-by-hop headers are defined in RFC 2616 Section 13.5.1. Host and
/// Content-Length are re-derived for the upstream leg and the relayed leg.
fn is_hop_by_hop_header(name: &str) -> bool {
    matches!(
        name.to_ascii_lowercase().as_str(),
        "connection"
            | "keep-alive"
            | "proxy-authenticate"
            | "proxy-authorization"
            | "te"
            | "trailers"
            | "transfer-encoding"
            | "upgrade"
            | "host"
            | "content-length"
    )
}
