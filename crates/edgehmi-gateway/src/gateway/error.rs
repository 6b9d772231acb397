//! Gateway-specific error types.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use std::fmt;

/// Errors surfaced by the forwarding layer.
///
/// Aggregation never produces one of these: an unreachable or malformed
/// backend document is an empty contribution, not an error response.
#[derive(Debug)]
pub enum GatewayError {
    /// Request named a service the registry does not know.
    UnknownService { method: String, service: String },

    /// Backend connection refused or could not be resolved.
    UpstreamUnreachable { service: String, detail: String },

    /// Backend did not answer within the configured deadline.
    UpstreamTimeout { service: String },

    /// The incoming request could not be read.
    BadRequest(String),

    /// Generic internal error.
    InternalError(String),
}

impl fmt::Display for GatewayError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownService { method, service } => {
                write!(f, "No table service registered for {} /{}", method, service)
            }
            Self::UpstreamUnreachable { service, detail } => {
                write!(f, "Table service {} unreachable: {}", service, detail)
            }
            Self::UpstreamTimeout { service } => {
                write!(f, "Table service {} timed out", service)
            }
            Self::BadRequest(msg) => write!(f, "Bad request: {}", msg),
            Self::InternalError(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for GatewayError {}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let (status, code) = match &self {
            Self::UnknownService { .. } => (StatusCode::NOT_FOUND, "unknown-service"),
            Self::UpstreamUnreachable { .. } => (StatusCode::BAD_GATEWAY, "upstream-unreachable"),
            Self::UpstreamTimeout { .. } => (StatusCode::GATEWAY_TIMEOUT, "upstream-timeout"),
            Self::BadRequest(_) => (StatusCode::BAD_REQUEST, "bad-request"),
            Self::InternalError(_) => (StatusCode::INTERNAL_SERVER_ERROR, "internal"),
        };

        let body = json!({
            "error": {
                "code": code,
                "message": self.to_string(),
            }
        });

        (status, Json(body)).into_response()
    }
}
