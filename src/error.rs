//! Gateway error taxonomy.
//!
//! # Responsibilities
//! - Classify per-request failures (traversal, missing asset, proxy errors)
//! - Convert every failure into an HTTP response at the request boundary
//!
//! # Design Decisions
//! - Proxy-path errors carry machine-readable JSON bodies; static-asset
//!   errors stay plain text
//! - Nothing here is allowed to take down the accept loop

use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use serde_json::json;

/// Errors that can surface while handling a single request.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// The request path resolved outside the static root.
    #[error("path escapes the static root")]
    PathTraversal,

    /// The requested asset does not exist.
    #[error("asset not found")]
    NotFound,

    /// The proxy was reached while no backend base URL is configured.
    #[error("api base is not configured")]
    BackendNotConfigured,

    /// The upstream could not be reached or dropped the connection before
    /// producing a response.
    #[error("upstream connect failure: {0}")]
    UpstreamConnect(String),

    /// Catch-all for unexpected failures.
    #[error("internal error: {0}")]
    Internal(String),
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        match self {
            GatewayError::PathTraversal => (StatusCode::FORBIDDEN, "Forbidden").into_response(),
            GatewayError::NotFound => (StatusCode::NOT_FOUND, "Not Found").into_response(),
            GatewayError::BackendNotConfigured => {
                json_error(StatusCode::INTERNAL_SERVER_ERROR, "apiBase_not_configured")
            }
            GatewayError::UpstreamConnect(_) => json_error(StatusCode::BAD_GATEWAY, "proxy_error"),
            GatewayError::Internal(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error").into_response()
            }
        }
    }
}

fn json_error(status: StatusCode, code: &str) -> Response {
    (
        status,
        [(header::CONTENT_TYPE, "application/json; charset=utf-8")],
        json!({ "error": code }).to_string(),
    )
        .into_response()
}
