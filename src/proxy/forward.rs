//! HTTP reverse proxy for the reserved `/api` namespace.
//!
//! # Responsibilities
//! - Answer CORS preflights locally, without contacting the upstream
//! - Build the upstream target from the reserved prefix and `apiBase`
//! - Sanitize headers in both directions
//! - Stream request and response bodies without buffering
//!
//! # Design Decisions
//! - Redirects are passed through untouched; the embedded UI decides what
//!   to do with them
//! - A missing `apiBase` is surfaced as a structured 500, never swallowed:
//!   it means the embedding host is misconfigured

use axum::body::Body;
use axum::extract::Request;
use axum::http::{header, HeaderMap, HeaderValue, Method, StatusCode};
use axum::response::{IntoResponse, Response};

use crate::config::RuntimeConfig;
use crate::error::GatewayError;
use crate::proxy::{headers, target};

/// Methods advertised on preflight responses.
const ALLOW_METHODS: &str = "GET,POST,PUT,PATCH,DELETE,OPTIONS";

/// Forward a request under the reserved prefix to the configured backend.
pub async fn forward(client: &reqwest::Client, runtime: &RuntimeConfig, req: Request) -> Response {
    if req.method() == Method::OPTIONS {
        return preflight(req.headers());
    }

    match forward_inner(client, runtime, req).await {
        Ok(response) => response,
        Err(err) => {
            tracing::warn!(error = %err, "proxy request failed");
            err.into_response()
        }
    }
}

/// The browser-side client always believes it is talking cross-origin;
/// answer permissively and echo whatever headers it asked for.
fn preflight(request_headers: &HeaderMap) -> Response {
    let allow_headers = request_headers
        .get(header::ACCESS_CONTROL_REQUEST_HEADERS)
        .cloned()
        .unwrap_or_else(|| HeaderValue::from_static("*"));

    (
        StatusCode::NO_CONTENT,
        [
            (
                header::ACCESS_CONTROL_ALLOW_ORIGIN,
                HeaderValue::from_static("*"),
            ),
            (
                header::ACCESS_CONTROL_ALLOW_METHODS,
                HeaderValue::from_static(ALLOW_METHODS),
            ),
            (header::ACCESS_CONTROL_ALLOW_HEADERS, allow_headers),
            (header::ACCESS_CONTROL_MAX_AGE, HeaderValue::from_static("600")),
        ],
    )
        .into_response()
}

async fn forward_inner(
    client: &reqwest::Client,
    runtime: &RuntimeConfig,
    req: Request,
) -> Result<Response, GatewayError> {
    let api_base = runtime
        .api_base()
        .ok_or(GatewayError::BackendNotConfigured)?;

    let target_url = target::build_target(api_base, req.uri().path(), req.uri().query())?;

    let (parts, body) = req.into_parts();

    // Decide body handling before sanitization removes the framing headers.
    let request_has_body = parts
        .headers
        .get(header::CONTENT_LENGTH)
        .and_then(|value| value.to_str().ok())
        .map(|value| value != "0")
        .unwrap_or(false)
        || parts.headers.contains_key(header::TRANSFER_ENCODING);

    let mut outbound_headers = parts.headers;
    headers::rewrite_outbound(&mut outbound_headers, &target_url);
    // The outbound client frames the streamed body itself.
    outbound_headers.remove(header::CONTENT_LENGTH);

    tracing::debug!(method = %parts.method, upstream = %target_url, "proxying request");

    let mut outbound = client
        .request(parts.method, target_url)
        .headers(outbound_headers);
    if request_has_body {
        outbound = outbound.body(reqwest::Body::wrap_stream(body.into_data_stream()));
    }

    let upstream = outbound
        .send()
        .await
        .map_err(|err| GatewayError::UpstreamConnect(err.to_string()))?;

    let status = upstream.status();
    let mut response_headers = upstream.headers().clone();
    headers::sanitize_response(&mut response_headers);

    let mut response = Response::builder()
        .status(status)
        .body(Body::from_stream(upstream.bytes_stream()))
        .map_err(|err| GatewayError::Internal(err.to_string()))?;
    *response.headers_mut() = response_headers;

    Ok(response)
}
