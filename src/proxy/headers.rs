//! Header sanitization for the proxied path.
//!
//! # Responsibilities
//! - Strip hop-by-hop headers in both directions
//! - Rewrite `host`, `origin` and `referer` so the upstream sees itself as
//!   the first party
//! - Neutralize response headers that would stop the embedded UI from
//!   consuming the payload

use axum::http::header::{self, HeaderMap, HeaderValue};
use url::Url;

use crate::proxy::target;

/// Hop-by-hop headers that must never cross the proxy boundary.
const HOP_BY_HOP: &[&str] = &[
    "connection",
    "proxy-connection",
    "keep-alive",
    "transfer-encoding",
    "upgrade",
];

/// Response headers the embedding page must never receive.
const BLOCKED_RESPONSE: &[&str] = &[
    "content-security-policy",
    "content-security-policy-report-only",
];

/// Remove hop-by-hop headers, including any named in `Connection:`.
pub fn strip_hop_by_hop(headers: &mut HeaderMap) {
    let named: Vec<String> = headers
        .get(header::CONNECTION)
        .and_then(|value| value.to_str().ok())
        .map(|value| {
            value
                .split(',')
                .map(|token| token.trim().to_ascii_lowercase())
                .filter(|token| !token.is_empty())
                .collect()
        })
        .unwrap_or_default();
    for name in named {
        headers.remove(name.as_str());
    }

    for name in HOP_BY_HOP {
        headers.remove(*name);
    }
}

/// Rewrite request headers for forwarding to `target_url`.
///
/// `host` becomes the upstream authority; `origin` and `referer`, when
/// present, move onto the upstream origin (the referer keeps its original
/// path and query).
pub fn rewrite_outbound(headers: &mut HeaderMap, target_url: &Url) {
    strip_hop_by_hop(headers);

    if let Ok(value) = HeaderValue::from_str(&target::authority(target_url)) {
        headers.insert(header::HOST, value);
    }

    let upstream_origin = target::origin(target_url);
    if headers.contains_key(header::ORIGIN) {
        if let Ok(value) = HeaderValue::from_str(&upstream_origin) {
            headers.insert(header::ORIGIN, value);
        }
    }

    let referer = headers
        .get(header::REFERER)
        .and_then(|value| value.to_str().ok())
        .map(|referer| rewrite_referer(referer, &upstream_origin));
    if let Some(referer) = referer {
        if let Ok(value) = HeaderValue::from_str(&referer) {
            headers.insert(header::REFERER, value);
        }
    }
}

fn rewrite_referer(referer: &str, upstream_origin: &str) -> String {
    match Url::parse(referer) {
        Ok(parsed) => {
            let mut rewritten = format!("{}{}", upstream_origin, parsed.path());
            if let Some(query) = parsed.query() {
                rewritten.push('?');
                rewritten.push_str(query);
            }
            rewritten
        }
        Err(_) => upstream_origin.to_string(),
    }
}

/// Sanitize upstream response headers before they reach the embedded UI.
///
/// The page always treats proxied calls as trusted first-party traffic, so
/// `access-control-allow-origin` is forced to `*` regardless of what the
/// upstream sent.
pub fn sanitize_response(headers: &mut HeaderMap) {
    strip_hop_by_hop(headers);

    for name in BLOCKED_RESPONSE {
        headers.remove(*name);
    }

    // Re-framed by the local server side.
    headers.remove(header::CONTENT_LENGTH);

    headers.insert(
        header::ACCESS_CONTROL_ALLOW_ORIGIN,
        HeaderValue::from_static("*"),
    );
}
