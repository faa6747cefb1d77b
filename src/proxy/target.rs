//! Upstream target construction for the proxied namespace.

use url::Url;

use crate::error::GatewayError;

/// Path prefix that routes a request to the reverse proxy.
pub const API_PREFIX: &str = "/api";

/// Whether a request path belongs to the proxied namespace.
///
/// Matching is prefix-exact: `/api` and `/api/...` match, `/apifoo` does
/// not.
pub fn is_proxy_path(path: &str) -> bool {
    path.strip_prefix(API_PREFIX)
        .map(|rest| rest.is_empty() || rest.starts_with('/'))
        .unwrap_or(false)
}

/// Build the upstream URL for a proxied request.
///
/// The reserved prefix is stripped from `path`; the remainder plus the
/// original query is resolved against `api_base` (which carries no trailing
/// slash).
pub fn build_target(
    api_base: &str,
    path: &str,
    query: Option<&str>,
) -> Result<Url, GatewayError> {
    let suffix = path.strip_prefix(API_PREFIX).unwrap_or(path);

    let mut target = format!("{api_base}{suffix}");
    if let Some(query) = query {
        target.push('?');
        target.push_str(query);
    }

    Url::parse(&target)
        .map_err(|err| GatewayError::Internal(format!("invalid upstream url: {err}")))
}

/// `host[:port]` authority of a target, suitable for a Host header.
pub fn authority(url: &Url) -> String {
    match (url.host_str(), url.port()) {
        (Some(host), Some(port)) => format!("{host}:{port}"),
        (Some(host), None) => host.to_string(),
        _ => String::new(),
    }
}

/// `scheme://host[:port]` origin of a target.
pub fn origin(url: &Url) -> String {
    format!("{}://{}", url.scheme(), authority(url))
}

/// Whether the target requires TLS on the wire.
pub fn is_secure(url: &Url) -> bool {
    matches!(url.scheme(), "https" | "wss")
}

/// Effective connect port for a target (explicit, or the scheme default).
pub fn connect_port(url: &Url) -> u16 {
    url.port_or_known_default()
        .unwrap_or(if is_secure(url) { 443 } else { 80 })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefix_matching_is_exact() {
        assert!(is_proxy_path("/api"));
        assert!(is_proxy_path("/api/"));
        assert!(is_proxy_path("/api/chats"));
        assert!(!is_proxy_path("/apifoo"));
        assert!(!is_proxy_path("/config"));
        assert!(!is_proxy_path("/"));
    }

    #[test]
    fn target_preserves_suffix_and_query() {
        let url = build_target("https://backend.example/v1", "/api/chats", Some("x=1")).unwrap();
        assert_eq!(url.as_str(), "https://backend.example/v1/chats?x=1");
    }

    #[test]
    fn bare_prefix_maps_to_backend_root() {
        let url = build_target("https://backend.example", "/api", None).unwrap();
        assert_eq!(url.path(), "/");
        assert!(url.query().is_none());
    }

    #[test]
    fn authority_keeps_explicit_ports_only() {
        let url = Url::parse("https://backend.example/v1").unwrap();
        assert_eq!(authority(&url), "backend.example");
        assert_eq!(origin(&url), "https://backend.example");

        let url = Url::parse("http://127.0.0.1:8080/v1").unwrap();
        assert_eq!(authority(&url), "127.0.0.1:8080");
        assert_eq!(origin(&url), "http://127.0.0.1:8080");
    }

    #[test]
    fn connect_port_falls_back_to_scheme_default() {
        let url = Url::parse("https://backend.example").unwrap();
        assert_eq!(connect_port(&url), 443);
        assert!(is_secure(&url));

        let url = Url::parse("http://backend.example:9090").unwrap();
        assert_eq!(connect_port(&url), 9090);
        assert!(!is_secure(&url));
    }
}
