//! Maps request paths to files inside the static root.
//!
//! # Responsibilities
//! - Percent-decode the request path without ever failing
//! - Confine every candidate to the static root (traversal → 403)
//! - Default `/` and directory-shaped paths to `index.html`

use std::path::{Component, Path, PathBuf};

use percent_encoding::percent_decode_str;

use crate::error::GatewayError;

/// Decode a percent-encoded path, falling back to the raw string when the
/// encoding is invalid.
pub fn safe_decode(path: &str) -> String {
    match percent_decode_str(path).decode_utf8() {
        Ok(decoded) => decoded.into_owned(),
        Err(_) => path.to_string(),
    }
}

/// Resolve a URL path to an absolute file path confined to `root`.
///
/// The candidate is normalized lexically; any `..` that would climb past
/// the root is a [`GatewayError::PathTraversal`].
pub fn resolve(root: &Path, url_path: &str) -> Result<PathBuf, GatewayError> {
    let decoded = safe_decode(url_path);

    let mut rel = decoded.trim_start_matches('/').to_string();
    if rel.is_empty() || rel.ends_with('/') {
        rel.push_str("index.html");
    }

    let mut resolved = root.to_path_buf();
    for component in Path::new(&rel).components() {
        match component {
            Component::Normal(part) => resolved.push(part),
            Component::CurDir => {}
            Component::ParentDir => {
                if !resolved.pop() || !resolved.starts_with(root) {
                    return Err(GatewayError::PathTraversal);
                }
            }
            // A relative candidate cannot legitimately contain rooted or
            // prefixed components.
            Component::RootDir | Component::Prefix(_) => {
                return Err(GatewayError::PathTraversal);
            }
        }
    }

    if resolved != *root && !resolved.starts_with(root) {
        return Err(GatewayError::PathTraversal);
    }

    Ok(resolved)
}
