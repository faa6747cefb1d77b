//! Content-type and cache-policy tables for served assets.

/// Long-lived client cache. Non-HTML assets are content-hashed by the
/// frontend build, so they can be treated as immutable.
pub const CACHE_IMMUTABLE: &str = "public, max-age=31536000, immutable";

/// HTML is the navigation entry point and must pick up redeploys.
pub const CACHE_NO_CACHE: &str = "no-cache";

/// Map a lowercase file extension to its content type.
pub fn content_type_for(ext: &str) -> &'static str {
    match ext {
        "html" => "text/html; charset=utf-8",
        "js" => "application/javascript; charset=utf-8",
        "css" => "text/css; charset=utf-8",
        "json" => "application/json; charset=utf-8",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "svg" => "image/svg+xml",
        "ico" => "image/x-icon",
        "txt" => "text/plain; charset=utf-8",
        "webp" => "image/webp",
        "woff" => "font/woff",
        "woff2" => "font/woff2",
        _ => "application/octet-stream",
    }
}

/// Cache directive for a file extension.
pub fn cache_control_for(ext: &str) -> &'static str {
    if ext == "html" {
        CACHE_NO_CACHE
    } else {
        CACHE_IMMUTABLE
    }
}
