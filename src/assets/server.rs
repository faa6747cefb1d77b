//! Serves resolved files with content-type and cache headers.

use std::path::Path;

use axum::body::Body;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};

use crate::assets::{mime, resolver};
use crate::error::GatewayError;

/// Serve the file addressed by `url_path` from `root`.
///
/// Failures are converted into responses here; callers never see an error.
pub async fn serve(root: &Path, url_path: &str) -> Response {
    match serve_inner(root, url_path).await {
        Ok(response) => response,
        Err(err) => {
            if matches!(err, GatewayError::PathTraversal) {
                tracing::warn!(path = %url_path, "blocked static path traversal attempt");
            }
            err.into_response()
        }
    }
}

async fn serve_inner(root: &Path, url_path: &str) -> Result<Response, GatewayError> {
    let mut file_path = resolver::resolve(root, url_path)?;

    // A resolved directory transparently serves its index.html.
    if let Ok(meta) = tokio::fs::metadata(&file_path).await {
        if meta.is_dir() {
            file_path.push("index.html");
        }
    }

    let contents = match tokio::fs::read(&file_path).await {
        Ok(contents) => contents,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            return Err(GatewayError::NotFound)
        }
        Err(err) => return Err(GatewayError::Internal(err.to_string())),
    };

    let ext = file_path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase())
        .unwrap_or_default();

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, mime::content_type_for(&ext)),
            (header::CACHE_CONTROL, mime::cache_control_for(&ext)),
        ],
        Body::from(contents),
    )
        .into_response())
}
