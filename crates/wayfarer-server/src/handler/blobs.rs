//! Serving blobs through signed links.

use axum::extract::{Path, Query, State};
use axum::http::header::{CACHE_CONTROL, CONTENT_TYPE};
use axum::response::{IntoResponse, Response};
use serde::Deserialize;
use wayfarer_guard::GuardError;
use wayfarer_metrics::record_blob_read;

use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub(crate) struct SignedQuery {
    expires: Option<i64>,
    sig: Option<String>,
}

/// Content type from the object's extension.
fn content_type(path: &str) -> &'static str {
    let ext = path.rsplit_once('.').map(|(_, e)| e).unwrap_or("");
    match ext.to_ascii_lowercase().as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "heic" => "image/heic",
        "avif" => "image/avif",
        _ => "application/octet-stream",
    }
}

/// The link itself is the credential; no bearer token is required.
pub(crate) async fn serve(
    State(state): State<AppState>,
    Path(path): Path<String>,
    Query(query): Query<SignedQuery>,
) -> Result<Response, ApiError> {
    let (Some(expires), Some(sig)) = (query.expires, query.sig) else {
        return Err(GuardError::NotFoundOrForbidden.into());
    };
    let data = state.guard.open_signed_blob(&path, expires, &sig).await?;
    record_blob_read(data.len() as u64);
    Ok((
        [
            (CONTENT_TYPE, content_type(&path)),
            (CACHE_CONTROL, "private, no-store"),
        ],
        data,
    )
        .into_response())
}
