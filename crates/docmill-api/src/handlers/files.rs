//! Signed-URL redemption endpoint.
//!
//! Serves a stored blob if and only if the request carries a valid,
//! unexpired signature issued by the blob store.

use axum::extract::{Path, Query, State};
use axum::http::{header, HeaderMap, HeaderValue, StatusCode};
use axum::response::IntoResponse;
use serde::Deserialize;
use tracing::warn;

use docmill_core::BlobStore;

use crate::error::{ApiError, RequestMeta};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct SignedFileQuery {
    pub expires: i64,
    pub sig: String,
}

pub async fn serve_signed_file(
    State(state): State<AppState>,
    meta: RequestMeta,
    Path(key): Path<String>,
    Query(query): Query<SignedFileQuery>,
) -> Result<impl IntoResponse, ApiError> {
    if !state.store.verify_signature(&key, query.expires, &query.sig) {
        warn!(storage_key = %key, "rejected signed file request");
        return Err(meta
            .fail(ApiError::forbidden(
                "INVALID_SIGNATURE",
                "Signed URL is invalid or expired.",
            )));
    }

    let data = state.store.get(&key).await.map_err(|e| meta.fail(e))?;

    let content_type = if key.starts_with("processed/") {
        "text/markdown; charset=utf-8"
    } else {
        "application/octet-stream"
    };

    let mut headers = HeaderMap::new();
    headers.insert(header::CONTENT_TYPE, HeaderValue::from_static(content_type));
    headers.insert(
        header::X_CONTENT_TYPE_OPTIONS,
        HeaderValue::from_static("nosniff"),
    );
    headers.insert(
        header::CACHE_CONTROL,
        HeaderValue::from_static("no-cache, no-store, must-revalidate"),
    );

    Ok((StatusCode::OK, headers, data))
}
