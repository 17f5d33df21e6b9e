//! Converted-markdown download endpoint.

use axum::extract::{Path, State};
use axum::http::{header, HeaderMap, HeaderValue, StatusCode};
use axum::response::IntoResponse;
use uuid::Uuid;

use docmill_core::{
    processed_object_key, safe_filename, BlobStore, DocumentRepository, DocumentStatus, Error,
};

use crate::error::{ApiError, RequestMeta};
use crate::state::AppState;

pub async fn download_document(
    State(state): State<AppState>,
    meta: RequestMeta,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let record = state.db.documents.fetch(id).await.map_err(|e| meta.fail(e))?;

    if record.status != DocumentStatus::Complete {
        return Err(meta.fail(Error::InvalidState(format!(
            "Document is not ready for download - current status: {}",
            record.status
        ))));
    }

    let key = processed_object_key(id, &record.filename);
    let data = state.store.get(&key).await.map_err(|e| meta.fail(e))?;

    // The attachment filename is re-derived from the stored original; it is
    // never trusted verbatim in a header.
    let attachment_name = safe_filename(&record.filename, "document.md");
    let disposition = format!("attachment; filename=\"{attachment_name}\"");

    let mut headers = HeaderMap::new();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("text/markdown; charset=utf-8"),
    );
    headers.insert(
        header::CONTENT_DISPOSITION,
        HeaderValue::from_str(&disposition)
            .map_err(|_| meta.fail(Error::Internal("invalid attachment name".to_string())))?,
    );
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
