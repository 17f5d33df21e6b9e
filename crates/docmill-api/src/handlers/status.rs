//! Status polling endpoint.

use axum::extract::{Path, State};
use axum::Json;
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use docmill_core::{
    defaults, processed_object_key, progress_percent, progress_stage, BlobStore,
    DocumentRepository, DocumentStatus, ProcessingOptions,
};

use crate::error::{ApiError, RequestMeta};
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub id: Uuid,
    pub filename: String,
    pub status: DocumentStatus,
    pub processing_options: ProcessingOptions,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    /// User-facing failure message; set only for failed documents.
    pub error_message: Option<String>,
    /// Seconds since upload; frozen at completion for terminal states.
    pub elapsed_time: i64,
    pub progress_stage: &'static str,
    /// Estimated completion percentage, 0..=100. 100 only when complete.
    pub progress: i32,
    /// Signed markdown download URL; present only for complete documents.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub download_url: Option<String>,
}

pub async fn document_status(
    State(state): State<AppState>,
    meta: RequestMeta,
    Path(id): Path<Uuid>,
) -> Result<Json<StatusResponse>, ApiError> {
    let record = state.db.documents.fetch(id).await.map_err(|e| meta.fail(e))?;

    let elapsed = record.elapsed_seconds(Utc::now());
    let progress = progress_percent(record.status, elapsed, record.processing_options);
    let stage = progress_stage(record.status, elapsed);

    let download_url = if record.status == DocumentStatus::Complete {
        let key = processed_object_key(id, &record.filename);
        Some(
            state
                .store
                .signed_url(&key, defaults::SIGNED_URL_TTL_SECS)
                .map_err(|e| meta.fail(e))?,
        )
    } else {
        None
    };

    Ok(Json(StatusResponse {
        id: record.id,
        filename: record.filename,
        status: record.status,
        processing_options: record.processing_options,
        created_at: record.created_at,
        completed_at: record.completed_at,
        error_message: record.error_message,
        elapsed_time: elapsed,
        progress_stage: stage,
        progress,
        download_url,
    }))
}
