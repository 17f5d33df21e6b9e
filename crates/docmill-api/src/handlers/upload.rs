//! Document upload endpoint.
//!
//! Accepts a multipart form with a `file` part plus optional `ocr_enabled`
//! and `processing_mode` fields, validates the upload, persists the raw
//! bytes, and fires the background conversion task. The response returns
//! as soon as the record and blob are durable; conversion progress is
//! observed via the status endpoint.

use axum::extract::{Multipart, State};
use axum::Json;
use serde::Serialize;
use tracing::{info, warn};

use docmill_core::{
    defaults, detect_content_type, is_allowed_document_type, raw_object_key, validate_filename,
    BlobStore, CreateDocumentRequest, DocumentRepository, Error, ProcessingMode,
    ProcessingOptions,
};

use crate::error::{ApiError, RequestMeta};
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub id: uuid::Uuid,
    pub filename: String,
    pub status: &'static str,
}

struct UploadForm {
    filename: String,
    claimed_type: String,
    data: Vec<u8>,
    options: ProcessingOptions,
}

/// Form booleans arrive as text; only the exact literals are accepted.
fn parse_bool_field(name: &str, value: &str) -> Result<bool, Error> {
    match value {
        "true" | "1" => Ok(true),
        "false" | "0" => Ok(false),
        other => Err(Error::InvalidInput(format!(
            "Invalid {name} '{other}' - must be 'true' or 'false'"
        ))),
    }
}

async fn read_form(multipart: &mut Multipart) -> Result<UploadForm, Error> {
    let mut file: Option<(String, String, Vec<u8>)> = None;
    let mut options = ProcessingOptions::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| Error::InvalidInput(format!("Malformed multipart body: {e}")))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "file" => {
                let filename = field
                    .file_name()
                    .map(String::from)
                    .ok_or_else(|| Error::InvalidInput("No filename provided".to_string()))?;
                let claimed_type = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_string();
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| Error::InvalidInput(format!("Failed to read file: {e}")))?;
                file = Some((filename, claimed_type, data.to_vec()));
            }
            "ocr_enabled" => {
                let value = field
                    .text()
                    .await
                    .map_err(|e| Error::InvalidInput(format!("Malformed field: {e}")))?;
                options.ocr_enabled = parse_bool_field("ocr_enabled", &value)?;
            }
            "processing_mode" => {
                let value = field
                    .text()
                    .await
                    .map_err(|e| Error::InvalidInput(format!("Malformed field: {e}")))?;
                options.processing_mode = ProcessingMode::parse(&value)?;
            }
            // Unknown fields are ignored
            _ => {}
        }
    }

    let (filename, claimed_type, data) =
        file.ok_or_else(|| Error::InvalidInput("No file provided".to_string()))?;

    Ok(UploadForm {
        filename,
        claimed_type,
        data,
        options,
    })
}

fn validate_upload(form: &UploadForm) -> Result<String, Error> {
    if form.data.is_empty() {
        return Err(Error::InvalidInput("Uploaded file is empty".to_string()));
    }
    if form.data.len() > defaults::MAX_UPLOAD_SIZE_BYTES {
        return Err(Error::file_too_large(
            form.data.len(),
            defaults::MAX_UPLOAD_SIZE_BYTES,
        ));
    }

    // The filename is embedded verbatim in the raw storage key, so it must
    // be safe before any storage call happens.
    if !validate_filename(&form.filename, 255) {
        return Err(Error::InvalidInput(format!(
            "Invalid filename '{}'",
            form.filename
        )));
    }

    let detected = detect_content_type(&form.filename, &form.data, &form.claimed_type);
    if !is_allowed_document_type(&detected) {
        return Err(Error::UnsupportedFormat { detected });
    }
    Ok(detected)
}

pub async fn upload_document(
    State(state): State<AppState>,
    meta: RequestMeta,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, ApiError> {
    let form = read_form(&mut multipart).await.map_err(|e| meta.fail(e))?;
    let detected_type = validate_upload(&form).map_err(|e| meta.fail(e))?;

    let id = state
        .db
        .documents
        .insert(CreateDocumentRequest {
            filename: form.filename.clone(),
            processing_options: form.options,
            file_size: Some(form.data.len() as i64),
            content_type: Some(detected_type.clone()),
        })
        .await
        .map_err(|e| meta.fail(e))?;

    let raw_key = raw_object_key(id, &form.filename);
    if let Err(e) = state.store.put(&raw_key, &form.data, &detected_type).await {
        warn!(document_id = %id, error = %e, "raw upload storage failed");
        // The record exists but the bytes never landed; fail it so the
        // client sees a terminal status instead of a stuck queue.
        if let Err(mark_err) = state
            .db
            .documents
            .mark_failed(id, "Upload failed - please try again.")
            .await
        {
            warn!(document_id = %id, error = %mark_err, "failed to mark document failed");
        }
        return Err(meta.fail(e));
    }

    info!(
        document_id = %id,
        filename = %form.filename,
        size = form.data.len(),
        content_type = %detected_type,
        mode = form.options.processing_mode.as_str(),
        ocr = form.options.ocr_enabled,
        "upload accepted"
    );

    state.pipeline.clone().spawn(id);

    Ok(Json(UploadResponse {
        id,
        filename: form.filename,
        status: "queued",
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bool_coercion_accepts_exact_literals() {
        assert!(parse_bool_field("ocr_enabled", "true").unwrap());
        assert!(parse_bool_field("ocr_enabled", "1").unwrap());
        assert!(!parse_bool_field("ocr_enabled", "false").unwrap());
        assert!(!parse_bool_field("ocr_enabled", "0").unwrap());
    }

    #[test]
    fn test_bool_coercion_rejects_variants() {
        for v in ["True", "FALSE", "yes", "on", ""] {
            assert!(parse_bool_field("ocr_enabled", v).is_err(), "{v:?}");
        }
    }

    fn form(filename: &str, data: &[u8]) -> UploadForm {
        UploadForm {
            filename: filename.to_string(),
            claimed_type: "application/pdf".to_string(),
            data: data.to_vec(),
            options: ProcessingOptions::default(),
        }
    }

    #[test]
    fn test_validate_accepts_pdf() {
        let detected = validate_upload(&form("report.pdf", b"%PDF-1.7 body")).unwrap();
        assert_eq!(detected, "application/pdf");
    }

    #[test]
    fn test_validate_rejects_oversize() {
        let big = vec![0u8; defaults::MAX_UPLOAD_SIZE_BYTES + 1];
        let mut f = form("report.pdf", b"");
        f.data = big;
        assert!(matches!(
            validate_upload(&f).unwrap_err(),
            Error::FileTooLarge { .. }
        ));
    }

    #[test]
    fn test_validate_rejects_fake_pdf() {
        let err = validate_upload(&form("report.pdf", b"plain text pretending")).unwrap_err();
        assert!(matches!(err, Error::UnsupportedFormat { .. }));
    }

    #[test]
    fn test_validate_rejects_traversal_filename() {
        let err = validate_upload(&form("../../etc/passwd", b"%PDF-1.7")).unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }

    #[test]
    fn test_validate_rejects_empty_file() {
        let err = validate_upload(&form("report.pdf", b"")).unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }
}
