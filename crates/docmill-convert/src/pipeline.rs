//! Background document processing pipeline.
//!
//! One `run` per uploaded document: claim the record, pull the raw bytes,
//! convert under a wall-clock deadline, store the markdown, and finish the
//! record. Every failure path ends in `mark_failed` with a user-facing
//! message; the raw error stays in the logs.

use std::sync::Arc;
use std::time::Duration;

use tracing::{error, info, warn};
use uuid::Uuid;

use docmill_core::{
    defaults, processed_object_key, raw_object_key, BlobStore, ConvertBackend, ConvertRequest,
    DocumentRepository, Error, Result,
};

/// Stored when a failure does not map to a more specific user message.
pub const GENERIC_FAILURE_MESSAGE: &str =
    "Document processing failed - please try uploading a different file.";

/// Conversion-error fragments that indicate an unreadable source document
/// rather than an infrastructure fault.
const CORRUPTION_MARKERS: &[&str] = &[
    "password",
    "encrypted",
    "protected",
    "corrupt",
    "damaged",
    "invalid",
];

/// Map a raw pipeline error to the one recorded on the document.
///
/// Timeouts and corruption keep their specific messages; everything else
/// (converter crashes, storage faults) collapses to the generic message so
/// internals never leak to users.
fn classify_failure(err: Error) -> Error {
    match err {
        Error::ProcessingTimeout | Error::CorruptedFile => err,
        other => {
            let text = other.to_string().to_lowercase();
            if CORRUPTION_MARKERS.iter().any(|m| text.contains(m)) {
                Error::CorruptedFile
            } else {
                other
            }
        }
    }
}

fn user_message(err: &Error) -> String {
    match err {
        Error::ProcessingTimeout | Error::CorruptedFile => err.to_string(),
        _ => GENERIC_FAILURE_MESSAGE.to_string(),
    }
}

/// Fire-and-forget document processor.
pub struct ProcessingPipeline {
    repo: Arc<dyn DocumentRepository>,
    store: Arc<dyn BlobStore>,
    converter: Arc<dyn ConvertBackend>,
    timeout: Duration,
}

impl ProcessingPipeline {
    pub fn new(
        repo: Arc<dyn DocumentRepository>,
        store: Arc<dyn BlobStore>,
        converter: Arc<dyn ConvertBackend>,
    ) -> Self {
        Self {
            repo,
            store,
            converter,
            timeout: Duration::from_secs(defaults::PROCESSING_TIMEOUT_SECS),
        }
    }

    /// Override the processing deadline. Used by tests.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Spawn `run` as a detached task. Errors are logged, never surfaced;
    /// the upload response has already been sent by the time this runs.
    pub fn spawn(self: Arc<Self>, id: Uuid) {
        tokio::spawn(async move {
            if let Err(e) = self.run(id).await {
                error!(document_id = %id, error = %e, "document processing task failed");
            }
        });
    }

    /// Process one document end to end.
    pub async fn run(&self, id: Uuid) -> Result<()> {
        // Claim the record. A conflict means another task already owns it
        // (duplicate spawn); back off rather than double-process.
        match self.repo.mark_processing(id).await {
            Ok(()) => {}
            Err(Error::InvalidState(msg)) => {
                warn!(document_id = %id, %msg, "skipping: document not in queued state");
                return Ok(());
            }
            Err(e) => return Err(e),
        }

        let record = self.repo.fetch(id).await?;
        info!(
            document_id = %id,
            filename = %record.filename,
            mode = %record.processing_options.processing_mode.as_str(),
            ocr = record.processing_options.ocr_enabled,
            "processing started"
        );

        match self.convert_and_store(&record.filename, id, record.processing_options.into()).await
        {
            Ok(markdown_len) => {
                self.repo.mark_complete(id).await?;
                info!(document_id = %id, markdown_len, "processing complete");
                Ok(())
            }
            Err(e) => {
                let classified = classify_failure(e);
                let message = user_message(&classified);
                warn!(document_id = %id, error = %classified, "processing failed");
                self.repo.mark_failed(id, &message).await?;
                Ok(())
            }
        }
    }

    async fn convert_and_store(
        &self,
        filename: &str,
        id: Uuid,
        options: docmill_core::ConvertOptions,
    ) -> Result<usize> {
        let raw_key = raw_object_key(id, filename);
        let data = self.store.get(&raw_key).await?;

        let request = ConvertRequest {
            filename: filename.to_string(),
            data,
            options,
        };

        let markdown = match tokio::time::timeout(self.timeout, self.converter.convert(request))
            .await
        {
            Ok(result) => result?,
            Err(_) => return Err(Error::ProcessingTimeout),
        };

        let processed_key = processed_object_key(id, filename);
        self.store
            .put(&processed_key, markdown.as_bytes(), "text/markdown")
            .await?;

        Ok(markdown.len())
    }
}
