//! Core traits for docmill abstractions.
//!
//! These traits define the seams between the HTTP layer, the processing
//! pipeline, and the backing services, enabling pluggable backends and
//! testability with in-memory fakes.

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::Result;
use crate::models::{CreateDocumentRequest, DocumentRecord, ProcessingMode, ProcessingOptions};

// =============================================================================
// DOCUMENT REPOSITORY
// =============================================================================

/// Repository for document-record persistence and state transitions.
///
/// Transitions are forward-only; each `mark_*` method must be a single
/// atomic write guarded by the expected previous status, and must fail with
/// `Error::InvalidState` when the guard does not match.
#[async_trait]
pub trait DocumentRepository: Send + Sync {
    /// Insert a new record with status `queued`; returns the assigned id.
    async fn insert(&self, req: CreateDocumentRequest) -> Result<Uuid>;

    /// Fetch a record by id.
    async fn fetch(&self, id: Uuid) -> Result<DocumentRecord>;

    /// Transition queued → processing.
    async fn mark_processing(&self, id: Uuid) -> Result<()>;

    /// Transition processing → complete, setting `completed_at`.
    async fn mark_complete(&self, id: Uuid) -> Result<()>;

    /// Transition a non-terminal record to failed, setting `completed_at`
    /// and the user-facing `error_message` in the same write.
    async fn mark_failed(&self, id: Uuid, error_message: &str) -> Result<()>;
}

// =============================================================================
// BLOB STORE
// =============================================================================

/// Key-addressed blob storage with signed-URL capability.
///
/// Keys are bucket-prefixed relative paths (`uploads/{id}/{name}`); blobs
/// are write-once per key in this design.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Store a blob at the given key.
    async fn put(&self, key: &str, data: &[u8], content_type: &str) -> Result<()>;

    /// Fetch a blob by key.
    async fn get(&self, key: &str) -> Result<Vec<u8>>;

    /// Delete a blob. Missing keys are not an error.
    async fn delete(&self, key: &str) -> Result<()>;

    /// Check whether a blob exists.
    async fn exists(&self, key: &str) -> Result<bool>;

    /// Issue a time-limited signed download URL for a stored blob.
    fn signed_url(&self, key: &str, expires_in_secs: u64) -> Result<String>;

    /// Verify a signed-URL signature against a key and expiry timestamp.
    fn verify_signature(&self, key: &str, expires_unix: i64, sig: &str) -> bool;

    /// Reachability probe for health checks.
    async fn check(&self) -> Result<()>;
}

// =============================================================================
// CONVERTER BACKEND
// =============================================================================

/// Options forwarded to the conversion engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConvertOptions {
    /// Run the OCR pass for scanned/image-based pages.
    pub ocr_enabled: bool,
    /// Run full table-structure analysis (quality mode).
    pub table_structure: bool,
}

impl From<ProcessingOptions> for ConvertOptions {
    fn from(opts: ProcessingOptions) -> Self {
        Self {
            ocr_enabled: opts.ocr_enabled,
            table_structure: opts.processing_mode == ProcessingMode::Quality,
        }
    }
}

/// A single conversion request: document bytes plus engine options.
#[derive(Debug, Clone)]
pub struct ConvertRequest {
    pub filename: String,
    pub data: Vec<u8>,
    pub options: ConvertOptions,
}

/// Black-box document-to-markdown converter.
#[async_trait]
pub trait ConvertBackend: Send + Sync {
    /// Convert document bytes to a markdown string.
    async fn convert(&self, req: ConvertRequest) -> Result<String>;
}
