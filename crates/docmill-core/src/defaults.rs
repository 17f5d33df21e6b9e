//! Centralized default constants for the docmill system.
//!
//! **This module is the single source of truth** for all shared default
//! values. The crates reference these constants instead of defining their
//! own magic numbers.

// =============================================================================
// UPLOAD
// =============================================================================

/// Maximum accepted upload size in bytes (10 MiB).
pub const MAX_UPLOAD_SIZE_BYTES: usize = 10 * 1024 * 1024;

/// Maximum accepted upload size in whole megabytes, for user-facing messages.
pub const MAX_UPLOAD_SIZE_MB: u64 = 10;

// =============================================================================
// STORAGE
// =============================================================================

/// Bucket prefix for raw uploaded documents.
pub const UPLOADS_BUCKET: &str = "uploads";

/// Bucket prefix for converted markdown output.
pub const PROCESSED_BUCKET: &str = "processed";

/// Default time-to-live for signed download URLs, in seconds.
pub const SIGNED_URL_TTL_SECS: u64 = 3600;

/// Default base directory for the filesystem blob store.
pub const BLOB_STORAGE_PATH: &str = "/var/lib/docmill/blobs";

// =============================================================================
// PROCESSING
// =============================================================================

/// Wall-clock budget for a single conversion, in seconds (5 minutes).
pub const PROCESSING_TIMEOUT_SECS: u64 = 300;

/// Fallback base name when sanitization empties a filename.
pub const FALLBACK_BASENAME: &str = "document";

/// Maximum sanitized base-name length before the extension is re-appended.
pub const MAX_CLEAN_BASENAME_LEN: usize = 200;

// =============================================================================
// PROGRESS ESTIMATION
// =============================================================================

/// Estimated conversion time for fast mode, in seconds.
pub const FAST_MODE_BASE_SECS: i64 = 30;

/// Estimated conversion time for quality mode, in seconds.
pub const QUALITY_MODE_BASE_SECS: i64 = 90;

/// Multiplier applied to the estimate when OCR is enabled.
pub const OCR_TIME_MULTIPLIER: i64 = 2;

// =============================================================================
// SERVER
// =============================================================================

/// Default HTTP server port.
pub const SERVER_PORT: u16 = 3000;

/// Default rate limit: max requests per period.
pub const RATE_LIMIT_REQUESTS: u64 = 100;

/// Default rate limit: period in seconds.
pub const RATE_LIMIT_PERIOD_SECS: u64 = 60;

// =============================================================================
// CONVERTER
// =============================================================================

/// Default URL of the document conversion sidecar.
pub const CONVERTER_URL: &str = "http://localhost:5001";

/// HTTP request timeout for the converter client, in seconds.
///
/// Slightly above [`PROCESSING_TIMEOUT_SECS`] so the pipeline's own timeout
/// fires first and produces the timeout classification.
pub const CONVERTER_REQUEST_TIMEOUT_SECS: u64 = 330;
