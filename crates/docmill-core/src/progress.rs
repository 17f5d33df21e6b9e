//! Progress estimation for polling clients.
//!
//! The converter gives no progress feedback, so the percentage is estimated
//! from elapsed wall-clock time and the selected processing options. The
//! estimate is monotonic in elapsed time for a fixed status, and 100 is
//! reserved exclusively for the complete state so a polling client never
//! sees a premature "done".

use crate::defaults::{FAST_MODE_BASE_SECS, OCR_TIME_MULTIPLIER, QUALITY_MODE_BASE_SECS};
use crate::models::{DocumentStatus, ProcessingMode, ProcessingOptions};

/// Estimated total conversion time in seconds for the given options.
fn estimated_total_secs(options: ProcessingOptions) -> i64 {
    let base = match options.processing_mode {
        ProcessingMode::Fast => FAST_MODE_BASE_SECS,
        ProcessingMode::Quality => QUALITY_MODE_BASE_SECS,
    };
    let multiplier = if options.ocr_enabled {
        OCR_TIME_MULTIPLIER
    } else {
        1
    };
    base * multiplier
}

/// Human-readable stage label for the current status and elapsed time.
pub fn progress_stage(status: DocumentStatus, elapsed_seconds: i64) -> &'static str {
    let elapsed = elapsed_seconds.max(0);
    match status {
        DocumentStatus::Failed => "Processing failed",
        DocumentStatus::Complete => "Processing complete",
        DocumentStatus::Queued => {
            if elapsed < 5 {
                "Uploading file..."
            } else {
                "Queued for processing"
            }
        }
        DocumentStatus::Processing => {
            if elapsed > 100 {
                "Finalizing..."
            } else {
                "Converting document"
            }
        }
    }
}

/// Estimated completion percentage, 0..=100.
///
/// Queued covers 0-10, processing covers 10-95 scaled against the
/// option-dependent time estimate, and 100 appears only for complete.
pub fn progress_percent(
    status: DocumentStatus,
    elapsed_seconds: i64,
    options: ProcessingOptions,
) -> i32 {
    let elapsed = elapsed_seconds.max(0);
    match status {
        DocumentStatus::Failed => 0,
        DocumentStatus::Complete => 100,
        DocumentStatus::Queued => elapsed.min(10) as i32,
        DocumentStatus::Processing => {
            let estimated = estimated_total_secs(options).max(1);
            let scaled = (elapsed * 80 / estimated).min(80);
            ((10 + scaled) as i32).min(95)
        }
    }
}
