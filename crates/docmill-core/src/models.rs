//! Core data models for docmill.
//!
//! These types are shared across all docmill crates and represent the
//! document-record entity and its lifecycle.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{Error, Result};

// =============================================================================
// DOCUMENT LIFECYCLE
// =============================================================================

/// Processing status of a document.
///
/// Transitions only forward: `Queued` → `Processing` → `Complete` | `Failed`.
/// `Complete` and `Failed` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentStatus {
    Queued,
    Processing,
    Complete,
    Failed,
}

impl DocumentStatus {
    /// Database/wire representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentStatus::Queued => "queued",
            DocumentStatus::Processing => "processing",
            DocumentStatus::Complete => "complete",
            DocumentStatus::Failed => "failed",
        }
    }

    /// Parse the database representation. Strict: unknown values are an
    /// internal error, caught at the DB boundary.
    pub fn parse(s: &str) -> Result<Self> {
        match s {
            "queued" => Ok(DocumentStatus::Queued),
            "processing" => Ok(DocumentStatus::Processing),
            "complete" => Ok(DocumentStatus::Complete),
            "failed" => Ok(DocumentStatus::Failed),
            other => Err(Error::Internal(format!("unknown document status: {other}"))),
        }
    }

    /// True for `Complete` and `Failed`.
    pub fn is_terminal(&self) -> bool {
        matches!(self, DocumentStatus::Complete | DocumentStatus::Failed)
    }
}

impl std::fmt::Display for DocumentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Conversion mode selected at upload time.
///
/// Fast skips table-structure analysis; quality runs the full structural
/// pass. The form value is matched case-sensitively: `"Fast"` is rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProcessingMode {
    #[default]
    Fast,
    Quality,
}

impl ProcessingMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProcessingMode::Fast => "fast",
            ProcessingMode::Quality => "quality",
        }
    }

    /// Case-sensitive parse of a form/database value.
    pub fn parse(s: &str) -> Result<Self> {
        match s {
            "fast" => Ok(ProcessingMode::Fast),
            "quality" => Ok(ProcessingMode::Quality),
            other => Err(Error::InvalidInput(format!(
                "Invalid processing_mode '{other}' - must be 'fast' or 'quality'"
            ))),
        }
    }
}

/// Options controlling a single conversion run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ProcessingOptions {
    #[serde(default)]
    pub ocr_enabled: bool,
    #[serde(default)]
    pub processing_mode: ProcessingMode,
}

/// The persistent document record, one row per upload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentRecord {
    pub id: Uuid,
    /// Original user-supplied filename. Untrusted; sanitized before any
    /// use in headers or derived storage keys.
    pub filename: String,
    pub status: DocumentStatus,
    pub processing_options: ProcessingOptions,
    pub file_size: Option<i64>,
    pub content_type: Option<String>,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub error_message: Option<String>,
}

impl DocumentRecord {
    /// Seconds elapsed since creation, floored at 0. For terminal states the
    /// clock stops at `completed_at`.
    pub fn elapsed_seconds(&self, now: DateTime<Utc>) -> i64 {
        let end = match (self.status.is_terminal(), self.completed_at) {
            (true, Some(done)) => done,
            _ => now,
        };
        (end - self.created_at).num_seconds().max(0)
    }
}

/// Request for creating a new document record.
#[derive(Debug, Clone)]
pub struct CreateDocumentRequest {
    pub filename: String,
    pub processing_options: ProcessingOptions,
    pub file_size: Option<i64>,
    pub content_type: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_status_round_trip() {
        for status in [
            DocumentStatus::Queued,
            DocumentStatus::Processing,
            DocumentStatus::Complete,
            DocumentStatus::Failed,
        ] {
            assert_eq!(DocumentStatus::parse(status.as_str()).unwrap(), status);
        }
    }

    #[test]
    fn test_status_parse_rejects_unknown() {
        assert!(DocumentStatus::parse("done").is_err());
        assert!(DocumentStatus::parse("").is_err());
        assert!(DocumentStatus::parse("Queued").is_err());
    }

    #[test]
    fn test_terminal_states() {
        assert!(!DocumentStatus::Queued.is_terminal());
        assert!(!DocumentStatus::Processing.is_terminal());
        assert!(DocumentStatus::Complete.is_terminal());
        assert!(DocumentStatus::Failed.is_terminal());
    }

    #[test]
    fn test_processing_mode_is_case_sensitive() {
        assert_eq!(ProcessingMode::parse("fast").unwrap(), ProcessingMode::Fast);
        assert_eq!(
            ProcessingMode::parse("quality").unwrap(),
            ProcessingMode::Quality
        );
        assert!(ProcessingMode::parse("Fast").is_err());
        assert!(ProcessingMode::parse("QUALITY").is_err());
    }

    #[test]
    fn test_processing_options_default() {
        let opts = ProcessingOptions::default();
        assert!(!opts.ocr_enabled);
        assert_eq!(opts.processing_mode, ProcessingMode::Fast);
    }

    #[test]
    fn test_processing_options_serde_defaults() {
        let opts: ProcessingOptions = serde_json::from_str("{}").unwrap();
        assert_eq!(opts, ProcessingOptions::default());
    }

    #[test]
    fn test_status_serde_lowercase() {
        assert_eq!(
            serde_json::to_string(&DocumentStatus::Processing).unwrap(),
            "\"processing\""
        );
    }

    fn record(status: DocumentStatus) -> DocumentRecord {
        DocumentRecord {
            id: Uuid::now_v7(),
            filename: "report.pdf".to_string(),
            status,
            processing_options: ProcessingOptions::default(),
            file_size: Some(1024),
            content_type: Some("application/pdf".to_string()),
            created_at: Utc::now(),
            completed_at: None,
            error_message: None,
        }
    }

    #[test]
    fn test_elapsed_seconds_live() {
        let rec = record(DocumentStatus::Processing);
        let later = rec.created_at + Duration::seconds(42);
        assert_eq!(rec.elapsed_seconds(later), 42);
    }

    #[test]
    fn test_elapsed_seconds_never_negative() {
        let rec = record(DocumentStatus::Queued);
        let earlier = rec.created_at - Duration::seconds(5);
        assert_eq!(rec.elapsed_seconds(earlier), 0);
    }

    #[test]
    fn test_elapsed_seconds_stops_at_completion() {
        let mut rec = record(DocumentStatus::Complete);
        rec.completed_at = Some(rec.created_at + Duration::seconds(30));
        let much_later = rec.created_at + Duration::seconds(500);
        assert_eq!(rec.elapsed_seconds(much_later), 30);
    }
}
