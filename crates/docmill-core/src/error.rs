//! Error types for docmill.

use thiserror::Error;

/// Result type alias using docmill's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for docmill operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Database operation failed (wraps sqlx::Error)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Document not found
    #[error("Document not found: {0}")]
    DocumentNotFound(uuid::Uuid),

    /// Upload exceeds the size limit
    #[error("File too large ({size_mb:.1}MB) - maximum size is {max_mb}MB. Try compressing your file or splitting into multiple files.")]
    FileTooLarge { size_mb: f64, max_mb: u64 },

    /// File format is not in the allow-list
    #[error("Cannot process {detected} files - supported formats: PDF, DOCX, PPTX, XLSX.")]
    UnsupportedFormat { detected: String },

    /// Conversion exceeded its wall-clock budget
    #[error("Processing took too long - try enabling Fast mode or reducing document complexity.")]
    ProcessingTimeout,

    /// Source document is corrupted or password-protected
    #[error("Unable to process file - ensure the document isn't password-protected or corrupted.")]
    CorruptedFile,

    /// Blob store operation failed
    #[error("Storage error: {0}")]
    Storage(String),

    /// Converter backend failed
    #[error("Conversion error: {0}")]
    Conversion(String),

    /// Action requested against the wrong document status
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),

    /// File I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Construct a FileTooLarge error from raw byte counts.
    pub fn file_too_large(size_bytes: usize, max_bytes: usize) -> Self {
        Error::FileTooLarge {
            size_mb: size_bytes as f64 / (1024.0 * 1024.0),
            max_mb: (max_bytes / (1024 * 1024)) as u64,
        }
    }

    /// Stable machine-readable code for this error, used in API envelopes
    /// and structured logs.
    pub fn code(&self) -> &'static str {
        match self {
            Error::Database(_) => "DATABASE_ERROR",
            Error::NotFound(_) | Error::DocumentNotFound(_) => "NOT_FOUND",
            Error::FileTooLarge { .. } => "FILE_TOO_LARGE",
            Error::UnsupportedFormat { .. } => "UNSUPPORTED_FORMAT",
            Error::ProcessingTimeout => "PROCESSING_TIMEOUT",
            Error::CorruptedFile => "CORRUPTED_FILE",
            Error::Storage(_) => "STORAGE_ERROR",
            Error::Conversion(_) => "CONVERSION_ERROR",
            Error::InvalidState(_) => "INVALID_STATE",
            Error::InvalidInput(_) => "INVALID_INPUT",
            Error::Serialization(_) => "SERIALIZATION_ERROR",
            Error::Config(_) => "CONFIG_ERROR",
            Error::Internal(_) => "INTERNAL_ERROR",
            Error::Io(_) => "IO_ERROR",
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        Error::Conversion(e.to_string())
    }
}
