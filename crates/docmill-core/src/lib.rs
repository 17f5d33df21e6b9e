//! # docmill-core
//!
//! Core types, traits, and abstractions for the docmill document processor.
//!
//! This crate provides the foundational data structures, the error taxonomy,
//! and the pure helper functions (filename sanitization, progress estimation)
//! that the other docmill crates depend on.

pub mod defaults;
pub mod error;
pub mod filename;
pub mod models;
pub mod progress;
pub mod sniff;
pub mod traits;

// Re-export commonly used types at crate root
pub use error::{Error, Result};
pub use filename::{
    clean_filename, processed_object_key, raw_object_key, safe_filename, validate_filename,
};
pub use models::{
    CreateDocumentRequest, DocumentRecord, DocumentStatus, ProcessingMode, ProcessingOptions,
};
pub use progress::{progress_percent, progress_stage};
pub use sniff::{detect_content_type, is_allowed_document_type, ALLOWED_DOCUMENT_TYPES};
pub use traits::{BlobStore, ConvertBackend, ConvertOptions, ConvertRequest, DocumentRepository};
