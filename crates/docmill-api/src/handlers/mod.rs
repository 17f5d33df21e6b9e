//! HTTP handlers.

pub mod download;
pub mod files;
pub mod health;
pub mod status;
pub mod upload;

pub use download::download_document;
pub use files::serve_signed_file;
pub use health::health_check;
pub use status::document_status;
pub use upload::upload_document;
