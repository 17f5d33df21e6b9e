//! Content-type detection for uploaded documents.
//!
//! The client-claimed MIME type is untrusted: detection is magic-byte first
//! (via `infer`), extension fallback second, claimed type last. The office
//! formats accepted here all carry recognizable magic bytes, so a claimed
//! office type that fails detection is treated as a mismatch.

/// MIME types accepted for upload, in display order (PDF, DOCX, PPTX, XLSX).
pub const ALLOWED_DOCUMENT_TYPES: &[&str] = &[
    "application/pdf",
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
    "application/vnd.openxmlformats-officedocument.presentationml.presentation",
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
];

/// True if `mime` is one of the accepted office-document types.
pub fn is_allowed_document_type(mime: &str) -> bool {
    ALLOWED_DOCUMENT_TYPES.contains(&mime)
}

/// Detect the actual content type of uploaded data.
///
/// Order: magic bytes, then extension (for formats without signatures),
/// then the claimed type. A binary claim that magic bytes cannot confirm is
/// downgraded to `application/octet-stream` so garbage never reaches the
/// converter under an office label.
pub fn detect_content_type(filename: &str, data: &[u8], claimed: &str) -> String {
    if let Some(kind) = infer::get(data) {
        return kind.mime_type().to_string();
    }

    if let Some(ext) = filename.rsplit('.').next() {
        if let Some(mime) = mime_from_extension(ext) {
            return mime.to_string();
        }
    }

    if claimed_is_binary(claimed) {
        return "application/octet-stream".to_string();
    }

    claimed.to_string()
}

/// Returns true if the claimed MIME type is a binary format that should have
/// recognizable magic bytes.
fn claimed_is_binary(claimed: &str) -> bool {
    if claimed.starts_with("image/")
        || claimed.starts_with("audio/")
        || claimed.starts_with("video/")
    {
        return true;
    }
    matches!(claimed, "application/pdf" | "application/zip")
        || is_allowed_document_type(claimed)
}

/// Map text-only extensions to MIME types. Binary formats are intentionally
/// excluded: if `infer` missed them, the bytes don't match the name.
fn mime_from_extension(ext: &str) -> Option<&'static str> {
    match ext.to_lowercase().as_str() {
        "txt" | "log" => Some("text/plain"),
        "md" | "markdown" => Some("text/markdown"),
        "csv" => Some("text/csv"),
        "html" | "htm" => Some("text/html"),
        "json" => Some("application/json"),
        "xml" => Some("application/xml"),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Minimal valid-looking magic-byte prefixes
    const PDF: &[u8] = b"%PDF-1.7 stub content";
    const ZIP: &[u8] = b"PK\x03\x04rest-of-archive";

    #[test]
    fn test_detect_pdf_magic_bytes() {
        let detected = detect_content_type("doc.pdf", PDF, "application/octet-stream");
        assert_eq!(detected, "application/pdf");
    }

    #[test]
    fn test_detect_overrides_wrong_claim() {
        // Client claims text/plain but the bytes are a PDF
        let detected = detect_content_type("notes.txt", PDF, "text/plain");
        assert_eq!(detected, "application/pdf");
    }

    #[test]
    fn test_detect_downgrades_fake_pdf() {
        let detected = detect_content_type("doc.pdf", b"not a pdf", "application/pdf");
        assert_eq!(detected, "application/octet-stream");
    }

    #[test]
    fn test_detect_downgrades_fake_docx() {
        let detected = detect_content_type(
            "report.docx",
            b"garbage bytes",
            "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        );
        assert_eq!(detected, "application/octet-stream");
    }

    #[test]
    fn test_detect_text_by_extension() {
        let detected =
            detect_content_type("notes.txt", b"plain words", "application/octet-stream");
        assert_eq!(detected, "text/plain");
    }

    #[test]
    fn test_detect_passes_through_text_claim() {
        let detected = detect_content_type("data.xyz", b"some text", "text/plain");
        assert_eq!(detected, "text/plain");
    }

    #[test]
    fn test_allow_list_contents() {
        assert!(is_allowed_document_type("application/pdf"));
        assert!(is_allowed_document_type(
            "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"
        ));
        assert!(!is_allowed_document_type("text/plain"));
        assert!(!is_allowed_document_type("application/zip"));
        assert!(!is_allowed_document_type("application/octet-stream"));
    }

    #[test]
    fn test_zip_is_not_an_office_document() {
        // A bare zip without office internals detects as zip, which is not
        // on the allow-list.
        let detected = detect_content_type("archive.zip", ZIP, "application/zip");
        assert!(!is_allowed_document_type(&detected));
    }
}
