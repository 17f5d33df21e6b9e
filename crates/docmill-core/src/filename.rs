//! Filename sanitization and storage-key derivation.
//!
//! Uploaded filenames are untrusted. `clean_filename` turns an arbitrary
//! name into a safe, cross-platform one with the extension replaced;
//! `validate_filename` gatekeeps names used verbatim; `safe_filename` is the
//! display-name convenience used for Content-Disposition.
//!
//! Storage keys are derived here too, deliberately in the same module:
//! the processed key is written by the pipeline and recomputed by the
//! download handler, and there is no lookup table to fall back on. A second
//! cleaning implementation anywhere else is a bug.

use uuid::Uuid;

use crate::defaults::{
    FALLBACK_BASENAME, MAX_CLEAN_BASENAME_LEN, PROCESSED_BUCKET, UPLOADS_BUCKET,
};

/// Characters stripped for cross-platform safety (Windows reserved set).
const UNSAFE_CHARS: &[char] = &['<', '>', ':', '"', '/', '\\', '|', '?', '*'];

/// Reserved Windows device names, matched against the uppercased stem.
const RESERVED_NAMES: &[&str] = &[
    "CON", "PRN", "AUX", "NUL", "COM1", "COM2", "COM3", "COM4", "COM5", "COM6", "COM7", "COM8",
    "COM9", "LPT1", "LPT2", "LPT3", "LPT4", "LPT5", "LPT6", "LPT7", "LPT8", "LPT9",
];

/// Normalize a replacement extension to start with a dot.
fn normalize_ext(ext: &str) -> String {
    if ext.is_empty() || ext.starts_with('.') {
        ext.to_string()
    } else {
        format!(".{ext}")
    }
}

/// Last path component, handling both separator styles.
fn strip_path_components(name: &str) -> &str {
    name.rsplit(['/', '\\']).next().unwrap_or(name)
}

/// Stem without the final extension. A leading dot is not an extension
/// separator (`.env` keeps its name).
fn strip_extension(name: &str) -> &str {
    match name.rfind('.') {
        Some(pos) if pos > 0 => &name[..pos],
        _ => name,
    }
}

/// Clean a filename for storage: strip path components and the original
/// extension, drop control and cross-platform-unsafe characters, normalize
/// spacing, bound the length, and append `replacement_ext`.
///
/// Pure and deterministic: the processed storage key is recomputed from the
/// original filename at download time and must match the upload-time key.
///
/// ```
/// use docmill_core::clean_filename;
///
/// assert_eq!(clean_filename("My Document.pdf", ".md"), "My_Document.md");
/// assert_eq!(clean_filename("report<2024>.docx", ".md"), "report2024.md");
/// ```
pub fn clean_filename(original: &str, replacement_ext: &str) -> String {
    let ext = normalize_ext(replacement_ext);

    if original.is_empty() {
        return format!("{FALLBACK_BASENAME}{ext}");
    }

    let stem = strip_extension(strip_path_components(original));
    if stem.is_empty() {
        return format!("{FALLBACK_BASENAME}{ext}");
    }

    // char::is_control covers exactly the Unicode Cc range
    // (0x00-0x1F, 0x7F-0x9F).
    let mut cleaned = String::with_capacity(stem.len());
    for c in stem.chars() {
        if c.is_control() || UNSAFE_CHARS.contains(&c) {
            continue;
        }
        if c == ' ' {
            cleaned.push('_');
        } else {
            cleaned.push(c);
        }
    }

    // Collapse underscore runs
    let mut collapsed = String::with_capacity(cleaned.len());
    let mut prev_underscore = false;
    for c in cleaned.chars() {
        if c == '_' {
            if !prev_underscore {
                collapsed.push('_');
            }
            prev_underscore = true;
        } else {
            collapsed.push(c);
            prev_underscore = false;
        }
    }

    let trimmed = collapsed.trim_matches(|c| c == '_' || c == '.');

    // Bound the base name, re-trimming anything the cut exposed
    let bounded: String = trimmed.chars().take(MAX_CLEAN_BASENAME_LEN).collect();
    let bounded = bounded.trim_end_matches(|c| c == '_' || c == '.');

    if bounded.is_empty() {
        return format!("{FALLBACK_BASENAME}{ext}");
    }

    format!("{bounded}{ext}")
}

/// Validate that a filename is safe to use verbatim: non-empty, within
/// `max_length` characters, no null bytes, no path separators or traversal
/// sequences, and not a reserved Windows device name.
pub fn validate_filename(name: &str, max_length: usize) -> bool {
    if name.is_empty() || name.chars().count() > max_length {
        return false;
    }
    if name.contains('\0') || name.contains("..") || name.contains('/') || name.contains('\\') {
        return false;
    }
    let stem = strip_extension(name).to_uppercase();
    !RESERVED_NAMES.contains(&stem.as_str())
}

/// Display-safe filename for response headers: the cleaned name if it
/// validates, otherwise `fallback`. Never used for storage keys.
pub fn safe_filename(name: &str, fallback: &str) -> String {
    let cleaned = clean_filename(name, ".md");
    if validate_filename(&cleaned, 255) {
        cleaned
    } else {
        fallback.to_string()
    }
}

/// Storage key for the raw uploaded bytes: `uploads/{id}/{filename}`.
///
/// The filename must have passed [`validate_filename`] at upload time; the
/// key embeds it verbatim.
pub fn raw_object_key(id: Uuid, filename: &str) -> String {
    format!("{UPLOADS_BUCKET}/{id}/{filename}")
}

/// Storage key for the converted markdown:
/// `processed/{id}/{clean_filename(filename, ".md")}`.
///
/// Written by the processing pipeline and recomputed byte-identically by
/// the download handler.
pub fn processed_object_key(id: Uuid, filename: &str) -> String {
    format!(
        "{PROCESSED_BUCKET}/{id}/{}",
        clean_filename(filename, ".md")
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_basic() {
        assert_eq!(clean_filename("My Document.pdf", ".md"), "My_Document.md");
        assert_eq!(clean_filename("report<2024>.docx", ".md"), "report2024.md");
    }

    #[test]
    fn test_clean_spec_example() {
        assert_eq!(
            clean_filename("My <Report> 2024: Q1.pdf", ".md"),
            "My_Report_2024_Q1.md"
        );
    }

    #[test]
    fn test_clean_strips_traversal() {
        let cleaned = clean_filename("../../../etc/passwd.pdf", ".md");
        assert!(!cleaned.contains('/'));
        assert!(!cleaned.contains('\\'));
        assert!(!cleaned.contains(".."));
        assert!(cleaned.ends_with(".md"));
    }

    #[test]
    fn test_clean_strips_windows_paths() {
        let cleaned = clean_filename("C:\\Users\\евгений\\doc.pptx", ".md");
        assert_eq!(cleaned, "doc.md");
    }

    #[test]
    fn test_clean_removes_control_chars() {
        assert_eq!(clean_filename("re\x00po\x1frt\u{9d}.pdf", ".md"), "report.md");
    }

    #[test]
    fn test_clean_collapses_underscores() {
        assert_eq!(clean_filename("a   b___c.pdf", ".md"), "a_b_c.md");
    }

    #[test]
    fn test_clean_trims_edges() {
        assert_eq!(clean_filename("_.report._.pdf", ".md"), "report.md");
    }

    #[test]
    fn test_clean_empty_inputs_fall_back() {
        assert_eq!(clean_filename("", ".md"), "document.md");
        assert_eq!(clean_filename("???.pdf", ".md"), "document.md");
        assert_eq!(clean_filename("....", ".md"), "document.md");
    }

    #[test]
    fn test_clean_truncates_long_names() {
        let long = format!("{}.pdf", "a".repeat(400));
        let cleaned = clean_filename(&long, ".md");
        assert_eq!(cleaned.chars().count(), 200 + 3);
        assert!(cleaned.ends_with(".md"));
    }

    #[test]
    fn test_clean_normalizes_extension_dot() {
        assert_eq!(clean_filename("notes.pdf", "md"), "notes.md");
        assert_eq!(clean_filename("notes.pdf", ".txt"), "notes.txt");
    }

    #[test]
    fn test_clean_keeps_unicode() {
        assert_eq!(clean_filename("résumé 2024.pdf", ".md"), "résumé_2024.md");
    }

    #[test]
    fn test_clean_is_deterministic() {
        let inputs = [
            "My <Report> 2024: Q1.pdf",
            "../../../etc/passwd.pdf",
            "файл с пробелами.docx",
            "   ",
            "a|b?c*d.xlsx",
        ];
        for input in inputs {
            assert_eq!(clean_filename(input, ".md"), clean_filename(input, ".md"));
        }
    }

    #[test]
    fn test_validate_accepts_normal_names() {
        assert!(validate_filename("document.md", 255));
        assert!(validate_filename("My_Report_2024_Q1.md", 255));
    }

    #[test]
    fn test_validate_rejects_unsafe_names() {
        assert!(!validate_filename("", 255));
        assert!(!validate_filename(&"a".repeat(300), 255));
        assert!(!validate_filename("nul\0byte.md", 255));
        assert!(!validate_filename("../escape.md", 255));
        assert!(!validate_filename("dir/file.md", 255));
        assert!(!validate_filename("dir\\file.md", 255));
    }

    #[test]
    fn test_validate_rejects_reserved_device_names() {
        assert!(!validate_filename("CON", 255));
        assert!(!validate_filename("con.md", 255));
        assert!(!validate_filename("Com7.pdf", 255));
        assert!(!validate_filename("LPT9", 255));
        // Not reserved: prefix only matches the full stem
        assert!(validate_filename("CONSOLE.md", 255));
    }

    #[test]
    fn test_safe_filename_falls_back() {
        assert_eq!(safe_filename("My Report.pdf", "document.md"), "My_Report.md");
        // Reserved stem survives cleaning, so validation catches it
        assert_eq!(safe_filename("CON.pdf", "document.md"), "document.md");
    }

    #[test]
    fn test_key_round_trip() {
        // The property the whole design leans on: upload-time and
        // download-time key derivation agree for any filename.
        let id = Uuid::now_v7();
        let corpus = [
            "simple.pdf",
            "My <Report> 2024: Q1.pdf",
            "../../../etc/passwd.pdf",
            "ファイル 名前.docx",
            "spaces   and   more.xlsx",
            "???.pptx",
            "",
        ];
        for filename in corpus {
            let write_key = processed_object_key(id, filename);
            let read_key = processed_object_key(id, filename);
            assert_eq!(write_key, read_key);
            assert!(write_key.starts_with(&format!("processed/{id}/")));
            // Exactly the bucket and id separators, nothing from the input
            assert_eq!(write_key.matches('/').count(), 2);
        }
    }

    #[test]
    fn test_raw_key_shape() {
        let id = Uuid::now_v7();
        assert_eq!(
            raw_object_key(id, "report.pdf"),
            format!("uploads/{id}/report.pdf")
        );
    }
}
