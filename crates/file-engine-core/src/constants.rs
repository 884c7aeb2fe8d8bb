//! Shared limits and lookup tables.

/// Largest object accepted on either upload path (5 GiB).
pub const MAX_FILE_SIZE: u64 = 5 * 1024 * 1024 * 1024;

/// Maximum filename length in bytes.
pub const MAX_FILENAME_LENGTH: usize = 255;

/// Characters that may not appear anywhere in a filename.
pub const FORBIDDEN_FILENAME_CHARS: [char; 9] = ['<', '>', ':', '"', '|', '?', '*', '\\', '/'];

/// Maximum content type length in bytes, matching the metadata column.
pub const MAX_CONTENT_TYPE_LENGTH: usize = 255;

/// Content type recorded when the client does not send one.
pub const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// Allowed extensions with the content type served for each.
///
/// Extensions are lower-case and include the leading dot.
pub const ALLOWED_EXTENSIONS: &[(&str, &str)] = &[
    // Images
    (".jpg", "image/jpeg"),
    (".jpeg", "image/jpeg"),
    (".png", "image/png"),
    (".gif", "image/gif"),
    (".bmp", "image/bmp"),
    (".webp", "image/webp"),
    // Video
    (".mp4", "video/mp4"),
    (".avi", "video/x-msvideo"),
    (".mov", "video/quicktime"),
    (".wmv", "video/x-ms-wmv"),
    (".flv", "video/x-flv"),
    (".mkv", "video/x-matroska"),
    // Applications and installers
    (".exe", "application/vnd.microsoft.portable-executable"),
    (".msi", "application/x-msi"),
    (".dmg", "application/x-apple-diskimage"),
    (".pkg", "application/octet-stream"),
    // Archives
    (".zip", "application/zip"),
    (".rar", "application/vnd.rar"),
    (".7z", "application/x-7z-compressed"),
    (".tar", "application/x-tar"),
    (".gz", "application/gzip"),
    // Office documents
    (".pdf", "application/pdf"),
    (".doc", "application/msword"),
    (
        ".docx",
        "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
    ),
    (".xls", "application/vnd.ms-excel"),
    (
        ".xlsx",
        "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
    ),
    (".ppt", "application/vnd.ms-powerpoint"),
    (
        ".pptx",
        "application/vnd.openxmlformats-officedocument.presentationml.presentation",
    ),
    // Text and structured text
    (".txt", "text/plain"),
    (".md", "text/markdown"),
    (".json", "application/json"),
    (".xml", "application/xml"),
    (".csv", "text/csv"),
];

/// Returns the extension of `filename` starting at the last `.`, including the dot.
///
/// A name without a dot has an empty extension. Case is preserved.
pub fn file_extension(filename: &str) -> &str {
    match filename.rfind('.') {
        Some(idx) => &filename[idx..],
        None => "",
    }
}

/// Guess a content type from the filename extension, falling back to
/// [`DEFAULT_CONTENT_TYPE`].
pub fn content_type_for(filename: &str) -> &'static str {
    let ext = file_extension(filename).to_lowercase();
    ALLOWED_EXTENSIONS
        .iter()
        .find(|(allowed, _)| *allowed == ext)
        .map(|(_, content_type)| *content_type)
        .unwrap_or(DEFAULT_CONTENT_TYPE)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_extension() {
        assert_eq!(file_extension("report.PDF"), ".PDF");
        assert_eq!(file_extension("archive.tar.gz"), ".gz");
        assert_eq!(file_extension("README"), "");
        assert_eq!(file_extension(".env"), ".env");
    }

    #[test]
    fn test_content_type_for() {
        assert_eq!(content_type_for("photo.JPG"), "image/jpeg");
        assert_eq!(content_type_for("data.csv"), "text/csv");
        assert_eq!(content_type_for("blob.bin"), DEFAULT_CONTENT_TYPE);
    }
}
