//! Content classification module
//!
//! Maps a file extension to its `Content-Type` and to the icon markup shown
//! in directory listings. The table is a plain `match`, so it is built at
//! compile time and shared by every connection without locking.

const ICON_FILM: &str = r#"<i class="bi bi-film"></i>"#;
const ICON_CODE: &str = r#"<i class="bi bi-file-code"></i>"#;
const ICON_MUSIC: &str = r#"<i class="bi bi-file-music"></i>"#;
const ICON_IMAGE: &str = r#"<i class="bi bi-file-image"></i>"#;
const ICON_TEXT: &str = r#"<i class="bi bi-file-text"></i>"#;
const ICON_ARCHIVE: &str = r#"<i class="bi bi-file-zip"></i>"#;
const ICON_PDF: &str = r#"<i class="bi bi-file-pdf"></i>"#;
const ICON_FOLDER: &str = r#"<i class="bi bi-folder"></i>"#;

/// Icon for the "up one level" row of a listing
pub const ICON_PARENT: &str = r#"<i class="bi bi-box-arrow-in-up"></i>"#;

/// Fallback type for files with no known extension
pub const OCTET_STREAM: &str = "application/octet-stream";

/// Result of classifying a directory entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classification {
    /// `Content-Type` value, empty for directories
    pub mime: &'static str,
    /// Icon markup for listings, empty when nothing matches
    pub icon: &'static str,
}

/// Classify an entry by extension (without the leading dot, any case)
///
/// # Examples
/// ```
/// use treeserve::http::mime::classify;
/// assert_eq!(classify(Some("MP4"), false).mime, "video/mp4");
/// assert_eq!(classify(Some("xyz"), false).mime, "application/octet-stream");
/// assert_eq!(classify(None, true).mime, "");
/// ```
pub fn classify(extension: Option<&str>, is_dir: bool) -> Classification {
    let lowered = extension.map(str::to_ascii_lowercase);
    let known = lowered.as_deref().and_then(lookup);

    match (known, is_dir) {
        (Some((mime, icon)), _) => Classification { mime, icon },
        (None, true) => Classification {
            mime: "",
            icon: ICON_FOLDER,
        },
        (None, false) => Classification {
            mime: OCTET_STREAM,
            icon: "",
        },
    }
}

/// Shorthand for the `Content-Type` of a regular file
pub fn content_type(extension: Option<&str>) -> &'static str {
    classify(extension, false).mime
}

fn lookup(extension: &str) -> Option<(&'static str, &'static str)> {
    let entry = match extension {
        // Video
        "mp4" => ("video/mp4", ICON_FILM),
        "mkv" => ("video/x-matroska", ICON_FILM),
        "webm" => ("video/webm", ICON_FILM),
        "mov" => ("video/quicktime", ICON_FILM),
        "avi" => ("video/x-msvideo", ICON_FILM),

        // Source and markup
        "html" | "htm" => ("text/html; charset=utf-8", ICON_CODE),
        "css" => ("text/css", ICON_CODE),
        "js" | "mjs" => ("text/javascript", ICON_CODE),
        "json" => ("application/json", ICON_CODE),
        "yaml" | "yml" => ("application/yaml", ICON_CODE),
        "toml" => ("application/toml", ICON_CODE),
        "xml" => ("application/xml", ICON_CODE),
        "php" => ("text/x-php", ICON_CODE),
        "cpp" | "cc" | "h" | "hpp" => ("text/x-c++", ICON_CODE),
        "go" => ("text/x-go", ICON_CODE),
        "rs" => ("text/x-rust", ICON_CODE),
        "wasm" => ("application/wasm", ICON_CODE),

        // Audio
        "flac" => ("audio/flac", ICON_MUSIC),
        "wma" => ("audio/x-ms-wma", ICON_MUSIC),
        "mp3" => ("audio/mpeg", ICON_MUSIC),
        "wav" => ("audio/wav", ICON_MUSIC),
        "ogg" => ("audio/ogg", ICON_MUSIC),
        "m4a" => ("audio/mp4", ICON_MUSIC),

        // Images
        "gif" => ("image/gif", ICON_IMAGE),
        "bmp" => ("image/bmp", ICON_IMAGE),
        "ico" => ("image/x-icon", ICON_IMAGE),
        "jpg" | "jpeg" => ("image/jpeg", ICON_IMAGE),
        "heic" => ("image/heic", ICON_IMAGE),
        "webp" => ("image/webp", ICON_IMAGE),
        "png" => ("image/png", ICON_IMAGE),
        "svg" => ("image/svg+xml", ICON_IMAGE),

        // Text
        "txt" => ("text/plain; charset=utf-8", ICON_TEXT),
        "md" => ("text/markdown; charset=utf-8", ICON_TEXT),

        // Documents and archives
        "pdf" => ("application/pdf", ICON_PDF),
        "zip" => ("application/zip", ICON_ARCHIVE),
        "gz" | "gzip" => ("application/gzip", ICON_ARCHIVE),
        "tar" => ("application/x-tar", ICON_ARCHIVE),

        _ => return None,
    };
    Some(entry)
}
