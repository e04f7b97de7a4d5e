//! MIME type helpers: normalization, category checks and extension guesses.
//!
//! Extension guesses are only ever used as a *declared* hint (what a client
//! would send); content sniffing in [`crate::sniff`] has the final word.

use std::path::Path;

const IMAGE_PREFIX: &str = "image/";

/// Normalize a declared MIME type: drop parameters, trim, lowercase.
///
/// `"Image/JPEG; charset=binary"` becomes `"image/jpeg"`. Returns `None` when
/// nothing is left.
pub fn normalize_mime(raw: &str) -> Option<String> {
    let base = raw.split(';').next().unwrap_or("").trim();
    if base.is_empty() {
        None
    } else {
        Some(base.to_ascii_lowercase())
    }
}

/// Whether a MIME type is for an image.
pub fn is_image(mime: &str) -> bool {
    mime.starts_with(IMAGE_PREFIX)
}

/// Guess a MIME type from a file extension, for callers that only have a path.
pub fn guess_mime_from_path(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();

    let mime = match ext.as_str() {
        // Images
        "jpg" | "jpeg" => "image/jpeg",
        "png"          => "image/png",
        "gif"          => "image/gif",
        "webp"         => "image/webp",
        "svg"          => "image/svg+xml",
        "avif"         => "image/avif",
        "bmp"          => "image/bmp",
        "ico"          => "image/x-icon",
        "tiff" | "tif" => "image/tiff",
        "heic"         => "image/heic",

        // Audio
        "mp3"          => "audio/mpeg",
        "ogg"          => "audio/ogg",
        "wav"          => "audio/wav",
        "flac"         => "audio/flac",
        "m4a"          => "audio/mp4",

        // Video
        "mp4"          => "video/mp4",
        "webm"         => "video/webm",
        "mov"          => "video/quicktime",

        // Documents
        "pdf"          => "application/pdf",
        "txt" | "log"  => "text/plain",
        "md"           => "text/markdown",
        "html" | "htm" => "text/html",
        "json"         => "application/json",
        "xml"          => "application/xml",
        "csv"          => "text/csv",
        "zip"          => "application/zip",
        "gz"           => "application/gzip",
        "docx"         => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        "xlsx"         => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",

        _ => return None,
    };
    Some(mime)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn strips_parameters_and_lowercases() {
        assert_eq!(
            normalize_mime("Image/JPEG; charset=binary").as_deref(),
            Some("image/jpeg")
        );
        assert_eq!(normalize_mime("  text/plain ").as_deref(), Some("text/plain"));
    }

    #[test]
    fn blank_mime_is_none() {
        assert_eq!(normalize_mime(""), None);
        assert_eq!(normalize_mime(" ; q=1"), None);
    }

    #[test]
    fn image_category() {
        assert!(is_image("image/png"));
        assert!(!is_image("application/pdf"));
        assert!(!is_image(""));
    }

    #[test]
    fn guesses_jpeg() {
        assert_eq!(guess_mime_from_path(&PathBuf::from("photo.JPG")), Some("image/jpeg"));
    }

    #[test]
    fn unknown_extension_has_no_guess() {
        assert_eq!(guess_mime_from_path(&PathBuf::from("file.xyz")), None);
        assert_eq!(guess_mime_from_path(&PathBuf::from("Makefile")), None);
    }
}
