//! Arbitration between a caller-declared MIME type and a sniffed one.

use crate::mime_detect::is_image;

/// Declared and sniffed types disagreed; the sniffed one was used.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MimeMismatch {
    pub declared: String,
    pub sniffed: String,
}

/// Outcome of [`arbitrate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MimeDecision {
    /// The MIME type recorded for the attachment; empty when nothing is known.
    pub effective_mime: String,
    pub is_image: bool,
    pub mismatch: Option<MimeMismatch>,
}

/// Decide the effective MIME type and whether the attachment is an image.
///
/// Both inputs must already be normalized. A sniffed type always wins. Without
/// one, the declared type is trusted, including for the image decision.
pub fn arbitrate(declared: Option<&str>, sniffed: Option<&str>) -> MimeDecision {
    match sniffed {
        Some(sniffed) => {
            let mismatch = declared
                .filter(|declared| *declared != sniffed)
                .map(|declared| MimeMismatch {
                    declared: declared.to_string(),
                    sniffed: sniffed.to_string(),
                });
            MimeDecision {
                effective_mime: sniffed.to_string(),
                is_image: is_image(sniffed),
                mismatch,
            }
        }
        None => {
            let effective_mime = declared.unwrap_or_default().to_string();
            MimeDecision {
                is_image: is_image(&effective_mime),
                effective_mime,
                mismatch: None,
            }
        }
    }
}
