//! Decoding and validation of base64 attachment content.

use std::sync::LazyLock;

use base64::alphabet;
use base64::engine::{Engine, GeneralPurpose, GeneralPurposeConfig};
use regex::Regex;
use serde_json::Value;

use crate::error::AttachmentError;

/// Standard alphabet that ignores stray bits in the final symbol (`QR==`
/// decodes to `A`), as browsers and Node do.
pub const LENIENT_BASE64: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_allow_trailing_bits(true),
);

static DATA_URL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)^data:([^;,]*);base64,(.*)$").unwrap());

/// A validated, fully decoded attachment payload.
#[derive(Debug, Clone)]
pub struct DecodedPayload {
    /// The bare base64 text (data URL header removed).
    pub base64: String,
    pub bytes: Vec<u8>,
    /// Media type named by a `data:` header, if there was one.
    pub data_url_mime: Option<String>,
}

impl DecodedPayload {
    pub fn size_bytes(&self) -> usize {
        self.bytes.len()
    }
}

/// Split a `data:<mime>;base64,<payload>` string into its media type and payload.
///
/// Content without the header is returned as-is with no media type.
pub fn strip_data_url(content: &str) -> (Option<&str>, &str) {
    match DATA_URL_RE.captures(content) {
        Some(caps) => {
            let mime = caps.get(1).map(|m| m.as_str()).filter(|m| !m.is_empty());
            let payload = caps.get(2).map_or("", |m| m.as_str());
            (mime, payload)
        }
        None => (None, content),
    }
}

/// Standard-alphabet base64 with correct length and at most two trailing `=`.
pub fn is_valid_base64_shape(b64: &str) -> bool {
    if b64.len() % 4 != 0 {
        return false;
    }
    let body = b64.trim_end_matches('=');
    if b64.len() - body.len() > 2 {
        return false;
    }
    body.bytes()
        .all(|b| b.is_ascii_alphanumeric() || b == b'+' || b == b'/')
}

/// Exact decoded length of a shape-valid base64 string.
pub fn decoded_len(b64: &str) -> usize {
    let padding = b64.len() - b64.trim_end_matches('=').len();
    (b64.len() / 4 * 3).saturating_sub(padding)
}

/// Validate and decode one attachment's `content`.
///
/// The size limit is checked against the computed length before decoding so
/// oversized payloads are never materialised.
pub fn decode_attachment(
    content: &Value,
    label: &str,
    max_bytes: usize,
) -> Result<DecodedPayload, AttachmentError> {
    let Value::String(content) = content else {
        return Err(AttachmentError::ContentNotString {
            label: label.to_string(),
        });
    };

    let (data_url_mime, b64) = strip_data_url(content.trim());
    if !is_valid_base64_shape(b64) {
        return Err(AttachmentError::InvalidBase64 {
            label: label.to_string(),
        });
    }

    let expected = decoded_len(b64);
    if expected == 0 {
        return Err(AttachmentError::Empty {
            label: label.to_string(),
        });
    }
    if expected > max_bytes {
        return Err(AttachmentError::TooLarge {
            label: label.to_string(),
            size: expected,
            limit: max_bytes,
        });
    }

    let bytes = LENIENT_BASE64
        .decode(b64)
        .map_err(|source| AttachmentError::Decode {
            label: label.to_string(),
            source,
        })?;
    debug_assert_eq!(bytes.len(), expected);

    Ok(DecodedPayload {
        base64: b64.to_string(),
        bytes,
        data_url_mime: data_url_mime.map(str::to_string),
    })
}
