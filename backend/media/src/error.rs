use thiserror::Error;

/// Errors that reject an entire attachment batch.
///
/// Every variant carries the label of the offending attachment (its file name,
/// declared type, or `attachment-<n>`), so callers can tell the user which one
/// was refused.
#[derive(Debug, Error)]
pub enum AttachmentError {
    #[error("attachment {label}: content must be a base64 string")]
    ContentNotString { label: String },

    #[error("attachment {label}: invalid base64 content")]
    InvalidBase64 { label: String },

    #[error("attachment {label}: failed to decode base64: {source}")]
    Decode {
        label: String,
        #[source]
        source: base64::DecodeError,
    },

    #[error("attachment {label}: decoded payload is empty")]
    Empty { label: String },

    #[error("attachment {label}: exceeds size limit ({size} > {limit} bytes)")]
    TooLarge {
        label: String,
        size: usize,
        limit: usize,
    },
}

impl AttachmentError {
    pub fn label(&self) -> &str {
        match self {
            AttachmentError::ContentNotString { label }
            | AttachmentError::InvalidBase64 { label }
            | AttachmentError::Decode { label, .. }
            | AttachmentError::Empty { label }
            | AttachmentError::TooLarge { label, .. } => label,
        }
    }
}
