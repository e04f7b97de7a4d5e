//! Inbound attachment handling for chat messages.
//!
//! Decodes client attachments, decides image versus file by sniffing content
//! against the declared type, keeps images inline and saves files into the
//! agent workspace under `media/inbound/`.

pub mod classify;
pub mod decode;
pub mod error;
pub mod mime_detect;
pub mod parse;
pub mod sniff;
pub mod store;

pub use classify::{MimeDecision, MimeMismatch, arbitrate};
pub use decode::{DecodedPayload, decode_attachment, strip_data_url};
pub use error::AttachmentError;
pub use mime_detect::{guess_mime_from_path, is_image, normalize_mime};
pub use parse::{
    Attachment, AttachmentParser, ClassifiedAttachment, DEFAULT_MAX_ATTACHMENT_BYTES,
    ParseOptions, ParsedResult, augment_message, format_file_reference,
    parse_message_with_attachments,
};
pub use sniff::{InferSniffer, MimeSniffer};
pub use store::{INBOUND_DIR, SavedFile, sanitize_file_name, save_inbound_file};
