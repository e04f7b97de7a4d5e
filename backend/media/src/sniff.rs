//! Content sniffing: guess a MIME type from the leading bytes of a payload.

use base64::Engine;

use crate::decode::LENIENT_BASE64;

/// Number of base64 characters decoded for sniffing (192 raw bytes).
pub const SNIFF_HEAD_CHARS: usize = 256;

/// Detects a MIME type from raw bytes.
///
/// Implementations must be deterministic and must not fail: anything they
/// cannot recognise is reported as `None`.
pub trait MimeSniffer: Send + Sync {
    fn sniff(&self, bytes: &[u8]) -> Option<String>;
}

/// Magic-byte sniffer backed by the `infer` crate.
#[derive(Debug, Default, Clone, Copy)]
pub struct InferSniffer;

impl MimeSniffer for InferSniffer {
    fn sniff(&self, bytes: &[u8]) -> Option<String> {
        infer::get(bytes).map(|kind| kind.mime_type().to_string())
    }
}

/// Sniff the head of a bare base64 payload.
///
/// Only the first [`SNIFF_HEAD_CHARS`] characters, rounded down to a whole
/// base64 quantum, are decoded. Decode failures count as inconclusive.
pub fn sniff_base64_head(sniffer: &dyn MimeSniffer, b64: &str) -> Option<String> {
    let take = b64.len().min(SNIFF_HEAD_CHARS) & !3;
    if take == 0 {
        return None;
    }
    let head = LENIENT_BASE64.decode(b64.get(..take)?).ok()?;
    sniffer.sniff(&head).filter(|mime| !mime.is_empty())
}
