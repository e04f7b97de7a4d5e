//! Turns a chat message plus client attachments into model input.
//!
//! Images become inline [`ImageBlock`]s; everything else is written to the
//! agent workspace and referenced from the message text.
//!
//! Failures come in two tiers. Malformed or oversized content rejects the whole
//! batch with an [`AttachmentError`] before anything touches the disk. Trouble
//! saving a single file (or having nowhere to save it) only drops that file.

use std::path::PathBuf;

use clawdrop_core::{ImageBlock, UserTurn};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::classify::{MimeDecision, arbitrate};
use crate::decode::{DecodedPayload, decode_attachment};
use crate::error::AttachmentError;
use crate::mime_detect::normalize_mime;
use crate::sniff::{InferSniffer, MimeSniffer, sniff_base64_head};
use crate::store::{SavedFile, save_inbound_file};

/// Default ceiling for a single decoded attachment.
pub const DEFAULT_MAX_ATTACHMENT_BYTES: usize = 5_000_000;

/// An attachment as sent by a client.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attachment {
    /// Base64 text, optionally behind a `data:<mime>;base64,` header.
    #[serde(default)]
    pub content: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
    /// Free-form client hint such as `"image"` or `"file"`; only used for labels.
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
}

impl Attachment {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: Value::String(content.into()),
            ..Default::default()
        }
    }

    pub fn with_mime_type(mut self, mime_type: impl Into<String>) -> Self {
        self.mime_type = Some(mime_type.into());
        self
    }

    pub fn with_file_name(mut self, file_name: impl Into<String>) -> Self {
        self.file_name = Some(file_name.into());
        self
    }

    pub fn with_kind(mut self, kind: impl Into<String>) -> Self {
        self.kind = Some(kind.into());
        self
    }

    /// Human-readable name used in errors and logs: file name, then type,
    /// then `attachment-<n>` (1-based).
    pub fn label(&self, index: usize) -> String {
        [self.file_name.as_deref(), self.kind.as_deref()]
            .into_iter()
            .flatten()
            .map(str::trim)
            .find(|s| !s.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| format!("attachment-{}", index + 1))
    }
}

/// Knobs for one parse.
#[derive(Debug, Clone)]
pub struct ParseOptions {
    pub max_bytes: usize,
    /// Workspace root; non-image attachments are dropped when absent.
    pub workspace_dir: Option<PathBuf>,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            max_bytes: DEFAULT_MAX_ATTACHMENT_BYTES,
            workspace_dir: None,
        }
    }
}

impl ParseOptions {
    pub fn with_workspace(mut self, workspace: impl Into<PathBuf>) -> Self {
        self.workspace_dir = Some(workspace.into());
        self
    }

    pub fn with_max_bytes(mut self, max_bytes: usize) -> Self {
        self.max_bytes = max_bytes;
        self
    }
}

/// Everything a chat handler needs after attachments are processed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedResult {
    /// The input message plus one reference line per saved file.
    pub message: String,
    pub images: Vec<ImageBlock>,
    pub files: Vec<SavedFile>,
}

impl ParsedResult {
    fn unchanged(message: &str) -> Self {
        Self {
            message: message.to_string(),
            ..Default::default()
        }
    }

    /// Model-facing turn. Saved files are already referenced by the message.
    pub fn into_user_turn(self) -> UserTurn {
        UserTurn::new(&self.message, self.images)
    }
}

/// An attachment that passed validation, with its MIME verdict.
#[derive(Debug, Clone)]
pub struct ClassifiedAttachment {
    pub label: String,
    /// Name to record for a saved file (claimed name, else the label).
    pub file_name: String,
    pub payload: DecodedPayload,
    pub decision: MimeDecision,
}

/// `[Attached file: <name> (<mime>, <size> bytes) → <path>]`
pub fn format_file_reference(file: &SavedFile) -> String {
    format!(
        "[Attached file: {} ({}, {} bytes) → {}]",
        file.file_name,
        file.mime_type,
        file.size_bytes,
        file.file_path.display()
    )
}

/// Append one reference line per saved file to `message`.
///
/// A non-empty message is separated from the block by a blank line.
pub fn augment_message(message: &str, files: &[SavedFile]) -> String {
    if files.is_empty() {
        return message.to_string();
    }
    let block = files
        .iter()
        .map(format_file_reference)
        .collect::<Vec<_>>()
        .join("\n");
    if message.is_empty() {
        block
    } else {
        format!("{message}\n\n{block}")
    }
}

/// The attachment pipeline: validate, classify, then persist.
pub struct AttachmentParser {
    sniffer: Box<dyn MimeSniffer>,
    options: ParseOptions,
}

impl AttachmentParser {
    pub fn new(options: ParseOptions) -> Self {
        Self::with_sniffer(options, Box::new(InferSniffer))
    }

    pub fn with_sniffer(options: ParseOptions, sniffer: Box<dyn MimeSniffer>) -> Self {
        Self { sniffer, options }
    }

    /// Validate and classify one attachment. `index` is its position in the batch.
    pub fn classify(
        &self,
        attachment: &Attachment,
        index: usize,
    ) -> Result<ClassifiedAttachment, AttachmentError> {
        let label = attachment.label(index);
        let payload = decode_attachment(&attachment.content, &label, self.options.max_bytes)?;

        let declared = attachment
            .mime_type
            .as_deref()
            .and_then(normalize_mime)
            .or_else(|| payload.data_url_mime.as_deref().and_then(normalize_mime));
        let sniffed = sniff_base64_head(self.sniffer.as_ref(), &payload.base64);

        let decision = arbitrate(declared.as_deref(), sniffed.as_deref());
        if let Some(mismatch) = &decision.mismatch {
            warn!(
                label = %label,
                declared = %mismatch.declared,
                sniffed = %mismatch.sniffed,
                "Attachment MIME mismatch; using sniffed type"
            );
        }
        debug!(
            label = %label,
            mime = %decision.effective_mime,
            image = decision.is_image,
            size = payload.size_bytes(),
            "Classified attachment"
        );

        let file_name = attachment
            .file_name
            .as_deref()
            .filter(|name| !name.trim().is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| label.clone());

        Ok(ClassifiedAttachment {
            label,
            file_name,
            payload,
            decision,
        })
    }

    /// Process a batch of attachments for `message`.
    ///
    /// Every attachment is validated before the first file is written, so a
    /// rejected batch leaves no trace in the workspace.
    pub async fn parse(
        &self,
        message: &str,
        attachments: &[Attachment],
    ) -> Result<ParsedResult, AttachmentError> {
        if attachments.is_empty() {
            return Ok(ParsedResult::unchanged(message));
        }

        let classified = attachments
            .iter()
            .enumerate()
            .map(|(index, attachment)| self.classify(attachment, index))
            .collect::<Result<Vec<_>, _>>()?;

        let mut images = Vec::new();
        let mut files = Vec::new();

        for item in classified {
            if item.decision.is_image {
                images.push(ImageBlock::new(item.payload.base64, item.decision.effective_mime));
                continue;
            }

            let Some(workspace) = self.options.workspace_dir.as_deref() else {
                warn!(
                    label = %item.label,
                    "Dropping non-image attachment: no workspace directory configured"
                );
                continue;
            };

            match save_inbound_file(
                workspace,
                &item.payload.bytes,
                &item.decision.effective_mime,
                &item.file_name,
            )
            .await
            {
                Ok(saved) => {
                    info!(
                        label = %item.label,
                        path = %saved.file_path.display(),
                        size = saved.size_bytes,
                        "Saved inbound attachment"
                    );
                    files.push(saved);
                }
                Err(e) => {
                    let error = format!("{e:#}");
                    warn!(label = %item.label, error = %error, "Failed to save attachment; skipping");
                }
            }
        }

        Ok(ParsedResult {
            message: augment_message(message, &files),
            images,
            files,
        })
    }
}

/// One-shot helper using the default sniffer.
pub async fn parse_message_with_attachments(
    message: &str,
    attachments: &[Attachment],
    options: ParseOptions,
) -> Result<ParsedResult, AttachmentError> {
    AttachmentParser::new(options).parse(message, attachments).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::{Engine, engine::general_purpose::STANDARD};
    use std::fmt;
    use std::path::Path;
    use std::sync::{Arc, Mutex};
    use tracing::field::{Field, Visit};
    use tracing::{Event, Level, Subscriber};
    use tracing_subscriber::layer::{Context, Layer, SubscriberExt};

    const PNG_BYTES: &[u8] = &[
        0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0x00, 0x00, 0x00, 0x0D, 0x49, 0x48, 0x44,
        0x52,
    ];

    fn pdf_bytes() -> Vec<u8> {
        b"%PDF-1.4\n1 0 obj\n<< /Type /Catalog >>\nendobj\n".to_vec()
    }

    /// Sniffer that never recognises anything.
    struct BlindSniffer;

    impl MimeSniffer for BlindSniffer {
        fn sniff(&self, _bytes: &[u8]) -> Option<String> {
            None
        }
    }

    /// A WARN event reduced to its `label` field and message.
    #[derive(Debug, Default)]
    struct Warning {
        label: Option<String>,
        message: String,
    }

    impl Visit for Warning {
        fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
            match field.name() {
                "label" => self.label = Some(format!("{value:?}")),
                "message" => self.message = format!("{value:?}"),
                _ => {}
            }
        }
    }

    /// Layer that keeps every WARN event emitted while it is the default.
    #[derive(Clone, Default)]
    struct WarnCapture(Arc<Mutex<Vec<Warning>>>);

    impl<S: Subscriber> Layer<S> for WarnCapture {
        fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
            if *event.metadata().level() != Level::WARN {
                return;
            }
            let mut warning = Warning::default();
            event.record(&mut warning);
            self.0.lock().unwrap().push(warning);
        }
    }

    impl WarnCapture {
        fn install(&self) -> tracing::subscriber::DefaultGuard {
            tracing::subscriber::set_default(tracing_subscriber::registry().with(self.clone()))
        }

        fn take(&self) -> Vec<Warning> {
            std::mem::take(&mut *self.0.lock().unwrap())
        }
    }

    #[test]
    fn labels_fall_back_in_order() {
        let a = Attachment::new("AAAA").with_file_name("a.txt").with_kind("file");
        assert_eq!(a.label(0), "a.txt");
        let b = Attachment::new("AAAA").with_kind("image");
        assert_eq!(b.label(0), "image");
        let c = Attachment::new("AAAA").with_file_name("  ");
        assert_eq!(c.label(2), "attachment-3");
    }

    #[test]
    fn attachment_deserializes_from_client_json() {
        let att: Attachment = serde_json::from_str(
            r#"{"type":"file","mimeType":"application/pdf","fileName":"a.pdf","content":"JVBERi0="}"#,
        )
        .unwrap();
        assert_eq!(att.kind.as_deref(), Some("file"));
        assert_eq!(att.mime_type.as_deref(), Some("application/pdf"));
        assert_eq!(att.file_name.as_deref(), Some("a.pdf"));
        assert_eq!(att.content, Value::String("JVBERi0=".into()));
    }

    #[test]
    fn augmentation_matches_reference_format() {
        let files = vec![SavedFile {
            file_path: PathBuf::from("/w/media/inbound/ab12cd34-report.pdf"),
            file_name: "report.pdf".into(),
            mime_type: "application/pdf".into(),
            size_bytes: 1234,
        }];
        assert_eq!(
            augment_message("hello", &files),
            "hello\n\n[Attached file: report.pdf (application/pdf, 1234 bytes) → /w/media/inbound/ab12cd34-report.pdf]"
        );
        assert_eq!(
            augment_message("", &files),
            "[Attached file: report.pdf (application/pdf, 1234 bytes) → /w/media/inbound/ab12cd34-report.pdf]"
        );
        assert_eq!(augment_message("hello", &[]), "hello");
    }

    #[test]
    fn augmentation_lists_files_in_order() {
        let file = |name: &str| SavedFile {
            file_path: Path::new("/w").join(name),
            file_name: name.into(),
            mime_type: "text/plain".into(),
            size_bytes: 1,
        };
        let message = augment_message("hi", &[file("a.txt"), file("b.txt")]);
        let lines: Vec<_> = message.lines().collect();
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[1], "");
        assert!(lines[2].starts_with("[Attached file: a.txt "));
        assert!(lines[3].starts_with("[Attached file: b.txt "));
    }

    #[tokio::test]
    async fn empty_batch_is_a_no_op() {
        let result = parse_message_with_attachments("hello", &[], ParseOptions::default())
            .await
            .unwrap();
        assert_eq!(result, ParsedResult::unchanged("hello"));
    }

    #[tokio::test]
    async fn agreeing_image_becomes_inline_block() {
        let b64 = STANDARD.encode(PNG_BYTES);
        let attachments = vec![Attachment::new(b64.clone()).with_mime_type("image/png")];

        let result = parse_message_with_attachments("look", &attachments, ParseOptions::default())
            .await
            .unwrap();

        assert_eq!(result.images, vec![ImageBlock::new(b64, "image/png")]);
        assert!(result.files.is_empty());
        assert_eq!(result.message, "look");
    }

    #[tokio::test]
    async fn image_data_is_the_stripped_payload() {
        let b64 = STANDARD.encode(PNG_BYTES);
        let attachments = vec![Attachment::new(format!("data:image/png;base64,{b64}"))];

        let result = parse_message_with_attachments("", &attachments, ParseOptions::default())
            .await
            .unwrap();

        assert_eq!(result.images.len(), 1);
        assert_eq!(result.images[0].data, b64);
        assert_eq!(result.images[0].mime_type, "image/png");
    }

    #[tokio::test]
    async fn unsniffable_declared_image_is_trusted() {
        let parser = AttachmentParser::with_sniffer(ParseOptions::default(), Box::new(BlindSniffer));
        let attachments = vec![Attachment::new("SGVsbG8=").with_mime_type("IMAGE/WEBP; q=1")];

        let result = parser.parse("", &attachments).await.unwrap();

        assert_eq!(result.images.len(), 1);
        assert_eq!(result.images[0].mime_type, "image/webp");
    }

    #[tokio::test]
    async fn mislabeled_pdf_is_saved_as_pdf() {
        let workspace = tempfile::tempdir().unwrap();
        let pdf = pdf_bytes();
        let attachments = vec![
            Attachment::new(STANDARD.encode(&pdf))
                .with_mime_type("image/png")
                .with_file_name("scan.png"),
        ];

        let result = parse_message_with_attachments(
            "see scan",
            &attachments,
            ParseOptions::default().with_workspace(workspace.path()),
        )
        .await
        .unwrap();

        assert!(result.images.is_empty());
        assert_eq!(result.files.len(), 1);
        let saved = &result.files[0];
        assert_eq!(saved.mime_type, "application/pdf");
        assert_eq!(saved.file_name, "scan.png");
        assert_eq!(tokio::fs::read(&saved.file_path).await.unwrap(), pdf);
        assert!(result.message.starts_with("see scan\n\n[Attached file: scan.png (application/pdf, "));
    }

    #[tokio::test]
    async fn no_workspace_drops_files_and_keeps_message() {
        let attachments = vec![
            Attachment::new(STANDARD.encode(pdf_bytes())).with_file_name("report.pdf"),
        ];

        let result = parse_message_with_attachments("hello", &attachments, ParseOptions::default())
            .await
            .unwrap();

        assert!(result.files.is_empty());
        assert!(result.images.is_empty());
        assert_eq!(result.message, "hello");
    }

    #[tokio::test]
    async fn dropped_file_is_logged_with_its_label() {
        let capture = WarnCapture::default();
        let _guard = capture.install();
        let attachments = vec![
            Attachment::new(STANDARD.encode(pdf_bytes())).with_file_name("report.pdf"),
        ];

        parse_message_with_attachments("hello", &attachments, ParseOptions::default())
            .await
            .unwrap();

        let warnings = capture.take();
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].label.as_deref(), Some("report.pdf"));
        assert!(warnings[0].message.contains("no workspace"));
    }

    #[test]
    fn mime_mismatch_is_logged_with_its_label() {
        let capture = WarnCapture::default();
        let _guard = capture.install();
        let parser = AttachmentParser::new(ParseOptions::default());
        let attachment = Attachment::new(STANDARD.encode(pdf_bytes()))
            .with_mime_type("image/png")
            .with_file_name("scan.png");

        let classified = parser.classify(&attachment, 0).unwrap();

        assert_eq!(classified.decision.effective_mime, "application/pdf");
        let warnings = capture.take();
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].label.as_deref(), Some("scan.png"));
        assert!(warnings[0].message.contains("MIME mismatch"));
    }

    #[test]
    fn agreeing_types_log_no_warning() {
        let capture = WarnCapture::default();
        let _guard = capture.install();
        let parser = AttachmentParser::new(ParseOptions::default());
        let attachment = Attachment::new(STANDARD.encode(PNG_BYTES)).with_mime_type("image/png");

        parser.classify(&attachment, 0).unwrap();

        assert!(capture.take().is_empty());
    }

    #[tokio::test]
    async fn bad_attachment_rejects_batch_before_writing() {
        let workspace = tempfile::tempdir().unwrap();
        let attachments = vec![
            Attachment::new(STANDARD.encode(pdf_bytes())).with_file_name("ok.pdf"),
            Attachment::new("%%%%").with_file_name("broken.bin"),
        ];

        let err = parse_message_with_attachments(
            "hi",
            &attachments,
            ParseOptions::default().with_workspace(workspace.path()),
        )
        .await
        .unwrap_err();

        assert!(matches!(err, AttachmentError::InvalidBase64 { .. }));
        assert_eq!(err.label(), "broken.bin");
        assert!(!workspace.path().join("media").exists());
    }

    #[tokio::test]
    async fn oversized_attachment_reports_size_and_limit() {
        let attachments = vec![Attachment::new(STANDARD.encode([7u8; 11]))];

        let err = parse_message_with_attachments(
            "",
            &attachments,
            ParseOptions::default().with_max_bytes(10),
        )
        .await
        .unwrap_err();

        match err {
            AttachmentError::TooLarge { label, size, limit } => {
                assert_eq!(label, "attachment-1");
                assert_eq!(size, 11);
                assert_eq!(limit, 10);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn save_failure_only_drops_that_file() {
        let root = tempfile::tempdir().unwrap();
        let not_a_dir = root.path().join("workspace");
        tokio::fs::write(&not_a_dir, b"occupied").await.unwrap();

        let attachments = vec![
            Attachment::new(STANDARD.encode(PNG_BYTES)).with_file_name("pic.png"),
            Attachment::new(STANDARD.encode(pdf_bytes())).with_file_name("doc.pdf"),
        ];

        let result = parse_message_with_attachments(
            "msg",
            &attachments,
            ParseOptions::default().with_workspace(&not_a_dir),
        )
        .await
        .unwrap();

        assert_eq!(result.images.len(), 1);
        assert!(result.files.is_empty());
        assert_eq!(result.message, "msg");
    }

    #[tokio::test]
    async fn user_turn_carries_text_and_images() {
        let attachments = vec![Attachment::new(STANDARD.encode(PNG_BYTES))];
        let turn = parse_message_with_attachments("caption", &attachments, ParseOptions::default())
            .await
            .unwrap()
            .into_user_turn();

        assert_eq!(turn.text(), Some("caption"));
        assert_eq!(turn.image_count(), 1);
    }
}
