//! `clawdrop ingest` — run local files through the attachment pipeline.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use base64::{engine::general_purpose::STANDARD, Engine};
use clap::Args;
use clawdrop_media::{guess_mime_from_path, parse_message_with_attachments, Attachment};
use tokio::fs;
use tracing::info;

use crate::config::{Runtime, TargetArgs};

#[derive(Debug, Args)]
pub struct IngestArgs {
    /// Message text the attachments accompany
    #[arg(short, long, default_value = "")]
    pub message: String,

    #[command(flatten)]
    pub target: TargetArgs,

    /// Files to attach
    #[arg(required = true)]
    pub files: Vec<PathBuf>,
}

/// Build an attachment the way a chat client would: base64 content, a MIME
/// type guessed from the extension, and the bare file name.
pub async fn attachment_from_path(path: &Path) -> Result<Attachment> {
    let bytes = fs::read(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;

    let mut attachment = Attachment::new(STANDARD.encode(&bytes));
    if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
        attachment = attachment.with_file_name(name);
    }
    if let Some(mime) = guess_mime_from_path(path) {
        attachment = attachment.with_mime_type(mime);
    }
    Ok(attachment)
}

pub async fn run(runtime: &Runtime, args: IngestArgs) -> Result<()> {
    let mut attachments = Vec::with_capacity(args.files.len());
    for path in &args.files {
        attachments.push(attachment_from_path(path).await?);
    }

    let options = runtime.parse_options(&args.target);
    info!(
        count = attachments.len(),
        workspace = ?options.workspace_dir,
        "Ingesting attachments"
    );

    let result = parse_message_with_attachments(&args.message, &attachments, options).await?;
    crate::print_result(result, args.target.turn)
}
