//! `clawdrop parse` — process a JSON chat request `{ message, attachments }`.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use clawdrop_media::{parse_message_with_attachments, Attachment};
use serde::Deserialize;
use tokio::io::AsyncReadExt;

use crate::config::{Runtime, TargetArgs};

#[derive(Debug, Args)]
pub struct ParseArgs {
    #[command(flatten)]
    pub target: TargetArgs,

    /// Request file; reads stdin when omitted or `-`
    pub request: Option<PathBuf>,
}

/// The chat request shape a client sends.
#[derive(Debug, Default, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub attachments: Vec<Attachment>,
}

async fn read_request(path: Option<&PathBuf>) -> Result<String> {
    match path.filter(|p| p.as_os_str() != "-") {
        Some(path) => tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read request {}", path.display())),
        None => {
            let mut raw = String::new();
            tokio::io::stdin()
                .read_to_string(&mut raw)
                .await
                .context("Failed to read request from stdin")?;
            Ok(raw)
        }
    }
}

pub async fn run(runtime: &Runtime, args: ParseArgs) -> Result<()> {
    let raw = read_request(args.request.as_ref()).await?;
    let request: ChatRequest =
        serde_json::from_str(&raw).context("Request is not a valid chat request")?;

    let options = runtime.parse_options(&args.target);
    let result =
        parse_message_with_attachments(&request.message, &request.attachments, options).await?;
    crate::print_result(result, args.target.turn)
}
