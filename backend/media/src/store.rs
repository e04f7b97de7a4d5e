//! Inbound file store: writes non-image attachments into an agent workspace.
//!
//! Files land at `<workspace>/media/inbound/<8 hex>-<sanitized name>`. Agents
//! are told these paths verbatim, so the layout must not change.

use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;
use tracing::debug;
use uuid::Uuid;

/// Directory, relative to the workspace root, receiving inbound files.
pub const INBOUND_DIR: &str = "media/inbound";

/// Longest sanitized file name kept after the random prefix.
pub const MAX_FILE_NAME_CHARS: usize = 200;

const PREFIX_HEX_CHARS: usize = 8;
const MAX_NAME_ATTEMPTS: usize = 4;

/// A non-image attachment persisted to the workspace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedFile {
    /// Absolute path of the written file.
    pub file_path: PathBuf,
    /// Name as claimed by the client, before sanitizing.
    pub file_name: String,
    pub mime_type: String,
    pub size_bytes: usize,
}

/// Reduce a client-supplied file name to `[A-Za-z0-9._-]`, capped in length.
///
/// Every other character, path separators included, becomes `_`.
pub fn sanitize_file_name(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .take(MAX_FILE_NAME_CHARS)
        .collect()
}

fn random_prefix() -> String {
    let mut id = Uuid::new_v4().simple().to_string();
    id.truncate(PREFIX_HEX_CHARS);
    id
}

/// Drop `.` and fold `..` into its parent without touching the filesystem.
fn normalize_lexically(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other),
        }
    }
    out
}

/// Absolute path of the inbound directory for a workspace, free of `.` and `..`.
pub fn inbound_dir(workspace: &Path) -> Result<PathBuf> {
    let dir = workspace.join(INBOUND_DIR);
    let absolute = std::path::absolute(&dir)
        .with_context(|| format!("Failed to resolve inbound directory: {}", dir.display()))?;
    Ok(normalize_lexically(&absolute))
}

/// Write `bytes` under a fresh unique name in the workspace inbound directory.
///
/// Files are created with create-new semantics, so two writers can never
/// clobber each other; on a prefix collision a new prefix is drawn.
pub async fn save_inbound_file(
    workspace: &Path,
    bytes: &[u8],
    mime_type: &str,
    file_name: &str,
) -> Result<SavedFile> {
    let dir = inbound_dir(workspace)?;
    fs::create_dir_all(&dir)
        .await
        .with_context(|| format!("Failed to create inbound directory: {}", dir.display()))?;

    let safe_name = sanitize_file_name(file_name);

    for _ in 0..MAX_NAME_ATTEMPTS {
        let dest = dir.join(format!("{}-{}", random_prefix(), safe_name));
        let mut file = match OpenOptions::new().write(true).create_new(true).open(&dest).await {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                debug!(path = %dest.display(), "Inbound name taken, drawing a new prefix");
                continue;
            }
            Err(e) => {
                return Err(e)
                    .with_context(|| format!("Failed to create inbound file: {}", dest.display()));
            }
        };

        let written = async {
            file.write_all(bytes).await?;
            file.flush().await
        }
        .await;
        if let Err(e) = written {
            let _ = fs::remove_file(&dest).await;
            return Err(e).with_context(|| format!("Failed to write inbound file: {}", dest.display()));
        }

        debug!(path = %dest.display(), size = bytes.len(), "Saved inbound file");
        return Ok(SavedFile {
            file_path: dest,
            file_name: file_name.to_string(),
            mime_type: mime_type.to_string(),
            size_bytes: bytes.len(),
        });
    }

    bail!(
        "Could not find a free inbound file name for {} after {} attempts",
        safe_name,
        MAX_NAME_ATTEMPTS
    )
}
