use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::Args;
use clawdrop_config::{
    config_dir, config_file_path, expand_home, load_config, prepare, ClawdropConfig,
    ConfigWorkspaceResolver, DEFAULT_LOG_LEVEL, DEFAULT_MAX_ATTACHMENT_BYTES,
};
use clawdrop_core::WorkspaceResolver;
use clawdrop_media::ParseOptions;

/// Where attachments go and how large they may be.
#[derive(Debug, Clone, Default, Args)]
pub struct TargetArgs {
    /// Workspace directory receiving non-image attachments
    #[arg(short, long, conflicts_with = "agent")]
    pub workspace: Option<PathBuf>,

    /// Resolve the workspace of this agent from config
    #[arg(short, long)]
    pub agent: Option<String>,

    /// Override the per-attachment size limit (bytes)
    #[arg(long)]
    pub max_bytes: Option<usize>,

    /// Print the model-facing user turn instead of the raw parse result
    #[arg(long)]
    pub turn: bool,
}

/// Loaded config plus the resolver built from it.
pub struct Runtime {
    pub config: ClawdropConfig,
    pub resolver: ConfigWorkspaceResolver,
}

/// Read the config file without defaults, enough to set up logging.
pub async fn load_raw(path: Option<&Path>) -> Result<ClawdropConfig> {
    let path = path
        .map(Path::to_path_buf)
        .unwrap_or_else(|| config_file_path(&config_dir()));
    load_config(&path).await
}

pub fn log_settings(config: &ClawdropConfig) -> (Option<PathBuf>, String) {
    let dir = config.log_dir().map(expand_home);
    let level = config.log_level().unwrap_or(DEFAULT_LOG_LEVEL).to_string();
    (dir, level)
}

impl Runtime {
    pub fn new(raw: ClawdropConfig) -> Result<Self> {
        let config = prepare(raw)?;
        let resolver = ConfigWorkspaceResolver::from_config(&config);
        Ok(Self { config, resolver })
    }

    /// Explicit `--workspace` wins; otherwise `--agent` is resolved. With
    /// neither, no workspace is used and non-image attachments are dropped.
    pub fn workspace_for(&self, target: &TargetArgs) -> Option<PathBuf> {
        if let Some(dir) = &target.workspace {
            return Some(dir.clone());
        }
        let agent = target.agent.as_deref()?;
        self.resolver.resolve_workspace(agent)
    }

    pub fn parse_options(&self, target: &TargetArgs) -> ParseOptions {
        let max_bytes = target
            .max_bytes
            .or_else(|| self.config.max_attachment_bytes())
            .unwrap_or(DEFAULT_MAX_ATTACHMENT_BYTES);
        ParseOptions {
            max_bytes,
            workspace_dir: self.workspace_for(target),
        }
    }
}
