//! Agent workspace resolution.
//!
//! Priority for an agent: its own `agents.list[].workspace`, then (default
//! agent only) `agents.defaults.workspace`, then `<state dir>/workspace` for
//! the default agent or `<state dir>/workspace-<id>` for everyone else.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use clawdrop_core::WorkspaceResolver;
use tracing::debug;

use crate::defaults::DEFAULT_AGENT_ID;
use crate::io::config_dir;
use crate::schema::ClawdropConfig;

/// Trim and lowercase an agent id. Ids that could escape the state directory
/// are rejected.
pub fn normalize_agent_id(raw: &str) -> Option<String> {
    let id = raw.trim().to_ascii_lowercase();
    if id.is_empty() || id.contains(['/', '\\']) || id.contains("..") {
        return None;
    }
    Some(id)
}

/// Expand a leading `~/` (or a bare `~`) to the home directory.
pub fn expand_home(path: &str) -> PathBuf {
    if path == "~" {
        if let Some(home) = dirs::home_dir() {
            return home;
        }
    }
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    PathBuf::from(path)
}

fn non_blank(value: Option<&String>) -> Option<&str> {
    value.map(|s| s.trim()).filter(|s| !s.is_empty())
}

/// Workspace resolver driven by [`ClawdropConfig`].
#[derive(Debug, Clone)]
pub struct ConfigWorkspaceResolver {
    state_dir: PathBuf,
    default_agent: String,
    default_workspace: Option<PathBuf>,
    overrides: HashMap<String, PathBuf>,
}

impl ConfigWorkspaceResolver {
    pub fn from_config(config: &ClawdropConfig) -> Self {
        let state_dir = non_blank(config.state_dir.as_ref())
            .map(expand_home)
            .unwrap_or_else(config_dir);

        let agents = config.agents.as_ref();
        let default_agent = agents
            .and_then(|a| a.default_agent.as_deref())
            .and_then(normalize_agent_id)
            .unwrap_or_else(|| DEFAULT_AGENT_ID.to_string());

        let default_workspace = agents
            .and_then(|a| a.defaults.as_ref())
            .and_then(|d| non_blank(d.workspace.as_ref()))
            .map(expand_home);

        let overrides = agents
            .map(|a| a.list.as_slice())
            .unwrap_or_default()
            .iter()
            .filter_map(|entry| {
                let id = normalize_agent_id(&entry.id)?;
                let workspace = non_blank(entry.workspace.as_ref())?;
                Some((id, expand_home(workspace)))
            })
            .collect();

        Self {
            state_dir,
            default_agent,
            default_workspace,
            overrides,
        }
    }

    pub fn state_dir(&self) -> &Path {
        &self.state_dir
    }

    pub fn default_agent(&self) -> &str {
        &self.default_agent
    }
}

impl WorkspaceResolver for ConfigWorkspaceResolver {
    fn resolve_workspace(&self, agent_id: &str) -> Option<PathBuf> {
        let Some(id) = normalize_agent_id(agent_id) else {
            debug!(agent_id = %agent_id, "Rejected agent id for workspace resolution");
            return None;
        };

        if let Some(dir) = self.overrides.get(&id) {
            return Some(dir.clone());
        }
        if id == self.default_agent {
            return Some(
                self.default_workspace
                    .clone()
                    .unwrap_or_else(|| self.state_dir.join("workspace")),
            );
        }
        Some(self.state_dir.join(format!("workspace-{id}")))
    }
}
