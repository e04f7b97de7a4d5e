use std::path::PathBuf;

/// Maps an agent (or session) identifier to the directory the agent works in.
///
/// Inbound files are written beneath the returned directory, so implementations
/// should return a path that exists or can be created.
pub trait WorkspaceResolver: Send + Sync {
    /// Returns `None` when the agent has no usable workspace.
    fn resolve_workspace(&self, agent_id: &str) -> Option<PathBuf>;
}
