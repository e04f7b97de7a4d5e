//! `clawdrop-config` — runtime configuration for the attachment pipeline.
//!
//! Provides:
//! - Typed config schema (media limits, agent workspaces, logging)
//! - YAML loading
//! - Default value application
//! - Validation with errors and warnings
//! - Config-driven agent workspace resolution

pub mod defaults;
pub mod io;
pub mod schema;
pub mod validation;
pub mod workspace;

// Re-export most-used types at crate root.
pub use defaults::{apply_all_defaults, DEFAULT_LOG_LEVEL, DEFAULT_MAX_ATTACHMENT_BYTES};
pub use io::{config_dir, config_file_path, load_config};
pub use schema::ClawdropConfig;
pub use validation::{validate, ConfigValidationError, ValidationReport};
pub use workspace::{expand_home, normalize_agent_id, ConfigWorkspaceResolver};

use anyhow::{bail, Result};
use std::path::Path;

/// Apply defaults to a loaded config and validate it.
///
/// Warnings are logged; any validation error fails. Call after logging is
/// initialised so the diagnostics are visible.
pub fn prepare(config: ClawdropConfig) -> Result<ClawdropConfig> {
    let config = apply_all_defaults(config);

    let report = validate(&config);
    for warning in &report.warnings {
        tracing::warn!(path = %warning.path, message = %warning.message, "Config warning");
    }
    for error in &report.errors {
        tracing::error!(path = %error.path, message = %error.message, "Config error");
    }
    if let Some(first) = report.errors.first() {
        bail!("{first} ({} error(s) total)", report.errors.len());
    }

    Ok(config)
}

/// Load a config file, then [`prepare`] it.
pub async fn load_and_prepare(path: &Path) -> Result<ClawdropConfig> {
    prepare(load_config(path).await?)
}
