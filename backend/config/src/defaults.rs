//! Config defaults: applies sensible default values to parsed config.

use crate::schema::{AgentsConfig, ClawdropConfig, LoggingConfig, MediaConfig};

/// Default per-attachment ceiling (decoded bytes), shared with the pipeline.
pub use clawdrop_media::DEFAULT_MAX_ATTACHMENT_BYTES;

/// Agent that owns the plain `workspace` directory.
pub const DEFAULT_AGENT_ID: &str = "main";

pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Apply all defaults to a freshly loaded config.
pub fn apply_all_defaults(config: ClawdropConfig) -> ClawdropConfig {
    let config = apply_media_defaults(config);
    let config = apply_agent_defaults(config);
    apply_logging_defaults(config)
}

fn apply_media_defaults(mut config: ClawdropConfig) -> ClawdropConfig {
    let media = config.media.get_or_insert_with(MediaConfig::default);
    if media.max_attachment_bytes.is_none() {
        media.max_attachment_bytes = Some(DEFAULT_MAX_ATTACHMENT_BYTES);
    }
    config
}

fn apply_agent_defaults(mut config: ClawdropConfig) -> ClawdropConfig {
    let agents = config.agents.get_or_insert_with(AgentsConfig::default);
    if agents.default_agent.is_none() {
        agents.default_agent = Some(DEFAULT_AGENT_ID.to_string());
    }
    config
}

fn apply_logging_defaults(mut config: ClawdropConfig) -> ClawdropConfig {
    let logging = config.logging.get_or_insert_with(LoggingConfig::default);
    if logging.level.is_none() {
        logging.level = Some(DEFAULT_LOG_LEVEL.to_string());
    }
    config
}
