//! Config validation: deep schema checks with user-friendly error messages.

use std::collections::HashSet;

use crate::schema::ClawdropConfig;
use crate::workspace::normalize_agent_id;
use thiserror::Error;

/// Limits above this are allowed but almost certainly a typo.
pub const MAX_SANE_ATTACHMENT_BYTES: usize = 50_000_000;

/// A config validation error with field path and message.
#[derive(Debug, Error)]
#[error("Config validation error at '{path}': {message}")]
pub struct ConfigValidationError {
    pub path: String,
    pub message: String,
}

/// A collection of validation errors found in one pass.
#[derive(Debug, Default)]
pub struct ValidationReport {
    pub errors: Vec<ConfigValidationError>,
    pub warnings: Vec<ConfigValidationError>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    fn error(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.errors.push(ConfigValidationError {
            path: path.into(),
            message: message.into(),
        });
    }

    fn warn(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.warnings.push(ConfigValidationError {
            path: path.into(),
            message: message.into(),
        });
    }
}

/// Validate the config and return a report of all errors and warnings.
pub fn validate(config: &ClawdropConfig) -> ValidationReport {
    let mut report = ValidationReport::default();
    validate_media(config, &mut report);
    validate_agents(config, &mut report);
    report
}

fn validate_media(config: &ClawdropConfig, report: &mut ValidationReport) {
    let Some(limit) = config.max_attachment_bytes() else { return };
    if limit == 0 {
        report.error("media.maxAttachmentBytes", "maxAttachmentBytes must be > 0");
    } else if limit > MAX_SANE_ATTACHMENT_BYTES {
        report.warn(
            "media.maxAttachmentBytes",
            format!("{limit} bytes is unusually large; attachments are fully buffered in memory"),
        );
    }
}

fn validate_agents(config: &ClawdropConfig, report: &mut ValidationReport) {
    let Some(agents) = &config.agents else { return };

    if let Some(default_agent) = &agents.default_agent {
        if normalize_agent_id(default_agent).is_none() {
            report.error(
                "agents.defaultAgent",
                format!("'{default_agent}' is not a valid agent id"),
            );
        }
    }

    let mut seen = HashSet::new();
    for (i, entry) in agents.list.iter().enumerate() {
        let path = format!("agents.list[{i}].id");
        match normalize_agent_id(&entry.id) {
            None => report.error(path, format!("'{}' is not a valid agent id", entry.id)),
            Some(id) => {
                if !seen.insert(id.clone()) {
                    report.error(path, format!("Duplicate agent id '{id}'"));
                }
            }
        }
        if entry.workspace.as_deref().is_some_and(|w| w.trim().is_empty()) {
            report.warn(
                format!("agents.list[{i}].workspace"),
                "Empty workspace is ignored",
            );
        }
    }
}
