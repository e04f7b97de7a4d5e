//! Structured logging setup for clawdrop binaries.
//!
//! Console output on stderr plus optional daily-rotated NDJSON files.

pub mod logger;

pub use logger::{LOG_FILE_PREFIX, init_logger};
