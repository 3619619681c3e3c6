// Serving context module
// Read-only settings shared by every connection

use std::path::PathBuf;
use std::time::Duration;

use super::types::Config;

/// Per-process serving context, cloned into each connection behind an `Arc`
#[derive(Debug, Clone)]
pub struct ServeContext {
    /// Served root directory
    pub root: PathBuf,
    /// Whether to emit access log lines
    pub access_log: bool,
    /// Optional bound on each socket operation
    pub io_timeout: Option<Duration>,
}

impl ServeContext {
    pub fn new(config: &Config) -> Self {
        Self {
            root: config.server.root.clone(),
            access_log: config.logging.access_log,
            io_timeout: config
                .performance
                .io_timeout_secs
                .map(Duration::from_secs),
        }
    }

    /// Context serving `root` with defaults for everything else
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            access_log: false,
            io_timeout: None,
        }
    }
}
