// Configuration types module
// Defines all configuration-related data structures

use serde::Deserialize;
use std::path::PathBuf;

/// Main configuration structure
#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub performance: PerformanceConfig,
}

/// Listening endpoint and served tree
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Directory served as `/`
    pub root: PathBuf,
    /// How long shutdown waits for open connections
    pub shutdown_grace_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "::".to_string(),
            port: 3000,
            root: PathBuf::from("."),
            shutdown_grace_secs: 5,
        }
    }
}

/// Logging configuration
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive, e.g. `info` or `treeserve=debug`
    pub level: String,
    /// Emit one Common Log Format line per request
    pub access_log: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            access_log: true,
        }
    }
}

/// Performance configuration
#[derive(Debug, Deserialize, Clone, Default)]
pub struct PerformanceConfig {
    /// Upper bound for any single socket read, write or writable wait.
    /// Unset means a stalled peer keeps its connection until the transport fails.
    #[serde(default)]
    pub io_timeout_secs: Option<u64>,
}
