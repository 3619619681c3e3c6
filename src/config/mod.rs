// Configuration module entry point
// Loads static settings once at startup; nothing here changes at runtime

mod state;
mod types;

use std::net::{IpAddr, SocketAddr};

// Re-export public types
pub use state::ServeContext;
pub use types::{Config, LoggingConfig, PerformanceConfig, ServerConfig};

/// Config file looked up in the working directory (extension optional)
pub const DEFAULT_CONFIG_FILE: &str = "treeserve";

impl Config {
    /// Load configuration from the default file, falling back to built-in defaults
    pub fn load() -> Result<Self, config::ConfigError> {
        Self::load_from(DEFAULT_CONFIG_FILE)
    }

    /// Load configuration from specified file path (without extension)
    /// A missing file is not an error; every key has a default
    pub fn load_from(config_path: &str) -> Result<Self, config::ConfigError> {
        let defaults = Self::default();
        let settings = config::Config::builder()
            .set_default("server.host", defaults.server.host)?
            .set_default("server.port", i64::from(defaults.server.port))?
            .set_default("server.root", defaults.server.root.to_string_lossy().into_owned())?
            .set_default(
                "server.shutdown_grace_secs",
                i64::try_from(defaults.server.shutdown_grace_secs).unwrap_or(i64::MAX),
            )?
            .set_default("logging.level", defaults.logging.level)?
            .set_default("logging.access_log", defaults.logging.access_log)?
            .add_source(config::File::with_name(config_path).required(false))
            .build()?;

        settings.try_deserialize()
    }

    pub fn get_socket_addr(&self) -> Result<SocketAddr, String> {
        let ip: IpAddr = self
            .server
            .host
            .trim_matches(|c| c == '[' || c == ']')
            .parse()
            .map_err(|e| format!("Invalid address '{}': {e}", self.server.host))?;
        Ok(SocketAddr::new(ip, self.server.port))
    }
}
