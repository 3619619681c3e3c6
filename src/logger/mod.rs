//! Logger module
//!
//! Provides logging utilities for the HTTP server including:
//! - Server lifecycle logging
//! - Access logging in Common Log Format
//! - Error and warning logging
//!
//! Everything goes through `tracing`; `init` installs the fmt subscriber.

mod format;

pub use format::AccessLogEntry;

use crate::config::LoggingConfig;
use std::net::SocketAddr;
use std::path::Path;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Install the global subscriber
///
/// Should be called once at application startup.
pub fn init(config: &LoggingConfig) -> Result<(), Box<dyn std::error::Error>> {
    let filter = EnvFilter::try_new(&config.level)?;
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .try_init()?;
    Ok(())
}

pub fn log_server_start(addr: &SocketAddr, root: &Path, workers: usize) {
    tracing::info!("======================================");
    tracing::info!("Server started successfully");
    tracing::info!("Listening on: http://{addr}");
    tracing::info!("Serving directory: {}", root.display());
    tracing::info!("Worker threads: {workers}");
    tracing::info!("======================================");
}

pub fn log_connection_accepted(peer_addr: &SocketAddr) {
    tracing::debug!(peer = %peer_addr, "[Connection] Accepted");
}

pub fn log_connection_closed(peer_addr: &SocketAddr, requests: u64) {
    tracing::debug!(peer = %peer_addr, requests, "[Connection] Closed");
}

pub fn log_client_disconnect(peer_addr: &SocketAddr, err: &impl std::fmt::Display) {
    tracing::debug!(peer = %peer_addr, "[Connection] Client went away: {err}");
}

pub fn log_connection_error(peer_addr: &SocketAddr, err: &impl std::fmt::Display) {
    tracing::error!(peer = %peer_addr, "[ERROR] Failed to serve connection: {err}");
}

pub fn log_request(method: &str, path: &Path) {
    tracing::debug!("[Request] {method} {}", path.display());
}

pub fn log_error(message: &str) {
    tracing::error!("[ERROR] {message}");
}

pub fn log_warning(message: &str) {
    tracing::warn!("[WARN] {message}");
}

/// Log formatted access log entry
pub fn log_access(entry: &AccessLogEntry) {
    tracing::info!(target: "access", "{}", entry.format_common());
}

pub fn log_shutdown_requested(open_connections: usize) {
    tracing::info!("[Shutdown] Stopped accepting, {open_connections} connection(s) still open");
}

pub fn log_shutdown_complete(aborted: usize) {
    if aborted > 0 {
        tracing::warn!("[Shutdown] Grace period over, aborted {aborted} connection(s)");
    } else {
        tracing::info!("[Shutdown] All connections finished");
    }
}
