//! treeserve: a concurrent HTTP server for a directory tree
//!
//! Directories are answered with an HTML listing, files with their whole
//! content or a single byte range. File bodies go out through `sendfile(2)`
//! on Linux and Android, and through a reused scratch buffer elsewhere.

pub mod config;
pub mod error;
pub mod handler;
pub mod http;
pub mod logger;
pub mod server;
pub mod transfer;

pub use error::ServeError;
