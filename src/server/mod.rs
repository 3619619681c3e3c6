// Server module entry point
// Listener setup, the accept loop, per-connection tasks and process signals

pub mod acceptor;
pub mod connection;
pub mod listener;
pub mod runtime;
pub mod signal;

// Re-export commonly used items
pub use acceptor::run_acceptor;
pub use connection::Connection;
pub use listener::create_listener;
pub use runtime::{build_runtime, default_worker_count};
