// Accept loop module
// Hands every accepted socket to its own task and owns nothing of it afterwards

use std::io;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::Notify;
use tokio::task::JoinSet;

use super::connection::Connection;
use crate::config::ServeContext;
use crate::logger;

/// Delay before accepting again once the process runs out of descriptors
const EXHAUSTED_BACKOFF: Duration = Duration::from_millis(100);

/// What the accept loop does after `accept` fails
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AcceptFailure {
    /// The peer gave up before the handshake finished, accept the next one
    Transient,
    /// Out of file descriptors, back off and retry
    Exhausted,
    /// The listener itself is broken
    Fatal,
}

fn classify_accept_error(err: &io::Error) -> AcceptFailure {
    match err.kind() {
        io::ErrorKind::ConnectionAborted
        | io::ErrorKind::ConnectionReset
        | io::ErrorKind::ConnectionRefused
        | io::ErrorKind::Interrupted
        | io::ErrorKind::WouldBlock => AcceptFailure::Transient,
        _ if is_descriptor_exhaustion(err) => AcceptFailure::Exhausted,
        _ => AcceptFailure::Fatal,
    }
}

// ENFILE and EMFILE share these numbers on every unix target
#[cfg(unix)]
fn is_descriptor_exhaustion(err: &io::Error) -> bool {
    matches!(err.raw_os_error(), Some(23 | 24))
}

#[cfg(not(unix))]
fn is_descriptor_exhaustion(_err: &io::Error) -> bool {
    false
}

/// Accept connections until `shutdown` is notified or the listener breaks
///
/// On shutdown the listener is closed first, open connections get `grace`
/// to finish and whatever is left is aborted. Aborted handshakes are skipped
/// and descriptor exhaustion is retried after a short pause. Any other accept
/// error stops the loop but lets running connections complete.
#[allow(clippy::ignored_unit_patterns)]
pub async fn run_acceptor(
    listener: TcpListener,
    ctx: Arc<ServeContext>,
    shutdown: Arc<Notify>,
    grace: Duration,
) -> io::Result<()> {
    let mut connections = JoinSet::new();

    let outcome = loop {
        tokio::select! {
            accept_result = listener.accept() => {
                match accept_result {
                    Ok((stream, peer_addr)) => {
                        accept_connection(&mut connections, stream, peer_addr, &ctx);
                    }
                    Err(e) => match classify_accept_error(&e) {
                        AcceptFailure::Transient => {
                            logger::log_warning(&format!("Dropped connection during accept: {e}"));
                        }
                        AcceptFailure::Exhausted => {
                            logger::log_warning(&format!("Cannot accept connection, retrying: {e}"));
                            tokio::time::sleep(EXHAUSTED_BACKOFF).await;
                        }
                        AcceptFailure::Fatal => {
                            logger::log_error(&format!("Failed to accept connection: {e}"));
                            break Err(e);
                        }
                    },
                }
            }

            Some(finished) = connections.join_next(), if !connections.is_empty() => {
                if let Err(e) = finished {
                    if e.is_panic() {
                        logger::log_error(&format!("Connection task panicked: {e}"));
                    }
                }
            }

            _ = shutdown.notified() => break Ok(()),
        }
    };

    drop(listener);

    match outcome {
        Ok(()) => drain_connections(connections, grace).await,
        Err(_) => while connections.join_next().await.is_some() {},
    }

    outcome
}

fn accept_connection(
    connections: &mut JoinSet<()>,
    stream: TcpStream,
    peer_addr: std::net::SocketAddr,
    ctx: &Arc<ServeContext>,
) {
    logger::log_connection_accepted(&peer_addr);
    let connection = Connection::new(stream, peer_addr, Arc::clone(ctx));
    connections.spawn(connection.run());
}

/// Wait up to `grace` for open connections, then abort the rest
async fn drain_connections(mut connections: JoinSet<()>, grace: Duration) {
    logger::log_shutdown_requested(connections.len());

    let drained = tokio::time::timeout(grace, async {
        while connections.join_next().await.is_some() {}
    })
    .await;

    let aborted = if drained.is_ok() {
        0
    } else {
        let left = connections.len();
        connections.shutdown().await;
        left
    };

    logger::log_shutdown_complete(aborted);
}
