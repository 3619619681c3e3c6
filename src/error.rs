//! Connection-level error type
//!
//! A missing file is not an error here: it turns into a 404 reply and the
//! connection keeps going. Every variant below ends the connection.

use std::io;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServeError {
    /// Request head could not be parsed or uses an unsupported framing
    #[error("malformed request: {0}")]
    Protocol(String),

    /// Request head did not fit in the receive limit
    #[error("request head exceeds {0} bytes")]
    HeadTooLarge(usize),

    /// Socket or filesystem failure outside a body transfer
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Body transfer stopped early
    #[error("transfer failed after {sent} of {expected} bytes: {source}")]
    Transfer {
        sent: u64,
        expected: u64,
        #[source]
        source: io::Error,
    },
}

impl ServeError {
    /// Whether the peer simply went away (reset, broken pipe, EOF mid-write)
    pub fn is_disconnect(&self) -> bool {
        match self {
            Self::Io(e) | Self::Transfer { source: e, .. } => is_disconnect_kind(e.kind()),
            Self::Protocol(_) | Self::HeadTooLarge(_) => false,
        }
    }
}

impl From<httparse::Error> for ServeError {
    fn from(e: httparse::Error) -> Self {
        Self::Protocol(e.to_string())
    }
}

const fn is_disconnect_kind(kind: io::ErrorKind) -> bool {
    matches!(
        kind,
        io::ErrorKind::ConnectionReset
            | io::ErrorKind::ConnectionAborted
            | io::ErrorKind::BrokenPipe
            | io::ErrorKind::UnexpectedEof
            | io::ErrorKind::WriteZero
    )
}
