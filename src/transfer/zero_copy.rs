//! `sendfile(2)` transfer: file pages go to the socket without passing
//! through user space

use nix::libc::off_t;
use nix::sys::sendfile::sendfile;
use std::io;
use std::time::Duration;
use tokio::fs::File;
use tokio::io::Interest;
use tokio::net::TcpStream;

use super::{truncated, with_timeout, Result, TransferError};
use crate::http::ByteRange;

/// Most bytes handed to one `sendfile` call
const MAX_CHUNK: u64 = 1024 * 1024;

/// Send `range` of `file` with `sendfile`, waiting for writability whenever
/// the socket buffer is full
///
/// The kernel advances `offset` by what it actually sent, so short writes
/// simply continue from there. `_scratch` is unused on this path.
pub async fn copy_span(
    stream: &mut TcpStream,
    file: File,
    range: ByteRange,
    _scratch: &mut [u8],
    io_timeout: Option<Duration>,
) -> Result<u64> {
    let file = file.into_std().await;
    let mut offset = off_t::try_from(range.start).map_err(|_| {
        TransferError::new(
            0,
            io::Error::new(io::ErrorKind::InvalidInput, "range start exceeds off_t"),
        )
    })?;

    let stream: &TcpStream = stream;
    let mut remaining = range.len();
    let mut sent = 0u64;

    while remaining > 0 {
        let chunk = usize::try_from(remaining.min(MAX_CHUNK)).unwrap_or(usize::MAX);
        let attempt = stream.try_io(Interest::WRITABLE, || {
            sendfile(stream, &file, Some(&mut offset), chunk).map_err(io::Error::from)
        });

        match attempt {
            Ok(0) => return Err(TransferError::new(sent, truncated())),
            Ok(n) => {
                sent += n as u64;
                remaining -= n as u64;
            }
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => {
                with_timeout(io_timeout, stream.writable())
                    .await
                    .map_err(|e| TransferError::new(sent, e))?;
            }
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) => return Err(TransferError::new(sent, e)),
        }
    }

    Ok(sent)
}
