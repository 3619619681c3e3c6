//! Read/write transfer through the connection's scratch buffer

use std::io::SeekFrom;
use std::time::Duration;
use tokio::fs::File;
use tokio::io::{AsyncReadExt, AsyncSeekExt, AsyncWrite};

use super::{truncated, write_all, Result, TransferError};
use crate::http::ByteRange;

/// Seek to `range.start`, then alternate reads of at most `scratch.len()`
/// bytes with writes of exactly what was read
///
/// Generic over the writer so it also runs against in-memory sinks.
pub async fn copy_span<W>(
    stream: &mut W,
    mut file: File,
    range: ByteRange,
    scratch: &mut [u8],
    io_timeout: Option<Duration>,
) -> Result<u64>
where
    W: AsyncWrite + Unpin,
{
    file.seek(SeekFrom::Start(range.start))
        .await
        .map_err(|e| TransferError::new(0, e))?;

    let mut remaining = range.len();
    let mut sent = 0u64;

    while remaining > 0 {
        let want = usize::try_from(remaining).map_or(scratch.len(), |r| r.min(scratch.len()));
        let n = file
            .read(&mut scratch[..want])
            .await
            .map_err(|e| TransferError::new(sent, e))?;
        if n == 0 {
            return Err(TransferError::new(sent, truncated()));
        }

        write_all(stream, &scratch[..n], io_timeout)
            .await
            .map_err(|e| TransferError::new(sent, e))?;

        sent += n as u64;
        remaining -= n as u64;
    }

    Ok(sent)
}
