//! File body transfer
//!
//! One capability, `copy_span`, sends an inclusive byte span of an open file
//! to the client socket. Linux and Android get the `sendfile(2)` strategy,
//! every other target reads into the connection's scratch buffer and writes
//! it out. The choice is made at compile time; there is no runtime fallback.

pub mod portable;
#[cfg(any(target_os = "linux", target_os = "android"))]
pub mod zero_copy;

use std::future::Future;
use std::io;
use std::time::Duration;
use tokio::fs::File;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::net::TcpStream;

use crate::error::ServeError;
use crate::http::{ByteRange, ResponseHead};

#[cfg(not(any(target_os = "linux", target_os = "android")))]
pub use portable::copy_span;
#[cfg(any(target_os = "linux", target_os = "android"))]
pub use zero_copy::copy_span;

/// Name of the compiled-in strategy, for the startup log
#[cfg(any(target_os = "linux", target_os = "android"))]
pub const STRATEGY: &str = "sendfile";
#[cfg(not(any(target_os = "linux", target_os = "android")))]
pub const STRATEGY: &str = "read/write";

/// Transfer stopped before the whole span was sent
#[derive(Debug)]
pub struct TransferError {
    /// Bytes that reached the socket before the failure
    pub sent: u64,
    pub source: io::Error,
}

impl TransferError {
    pub const fn new(sent: u64, source: io::Error) -> Self {
        Self { sent, source }
    }
}

pub type Result<T> = std::result::Result<T, TransferError>;

/// Write `head`, then the bytes of `span` from `file`
///
/// `None` sends the head alone (empty file). Returns the body bytes sent.
pub async fn send_file(
    stream: &mut TcpStream,
    head: &ResponseHead,
    file: File,
    span: Option<ByteRange>,
    scratch: &mut [u8],
    io_timeout: Option<Duration>,
) -> std::result::Result<u64, ServeError> {
    write_all(stream, &head.encode(), io_timeout).await?;

    let Some(range) = span else {
        return Ok(0);
    };

    copy_span(stream, file, range, scratch, io_timeout)
        .await
        .map_err(|e| ServeError::Transfer {
            sent: e.sent,
            expected: range.len(),
            source: e.source,
        })
}

/// `write_all` bounded by the optional I/O timeout
pub async fn write_all<W>(stream: &mut W, buf: &[u8], io_timeout: Option<Duration>) -> io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    with_timeout(io_timeout, stream.write_all(buf)).await
}

/// Run one socket operation, failing with `TimedOut` past the limit
pub async fn with_timeout<T>(
    limit: Option<Duration>,
    op: impl Future<Output = io::Result<T>>,
) -> io::Result<T> {
    match limit {
        None => op.await,
        Some(limit) => tokio::time::timeout(limit, op)
            .await
            .map_err(|_| io::Error::new(io::ErrorKind::TimedOut, "socket operation timed out"))?,
    }
}

/// Error for a file that got shorter while it was being sent
fn truncated() -> io::Error {
    io::Error::other("file ended before the requested range")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tokio::io::AsyncReadExt;
    use tokio::net::TcpListener;

    /// Deterministic content that differs at every offset mod 251
    fn pattern(len: usize) -> Vec<u8> {
        (0..len).map(|i| (i % 251) as u8).collect()
    }

    fn temp_file(data: &[u8]) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(data).unwrap();
        file.flush().unwrap();
        file
    }

    /// Connected socket pair: (server side, client side)
    async fn socket_pair() -> (TcpStream, TcpStream) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (client, accepted) = tokio::join!(TcpStream::connect(addr), listener.accept());
        (accepted.unwrap().0, client.unwrap())
    }

    async fn transfer_through_socket(data: &[u8], range: ByteRange) -> Vec<u8> {
        let tmp = temp_file(data);
        let (mut server, mut client) = socket_pair().await;

        let reader = tokio::spawn(async move {
            let mut received = Vec::new();
            client.read_to_end(&mut received).await.unwrap();
            received
        });

        let file = File::open(tmp.path()).await.unwrap();
        let mut scratch = vec![0u8; 64 * 1024];
        let sent = copy_span(&mut server, file, range, &mut scratch, None)
            .await
            .unwrap();
        assert_eq!(sent, range.len());
        drop(server);

        reader.await.unwrap()
    }

    #[tokio::test]
    async fn test_copy_span_middle() {
        let data = pattern(10_000);
        let got = transfer_through_socket(&data, ByteRange { start: 100, end: 4099 }).await;
        assert_eq!(got, &data[100..4100]);
    }

    #[tokio::test]
    async fn test_copy_span_larger_than_chunks() {
        // Several sendfile chunks and many scratch-sized reads
        let data = pattern(3 * 1024 * 1024 + 17);
        let range = ByteRange::whole(data.len() as u64).unwrap();
        let got = transfer_through_socket(&data, range).await;
        assert_eq!(got.len(), data.len());
        assert!(got == data);
    }

    #[tokio::test]
    async fn test_single_byte() {
        let data = pattern(64);
        let got = transfer_through_socket(&data, ByteRange { start: 9, end: 9 }).await;
        assert_eq!(got, [9u8]);
    }

    #[tokio::test]
    async fn test_strategies_send_identical_bytes() {
        let data = pattern(200_000);
        let tmp = temp_file(&data);
        let range = ByteRange { start: 12_345, end: 150_000 };

        let mut portable_out = Vec::new();
        let file = File::open(tmp.path()).await.unwrap();
        let mut scratch = vec![0u8; 4096];
        portable::copy_span(&mut portable_out, file, range, &mut scratch, None)
            .await
            .unwrap();

        let compiled_out = transfer_through_socket(&data, range).await;
        assert!(portable_out == compiled_out);
        assert_eq!(portable_out.len() as u64, range.len());
    }

    #[tokio::test]
    async fn test_file_shorter_than_range() {
        let tmp = temp_file(&pattern(100));
        let (mut server, _client) = socket_pair().await;
        let file = File::open(tmp.path()).await.unwrap();
        let mut scratch = vec![0u8; 1024];

        let err = copy_span(&mut server, file, ByteRange { start: 50, end: 199 }, &mut scratch, None)
            .await
            .unwrap_err();
        assert_eq!(err.sent, 50);
        assert_eq!(err.source.kind(), io::ErrorKind::Other);
    }

    #[tokio::test]
    async fn test_send_file_head_only() {
        let tmp = temp_file(b"");
        let (mut server, mut client) = socket_pair().await;
        let file = File::open(tmp.path()).await.unwrap();
        let head = crate::http::build_file_head("text/plain", 0);

        let sent = send_file(&mut server, &head, file, None, &mut [0u8; 16], None)
            .await
            .unwrap();
        assert_eq!(sent, 0);
        drop(server);

        let mut received = String::new();
        client.read_to_string(&mut received).await.unwrap();
        assert!(received.starts_with("HTTP/1.1 200 OK\r\n"));
        assert!(received.ends_with("\r\n\r\n"));
    }

    #[tokio::test]
    async fn test_with_timeout_expires() {
        let pending = std::future::pending::<io::Result<()>>();
        let err = with_timeout(Some(Duration::from_millis(10)), pending)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::TimedOut);
    }
}
