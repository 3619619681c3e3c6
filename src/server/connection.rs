// Connection handling module
// One task per accepted socket: read a request, answer it, repeat while keep-alive holds

use bytes::{Buf, BytesMut};
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::io::AsyncReadExt;
use tokio::net::TcpStream;

use crate::config::ServeContext;
use crate::error::ServeError;
use crate::handler::{self, Reply};
use crate::http::{parse_request, ByteRange, Request};
use crate::logger::{self, AccessLogEntry};
use crate::transfer;

/// Scratch buffer for the read/write transfer path and for discarding bodies
pub const SCRATCH_SIZE: usize = 64 * 1024;

/// Receive buffer growth per socket read
const READ_CHUNK: usize = 8 * 1024;

/// Per-connection state, owned by exactly one task
pub struct Connection {
    stream: TcpStream,
    peer: SocketAddr,
    ctx: Arc<ServeContext>,
    /// Bytes read but not yet parsed; may hold a pipelined request
    recv: BytesMut,
    /// Allocated once, reused by every request on this connection
    scratch: Box<[u8]>,
    served: u64,
}

impl Connection {
    pub fn new(stream: TcpStream, peer: SocketAddr, ctx: Arc<ServeContext>) -> Self {
        Self {
            stream,
            peer,
            ctx,
            recv: BytesMut::with_capacity(READ_CHUNK),
            scratch: vec![0u8; SCRATCH_SIZE].into_boxed_slice(),
            served: 0,
        }
    }

    /// Serve requests until the client closes, asks to close, or an error
    /// ends the connection
    ///
    /// Errors are logged here and never reach the acceptor. Dropping `self`
    /// closes the socket and frees the buffers.
    pub async fn run(mut self) {
        loop {
            match self.serve_one().await {
                Ok(true) => {}
                Ok(false) => break,
                Err(e) if e.is_disconnect() => {
                    logger::log_client_disconnect(&self.peer, &e);
                    break;
                }
                Err(e) => {
                    logger::log_connection_error(&self.peer, &e);
                    break;
                }
            }
        }
        logger::log_connection_closed(&self.peer, self.served);
    }

    /// One request/response exchange; `Ok(true)` means read the next request
    async fn serve_one(&mut self) -> Result<bool, ServeError> {
        let Some(request) = self.read_request().await? else {
            return Ok(false);
        };
        self.discard_body(request.body_length()?).await?;

        let keep_alive = request.keep_alive();
        let mut entry = self.ctx.access_log.then(|| {
            AccessLogEntry::new(
                self.peer,
                request.method.to_string(),
                request.target.clone(),
            )
        });

        let reply = handler::handle_request(&request, &self.ctx).await?;
        let (status, body_bytes) = self.write_reply(reply, &request, keep_alive).await?;
        self.served += 1;

        if let Some(entry) = entry.as_mut() {
            entry.http_version = version_label(&request);
            entry.status = status;
            entry.body_bytes = body_bytes;
            logger::log_access(entry);
        }

        Ok(keep_alive)
    }

    /// Read until one full request head is buffered
    ///
    /// `Ok(None)` on a clean close between requests.
    async fn read_request(&mut self) -> Result<Option<Request>, ServeError> {
        loop {
            if let Some(request) = parse_request(&mut self.recv)? {
                return Ok(Some(request));
            }

            self.recv.reserve(READ_CHUNK);
            let n = transfer::with_timeout(self.ctx.io_timeout, self.stream.read_buf(&mut self.recv))
                .await?;
            if n == 0 {
                if self.recv.is_empty() {
                    return Ok(None);
                }
                return Err(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    "connection closed in the middle of a request head",
                )
                .into());
            }
        }
    }

    /// Skip a request body so the next head starts at the right byte
    async fn discard_body(&mut self, length: u64) -> Result<(), ServeError> {
        let buffered = usize::try_from(length).map_or(self.recv.len(), |l| l.min(self.recv.len()));
        self.recv.advance(buffered);
        let mut remaining = length - buffered as u64;

        while remaining > 0 {
            let want = usize::try_from(remaining).map_or(self.scratch.len(), |r| r.min(self.scratch.len()));
            let n = transfer::with_timeout(
                self.ctx.io_timeout,
                self.stream.read(&mut self.scratch[..want]),
            )
            .await?;
            if n == 0 {
                return Err(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    "connection closed in the middle of a request body",
                )
                .into());
            }
            remaining -= n as u64;
        }
        Ok(())
    }

    /// Write the reply; returns the status code and body bytes sent
    async fn write_reply(
        &mut self,
        reply: Reply,
        request: &Request,
        keep_alive: bool,
    ) -> Result<(u16, u64), ServeError> {
        let timeout = self.ctx.io_timeout;

        match reply {
            Reply::Body(response) => {
                let head = response.head.connection(keep_alive, request.version);
                let mut out = head.encode();
                let body_bytes = if request.is_head() {
                    0
                } else {
                    out.extend_from_slice(&response.body);
                    response.body.len() as u64
                };
                transfer::write_all(&mut self.stream, &out, timeout).await?;
                Ok((head.status.as_u16(), body_bytes))
            }
            Reply::WholeFile { head, file, size } => {
                let head = head.connection(keep_alive, request.version);
                let sent = transfer::send_file(
                    &mut self.stream,
                    &head,
                    file,
                    ByteRange::whole(size),
                    &mut self.scratch,
                    timeout,
                )
                .await?;
                Ok((head.status.as_u16(), sent))
            }
            Reply::Partial { head, file, range } => {
                let head = head.connection(keep_alive, request.version);
                let sent = transfer::send_file(
                    &mut self.stream,
                    &head,
                    file,
                    Some(range),
                    &mut self.scratch,
                    timeout,
                )
                .await?;
                Ok((head.status.as_u16(), sent))
            }
        }
    }
}

fn version_label(request: &Request) -> &'static str {
    match request.version {
        hyper::http::Version::HTTP_10 => "1.0",
        hyper::http::Version::HTTP_09 => "0.9",
        _ => "1.1",
    }
}
