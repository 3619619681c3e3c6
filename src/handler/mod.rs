//! Request handler module
//!
//! Turns one parsed request into a [`Reply`]: a buffered body, a whole file or
//! a single byte range. Writing the reply is left to the connection, which
//! owns the socket and the scratch buffer.

pub mod format;
pub mod listing;
pub mod resolve;

use hyper::http::Method;
use std::io;
use tokio::fs::{self, File};

use crate::config::ServeContext;
use crate::error::ServeError;
use crate::http::{self, mime, ByteRange, BodyResponse, RangeParseResult, Request, ResponseHead};
use crate::logger;
use resolve::{resolve, ResolveError, ResolvedPath};

/// What to send back for one request
#[derive(Debug)]
pub enum Reply {
    /// Head plus an in-memory body (listings, error pages, HEAD on a file)
    Body(BodyResponse),
    /// `200 OK` streaming the whole file
    WholeFile {
        head: ResponseHead,
        file: File,
        size: u64,
    },
    /// `206 Partial Content` streaming one byte range
    Partial {
        head: ResponseHead,
        file: File,
        range: ByteRange,
    },
}

impl Reply {
    fn not_found() -> Self {
        Self::Body(http::build_404_response())
    }
}

/// Main entry point for request handling
///
/// Missing paths and traversal attempts become 404 replies. Any other
/// filesystem error is returned and ends the connection.
pub async fn handle_request(request: &Request, ctx: &ServeContext) -> Result<Reply, ServeError> {
    if request.method != Method::GET && request.method != Method::HEAD {
        return Ok(Reply::Body(http::build_405_response()));
    }

    let resolved = match resolve(&ctx.root, request.path()) {
        Ok(resolved) => resolved,
        Err(ResolveError::Traversal) => {
            logger::log_warning(&format!(
                "Path traversal attempt blocked: {}",
                request.target
            ));
            return Ok(Reply::not_found());
        }
        Err(ResolveError::InvalidSegment) => return Ok(Reply::not_found()),
    };

    logger::log_request(request.method.as_str(), &resolved.fs_path);

    let meta = match fs::metadata(&resolved.fs_path).await {
        Ok(meta) => meta,
        Err(e) if is_missing(&e) => return Ok(Reply::not_found()),
        Err(e) => return Err(e.into()),
    };

    if meta.is_dir() {
        let page = listing::build_listing(&resolved).await?;
        return Ok(Reply::Body(http::build_html_response(page)));
    }
    // Sockets, FIFOs and devices are not served
    if !meta.is_file() {
        return Ok(Reply::not_found());
    }

    serve_file(request, &resolved, meta.len()).await
}

async fn serve_file(
    request: &Request,
    resolved: &ResolvedPath,
    size: u64,
) -> Result<Reply, ServeError> {
    let content_type = mime::content_type(resolved.extension());

    if request.is_head() {
        return Ok(Reply::Body(BodyResponse {
            head: http::build_file_head(content_type, size),
            body: hyper::body::Bytes::new(),
        }));
    }

    if let Some(value) = request.range() {
        match http::parse_range_header(value, size) {
            RangeParseResult::Valid(range) => {
                let file = open(resolved).await?;
                return Ok(Reply::Partial {
                    head: http::build_partial_head(content_type, range, size),
                    file,
                    range,
                });
            }
            RangeParseResult::NotSatisfiable => {
                return Ok(Reply::Body(http::build_416_response(size)));
            }
            RangeParseResult::Ignored => {}
        }
    }

    let file = open(resolved).await?;
    Ok(Reply::WholeFile {
        head: http::build_file_head(content_type, size),
        file,
        size,
    })
}

async fn open(resolved: &ResolvedPath) -> io::Result<File> {
    File::open(&resolved.fs_path).await
}

/// `a.txt/b` fails with `NotADirectory`, which is as missing as `NotFound`
fn is_missing(error: &io::Error) -> bool {
    matches!(
        error.kind(),
        io::ErrorKind::NotFound | io::ErrorKind::NotADirectory
    )
}
