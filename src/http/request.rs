//! HTTP/1.x request head parsing
//!
//! Heads are parsed with `httparse` straight out of the connection's receive
//! buffer; the parsed bytes are consumed, anything after them (a pipelined
//! request or a body) stays in the buffer.

use bytes::{Buf, BytesMut};
use hyper::http::header::{self, HeaderMap, HeaderName, HeaderValue};
use hyper::http::{Method, Uri, Version};

use crate::error::ServeError;

/// Largest request head accepted, in bytes
pub const MAX_HEAD_SIZE: usize = 16 * 1024;

const MAX_HEADERS: usize = 64;

/// One parsed request head
#[derive(Debug, Clone)]
pub struct Request {
    pub method: Method,
    /// Raw request-target as sent by the client
    pub target: String,
    pub version: Version,
    pub headers: HeaderMap,
    /// Path component of the target, query and fragment stripped
    path: String,
}

impl Request {
    /// Path component of the target, query and fragment stripped
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn is_head(&self) -> bool {
        self.method == Method::HEAD
    }

    /// Header value as text, `None` when absent or not visible ASCII
    pub fn header(&self, name: &HeaderName) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    pub fn range(&self) -> Option<&str> {
        self.header(&header::RANGE)
    }

    /// Whether the client wants the connection kept open after this exchange
    ///
    /// HTTP/1.1 defaults to keep-alive unless `Connection: close` is sent;
    /// HTTP/1.0 only keeps the connection with an explicit `keep-alive`.
    pub fn keep_alive(&self) -> bool {
        let mut close = false;
        let mut keep = false;
        for token in self
            .headers
            .get_all(header::CONNECTION)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .flat_map(|v| v.split(','))
            .map(str::trim)
        {
            if token.eq_ignore_ascii_case("close") {
                close = true;
            } else if token.eq_ignore_ascii_case("keep-alive") {
                keep = true;
            }
        }

        match self.version {
            Version::HTTP_09 | Version::HTTP_10 => keep && !close,
            _ => !close,
        }
    }

    /// Length of the request body that must be skipped before the next head
    pub fn body_length(&self) -> Result<u64, ServeError> {
        if self.headers.contains_key(header::TRANSFER_ENCODING) {
            return Err(ServeError::Protocol(
                "request bodies with Transfer-Encoding are not supported".to_string(),
            ));
        }

        match self.headers.get(header::CONTENT_LENGTH) {
            None => Ok(0),
            Some(value) => value
                .to_str()
                .ok()
                .and_then(|v| v.trim().parse::<u64>().ok())
                .ok_or_else(|| ServeError::Protocol("invalid Content-Length".to_string())),
        }
    }
}

/// Try to parse one request head from the front of `buf`
///
/// Returns `Ok(None)` when more bytes are needed. On success the head bytes
/// are removed from `buf`.
pub fn parse_request(buf: &mut BytesMut) -> Result<Option<Request>, ServeError> {
    let mut header_slots = [httparse::EMPTY_HEADER; MAX_HEADERS];
    let mut parsed = httparse::Request::new(&mut header_slots);

    let consumed = match parsed.parse(&buf[..])? {
        httparse::Status::Complete(n) => n,
        httparse::Status::Partial => {
            if buf.len() > MAX_HEAD_SIZE {
                return Err(ServeError::HeadTooLarge(MAX_HEAD_SIZE));
            }
            return Ok(None);
        }
    };
    if consumed > MAX_HEAD_SIZE {
        return Err(ServeError::HeadTooLarge(MAX_HEAD_SIZE));
    }

    let method = parsed
        .method
        .map(str::as_bytes)
        .and_then(|m| Method::from_bytes(m).ok())
        .ok_or_else(|| ServeError::Protocol("invalid method".to_string()))?;
    let target = parsed.path.unwrap_or("/").to_string();
    let version = match parsed.version {
        Some(0) => Version::HTTP_10,
        _ => Version::HTTP_11,
    };

    let mut headers = HeaderMap::with_capacity(parsed.headers.len());
    for h in parsed.headers.iter() {
        let name = HeaderName::from_bytes(h.name.as_bytes())
            .map_err(|e| ServeError::Protocol(format!("invalid header name: {e}")))?;
        let value = HeaderValue::from_bytes(h.value)
            .map_err(|e| ServeError::Protocol(format!("invalid header value: {e}")))?;
        headers.append(name, value);
    }

    buf.advance(consumed);

    Ok(Some(Request {
        method,
        path: target_path(&target),
        target,
        version,
        headers,
    }))
}

/// Path of a request-target
///
/// Origin-form (`/a?b`) keeps everything before `?` or `#`. Absolute-form
/// (`http://host/a?b`) is reduced to the path of the URI, `/` when it has none.
fn target_path(target: &str) -> String {
    if !target.starts_with('/') {
        if let Ok(uri) = target.parse::<Uri>() {
            if uri.scheme().is_some() {
                return uri.path().to_string();
            }
        }
    }

    target
        .split(['?', '#'])
        .next()
        .unwrap_or_default()
        .to_string()
}
