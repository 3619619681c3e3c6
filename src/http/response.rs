//! HTTP response building module
//!
//! Heads are serialized by hand because bodies are written straight to the
//! socket afterwards (sometimes by the kernel), so there is no body type to
//! hand to a framework.

use chrono::Utc;
use hyper::body::Bytes;
use hyper::http::header::{self, HeaderMap, HeaderName, HeaderValue};
use hyper::http::{StatusCode, Version};

use crate::http::range::ByteRange;
use crate::logger;

/// Value of the `Server` header
pub const SERVER_NAME: &str = concat!("treeserve/", env!("CARGO_PKG_VERSION"));

/// Status line plus headers
#[derive(Debug, Clone)]
pub struct ResponseHead {
    pub status: StatusCode,
    pub headers: HeaderMap,
}

impl ResponseHead {
    pub fn new(status: StatusCode) -> Self {
        Self {
            status,
            headers: HeaderMap::new(),
        }
    }

    /// Set a header; invalid values are logged and left out
    pub fn header<V>(mut self, name: HeaderName, value: V) -> Self
    where
        HeaderValue: TryFrom<V>,
        <HeaderValue as TryFrom<V>>::Error: std::fmt::Display,
    {
        match HeaderValue::try_from(value) {
            Ok(v) => {
                self.headers.insert(name, v);
            }
            Err(e) => log_build_error(self.status, &name, &e),
        }
        self
    }

    /// Announce whether the connection stays open after this response
    pub fn connection(self, keep_alive: bool, request_version: Version) -> Self {
        if !keep_alive {
            self.header(header::CONNECTION, "close")
        } else if request_version == Version::HTTP_10 {
            self.header(header::CONNECTION, "keep-alive")
        } else {
            self
        }
    }

    /// Declared body length, 0 when absent
    pub fn content_length(&self) -> u64 {
        self.headers
            .get(header::CONTENT_LENGTH)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse().ok())
            .unwrap_or(0)
    }

    /// Serialize the head, including the terminating blank line
    pub fn encode(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(256);
        let reason = self.status.canonical_reason().unwrap_or("");
        buf.extend_from_slice(format!("HTTP/1.1 {} {reason}\r\n", self.status.as_u16()).as_bytes());
        buf.extend_from_slice(format!("Date: {}\r\n", http_date()).as_bytes());
        buf.extend_from_slice(format!("Server: {SERVER_NAME}\r\n").as_bytes());

        for (name, value) in &self.headers {
            buf.extend_from_slice(name.as_str().as_bytes());
            buf.extend_from_slice(b": ");
            buf.extend_from_slice(value.as_bytes());
            buf.extend_from_slice(b"\r\n");
        }

        buf.extend_from_slice(b"\r\n");
        buf
    }
}

/// Fully buffered response (listings, error text, HEAD replies)
#[derive(Debug, Clone)]
pub struct BodyResponse {
    pub head: ResponseHead,
    pub body: Bytes,
}

impl BodyResponse {
    fn new(status: StatusCode, content_type: &'static str, body: impl Into<Bytes>) -> Self {
        let body = body.into();
        let head = ResponseHead::new(status)
            .header(header::CONTENT_TYPE, content_type)
            .header(header::CONTENT_LENGTH, body.len());
        Self { head, body }
    }
}

/// Build 404 Not Found response
pub fn build_404_response() -> BodyResponse {
    BodyResponse::new(StatusCode::NOT_FOUND, "text/plain", "404 Not Found")
}

/// Build 405 Method Not Allowed response
pub fn build_405_response() -> BodyResponse {
    let mut resp = BodyResponse::new(
        StatusCode::METHOD_NOT_ALLOWED,
        "text/plain",
        "405 Method Not Allowed",
    );
    resp.head = resp.head.header(header::ALLOW, "GET, HEAD");
    resp
}

/// Build 416 Range Not Satisfiable response
pub fn build_416_response(file_size: u64) -> BodyResponse {
    let mut resp = BodyResponse::new(
        StatusCode::RANGE_NOT_SATISFIABLE,
        "text/plain",
        "416 Range Not Satisfiable",
    );
    resp.head = resp
        .head
        .header(header::CONTENT_RANGE, format!("bytes */{file_size}"));
    resp
}

/// Build generic HTML response
pub fn build_html_response(content: String) -> BodyResponse {
    BodyResponse::new(StatusCode::OK, "text/html; charset=utf-8", content)
}

/// Head for a whole-file 200 response (also used for HEAD)
pub fn build_file_head(content_type: &str, file_size: u64) -> ResponseHead {
    ResponseHead::new(StatusCode::OK)
        .header(header::CONTENT_TYPE, content_type)
        .header(header::CONTENT_LENGTH, file_size)
        .header(header::ACCEPT_RANGES, "bytes")
}

/// Head for a 206 Partial Content response
pub fn build_partial_head(content_type: &str, range: ByteRange, total_size: u64) -> ResponseHead {
    ResponseHead::new(StatusCode::PARTIAL_CONTENT)
        .header(header::CONTENT_TYPE, content_type)
        .header(header::CONTENT_LENGTH, range.len())
        .header(header::CONTENT_RANGE, range.content_range(total_size))
        .header(header::ACCEPT_RANGES, "bytes")
}

/// Current time in IMF-fixdate form
fn http_date() -> String {
    Utc::now().format("%a, %d %b %Y %H:%M:%S GMT").to_string()
}

/// Log response build error
fn log_build_error(status: StatusCode, name: &HeaderName, error: &impl std::fmt::Display) {
    logger::log_error(&format!(
        "Failed to build {} response header {name}: {error}",
        status.as_u16()
    ));
}
