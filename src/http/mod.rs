//! HTTP protocol layer module
//!
//! Request head parsing, response head building, `Range` handling and the
//! content classifier. Nothing in here touches the filesystem or sockets.

pub mod mime;
pub mod range;
pub mod request;
pub mod response;

// Re-export commonly used types
pub use range::{parse_range_header, ByteRange, RangeParseResult};
pub use request::{parse_request, Request};
pub use response::{
    build_404_response, build_405_response, build_416_response, build_file_head,
    build_html_response, build_partial_head, BodyResponse, ResponseHead,
};
