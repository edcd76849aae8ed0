//! HTTP head parser module.
//!
//! This module parses the start line and header block of requests and
//! responses. Bodies are never handled here; the `bridge` module owns every
//! byte that follows the blank line terminating a head.

mod request;
mod response;
mod headers;
mod method;
mod status;
mod version;
mod error;

// Re-export public items
pub use request::RequestHead;
pub use response::ResponseHead;
pub use headers::{find_header, Headers};
pub use method::Method;
pub use status::StatusCode;
pub use version::HttpVersion;
pub use error::Error;

// Re-export the parse functions
pub use request::parse_request;
pub use response::parse_response_head;
