//! Error types for the HTTP head parser.

use thiserror::Error;

/// Errors that can occur while parsing a request or response head.
#[derive(Debug, Error)]
pub enum Error {
    /// The HTTP method in the request is not supported.
    #[error("Invalid HTTP method: {0}")]
    InvalidMethod(String),

    /// The request path is invalid or missing.
    #[error("Invalid HTTP path")]
    InvalidPath,

    /// The request line is malformed (wrong format or missing components).
    #[error("Malformed request line: {0}")]
    MalformedRequestLine(String),

    /// The status line of a response is malformed.
    #[error("Malformed status line: {0}")]
    MalformedStatusLine(String),

    /// The status code of a response is not a three digit number.
    #[error("Invalid status code: {0}")]
    InvalidStatus(String),

    /// The HTTP version in the head is not supported.
    #[error("Invalid HTTP version: {0}")]
    InvalidVersion(String),

    /// A required header is missing from the request.
    #[error("Required header is missing: {0}")]
    MissingHeader(String),

    /// A header in the head has an invalid format.
    #[error("Invalid header format")]
    InvalidHeaderFormat,

    /// The head is empty.
    #[error("Empty request")]
    EmptyRequest,

    /// The head grew past the configured limit before its blank line arrived.
    #[error("Head exceeds {0} bytes")]
    HeadTooLarge(usize),
}
