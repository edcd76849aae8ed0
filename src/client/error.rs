//! Error types for the HTTP client.

use thiserror::Error;

use crate::bridge::Error as BodyError;
use crate::parser::Error as ParserError;

/// Errors that can occur while sending a request or reading its response.
#[derive(Debug, Error)]
pub enum Error {
    /// The response head could not be parsed.
    #[error("Parse error: {0}")]
    ParseError(#[from] ParserError),

    /// I/O error.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// The response body failed to arrive.
    #[error("Body error: {0}")]
    BodyError(#[from] BodyError),

    /// The request body failed while being sent; the connection was aborted
    /// and no response was read.
    #[error("Request body failed: {0}")]
    RequestBody(BodyError),

    /// The server closed the connection without sending a response head.
    #[error("Connection closed before a response was received")]
    ConnectionClosed,

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// A text body that is not UTF-8.
    #[error("Invalid UTF-8 in body: {0}")]
    Utf8Error(#[from] std::string::FromUtf8Error),
}

impl Error {
    /// Whether the server closed the connection before the end of the response body.
    pub fn is_incomplete(&self) -> bool {
        matches!(self, Error::BodyError(e) if e.is_incomplete())
    }
}
