//! Error types for the HTTP server.

use thiserror::Error;

use crate::bridge::Error as BodyError;
use crate::parser::Error as ParserError;
use crate::router::Error as RouterError;

/// Errors that can occur during HTTP server operation.
#[derive(Debug, Error)]
pub enum Error {
    /// Error parsing an HTTP request head; the connection is aborted.
    #[error("Parse error: {0}")]
    ParseError(#[from] ParserError),

    /// I/O error.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Requested resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Internal server error raised by a handler.
    #[error("Internal server error: {0}")]
    InternalError(String),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// A body failed to transfer.
    #[error("Body error: {0}")]
    BodyError(#[from] BodyError),

    /// The route table could not be built.
    #[error("Routing error: {0}")]
    RouterError(#[from] RouterError),

    /// An exchange was aborted after its head was committed.
    #[error("Exchange {exchange} aborted: {source}")]
    Aborted { exchange: u64, source: BodyError },
}
