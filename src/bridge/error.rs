//! Error types for body transfer.

use std::io;

use thiserror::Error;

use crate::parser::Error as ParserError;

/// A boxed error raised by a body producer.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors that can occur while moving a body across the transport.
#[derive(Debug, Error)]
pub enum Error {
    /// The body producer yielded an error.
    #[error("Body producer failed: {0}")]
    Producer(BoxError),

    /// The producer failed before the head was committed; a status can still be chosen.
    #[error("Body failed before the head was sent: {0}")]
    PreCommit(BoxError),

    /// The producer failed after the head was committed; the connection must be aborted.
    #[error("Body failed after {chunks} chunk(s) were sent: {source}")]
    PostCommit { chunks: usize, source: BoxError },

    /// The consumer cancelled the body.
    #[error("Body cancelled (head committed: {committed})")]
    Cancelled { committed: bool },

    /// The connection closed before the body's terminating marker.
    #[error("Incomplete body: connection closed before the end of the body")]
    Incomplete,

    /// The body was already taken; transport bytes cannot be read twice.
    #[error("Body already consumed")]
    AlreadyConsumed,

    /// Malformed chunked framing.
    #[error("Invalid chunk framing: {0}")]
    InvalidChunk(String),

    /// A `Content-Length` that is not a number, or a body that does not match it.
    #[error("Invalid content length: {0}")]
    InvalidLength(String),

    /// A malformed or oversized head.
    #[error("Parse error: {0}")]
    Parse(#[from] ParserError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl Error {
    /// Whether this is the early-close condition a consumer must not mistake for success.
    pub fn is_incomplete(&self) -> bool {
        matches!(self, Error::Incomplete)
    }

    /// Whether the failure happened after bytes reached the wire.
    pub fn is_post_commit(&self) -> bool {
        matches!(
            self,
            Error::PostCommit { .. } | Error::Cancelled { committed: true }
        )
    }

    /// Map a transport read error, folding connection teardown into [`Error::Incomplete`].
    pub(crate) fn from_read(e: io::Error) -> Self {
        match e.kind() {
            io::ErrorKind::UnexpectedEof
            | io::ErrorKind::ConnectionReset
            | io::ErrorKind::ConnectionAborted
            | io::ErrorKind::BrokenPipe => Error::Incomplete,
            _ => Error::Io(e),
        }
    }

    /// Unwrap a producer failure into its source.
    pub(crate) fn into_source(self) -> BoxError {
        match self {
            Error::Producer(source) => source,
            other => Box::new(other),
        }
    }
}
