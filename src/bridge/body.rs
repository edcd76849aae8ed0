//! Single-consumption body values.

use std::fmt;

use bytes::{Bytes, BytesMut};
use futures_util::stream::{self, BoxStream, Stream, StreamExt, TryStreamExt};

use crate::bridge::error::{BoxError, Error};
use crate::bridge::framing::Framing;

/// An opaque, immutable span of body bytes. Sequence order is wire order.
pub type Chunk = Bytes;

/// A lazily produced sequence of chunks.
pub type BodyStream = BoxStream<'static, Result<Chunk, Error>>;

enum Kind {
    Empty,
    Full(Bytes),
    Stream(BodyStream),
}

/// A request or response body.
///
/// The body can be taken exactly once; a second [`Body::take`] fails with
/// [`Error::AlreadyConsumed`] because the transport bytes behind it cannot be
/// read again.
pub struct Body {
    kind: Kind,
    consumed: bool,
}

impl Body {
    /// A body with no bytes at all.
    pub fn empty() -> Self {
        Self::with_kind(Kind::Empty)
    }

    /// A body whose bytes are all known up front; sent with `Content-Length`.
    pub fn from_bytes(bytes: impl Into<Bytes>) -> Self {
        Self::with_kind(Kind::Full(bytes.into()))
    }

    /// A body produced chunk by chunk; sent with chunked framing.
    pub fn from_stream<S, E>(stream: S) -> Self
    where
        S: Stream<Item = Result<Bytes, E>> + Send + 'static,
        E: Into<BoxError> + 'static,
    {
        let stream = stream.map_err(|e| Error::Producer(e.into())).boxed();
        Self::with_kind(Kind::Stream(stream))
    }

    /// A body read off the transport, whose errors are already transfer errors.
    pub(crate) fn from_wire(stream: BodyStream) -> Self {
        Self::with_kind(Kind::Stream(stream))
    }

    fn with_kind(kind: Kind) -> Self {
        Self {
            kind,
            consumed: false,
        }
    }

    /// Whether this body is known to carry no bytes.
    pub fn is_empty(&self) -> bool {
        match &self.kind {
            Kind::Empty => true,
            Kind::Full(bytes) => bytes.is_empty(),
            Kind::Stream(_) => false,
        }
    }

    /// Whether the body has already been taken.
    pub fn is_consumed(&self) -> bool {
        self.consumed
    }

    /// The framing to send this body with.
    pub fn framing(&self) -> Framing {
        match &self.kind {
            Kind::Empty => Framing::Empty,
            Kind::Full(bytes) if bytes.is_empty() => Framing::Empty,
            Kind::Full(bytes) => Framing::Length(bytes.len() as u64),
            Kind::Stream(_) => Framing::Chunked,
        }
    }

    /// Take the chunk sequence. Fails if it was taken before.
    pub fn take(&mut self) -> Result<BodyStream, Error> {
        if self.consumed {
            return Err(Error::AlreadyConsumed);
        }
        self.consumed = true;

        let stream = match std::mem::replace(&mut self.kind, Kind::Empty) {
            Kind::Empty => stream::empty().boxed(),
            Kind::Full(bytes) if bytes.is_empty() => stream::empty().boxed(),
            Kind::Full(bytes) => stream::once(async move { Ok(bytes) }).boxed(),
            Kind::Stream(stream) => stream,
        };
        Ok(stream)
    }

    /// Collect the whole body. Completes only if the sequence ends cleanly.
    pub async fn aggregate(&mut self) -> Result<Bytes, Error> {
        let mut stream = self.take()?;
        let mut buf = BytesMut::new();
        while let Some(chunk) = stream.next().await {
            buf.extend_from_slice(&chunk?);
        }
        Ok(buf.freeze())
    }
}

impl Default for Body {
    fn default() -> Self {
        Self::empty()
    }
}

impl fmt::Debug for Body {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match &self.kind {
            Kind::Empty => "empty".to_string(),
            Kind::Full(bytes) => format!("{} bytes", bytes.len()),
            Kind::Stream(_) => "stream".to_string(),
        };
        f.debug_struct("Body")
            .field("kind", &kind)
            .field("consumed", &self.consumed)
            .finish()
    }
}

impl From<Bytes> for Body {
    fn from(bytes: Bytes) -> Self {
        Self::from_bytes(bytes)
    }
}

impl From<Vec<u8>> for Body {
    fn from(bytes: Vec<u8>) -> Self {
        Self::from_bytes(bytes)
    }
}

impl From<String> for Body {
    fn from(text: String) -> Self {
        Self::from_bytes(text)
    }
}

impl From<&'static str> for Body {
    fn from(text: &'static str) -> Self {
        Self::from_bytes(text)
    }
}
