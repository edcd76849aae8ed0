//! The write direction of the bridge.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use bytes::{BufMut, Bytes, BytesMut};
use futures_util::StreamExt;
use log::{debug, warn};
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::Notify;

use crate::bridge::body::BodyStream;
use crate::bridge::error::{BoxError, Error};
use crate::bridge::framing::Framing;

const LAST_CHUNK: &[u8] = b"0\r\n\r\n";

/// Where the write loop currently stands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteState {
    /// Waiting for the previous write to complete before asking for more.
    AwaitingDemand,
    /// One unit of demand is outstanding; waiting for the producer.
    AwaitingData,
    /// Writing the chunk the producer just handed over.
    Delivering(Bytes),
    /// The body ended cleanly and its terminator is on the wire.
    Finished,
    /// The producer failed or the body was cancelled.
    Failed,
}

/// Cancels a running [`WriteBridge`] from outside the write loop.
#[derive(Debug, Clone)]
pub struct CancelHandle {
    notify: Arc<Notify>,
}

impl CancelHandle {
    /// Stop pulling from the producer. Takes effect at the next demand point.
    pub fn cancel(&self) {
        self.notify.notify_one();
    }
}

/// Drives a body producer onto a transport writer, one chunk at a time.
pub struct WriteBridge<W> {
    writer: W,
    framing: Framing,
    head: Option<Bytes>,
    state: WriteState,
    chunks: usize,
    written: u64,
    cancel: Arc<Notify>,
}

impl<W> WriteBridge<W>
where
    W: AsyncWrite + Unpin,
{
    /// A bridge whose head is already on the wire.
    pub fn new(writer: W, framing: Framing) -> Self {
        Self {
            writer,
            framing,
            head: None,
            state: WriteState::AwaitingDemand,
            chunks: 0,
            written: 0,
            cancel: Arc::new(Notify::new()),
        }
    }

    /// Hold `head` back until the first chunk (or the end of an empty body).
    ///
    /// Until then a producer failure is reported as [`Error::PreCommit`] and
    /// nothing has been written.
    pub fn with_head(mut self, head: impl Into<Bytes>) -> Self {
        self.head = Some(head.into());
        self
    }

    pub fn cancel_handle(&self) -> CancelHandle {
        CancelHandle {
            notify: self.cancel.clone(),
        }
    }

    /// Whether the head has been written.
    pub fn is_committed(&self) -> bool {
        self.head.is_none()
    }

    pub fn state(&self) -> &WriteState {
        &self.state
    }

    /// Chunks written so far.
    pub fn chunks_sent(&self) -> usize {
        self.chunks
    }

    /// Write a pending head now, even if no chunk is ready.
    pub async fn commit(&mut self) -> Result<(), Error> {
        if let Some(head) = self.head.take() {
            self.writer.write_all(&head).await?;
            self.writer.flush().await?;
        }
        Ok(())
    }

    /// Pull `body` to exhaustion, returning the number of chunks written.
    ///
    /// On a clean end the framing terminator is written. On failure nothing
    /// more is written; if the head was committed the caller must
    /// [`abort`](Self::abort) since the framing on the wire is left open.
    pub async fn run(&mut self, body: BodyStream) -> Result<usize, Error> {
        // a panicking producer is a failed producer
        let mut body = AssertUnwindSafe(body).catch_unwind();

        loop {
            match std::mem::replace(&mut self.state, WriteState::Failed) {
                WriteState::AwaitingDemand => {
                    self.writer.flush().await?;
                    self.state = WriteState::AwaitingData;
                }
                WriteState::AwaitingData => {
                    let cancel = self.cancel.clone();
                    let next = tokio::select! {
                        biased;
                        _ = cancel.notified() => None,
                        next = body.next() => Some(next),
                    };
                    let Some(next) = next else {
                        debug!("body cancelled after {} chunk(s)", self.chunks);
                        return Err(Error::Cancelled {
                            committed: self.is_committed(),
                        });
                    };

                    match next {
                        Some(Ok(Ok(chunk))) if chunk.is_empty() => {
                            self.state = WriteState::AwaitingData;
                        }
                        Some(Ok(Ok(chunk))) => self.state = WriteState::Delivering(chunk),
                        Some(Ok(Err(e))) => return Err(self.fail(e.into_source())),
                        Some(Err(panic)) => return Err(self.fail(panic_message(panic))),
                        None => {
                            self.finish().await?;
                            return Ok(self.chunks);
                        }
                    }
                }
                WriteState::Delivering(chunk) => {
                    self.deliver(chunk).await?;
                    self.state = WriteState::AwaitingDemand;
                }
                WriteState::Finished => {
                    self.state = WriteState::Finished;
                    return Ok(self.chunks);
                }
                WriteState::Failed => return Err(Error::AlreadyConsumed),
            }
        }
    }

    /// Close the write side without completing the framing.
    pub async fn abort(&mut self) {
        self.state = WriteState::Failed;
        if let Err(e) = self.writer.shutdown().await {
            debug!("shutdown after abort failed: {e}");
        }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }

    async fn deliver(&mut self, chunk: Bytes) -> Result<(), Error> {
        let len = chunk.len() as u64;
        if let Some(expected) = self.declared_len() {
            if self.written + len > expected {
                let source = format!("body exceeds Content-Length {expected}");
                return Err(self.fail(source.into()));
            }
        }

        let head = self.head.take();
        let mut frame = BytesMut::with_capacity(head.as_ref().map_or(0, Bytes::len) + chunk.len() + 20);
        if let Some(head) = head {
            frame.put(head);
        }
        match self.framing {
            Framing::Chunked => {
                frame.put(format!("{:X}\r\n", chunk.len()).as_bytes());
                frame.put(chunk);
                frame.put(&b"\r\n"[..]);
            }
            _ => frame.put(chunk),
        }

        self.writer.write_all(&frame).await?;
        self.chunks += 1;
        self.written += len;
        Ok(())
    }

    async fn finish(&mut self) -> Result<(), Error> {
        if let Some(expected) = self.declared_len() {
            if self.written != expected {
                let source = format!("body ended after {} of {expected} bytes", self.written);
                return Err(self.fail(source.into()));
            }
        }

        let mut frame = BytesMut::new();
        if let Some(head) = self.head.take() {
            frame.put(head);
        }
        if self.framing == Framing::Chunked {
            frame.put(LAST_CHUNK);
        }
        self.writer.write_all(&frame).await?;
        self.writer.flush().await?;
        self.state = WriteState::Finished;
        Ok(())
    }

    fn declared_len(&self) -> Option<u64> {
        match self.framing {
            Framing::Empty => Some(0),
            Framing::Length(len) => Some(len),
            Framing::Chunked | Framing::CloseDelimited => None,
        }
    }

    fn fail(&mut self, source: BoxError) -> Error {
        self.state = WriteState::Failed;
        if self.is_committed() {
            warn!("body failed after {} chunk(s): {source}", self.chunks);
            Error::PostCommit {
                chunks: self.chunks,
                source,
            }
        } else {
            debug!("body failed before commit: {source}");
            Error::PreCommit(source)
        }
    }
}

fn panic_message(panic: Box<dyn Any + Send>) -> BoxError {
    let message = panic
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| panic.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string());
    format!("body producer panicked: {message}").into()
}
