//! The read direction of the bridge.

use bytes::Bytes;
use futures_util::stream::{self, StreamExt};
use log::debug;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt};
use tokio::sync::oneshot;

use crate::bridge::body::BodyStream;
use crate::bridge::error::Error;
use crate::bridge::framing::Framing;

/// Longest chunk-size or trailer line accepted.
const MAX_LINE: usize = 4096;

/// Default upper bound on a single delivered chunk.
const DEFAULT_MAX_CHUNK: usize = 64 * 1024;

/// Decoder position within the body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadState {
    /// Expecting a chunk-size line.
    Size,
    /// Inside a chunk with this many data bytes left.
    Data { remaining: u64 },
    /// Expecting the CRLF that closes a chunk's data.
    DataEnd,
    /// After the zero-size chunk, skipping trailer lines.
    Trailers,
    /// Inside a `Content-Length` body with this many bytes left.
    Length { remaining: u64 },
    /// Reading until the peer closes.
    UntilClose,
    /// The body ended cleanly.
    Done,
    /// The body ended with an error.
    Failed,
}

/// Turns transport bytes into a demand-driven sequence of chunks.
///
/// Nothing is read until the consumer asks for the next chunk. Each wire
/// chunk is delivered as one [`Bytes`] unless it exceeds the chunk bound.
pub struct BodyDecoder<R> {
    reader: Option<R>,
    state: ReadState,
    max_chunk: usize,
    release: Option<oneshot::Sender<R>>,
}

impl<R> BodyDecoder<R>
where
    R: AsyncBufRead + Unpin + Send + 'static,
{
    pub fn new(reader: R, framing: Framing) -> Self {
        let state = match framing {
            Framing::Empty => ReadState::Done,
            Framing::Length(len) => ReadState::Length { remaining: len },
            Framing::Chunked => ReadState::Size,
            Framing::CloseDelimited => ReadState::UntilClose,
        };
        Self {
            reader: Some(reader),
            state,
            max_chunk: DEFAULT_MAX_CHUNK,
            release: None,
        }
    }

    /// Bound the size of a single delivered chunk.
    pub fn with_max_chunk(mut self, max_chunk: usize) -> Self {
        self.max_chunk = max_chunk.max(1);
        self
    }

    /// Hand the reader back through `tx` once the body ends cleanly.
    ///
    /// If the body fails or the decoder is dropped early, `tx` is dropped
    /// instead and the connection cannot be reused.
    pub fn on_release(mut self, tx: oneshot::Sender<R>) -> Self {
        self.release = Some(tx);
        self
    }

    pub fn state(&self) -> ReadState {
        self.state
    }

    /// Read the next chunk. `None` means the body ended cleanly, or already
    /// reported its error.
    pub async fn next_chunk(&mut self) -> Option<Result<Bytes, Error>> {
        match self.step().await {
            Ok(Some(chunk)) => Some(Ok(chunk)),
            Ok(None) => {
                self.release();
                None
            }
            Err(e) => {
                debug!("body read failed in {:?}: {e}", self.state);
                self.state = ReadState::Failed;
                self.reader = None;
                self.release = None;
                Some(Err(e))
            }
        }
    }

    /// A stream that reads one chunk per poll.
    pub fn into_stream(self) -> BodyStream {
        stream::unfold(self, |mut decoder| async move {
            decoder.next_chunk().await.map(|item| (item, decoder))
        })
        .boxed()
    }

    async fn step(&mut self) -> Result<Option<Bytes>, Error> {
        loop {
            let reader = match self.reader.as_mut() {
                Some(reader) => reader,
                None => return Ok(None),
            };

            match self.state {
                ReadState::Size => {
                    let line = read_line(reader).await?.ok_or(Error::Incomplete)?;
                    let size = parse_chunk_size(&line)?;
                    self.state = if size == 0 {
                        ReadState::Trailers
                    } else {
                        ReadState::Data { remaining: size }
                    };
                }
                ReadState::Data { remaining } => {
                    let chunk = read_exactly(reader, bounded(remaining, self.max_chunk)).await?;
                    let remaining = remaining - chunk.len() as u64;
                    self.state = if remaining == 0 {
                        ReadState::DataEnd
                    } else {
                        ReadState::Data { remaining }
                    };
                    return Ok(Some(chunk));
                }
                ReadState::DataEnd => {
                    let line = read_line(reader).await?.ok_or(Error::Incomplete)?;
                    if !line.is_empty() {
                        return Err(Error::InvalidChunk("missing CRLF after chunk data".to_string()));
                    }
                    self.state = ReadState::Size;
                }
                ReadState::Trailers => {
                    let line = read_line(reader).await?.ok_or(Error::Incomplete)?;
                    if line.is_empty() {
                        self.state = ReadState::Done;
                    }
                }
                ReadState::Length { remaining: 0 } => self.state = ReadState::Done,
                ReadState::Length { remaining } => {
                    let chunk = read_exactly(reader, bounded(remaining, self.max_chunk)).await?;
                    self.state = ReadState::Length {
                        remaining: remaining - chunk.len() as u64,
                    };
                    return Ok(Some(chunk));
                }
                ReadState::UntilClose => {
                    let buf = reader.fill_buf().await.map_err(Error::from_read)?;
                    if buf.is_empty() {
                        self.state = ReadState::Done;
                        continue;
                    }
                    let n = buf.len().min(self.max_chunk);
                    let chunk = Bytes::copy_from_slice(&buf[..n]);
                    reader.consume(n);
                    return Ok(Some(chunk));
                }
                ReadState::Done | ReadState::Failed => return Ok(None),
            }
        }
    }

    fn release(&mut self) {
        if self.state != ReadState::Done {
            return;
        }
        if let (Some(tx), Some(reader)) = (self.release.take(), self.reader.take()) {
            let _ = tx.send(reader);
        }
    }
}

fn bounded(remaining: u64, max_chunk: usize) -> usize {
    usize::try_from(remaining).map_or(max_chunk, |remaining| remaining.min(max_chunk))
}

/// Read one CRLF-terminated line, without its terminator.
///
/// `Ok(None)` means the transport closed before a full line arrived.
async fn read_line<R>(reader: &mut R) -> Result<Option<Vec<u8>>, Error>
where
    R: AsyncBufRead + Unpin,
{
    let mut line = Vec::new();
    (&mut *reader)
        .take(MAX_LINE as u64)
        .read_until(b'\n', &mut line)
        .await
        .map_err(Error::from_read)?;

    if !line.ends_with(b"\n") {
        if line.len() >= MAX_LINE {
            return Err(Error::InvalidChunk("line too long".to_string()));
        }
        return Ok(None);
    }

    line.pop();
    if line.ends_with(b"\r") {
        line.pop();
    }
    Ok(Some(line))
}

async fn read_exactly<R>(reader: &mut R, n: usize) -> Result<Bytes, Error>
where
    R: AsyncBufRead + Unpin,
{
    let mut buf = vec![0; n];
    reader.read_exact(&mut buf).await.map_err(Error::from_read)?;
    Ok(Bytes::from(buf))
}

/// Parse a chunk-size line, ignoring chunk extensions.
pub(crate) fn parse_chunk_size(line: &[u8]) -> Result<u64, Error> {
    let size = match line.iter().position(|&b| b == b';') {
        Some(index) => &line[..index],
        None => line,
    };
    let size = std::str::from_utf8(size)
        .map_err(|_| Error::InvalidChunk("chunk size is not ASCII".to_string()))?
        .trim();

    if size.is_empty() || size.len() > 16 {
        return Err(Error::InvalidChunk(format!("invalid chunk size '{size}'")));
    }
    u64::from_str_radix(size, 16).map_err(|_| Error::InvalidChunk(format!("invalid chunk size '{size}'")))
}
