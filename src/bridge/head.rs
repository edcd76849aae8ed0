//! Reading and writing message heads.

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::bridge::error::Error;
use crate::parser::Error as ParserError;

/// Read a head up to and including its blank line.
///
/// Returns `Ok(None)` when the peer closed the connection before sending
/// anything, which is how an idle keep-alive connection ends. Blank lines
/// before the start line are skipped but still count against `max_head_size`.
pub async fn read_head<R>(reader: &mut R, max_head_size: usize) -> Result<Option<Vec<u8>>, Error>
where
    R: AsyncBufRead + Unpin,
{
    let mut head = Vec::new();
    let mut skipped = 0;
    loop {
        let remaining = max_head_size.saturating_sub(skipped + head.len());
        if remaining == 0 {
            return Err(ParserError::HeadTooLarge(max_head_size).into());
        }

        let start = head.len();
        let n = (&mut *reader)
            .take(remaining as u64)
            .read_until(b'\n', &mut head)
            .await
            .map_err(Error::from_read)?;

        if n == 0 {
            return if head.is_empty() {
                Ok(None)
            } else {
                Err(Error::Incomplete)
            };
        }
        if !head.ends_with(b"\n") {
            // the line filled the remaining budget, or the peer closed mid-line
            continue;
        }

        let line = &head[start..];
        if line == b"\r\n" || line == b"\n" {
            if start == 0 {
                skipped += line.len();
                head.clear();
                continue;
            }
            return Ok(Some(head));
        }
    }
}

/// Write a serialized head and wait for the transport to accept it.
pub async fn write_head<W>(writer: &mut W, head: &[u8]) -> Result<(), Error>
where
    W: AsyncWrite + Unpin,
{
    writer.write_all(head).await?;
    writer.flush().await?;
    Ok(())
}
