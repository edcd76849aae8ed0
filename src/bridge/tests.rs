//! Tests for the stream bridge.

#[cfg(test)]
mod bridge_tests {
    use std::io::{self, Cursor};
    use std::pin::Pin;
    use std::sync::{Arc, Mutex};
    use std::task::{Context, Poll};
    use std::time::Duration;

    use bytes::Bytes;
    use futures_util::stream::{self, StreamExt};
    use tokio::io::{AsyncReadExt, AsyncWrite};
    use tokio::sync::oneshot;

    use crate::bridge::decoder::parse_chunk_size;
    use crate::bridge::{read_head, Body, BodyDecoder, BodyStream, Error, Framing, ReadState, WriteBridge, WriteState};
    use crate::parser::{parse_request, parse_response_head, Error as ParserError, Method};

    /// Records every write call as one frame.
    #[derive(Clone, Default)]
    struct RecordingWriter {
        frames: Arc<Mutex<Vec<Vec<u8>>>>,
        shut_down: Arc<Mutex<bool>>,
    }

    impl RecordingWriter {
        fn frames(&self) -> usize {
            self.frames.lock().unwrap().len()
        }

        fn output(&self) -> String {
            let frames = self.frames.lock().unwrap();
            String::from_utf8(frames.concat()).unwrap()
        }

        fn is_shut_down(&self) -> bool {
            *self.shut_down.lock().unwrap()
        }
    }

    impl AsyncWrite for RecordingWriter {
        fn poll_write(self: Pin<&mut Self>, _cx: &mut Context<'_>, buf: &[u8]) -> Poll<io::Result<usize>> {
            self.frames.lock().unwrap().push(buf.to_vec());
            Poll::Ready(Ok(buf.len()))
        }

        fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
            Poll::Ready(Ok(()))
        }

        fn poll_shutdown(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
            *self.shut_down.lock().unwrap() = true;
            Poll::Ready(Ok(()))
        }
    }

    fn chunks(items: &[&'static str]) -> BodyStream {
        let items: Vec<Result<Bytes, io::Error>> = items.iter().copied().map(|s| Ok(Bytes::from_static(s.as_bytes()))).collect();
        Body::from_stream(stream::iter(items)).take().unwrap()
    }

    /// Elements 0..len, failing with an error at `fail_at`.
    fn failing_at(len: usize, fail_at: usize) -> BodyStream {
        let items = (0..len).map(move |i| {
            if i == fail_at {
                Err(io::Error::new(io::ErrorKind::Other, format!("element {i} failed")))
            } else {
                Ok(Bytes::from(format!("{i}")))
            }
        });
        Body::from_stream(stream::iter(items)).take().unwrap()
    }

    #[tokio::test]
    async fn test_chunked_framing_on_the_wire() {
        let writer = RecordingWriter::default();
        let mut bridge = WriteBridge::new(writer.clone(), Framing::Chunked);

        let sent = bridge.run(chunks(&["Hello", ", ", "world, this is sixteen+"])).await.unwrap();

        assert_eq!(sent, 3);
        assert_eq!(bridge.chunks_sent(), 3);
        assert_eq!(bridge.state(), &WriteState::Finished);
        assert_eq!(
            writer.output(),
            "5\r\nHello\r\n2\r\n, \r\n17\r\nworld, this is sixteen+\r\n0\r\n\r\n"
        );
    }

    #[tokio::test]
    async fn test_one_chunk_in_flight() {
        let writer = RecordingWriter::default();
        let observer = writer.clone();
        let body = stream::unfold(0usize, move |pulled| {
            let observer = observer.clone();
            async move {
                if pulled == 5 {
                    return None;
                }
                // every earlier chunk must be written before the next is requested
                assert_eq!(observer.frames(), pulled);
                Some((Ok::<_, io::Error>(Bytes::from_static(b"x")), pulled + 1))
            }
        });
        let body = Body::from_stream(body).take().unwrap();

        let mut bridge = WriteBridge::new(writer.clone(), Framing::Chunked);
        assert_eq!(bridge.run(body).await.unwrap(), 5);
        assert_eq!(writer.frames(), 6);
    }

    #[tokio::test]
    async fn test_empty_chunks_are_skipped() {
        let writer = RecordingWriter::default();
        let mut bridge = WriteBridge::new(writer.clone(), Framing::Chunked);

        let sent = bridge.run(chunks(&["", "a", "", "", "b", ""])).await.unwrap();

        assert_eq!(sent, 2);
        assert_eq!(writer.output(), "1\r\na\r\n1\r\nb\r\n0\r\n\r\n");
    }

    #[tokio::test]
    async fn test_empty_body_commits_head_and_terminator() {
        let writer = RecordingWriter::default();
        let mut bridge = WriteBridge::new(writer.clone(), Framing::Chunked).with_head("HEAD\r\n\r\n");
        assert!(!bridge.is_committed());

        let sent = bridge.run(Body::empty().take().unwrap()).await.unwrap();

        assert_eq!(sent, 0);
        assert!(bridge.is_committed());
        assert_eq!(writer.output(), "HEAD\r\n\r\n0\r\n\r\n");
    }

    #[tokio::test]
    async fn test_head_travels_with_first_chunk() {
        let writer = RecordingWriter::default();
        let mut bridge = WriteBridge::new(writer.clone(), Framing::Length(2)).with_head("HEAD\r\n\r\n");

        bridge.run(chunks(&["ok"])).await.unwrap();

        assert_eq!(writer.frames.lock().unwrap()[0], b"HEAD\r\n\r\nok".to_vec());
        assert_eq!(writer.output(), "HEAD\r\n\r\nok");
    }

    #[tokio::test]
    async fn test_failure_before_commit_writes_nothing() {
        let writer = RecordingWriter::default();
        let mut bridge = WriteBridge::new(writer.clone(), Framing::Chunked).with_head("HEAD\r\n\r\n");

        let err = bridge.run(failing_at(10, 0)).await.unwrap_err();

        assert!(matches!(err, Error::PreCommit(_)));
        assert!(!err.is_post_commit());
        assert!(!bridge.is_committed());
        assert_eq!(bridge.state(), &WriteState::Failed);
        assert_eq!(writer.frames(), 0);
    }

    #[tokio::test]
    async fn test_failure_after_commit_keeps_delivered_chunks() {
        let writer = RecordingWriter::default();
        let mut bridge = WriteBridge::new(writer.clone(), Framing::Chunked);

        let err = bridge.run(failing_at(257, 4)).await.unwrap_err();

        match &err {
            Error::PostCommit { chunks, source } => {
                assert_eq!(*chunks, 4);
                assert_eq!(source.to_string(), "element 4 failed");
            }
            other => panic!("expected a post-commit failure, got {other:?}"),
        }
        assert!(err.is_post_commit());
        assert_eq!(writer.output(), "1\r\n0\r\n1\r\n1\r\n1\r\n2\r\n1\r\n3\r\n");

        bridge.abort().await;
        assert!(writer.is_shut_down());
    }

    #[tokio::test]
    async fn test_panicking_producer_is_a_failure() {
        let writer = RecordingWriter::default();
        let items = stream::iter(0..257).map(|i| {
            if i == 4 {
                panic!("producer blew up at {i}");
            }
            Ok::<_, io::Error>(Bytes::from(format!("{i}")))
        });
        let body = Body::from_stream(items).take().unwrap();
        let mut bridge = WriteBridge::new(writer.clone(), Framing::Chunked);

        let err = bridge.run(body).await.unwrap_err();

        match err {
            Error::PostCommit { chunks, source } => {
                assert_eq!(chunks, 4);
                assert!(source.to_string().contains("producer blew up at 4"));
            }
            other => panic!("expected a post-commit failure, got {other:?}"),
        }
        assert!(!writer.output().ends_with("0\r\n\r\n"));
    }

    #[tokio::test]
    async fn test_cancel_before_commit() {
        let writer = RecordingWriter::default();
        let mut bridge = WriteBridge::new(writer.clone(), Framing::Chunked).with_head("HEAD\r\n\r\n");
        bridge.cancel_handle().cancel();

        let err = bridge.run(chunks(&["never"])).await.unwrap_err();

        assert!(matches!(err, Error::Cancelled { committed: false }));
        assert_eq!(writer.frames(), 0);
    }

    #[tokio::test]
    async fn test_cancel_while_waiting_for_producer() {
        let writer = RecordingWriter::default();
        let first = stream::once(async { Ok::<_, io::Error>(Bytes::from_static(b"first")) });
        let body = Body::from_stream(first.chain(stream::pending())).take().unwrap();
        let mut bridge = WriteBridge::new(writer.clone(), Framing::Chunked);

        let handle = bridge.cancel_handle();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            handle.cancel();
        });

        let err = bridge.run(body).await.unwrap_err();

        assert!(matches!(err, Error::Cancelled { committed: true }));
        assert!(err.is_post_commit());
        assert_eq!(writer.output(), "5\r\nfirst\r\n");
    }

    #[tokio::test]
    async fn test_content_length_is_enforced() {
        let writer = RecordingWriter::default();
        let mut bridge = WriteBridge::new(writer.clone(), Framing::Length(3));
        let err = bridge.run(chunks(&["ab", "cd"])).await.unwrap_err();
        assert!(matches!(err, Error::PostCommit { chunks: 1, .. }));
        assert_eq!(writer.output(), "ab");

        let writer = RecordingWriter::default();
        let mut bridge = WriteBridge::new(writer.clone(), Framing::Length(3));
        let err = bridge.run(chunks(&["ab"])).await.unwrap_err();
        assert!(matches!(err, Error::PostCommit { chunks: 1, .. }));
    }

    #[tokio::test]
    async fn test_decode_chunked_with_extensions_and_trailers() {
        let wire = b"4;name=value\r\nWiki\r\n5\r\npedia\r\n0\r\nExpires: never\r\n\r\nGET /next";
        let (tx, rx) = oneshot::channel();
        let mut decoder = BodyDecoder::new(Cursor::new(wire.to_vec()), Framing::Chunked).on_release(tx);

        assert_eq!(decoder.next_chunk().await.unwrap().unwrap(), Bytes::from_static(b"Wiki"));
        assert_eq!(decoder.next_chunk().await.unwrap().unwrap(), Bytes::from_static(b"pedia"));
        assert!(decoder.next_chunk().await.is_none());
        assert_eq!(decoder.state(), ReadState::Done);

        let mut reader = rx.await.unwrap();
        let mut rest = String::new();
        reader.read_to_string(&mut rest).await.unwrap();
        assert_eq!(rest, "GET /next");
    }

    #[tokio::test]
    async fn test_decode_chunked_early_close_is_incomplete() {
        let (tx, mut rx) = oneshot::channel::<Cursor<Vec<u8>>>();
        let wire = b"5\r\nHello\r\n5\r\nWo".to_vec();
        let mut stream = BodyDecoder::new(Cursor::new(wire), Framing::Chunked)
            .on_release(tx)
            .into_stream();

        assert_eq!(stream.next().await.unwrap().unwrap(), Bytes::from_static(b"Hello"));
        let err = stream.next().await.unwrap().unwrap_err();
        assert!(err.is_incomplete());
        assert!(stream.next().await.is_none());
        // a failed body never hands the connection back
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_decode_chunked_missing_terminator_is_incomplete() {
        let mut stream = BodyDecoder::new(&b"3\r\nabc\r\n"[..], Framing::Chunked).into_stream();

        assert_eq!(stream.next().await.unwrap().unwrap(), Bytes::from_static(b"abc"));
        assert!(matches!(stream.next().await, Some(Err(Error::Incomplete))));
    }

    #[tokio::test]
    async fn test_decode_invalid_chunk_size() {
        let mut decoder = BodyDecoder::new(&b"zz\r\nabc\r\n0\r\n\r\n"[..], Framing::Chunked);
        assert!(matches!(decoder.next_chunk().await, Some(Err(Error::InvalidChunk(_)))));
        assert_eq!(decoder.state(), ReadState::Failed);
        assert!(decoder.next_chunk().await.is_none());
    }

    #[tokio::test]
    async fn test_decode_content_length_in_bounded_chunks() {
        let mut decoder = BodyDecoder::new(&b"abcdefghEXTRA"[..], Framing::Length(8)).with_max_chunk(3);

        let mut received = Vec::new();
        while let Some(chunk) = decoder.next_chunk().await {
            received.push(chunk.unwrap());
        }

        assert_eq!(received, vec![Bytes::from_static(b"abc"), Bytes::from_static(b"def"), Bytes::from_static(b"gh")]);
    }

    #[tokio::test]
    async fn test_decode_short_content_length_is_incomplete() {
        let mut decoder = BodyDecoder::new(&b"abc"[..], Framing::Length(10));
        assert!(matches!(decoder.next_chunk().await, Some(Err(Error::Incomplete))));
    }

    #[tokio::test]
    async fn test_decode_until_close() {
        let mut stream = BodyDecoder::new(&b"everything until the end"[..], Framing::CloseDelimited).into_stream();
        let mut body = Vec::new();
        while let Some(chunk) = stream.next().await {
            body.extend_from_slice(&chunk.unwrap());
        }
        assert_eq!(body, b"everything until the end");
    }

    #[tokio::test]
    async fn test_decode_empty_releases_immediately() {
        let (tx, rx) = oneshot::channel();
        let mut decoder = BodyDecoder::new(&b"next"[..], Framing::Empty).on_release(tx);
        assert!(decoder.next_chunk().await.is_none());
        assert_eq!(rx.await.unwrap(), &b"next"[..]);
    }

    #[test]
    fn test_parse_chunk_size() {
        assert_eq!(parse_chunk_size(b"0").unwrap(), 0);
        assert_eq!(parse_chunk_size(b"1A").unwrap(), 26);
        assert_eq!(parse_chunk_size(b"ff ; ext=1").unwrap(), 255);
        assert!(parse_chunk_size(b"").is_err());
        assert!(parse_chunk_size(b"-1").is_err());
        assert!(parse_chunk_size(b"11111111111111111").is_err());
    }

    #[tokio::test]
    async fn test_read_head() {
        let mut reader = &b"\r\nGET / HTTP/1.1\r\nHost: a\r\n\r\nbody"[..];
        let head = read_head(&mut reader, 1024).await.unwrap().unwrap();
        assert_eq!(head, b"GET / HTTP/1.1\r\nHost: a\r\n\r\n");
        assert_eq!(reader, b"body");

        let mut closed = &b""[..];
        assert!(read_head(&mut closed, 1024).await.unwrap().is_none());

        let mut truncated = &b"GET / HTTP/1.1\r\nHost"[..];
        assert!(matches!(read_head(&mut truncated, 1024).await, Err(Error::Incomplete)));

        let mut oversized = &b"GET /aaaaaaaaaaaaaaaaaaaaaaaaaaaa HTTP/1.1\r\n\r\n"[..];
        assert!(matches!(
            read_head(&mut oversized, 16).await,
            Err(Error::Parse(ParserError::HeadTooLarge(16)))
        ));
    }

    #[tokio::test]
    async fn test_leading_blank_lines_count_toward_head_limit() {
        let flood = "\r\n".repeat(4096);
        let mut reader = flood.as_bytes();
        assert!(matches!(
            read_head(&mut reader, 64).await,
            Err(Error::Parse(ParserError::HeadTooLarge(64)))
        ));
        assert!(!reader.is_empty());

        let mut reader = &b"\r\n\r\nGET / HTTP/1.1\r\n\r\n"[..];
        let head = read_head(&mut reader, 22).await.unwrap().unwrap();
        assert_eq!(head, b"GET / HTTP/1.1\r\n\r\n");
    }

    #[tokio::test]
    async fn test_body_is_consumed_once() {
        let mut body = Body::from("hello");
        assert_eq!(body.framing(), Framing::Length(5));
        assert_eq!(body.aggregate().await.unwrap(), Bytes::from_static(b"hello"));
        assert!(body.is_consumed());
        assert!(matches!(body.take(), Err(Error::AlreadyConsumed)));
        assert!(matches!(body.aggregate().await, Err(Error::AlreadyConsumed)));
    }

    #[test]
    fn test_body_framing() {
        assert_eq!(Body::empty().framing(), Framing::Empty);
        assert_eq!(Body::from(String::new()).framing(), Framing::Empty);
        assert_eq!(Body::from_stream(stream::empty::<Result<Bytes, io::Error>>()).framing(), Framing::Chunked);
    }

    #[test]
    fn test_request_framing() {
        let chunked = parse_request(b"POST / HTTP/1.1\r\nHost: a\r\nTransfer-Encoding: gzip, chunked\r\n\r\n").unwrap();
        assert_eq!(Framing::for_request(&chunked).unwrap(), Framing::Chunked);

        let sized = parse_request(b"POST / HTTP/1.1\r\nHost: a\r\nContent-Length: 12\r\n\r\n").unwrap();
        assert_eq!(Framing::for_request(&sized).unwrap(), Framing::Length(12));

        let bare = parse_request(b"GET / HTTP/1.1\r\nHost: a\r\n\r\n").unwrap();
        assert_eq!(Framing::for_request(&bare).unwrap(), Framing::Empty);

        let bad = parse_request(b"POST / HTTP/1.1\r\nHost: a\r\nContent-Length: ten\r\n\r\n").unwrap();
        assert!(matches!(Framing::for_request(&bad), Err(Error::InvalidLength(_))));
    }

    #[test]
    fn test_response_framing() {
        let unframed = parse_response_head(b"HTTP/1.1 200 OK\r\n\r\n").unwrap();
        assert_eq!(Framing::for_response(&unframed, Method::GET).unwrap(), Framing::CloseDelimited);
        assert_eq!(Framing::for_response(&unframed, Method::HEAD).unwrap(), Framing::Empty);

        let no_content = parse_response_head(b"HTTP/1.1 204 No Content\r\nContent-Length: 5\r\n\r\n").unwrap();
        assert_eq!(Framing::for_response(&no_content, Method::GET).unwrap(), Framing::Empty);
    }
}
