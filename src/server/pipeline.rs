//! The per-connection server exchange pipeline.

use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures_util::{FutureExt, StreamExt};
use log::{debug, error, warn};
use tokio::io::{split, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader, ReadHalf};
use tokio::sync::{oneshot, Notify};

use crate::bridge::{
    read_head, write_head, Body, BodyDecoder, BodyStream, Error as BodyError, Framing, WriteBridge,
};
use crate::exchange::{Exchange, ExchangeState};
use crate::parser::{parse_request, Method, RequestHead, StatusCode};
use crate::router::Router;
use crate::server::config::ServerConfig;
use crate::server::error::Error;
use crate::server::handler::HandlerFn;
use crate::server::request::Request;
use crate::server::response::HttpResponse;

/// Completed and aborted exchange counts for one server.
#[derive(Debug, Default)]
pub struct ExchangeCounters {
    next_id: AtomicU64,
    completed: AtomicU64,
    aborted: AtomicU64,
}

impl ExchangeCounters {
    pub fn completed(&self) -> u64 {
        self.completed.load(Ordering::SeqCst)
    }

    pub fn aborted(&self) -> u64 {
        self.aborted.load(Ordering::SeqCst)
    }

    fn next_id(&self) -> u64 {
        self.next_id.fetch_add(1, Ordering::Relaxed) + 1
    }
}

type Reader<T> = BufReader<ReadHalf<T>>;

/// Where the connection's reader is after the request body was handed out.
enum ReaderSlot<T> {
    Kept(Reader<T>),
    Lent(oneshot::Receiver<Reader<T>>),
}

/// Serve exchanges on one connection, one at a time, until it closes.
pub(crate) async fn serve_connection<T>(
    transport: T,
    router: &Router<HandlerFn>,
    config: &ServerConfig,
    counters: &ExchangeCounters,
) -> Result<(), Error>
where
    T: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    let (read_half, mut writer) = split(transport);
    let mut reader = BufReader::with_capacity(config.read_buffer_size, read_half);

    loop {
        let head = match read_head(&mut reader, config.max_head_size).await {
            Ok(Some(head)) => head,
            Ok(None) => {
                debug!("connection closed by peer");
                return Ok(());
            }
            Err(e) => {
                counters.aborted.fetch_add(1, Ordering::SeqCst);
                let _ = writer.shutdown().await;
                return Err(e.into());
            }
        };

        let mut exchange = Exchange::new(counters.next_id());

        // no well-formed response can be produced without a request
        let head = match parse_request(&head) {
            Ok(head) => head,
            Err(e) => {
                warn!("exchange {}: malformed request head: {e}", exchange.id());
                exchange.abort();
                counters.aborted.fetch_add(1, Ordering::SeqCst);
                let _ = writer.shutdown().await;
                return Err(Error::ParseError(e));
            }
        };
        let framing = match Framing::for_request(&head) {
            Ok(framing) => framing,
            Err(e) => {
                warn!("exchange {}: unreadable request body framing: {e}", exchange.id());
                exchange.abort();
                counters.aborted.fetch_add(1, Ordering::SeqCst);
                let _ = writer.shutdown().await;
                return Err(e.into());
            }
        };

        let close = !config.keep_alive || head.wants_close();
        debug!("exchange {}: {} {}", exchange.id(), head.method, head.path);

        let (body, slot) = if framing == Framing::Empty {
            (Body::empty(), ReaderSlot::Kept(reader))
        } else {
            let (tx, rx) = oneshot::channel();
            let decoder = BodyDecoder::new(reader, framing)
                .with_max_chunk(config.read_buffer_size)
                .on_release(tx);
            (Body::from_wire(decoder.into_stream()), ReaderSlot::Lent(rx))
        };

        let method = head.method;
        let response = respond(router, head, body).await;
        let result = send_response(
            &mut writer,
            &mut exchange,
            response,
            method,
            close,
            config.body_idle_timeout,
        )
        .await;

        match result {
            Ok(()) => counters.completed.fetch_add(1, Ordering::SeqCst),
            Err(e) => {
                counters.aborted.fetch_add(1, Ordering::SeqCst);
                return Err(e);
            }
        };

        if close {
            let _ = writer.shutdown().await;
            return Ok(());
        }

        reader = match slot {
            ReaderSlot::Kept(reader) => reader,
            ReaderSlot::Lent(mut rx) => match rx.try_recv() {
                Ok(reader) => reader,
                Err(_) => {
                    debug!("exchange {}: request body not drained, closing", exchange.id());
                    let _ = writer.shutdown().await;
                    return Ok(());
                }
            },
        };
    }
}

/// Route and invoke the handler, turning every pre-commit failure into a status.
async fn respond(router: &Router<HandlerFn>, head: RequestHead, body: Body) -> HttpResponse {
    let Some(found) = router.match_route(head.method, head.route_path()) else {
        debug!("{}", Error::NotFound(format!("{} {}", head.method, head.path)));
        return HttpResponse::new(StatusCode::NotFound);
    };
    let handler = found.handler.clone();
    let request = Request::new(head, found.params, body);

    let outcome = match std::panic::catch_unwind(AssertUnwindSafe(|| handler(request))) {
        Ok(future) => AssertUnwindSafe(future).catch_unwind().await,
        Err(panic) => Err(panic),
    };

    match outcome {
        Ok(Ok(response)) => response,
        Ok(Err(e)) => {
            error!("handler failed before responding: {e}");
            HttpResponse::new(StatusCode::InternalServerError)
        }
        Err(_) => {
            error!("handler panicked before responding");
            HttpResponse::new(StatusCode::InternalServerError)
        }
    }
}

/// Commit the head, then stream the body through the bridge.
///
/// Replies to `HEAD` and statuses that forbid a body go out without one; the
/// handler's body is dropped unread. A body failure here is always
/// post-commit, so the connection is aborted without the terminating chunk.
pub(crate) async fn send_response<W>(
    writer: &mut W,
    exchange: &mut Exchange,
    mut response: HttpResponse,
    method: Method,
    close: bool,
    idle_timeout: Option<Duration>,
) -> Result<(), Error>
where
    W: AsyncWrite + Unpin,
{
    let head = response.head_bytes(close);
    if method == Method::HEAD || response.status.forbids_body() {
        if !response.body.is_empty() {
            debug!("exchange {}: {} {} carries no body, dropping it", exchange.id(), method, response.status);
        }
        response.body = Body::empty();
    }
    let framing = response.body.framing();

    if let Err(e) = write_head(writer, &head).await {
        exchange.abort();
        return Err(e.into());
    }
    exchange.advance(ExchangeState::HeadSent);
    exchange.advance(ExchangeState::BodyStreaming);

    let mut bridge = WriteBridge::new(&mut *writer, framing);
    let outcome = match response.body.take() {
        Ok(stream) => run_with_idle_timeout(&mut bridge, stream, idle_timeout).await,
        Err(e) => Err(e),
    };

    match outcome {
        Ok(chunks) => {
            debug!("exchange {}: {} sent with {chunks} chunk(s)", exchange.id(), response.status);
            exchange.advance(ExchangeState::Completed);
            Ok(())
        }
        Err(e) => {
            warn!("exchange {}: aborting connection: {e}", exchange.id());
            bridge.abort().await;
            exchange.abort();
            Err(Error::Aborted {
                exchange: exchange.id(),
                source: e,
            })
        }
    }
}

/// Run the bridge, cancelling it once the producer goes `idle` without a chunk.
async fn run_with_idle_timeout<W>(
    bridge: &mut WriteBridge<W>,
    body: BodyStream,
    idle: Option<Duration>,
) -> Result<usize, BodyError>
where
    W: AsyncWrite + Unpin,
{
    let Some(idle) = idle else {
        return bridge.run(body).await;
    };

    let cancel = bridge.cancel_handle();
    let progress = Arc::new(Notify::new());
    let pulled = progress.clone();
    let body = body.inspect(move |_| pulled.notify_one()).boxed();

    let run = bridge.run(body);
    tokio::pin!(run);
    loop {
        tokio::select! {
            outcome = &mut run => return outcome,
            _ = progress.notified() => {}
            _ = tokio::time::sleep(idle) => {
                warn!("response body produced nothing for {idle:?}, cancelling");
                cancel.cancel();
                return run.await;
            }
        }
    }
}
