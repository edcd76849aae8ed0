//! The client exchange pipeline.

use futures_util::stream::{self, StreamExt};
use log::{debug, warn};
use tokio::io::{split, AsyncRead, AsyncWrite, BufReader};
use tokio::sync::watch;

use crate::bridge::{read_head, write_head, Body, BodyDecoder, BodyStream, Framing, WriteBridge};
use crate::client::config::ClientConfig;
use crate::client::error::Error;
use crate::client::response::ClientResponse;
use crate::exchange::{Exchange, ExchangeState};
use crate::parser::{parse_response_head, Method, ResponseHead};

/// A serialized request head and the body to stream after it.
pub(crate) struct Outbound {
    pub(crate) id: u64,
    pub(crate) method: Method,
    pub(crate) head: Vec<u8>,
    pub(crate) body: Body,
}

/// Send one request over `transport` and read the response head.
///
/// The response body is left on the wire and read as the caller consumes it.
/// The exchange stays in `BodyStreaming` until that body ends: cleanly for
/// `Completed`, or with an error for `Aborted`.
pub(crate) async fn exchange<T>(transport: T, config: &ClientConfig, outbound: Outbound) -> Result<ClientResponse, Error>
where
    T: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    let Outbound {
        id,
        method,
        head,
        mut body,
    } = outbound;
    let (read_half, mut writer) = split(transport);
    let mut exchange = Exchange::new(id);

    if let Err(e) = write_head(&mut writer, &head).await {
        exchange.abort();
        return Err(e.into());
    }
    exchange.advance(ExchangeState::HeadSent);
    exchange.advance(ExchangeState::BodyStreaming);

    let framing = body.framing();
    let mut bridge = WriteBridge::new(&mut writer, framing);
    let sent = match body.take() {
        Ok(stream) => bridge.run(stream).await,
        Err(e) => Err(e),
    };
    match sent {
        Ok(chunks) => debug!("exchange {id}: request sent with {chunks} chunk(s)"),
        Err(e) => {
            // a request that failed to send never gets a response
            warn!("exchange {id}: request body failed, aborting connection: {e}");
            bridge.abort().await;
            exchange.abort();
            return Err(Error::RequestBody(e));
        }
    }

    match read_response(read_half, config, method).await {
        Ok((head, body)) => {
            debug!("exchange {id}: {} {}", head.status, head.reason);
            let (state, watcher) = watch::channel(exchange.state());
            let body = Body::from_wire(track_body(body, exchange, state));
            Ok(ClientResponse::new(head, body, watcher))
        }
        Err(e) => {
            debug!("exchange {id}: no response: {e}");
            exchange.abort();
            Err(e)
        }
    }
}

async fn read_response<R>(read_half: R, config: &ClientConfig, method: Method) -> Result<(ResponseHead, BodyStream), Error>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    let mut reader = BufReader::with_capacity(config.read_buffer_size, read_half);
    let head = read_head(&mut reader, config.max_head_size)
        .await?
        .ok_or(Error::ConnectionClosed)?;
    let head = parse_response_head(&head)?;
    let framing = Framing::for_response(&head, method)?;

    let decoder = BodyDecoder::new(reader, framing).with_max_chunk(config.read_buffer_size);
    Ok((head, decoder.into_stream()))
}

/// Finish `exchange` when `body` ends, publishing each transition on `state`.
fn track_body(body: BodyStream, exchange: Exchange, state: watch::Sender<ExchangeState>) -> BodyStream {
    stream::unfold(Some((body, exchange, state)), |tracked| async move {
        let (mut body, mut exchange, state) = tracked?;
        match body.next().await {
            Some(Ok(chunk)) => Some((Ok(chunk), Some((body, exchange, state)))),
            Some(Err(e)) => {
                exchange.abort();
                state.send_replace(exchange.state());
                Some((Err(e), None))
            }
            None => {
                exchange.advance(ExchangeState::Completed);
                state.send_replace(exchange.state());
                None
            }
        }
    })
    .boxed()
}
