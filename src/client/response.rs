//! The client-side view of a response.

use bytes::Bytes;
use serde::de::DeserializeOwned;
use tokio::sync::watch;

use crate::bridge::{Body, BodyStream, Error as BodyError};
use crate::client::error::Error;
use crate::exchange::ExchangeState;
use crate::parser::{Headers, HttpVersion, ResponseHead, StatusCode};

/// A response whose head has been parsed and whose body is still on the wire.
///
/// The status and headers are available as soon as the head arrives; the
/// body is read only as it is consumed, and can be consumed once.
#[derive(Debug)]
pub struct ClientResponse {
    head: ResponseHead,
    body: Body,
    exchange: watch::Receiver<ExchangeState>,
}

impl ClientResponse {
    pub(crate) fn new(head: ResponseHead, body: Body, exchange: watch::Receiver<ExchangeState>) -> Self {
        Self { head, body, exchange }
    }

    /// Where the exchange stands: `BodyStreaming` until the body has been
    /// read to its end, then `Completed` or `Aborted`.
    pub fn exchange_state(&self) -> ExchangeState {
        *self.exchange.borrow()
    }

    /// The numeric status code.
    pub fn status(&self) -> u16 {
        self.head.status
    }

    /// The status as a known [`StatusCode`], if it is one.
    pub fn status_code(&self) -> Option<StatusCode> {
        self.head.status_code()
    }

    pub fn reason(&self) -> &str {
        &self.head.reason
    }

    pub fn version(&self) -> HttpVersion {
        self.head.version
    }

    pub fn headers(&self) -> &Headers {
        &self.head.headers
    }

    /// Get a header value, ignoring the case of the name.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.head.get_header(name).map(String::as_str)
    }

    /// Take the body as a lazy sequence of chunks in wire order.
    ///
    /// If the server aborts mid-body the sequence ends with
    /// [`BodyError::Incomplete`] rather than ending cleanly.
    pub fn body(&mut self) -> Result<BodyStream, BodyError> {
        self.body.take()
    }

    /// Collect the whole body. Completes only if the body ended cleanly.
    pub async fn aggregate(&mut self) -> Result<Bytes, Error> {
        Ok(self.body.aggregate().await?)
    }

    /// Collect the whole body as UTF-8 text.
    pub async fn text(&mut self) -> Result<String, Error> {
        let bytes = self.aggregate().await?;
        Ok(String::from_utf8(bytes.to_vec())?)
    }

    /// Collect the body and parse it as JSON.
    pub async fn json<T: DeserializeOwned>(&mut self) -> Result<T, Error> {
        let bytes = self.aggregate().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}
