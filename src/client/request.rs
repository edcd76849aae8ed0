//! Building and sending outbound requests.

use bytes::Bytes;
use futures_util::Stream;
use serde::Serialize;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;

use crate::bridge::{Body, BoxError, Framing};
use crate::client::error::Error;
use crate::client::http_client::HttpClient;
use crate::client::pipeline::{self, Outbound};
use crate::client::response::ClientResponse;
use crate::parser::Method;

/// Headers derived from the body and the connection, never taken from the caller.
const RESERVED_HEADERS: [&str; 3] = ["Content-Length", "Transfer-Encoding", "Connection"];

/// A request being assembled; nothing is sent until [`send`](Self::send).
#[derive(Debug)]
pub struct RequestBuilder {
    client: HttpClient,
    method: Method,
    path: String,
    headers: Vec<(String, String)>,
    body: Body,
    error: Option<Error>,
}

impl RequestBuilder {
    pub(crate) fn new(client: HttpClient, method: Method, path: &str) -> Self {
        Self {
            client,
            method,
            path: path.to_string(),
            headers: Vec::new(),
            body: Body::empty(),
            error: None,
        }
    }

    /// Add a header, replacing a default header of the same name.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Send `body` with `Content-Length` framing.
    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = Body::from_bytes(body);
        self
    }

    /// Stream the request body with chunked framing.
    ///
    /// An error from `stream` aborts the connection before any response is read.
    pub fn body_stream<S, E>(mut self, stream: S) -> Self
    where
        S: Stream<Item = Result<Bytes, E>> + Send + 'static,
        E: Into<BoxError> + 'static,
    {
        self.body = Body::from_stream(stream);
        self
    }

    /// Serialize `value` as the JSON request body.
    pub fn json<T: Serialize>(mut self, value: &T) -> Self {
        match serde_json::to_vec(value) {
            Ok(json) => {
                self.body = Body::from_bytes(json);
                self.header("Content-Type", "application/json")
            }
            Err(e) => {
                self.error.get_or_insert(Error::JsonError(e));
                self
            }
        }
    }

    /// Connect to the configured server and perform the exchange.
    pub async fn send(mut self) -> Result<ClientResponse, Error> {
        if let Some(e) = self.error.take() {
            return Err(e);
        }
        let stream = TcpStream::connect(self.client.config().addr).await?;
        stream.set_nodelay(true)?;
        self.send_over(stream).await
    }

    /// Perform the exchange over an already-open transport.
    pub async fn send_over<T>(mut self, transport: T) -> Result<ClientResponse, Error>
    where
        T: AsyncRead + AsyncWrite + Unpin + Send + 'static,
    {
        if let Some(e) = self.error.take() {
            return Err(e);
        }
        let head = self.head_bytes();
        let outbound = Outbound {
            id: self.client.next_exchange_id(),
            method: self.method,
            head,
            body: self.body,
        };
        pipeline::exchange(transport, self.client.config(), outbound).await
    }

    /// Serialize the request line and headers.
    fn head_bytes(&self) -> Vec<u8> {
        let config = self.client.config();
        let mut head = format!("{} {} HTTP/1.1\r\n", self.method, self.path);

        if !self.has_header("Host") {
            head.push_str(&format!("Host: {}\r\n", config.addr));
        }

        let defaults = config.default_headers.iter().filter(|(name, _)| !self.has_header(name));
        for (name, value) in defaults.chain(&self.headers) {
            if RESERVED_HEADERS.iter().any(|h| h.eq_ignore_ascii_case(name)) {
                continue;
            }
            head.push_str(&format!("{name}: {value}\r\n"));
        }

        let framing = self.body.framing();
        if framing != Framing::Empty {
            if let Some((name, value)) = framing.header() {
                head.push_str(&format!("{name}: {value}\r\n"));
            }
        }
        head.push_str("Connection: close\r\n\r\n");
        head.into_bytes()
    }

    fn has_header(&self, name: &str) -> bool {
        self.headers.iter().any(|(n, _)| n.eq_ignore_ascii_case(name))
    }
}
