//! HTTP response types and utilities.

use std::collections::HashMap;

use bytes::Bytes;
use futures_util::Stream;
use serde::Serialize;

use crate::bridge::{Body, BoxError};
use crate::parser::{Headers, StatusCode};
use crate::server::error::Error;

/// Headers the pipeline derives from the body and never takes from a handler.
const FRAMING_HEADERS: [&str; 3] = ["Content-Length", "Transfer-Encoding", "Connection"];

/// Represents an HTTP response.
#[derive(Debug)]
pub struct HttpResponse {
    /// The HTTP status code
    pub status: StatusCode,
    /// The HTTP headers
    pub headers: Headers,
    /// The response body
    pub body: Body,
}

impl HttpResponse {
    /// Create a new HTTP response with the given status code and no body.
    pub fn new(status: StatusCode) -> Self {
        let mut headers = HashMap::new();
        headers.insert("Server".to_string(), "flowhttp-rs".to_string());

        Self {
            status,
            headers,
            body: Body::empty(),
        }
    }

    /// Set the response body with a string.
    pub fn with_body_string(self, body: impl Into<String>) -> Self {
        self.with_body(Body::from_bytes(body.into()))
    }

    /// Set the response body with bytes.
    pub fn with_body_bytes(self, body: impl Into<Bytes>) -> Self {
        self.with_body(Body::from_bytes(body))
    }

    /// Stream the response body; it is sent with chunked framing.
    ///
    /// An error from `stream` after the head was sent aborts the connection.
    pub fn with_body_stream<S, E>(self, stream: S) -> Self
    where
        S: Stream<Item = Result<Bytes, E>> + Send + 'static,
        E: Into<BoxError> + 'static,
    {
        self.with_body(Body::from_stream(stream))
    }

    pub fn with_body(mut self, body: Body) -> Self {
        self.body = body;
        self
    }

    /// Add or replace a header.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Set the content type.
    pub fn with_content_type(self, content_type: impl Into<String>) -> Self {
        self.with_header("Content-Type", content_type)
    }

    /// Set the response body with a JSON value.
    pub fn with_json<T: Serialize>(self, value: &T) -> Result<Self, Error> {
        let json = serde_json::to_vec(value)?;
        Ok(self
            .with_content_type("application/json")
            .with_body_bytes(json))
    }

    /// Serialize the status line and headers, with the framing header for
    /// the body and `Connection: close` if this is the last exchange.
    pub fn head_bytes(&self, close: bool) -> Vec<u8> {
        let mut bytes = Vec::new();

        let status_line = format!("HTTP/1.1 {} {}\r\n", self.status.code(), self.status.reason_phrase());
        bytes.extend_from_slice(status_line.as_bytes());

        for (name, value) in &self.headers {
            if FRAMING_HEADERS.iter().any(|h| h.eq_ignore_ascii_case(name)) {
                continue;
            }
            bytes.extend_from_slice(format!("{name}: {value}\r\n").as_bytes());
        }

        if !self.status.forbids_body() {
            if let Some((name, value)) = self.body.framing().header() {
                bytes.extend_from_slice(format!("{name}: {value}\r\n").as_bytes());
            }
        }
        if close {
            bytes.extend_from_slice(b"Connection: close\r\n");
        }

        bytes.extend_from_slice(b"\r\n");
        bytes
    }
}
