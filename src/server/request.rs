//! The server-side view of an incoming request.

use std::collections::HashMap;

use bytes::Bytes;
use serde::de::DeserializeOwned;

use crate::bridge::{Body, BodyStream, Error as BodyError};
use crate::parser::{Error as ParserError, Headers, HttpVersion, Method, RequestHead};
use crate::server::error::Error;

/// A request as seen by a handler: its head, the path parameters bound by
/// the matched route, and a body that can be consumed once.
#[derive(Debug)]
pub struct Request {
    head: RequestHead,
    params: HashMap<String, String>,
    body: Body,
}

impl Request {
    /// Assemble a request from its parts.
    pub fn new(head: RequestHead, params: HashMap<String, String>, body: Body) -> Self {
        Self { head, params, body }
    }

    pub fn method(&self) -> Method {
        self.head.method
    }

    /// The request target, including any query string.
    pub fn path(&self) -> &str {
        &self.head.path
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

    /// A path parameter bound by the route template.
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(String::as_str)
    }

    pub fn params(&self) -> &HashMap<String, String> {
        &self.params
    }

    pub fn query_param(&self, name: &str) -> Option<&str> {
        self.head.get_query_param(name).map(String::as_str)
    }

    /// Take the body as a lazy sequence of chunks.
    ///
    /// Fails with [`BodyError::AlreadyConsumed`] on the second call.
    pub fn body(&mut self) -> Result<BodyStream, BodyError> {
        self.body.take()
    }

    /// Collect the whole body.
    pub async fn aggregate(&mut self) -> Result<Bytes, BodyError> {
        self.body.aggregate().await
    }

    /// Collect the whole body as UTF-8 text.
    pub async fn text(&mut self) -> Result<String, Error> {
        let bytes = self.aggregate().await?;
        String::from_utf8(bytes.to_vec())
            .map_err(|e| Error::InternalError(format!("request body is not UTF-8: {e}")))
    }

    /// Check if the request declares a JSON body.
    pub fn is_json(&self) -> bool {
        self.header("Content-Type")
            .is_some_and(|content_type| content_type.starts_with("application/json"))
    }

    /// Collect the body and parse it as JSON.
    pub async fn json<T: DeserializeOwned>(&mut self) -> Result<T, Error> {
        if !self.is_json() {
            return Err(ParserError::MissingHeader("Content-Type: application/json".to_string()).into());
        }
        let bytes = self.aggregate().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}
