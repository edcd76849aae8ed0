//! HTTP client implementation.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::client::config::ClientConfig;
use crate::client::request::RequestBuilder;
use crate::parser::Method;

/// An HTTP client for one server.
///
/// Cloning is cheap; clones share the configuration. Every request opens
/// its own connection, so concurrent requests never share transport state.
#[derive(Debug, Clone)]
pub struct HttpClient {
    config: Arc<ClientConfig>,
    next_id: Arc<AtomicU64>,
}

impl HttpClient {
    pub fn new(config: ClientConfig) -> Self {
        Self {
            config: Arc::new(config),
            next_id: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Start a request for `method` on `path`.
    pub fn request(&self, method: Method, path: &str) -> RequestBuilder {
        RequestBuilder::new(self.clone(), method, path)
    }

    pub fn get(&self, path: &str) -> RequestBuilder {
        self.request(Method::GET, path)
    }

    pub fn post(&self, path: &str) -> RequestBuilder {
        self.request(Method::POST, path)
    }

    pub fn put(&self, path: &str) -> RequestBuilder {
        self.request(Method::PUT, path)
    }

    pub fn patch(&self, path: &str) -> RequestBuilder {
        self.request(Method::PATCH, path)
    }

    pub fn delete(&self, path: &str) -> RequestBuilder {
        self.request(Method::DELETE, path)
    }

    pub(crate) fn next_exchange_id(&self) -> u64 {
        self.next_id.fetch_add(1, Ordering::Relaxed) + 1
    }
}
