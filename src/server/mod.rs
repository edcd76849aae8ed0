//! HTTP server implementation for flowhttp-rs.
//!
//! This module provides the server exchange pipeline: it parses request
//! heads, routes them, invokes handlers and streams their responses back
//! through the backpressure bridge.

mod response;
mod config;
mod error;
mod handler;
mod request;
mod pipeline;
mod http_server;

// Re-export public items
pub use response::HttpResponse;
pub use config::ServerConfig;
pub use error::Error;
pub use handler::{handler_fn, HandlerFn, HandlerFuture};
pub use request::Request;
pub use pipeline::ExchangeCounters;
pub use http_server::HttpServer;
