//! HTTP client implementation for flowhttp-rs.
//!
//! The client sends one request per connection: the head is written
//! immediately, the request body is streamed through the backpressure bridge,
//! and the response body is handed back as a lazy sequence of chunks that
//! ends with an incomplete-body error if the server aborts mid-stream.

mod config;
mod error;
mod http_client;
mod pipeline;
mod request;
mod response;

// Re-export public items
pub use config::ClientConfig;
pub use error::Error;
pub use http_client::HttpClient;
pub use request::RequestBuilder;
pub use response::ClientResponse;
