//! Client configuration.

use std::net::{Ipv4Addr, SocketAddr};

/// HTTP client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// The server to connect to.
    pub addr: SocketAddr,
    /// The read buffer size, also the bound on a single response body chunk.
    pub read_buffer_size: usize,
    /// The largest response head accepted.
    pub max_head_size: usize,
    /// Headers sent with every request unless the request sets them itself.
    pub default_headers: Vec<(String, String)>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            addr: SocketAddr::from((Ipv4Addr::LOCALHOST, 8080)),
            read_buffer_size: 8192,
            max_head_size: 16 * 1024,
            default_headers: vec![("User-Agent".to_string(), "flowhttp-rs".to_string())],
        }
    }
}

impl ClientConfig {
    /// Default configuration for a server at `addr`.
    pub fn new(addr: SocketAddr) -> Self {
        Self {
            addr,
            ..Self::default()
        }
    }
}
