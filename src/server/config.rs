//! Server configuration.

use std::net::{Ipv4Addr, SocketAddr};
use std::time::Duration;

/// HTTP server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// The address to bind to.
    pub addr: SocketAddr,
    /// The maximum number of concurrent connections.
    pub max_connections: usize,
    /// The read buffer size, also the bound on a single request body chunk.
    pub read_buffer_size: usize,
    /// The largest request head accepted before the connection is aborted.
    pub max_head_size: usize,
    /// Serve further exchanges on a connection after a completed one.
    pub keep_alive: bool,
    /// Cancel a response body whose producer yields nothing for this long.
    pub body_idle_timeout: Option<Duration>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: SocketAddr::from((Ipv4Addr::LOCALHOST, 8080)),
            max_connections: 1024,
            read_buffer_size: 8192,
            max_head_size: 16 * 1024,
            keep_alive: true,
            body_idle_timeout: Some(Duration::from_secs(60)),
        }
    }
}
