//! HTTP server implementation.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use log::{debug, error, info, warn};
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::signal;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use crate::exchange::Exchange;
use crate::router::Router;
use crate::server::config::ServerConfig;
use crate::server::error::Error;
use crate::server::handler::HandlerFn;
use crate::server::pipeline::{send_response, serve_connection, ExchangeCounters};
use crate::server::response::HttpResponse;
use crate::parser::{Method, StatusCode};

/// An HTTP server.
///
/// Cloning is cheap; clones share the route table and counters.
#[derive(Clone)]
pub struct HttpServer {
    /// The server configuration.
    pub config: ServerConfig,
    router: Arc<Router<HandlerFn>>,
    counters: Arc<ExchangeCounters>,
}

impl HttpServer {
    /// Create a new HTTP server serving `router`.
    pub fn new(config: ServerConfig, router: Router<HandlerFn>) -> Self {
        Self {
            config,
            router: Arc::new(router),
            counters: Arc::new(ExchangeCounters::default()),
        }
    }

    pub fn router(&self) -> &Router<HandlerFn> {
        &self.router
    }

    /// Completed and aborted exchange counts across all connections.
    pub fn counters(&self) -> Arc<ExchangeCounters> {
        self.counters.clone()
    }

    /// Log the registered endpoints.
    fn display_server_info(&self) {
        info!("Registered endpoints:");
        for route in self.router.routes() {
            info!("  {} {}", route.method, route.template);
        }
    }

    /// Bind `config.addr` and serve until Ctrl+C.
    pub async fn start(&self) -> Result<(), Error> {
        let listener = TcpListener::bind(&self.config.addr).await?;
        info!("Server listening on http://{addr}", addr = listener.local_addr()?);

        self.serve(listener, async {
            match signal::ctrl_c().await {
                Ok(()) => info!("Received Ctrl+C, initiating graceful shutdown"),
                Err(e) => {
                    error!("Error setting up Ctrl+C handler: {e}");
                    std::future::pending::<()>().await;
                }
            }
        })
        .await
    }

    /// Accept connections from `listener` until `shutdown` resolves, then wait
    /// for live connections to finish.
    pub async fn serve<F>(&self, listener: TcpListener, shutdown: F) -> Result<(), Error>
    where
        F: Future<Output = ()>,
    {
        self.display_server_info();

        // Create a semaphore to limit concurrent connections
        let semaphore = Arc::new(Semaphore::new(self.config.max_connections));
        let mut tasks = JoinSet::new();
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    info!("Shutting down server...");
                    break;
                }

                accept_result = listener.accept() => {
                    match accept_result {
                        Ok((socket, addr)) => {
                            self.handle_new_connection(socket, addr, semaphore.clone(), &mut tasks).await;
                        }
                        Err(e) => {
                            if Self::handle_connection_error(e).await {
                                break;
                            }
                        }
                    }
                }

                // reap finished connections so the set does not grow unbounded
                Some(res) = tasks.join_next(), if !tasks.is_empty() => {
                    if let Err(e) = res {
                        error!("Connection task failed: {e}");
                    }
                }
            }
        }

        Self::perform_shutdown(&mut tasks).await;
        Ok(())
    }

    /// Handle a new connection.
    async fn handle_new_connection(
        &self,
        mut socket: TcpStream,
        addr: SocketAddr,
        semaphore: Arc<Semaphore>,
        tasks: &mut JoinSet<()>,
    ) {
        // Try to acquire a permit from the semaphore
        let permit = match semaphore.try_acquire_owned() {
            Ok(permit) => permit,
            Err(_) => {
                warn!("Connection limit reached, rejecting connection from {addr}");
                let response = HttpResponse::new(StatusCode::ServiceUnavailable)
                    .with_content_type("text/plain")
                    .with_body_string("Server is at capacity, please try again later");
                let mut exchange = Exchange::new(0);
                let _ = send_response(
                    &mut socket,
                    &mut exchange,
                    response,
                    Method::GET,
                    true,
                    self.config.body_idle_timeout,
                )
                .await;
                let _ = socket.shutdown().await;
                return;
            }
        };

        let server = self.clone();
        tasks.spawn(async move {
            // The permit is dropped when the task completes, releasing the semaphore slot
            let _permit = permit;
            debug!("Accepted connection from {addr}");

            if let Err(e) = server.handle_connection(socket).await {
                warn!("Connection from {addr} ended with error: {e}");
            }
        });
    }

    /// Handle connection errors.
    async fn handle_connection_error(e: std::io::Error) -> bool {
        error!("Error accepting connection: {e}");

        // If there's a critical error, signal to break the loop
        if e.kind() == std::io::ErrorKind::BrokenPipe {
            error!("Critical error accepting connection, shutting down");
            return true;
        }

        // For other errors, wait a bit before retrying
        tokio::time::sleep(tokio::time::Duration::from_millis(100)).await;
        false
    }

    /// Perform graceful shutdown.
    async fn perform_shutdown(tasks: &mut JoinSet<()>) {
        info!("Waiting for {len} active connections to complete...", len = tasks.len());
        let shutdown_timeout = tokio::time::Duration::from_secs(30);
        let drained = tokio::time::timeout(shutdown_timeout, async {
            while let Some(res) = tasks.join_next().await {
                if let Err(e) = res {
                    error!("Task failed during shutdown: {e}");
                }
            }
        })
        .await;

        if drained.is_err() {
            warn!("Shutdown timed out, aborting {len} connections", len = tasks.len());
            tasks.abort_all();
        }
        info!("Server shutdown complete");
    }

    /// Serve every exchange on one already-accepted transport.
    ///
    /// Returns an error if the connection had to be aborted: a malformed
    /// request head, or a response body that failed after its head was sent.
    pub async fn handle_connection<T>(&self, transport: T) -> Result<(), Error>
    where
        T: AsyncRead + AsyncWrite + Unpin + Send + 'static,
    {
        serve_connection(transport, &self.router, &self.config, &self.counters).await
    }
}
