//! A small asynchronous HTTP/1.1 exchange engine.
//!
//! flowhttp-rs serves and sends HTTP requests whose bodies are streamed with
//! backpressure: a body producer is pulled one chunk at a time, and only
//! after the previous chunk has been accepted by the transport.
//!
//! # Features
//!
//! - A router matching methods and path templates such as `/users/{id}`
//! - A server pipeline that turns routing misses into `404` and handler
//!   failures into `500` while the status can still be chosen
//! - Chunked response bodies that are aborted, never silently truncated,
//!   when their producer fails after the status line was sent
//! - A client whose response bodies report an incomplete transfer as an
//!   error instead of a normal end
//! - JSON helpers for requests and responses
//!
//! # Examples
//!
//! ## Routing
//!
//! ```
//! use flowhttp_rs::{Method, Router};
//!
//! let router = Router::builder()
//!     .route(Method::GET, "/users/{id}", "show user")
//!     .build()
//!     .unwrap();
//!
//! let found = router.match_route(Method::GET, "/users/42").unwrap();
//! assert_eq!(*found.handler, "show user");
//! assert_eq!(found.params["id"], "42");
//! assert!(router.match_route(Method::POST, "/users/42").is_none());
//! ```
//!
//! ## Serving
//!
//! ```no_run
//! use flowhttp_rs::{HttpResponse, HttpServer, Router, ServerConfig, StatusCode};
//!
//! # async fn run() -> Result<(), flowhttp_rs::ServerError> {
//! let router = Router::builder()
//!     .post("/echo/{name}", |mut req| async move {
//!         let name = req.param("name").unwrap_or("stranger").to_string();
//!         let text = req.text().await?;
//!         Ok::<_, flowhttp_rs::ServerError>(
//!             HttpResponse::new(StatusCode::Ok).with_body_string(format!("{text} {name}!")),
//!         )
//!     })
//!     .build()?;
//!
//! HttpServer::new(ServerConfig::default(), router).start().await
//! # }
//! ```
//!
//! ## Parsing a request head
//!
//! ```
//! use flowhttp_rs::{parse_request, ParserError};
//!
//! let request = parse_request(b"GET /index.html HTTP/1.1\r\nHost: example.com\r\n\r\n").unwrap();
//! assert_eq!(request.path, "/index.html");
//!
//! let invalid = parse_request(b"INVALID /index.html HTTP/1.1\r\nHost: example.com\r\n\r\n");
//! assert!(matches!(invalid, Err(ParserError::InvalidMethod(_))));
//! ```
//!
//! See the `demos` directory for a complete server and client.

pub mod bridge;
pub mod client;
pub mod exchange;
pub mod parser;
pub mod router;
pub mod server;

// Re-export commonly used items for convenience
pub use bridge::{Body, BodyStream, Error as BodyError};
pub use client::{ClientConfig, ClientResponse, Error as ClientError, HttpClient};
pub use exchange::{Exchange, ExchangeState};
pub use parser::{parse_request, Error as ParserError, HttpVersion, Method, RequestHead, StatusCode};
pub use router::{Error as RouterError, Router};
pub use server::{Error as ServerError, HttpResponse, HttpServer, Request, ServerConfig};
