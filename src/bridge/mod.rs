//! The backpressure stream bridge.
//!
//! Every body byte that crosses the transport goes through this module, in
//! either direction:
//!
//! - [`WriteBridge`] pulls one chunk from a producer per unit of transport
//!   demand and waits for the write to complete before pulling the next, so at
//!   most one chunk is ever in flight.
//! - [`BodyDecoder`] reads one chunk from the transport each time its consumer
//!   asks for one, and reports [`Error::Incomplete`] when the connection closes
//!   before the body's terminating marker.
//!
//! Failures are split on the commit point: a producer that fails before the
//! head reached the wire yields [`Error::PreCommit`], after it
//! [`Error::PostCommit`]. Only the former can still become a status code.

mod body;
mod decoder;
mod error;
mod framing;
mod head;
mod writer;
mod tests;

// Re-export public items
pub use body::{Body, BodyStream, Chunk};
pub use decoder::{BodyDecoder, ReadState};
pub use error::{BoxError, Error};
pub use framing::Framing;
pub use head::{read_head, write_head};
pub use writer::{CancelHandle, WriteBridge, WriteState};
