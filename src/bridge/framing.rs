//! Body framing selection.

use crate::bridge::error::Error;
use crate::parser::{find_header, Headers, Method, RequestHead, ResponseHead};

/// How a body is delimited on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Framing {
    /// No body bytes follow the head.
    Empty,
    /// Exactly this many bytes follow the head.
    Length(u64),
    /// `<hex length>\r\n<bytes>\r\n` chunks ended by `0\r\n\r\n`.
    Chunked,
    /// The body runs until the peer closes the connection.
    CloseDelimited,
}

impl Framing {
    /// Framing of an incoming request body. Requests are never close-delimited.
    pub fn for_request(head: &RequestHead) -> Result<Self, Error> {
        Ok(from_headers(&head.headers)?.unwrap_or(Framing::Empty))
    }

    /// Framing of an incoming response body to a request sent with `method`.
    pub fn for_response(head: &ResponseHead, method: Method) -> Result<Self, Error> {
        if method == Method::HEAD || (100..200).contains(&head.status) || head.status == 204 || head.status == 304 {
            return Ok(Framing::Empty);
        }
        Ok(from_headers(&head.headers)?.unwrap_or(Framing::CloseDelimited))
    }

    /// The header line announcing this framing, if it needs one.
    pub fn header(&self) -> Option<(&'static str, String)> {
        match self {
            Framing::Empty => Some(("Content-Length", "0".to_string())),
            Framing::Length(len) => Some(("Content-Length", len.to_string())),
            Framing::Chunked => Some(("Transfer-Encoding", "chunked".to_string())),
            Framing::CloseDelimited => None,
        }
    }
}

fn from_headers(headers: &Headers) -> Result<Option<Framing>, Error> {
    if let Some(encoding) = find_header(headers, "Transfer-Encoding") {
        let last = encoding.rsplit(',').next().unwrap_or("").trim();
        if last.eq_ignore_ascii_case("chunked") {
            return Ok(Some(Framing::Chunked));
        }
    }

    match find_header(headers, "Content-Length") {
        Some(value) => {
            let len = value
                .trim()
                .parse::<u64>()
                .map_err(|_| Error::InvalidLength(value.clone()))?;
            Ok(Some(if len == 0 { Framing::Empty } else { Framing::Length(len) }))
        }
        None => Ok(None),
    }
}
