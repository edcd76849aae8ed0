//! HTTP response head parsing.

use std::str::FromStr;

use crate::parser::error::Error;
use crate::parser::headers::{find_header, parse_header_lines, Headers};
use crate::parser::status::StatusCode;
use crate::parser::version::HttpVersion;

/// The status line and headers of an HTTP response.
#[derive(Debug, Clone)]
pub struct ResponseHead {
    /// The HTTP version
    pub version: HttpVersion,
    /// The numeric status code
    pub status: u16,
    /// The reason phrase, possibly empty
    pub reason: String,
    /// The HTTP headers
    pub headers: Headers,
}

impl ResponseHead {
    /// The status as a known [`StatusCode`], if it is one.
    pub fn status_code(&self) -> Option<StatusCode> {
        StatusCode::from_code(self.status)
    }

    /// Get a header value, ignoring the case of the name.
    pub fn get_header(&self, name: &str) -> Option<&String> {
        find_header(&self.headers, name)
    }
}

/// Parse an HTTP response head (status line and headers) from a byte slice.
pub fn parse_response_head(input: &[u8]) -> Result<ResponseHead, Error> {
    let input_str = std::str::from_utf8(input)
        .map_err(|_| Error::MalformedStatusLine("Invalid UTF-8".to_string()))?;

    let mut lines = input_str.lines();
    let status_line = lines.next().ok_or(Error::EmptyRequest)?;

    // "HTTP/1.1 200 OK": the reason phrase may contain spaces or be absent
    let mut parts = status_line.splitn(3, ' ');
    let (version, code) = match (parts.next(), parts.next()) {
        (Some(version), Some(code)) => (version, code),
        _ => return Err(Error::MalformedStatusLine(status_line.to_string())),
    };
    let reason = parts.next().unwrap_or("").trim().to_string();

    let version = HttpVersion::from_str(version)?;
    if code.len() != 3 {
        return Err(Error::InvalidStatus(code.to_string()));
    }
    let status = code
        .parse::<u16>()
        .map_err(|_| Error::InvalidStatus(code.to_string()))?;

    let headers = parse_header_lines(lines)?;

    Ok(ResponseHead {
        version,
        status,
        reason,
        headers,
    })
}
