//! HTTP request head parsing and representation.

use std::collections::HashMap;
use std::str::FromStr;

use crate::parser::error::Error;
use crate::parser::headers::{find_header, parse_header_lines, Headers};
use crate::parser::method::Method;
use crate::parser::version::HttpVersion;

/// The start line and headers of an HTTP request.
#[derive(Debug, Clone)]
pub struct RequestHead {
    /// The HTTP method (GET, POST, etc.)
    pub method: Method,
    /// The request target, including any query string
    pub path: String,
    /// The HTTP version
    pub version: HttpVersion,
    /// The HTTP headers
    pub headers: Headers,
    /// Query parameters parsed from the path
    pub query_params: HashMap<String, String>,
}

impl RequestHead {
    /// Create a new request head.
    ///
    /// # Arguments
    ///
    /// * `method` - The HTTP method
    /// * `path` - The request target
    /// * `version` - The HTTP version
    /// * `headers` - The HTTP headers
    pub fn new(method: Method, path: String, version: HttpVersion, headers: Headers) -> Self {
        // Parse query parameters from the path
        let query_params: HashMap<String, String> = path
            .split_once('?')
            .map(|(_, query)| query
                .split('&')
                .filter(|s| !s.is_empty())
                .map(|pair| {
                    if let Some((k, v)) = pair.split_once('=') {
                        (k.to_string(), v.to_string())
                    } else {
                        (pair.to_string(), String::new())
                    }
                })
                .collect())
            .unwrap_or_default();

        Self {
            method,
            path,
            version,
            headers,
            query_params,
        }
    }

    /// The path without its query string, as used for routing.
    pub fn route_path(&self) -> &str {
        match self.path.split_once('?') {
            Some((path, _)) => path,
            None => &self.path,
        }
    }

    /// Get a header value, ignoring the case of the name.
    pub fn get_header(&self, name: &str) -> Option<&String> {
        find_header(&self.headers, name)
    }

    /// Check if a header exists.
    pub fn has_header(&self, name: &str) -> bool {
        self.get_header(name).is_some()
    }

    /// Get a query parameter value.
    pub fn get_query_param(&self, name: &str) -> Option<&String> {
        self.query_params.get(name)
    }

    /// Check if a query parameter exists.
    pub fn has_query_param(&self, name: &str) -> bool {
        self.query_params.contains_key(name)
    }

    /// Whether the client asked for the connection to close after this exchange.
    ///
    /// HTTP/1.0 closes unless `keep-alive` is requested explicitly.
    pub fn wants_close(&self) -> bool {
        match self.get_header("Connection") {
            Some(value) if value.eq_ignore_ascii_case("close") => true,
            Some(value) if value.eq_ignore_ascii_case("keep-alive") => false,
            _ => self.version == HttpVersion::Http10,
        }
    }
}

/// Parse an HTTP request head from a byte slice.
///
/// The slice holds the request line and header block; anything after the
/// blank line is ignored. The target must be absolute (`/...`) or `*`, and
/// HTTP/1.1 requests must carry `Host`.
pub fn parse_request(input: &[u8]) -> Result<RequestHead, Error> {
    let input_str = std::str::from_utf8(input)
        .map_err(|_| Error::MalformedRequestLine("Invalid UTF-8".to_string()))?;

    let mut lines = input_str.lines();
    let request_line = lines.next().ok_or(Error::EmptyRequest)?;

    // "POST /test/World HTTP/1.1"
    let parts: Vec<&str> = request_line.split_whitespace().collect();
    let [method, target, version] = parts[..] else {
        return Err(Error::MalformedRequestLine(request_line.to_string()));
    };

    let method = Method::from_str(method)?;
    if !target.starts_with('/') && target != "*" {
        return Err(Error::InvalidPath);
    }
    let version = HttpVersion::from_str(version)?;
    let headers = parse_header_lines(lines)?;

    if version == HttpVersion::Http11 && find_header(&headers, "Host").is_none() {
        return Err(Error::MissingHeader("Host".to_string()));
    }

    Ok(RequestHead::new(method, target.to_string(), version, headers))
}
