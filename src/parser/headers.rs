//! Header block parsing shared by request and response heads.

use std::collections::HashMap;

use crate::parser::error::Error;

/// Header names mapped to their values, as they appeared on the wire.
pub type Headers = HashMap<String, String>;

/// Case-insensitive header lookup.
pub fn find_header<'a>(headers: &'a Headers, name: &str) -> Option<&'a String> {
    headers.iter().find_map(|(k, v)| {
        if k.eq_ignore_ascii_case(name) {
            Some(v)
        } else {
            None
        }
    })
}

/// Parse `Name: value` lines up to the first empty line.
///
/// Repeated names, in any case, are folded into the first spelling seen with
/// their values joined by `, `. Repeated `Content-Length` lines must agree.
pub(crate) fn parse_header_lines<'a>(lines: impl Iterator<Item = &'a str>) -> Result<Headers, Error> {
    let mut headers: Headers = HashMap::new();
    for line in lines {
        // Empty line indicates the end of headers
        if line.is_empty() {
            break;
        }

        let (name, value) = line.split_once(':').ok_or(Error::InvalidHeaderFormat)?;
        let name = name.trim();
        if name.is_empty() {
            return Err(Error::InvalidHeaderFormat);
        }

        let value = value.trim();

        let existing = headers.keys().find(|k| k.eq_ignore_ascii_case(name)).cloned();
        let Some(existing) = existing.and_then(|key| headers.get_mut(&key)) else {
            headers.insert(name.to_string(), value.to_string());
            continue;
        };
        if name.eq_ignore_ascii_case("Content-Length") {
            if existing.as_str() != value {
                return Err(Error::InvalidHeaderFormat);
            }
            continue;
        }
        existing.push_str(", ");
        existing.push_str(value);
    }
    Ok(headers)
}
