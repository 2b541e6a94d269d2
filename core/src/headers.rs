//! Raw header block parsing.
//!
//! The engine hands back the response head as one CRLF-delimited block: the
//! status line followed by `Name: value` lines. The parser is permissive:
//! lines that are neither a protocol line nor split on `": "` are dropped.

use crate::error::HttpError;
use crate::http::HeaderMap;

/// Protocol name and version taken from the status line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Protocol {
    pub name: String,
    pub major: u32,
    pub minor: u32,
}

/// Result of parsing a raw header block.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedHead {
    /// Left at its default when the block has no `HTTP/` line.
    pub protocol: Protocol,
    pub headers: HeaderMap,
}

/// Parse a raw CRLF header block.
///
/// A line whose first token starts with `HTTP/` sets the protocol; if more
/// than one is present (interim responses) the last one wins. A malformed
/// version number on that line is a protocol error.
pub fn parse_header_block(block: &str) -> Result<ParsedHead, HttpError> {
    let mut head = ParsedHead::default();

    for line in block.split("\r\n") {
        if line.starts_with("HTTP/") {
            head.protocol = parse_protocol(line)?;
            continue;
        }
        if let Some((key, value)) = line.split_once(": ") {
            head.headers.append(key, value);
        }
    }

    Ok(head)
}

/// Parse `HTTP/<major>.<minor>` from the first token of a status line.
///
/// A bare `HTTP/` leaves the version at 0.0, a version without a minor part
/// (`HTTP/2`) has minor 0, and components after the minor are ignored.
fn parse_protocol(line: &str) -> Result<Protocol, HttpError> {
    let name = line.split_whitespace().next().unwrap_or_default();
    let version = name.strip_prefix("HTTP/").unwrap_or_default();

    let number = |part: &str| {
        part.parse::<u32>().map_err(|e| HttpError::Protocol {
            reason: format!("invalid HTTP version {name}: {e}"),
            source: None,
        })
    };

    let mut protocol = Protocol {
        name: name.to_string(),
        ..Protocol::default()
    };
    if version.is_empty() {
        return Ok(protocol);
    }
    let mut parts = version.split('.');
    if let Some(major) = parts.next() {
        protocol.major = number(major)?;
    }
    if let Some(minor) = parts.next() {
        protocol.minor = number(minor)?;
    }
    Ok(protocol)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_status_line_and_headers() {
        let block = "HTTP/1.1 200 OK\r\n\
                     Content-Type: text/plain\r\n\
                     Set-Cookie: a=1\r\n\
                     Set-Cookie: b=2\r\n\
                     Server: mock\r\n\r\n";
        let head = parse_header_block(block).unwrap();

        assert_eq!(head.protocol.name, "HTTP/1.1");
        assert_eq!(head.protocol.major, 1);
        assert_eq!(head.protocol.minor, 1);
        assert_eq!(head.headers.len(), 4);
        assert_eq!(head.headers.get_all("Set-Cookie"), ["a=1", "b=2"]);
        assert_eq!(head.headers.get("Server"), Some("mock"));
    }

    #[test]
    fn malformed_lines_are_dropped() {
        let block = "HTTP/1.0 404 Not Found\r\n\
                     garbage\r\n\
                     NoSpace:value\r\n\
                     X-Ok: yes\r\n";
        let head = parse_header_block(block).unwrap();

        assert_eq!(head.headers.len(), 1);
        assert_eq!(head.headers.get("X-Ok"), Some("yes"));
        assert_eq!(head.protocol.minor, 0);
    }

    #[test]
    fn missing_status_line_leaves_protocol_empty() {
        let head = parse_header_block("Content-Length: 0\r\n").unwrap();
        assert_eq!(head.protocol, Protocol::default());
        assert_eq!(head.headers.len(), 1);
    }

    #[test]
    fn value_keeps_later_separators() {
        let head = parse_header_block("Link: <a>; rel=\"x: y\"\r\n").unwrap();
        assert_eq!(head.headers.get("Link"), Some("<a>; rel=\"x: y\""));
    }

    #[test]
    fn major_only_version() {
        let head = parse_header_block("HTTP/2 204\r\n").unwrap();
        assert_eq!(head.protocol.name, "HTTP/2");
        assert_eq!(head.protocol.major, 2);
        assert_eq!(head.protocol.minor, 0);
    }

    #[test]
    fn last_status_line_wins() {
        let head = parse_header_block("HTTP/1.0 100 Continue\r\n\r\nHTTP/1.1 200 OK\r\n").unwrap();
        assert_eq!(head.protocol.minor, 1);
    }

    #[test]
    fn bare_protocol_has_zero_version() {
        let head = parse_header_block("HTTP/ 200\r\nA: 1\r\n").unwrap();
        assert_eq!(head.protocol.name, "HTTP/");
        assert_eq!((head.protocol.major, head.protocol.minor), (0, 0));
        assert_eq!(head.headers.get("A"), Some("1"));
    }

    #[test]
    fn extra_version_components_are_ignored() {
        let head = parse_header_block("HTTP/1.1.1 200 OK\r\n").unwrap();
        assert_eq!(head.protocol.name, "HTTP/1.1.1");
        assert_eq!((head.protocol.major, head.protocol.minor), (1, 1));
    }

    #[test]
    fn non_numeric_version_is_protocol_error() {
        let err = parse_header_block("HTTP/x.1 200 OK\r\n").unwrap_err();
        assert!(matches!(err, HttpError::Protocol { .. }));
    }

    #[test]
    fn header_named_like_protocol_is_a_header() {
        let head = parse_header_block("HTTP2-Settings: AAMA\r\n").unwrap();
        assert_eq!(head.headers.get("HTTP2-Settings"), Some("AAMA"));
        assert!(head.protocol.name.is_empty());
    }
}
