//! Request and response values exchanged with `Client::send`.
//!
//! # Design
//! These types describe one HTTP exchange as plain data. The caller builds a
//! `Request`; the adapter drives the native engine and hands back a fully
//! materialized `Response`. Nothing here touches an engine handle, so the
//! values outlive the cycle that produced them and carry no shared state.
//!
//! Header keys are kept exactly as given. `Content-Type` and `content-type`
//! are different entries, matching what the engine reports.

use std::fmt;
use std::io::{self, Read};

use bytes::buf::Reader;
use bytes::{Buf, Bytes};
use serde::{Deserialize, Serialize};

/// A cookie reduced to its name and value. Domain, path and expiry are not
/// tracked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cookie {
    pub name: String,
    pub value: String,
}

impl Cookie {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }

    /// Parse a `Set-Cookie` value by splitting once on `=`.
    ///
    /// Everything after the first `=` is the value, attributes included
    /// (`sid=1; Path=/` has value `1; Path=/`). Nothing is trimmed. An entry
    /// without `=` is all name with an empty value.
    pub fn parse_set_cookie(raw: &str) -> Self {
        match raw.split_once('=') {
            Some((name, value)) => Cookie::new(name, value),
            None => Cookie::new(raw, ""),
        }
    }
}

impl fmt::Display for Cookie {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.name, self.value)
    }
}

/// An HTTP request described as plain data.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Request {
    pub method: String,
    /// Absolute `http` or `https` URL.
    pub url: String,
    /// Header entries in caller order. A key given twice ends up with the
    /// last value, since headers are attached with replace semantics.
    #[serde(default)]
    pub headers: Vec<(String, String)>,
    #[serde(default)]
    pub cookies: Vec<Cookie>,
    #[serde(default)]
    pub body: Vec<u8>,
}

impl Request {
    pub fn new(method: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            url: url.into(),
            ..Self::default()
        }
    }

    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((key.into(), value.into()));
        self
    }

    pub fn cookie(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.cookies.push(Cookie::new(name, value));
        self
    }

    pub fn body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        self
    }
}

/// Ordered multi-valued header map.
///
/// Keys keep first-seen order, values keep insertion order within a key.
/// Lookups are case-sensitive.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeaderMap {
    entries: Vec<(String, Vec<String>)>,
}

impl HeaderMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, values)) => values.push(value),
            None => self.entries.push((key, vec![value])),
        }
    }

    /// First value stored under `key`.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.get_all(key).first().map(String::as_str)
    }

    /// All values stored under `key`, in insertion order.
    pub fn get_all(&self, key: &str) -> &[String] {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, values)| values.as_slice())
            .unwrap_or(&[])
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.iter().any(|(k, _)| k == key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    /// Every `(key, value)` pair, grouped by key in first-seen order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .flat_map(|(k, values)| values.iter().map(move |v| (k.as_str(), v.as_str())))
    }

    /// Total number of values across all keys.
    pub fn len(&self) -> usize {
        self.entries.iter().map(|(_, values)| values.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// A fully read response body exposed as a single-pass reader.
#[derive(Debug)]
pub struct Body {
    reader: Reader<Bytes>,
}

impl Body {
    pub fn empty() -> Self {
        Self::from(Bytes::new())
    }

    /// Bytes not yet read.
    pub fn len(&self) -> usize {
        self.reader.get_ref().remaining()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Consume the body, returning the bytes not yet read.
    pub fn into_bytes(self) -> Bytes {
        self.reader.into_inner()
    }
}

impl From<Bytes> for Body {
    fn from(bytes: Bytes) -> Self {
        Self {
            reader: bytes.reader(),
        }
    }
}

impl From<Vec<u8>> for Body {
    fn from(bytes: Vec<u8>) -> Self {
        Self::from(Bytes::from(bytes))
    }
}

impl Read for Body {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.reader.read(buf)
    }
}

/// An HTTP response rebuilt from the engine's query interface.
#[derive(Debug)]
pub struct Response {
    pub status_code: u16,
    /// `"<code>"` or `"<code> <text>"`.
    pub status: String,
    /// Protocol token such as `HTTP/1.1`; empty if the engine reported none.
    pub proto: String,
    pub proto_major: u32,
    pub proto_minor: u32,
    pub headers: HeaderMap,
    /// Request cookies first, then cookies set by the response.
    pub cookies: Vec<Cookie>,
    pub body: Body,
    pub content_length: u64,
}

impl Response {
    /// First value of header `name` (case-sensitive).
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_cookie_splits_once_on_equals() {
        let c = Cookie::parse_set_cookie("token=a=b=c");
        assert_eq!(c, Cookie::new("token", "a=b=c"));
    }

    #[test]
    fn set_cookie_keeps_attributes_in_value() {
        let c = Cookie::parse_set_cookie("sid=42; Path=/; HttpOnly");
        assert_eq!(c, Cookie::new("sid", "42; Path=/; HttpOnly"));
    }

    #[test]
    fn set_cookie_is_not_trimmed() {
        let c = Cookie::parse_set_cookie(" sp = x ");
        assert_eq!(c, Cookie::new(" sp ", " x "));
    }

    #[test]
    fn set_cookie_without_value() {
        let c = Cookie::parse_set_cookie("flag");
        assert_eq!(c, Cookie::new("flag", ""));
    }

    #[test]
    fn header_map_keeps_value_order_per_key() {
        let mut h = HeaderMap::new();
        h.append("Vary", "Accept");
        h.append("Server", "mock");
        h.append("Vary", "Origin");

        assert_eq!(h.get_all("Vary"), ["Accept", "Origin"]);
        assert_eq!(h.get("Vary"), Some("Accept"));
        assert_eq!(h.len(), 3);
        assert_eq!(h.keys().collect::<Vec<_>>(), ["Vary", "Server"]);
        assert_eq!(
            h.iter().collect::<Vec<_>>(),
            [("Vary", "Accept"), ("Vary", "Origin"), ("Server", "mock")]
        );
    }

    #[test]
    fn header_map_is_case_sensitive() {
        let mut h = HeaderMap::new();
        h.append("X-Id", "1");
        h.append("x-id", "2");

        assert_eq!(h.get("X-Id"), Some("1"));
        assert_eq!(h.get("x-id"), Some("2"));
        assert!(h.get("X-ID").is_none());
        assert!(h.get_all("X-ID").is_empty());
    }

    #[test]
    fn body_reads_once() {
        let mut body = Body::from(b"hello".to_vec());
        assert_eq!(body.len(), 5);

        let mut out = String::new();
        body.read_to_string(&mut out).unwrap();
        assert_eq!(out, "hello");
        assert!(body.is_empty());
        assert_eq!(body.read(&mut [0u8; 4]).unwrap(), 0);
    }

    #[test]
    fn request_builder_keeps_order() {
        let req = Request::new("POST", "http://example.com/")
            .header("A", "1")
            .header("B", "2")
            .cookie("x", "1")
            .cookie("x", "2")
            .body("payload");

        assert_eq!(req.headers[0].0, "A");
        assert_eq!(req.headers[1].0, "B");
        assert_eq!(req.cookies.len(), 2);
        assert_eq!(req.body, b"payload");
    }
}
