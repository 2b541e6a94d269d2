//! Rebuilding a `Response` from a sent request handle.
//!
//! Order of queries: status code, status text, raw header block, cookies,
//! then the body. The body is drained last so the handle can be released as
//! soon as this returns.

use log::{debug, warn};

use crate::body::read_body;
use crate::cookies::ResponseCookies;
use crate::engine::{Engine, InfoKind, RequestHandle};
use crate::error::HttpError;
use crate::headers::parse_header_block;
use crate::http::{Body, Cookie, Response};
use crate::query::query_string;

/// Query everything the engine knows about the response on `handle`.
///
/// `request_cookies` are placed ahead of the cookies the response sets; the
/// list is not deduplicated.
pub fn assemble_response<E: Engine + ?Sized>(
    engine: &E,
    handle: RequestHandle,
    request_cookies: &[Cookie],
    buffer_size: usize,
) -> Result<Response, HttpError> {
    let code = query_string(engine, handle, InfoKind::StatusCode, 0, buffer_size)
        .map_err(|e| match e {
            HttpError::QueryInfo { source, .. } => HttpError::Protocol {
                reason: format!("missing status code: {source}"),
                source: Some(source),
            },
            other => other,
        })?;
    let status_code = code
        .trim()
        .parse::<u16>()
        .map_err(|e| HttpError::Protocol {
            reason: format!("status {code:?} invalid: {e}"),
            source: None,
        })?;

    let mut status = status_code.to_string();
    match query_string(engine, handle, InfoKind::StatusText, 0, buffer_size) {
        Ok(text) if !text.is_empty() => {
            status.push(' ');
            status.push_str(&text);
        }
        Ok(_) => {}
        Err(e) => warn!("no status text for {status_code}: {e}"),
    }
    debug!("response status {status}");

    let block = query_string(engine, handle, InfoKind::RawHeadersCrlf, 0, buffer_size)?;
    let head = parse_header_block(&block)?;

    let mut cookies = request_cookies.to_vec();
    cookies.extend(ResponseCookies::new(engine, handle, buffer_size));

    let (body, content_length) = read_body(engine, handle)?;
    debug!("response body {content_length} bytes");

    Ok(Response {
        status_code,
        status,
        proto: head.protocol.name,
        proto_major: head.protocol.major,
        proto_minor: head.protocol.minor,
        headers: head.headers,
        cookies,
        body: Body::from(body),
        content_length,
    })
}

#[cfg(test)]
mod tests {
    use std::io::Read;

    use super::*;
    use crate::error::ReadFailure;
    use crate::scripted::{
        Failures, ScriptedEngine, ScriptedResponse, ERROR_HTTP_HEADER_NOT_FOUND,
    };

    const REQ: RequestHandle = RequestHandle(1);

    fn script() -> ScriptedResponse {
        ScriptedResponse {
            status_code: "200".to_string(),
            status_text: "OK".to_string(),
            raw_headers: "HTTP/1.1 200 OK\r\nServer: mock\r\nSet-Cookie: C=3\r\n\r\n"
                .to_string(),
            set_cookies: vec!["C=3".to_string()],
            chunks: vec!["0123456789".to_string(), "abcde".to_string()],
            failures: Failures::default(),
        }
    }

    #[test]
    fn assembles_full_response() {
        let engine = ScriptedEngine::new(script());
        let request_cookies = [Cookie::new("A", "1"), Cookie::new("B", "2")];
        let mut resp = assemble_response(&engine, REQ, &request_cookies, 0).unwrap();

        assert_eq!(resp.status_code, 200);
        assert_eq!(resp.status, "200 OK");
        assert_eq!(resp.proto, "HTTP/1.1");
        assert_eq!((resp.proto_major, resp.proto_minor), (1, 1));
        assert_eq!(resp.header("Server"), Some("mock"));
        assert_eq!(
            resp.cookies,
            vec![
                Cookie::new("A", "1"),
                Cookie::new("B", "2"),
                Cookie::new("C", "3"),
            ]
        );
        assert_eq!(resp.content_length, 15);

        let mut body = String::new();
        resp.body.read_to_string(&mut body).unwrap();
        assert_eq!(body, "0123456789abcde");
    }

    #[test]
    fn status_without_text() {
        let engine = ScriptedEngine::new(ScriptedResponse {
            status_text: String::new(),
            ..script()
        });
        let resp = assemble_response(&engine, REQ, &[], 0).unwrap();
        assert_eq!(resp.status, "200");
    }

    #[test]
    fn status_with_text() {
        let engine = ScriptedEngine::new(ScriptedResponse {
            status_code: "404".to_string(),
            status_text: "Not Found".to_string(),
            ..script()
        });
        let resp = assemble_response(&engine, REQ, &[], 0).unwrap();
        assert_eq!(resp.status_code, 404);
        assert_eq!(resp.status, "404 Not Found");
    }

    #[test]
    fn failed_status_text_is_tolerated() {
        let mut s = script();
        s.failures.status_text = true;
        let engine = ScriptedEngine::new(s);
        let resp = assemble_response(&engine, REQ, &[], 0).unwrap();
        assert_eq!(resp.status, "200");
    }

    #[test]
    fn non_numeric_status_is_protocol_error() {
        let engine = ScriptedEngine::new(ScriptedResponse {
            status_code: "abc".to_string(),
            ..script()
        });
        let err = assemble_response(&engine, REQ, &[], 0).unwrap_err();
        assert!(matches!(err, HttpError::Protocol { source: None, .. }));
    }

    #[test]
    fn status_beyond_u16_is_protocol_error() {
        let engine = ScriptedEngine::new(ScriptedResponse {
            status_code: "70000".to_string(),
            ..script()
        });
        let err = assemble_response(&engine, REQ, &[], 0).unwrap_err();
        assert!(matches!(err, HttpError::Protocol { source: None, .. }));
    }

    #[test]
    fn missing_status_keeps_engine_error() {
        let engine = ScriptedEngine::new(ScriptedResponse {
            status_code: String::new(),
            ..script()
        });
        let err = assemble_response(&engine, REQ, &[], 0).unwrap_err();
        match err {
            HttpError::Protocol {
                source: Some(source),
                ..
            } => assert_eq!(source.code, ERROR_HTTP_HEADER_NOT_FOUND),
            other => panic!("unexpected error {other}"),
        }
    }

    #[test]
    fn raw_header_failure_propagates_query_error() {
        let mut s = script();
        s.failures.raw_headers = true;
        let engine = ScriptedEngine::new(s);
        let err = assemble_response(&engine, REQ, &[], 0).unwrap_err();
        assert!(matches!(
            err,
            HttpError::QueryInfo {
                kind: InfoKind::RawHeadersCrlf,
                ..
            }
        ));
    }

    #[test]
    fn repeated_cookie_names_are_not_merged() {
        let engine = ScriptedEngine::new(ScriptedResponse {
            set_cookies: vec!["A=9".to_string()],
            ..script()
        });
        let resp = assemble_response(&engine, REQ, &[Cookie::new("A", "1")], 0).unwrap();
        assert_eq!(resp.cookies, vec![Cookie::new("A", "1"), Cookie::new("A", "9")]);
    }

    #[test]
    fn body_failure_returns_no_response() {
        let mut s = script();
        s.failures.read_after = Some(1);
        let engine = ScriptedEngine::new(s);
        let err = assemble_response(&engine, REQ, &[], 0).unwrap_err();
        assert!(matches!(
            err,
            HttpError::Read {
                received: 10,
                reason: ReadFailure::Chunk(_)
            }
        ));
    }
}
