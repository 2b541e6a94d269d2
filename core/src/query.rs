//! Buffered info queries.
//!
//! The engine writes a queried value into a caller-supplied buffer. When the
//! buffer is too small it reports the size it needs; the helper allocates
//! that much and retries exactly once.

use log::trace;

use crate::engine::{Engine, InfoKind, QueryInfo, RequestHandle};
use crate::error::{EngineError, HttpError};

/// Query `kind` at `index`, starting with a buffer of `initial_size` bytes.
///
/// The index is passed through unchanged; enumerating repeated fields is the
/// caller's job.
pub fn query_info<E: Engine + ?Sized>(
    engine: &E,
    request: RequestHandle,
    kind: InfoKind,
    index: u32,
    initial_size: usize,
) -> Result<Vec<u8>, HttpError> {
    let fail = |source: EngineError| HttpError::QueryInfo {
        kind,
        index,
        source,
    };

    let mut buf = vec![0u8; initial_size];
    let required = match engine.query_info(request, kind, index, &mut buf).map_err(fail)? {
        QueryInfo::Written(n) => return Ok(truncated(buf, n)),
        QueryInfo::InsufficientBuffer { required } => required,
    };

    trace!("{kind} query needs {required} bytes, retrying");
    buf = vec![0u8; required];
    match engine.query_info(request, kind, index, &mut buf).map_err(fail)? {
        QueryInfo::Written(n) => Ok(truncated(buf, n)),
        QueryInfo::InsufficientBuffer { required } => {
            Err(fail(EngineError::insufficient_buffer(required)))
        }
    }
}

/// Query `kind` and decode it as text. Invalid UTF-8 is replaced rather than
/// rejected; header values are not guaranteed to be UTF-8.
pub fn query_string<E: Engine + ?Sized>(
    engine: &E,
    request: RequestHandle,
    kind: InfoKind,
    index: u32,
    initial_size: usize,
) -> Result<String, HttpError> {
    let bytes = query_info(engine, request, kind, index, initial_size)?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

fn truncated(mut buf: Vec<u8>, written: usize) -> Vec<u8> {
    buf.truncate(written);
    buf
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scripted::{Failures, ScriptedEngine, ScriptedResponse};

    const REQ: RequestHandle = RequestHandle(1);

    fn engine_with_status(code: &str) -> ScriptedEngine {
        ScriptedEngine::new(ScriptedResponse {
            status_code: code.to_string(),
            ..ScriptedResponse::default()
        })
    }

    #[test]
    fn resizes_once_and_returns_value() {
        let engine = engine_with_status("200");
        let value = query_info(&engine, REQ, InfoKind::StatusCode, 0, 0).unwrap();
        assert_eq!(value, b"200");
        assert_eq!(engine.query_calls(InfoKind::StatusCode), 2);
    }

    #[test]
    fn large_enough_buffer_needs_one_call() {
        let engine = engine_with_status("200");
        let value = query_info(&engine, REQ, InfoKind::StatusCode, 0, 64).unwrap();
        assert_eq!(value, b"200");
        assert_eq!(engine.query_calls(InfoKind::StatusCode), 1);
    }

    #[test]
    fn second_size_failure_is_query_error() {
        let engine = ScriptedEngine::new(ScriptedResponse {
            status_code: "200".to_string(),
            failures: Failures {
                growing_query: Some(InfoKind::StatusCode),
                ..Failures::default()
            },
            ..ScriptedResponse::default()
        });

        let err = query_info(&engine, REQ, InfoKind::StatusCode, 0, 0).unwrap_err();
        assert!(matches!(
            err,
            HttpError::QueryInfo {
                kind: InfoKind::StatusCode,
                index: 0,
                ..
            }
        ));
        assert_eq!(engine.query_calls(InfoKind::StatusCode), 2);
    }

    #[test]
    fn missing_field_is_query_error() {
        let engine = engine_with_status("200");
        let err = query_info(&engine, REQ, InfoKind::SetCookie, 3, 0).unwrap_err();
        assert!(matches!(err, HttpError::QueryInfo { index: 3, .. }));
    }

    #[test]
    fn query_string_decodes_text() {
        let engine = ScriptedEngine::new(ScriptedResponse {
            status_code: "200".to_string(),
            status_text: "caf\u{e9}".to_string(),
            ..ScriptedResponse::default()
        });
        let text = query_string(&engine, REQ, InfoKind::StatusText, 0, 0).unwrap();
        assert_eq!(text, "caf\u{e9}");
    }
}
