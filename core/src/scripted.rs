//! In-memory engine that replays one scripted response.
//!
//! # Design
//! `ScriptedEngine` answers every primitive from a `ScriptedResponse` and
//! records each call it receives, so tests can assert both what the adapter
//! produced and how it drove the engine. It accepts any handle value; there
//! is exactly one exchange per engine.
//!
//! The script is serde-deserializable so JSON test vectors can describe an
//! exchange, including injected failures, without any Rust code.

use std::cell::{Cell, RefCell};

use serde::{Deserialize, Serialize};

use crate::engine::{
    AddHeaderMode, ConnectParams, ConnectionHandle, Engine, InfoKind, QueryInfo, RequestFlags,
    RequestHandle, SessionHandle,
};
use crate::error::EngineError;

/// Native code for "the requested header was not found".
pub const ERROR_HTTP_HEADER_NOT_FOUND: u32 = 12150;

/// Native code used for every injected failure.
pub const ERROR_INTERNAL: u32 = 12004;

/// What the scripted engine reports for the exchange.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ScriptedResponse {
    /// Empty means the status code query fails.
    pub status_code: String,
    pub status_text: String,
    /// CRLF-delimited header block, status line included.
    pub raw_headers: String,
    /// One value per `Set-Cookie` index.
    pub set_cookies: Vec<String>,
    /// Body chunks in the order `query_data_available` reports them.
    pub chunks: Vec<String>,
    pub failures: Failures,
}

/// Failures to inject into the scripted exchange.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Failures {
    pub connect: bool,
    pub open_request: bool,
    /// Fail the n-th `add_headers` call (zero-based, counting every call).
    pub add_header: Option<usize>,
    pub send: bool,
    pub status_text: bool,
    pub raw_headers: bool,
    /// Never satisfy this query: every call asks for one byte more than given.
    pub growing_query: Option<InfoKind>,
    /// Fail `query_data_available` once this many chunks were read.
    pub available_after: Option<usize>,
    /// Fail `read_chunk` once this many chunks were read.
    pub read_after: Option<usize>,
    /// Return half of the chunk once this many chunks were read.
    pub short_read_after: Option<usize>,
}

/// One primitive call as seen by the scripted engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Connect {
        session: SessionHandle,
        host: String,
        port: Option<u16>,
        username: String,
        password: String,
        flags: RequestFlags,
    },
    OpenRequest {
        method: String,
        target: String,
        flags: RequestFlags,
    },
    AddHeaders {
        line: String,
        mode: AddHeaderMode,
    },
    Send {
        extra_headers: String,
        body: Vec<u8>,
    },
    QueryInfo {
        kind: InfoKind,
        index: u32,
        buf_len: usize,
    },
    QueryDataAvailable,
    ReadChunk {
        len: usize,
    },
    CloseRequest(RequestHandle),
    CloseConnection(ConnectionHandle),
}

#[derive(Debug)]
pub struct ScriptedEngine {
    script: ScriptedResponse,
    calls: RefCell<Vec<Call>>,
    add_header_calls: Cell<usize>,
    chunks_read: Cell<usize>,
}

impl ScriptedEngine {
    pub const CONNECTION: ConnectionHandle = ConnectionHandle(0x10);
    pub const REQUEST: RequestHandle = RequestHandle(0x20);

    pub fn new(script: ScriptedResponse) -> Self {
        Self {
            script,
            calls: RefCell::new(Vec::new()),
            add_header_calls: Cell::new(0),
            chunks_read: Cell::new(0),
        }
    }

    /// Every call received so far, in order.
    pub fn calls(&self) -> Vec<Call> {
        self.calls.borrow().clone()
    }

    /// Header lines passed to `add_headers`, with their merge mode.
    pub fn header_lines(&self) -> Vec<(String, AddHeaderMode)> {
        self.calls
            .borrow()
            .iter()
            .filter_map(|call| match call {
                Call::AddHeaders { line, mode } => Some((line.clone(), *mode)),
                _ => None,
            })
            .collect()
    }

    /// How many times `kind` was queried, across all indices.
    pub fn query_calls(&self, kind: InfoKind) -> usize {
        self.calls
            .borrow()
            .iter()
            .filter(|call| matches!(call, Call::QueryInfo { kind: k, .. } if *k == kind))
            .count()
    }

    /// Whether both handles opened for the exchange were released.
    pub fn handles_closed(&self) -> bool {
        let calls = self.calls.borrow();
        calls.contains(&Call::CloseRequest(Self::REQUEST))
            && calls.contains(&Call::CloseConnection(Self::CONNECTION))
    }

    fn record(&self, call: Call) {
        self.calls.borrow_mut().push(call);
    }

    fn injected(what: &str) -> EngineError {
        EngineError::new(ERROR_INTERNAL, format!("injected {what} failure"))
    }

    fn info_value(&self, kind: InfoKind, index: u32) -> Result<&[u8], EngineError> {
        let not_found = || EngineError::new(ERROR_HTTP_HEADER_NOT_FOUND, "header not found");
        let failures = &self.script.failures;
        match kind {
            InfoKind::StatusCode if self.script.status_code.is_empty() => Err(not_found()),
            InfoKind::StatusCode => Ok(self.script.status_code.as_bytes()),
            InfoKind::StatusText if failures.status_text => Err(Self::injected("status text")),
            InfoKind::StatusText => Ok(self.script.status_text.as_bytes()),
            InfoKind::RawHeadersCrlf if failures.raw_headers => {
                Err(Self::injected("raw headers"))
            }
            InfoKind::RawHeadersCrlf => Ok(self.script.raw_headers.as_bytes()),
            InfoKind::SetCookie => self
                .script
                .set_cookies
                .get(index as usize)
                .map(String::as_bytes)
                .ok_or_else(not_found),
        }
    }

    fn current_chunk(&self) -> Option<&[u8]> {
        self.script
            .chunks
            .get(self.chunks_read.get())
            .map(String::as_bytes)
    }
}

impl Engine for ScriptedEngine {
    fn connect(
        &self,
        session: SessionHandle,
        params: &ConnectParams<'_>,
    ) -> Result<ConnectionHandle, EngineError> {
        self.record(Call::Connect {
            session,
            host: params.host.to_string(),
            port: params.port,
            username: params.username.to_string(),
            password: params.password.to_string(),
            flags: params.flags,
        });
        if self.script.failures.connect {
            return Err(Self::injected("connect"));
        }
        Ok(Self::CONNECTION)
    }

    fn open_request(
        &self,
        _connection: ConnectionHandle,
        method: &str,
        target: &str,
        flags: RequestFlags,
    ) -> Result<RequestHandle, EngineError> {
        self.record(Call::OpenRequest {
            method: method.to_string(),
            target: target.to_string(),
            flags,
        });
        if self.script.failures.open_request {
            return Err(Self::injected("open request"));
        }
        Ok(Self::REQUEST)
    }

    fn add_headers(
        &self,
        _request: RequestHandle,
        line: &str,
        mode: AddHeaderMode,
    ) -> Result<(), EngineError> {
        self.record(Call::AddHeaders {
            line: line.to_string(),
            mode,
        });
        let n = self.add_header_calls.get();
        self.add_header_calls.set(n + 1);
        if self.script.failures.add_header == Some(n) {
            return Err(Self::injected("add header"));
        }
        Ok(())
    }

    fn send_request(
        &self,
        _request: RequestHandle,
        extra_headers: &str,
        body: &[u8],
    ) -> Result<(), EngineError> {
        self.record(Call::Send {
            extra_headers: extra_headers.to_string(),
            body: body.to_vec(),
        });
        if self.script.failures.send {
            return Err(Self::injected("send"));
        }
        Ok(())
    }

    fn query_info(
        &self,
        _request: RequestHandle,
        kind: InfoKind,
        index: u32,
        buf: &mut [u8],
    ) -> Result<QueryInfo, EngineError> {
        self.record(Call::QueryInfo {
            kind,
            index,
            buf_len: buf.len(),
        });
        let value = self.info_value(kind, index)?;
        if self.script.failures.growing_query == Some(kind) {
            return Ok(QueryInfo::InsufficientBuffer {
                required: buf.len().max(value.len()) + 1,
            });
        }
        if buf.len() < value.len() {
            return Ok(QueryInfo::InsufficientBuffer {
                required: value.len(),
            });
        }
        buf[..value.len()].copy_from_slice(value);
        Ok(QueryInfo::Written(value.len()))
    }

    fn query_data_available(&self, _request: RequestHandle) -> Result<usize, EngineError> {
        self.record(Call::QueryDataAvailable);
        if self.script.failures.available_after == Some(self.chunks_read.get()) {
            return Err(Self::injected("query data available"));
        }
        Ok(self.current_chunk().map_or(0, <[u8]>::len))
    }

    fn read_chunk(&self, _request: RequestHandle, buf: &mut [u8]) -> Result<usize, EngineError> {
        self.record(Call::ReadChunk { len: buf.len() });
        let read = self.chunks_read.get();
        if self.script.failures.read_after == Some(read) {
            return Err(Self::injected("read"));
        }
        let Some(chunk) = self.current_chunk() else {
            return Ok(0);
        };
        let mut n = chunk.len().min(buf.len());
        if self.script.failures.short_read_after == Some(read) {
            n /= 2;
        }
        buf[..n].copy_from_slice(&chunk[..n]);
        self.chunks_read.set(read + 1);
        Ok(n)
    }

    fn close_request(&self, request: RequestHandle) -> Result<(), EngineError> {
        self.record(Call::CloseRequest(request));
        Ok(())
    }

    fn close_connection(&self, connection: ConnectionHandle) -> Result<(), EngineError> {
        self.record(Call::CloseConnection(connection));
        Ok(())
    }
}
